//! Turns raw vote counts into sorted, labelled rows for display.

use shared::{wire_id, PollOption, VoteTally};

use crate::view::FinalResults;

/// Characters of an unknown option id kept in its placeholder label.
const PLACEHOLDER_ID_CHARS: usize = 8;

#[derive(Debug, Clone, PartialEq)]
pub struct TallyRow {
    pub option_id: String,
    pub text: String,
    pub count: u64,
    /// 0-100, rounded to one decimal.
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TallyView {
    pub total: u64,
    pub rows: Vec<TallyRow>,
}

/// Results block for one question of a finished poll.
#[derive(Debug, Clone, PartialEq)]
pub struct QuestionResults {
    pub question_id: String,
    pub text: String,
    pub tally: TallyView,
}

struct Entry<'a> {
    id: &'a str,
    count: u64,
    position: Option<usize>,
}

impl Entry<'_> {
    /// Tie-break key: option list order, then unknown ids by numeric value, then lexically.
    fn rank(&self) -> (usize, u64, &str) {
        (
            self.position.unwrap_or(usize::MAX),
            wire_id::parse(self.id).unwrap_or(u64::MAX),
            self.id,
        )
    }
}

/// Sort a tally by count (descending), label it from `options` and attach
/// percentages. Unknown option ids get a placeholder label.
pub fn render_tally(tally: &VoteTally, options: &[PollOption]) -> TallyView {
    let total = tally.values().fold(0u64, |sum, &count| sum.saturating_add(count));

    let mut entries: Vec<Entry<'_>> = tally
        .iter()
        .map(|(id, &count)| Entry {
            id,
            count,
            position: option_position(options, id),
        })
        .collect();
    entries.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.rank().cmp(&b.rank())));

    let rows = entries
        .into_iter()
        .map(|e| TallyRow {
            option_id: e.id.to_string(),
            text: e
                .position
                .map(|i| options[i].text.clone())
                .unwrap_or_else(|| placeholder_label(e.id)),
            count: e.count,
            percentage: percentage(e.count, total),
        })
        .collect();

    TallyView { total, rows }
}

/// Render every question of a finished poll, in poll order. Tallies for
/// questions the server did not describe are appended with placeholder text.
pub fn render_final_results(final_results: &FinalResults) -> Vec<QuestionResults> {
    let mut out = Vec::with_capacity(final_results.results.len());

    for question in &final_results.questions {
        let key = question.id.to_string();
        if let Some(tally) = final_results.results.get(&key) {
            out.push(QuestionResults {
                question_id: key,
                text: question.text.clone(),
                tally: render_tally(tally, &question.options),
            });
        }
    }

    for (question_id, tally) in &final_results.results {
        let described = wire_id::parse(question_id)
            .map(|id| final_results.questions.iter().any(|q| q.id == id))
            .unwrap_or(false);
        if !described {
            out.push(QuestionResults {
                question_id: question_id.clone(),
                text: format!("Question {}", question_id),
                tally: render_tally(tally, &[]),
            });
        }
    }

    out
}

pub fn percentage(count: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    round1(count as f64 / total as f64 * 100.0)
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn option_position(options: &[PollOption], id: &str) -> Option<usize> {
    let id = wire_id::parse(id)?;
    options.iter().position(|o| o.id == id)
}

fn placeholder_label(id: &str) -> String {
    format!(
        "Option {}",
        id.chars().take(PLACEHOLDER_ID_CHARS).collect::<String>()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::{Question, QuestionKind};

    fn opt(id: u64, text: &str) -> PollOption {
        PollOption {
            id,
            text: text.to_string(),
        }
    }

    fn tally(entries: &[(&str, u64)]) -> VoteTally {
        entries
            .iter()
            .map(|(id, count)| (id.to_string(), *count))
            .collect()
    }

    fn order(view: &TallyView) -> Vec<&str> {
        view.rows.iter().map(|r| r.option_id.as_str()).collect()
    }

    #[test]
    fn yes_no_split_is_fifty_fifty() {
        let view = render_tally(
            &tally(&[("10", 2), ("11", 2)]),
            &[opt(10, "Yes"), opt(11, "No")],
        );
        assert_eq!(view.total, 4);
        assert_eq!(view.rows.len(), 2);
        assert!(view.rows.iter().all(|r| r.percentage == 50.0));
        assert_eq!(view.rows[0].text, "Yes");
        assert_eq!(view.rows[1].text, "No");
    }

    #[test]
    fn ties_follow_option_order() {
        let options = [opt(1, "A"), opt(2, "B"), opt(3, "C")];
        let votes = tally(&[("1", 3), ("2", 5), ("3", 5)]);
        let first = render_tally(&votes, &options);
        assert_eq!(order(&first), ["2", "3", "1"]);
        for _ in 0..5 {
            assert_eq!(render_tally(&votes, &options), first);
        }
    }

    #[test]
    fn ties_use_list_position_not_id_value() {
        let options = [opt(30, "C"), opt(10, "A"), opt(20, "B")];
        let view = render_tally(&tally(&[("10", 1), ("20", 1), ("30", 1)]), &options);
        assert_eq!(order(&view), ["30", "10", "20"]);
        assert_eq!(view.rows[0].percentage, 33.3);
    }

    #[test]
    fn zero_votes_give_zero_percent() {
        let view = render_tally(&tally(&[("1", 0), ("2", 0)]), &[opt(1, "A"), opt(2, "B")]);
        assert_eq!(view.total, 0);
        assert!(view.rows.iter().all(|r| r.percentage == 0.0));
    }

    #[test]
    fn unknown_options_get_placeholder_and_sort_last_on_ties() {
        let options = [opt(1, "Known")];
        let view = render_tally(
            &tally(&[("1234567890", 2), ("9", 2), ("1", 2), ("x-long-uuid-ish", 1)]),
            &options,
        );
        assert_eq!(order(&view), ["1", "9", "1234567890", "x-long-uuid-ish"]);
        assert_eq!(view.rows[1].text, "Option 9");
        assert_eq!(view.rows[2].text, "Option 12345678");
        assert_eq!(view.rows[3].text, "Option x-long-u");
        assert_eq!(view.rows[3].percentage, 14.3);
    }

    #[test]
    fn huge_counts_saturate_instead_of_overflowing() {
        let view = render_tally(&tally(&[("1", u64::MAX), ("2", 1)]), &[]);
        assert_eq!(view.total, u64::MAX);
        assert_eq!(order(&view), ["1", "2"]);
        assert_eq!(view.rows[0].percentage, 100.0);
        assert_eq!(view.rows[1].percentage, 0.0);
    }

    #[test]
    fn placeholder_never_splits_a_character() {
        assert_eq!(placeholder_label("ééééééééé"), "Option éééééééé");
        assert_eq!(placeholder_label(""), "Option ");
    }

    #[test]
    fn final_results_follow_poll_order() {
        let q = |id: u64, text: &str| Question {
            id,
            text: text.to_string(),
            kind: QuestionKind::SingleSelect,
            options: vec![opt(id * 10, "first"), opt(id * 10 + 1, "second")],
            votes: None,
        };
        let final_results = FinalResults {
            results: [
                ("1".to_string(), tally(&[("10", 1), ("11", 3)])),
                ("2".to_string(), tally(&[("20", 4)])),
                ("77".to_string(), tally(&[("5", 1)])),
            ]
            .into_iter()
            .collect(),
            questions: vec![q(2, "Second"), q(1, "First")],
        };

        let blocks = render_final_results(&final_results);
        let texts: Vec<&str> = blocks.iter().map(|b| b.text.as_str()).collect();
        assert_eq!(texts, ["Second", "First", "Question 77"]);
        assert_eq!(blocks[1].tally.rows[0].text, "second");
        assert_eq!(blocks[1].tally.rows[0].percentage, 75.0);
        assert_eq!(blocks[2].tally.rows[0].text, "Option 5");
    }
}
