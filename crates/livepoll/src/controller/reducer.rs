//! Pure transitions: (view, message) -> view.

use std::collections::HashMap;

use shared::{PollStateUpdate, PollStatus, ResultsUpdate, VoteTally};

use crate::error::TransitionError;
use crate::view::{FinalResults, ViewState, ViewStatus};

use super::SessionRole;

/// Build the next view for a poll_state_update. `stored` holds the latest
/// live tally seen per question id.
pub fn reduce(
    state: &ViewState,
    update: PollStateUpdate,
    stored: &HashMap<u64, VoteTally>,
) -> Result<ViewState, TransitionError> {
    if state.status == ViewStatus::Disconnected {
        return Err(TransitionError::Disconnected);
    }

    let PollStateUpdate {
        status,
        current_question,
        results,
        all_questions,
        ..
    } = update;

    let next = match status {
        PollStatus::Setup => ViewState::with_status(ViewStatus::Setup),
        PollStatus::Active => {
            let question = current_question
                .ok_or(TransitionError::MissingCurrentQuestion(status.as_str()))?;
            ViewState {
                current_question: Some(question),
                ..ViewState::with_status(ViewStatus::Active)
            }
        }
        PollStatus::Results => {
            let live_tally = current_question.as_ref().map(|q| {
                q.votes
                    .clone()
                    .or_else(|| stored.get(&q.id).cloned())
                    .unwrap_or_default()
            });
            ViewState {
                status: ViewStatus::Results,
                current_question,
                live_tally,
                final_results: None,
            }
        }
        PollStatus::Finished => {
            let results = results.ok_or(TransitionError::MissingFinalResults("results"))?;
            let questions =
                all_questions.ok_or(TransitionError::MissingFinalResults("allQuestions"))?;
            ViewState {
                final_results: Some(FinalResults { results, questions }),
                ..ViewState::with_status(ViewStatus::Finished)
            }
        }
    };

    Ok(next)
}

/// Apply a live tally. Returns `None` when the tally has no visible effect:
/// wrong status, a tally for a question that is no longer current, or
/// running counts for a voter while voting is open.
pub fn apply_tally(
    state: &ViewState,
    update: &ResultsUpdate,
    role: SessionRole,
) -> Option<ViewState> {
    match (state.status, role) {
        (ViewStatus::Results, _) | (ViewStatus::Active, SessionRole::Admin) => {}
        _ => return None,
    }
    if state.current_question_id() != Some(update.question_id) {
        return None;
    }
    Some(ViewState {
        live_tally: Some(update.votes.clone()),
        ..state.clone()
    })
}
