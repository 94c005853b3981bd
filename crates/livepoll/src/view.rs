//! What the screen should show right now.

use std::collections::BTreeMap;

use shared::{PollStatus, Question, VoteTally};

/// Local status of a poll session. Wraps the server's [`PollStatus`] with the
/// two states only the client knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewStatus {
    Connecting,
    Setup,
    Active,
    Results,
    Finished,
    Disconnected,
}

impl ViewStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Connecting => "connecting",
            Self::Setup => "setup",
            Self::Active => "active",
            Self::Results => "results",
            Self::Finished => "finished",
            Self::Disconnected => "disconnected",
        }
    }
}

impl From<PollStatus> for ViewStatus {
    fn from(status: PollStatus) -> Self {
        match status {
            PollStatus::Setup => Self::Setup,
            PollStatus::Active => Self::Active,
            PollStatus::Results => Self::Results,
            PollStatus::Finished => Self::Finished,
        }
    }
}

/// Tallies for every question once the poll is over, with the questions
/// needed to turn ids back into text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalResults {
    pub results: BTreeMap<String, VoteTally>,
    pub questions: Vec<Question>,
}

/// Derived view of a poll session. Replaced wholesale on every accepted
/// transition; at most one of `live_tally` and `final_results` is set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewState {
    pub status: ViewStatus,
    pub current_question: Option<Question>,
    pub live_tally: Option<VoteTally>,
    pub final_results: Option<FinalResults>,
}

impl ViewState {
    pub fn with_status(status: ViewStatus) -> Self {
        Self {
            status,
            current_question: None,
            live_tally: None,
            final_results: None,
        }
    }

    pub fn connecting() -> Self {
        Self::with_status(ViewStatus::Connecting)
    }

    pub fn disconnected() -> Self {
        Self::with_status(ViewStatus::Disconnected)
    }

    pub fn current_question_id(&self) -> Option<u64> {
        self.current_question.as_ref().map(|q| q.id)
    }
}

impl Default for ViewState {
    fn default() -> Self {
        Self::connecting()
    }
}
