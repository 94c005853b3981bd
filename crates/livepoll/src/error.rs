//! Error types for the poll client.

use thiserror::Error;

/// A poll_state_update that cannot be applied. The current view is kept.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("{0} update carries no currentQuestion")]
    MissingCurrentQuestion(&'static str),
    #[error("finished update is missing {0}")]
    MissingFinalResults(&'static str),
    #[error("session is disconnected")]
    Disconnected,
}

/// The outbound command channel is gone.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("command channel closed")]
pub struct SendError;

/// Local validation failures for a vote. Nothing is sent when one is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VoteError {
    #[error("not connected to the poll")]
    NotConnected,
    #[error("voting is not open (poll is {0})")]
    NotActive(&'static str),
    #[error("question {0} is not the current question")]
    WrongQuestion(u64),
    #[error("you already voted on this question")]
    AlreadyVoted,
    #[error("please select at least one option")]
    EmptySelection,
    #[error("please select only one option for this question (got {0})")]
    TooManySelected(usize),
    #[error("option {0} does not belong to this question")]
    UnknownOption(u64),
    #[error(transparent)]
    Send(#[from] SendError),
}

/// Failures for admin commands.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("admin actions need an admin session")]
    NotAdmin,
    #[error("not connected to the poll")]
    NotConnected,
    #[error(transparent)]
    Send(#[from] SendError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("POLL_SERVER_URL must start with http:// or https:// (got {0:?})")]
    InvalidServerUrl(String),
}

/// Poll editor failures.
#[derive(Debug, Error)]
pub enum EditorError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("invalid poll draft: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("please add at least one question with options")]
    NoQuestions,
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("error saving poll: {0}")]
    Rejected(String),
}

/// Unparseable terminal input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("unknown command: {0} (try vote, start, next, results, done, quit)")]
    Unknown(String),
    #[error("invalid option id: {0}")]
    InvalidOption(String),
}
