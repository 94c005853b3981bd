//! Poll domain models and websocket message shapes.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Poll lifecycle status as declared by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PollStatus {
    Setup,
    Active,
    Results,
    Finished,
}

impl PollStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Setup => "setup",
            Self::Active => "active",
            Self::Results => "results",
            Self::Finished => "finished",
        }
    }
}

/// How many options a voter may pick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuestionKind {
    SingleSelect,
    MultiSelect,
}

/// One answer choice of a question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollOption {
    #[serde(rename = "ID", deserialize_with = "wire_id::deserialize")]
    pub id: u64,
    pub text: String,
}

/// Option id (as the server keys it) -> vote count, for a single question.
pub type VoteTally = BTreeMap<String, u64>;

/// A poll question with its ordered options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    #[serde(rename = "ID", deserialize_with = "wire_id::deserialize")]
    pub id: u64,
    pub text: String,
    #[serde(rename = "type")]
    pub kind: QuestionKind,
    #[serde(default)]
    pub options: Vec<PollOption>,
    /// Counts the server attaches to the current question.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub votes: Option<VoteTally>,
}

impl Question {
    pub fn option(&self, id: u64) -> Option<&PollOption> {
        self.options.iter().find(|o| o.id == id)
    }
}

/// Admin commands understood by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdminAction {
    Start,
    Next,
    ShowResults,
    Done,
}

impl AdminAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Next => "next",
            Self::ShowResults => "show_results",
            Self::Done => "done",
        }
    }
}

// --- WebSocket messages ---

/// WebSocket message types.
pub mod ws_types {
    pub const POLL_STATE_UPDATE: &str = "poll_state_update";
    pub const RESULTS_UPDATE: &str = "results_update";
    /// Older servers tag live tallies for admin sessions this way.
    pub const ADMIN_RESULTS_UPDATE: &str = "admin_results_update";
    pub const ERROR: &str = "error";
    pub const SUBMIT_VOTE: &str = "submit_vote";
    pub const ADMIN_ACTION: &str = "admin_action";
}

/// Reasons an inbound frame could not be turned into a [`ServerMessage`].
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("message has no type tag")]
    MissingType,
    #[error("unknown message type: {0}")]
    UnknownType(String),
    #[error("invalid {kind} payload: {source}")]
    Payload {
        kind: String,
        source: serde_json::Error,
    },
}

/// poll_state_update payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollStateUpdate {
    #[serde(rename = "pollId", default, skip_serializing_if = "Option::is_none")]
    pub poll_id: Option<String>,
    pub status: PollStatus,
    #[serde(
        rename = "currentQuestion",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub current_question: Option<Question>,
    /// Question id -> tally. Only sent once results are out.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub results: Option<BTreeMap<String, VoteTally>>,
    #[serde(
        rename = "allQuestions",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub all_questions: Option<Vec<Question>>,
}

/// results_update payload: live counts for one question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultsUpdate {
    #[serde(rename = "questionId", with = "wire_id")]
    pub question_id: u64,
    pub votes: VoteTally,
    #[serde(rename = "totalVotes", default, skip_serializing_if = "Option::is_none")]
    pub total_votes: Option<u64>,
}

/// error payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerError {
    #[serde(default)]
    pub message: String,
}

/// Messages pushed by the poll server.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerMessage {
    PollStateUpdate(PollStateUpdate),
    ResultsUpdate(ResultsUpdate),
    Error(ServerError),
}

impl ServerMessage {
    /// Parse a raw text frame, dispatching on its `type` tag.
    pub fn parse(raw: &str) -> Result<Self, ProtocolError> {
        let value: serde_json::Value = serde_json::from_str(raw)?;
        let kind = value
            .get("type")
            .and_then(|t| t.as_str())
            .ok_or(ProtocolError::MissingType)?
            .to_string();

        match kind.as_str() {
            ws_types::POLL_STATE_UPDATE => Ok(Self::PollStateUpdate(payload(value, &kind)?)),
            ws_types::RESULTS_UPDATE | ws_types::ADMIN_RESULTS_UPDATE => {
                Ok(Self::ResultsUpdate(payload(value, &kind)?))
            }
            ws_types::ERROR => Ok(Self::Error(payload(value, &kind)?)),
            _ => Err(ProtocolError::UnknownType(kind)),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::PollStateUpdate(_) => ws_types::POLL_STATE_UPDATE,
            Self::ResultsUpdate(_) => ws_types::RESULTS_UPDATE,
            Self::Error(_) => ws_types::ERROR,
        }
    }
}

fn payload<T: DeserializeOwned>(value: serde_json::Value, kind: &str) -> Result<T, ProtocolError> {
    serde_json::from_value(value).map_err(|source| ProtocolError::Payload {
        kind: kind.to_string(),
        source,
    })
}

/// Commands sent to the poll server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    SubmitVote {
        #[serde(rename = "pollId")]
        poll_id: String,
        #[serde(rename = "questionId", with = "wire_id")]
        question_id: u64,
        #[serde(rename = "selectedOptions", with = "wire_id::seq")]
        selected_options: Vec<u64>,
        #[serde(rename = "voterId", default, skip_serializing_if = "Option::is_none")]
        voter_id: Option<String>,
    },
    AdminAction {
        #[serde(rename = "pollId")]
        poll_id: String,
        action: AdminAction,
    },
}

impl ClientMessage {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SubmitVote { .. } => ws_types::SUBMIT_VOTE,
            Self::AdminAction { .. } => ws_types::ADMIN_ACTION,
        }
    }
}

// --- Poll authoring DTOs ---

/// Save poll request (`POST /admin/polls/save`). A zero database id means "create".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavePollRequest {
    pub title: String,
    pub questions: Vec<SaveQuestion>,
    #[serde(rename = "databaseId")]
    pub database_id: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveQuestion {
    #[serde(rename = "databaseId")]
    pub database_id: u64,
    pub text: String,
    #[serde(rename = "type")]
    pub kind: QuestionKind,
    pub options: Vec<SaveOption>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveOption {
    #[serde(rename = "DatabaseId")]
    pub database_id: u64,
    #[serde(rename = "Text")]
    pub text: String,
}

/// Save poll response. Failures carry `message` or `error` instead of `pollId`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SavePollResponse {
    #[serde(rename = "pollId", default, skip_serializing_if = "Option::is_none")]
    pub poll_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Ids arrive as numbers from some payloads and as decimal strings from others;
/// outbound they are always written as strings.
pub mod wire_id {
    use serde::{de, Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Num(u64),
        Str(String),
    }

    impl RawId {
        fn into_id<E: de::Error>(self) -> Result<u64, E> {
            match self {
                RawId::Num(n) => Ok(n),
                RawId::Str(s) => parse(&s).ok_or_else(|| E::custom(format!("invalid id {:?}", s))),
            }
        }
    }

    pub fn parse(raw: &str) -> Option<u64> {
        raw.trim().parse().ok()
    }

    pub fn serialize<S: Serializer>(id: &u64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&id.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        RawId::deserialize(deserializer)?.into_id()
    }

    pub mod seq {
        use super::RawId;
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(ids: &[u64], serializer: S) -> Result<S::Ok, S::Error> {
            serializer.collect_seq(ids.iter().map(|id| id.to_string()))
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Vec<u64>, D::Error> {
            Vec::<RawId>::deserialize(deserializer)?
                .into_iter()
                .map(RawId::into_id)
                .collect()
        }
    }
}
