//! Wire protocol and poll models shared across the livepoll crates.

mod models;

// Explicit re-exports (avoids rust-analyzer issues with `pub use models::*`)
pub use models::{wire_id, ws_types};
pub use models::{
    AdminAction, ClientMessage, PollOption, PollStateUpdate, PollStatus, ProtocolError, Question,
    QuestionKind, ResultsUpdate, SaveOption, SavePollRequest, SavePollResponse, SaveQuestion,
    ServerError, ServerMessage, VoteTally,
};
