//! Collaborators the controller talks to: the screen and the server.

use shared::ClientMessage;
use tokio::sync::mpsc;

use crate::error::SendError;
use crate::view::ViewState;

/// Rendering and notification side of a session.
pub trait Presenter {
    /// Called after every accepted transition.
    fn render(&mut self, view: &ViewState);

    /// User-visible failure or server error.
    fn notify(&mut self, message: &str);
}

/// Outbound command channel. Fire-and-forget; no acknowledgement.
pub trait CommandSink {
    fn send(&self, command: ClientMessage) -> Result<(), SendError>;
}

impl CommandSink for mpsc::UnboundedSender<ClientMessage> {
    fn send(&self, command: ClientMessage) -> Result<(), SendError> {
        mpsc::UnboundedSender::send(self, command).map_err(|_| SendError)
    }
}
