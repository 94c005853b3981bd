//! Poll-state controller: the single source of truth for what a session shows.
//!
//! The controller owns the current [`ViewState`], feeds inbound frames through
//! the pure [`reducer`], calls the [`Presenter`] after every accepted
//! transition and validates outbound commands before handing them to the
//! [`CommandSink`]. It knows nothing about the transport.

pub mod reducer;

use std::collections::HashMap;

use shared::{
    AdminAction, ClientMessage, ProtocolError, QuestionKind, ResultsUpdate, ServerMessage,
    VoteTally,
};

use crate::error::{CommandError, VoteError};
use crate::sink::{CommandSink, Presenter};
use crate::view::{ViewState, ViewStatus};

/// Which commands a session may send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionRole {
    Voter,
    Admin,
}

pub struct PollStateController<P, C> {
    poll_id: String,
    role: SessionRole,
    voter_id: Option<String>,
    view: ViewState,
    channel_open: bool,
    /// Question the last vote went to; cleared when another question becomes current.
    voted_on: Option<u64>,
    /// Latest live tally per question, including ones that arrived late.
    tallies: HashMap<u64, VoteTally>,
    presenter: P,
    commands: C,
}

impl<P: Presenter, C: CommandSink> PollStateController<P, C> {
    pub fn new(poll_id: impl Into<String>, role: SessionRole, presenter: P, commands: C) -> Self {
        Self {
            poll_id: poll_id.into(),
            role,
            voter_id: None,
            view: ViewState::connecting(),
            channel_open: false,
            voted_on: None,
            tallies: HashMap::new(),
            presenter,
            commands,
        }
    }

    /// Attach a voter id to outgoing votes so the server can replace earlier
    /// single-select votes from the same voter.
    pub fn with_voter_id(mut self, voter_id: impl Into<String>) -> Self {
        self.voter_id = Some(voter_id.into());
        self
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn role(&self) -> SessionRole {
        self.role
    }

    pub fn poll_id(&self) -> &str {
        &self.poll_id
    }

    /// True once a vote went out for the question currently shown. Reopening
    /// voting on the same question keeps it set; the server only replaces
    /// single-select votes, so a second multi-select vote would count twice.
    pub fn has_voted(&self) -> bool {
        self.voted_on.is_some() && self.voted_on == self.view.current_question_id()
    }

    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    pub fn into_presenter(self) -> P {
        self.presenter
    }

    pub fn on_channel_open(&mut self) {
        if self.is_disconnected() {
            tracing::warn!("channel opened on a disconnected session; ignoring");
            return;
        }
        self.channel_open = true;
        self.view = ViewState::connecting();
        self.presenter.render(&self.view);
    }

    /// Handle one raw text frame. Malformed and unknown messages are logged and dropped.
    pub fn on_message(&mut self, raw: &str) {
        if self.is_disconnected() {
            tracing::debug!("ignoring message after disconnect");
            return;
        }
        match ServerMessage::parse(raw) {
            Ok(message) => self.handle(message),
            Err(ProtocolError::UnknownType(kind)) => {
                tracing::warn!(kind = %kind, "unknown message type");
            }
            Err(e) => tracing::warn!(error = %e, "dropping malformed message"),
        }
    }

    pub fn handle(&mut self, message: ServerMessage) {
        if self.is_disconnected() {
            return;
        }
        match message {
            ServerMessage::PollStateUpdate(update) => {
                match reducer::reduce(&self.view, update, &self.tallies) {
                    Ok(next) => self.accept(next),
                    Err(e) => tracing::warn!(error = %e, "keeping current view"),
                }
            }
            ServerMessage::ResultsUpdate(update) => self.on_results_update(update),
            ServerMessage::Error(err) => {
                tracing::info!(server_message = %err.message, "server reported error");
                self.presenter.notify(&err.message);
            }
        }
    }

    pub fn on_channel_close(&mut self) {
        if self.is_disconnected() {
            return;
        }
        tracing::info!(poll_id = %self.poll_id, "disconnected from poll");
        self.channel_open = false;
        self.view = ViewState::disconnected();
        self.presenter.render(&self.view);
    }

    /// Transport failure: surface it, then end the session.
    pub fn on_channel_error(&mut self, reason: &str) {
        if self.is_disconnected() {
            return;
        }
        tracing::warn!(reason, "channel error");
        self.presenter.notify(reason);
        self.on_channel_close();
    }

    /// Surface a message to the user without touching the view.
    pub fn notify(&mut self, message: &str) {
        self.presenter.notify(message);
    }

    pub fn submit_vote(&mut self, question_id: u64, selected: &[u64]) -> Result<(), VoteError> {
        if !self.channel_open || self.is_disconnected() {
            return Err(VoteError::NotConnected);
        }
        if self.view.status != ViewStatus::Active {
            return Err(VoteError::NotActive(self.view.status.as_str()));
        }
        let question = self
            .view
            .current_question
            .as_ref()
            .filter(|q| q.id == question_id)
            .ok_or(VoteError::WrongQuestion(question_id))?;
        if self.voted_on == Some(question_id) {
            return Err(VoteError::AlreadyVoted);
        }
        if selected.is_empty() {
            return Err(VoteError::EmptySelection);
        }
        if question.kind == QuestionKind::SingleSelect && selected.len() != 1 {
            return Err(VoteError::TooManySelected(selected.len()));
        }
        if let Some(&unknown) = selected.iter().find(|&&id| question.option(id).is_none()) {
            return Err(VoteError::UnknownOption(unknown));
        }

        self.commands.send(ClientMessage::SubmitVote {
            poll_id: self.poll_id.clone(),
            question_id,
            selected_options: selected.to_vec(),
            voter_id: self.voter_id.clone(),
        })?;
        self.voted_on = Some(question_id);
        tracing::info!(question_id, options = selected.len(), "vote submitted");
        Ok(())
    }

    /// Vote on whichever question is on screen.
    pub fn vote_on_current(&mut self, selected: &[u64]) -> Result<(), VoteError> {
        if !self.channel_open || self.is_disconnected() {
            return Err(VoteError::NotConnected);
        }
        let question_id = self
            .view
            .current_question_id()
            .ok_or(VoteError::NotActive(self.view.status.as_str()))?;
        self.submit_vote(question_id, selected)
    }

    /// Send an admin command. The view only changes when the server echoes a
    /// new poll_state_update.
    pub fn send_admin_action(&mut self, action: AdminAction) -> Result<(), CommandError> {
        if self.role != SessionRole::Admin {
            return Err(CommandError::NotAdmin);
        }
        if !self.channel_open || self.is_disconnected() {
            return Err(CommandError::NotConnected);
        }
        self.commands.send(ClientMessage::AdminAction {
            poll_id: self.poll_id.clone(),
            action,
        })?;
        tracing::info!(action = action.as_str(), "admin action sent");
        Ok(())
    }

    fn is_disconnected(&self) -> bool {
        self.view.status == ViewStatus::Disconnected
    }

    fn accept(&mut self, next: ViewState) {
        if let Some(id) = next.current_question_id() {
            if self.voted_on.is_some_and(|voted| voted != id) {
                self.voted_on = None;
            }
        }
        self.view = next;
        tracing::debug!(status = self.view.status.as_str(), "poll state updated");
        self.presenter.render(&self.view);
    }

    fn on_results_update(&mut self, update: ResultsUpdate) {
        let next = reducer::apply_tally(&self.view, &update, self.role);
        self.tallies.insert(update.question_id, update.votes);
        match next {
            Some(next) => {
                self.view = next;
                self.presenter.render(&self.view);
            }
            None => tracing::debug!(
                question_id = update.question_id,
                "tally stored without visible effect"
            ),
        }
    }
}
