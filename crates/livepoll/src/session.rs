//! WebSocket session: owns the socket and drives a [`PollStateController`].

use anyhow::Result;
use futures_util::{SinkExt, StreamExt};
use shared::{AdminAction, ClientMessage};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

use crate::config::Config;
use crate::controller::{PollStateController, SessionRole};
use crate::sink::Presenter;

/// Something the user asked for, already parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserCommand {
    Vote(Vec<u64>),
    Admin(AdminAction),
    Quit,
}

/// Socket URL for a poll. The poll id is percent-encoded as one path segment;
/// admin sessions add `?role=admin`.
pub fn ws_url(ws_base: &str, poll_id: &str, role: SessionRole) -> Result<String> {
    let mut url = reqwest::Url::parse(ws_base)
        .map_err(|e| anyhow::anyhow!("invalid server url {}: {}", ws_base, e))?;
    url.path_segments_mut()
        .map_err(|_| anyhow::anyhow!("server url {} cannot take a path", ws_base))?
        .pop_if_empty()
        .push("ws")
        .push(poll_id);
    if role == SessionRole::Admin {
        url.set_query(Some("role=admin"));
    }
    Ok(url.to_string())
}

/// Connect to a poll and run until the server closes, the transport fails or
/// the user quits. Returns the presenter so callers can inspect what was shown.
pub async fn run_session<P: Presenter>(
    config: &Config,
    poll_id: &str,
    role: SessionRole,
    presenter: P,
    mut input: mpsc::Receiver<UserCommand>,
) -> Result<P> {
    let url = ws_url(&config.ws_base(), poll_id, role)?;
    let (ws, _) = connect_async(url.as_str())
        .await
        .map_err(|e| anyhow::anyhow!("failed to connect to {}: {}", url, e))?;
    tracing::info!(poll_id, role = ?role, "connected to poll");

    let (mut ws_tx, mut ws_rx) = ws.split();
    let (cmd_tx, mut cmd_rx) = mpsc::unbounded_channel::<ClientMessage>();
    let mut controller = PollStateController::new(poll_id, role, presenter, cmd_tx)
        .with_voter_id(config.voter_id.clone());
    controller.on_channel_open();

    let mut input_open = true;
    loop {
        tokio::select! {
            frame = ws_rx.next() => match frame {
                Some(Ok(Message::Text(text))) => controller.on_message(&text),
                Some(Ok(Message::Close(_))) | None => {
                    controller.on_channel_close();
                    break;
                }
                Some(Ok(_)) => continue,
                Some(Err(e)) => {
                    controller.on_channel_error(&format!("connection error: {}", e));
                    break;
                }
            },
            Some(command) = cmd_rx.recv() => {
                let text = match serde_json::to_string(&command) {
                    Ok(text) => text,
                    Err(e) => {
                        tracing::warn!(error = %e, kind = command.kind(), "failed to encode command");
                        continue;
                    }
                };
                if let Err(e) = ws_tx.send(Message::Text(text)).await {
                    controller.on_channel_error(&format!("failed to send {}: {}", command.kind(), e));
                    break;
                }
            }
            command = input.recv(), if input_open => match command {
                Some(UserCommand::Vote(selected)) => {
                    if let Err(e) = controller.vote_on_current(&selected) {
                        controller.notify(&e.to_string());
                    }
                }
                Some(UserCommand::Admin(action)) => {
                    if let Err(e) = controller.send_admin_action(action) {
                        controller.notify(&e.to_string());
                    }
                }
                Some(UserCommand::Quit) => {
                    if let Err(e) = ws_tx.send(Message::Close(None)).await {
                        tracing::debug!(error = %e, "close frame not sent");
                    }
                    controller.on_channel_close();
                    break;
                }
                None => input_open = false,
            },
        }
    }

    Ok(controller.into_presenter())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::{ViewState, ViewStatus};
    use serde_json::{json, Value};
    use std::time::Duration;
    use tokio::net::TcpListener;

    struct Signal {
        statuses: mpsc::UnboundedSender<ViewStatus>,
        last: Option<ViewStatus>,
        notices: Vec<String>,
    }

    impl Presenter for Signal {
        fn render(&mut self, view: &ViewState) {
            self.last = Some(view.status);
            let _ = self.statuses.send(view.status);
        }

        fn notify(&mut self, message: &str) {
            self.notices.push(message.to_string());
        }
    }

    #[test]
    fn builds_socket_urls() {
        assert_eq!(
            ws_url("ws://localhost:8080", "abc123", SessionRole::Voter).unwrap(),
            "ws://localhost:8080/ws/abc123"
        );
        assert_eq!(
            ws_url("wss://polls.example.com/", "abc123", SessionRole::Admin).unwrap(),
            "wss://polls.example.com/ws/abc123?role=admin"
        );
    }

    #[test]
    fn poll_id_stays_one_path_segment() {
        assert_eq!(
            ws_url("ws://localhost:8080", "a/b?role=admin", SessionRole::Voter).unwrap(),
            "ws://localhost:8080/ws/a%2Fb%3Frole=admin"
        );
        assert!(ws_url("not a url", "abc123", SessionRole::Voter).is_err());
    }

    #[tokio::test]
    async fn renders_server_state_and_sends_votes() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
            let update = json!({
                "type": "poll_state_update",
                "pollId": "abc123",
                "status": "active",
                "currentQuestion": {
                    "ID": 3,
                    "text": "Lunch?",
                    "type": "single-select",
                    "options": [{"ID": 11, "text": "Pizza"}, {"ID": 12, "text": "Salad"}]
                }
            });
            ws.send(Message::Text(update.to_string())).await.unwrap();

            let vote = loop {
                match ws.next().await {
                    Some(Ok(Message::Text(text))) => break text,
                    Some(Ok(_)) => continue,
                    other => panic!("no vote received: {:?}", other),
                }
            };
            ws.close(None).await.unwrap();
            vote
        });

        let mut config = Config::for_server(format!("http://{}", addr));
        config.voter_id = "voter-1".to_string();
        let (status_tx, mut status_rx) = mpsc::unbounded_channel();
        let presenter = Signal {
            statuses: status_tx,
            last: None,
            notices: Vec::new(),
        };
        let (input_tx, input_rx) = mpsc::channel(8);

        let driver = async move {
            while let Some(status) = status_rx.recv().await {
                if status == ViewStatus::Active {
                    input_tx.send(UserCommand::Vote(vec![11])).await.unwrap();
                    break;
                }
            }
        };
        let session = run_session(&config, "abc123", SessionRole::Voter, presenter, input_rx);

        let (presenter, ()) = tokio::time::timeout(Duration::from_secs(5), async {
            tokio::join!(session, driver)
        })
        .await
        .unwrap();
        let presenter = presenter.unwrap();

        let vote: Value = serde_json::from_str(&server.await.unwrap()).unwrap();
        assert_eq!(vote["type"], "submit_vote");
        assert_eq!(vote["pollId"], "abc123");
        assert_eq!(vote["questionId"], "3");
        assert_eq!(vote["selectedOptions"], json!(["11"]));
        assert_eq!(vote["voterId"], "voter-1");

        assert_eq!(presenter.last, Some(ViewStatus::Disconnected));
        assert!(presenter.notices.is_empty());
    }
}
