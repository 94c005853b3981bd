//! Poll authoring: load a draft from disk, clean it up and save it.

use serde::Deserialize;
use shared::{QuestionKind, SaveOption, SavePollRequest, SavePollResponse, SaveQuestion};

use crate::config::Config;
use crate::error::EditorError;

/// A poll as written by hand. Database ids are zero for new rows.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PollDraft {
    #[serde(default, rename = "databaseId")]
    pub database_id: u64,
    pub title: String,
    #[serde(default)]
    pub questions: Vec<QuestionDraft>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct QuestionDraft {
    #[serde(default, rename = "databaseId")]
    pub database_id: u64,
    pub text: String,
    #[serde(default = "default_kind", rename = "type")]
    pub kind: QuestionKind,
    #[serde(default)]
    pub options: Vec<OptionDraft>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OptionDraft {
    #[serde(default, rename = "databaseId")]
    pub database_id: u64,
    pub text: String,
}

fn default_kind() -> QuestionKind {
    QuestionKind::SingleSelect
}

impl PollDraft {
    /// Drop blank options, then questions that are blank or left without
    /// options. Fails if no question survives.
    pub fn into_request(self) -> Result<SavePollRequest, EditorError> {
        let questions: Vec<SaveQuestion> = self
            .questions
            .into_iter()
            .filter_map(|q| {
                let text = q.text.trim().to_string();
                if text.is_empty() {
                    return None;
                }
                let options: Vec<SaveOption> = q
                    .options
                    .into_iter()
                    .filter(|o| !o.text.trim().is_empty())
                    .map(|o| SaveOption {
                        database_id: o.database_id,
                        text: o.text.trim().to_string(),
                    })
                    .collect();
                if options.is_empty() {
                    return None;
                }
                Some(SaveQuestion {
                    database_id: q.database_id,
                    text,
                    kind: q.kind,
                    options,
                })
            })
            .collect();

        if questions.is_empty() {
            return Err(EditorError::NoQuestions);
        }
        Ok(SavePollRequest {
            title: self.title.trim().to_string(),
            questions,
            database_id: self.database_id,
        })
    }
}

/// Read a JSON draft. `~` is expanded.
pub async fn load_draft(path: &str) -> Result<PollDraft, EditorError> {
    let expanded = shellexpand::tilde(path).to_string();
    let raw = tokio::fs::read_to_string(&expanded)
        .await
        .map_err(|source| EditorError::Read {
            path: expanded.clone(),
            source,
        })?;
    Ok(serde_json::from_str(&raw)?)
}

/// Save a draft and return the poll id the server assigned.
pub async fn save_poll(
    client: &reqwest::Client,
    config: &Config,
    draft: PollDraft,
) -> Result<String, EditorError> {
    let request = draft.into_request()?;
    let mut req = client
        .post(format!("{}/admin/polls/save", config.server_url))
        .json(&request);
    if let Some(cookie) = &config.session_cookie {
        req = req.header(reqwest::header::COOKIE, cookie);
    }
    let res = req.send().await?;
    let status = res.status();
    let body: SavePollResponse = res.json().await.unwrap_or_default();

    if status.is_success() {
        if let Some(poll_id) = body.poll_id.filter(|id| !id.is_empty()) {
            tracing::info!(poll_id = %poll_id, questions = request.questions.len(), "poll saved");
            return Ok(poll_id);
        }
    }

    let reason = body
        .error
        .or(body.message)
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| {
            if status.is_success() {
                "server did not return a poll id".to_string()
            } else {
                status
                    .canonical_reason()
                    .unwrap_or("unexpected status")
                    .to_string()
            }
        });
    tracing::warn!(status = %status, reason = %reason, "poll save rejected");
    Err(EditorError::Rejected(reason))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::{json, Value};

    fn draft(value: Value) -> PollDraft {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn drops_blank_questions_and_options() {
        let request = draft(json!({
            "title": " Team lunch ",
            "questions": [
                {"text": "Where?", "options": [{"text": "Pizza"}, {"text": "  "}, {"text": "Tacos"}]},
                {"text": "   ", "options": [{"text": "ignored"}]},
                {"text": "When?", "type": "multi-select", "options": [{"text": ""}]},
                {"databaseId": 7, "text": "Drinks?", "type": "multi-select",
                 "options": [{"databaseId": 70, "text": "Water"}]}
            ]
        }))
        .into_request()
        .unwrap();

        assert_eq!(request.title, "Team lunch");
        assert_eq!(request.database_id, 0);
        assert_eq!(request.questions.len(), 2);
        assert_eq!(request.questions[0].kind, QuestionKind::SingleSelect);
        let texts: Vec<&str> = request.questions[0]
            .options
            .iter()
            .map(|o| o.text.as_str())
            .collect();
        assert_eq!(texts, ["Pizza", "Tacos"]);
        assert_eq!(request.questions[1].database_id, 7);
        assert_eq!(request.questions[1].kind, QuestionKind::MultiSelect);
        assert_eq!(request.questions[1].options[0].database_id, 70);
    }

    #[test]
    fn empty_poll_is_rejected() {
        let err = draft(json!({
            "title": "Nothing",
            "questions": [{"text": "Blank options", "options": [{"text": " "}]}]
        }))
        .into_request()
        .unwrap_err();
        assert!(matches!(err, EditorError::NoQuestions));
    }

    async fn serve(app: Router) -> Config {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        Config::for_server(format!("http://{}", addr))
    }

    fn lunch() -> PollDraft {
        draft(json!({
            "title": "Lunch",
            "questions": [{"text": "Where?", "options": [{"text": "Pizza"}]}]
        }))
    }

    #[tokio::test]
    async fn save_returns_poll_id_and_forwards_cookie() {
        async fn save(headers: HeaderMap, Json(req): Json<Value>) -> (StatusCode, Json<Value>) {
            let cookie = headers
                .get("cookie")
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default();
            if cookie != "session=abc" || req["questions"][0]["options"][0]["Text"] != "Pizza" {
                return (StatusCode::BAD_REQUEST, Json(json!({"error": "bad request"})));
            }
            (
                StatusCode::OK,
                Json(json!({"pollId": "f00d", "message": "Poll saved successfully"})),
            )
        }

        let mut config = serve(Router::new().route("/admin/polls/save", post(save))).await;
        config.session_cookie = Some("session=abc".to_string());

        let poll_id = save_poll(&reqwest::Client::new(), &config, lunch())
            .await
            .unwrap();
        assert_eq!(poll_id, "f00d");
    }

    #[tokio::test]
    async fn save_surfaces_server_error() {
        async fn save() -> (StatusCode, Json<Value>) {
            (
                StatusCode::BAD_REQUEST,
                Json(json!({"error": "Poll title cannot be empty"})),
            )
        }

        let config = serve(Router::new().route("/admin/polls/save", post(save))).await;
        let err = save_poll(&reqwest::Client::new(), &config, lunch())
            .await
            .unwrap_err();
        match err {
            EditorError::Rejected(reason) => assert_eq!(reason, "Poll title cannot be empty"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn load_reports_missing_file() {
        let err = load_draft("/nonexistent/livepoll/draft.json")
            .await
            .unwrap_err();
        assert!(matches!(err, EditorError::Read { .. }));
    }
}
