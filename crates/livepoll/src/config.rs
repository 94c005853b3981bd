//! Configuration for the poll client.
//!
//! Optional env: POLL_SERVER_URL, VOTER_ID, POLL_SESSION_COOKIE

use uuid::Uuid;

use crate::error::ConfigError;

const DEFAULT_SERVER_URL: &str = "http://localhost:8080";

/// Client configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP base of the poll server, without a trailing slash.
    pub server_url: String,
    /// Sent with every vote; generated per session when not configured.
    pub voter_id: String,
    /// Forwarded as the `Cookie` header on poll editor requests.
    pub session_cookie: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let server_url = non_empty("POLL_SERVER_URL")
            .map(|s| s.trim().trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_SERVER_URL.to_string());
        if !server_url.starts_with("http://") && !server_url.starts_with("https://") {
            return Err(ConfigError::InvalidServerUrl(server_url));
        }
        let voter_id = non_empty("VOTER_ID").unwrap_or_else(|| Uuid::new_v4().to_string());
        let session_cookie = non_empty("POLL_SESSION_COOKIE");

        Ok(Self {
            server_url,
            voter_id,
            session_cookie,
        })
    }

    pub fn for_server(server_url: impl Into<String>) -> Self {
        Self {
            server_url: server_url.into(),
            voter_id: Uuid::new_v4().to_string(),
            session_cookie: None,
        }
    }

    /// Websocket base derived from the HTTP base (http -> ws, https -> wss).
    pub fn ws_base(&self) -> String {
        if let Some(rest) = self.server_url.strip_prefix("https://") {
            format!("wss://{}", rest)
        } else if let Some(rest) = self.server_url.strip_prefix("http://") {
            format!("ws://{}", rest)
        } else {
            self.server_url.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.server_url, DEFAULT_SERVER_URL);
        assert_eq!(config.ws_base(), "ws://localhost:8080");
        assert!(Uuid::parse_str(&config.voter_id).is_ok());
        assert!(config.session_cookie.is_none());
    }

    #[test]
    fn reads_values_and_trims_trailing_slash() {
        let config = Config::from_lookup(lookup(&[
            ("POLL_SERVER_URL", "https://polls.example.com/"),
            ("VOTER_ID", "desk-12"),
            ("POLL_SESSION_COOKIE", "mysession=abc"),
        ]))
        .unwrap();
        assert_eq!(config.server_url, "https://polls.example.com");
        assert_eq!(config.ws_base(), "wss://polls.example.com");
        assert_eq!(config.voter_id, "desk-12");
        assert_eq!(config.session_cookie.as_deref(), Some("mysession=abc"));
    }

    #[test]
    fn blank_values_fall_back() {
        let config =
            Config::from_lookup(lookup(&[("POLL_SERVER_URL", "  "), ("VOTER_ID", "")])).unwrap();
        assert_eq!(config.server_url, DEFAULT_SERVER_URL);
        assert!(!config.voter_id.is_empty());
    }

    #[test]
    fn rejects_non_http_server_url() {
        let err = Config::from_lookup(lookup(&[("POLL_SERVER_URL", "ws://localhost:8080")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidServerUrl(_)));
    }
}
