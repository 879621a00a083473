// ============================================================
// Layer 6 — Assistant Chat Client
// ============================================================
// Blocking client for the assistant's question-answering HTTP API.
//
//   POST {base}/ask   {"question": "..."}
//     -> {"answer": "...", "video_url": "/videos/x.mp4"?, "audio_url": "/audio/y.mp3"?}
//   GET  {base}/      -> {"status": "...", "version": "..."}
//
// The server hands out media paths relative to itself; they are
// resolved against the base URL before reaching callers.

use std::time::Duration;

use reqwest::{blocking::Client, Url};
use serde::{Deserialize, Serialize};

use crate::domain::traits::{Answer, QuestionAnswerer};
use crate::infra::config::ChatSettings;

#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("invalid base URL '{0}'")]
    InvalidUrl(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("server answered with HTTP {0}")]
    Status(u16),

    #[error("malformed response: {0}")]
    MalformedPayload(String),
}

#[derive(Serialize)]
struct AskRequest<'a> {
    question: &'a str,
}

#[derive(Deserialize)]
struct AskResponse {
    answer: String,
    #[serde(default)]
    video_url: Option<String>,
    #[serde(default)]
    audio_url: Option<String>,
}

#[derive(Deserialize)]
struct HealthResponse {
    status: String,
    #[serde(default)]
    version: Option<String>,
}

pub struct ChatClient {
    base:   Url,
    client: Client,
}

impl ChatClient {
    pub fn new(settings: &ChatSettings) -> Result<Self, ChatError> {
        let mut raw = settings.base_url.trim().to_string();
        if !raw.ends_with('/') {
            raw.push('/');
        }
        let base = Url::parse(&raw).map_err(|_| ChatError::InvalidUrl(settings.base_url.clone()))?;
        if base.cannot_be_a_base() {
            return Err(ChatError::InvalidUrl(settings.base_url.clone()));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs.max(1)))
            .build()
            .map_err(|e| ChatError::Transport(e.to_string()))?;

        Ok(Self { base, client })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Send one question and return the answer with absolute media links.
    pub fn ask(&self, question: &str) -> Result<Answer, ChatError> {
        let url = self.endpoint("ask")?;
        tracing::debug!("POST {}", url);

        let response = self
            .client
            .post(url)
            .json(&AskRequest { question })
            .send()
            .map_err(transport)?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!("Assistant returned HTTP {}", status.as_u16());
            return Err(ChatError::Status(status.as_u16()));
        }

        let body: AskResponse = response
            .json()
            .map_err(|e| ChatError::MalformedPayload(e.to_string()))?;

        Ok(Answer {
            text:      body.answer,
            video_url: body.video_url.as_deref().and_then(|p| self.resolve_media(p)),
            audio_url: body.audio_url.as_deref().and_then(|p| self.resolve_media(p)),
        })
    }

    /// Probe `GET {base}/` and return the status line the service reports.
    pub fn health(&self) -> Result<String, ChatError> {
        let response = self
            .client
            .get(self.base.clone())
            .send()
            .map_err(transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ChatError::Status(status.as_u16()));
        }

        let body: HealthResponse = response
            .json()
            .map_err(|e| ChatError::MalformedPayload(e.to_string()))?;

        Ok(match body.version {
            Some(v) => format!("{} (version {})", body.status, v),
            None    => body.status,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, ChatError> {
        self.base
            .join(path)
            .map_err(|_| ChatError::InvalidUrl(format!("{}{}", self.base, path)))
    }

    /// Absolute URLs pass through; `/audio/x.mp3` and `audio/x.mp3`
    /// are both taken relative to the base path. Blank paths are dropped.
    fn resolve_media(&self, path: &str) -> Option<String> {
        let path = path.trim();
        if path.is_empty() {
            return None;
        }
        if let Ok(absolute) = Url::parse(path) {
            return Some(absolute.to_string());
        }
        match self.base.join(path.trim_start_matches('/')) {
            Ok(url) => Some(url.to_string()),
            Err(e) => {
                tracing::warn!("Dropping unusable media path '{}': {}", path, e);
                None
            }
        }
    }
}

fn transport(e: reqwest::Error) -> ChatError {
    if e.is_timeout() {
        ChatError::Transport(format!("request timed out: {e}"))
    } else if e.is_connect() {
        ChatError::Transport(format!("cannot connect: {e}"))
    } else {
        ChatError::Transport(e.to_string())
    }
}

impl QuestionAnswerer for ChatClient {
    fn answer(&self, question: &str) -> anyhow::Result<Answer> {
        Ok(self.ask(question)?)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread;

    /// Serve exactly one canned HTTP response on a loopback port.
    fn serve_once(status_line: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr     = listener.local_addr().unwrap();

        thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut buf = [0u8; 4096];
            let _ = stream.read(&mut buf);
            let reply = format!(
                "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len(),
            );
            let _ = stream.write_all(reply.as_bytes());
        });

        format!("http://{addr}")
    }

    fn client_for(base_url: String) -> ChatClient {
        ChatClient::new(&ChatSettings { base_url, timeout_secs: 5 }).unwrap()
    }

    #[test]
    fn test_answer_with_relative_media() {
        let base   = serve_once("200 OK", r#"{"answer":"Two plus two is four","video_url":"/videos/suma.mp4","audio_url":"/audio/a1.mp3"}"#);
        let answer = client_for(base.clone()).ask("how much is 2+2?").unwrap();

        assert_eq!(answer.text,      "Two plus two is four");
        assert_eq!(answer.video_url, Some(format!("{base}/videos/suma.mp4")));
        assert_eq!(answer.audio_url, Some(format!("{base}/audio/a1.mp3")));
    }

    #[test]
    fn test_answer_without_media() {
        let base   = serve_once("200 OK", r#"{"answer":"Hola","video_url":null}"#);
        let answer = client_for(base).ask("hi").unwrap();
        assert_eq!(answer, Answer::text_only("Hola"));
    }

    #[test]
    fn test_non_success_status() {
        let base = serve_once("500 Internal Server Error", r#"{"detail":"boom"}"#);
        assert!(matches!(client_for(base).ask("q"), Err(ChatError::Status(500))));
    }

    #[test]
    fn test_malformed_payload() {
        let base = serve_once("200 OK", r#"{"text":"wrong field"}"#);
        assert!(matches!(client_for(base).ask("q"), Err(ChatError::MalformedPayload(_))));
    }

    #[test]
    fn test_unreachable_server_is_transport_error() {
        let port = {
            let l = TcpListener::bind("127.0.0.1:0").unwrap();
            l.local_addr().unwrap().port()
        };
        let result = client_for(format!("http://127.0.0.1:{port}")).ask("q");
        assert!(matches!(result, Err(ChatError::Transport(_))));
    }

    #[test]
    fn test_health_reports_status() {
        let base = serve_once("200 OK", r#"{"status":"AulaWrite API OK","version":"1.0"}"#);
        assert_eq!(client_for(base).health().unwrap(), "AulaWrite API OK (version 1.0)");
    }

    #[test]
    fn test_invalid_base_url() {
        let result = ChatClient::new(&ChatSettings { base_url: "not a url".into(), timeout_secs: 5 });
        assert!(matches!(result, Err(ChatError::InvalidUrl(_))));
    }

    #[test]
    fn test_base_path_is_kept() {
        let client = client_for("http://example.test/rag".into());
        assert_eq!(client.endpoint("ask").unwrap().as_str(), "http://example.test/rag/ask");
        assert_eq!(
            client.resolve_media("/audio/x.mp3").as_deref(),
            Some("http://example.test/rag/audio/x.mp3")
        );
        assert_eq!(
            client.resolve_media("https://cdn.test/v.mp4").as_deref(),
            Some("https://cdn.test/v.mp4")
        );
        assert_eq!(client.resolve_media("  "), None);
    }
}
