// ============================================================
// Layer 2 — Chat Use Case
// ============================================================
// A running conversation with the teaching assistant. Each
// question is sent through a QuestionAnswerer (the HTTP client
// in production); the transcript keeps both sides plus any media
// links the assistant returned.
//
// A failed request never ends the session: it becomes one more
// assistant message telling the learner to try again.

use crate::domain::traits::QuestionAnswerer;

pub const UNREACHABLE_REPLY: &str = "Could not reach the assistant. Please try again.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub text:      String,
    pub from_user: bool,
    pub video_url: Option<String>,
    pub audio_url: Option<String>,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self { text: text.into(), from_user: true, video_url: None, audio_url: None }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self { text: text.into(), from_user: false, video_url: None, audio_url: None }
    }
}

pub struct Conversation {
    answerer: Box<dyn QuestionAnswerer>,
    messages: Vec<ChatMessage>,
}

impl Conversation {
    pub fn new(answerer: Box<dyn QuestionAnswerer>) -> Self {
        Self { answerer, messages: Vec::new() }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Ask one question and return the assistant's reply.
    ///
    /// Blank questions are ignored and return None.
    pub fn ask(&mut self, question: &str) -> Option<&ChatMessage> {
        let question = question.trim();
        if question.is_empty() {
            return None;
        }

        self.messages.push(ChatMessage::user(question));
        tracing::info!("Asking the assistant ({} chars)", question.len());

        let reply = match self.answerer.answer(question) {
            Ok(answer) => ChatMessage {
                text:      answer.text,
                from_user: false,
                video_url: answer.video_url,
                audio_url: answer.audio_url,
            },
            Err(e) => {
                tracing::warn!("Assistant request failed: {:#}", e);
                ChatMessage::assistant(UNREACHABLE_REPLY)
            }
        };

        self.messages.push(reply);
        self.messages.last()
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::traits::Answer;
    use std::sync::{Arc, Mutex};

    struct ScriptedAnswerer {
        reply: Option<Answer>,
        asked: Arc<Mutex<Vec<String>>>,
    }

    impl QuestionAnswerer for ScriptedAnswerer {
        fn answer(&self, question: &str) -> anyhow::Result<Answer> {
            self.asked.lock().unwrap().push(question.to_string());
            self.reply.clone().ok_or_else(|| anyhow::anyhow!("connection refused"))
        }
    }

    fn conversation(reply: Option<Answer>) -> (Conversation, Arc<Mutex<Vec<String>>>) {
        let asked = Arc::new(Mutex::new(Vec::new()));
        let conv  = Conversation::new(Box::new(ScriptedAnswerer { reply, asked: asked.clone() }));
        (conv, asked)
    }

    #[test]
    fn test_answer_is_appended_with_media() {
        let answer = Answer {
            text:      "Four".into(),
            video_url: Some("http://127.0.0.1:8000/videos/suma.mp4".into()),
            audio_url: None,
        };
        let (mut conv, asked) = conversation(Some(answer));

        let reply = conv.ask("  what is 2+2?  ").cloned().unwrap();
        assert_eq!(reply.text, "Four");
        assert!(!reply.from_user);
        assert_eq!(reply.video_url.as_deref(), Some("http://127.0.0.1:8000/videos/suma.mp4"));

        assert_eq!(conv.messages().len(), 2);
        assert_eq!(conv.messages()[0], ChatMessage::user("what is 2+2?"));
        assert_eq!(*asked.lock().unwrap(), vec!["what is 2+2?".to_string()]);
    }

    #[test]
    fn test_blank_question_is_ignored() {
        let (mut conv, asked) = conversation(Some(Answer::text_only("unused")));
        assert!(conv.ask("   \n").is_none());
        assert!(conv.messages().is_empty());
        assert!(asked.lock().unwrap().is_empty());
    }

    #[test]
    fn test_failure_becomes_generic_reply() {
        let (mut conv, _) = conversation(None);
        let reply = conv.ask("hello").cloned().unwrap();
        assert_eq!(reply, ChatMessage::assistant(UNREACHABLE_REPLY));
        assert_eq!(conv.messages().len(), 2);

        // Still usable afterwards.
        assert!(conv.ask("again").is_some());
        assert_eq!(conv.messages().len(), 4);
    }
}
