use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single transcribed user request entering the orchestrator.
///
/// Produced by the transcription collaborator and consumed exactly once.
/// The core never learns how the text was captured.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Utterance {
    pub text: String,
    pub timestamp: DateTime<Utc>,
    pub session_id: Uuid,
}

impl Utterance {
    /// Creates an utterance stamped with the current time.
    pub fn new(text: impl Into<String>, session_id: Uuid) -> Self {
        Self {
            text: text.into(),
            timestamp: Utc::now(),
            session_id,
        }
    }

    /// True when the utterance carries no usable text.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_detection_ignores_whitespace() {
        let u = Utterance::new("   \n\t ", Uuid::new_v4());
        assert!(u.is_blank());

        let u = Utterance::new("help", Uuid::new_v4());
        assert!(!u.is_blank());
    }
}
