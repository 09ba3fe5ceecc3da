use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::intent::{HazardKind, Intent};

/// A clarification the orchestrator is waiting on.
///
/// The draft intent keeps everything already classified so the next
/// utterance only has to supply the missing slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "slot", rename_all = "snake_case")]
pub enum PendingClarification {
    /// "Where are you located?": the next utterance is read as a
    /// location answer for the stored draft.
    Location { draft: Intent },
    /// Nothing classified; the next utterance is re-classified from
    /// scratch.
    Rephrase,
}

/// One completed turn, kept for context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnRecord {
    pub intent: Intent,
    pub timestamp: DateTime<Utc>,
}

/// Mutable per-session state, owned exclusively by the orchestrator.
///
/// Specialists receive a read-only borrow per turn and return new
/// values; there is no concurrent mutation, so no locking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationContext {
    pub session_id: Uuid,
    turns: Vec<TurnRecord>,
    known_location: Option<String>,
    known_hazard: Option<HazardKind>,
    pending: Option<PendingClarification>,
}

impl ConversationContext {
    pub fn new(session_id: Uuid) -> Self {
        Self {
            session_id,
            turns: Vec::new(),
            known_location: None,
            known_hazard: None,
            pending: None,
        }
    }

    /// Location remembered from earlier turns, if any.
    pub fn known_location(&self) -> Option<&str> {
        self.known_location.as_deref()
    }

    /// Hazard remembered from earlier turns, if any.
    pub fn known_hazard(&self) -> Option<HazardKind> {
        self.known_hazard
    }

    pub fn turns(&self) -> &[TurnRecord] {
        &self.turns
    }

    /// Takes the open clarification, leaving none pending.
    pub fn take_pending(&mut self) -> Option<PendingClarification> {
        self.pending.take()
    }

    pub fn set_pending(&mut self, pending: PendingClarification) {
        self.pending = Some(pending);
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Records a finished turn and refreshes the remembered slots.
    pub fn record_turn(&mut self, intent: &Intent) {
        if let Some(location) = &intent.location {
            self.known_location = Some(location.clone());
        }
        if let Some(hazard) = intent.hazard {
            self.known_hazard = Some(hazard);
        }
        self.turns.push(TurnRecord {
            intent: intent.clone(),
            timestamp: Utc::now(),
        });
    }

    /// Fills classification gaps from remembered slots. The returned
    /// intent is a new value; earlier intents stay as classified.
    pub fn enrich_intent(&self, intent: &Intent) -> Intent {
        let mut enriched = intent.clone();
        if enriched.location.is_none() {
            enriched.location = self.known_location.clone();
        }
        if enriched.hazard.is_none() {
            enriched.hazard = self.known_hazard;
        }
        enriched
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::IntentKind;

    #[test]
    fn remembers_slots_across_turns() {
        let mut ctx = ConversationContext::new(Uuid::new_v4());
        ctx.record_turn(&Intent {
            kind: IntentKind::Rescue,
            confidence: 0.7,
            location: Some("Miami".into()),
            hazard: Some(HazardKind::Hurricane),
        });

        let followup = Intent {
            kind: IntentKind::Information,
            confidence: 0.65,
            location: None,
            hazard: None,
        };
        let enriched = ctx.enrich_intent(&followup);
        assert_eq!(enriched.location.as_deref(), Some("Miami"));
        assert_eq!(enriched.hazard, Some(HazardKind::Hurricane));
    }

    #[test]
    fn pending_clarification_is_taken_once() {
        let mut ctx = ConversationContext::new(Uuid::new_v4());
        ctx.set_pending(PendingClarification::Rephrase);
        assert!(ctx.take_pending().is_some());
        assert!(ctx.take_pending().is_none());
    }
}
