//! Domain model shared across the Clarion crates.

mod contact;
mod context;
mod intent;
mod response;
mod utterance;

pub use contact::{ContactKind, ContactRecord, dedupe_contacts, normalize_contact_value};
pub use context::{ConversationContext, PendingClarification, TurnRecord};
pub use intent::{HazardKind, Intent, IntentKind};
pub use response::{AgentResponse, InformationSection, ResponsePayload, SpecialistKind};
pub use utterance::Utterance;
