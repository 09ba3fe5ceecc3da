//! The closed set of specialist handlers.

use async_trait::async_trait;

use clarion_core::ClarionError;
use clarion_core::model::{AgentResponse, ConversationContext, Intent, Utterance};

/// One domain handler behind the orchestrator.
///
/// A specialist is a pure function from the classified turn to a
/// structured response: it may call external collaborators, but it
/// never mutates the conversation context (it receives a read-only
/// snapshot) and it always carries its own fallback so an error return
/// is the exception, not a degradation path.
#[async_trait]
pub trait Specialist: Send + Sync {
    /// Display name used in activity events ("Rescue Agent", ...).
    fn name(&self) -> &'static str;

    async fn handle(
        &self,
        intent: &Intent,
        utterance: &Utterance,
        context: &ConversationContext,
    ) -> Result<AgentResponse, ClarionError>;
}
