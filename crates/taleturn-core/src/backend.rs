//! Generation backend abstraction.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::action::ActionId;
use crate::error::GenerationError;
use crate::event::NarrationEvent;
use crate::progress::ProgressSink;

/// Input handed to a generation backend for one turn.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    /// Identifier of the turn being generated.
    pub turn_id: Uuid,
    /// Snapshot of the narration log before this turn.
    pub log: Vec<NarrationEvent>,
    /// The chosen action, or `None` for an action-less turn.
    pub action: Option<ActionId>,
}

impl GenerationRequest {
    /// Returns `true` when no narration exists yet.
    #[must_use]
    pub fn is_first_turn(&self) -> bool {
        self.log.is_empty()
    }
}

/// Output of a successful generation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Generation {
    /// New narration payloads, in narrative order.
    pub narration: Vec<serde_json::Value>,
    /// The next actions to offer. Empty means the story has no further choices.
    pub actions: Vec<ActionId>,
}

impl Generation {
    #[must_use]
    pub fn new(narration: Vec<serde_json::Value>, actions: Vec<ActionId>) -> Self {
        Self { narration, actions }
    }
}

/// Produces narration and a fresh action set for a turn.
///
/// Implementations must watch `cancel` and, once it fires, settle promptly
/// with [`GenerationError::Cancelled`]. Progress token counts must not
/// decrease within one call.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Generates the continuation for `request`.
    async fn generate(
        &self,
        request: GenerationRequest,
        progress: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<Generation, GenerationError>;
}
