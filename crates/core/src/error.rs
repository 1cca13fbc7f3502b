use crate::types::DbId;

/// Domain errors shared by every layer of the history service.
///
/// Apart from [`CoreError::Upstream`] and [`CoreError::Internal`], these are
/// expected outcomes of a request rather than system failures.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Expired: {0}")]
    Expired(String),

    #[error("Already processed: {0}")]
    AlreadyProcessed(String),

    #[error("Not undoable: {0}")]
    NotUndoable(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Unsupported entity type: {0}")]
    UnsupportedEntity(String),

    /// The owning collaborator rejected the restoration or could not be reached.
    #[error("Restoration via {collaborator} failed for entity {entity_id}: {message}")]
    Upstream {
        collaborator: String,
        entity_id: String,
        status: Option<u16>,
        message: String,
    },

    #[error("Internal error: {0}")]
    Internal(String),
}
