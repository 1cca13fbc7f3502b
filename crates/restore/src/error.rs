use history_core::error::CoreError;

/// Errors from a single restoration attempt.
#[derive(Debug, thiserror::Error)]
pub enum RestoreError {
    /// No collaborator is registered for the entity type. Raised before any
    /// network call.
    #[error("Unsupported entity type: {0}")]
    UnsupportedEntity(String),

    /// The collaborator could not be reached, timed out, answered non-2xx,
    /// or replied with `success: false`.
    #[error("Restoration via {collaborator} failed for entity {entity_id}: {message}")]
    Upstream {
        collaborator: String,
        entity_id: String,
        /// HTTP status, when a response was received.
        status: Option<u16>,
        message: String,
    },
}

impl From<RestoreError> for CoreError {
    fn from(err: RestoreError) -> Self {
        match err {
            RestoreError::UnsupportedEntity(entity_type) => {
                CoreError::UnsupportedEntity(entity_type)
            }
            RestoreError::Upstream {
                collaborator,
                entity_id,
                status,
                message,
            } => CoreError::Upstream {
                collaborator,
                entity_id,
                status,
                message,
            },
        }
    }
}

/// Errors while building the collaborator registry at startup.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("Failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("Invalid collaborator URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
}
