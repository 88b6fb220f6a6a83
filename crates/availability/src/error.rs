use venue_core::error::CoreError;
use venue_core::types::EntityId;

/// Failures of the external collaborators (storage, settings).
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("Branch not found: {0}")]
    BranchNotFound(EntityId),

    #[error("Storage backend error: {0}")]
    Backend(String),
}

/// Anything that stops an availability check from producing a decision.
///
/// Allocation outcomes, including hard failures, are decisions and never
/// surface here.
#[derive(Debug, thiserror::Error)]
pub enum AvailabilityError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Core(#[from] CoreError),
}
