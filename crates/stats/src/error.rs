use domain::DomainError;
use store::StoreError;
use thiserror::Error;

/// Errors from profile statistics queries.
#[derive(Debug, Error)]
pub enum StatsError {
    /// A domain rule rejected the query.
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// The order store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl StatsError {
    /// Stable, machine-checkable error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            StatsError::Domain(e) => e.kind(),
            StatsError::Store(_) => "STORAGE",
        }
    }
}

/// Result type for statistics operations.
pub type Result<T> = std::result::Result<T, StatsError>;
