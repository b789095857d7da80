use thiserror::Error;

use billjobs_core::DomainError;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BillingError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("bill store lock poisoned")]
    Poisoned,

    #[error("rendering failed: {0}")]
    Render(String),
}
