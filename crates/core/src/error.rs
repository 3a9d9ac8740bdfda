//! Storefront error model.

use thiserror::Error;

/// Result type used across the storefront core.
pub type StoreResult<T> = Result<T, StoreError>;

/// Core error taxonomy.
///
/// The first five variants are "expected" business failures and map to
/// 4xx-style responses at the API boundary. `Server` is the opaque bucket:
/// full detail is logged internally, the caller sees nothing actionable.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Malformed input (missing or invalid fields).
    #[error("validation failed: {0}")]
    Validation(String),

    /// A product, order, or user was not found.
    #[error("{0} not found")]
    NotFound(String),

    /// Requested quantity exceeds what is in stock at write time.
    ///
    /// Carries the quantity still available so callers can offer a
    /// corrected quantity.
    #[error("insufficient stock: {available} available")]
    InsufficientStock { available: i64 },

    /// Restock subscription attempted on a product that is in stock.
    #[error("product is already available")]
    AlreadyAvailable,

    /// A uniqueness constraint was hit.
    #[error("duplicate: {0}")]
    Duplicate(String),

    /// Unexpected internal failure.
    #[error("internal error: {0}")]
    Server(String),
}

impl StoreError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn insufficient_stock(available: i64) -> Self {
        Self::InsufficientStock { available }
    }

    pub fn duplicate(msg: impl Into<String>) -> Self {
        Self::Duplicate(msg.into())
    }

    pub fn server(msg: impl Into<String>) -> Self {
        Self::Server(msg.into())
    }

    /// True for the variants surfaced to callers as structured 4xx results.
    pub fn is_expected(&self) -> bool {
        !matches!(self, Self::Server(_))
    }
}
