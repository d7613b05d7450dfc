use thiserror::Error;

/// Errors raised while parsing or constructing identifiers.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid asset class '{code}': {reason}")]
    InvalidAssetClass { code: String, reason: &'static str },

    #[error("invalid principal id '{0}': expected 64 hex characters")]
    InvalidPrincipal(String),
}
