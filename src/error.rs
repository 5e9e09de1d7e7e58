//! Error types shared by every behavior.
//!
//! Both kinds are local and non-fatal: callers log them and fall back to an
//! in-memory default or skip the affected instance.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BehaviorError {
    /// The storage API threw, or is absent in this browsing context.
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),

    /// An element a behavior depends on is missing from the document.
    #[error("element not found: {0}")]
    ElementNotFound(String),
}

pub type Result<T> = std::result::Result<T, BehaviorError>;
