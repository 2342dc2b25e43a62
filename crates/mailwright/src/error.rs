//! Error types for mail delivery.

use mailwright_render::PrepareError;

/// Result type alias for delivery operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error produced by an injected transport.
pub type DispatchError = Box<dyn std::error::Error + Send + Sync>;

/// Error produced by an injected stored-mail factory.
pub type StoreError = Box<dyn std::error::Error + Send + Sync>;

/// Delivery error taxonomy.
///
/// `Preparation` and `Store` failures mean no mail was created or
/// queued. A `Dispatch` failure means the mail is retained in the
/// delivery queue and will be redriven; it is surfaced to direct
/// `send`/`push` callers and swallowed (logged only) during automated
/// redrive passes. Nothing here is fatal to the owning process.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Component preparation failed.
    #[error("component preparation failed: {0}")]
    Preparation(#[source] PrepareError),

    /// The stored-mail factory rejected the rendered mail.
    #[error("stored mail creation failed: {0}")]
    Store(#[source] StoreError),

    /// The transport rejected the dispatch.
    #[error("transport dispatch failed: {0}")]
    Dispatch(#[source] DispatchError),
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::manual_string_new,
    clippy::needless_collect,
    clippy::unreadable_literal,
    clippy::used_underscore_items,
    clippy::similar_names
)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_cause() {
        let error = Error::Dispatch("connection refused".into());
        assert_eq!(
            error.to_string(),
            "transport dispatch failed: connection refused"
        );
    }

    #[test]
    fn test_source_chain_is_preserved() {
        use std::error::Error as _;

        let error = Error::Preparation("profile fetch timed out".into());
        let source = error.source().unwrap();
        assert_eq!(source.to_string(), "profile fetch timed out");
    }
}
