//! Caller-supplied persistence contract for stored mail.
//!
//! The delivery core never dictates the shape of a persisted mail
//! record. The caller implements [`MailRepository`]: a factory turning
//! rendered content into its own record type, a converter back to a
//! transport-ready value, and the success/error hooks fired around
//! each delivery attempt.

use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::error::{Error, StoreError};

/// Rendered subject and bodies handed to the stored-mail factory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedMail {
    /// Subject line.
    pub subject: String,
    /// Derived plain text body.
    pub text: String,
    /// HTML body.
    pub html: String,
}

/// Fully rendered, transport-ready mail value.
///
/// Built once per send and immutable thereafter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendableMail {
    /// Subject line.
    pub subject: String,
    /// Derived plain text body.
    pub text: String,
    /// HTML body.
    pub html: String,
    /// Recipient addresses.
    pub recipients: Vec<String>,
}

/// Factory, converter, and delivery hooks for caller-owned records.
///
/// The core holds `Stored` values opaquely in its retry queue and only
/// ever looks at them through these methods.
pub trait MailRepository: Send + Sync {
    /// Caller-defined record tracking one mail across retries.
    type Stored: Send + 'static;

    /// Creates (and typically persists) a record for a freshly
    /// rendered mail. A failure here surfaces to the `send` caller and
    /// nothing is queued.
    fn create(
        &self,
        recipients: &[String],
        mail: &RenderedMail,
    ) -> impl Future<Output = std::result::Result<Self::Stored, StoreError>> + Send;

    /// Converts a stored record back into a transport-ready value.
    fn to_sendable(&self, stored: &Self::Stored) -> SendableMail;

    /// Success hook, fired exactly once per confirmed delivery
    /// (typically stamps the record as sent and updates storage). The
    /// default does nothing.
    fn mark_sent(&self, stored: &Self::Stored) -> impl Future<Output = ()> + Send {
        let _ = stored;
        async {}
    }

    /// Error hook, fired on every failed dispatch before the mail is
    /// requeued. The default does nothing.
    fn on_send_error(
        &self,
        stored: &Self::Stored,
        mail: &SendableMail,
        error: &Error,
    ) -> impl Future<Output = ()> + Send {
        let _ = (stored, mail, error);
        async {}
    }
}
