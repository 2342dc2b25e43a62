//! # mailwright
//!
//! Mail delivery core with at-least-once semantics.
//!
//! The crate orchestrates the path from a declarative mail component
//! to a confirmed delivery:
//!
//! 1. [`Mailer::send`] awaits the component's preparation, renders its
//!    element tree once, and derives the HTML and plain-text bodies.
//! 2. The caller's [`MailRepository`] factory turns the rendered
//!    content into an opaque stored record.
//! 3. The injected [`Transport`] dispatches the payload (with optional
//!    DKIM parameters).
//! 4. On failure the record is retained in an in-memory FIFO
//!    [`DeliveryQueue`] and redriven by a fixed-delay timer until the
//!    transport confirms it.
//!
//! Rendering lives in [`mailwright-render`](mailwright_render) and is
//! re-exported here for convenience.
//!
//! ## Example
//!
//! ```no_run
//! use mailwright::render::{Language, MailComponent, Node};
//! use mailwright::{ConsoleTransport, Mailer};
//! # use mailwright::{MailRepository, RenderedMail, SendableMail, StoreError};
//! # struct Records;
//! # impl MailRepository for Records {
//! #     type Stored = SendableMail;
//! #     async fn create(
//! #         &self,
//! #         recipients: &[String],
//! #         mail: &RenderedMail,
//! #     ) -> Result<SendableMail, StoreError> {
//! #         Ok(SendableMail {
//! #             subject: mail.subject.clone(),
//! #             text: mail.text.clone(),
//! #             html: mail.html.clone(),
//! #             recipients: recipients.to_vec(),
//! #         })
//! #     }
//! #     fn to_sendable(&self, stored: &SendableMail) -> SendableMail {
//! #         stored.clone()
//! #     }
//! # }
//!
//! struct Welcome;
//!
//! impl MailComponent for Welcome {
//!     fn subject(&self) -> String {
//!         "Welcome".to_string()
//!     }
//!
//!     fn render(&self, _language: &Language) -> Node {
//!         Node::new("div").child("Hi")
//!     }
//! }
//!
//! # async fn example() -> mailwright::Result<()> {
//! let mailer = Mailer::new(Records, ConsoleTransport, "noreply@example.test");
//! let redrive = mailer.start_redrive();
//!
//! let mut welcome = Welcome;
//! mailer
//!     .send(&mut welcome, vec!["user@example.test".to_string()], &Language::new("en"))
//!     .await?;
//!
//! redrive.stop().await;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod error;
mod mailer;
mod queue;
mod repository;
mod transport;

pub use mailwright_render as render;

pub use error::{DispatchError, Error, Result, StoreError};
pub use mailer::{DEFAULT_REDRIVE_INTERVAL, Mailer, MailerBuilder, RedriveHandle};
pub use queue::{DeliveryQueue, QueuedMail};
pub use repository::{MailRepository, RenderedMail, SendableMail};
pub use transport::{ConsoleTransport, DkimConfig, Transport, TransportPayload};
