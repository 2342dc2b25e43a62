//! # mailwright-render
//!
//! Lightweight virtual element tree renderer for transactional mail.
//!
//! Mail bodies are described as a declarative tree of [`Node`] values.
//! From one tree the renderer derives both representations a mail
//! needs:
//!
//! - [`Node::markup`]: the HTML serialization
//! - [`Node::plain_text`]: the textual fallback, with mail-specific
//!   rules (spacer line breaks, anchors rendered as their target URL
//!   or address, chrome-like tags ignored)
//!
//! Content is produced by [`MailComponent`] implementations: a subject
//! line, an asynchronous preparation step, and a synchronous render
//! that receives the target [`Language`] explicitly. Translations come
//! from a read-only [`Catalog`] built before rendering.
//!
//! ## Example
//!
//! ```
//! use mailwright_render::{Language, MailComponent, Node};
//!
//! struct Welcome;
//!
//! impl MailComponent for Welcome {
//!     fn subject(&self) -> String {
//!         "Welcome".to_string()
//!     }
//!
//!     fn render(&self, language: &Language) -> Node {
//!         Node::new("div").child(language.pick("Hi", &[("de", "Hallo")]))
//!     }
//! }
//!
//! let tree = Welcome.render(&Language::new("en"));
//! assert_eq!(tree.markup(), "<div>Hi</div>");
//! assert_eq!(tree.plain_text(), "Hi");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod component;
mod i18n;
mod node;

pub use component::{MailComponent, PrepareError};
pub use i18n::{Catalog, Language};
pub use node::{Child, Node, SPACER_CLASS};
