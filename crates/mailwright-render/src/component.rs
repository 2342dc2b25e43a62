//! Component contract for renderable mail.

use std::future::Future;

use crate::i18n::Language;
use crate::node::Node;

/// Error produced by a component's preparation step.
///
/// Preparation runs arbitrary caller code (data fetches, lookups), so
/// the failure type is a boxed error rather than a fixed enum.
pub type PrepareError = Box<dyn std::error::Error + Send + Sync>;

/// A renderable unit of mail content.
///
/// A component owns a subject line, an asynchronous preparation step,
/// and a synchronous render producing exactly one element tree per
/// call. The sender awaits [`prepare`](Self::prepare) exactly once and
/// calls [`render`](Self::render) immediately afterwards; anything the
/// render needs (fetched data, resolved names) must be in place by the
/// time preparation resolves.
pub trait MailComponent: Send {
    /// Subject line for the resulting mail.
    fn subject(&self) -> String;

    /// Asynchronous preparation, awaited exactly once per send before
    /// rendering. The default implementation does nothing.
    fn prepare(&mut self) -> impl Future<Output = Result<(), PrepareError>> + Send {
        async { Ok(()) }
    }

    /// Builds the element tree for this component.
    ///
    /// Rendering is synchronous; the language is passed explicitly so
    /// concurrent renders with different languages are safe.
    fn render(&self, language: &Language) -> Node;
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

    struct Greeting {
        name: Option<String>,
    }

    impl MailComponent for Greeting {
        fn subject(&self) -> String {
            "Greetings".to_string()
        }

        async fn prepare(&mut self) -> Result<(), PrepareError> {
            // Stands in for a data fetch.
            self.name = Some("Ada".to_string());
            Ok(())
        }

        fn render(&self, language: &Language) -> Node {
            let name = self.name.as_deref().unwrap_or("friend");
            let greeting = language.pick("Hello", &[("de", "Hallo")]);
            Node::new("div").child(format!("{greeting} {name}"))
        }
    }

    #[tokio::test]
    async fn test_prepare_then_render() {
        let mut component = Greeting { name: None };
        component.prepare().await.unwrap();

        let tree = component.render(&Language::new("de"));
        assert_eq!(tree.markup(), "<div>Hallo Ada</div>");
        assert_eq!(tree.plain_text(), "Hallo Ada");
    }

    #[test]
    fn test_default_prepare_is_noop() {
        struct Bare;

        impl MailComponent for Bare {
            fn subject(&self) -> String {
                "Bare".to_string()
            }

            fn render(&self, _language: &Language) -> Node {
                Node::new("div").child("static")
            }
        }

        let mut component = Bare;
        tokio_test::block_on(component.prepare()).unwrap();
        assert_eq!(component.render(&Language::new("en")).plain_text(), "static");
    }
}
