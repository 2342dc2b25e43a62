//! Virtual element tree for mail bodies.
//!
//! A [`Node`] is an immutable HTML-like element: a tag name, an ordered
//! attribute list, and a sequence of children. Nothing is cached; the
//! HTML serialization and the derived plain text are pure functions of
//! the tree and are recomputed on every call.
//!
//! Attribute values and primitive children are interpolated verbatim.
//! The renderer assumes trusted input; sanitization belongs to whoever
//! authors the components.

use std::fmt::Write;

/// Tags whose content never contributes to derived plain text.
const IGNORED_TEXT_TAGS: [&str; 4] = ["head", "svg", "button", "script"];

/// Attribute class marking a forced line break in derived plain text.
///
/// HTML mail clients collapse whitespace, so components mark
/// paragraph-like children with `class="spacer"` and the plain-text
/// derivation emits a newline after them.
pub const SPACER_CLASS: &str = "spacer";

/// A single child slot of a [`Node`].
///
/// Primitives are coerced to their display form when serialized;
/// [`Child::Many`] holds a nested ordered sequence that is flattened
/// element by element during traversal.
#[derive(Debug, Clone, PartialEq)]
pub enum Child {
    /// Literal text.
    Text(String),
    /// Integer value, serialized in decimal form.
    Int(i64),
    /// Floating point value.
    Float(f64),
    /// Boolean value, serialized as `true`/`false`.
    Bool(bool),
    /// A nested element.
    Node(Node),
    /// An ordered sequence of children, flattened during traversal.
    Many(Vec<Child>),
}

impl Child {
    /// Writes the display form of a primitive variant.
    ///
    /// `Node` and `Many` contribute nothing here; callers handle them
    /// before falling through to this method.
    fn write_literal(&self, out: &mut String) {
        match self {
            Self::Text(text) => out.push_str(text),
            Self::Int(value) => {
                let _ = write!(out, "{value}");
            }
            Self::Float(value) => {
                let _ = write!(out, "{value}");
            }
            Self::Bool(value) => {
                let _ = write!(out, "{value}");
            }
            Self::Node(_) | Self::Many(_) => {}
        }
    }

    /// Writes the HTML serialization of this child.
    fn write_markup(&self, out: &mut String) {
        match self {
            Self::Node(node) => node.write_markup(out),
            Self::Many(items) => {
                for item in items {
                    item.write_markup(out);
                }
            }
            primitive => primitive.write_literal(out),
        }
    }
}

impl From<&str> for Child {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Child {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for Child {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for Child {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for Child {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<Node> for Child {
    fn from(value: Node) -> Self {
        Self::Node(value)
    }
}

impl From<Vec<Child>> for Child {
    fn from(value: Vec<Child>) -> Self {
        Self::Many(value)
    }
}

/// An immutable HTML-like element.
///
/// Children are supplied at construction time only, so the tree cannot
/// contain cycles. Construction is builder-style:
///
/// ```
/// use mailwright_render::Node;
///
/// let greeting = Node::new("div")
///     .attr("class", "greeting")
///     .child("Hello");
///
/// assert_eq!(greeting.markup(), "<div class=\"greeting\">Hello</div>");
/// assert_eq!(greeting.plain_text(), "Hello");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    tag: String,
    attributes: Vec<(String, String)>,
    children: Vec<Child>,
}

impl Node {
    /// Creates an element with no attributes and no children.
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Appends an attribute. Serialization preserves insertion order.
    #[must_use]
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }

    /// Appends one child.
    #[must_use]
    pub fn child(mut self, child: impl Into<Child>) -> Self {
        self.children.push(child.into());
        self
    }

    /// Appends a sequence of children.
    #[must_use]
    pub fn children<I>(mut self, children: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Child>,
    {
        self.children.extend(children.into_iter().map(Into::into));
        self
    }

    /// The element's tag name.
    #[must_use]
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Looks up an attribute value by name.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Serializes the element to HTML markup.
    ///
    /// Attributes appear in insertion order; values are interpolated
    /// without escaping. An element without attributes serializes as
    /// `<tag>...</tag>` with no extra whitespace.
    #[must_use]
    pub fn markup(&self) -> String {
        let mut out = String::new();
        self.write_markup(&mut out);
        out
    }

    /// Derives the plain-text content of the element.
    ///
    /// Elements in the ignored set (`head`, `svg`, `button`, `script`)
    /// contribute nothing. A direct child element with
    /// `class="spacer"` gets a newline appended after its own text.
    /// For anchors, bare primitive children are replaced by the `href`
    /// target: `http(s)` links contribute the URL itself and `mailto:`
    /// links contribute the bare address, so the text rendition shows
    /// the destination instead of a decorative label.
    #[must_use]
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        self.write_text(&mut out);
        out
    }

    fn write_markup(&self, out: &mut String) {
        let _ = write!(out, "<{}", self.tag);
        for (name, value) in &self.attributes {
            let _ = write!(out, " {name}=\"{value}\"");
        }
        out.push('>');
        for child in &self.children {
            child.write_markup(out);
        }
        let _ = write!(out, "</{}>", self.tag);
    }

    fn write_text(&self, out: &mut String) {
        if IGNORED_TEXT_TAGS.contains(&self.tag.as_str()) {
            return;
        }

        for child in &self.children {
            match child {
                Child::Node(node) => {
                    node.write_text(out);

                    if node.attribute("class") == Some(SPACER_CLASS) {
                        out.push('\n');
                    }
                }
                Child::Many(items) => write_sequence_text(items, out),
                primitive => {
                    if self.tag == "a" {
                        let href = self.attribute("href").unwrap_or_default();
                        if href.starts_with("http") {
                            out.push_str(href);
                        } else if let Some(address) = href.strip_prefix("mailto:") {
                            out.push_str(address);
                        }
                    } else {
                        primitive.write_literal(out);
                    }
                }
            }
        }
    }
}

/// Text derivation inside a nested sequence: elements recurse, primitives
/// contribute their literal form. Neither the spacer rule nor the anchor
/// substitution applies at this level.
fn write_sequence_text(items: &[Child], out: &mut String) {
    for item in items {
        match item {
            Child::Node(node) => node.write_text(out),
            Child::Many(nested) => write_sequence_text(nested, out),
            primitive => primitive.write_literal(out),
        }
    }
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
    fn test_markup_with_attributes_in_insertion_order() {
        let node = Node::new("div")
            .attr("class", "outer")
            .attr("style", "color: red")
            .child("text");

        assert_eq!(
            node.markup(),
            "<div class=\"outer\" style=\"color: red\">text</div>"
        );
    }

    #[test]
    fn test_markup_without_attributes_has_no_extra_whitespace() {
        let node = Node::new("p").child("hello");
        assert_eq!(node.markup(), "<p>hello</p>");
    }

    #[test]
    fn test_markup_empty_children() {
        let node = Node::new("div");
        assert_eq!(node.markup(), "<div></div>");
        assert_eq!(node.plain_text(), "");
    }

    #[test]
    fn test_markup_nested_elements() {
        let node = Node::new("div").child(Node::new("span").child("inner"));
        assert_eq!(node.markup(), "<div><span>inner</span></div>");
    }

    #[test]
    fn test_markup_flattens_nested_sequences() {
        let node = Node::new("ul").child(vec![
            Child::from(Node::new("li").child("one")),
            Child::from(Node::new("li").child("two")),
        ]);

        assert_eq!(node.markup(), "<ul><li>one</li><li>two</li></ul>");
    }

    #[test]
    fn test_markup_coerces_primitives() {
        let node = Node::new("span")
            .child("count: ")
            .child(42_i64)
            .child(" active: ")
            .child(true);

        assert_eq!(node.markup(), "<span>count: 42 active: true</span>");
    }

    #[test]
    fn test_markup_is_deterministic_across_calls() {
        let node = Node::new("div")
            .attr("class", "spacer")
            .child(Node::new("a").attr("href", "http://x.test").child("link"));

        let first = node.markup();
        let second = node.markup();
        assert_eq!(first, second);
        assert_eq!(node.plain_text(), node.plain_text());
    }

    #[test]
    fn test_plain_text_ignored_tags_contribute_nothing() {
        for tag in ["head", "svg", "button", "script"] {
            let node = Node::new(tag).child("invisible").child(Node::new("p").child("also gone"));
            assert_eq!(node.plain_text(), "", "tag {tag}");
        }
    }

    #[test]
    fn test_plain_text_spacer_child_appends_single_newline() {
        let node = Node::new("div")
            .child(Node::new("p").attr("class", "spacer").child("first"))
            .child(Node::new("p").child("second"));

        assert_eq!(node.plain_text(), "first\nsecond");
    }

    #[test]
    fn test_plain_text_anchor_http_href_replaces_label() {
        let node = Node::new("a").attr("href", "http://x.test").child("click here");
        assert_eq!(node.plain_text(), "http://x.test");
    }

    #[test]
    fn test_plain_text_anchor_https_href_replaces_label() {
        let node = Node::new("a")
            .attr("href", "https://example.test/page")
            .child("label");
        assert_eq!(node.plain_text(), "https://example.test/page");
    }

    #[test]
    fn test_plain_text_anchor_mailto_strips_prefix() {
        let node = Node::new("a").attr("href", "mailto:a@b.com").child("mail us");
        assert_eq!(node.plain_text(), "a@b.com");
    }

    #[test]
    fn test_plain_text_anchor_other_href_contributes_nothing() {
        let node = Node::new("a").attr("href", "#top").child("back to top");
        assert_eq!(node.plain_text(), "");
    }

    #[test]
    fn test_plain_text_anchor_without_href_contributes_nothing() {
        let node = Node::new("a").child("label");
        assert_eq!(node.plain_text(), "");
    }

    #[test]
    fn test_plain_text_anchor_element_children_keep_their_text() {
        // The href substitution applies to bare primitives only.
        let node = Node::new("a")
            .attr("href", "http://x.test")
            .child(Node::new("span").child("inner"));
        assert_eq!(node.plain_text(), "inner");
    }

    #[test]
    fn test_plain_text_sequence_items_are_literal() {
        let node = Node::new("div").child(vec![
            Child::from("a"),
            Child::from(Node::new("b").child("c")),
            Child::from(1_i64),
        ]);

        assert_eq!(node.plain_text(), "ac1");
    }

    #[test]
    fn test_plain_text_sequence_skips_spacer_rule() {
        // Only direct element children trigger the spacer newline.
        let node = Node::new("div").child(vec![Child::from(
            Node::new("p").attr("class", "spacer").child("x"),
        )]);

        assert_eq!(node.plain_text(), "x");
    }

    #[test]
    fn test_plain_text_nested_spacer_newlines_bubble_up() {
        let inner = Node::new("div")
            .child(Node::new("p").attr("class", "spacer").child("line"));
        let outer = Node::new("body").child(inner);

        assert_eq!(outer.plain_text(), "line\n");
    }

    #[test]
    fn test_attribute_lookup() {
        let node = Node::new("a").attr("href", "http://x.test").attr("class", "link");
        assert_eq!(node.attribute("href"), Some("http://x.test"));
        assert_eq!(node.attribute("class"), Some("link"));
        assert_eq!(node.attribute("id"), None);
    }
}
