//! HTML parsing into the arena.
//!
//! Parsing is delegated to `scraper` (html5ever underneath), so malformed
//! markup is recovered the way browsers do. The resulting read-only tree is
//! then copied into a mutable [`Dom`].

use scraper::{Html, Node};

use crate::node::{Dom, ElementData, NodeData};

impl Dom {
    /// Parse a complete HTML document.
    ///
    /// Missing `html`, `head` and `body` elements are synthesized by the parser.
    #[must_use]
    pub fn parse_document(html: &str) -> Self {
        convert(&Html::parse_document(html), false)
    }

    /// Parse an HTML fragment (body context).
    ///
    /// The fragment's top-level nodes become children of [`Dom::root`].
    #[must_use]
    pub fn parse_fragment(html: &str) -> Self {
        convert(&Html::parse_fragment(html), true)
    }
}

/// Copy a scraper tree into a fresh arena.
///
/// The fragment parser wraps everything in a synthetic `<html>` element;
/// `unwrap_html` lifts its children to the root instead.
fn convert(parsed: &Html, unwrap_html: bool) -> Dom {
    let mut dom = Dom::new();
    let root = dom.root();

    // (parent, node) pairs in reverse document order, so popping appends
    // children in their original order.
    let mut stack = Vec::new();
    for top in parsed.tree.root().children() {
        match top.value() {
            Node::Element(element) if unwrap_html && element.name() == "html" => {
                stack.extend(top.children().map(|child| (root, child)));
            }
            _ => stack.push((root, top)),
        }
    }
    stack.reverse();

    while let Some((parent, node)) = stack.pop() {
        let data = match node.value() {
            Node::Element(element) => {
                let mut data = ElementData::new(element.name());
                for (name, value) in element.attrs() {
                    data.set_attr(name, value);
                }
                NodeData::Element(data)
            }
            Node::Text(text) => NodeData::Text(String::from(&**text)),
            Node::Comment(comment) => NodeData::Comment(String::from(&**comment)),
            Node::Doctype(doctype) => NodeData::Doctype(doctype.name().to_owned()),
            _ => continue,
        };

        let id = dom.create_node(data);
        dom.append_child(parent, id);

        let children: Vec<_> = node.children().map(|child| (id, child)).collect();
        stack.extend(children.into_iter().rev());
    }

    dom
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_fragment_unwraps_html() {
        let dom = Dom::parse_fragment("<p>One</p><p>Two</p>");
        let top = dom.children(dom.root());
        assert_eq!(top.len(), 2);
        assert_eq!(dom.tag_name(top[0]), Some("p"));
        assert_eq!(dom.text_content(top[1]), "Two");
    }

    #[test]
    fn test_parse_document_synthesizes_structure() {
        let dom = Dom::parse_document("<title>T</title><p>Body</p>");
        let html = dom.first_by_tag(dom.root(), "html").unwrap();
        let head = dom.first_by_tag(html, "head").unwrap();
        let body = dom.first_by_tag(html, "body").unwrap();
        assert!(dom.first_by_tag(head, "title").is_some());
        assert_eq!(dom.text_content(body), "Body");
    }

    #[test]
    fn test_parse_keeps_attributes() {
        let dom = Dom::parse_fragment(r#"<a href="/x" download class="dl">x</a>"#);
        let a = dom.first_by_tag(dom.root(), "a").unwrap();
        assert_eq!(dom.attr(a, "href"), Some("/x"));
        assert!(dom.has_attr(a, "download"));
        assert_eq!(dom.attr(a, "class"), Some("dl"));
    }

    #[test]
    fn test_parse_keeps_attribute_source_order() {
        let dom = Dom::parse_fragment(
            r#"<link rel="stylesheet" href="site.css"><img src="a.png" alt="A" class="z">"#,
        );
        let link = dom.first_by_tag(dom.root(), "link").unwrap();
        let img = dom.first_by_tag(dom.root(), "img").unwrap();
        let names = |node| dom.element(node).unwrap().attrs().map(|(k, _)| k).collect::<Vec<_>>();

        assert_eq!(names(link), vec!["rel", "href"]);
        assert_eq!(names(img), vec!["src", "alt", "class"]);
    }

    #[test]
    fn test_parse_doctype() {
        let dom = Dom::parse_document("<!DOCTYPE html><html><body></body></html>");
        let first = dom.children(dom.root())[0];
        assert_eq!(dom.data(first), &NodeData::Doctype("html".to_owned()));
    }
}
