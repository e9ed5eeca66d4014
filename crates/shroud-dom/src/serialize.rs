//! HTML serialization.

use std::fmt::Write;

use crate::node::{Dom, NodeData, NodeId};

/// Elements that never have children or a closing tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Elements whose text content is emitted verbatim.
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

/// Escape special HTML characters.
pub fn escape_html(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#x27;"),
            _ => result.push(c),
        }
    }
    result
}

/// Escape text content (quotes are left alone).
fn escape_text(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            _ => result.push(c),
        }
    }
    result
}

impl Dom {
    /// Serialize the whole arena (children of the root).
    #[must_use]
    pub fn to_html(&self) -> String {
        self.inner_html(self.root())
    }

    /// Serialize the children of `node`.
    #[must_use]
    pub fn inner_html(&self, node: NodeId) -> String {
        let mut out = String::with_capacity(1024);
        let raw = self
            .tag_name(node)
            .is_some_and(|name| RAW_TEXT_ELEMENTS.contains(&name));
        for &child in self.children(node) {
            self.serialize_node(child, raw, &mut out);
        }
        out
    }

    /// Serialize `node` including its own tag.
    #[must_use]
    pub fn outer_html(&self, node: NodeId) -> String {
        let mut out = String::new();
        let raw = self
            .parent(node)
            .and_then(|p| self.tag_name(p))
            .is_some_and(|name| RAW_TEXT_ELEMENTS.contains(&name));
        self.serialize_node(node, raw, &mut out);
        out
    }

    fn serialize_node(&self, node: NodeId, raw_text: bool, out: &mut String) {
        match self.data(node) {
            NodeData::Document => {
                for &child in self.children(node) {
                    self.serialize_node(child, false, out);
                }
            }
            NodeData::Doctype(name) => {
                write!(out, "<!DOCTYPE {name}>").unwrap();
            }
            NodeData::Text(text) if raw_text => out.push_str(text),
            NodeData::Text(text) => out.push_str(&escape_text(text)),
            NodeData::Comment(text) => {
                write!(out, "<!--{text}-->").unwrap();
            }
            NodeData::Element(element) => {
                out.push('<');
                out.push_str(&element.name);
                for (key, value) in element.attrs() {
                    if value.is_empty() {
                        write!(out, " {key}").unwrap();
                    } else {
                        write!(out, r#" {key}="{}""#, escape_html(value)).unwrap();
                    }
                }
                out.push('>');

                if VOID_ELEMENTS.contains(&element.name.as_str()) {
                    return;
                }

                let raw = RAW_TEXT_ELEMENTS.contains(&element.name.as_str());
                for &child in self.children(node) {
                    self.serialize_node(child, raw, out);
                }
                write!(out, "</{}>", element.name).unwrap();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_round_trip_fragment() {
        let html = r#"<div class="md-content"><p>Hello <b>world</b></p><img src="a.png" alt="A"></div>"#;
        let dom = Dom::parse_fragment(html);
        assert_eq!(dom.to_html(), html);
    }

    #[test]
    fn test_escapes_text_and_attributes() {
        let mut dom = Dom::new();
        let a = dom.create_element("a");
        dom.set_attr(a, "title", r#"say "hi" & <go>"#);
        let text = dom.create_text("1 < 2 & \"quoted\"");
        dom.append_child(a, text);
        dom.append_child(dom.root(), a);

        assert_eq!(
            dom.to_html(),
            r#"<a title="say &quot;hi&quot; &amp; &lt;go&gt;">1 &lt; 2 &amp; "quoted"</a>"#
        );
    }

    #[test]
    fn test_raw_text_elements_are_verbatim() {
        let mut dom = Dom::new();
        let style = dom.create_element("style");
        let css = dom.create_text("a > b { color: red; }");
        dom.append_child(style, css);
        dom.append_child(dom.root(), style);

        assert_eq!(dom.to_html(), "<style>a > b { color: red; }</style>");
        assert_eq!(dom.inner_html(style), "a > b { color: red; }");
    }

    #[test]
    fn test_boolean_attributes_and_doctype() {
        let dom = Dom::parse_document(
            r#"<!DOCTYPE html><html><head></head><body><input type="checkbox" checked></body></html>"#,
        );
        assert_eq!(
            dom.to_html(),
            r#"<!DOCTYPE html><html><head></head><body><input type="checkbox" checked></body></html>"#
        );
    }
}
