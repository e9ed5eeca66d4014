//! Arena-backed node storage and tree edits.

use std::collections::HashMap;
use std::fmt;

use crate::event::Listener;

/// Index of a node inside a [`Dom`] arena.
///
/// Ids are only meaningful for the arena that produced them. Detached nodes
/// keep their id; they are simply no longer reachable from the root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// Payload of a single node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeData {
    /// Arena root. Holds either a whole document or fragment children.
    Document,
    /// `<!DOCTYPE name>`.
    Doctype(String),
    /// Element with tag name and attributes.
    Element(ElementData),
    /// Character data.
    Text(String),
    /// `<!-- comment -->`.
    Comment(String),
}

/// Element tag name and attributes.
///
/// Attributes keep their source order so serialization is stable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ElementData {
    /// Lowercase local tag name.
    pub name: String,
    attrs: Vec<(String, String)>,
}

impl ElementData {
    /// Create an element with no attributes.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attrs: Vec::new(),
        }
    }

    /// Attribute value by name.
    #[must_use]
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Whether the attribute is present (with any value).
    #[must_use]
    pub fn has_attr(&self, name: &str) -> bool {
        self.attrs.iter().any(|(key, _)| key == name)
    }

    /// Set an attribute, replacing an existing value in place.
    pub fn set_attr(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.attrs.iter_mut().find(|(key, _)| *key == name) {
            Some(slot) => slot.1 = value,
            None => self.attrs.push((name, value)),
        }
    }

    /// Remove an attribute, returning its previous value.
    pub fn remove_attr(&mut self, name: &str) -> Option<String> {
        let index = self.attrs.iter().position(|(key, _)| key == name)?;
        Some(self.attrs.remove(index).1)
    }

    /// Keep only the attributes for which `keep` returns true.
    pub fn retain_attrs(&mut self, mut keep: impl FnMut(&str, &str) -> bool) {
        self.attrs.retain(|(key, value)| keep(key, value));
    }

    /// Iterate attributes in source order.
    pub fn attrs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attrs
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    /// Whether the whitespace-separated `class` attribute contains `class`.
    #[must_use]
    pub fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .is_some_and(|classes| classes.split_ascii_whitespace().any(|c| c == class))
    }
}

struct Node {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    data: NodeData,
}

/// HTML document arena.
///
/// The root node (see [`Dom::root`]) is a [`NodeData::Document`]. Every other
/// node is created detached and becomes part of the tree once appended.
pub struct Dom {
    nodes: Vec<Node>,
    listeners: HashMap<NodeId, Vec<Listener>>,
}

impl Default for Dom {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Dom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dom")
            .field("nodes", &self.nodes.len())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl Dom {
    /// Create an empty document.
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                parent: None,
                children: Vec::new(),
                data: NodeData::Document,
            }],
            listeners: HashMap::new(),
        }
    }

    /// The document root.
    #[must_use]
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    fn push(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            parent: None,
            children: Vec::new(),
            data,
        });
        id
    }

    /// Create a detached element.
    pub fn create_element(&mut self, name: impl Into<String>) -> NodeId {
        self.push(NodeData::Element(ElementData::new(name)))
    }

    /// Create a detached text node.
    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.push(NodeData::Text(text.into()))
    }

    pub(crate) fn create_node(&mut self, data: NodeData) -> NodeId {
        self.push(data)
    }

    /// Node payload.
    #[must_use]
    pub fn data(&self, node: NodeId) -> &NodeData {
        &self.nodes[node.0].data
    }

    /// Element payload, if `node` is an element.
    #[must_use]
    pub fn element(&self, node: NodeId) -> Option<&ElementData> {
        match &self.nodes[node.0].data {
            NodeData::Element(element) => Some(element),
            _ => None,
        }
    }

    /// Mutable element payload, if `node` is an element.
    pub fn element_mut(&mut self, node: NodeId) -> Option<&mut ElementData> {
        match &mut self.nodes[node.0].data {
            NodeData::Element(element) => Some(element),
            _ => None,
        }
    }

    /// Tag name of an element node.
    #[must_use]
    pub fn tag_name(&self, node: NodeId) -> Option<&str> {
        self.element(node).map(|e| e.name.as_str())
    }

    /// Attribute of an element node.
    #[must_use]
    pub fn attr(&self, node: NodeId, name: &str) -> Option<&str> {
        self.element(node)?.attr(name)
    }

    /// Whether an element node carries the attribute.
    #[must_use]
    pub fn has_attr(&self, node: NodeId, name: &str) -> bool {
        self.element(node).is_some_and(|e| e.has_attr(name))
    }

    /// Set an attribute. Ignored for non-element nodes.
    pub fn set_attr(&mut self, node: NodeId, name: impl Into<String>, value: impl Into<String>) {
        if let Some(element) = self.element_mut(node) {
            element.set_attr(name, value);
        }
    }

    /// Remove an attribute, returning its previous value.
    pub fn remove_attr(&mut self, node: NodeId, name: &str) -> Option<String> {
        self.element_mut(node)?.remove_attr(name)
    }

    /// Parent of a node, `None` for the root and detached nodes.
    #[must_use]
    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes[node.0].parent
    }

    /// Children in document order.
    #[must_use]
    pub fn children(&self, node: NodeId) -> &[NodeId] {
        &self.nodes[node.0].children
    }

    /// Element children in document order.
    #[must_use]
    pub fn element_children(&self, node: NodeId) -> Vec<NodeId> {
        self.children(node)
            .iter()
            .copied()
            .filter(|&child| self.element(child).is_some())
            .collect()
    }

    /// Ancestors from the parent up to the root.
    #[must_use]
    pub fn ancestors(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut current = self.parent(node);
        while let Some(id) = current {
            out.push(id);
            current = self.parent(id);
        }
        out
    }

    /// Whether the node is reachable from the root.
    #[must_use]
    pub fn is_connected(&self, node: NodeId) -> bool {
        node == self.root() || self.ancestors(node).last() == Some(&self.root())
    }

    /// All descendants of `node` in document (pre-)order, excluding `node`.
    #[must_use]
    pub fn descendants(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(node).iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.children(id).iter().rev().copied());
        }
        out
    }

    /// Element descendants of `node` in document order.
    #[must_use]
    pub fn elements(&self, node: NodeId) -> Vec<NodeId> {
        self.descendants(node)
            .into_iter()
            .filter(|&id| self.element(id).is_some())
            .collect()
    }

    /// First element descendant with the given tag name.
    #[must_use]
    pub fn first_by_tag(&self, node: NodeId, name: &str) -> Option<NodeId> {
        self.descendants(node)
            .into_iter()
            .find(|&id| self.tag_name(id) == Some(name))
    }

    /// First element descendant whose `id` attribute equals `id`.
    #[must_use]
    pub fn element_by_id(&self, node: NodeId, id: &str) -> Option<NodeId> {
        if id.is_empty() {
            return None;
        }
        self.descendants(node)
            .into_iter()
            .find(|&n| self.attr(n, "id") == Some(id))
    }

    /// Concatenated text of all descendant text nodes.
    #[must_use]
    pub fn text_content(&self, node: NodeId) -> String {
        let mut out = String::new();
        if let NodeData::Text(text) = self.data(node) {
            out.push_str(text);
        }
        for id in self.descendants(node) {
            if let NodeData::Text(text) = self.data(id) {
                out.push_str(text);
            }
        }
        out
    }

    /// Remove `node` from its parent. The node and its subtree stay in the
    /// arena, detached.
    pub fn detach(&mut self, node: NodeId) {
        if let Some(parent) = self.nodes[node.0].parent.take() {
            self.nodes[parent.0].children.retain(|&c| c != node);
        }
    }

    /// Append `child` as the last child of `parent`, moving it if attached.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
    }

    /// Insert `child` as the first child of `parent`, moving it if attached.
    pub fn prepend_child(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.insert(0, child);
    }

    /// Insert `node` immediately before `reference`.
    ///
    /// Does nothing when `reference` has no parent.
    pub fn insert_before(&mut self, reference: NodeId, node: NodeId) {
        let Some(parent) = self.parent(reference) else {
            return;
        };
        self.detach(node);
        let siblings = &mut self.nodes[parent.0].children;
        let index = siblings
            .iter()
            .position(|&c| c == reference)
            .unwrap_or(siblings.len());
        siblings.insert(index, node);
        self.nodes[node.0].parent = Some(parent);
    }

    /// Replace `node` in its parent with a text node holding `text`.
    pub fn replace_with_text(&mut self, node: NodeId, text: impl Into<String>) {
        if self.parent(node).is_none() {
            return;
        }
        let replacement = self.create_text(text);
        self.insert_before(node, replacement);
        self.detach(node);
    }

    /// Detach every child of `node`.
    pub fn clear_children(&mut self, node: NodeId) {
        for child in std::mem::take(&mut self.nodes[node.0].children) {
            self.nodes[child.0].parent = None;
        }
    }

    /// Copy the children of `other`'s root under `parent`.
    ///
    /// Listeners are not copied; they belong to the arena they were added to.
    pub fn import_children(&mut self, parent: NodeId, other: &Dom) {
        for &child in other.children(other.root()) {
            self.import_node(parent, other, child);
        }
    }

    fn import_node(&mut self, parent: NodeId, other: &Dom, node: NodeId) {
        let copy = self.push(other.data(node).clone());
        self.append_child(parent, copy);
        for &child in other.children(node) {
            self.import_node(copy, other, child);
        }
    }

    /// Register a click listener on `node`.
    pub fn add_event_listener(&mut self, node: NodeId, listener: Listener) {
        self.listeners.entry(node).or_default().push(listener);
    }

    /// Listeners registered on `node`, in registration order.
    #[must_use]
    pub fn listeners(&self, node: NodeId) -> Vec<Listener> {
        self.listeners.get(&node).cloned().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree() -> (Dom, NodeId, NodeId, NodeId) {
        let mut dom = Dom::new();
        let div = dom.create_element("div");
        let p = dom.create_element("p");
        let text = dom.create_text("hello");
        dom.append_child(dom.root(), div);
        dom.append_child(div, p);
        dom.append_child(p, text);
        (dom, div, p, text)
    }

    #[test]
    fn test_attributes_keep_order_and_replace_in_place() {
        let mut element = ElementData::new("a");
        element.set_attr("href", "/one");
        element.set_attr("class", "link");
        element.set_attr("href", "/two");

        let attrs: Vec<_> = element.attrs().collect();
        assert_eq!(attrs, vec![("href", "/two"), ("class", "link")]);
        assert_eq!(element.remove_attr("href"), Some("/two".to_owned()));
        assert!(!element.has_attr("href"));
    }

    #[test]
    fn test_has_class_splits_on_whitespace() {
        let mut element = ElementData::new("div");
        element.set_attr("class", "md-header  md-header--shadow");
        assert!(element.has_class("md-header"));
        assert!(element.has_class("md-header--shadow"));
        assert!(!element.has_class("md"));
    }

    #[test]
    fn test_detach_disconnects_subtree() {
        let (mut dom, div, p, text) = tree();
        assert!(dom.is_connected(text));

        dom.detach(p);

        assert!(dom.children(div).is_empty());
        assert!(!dom.is_connected(p));
        assert!(!dom.is_connected(text));
        assert_eq!(dom.text_content(p), "hello");
    }

    #[test]
    fn test_descendants_are_in_document_order() {
        let (mut dom, div, p, text) = tree();
        let span = dom.create_element("span");
        dom.append_child(div, span);

        assert_eq!(dom.descendants(dom.root()), vec![div, p, text, span]);
        assert_eq!(dom.elements(dom.root()), vec![div, p, span]);
    }

    #[test]
    fn test_insert_before_and_replace_with_text() {
        let (mut dom, div, p, _) = tree();
        let hr = dom.create_element("hr");
        dom.insert_before(p, hr);
        assert_eq!(dom.children(div), &[hr, p]);

        dom.replace_with_text(p, "plain");
        assert_eq!(dom.children(div).len(), 2);
        assert_eq!(dom.text_content(div), "plain");
    }

    #[test]
    fn test_clear_children_and_import() {
        let (mut dom, div, _, _) = tree();
        dom.clear_children(dom.root());
        assert!(dom.children(dom.root()).is_empty());
        assert!(!dom.is_connected(div));

        let (other, _, _, _) = tree();
        dom.import_children(dom.root(), &other);
        assert_eq!(dom.text_content(dom.root()), "hello");
        assert_eq!(dom.elements(dom.root()).len(), 2);
    }

    #[test]
    fn test_element_by_id_ignores_empty_id() {
        let (mut dom, _, p, _) = tree();
        dom.set_attr(p, "id", "intro");
        assert_eq!(dom.element_by_id(dom.root(), "intro"), Some(p));
        assert_eq!(dom.element_by_id(dom.root(), ""), None);
    }
}
