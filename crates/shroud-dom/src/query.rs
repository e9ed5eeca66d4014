//! CSS selector matching against the arena.
//!
//! Selector text is parsed with scraper's `selectors` grammar, so anything
//! `scraper::Selector` accepts works here too: compounds, combinators,
//! `:not()`, `:has()` and the structural pseudo-classes. Matching runs
//! directly on [`Dom`] nodes through the [`selectors::Element`] impl below.

use scraper::error::SelectorErrorKind;
use scraper::selector::{CssLocalName, CssString, NonTSPseudoClass, Parser, PseudoElement, Simple};
use selectors::attr::{AttrSelectorOperation, CaseSensitivity, NamespaceConstraint};
use selectors::bloom::BloomFilter;
use selectors::matching::{
    self, ElementSelectorFlags, MatchingContext, MatchingForInvalidation, MatchingMode,
    NeedsSelectorFlags, QuirksMode, SelectorCaches,
};
use selectors::parser::ParseRelative;
use selectors::{Element, OpaqueElement, SelectorImpl, SelectorList};

use crate::DomError;
use crate::node::{Dom, ElementData, NodeData, NodeId};

const HTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";

/// Parsed selector group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    list: SelectorList<Simple>,
}

impl Selector {
    /// Parse selector text such as `"a[download]"` or `"pre > code"`.
    ///
    /// # Errors
    ///
    /// Returns [`DomError::InvalidSelector`] when the text is not a valid
    /// selector group.
    pub fn parse(text: &str) -> Result<Self, DomError> {
        let mut input = cssparser::ParserInput::new(text);
        let mut parser = cssparser::Parser::new(&mut input);
        SelectorList::parse(&Parser, &mut parser, ParseRelative::No)
            .map(|list| Self { list })
            .map_err(|e| DomError::InvalidSelector {
                selector: text.to_owned(),
                reason: SelectorErrorKind::from(e).to_string(),
            })
    }

    /// Whether `node` is an element matching any selector of the group.
    #[must_use]
    pub fn matches(&self, dom: &Dom, node: NodeId) -> bool {
        self.matches_with_caches(dom, node, &mut SelectorCaches::default())
    }

    pub(crate) fn matches_with_caches(
        &self,
        dom: &Dom,
        node: NodeId,
        caches: &mut SelectorCaches,
    ) -> bool {
        if dom.element(node).is_none() {
            return false;
        }
        let mut context = MatchingContext::new(
            MatchingMode::Normal,
            None,
            caches,
            QuirksMode::NoQuirks,
            NeedsSelectorFlags::No,
            MatchingForInvalidation::No,
        );
        matching::matches_selector_list(&self.list, &ElementNode { dom, id: node }, &mut context)
    }
}

impl Dom {
    /// Element descendants of `node` matching `selector`, in document order.
    #[must_use]
    pub fn select(&self, node: NodeId, selector: &Selector) -> Vec<NodeId> {
        let mut caches = SelectorCaches::default();
        self.descendants(node)
            .into_iter()
            .filter(|&id| selector.matches_with_caches(self, id, &mut caches))
            .collect()
    }
}

/// An element node seen through the `selectors` matching engine.
#[derive(Debug, Clone, Copy)]
struct ElementNode<'a> {
    dom: &'a Dom,
    id: NodeId,
}

impl<'a> ElementNode<'a> {
    fn wrap(dom: &'a Dom, id: NodeId) -> Option<Self> {
        dom.element(id).map(|_| Self { dom, id })
    }

    fn data(&self) -> &'a ElementData {
        self.dom
            .element(self.id)
            .unwrap_or_else(|| unreachable!("ElementNode wraps element nodes only"))
    }

    fn siblings(&self) -> (&'a [NodeId], usize) {
        let Some(parent) = self.dom.parent(self.id) else {
            return (&[], 0);
        };
        let siblings = self.dom.children(parent);
        let index = siblings.iter().position(|&c| c == self.id).unwrap_or(0);
        (siblings, index)
    }
}

impl Element for ElementNode<'_> {
    type Impl = Simple;

    fn opaque(&self) -> OpaqueElement {
        OpaqueElement::new(self.dom.data(self.id))
    }

    fn parent_element(&self) -> Option<Self> {
        ElementNode::wrap(self.dom, self.dom.parent(self.id)?)
    }

    fn parent_node_is_shadow_root(&self) -> bool {
        false
    }

    fn containing_shadow_host(&self) -> Option<Self> {
        None
    }

    fn is_pseudo_element(&self) -> bool {
        false
    }

    fn prev_sibling_element(&self) -> Option<Self> {
        let (siblings, index) = self.siblings();
        siblings[..index]
            .iter()
            .rev()
            .find_map(|&id| ElementNode::wrap(self.dom, id))
    }

    fn next_sibling_element(&self) -> Option<Self> {
        let (siblings, index) = self.siblings();
        siblings
            .get(index + 1..)?
            .iter()
            .find_map(|&id| ElementNode::wrap(self.dom, id))
    }

    fn first_element_child(&self) -> Option<Self> {
        self.dom
            .children(self.id)
            .iter()
            .find_map(|&id| ElementNode::wrap(self.dom, id))
    }

    fn is_html_element_in_html_document(&self) -> bool {
        true
    }

    fn has_local_name(&self, local_name: &CssLocalName) -> bool {
        self.data().name == *local_name.0
    }

    fn has_namespace(&self, ns: &<Simple as SelectorImpl>::BorrowedNamespaceUrl) -> bool {
        &**ns == HTML_NAMESPACE
    }

    fn is_same_type(&self, other: &Self) -> bool {
        self.data().name == other.data().name
    }

    fn attr_matches(
        &self,
        ns: &NamespaceConstraint<&<Simple as SelectorImpl>::NamespaceUrl>,
        local_name: &CssLocalName,
        operation: &AttrSelectorOperation<&CssString>,
    ) -> bool {
        // Attributes are stored without a namespace.
        if matches!(ns, NamespaceConstraint::Specific(url) if !url.is_empty()) {
            return false;
        }
        self.data()
            .attrs()
            .any(|(key, value)| key == &*local_name.0 && operation.eval_str(value))
    }

    fn match_non_ts_pseudo_class(
        &self,
        _pc: &NonTSPseudoClass,
        _context: &mut MatchingContext<'_, Simple>,
    ) -> bool {
        false
    }

    fn match_pseudo_element(
        &self,
        _pe: &PseudoElement,
        _context: &mut MatchingContext<'_, Simple>,
    ) -> bool {
        false
    }

    fn apply_selector_flags(&self, _flags: ElementSelectorFlags) {}

    fn is_link(&self) -> bool {
        matches!(self.data().name.as_str(), "a" | "area" | "link") && self.data().has_attr("href")
    }

    fn is_html_slot_element(&self) -> bool {
        self.data().name == "slot"
    }

    fn has_id(&self, id: &CssLocalName, case_sensitivity: CaseSensitivity) -> bool {
        self.data()
            .attr("id")
            .is_some_and(|value| case_sensitivity.eq(id.0.as_bytes(), value.as_bytes()))
    }

    fn has_class(&self, name: &CssLocalName, case_sensitivity: CaseSensitivity) -> bool {
        self.data().attr("class").is_some_and(|classes| {
            classes
                .split_ascii_whitespace()
                .any(|class| case_sensitivity.eq(name.0.as_bytes(), class.as_bytes()))
        })
    }

    fn has_custom_state(&self, _name: &CssLocalName) -> bool {
        false
    }

    fn imported_part(&self, _name: &CssLocalName) -> Option<CssLocalName> {
        None
    }

    fn is_part(&self, _name: &CssLocalName) -> bool {
        false
    }

    fn is_empty(&self) -> bool {
        !self
            .dom
            .children(self.id)
            .iter()
            .any(|&child| match self.dom.data(child) {
                NodeData::Element(_) => true,
                NodeData::Text(text) => !text.is_empty(),
                _ => false,
            })
    }

    fn is_root(&self) -> bool {
        self.dom
            .parent(self.id)
            .is_some_and(|parent| matches!(self.dom.data(parent), NodeData::Document))
    }

    fn add_element_unique_hashes(&self, _filter: &mut BloomFilter) -> bool {
        false
    }
}
