//! Click events and listener dispatch.

use std::cell::RefCell;
use std::rc::Rc;

use crate::node::{Dom, NodeId};

/// Keyboard modifiers held while clicking.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub ctrl: bool,
    pub meta: bool,
    pub shift: bool,
    pub alt: bool,
}

impl Modifiers {
    /// Ctrl or Meta, the "open in new tab" chord.
    #[must_use]
    pub fn new_tab(self) -> bool {
        self.ctrl || self.meta
    }
}

/// A click travelling from its target up through the ancestors.
#[derive(Debug)]
pub struct ClickEvent {
    target: NodeId,
    current_target: NodeId,
    modifiers: Modifiers,
    default_prevented: bool,
    propagation_stopped: bool,
}

impl ClickEvent {
    /// Create an event targeting `target`.
    #[must_use]
    pub fn new(target: NodeId, modifiers: Modifiers) -> Self {
        Self {
            target,
            current_target: target,
            modifiers,
            default_prevented: false,
            propagation_stopped: false,
        }
    }

    /// Node the click happened on.
    #[must_use]
    pub fn target(&self) -> NodeId {
        self.target
    }

    /// Node whose listener is currently running.
    #[must_use]
    pub fn current_target(&self) -> NodeId {
        self.current_target
    }

    #[must_use]
    pub fn modifiers(&self) -> Modifiers {
        self.modifiers
    }

    /// Suppress the default action (navigation for links).
    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    #[must_use]
    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }

    /// Do not run listeners on further ancestors.
    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }
}

/// Click listener. Listeners capture whatever handles they need to act on.
pub type Listener = Rc<dyn Fn(&mut ClickEvent)>;

/// Dispatch a click on `target`, bubbling to the root.
///
/// Listeners for each node are collected while the arena is borrowed and run
/// after the borrow is released, so a listener may freely mutate the arena.
pub fn dispatch_click(dom: &RefCell<Dom>, target: NodeId, modifiers: Modifiers) -> ClickEvent {
    let path: Vec<NodeId> = {
        let dom = dom.borrow();
        std::iter::once(target).chain(dom.ancestors(target)).collect()
    };

    let mut event = ClickEvent::new(target, modifiers);
    for node in path {
        let listeners = dom.borrow().listeners(node);
        event.current_target = node;
        for listener in listeners {
            listener(&mut event);
        }
        if event.propagation_stopped {
            break;
        }
    }
    event
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    #[test]
    fn test_click_bubbles_to_ancestors() {
        let mut dom = Dom::parse_fragment("<a href='/x'><span>x</span></a>");
        let a = dom.first_by_tag(dom.root(), "a").unwrap();
        let span = dom.first_by_tag(a, "span").unwrap();

        let seen = Rc::new(Cell::new(None));
        let seen_in_listener = Rc::clone(&seen);
        dom.add_event_listener(
            a,
            Rc::new(move |event: &mut ClickEvent| {
                seen_in_listener.set(Some((event.target(), event.current_target())));
                event.prevent_default();
            }),
        );

        let dom = RefCell::new(dom);
        let event = dispatch_click(&dom, span, Modifiers::default());

        assert!(event.default_prevented());
        assert_eq!(seen.get(), Some((span, a)));
    }

    #[test]
    fn test_listener_may_mutate_dom() {
        let mut dom = Dom::parse_fragment("<label for='t'>x</label><input id='t'>");
        let label = dom.first_by_tag(dom.root(), "label").unwrap();
        let input = dom.first_by_tag(dom.root(), "input").unwrap();
        let dom = Rc::new(RefCell::new(dom));

        let handle = Rc::downgrade(&dom);
        dom.borrow_mut().add_event_listener(
            label,
            Rc::new(move |_: &mut ClickEvent| {
                if let Some(dom) = handle.upgrade() {
                    dom.borrow_mut().set_attr(input, "checked", "");
                }
            }),
        );

        dispatch_click(&dom, label, Modifiers::default());
        assert!(dom.borrow().has_attr(input, "checked"));
    }

    #[test]
    fn test_stop_propagation() {
        let mut dom = Dom::parse_fragment("<div><button>b</button></div>");
        let div = dom.first_by_tag(dom.root(), "div").unwrap();
        let button = dom.first_by_tag(div, "button").unwrap();
        let hits = Rc::new(Cell::new(0));

        let outer = Rc::clone(&hits);
        dom.add_event_listener(div, Rc::new(move |_: &mut ClickEvent| outer.set(outer.get() + 1)));
        dom.add_event_listener(button, Rc::new(|event: &mut ClickEvent| event.stop_propagation()));

        dispatch_click(&RefCell::new(dom), button, Modifiers::default());
        assert_eq!(hits.get(), 0);
    }
}
