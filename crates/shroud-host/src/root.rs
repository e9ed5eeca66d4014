//! Shadow root snapshots and node handles.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use shroud_dom::{Dom, Modifiers, NodeId};

use crate::HostError;
use crate::scheduler::{Attachment, Scheduler};

/// State shared by every snapshot of one host's shadow root.
#[derive(Debug)]
pub(crate) struct ShadowInner {
    pub(crate) dom: RefCell<Dom>,
    pub(crate) generation: Cell<u64>,
    pub(crate) attached: Cell<bool>,
    pub(crate) attachment: RefCell<Rc<Attachment>>,
}

impl ShadowInner {
    pub(crate) fn new() -> Self {
        Self {
            dom: RefCell::new(Dom::new()),
            generation: Cell::new(0),
            attached: Cell::new(false),
            attachment: RefCell::new(Rc::new(Attachment::default())),
        }
    }

    fn is_current(&self, generation: u64) -> bool {
        self.attached.get() && self.generation.get() == generation
    }
}

/// Snapshot of the shadow root for one attachment.
///
/// Reads and writes fail with [`HostError::Superseded`] once a newer
/// document has been attached, so node ids from the old document are never
/// applied to the new one.
#[derive(Clone)]
pub struct ShadowRoot {
    inner: Rc<ShadowInner>,
    generation: u64,
    attachment: Rc<Attachment>,
}

impl fmt::Debug for ShadowRoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShadowRoot")
            .field("generation", &self.generation)
            .field("current", &self.is_current())
            .finish_non_exhaustive()
    }
}

impl ShadowRoot {
    pub(crate) fn current(inner: &Rc<ShadowInner>) -> Self {
        Self {
            inner: Rc::clone(inner),
            generation: inner.generation.get(),
            attachment: Rc::clone(&inner.attachment.borrow()),
        }
    }

    /// Attachment generation this snapshot belongs to.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether this snapshot still reflects the mounted document.
    pub fn is_current(&self) -> bool {
        self.inner.is_current(self.generation)
    }

    fn check(&self) -> Result<(), HostError> {
        if self.is_current() {
            Ok(())
        } else {
            Err(HostError::Superseded {
                generation: self.generation,
            })
        }
    }

    /// Read the mounted document.
    pub fn read<R>(&self, f: impl FnOnce(&Dom) -> R) -> Result<R, HostError> {
        self.check()?;
        Ok(f(&self.inner.dom.borrow()))
    }

    /// Mutate the mounted document.
    pub fn write<R>(&self, f: impl FnOnce(&mut Dom) -> R) -> Result<R, HostError> {
        self.check()?;
        Ok(f(&mut self.inner.dom.borrow_mut()))
    }

    /// Handle to `node` that outlives this snapshot.
    pub fn handle(&self, node: NodeId) -> NodeHandle {
        NodeHandle {
            root: Rc::downgrade(&self.inner),
            generation: self.generation,
            node,
        }
    }

    /// Scheduler whose timers are cancelled when this attachment is replaced.
    pub fn scheduler(&self) -> Scheduler {
        Scheduler::new(Rc::clone(&self.attachment))
    }

    /// Simulate a click on `target`, bubbling through its ancestors.
    pub fn dispatch_click(
        &self,
        target: NodeId,
        modifiers: Modifiers,
    ) -> Result<ClickOutcome, HostError> {
        self.check()?;
        let event = shroud_dom::dispatch_click(&self.inner.dom, target, modifiers);
        Ok(ClickOutcome {
            default_prevented: event.default_prevented(),
        })
    }

    /// Serialized content of the shadow root.
    pub fn inner_html(&self) -> Result<String, HostError> {
        self.read(Dom::to_html)
    }
}

/// Result of a dispatched click.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClickOutcome {
    /// A listener suppressed the browser's default action.
    pub default_prevented: bool,
}

/// Weak reference to one node of one attachment.
///
/// Operations on a handle whose attachment was replaced, or whose host is
/// gone, do nothing and report `None`/`false`.
#[derive(Clone)]
pub struct NodeHandle {
    root: Weak<ShadowInner>,
    generation: u64,
    node: NodeId,
}

impl fmt::Debug for NodeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeHandle")
            .field("generation", &self.generation)
            .field("node", &self.node)
            .field("live", &self.is_live())
            .finish()
    }
}

impl NodeHandle {
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// Whether the handle's attachment is still mounted.
    pub fn is_live(&self) -> bool {
        self.root
            .upgrade()
            .is_some_and(|inner| inner.is_current(self.generation))
    }

    /// Read the node.
    pub fn read<R>(&self, f: impl FnOnce(&Dom, NodeId) -> R) -> Option<R> {
        let inner = self.root.upgrade()?;
        if !inner.is_current(self.generation) {
            return None;
        }
        let dom = inner.dom.borrow();
        Some(f(&dom, self.node))
    }

    /// Mutate the node.
    pub fn update<R>(&self, f: impl FnOnce(&mut Dom, NodeId) -> R) -> Option<R> {
        let inner = self.root.upgrade()?;
        if !inner.is_current(self.generation) {
            tracing::debug!(
                generation = self.generation,
                current = inner.generation.get(),
                "Dropped write to superseded attachment"
            );
            return None;
        }
        let mut dom = inner.dom.borrow_mut();
        Some(f(&mut dom, self.node))
    }

    pub fn attr(&self, name: &str) -> Option<String> {
        self.read(|dom, node| dom.attr(node, name).map(str::to_owned))
            .flatten()
    }

    /// Set an attribute. Returns whether the write reached a live document.
    pub fn set_attr(&self, name: &str, value: &str) -> bool {
        self.update(|dom, node| dom.set_attr(node, name, value))
            .is_some()
    }
}
