//! The isolation host.

use std::fmt::Write;
use std::rc::Rc;

use shroud_dom::{Dom, escape_html};

use crate::HostError;
use crate::root::{ShadowInner, ShadowRoot};
use crate::scheduler::{Attachment, Scheduler};

/// The page element a document is mounted under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostElement {
    tag: String,
    attrs: Vec<(String, String)>,
}

impl HostElement {
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attrs: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.push((name.into(), value.into()));
        self
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }
}

/// Mounts sanitized documents under one host element.
///
/// The shadow root is created on the first attachment and reused after
/// that. Each attachment replaces the previous document entirely and bumps
/// the generation, so at most one document is ever visible.
#[derive(Debug)]
pub struct IsolationHost {
    element: Option<HostElement>,
    shadow: Option<Rc<ShadowInner>>,
}

impl IsolationHost {
    /// Create a host. `None` models a page without a mount point; every
    /// attachment is then skipped.
    #[must_use]
    pub fn new(element: Option<HostElement>) -> Self {
        Self {
            element,
            shadow: None,
        }
    }

    pub fn element(&self) -> Option<&HostElement> {
        self.element.as_ref()
    }

    /// Mount `tree`, replacing any previous document.
    ///
    /// Skipped entirely, without calling `on_attached`, when there is no host
    /// element or no tree. Otherwise `on_attached` runs exactly once with the
    /// new snapshot, which is also returned. Timers scheduled by the previous
    /// attachment are cancelled.
    pub fn attach(
        &mut self,
        tree: Option<Dom>,
        on_attached: impl FnOnce(&ShadowRoot),
    ) -> Option<ShadowRoot> {
        let Some(element) = &self.element else {
            tracing::debug!("No host element, skipping attach");
            return None;
        };
        let Some(tree) = tree else {
            tracing::debug!(host = %element.tag, "No content, skipping attach");
            return None;
        };

        let shadow = self.shadow.get_or_insert_with(|| {
            tracing::debug!(host = %element.tag, "Created shadow root");
            Rc::new(ShadowInner::new())
        });

        shadow.attachment.borrow().cancel();
        *shadow.attachment.borrow_mut() = Rc::new(Attachment::default());
        shadow.dom.replace(tree);
        shadow.generation.set(shadow.generation.get() + 1);
        shadow.attached.set(true);

        let root = ShadowRoot::current(shadow);
        tracing::debug!(generation = root.generation(), "Attached document");
        on_attached(&root);
        Some(root)
    }

    /// Snapshot of the mounted document.
    pub fn lookup(&self) -> Result<ShadowRoot, HostError> {
        match &self.shadow {
            Some(shadow) if shadow.attached.get() => Ok(ShadowRoot::current(shadow)),
            _ => Err(HostError::NotAttached),
        }
    }

    /// Scheduler of the current attachment.
    pub fn scheduler(&self) -> Result<Scheduler, HostError> {
        self.lookup().map(|root| root.scheduler())
    }

    /// Unmount the current document and cancel its timers.
    ///
    /// The shadow root itself stays and is reused by the next attachment.
    pub fn detach(&mut self) {
        if let Some(shadow) = &self.shadow {
            shadow.attachment.borrow().cancel();
            shadow.dom.replace(Dom::new());
            shadow.generation.set(shadow.generation.get() + 1);
            shadow.attached.set(false);
        }
    }

    /// Serialize the host with its shadow root as declarative shadow DOM.
    pub fn to_html(&self) -> String {
        let Some(element) = &self.element else {
            return String::new();
        };

        let mut out = String::with_capacity(1024);
        write!(out, "<{}", element.tag).unwrap();
        for (name, value) in &element.attrs {
            write!(out, r#" {name}="{}""#, escape_html(value)).unwrap();
        }
        out.push('>');
        if let Some(shadow) = &self.shadow {
            out.push_str(r#"<template shadowrootmode="open">"#);
            out.push_str(&shadow.dom.borrow().to_html());
            out.push_str("</template>");
        }
        write!(out, "</{}>", element.tag).unwrap();
        out
    }
}
