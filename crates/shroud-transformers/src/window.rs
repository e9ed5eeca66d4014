//! Browser window effects.

use std::cell::RefCell;

use shroud_dom::{Dom, NodeId};
use url::Url;

/// The page's window, as seen by transformers.
///
/// Methods take `&self`; implementations use interior mutability.
pub trait Window {
    /// Current page URL.
    fn location(&self) -> Url;

    /// In-app navigation to a path (with optional `#fragment`).
    fn navigate(&self, to: &str);

    /// Open `url` in another browsing context.
    fn open(&self, url: &str, target: &str);

    /// Scroll the page to `top` pixels.
    fn scroll_to(&self, top: u32);

    /// Vertical offset of `node` in pixels.
    fn offset_top(&self, dom: &Dom, node: NodeId) -> u32;

    /// Put `text` on the clipboard.
    fn write_clipboard(&self, text: &str);
}

/// Side effect recorded by [`HeadlessWindow`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WindowEffect {
    Navigate(String),
    Open { url: String, target: String },
    ScrollTo(u32),
    Clipboard(String),
}

/// Window without a browser. Records effects instead of performing them.
///
/// Layout is approximated: every element is [`HeadlessWindow::LINE_HEIGHT`]
/// pixels tall and stacked in document order.
#[derive(Debug)]
pub struct HeadlessWindow {
    location: RefCell<Url>,
    effects: RefCell<Vec<WindowEffect>>,
}

impl HeadlessWindow {
    pub const LINE_HEIGHT: u32 = 24;

    #[must_use]
    pub fn new(location: Url) -> Self {
        Self {
            location: RefCell::new(location),
            effects: RefCell::new(Vec::new()),
        }
    }

    /// All effects so far, oldest first.
    pub fn effects(&self) -> Vec<WindowEffect> {
        self.effects.borrow().clone()
    }

    /// Take and clear the recorded effects.
    pub fn take_effects(&self) -> Vec<WindowEffect> {
        std::mem::take(&mut *self.effects.borrow_mut())
    }

    /// Targets of in-app navigations.
    pub fn navigations(&self) -> Vec<String> {
        self.effects
            .borrow()
            .iter()
            .filter_map(|effect| match effect {
                WindowEffect::Navigate(to) => Some(to.clone()),
                _ => None,
            })
            .collect()
    }

    /// Scroll positions requested.
    pub fn scrolls(&self) -> Vec<u32> {
        self.effects
            .borrow()
            .iter()
            .filter_map(|effect| match effect {
                WindowEffect::ScrollTo(top) => Some(*top),
                _ => None,
            })
            .collect()
    }

    fn record(&self, effect: WindowEffect) {
        tracing::debug!(?effect, "Window effect");
        self.effects.borrow_mut().push(effect);
    }
}

impl Window for HeadlessWindow {
    fn location(&self) -> Url {
        self.location.borrow().clone()
    }

    fn navigate(&self, to: &str) {
        let next = self.location.borrow().join(to);
        match next {
            Ok(url) => *self.location.borrow_mut() = url,
            Err(e) => tracing::warn!(to, error = %e, "Navigation target is not a valid URL"),
        }
        self.record(WindowEffect::Navigate(to.to_owned()));
    }

    fn open(&self, url: &str, target: &str) {
        self.record(WindowEffect::Open {
            url: url.to_owned(),
            target: target.to_owned(),
        });
    }

    fn scroll_to(&self, top: u32) {
        self.record(WindowEffect::ScrollTo(top));
    }

    fn offset_top(&self, dom: &Dom, node: NodeId) -> u32 {
        let preceding = dom
            .elements(dom.root())
            .iter()
            .position(|&element| element == node)
            .unwrap_or(0);
        u32::try_from(preceding)
            .unwrap_or(u32::MAX)
            .saturating_mul(Self::LINE_HEIGHT)
    }

    fn write_clipboard(&self, text: &str) {
        self.record(WindowEffect::Clipboard(text.to_owned()));
    }
}
