//! Mutable HTML document model for Shroud.
//!
//! Documentation pages are parsed into a [`Dom`]: an arena of nodes addressed
//! by [`NodeId`]. Unlike a read-only parse tree, the arena supports the edits
//! the content pipeline needs after mounting (attribute rewrites, inserted and
//! removed elements) and carries click listeners attached by transformers.
//!
//! # Example
//!
//! ```
//! use shroud_dom::{Dom, Selector};
//!
//! let mut dom = Dom::parse_fragment(r#"<p><img src="a.png"></p>"#);
//! let images = dom.select(dom.root(), &Selector::parse("img[src]").unwrap());
//! dom.set_attr(images[0], "src", "https://cdn.example.com/a.png");
//! assert_eq!(dom.to_html(), r#"<p><img src="https://cdn.example.com/a.png"></p>"#);
//! ```

mod event;
mod node;
mod parse;
mod query;
mod serialize;

pub use event::{ClickEvent, Listener, Modifiers, dispatch_click};
pub use node::{Dom, ElementData, NodeData, NodeId};
pub use query::Selector;
pub use serialize::escape_html;

/// Error returned by DOM operations.
#[derive(Debug, thiserror::Error)]
pub enum DomError {
    /// Selector text could not be parsed.
    #[error("invalid selector `{selector}`: {reason}")]
    InvalidSelector {
        /// Selector as written.
        selector: String,
        /// What went wrong.
        reason: String,
    },
}
