//! Post-mount transformers for documentation pages.
//!
//! A [`Transformer`] runs once per attachment against the mounted
//! [`ShadowRoot`]. Some only edit the tree (removing site chrome, rewriting
//! links); others attach click listeners or resolve resource URLs through
//! the documentation backend.
//!
//! Browser-owned effects (navigation, new tabs, scrolling, the clipboard)
//! go through the [`Window`] in the [`TransformContext`]; backend access goes
//! through [`TechDocsStorageApi`] and [`Fetcher`].
//!
//! Test doubles live behind the `mock` feature.

mod anchor_scroll;
mod base_url;
mod copy_to_clipboard;
mod docs_link;
mod drawer;
mod entity;
mod feedback_link;
mod fetch;
mod footer;
mod header;
mod link_click;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
mod sidebar;
mod storage;
mod styles;
mod window;

use std::rc::Rc;

use async_trait::async_trait;
use shroud_dom::DomError;
use shroud_host::{HostError, ShadowRoot};

pub use anchor_scroll::AnchorScrollTransformer;
pub use base_url::BaseUrlTransformer;
pub use copy_to_clipboard::CopyToClipboardTransformer;
pub use docs_link::DocsLinkTransformer;
pub use drawer::DrawerTransformer;
pub use entity::{EntityName, EntityNameError};
pub use feedback_link::FeedbackLinkTransformer;
pub use fetch::{FetchError, Fetcher, HttpFetcher};
pub use footer::FooterTransformer;
pub use header::HeaderTransformer;
pub use link_click::LinkClickTransformer;
pub use sidebar::SidebarTransformer;
pub use storage::{ResolveError, TechDocsClient, TechDocsStorageApi};
pub use styles::{StylesTransformer, Theme};
pub use window::{HeadlessWindow, Window, WindowEffect};

/// Per-document context shared by every transformer of one render.
#[derive(Clone)]
pub struct TransformContext {
    /// Entity owning the documentation.
    pub entity: EntityName,
    /// Page path within the entity's documentation.
    pub path: String,
    pub window: Rc<dyn Window>,
    pub storage: Rc<dyn TechDocsStorageApi>,
    pub fetcher: Rc<dyn Fetcher>,
}

impl std::fmt::Debug for TransformContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransformContext")
            .field("entity", &self.entity)
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

/// Error from a single transformer.
///
/// Transformer errors never abort other transformers; the pipeline logs and
/// reports them.
#[derive(Debug, thiserror::Error)]
pub enum TransformError {
    /// The document was replaced or never attached.
    #[error("shadow root unavailable: {0}")]
    Host(#[from] HostError),
    /// A selector failed to parse.
    #[error(transparent)]
    Selector(#[from] DomError),
    /// The backend could not resolve URLs.
    #[error("URL resolution failed: {0}")]
    Resolve(#[from] ResolveError),
}

/// A unit of post-mount behavior.
///
/// `apply` is called once per attachment, in pipeline order. Implementations
/// read the tree fresh from `root` and must not assume another transformer
/// has already run.
#[async_trait(?Send)]
pub trait Transformer {
    /// Short name used in logs and reports (e.g. "base-url").
    fn name(&self) -> &'static str;

    /// Apply to the mounted document.
    async fn apply(&self, root: &ShadowRoot, ctx: &TransformContext) -> Result<(), TransformError>;
}
