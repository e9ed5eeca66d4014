//! MkDocs documentation reader for Shroud.
//!
//! [`MkDocsContent`] is the pipeline that turns raw MkDocs output into an
//! interactive, isolated page:
//!
//! 1. sanitize the markup under the MkDocs policy,
//! 2. attach the sanitized tree to an [`IsolationHost`](shroud_host::IsolationHost),
//! 3. run the post-mount transformers against the new shadow root.
//!
//! Steps 1 and 2 happen synchronously inside [`MkDocsContent::render`]. Step 3
//! is returned as a [`Rendering`] to be awaited; it owns everything it needs,
//! so the host can be re-rendered while an older rendering is still in
//! flight. The older one then finds its attachment superseded and its writes
//! are dropped.

mod content;
mod report;

use std::rc::Rc;

use shroud_config::Config;
use shroud_transformers::{
    EntityName, Fetcher, HeadlessWindow, HttpFetcher, ResolveError, TechDocsClient,
    TechDocsStorageApi, Window,
};
use url::Url;

pub use content::{MkDocsContent, Rendering};
pub use report::{RenderReport, TransformerReport, TransformerStatus};

/// Markup and metadata of one documentation page.
#[derive(Debug, Clone)]
pub struct RawContent {
    /// Built page HTML. `None` while the content is unavailable.
    pub markup: Option<String>,
    /// Page path within the entity's documentation (e.g. `guides/setup`).
    pub path: String,
    /// Entity owning the documentation.
    pub entity: EntityName,
}

/// Collaborators shared by every render.
#[derive(Clone)]
pub struct Services {
    pub window: Rc<dyn Window>,
    pub storage: Rc<dyn TechDocsStorageApi>,
    pub fetcher: Rc<dyn Fetcher>,
}

impl std::fmt::Debug for Services {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Services")
            .field("location", &self.window.location().as_str())
            .finish_non_exhaustive()
    }
}

impl Services {
    /// Backend client, HTTP fetcher and a headless window at
    /// `reader.location`.
    ///
    /// Returns the window separately so callers can inspect its effects.
    pub fn from_config(config: &Config) -> Result<(Self, Rc<HeadlessWindow>), RenderError> {
        let location =
            Url::parse(&config.reader.location).map_err(|source| RenderError::Location {
                location: config.reader.location.clone(),
                source,
            })?;
        let window = Rc::new(HeadlessWindow::new(location));
        let storage = TechDocsClient::new(&config.techdocs.api_origin)?;
        let fetcher = HttpFetcher::new(config.techdocs.request_timeout());

        let services = Self {
            window: Rc::clone(&window) as Rc<dyn Window>,
            storage: Rc::new(storage),
            fetcher: Rc::new(fetcher),
        };
        Ok((services, window))
    }
}

/// Error setting up the reader.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// The backend origin is unusable.
    #[error(transparent)]
    Storage(#[from] ResolveError),
    /// The reader location is not a URL.
    #[error("invalid reader location {location:?}: {source}")]
    Location {
        location: String,
        #[source]
        source: url::ParseError,
    },
}
