//! In-memory doubles for tests.
//!
//! [`MockStorageApi`] resolves like [`TechDocsClient`] but can delay or fail
//! individual values; [`MockFetcher`] serves canned bodies.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;
use std::time::Duration;

use async_trait::async_trait;
use shroud_dom::Dom;
use shroud_host::{HostElement, IsolationHost, ShadowRoot};
use url::Url;

use crate::entity::EntityName;
use crate::fetch::{FetchError, Fetcher};
use crate::storage::{ResolveError, TechDocsClient, TechDocsStorageApi};
use crate::window::HeadlessWindow;
use crate::TransformContext;

/// Backend origin used by the doubles.
pub const MOCK_API_ORIGIN: &str = "https://backstage.example.com/api/techdocs";

/// Page location used by [`context`].
pub const MOCK_LOCATION: &str = "https://backstage.example.com/docs/default/component/payments/";

/// Storage API double.
#[derive(Debug)]
pub struct MockStorageApi {
    client: TechDocsClient,
    latencies: HashMap<String, Duration>,
    failures: HashSet<String>,
    requests: RefCell<Vec<String>>,
}

impl Default for MockStorageApi {
    fn default() -> Self {
        Self::new()
    }
}

impl MockStorageApi {
    #[must_use]
    pub fn new() -> Self {
        Self {
            client: TechDocsClient::new(MOCK_API_ORIGIN).unwrap(),
            latencies: HashMap::new(),
            failures: HashSet::new(),
            requests: RefCell::new(Vec::new()),
        }
    }

    /// Delay resolution of `value`.
    #[must_use]
    pub fn with_latency(mut self, value: impl Into<String>, latency: Duration) -> Self {
        self.latencies.insert(value.into(), latency);
        self
    }

    /// Fail resolution of `value`.
    #[must_use]
    pub fn with_failure(mut self, value: impl Into<String>) -> Self {
        self.failures.insert(value.into());
        self
    }

    /// Values resolved so far, in call order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.borrow().clone()
    }
}

#[async_trait(?Send)]
impl TechDocsStorageApi for MockStorageApi {
    async fn api_origin(&self) -> Result<String, ResolveError> {
        self.client.api_origin().await
    }

    async fn base_url(
        &self,
        value: &str,
        entity: &EntityName,
        path: &str,
    ) -> Result<String, ResolveError> {
        self.requests.borrow_mut().push(value.to_owned());
        if let Some(latency) = self.latencies.get(value) {
            tokio::time::sleep(*latency).await;
        }
        if self.failures.contains(value) {
            return Err(ResolveError::Unavailable(value.to_owned()));
        }
        self.client.resolve(value, entity, path)
    }
}

/// Fetcher double. Unknown URLs answer 404.
#[derive(Debug, Default)]
pub struct MockFetcher {
    responses: HashMap<String, String>,
    latencies: HashMap<String, Duration>,
    requests: RefCell<Vec<String>>,
}

impl MockFetcher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_response(mut self, url: impl Into<String>, body: impl Into<String>) -> Self {
        self.responses.insert(url.into(), body.into());
        self
    }

    #[must_use]
    pub fn with_latency(mut self, url: impl Into<String>, latency: Duration) -> Self {
        self.latencies.insert(url.into(), latency);
        self
    }

    /// URLs fetched so far, in call order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.borrow().clone()
    }
}

#[async_trait(?Send)]
impl Fetcher for MockFetcher {
    async fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
        self.requests.borrow_mut().push(url.to_owned());
        if let Some(latency) = self.latencies.get(url) {
            tokio::time::sleep(*latency).await;
        }
        self.responses
            .get(url)
            .cloned()
            .ok_or_else(|| FetchError::Status {
                status: 404,
                url: url.to_owned(),
            })
    }
}

/// Mount `html` as a fragment under a fresh host.
pub fn mount(html: &str) -> (IsolationHost, ShadowRoot) {
    let mut host = IsolationHost::new(Some(HostElement::new("div")));
    let root = host
        .attach(Some(Dom::parse_fragment(html)), |_| {})
        .unwrap();
    (host, root)
}

/// Context for `component:default/payments` at [`MOCK_LOCATION`].
pub fn context(
    window: Rc<HeadlessWindow>,
    storage: Rc<MockStorageApi>,
    fetcher: Rc<MockFetcher>,
) -> TransformContext {
    TransformContext {
        entity: EntityName::new("component", "default", "payments"),
        path: String::new(),
        window,
        storage,
        fetcher,
    }
}

/// Headless window at `location`.
pub fn window_at(location: &str) -> Rc<HeadlessWindow> {
    Rc::new(HeadlessWindow::new(Url::parse(location).unwrap()))
}

/// Context with default doubles and a window at [`MOCK_LOCATION`].
pub fn default_context() -> (TransformContext, Rc<HeadlessWindow>) {
    let window = window_at(MOCK_LOCATION);
    let ctx = context(
        Rc::clone(&window),
        Rc::new(MockStorageApi::new()),
        Rc::new(MockFetcher::new()),
    );
    (ctx, window)
}
