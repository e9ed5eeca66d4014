//! The MkDocs content pipeline.

use std::any::Any;
use std::future::IntoFuture;
use std::panic::AssertUnwindSafe;
use std::rc::Rc;

use futures::FutureExt;
use futures::future::{LocalBoxFuture, join_all};
use shroud_config::Config;
use shroud_dom::{Dom, NodeId};
use shroud_host::{IsolationHost, ShadowRoot};
use shroud_sanitizer::{HookStage, SanitizationPolicy, sanitize};
use shroud_transformers::{
    AnchorScrollTransformer, BaseUrlTransformer, CopyToClipboardTransformer, DocsLinkTransformer,
    DrawerTransformer, FeedbackLinkTransformer, FooterTransformer, HeaderTransformer,
    LinkClickTransformer, SidebarTransformer, StylesTransformer, Theme, TransformContext,
    Transformer,
};
use url::Url;

use crate::report::{RenderReport, TransformerReport, TransformerStatus};
use crate::{RawContent, Services};

/// Tags MkDocs Material needs beyond the sanitizer's defaults.
const MKDOCS_TAGS: &[&str] = &[
    "link", "input", "label", "main", "section", "source", "video", "picture", "button", "svg",
    "path", "g",
];

/// Renders MkDocs pages into an isolation host.
pub struct MkDocsContent {
    services: Services,
    allowed_iframe_hosts: Rc<[String]>,
    transformers: Vec<Rc<dyn Transformer>>,
}

impl std::fmt::Debug for MkDocsContent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MkDocsContent")
            .field("allowed_iframe_hosts", &self.allowed_iframe_hosts)
            .field("transformers", &self.transformer_names())
            .finish_non_exhaustive()
    }
}

impl MkDocsContent {
    /// Pipeline with the standard transformers, themed and filtered per
    /// `config`.
    pub fn new(config: &Config, services: Services) -> Self {
        let theme = Theme {
            font_family: config.theme.font_family.clone(),
            primary_color: config.theme.primary_color.clone(),
            background_color: config.theme.background_color.clone(),
            text_color: config.theme.text_color.clone(),
        };
        let transformers: Vec<Rc<dyn Transformer>> = vec![
            Rc::new(StylesTransformer::new(theme)),
            Rc::new(HeaderTransformer),
            Rc::new(FooterTransformer),
            Rc::new(DrawerTransformer),
            Rc::new(AnchorScrollTransformer),
            Rc::new(BaseUrlTransformer),
            Rc::new(FeedbackLinkTransformer),
            Rc::new(DocsLinkTransformer),
            Rc::new(LinkClickTransformer),
            Rc::new(SidebarTransformer),
            Rc::new(CopyToClipboardTransformer),
        ];

        Self {
            services,
            allowed_iframe_hosts: config.sanitizer.allowed_iframe_hosts.clone().into(),
            transformers,
        }
    }

    /// Append a transformer after the standard ones.
    #[must_use]
    pub fn with_transformer(mut self, transformer: Rc<dyn Transformer>) -> Self {
        self.transformers.push(transformer);
        self
    }

    pub fn transformer_names(&self) -> Vec<&'static str> {
        self.transformers.iter().map(|t| t.name()).collect()
    }

    /// Sanitization policy for one render.
    ///
    /// Built fresh each time so hooks never leak between documents.
    pub fn policy(&self) -> SanitizationPolicy {
        let mut policy = SanitizationPolicy::new()
            .allow_tags(MKDOCS_TAGS.iter().copied())
            .deny_tags(["style"])
            .whole_document(true)
            .hook(HookStage::AfterSanitizeAttributes, remove_non_stylesheet_link);

        if !self.allowed_iframe_hosts.is_empty() {
            let hosts = Rc::clone(&self.allowed_iframe_hosts);
            policy = policy
                .allow_tags(["iframe"])
                .hook(HookStage::BeforeSanitizeElements, move |dom, node| {
                    remove_foreign_iframe(&hosts, dom, node);
                });
        }
        policy
    }

    /// Sanitize and attach `content`, returning the pending transformer run.
    ///
    /// Returns `None`, without touching the host, when there is no markup,
    /// the markup is empty, or the host has no element. `on_load` runs once
    /// the sanitized tree is attached and before any transformer.
    pub fn render(
        &self,
        host: &mut IsolationHost,
        content: RawContent,
        on_load: impl FnOnce(&ShadowRoot),
    ) -> Option<Rendering> {
        let RawContent {
            markup,
            path,
            entity,
        } = content;

        let Some(markup) = markup else {
            tracing::debug!(%entity, %path, "No content, nothing to render");
            return None;
        };
        let tree = sanitize(&markup, &self.policy())?;
        let root = host.attach(Some(tree), on_load)?;
        tracing::info!(%entity, %path, generation = root.generation(), "Rendered documentation page");

        let ctx = TransformContext {
            entity,
            path,
            window: Rc::clone(&self.services.window),
            storage: Rc::clone(&self.services.storage),
            fetcher: Rc::clone(&self.services.fetcher),
        };
        let transformers = self.transformers.clone();
        let generation = root.generation();
        let task_root = root.clone();
        let task = async move {
            let runs = transformers
                .iter()
                .map(|transformer| run_transformer(transformer.as_ref(), &task_root, &ctx));
            RenderReport {
                generation,
                transformers: join_all(runs).await,
            }
        }
        .boxed_local();

        Some(Rendering { root, task })
    }
}

/// Transformers of one render, still to be driven.
///
/// Await it (or [`Rendering::finish`]) to run every transformer and collect
/// the [`RenderReport`]. Dropping it skips the transformers.
pub struct Rendering {
    root: ShadowRoot,
    task: LocalBoxFuture<'static, RenderReport>,
}

impl std::fmt::Debug for Rendering {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rendering")
            .field("root", &self.root)
            .finish_non_exhaustive()
    }
}

impl Rendering {
    /// Snapshot of the attachment this rendering transforms.
    pub fn root(&self) -> &ShadowRoot {
        &self.root
    }

    pub async fn finish(self) -> RenderReport {
        self.task.await
    }
}

impl IntoFuture for Rendering {
    type Output = RenderReport;
    type IntoFuture = LocalBoxFuture<'static, RenderReport>;

    fn into_future(self) -> Self::IntoFuture {
        self.task
    }
}

/// Run one transformer, containing its error or panic.
async fn run_transformer(
    transformer: &dyn Transformer,
    root: &ShadowRoot,
    ctx: &TransformContext,
) -> TransformerReport {
    let name = transformer.name();
    let status = match AssertUnwindSafe(transformer.apply(root, ctx))
        .catch_unwind()
        .await
    {
        Ok(Ok(())) => {
            tracing::debug!(transformer = name, "Transformer finished");
            TransformerStatus::Ok
        }
        Ok(Err(e)) => {
            tracing::warn!(transformer = name, error = %e, "Transformer failed");
            TransformerStatus::Failed(e.to_string())
        }
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            tracing::warn!(transformer = name, panic = %message, "Transformer panicked");
            TransformerStatus::Panicked(message)
        }
    };
    TransformerReport { name, status }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_owned())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_owned())
}

/// Only stylesheets may be linked; icons, preloads and feeds are dropped.
fn remove_non_stylesheet_link(dom: &mut Dom, node: NodeId) {
    if dom.tag_name(node) != Some("link") {
        return;
    }
    let stylesheet = dom.attr(node, "rel").is_some_and(|rel| {
        rel.split_ascii_whitespace()
            .any(|token| token.eq_ignore_ascii_case("stylesheet"))
    });
    if !stylesheet {
        dom.detach(node);
    }
}

/// Drop iframes whose `src` host is not allow-listed.
fn remove_foreign_iframe(hosts: &[String], dom: &mut Dom, node: NodeId) {
    if dom.tag_name(node) != Some("iframe") {
        return;
    }
    let host = dom
        .attr(node, "src")
        .and_then(|src| Url::parse(src).ok())
        .and_then(|url| url.host_str().map(str::to_ascii_lowercase));
    let allowed = host.is_some_and(|host| hosts.contains(&host));
    if !allowed {
        tracing::debug!(src = ?dom.attr(node, "src"), "Removed iframe from unlisted host");
        dom.detach(node);
    }
}
