//! Resource URL rewriting.
//!
//! Resource references in built documentation are relative to the page.
//! Once mounted inside the host application they would resolve against the
//! host page instead, so every resource-bearing attribute is resolved
//! through the backend and written back.
//!
//! The backend serves SVG files as `text/plain`, which browsers refuse to
//! render in `<img>`. SVGs loaded from the backend are therefore fetched and
//! inlined as base64 data URIs.

use std::sync::LazyLock;

use async_trait::async_trait;
use base64::Engine;
use base64::prelude::BASE64_STANDARD;
use futures::future::join_all;
use regex::Regex;
use shroud_dom::Selector;
use shroud_host::{NodeHandle, ShadowRoot};

use crate::{TransformContext, TransformError, Transformer};

/// Elements and the attribute carrying their resource reference.
const TARGETS: &[(&str, &str)] = &[
    ("img", "src"),
    ("script", "src"),
    ("source", "src"),
    ("link", "href"),
    ("a[download]", "href"),
];

/// Matches absolute and protocol-relative URLs.
static ABSOLUTE_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^([a-z]*:)?//").expect("valid regex"));

/// Whether a reference is an SVG served by the backend.
fn needs_inlining(attribute: &str, value: &str, api_origin: &str) -> bool {
    let is_svg_src = attribute == "src" && value.ends_with(".svg");
    let is_relative = !ABSOLUTE_URL.is_match(value);
    is_svg_src && (is_relative || value.starts_with(api_origin))
}

/// What happened to one element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Rewritten,
    Inlined,
    /// The element was annotated or left untouched.
    Failed,
    /// The document was replaced while resolving.
    Stale,
}

/// Rewrites `src`/`href` references against the documentation backend.
#[derive(Debug, Default)]
pub struct BaseUrlTransformer;

#[async_trait(?Send)]
impl Transformer for BaseUrlTransformer {
    fn name(&self) -> &'static str {
        "base-url"
    }

    async fn apply(&self, root: &ShadowRoot, ctx: &TransformContext) -> Result<(), TransformError> {
        let api_origin = ctx.storage.api_origin().await?;

        let selectors = TARGETS
            .iter()
            .map(|&(selector, attribute)| Ok((Selector::parse(selector)?, attribute)))
            .collect::<Result<Vec<_>, TransformError>>()?;

        let targets = root.read(|dom| {
            let mut targets = Vec::new();
            for (selector, attribute) in &selectors {
                for node in dom.select(dom.root(), selector) {
                    match dom.attr(node, attribute) {
                        Some(value) if !value.is_empty() => {
                            targets.push((root.handle(node), *attribute, value.to_owned()));
                        }
                        _ => {}
                    }
                }
            }
            targets
        })?;

        let outcomes = join_all(
            targets
                .iter()
                .map(|(handle, attribute, value)| rewrite(handle, attribute, value, &api_origin, ctx)),
        )
        .await;

        let count = |wanted| outcomes.iter().filter(|&&o| o == wanted).count();
        tracing::debug!(
            rewritten = count(Outcome::Rewritten),
            inlined = count(Outcome::Inlined),
            failed = count(Outcome::Failed),
            stale = count(Outcome::Stale),
            "Rewrote resource URLs"
        );
        Ok(())
    }
}

/// Resolve one element's reference and write the result back.
async fn rewrite(
    handle: &NodeHandle,
    attribute: &str,
    value: &str,
    api_origin: &str,
    ctx: &TransformContext,
) -> Outcome {
    let resolved = match ctx.storage.base_url(value, &ctx.entity, &ctx.path).await {
        Ok(resolved) => resolved,
        Err(e) => {
            tracing::warn!(%value, error = %e, "Failed to resolve resource URL");
            return Outcome::Failed;
        }
    };

    let (written, outcome) = if needs_inlining(attribute, value, api_origin) {
        match ctx.fetcher.fetch_text(&resolved).await {
            Ok(svg) => {
                let data_uri = format!(
                    "data:image/svg+xml;base64,{}",
                    BASE64_STANDARD.encode(svg)
                );
                (handle.set_attr(attribute, &data_uri), Outcome::Inlined)
            }
            Err(e) => {
                tracing::warn!(url = %resolved, error = %e, "Failed to inline SVG");
                (handle.set_attr("alt", &format!("Error: {value}")), Outcome::Failed)
            }
        }
    } else {
        (handle.set_attr(attribute, &resolved), Outcome::Rewritten)
    };

    if written { outcome } else { Outcome::Stale }
}
