//! Rewrites document links against the current page.

use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use shroud_dom::Selector;
use shroud_host::ShadowRoot;
use url::Url;

use crate::{TransformContext, TransformError, Transformer};

static EXTERNAL_LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^https?://").expect("valid regex"));

/// Makes every `a[href]` absolute relative to the page location.
///
/// MkDocs emits directory URLs (`guide/`), so a location without a trailing
/// slash or `.html` suffix is treated as a directory before joining.
/// External links open in a new tab. Links that cannot be resolved are
/// replaced by their text.
#[derive(Debug, Default)]
pub struct DocsLinkTransformer;

#[async_trait(?Send)]
impl Transformer for DocsLinkTransformer {
    fn name(&self) -> &'static str {
        "docs-link"
    }

    async fn apply(&self, root: &ShadowRoot, ctx: &TransformContext) -> Result<(), TransformError> {
        let base = normalize(ctx.window.location());
        let selector = Selector::parse("a[href]")?;

        let unresolved = root.write(|dom| {
            let mut unresolved = 0;
            for anchor in dom.select(dom.root(), &selector) {
                let Some(href) = dom.attr(anchor, "href").map(str::to_owned) else {
                    continue;
                };
                if EXTERNAL_LINK.is_match(&href) {
                    dom.set_attr(anchor, "target", "_blank");
                }
                match base.join(&href) {
                    Ok(url) => dom.set_attr(anchor, "href", url.as_str()),
                    Err(e) => {
                        tracing::debug!(%href, error = %e, "Replacing unresolvable link with text");
                        let text = dom.text_content(anchor);
                        dom.replace_with_text(anchor, if text.is_empty() { href } else { text });
                        unresolved += 1;
                    }
                }
            }
            unresolved
        })?;

        if unresolved > 0 {
            tracing::warn!(unresolved, "Dropped links that could not be resolved");
        }
        Ok(())
    }
}

/// Treat the location as a directory unless it names an HTML file.
fn normalize(mut location: Url) -> Url {
    let path = location.path();
    if !path.ends_with('/') && !path.ends_with(".html") {
        let path = format!("{path}/");
        location.set_path(&path);
    }
    location
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::mock::{self, MockFetcher, MockStorageApi};
    use pretty_assertions::assert_eq;

    async fn apply_at(location: &str, html: &str) -> String {
        let (_host, root) = mock::mount(html);
        let ctx = mock::context(
            mock::window_at(location),
            Rc::new(MockStorageApi::new()),
            Rc::new(MockFetcher::new()),
        );
        DocsLinkTransformer.apply(&root, &ctx).await.unwrap();
        root.inner_html().unwrap()
    }

    #[test]
    fn test_normalize() {
        let cases = [
            ("https://b.example.com/docs/x", "https://b.example.com/docs/x/"),
            ("https://b.example.com/docs/x/", "https://b.example.com/docs/x/"),
            ("https://b.example.com/docs/x/page.html", "https://b.example.com/docs/x/page.html"),
            ("https://b.example.com/docs/x?q=1#top", "https://b.example.com/docs/x/?q=1#top"),
        ];
        for (input, expected) in cases {
            assert_eq!(normalize(Url::parse(input).unwrap()).as_str(), expected);
        }
    }

    #[tokio::test]
    async fn test_relative_links_join_directory_location() {
        let html = apply_at(
            "https://backstage.example.com/docs/default/component/payments/guide",
            r##"<a href="../setup/">Setup</a><a href="#install">Install</a>"##,
        )
        .await;
        assert_eq!(
            html,
            r##"<a href="https://backstage.example.com/docs/default/component/payments/setup/">Setup</a><a href="https://backstage.example.com/docs/default/component/payments/guide/#install">Install</a>"##
        );
    }

    #[tokio::test]
    async fn test_external_links_open_in_new_tab() {
        let html = apply_at(
            mock::MOCK_LOCATION,
            r#"<a href="HTTPS://github.com/acme/payments">Repo</a><a href="mailto:team@example.com">Mail</a>"#,
        )
        .await;
        assert_eq!(
            html,
            r#"<a href="https://github.com/acme/payments" target="_blank">Repo</a><a href="mailto:team@example.com">Mail</a>"#
        );
    }

    #[tokio::test]
    async fn test_unresolvable_link_becomes_text() {
        let html = apply_at(
            mock::MOCK_LOCATION,
            r#"<p><a href="https://[::1">broken</a> and <a href="http://[bad"></a></p>"#,
        )
        .await;
        assert_eq!(html, "<p>broken and http://[bad</p>");
    }
}
