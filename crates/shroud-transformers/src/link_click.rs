//! In-app handling of same-origin download links.

use std::rc::Rc;

use async_trait::async_trait;
use shroud_dom::ClickEvent;
use shroud_host::ShadowRoot;
use url::Url;

use crate::window::Window;
use crate::{TransformContext, TransformError, Transformer};

/// Routes clicks on same-origin `a[download]` links through the window.
///
/// Without a modifier the link navigates in-app to its path and fragment;
/// with ctrl or meta held it opens in a new tab. The `href` is read at click
/// time so rewrites applied after this transformer are honored.
#[derive(Debug, Default)]
pub struct LinkClickTransformer;

#[async_trait(?Send)]
impl Transformer for LinkClickTransformer {
    fn name(&self) -> &'static str {
        "link-click"
    }

    async fn apply(&self, root: &ShadowRoot, ctx: &TransformContext) -> Result<(), TransformError> {
        let anchors = root.write(|dom| {
            let anchors: Vec<_> = dom
                .elements(dom.root())
                .into_iter()
                .filter(|&node| dom.tag_name(node) == Some("a"))
                .collect();
            for &anchor in &anchors {
                let link = root.handle(anchor);
                let window = Rc::clone(&ctx.window);
                dom.add_event_listener(
                    anchor,
                    Rc::new(move |event: &mut ClickEvent| {
                        let Some((href, download)) = link.read(|dom, node| {
                            (dom.attr(node, "href").map(str::to_owned), dom.has_attr(node, "download"))
                        }) else {
                            return;
                        };
                        let Some(href) = href.filter(|href| !href.is_empty() && download) else {
                            return;
                        };
                        if let Some(path) = same_origin_path(window.as_ref(), &href) {
                            event.prevent_default();
                            if event.modifiers().new_tab() {
                                window.open(&path, "_blank");
                            } else {
                                window.navigate(&path);
                            }
                        }
                    }),
                );
            }
            anchors.len()
        })?;
        tracing::debug!(anchors, "Attached link click listeners");
        Ok(())
    }
}

/// Path and fragment of `href` when it is absolute and shares the window's
/// origin.
fn same_origin_path(window: &dyn Window, href: &str) -> Option<String> {
    let url = Url::parse(href).ok()?;
    if url.origin() != window.location().origin() {
        return None;
    }
    let mut path = url.path().to_owned();
    if let Some(fragment) = url.fragment().filter(|f| !f.is_empty()) {
        path.push('#');
        path.push_str(fragment);
    }
    Some(path)
}
