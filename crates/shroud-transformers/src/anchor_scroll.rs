//! Scroll to the location fragment once layout settles.

use std::time::Duration;

use async_trait::async_trait;
use percent_encoding::percent_decode_str;
use shroud_host::ShadowRoot;

use crate::{TransformContext, TransformError, Transformer};

/// Delay before scrolling. Not configurable.
const SETTLE_DELAY: Duration = Duration::from_millis(200);

/// Scrolls to the element named by the location fragment, or to the top.
///
/// The scroll is scheduled on the attachment, so attaching a newer document
/// before the delay elapses cancels it.
#[derive(Debug, Default)]
pub struct AnchorScrollTransformer;

#[async_trait(?Send)]
impl Transformer for AnchorScrollTransformer {
    fn name(&self) -> &'static str {
        "anchor-scroll"
    }

    async fn apply(&self, root: &ShadowRoot, ctx: &TransformContext) -> Result<(), TransformError> {
        let scheduler = root.scheduler();
        let scrolled = scheduler
            .after(SETTLE_DELAY, || {
                let location = ctx.window.location();
                let fragment = location
                    .fragment()
                    .map(|f| percent_decode_str(f).decode_utf8_lossy().into_owned())
                    .unwrap_or_default();

                let top = root
                    .read(|dom| {
                        dom.element_by_id(dom.root(), &fragment)
                            .map(|node| ctx.window.offset_top(dom, node))
                    })
                    .ok()
                    .flatten()
                    .unwrap_or(0);

                ctx.window.scroll_to(top);
                top
            })
            .await;

        match scrolled {
            Some(top) => tracing::debug!(top, "Scrolled to anchor"),
            None => tracing::debug!("Scroll cancelled by a newer attachment"),
        }
        Ok(())
    }
}
