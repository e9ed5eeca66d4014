//! Removes the MkDocs footer meta block.

use async_trait::async_trait;
use shroud_dom::Selector;
use shroud_host::ShadowRoot;

use crate::{TransformContext, TransformError, Transformer};

/// Removes `.md-footer-meta` (generator notice and copyright). The
/// previous/next page links in `.md-footer` stay.
#[derive(Debug, Default)]
pub struct FooterTransformer;

#[async_trait(?Send)]
impl Transformer for FooterTransformer {
    fn name(&self) -> &'static str {
        "footer"
    }

    async fn apply(&self, root: &ShadowRoot, _ctx: &TransformContext) -> Result<(), TransformError> {
        let selector = Selector::parse(".md-footer-meta")?;
        let removed = root.write(|dom| {
            let nodes = dom.select(dom.root(), &selector);
            for &node in &nodes {
                dom.detach(node);
            }
            nodes.len()
        })?;
        tracing::debug!(removed, "Removed footer meta");
        Ok(())
    }
}
