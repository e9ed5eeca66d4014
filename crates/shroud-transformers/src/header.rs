//! Removes the MkDocs site header.

use async_trait::async_trait;
use shroud_dom::Selector;
use shroud_host::ShadowRoot;

use crate::{TransformContext, TransformError, Transformer};

/// Removes `.md-header`; the host page provides its own header.
#[derive(Debug, Default)]
pub struct HeaderTransformer;

#[async_trait(?Send)]
impl Transformer for HeaderTransformer {
    fn name(&self) -> &'static str {
        "header"
    }

    async fn apply(&self, root: &ShadowRoot, _ctx: &TransformContext) -> Result<(), TransformError> {
        let selector = Selector::parse(".md-header")?;
        root.write(|dom| {
            for node in dom.select(dom.root(), &selector) {
                dom.detach(node);
            }
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock;

    #[tokio::test]
    async fn test_removes_header() {
        let (_host, root) = mock::mount(
            r#"<header class="md-header md-header--shadow"><nav>Site</nav></header><main><h1>Title</h1></main>"#,
        );
        let (ctx, _) = mock::default_context();

        HeaderTransformer.apply(&root, &ctx).await.unwrap();

        assert_eq!(root.inner_html().unwrap(), "<main><h1>Title</h1></main>");
    }
}
