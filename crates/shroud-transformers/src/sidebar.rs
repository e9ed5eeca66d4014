//! Expands the navigation sections leading to the current page.

use async_trait::async_trait;
use shroud_dom::Selector;
use shroud_host::ShadowRoot;

use crate::{TransformContext, TransformError, Transformer};

/// Checks every `input.md-nav__toggle` whose nav item contains the active
/// link, so nested sections open on the current page.
#[derive(Debug, Default)]
pub struct SidebarTransformer;

#[async_trait(?Send)]
impl Transformer for SidebarTransformer {
    fn name(&self) -> &'static str {
        "sidebar"
    }

    async fn apply(&self, root: &ShadowRoot, _ctx: &TransformContext) -> Result<(), TransformError> {
        let toggles = Selector::parse("input.md-nav__toggle")?;
        let active = Selector::parse(".md-nav__link--active")?;

        let expanded = root.write(|dom| {
            let mut expanded = 0;
            for toggle in dom.select(dom.root(), &toggles) {
                let Some(item) = dom.parent(toggle) else {
                    continue;
                };
                if !dom.select(item, &active).is_empty() {
                    dom.set_attr(toggle, "checked", "");
                    expanded += 1;
                }
            }
            expanded
        })?;
        tracing::debug!(expanded, "Expanded navigation sections");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_expands_active_branch_only() {
        let (_host, root) = mock::mount(
            r#"<nav class="md-nav"><ul>
<li class="md-nav__item md-nav__item--nested"><input class="md-nav__toggle md-toggle" type="checkbox" id="nav-1"><label for="nav-1">Guides</label><nav class="md-nav"><ul><li><a class="md-nav__link md-nav__link--active" href="./">Setup</a></li></ul></nav></li>
<li class="md-nav__item md-nav__item--nested"><input class="md-nav__toggle md-toggle" type="checkbox" id="nav-2"><label for="nav-2">Reference</label><nav class="md-nav"><ul><li><a class="md-nav__link" href="../api/">API</a></li></ul></nav></li>
</ul></nav>"#,
        );
        let (ctx, _) = mock::default_context();

        SidebarTransformer.apply(&root, &ctx).await.unwrap();

        let checked = root
            .read(|dom| {
                ["nav-1", "nav-2"].map(|id| {
                    let toggle = dom.element_by_id(dom.root(), id).unwrap();
                    dom.has_attr(toggle, "checked")
                })
            })
            .unwrap();
        assert_eq!(checked, [true, false]);
    }
}
