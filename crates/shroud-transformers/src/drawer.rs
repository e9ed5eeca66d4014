//! Navigation drawer and table-of-contents toggles.

use std::rc::Rc;

use async_trait::async_trait;
use shroud_dom::{ClickEvent, Selector};
use shroud_host::ShadowRoot;

use crate::{TransformContext, TransformError, Transformer};

/// Checkbox ids MkDocs Material uses for its drawers.
const TOGGLES: &[&str] = &["__drawer", "__toc"];

/// Starts both drawers closed and makes their labels toggle them.
#[derive(Debug, Default)]
pub struct DrawerTransformer;

#[async_trait(?Send)]
impl Transformer for DrawerTransformer {
    fn name(&self) -> &'static str {
        "drawer"
    }

    async fn apply(&self, root: &ShadowRoot, _ctx: &TransformContext) -> Result<(), TransformError> {
        let labels = Selector::parse("label[for]")?;
        root.write(|dom| {
            let top = dom.root();
            for id in TOGGLES {
                let Some(input) = dom.element_by_id(top, id) else {
                    continue;
                };
                dom.remove_attr(input, "checked");
                let toggle = root.handle(input);

                for label in dom.select(top, &labels) {
                    if dom.attr(label, "for") != Some(*id) {
                        continue;
                    }
                    let toggle = toggle.clone();
                    dom.add_event_listener(
                        label,
                        Rc::new(move |event: &mut ClickEvent| {
                            event.prevent_default();
                            toggle.update(|dom, input| {
                                if dom.remove_attr(input, "checked").is_none() {
                                    dom.set_attr(input, "checked", "");
                                }
                            });
                        }),
                    );
                }
            }
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use shroud_dom::Modifiers;

    use super::*;
    use crate::mock;

    #[tokio::test]
    async fn test_resets_and_toggles_drawer() {
        let (_host, root) = mock::mount(
            r#"<input class="md-toggle" type="checkbox" id="__drawer" checked><input class="md-toggle" type="checkbox" id="__toc"><label class="md-header__button" for="__drawer">menu</label>"#,
        );
        let (ctx, _) = mock::default_context();

        DrawerTransformer.apply(&root, &ctx).await.unwrap();

        let (drawer, label) = root
            .read(|dom| {
                let drawer = dom.element_by_id(dom.root(), "__drawer").unwrap();
                let label = dom.first_by_tag(dom.root(), "label").unwrap();
                (drawer, label)
            })
            .unwrap();
        let checked = || root.read(|dom| dom.has_attr(drawer, "checked")).unwrap();
        assert!(!checked());

        root.dispatch_click(label, Modifiers::default()).unwrap();
        assert!(checked());

        root.dispatch_click(label, Modifiers::default()).unwrap();
        assert!(!checked());
    }

    #[tokio::test]
    async fn test_missing_toggles_is_noop() {
        let (_host, root) = mock::mount("<p>no drawer</p>");
        let (ctx, _) = mock::default_context();

        DrawerTransformer.apply(&root, &ctx).await.unwrap();

        assert_eq!(root.inner_html().unwrap(), "<p>no drawer</p>");
    }
}
