//! Copy buttons for code blocks.

use std::rc::Rc;

use async_trait::async_trait;
use shroud_dom::{ClickEvent, Selector};
use shroud_host::ShadowRoot;

use crate::{TransformContext, TransformError, Transformer};

/// Appends a `button.md-clipboard` to every `pre` with a `code` child.
/// Clicking it writes the code's text to the window clipboard.
#[derive(Debug, Default)]
pub struct CopyToClipboardTransformer;

#[async_trait(?Send)]
impl Transformer for CopyToClipboardTransformer {
    fn name(&self) -> &'static str {
        "copy-to-clipboard"
    }

    async fn apply(&self, root: &ShadowRoot, ctx: &TransformContext) -> Result<(), TransformError> {
        let code_blocks = Selector::parse("pre > code")?;
        let buttons = root.write(|dom| {
            // One button per `pre`, bound to its first `code` child.
            let mut blocks = Vec::new();
            for code in dom.select(dom.root(), &code_blocks) {
                if let Some(pre) = dom.parent(code)
                    && blocks.iter().all(|&(seen, _)| seen != pre)
                {
                    blocks.push((pre, code));
                }
            }

            for &(pre, code) in &blocks {
                let button = dom.create_element("button");
                dom.set_attr(button, "class", "md-clipboard md-icon");
                dom.set_attr(button, "title", "Copy to clipboard");
                dom.append_child(pre, button);

                let code = root.handle(code);
                let window = Rc::clone(&ctx.window);
                dom.add_event_listener(
                    button,
                    Rc::new(move |event: &mut ClickEvent| {
                        event.prevent_default();
                        if let Some(text) = code.read(|dom, node| dom.text_content(node)) {
                            window.write_clipboard(&text);
                        }
                    }),
                );
            }
            blocks.len()
        })?;
        tracing::debug!(buttons, "Added copy buttons");
        Ok(())
    }
}
