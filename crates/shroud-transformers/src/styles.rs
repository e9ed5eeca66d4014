//! Theme stylesheet injection.

use async_trait::async_trait;
use shroud_host::ShadowRoot;

use crate::{TransformContext, TransformError, Transformer};

/// Theme values rendered into the injected stylesheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Theme {
    pub font_family: String,
    pub primary_color: String,
    pub background_color: String,
    pub text_color: String,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            font_family: "Helvetica Neue, Helvetica, Roboto, Arial, sans-serif".to_owned(),
            primary_color: "#1f5493".to_owned(),
            background_color: "#ffffff".to_owned(),
            text_color: "#000000de".to_owned(),
        }
    }
}

impl Theme {
    /// Stylesheet mapping the theme onto the MkDocs Material variables.
    pub fn stylesheet(&self) -> String {
        format!(
            r":host {{
  --md-default-fg-color: {text};
  --md-default-bg-color: {background};
  --md-primary-fg-color: {primary};
  --md-accent-fg-color: {primary};
  --md-typeset-a-color: {primary};
  font-family: {font};
  color: var(--md-default-fg-color);
  background-color: var(--md-default-bg-color);
}}
.md-main__inner {{ margin-top: 0; }}
.md-sidebar {{ position: sticky; top: 0; }}
.md-nav__link--active {{ color: var(--md-primary-fg-color); font-weight: bold; }}
.md-typeset {{ font-size: 1rem; line-height: 1.6; }}
.md-typeset pre {{ position: relative; }}
.md-clipboard {{ position: absolute; top: 0.5em; right: 0.5em; cursor: pointer; }}
",
            text = css_value(&self.text_color),
            background = css_value(&self.background_color),
            primary = css_value(&self.primary_color),
            font = css_value(&self.font_family),
        )
    }
}

/// Drop characters that could end the declaration or the `<style>` element.
fn css_value(value: &str) -> String {
    value.replace([';', '{', '}', '<', '>'], "")
}

/// Injects the theme stylesheet at the top of the document head.
#[derive(Debug, Default)]
pub struct StylesTransformer {
    theme: Theme,
}

impl StylesTransformer {
    #[must_use]
    pub fn new(theme: Theme) -> Self {
        Self { theme }
    }
}

#[async_trait(?Send)]
impl Transformer for StylesTransformer {
    fn name(&self) -> &'static str {
        "styles"
    }

    async fn apply(&self, root: &ShadowRoot, _ctx: &TransformContext) -> Result<(), TransformError> {
        let css = self.theme.stylesheet();
        root.write(|dom| {
            let root_node = dom.root();
            let parent = dom.first_by_tag(root_node, "head").unwrap_or(root_node);
            let style = dom.create_element("style");
            let text = dom.create_text(css);
            dom.append_child(style, text);
            dom.prepend_child(parent, style);
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock;

    #[tokio::test]
    async fn test_style_is_first_in_head() {
        let mut host = shroud_host::IsolationHost::new(Some(shroud_host::HostElement::new("div")));
        let root = host
            .attach(
                Some(shroud_dom::Dom::parse_document(
                    r#"<html><head><link rel="stylesheet" href="a.css"></head><body></body></html>"#,
                )),
                |_| {},
            )
            .unwrap();
        let (ctx, _) = mock::default_context();

        StylesTransformer::default().apply(&root, &ctx).await.unwrap();

        let html = root.inner_html().unwrap();
        assert!(html.starts_with("<html><head><style>:host {"), "{html}");
        assert!(html.contains("--md-primary-fg-color: #1f5493;"));
        assert!(html.contains(r#"</style><link rel="stylesheet" href="a.css"></head>"#));
    }

    #[tokio::test]
    async fn test_theme_values_cannot_close_the_style_element() {
        let (_host, root) = mock::mount("<p>x</p>");
        let (ctx, _) = mock::default_context();
        let theme = Theme {
            font_family: "Roboto</style><script>alert(1)</script>".to_owned(),
            ..Theme::default()
        };

        StylesTransformer::new(theme).apply(&root, &ctx).await.unwrap();

        let html = root.inner_html().unwrap();
        assert_eq!(html.matches("</style>").count(), 1, "{html}");
        assert!(!html.contains("<script>"));
        assert!(html.ends_with("</style><p>x</p>"));
    }

    #[tokio::test]
    async fn test_fragment_gets_style_at_root() {
        let (_host, root) = mock::mount("<p>x</p>");
        let (ctx, _) = mock::default_context();
        let theme = Theme {
            primary_color: "rebeccapurple".to_owned(),
            ..Theme::default()
        };

        StylesTransformer::new(theme).apply(&root, &ctx).await.unwrap();

        let html = root.inner_html().unwrap();
        assert!(html.starts_with("<style>"));
        assert!(html.contains("--md-accent-fg-color: rebeccapurple;"));
        assert!(html.ends_with("</style><p>x</p>"));
    }
}
