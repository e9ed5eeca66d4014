//! The sanitization pass.

use shroud_dom::Dom;

use crate::hooks::HookStage;
use crate::policy::{SCRIPTING_TAGS, SanitizationPolicy};

/// Attributes allowed on every element.
const GENERIC_ATTRIBUTES: &[&str] = &["class", "id", "role", "title", "lang", "dir", "hidden"];

/// Attribute prefixes allowed on every element.
const GENERIC_ATTRIBUTE_PREFIXES: &[&str] = &["data-", "aria-"];

/// Attributes kept on tags the engine does not know about by default.
///
/// Only consulted for tags the policy actually allows.
const TAG_ATTRIBUTES: &[(&str, &[&str])] = &[
    ("link", &["href", "rel", "type", "media", "sizes", "hreflang", "crossorigin"]),
    (
        "iframe",
        &["src", "width", "height", "allow", "allowfullscreen", "frameborder", "loading"],
    ),
    ("input", &["type", "checked", "disabled", "name", "value", "autocomplete", "tabindex"]),
    ("label", &["for", "tabindex"]),
    ("button", &["type", "disabled", "name", "value"]),
    ("source", &["src", "srcset", "type", "media", "sizes"]),
    ("video", &["src", "poster", "controls", "width", "height", "loop", "muted", "preload"]),
    ("picture", &[]),
    ("script", &["src", "type", "async", "defer"]),
    ("style", &["media", "type"]),
    ("svg", &["viewBox", "viewbox", "xmlns", "width", "height", "fill"]),
    ("path", &["d", "fill", "fill-rule", "clip-rule", "stroke", "stroke-width"]),
    ("g", &["fill", "transform"]),
];

/// Sanitize `markup` under `policy`.
///
/// Returns `None` when the markup is empty or whitespace; callers render
/// nothing in that case. Otherwise the returned [`Dom`] is detached from any
/// host and holds either a body fragment or, with
/// [`SanitizationPolicy::whole_document`], a complete `html`/`head`/`body`
/// document.
///
/// Each registered hook runs once per call and is invoked once for every
/// element still connected when the stage reaches it. Denied tags are
/// removed again after the last hook, so a hook cannot reintroduce them.
#[must_use]
pub fn sanitize(markup: &str, policy: &SanitizationPolicy) -> Option<Dom> {
    if markup.trim().is_empty() {
        return None;
    }

    let mut dom = if policy.whole_document {
        Dom::parse_document(markup)
    } else {
        Dom::parse_fragment(markup)
    };
    run_hook(&mut dom, policy, HookStage::BeforeSanitizeElements);

    let builder = engine(policy);
    let mut dom = if policy.whole_document {
        let head = section_html(&dom, "head");
        let body = section_html(&dom, "body");
        let mut cleaned = Dom::parse_document(&format!(
            "<html><head>{}</head><body>{}</body></html>",
            builder.clean(&head),
            builder.clean(&body)
        ));
        for tag in ["html", "body"] {
            copy_root_attributes(&dom, &mut cleaned, tag, policy);
        }
        cleaned
    } else {
        Dom::parse_fragment(&builder.clean(&dom.to_html()).to_string())
    };

    run_hook(&mut dom, policy, HookStage::AfterSanitizeAttributes);
    enforce(&mut dom, policy);

    tracing::debug!(
        elements = dom.elements(dom.root()).len(),
        whole_document = policy.whole_document,
        "Sanitized markup"
    );
    Some(dom)
}

/// Configure the engine from the policy.
fn engine(policy: &SanitizationPolicy) -> ammonia::Builder<'_> {
    let mut builder = ammonia::Builder::default();
    builder
        .link_rel(None)
        .strip_comments(true)
        .add_tags(policy.effective_extra_tags())
        .rm_tags(policy.denied_tags.iter())
        .add_generic_attributes(GENERIC_ATTRIBUTES.iter().copied())
        .add_generic_attributes(policy.extra_allowed_attributes.iter())
        .add_generic_attribute_prefixes(GENERIC_ATTRIBUTE_PREFIXES.iter().copied())
        .add_tag_attributes("a", ["download", "target"].iter().copied());

    for tag in policy.effective_extra_tags() {
        if let Some((_, attributes)) = TAG_ATTRIBUTES.iter().find(|(name, _)| name == tag) {
            builder.add_tag_attributes(tag.as_str(), attributes.iter().copied());
        }
    }

    // The engine requires allowed tags and content-stripped tags to be disjoint.
    let allowed_scripting: Vec<&str> = SCRIPTING_TAGS
        .iter()
        .copied()
        .filter(|tag| !policy.is_denied(tag))
        .collect();
    builder.rm_clean_content_tags(allowed_scripting.iter().copied());

    if policy.whole_document && !policy.extra_allowed_tags.contains("title") {
        builder.add_clean_content_tags(["title"].iter().copied());
    }
    builder
}

/// Inner HTML of the first `tag` element, or empty.
fn section_html(dom: &Dom, tag: &str) -> String {
    dom.first_by_tag(dom.root(), tag)
        .map(|node| dom.inner_html(node))
        .unwrap_or_default()
}

/// Copy the allowed attributes of the `tag` element from `from` to `to`.
///
/// The engine only cleans the inner HTML of `head` and `body`, so attributes
/// on `<html>` and `<body>` are filtered here against the generic allow-list.
fn copy_root_attributes(from: &Dom, to: &mut Dom, tag: &str, policy: &SanitizationPolicy) {
    let (Some(source), Some(target)) = (
        from.first_by_tag(from.root(), tag),
        to.first_by_tag(to.root(), tag),
    ) else {
        return;
    };
    let Some(element) = from.element(source) else {
        return;
    };
    for (name, value) in element.attrs() {
        if is_generic_attribute(name, policy) {
            to.set_attr(target, name, value);
        }
    }
}

fn is_generic_attribute(name: &str, policy: &SanitizationPolicy) -> bool {
    GENERIC_ATTRIBUTES.contains(&name)
        || GENERIC_ATTRIBUTE_PREFIXES
            .iter()
            .any(|prefix| name.starts_with(prefix))
        || policy.extra_allowed_attributes.contains(name)
}

fn run_hook(dom: &mut Dom, policy: &SanitizationPolicy, stage: HookStage) {
    let Some(hook) = policy.hooks.get(stage) else {
        return;
    };
    let root = dom.root();
    for node in dom.elements(root) {
        // Earlier invocations may have removed this element or an ancestor.
        if dom.is_connected(node) {
            hook(dom, node);
        }
    }
}

/// Remove denied elements and inline event handlers.
fn enforce(dom: &mut Dom, policy: &SanitizationPolicy) {
    let root = dom.root();
    for node in dom.elements(root) {
        if !dom.is_connected(node) {
            continue;
        }
        if dom.tag_name(node).is_some_and(|tag| policy.is_denied(tag)) {
            tracing::debug!(tag = dom.tag_name(node), "Removed denied element");
            dom.detach(node);
            continue;
        }
        if let Some(element) = dom.element_mut(node) {
            element.retain_attrs(|name, _| !is_event_handler(name));
        }
    }
}

fn is_event_handler(name: &str) -> bool {
    name.len() > 2 && name.get(..2).is_some_and(|prefix| prefix.eq_ignore_ascii_case("on"))
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use shroud_dom::NodeId;

    use super::*;
    use pretty_assertions::assert_eq;

    fn by_tag(dom: &Dom, tag: &str) -> Vec<NodeId> {
        dom.elements(dom.root())
            .into_iter()
            .filter(|&n| dom.tag_name(n) == Some(tag))
            .collect()
    }

    #[test]
    fn test_empty_markup_is_no_content() {
        let policy = SanitizationPolicy::new();
        assert!(sanitize("", &policy).is_none());
        assert!(sanitize("  \n\t", &policy).is_none());
    }

    #[test]
    fn test_strips_scripts_and_handlers() {
        let policy = SanitizationPolicy::new();
        let dom = sanitize(
            r#"<div onclick="steal()"><script>alert(1)</script><a href="/x" onmouseover="y()">x</a></div>"#,
            &policy,
        )
        .unwrap();

        assert_eq!(dom.to_html(), r#"<div><a href="/x">x</a></div>"#);
    }

    #[test]
    fn test_keeps_class_id_and_data_attributes() {
        let policy = SanitizationPolicy::new();
        let dom = sanitize(
            r#"<h2 id="section-2" class="md-typeset" data-md-component="title">T</h2>"#,
            &policy,
        )
        .unwrap();

        assert_eq!(
            dom.to_html(),
            r#"<h2 id="section-2" class="md-typeset" data-md-component="title">T</h2>"#
        );
    }

    #[test]
    fn test_denied_tag_survives_no_hook() {
        let policy = SanitizationPolicy::new()
            .allow_tags(["style"])
            .deny_tags(["style", "iframe"])
            .hook(HookStage::AfterSanitizeAttributes, |dom, node| {
                if dom.tag_name(node) == Some("p") {
                    let style = dom.create_element("style");
                    let iframe = dom.create_element("iframe");
                    dom.append_child(node, style);
                    dom.append_child(node, iframe);
                }
            });

        let dom = sanitize("<p>one</p><style>p { color: red }</style><p>two</p>", &policy).unwrap();

        assert!(by_tag(&dom, "style").is_empty());
        assert!(by_tag(&dom, "iframe").is_empty());
        assert_eq!(dom.to_html(), "<p>one</p><p>two</p>");
    }

    #[test]
    fn test_hook_added_handler_is_stripped() {
        let policy = SanitizationPolicy::new().hook(
            HookStage::AfterSanitizeAttributes,
            |dom, node| dom.set_attr(node, "onload", "x()"),
        );

        let dom = sanitize("<img src='a.png'>", &policy).unwrap();
        assert_eq!(dom.to_html(), r#"<img src="a.png">"#);
    }

    #[test]
    fn test_each_hook_runs_once_per_element() {
        let before = Rc::new(Cell::new(0));
        let after = Rc::new(Cell::new(0));
        let before_count = Rc::clone(&before);
        let after_count = Rc::clone(&after);

        let policy = SanitizationPolicy::new()
            .hook(HookStage::BeforeSanitizeElements, move |_, _| {
                before_count.set(before_count.get() + 1);
            })
            .hook(HookStage::AfterSanitizeAttributes, move |_, _| {
                after_count.set(after_count.get() + 1);
            });

        sanitize("<ul><li>a</li><li>b</li></ul><script>x</script>", &policy).unwrap();

        // The script is seen before filtering but not after.
        assert_eq!(before.get(), 4);
        assert_eq!(after.get(), 3);
    }

    #[test]
    fn test_before_hook_removes_disallowed_iframes() {
        let policy = SanitizationPolicy::new()
            .allow_tags(["iframe"])
            .hook(HookStage::BeforeSanitizeElements, |dom, node| {
                if dom.tag_name(node) != Some("iframe") {
                    return;
                }
                let allowed = dom
                    .attr(node, "src")
                    .is_some_and(|src| src.starts_with("https://www.youtube.com/"));
                if !allowed {
                    dom.detach(node);
                }
            });

        let dom = sanitize(
            r#"<iframe src="https://www.youtube.com/embed/1"></iframe><iframe src="https://evil.example/"></iframe>"#,
            &policy,
        )
        .unwrap();

        let iframes = by_tag(&dom, "iframe");
        assert_eq!(iframes.len(), 1);
        assert_eq!(
            dom.attr(iframes[0], "src"),
            Some("https://www.youtube.com/embed/1")
        );
    }

    #[test]
    fn test_whole_document_keeps_head_and_body() {
        let policy = SanitizationPolicy::new()
            .allow_tags(["link"])
            .deny_tags(["style"])
            .whole_document(true)
            .hook(HookStage::AfterSanitizeAttributes, |dom, node| {
                if dom.tag_name(node) == Some("link") && dom.attr(node, "rel") != Some("stylesheet")
                {
                    dom.detach(node);
                }
            });

        let dom = sanitize(
            r#"<!DOCTYPE html><html><head><title>Docs</title><link rel="stylesheet" href="assets/main.css"><link rel="icon" href="favicon.png"><style>body{}</style></head><body><article class="md-content"><p>Hi</p></article></body></html>"#,
            &policy,
        )
        .unwrap();

        assert_eq!(
            dom.to_html(),
            r#"<html><head><link rel="stylesheet" href="assets/main.css"></head><body><article class="md-content"><p>Hi</p></article></body></html>"#
        );
    }

    #[test]
    fn test_whole_document_keeps_root_attributes() {
        let policy = SanitizationPolicy::new()
            .allow_attributes(["data-md-color-primary"])
            .whole_document(true);

        let dom = sanitize(
            r#"<html lang="en" class="no-js" manifest="evil.appcache"><head></head><body dir="ltr" data-md-color-scheme="slate" data-md-color-primary="indigo" onload="steal()" style="color:red"><p>x</p></body></html>"#,
            &policy,
        )
        .unwrap();

        assert_eq!(
            dom.to_html(),
            r#"<html lang="en" class="no-js"><head></head><body dir="ltr" data-md-color-scheme="slate" data-md-color-primary="indigo"><p>x</p></body></html>"#
        );
    }

    #[test]
    fn test_explicitly_allowed_style_is_kept() {
        let policy = SanitizationPolicy::new().allow_tags(["style"]);
        let dom = sanitize("<style>p { color: red; }</style><p>x</p>", &policy).unwrap();
        assert_eq!(dom.to_html(), "<style>p { color: red; }</style><p>x</p>");
    }
}
