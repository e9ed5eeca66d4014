//! Sanitization policy.

use std::collections::BTreeSet;

use shroud_dom::{Dom, NodeId};

use crate::hooks::{HookStage, Hooks};

/// What survives sanitization.
///
/// The engine's default safe tag set is extended with `extra_allowed_tags`
/// and reduced by `denied_tags`; a tag in both lists is denied. `script` and
/// `style` are stripped together with their content unless explicitly
/// allowed.
///
/// Policies are built per render and own their hooks.
#[derive(Debug, Default)]
pub struct SanitizationPolicy {
    /// Tags allowed on top of the default safe set.
    pub extra_allowed_tags: BTreeSet<String>,
    /// Tags that never survive, whatever hooks do.
    pub denied_tags: BTreeSet<String>,
    /// Attributes allowed on every element on top of the defaults.
    pub extra_allowed_attributes: BTreeSet<String>,
    /// Keep the `html`/`head`/`body` structure instead of a body fragment.
    pub whole_document: bool,
    /// Stage hooks for this policy.
    pub hooks: Hooks,
}

impl SanitizationPolicy {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allow additional tags.
    #[must_use]
    pub fn allow_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extra_allowed_tags
            .extend(tags.into_iter().map(|t| t.into().to_ascii_lowercase()));
        self
    }

    /// Deny tags outright.
    #[must_use]
    pub fn deny_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.denied_tags
            .extend(tags.into_iter().map(|t| t.into().to_ascii_lowercase()));
        self
    }

    /// Allow additional attributes on every element.
    #[must_use]
    pub fn allow_attributes<I, S>(mut self, attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extra_allowed_attributes
            .extend(attributes.into_iter().map(|a| a.into().to_ascii_lowercase()));
        self
    }

    /// Keep the whole document structure.
    #[must_use]
    pub fn whole_document(mut self, whole_document: bool) -> Self {
        self.whole_document = whole_document;
        self
    }

    /// Register a hook for `stage`.
    #[must_use]
    pub fn hook(mut self, stage: HookStage, hook: impl Fn(&mut Dom, NodeId) + 'static) -> Self {
        self.hooks.insert(stage, hook);
        self
    }

    /// Whether `tag` must be absent from the output.
    #[must_use]
    pub fn is_denied(&self, tag: &str) -> bool {
        self.denied_tags.contains(tag)
            || (SCRIPTING_TAGS.contains(&tag) && !self.extra_allowed_tags.contains(tag))
    }

    /// Tags allowed on top of the defaults and not denied.
    pub(crate) fn effective_extra_tags(&self) -> impl Iterator<Item = &String> {
        self.extra_allowed_tags
            .iter()
            .filter(|tag| !self.denied_tags.contains(*tag))
    }
}

/// Tags that run code or restyle the page when not explicitly allowed.
pub(crate) const SCRIPTING_TAGS: &[&str] = &["script", "style"];
