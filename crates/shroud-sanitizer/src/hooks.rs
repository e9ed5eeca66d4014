//! Lifecycle hooks run around the sanitization pass.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use shroud_dom::{Dom, NodeId};

/// Point in the sanitization pass where a hook runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HookStage {
    /// Before the engine filters elements. Sees the raw parsed markup.
    BeforeSanitizeElements,
    /// After the engine filtered elements and attributes.
    AfterSanitizeAttributes,
}

impl HookStage {
    /// Stage name as used in configuration.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::BeforeSanitizeElements => "beforeSanitizeElements",
            Self::AfterSanitizeAttributes => "afterSanitizeAttributes",
        }
    }
}

impl fmt::Display for HookStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error for stage names that do not match any [`HookStage`].
#[derive(Debug, thiserror::Error)]
#[error("unknown hook stage: {0}")]
pub struct UnknownHookStage(pub String);

impl FromStr for HookStage {
    type Err = UnknownHookStage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "beforeSanitizeElements" => Ok(Self::BeforeSanitizeElements),
            "afterSanitizeAttributes" => Ok(Self::AfterSanitizeAttributes),
            other => Err(UnknownHookStage(other.to_owned())),
        }
    }
}

/// Hook callback. Called once per element, in document order, with the
/// element's id. It may edit attributes or remove elements.
pub type Hook = Box<dyn Fn(&mut Dom, NodeId)>;

/// Hooks keyed by stage. At most one hook per stage.
#[derive(Default)]
pub struct Hooks {
    by_stage: BTreeMap<HookStage, Hook>,
}

impl fmt::Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.by_stage.keys()).finish()
    }
}

impl Hooks {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the hook for `stage`, replacing any previous one.
    pub fn insert(&mut self, stage: HookStage, hook: impl Fn(&mut Dom, NodeId) + 'static) {
        self.by_stage.insert(stage, Box::new(hook));
    }

    /// Set a hook by stage name.
    ///
    /// # Errors
    ///
    /// Returns [`UnknownHookStage`] if `name` is not a known stage.
    pub fn insert_named(
        &mut self,
        name: &str,
        hook: impl Fn(&mut Dom, NodeId) + 'static,
    ) -> Result<(), UnknownHookStage> {
        self.insert(name.parse()?, hook);
        Ok(())
    }

    /// Hook registered for `stage`.
    #[must_use]
    pub fn get(&self, stage: HookStage) -> Option<&Hook> {
        self.by_stage.get(&stage)
    }

    /// Registered stages in pass order.
    pub fn stages(&self) -> impl Iterator<Item = HookStage> + '_ {
        self.by_stage.keys().copied()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_stage.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_names_round_trip() {
        for stage in [
            HookStage::BeforeSanitizeElements,
            HookStage::AfterSanitizeAttributes,
        ] {
            assert_eq!(stage.name().parse::<HookStage>().unwrap(), stage);
        }
        assert!("uponSanitizeShadowNode".parse::<HookStage>().is_err());
    }

    #[test]
    fn test_insert_named_replaces() {
        let mut hooks = Hooks::new();
        hooks.insert_named("afterSanitizeAttributes", |_, _| {}).unwrap();
        hooks.insert(HookStage::AfterSanitizeAttributes, |_, _| {});
        assert_eq!(
            hooks.stages().collect::<Vec<_>>(),
            vec![HookStage::AfterSanitizeAttributes]
        );

        let err = hooks.insert_named("beforeEverything", |_, _| {}).unwrap_err();
        assert!(err.to_string().contains("beforeEverything"));
    }
}
