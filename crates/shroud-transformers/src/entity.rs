//! Entity references.

use std::fmt;
use std::str::FromStr;

const DEFAULT_NAMESPACE: &str = "default";

/// Catalog entity owning a documentation site.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntityName {
    pub kind: String,
    pub namespace: String,
    pub name: String,
}

/// Error parsing an entity reference.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("invalid entity reference {0:?}, expected kind:namespace/name")]
pub struct EntityNameError(pub String);

impl EntityName {
    #[must_use]
    pub fn new(
        kind: impl Into<String>,
        namespace: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            kind: kind.into(),
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl FromStr for EntityName {
    type Err = EntityNameError;

    /// Parse `kind:namespace/name` or `kind:name` (namespace `default`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || EntityNameError(s.to_owned());
        let (kind, rest) = s.split_once(':').ok_or_else(invalid)?;
        let (namespace, name) = rest.split_once('/').unwrap_or((DEFAULT_NAMESPACE, rest));

        if [kind, namespace, name]
            .iter()
            .any(|part| part.is_empty() || part.contains([':', '/']))
        {
            return Err(invalid());
        }
        Ok(Self::new(kind, namespace, name))
    }
}

impl fmt::Display for EntityName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}/{}", self.kind, self.namespace, self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_reference() {
        let entity: EntityName = "Component:payments/checkout-api".parse().unwrap();
        assert_eq!(entity, EntityName::new("Component", "payments", "checkout-api"));
        assert_eq!(entity.to_string(), "Component:payments/checkout-api");
    }

    #[test]
    fn test_namespace_defaults() {
        let entity: EntityName = "component:docs".parse().unwrap();
        assert_eq!(entity.namespace, "default");
        assert_eq!(entity.to_string(), "component:default/docs");
    }

    #[test]
    fn test_rejects_malformed() {
        for input in ["docs", ":default/docs", "component:/docs", "component:a/b/c", "component:"] {
            assert!(input.parse::<EntityName>().is_err(), "{input}");
        }
    }
}
