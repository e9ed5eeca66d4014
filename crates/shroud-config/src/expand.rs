//! `${VAR}` expansion for configuration strings.

use crate::ConfigError;

/// Expand `${VAR}` and `${VAR:-default}` references in `value`.
///
/// Strings without `${` are returned as-is, so bare `$` in URLs survives.
/// `field` names the config key in the error.
pub(crate) fn expand_env(value: &str, field: &str) -> Result<String, ConfigError> {
    if !value.contains("${") {
        return Ok(value.to_owned());
    }

    shellexpand::env_with_context(value, |var| -> Result<Option<String>, MissingVar> {
        std::env::var(var)
            .map(Some)
            .map_err(|_| MissingVar(var.to_owned()))
    })
    .map(std::borrow::Cow::into_owned)
    .map_err(|e| ConfigError::EnvVar {
        field: field.to_owned(),
        message: format!("${{{}}} not set", e.cause.0),
    })
}

struct MissingVar(String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_set_var() {
        // SAFETY: each test uses its own variable name
        unsafe {
            std::env::set_var("SHROUD_TEST_ORIGIN", "https://backstage.example.com");
        }
        let result = expand_env("${SHROUD_TEST_ORIGIN}/api", "techdocs.api_origin").unwrap();
        assert_eq!(result, "https://backstage.example.com/api");
        unsafe {
            std::env::remove_var("SHROUD_TEST_ORIGIN");
        }
    }

    #[test]
    fn test_expand_default_when_unset() {
        // SAFETY: each test uses its own variable name
        unsafe {
            std::env::remove_var("SHROUD_TEST_UNSET");
        }
        let result = expand_env("${SHROUD_TEST_UNSET:-http://localhost:7007}", "f").unwrap();
        assert_eq!(result, "http://localhost:7007");
    }

    #[test]
    fn test_missing_var_names_field() {
        // SAFETY: each test uses its own variable name
        unsafe {
            std::env::remove_var("SHROUD_TEST_MISSING");
        }
        let err = expand_env("${SHROUD_TEST_MISSING}", "reader.location").unwrap_err();
        assert!(matches!(err, ConfigError::EnvVar { .. }));
        assert!(err.to_string().contains("SHROUD_TEST_MISSING"));
        assert!(err.to_string().contains("reader.location"));
    }

    #[test]
    fn test_bare_dollar_is_literal() {
        assert_eq!(
            expand_env("https://example.com/$path", "f").unwrap(),
            "https://example.com/$path"
        );
    }
}
