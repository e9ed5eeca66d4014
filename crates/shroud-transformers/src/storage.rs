//! Documentation backend URL resolution.

use async_trait::async_trait;
use url::Url;

use crate::entity::EntityName;

/// Error resolving a resource URL.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// The configured backend origin is not a URL.
    #[error("invalid API origin {origin:?}: {source}")]
    InvalidOrigin {
        origin: String,
        #[source]
        source: url::ParseError,
    },
    /// The attribute value cannot be joined onto the base URL.
    #[error("cannot resolve {value:?}: {source}")]
    InvalidUrl {
        value: String,
        #[source]
        source: url::ParseError,
    },
    /// The backend did not answer.
    #[error("backend unavailable: {0}")]
    Unavailable(String),
}

/// Resolves resource references against the documentation backend.
///
/// Resolution must be deterministic for identical inputs.
#[async_trait(?Send)]
pub trait TechDocsStorageApi {
    /// Origin of the backend, without a trailing slash.
    async fn api_origin(&self) -> Result<String, ResolveError>;

    /// Absolute URL for `value` as referenced from `path` of `entity`'s docs.
    async fn base_url(
        &self,
        value: &str,
        entity: &EntityName,
        path: &str,
    ) -> Result<String, ResolveError>;
}

/// Resolver for a backend serving `/static/docs/{namespace}/{kind}/{name}/`.
#[derive(Debug, Clone)]
pub struct TechDocsClient {
    api_origin: String,
}

impl TechDocsClient {
    /// Create a client for `api_origin` (e.g. `https://backstage.example.com/api/techdocs`).
    pub fn new(api_origin: &str) -> Result<Self, ResolveError> {
        let api_origin = api_origin.trim_end_matches('/');
        Url::parse(api_origin).map_err(|source| ResolveError::InvalidOrigin {
            origin: api_origin.to_owned(),
            source,
        })?;
        Ok(Self {
            api_origin: api_origin.to_owned(),
        })
    }

    /// Directory URL of a page; always ends with `/`.
    pub fn docs_base(&self, entity: &EntityName, path: &str) -> String {
        let mut base = format!(
            "{}/static/docs/{}/{}/{}/{}",
            self.api_origin,
            entity.namespace.to_lowercase(),
            entity.kind.to_lowercase(),
            entity.name.to_lowercase(),
            path.trim_start_matches('/'),
        );
        if !base.ends_with('/') {
            base.push('/');
        }
        base
    }

    pub(crate) fn resolve(
        &self,
        value: &str,
        entity: &EntityName,
        path: &str,
    ) -> Result<String, ResolveError> {
        let base = self.docs_base(entity, path);
        let base = Url::parse(&base).map_err(|source| ResolveError::InvalidOrigin {
            origin: self.api_origin.clone(),
            source,
        })?;
        base.join(value)
            .map(String::from)
            .map_err(|source| ResolveError::InvalidUrl {
                value: value.to_owned(),
                source,
            })
    }
}

#[async_trait(?Send)]
impl TechDocsStorageApi for TechDocsClient {
    async fn api_origin(&self) -> Result<String, ResolveError> {
        Ok(self.api_origin.clone())
    }

    async fn base_url(
        &self,
        value: &str,
        entity: &EntityName,
        path: &str,
    ) -> Result<String, ResolveError> {
        self.resolve(value, entity, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn client() -> TechDocsClient {
        TechDocsClient::new("https://backstage.example.com/api/techdocs/").unwrap()
    }

    fn entity() -> EntityName {
        EntityName::new("Component", "default", "Payments")
    }

    #[tokio::test]
    async fn test_relative_value_joins_page_directory() {
        let url = client()
            .base_url("img/flow.svg", &entity(), "guides/setup")
            .await
            .unwrap();
        assert_eq!(
            url,
            "https://backstage.example.com/api/techdocs/static/docs/default/component/payments/guides/setup/img/flow.svg"
        );
    }

    #[tokio::test]
    async fn test_parent_and_root_relative_values() {
        let client = client();
        assert_eq!(
            client.base_url("../assets/app.css", &entity(), "guides").await.unwrap(),
            "https://backstage.example.com/api/techdocs/static/docs/default/component/payments/assets/app.css"
        );
        assert_eq!(
            client.base_url("/favicon.png", &entity(), "").await.unwrap(),
            "https://backstage.example.com/favicon.png"
        );
    }

    #[tokio::test]
    async fn test_absolute_value_is_kept() {
        let url = client()
            .base_url("https://cdn.example.com/logo.png", &entity(), "")
            .await
            .unwrap();
        assert_eq!(url, "https://cdn.example.com/logo.png");
    }

    #[tokio::test]
    async fn test_origin_has_no_trailing_slash() {
        assert_eq!(
            client().api_origin().await.unwrap(),
            "https://backstage.example.com/api/techdocs"
        );
    }

    #[test]
    fn test_invalid_origin() {
        assert!(matches!(
            TechDocsClient::new("not a url"),
            Err(ResolveError::InvalidOrigin { .. })
        ));
    }
}
