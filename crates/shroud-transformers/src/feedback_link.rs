//! "Leave feedback" link derived from the page's edit link.

use async_trait::async_trait;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use shroud_dom::{Dom, NodeId, Selector};
use shroud_host::ShadowRoot;
use url::Url;

use crate::{TransformContext, TransformError, Transformer};

/// RFC 3986 unreserved characters: A-Z a-z 0-9 - . _ ~
const QUERY_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Source hosting with an issue tracker we can link to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Forge {
    GitHub,
    GitLab,
}

impl Forge {
    fn detect(host: &str) -> Option<Self> {
        if host.contains("github") {
            Some(Self::GitHub)
        } else if host.contains("gitlab") {
            Some(Self::GitLab)
        } else {
            None
        }
    }

    /// Repository path from an edit URL.
    ///
    /// GitHub: `/{owner}/{repo}/edit/...`. GitLab: `/{group...}/{repo}/-/edit/...`.
    fn repository(self, url: &Url) -> Option<String> {
        let segments: Vec<&str> = url.path_segments()?.filter(|s| !s.is_empty()).collect();
        let repo = match self {
            Self::GitHub => segments.get(..2)?.to_vec(),
            Self::GitLab => segments.iter().take_while(|&&s| s != "-").copied().collect(),
        };
        (repo.len() >= 2).then(|| repo.join("/"))
    }

    fn issue_url(self, edit: &Url, title: &str, body: &str) -> Option<String> {
        let repository = self.repository(edit)?;
        let host = edit.host_str()?;
        let title = utf8_percent_encode(title, QUERY_ENCODE_SET);
        let body = utf8_percent_encode(body, QUERY_ENCODE_SET);
        let query = match self {
            Self::GitHub => format!("title={title}&body={body}"),
            Self::GitLab => format!("issue[title]={title}&issue[description]={body}"),
        };
        Some(format!(
            "{}://{host}/{repository}/issues/new?{query}",
            edit.scheme()
        ))
    }
}

/// Adds a link for opening a prefilled issue next to the edit button.
///
/// Only GitHub and GitLab edit links are recognized; pages without an edit
/// link are left alone.
#[derive(Debug, Default)]
pub struct FeedbackLinkTransformer;

#[async_trait(?Send)]
impl Transformer for FeedbackLinkTransformer {
    fn name(&self) -> &'static str {
        "feedback-link"
    }

    async fn apply(&self, root: &ShadowRoot, _ctx: &TransformContext) -> Result<(), TransformError> {
        let edit_button = Selector::parse(".md-content__button")?;
        let inserted = root.write(|dom| {
            let edit = dom.select(dom.root(), &edit_button).into_iter().next()?;
            let href = dom.attr(edit, "href")?;
            let edit_url = Url::parse(href).ok()?;
            let forge = Forge::detect(edit_url.host_str()?)?;

            let title = format!("Documentation Feedback: {}", page_title(dom));
            let body = format!("Page source:\n{href}\n\nFeedback:");
            let issue_url = forge.issue_url(&edit_url, &title, &body)?;

            let link = dom.create_element("a");
            dom.set_attr(link, "class", "md-content__button md-icon");
            dom.set_attr(link, "title", "Leave feedback for this page");
            dom.set_attr(link, "target", "_blank");
            dom.set_attr(link, "href", issue_url.as_str());
            dom.insert_before(edit, link);
            Some((forge, issue_url))
        })?;

        match inserted {
            Some((forge, url)) => tracing::debug!(?forge, %url, "Added feedback link"),
            None => tracing::debug!("No supported edit link, skipping feedback link"),
        }
        Ok(())
    }
}

/// Text of the page heading, without the permalink anchor MkDocs appends.
fn page_title(dom: &Dom) -> String {
    dom.first_by_tag(dom.root(), "h1")
        .and_then(|h1| dom.children(h1).first().copied())
        .map(|first: NodeId| dom.text_content(first))
        .unwrap_or_default()
        .trim()
        .to_owned()
}
