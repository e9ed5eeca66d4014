//! Per-render transformer outcomes.

use serde::Serialize;

/// How one transformer finished.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "message", rename_all = "snake_case")]
pub enum TransformerStatus {
    Ok,
    /// Returned an error.
    Failed(String),
    /// Panicked; the panic was contained.
    Panicked(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransformerReport {
    pub name: &'static str,
    #[serde(flatten)]
    pub status: TransformerStatus,
}

/// Outcome of every transformer of one render, in pipeline order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RenderReport {
    /// Attachment generation the render mounted.
    pub generation: u64,
    pub transformers: Vec<TransformerReport>,
}

impl RenderReport {
    /// Transformers that did not finish cleanly.
    pub fn failures(&self) -> impl Iterator<Item = &TransformerReport> {
        self.transformers
            .iter()
            .filter(|report| report.status != TransformerStatus::Ok)
    }

    pub fn is_clean(&self) -> bool {
        self.failures().next().is_none()
    }

    /// Status of the transformer called `name`.
    pub fn status(&self, name: &str) -> Option<&TransformerStatus> {
        self.transformers
            .iter()
            .find(|report| report.name == name)
            .map(|report| &report.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn report() -> RenderReport {
        RenderReport {
            generation: 3,
            transformers: vec![
                TransformerReport {
                    name: "header",
                    status: TransformerStatus::Ok,
                },
                TransformerReport {
                    name: "base-url",
                    status: TransformerStatus::Failed("backend unavailable".to_owned()),
                },
            ],
        }
    }

    #[test]
    fn test_failures() {
        let report = report();
        assert!(!report.is_clean());
        assert_eq!(
            report.failures().map(|r| r.name).collect::<Vec<_>>(),
            vec!["base-url"]
        );
        assert_eq!(report.status("header"), Some(&TransformerStatus::Ok));
        assert_eq!(report.status("sidebar"), None);
        assert!(RenderReport::default().is_clean());
    }

    #[test]
    fn test_serializes_status_inline() {
        let json = serde_json::to_value(report()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "generation": 3,
                "transformers": [
                    {"name": "header", "status": "ok"},
                    {"name": "base-url", "status": "failed", "message": "backend unavailable"},
                ]
            })
        );
    }
}
