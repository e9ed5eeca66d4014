//! `shroud render` command implementation.

use std::io::Write;
use std::path::PathBuf;

use clap::Args;
use shroud_config::{CliSettings, Config};
use shroud_host::{HostElement, IsolationHost};
use shroud_reader::{MkDocsContent, RawContent, RenderReport, Services, TransformerStatus};
use shroud_transformers::EntityName;

use crate::error::CliError;
use crate::output::Output;

/// Test id of the element hosting the shadow root.
const HOST_TEST_ID: &str = "techdocs-content-shadowroot";

/// Arguments for the render command.
#[derive(Args)]
pub(crate) struct RenderArgs {
    /// Built MkDocs page (HTML) to render.
    file: PathBuf,

    /// Entity owning the documentation, as `kind:namespace/name`.
    #[arg(short, long, default_value = "component:default/local")]
    entity: EntityName,

    /// Page path within the entity's documentation.
    #[arg(short, long, default_value = "")]
    path: String,

    /// Reader page URL, including any `#fragment` (overrides config).
    #[arg(long)]
    location: Option<String>,

    /// Documentation backend origin (overrides config).
    #[arg(long, env = "SHROUD_API_ORIGIN")]
    api_origin: Option<String>,

    /// Timeout in seconds for backend requests (overrides config).
    #[arg(long)]
    timeout: Option<u64>,

    /// Host whose iframes are kept; repeatable (overrides config).
    #[arg(long = "allow-iframe-host")]
    allow_iframe_hosts: Vec<String>,

    /// Write the rendered HTML here instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Write the transformer report as JSON.
    #[arg(long)]
    report: Option<PathBuf>,

    /// Fail when any transformer failed.
    #[arg(long)]
    strict: bool,

    /// Path to configuration file (default: auto-discover shroud.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose output.
    #[arg(short, long)]
    pub verbose: bool,
}

impl RenderArgs {
    pub(crate) fn execute(self, output: &Output) -> Result<(), CliError> {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        rt.block_on(self.run(output))
    }

    fn cli_settings(&self) -> CliSettings {
        CliSettings {
            api_origin: self.api_origin.clone(),
            location: self.location.clone(),
            request_timeout_secs: self.timeout,
            allowed_iframe_hosts: (!self.allow_iframe_hosts.is_empty())
                .then(|| self.allow_iframe_hosts.clone()),
        }
    }

    async fn run(self, output: &Output) -> Result<(), CliError> {
        let config = Config::load(self.config.as_deref(), Some(&self.cli_settings()))?;
        if let Some(path) = &config.config_path {
            output.info(&format!("Config: {}", path.display()));
        }

        let markup = std::fs::read_to_string(&self.file)?;
        let (services, window) = Services::from_config(&config)?;
        let reader = MkDocsContent::new(&config, services);
        let mut host = IsolationHost::new(Some(
            HostElement::new("div").with_attr("data-testid", HOST_TEST_ID),
        ));

        let content = RawContent {
            markup: Some(markup),
            path: self.path,
            entity: self.entity,
        };
        let Some(rendering) = reader.render(&mut host, content, |root| {
            tracing::info!(generation = root.generation(), "Document attached");
        }) else {
            output.warning(&format!("Nothing to render in {}", self.file.display()));
            return Ok(());
        };
        let report = rendering.await;

        let html = host.to_html();
        match &self.output {
            Some(path) => {
                std::fs::write(path, &html)?;
                output.info(&format!("Output: {}", path.display()));
            }
            None => {
                let mut stdout = std::io::stdout().lock();
                stdout.write_all(html.as_bytes())?;
                stdout.write_all(b"\n")?;
            }
        }

        if let Some(path) = &self.report {
            std::fs::write(path, serde_json::to_string_pretty(&report)?)?;
        }

        for effect in window.effects() {
            tracing::info!(?effect, "Window effect");
        }
        print_failures(output, &report);

        let failed = report.failures().count();
        if failed > 0 && self.strict {
            return Err(CliError::TransformersFailed { count: failed });
        }
        output.success(&format!(
            "Rendered {} ({} transformers, {failed} failed)",
            self.file.display(),
            report.transformers.len()
        ));
        Ok(())
    }
}

fn print_failures(output: &Output, report: &RenderReport) {
    for failure in report.failures() {
        let (kind, message) = match &failure.status {
            TransformerStatus::Failed(message) => ("failed", message.as_str()),
            TransformerStatus::Panicked(message) => ("panicked", message.as_str()),
            TransformerStatus::Ok => continue,
        };
        output.warning(&format!("Transformer {} {kind}", failure.name));
        output.detail(message);
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;
    use pretty_assertions::assert_eq;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        args: RenderArgs,
    }

    #[test]
    fn test_parses_entity_and_overrides() {
        let cli = TestCli::try_parse_from([
            "shroud",
            "site/index.html",
            "--entity",
            "component:payments/checkout",
            "--location",
            "https://backstage.example.com/docs/payments/component/checkout/#setup",
            "--allow-iframe-host",
            "www.youtube.com",
            "--allow-iframe-host",
            "player.vimeo.com",
        ])
        .unwrap();

        assert_eq!(cli.args.entity, EntityName::new("component", "payments", "checkout"));
        let settings = cli.args.cli_settings();
        assert_eq!(
            settings.location.as_deref(),
            Some("https://backstage.example.com/docs/payments/component/checkout/#setup")
        );
        assert_eq!(
            settings.allowed_iframe_hosts,
            Some(vec!["www.youtube.com".to_owned(), "player.vimeo.com".to_owned()])
        );
        assert_eq!(settings.request_timeout_secs, None);
    }

    #[test]
    fn test_defaults_leave_config_untouched() {
        let cli = TestCli::try_parse_from(["shroud", "index.html"]).unwrap();

        assert_eq!(cli.args.entity, EntityName::new("component", "default", "local"));
        assert_eq!(cli.args.path, "");
        assert!(cli.args.cli_settings().allowed_iframe_hosts.is_none());
    }

    #[test]
    fn test_rejects_malformed_entity() {
        assert!(TestCli::try_parse_from(["shroud", "index.html", "--entity", "payments"]).is_err());
    }
}
