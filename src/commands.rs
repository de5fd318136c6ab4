//! Wiring between parsed arguments and the library crates.

use crate::cli::{Cli, Commands, PrintArgs};
use crate::dispatch::{Dispatcher, Plan, Target};
use crate::error::{ErrorKind, Result};
use crate::output::Reporter;
use clap::CommandFactory;
use futures::StreamExt;
use plastic_config::Config;
use plastic_render::Renderer;
use plastic_spool::{Cups, SpoolerHandle};
use plastic_template::{InputKind, Template};
use std::io::Write;
use std::pin::pin;
use std::process::ExitCode;
use std::sync::Arc;

/// Runs the selected command, reporting every result and error on stdout.
pub async fn run(cli: Cli) -> ExitCode {
    let Some(command) = cli.command.as_ref().filter(|c| !matches!(c, Commands::Help)) else {
        if let Err(e) = Cli::command().print_help() {
            tracing::error!(error = %e, "Could not print help");
            return ExitCode::FAILURE;
        }
        return ExitCode::SUCCESS;
    };

    let loaded = Config::load().and_then(|config| config.with_overrides(cli.overrides()));
    let config = match loaded {
        Ok(config) => config,
        Err(err) => {
            let mut reporter = Reporter::new(cli.format.unwrap_or_default(), std::io::stdout());
            reporter.error(&ErrorKind::config(err));
            return ExitCode::FAILURE;
        },
    };
    tracing::debug!(?config, "Configuration loaded");

    let spooler: SpoolerHandle = Arc::new(Cups::new());
    let mut reporter = Reporter::new(config.format, std::io::stdout());
    let result = match command {
        Commands::Printers => printers(&spooler, &mut reporter).await,
        Commands::Print(args) => print(&config, args, spooler, &mut reporter).await,
        Commands::Help => Ok(()),
    };
    if let Err(err) = result {
        reporter.error(&err);
    }

    if reporter.failed() { ExitCode::FAILURE } else { ExitCode::SUCCESS }
}

pub async fn printers<W: Write>(spooler: &SpoolerHandle, reporter: &mut Reporter<W>) -> Result<()> {
    let printers = spooler.printers().await.map_err(ErrorKind::spool)?;
    tracing::info!(spooler = spooler.name(), count = printers.len(), "Printers enumerated");
    reporter.printers(&printers);
    Ok(())
}

/// Validates the request completely before any template is loaded or any
/// browser is started.
pub async fn print<W: Write>(
    config: &Config,
    args: &PrintArgs,
    spooler: SpoolerHandle,
    reporter: &mut Reporter<W>,
) -> Result<()> {
    let kind: InputKind = args.input.parse().map_err(ErrorKind::template)?;
    let payload = kind.ingest(&args.data).await.map_err(ErrorKind::template)?;
    let plan = Plan::new(Target::select(args.printer.clone(), args.output.clone()), payload)?;

    let template = Template::load(&config.template_path, &args.template).await.map_err(ErrorKind::template)?;
    let dispatcher = Dispatcher {
        template,
        renderer: renderer(config)?,
        spooler,
        docname: config.docname.clone(),
    };

    match plan {
        Plan::Print(record, printer) => {
            let id = dispatcher.print(&record, &printer).await?;
            reporter.job(&id);
        },
        Plan::PrintBatch(records, printer) => {
            let mut results = pin!(dispatcher.print_batch(records, &printer));
            while let Some((index, result)) = results.next().await {
                reporter.batch(index, &result);
            }
        },
        Plan::Export(record, path) => dispatcher.export(&record, path).await?,
        Plan::Stdout(record) => {
            let mut stdout = tokio::io::stdout();
            dispatcher.write(&record, &mut stdout).await?;
        },
    }
    Ok(())
}

fn renderer(config: &Config) -> Result<Renderer> {
    let renderer = match &config.chrome {
        Some(path) => Renderer::with_executable(path.clone()),
        None => Renderer::new(),
    }
    .map_err(ErrorKind::render)?;
    Ok(renderer.with_timeout(config.render_timeout()).with_sandbox(config.sandbox))
}

#[cfg(test)]
mod tests {
    use super::*;
    use plastic_config::OutputFormat;
    use plastic_spool::MockSpooler;
    use serde_json::Value;

    fn args(data: &str, input: &str, output: Option<&str>) -> PrintArgs {
        PrintArgs {
            template: "cards".into(),
            data: data.into(),
            printer: None,
            output: output.map(Into::into),
            input: input.into(),
        }
    }

    fn config() -> Config {
        // Nothing exists here; any test reaching the template loader fails with NotFound.
        Config { template_path: "/nonexistent/templates".into(), ..Config::default() }
    }

    #[tokio::test]
    async fn test_printers_json() {
        let spooler: SpoolerHandle = Arc::new(MockSpooler::with_printers(["Office", "Label"]));
        let mut reporter = Reporter::new(OutputFormat::Json, Vec::new());
        printers(&spooler, &mut reporter).await.unwrap();
        let value: Value = serde_json::from_slice(&reporter.into_inner()).unwrap();
        let names: Vec<_> = value.as_array().unwrap().iter().map(|p| p["name"].as_str().unwrap()).collect();
        assert_eq!(names, ["Office", "Label"]);
    }

    #[tokio::test]
    async fn test_unsupported_input_kind() {
        let spooler: SpoolerHandle = Arc::new(MockSpooler::with_printers(["Office"]));
        let mut reporter = Reporter::new(OutputFormat::Log, Vec::new());
        let err = print(&config(), &args("{}", "xml", None), spooler, &mut reporter).await.unwrap_err();
        assert!(matches!(*err, ErrorKind::InvalidInput(_)));
        assert!(err.message().contains("Invalid input format"));
    }

    #[tokio::test]
    async fn test_batch_to_file_rejected_before_template_load() {
        let spooler: SpoolerHandle = Arc::new(MockSpooler::with_printers(["Office"]));
        let mut reporter = Reporter::new(OutputFormat::Log, Vec::new());
        let data = r#"[{"firstname":"A"},{"firstname":"B"}]"#;
        let err = print(&config(), &args(data, "json", Some("out.pdf")), spooler, &mut reporter).await.unwrap_err();
        assert!(matches!(*err, ErrorKind::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_missing_template() {
        let spooler: SpoolerHandle = Arc::new(MockSpooler::with_printers(["Office"]));
        let mut reporter = Reporter::new(OutputFormat::Log, Vec::new());
        let err = print(&config(), &args("{}", "json", Some("out.pdf")), spooler, &mut reporter).await.unwrap_err();
        assert!(matches!(*err, ErrorKind::NotFound(_)));
    }
}
