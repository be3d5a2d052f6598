use std::path::Path;

use crate::cli::config::{Cli, ReportFormat};
use crate::crawler::config::CrawlConfig;
use crate::crawler::error::CrawlError;
use crate::crawler::strategy::StrategyKind;
use crate::driver::action_driver::ActionDriver;
use crate::driver::bridge::BridgeDriver;
use crate::driver::simulated::{AppModel, SimulatedDriver};
use crate::report::console::{format_console_report, format_json_report};
use crate::report::report_model::CrawlOutcome;
use crate::run_crawl;
use crate::trace::logger::TraceLogger;

// ============================================================================
// crawl subcommand
// ============================================================================

/// Crawl a live device through the bridge command line `bridge`.
pub fn cmd_crawl(
    bridge: &str,
    strategy: StrategyKind,
    config: &CrawlConfig,
    tracer: &TraceLogger,
    cli: &Cli,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut parts = bridge.split_whitespace();
    let program = parts.next().ok_or("bridge command is empty")?;
    let args: Vec<String> = parts.map(str::to_string).collect();

    tracing::info!(program, "starting bridge");
    let mut driver = BridgeDriver::launch_process(program, &args)?;
    let result = execute(strategy, config, &mut driver, tracer, cli);
    driver.quit();
    result
}

// ============================================================================
// simulate subcommand
// ============================================================================

/// Crawl the scripted app model at `model_path`.
pub fn cmd_simulate(
    model_path: &str,
    strategy: StrategyKind,
    config: &CrawlConfig,
    tracer: &TraceLogger,
    cli: &Cli,
) -> Result<(), Box<dyn std::error::Error>> {
    let content = std::fs::read_to_string(model_path)?;
    let model = AppModel::from_yaml(&content)?;

    // A model crawl without an explicit target stays inside the model's app
    let mut config = config.clone();
    if config.target_package.is_empty() {
        config.target_package = model.package.clone();
    }

    let mut driver = SimulatedDriver::new(model);
    execute(strategy, &config, &mut driver, tracer, cli)
}

// ============================================================================
// Helpers
// ============================================================================

/// Run the crawl and emit the report. A lost driver ends the run quietly.
fn execute(
    strategy: StrategyKind,
    config: &CrawlConfig,
    driver: &mut dyn ActionDriver,
    tracer: &TraceLogger,
    cli: &Cli,
) -> Result<(), Box<dyn std::error::Error>> {
    match run_crawl(strategy, config, driver, tracer) {
        Ok(outcome) => write_report(&outcome, cli.format, cli.output.as_deref()),
        Err(CrawlError::Disconnected(msg)) => {
            tracing::warn!(reason = %msg, "driver disconnected, ending run");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

/// Render `outcome` and print it or write it to `output`.
pub fn write_report(
    outcome: &CrawlOutcome,
    format: ReportFormat,
    output: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let content = render_report(outcome, format)?;
    match output {
        Some(path) => {
            if let Some(parent) = Path::new(path).parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            std::fs::write(path, &content)?;
            tracing::info!(path, "wrote report");
        }
        None => print!("{}", content),
    }
    Ok(())
}

pub fn render_report(
    outcome: &CrawlOutcome,
    format: ReportFormat,
) -> Result<String, serde_json::Error> {
    match format {
        ReportFormat::Console => Ok(format_console_report(outcome)),
        ReportFormat::Json => format_json_report(outcome).map(|mut s| {
            s.push('\n');
            s
        }),
    }
}
