use clap::Parser;
use tracing_subscriber::EnvFilter;

use app_crawler::cli::commands::{cmd_crawl, cmd_simulate};
use app_crawler::cli::config::{Cli, Commands, build_crawl_config, load_config, resolve_trace_file};
use app_crawler::trace::logger::TraceLogger;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let file_config = load_config(cli.config.as_deref());
    let config = build_crawl_config(&file_config.crawl, &cli);
    let tracer = TraceLogger::new(resolve_trace_file(&file_config.crawl, &cli));

    match &cli.command {
        Commands::Crawl { bridge, strategy } => {
            cmd_crawl(bridge, *strategy, &config, &tracer, &cli)?;
        }
        Commands::Simulate { model, strategy } => {
            cmd_simulate(model, *strategy, &config, &tracer, &cli)?;
        }
    }

    Ok(())
}

/// `RUST_LOG` wins; otherwise the level follows the `-v` count.
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
