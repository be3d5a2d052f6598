use crate::{
    crawler::{
        config::CrawlConfig, context::CrawlContext, error::CrawlError, strategy::StrategyKind,
    },
    driver::action_driver::ActionDriver,
    report::report_model::CrawlOutcome,
    trace::{
        logger::TraceLogger,
        trace::{CrawlEvent, TraceEvent},
    },
};

pub mod cli;
pub mod crawler;
pub mod driver;
pub mod report;
pub mod screen;
pub mod state;
pub mod trace;

/// Run one crawl session against `driver` and summarize it.
///
/// Budget exhaustion ends the run normally with the matching stop reason;
/// only a lost driver session or a failed launch is an error.
pub fn run_crawl(
    kind: StrategyKind,
    config: &CrawlConfig,
    driver: &mut dyn ActionDriver,
    tracer: &TraceLogger,
) -> Result<CrawlOutcome, CrawlError> {
    let mut crawler = kind.build();
    let mut ctx = CrawlContext::new(config, driver, tracer);

    tracing::info!(
        strategy = crawler.name(),
        package = %config.target_package,
        seed = ctx.seed,
        "starting crawl"
    );
    tracer.log(
        &TraceEvent::now(0, CrawlEvent::RunStarted)
            .with_detail(format!("{} seed={}", crawler.name(), ctx.seed)),
    );

    let reason = crawler.crawl(&mut ctx)?;

    tracer.log(&ctx.event(CrawlEvent::RunFinished).with_detail(reason.as_str()));
    let outcome = ctx.into_outcome(crawler.name(), reason);
    tracing::info!(
        reason = reason.as_str(),
        steps = outcome.steps_used,
        screens = outcome.distinct_screens,
        "crawl finished"
    );
    Ok(outcome)
}
