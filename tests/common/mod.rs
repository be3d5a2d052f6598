#![allow(dead_code)]

pub mod apps;

use app_crawler::crawler::config::CrawlConfig;
use app_crawler::crawler::error::CrawlError;
use app_crawler::crawler::strategy::StrategyKind;
use app_crawler::driver::simulated::{SimAction, SimulatedDriver};
use app_crawler::report::report_model::CrawlOutcome;
use app_crawler::run_crawl;
use app_crawler::trace::logger::TraceLogger;

pub fn driver(yaml: &str) -> SimulatedDriver {
    SimulatedDriver::from_yaml(yaml).expect("app model should parse")
}

/// Defaults with a fixed seed, scoped to `package`.
pub fn config_for(package: &str) -> CrawlConfig {
    CrawlConfig {
        target_package: package.to_string(),
        seed: Some(7),
        ..CrawlConfig::default()
    }
}

pub fn try_crawl(
    kind: StrategyKind,
    yaml: &str,
    config: &CrawlConfig,
) -> (Result<CrawlOutcome, CrawlError>, SimulatedDriver) {
    let mut driver = driver(yaml);
    let tracer = TraceLogger::disabled();
    let result = run_crawl(kind, config, &mut driver, &tracer);
    (result, driver)
}

pub fn crawl(kind: StrategyKind, yaml: &str, config: &CrawlConfig) -> (CrawlOutcome, SimulatedDriver) {
    let (result, driver) = try_crawl(kind, yaml, config);
    (result.expect("crawl should succeed"), driver)
}

/// Labels of every tap, in order, as `screen/label`.
pub fn taps(driver: &SimulatedDriver) -> Vec<String> {
    driver
        .actions()
        .iter()
        .filter_map(|a| match a {
            SimAction::Tap { screen, label } => Some(format!("{}/{}", screen, label)),
            _ => None,
        })
        .collect()
}

pub fn count_actions(driver: &SimulatedDriver, pred: impl Fn(&SimAction) -> bool) -> usize {
    driver.actions().iter().filter(|a| pred(a)).count()
}

/// A single screen with `n` buttons that do nothing.
pub fn flat_app(n: usize) -> String {
    let mut yaml = String::from(
        "package: com.example.flat\nstart: home\nscreens:\n  home:\n    activity: .MainActivity\n    root:\n      class: android.widget.FrameLayout\n      children:\n",
    );
    for i in 0..n {
        yaml.push_str(&format!(
            "        - class: android.widget.Button\n          description: Button {}\n          clickable: true\n",
            i
        ));
    }
    yaml
}
