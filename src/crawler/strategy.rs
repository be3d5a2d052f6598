use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::crawler::budget::StopReason;
use crate::crawler::context::CrawlContext;
use crate::crawler::depth_first::DepthFirstCrawler;
use crate::crawler::error::CrawlError;
use crate::crawler::random::RandomCrawler;

/// A crawl policy over the shared Screen/Widget/Registry machinery.
pub trait Crawler {
    /// Explore from the current foreground until done or out of budget.
    fn crawl(&mut self, ctx: &mut CrawlContext<'_>) -> Result<StopReason, CrawlError>;

    /// Name of this strategy (for reports and tracing).
    fn name(&self) -> &'static str;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyKind {
    #[default]
    DepthFirst,
    Random,
}

impl StrategyKind {
    pub fn build(self) -> Box<dyn Crawler> {
        match self {
            StrategyKind::DepthFirst => Box::new(DepthFirstCrawler::new()),
            StrategyKind::Random => Box::new(RandomCrawler::new()),
        }
    }
}
