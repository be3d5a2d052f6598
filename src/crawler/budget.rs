use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::crawler::config::CrawlConfig;

/// Why a crawl ended. None of these is a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// The root screen is fully explored
    Completed,
    StepsExhausted,
    RuntimeExhausted,
    ScreenshotsExhausted,
    ScreenLoopExhausted,
    /// Random walk path reached `max_depth`
    DepthExhausted,
}

impl StopReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            StopReason::Completed => "completed",
            StopReason::StepsExhausted => "steps_exhausted",
            StopReason::RuntimeExhausted => "runtime_exhausted",
            StopReason::ScreenshotsExhausted => "screenshots_exhausted",
            StopReason::ScreenLoopExhausted => "screen_loop_exhausted",
            StopReason::DepthExhausted => "depth_exhausted",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BudgetDecision {
    Allow,
    Block(StopReason),
}

/// Counters consumed during one crawl. Reset at crawl start, never decrease.
#[derive(Debug, Clone)]
pub struct RunState {
    started: Instant,
    pub steps_used: usize,
    pub screenshots_taken: usize,
    pub max_depth_reached: usize,
    /// Largest per-signature repeat count seen so far
    pub screen_repeats: usize,
}

impl RunState {
    pub fn start() -> Self {
        Self {
            started: Instant::now(),
            steps_used: 0,
            screenshots_taken: 0,
            max_depth_reached: 0,
            screen_repeats: 0,
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn record_step(&mut self) {
        self.steps_used += 1;
    }

    pub fn record_screenshot(&mut self) {
        self.screenshots_taken += 1;
    }

    pub fn observe_depth(&mut self, depth: usize) {
        self.max_depth_reached = self.max_depth_reached.max(depth);
    }

    pub fn observe_repeats(&mut self, repeats: usize) {
        self.screen_repeats = self.screen_repeats.max(repeats);
    }
}

/// Decide whether another widget interaction is allowed.
///
/// A budget is spent once its counter reaches the configured maximum.
pub fn check_budgets(config: &CrawlConfig, state: &RunState) -> BudgetDecision {
    // ---- Step budget ----
    if state.steps_used >= config.max_steps {
        return BudgetDecision::Block(StopReason::StepsExhausted);
    }

    // ---- Runtime budget ----
    if state.elapsed() >= config.max_runtime {
        return BudgetDecision::Block(StopReason::RuntimeExhausted);
    }

    // ---- Screenshot budget ----
    if state.screenshots_taken >= config.max_screenshots {
        return BudgetDecision::Block(StopReason::ScreenshotsExhausted);
    }

    // ---- Screen loop budget ----
    if state.screen_repeats >= config.max_screen_loop {
        return BudgetDecision::Block(StopReason::ScreenLoopExhausted);
    }

    BudgetDecision::Allow
}
