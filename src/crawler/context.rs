use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;

use crate::crawler::budget::{BudgetDecision, RunState, StopReason, check_budgets};
use crate::crawler::config::CrawlConfig;
use crate::crawler::error::CrawlError;
use crate::driver::action_driver::{ActionDriver, ScreenIdentity};
use crate::driver::error::{DriverError, tolerate};
use crate::report::report_model::CrawlOutcome;
use crate::screen::fingerprint::{Fingerprint, fingerprint};
use crate::screen::screen_model::{Screen, ScreenId, ScreenTree};
use crate::state::registry::{Classification, VisitedRegistry};
use crate::trace::{
    logger::TraceLogger,
    trace::{CrawlEvent, TraceEvent},
};

/// Words typed into text fields when random text is on.
pub const RANDOM_TEXT: &[&str] = &[
    "LOVE", "Latte", "Coffee", "Beer", "Taiwan", "Taipei", "Saturday", "Morning", "December",
    "Steve", "Jordan", "Michael",
];

/// What discovering a screen decided about it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Discovery {
    /// New state, registered, worth expanding
    Expand,
    /// Already registered via another path
    Repeat,
    /// Foreign package or ignored activity
    Ignored,
    /// No root node / empty signature
    DeadEnd,
}

/// Mutable state of one crawl session, shared by both strategies.
pub struct CrawlContext<'a> {
    pub config: &'a CrawlConfig,
    pub driver: &'a mut dyn ActionDriver,
    pub tracer: &'a TraceLogger,
    pub tree: ScreenTree,
    pub registry: VisitedRegistry,
    pub run: RunState,
    pub rng: ChaCha8Rng,
    pub seed: u64,
}

impl<'a> CrawlContext<'a> {
    pub fn new(
        config: &'a CrawlConfig,
        driver: &'a mut dyn ActionDriver,
        tracer: &'a TraceLogger,
    ) -> Self {
        let seed = config.seed.unwrap_or_else(rand::random);
        Self {
            config,
            driver,
            tracer,
            tree: ScreenTree::new(),
            registry: VisitedRegistry::from_config(config),
            run: RunState::start(),
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }

    pub fn trace(&self, event: TraceEvent) {
        self.tracer.log(&event);
    }

    pub fn event(&self, event: CrawlEvent) -> TraceEvent {
        TraceEvent::now(self.run.steps_used, event)
    }

    pub fn check_budgets(&self) -> BudgetDecision {
        check_budgets(self.config, &self.run)
    }

    /// Bring the target package to the foreground, if one is configured.
    pub fn launch_target(&mut self) -> Result<(), CrawlError> {
        let package = &self.config.target_package;
        if package.is_empty() {
            return Ok(());
        }
        tracing::info!(package = %package, "launching target");
        self.driver
            .launch(package, self.config.launch_timeout)
            .map_err(|e| match e {
                DriverError::Disconnected(msg) => CrawlError::Disconnected(msg),
                source => CrawlError::Launch {
                    package: package.clone(),
                    source,
                },
            })?;
        tolerate(self.driver.wait_for_idle(self.config.idle_timeout))?;
        Ok(())
    }

    /// Fingerprint the foreground and report who owns it.
    pub fn observe(&mut self) -> Result<(Fingerprint, ScreenIdentity), CrawlError> {
        let fingerprint = fingerprint(&mut *self.driver, self.config)?;
        let identity = tolerate(self.driver.foreground())?.unwrap_or_default();
        Ok((fingerprint, identity))
    }

    /// Whether an observation is still the screen we are standing on.
    pub fn is_same_state(screen: &Screen, fingerprint: &Fingerprint, identity: &ScreenIdentity) -> bool {
        screen.signature == fingerprint.signature && screen.activity == identity.activity
    }

    /// Count a navigation that landed on `signature` toward the screen-loop
    /// budget. Taps that leave the foreground unchanged are not arrivals.
    pub fn note_arrival(&mut self, signature: &str) {
        let repeats = self.registry.record_arrival(signature);
        self.run.observe_repeats(repeats);
    }

    /// Classify a freshly built screen and register it when new.
    ///
    /// Retiring screens that are not expanded is left to the strategy.
    pub fn discover(&mut self, id: ScreenId) -> Result<Discovery, CrawlError> {
        let screen = self.tree.get(id);
        self.run.observe_depth(screen.depth);

        let discovery = if screen.signature.is_empty() {
            Discovery::DeadEnd
        } else if !self.registry.is_eligible(screen) {
            Discovery::Ignored
        } else {
            match self.registry.classify(screen) {
                Classification::Repeat => Discovery::Repeat,
                Classification::New => Discovery::Expand,
            }
        };

        let event = match discovery {
            Discovery::Expand => CrawlEvent::ScreenDiscovered,
            Discovery::Repeat => CrawlEvent::ScreenRepeat,
            Discovery::Ignored => CrawlEvent::ScreenIgnored,
            Discovery::DeadEnd => CrawlEvent::DeadEnd,
        };
        self.trace(self.event(event).with_screen(screen));

        if discovery == Discovery::Expand {
            tracing::info!(
                screen = id.0,
                depth = screen.depth,
                activity = %screen.activity,
                widgets = screen.widgets.len(),
                "new screen"
            );
            self.registry.register(screen);
            if !self.config.capture_steps {
                self.capture_screenshot(id)?;
            }
        } else {
            tracing::debug!(screen = id.0, ?discovery, "screen will not be expanded");
        }
        Ok(discovery)
    }

    /// Act on one widget: optional random text, then a tap.
    ///
    /// The widget is marked finished whatever happens; a vanished node is
    /// just an action without effect.
    pub fn perform(&mut self, id: ScreenId, widget: usize) -> Result<(), CrawlError> {
        let screen = self.tree.get(id);
        let target = screen.widgets[widget].clone();
        self.trace(
            self.event(CrawlEvent::WidgetAction)
                .with_screen(screen)
                .with_widget(widget, &target.label),
        );
        tracing::debug!(screen = id.0, widget, label = %target.label, "acting on widget");

        if target.is_text_input() && self.config.random_text {
            if let Some(word) = RANDOM_TEXT.choose(&mut self.rng) {
                tolerate(self.driver.enter_text(target.node, word))?;
            }
        }

        if tolerate(self.driver.tap(target.node))?.is_none() {
            self.trace(
                self.event(CrawlEvent::WidgetVanished)
                    .with_screen(self.tree.get(id))
                    .with_widget(widget, &target.label),
            );
        }
        tolerate(self.driver.wait_for_idle(self.config.idle_timeout))?;

        self.tree.finish_widget(id, widget);
        self.run.record_step();

        if self.config.capture_steps {
            self.capture_screenshot(id)?;
        }
        Ok(())
    }

    /// Ask the driver for a screenshot named after the step and screen.
    pub fn capture_screenshot(&mut self, id: ScreenId) -> Result<(), CrawlError> {
        if self.run.screenshots_taken >= self.config.max_screenshots {
            return Ok(());
        }
        let screen = self.tree.get(id);
        let digest = screen.digest();
        let package = if screen.package.is_empty() {
            self.config.target_package.as_str()
        } else {
            screen.package.as_str()
        };
        let path = self.config.output_dir.join(package).join(format!(
            "{:04}_{}.png",
            self.run.steps_used,
            &digest[..8]
        ));

        if tolerate(self.driver.screenshot(&path))?.is_some() {
            self.run.record_screenshot();
        }
        Ok(())
    }

    /// Press back once. Back presses are not widget interactions.
    pub fn press_back(&mut self) -> Result<(), CrawlError> {
        tolerate(self.driver.press_back())?;
        tolerate(self.driver.wait_for_idle(self.config.idle_timeout))?;
        self.trace(self.event(CrawlEvent::Back));
        Ok(())
    }

    pub fn budget_exhausted(&self, reason: StopReason) {
        tracing::info!(reason = reason.as_str(), steps = self.run.steps_used, "budget exhausted");
        self.trace(self.event(CrawlEvent::BudgetExhausted).with_detail(reason.as_str()));
    }

    pub fn into_outcome(self, strategy: &str, stop_reason: StopReason) -> CrawlOutcome {
        CrawlOutcome {
            strategy: strategy.to_string(),
            target_package: self.config.target_package.clone(),
            stop_reason,
            seed: self.seed,
            steps_used: self.run.steps_used,
            screenshots_taken: self.run.screenshots_taken,
            elapsed_ms: self.run.elapsed().as_millis(),
            distinct_screens: self.registry.len(),
            max_depth_reached: self.run.max_depth_reached,
            screen_repeats: self.run.screen_repeats,
            tree: self.tree,
        }
    }
}
