use rand::Rng;

use crate::crawler::budget::{BudgetDecision, StopReason};
use crate::crawler::context::{CrawlContext, Discovery};
use crate::crawler::error::CrawlError;
use crate::crawler::strategy::Crawler;
use crate::screen::screen_model::ScreenId;
use crate::trace::trace::CrawlEvent;

/// Random walk: pick any unfinished widget on the current screen, act,
/// follow wherever it leads. No backtracking to a parent; the tree is a
/// single path that grows until a budget runs out.
///
/// `finished` flags only stop the same widget from being picked twice on
/// one screen visit. A screen with nothing left to try is left with a back
/// press, which costs a step so the walk always terminates.
#[derive(Debug, Default)]
pub struct RandomCrawler;

impl RandomCrawler {
    pub fn new() -> Self {
        Self
    }
}

impl Crawler for RandomCrawler {
    fn crawl(&mut self, ctx: &mut CrawlContext<'_>) -> Result<StopReason, CrawlError> {
        ctx.launch_target()?;
        let (fingerprint, identity) = ctx.observe()?;
        let mut current = ctx.tree.add_root(fingerprint, identity);
        let mut explorable = explore_or_retire(ctx, current)?;

        loop {
            if let BudgetDecision::Block(reason) = ctx.check_budgets() {
                ctx.budget_exhausted(reason);
                return Ok(reason);
            }

            let candidates = if explorable {
                ctx.tree.get(current).unfinished_widgets()
            } else {
                Vec::new()
            };

            let via_widget = if candidates.is_empty() {
                ctx.press_back()?;
                ctx.run.record_step();
                None
            } else {
                let pick = candidates[ctx.rng.gen_range(0..candidates.len())];
                ctx.perform(current, pick)?;
                Some(pick)
            };

            let (fingerprint, identity) = ctx.observe()?;
            if CrawlContext::is_same_state(ctx.tree.get(current), &fingerprint, &identity) {
                continue;
            }
            ctx.note_arrival(&fingerprint.signature);

            let depth = ctx.tree.get(current).depth + 1;
            if depth > ctx.config.max_depth {
                ctx.budget_exhausted(StopReason::DepthExhausted);
                return Ok(StopReason::DepthExhausted);
            }

            current = ctx.tree.add_child(current, via_widget, fingerprint, identity);
            explorable = explore_or_retire(ctx, current)?;
        }
    }

    fn name(&self) -> &'static str {
        "random"
    }
}

/// Repeats stay walkable on the random path; foreign screens and dead ends
/// are retired and left with a back press.
fn explore_or_retire(ctx: &mut CrawlContext<'_>, id: ScreenId) -> Result<bool, CrawlError> {
    match ctx.discover(id)? {
        Discovery::Expand | Discovery::Repeat => Ok(true),
        Discovery::Ignored | Discovery::DeadEnd => {
            ctx.tree.mark_finished(id);
            ctx.trace(ctx.event(CrawlEvent::ScreenFinished).with_screen(ctx.tree.get(id)));
            Ok(false)
        }
    }
}
