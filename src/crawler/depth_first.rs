use crate::crawler::budget::{BudgetDecision, StopReason};
use crate::crawler::context::{CrawlContext, Discovery};
use crate::crawler::error::CrawlError;
use crate::crawler::strategy::Crawler;
use crate::screen::screen_model::ScreenId;
use crate::trace::trace::CrawlEvent;

/// Result of expanding one screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    /// Screen done; the parent may continue with its next widget
    Continue,
    /// A global budget ran out somewhere below; unwind everything
    Halt(StopReason),
}

/// Systematic exploration: exhaust every widget of a screen, descending
/// into each new screen as soon as it appears, then back out.
///
/// Recursion depth is bounded by `max_depth`.
#[derive(Debug, Default)]
pub struct DepthFirstCrawler;

impl DepthFirstCrawler {
    pub fn new() -> Self {
        Self
    }

    fn expand(&mut self, ctx: &mut CrawlContext<'_>, id: ScreenId) -> Result<Flow, CrawlError> {
        // Repeats, foreign screens and dead ends are retired unexplored
        if ctx.discover(id)? != Discovery::Expand {
            ctx.tree.mark_finished(id);
            return Ok(Flow::Continue);
        }

        loop {
            if ctx.tree.is_finished(id) {
                break;
            }
            if let BudgetDecision::Block(reason) = ctx.check_budgets() {
                ctx.budget_exhausted(reason);
                return Ok(Flow::Halt(reason));
            }
            let Some(widget) = ctx.tree.get(id).next_unfinished_widget() else {
                break;
            };

            ctx.perform(id, widget)?;

            let (fingerprint, identity) = ctx.observe()?;
            if CrawlContext::is_same_state(ctx.tree.get(id), &fingerprint, &identity) {
                continue;
            }
            ctx.note_arrival(&fingerprint.signature);

            let depth = ctx.tree.get(id).depth + 1;
            if depth > ctx.config.max_depth {
                ctx.trace(
                    ctx.event(CrawlEvent::DepthLimited)
                        .with_screen(ctx.tree.get(id))
                        .with_widget(widget, &ctx.tree.get(id).widgets[widget].label),
                );
                self.return_to(ctx, id)?;
                continue;
            }

            let child = ctx.tree.add_child(id, Some(widget), fingerprint, identity);
            if let Flow::Halt(reason) = self.expand(ctx, child)? {
                return Ok(Flow::Halt(reason));
            }
            self.return_to(ctx, id)?;
        }

        ctx.trace(ctx.event(CrawlEvent::ScreenFinished).with_screen(ctx.tree.get(id)));
        Ok(Flow::Continue)
    }

    /// Press back until `parent` is in the foreground again, giving up
    /// after `max_back_presses`.
    fn return_to(&mut self, ctx: &mut CrawlContext<'_>, parent: ScreenId) -> Result<(), CrawlError> {
        for _ in 0..ctx.config.max_back_presses {
            ctx.press_back()?;
            let (fingerprint, identity) = ctx.observe()?;
            if CrawlContext::is_same_state(ctx.tree.get(parent), &fingerprint, &identity) {
                return Ok(());
            }
        }
        tracing::warn!(
            screen = parent.0,
            "could not return to parent screen, continuing from current foreground"
        );
        Ok(())
    }
}

impl Crawler for DepthFirstCrawler {
    fn crawl(&mut self, ctx: &mut CrawlContext<'_>) -> Result<StopReason, CrawlError> {
        ctx.launch_target()?;
        let (fingerprint, identity) = ctx.observe()?;
        let root = ctx.tree.add_root(fingerprint, identity);

        match self.expand(ctx, root)? {
            Flow::Continue => Ok(StopReason::Completed),
            Flow::Halt(reason) => Ok(reason),
        }
    }

    fn name(&self) -> &'static str {
        "depth-first"
    }
}
