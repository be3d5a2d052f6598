use serde::Serialize;

use crate::crawler::budget::StopReason;
use crate::screen::screen_model::{Screen, ScreenId, ScreenTree};

// ============================================================================
// Crawl outcome of one session
// ============================================================================

/// Summary of one crawl session.
///
/// Built by the crawl context when a strategy returns. Consumed by the
/// console and JSON reporters.
#[derive(Debug, Clone, Serialize)]
pub struct CrawlOutcome {
    /// `depth-first` or `random`
    pub strategy: String,

    pub target_package: String,

    pub stop_reason: StopReason,

    /// Seed the widget picker and text generator ran with
    pub seed: u64,

    pub steps_used: usize,

    pub screenshots_taken: usize,

    pub elapsed_ms: u128,

    /// Registered (new, eligible) screens
    pub distinct_screens: usize,

    pub max_depth_reached: usize,

    /// Largest arrival count at one known signature
    pub screen_repeats: usize,

    pub tree: ScreenTree,
}

impl CrawlOutcome {
    /// Whether the whole reachable tree below the root was exhausted.
    pub fn root_finished(&self) -> bool {
        self.tree.root().is_some_and(|root| root.finished())
    }

    /// Widgets acted on across all screens.
    pub fn widgets_attempted(&self) -> usize {
        self.tree
            .iter()
            .flat_map(|s| s.widgets.iter())
            .filter(|w| w.is_finished())
            .count()
    }

    /// Deepest screen in the tree, first one wins on ties.
    pub fn deepest_screen(&self) -> Option<&Screen> {
        self.tree
            .iter()
            .fold(None, |best: Option<&Screen>, s| match best {
                Some(b) if b.depth >= s.depth => Some(b),
                _ => Some(s),
            })
    }

    /// Widget labels tapped from the root down to `id`.
    pub fn breadcrumb(&self, id: ScreenId) -> Vec<String> {
        self.tree
            .path_to(id)
            .into_iter()
            .filter_map(|step| {
                let screen = self.tree.get(step);
                let parent = screen.parent?;
                let label = match screen.parent_widget {
                    Some(w) => self.tree.get(parent).widgets[w].label.clone(),
                    None => "<back>".to_string(),
                };
                Some(label)
            })
            .collect()
    }
}
