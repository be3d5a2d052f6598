use serde::Serialize;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::screen::screen_model::Screen;

/// Transitions worth recording for a later reader of the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CrawlEvent {
    RunStarted,
    ScreenDiscovered,
    ScreenRepeat,
    ScreenIgnored,
    DeadEnd,
    WidgetAction,
    WidgetVanished,
    DepthLimited,
    Back,
    ScreenFinished,
    BudgetExhausted,
    RunFinished,
}

#[derive(Debug, Serialize)]
pub struct TraceEvent {
    pub timestamp_ms: u128,
    pub step: usize,
    pub event: CrawlEvent,

    pub screen_id: Option<usize>,
    pub depth: Option<usize>,
    pub signature: Option<String>,
    pub activity: Option<String>,

    pub widget_index: Option<usize>,
    pub widget_label: Option<String>,

    pub detail: Option<String>,
}

impl TraceEvent {
    pub fn now(step: usize, event: CrawlEvent) -> Self {
        Self {
            timestamp_ms: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_millis())
                .unwrap_or(0),
            step,
            event,
            screen_id: None,
            depth: None,
            signature: None,
            activity: None,
            widget_index: None,
            widget_label: None,
            detail: None,
        }
    }

    /// Attach screen id, depth, activity and the signature digest.
    pub fn with_screen(mut self, screen: &Screen) -> Self {
        self.screen_id = Some(screen.id.0);
        self.depth = Some(screen.depth);
        self.signature = Some(screen.digest());
        self.activity = Some(screen.activity.clone());
        self
    }

    pub fn with_widget(mut self, index: usize, label: impl ToString) -> Self {
        self.widget_index = Some(index);
        self.widget_label = Some(label.to_string());
        self
    }

    pub fn with_detail(mut self, detail: impl ToString) -> Self {
        self.detail = Some(detail.to_string());
        self
    }
}
