use serde::{Deserialize, Serialize};

use crate::driver::action_driver::Bounds;

/// Localized system buttons that are never worth tapping.
pub const DEFAULT_DENIED_LABELS: &[&str] = &["Search settings", "Back", "在设置中搜索", "返回", "开始"];

/// Fixed-position controls excluded by rectangle.
pub const DEFAULT_DENIED_RECTS: &[&str] = &["[216,702][864,1350]"];

/// Labels and rectangles excluded from widget collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DenyList {
    pub labels: Vec<String>,
    pub rects: Vec<Bounds>,
}

impl DenyList {
    /// Build from config strings. Rectangles that do not parse are logged
    /// and dropped.
    pub fn from_config(labels: &[String], rects: &[String]) -> Self {
        let rects = rects
            .iter()
            .filter_map(|raw| match raw.parse::<Bounds>() {
                Ok(bounds) => Some(bounds),
                Err(e) => {
                    tracing::warn!(rect = %raw, error = %e, "ignoring malformed deny-listed rectangle");
                    None
                }
            })
            .collect();

        Self {
            labels: labels.to_vec(),
            rects,
        }
    }

    /// The deny-list the tool ships with.
    pub fn shipped() -> Self {
        let labels: Vec<String> = DEFAULT_DENIED_LABELS.iter().map(|s| s.to_string()).collect();
        let rects: Vec<String> = DEFAULT_DENIED_RECTS.iter().map(|s| s.to_string()).collect();
        Self::from_config(&labels, &rects)
    }

    pub fn denies_label(&self, description: &str) -> bool {
        self.labels.iter().any(|l| l == description)
    }

    pub fn denies_bounds(&self, bounds: &Bounds) -> bool {
        self.rects.iter().any(|r| r == bounds)
    }
}
