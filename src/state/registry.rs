use std::collections::HashMap;

use serde::Serialize;

use crate::crawler::config::CrawlConfig;
use crate::screen::screen_model::{Screen, ScreenId};

/// Verdict for a freshly built screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    New,
    Repeat,
}

/// One registered state.
#[derive(Debug, Clone, Serialize)]
pub struct VisitedEntry {
    pub signature: String,
    pub activity: String,
    pub screen: ScreenId,
}

/// Signatures already explored during this crawl, scoped to the target
/// package.
///
/// Membership is signature equality only: depth, parent and widget
/// identity play no part.
#[derive(Debug, Clone, Default)]
pub struct VisitedRegistry {
    target_package: String,
    ignored_activities: Vec<String>,
    entries: Vec<VisitedEntry>,
    arrivals: HashMap<String, usize>,
}

impl VisitedRegistry {
    pub fn new(target_package: impl Into<String>, ignored_activities: Vec<String>) -> Self {
        Self {
            target_package: target_package.into(),
            ignored_activities,
            entries: Vec::new(),
            arrivals: HashMap::new(),
        }
    }

    pub fn from_config(config: &CrawlConfig) -> Self {
        Self::new(
            config.target_package.clone(),
            config.ignored_activities.clone(),
        )
    }

    /// Only target-package screens outside the ignored list take part in
    /// deduplication and expansion.
    pub fn is_eligible(&self, screen: &Screen) -> bool {
        let package_ok =
            self.target_package.is_empty() || screen.package == self.target_package;
        package_ok && !self.ignored_activities.iter().any(|a| a == &screen.activity)
    }

    pub fn classify(&self, screen: &Screen) -> Classification {
        if self.entries.iter().any(|e| e.signature == screen.signature) {
            Classification::Repeat
        } else {
            Classification::New
        }
    }

    pub fn register(&mut self, screen: &Screen) {
        self.entries.push(VisitedEntry {
            signature: screen.signature.clone(),
            activity: screen.activity.clone(),
            screen: screen.id,
        });
    }

    /// Screen first registered under `signature`.
    pub fn lookup(&self, signature: &str) -> Option<ScreenId> {
        self.entries
            .iter()
            .find(|e| e.signature == signature)
            .map(|e| e.screen)
    }

    /// Count another arrival at a known signature and return its repeat
    /// count. Unknown signatures are not counted and return 0.
    pub fn record_arrival(&mut self, signature: &str) -> usize {
        if self.lookup(signature).is_none() {
            return 0;
        }
        let count = self.arrivals.entry(signature.to_string()).or_insert(0);
        *count += 1;
        *count
    }

    pub fn arrivals(&self, signature: &str) -> usize {
        self.arrivals.get(signature).copied().unwrap_or(0)
    }

    pub fn entries(&self) -> &[VisitedEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
