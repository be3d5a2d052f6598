use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::screen::deny_list::DenyList;
use crate::screen::fingerprint::SignatureMode;

/// Window titles of transient system panels that are dismissed, not explored.
pub const DEFAULT_IGNORED_ACTIVITIES: &[&str] = &[
    "Feedback & Help",
    "应用和通知",
    "已连接的设备",
    "网络和互联网",
    "定时器提示音",
    "城市",
];

/// Everything one crawl session is tuned by.
///
/// Built once (from YAML + CLI) and threaded through the crawl by
/// reference; nothing reads tuning from globals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlConfig {
    /// Only screens of this package are registered and explored.
    /// Empty accepts every package.
    pub target_package: String,

    pub max_depth: usize,
    pub max_steps: usize,
    pub max_runtime: Duration,
    pub max_screenshots: usize,

    /// Arrivals at an already-known signature before the run stops
    pub max_screen_loop: usize,

    pub signature_max_length: usize,
    pub signature_mode: SignatureMode,

    /// Scroll-forward attempts per container while harvesting texts
    pub max_scroll_attempts: usize,

    pub launch_timeout: Duration,
    pub idle_timeout: Duration,

    /// Screenshot after every step instead of once per new screen
    pub capture_steps: bool,

    /// Type a random word into text fields before tapping them
    pub random_text: bool,

    pub deny_list: DenyList,
    pub ignored_activities: Vec<String>,

    /// Back presses tried when returning to a parent screen
    pub max_back_presses: usize,

    /// Screenshot root; files land under `<output_dir>/<package>/`
    pub output_dir: PathBuf,

    /// Seed for widget selection and random text
    pub seed: Option<u64>,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            target_package: String::new(),
            max_depth: 20,
            max_steps: 999,
            max_runtime: Duration::from_secs(13600),
            max_screenshots: 999,
            max_screen_loop: 50,
            signature_max_length: 1360,
            signature_mode: SignatureMode::Shallow,
            max_scroll_attempts: 20,
            launch_timeout: Duration::from_millis(5000),
            idle_timeout: Duration::from_millis(100),
            capture_steps: true,
            random_text: true,
            deny_list: DenyList::shipped(),
            ignored_activities: DEFAULT_IGNORED_ACTIVITIES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            max_back_presses: 3,
            output_dir: PathBuf::from("AppCrawler"),
            seed: None,
        }
    }
}
