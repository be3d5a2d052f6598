use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::crawler::config::{CrawlConfig, DEFAULT_IGNORED_ACTIVITIES};
use crate::crawler::strategy::StrategyKind;
use crate::screen::deny_list::{DEFAULT_DENIED_LABELS, DEFAULT_DENIED_RECTS, DenyList};
use crate::screen::fingerprint::SignatureMode;

/// Config file looked up in the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_PATH: &str = "app-crawler.yaml";

// ============================================================================
// CLI Argument Parsing (clap derive)
// ============================================================================

#[derive(Parser, Debug)]
#[command(
    name = "app-crawler",
    version,
    about = "Automated UI crawler for Android apps"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to config file (default: app-crawler.yaml in current dir)
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Package whose screens are explored
    #[arg(long, global = true)]
    pub target: Option<String>,

    /// Maximum widget interactions
    #[arg(long, global = true)]
    pub max_steps: Option<usize>,

    /// Maximum screen depth
    #[arg(long, global = true)]
    pub max_depth: Option<usize>,

    /// Maximum wall-clock runtime in seconds
    #[arg(long, global = true)]
    pub max_runtime: Option<u64>,

    /// Seed for widget selection and random text
    #[arg(long, global = true)]
    pub seed: Option<u64>,

    /// Report format
    #[arg(long, value_enum, default_value_t = ReportFormat::Console, global = true)]
    pub format: ReportFormat,

    /// Report file path (default: stdout)
    #[arg(short, long, global = true)]
    pub output: Option<String>,

    /// JSONL transition trace path
    #[arg(long, global = true)]
    pub trace_file: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Crawl a live device through an external bridge process
    Crawl {
        /// Bridge command line, e.g. "adb-bridge --serial emulator-5554"
        #[arg(long)]
        bridge: String,

        /// Exploration strategy
        #[arg(long, value_enum, default_value_t = StrategyKind::DepthFirst)]
        strategy: StrategyKind,
    },

    /// Crawl a scripted app model (YAML) without a device
    Simulate {
        /// Path to the app model YAML
        #[arg(long)]
        model: String,

        /// Exploration strategy
        #[arg(long, value_enum, default_value_t = StrategyKind::DepthFirst)]
        strategy: StrategyKind,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    Console,
    Json,
}

// ============================================================================
// Config File Model (optional YAML)
// ============================================================================

/// Optional YAML config file: `app-crawler.yaml`
///
/// Settings normally live under `crawl:`. Older files keep them at the top
/// level; those are read as the crawl section when `crawl:` is absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "ConfigLayout")]
pub struct AppConfig {
    pub crawl: CrawlSection,
}

#[derive(Deserialize)]
struct ConfigLayout {
    crawl: Option<CrawlSection>,
    #[serde(flatten)]
    top_level: CrawlSection,
}

impl From<ConfigLayout> for AppConfig {
    fn from(layout: ConfigLayout) -> Self {
        Self {
            crawl: layout.crawl.unwrap_or(layout.top_level),
        }
    }
}

/// The `crawl:` section. Legacy key names are accepted as aliases.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlSection {
    #[serde(default, alias = "sTargetPackage")]
    pub target_package: String,

    #[serde(default = "default_max_depth", alias = "sMaxDepth")]
    pub max_depth: usize,

    #[serde(default = "default_max_steps")]
    pub max_steps: usize,

    /// Seconds
    #[serde(default = "default_max_runtime")]
    pub max_runtime: u64,

    #[serde(default = "default_max_screenshots")]
    pub max_screenshots: usize,

    #[serde(default = "default_max_screen_loop")]
    pub max_screen_loop: usize,

    #[serde(default = "default_signature_max_length")]
    pub signature_max_length: usize,

    #[serde(default)]
    pub signature_mode: SignatureMode,

    #[serde(default = "default_max_scroll_attempts")]
    pub max_scroll_attempts: usize,

    /// Milliseconds
    #[serde(default = "default_launch_timeout")]
    pub launch_timeout: u64,

    /// Milliseconds
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout: u64,

    #[serde(default = "default_true")]
    pub capture_steps: bool,

    #[serde(default = "default_true")]
    pub random_text: bool,

    #[serde(default = "default_denied_labels", alias = "BLACKLIST_BUTTONS_Description")]
    pub denied_labels: Vec<String>,

    /// `[l,t][r,b]` rectangles
    #[serde(default = "default_denied_rects")]
    pub denied_rects: Vec<String>,

    #[serde(default = "default_ignored_activities", alias = "IGNORED_ACTIVITY")]
    pub ignored_activities: Vec<String>,

    #[serde(default = "default_max_back_presses")]
    pub max_back_presses: usize,

    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    #[serde(default = "default_trace_file")]
    pub trace_file: String,

    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for CrawlSection {
    fn default() -> Self {
        Self {
            target_package: String::new(),
            max_depth: default_max_depth(),
            max_steps: default_max_steps(),
            max_runtime: default_max_runtime(),
            max_screenshots: default_max_screenshots(),
            max_screen_loop: default_max_screen_loop(),
            signature_max_length: default_signature_max_length(),
            signature_mode: SignatureMode::default(),
            max_scroll_attempts: default_max_scroll_attempts(),
            launch_timeout: default_launch_timeout(),
            idle_timeout: default_idle_timeout(),
            capture_steps: true,
            random_text: true,
            denied_labels: default_denied_labels(),
            denied_rects: default_denied_rects(),
            ignored_activities: default_ignored_activities(),
            max_back_presses: default_max_back_presses(),
            output_dir: default_output_dir(),
            trace_file: default_trace_file(),
            seed: None,
        }
    }
}

// Serde default helpers
fn default_max_depth() -> usize { 20 }
fn default_max_steps() -> usize { 999 }
fn default_max_runtime() -> u64 { 13600 }
fn default_max_screenshots() -> usize { 999 }
fn default_max_screen_loop() -> usize { 50 }
fn default_signature_max_length() -> usize { 1360 }
fn default_max_scroll_attempts() -> usize { 20 }
fn default_launch_timeout() -> u64 { 5000 }
fn default_idle_timeout() -> u64 { 100 }
fn default_true() -> bool { true }
fn default_max_back_presses() -> usize { 3 }
fn default_output_dir() -> String { "AppCrawler".to_string() }
fn default_trace_file() -> String { "crawl_trace.jsonl".to_string() }

fn default_denied_labels() -> Vec<String> {
    DEFAULT_DENIED_LABELS.iter().map(|s| s.to_string()).collect()
}

fn default_denied_rects() -> Vec<String> {
    DEFAULT_DENIED_RECTS.iter().map(|s| s.to_string()).collect()
}

fn default_ignored_activities() -> Vec<String> {
    DEFAULT_IGNORED_ACTIVITIES.iter().map(|s| s.to_string()).collect()
}

// ============================================================================
// Config File Loading
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Read and parse a config file, reporting why it could not be used.
pub fn try_load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Load config from a YAML file. Returns defaults if file is missing or malformed.
pub fn load_config(path: Option<&str>) -> AppConfig {
    let explicit = path.is_some();
    let config_path = Path::new(path.unwrap_or(DEFAULT_CONFIG_PATH));
    match try_load_config(config_path) {
        Ok(config) => config,
        // An absent default file is the normal case, not worth a warning
        Err(ConfigError::Read { source, .. })
            if !explicit && source.kind() == std::io::ErrorKind::NotFound =>
        {
            AppConfig::default()
        }
        Err(e) => {
            tracing::warn!(error = %e, "using default configuration");
            AppConfig::default()
        }
    }
}

// ============================================================================
// Config Builders (merge CLI args with config file)
// ============================================================================

/// Resolve the crawl configuration: CLI flag > config file > built-in default.
pub fn build_crawl_config(section: &CrawlSection, cli: &Cli) -> CrawlConfig {
    CrawlConfig {
        target_package: cli
            .target
            .clone()
            .unwrap_or_else(|| section.target_package.clone()),
        max_depth: cli.max_depth.unwrap_or(section.max_depth),
        max_steps: cli.max_steps.unwrap_or(section.max_steps),
        max_runtime: Duration::from_secs(cli.max_runtime.unwrap_or(section.max_runtime)),
        max_screenshots: section.max_screenshots,
        max_screen_loop: section.max_screen_loop,
        signature_max_length: section.signature_max_length,
        signature_mode: section.signature_mode,
        max_scroll_attempts: section.max_scroll_attempts,
        launch_timeout: Duration::from_millis(section.launch_timeout),
        idle_timeout: Duration::from_millis(section.idle_timeout),
        capture_steps: section.capture_steps,
        random_text: section.random_text,
        deny_list: DenyList::from_config(&section.denied_labels, &section.denied_rects),
        ignored_activities: section.ignored_activities.clone(),
        max_back_presses: section.max_back_presses,
        output_dir: PathBuf::from(&section.output_dir),
        seed: cli.seed.or(section.seed),
    }
}

/// Trace file path: CLI flag > config file.
pub fn resolve_trace_file(section: &CrawlSection, cli: &Cli) -> PathBuf {
    PathBuf::from(cli.trace_file.as_deref().unwrap_or(&section.trace_file))
}
