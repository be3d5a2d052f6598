use std::time::Duration;

use app_crawler::cli::commands::{cmd_simulate, render_report};
use app_crawler::cli::config::{
    AppConfig, Cli, Commands, ConfigError, CrawlSection, ReportFormat, build_crawl_config,
    load_config, resolve_trace_file, try_load_config,
};
use app_crawler::crawler::strategy::StrategyKind;
use app_crawler::driver::action_driver::Bounds;
use app_crawler::screen::fingerprint::SignatureMode;
use app_crawler::trace::logger::TraceLogger;
use clap::Parser;

mod common;

use common::{apps, config_for, crawl};

// ============================================================================
// CLI Argument Parsing Tests
// ============================================================================

#[test]
fn cli_parse_simulate_minimal() {
    let cli = Cli::parse_from(["app-crawler", "simulate", "--model", "app.yaml"]);
    match cli.command {
        Commands::Simulate { model, strategy } => {
            assert_eq!(model, "app.yaml");
            assert_eq!(strategy, StrategyKind::DepthFirst);
        }
        _ => panic!("Expected Simulate command"),
    }
    assert_eq!(cli.format, ReportFormat::Console);
    assert_eq!(cli.verbose, 0);
    assert!(cli.max_steps.is_none());
}

#[test]
fn cli_parse_crawl_with_global_flags() {
    let cli = Cli::parse_from([
        "app-crawler",
        "-vv",
        "crawl",
        "--bridge",
        "uia-bridge --serial emulator-5554",
        "--strategy",
        "random",
        "--target",
        "com.android.settings",
        "--max-steps",
        "50",
        "--seed",
        "9",
        "--format",
        "json",
    ]);
    match &cli.command {
        Commands::Crawl { bridge, strategy } => {
            assert_eq!(bridge, "uia-bridge --serial emulator-5554");
            assert_eq!(*strategy, StrategyKind::Random);
        }
        _ => panic!("Expected Crawl command"),
    }
    assert_eq!(cli.verbose, 2);
    assert_eq!(cli.target.as_deref(), Some("com.android.settings"));
    assert_eq!(cli.max_steps, Some(50));
    assert_eq!(cli.seed, Some(9));
    assert_eq!(cli.format, ReportFormat::Json);
}

#[test]
fn cli_rejects_unknown_strategy() {
    let result = Cli::try_parse_from([
        "app-crawler",
        "simulate",
        "--model",
        "app.yaml",
        "--strategy",
        "breadth-first",
    ]);
    assert!(result.is_err());
}

// ============================================================================
// Config File Tests
// ============================================================================

#[test]
fn config_defaults_match_the_shipped_tool() {
    let section = CrawlSection::default();
    assert_eq!(section.max_depth, 20);
    assert_eq!(section.max_steps, 999);
    assert_eq!(section.max_runtime, 13600);
    assert_eq!(section.signature_max_length, 1360);
    assert_eq!(section.launch_timeout, 5000);
    assert_eq!(section.trace_file, "crawl_trace.jsonl");
    assert!(section.denied_labels.contains(&"Search settings".to_string()));

    let cli = Cli::parse_from(["app-crawler", "simulate", "--model", "m.yaml"]);
    let config = build_crawl_config(&section, &cli);
    assert_eq!(config.max_runtime, Duration::from_secs(13600));
    assert_eq!(config.idle_timeout, Duration::from_millis(100));
    assert_eq!(config.deny_list.rects, vec![Bounds::new(216, 702, 864, 1350)]);
    assert_eq!(config.signature_mode, SignatureMode::Shallow);
}

#[test]
fn config_accepts_legacy_keys() {
    let yaml = r#"
crawl:
  sTargetPackage: com.android.settings
  sMaxDepth: 5
  BLACKLIST_BUTTONS_Description: ["Cancel"]
  IGNORED_ACTIVITY: ["Dialog"]
  signature_mode: full
"#;
    let config: AppConfig = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(config.crawl.target_package, "com.android.settings");
    assert_eq!(config.crawl.max_depth, 5);
    assert_eq!(config.crawl.denied_labels, vec!["Cancel"]);
    assert_eq!(config.crawl.ignored_activities, vec!["Dialog"]);
    assert_eq!(config.crawl.signature_mode, SignatureMode::Full);
    // Untouched keys keep their defaults
    assert_eq!(config.crawl.max_steps, 999);
}

#[test]
fn config_accepts_a_flat_legacy_layout() {
    let yaml = r#"
sTargetPackage: com.android.settings
sMaxDepth: 4
IGNORED_ACTIVITY: ["Dialog"]
max_steps: 12
"#;
    let config: AppConfig = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(config.crawl.target_package, "com.android.settings");
    assert_eq!(config.crawl.max_depth, 4);
    assert_eq!(config.crawl.ignored_activities, vec!["Dialog"]);
    assert_eq!(config.crawl.max_steps, 12);
    assert_eq!(config.crawl.max_screen_loop, 50);
}

#[test]
fn crawl_section_wins_over_top_level_keys() {
    let yaml = r#"
sMaxDepth: 4
crawl:
  max_depth: 9
"#;
    let config: AppConfig = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(config.crawl.max_depth, 9);
}

#[test]
fn cli_flags_override_config_file() {
    let section: CrawlSection = serde_yaml::from_str(
        "target_package: com.example.a\nmax_depth: 5\nmax_steps: 10\nseed: 1\ntrace_file: from-config.jsonl\n",
    )
    .unwrap();
    let cli = Cli::parse_from([
        "app-crawler",
        "--target",
        "com.example.b",
        "--max-depth",
        "7",
        "--trace-file",
        "from-cli.jsonl",
        "simulate",
        "--model",
        "m.yaml",
    ]);

    let config = build_crawl_config(&section, &cli);
    assert_eq!(config.target_package, "com.example.b");
    assert_eq!(config.max_depth, 7);
    assert_eq!(config.max_steps, 10);
    assert_eq!(config.seed, Some(1));
    assert_eq!(
        resolve_trace_file(&section, &cli).to_str(),
        Some("from-cli.jsonl")
    );
}

#[test]
fn malformed_rects_are_skipped() {
    let section: CrawlSection =
        serde_yaml::from_str("denied_rects: [\"[0,0][1,1]\", \"bogus\"]\n").unwrap();
    let cli = Cli::parse_from(["app-crawler", "simulate", "--model", "m.yaml"]);
    let config = build_crawl_config(&section, &cli);
    assert_eq!(config.deny_list.rects, vec![Bounds::new(0, 0, 1, 1)]);
}

#[test]
fn load_config_falls_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();

    let missing = dir.path().join("missing.yaml");
    let config = load_config(missing.to_str());
    assert_eq!(config.crawl.max_depth, 20);

    let broken = dir.path().join("broken.yaml");
    std::fs::write(&broken, "crawl: [not, a, map").unwrap();
    let config = load_config(broken.to_str());
    assert_eq!(config.crawl.max_steps, 999);

    assert!(matches!(try_load_config(&broken), Err(ConfigError::Parse { .. })));
    assert!(matches!(try_load_config(&missing), Err(ConfigError::Read { .. })));
}

#[test]
fn load_config_reads_a_valid_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("app-crawler.yaml");
    std::fs::write(&path, "crawl:\n  max_steps: 42\n  capture_steps: false\n").unwrap();

    let config = load_config(path.to_str());
    assert_eq!(config.crawl.max_steps, 42);
    assert!(!config.crawl.capture_steps);
}

// ============================================================================
// Commands
// ============================================================================

#[test]
fn simulate_writes_a_json_report() {
    let dir = tempfile::tempdir().unwrap();
    let model = dir.path().join("notes.yaml");
    std::fs::write(&model, apps::NOTES).unwrap();
    let report = dir.path().join("out").join("report.json");

    let cli = Cli::parse_from([
        "app-crawler",
        "--format",
        "json",
        "--output",
        report.to_str().unwrap(),
        "simulate",
        "--model",
        model.to_str().unwrap(),
    ]);
    let config = build_crawl_config(&CrawlSection::default(), &cli);

    cmd_simulate(
        model.to_str().unwrap(),
        StrategyKind::DepthFirst,
        &config,
        &TraceLogger::disabled(),
        &cli,
    )
    .unwrap();

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&report).unwrap()).unwrap();
    assert_eq!(json["target_package"], "com.example.notes");
    assert_eq!(json["stop_reason"], "completed");
    assert_eq!(json["steps_used"], 5);
}

#[test]
fn simulate_rejects_a_missing_model() {
    let cli = Cli::parse_from(["app-crawler", "simulate", "--model", "/nonexistent/app.yaml"]);
    let config = build_crawl_config(&CrawlSection::default(), &cli);
    let result = cmd_simulate(
        "/nonexistent/app.yaml",
        StrategyKind::DepthFirst,
        &config,
        &TraceLogger::disabled(),
        &cli,
    );
    assert!(result.is_err());
}

#[test]
fn console_and_json_renderings_differ_by_format() {
    let (outcome, _) = crawl(StrategyKind::DepthFirst, apps::FLAT, &config_for("com.example.flat"));

    let console = render_report(&outcome, ReportFormat::Console).unwrap();
    assert!(console.starts_with("=== Crawl: com.example.flat (depth-first) ==="));

    let json = render_report(&outcome, ReportFormat::Json).unwrap();
    assert!(json.ends_with('\n'));
    assert!(serde_json::from_str::<serde_json::Value>(&json).is_ok());
}
