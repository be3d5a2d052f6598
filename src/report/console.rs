use crate::report::report_model::CrawlOutcome;
use crate::screen::screen_model::{Screen, ScreenTree};

// ============================================================================
// Console reporter (formatted terminal output)
// ============================================================================

/// Format a crawl outcome for terminal output.
///
/// Produces output like:
/// ```text
/// === Crawl: com.example.notes (depth-first) ===
///
/// Stop reason:   completed
/// Steps:         7
/// ...
///
/// Screens:
/// ✓ #0 depth 0 .MainActivity 3f2a9c1e (2 widgets)
///     [✓] 0 Settings
///   ✓ #1 depth 1 .SettingsActivity 9b0d44aa (1 widgets)
///       [✓] 0 About
/// ```
pub fn format_console_report(outcome: &CrawlOutcome) -> String {
    let mut out = String::new();

    let target = if outcome.target_package.is_empty() {
        "<any package>"
    } else {
        outcome.target_package.as_str()
    };
    out.push_str(&format!("=== Crawl: {} ({}) ===\n\n", target, outcome.strategy));

    out.push_str(&format!("Stop reason:   {}\n", outcome.stop_reason.as_str()));
    out.push_str(&format!("Steps:         {}\n", outcome.steps_used));
    out.push_str(&format!("Screenshots:   {}\n", outcome.screenshots_taken));
    out.push_str(&format!("Screens:       {} distinct, {} visited\n", outcome.distinct_screens, outcome.tree.len()));
    out.push_str(&format!("Max depth:     {}\n", outcome.max_depth_reached));
    out.push_str(&format!("Screen loop:   {}\n", outcome.screen_repeats));
    out.push_str(&format!("Seed:          {}\n", outcome.seed));

    let secs = outcome.elapsed_ms as f64 / 1000.0;
    out.push_str(&format!("Elapsed:       {:.1}s\n", secs));

    if let Some(deepest) = outcome.deepest_screen() {
        let crumbs = outcome.breadcrumb(deepest.id);
        if !crumbs.is_empty() {
            out.push_str(&format!("Deepest path:  {}\n", crumbs.join(" > ")));
        }
    }

    if let Some(root) = outcome.tree.root() {
        out.push_str("\nScreens:\n");
        dump_screen(&outcome.tree, root, 0, &mut out);
    }

    out
}

fn dump_screen(tree: &ScreenTree, screen: &Screen, indent: usize, out: &mut String) {
    let pad = "  ".repeat(indent);
    let digest = screen.digest();
    out.push_str(&format!(
        "{}{} #{} depth {} {} {} ({} widgets)\n",
        pad,
        marker(screen.finished()),
        screen.id.0,
        screen.depth,
        display_activity(screen),
        &digest[..8],
        screen.widgets.len()
    ));

    for (i, widget) in screen.widgets.iter().enumerate() {
        out.push_str(&format!(
            "{}    [{}] {} {}\n",
            pad,
            marker(widget.is_finished()),
            i,
            widget.label
        ));
    }

    for child in &screen.children {
        dump_screen(tree, tree.get(*child), indent + 1, out);
    }
}

fn marker(finished: bool) -> &'static str {
    if finished { "\u{2713}" } else { "\u{2022}" }
}

fn display_activity(screen: &Screen) -> &str {
    if screen.activity.is_empty() {
        "<no activity>"
    } else {
        &screen.activity
    }
}

/// Pretty-printed JSON of the whole outcome, screen tree included.
pub fn format_json_report(outcome: &CrawlOutcome) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(outcome)
}
