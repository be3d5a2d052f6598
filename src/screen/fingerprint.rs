use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::crawler::config::CrawlConfig;
use crate::driver::action_driver::{ActionDriver, NodeId};
use crate::driver::error::{DriverError, tolerate};
use crate::driver::timeouts::TimeoutOverride;
use crate::screen::screen_model::Widget;

pub const SIGNATURE_SEPARATOR: char = ';';

/// Upper bound on `clickable(instance)` lookups per screen.
pub const MAX_CLICKABLE_INSTANCES: usize = 1000;

/// Upper bound on nodes visited per scroll snapshot.
pub const MAX_SNAPSHOT_NODES: usize = 1000;

/// How much of the hierarchy goes into a signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignatureMode {
    /// Root plus its direct children
    #[default]
    Shallow,
    /// Whole subtree, preorder
    Full,
}

/// Structural signature plus the widgets worth acting on.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fingerprint {
    pub signature: String,
    pub widgets: Vec<Widget>,
}

impl Fingerprint {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.signature.is_empty()
    }
}

// ============================================================================
// Entry point
// ============================================================================

/// Fingerprint whatever is in the foreground.
///
/// Runs with every driver timeout forced to zero; the previous values are
/// restored on every exit path. A driver that refuses the override is walked
/// with its current timeouts instead. An absent root yields an empty
/// fingerprint. Only a disconnect is reported as an error.
pub fn fingerprint(
    driver: &mut dyn ActionDriver,
    config: &CrawlConfig,
) -> Result<Fingerprint, DriverError> {
    let e = match TimeoutOverride::zero(&mut *driver) {
        Ok(mut guard) => return fingerprint_foreground(&mut *guard, config),
        Err(e) => e,
    };
    if e.is_fatal() {
        return Err(e);
    }
    tracing::warn!(error = %e, "could not zero driver timeouts, fingerprinting without override");
    fingerprint_foreground(driver, config)
}

fn fingerprint_foreground(
    driver: &mut dyn ActionDriver,
    config: &CrawlConfig,
) -> Result<Fingerprint, DriverError> {
    let Some(root) = tolerate(driver.current_root())?.flatten() else {
        return Ok(Fingerprint::empty());
    };
    if !tolerate(driver.exists(root))?.unwrap_or(false) {
        return Ok(Fingerprint::empty());
    }

    // A previously scrolled list would otherwise fingerprint differently
    let container = tolerate(driver.scrollable(0))?.flatten();
    if let Some(container) = container {
        tolerate(driver.scroll_to_beginning(container))?;
    }

    let signature = build_signature(driver, root, config)?;

    let mut widgets = Vec::new();
    if let Some(container) = container {
        let texts = harvest_texts(driver, container, config.max_scroll_attempts)?;
        widgets = resolve_texts(driver, &texts, config)?;
    }
    if widgets.is_empty() {
        widgets = collect_clickable(driver, config)?;
    }

    tracing::debug!(
        signature = %signature,
        widgets = widgets.len(),
        "fingerprinted screen"
    );
    Ok(Fingerprint { signature, widgets })
}

// ============================================================================
// Signature
// ============================================================================

/// Part of a fully-qualified class name after the last `.`.
pub fn short_class_name(class_name: &str) -> &str {
    class_name.rsplit('.').next().unwrap_or(class_name)
}

/// Length-capped `;`-joined list of short class names.
#[derive(Debug)]
pub struct SignatureBuilder {
    buf: String,
    max_len: usize,
    full: bool,
}

impl SignatureBuilder {
    pub fn new(max_len: usize) -> Self {
        Self {
            buf: String::new(),
            max_len,
            full: false,
        }
    }

    pub fn is_full(&self) -> bool {
        self.full
    }

    /// Append one element. Once the cap is hit the signature is truncated
    /// to exactly `max_len` bytes (at a char boundary) and further pushes
    /// are ignored.
    pub fn push(&mut self, class_name: &str) {
        if self.full {
            return;
        }
        self.buf.push_str(short_class_name(class_name));
        self.buf.push(SIGNATURE_SEPARATOR);

        if self.buf.len() >= self.max_len {
            let mut cut = self.max_len.min(self.buf.len());
            while !self.buf.is_char_boundary(cut) {
                cut -= 1;
            }
            self.buf.truncate(cut);
            self.full = true;
        }
    }

    pub fn finish(self) -> String {
        self.buf
    }
}

fn build_signature(
    driver: &mut dyn ActionDriver,
    root: NodeId,
    config: &CrawlConfig,
) -> Result<String, DriverError> {
    let mut builder = SignatureBuilder::new(config.signature_max_length);

    match config.signature_mode {
        SignatureMode::Shallow => {
            if let Some(class_name) = tolerate(driver.class_name(root))? {
                builder.push(&class_name);
            }
            let mut index = 0;
            while !builder.is_full() {
                let Some(child) = tolerate(driver.child(root, index))?.flatten() else {
                    break;
                };
                index += 1;
                if let Some(class_name) = tolerate(driver.class_name(child))? {
                    builder.push(&class_name);
                }
            }
        }
        SignatureMode::Full => walk_subtree(driver, root, &mut builder)?,
    }

    Ok(builder.finish())
}

fn walk_subtree(
    driver: &mut dyn ActionDriver,
    node: NodeId,
    builder: &mut SignatureBuilder,
) -> Result<(), DriverError> {
    if builder.is_full() {
        return Ok(());
    }
    // Vanished mid-walk: skip the whole subtree
    let Some(class_name) = tolerate(driver.class_name(node))? else {
        return Ok(());
    };
    builder.push(&class_name);

    let count = tolerate(driver.child_count(node))?.flatten();
    let mut index = 0;
    while !builder.is_full() {
        if count.is_some_and(|n| index >= n) {
            break;
        }
        let Some(child) = tolerate(driver.child(node, index))?.flatten() else {
            break;
        };
        walk_subtree(driver, child, builder)?;
        index += 1;
    }
    Ok(())
}

// ============================================================================
// Widget collection
// ============================================================================

/// Read description and bounds of `node` and turn it into a widget unless
/// it is deny-listed or vanished.
fn admit(
    driver: &mut dyn ActionDriver,
    node: NodeId,
    config: &CrawlConfig,
) -> Result<Option<Widget>, DriverError> {
    let Some(description) = tolerate(driver.content_description(node))? else {
        return Ok(None);
    };
    if config.deny_list.denies_label(&description) {
        tracing::debug!(label = %description, "skipping deny-listed label");
        return Ok(None);
    }

    let Some(bounds) = tolerate(driver.bounds(node))? else {
        return Ok(None);
    };
    if config.deny_list.denies_bounds(&bounds) {
        tracing::debug!(bounds = %bounds, "skipping deny-listed rectangle");
        return Ok(None);
    }

    let class_name = tolerate(driver.class_name(node))?.unwrap_or_default();
    let label = if description.is_empty() {
        tolerate(driver.text(node))?.unwrap_or_default()
    } else {
        description
    };
    Ok(Some(Widget::new(node, class_name, label)))
}

fn collect_clickable(
    driver: &mut dyn ActionDriver,
    config: &CrawlConfig,
) -> Result<Vec<Widget>, DriverError> {
    let mut widgets = Vec::new();
    for instance in 0..MAX_CLICKABLE_INSTANCES {
        let Some(node) = tolerate(driver.clickable(instance))?.flatten() else {
            break;
        };
        if let Some(widget) = admit(driver, node, config)? {
            widgets.push(widget);
        }
    }
    Ok(widgets)
}

// ============================================================================
// Scroll harvesting
// ============================================================================

/// `(class, text)` of every node under a container, preorder.
type Snapshot = Vec<(String, String)>;

fn snapshot(driver: &mut dyn ActionDriver, container: NodeId) -> Result<Snapshot, DriverError> {
    let mut out = Vec::new();
    let mut stack = vec![container];
    let mut visited = 0;

    while let Some(node) = stack.pop() {
        visited += 1;
        if visited > MAX_SNAPSHOT_NODES {
            break;
        }
        if node != container {
            let Some(class_name) = tolerate(driver.class_name(node))? else {
                continue;
            };
            let text = tolerate(driver.text(node))?.unwrap_or_default();
            out.push((class_name, text));
        }

        let mut children = Vec::new();
        let mut index = 0;
        while let Some(child) = tolerate(driver.child(node, index))?.flatten() {
            children.push(child);
            index += 1;
        }
        stack.extend(children.into_iter().rev());
    }
    Ok(out)
}

/// Collect every distinct non-empty text reachable by scrolling `container`
/// forward until two consecutive snapshots match or `max_attempts` scrolls
/// have been made. The container is flung back to the start afterwards.
pub fn harvest_texts(
    driver: &mut dyn ActionDriver,
    container: NodeId,
    max_attempts: usize,
) -> Result<Vec<String>, DriverError> {
    let mut texts = Vec::new();
    let mut seen = HashSet::new();
    let mut absorb = |snap: &Snapshot, texts: &mut Vec<String>| {
        for (_, text) in snap {
            if !text.is_empty() && seen.insert(text.clone()) {
                texts.push(text.clone());
            }
        }
    };

    let mut previous = snapshot(driver, container)?;
    absorb(&previous, &mut texts);

    for _ in 0..max_attempts {
        if tolerate(driver.scroll_forward(container))?.is_none() {
            break;
        }
        let current = snapshot(driver, container)?;
        if current == previous {
            break;
        }
        absorb(&current, &mut texts);
        previous = current;
    }

    tolerate(driver.scroll_to_beginning(container))?;
    Ok(texts)
}

fn resolve_texts(
    driver: &mut dyn ActionDriver,
    texts: &[String],
    config: &CrawlConfig,
) -> Result<Vec<Widget>, DriverError> {
    let mut widgets = Vec::new();
    for text in texts {
        let Some(node) = tolerate(driver.find_by_text(text))?.flatten() else {
            continue;
        };
        if let Some(mut widget) = admit(driver, node, config)? {
            widget.label = text.clone();
            widgets.push(widget);
        }
    }
    Ok(widgets)
}
