use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::error::DriverError;

// ============================================================================
// Driver value types
// ============================================================================

/// Opaque handle to one UI node, minted by the driver.
///
/// Handles are only meaningful to the driver that issued them and may go
/// stale at any time (the node vanishes, the screen changes).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(pub u64);

/// On-screen rectangle in device pixels.
///
/// Textual form is the uiautomator notation `[left,top][right,bottom]`,
/// which is also how deny-listed rectangles are written in config.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Bounds {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Bounds {
    pub fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }
}

impl fmt::Display for Bounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{},{}][{},{}]",
            self.left, self.top, self.right, self.bottom
        )
    }
}

impl FromStr for Bounds {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let inner = trimmed
            .strip_prefix('[')
            .and_then(|rest| rest.strip_suffix(']'))
            .ok_or_else(|| format!("bounds '{}' must look like [l,t][r,b]", s))?;

        let (first, second) = inner
            .split_once("][")
            .ok_or_else(|| format!("bounds '{}' must contain two points", s))?;

        let point = |p: &str| -> Result<(i32, i32), String> {
            let (x, y) = p
                .split_once(',')
                .ok_or_else(|| format!("point '{}' in bounds '{}' has no comma", p, s))?;
            let x = x
                .trim()
                .parse::<i32>()
                .map_err(|e| format!("bad x '{}' in bounds '{}': {}", x, s, e))?;
            let y = y
                .trim()
                .parse::<i32>()
                .map_err(|e| format!("bad y '{}' in bounds '{}': {}", y, s, e))?;
            Ok((x, y))
        };

        let (left, top) = point(first)?;
        let (right, bottom) = point(second)?;
        Ok(Bounds::new(left, top, right, bottom))
    }
}

/// What the device reports as being in the foreground.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScreenIdentity {
    pub package: String,
    pub activity: String,
}

impl ScreenIdentity {
    pub fn new(package: impl Into<String>, activity: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            activity: activity.into(),
        }
    }
}

/// The four process-wide wait/acknowledgment timeouts of the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Timeouts {
    pub idle: Duration,
    pub selector: Duration,
    pub action: Duration,
    pub scroll: Duration,
}

impl Timeouts {
    pub const ZERO: Timeouts = Timeouts {
        idle: Duration::ZERO,
        selector: Duration::ZERO,
        action: Duration::ZERO,
        scroll: Duration::ZERO,
    };
}

// ============================================================================
// ActionDriver trait: the only way the crawler touches a device
// ============================================================================

/// On-device UI inspection and automation capability.
///
/// Queries on a node that no longer exists fail with
/// [`DriverError::NotFound`]; the crawler tolerates that. A lost session
/// must surface as [`DriverError::Disconnected`].
pub trait ActionDriver {
    /// Bring `package` to the foreground and wait up to `timeout` for it.
    fn launch(&mut self, package: &str, timeout: Duration) -> Result<(), DriverError>;

    /// Root node of the current window, `None` if there is none.
    fn current_root(&mut self) -> Result<Option<NodeId>, DriverError>;

    /// Child at `index` of `node`, `None` once the index runs past the end.
    fn child(&mut self, node: NodeId, index: usize) -> Result<Option<NodeId>, DriverError>;

    /// Number of children, when the driver can answer cheaply.
    fn child_count(&mut self, _node: NodeId) -> Result<Option<usize>, DriverError> {
        Ok(None)
    }

    fn exists(&mut self, node: NodeId) -> Result<bool, DriverError>;

    fn class_name(&mut self, node: NodeId) -> Result<String, DriverError>;

    fn text(&mut self, node: NodeId) -> Result<String, DriverError>;

    fn content_description(&mut self, node: NodeId) -> Result<String, DriverError>;

    fn bounds(&mut self, node: NodeId) -> Result<Bounds, DriverError>;

    /// The `instance`-th clickable node on screen, in document order.
    fn clickable(&mut self, instance: usize) -> Result<Option<NodeId>, DriverError>;

    /// The `instance`-th scrollable container on screen, in document order.
    fn scrollable(&mut self, instance: usize) -> Result<Option<NodeId>, DriverError>;

    /// First node whose text equals `text`, scrolling it into reach if needed.
    fn find_by_text(&mut self, text: &str) -> Result<Option<NodeId>, DriverError>;

    fn tap(&mut self, node: NodeId) -> Result<(), DriverError>;

    /// Scroll forward once; `false` when the container could not move.
    fn scroll_forward(&mut self, container: NodeId) -> Result<bool, DriverError>;

    /// Fling back to the natural start position of the container.
    fn scroll_to_beginning(&mut self, container: NodeId) -> Result<(), DriverError>;

    fn enter_text(&mut self, node: NodeId, text: &str) -> Result<(), DriverError>;

    fn press_back(&mut self) -> Result<(), DriverError>;

    fn wait_for_idle(&mut self, timeout: Duration) -> Result<(), DriverError>;

    fn foreground(&mut self) -> Result<ScreenIdentity, DriverError>;

    fn screenshot(&mut self, path: &Path) -> Result<(), DriverError>;

    fn timeouts(&mut self) -> Result<Timeouts, DriverError>;

    fn set_timeouts(&mut self, timeouts: Timeouts) -> Result<(), DriverError>;
}
