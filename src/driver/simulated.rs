use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::action_driver::{ActionDriver, Bounds, NodeId, ScreenIdentity, Timeouts};
use super::error::DriverError;

/// `on_tap` target that behaves like the system back key.
pub const BACK_TARGET: &str = "@back";

// ============================================================================
// App model (YAML)
// ============================================================================

/// A scripted application: named screens and the navigation between them.
///
/// ```yaml
/// package: com.example.notes
/// start: home
/// screens:
///   home:
///     activity: .MainActivity
///     root:
///       class: android.widget.FrameLayout
///       children:
///         - class: android.widget.Button
///           description: Settings
///           clickable: true
///           on_tap: settings
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppModel {
    pub package: String,
    pub start: String,
    pub screens: BTreeMap<String, ScreenModel>,
}

impl AppModel {
    pub fn from_yaml(content: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(content)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreenModel {
    /// Overrides the app package (e.g. a system dialog)
    #[serde(default)]
    pub package: Option<String>,

    #[serde(default)]
    pub activity: String,

    /// `None` models a window with no inspectable root
    #[serde(default)]
    pub root: Option<NodeModel>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeModel {
    pub class: String,

    #[serde(default)]
    pub text: String,

    #[serde(default)]
    pub description: String,

    /// `[l,t][r,b]`; unparsable or missing bounds read as all zeros
    #[serde(default)]
    pub bounds: Option<String>,

    #[serde(default)]
    pub clickable: bool,

    #[serde(default)]
    pub scrollable: bool,

    /// Scrollable containers show this many children at a time
    #[serde(default)]
    pub page_size: Option<usize>,

    /// Screen name to navigate to, or `@back`
    #[serde(default)]
    pub on_tap: Option<String>,

    /// Every query on this node fails with NotFound
    #[serde(default)]
    pub detached: bool,

    /// Enumerable and queryable, but tapping it fails with NotFound
    #[serde(default)]
    pub vanishes_on_tap: bool,

    #[serde(default)]
    pub children: Vec<NodeModel>,
}

impl NodeModel {
    fn label(&self) -> String {
        if !self.description.is_empty() {
            self.description.clone()
        } else if !self.text.is_empty() {
            self.text.clone()
        } else {
            self.class.clone()
        }
    }
}

// ============================================================================
// Action log
// ============================================================================

/// Everything the simulated device was asked to do, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimAction {
    Launch(String),
    Tap { screen: String, label: String },
    EnterText { screen: String, label: String, text: String },
    ScrollForward { screen: String },
    ScrollToBeginning { screen: String },
    Back,
    Screenshot(PathBuf),
}

// ============================================================================
// SimulatedDriver
// ============================================================================

type NodeKey = (String, Vec<usize>);

/// In-memory [`ActionDriver`] that executes an [`AppModel`].
///
/// Node handles are interned per `(screen, path)` so the same node keeps
/// the same [`NodeId`] across queries. A handle whose screen is not in the
/// foreground is stale and reports `NotFound`.
pub struct SimulatedDriver {
    model: AppModel,
    current: String,
    back_stack: Vec<String>,
    scroll_offsets: HashMap<NodeKey, usize>,
    handles: Vec<NodeKey>,
    handle_index: HashMap<NodeKey, u64>,
    timeouts: Timeouts,
    timeout_history: Vec<Timeouts>,
    actions: Vec<SimAction>,
    taps: usize,
    disconnect_after_taps: Option<usize>,
    timeout_read_failures: usize,
}

impl SimulatedDriver {
    pub fn new(model: AppModel) -> Self {
        let current = model.start.clone();
        Self {
            model,
            current,
            back_stack: Vec::new(),
            scroll_offsets: HashMap::new(),
            handles: Vec::new(),
            handle_index: HashMap::new(),
            timeouts: Timeouts {
                idle: Duration::from_millis(100),
                selector: Duration::from_millis(100),
                action: Duration::from_millis(200),
                scroll: Duration::from_millis(100),
            },
            timeout_history: Vec::new(),
            actions: Vec::new(),
            taps: 0,
            disconnect_after_taps: None,
            timeout_read_failures: 0,
        }
    }

    pub fn from_yaml(content: &str) -> Result<Self, serde_yaml::Error> {
        Ok(Self::new(AppModel::from_yaml(content)?))
    }

    /// After `taps` successful taps every UI call fails with `Disconnected`.
    /// Timeout configuration stays reachable.
    pub fn disconnect_after_taps(mut self, taps: usize) -> Self {
        self.disconnect_after_taps = Some(taps);
        self
    }

    /// The next `times` reads of the timeouts fail with a protocol error,
    /// the way a busy device answers `get_timeouts`.
    pub fn fail_timeout_reads(mut self, times: usize) -> Self {
        self.timeout_read_failures = times;
        self
    }

    pub fn current_screen(&self) -> &str {
        &self.current
    }

    pub fn actions(&self) -> &[SimAction] {
        &self.actions
    }

    /// Number of taps that reached the device.
    pub fn tap_count(&self) -> usize {
        self.actions
            .iter()
            .filter(|a| matches!(a, SimAction::Tap { .. }))
            .count()
    }

    /// Every value passed to `set_timeouts`, in order.
    pub fn timeout_history(&self) -> &[Timeouts] {
        &self.timeout_history
    }

    fn check_connected(&self) -> Result<(), DriverError> {
        match self.disconnect_after_taps {
            Some(limit) if self.taps >= limit => Err(DriverError::Disconnected(
                "simulated device went away".into(),
            )),
            _ => Ok(()),
        }
    }

    fn screen(&self, name: &str) -> Option<&ScreenModel> {
        self.model.screens.get(name)
    }

    fn intern(&mut self, key: NodeKey) -> NodeId {
        if let Some(id) = self.handle_index.get(&key) {
            return NodeId(*id);
        }
        let id = self.handles.len() as u64;
        self.handles.push(key.clone());
        self.handle_index.insert(key, id);
        NodeId(id)
    }

    fn model_at<'m>(root: &'m NodeModel, path: &[usize]) -> Option<&'m NodeModel> {
        let mut node = root;
        for &i in path {
            node = node.children.get(i)?;
        }
        Some(node)
    }

    /// Resolve a handle to its key and model node, if it is in the foreground.
    fn resolve(&self, id: NodeId) -> Result<(&NodeKey, &NodeModel), DriverError> {
        self.check_connected()?;
        let key = self
            .handles
            .get(id.0 as usize)
            .ok_or(DriverError::NotFound)?;
        if key.0 != self.current {
            return Err(DriverError::NotFound);
        }
        let root = self
            .screen(&key.0)
            .and_then(|s| s.root.as_ref())
            .ok_or(DriverError::NotFound)?;
        let node = Self::model_at(root, &key.1).ok_or(DriverError::NotFound)?;
        if node.detached {
            return Err(DriverError::NotFound);
        }
        Ok((key, node))
    }

    /// Absolute child indices currently visible under `node`.
    fn visible_range(&self, key: &NodeKey, node: &NodeModel) -> std::ops::Range<usize> {
        let len = node.children.len();
        match (node.scrollable, node.page_size) {
            (true, Some(page)) if page > 0 => {
                let offset = self.scroll_offsets.get(key).copied().unwrap_or(0).min(len);
                offset..(offset + page).min(len)
            }
            _ => 0..len,
        }
    }

    /// Preorder walk over the visible tree of the current screen.
    fn visible_nodes(&self) -> Vec<(Vec<usize>, &NodeModel)> {
        let mut out = Vec::new();
        let Some(root) = self.screen(&self.current).and_then(|s| s.root.as_ref()) else {
            return out;
        };
        let mut stack = vec![(Vec::new(), root)];
        while let Some((path, node)) = stack.pop() {
            let key = (self.current.clone(), path.clone());
            let range = self.visible_range(&key, node);
            for i in range.rev() {
                let mut child_path = path.clone();
                child_path.push(i);
                stack.push((child_path, &node.children[i]));
            }
            out.push((path, node));
        }
        out
    }

    /// Preorder walk over every node of the current screen, hidden rows included.
    fn all_nodes(&self) -> Vec<(Vec<usize>, &NodeModel)> {
        let mut out = Vec::new();
        let Some(root) = self.screen(&self.current).and_then(|s| s.root.as_ref()) else {
            return out;
        };
        let mut stack = vec![(Vec::new(), root)];
        while let Some((path, node)) = stack.pop() {
            for i in (0..node.children.len()).rev() {
                let mut child_path = path.clone();
                child_path.push(i);
                stack.push((child_path, &node.children[i]));
            }
            out.push((path, node));
        }
        out
    }

    fn nth_visible<F>(&mut self, instance: usize, filter: F) -> Result<Option<NodeId>, DriverError>
    where
        F: Fn(&NodeModel) -> bool,
    {
        self.check_connected()?;
        let path = self
            .visible_nodes()
            .into_iter()
            .filter(|(_, n)| filter(n))
            .nth(instance)
            .map(|(p, _)| p);
        Ok(path.map(|p| {
            let key = (self.current.clone(), p);
            self.intern(key)
        }))
    }

    fn navigate(&mut self, target: &str) -> Result<(), DriverError> {
        if target == BACK_TARGET {
            self.go_back();
            return Ok(());
        }
        if !self.model.screens.contains_key(target) {
            return Err(DriverError::Protocol {
                command: "tap".into(),
                error: format!("model has no screen named '{}'", target),
            });
        }
        let previous = std::mem::replace(&mut self.current, target.to_string());
        self.back_stack.push(previous);
        Ok(())
    }

    fn go_back(&mut self) {
        if let Some(previous) = self.back_stack.pop() {
            self.current = previous;
        }
    }
}

impl ActionDriver for SimulatedDriver {
    fn launch(&mut self, package: &str, _timeout: Duration) -> Result<(), DriverError> {
        self.check_connected()?;
        if !package.is_empty() && package != self.model.package {
            return Err(DriverError::Protocol {
                command: "launch".into(),
                error: format!("package '{}' is not installed", package),
            });
        }
        self.current = self.model.start.clone();
        self.back_stack.clear();
        self.scroll_offsets.clear();
        self.actions.push(SimAction::Launch(package.to_string()));
        Ok(())
    }

    fn current_root(&mut self) -> Result<Option<NodeId>, DriverError> {
        self.check_connected()?;
        let has_root = self
            .screen(&self.current)
            .map(|s| s.root.is_some())
            .unwrap_or(false);
        if !has_root {
            return Ok(None);
        }
        let key = (self.current.clone(), Vec::new());
        Ok(Some(self.intern(key)))
    }

    fn child(&mut self, node: NodeId, index: usize) -> Result<Option<NodeId>, DriverError> {
        let (key, model) = self.resolve(node)?;
        let range = self.visible_range(key, model);
        let absolute = range.start + index;
        if absolute >= range.end {
            return Ok(None);
        }
        let mut path = key.1.clone();
        path.push(absolute);
        let child_key = (key.0.clone(), path);
        Ok(Some(self.intern(child_key)))
    }

    fn child_count(&mut self, node: NodeId) -> Result<Option<usize>, DriverError> {
        let (key, model) = self.resolve(node)?;
        Ok(Some(self.visible_range(key, model).len()))
    }

    fn exists(&mut self, node: NodeId) -> Result<bool, DriverError> {
        match self.resolve(node) {
            Ok(_) => Ok(true),
            Err(DriverError::NotFound) => Ok(false),
            Err(e) => Err(e),
        }
    }

    fn class_name(&mut self, node: NodeId) -> Result<String, DriverError> {
        Ok(self.resolve(node)?.1.class.clone())
    }

    fn text(&mut self, node: NodeId) -> Result<String, DriverError> {
        Ok(self.resolve(node)?.1.text.clone())
    }

    fn content_description(&mut self, node: NodeId) -> Result<String, DriverError> {
        Ok(self.resolve(node)?.1.description.clone())
    }

    fn bounds(&mut self, node: NodeId) -> Result<Bounds, DriverError> {
        let (_, model) = self.resolve(node)?;
        Ok(model
            .bounds
            .as_deref()
            .and_then(|b| b.parse().ok())
            .unwrap_or_default())
    }

    fn clickable(&mut self, instance: usize) -> Result<Option<NodeId>, DriverError> {
        self.nth_visible(instance, |n| n.clickable)
    }

    fn scrollable(&mut self, instance: usize) -> Result<Option<NodeId>, DriverError> {
        self.nth_visible(instance, |n| n.scrollable)
    }

    fn find_by_text(&mut self, text: &str) -> Result<Option<NodeId>, DriverError> {
        self.check_connected()?;
        let path = self
            .all_nodes()
            .into_iter()
            .find(|(_, n)| n.text == text)
            .map(|(p, _)| p);
        Ok(path.map(|p| {
            let key = (self.current.clone(), p);
            self.intern(key)
        }))
    }

    fn tap(&mut self, node: NodeId) -> Result<(), DriverError> {
        let (key, model) = self.resolve(node)?;
        if model.vanishes_on_tap {
            return Err(DriverError::NotFound);
        }
        let screen = key.0.clone();
        let label = model.label();
        let target = model.on_tap.clone();

        self.taps += 1;
        self.actions.push(SimAction::Tap { screen, label });
        match target {
            Some(target) => self.navigate(&target),
            None => Ok(()),
        }
    }

    fn scroll_forward(&mut self, container: NodeId) -> Result<bool, DriverError> {
        let (key, model) = self.resolve(container)?;
        let key = key.clone();
        let len = model.children.len();
        let page = match (model.scrollable, model.page_size) {
            (true, Some(page)) if page > 0 => page,
            _ => return Ok(false),
        };

        self.actions.push(SimAction::ScrollForward {
            screen: key.0.clone(),
        });
        let last_offset = len.saturating_sub(page);
        let offset = self.scroll_offsets.entry(key).or_insert(0);
        let next = (*offset + page).min(last_offset);
        let moved = next != *offset;
        *offset = next;
        Ok(moved)
    }

    fn scroll_to_beginning(&mut self, container: NodeId) -> Result<(), DriverError> {
        let (key, _) = self.resolve(container)?;
        let key = key.clone();
        self.actions.push(SimAction::ScrollToBeginning {
            screen: key.0.clone(),
        });
        self.scroll_offsets.remove(&key);
        Ok(())
    }

    fn enter_text(&mut self, node: NodeId, text: &str) -> Result<(), DriverError> {
        let (key, model) = self.resolve(node)?;
        let action = SimAction::EnterText {
            screen: key.0.clone(),
            label: model.label(),
            text: text.to_string(),
        };
        self.actions.push(action);
        Ok(())
    }

    fn press_back(&mut self) -> Result<(), DriverError> {
        self.check_connected()?;
        self.actions.push(SimAction::Back);
        self.go_back();
        Ok(())
    }

    fn wait_for_idle(&mut self, _timeout: Duration) -> Result<(), DriverError> {
        self.check_connected()
    }

    fn foreground(&mut self) -> Result<ScreenIdentity, DriverError> {
        self.check_connected()?;
        let (package, activity) = match self.screen(&self.current) {
            Some(screen) => (
                screen
                    .package
                    .clone()
                    .unwrap_or_else(|| self.model.package.clone()),
                screen.activity.clone(),
            ),
            None => (self.model.package.clone(), String::new()),
        };
        Ok(ScreenIdentity { package, activity })
    }

    fn screenshot(&mut self, path: &Path) -> Result<(), DriverError> {
        self.check_connected()?;
        self.actions.push(SimAction::Screenshot(path.to_path_buf()));
        Ok(())
    }

    fn timeouts(&mut self) -> Result<Timeouts, DriverError> {
        if self.timeout_read_failures > 0 {
            self.timeout_read_failures -= 1;
            return Err(DriverError::Protocol {
                command: "get_timeouts".into(),
                error: "busy".into(),
            });
        }
        Ok(self.timeouts)
    }

    fn set_timeouts(&mut self, timeouts: Timeouts) -> Result<(), DriverError> {
        self.timeouts = timeouts;
        self.timeout_history.push(timeouts);
        Ok(())
    }
}
