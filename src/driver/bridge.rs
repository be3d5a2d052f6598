use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::action_driver::{ActionDriver, Bounds, NodeId, ScreenIdentity, Timeouts};
use super::error::DriverError;

/// Error string a bridge uses for a node that no longer exists.
pub const NOT_FOUND: &str = "not_found";

/// Request sent to the bridge over stdin (one JSON line).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum BridgeRequest {
    Launch { package: String, timeout_ms: u64 },
    Root,
    Child { node: u64, index: usize },
    ChildCount { node: u64 },
    Exists { node: u64 },
    ClassName { node: u64 },
    Text { node: u64 },
    Description { node: u64 },
    Bounds { node: u64 },
    Clickable { instance: usize },
    Scrollable { instance: usize },
    FindText { text: String },
    Tap { node: u64 },
    ScrollForward { node: u64 },
    ScrollToBeginning { node: u64 },
    EnterText { node: u64, text: String },
    Back,
    WaitIdle { timeout_ms: u64 },
    Foreground,
    Screenshot { path: String },
    GetTimeouts,
    SetTimeouts { timeouts: WireTimeouts },
    Quit,
}

impl BridgeRequest {
    /// Name used in error messages.
    pub fn name(&self) -> &'static str {
        match self {
            BridgeRequest::Launch { .. } => "launch",
            BridgeRequest::Root => "root",
            BridgeRequest::Child { .. } => "child",
            BridgeRequest::ChildCount { .. } => "child_count",
            BridgeRequest::Exists { .. } => "exists",
            BridgeRequest::ClassName { .. } => "class_name",
            BridgeRequest::Text { .. } => "text",
            BridgeRequest::Description { .. } => "description",
            BridgeRequest::Bounds { .. } => "bounds",
            BridgeRequest::Clickable { .. } => "clickable",
            BridgeRequest::Scrollable { .. } => "scrollable",
            BridgeRequest::FindText { .. } => "find_text",
            BridgeRequest::Tap { .. } => "tap",
            BridgeRequest::ScrollForward { .. } => "scroll_forward",
            BridgeRequest::ScrollToBeginning { .. } => "scroll_to_beginning",
            BridgeRequest::EnterText { .. } => "enter_text",
            BridgeRequest::Back => "back",
            BridgeRequest::WaitIdle { .. } => "wait_idle",
            BridgeRequest::Foreground => "foreground",
            BridgeRequest::Screenshot { .. } => "screenshot",
            BridgeRequest::GetTimeouts => "get_timeouts",
            BridgeRequest::SetTimeouts { .. } => "set_timeouts",
            BridgeRequest::Quit => "quit",
        }
    }
}

/// Timeouts as milliseconds on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireTimeouts {
    pub idle_ms: u64,
    pub selector_ms: u64,
    pub action_ms: u64,
    pub scroll_ms: u64,
}

impl From<Timeouts> for WireTimeouts {
    fn from(t: Timeouts) -> Self {
        Self {
            idle_ms: t.idle.as_millis() as u64,
            selector_ms: t.selector.as_millis() as u64,
            action_ms: t.action.as_millis() as u64,
            scroll_ms: t.scroll.as_millis() as u64,
        }
    }
}

impl From<WireTimeouts> for Timeouts {
    fn from(w: WireTimeouts) -> Self {
        Self {
            idle: Duration::from_millis(w.idle_ms),
            selector: Duration::from_millis(w.selector_ms),
            action: Duration::from_millis(w.action_ms),
            scroll: Duration::from_millis(w.scroll_ms),
        }
    }
}

/// Response received from the bridge over stdout (one JSON line).
#[derive(Debug, Default, Deserialize)]
pub struct BridgeResponse {
    pub ok: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub ready: Option<bool>,
    #[serde(default)]
    pub node: Option<u64>,
    #[serde(default)]
    pub count: Option<usize>,
    #[serde(default)]
    pub exists: Option<bool>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub bounds: Option<Bounds>,
    #[serde(default)]
    pub moved: Option<bool>,
    #[serde(default)]
    pub package: Option<String>,
    #[serde(default)]
    pub activity: Option<String>,
    #[serde(default)]
    pub timeouts: Option<WireTimeouts>,
}

impl BridgeResponse {
    /// Turn an `ok: false` response into the matching [`DriverError`].
    pub fn check(self, command: &str) -> Result<Self, DriverError> {
        if self.ok {
            return Ok(self);
        }
        match self.error.as_deref() {
            Some(NOT_FOUND) => Err(DriverError::NotFound),
            Some(error) => Err(DriverError::Protocol {
                command: command.into(),
                error: error.into(),
            }),
            None => Err(DriverError::Protocol {
                command: command.into(),
                error: "Unknown error".into(),
            }),
        }
    }

    fn require_text(self, command: &str) -> Result<String, DriverError> {
        self.text.ok_or_else(|| DriverError::Protocol {
            command: command.into(),
            error: "No text in response".into(),
        })
    }
}

/// Driver backed by a long-lived helper process on the device side.
///
/// Commands are NDJSON over stdin, responses NDJSON over stdout. Any pipe
/// failure means the session is gone and is reported as
/// [`DriverError::Disconnected`].
pub struct BridgeDriver {
    child: Child,
    stdin: ChildStdin,
    reader: BufReader<ChildStdout>,
    closed: bool,
}

impl BridgeDriver {
    /// Spawn `program args...` and wait for its `{"ok":true,"ready":true}` line.
    pub fn launch_process(program: &str, args: &[String]) -> Result<Self, DriverError> {
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| DriverError::Disconnected(format!("failed to spawn {}: {}", program, e)))?;

        let stdin = child.stdin.take().ok_or_else(|| {
            DriverError::Disconnected(format!("failed to capture stdin of {}", program))
        })?;
        let stdout = child.stdout.take().ok_or_else(|| {
            DriverError::Disconnected(format!("failed to capture stdout of {}", program))
        })?;

        let mut driver = BridgeDriver {
            child,
            stdin,
            reader: BufReader::new(stdout),
            closed: false,
        };

        let ready = driver.read_response()?;
        if !ready.ok || ready.ready != Some(true) {
            return Err(DriverError::Protocol {
                command: "launch".into(),
                error: format!("{} did not send a ready signal", program),
            });
        }

        tracing::info!(program, "bridge ready");
        Ok(driver)
    }

    fn read_response(&mut self) -> Result<BridgeResponse, DriverError> {
        let mut line = String::new();
        self.reader
            .read_line(&mut line)
            .map_err(|e| DriverError::Disconnected(format!("failed to read from bridge: {}", e)))?;

        if line.trim().is_empty() {
            return Err(DriverError::Disconnected(
                "empty response from bridge (process may have died)".into(),
            ));
        }

        serde_json::from_str(line.trim()).map_err(|e| DriverError::Json {
            context: "bridge response".into(),
            source: e,
        })
    }

    fn send(&mut self, request: &BridgeRequest) -> Result<BridgeResponse, DriverError> {
        if self.closed {
            return Err(DriverError::Disconnected("bridge already closed".into()));
        }

        let json = serde_json::to_string(request).map_err(|e| DriverError::Json {
            context: "bridge request".into(),
            source: e,
        })?;

        writeln!(self.stdin, "{}", json)
            .and_then(|_| self.stdin.flush())
            .map_err(|e| DriverError::Disconnected(format!("failed to write to bridge: {}", e)))?;

        self.read_response()?.check(request.name())
    }

    fn send_node(&mut self, request: BridgeRequest) -> Result<Option<NodeId>, DriverError> {
        Ok(self.send(&request)?.node.map(NodeId))
    }

    /// Ask the bridge to exit and reap it. Best-effort.
    pub fn quit(&mut self) {
        if self.closed {
            return;
        }
        let _ = self.send(&BridgeRequest::Quit);
        self.closed = true;
        let _ = self.child.wait();
    }
}

impl Drop for BridgeDriver {
    fn drop(&mut self) {
        self.quit();
    }
}

impl ActionDriver for BridgeDriver {
    fn launch(&mut self, package: &str, timeout: Duration) -> Result<(), DriverError> {
        self.send(&BridgeRequest::Launch {
            package: package.into(),
            timeout_ms: timeout.as_millis() as u64,
        })?;
        Ok(())
    }

    fn current_root(&mut self) -> Result<Option<NodeId>, DriverError> {
        self.send_node(BridgeRequest::Root)
    }

    fn child(&mut self, node: NodeId, index: usize) -> Result<Option<NodeId>, DriverError> {
        self.send_node(BridgeRequest::Child {
            node: node.0,
            index,
        })
    }

    fn child_count(&mut self, node: NodeId) -> Result<Option<usize>, DriverError> {
        Ok(self.send(&BridgeRequest::ChildCount { node: node.0 })?.count)
    }

    fn exists(&mut self, node: NodeId) -> Result<bool, DriverError> {
        let response = self.send(&BridgeRequest::Exists { node: node.0 })?;
        Ok(response.exists.unwrap_or(false))
    }

    fn class_name(&mut self, node: NodeId) -> Result<String, DriverError> {
        self.send(&BridgeRequest::ClassName { node: node.0 })?
            .require_text("class_name")
    }

    fn text(&mut self, node: NodeId) -> Result<String, DriverError> {
        Ok(self
            .send(&BridgeRequest::Text { node: node.0 })?
            .text
            .unwrap_or_default())
    }

    fn content_description(&mut self, node: NodeId) -> Result<String, DriverError> {
        Ok(self
            .send(&BridgeRequest::Description { node: node.0 })?
            .text
            .unwrap_or_default())
    }

    fn bounds(&mut self, node: NodeId) -> Result<Bounds, DriverError> {
        self.send(&BridgeRequest::Bounds { node: node.0 })?
            .bounds
            .ok_or_else(|| DriverError::Protocol {
                command: "bounds".into(),
                error: "No bounds in response".into(),
            })
    }

    fn clickable(&mut self, instance: usize) -> Result<Option<NodeId>, DriverError> {
        self.send_node(BridgeRequest::Clickable { instance })
    }

    fn scrollable(&mut self, instance: usize) -> Result<Option<NodeId>, DriverError> {
        self.send_node(BridgeRequest::Scrollable { instance })
    }

    fn find_by_text(&mut self, text: &str) -> Result<Option<NodeId>, DriverError> {
        self.send_node(BridgeRequest::FindText { text: text.into() })
    }

    fn tap(&mut self, node: NodeId) -> Result<(), DriverError> {
        self.send(&BridgeRequest::Tap { node: node.0 })?;
        Ok(())
    }

    fn scroll_forward(&mut self, container: NodeId) -> Result<bool, DriverError> {
        let response = self.send(&BridgeRequest::ScrollForward { node: container.0 })?;
        Ok(response.moved.unwrap_or(false))
    }

    fn scroll_to_beginning(&mut self, container: NodeId) -> Result<(), DriverError> {
        self.send(&BridgeRequest::ScrollToBeginning { node: container.0 })?;
        Ok(())
    }

    fn enter_text(&mut self, node: NodeId, text: &str) -> Result<(), DriverError> {
        self.send(&BridgeRequest::EnterText {
            node: node.0,
            text: text.into(),
        })?;
        Ok(())
    }

    fn press_back(&mut self) -> Result<(), DriverError> {
        self.send(&BridgeRequest::Back)?;
        Ok(())
    }

    fn wait_for_idle(&mut self, timeout: Duration) -> Result<(), DriverError> {
        self.send(&BridgeRequest::WaitIdle {
            timeout_ms: timeout.as_millis() as u64,
        })?;
        Ok(())
    }

    fn foreground(&mut self) -> Result<ScreenIdentity, DriverError> {
        let response = self.send(&BridgeRequest::Foreground)?;
        Ok(ScreenIdentity {
            package: response.package.unwrap_or_default(),
            activity: response.activity.unwrap_or_default(),
        })
    }

    /// The bridge writes the image itself; the directory is prepared here.
    fn screenshot(&mut self, path: &Path) -> Result<(), DriverError> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir).map_err(|e| {
                DriverError::Io(format!("cannot create {}: {}", dir.display(), e))
            })?;
        }
        self.send(&BridgeRequest::Screenshot {
            path: path.display().to_string(),
        })?;
        Ok(())
    }

    fn timeouts(&mut self) -> Result<Timeouts, DriverError> {
        self.send(&BridgeRequest::GetTimeouts)?
            .timeouts
            .map(Timeouts::from)
            .ok_or_else(|| DriverError::Protocol {
                command: "get_timeouts".into(),
                error: "No timeouts in response".into(),
            })
    }

    fn set_timeouts(&mut self, timeouts: Timeouts) -> Result<(), DriverError> {
        self.send(&BridgeRequest::SetTimeouts {
            timeouts: timeouts.into(),
        })?;
        Ok(())
    }
}
