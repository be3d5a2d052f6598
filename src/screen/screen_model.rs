use serde::Serialize;

use crate::driver::action_driver::{NodeId, ScreenIdentity};
use crate::screen::fingerprint::Fingerprint;

// ============================================================================
// Widget
// ============================================================================

/// One interactable element discovered on a screen.
///
/// Immutable apart from `finished`, which only ever goes false -> true.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Widget {
    pub node: NodeId,
    pub class_name: String,
    /// Content description, falling back to text
    pub label: String,
    finished: bool,
}

impl Widget {
    pub fn new(node: NodeId, class_name: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            node,
            class_name: class_name.into(),
            label: label.into(),
            finished: false,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn finish(&mut self) {
        self.finished = true;
    }

    /// Text fields are recognised by class name alone.
    pub fn is_text_input(&self) -> bool {
        self.class_name.ends_with("EditText")
    }
}

// ============================================================================
// Screen
// ============================================================================

/// Index of a [`Screen`] inside its [`ScreenTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ScreenId(pub usize);

/// A canonicalized UI state reached during exploration.
///
/// Parent/child links are arena indices. Two screens are the same state iff
/// their signatures are equal.
#[derive(Debug, Clone, Serialize)]
pub struct Screen {
    pub id: ScreenId,
    pub signature: String,
    pub package: String,
    pub activity: String,
    pub depth: usize,
    pub widgets: Vec<Widget>,
    pub children: Vec<ScreenId>,
    pub parent: Option<ScreenId>,
    /// Widget in the parent that led here; `None` for the root or a back press
    pub parent_widget: Option<usize>,
    finished: bool,
}

impl Screen {
    /// Short stable name for logs and screenshot files.
    pub fn digest(&self) -> String {
        signature_digest(&self.signature)
    }

    /// Cached completion flag. See [`ScreenTree::is_finished`] for the
    /// aggregated view.
    pub fn finished(&self) -> bool {
        self.finished
    }

    /// First widget, in index order, that has not been attempted.
    pub fn next_unfinished_widget(&self) -> Option<usize> {
        self.widgets.iter().position(|w| !w.is_finished())
    }

    pub fn unfinished_widgets(&self) -> Vec<usize> {
        self.widgets
            .iter()
            .enumerate()
            .filter(|(_, w)| !w.is_finished())
            .map(|(i, _)| i)
            .collect()
    }
}

/// sha1 hex digest of a signature.
pub fn signature_digest(signature: &str) -> String {
    use sha1::{Digest, Sha1};

    let mut hasher = Sha1::new();
    hasher.update(signature.as_bytes());
    format!("{:x}", hasher.finalize())
}

// ============================================================================
// ScreenTree: arena owning every screen of one crawl
// ============================================================================

#[derive(Debug, Clone, Default, Serialize)]
pub struct ScreenTree {
    screens: Vec<Screen>,
}

impl ScreenTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.screens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.screens.is_empty()
    }

    pub fn get(&self, id: ScreenId) -> &Screen {
        &self.screens[id.0]
    }

    pub fn root(&self) -> Option<&Screen> {
        self.screens.first()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Screen> {
        self.screens.iter()
    }

    /// Add a depth-0 screen.
    pub fn add_root(&mut self, fingerprint: Fingerprint, identity: ScreenIdentity) -> ScreenId {
        self.insert(None, None, fingerprint, identity)
    }

    /// Add a screen reached from `parent`, optionally through one of its widgets.
    pub fn add_child(
        &mut self,
        parent: ScreenId,
        via_widget: Option<usize>,
        fingerprint: Fingerprint,
        identity: ScreenIdentity,
    ) -> ScreenId {
        let id = self.insert(Some(parent), via_widget, fingerprint, identity);
        self.screens[parent.0].children.push(id);
        id
    }

    fn insert(
        &mut self,
        parent: Option<ScreenId>,
        parent_widget: Option<usize>,
        fingerprint: Fingerprint,
        identity: ScreenIdentity,
    ) -> ScreenId {
        let id = ScreenId(self.screens.len());
        let depth = parent.map(|p| self.screens[p.0].depth + 1).unwrap_or(0);
        let finished = fingerprint.widgets.is_empty();

        self.screens.push(Screen {
            id,
            signature: fingerprint.signature,
            package: identity.package,
            activity: identity.activity,
            depth,
            widgets: fingerprint.widgets,
            children: Vec::new(),
            parent,
            parent_widget,
            finished,
        });
        id
    }

    pub fn finish_widget(&mut self, id: ScreenId, widget: usize) {
        if let Some(w) = self.screens[id.0].widgets.get_mut(widget) {
            w.finish();
        }
    }

    /// Retire a screen without exploring it: every widget counts as done.
    pub fn mark_finished(&mut self, id: ScreenId) {
        let screen = &mut self.screens[id.0];
        screen.finished = true;
        for widget in &mut screen.widgets {
            widget.finish();
        }
    }

    /// True iff every widget and every child screen is finished.
    ///
    /// The result is cached once true, so completion never reverts.
    pub fn is_finished(&mut self, id: ScreenId) -> bool {
        if self.screens[id.0].finished {
            return true;
        }
        if self.screens[id.0].widgets.iter().any(|w| !w.is_finished()) {
            return false;
        }
        let children = self.screens[id.0].children.clone();
        for child in children {
            if !self.is_finished(child) {
                return false;
            }
        }
        self.screens[id.0].finished = true;
        true
    }

    /// Path of screen ids from the root down to `id`.
    pub fn path_to(&self, id: ScreenId) -> Vec<ScreenId> {
        let mut path = vec![id];
        let mut cursor = self.screens[id.0].parent;
        while let Some(parent) = cursor {
            path.push(parent);
            cursor = self.screens[parent.0].parent;
        }
        path.reverse();
        path
    }
}
