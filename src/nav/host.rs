//! Capability interface onto host-owned state.
//!
//! The navigation layer never owns the tree or the workspace. Everything it
//! reads or changes goes through [`TreeHost`], which the terminal host in
//! `ui::app` implements and the tests fake in memory.

use std::path::{Path, PathBuf};

use super::error::Result;
use super::help::HelpOverlay;

/// Identity of a tree node: its vault-relative path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(PathBuf);

impl NodeId {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    pub fn path(&self) -> &Path {
        &self.0
    }
}

/// File or folder. Folders carry their collapsed flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    File { extension: String },
    Folder { collapsed: bool },
}

/// Read-only snapshot of one node, valid for the current dispatch only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeNode {
    pub id: NodeId,
    /// `None` for root children: their parent is the synthetic root.
    pub parent: Option<NodeId>,
    pub kind: NodeKind,
}

impl TreeNode {
    pub fn is_file(&self) -> bool {
        matches!(self.kind, NodeKind::File { .. })
    }

    pub fn is_expanded_folder(&self) -> bool {
        matches!(self.kind, NodeKind::Folder { collapsed: false })
    }

    pub fn extension(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::File { extension } if !extension.is_empty() => Some(extension),
            _ => None,
        }
    }

    /// Folder containing this entry (the vault root is the empty path).
    pub fn parent_folder(&self) -> PathBuf {
        self.id.path().parent().map(Path::to_path_buf).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewType {
    FileExplorer,
    Editor,
    Other,
}

/// What currently holds text focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActiveElement {
    None,
    /// A tree row in inline-rename mode.
    Renaming,
    Input,
    ContentEditable,
    Other,
}

impl ActiveElement {
    pub fn accepts_text(&self) -> bool {
        matches!(self, ActiveElement::Renaming | ActiveElement::Input | ActiveElement::ContentEditable)
    }
}

/// Everything the gatekeeper inspects, captured at event time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AmbientState {
    pub active_view: Option<ViewType>,
    pub active_element: ActiveElement,
    pub modal_open: bool,
}

/// Synthetic key delivered to the tree's own handlers or to the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NativeKey {
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
    Escape,
    Delete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitDirection {
    Vertical,
    Horizontal,
}

/// Where a freshly created leaf goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeafPlacement {
    Split(SplitDirection),
    Tab,
    Window,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Folder,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LeafId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TabGroupId(pub u64);

/// A tab group as seen from one of its leaves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabGroupInfo {
    pub id: TabGroupId,
    pub leaves: Vec<LeafId>,
    /// Index of the foreground tab.
    pub current: usize,
}

pub trait TreeHost {
    // ── ambient ──
    fn ambient_state(&self) -> AmbientState;
    fn active_view_type(&self) -> Option<ViewType> {
        self.ambient_state().active_view
    }
    fn is_context_menu_open(&self) -> bool;
    fn is_preview_open(&self) -> bool;

    // ── tree ──
    fn focused_node(&self) -> Option<NodeId>;
    fn set_focused_node(&mut self, node: Option<NodeId>);
    fn node(&self, id: &NodeId) -> Option<TreeNode>;
    /// Ordered children of a folder, or root children for `None`.
    fn children(&self, parent: Option<&NodeId>) -> Vec<NodeId>;
    fn set_collapsed(&mut self, id: &NodeId, collapsed: bool);
    fn collapse_all(&mut self);

    // ── selection ──
    fn selected_nodes(&self) -> Vec<NodeId>;
    fn is_selected(&self, id: &NodeId) -> bool {
        self.selected_nodes().contains(id)
    }
    fn select_node(&mut self, id: &NodeId);
    fn deselect_node(&mut self, id: &NodeId);
    fn clear_selection(&mut self);

    // ── native handlers ──
    /// Synthetic key handed straight to the tree's handler.
    fn send_tree_key(&mut self, key: NativeKey);
    /// Synthetic key dispatched at document level (menus, delete command).
    fn send_document_key(&mut self, key: NativeKey);
    fn begin_rename(&mut self);
    fn open_context_menu(&mut self, id: &NodeId);

    // ── storage ──
    fn create_entry(&mut self, kind: EntryKind, folder: &Path) -> Result<()>;
    /// First unused path built from `base` and optional `extension`.
    fn available_path(&self, base: &Path, extension: Option<&str>) -> PathBuf;
    fn copy_entry(&mut self, source: &Path, dest: &Path) -> Result<()>;

    // ── workspace ──
    fn most_recent_leaf(&self) -> Option<LeafId>;
    /// Create a leaf and make it active.
    fn new_leaf(&mut self, placement: LeafPlacement) -> Result<LeafId>;
    /// Split next to `existing` without moving focus.
    fn split_leaf(&mut self, existing: LeafId, direction: SplitDirection) -> Result<LeafId>;
    /// Append a new leaf to the end of a tab group.
    fn insert_leaf(&mut self, group: TabGroupId) -> Result<LeafId>;
    fn open_file(&mut self, leaf: LeafId, path: &Path) -> Result<()>;
    fn set_active_leaf(&mut self, leaf: LeafId, focus: bool);
    fn editor_leaves(&self) -> Vec<LeafId>;
    fn leaf_file(&self, leaf: LeafId) -> Option<PathBuf>;
    fn tab_group(&self, leaf: LeafId) -> Option<TabGroupInfo>;
    fn select_tab(&mut self, leaf: LeafId);
    fn set_tab_highlight(&mut self, leaf: LeafId, on: bool);

    // ── popups ──
    fn show_preview(&mut self, id: &NodeId);
    fn hide_preview(&mut self, id: &NodeId);
    fn is_help_overlay_visible(&self) -> bool;
    fn show_help_overlay(&mut self, overlay: HelpOverlay);
    fn hide_help_overlay(&mut self);
}
