//! In-memory host used by the navigation tests.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use super::error::{NavError, Result};
use super::help::HelpOverlay;
use super::host::*;

#[derive(Debug, Clone)]
pub struct FakeLeaf {
    pub id: LeafId,
    pub file: Option<PathBuf>,
    pub group: TabGroupId,
}

#[derive(Debug, Clone)]
pub struct FakeGroup {
    pub id: TabGroupId,
    pub leaves: Vec<LeafId>,
    pub current: usize,
    pub window: usize,
    pub split: Option<SplitDirection>,
}

#[derive(Debug, Default)]
pub struct FakeHost {
    pub active_view: Option<ViewType>,
    pub active_element: Option<ActiveElement>,
    pub modal_open: bool,

    pub entries: Vec<(NodeId, NodeKind)>,
    pub focused: Option<NodeId>,
    pub selection: Vec<NodeId>,
    pub context_menu: Option<NodeId>,
    pub menu_keys: Vec<NativeKey>,
    pub preview: Option<NodeId>,
    pub help: Option<HelpOverlay>,

    pub tree_keys: Vec<NativeKey>,
    pub renames: usize,
    pub collapse_all_calls: usize,
    pub created: Vec<(EntryKind, PathBuf)>,
    pub copies: Vec<(PathBuf, PathBuf)>,
    pub fail_copy: bool,
    /// Files the tree's own "open" (arrow right on a file) opened.
    pub native_opens: Vec<PathBuf>,

    pub leaves: Vec<FakeLeaf>,
    pub groups: Vec<FakeGroup>,
    pub active_leaf: Option<LeafId>,
    pub most_recent: Option<LeafId>,
    pub highlighted_tabs: HashSet<LeafId>,
    next_id: u64,
}

pub fn file(path: &str) -> (NodeId, NodeKind) {
    let extension = Path::new(path)
        .extension()
        .map(|e| e.to_string_lossy().to_string())
        .unwrap_or_default();
    (NodeId::new(path), NodeKind::File { extension })
}

pub fn folder(path: &str, collapsed: bool) -> (NodeId, NodeKind) {
    (NodeId::new(path), NodeKind::Folder { collapsed })
}

impl FakeHost {
    /// Panel focused, one empty editor leaf, no focused node.
    pub fn new(entries: Vec<(NodeId, NodeKind)>) -> Self {
        let mut host = Self {
            active_view: Some(ViewType::FileExplorer),
            entries,
            next_id: 1,
            ..Self::default()
        };
        let group = host.new_group(0, None);
        let leaf = host.push_leaf(group);
        host.most_recent = Some(leaf);
        host
    }

    /// ```text
    /// notes/          expanded
    ///   a.md b.md c.md
    ///   deep/         collapsed
    ///     x.md
    ///     inner/      collapsed
    ///       y.md
    /// solo/           expanded
    ///   only.md
    /// readme.md
    /// ```
    pub fn sample() -> Self {
        Self::new(vec![
            folder("notes", false),
            file("notes/a.md"),
            file("notes/b.md"),
            file("notes/c.md"),
            folder("notes/deep", true),
            file("notes/deep/x.md"),
            folder("notes/deep/inner", true),
            file("notes/deep/inner/y.md"),
            folder("solo", false),
            file("solo/only.md"),
            file("readme.md"),
        ])
    }

    pub fn focus(&mut self, path: &str) {
        self.focused = Some(NodeId::new(path));
    }

    pub fn kind(&self, path: &str) -> Option<NodeKind> {
        self.entries.iter().find(|(id, _)| id.path() == Path::new(path)).map(|(_, k)| k.clone())
    }

    pub fn is_collapsed(&self, path: &str) -> bool {
        matches!(self.kind(path), Some(NodeKind::Folder { collapsed: true }))
    }

    pub fn first_leaf(&self) -> LeafId {
        self.leaves[0].id
    }

    pub fn leaf(&self, id: LeafId) -> Option<&FakeLeaf> {
        self.leaves.iter().find(|l| l.id == id)
    }

    pub fn group_of(&self, leaf: LeafId) -> Option<&FakeGroup> {
        self.groups.iter().find(|g| g.leaves.contains(&leaf))
    }

    /// Open `path` in a new tab of the first group without focusing it.
    pub fn seed_open_tab(&mut self, path: &str) -> LeafId {
        let group = self.groups[0].id;
        let leaf = self.push_leaf(group);
        if let Some(l) = self.leaves.iter_mut().find(|l| l.id == leaf) {
            l.file = Some(PathBuf::from(path));
        }
        leaf
    }

    fn alloc(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn new_group(&mut self, window: usize, split: Option<SplitDirection>) -> TabGroupId {
        let id = TabGroupId(self.alloc());
        self.groups.push(FakeGroup { id, leaves: Vec::new(), current: 0, window, split });
        id
    }

    fn push_leaf(&mut self, group: TabGroupId) -> LeafId {
        let id = LeafId(self.alloc());
        self.leaves.push(FakeLeaf { id, file: None, group });
        if let Some(g) = self.groups.iter_mut().find(|g| g.id == group) {
            g.leaves.push(id);
        }
        id
    }

    fn parent_of(id: &NodeId) -> Option<NodeId> {
        id.path()
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(NodeId::new)
    }

    fn visible(&self, parent: Option<&NodeId>, out: &mut Vec<NodeId>) {
        for child in self.children(parent) {
            out.push(child.clone());
            if let Some(NodeKind::Folder { collapsed: false }) = self.node(&child).map(|n| n.kind) {
                self.visible(Some(&child), out);
            }
        }
    }

    fn move_focus(&mut self, delta: isize) {
        let mut rows = Vec::new();
        self.visible(None, &mut rows);
        if rows.is_empty() {
            return;
        }
        let next = match self.focused.as_ref().and_then(|f| rows.iter().position(|r| r == f)) {
            Some(idx) => (idx as isize + delta).clamp(0, rows.len() as isize - 1) as usize,
            None => 0,
        };
        self.focused = Some(rows[next].clone());
    }

    fn delete_focused(&mut self) {
        let Some(target) = self.focused.take() else { return };
        self.entries.retain(|(id, _)| !id.path().starts_with(target.path()));
        self.selection.retain(|id| !id.path().starts_with(target.path()));
    }

    fn path_taken(&self, path: &Path) -> bool {
        self.entries.iter().any(|(id, _)| id.path() == path)
    }
}

impl TreeHost for FakeHost {
    fn ambient_state(&self) -> AmbientState {
        AmbientState {
            active_view: self.active_view,
            active_element: self.active_element.unwrap_or(ActiveElement::None),
            modal_open: self.modal_open,
        }
    }

    fn is_context_menu_open(&self) -> bool {
        self.context_menu.is_some()
    }

    fn is_preview_open(&self) -> bool {
        self.preview.is_some()
    }

    fn focused_node(&self) -> Option<NodeId> {
        self.focused.clone()
    }

    fn set_focused_node(&mut self, node: Option<NodeId>) {
        self.focused = node;
    }

    fn node(&self, id: &NodeId) -> Option<TreeNode> {
        self.entries.iter().find(|(e, _)| e == id).map(|(e, kind)| TreeNode {
            id: e.clone(),
            parent: Self::parent_of(e),
            kind: kind.clone(),
        })
    }

    fn children(&self, parent: Option<&NodeId>) -> Vec<NodeId> {
        self.entries
            .iter()
            .filter(|(id, _)| Self::parent_of(id).as_ref() == parent)
            .map(|(id, _)| id.clone())
            .collect()
    }

    fn set_collapsed(&mut self, id: &NodeId, collapsed: bool) {
        for (entry, kind) in self.entries.iter_mut() {
            if entry == id {
                if let NodeKind::Folder { collapsed: c } = kind {
                    *c = collapsed;
                }
            }
        }
    }

    fn collapse_all(&mut self) {
        self.collapse_all_calls += 1;
        for (_, kind) in self.entries.iter_mut() {
            if let NodeKind::Folder { collapsed } = kind {
                *collapsed = true;
            }
        }
    }

    fn selected_nodes(&self) -> Vec<NodeId> {
        self.selection.clone()
    }

    fn select_node(&mut self, id: &NodeId) {
        if !self.selection.contains(id) {
            self.selection.push(id.clone());
        }
    }

    fn deselect_node(&mut self, id: &NodeId) {
        self.selection.retain(|s| s != id);
    }

    fn clear_selection(&mut self) {
        self.selection.clear();
    }

    fn send_tree_key(&mut self, key: NativeKey) {
        self.tree_keys.push(key);
        match key {
            NativeKey::ArrowDown => self.move_focus(1),
            NativeKey::ArrowUp => self.move_focus(-1),
            NativeKey::ArrowLeft => {
                if let Some(focused) = self.focused.clone() {
                    self.set_collapsed(&focused, true);
                }
            }
            NativeKey::ArrowRight => {
                let Some(node) = self.focused.clone().and_then(|f| self.node(&f)) else { return };
                if node.is_file() {
                    self.native_opens.push(node.id.path().to_path_buf());
                    self.active_view = Some(ViewType::Editor);
                } else {
                    self.set_collapsed(&node.id, false);
                }
            }
            NativeKey::Escape | NativeKey::Delete => {}
        }
    }

    fn send_document_key(&mut self, key: NativeKey) {
        if self.context_menu.is_some() {
            match key {
                NativeKey::Escape => self.context_menu = None,
                other => self.menu_keys.push(other),
            }
            return;
        }
        if key == NativeKey::Delete {
            self.delete_focused();
        }
    }

    fn begin_rename(&mut self) {
        self.renames += 1;
        self.active_element = Some(ActiveElement::Renaming);
    }

    fn open_context_menu(&mut self, id: &NodeId) {
        self.context_menu = Some(id.clone());
    }

    fn create_entry(&mut self, kind: EntryKind, folder: &Path) -> Result<()> {
        self.created.push((kind, folder.to_path_buf()));
        Ok(())
    }

    fn available_path(&self, base: &Path, extension: Option<&str>) -> PathBuf {
        let with_ext = |stem: String| match extension {
            Some(ext) => PathBuf::from(format!("{}.{}", stem, ext)),
            None => PathBuf::from(stem),
        };
        let base = base.to_string_lossy().to_string();
        let first = with_ext(base.clone());
        if !self.path_taken(&first) {
            return first;
        }
        (1..)
            .map(|n| with_ext(format!("{} {}", base, n)))
            .find(|p| !self.path_taken(p))
            .unwrap_or(first)
    }

    fn copy_entry(&mut self, source: &Path, dest: &Path) -> Result<()> {
        if self.fail_copy {
            return Err(NavError::Io(std::io::Error::other("disk full")));
        }
        let kind = self
            .entries
            .iter()
            .find(|(id, _)| id.path() == source)
            .map(|(_, k)| k.clone())
            .ok_or_else(|| NavError::MissingNode(source.display().to_string()))?;
        self.entries.push((NodeId::new(dest), kind));
        self.copies.push((source.to_path_buf(), dest.to_path_buf()));
        Ok(())
    }

    fn most_recent_leaf(&self) -> Option<LeafId> {
        self.most_recent
    }

    fn new_leaf(&mut self, placement: LeafPlacement) -> Result<LeafId> {
        let group = match placement {
            LeafPlacement::Split(direction) => self.new_group(0, Some(direction)),
            LeafPlacement::Tab => match self.most_recent.and_then(|l| self.leaf(l)).map(|l| l.group) {
                Some(group) => group,
                None => self.new_group(0, None),
            },
            LeafPlacement::Window => {
                let window = self.groups.iter().map(|g| g.window).max().unwrap_or(0) + 1;
                self.new_group(window, None)
            }
        };
        let leaf = self.push_leaf(group);
        self.set_active_leaf(leaf, true);
        Ok(leaf)
    }

    fn split_leaf(&mut self, existing: LeafId, direction: SplitDirection) -> Result<LeafId> {
        let window = self.group_of(existing).map(|g| g.window).unwrap_or(0);
        let group = self.new_group(window, Some(direction));
        Ok(self.push_leaf(group))
    }

    fn insert_leaf(&mut self, group: TabGroupId) -> Result<LeafId> {
        Ok(self.push_leaf(group))
    }

    fn open_file(&mut self, leaf: LeafId, path: &Path) -> Result<()> {
        let target = self
            .leaves
            .iter_mut()
            .find(|l| l.id == leaf)
            .ok_or_else(|| NavError::Host(format!("no leaf {:?}", leaf)))?;
        target.file = Some(path.to_path_buf());
        Ok(())
    }

    fn set_active_leaf(&mut self, leaf: LeafId, focus: bool) {
        self.active_leaf = Some(leaf);
        self.most_recent = Some(leaf);
        for group in self.groups.iter_mut() {
            if let Some(idx) = group.leaves.iter().position(|l| *l == leaf) {
                group.current = idx;
            }
        }
        if focus {
            self.active_view = Some(ViewType::Editor);
        }
    }

    fn editor_leaves(&self) -> Vec<LeafId> {
        self.leaves.iter().map(|l| l.id).collect()
    }

    fn leaf_file(&self, leaf: LeafId) -> Option<PathBuf> {
        self.leaf(leaf).and_then(|l| l.file.clone())
    }

    fn tab_group(&self, leaf: LeafId) -> Option<TabGroupInfo> {
        self.group_of(leaf).map(|g| TabGroupInfo {
            id: g.id,
            leaves: g.leaves.clone(),
            current: g.current,
        })
    }

    fn select_tab(&mut self, leaf: LeafId) {
        for group in self.groups.iter_mut() {
            if let Some(idx) = group.leaves.iter().position(|l| *l == leaf) {
                group.current = idx;
            }
        }
    }

    fn set_tab_highlight(&mut self, leaf: LeafId, on: bool) {
        if on {
            self.highlighted_tabs.insert(leaf);
        } else {
            self.highlighted_tabs.remove(&leaf);
        }
    }

    fn show_preview(&mut self, id: &NodeId) {
        self.preview = Some(id.clone());
    }

    fn hide_preview(&mut self, _id: &NodeId) {
        self.preview = None;
    }

    fn is_help_overlay_visible(&self) -> bool {
        self.help.is_some()
    }

    fn show_help_overlay(&mut self, overlay: HelpOverlay) {
        self.help = Some(overlay);
    }

    fn hide_help_overlay(&mut self) {
        self.help = None;
    }
}
