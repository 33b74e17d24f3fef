//! Editor area of the terminal host: windows of tab groups of leaves.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::nav::error::{NavError, Result};
use crate::nav::host::{LeafId, LeafPlacement, SplitDirection, TabGroupId, TabGroupInfo};

#[derive(Debug, Clone)]
pub struct Leaf {
    pub id: LeafId,
    pub file: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct TabGroup {
    pub id: TabGroupId,
    /// How this group was split off its neighbour. `None` for the first.
    pub split: Option<SplitDirection>,
    pub leaves: Vec<Leaf>,
    pub current: usize,
}

impl TabGroup {
    pub fn current_leaf(&self) -> Option<&Leaf> {
        self.leaves.get(self.current)
    }
}

#[derive(Debug, Clone)]
pub struct Window {
    pub groups: Vec<TabGroup>,
}

#[derive(Debug)]
pub struct Workspace {
    pub windows: Vec<Window>,
    /// Leaf holding input focus when the editor area is focused.
    pub active: Option<LeafId>,
    pub most_recent: Option<LeafId>,
    pub highlighted: HashSet<LeafId>,
    next_id: u64,
}

impl Default for Workspace {
    fn default() -> Self {
        Self::new()
    }
}

impl Workspace {
    /// One window with one group holding one empty leaf.
    pub fn new() -> Self {
        let mut ws = Self {
            windows: Vec::new(),
            active: None,
            most_recent: None,
            highlighted: HashSet::new(),
            next_id: 1,
        };
        let group = ws.make_group(None);
        ws.windows.push(Window { groups: vec![group] });
        ws.most_recent = ws.windows[0].groups[0].leaves.first().map(|l| l.id);
        ws
    }

    fn alloc(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn make_leaf(&mut self) -> Leaf {
        Leaf { id: LeafId(self.alloc()), file: None }
    }

    fn make_group(&mut self, split: Option<SplitDirection>) -> TabGroup {
        let id = TabGroupId(self.alloc());
        let leaf = self.make_leaf();
        TabGroup { id, split, leaves: vec![leaf], current: 0 }
    }

    /// (window, group, leaf) indices of a leaf.
    fn locate(&self, leaf: LeafId) -> Option<(usize, usize, usize)> {
        self.windows.iter().enumerate().find_map(|(w, window)| {
            window.groups.iter().enumerate().find_map(|(g, group)| {
                group.leaves.iter().position(|l| l.id == leaf).map(|i| (w, g, i))
            })
        })
    }

    fn locate_group(&self, group: TabGroupId) -> Option<(usize, usize)> {
        self.windows.iter().enumerate().find_map(|(w, window)| {
            window.groups.iter().position(|g| g.id == group).map(|g| (w, g))
        })
    }

    fn leaf_mut(&mut self, leaf: LeafId) -> Option<&mut Leaf> {
        let (w, g, i) = self.locate(leaf)?;
        self.windows.get_mut(w)?.groups.get_mut(g)?.leaves.get_mut(i)
    }

    pub fn window_of(&self, leaf: LeafId) -> Option<usize> {
        self.locate(leaf).map(|(w, _, _)| w)
    }

    /// Window shown on screen: the one holding the most recent leaf.
    pub fn current_window(&self) -> usize {
        self.most_recent.and_then(|l| self.window_of(l)).unwrap_or(0)
    }

    pub fn all_leaves(&self) -> Vec<LeafId> {
        self.windows
            .iter()
            .flat_map(|w| w.groups.iter())
            .flat_map(|g| g.leaves.iter().map(|l| l.id))
            .collect()
    }

    pub fn leaf_file(&self, leaf: LeafId) -> Option<PathBuf> {
        let (w, g, i) = self.locate(leaf)?;
        self.windows[w].groups[g].leaves[i].file.clone()
    }

    pub fn tab_group(&self, leaf: LeafId) -> Option<TabGroupInfo> {
        let (w, g, _) = self.locate(leaf)?;
        let group = &self.windows[w].groups[g];
        Some(TabGroupInfo {
            id: group.id,
            leaves: group.leaves.iter().map(|l| l.id).collect(),
            current: group.current,
        })
    }

    /// Create a leaf and make it the active one.
    pub fn new_leaf(&mut self, placement: LeafPlacement) -> Result<LeafId> {
        let leaf = match placement {
            LeafPlacement::Split(direction) => {
                let w = self.current_window();
                let after = self
                    .most_recent
                    .and_then(|l| self.locate(l))
                    .map(|(_, g, _)| g + 1)
                    .unwrap_or(0);
                let group = self.make_group(Some(direction));
                let id = group.leaves[0].id;
                let window = self.windows.get_mut(w).ok_or(NavError::NoTabGroup)?;
                window.groups.insert(after.min(window.groups.len()), group);
                id
            }
            LeafPlacement::Tab => {
                let recent = self.most_recent.ok_or(NavError::NoTabGroup)?;
                let info = self.tab_group(recent).ok_or(NavError::NoTabGroup)?;
                // An empty foreground tab gets reused.
                if self.leaf_file(recent).is_none() {
                    recent
                } else {
                    self.insert_leaf(info.id)?
                }
            }
            LeafPlacement::Window => {
                let group = self.make_group(None);
                let id = group.leaves[0].id;
                self.windows.push(Window { groups: vec![group] });
                id
            }
        };
        self.set_active(leaf);
        Ok(leaf)
    }

    /// Split beside `existing` without changing the active leaf.
    pub fn split_leaf(&mut self, existing: LeafId, direction: SplitDirection) -> Result<LeafId> {
        let (w, g, _) = self
            .locate(existing)
            .ok_or_else(|| NavError::Host(format!("no leaf {}", existing.0)))?;
        let group = self.make_group(Some(direction));
        let id = group.leaves[0].id;
        self.windows[w].groups.insert(g + 1, group);
        Ok(id)
    }

    /// Append an empty leaf at the end of `group`. The foreground tab stays.
    pub fn insert_leaf(&mut self, group: TabGroupId) -> Result<LeafId> {
        let (w, g) = self
            .locate_group(group)
            .ok_or_else(|| NavError::Host(format!("no tab group {}", group.0)))?;
        let leaf = self.make_leaf();
        let id = leaf.id;
        self.windows[w].groups[g].leaves.push(leaf);
        Ok(id)
    }

    pub fn open_file(&mut self, leaf: LeafId, path: &Path) -> Result<()> {
        let target = self
            .leaf_mut(leaf)
            .ok_or_else(|| NavError::Host(format!("no leaf {}", leaf.0)))?;
        target.file = Some(path.to_path_buf());
        Ok(())
    }

    /// Bring `leaf` to the front of its group and make it active.
    pub fn set_active(&mut self, leaf: LeafId) {
        if self.select_tab(leaf) {
            self.active = Some(leaf);
            self.most_recent = Some(leaf);
        }
    }

    /// Bring `leaf` to the front of its group only.
    pub fn select_tab(&mut self, leaf: LeafId) -> bool {
        let Some((w, g, i)) = self.locate(leaf) else { return false };
        self.windows[w].groups[g].current = i;
        true
    }

    pub fn set_highlight(&mut self, leaf: LeafId, on: bool) {
        if on {
            self.highlighted.insert(leaf);
        } else {
            self.highlighted.remove(&leaf);
        }
    }

    /// Switch the foreground tab of the active leaf's group by `delta`.
    pub fn cycle_tab(&mut self, delta: isize) {
        let Some(active) = self.active.or(self.most_recent) else { return };
        let Some(info) = self.tab_group(active) else { return };
        let len = info.leaves.len() as isize;
        let next = (info.current as isize + delta).rem_euclid(len) as usize;
        self.set_active(info.leaves[next]);
    }

    /// Move activity to the first leaf of the next window.
    pub fn cycle_window(&mut self) {
        if self.windows.len() < 2 {
            return;
        }
        let next = (self.current_window() + 1) % self.windows.len();
        let leaf = self.windows[next].groups.first().and_then(|g| g.current_leaf()).map(|l| l.id);
        if let Some(leaf) = leaf {
            self.set_active(leaf);
        }
    }

    /// Close a leaf. Empty groups and windows go with it; the last leaf of
    /// the workspace is emptied instead.
    pub fn close_leaf(&mut self, leaf: LeafId) {
        let Some((w, g, i)) = self.locate(leaf) else { return };
        if self.all_leaves().len() == 1 {
            self.windows[w].groups[g].leaves[i].file = None;
            return;
        }
        self.highlighted.remove(&leaf);
        let group = &mut self.windows[w].groups[g];
        group.leaves.remove(i);
        group.current = group.current.min(group.leaves.len().saturating_sub(1));
        if group.leaves.is_empty() {
            self.windows[w].groups.remove(g);
            if self.windows[w].groups.is_empty() {
                self.windows.remove(w);
            }
        }
        let fallback = self.windows.first().and_then(|win| win.groups.first()).and_then(|g| g.current_leaf()).map(|l| l.id);
        if self.active == Some(leaf) {
            self.active = fallback;
        }
        if self.most_recent == Some(leaf) {
            self.most_recent = fallback;
        }
    }

    /// Follow a rename or move on disk.
    pub fn rename_path(&mut self, from: &Path, to: &Path) {
        for leaf in self.windows.iter_mut().flat_map(|w| w.groups.iter_mut()).flat_map(|g| g.leaves.iter_mut()) {
            if let Some(file) = &leaf.file {
                if let Ok(rest) = file.strip_prefix(from) {
                    leaf.file = Some(to.join(rest));
                }
            }
        }
    }

    /// Empty every leaf that showed `path` or something inside it.
    pub fn forget_path(&mut self, path: &Path) {
        for leaf in self.windows.iter_mut().flat_map(|w| w.groups.iter_mut()).flat_map(|g| g.leaves.iter_mut()) {
            if leaf.file.as_deref().is_some_and(|f| f.starts_with(path)) {
                leaf.file = None;
            }
        }
    }
}
