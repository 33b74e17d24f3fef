//! Tree actions: short sequences of host calls.
//!
//! Nothing here owns state. Each method reads what it needs from the host,
//! decides, and issues commands. Missing focus, missing leaves and folders
//! where a file is required are silent no-ops.

use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::config::Settings;
use crate::keybindings::Keystroke;
use crate::services::file_ops::remove_extension;
use crate::utils::log::debug_log;

use super::error::{NavError, Result};
use super::help::HelpOverlay;
use super::host::*;
use super::scheduler::{DeferredTask, Scheduler, REFOCUS_DELAY, TAB_FLASH_DURATION};

/// Where a new entry is created relative to the focused node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateContext {
    /// The focused folder itself, or the focused file's folder.
    Current,
    /// The folder containing the focused entry.
    Parent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenOptions {
    pub focus: bool,
    pub prevent_duplicate: bool,
}

pub struct TreeActions<'a, H: TreeHost> {
    host: &'a mut H,
    settings: &'a Settings,
    excluded: &'a [Keystroke],
    scheduler: &'a mut Scheduler,
    now: Instant,
}

impl<'a, H: TreeHost> TreeActions<'a, H> {
    pub fn new(
        host: &'a mut H,
        settings: &'a Settings,
        excluded: &'a [Keystroke],
        scheduler: &'a mut Scheduler,
        now: Instant,
    ) -> Self {
        Self { host, settings, excluded, scheduler, now }
    }

    // ── focus movement ──

    pub fn move_focus_down(&mut self) {
        self.move_focus(NativeKey::ArrowDown);
    }

    pub fn move_focus_up(&mut self) {
        self.move_focus(NativeKey::ArrowUp);
    }

    /// With a context menu open the arrow goes to the menu instead.
    fn move_focus(&mut self, key: NativeKey) {
        if self.host.is_context_menu_open() {
            self.host.send_document_key(key);
        } else {
            self.host.send_tree_key(key);
        }
    }

    /// Move focus, then show the newly focused file in the most recent leaf.
    pub fn move_focus_and_preview(&mut self, key: NativeKey) -> Result<()> {
        self.move_focus(key);
        let Some(node) = self.focused_node() else { return Ok(()) };
        if node.is_file() {
            self.open_file(&node, OpenOptions { focus: false, prevent_duplicate: false })?;
        }
        Ok(())
    }

    pub fn focus_first_root(&mut self) {
        if let Some(first) = self.host.children(None).into_iter().next() {
            self.host.set_focused_node(Some(first));
        }
    }

    pub fn focus_last_root(&mut self) {
        if let Some(last) = self.host.children(None).into_iter().last() {
            self.host.set_focused_node(Some(last));
        }
    }

    /// Root children have no parent to move to.
    pub fn focus_parent(&mut self, node: &TreeNode) {
        if let Some(parent) = &node.parent {
            self.host.set_focused_node(Some(parent.clone()));
        }
    }

    // ── collapse / expand ──

    pub fn collapse_all(&mut self) {
        self.host.collapse_all();
    }

    pub fn collapse_current(&mut self) {
        self.host.send_tree_key(NativeKey::ArrowLeft);
    }

    pub fn expand_current(&mut self) {
        self.host.send_tree_key(NativeKey::ArrowRight);
    }

    pub fn set_collapsed_recursive(&mut self, id: &NodeId, collapsed: bool) {
        let Some(node) = self.host.node(id) else { return };
        let NodeKind::Folder { collapsed: current } = node.kind else { return };
        if current != collapsed {
            self.host.set_collapsed(id, collapsed);
        }
        for child in self.host.children(Some(id)) {
            self.set_collapsed_recursive(&child, collapsed);
        }
    }

    /// Expanded folder: collapse it and everything below. Anything else:
    /// move focus to the parent.
    pub fn collapse_recursive_or_focus_parent(&mut self, node: &TreeNode) {
        if node.is_expanded_folder() {
            self.set_collapsed_recursive(&node.id, true);
        } else {
            self.focus_parent(node);
        }
    }

    // ── context menu / preview / help ──

    pub fn toggle_context_menu(&mut self, node: &TreeNode) {
        if self.host.is_context_menu_open() {
            self.host.send_document_key(NativeKey::Escape);
        } else {
            self.host.open_context_menu(&node.id);
        }
    }

    pub fn toggle_preview(&mut self, node: &TreeNode) {
        if self.host.is_preview_open() {
            self.host.hide_preview(&node.id);
        } else {
            self.host.show_preview(&node.id);
        }
    }

    pub fn toggle_help(&mut self) {
        if self.host.is_help_overlay_visible() {
            self.host.hide_help_overlay();
        } else {
            self.host.show_help_overlay(HelpOverlay::build(self.excluded));
        }
    }

    // ── selection ──

    pub fn toggle_selection(&mut self, node: &TreeNode) {
        if self.host.is_selected(&node.id) {
            self.host.deselect_node(&node.id);
        } else {
            self.host.select_node(&node.id);
        }
    }

    pub fn clear_selection(&mut self) {
        self.host.clear_selection();
    }

    // ── entries ──

    pub fn create_entry(&mut self, node: &TreeNode, kind: EntryKind, context: CreateContext) -> Result<()> {
        let folder = match (context, &node.kind) {
            (CreateContext::Current, NodeKind::Folder { .. }) => node.id.path().to_path_buf(),
            _ => node.parent_folder(),
        };
        self.host.create_entry(kind, &folder)
    }

    pub fn clone_entry(&mut self, node: &TreeNode) -> Result<()> {
        let base = if node.is_file() {
            remove_extension(node.id.path())
        } else {
            node.id.path().to_path_buf()
        };
        let dest = self.host.available_path(&base, node.extension());
        debug_log(&format!("clone {} -> {}", node.id.path().display(), dest.display()));
        self.host.copy_entry(node.id.path(), &dest)
    }

    pub fn rename(&mut self) {
        self.host.begin_rename();
    }

    /// Delete the focused node and move focus to its replacement once the
    /// host has applied the delete.
    pub fn delete_and_focus_next(&mut self, node: &TreeNode) {
        // Computed first: the sibling list changes as soon as delete runs.
        let next = self.next_focus_after_delete(node);

        self.host.send_document_key(NativeKey::Delete);

        if let Some(target) = next {
            self.scheduler.schedule(self.now, REFOCUS_DELAY, DeferredTask::Refocus(target));
        }
    }

    /// Only child: its parent, unless that is the synthetic root.
    /// Otherwise: next sibling, else previous sibling.
    pub fn next_focus_after_delete(&self, node: &TreeNode) -> Option<NodeId> {
        let siblings = self.host.children(node.parent.as_ref());
        if siblings.len() <= 1 {
            return node.parent.clone();
        }
        let idx = siblings.iter().position(|s| *s == node.id)?;
        siblings
            .get(idx + 1)
            .or_else(|| idx.checked_sub(1).and_then(|prev| siblings.get(prev)))
            .cloned()
    }

    // ── opening files ──

    pub fn open_file(&mut self, node: &TreeNode, options: OpenOptions) -> Result<()> {
        if options.prevent_duplicate && self.reveal_existing(node.id.path(), options.focus) {
            return Ok(());
        }
        if options.focus {
            // The tree's own "open" focuses the editor it opens into.
            self.host.send_tree_key(NativeKey::ArrowRight);
            return Ok(());
        }
        match self.host.most_recent_leaf() {
            Some(leaf) => self.host.open_file(leaf, node.id.path()),
            None => Ok(()),
        }
    }

    pub fn open_in_split(&mut self, node: &TreeNode, direction: SplitDirection, focus: bool) -> Result<()> {
        if self.reveal_existing(node.id.path(), focus) {
            return Ok(());
        }
        let leaf = if focus {
            self.host.new_leaf(LeafPlacement::Split(direction))?
        } else {
            let Some(recent) = self.host.most_recent_leaf() else { return Ok(()) };
            self.host.split_leaf(recent, direction)?
        };
        self.host.open_file(leaf, node.id.path())
    }

    pub fn open_in_new_tab(&mut self, node: &TreeNode) -> Result<()> {
        if self.reveal_existing(node.id.path(), false) {
            return Ok(());
        }
        let leaf = self.host.new_leaf(LeafPlacement::Tab)?;
        self.host.open_file(leaf, node.id.path())?;
        // Needed when the current tab was empty and got reused.
        self.host.set_active_leaf(leaf, true);
        Ok(())
    }

    /// Append a tab to the most recent tab group without switching to it.
    pub fn open_in_new_tab_background(&mut self, node: &TreeNode) -> Result<()> {
        if self.reveal_existing(node.id.path(), false) {
            return Ok(());
        }
        let recent = self.host.most_recent_leaf().ok_or(NavError::NoTabGroup)?;
        let Some(group) = self.host.tab_group(recent) else { return Ok(()) };
        let Some(rightmost) = group.leaves.last().copied() else { return Ok(()) };

        let target = if self.host.leaf_file(rightmost).is_none() {
            recent
        } else {
            self.host.insert_leaf(group.id)?
        };
        self.host.open_file(target, node.id.path())
    }

    /// Open every selected file as a tab of one new window, in selection
    /// order. Without a selection, open the focused file alone.
    pub fn open_in_new_window(&mut self, focused: &TreeNode) -> Result<()> {
        let selected: Vec<PathBuf> = self
            .host
            .selected_nodes()
            .iter()
            .filter_map(|id| self.host.node(id))
            .filter(TreeNode::is_file)
            .map(|n| n.id.path().to_path_buf())
            .collect();

        if selected.is_empty() {
            if !focused.is_file() {
                return Ok(());
            }
            let leaf = self.host.new_leaf(LeafPlacement::Window)?;
            return self.host.open_file(leaf, focused.id.path());
        }

        let first_leaf = self.host.new_leaf(LeafPlacement::Window)?;
        let Some(group) = self.host.tab_group(first_leaf) else { return Ok(()) };
        for (i, path) in selected.iter().enumerate() {
            // The window comes with one leaf already.
            let leaf = if i == 0 { first_leaf } else { self.host.insert_leaf(group.id)? };
            self.host.open_file(leaf, path)?;
        }
        Ok(())
    }

    /// Duplicate-open suppression. Returns true when `path` is already shown
    /// somewhere and that leaf was revealed instead.
    fn reveal_existing(&mut self, path: &Path, focus: bool) -> bool {
        if !self.settings.prevent_duplicate_opens {
            return false;
        }
        let Some(leaf) = self.find_leaf_by_file(path) else { return false };

        if focus {
            self.host.set_active_leaf(leaf, true);
        } else if let Some(group) = self.host.tab_group(leaf) {
            let was_foreground = group.leaves.iter().position(|l| *l == leaf) == Some(group.current);
            self.host.select_tab(leaf);
            if was_foreground && self.settings.background_open_visual_aid {
                self.host.set_tab_highlight(leaf, true);
                self.scheduler.schedule(self.now, TAB_FLASH_DURATION, DeferredTask::ClearTabHighlight(leaf));
            }
        }
        true
    }

    fn find_leaf_by_file(&self, path: &Path) -> Option<LeafId> {
        self.host
            .editor_leaves()
            .into_iter()
            .find(|leaf| self.host.leaf_file(*leaf).as_deref() == Some(path))
    }

    pub fn focused_node(&self) -> Option<TreeNode> {
        self.host.focused_node().and_then(|id| self.host.node(&id))
    }
}
