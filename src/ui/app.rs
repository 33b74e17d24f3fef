use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crossterm::event::{KeyCode, KeyModifiers};

use crate::config::Settings;
use crate::keybindings::KeyPress;
use crate::nav::error::{NavError, Result};
use crate::nav::help::HelpOverlay;
use crate::nav::host::*;
use crate::nav::{KeyNav, KeyOutcome};
use crate::services::file_ops;
use crate::utils::log::debug_log;

use super::theme::Theme;
use super::workspace::Workspace;

/// Lines read from a file for the preview popup and editor panes
const PREVIEW_LINES: usize = 40;

/// Resolve the vault root given on the command line
pub fn resolve_root(path: &Path) -> io::Result<PathBuf> {
    let canonical = path.canonicalize()?;
    if !canonical.is_dir() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{} is not a directory", path.display()),
        ));
    }
    Ok(canonical)
}

/// Which half of the screen holds input focus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusArea {
    Panel,
    Editor,
}

/// Single-line text field with a char-indexed cursor
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextInput {
    pub value: String,
    pub cursor: usize,
}

impl TextInput {
    pub fn new(value: &str) -> Self {
        Self { value: value.to_string(), cursor: value.chars().count() }
    }

    /// Apply an editing key. Returns false for keys that do not edit.
    pub fn handle_key(&mut self, code: KeyCode) -> bool {
        let len = self.value.chars().count();
        match code {
            KeyCode::Char(c) => {
                let mut chars: Vec<char> = self.value.chars().collect();
                chars.insert(self.cursor.min(len), c);
                self.value = chars.into_iter().collect();
                self.cursor += 1;
            }
            KeyCode::Backspace => {
                if self.cursor > 0 {
                    let mut chars: Vec<char> = self.value.chars().collect();
                    chars.remove(self.cursor - 1);
                    self.value = chars.into_iter().collect();
                    self.cursor -= 1;
                }
            }
            KeyCode::Delete => {
                if self.cursor < len {
                    let mut chars: Vec<char> = self.value.chars().collect();
                    chars.remove(self.cursor);
                    self.value = chars.into_iter().collect();
                }
            }
            KeyCode::Left => self.cursor = self.cursor.saturating_sub(1),
            KeyCode::Right => self.cursor = (self.cursor + 1).min(len),
            KeyCode::Home => self.cursor = 0,
            KeyCode::End => self.cursor = len,
            _ => return false,
        }
        true
    }
}

#[derive(Debug, Clone)]
pub struct RenameState {
    pub target: NodeId,
    pub input: TextInput,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuItem {
    Open,
    OpenInNewTab,
    NewFile,
    NewFolder,
    Rename,
    Clone,
    Delete,
}

impl MenuItem {
    pub fn label(&self) -> &'static str {
        match self {
            MenuItem::Open => "Open",
            MenuItem::OpenInNewTab => "Open in new tab",
            MenuItem::NewFile => "New note",
            MenuItem::NewFolder => "New folder",
            MenuItem::Rename => "Rename",
            MenuItem::Clone => "Make a copy",
            MenuItem::Delete => "Delete",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ContextMenuState {
    pub target: NodeId,
    pub items: Vec<MenuItem>,
    pub selected: usize,
}

impl ContextMenuState {
    fn for_node(node: &TreeNode) -> Self {
        let items = if node.is_file() {
            vec![MenuItem::Open, MenuItem::OpenInNewTab, MenuItem::Rename, MenuItem::Clone, MenuItem::Delete]
        } else {
            vec![MenuItem::NewFile, MenuItem::NewFolder, MenuItem::Rename, MenuItem::Clone, MenuItem::Delete]
        };
        Self { target: node.id.clone(), items, selected: 0 }
    }

    fn move_selection(&mut self, delta: isize) {
        let len = self.items.len() as isize;
        self.selected = (self.selected as isize + delta).rem_euclid(len) as usize;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsField {
    ExcludedKeys,
    PreventDuplicates,
    VisualAid,
}

/// Settings modal. Edits a draft that is applied when the modal closes.
#[derive(Debug, Clone)]
pub struct SettingsForm {
    pub draft: Settings,
    pub keys_input: TextInput,
    pub field: SettingsField,
    pub error: Option<String>,
}

impl SettingsForm {
    pub fn new(settings: &Settings) -> Self {
        Self {
            draft: settings.clone(),
            keys_input: TextInput::new(&settings.excluded_keys),
            field: SettingsField::ExcludedKeys,
            error: None,
        }
    }

    /// Commit the excluded-keys field. An invalid value reverts it.
    pub fn commit_keys(&mut self) {
        match self.draft.set_excluded_keys(&self.keys_input.value) {
            Ok(()) => self.error = None,
            Err(e) => {
                self.error = Some(e.to_string());
                self.keys_input = TextInput::new(&self.draft.excluded_keys);
            }
        }
    }

    pub fn next_field(&mut self, forward: bool) {
        if self.field == SettingsField::ExcludedKeys {
            self.commit_keys();
        }
        let order = [SettingsField::ExcludedKeys, SettingsField::PreventDuplicates, SettingsField::VisualAid];
        let idx = order.iter().position(|f| *f == self.field).unwrap_or(0);
        let next = if forward { (idx + 1) % order.len() } else { (idx + order.len() - 1) % order.len() };
        self.field = order[next];
    }

    pub fn toggle(&mut self) {
        match self.field {
            SettingsField::PreventDuplicates => {
                let on = !self.draft.prevent_duplicate_opens;
                self.draft.set_prevent_duplicate_opens(on);
            }
            SettingsField::VisualAid => {
                let on = !self.draft.background_open_visual_aid;
                if !self.draft.set_background_open_visual_aid(on) {
                    self.error = Some("Turn on duplicate prevention first".to_string());
                }
            }
            SettingsField::ExcludedKeys => {}
        }
    }
}

#[derive(Debug, Clone)]
pub struct PreviewState {
    pub target: NodeId,
    pub lines: Vec<String>,
}

/// Terminal host: a real directory shown as a collapsible tree next to a
/// tabbed editor area.
pub struct App {
    pub root: PathBuf,
    /// Where settings are saved. `None` keeps them in memory.
    pub config_dir: Option<PathBuf>,
    pub theme: Theme,
    pub expanded: HashSet<PathBuf>,
    pub focused: Option<NodeId>,
    pub selection: Vec<NodeId>,
    pub focus_area: FocusArea,
    pub rename: Option<RenameState>,
    pub context_menu: Option<ContextMenuState>,
    pub settings_form: Option<SettingsForm>,
    pub preview: Option<PreviewState>,
    pub help: Option<HelpOverlay>,
    pub workspace: Workspace,
    pub message: Option<String>,
    pub message_is_error: bool,
    pub tree_scroll: usize,
}

impl App {
    pub fn new(root: PathBuf) -> Self {
        let mut app = Self {
            root,
            config_dir: Settings::config_dir(),
            theme: Theme::detect(),
            expanded: HashSet::new(),
            focused: None,
            selection: Vec::new(),
            focus_area: FocusArea::Panel,
            rename: None,
            context_menu: None,
            settings_form: None,
            preview: None,
            help: None,
            workspace: Workspace::new(),
            message: None,
            message_is_error: false,
            tree_scroll: 0,
        };
        app.focused = app.children(None).into_iter().next();
        app
    }

    pub fn show_message(&mut self, msg: &str) {
        self.message = Some(msg.to_string());
        self.message_is_error = false;
    }

    pub fn show_error(&mut self, msg: &str) {
        debug_log(msg);
        self.message = Some(msg.to_string());
        self.message_is_error = true;
    }

    /// The settings modal covers both areas and counts as its own view.
    pub fn active_view(&self) -> ViewType {
        if self.settings_form.is_some() {
            return ViewType::Other;
        }
        match self.focus_area {
            FocusArea::Panel => ViewType::FileExplorer,
            FocusArea::Editor => ViewType::Editor,
        }
    }

    fn abs(&self, rel: &Path) -> PathBuf {
        self.root.join(rel)
    }

    fn is_dir(&self, rel: &Path) -> bool {
        // Symlinks are never followed, so the tree cannot loop
        fs::symlink_metadata(self.abs(rel)).map(|m| m.is_dir()).unwrap_or(false)
    }

    /// Entries of `folder`, folders first, then by case-insensitive name.
    /// Dotfiles are hidden.
    fn list_dir(&self, folder: &Path) -> Vec<(PathBuf, bool)> {
        let Ok(entries) = fs::read_dir(self.abs(folder)) else {
            return Vec::new();
        };
        let mut items: Vec<(PathBuf, bool, String)> = entries
            .filter_map(|e| e.ok())
            .filter_map(|entry| {
                let name = entry.file_name().to_string_lossy().to_string();
                if name.starts_with('.') {
                    return None;
                }
                let is_dir = entry.file_type().ok()?.is_dir();
                let key = name.to_lowercase();
                Some((folder.join(name), is_dir, key))
            })
            .collect();
        items.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.2.cmp(&b.2)));
        items.into_iter().map(|(path, is_dir, _)| (path, is_dir)).collect()
    }

    /// Rows currently shown in the panel with their depth.
    pub fn visible_rows(&self) -> Vec<(NodeId, usize)> {
        let mut rows = Vec::new();
        self.collect_rows(Path::new(""), 0, &mut rows);
        rows
    }

    fn collect_rows(&self, folder: &Path, depth: usize, rows: &mut Vec<(NodeId, usize)>) {
        for (path, is_dir) in self.list_dir(folder) {
            let open = is_dir && self.expanded.contains(&path);
            rows.push((NodeId::new(path.clone()), depth));
            if open {
                self.collect_rows(&path, depth + 1, rows);
            }
        }
    }

    fn focused_tree_node(&self) -> Option<TreeNode> {
        self.focused.as_ref().and_then(|id| self.node(id))
    }

    fn move_focus(&mut self, delta: isize) {
        let rows = self.visible_rows();
        if rows.is_empty() {
            return;
        }
        let next = match self.focused.as_ref().and_then(|f| rows.iter().position(|(r, _)| r == f)) {
            Some(idx) => (idx as isize + delta).clamp(0, rows.len() as isize - 1) as usize,
            None => 0,
        };
        self.focused = Some(rows[next].0.clone());
    }

    /// First lines of a vault file, lossily decoded.
    pub fn file_lines(&self, rel: &Path, max: usize) -> Vec<String> {
        match fs::read(self.abs(rel)) {
            Ok(bytes) => String::from_utf8_lossy(&bytes)
                .lines()
                .take(max)
                .map(|l| l.replace('\t', "    "))
                .collect(),
            Err(e) => vec![format!("<cannot read: {}>", e)],
        }
    }

    /// Open a file in the most recent leaf and move focus into the editor.
    pub fn open_in_editor(&mut self, id: &NodeId) {
        let leaf = match self.workspace.most_recent {
            Some(leaf) => leaf,
            None => match self.workspace.new_leaf(LeafPlacement::Window) {
                Ok(leaf) => leaf,
                Err(e) => return self.show_error(&e.to_string()),
            },
        };
        if let Err(e) = self.workspace.open_file(leaf, id.path()) {
            return self.show_error(&e.to_string());
        }
        self.workspace.set_active(leaf);
        self.focus_area = FocusArea::Editor;
    }

    pub fn toggle_focus_area(&mut self) {
        self.focus_area = match self.focus_area {
            FocusArea::Panel => FocusArea::Editor,
            FocusArea::Editor => FocusArea::Panel,
        };
    }

    pub fn open_settings(&mut self, current: &Settings) {
        self.context_menu = None;
        self.settings_form = Some(SettingsForm::new(current));
    }

    pub fn close_active_leaf(&mut self) {
        if let Some(leaf) = self.workspace.active.or(self.workspace.most_recent) {
            self.workspace.close_leaf(leaf);
        }
    }

    /// Esc in the panel closes whatever popup is up.
    pub fn dismiss_popups(&mut self) {
        if self.help.is_some() {
            self.help = None;
        } else if self.preview.is_some() {
            self.preview = None;
        } else {
            self.selection.clear();
        }
    }

    fn delete_entry(&mut self, id: &NodeId) {
        match file_ops::delete_file(&self.abs(id.path())) {
            Ok(()) => {
                debug_log(&format!("deleted {}", id.path().display()));
                self.forget(id.path());
                self.show_message(&format!("Deleted {}", id.path().display()));
            }
            Err(e) => self.show_error(&format!("Delete failed: {}", e)),
        }
    }

    /// Drop every reference to `path` and what was inside it.
    fn forget(&mut self, path: &Path) {
        self.selection.retain(|id| !id.path().starts_with(path));
        self.expanded.retain(|p| !p.starts_with(path));
        self.workspace.forget_path(path);
        if self.focused.as_ref().is_some_and(|f| f.path().starts_with(path)) {
            self.focused = None;
        }
        if self.preview.as_ref().is_some_and(|p| p.target.path().starts_with(path)) {
            self.preview = None;
        }
        if self.context_menu.as_ref().is_some_and(|m| m.target.path().starts_with(path)) {
            self.context_menu = None;
        }
    }

    fn follow_rename(&mut self, from: &Path, to: &Path) {
        let remap = |p: &Path| -> Option<PathBuf> { p.strip_prefix(from).ok().map(|rest| to.join(rest)) };
        for id in self.selection.iter_mut() {
            if let Some(p) = remap(id.path()) {
                *id = NodeId::new(p);
            }
        }
        self.expanded = self.expanded.iter().map(|p| remap(p.as_path()).unwrap_or_else(|| p.clone())).collect();
        if let Some(p) = self.focused.as_ref().and_then(|f| remap(f.path())) {
            self.focused = Some(NodeId::new(p));
        }
        if let Some(preview) = self.preview.as_mut() {
            if let Some(p) = remap(preview.target.path()) {
                preview.target = NodeId::new(p);
            }
        }
        self.workspace.rename_path(from, to);
    }

    /// Apply the rename field. Invalid names keep the field open.
    pub fn commit_rename(&mut self) {
        let Some(state) = self.rename.take() else { return };
        let name = state.input.value.clone();
        if let Err(msg) = file_ops::is_valid_filename(&name) {
            self.show_error(msg);
            self.rename = Some(state);
            return;
        }
        let from = state.target.path().to_path_buf();
        let to = match from.parent() {
            Some(parent) => parent.join(&name),
            None => PathBuf::from(&name),
        };
        if to == from {
            return;
        }
        match file_ops::rename_file(&self.abs(&from), &self.abs(&to)) {
            Ok(()) => {
                self.follow_rename(&from, &to);
                self.show_message(&format!("Renamed to {}", name));
            }
            Err(e) => {
                self.show_error(&format!("Rename failed: {}", e));
                self.rename = Some(state);
            }
        }
    }

    fn menu_activate(&mut self) {
        let Some(menu) = self.context_menu.take() else { return };
        let Some(item) = menu.items.get(menu.selected).copied() else { return };
        let target = menu.target;
        let result = match item {
            MenuItem::Open => {
                self.open_in_editor(&target);
                Ok(())
            }
            MenuItem::OpenInNewTab => self.open_in_new_tab(&target),
            MenuItem::NewFile => self.create_entry(EntryKind::File, target.path()),
            MenuItem::NewFolder => self.create_entry(EntryKind::Folder, target.path()),
            MenuItem::Rename => {
                self.focused = Some(target);
                self.begin_rename();
                Ok(())
            }
            MenuItem::Clone => self.clone_from_menu(&target),
            MenuItem::Delete => {
                self.delete_entry(&target);
                Ok(())
            }
        };
        if let Err(e) = result {
            self.show_error(&e.to_string());
        }
    }

    fn open_in_new_tab(&mut self, id: &NodeId) -> Result<()> {
        let leaf = self.workspace.new_leaf(LeafPlacement::Tab)?;
        self.workspace.open_file(leaf, id.path())?;
        self.focus_area = FocusArea::Editor;
        Ok(())
    }

    fn clone_from_menu(&mut self, id: &NodeId) -> Result<()> {
        let node = self.node(id).ok_or_else(|| NavError::MissingNode(id.path().display().to_string()))?;
        let base = if node.is_file() { file_ops::remove_extension(id.path()) } else { id.path().to_path_buf() };
        let dest = self.available_path(&base, node.extension());
        self.copy_entry(id.path(), &dest)
    }
}

impl TreeHost for App {
    fn ambient_state(&self) -> AmbientState {
        let active_element = if self.rename.is_some() {
            ActiveElement::Renaming
        } else if let Some(form) = &self.settings_form {
            match form.field {
                SettingsField::ExcludedKeys => ActiveElement::Input,
                SettingsField::PreventDuplicates | SettingsField::VisualAid => ActiveElement::Other,
            }
        } else if self.focus_area == FocusArea::Editor {
            // The editor leaf is the document surface
            ActiveElement::ContentEditable
        } else {
            ActiveElement::None
        };
        AmbientState {
            active_view: Some(self.active_view()),
            active_element,
            modal_open: self.settings_form.is_some(),
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
        let path = id.path();
        if path.as_os_str().is_empty() {
            return None;
        }
        let metadata = fs::symlink_metadata(self.abs(path)).ok()?;
        let kind = if metadata.is_dir() {
            NodeKind::Folder { collapsed: !self.expanded.contains(path) }
        } else {
            let extension = path
                .extension()
                .map(|e| e.to_string_lossy().to_string())
                .unwrap_or_default();
            NodeKind::File { extension }
        };
        let parent = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(NodeId::new);
        Some(TreeNode { id: id.clone(), parent, kind })
    }

    fn children(&self, parent: Option<&NodeId>) -> Vec<NodeId> {
        let folder = parent.map(|p| p.path()).unwrap_or(Path::new(""));
        self.list_dir(folder).into_iter().map(|(path, _)| NodeId::new(path)).collect()
    }

    fn set_collapsed(&mut self, id: &NodeId, collapsed: bool) {
        if collapsed {
            self.expanded.remove(id.path());
        } else if self.is_dir(id.path()) {
            self.expanded.insert(id.path().to_path_buf());
        }
    }

    fn collapse_all(&mut self) {
        self.expanded.clear();
        // Focus inside a folder that just closed moves up to its root entry
        if let Some(root_entry) = self
            .focused
            .as_ref()
            .and_then(|f| f.path().components().next())
            .map(|c| NodeId::new(c.as_os_str()))
        {
            self.focused = Some(root_entry);
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
        match key {
            NativeKey::ArrowDown => self.move_focus(1),
            NativeKey::ArrowUp => self.move_focus(-1),
            NativeKey::ArrowLeft => {
                let Some(node) = self.focused_tree_node() else { return };
                if node.is_expanded_folder() {
                    self.expanded.remove(node.id.path());
                } else if let Some(parent) = node.parent {
                    self.focused = Some(parent);
                }
            }
            NativeKey::ArrowRight => {
                let Some(node) = self.focused_tree_node() else { return };
                if node.is_file() {
                    self.open_in_editor(&node.id);
                } else {
                    self.expanded.insert(node.id.path().to_path_buf());
                }
            }
            NativeKey::Escape => self.dismiss_popups(),
            NativeKey::Delete => {}
        }
    }

    fn send_document_key(&mut self, key: NativeKey) {
        if let Some(menu) = self.context_menu.as_mut() {
            match key {
                NativeKey::ArrowDown => menu.move_selection(1),
                NativeKey::ArrowUp => menu.move_selection(-1),
                NativeKey::Escape => self.context_menu = None,
                _ => {}
            }
            return;
        }
        match key {
            NativeKey::Delete => {
                if let Some(id) = self.focused.clone() {
                    self.delete_entry(&id);
                }
            }
            NativeKey::Escape => self.dismiss_popups(),
            _ => {}
        }
    }

    fn begin_rename(&mut self) {
        let Some(node) = self.focused_tree_node() else { return };
        let name = node
            .id
            .path()
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let mut input = TextInput::new(&name);
        // Cursor before the extension, like a stem selection
        if let Some(ext) = node.extension() {
            input.cursor = input.cursor.saturating_sub(ext.chars().count() + 1);
        }
        self.rename = Some(RenameState { target: node.id, input });
    }

    fn open_context_menu(&mut self, id: &NodeId) {
        if let Some(node) = self.node(id) {
            self.context_menu = Some(ContextMenuState::for_node(&node));
        }
    }

    fn create_entry(&mut self, kind: EntryKind, folder: &Path) -> Result<()> {
        let path = match kind {
            EntryKind::File => file_ops::create_untitled_file(&self.root, folder)?,
            EntryKind::Folder => file_ops::create_untitled_folder(&self.root, folder)?,
        };
        debug_log(&format!("created {}", path.display()));
        if !folder.as_os_str().is_empty() {
            self.expanded.insert(folder.to_path_buf());
        }
        self.focused = Some(NodeId::new(path));
        self.begin_rename();
        Ok(())
    }

    fn available_path(&self, base: &Path, extension: Option<&str>) -> PathBuf {
        file_ops::available_path(&self.root, base, extension)
    }

    fn copy_entry(&mut self, source: &Path, dest: &Path) -> Result<()> {
        file_ops::copy_file(&self.abs(source), &self.abs(dest))?;
        self.show_message(&format!("Copied to {}", dest.display()));
        Ok(())
    }

    fn most_recent_leaf(&self) -> Option<LeafId> {
        self.workspace.most_recent
    }

    fn new_leaf(&mut self, placement: LeafPlacement) -> Result<LeafId> {
        let leaf = self.workspace.new_leaf(placement)?;
        self.focus_area = FocusArea::Editor;
        Ok(leaf)
    }

    fn split_leaf(&mut self, existing: LeafId, direction: SplitDirection) -> Result<LeafId> {
        self.workspace.split_leaf(existing, direction)
    }

    fn insert_leaf(&mut self, group: TabGroupId) -> Result<LeafId> {
        self.workspace.insert_leaf(group)
    }

    fn open_file(&mut self, leaf: LeafId, path: &Path) -> Result<()> {
        self.workspace.open_file(leaf, path)
    }

    fn set_active_leaf(&mut self, leaf: LeafId, focus: bool) {
        self.workspace.set_active(leaf);
        if focus {
            self.focus_area = FocusArea::Editor;
        }
    }

    fn editor_leaves(&self) -> Vec<LeafId> {
        self.workspace.all_leaves()
    }

    fn leaf_file(&self, leaf: LeafId) -> Option<PathBuf> {
        self.workspace.leaf_file(leaf)
    }

    fn tab_group(&self, leaf: LeafId) -> Option<TabGroupInfo> {
        self.workspace.tab_group(leaf)
    }

    fn select_tab(&mut self, leaf: LeafId) {
        self.workspace.select_tab(leaf);
    }

    fn set_tab_highlight(&mut self, leaf: LeafId, on: bool) {
        self.workspace.set_highlight(leaf, on);
    }

    fn show_preview(&mut self, id: &NodeId) {
        let lines = self.file_lines(id.path(), PREVIEW_LINES);
        self.preview = Some(PreviewState { target: id.clone(), lines });
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

// ── input routing ──

/// Route one key event through the host's focused scopes, then the
/// navigation layer, then the host defaults. Returns true to quit.
pub fn handle_input(app: &mut App, nav: &mut KeyNav, code: KeyCode, modifiers: KeyModifiers) -> bool {
    let ctrl = modifiers.contains(KeyModifiers::CONTROL);
    if ctrl && matches!(code, KeyCode::Char('q') | KeyCode::Char('c')) {
        return true;
    }
    app.message = None;

    if app.rename.is_some() {
        handle_rename_input(app, code);
        return false;
    }
    if app.settings_form.is_some() {
        handle_settings_input(app, nav, code);
        return false;
    }
    if app.context_menu.is_some() && handle_menu_input(app, code) {
        return false;
    }

    if let Some(press) = KeyPress::from_key_event(code, modifiers) {
        if nav.on_key_down(&press, &*app) == KeyOutcome::Captured {
            return false;
        }
    }

    if ctrl {
        match code {
            KeyCode::Char('e') => app.toggle_focus_area(),
            KeyCode::Char('p') => app.open_settings(nav.settings()),
            KeyCode::Char('o') => app.workspace.cycle_window(),
            KeyCode::Char('w') => app.close_active_leaf(),
            _ => {}
        }
        return false;
    }

    match app.focus_area {
        FocusArea::Panel => match code {
            KeyCode::Up => app.send_tree_key(NativeKey::ArrowUp),
            KeyCode::Down => app.send_tree_key(NativeKey::ArrowDown),
            KeyCode::Left => app.send_tree_key(NativeKey::ArrowLeft),
            KeyCode::Right | KeyCode::Enter => app.send_tree_key(NativeKey::ArrowRight),
            KeyCode::Esc => app.dismiss_popups(),
            KeyCode::Delete => app.send_document_key(NativeKey::Delete),
            KeyCode::F(2) => app.begin_rename(),
            _ => {}
        },
        FocusArea::Editor => match code {
            KeyCode::Esc => app.focus_area = FocusArea::Panel,
            KeyCode::Left => app.workspace.cycle_tab(-1),
            KeyCode::Right => app.workspace.cycle_tab(1),
            _ => {}
        },
    }
    false
}

fn handle_rename_input(app: &mut App, code: KeyCode) {
    match code {
        KeyCode::Enter => app.commit_rename(),
        KeyCode::Esc => app.rename = None,
        other => {
            if let Some(state) = app.rename.as_mut() {
                state.input.handle_key(other);
            }
        }
    }
}

/// Arrows, Enter and Esc belong to an open menu. Anything else falls
/// through so `j`/`k`/`;` still reach the navigation layer.
fn handle_menu_input(app: &mut App, code: KeyCode) -> bool {
    match code {
        KeyCode::Up => app.send_document_key(NativeKey::ArrowUp),
        KeyCode::Down => app.send_document_key(NativeKey::ArrowDown),
        KeyCode::Esc => app.send_document_key(NativeKey::Escape),
        KeyCode::Enter => app.menu_activate(),
        _ => return false,
    }
    true
}

fn handle_settings_input(app: &mut App, nav: &mut KeyNav, code: KeyCode) {
    let Some(form) = app.settings_form.as_mut() else { return };
    match code {
        KeyCode::Esc => {
            form.commit_keys();
            let draft = form.draft.clone();
            app.settings_form = None;
            apply_settings(app, nav, draft);
        }
        KeyCode::Up | KeyCode::BackTab => form.next_field(false),
        KeyCode::Down | KeyCode::Tab => form.next_field(true),
        KeyCode::Enter if form.field == SettingsField::ExcludedKeys => form.commit_keys(),
        KeyCode::Enter | KeyCode::Char(' ') if form.field != SettingsField::ExcludedKeys => form.toggle(),
        other => {
            if form.field == SettingsField::ExcludedKeys {
                form.keys_input.handle_key(other);
            }
        }
    }
}

fn apply_settings(app: &mut App, nav: &mut KeyNav, settings: Settings) {
    if let Err(e) = nav.apply_settings(settings.clone()) {
        return app.show_error(&format!("Settings not applied: {}", e));
    }
    let Some(dir) = app.config_dir.clone() else { return };
    match settings.save_to(&dir) {
        Ok(()) => app.show_message("Settings saved"),
        Err(e) => app.show_error(&format!("Failed to save settings: {}", e)),
    }
}
