use std::time::Instant;

use crate::config::Settings;
use crate::keybindings::{CommandTable, Keystroke, NavAction};

use super::actions::{CreateContext, OpenOptions, TreeActions};
use super::error::Result;
use super::host::{EntryKind, NativeKey, SplitDirection, TreeHost};
use super::scheduler::Scheduler;

/// Everything one dispatch needs besides the host.
pub struct DispatchContext<'a> {
    pub table: &'a CommandTable,
    pub settings: &'a Settings,
    pub excluded: &'a [Keystroke],
    pub scheduler: &'a mut Scheduler,
    pub now: Instant,
}

/// Run the action bound to `keystroke`. Unbound keys are ignored.
pub fn dispatch<H: TreeHost>(keystroke: Keystroke, host: &mut H, ctx: DispatchContext<'_>) -> Result<()> {
    let Some(action) = ctx.table.lookup(keystroke) else {
        return Ok(());
    };
    let mut actions = TreeActions::new(host, ctx.settings, ctx.excluded, ctx.scheduler, ctx.now);
    run_action(action, &mut actions)
}

fn run_action<H: TreeHost>(action: NavAction, a: &mut TreeActions<'_, H>) -> Result<()> {
    // Actions that work without a focused node.
    match action {
        NavAction::MoveDown => {
            a.move_focus_down();
            return Ok(());
        }
        NavAction::MoveUp => {
            a.move_focus_up();
            return Ok(());
        }
        NavAction::MoveDownAndPreview => return a.move_focus_and_preview(NativeKey::ArrowDown),
        NavAction::MoveUpAndPreview => return a.move_focus_and_preview(NativeKey::ArrowUp),
        NavAction::FocusFirstRoot => {
            a.focus_first_root();
            return Ok(());
        }
        NavAction::FocusLastRoot => {
            a.focus_last_root();
            return Ok(());
        }
        NavAction::CollapseAll => {
            a.collapse_all();
            return Ok(());
        }
        NavAction::ClearSelection => {
            a.clear_selection();
            return Ok(());
        }
        NavAction::ToggleHelp => {
            a.toggle_help();
            return Ok(());
        }
        _ => {}
    }

    let Some(node) = a.focused_node() else {
        return Ok(());
    };
    let is_file = node.is_file();

    match action {
        NavAction::CollapseFolder => a.collapse_current(),
        NavAction::OpenOrExpand => {
            if is_file {
                a.open_file(&node, OpenOptions { focus: true, prevent_duplicate: true })?;
            } else {
                a.expand_current();
            }
        }
        NavAction::OpenBackgroundOrExpandRecursive => {
            if is_file {
                a.open_file(&node, OpenOptions { focus: false, prevent_duplicate: true })?;
            } else {
                a.set_collapsed_recursive(&node.id, false);
            }
        }
        NavAction::CollapseRecursiveOrFocusParent => a.collapse_recursive_or_focus_parent(&node),
        NavAction::ToggleContextMenu => a.toggle_context_menu(&node),
        NavAction::TogglePreview if is_file => a.toggle_preview(&node),
        NavAction::OpenInVerticalSplit if is_file => a.open_in_split(&node, SplitDirection::Vertical, true)?,
        NavAction::OpenInHorizontalSplit if is_file => a.open_in_split(&node, SplitDirection::Horizontal, true)?,
        NavAction::OpenInVerticalSplitBackground if is_file => {
            a.open_in_split(&node, SplitDirection::Vertical, false)?
        }
        NavAction::OpenInHorizontalSplitBackground if is_file => {
            a.open_in_split(&node, SplitDirection::Horizontal, false)?
        }
        NavAction::OpenInNewTab if is_file => a.open_in_new_tab(&node)?,
        NavAction::OpenInNewTabBackground if is_file => a.open_in_new_tab_background(&node)?,
        NavAction::OpenInNewWindow if is_file => a.open_in_new_window(&node)?,
        NavAction::NewFile => a.create_entry(&node, EntryKind::File, CreateContext::Current)?,
        NavAction::NewFolder => a.create_entry(&node, EntryKind::Folder, CreateContext::Current)?,
        NavAction::NewFileInParent => a.create_entry(&node, EntryKind::File, CreateContext::Parent)?,
        NavAction::NewFolderInParent => a.create_entry(&node, EntryKind::Folder, CreateContext::Parent)?,
        NavAction::CloneEntry => a.clone_entry(&node)?,
        NavAction::Rename => a.rename(),
        NavAction::DeleteAndFocusNext => a.delete_and_focus_next(&node),
        NavAction::ToggleSelection => a.toggle_selection(&node),
        // File-only actions on a folder, and the focus-free ones handled above.
        _ => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    use crate::keybindings::BINDINGS;
    use crate::nav::fake::FakeHost;
    use crate::nav::host::{NodeId, ViewType};

    fn press(host: &mut FakeHost, settings: &Settings, scheduler: &mut Scheduler, ch: char) -> Result<()> {
        let table = CommandTable::build(BINDINGS)?;
        let ctx = DispatchContext { table: &table, settings, excluded: &[], scheduler, now: Instant::now() };
        dispatch(Keystroke::from_char(ch)?, host, ctx)
    }

    fn press_default(host: &mut FakeHost, ch: char) {
        let settings = Settings::default();
        let mut scheduler = Scheduler::new();
        press(host, &settings, &mut scheduler, ch).unwrap();
    }

    #[test]
    fn test_j_and_k_move_focus() {
        let mut host = FakeHost::sample();
        host.focus("notes/a.md");
        press_default(&mut host, 'j');
        assert_eq!(host.focused, Some(NodeId::new("notes/b.md")));
        press_default(&mut host, 'k');
        assert_eq!(host.focused, Some(NodeId::new("notes/a.md")));
        // the arrow sent to the tree is a plain one
        assert_eq!(host.tree_keys, vec![NativeKey::ArrowDown, NativeKey::ArrowUp]);
    }

    #[test]
    fn test_l_never_both_opens_and_expands() {
        let mut host = FakeHost::sample();
        host.focus("notes/deep");
        press_default(&mut host, 'l');
        assert!(!host.is_collapsed("notes/deep"));
        assert!(host.native_opens.is_empty());

        host.focus("notes/a.md");
        press_default(&mut host, 'l');
        assert_eq!(host.native_opens, vec![PathBuf::from("notes/a.md")]);
    }

    #[test]
    fn test_shift_l_on_folder_expands_recursively() {
        let mut host = FakeHost::sample();
        host.focus("notes/deep");
        press_default(&mut host, 'L');
        assert!(!host.is_collapsed("notes/deep"));
        assert!(!host.is_collapsed("notes/deep/inner"));
        assert!(host.leaves.iter().all(|l| l.file.is_none()));
    }

    #[test]
    fn test_shift_l_on_file_opens_in_background() {
        let mut host = FakeHost::sample();
        host.focus("readme.md");
        press_default(&mut host, 'L');
        assert_eq!(host.leaf_file(host.first_leaf()), Some(PathBuf::from("readme.md")));
        assert_eq!(host.active_view, Some(ViewType::FileExplorer));
    }

    #[test]
    fn test_shift_j_previews_next_file() {
        let mut host = FakeHost::sample();
        host.focus("notes/a.md");
        press_default(&mut host, 'J');
        assert_eq!(host.focused, Some(NodeId::new("notes/b.md")));
        assert_eq!(host.leaf_file(host.first_leaf()), Some(PathBuf::from("notes/b.md")));
        assert_eq!(host.active_view, Some(ViewType::FileExplorer));

        // landing on a folder opens nothing
        host.focus("notes/c.md");
        press_default(&mut host, 'J');
        assert_eq!(host.focused, Some(NodeId::new("notes/deep")));
        assert_eq!(host.leaf_file(host.first_leaf()), Some(PathBuf::from("notes/b.md")));
    }

    #[test]
    fn test_shift_j_ignores_duplicate_suppression() {
        let mut host = FakeHost::sample();
        let settings = Settings { prevent_duplicate_opens: true, ..Settings::default() };
        let mut scheduler = Scheduler::new();
        let existing = host.seed_open_tab("notes/b.md");
        host.focus("notes/a.md");
        press(&mut host, &settings, &mut scheduler, 'J').unwrap();
        assert_eq!(host.leaf_file(host.first_leaf()), Some(PathBuf::from("notes/b.md")));
        assert_eq!(host.group_of(existing).unwrap().current, 0);
    }

    #[test]
    fn test_file_only_actions_skip_folders() {
        let mut host = FakeHost::sample();
        host.focus("notes");
        let leaves_before = host.leaves.len();
        for ch in ['s', 'i', 'S', 'I', 't', 'T', 'o'] {
            press_default(&mut host, ch);
        }
        assert_eq!(host.leaves.len(), leaves_before);
        assert!(host.preview.is_none());
    }

    #[test]
    fn test_new_window_on_folder_ignores_selection() {
        let mut host = FakeHost::sample();
        host.selection.push(NodeId::new("notes/a.md"));
        host.selection.push(NodeId::new("notes/b.md"));
        host.focus("notes");
        let leaves_before = host.leaves.len();
        press_default(&mut host, 'w');
        assert_eq!(host.leaves.len(), leaves_before);
        assert_eq!(host.selection.len(), 2);
    }

    #[test]
    fn test_focus_required_actions_without_focus() {
        let mut host = FakeHost::sample();
        for ch in ['h', 'l', 'H', 'L', ';', 'n', 'f', 'N', 'F', 'c', 'r', 'D', 'v', 's', 't', 'w', 'o'] {
            press_default(&mut host, ch);
        }
        assert!(host.tree_keys.is_empty());
        assert!(host.created.is_empty());
        assert!(host.copies.is_empty());
        assert_eq!(host.renames, 0);
        assert!(host.context_menu.is_none());
        assert!(host.selection.is_empty());
        assert_eq!(host.entries.len(), FakeHost::sample().entries.len());
    }

    #[test]
    fn test_root_navigation_and_collapse_all() {
        let mut host = FakeHost::sample();
        press_default(&mut host, 'G');
        assert_eq!(host.focused, Some(NodeId::new("readme.md")));
        press_default(&mut host, 'g');
        assert_eq!(host.focused, Some(NodeId::new("notes")));
        press_default(&mut host, 'Z');
        assert_eq!(host.collapse_all_calls, 1);
        assert!(host.is_collapsed("notes"));
    }

    #[test]
    fn test_selection_keys() {
        let mut host = FakeHost::sample();
        host.focus("notes/a.md");
        press_default(&mut host, 'v');
        press_default(&mut host, 'j');
        press_default(&mut host, 'v');
        assert_eq!(host.selection, vec![NodeId::new("notes/a.md"), NodeId::new("notes/b.md")]);
        press_default(&mut host, 'V');
        assert!(host.selection.is_empty());
    }

    #[test]
    fn test_context_menu_key_mirrors_semicolon() {
        use crate::keybindings::PhysicalKey;
        let mut host = FakeHost::sample();
        host.focus("readme.md");
        let table = CommandTable::build(BINDINGS).unwrap();
        let settings = Settings::default();
        let mut scheduler = Scheduler::new();
        let ctx = DispatchContext {
            table: &table,
            settings: &settings,
            excluded: &[],
            scheduler: &mut scheduler,
            now: Instant::now(),
        };
        dispatch(Keystroke::new(PhysicalKey::ContextMenu, false), &mut host, ctx).unwrap();
        assert_eq!(host.context_menu, Some(NodeId::new("readme.md")));
    }

    #[test]
    fn test_unbound_key_is_noop() {
        let mut host = FakeHost::sample();
        host.focus("notes/a.md");
        press_default(&mut host, 'x');
        press_default(&mut host, ':');
        assert!(host.tree_keys.is_empty());
        assert_eq!(host.focused, Some(NodeId::new("notes/a.md")));
    }

    #[test]
    fn test_rename_and_clone() {
        let mut host = FakeHost::sample();
        host.focus("notes/a.md");
        press_default(&mut host, 'c');
        assert_eq!(host.copies, vec![(PathBuf::from("notes/a.md"), PathBuf::from("notes/a 1.md"))]);
        press_default(&mut host, 'r');
        assert_eq!(host.renames, 1);
    }
}
