use std::collections::HashMap;
use std::fmt;
use crossterm::event::{KeyCode, KeyModifiers};
use regex::Regex;

use crate::nav::error::{NavError, Result};

// ─── Keystroke normalization ───────────────────────────────────────────

/// Physical key position, independent of the character it produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PhysicalKey {
    /// Letter key, stored uppercase (`'A'..='Z'`).
    Letter(char),
    Semicolon,
    Slash,
    ContextMenu,
}

impl PhysicalKey {
    /// Canonical code name (`"KeyJ"`, `"Semicolon"`, ...).
    #[cfg(test)]
    pub fn code(&self) -> String {
        match self {
            PhysicalKey::Letter(ch) => format!("Key{}", ch),
            PhysicalKey::Semicolon => "Semicolon".to_string(),
            PhysicalKey::Slash => "Slash".to_string(),
            PhysicalKey::ContextMenu => "ContextMenu".to_string(),
        }
    }
}

/// A normalized `(code, shift)` pair.
///
/// This is the unit every comparison in the navigation layer works on:
/// excluded keys from settings, incoming terminal events and the command
/// table all reduce to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Keystroke {
    pub code: PhysicalKey,
    pub shift: bool,
}

impl Keystroke {
    pub fn new(code: PhysicalKey, shift: bool) -> Self {
        Self { code, shift }
    }

    /// Map a single configured character to its keystroke.
    ///
    /// `j` → (`KeyJ`, no shift), `J` → (`KeyJ`, shift), `;`/`:` → `Semicolon`,
    /// `/`/`?` → `Slash`. Anything else is a settings/validation mismatch.
    pub fn from_char(ch: char) -> Result<Self> {
        match ch {
            'a'..='z' => Ok(Self::new(PhysicalKey::Letter(ch.to_ascii_uppercase()), false)),
            'A'..='Z' => Ok(Self::new(PhysicalKey::Letter(ch), true)),
            ';' => Ok(Self::new(PhysicalKey::Semicolon, false)),
            ':' => Ok(Self::new(PhysicalKey::Semicolon, true)),
            '/' => Ok(Self::new(PhysicalKey::Slash, false)),
            '?' => Ok(Self::new(PhysicalKey::Slash, true)),
            other => Err(NavError::UnsupportedKey(other)),
        }
    }

    /// Inverse of [`Keystroke::from_char`]. `ContextMenu` has no character.
    pub fn to_char(&self) -> Option<char> {
        match (self.code, self.shift) {
            (PhysicalKey::Letter(ch), false) => Some(ch.to_ascii_lowercase()),
            (PhysicalKey::Letter(ch), true) => Some(ch),
            (PhysicalKey::Semicolon, false) => Some(';'),
            (PhysicalKey::Semicolon, true) => Some(':'),
            (PhysicalKey::Slash, false) => Some('/'),
            (PhysicalKey::Slash, true) => Some('?'),
            (PhysicalKey::ContextMenu, _) => None,
        }
    }

    /// User-facing label: `j`, `Shift+J`, `;`, `?`, `Menu`.
    pub fn display(&self) -> String {
        match (self.code, self.shift) {
            (PhysicalKey::Letter(ch), true) => format!("Shift+{}", ch),
            (PhysicalKey::ContextMenu, false) => "Menu".to_string(),
            (PhysicalKey::ContextMenu, true) => "Shift+Menu".to_string(),
            _ => self.to_char().map(String::from).unwrap_or_default(),
        }
    }
}

impl fmt::Display for Keystroke {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display())
    }
}

/// A terminal key event reduced to what the gatekeeper looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyPress {
    pub keystroke: Keystroke,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl KeyPress {
    #[cfg(test)]
    pub fn plain(keystroke: Keystroke) -> Self {
        Self { keystroke, ctrl: false, alt: false, meta: false }
    }

    /// Normalize a crossterm event. Keys outside the navigation alphabet
    /// (arrows, Enter, digits, ...) yield `None` and are left to the host.
    pub fn from_key_event(code: KeyCode, modifiers: KeyModifiers) -> Option<Self> {
        let shift = modifiers.contains(KeyModifiers::SHIFT);
        let keystroke = match code {
            // Terminals disagree on whether Shift+j arrives as 'J' or as 'j'
            // with SHIFT; both mean the same physical key.
            KeyCode::Char(ch) if ch.is_ascii_alphabetic() => {
                let ch = if shift { ch.to_ascii_uppercase() } else { ch };
                Keystroke::from_char(ch).ok()?
            }
            KeyCode::Char(';') if shift => Keystroke::new(PhysicalKey::Semicolon, true),
            KeyCode::Char('/') if shift => Keystroke::new(PhysicalKey::Slash, true),
            KeyCode::Char(ch) => Keystroke::from_char(ch).ok()?,
            KeyCode::Menu => Keystroke::new(PhysicalKey::ContextMenu, shift),
            _ => return None,
        };
        Some(Self {
            keystroke,
            ctrl: modifiers.contains(KeyModifiers::CONTROL),
            alt: modifiers.contains(KeyModifiers::ALT),
            meta: modifiers.intersects(KeyModifiers::SUPER | KeyModifiers::META),
        })
    }

    /// Ctrl/Alt/Meta combinations belong to the host or the OS.
    pub fn has_reserved_modifier(&self) -> bool {
        self.ctrl || self.alt || self.meta
    }
}

/// Parse an excluded-keys string into keystrokes.
pub fn parse_excluded_keys(value: &str) -> Result<Vec<Keystroke>> {
    value.chars().map(Keystroke::from_char).collect()
}

// ─── Command table ─────────────────────────────────────────────────────

/// Every action the navigation layer can perform on the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NavAction {
    // unshifted
    MoveDown,
    MoveUp,
    CollapseFolder,
    OpenOrExpand,
    ToggleContextMenu,
    OpenInVerticalSplit,
    OpenInHorizontalSplit,
    NewFile,
    NewFolder,
    CloneEntry,
    Rename,
    FocusFirstRoot,
    OpenInNewTab,
    ToggleSelection,
    OpenInNewWindow,
    TogglePreview,
    // shifted
    CollapseAll,
    NewFileInParent,
    NewFolderInParent,
    DeleteAndFocusNext,
    OpenInVerticalSplitBackground,
    OpenInHorizontalSplitBackground,
    OpenBackgroundOrExpandRecursive,
    CollapseRecursiveOrFocusParent,
    FocusLastRoot,
    OpenInNewTabBackground,
    MoveDownAndPreview,
    MoveUpAndPreview,
    ClearSelection,
    ToggleHelp,
}

/// One row of the binding table: the configured character, the action and
/// the help text shown in the overlay.
#[derive(Debug, Clone, Copy)]
pub struct Binding {
    pub key: char,
    pub action: NavAction,
    pub description: &'static str,
}

const fn bind(key: char, action: NavAction, description: &'static str) -> Binding {
    Binding { key, action, description }
}

/// Ordered binding list. Order here is the order of the help overlay.
pub const BINDINGS: &[Binding] = &[
    bind('j', NavAction::MoveDown, "Move focus down"),
    bind('k', NavAction::MoveUp, "Move focus up"),
    bind('J', NavAction::MoveDownAndPreview, "Move down and open file in background"),
    bind('K', NavAction::MoveUpAndPreview, "Move up and open file in background"),
    bind('h', NavAction::CollapseFolder, "Collapse folder / focus parent"),
    bind('l', NavAction::OpenOrExpand, "Open file / expand folder"),
    bind('H', NavAction::CollapseRecursiveOrFocusParent, "Collapse folder recursively / focus parent"),
    bind('L', NavAction::OpenBackgroundOrExpandRecursive, "Open file in background / expand recursively"),
    bind('g', NavAction::FocusFirstRoot, "Focus first root entry"),
    bind('G', NavAction::FocusLastRoot, "Focus last root entry"),
    bind('Z', NavAction::CollapseAll, "Collapse all folders"),
    bind(';', NavAction::ToggleContextMenu, "Toggle context menu"),
    bind('o', NavAction::TogglePreview, "Toggle file preview popup"),
    bind('s', NavAction::OpenInVerticalSplit, "Open in vertical split"),
    bind('i', NavAction::OpenInHorizontalSplit, "Open in horizontal split"),
    bind('S', NavAction::OpenInVerticalSplitBackground, "Open in vertical split (background)"),
    bind('I', NavAction::OpenInHorizontalSplitBackground, "Open in horizontal split (background)"),
    bind('t', NavAction::OpenInNewTab, "Open in new tab"),
    bind('T', NavAction::OpenInNewTabBackground, "Open in new tab (background)"),
    bind('w', NavAction::OpenInNewWindow, "Open selection in new window"),
    bind('n', NavAction::NewFile, "New file"),
    bind('f', NavAction::NewFolder, "New folder"),
    bind('N', NavAction::NewFileInParent, "New file in parent folder"),
    bind('F', NavAction::NewFolderInParent, "New folder in parent folder"),
    bind('c', NavAction::CloneEntry, "Clone entry"),
    bind('r', NavAction::Rename, "Rename entry"),
    bind('D', NavAction::DeleteAndFocusNext, "Delete entry"),
    bind('v', NavAction::ToggleSelection, "Toggle selection"),
    bind('V', NavAction::ClearSelection, "Clear selection"),
    bind('?', NavAction::ToggleHelp, "Toggle this help"),
];

/// Fixed lookup tables, one per shift state.
pub struct CommandTable {
    unshifted: HashMap<PhysicalKey, NavAction>,
    shifted: HashMap<PhysicalKey, NavAction>,
}

impl CommandTable {
    pub fn build(bindings: &[Binding]) -> Result<Self> {
        let mut unshifted = HashMap::new();
        let mut shifted = HashMap::new();
        for binding in bindings {
            let keystroke = Keystroke::from_char(binding.key)?;
            let table = if keystroke.shift { &mut shifted } else { &mut unshifted };
            table.insert(keystroke.code, binding.action);
        }
        // The dedicated context-menu key mirrors ';'.
        unshifted.insert(PhysicalKey::ContextMenu, NavAction::ToggleContextMenu);
        Ok(Self { unshifted, shifted })
    }

    pub fn lookup(&self, keystroke: Keystroke) -> Option<NavAction> {
        let table = if keystroke.shift { &self.shifted } else { &self.unshifted };
        table.get(&keystroke.code).copied()
    }
}

/// The characters a user may put into the excluded-keys setting: exactly
/// the characters bound in [`BINDINGS`].
pub fn allowed_chars() -> String {
    BINDINGS.iter().map(|b| b.key).collect()
}

/// Allow-list pattern for the excluded-keys field.
pub fn excluded_keys_pattern() -> Result<Regex> {
    let class: String = allowed_chars()
        .chars()
        .map(|ch| regex::escape(&ch.to_string()))
        .collect();
    Regex::new(&format!("^[{}]*$", class))
        .map_err(|e| NavError::Host(format!("Invalid allow-list pattern: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_letter_normalization() {
        assert_eq!(Keystroke::from_char('j').unwrap(), Keystroke::new(PhysicalKey::Letter('J'), false));
        assert_eq!(Keystroke::from_char('D').unwrap(), Keystroke::new(PhysicalKey::Letter('D'), true));
        assert_eq!(Keystroke::from_char('j').unwrap().code.code(), "KeyJ");
    }

    #[test]
    fn test_punctuation_normalization() {
        assert_eq!(Keystroke::from_char(';').unwrap(), Keystroke::new(PhysicalKey::Semicolon, false));
        assert_eq!(Keystroke::from_char(':').unwrap(), Keystroke::new(PhysicalKey::Semicolon, true));
        assert_eq!(Keystroke::from_char('?').unwrap(), Keystroke::new(PhysicalKey::Slash, true));
    }

    #[test]
    fn test_unsupported_character_fails() {
        for ch in ['1', ' ', '*', 'é', '\n'] {
            assert!(matches!(Keystroke::from_char(ch), Err(NavError::UnsupportedKey(c)) if c == ch));
        }
    }

    #[test]
    fn test_round_trip_over_allowed_alphabet() {
        for ch in allowed_chars().chars().chain([':', '/']) {
            let keystroke = Keystroke::from_char(ch).unwrap();
            let back = keystroke.to_char().unwrap();
            assert_eq!(Keystroke::from_char(back).unwrap(), keystroke, "char {:?}", ch);
        }
    }

    #[test]
    fn test_allowed_alphabet_matches_bindings() {
        let allowed = allowed_chars();
        for ch in "jJkKgGvVhHlLZsSiItTwonNfFrcD;?".chars() {
            assert!(allowed.contains(ch), "missing {:?}", ch);
        }
        assert_eq!(allowed.chars().count(), 30);
    }

    #[test]
    fn test_pattern_accepts_and_rejects() {
        let re = excluded_keys_pattern().unwrap();
        assert!(re.is_match(""));
        assert!(re.is_match("Dr"));
        assert!(re.is_match("Zl;?"));
        assert!(!re.is_match("x"));
        assert!(!re.is_match("D r"));
        assert!(!re.is_match(":"));
    }

    #[test]
    fn test_key_event_mapping() {
        let press = KeyPress::from_key_event(KeyCode::Char('j'), KeyModifiers::NONE).unwrap();
        assert_eq!(press.keystroke, Keystroke::from_char('j').unwrap());
        assert!(!press.has_reserved_modifier());

        let press = KeyPress::from_key_event(KeyCode::Char('D'), KeyModifiers::SHIFT).unwrap();
        assert_eq!(press.keystroke, Keystroke::from_char('D').unwrap());

        // Uppercase without a SHIFT flag still means shift
        let press = KeyPress::from_key_event(KeyCode::Char('D'), KeyModifiers::NONE).unwrap();
        assert!(press.keystroke.shift);

        let press = KeyPress::from_key_event(KeyCode::Char('n'), KeyModifiers::SHIFT).unwrap();
        assert_eq!(press.keystroke, Keystroke::from_char('N').unwrap());

        let press = KeyPress::from_key_event(KeyCode::Char('c'), KeyModifiers::CONTROL).unwrap();
        assert!(press.has_reserved_modifier());

        let press = KeyPress::from_key_event(KeyCode::Menu, KeyModifiers::NONE).unwrap();
        assert_eq!(press.keystroke.code, PhysicalKey::ContextMenu);

        assert!(KeyPress::from_key_event(KeyCode::Up, KeyModifiers::NONE).is_none());
        assert!(KeyPress::from_key_event(KeyCode::Char('1'), KeyModifiers::NONE).is_none());
    }

    #[test]
    fn test_shifted_punctuation_folds_shift_flag() {
        let press = KeyPress::from_key_event(KeyCode::Char(';'), KeyModifiers::SHIFT).unwrap();
        assert_eq!(press.keystroke, Keystroke::from_char(':').unwrap());
        let press = KeyPress::from_key_event(KeyCode::Char('/'), KeyModifiers::SHIFT).unwrap();
        assert_eq!(press.keystroke, Keystroke::from_char('?').unwrap());

        let table = CommandTable::build(BINDINGS).unwrap();
        assert_eq!(table.lookup(press.keystroke), table.lookup(Keystroke::from_char('?').unwrap()));

        // Already-shifted characters keep their meaning either way
        let press = KeyPress::from_key_event(KeyCode::Char('?'), KeyModifiers::SHIFT).unwrap();
        assert_eq!(press.keystroke, Keystroke::from_char('?').unwrap());
        let press = KeyPress::from_key_event(KeyCode::Char(';'), KeyModifiers::NONE).unwrap();
        assert_eq!(press.keystroke, Keystroke::from_char(';').unwrap());
    }

    #[test]
    fn test_command_table_is_split_by_shift() {
        let table = CommandTable::build(BINDINGS).unwrap();
        let j = Keystroke::from_char('j').unwrap();
        let shift_j = Keystroke::from_char('J').unwrap();
        assert_eq!(table.lookup(j), Some(NavAction::MoveDown));
        assert_eq!(table.lookup(shift_j), Some(NavAction::MoveDownAndPreview));
        assert_eq!(table.lookup(Keystroke::from_char('D').unwrap()), Some(NavAction::DeleteAndFocusNext));
        assert_eq!(table.lookup(Keystroke::from_char('d').unwrap()), None);
        assert_eq!(
            table.lookup(Keystroke::new(PhysicalKey::ContextMenu, false)),
            Some(NavAction::ToggleContextMenu)
        );
        assert_eq!(table.lookup(Keystroke::from_char('x').unwrap()), None);
    }

    #[test]
    fn test_display_labels() {
        assert_eq!(Keystroke::from_char('j').unwrap().display(), "j");
        assert_eq!(Keystroke::from_char('J').unwrap().display(), "Shift+J");
        assert_eq!(Keystroke::from_char('?').unwrap().display(), "?");
        assert_eq!(Keystroke::new(PhysicalKey::ContextMenu, false).display(), "Menu");
    }

    #[test]
    fn test_parse_excluded_keys() {
        let keys = parse_excluded_keys("Dr").unwrap();
        assert_eq!(keys, vec![
            Keystroke::new(PhysicalKey::Letter('D'), true),
            Keystroke::new(PhysicalKey::Letter('R'), false),
        ]);
        assert!(parse_excluded_keys("D1").is_err());
    }
}
