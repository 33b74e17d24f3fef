use crate::keybindings::{KeyPress, Keystroke};

use super::host::{AmbientState, ViewType};

/// Decide whether a key event belongs to the navigation layer.
///
/// Checks run cheapest-first: modifiers, active view, text focus, modal,
/// then the user's excluded keys.
pub fn should_handle(press: &KeyPress, ambient: &AmbientState, excluded: &[Keystroke]) -> bool {
    if press.has_reserved_modifier() {
        return false;
    }
    if ambient.active_view != Some(ViewType::FileExplorer) {
        return false;
    }
    if ambient.active_element.accepts_text() {
        return false;
    }
    if ambient.modal_open {
        return false;
    }
    !excluded.contains(&press.keystroke)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keybindings::{parse_excluded_keys, BINDINGS};
    use crate::nav::host::ActiveElement;

    fn panel_focused() -> AmbientState {
        AmbientState {
            active_view: Some(ViewType::FileExplorer),
            active_element: ActiveElement::None,
            modal_open: false,
        }
    }

    fn press(ch: char) -> KeyPress {
        KeyPress::plain(Keystroke::from_char(ch).unwrap())
    }

    #[test]
    fn test_handles_plain_key_on_panel() {
        assert!(should_handle(&press('j'), &panel_focused(), &[]));
    }

    #[test]
    fn test_rejects_reserved_modifiers() {
        for (ctrl, alt, meta) in [(true, false, false), (false, true, false), (false, false, true)] {
            let p = KeyPress { ctrl, alt, meta, ..press('j') };
            assert!(!should_handle(&p, &panel_focused(), &[]));
        }
    }

    #[test]
    fn test_rejects_other_views() {
        for view in [None, Some(ViewType::Editor), Some(ViewType::Other)] {
            let ambient = AmbientState { active_view: view, ..panel_focused() };
            assert!(!should_handle(&press('j'), &ambient, &[]));
        }
    }

    #[test]
    fn test_input_focus_blocks_every_key() {
        let excluded = parse_excluded_keys("Dr").unwrap();
        for element in [ActiveElement::Input, ActiveElement::Renaming, ActiveElement::ContentEditable] {
            let ambient = AmbientState { active_element: element, ..panel_focused() };
            for binding in BINDINGS {
                assert!(!should_handle(&press(binding.key), &ambient, &excluded));
                assert!(!should_handle(&press(binding.key), &ambient, &[]));
            }
        }
    }

    #[test]
    fn test_rejects_when_modal_open() {
        let ambient = AmbientState { modal_open: true, ..panel_focused() };
        assert!(!should_handle(&press('j'), &ambient, &[]));
    }

    #[test]
    fn test_exclusion_is_shift_exact() {
        let excluded = parse_excluded_keys("Dr").unwrap();
        let ambient = panel_focused();
        assert!(!should_handle(&press('D'), &ambient, &excluded));
        assert!(should_handle(&press('d'), &ambient, &excluded));
        assert!(!should_handle(&press('r'), &ambient, &excluded));
        assert!(should_handle(&press('R'), &ambient, &excluded));
    }
}
