//! Help overlay content.

use crate::keybindings::{Binding, Keystroke, BINDINGS};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HelpEntry {
    pub key: String,
    pub description: String,
}

/// Binding list split by whether the excluded-keys setting disables it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HelpOverlay {
    pub enabled: Vec<HelpEntry>,
    pub disabled: Vec<HelpEntry>,
}

impl HelpOverlay {
    pub fn build(excluded: &[Keystroke]) -> Self {
        Self::from_bindings(BINDINGS, excluded)
    }

    pub fn from_bindings(bindings: &[Binding], excluded: &[Keystroke]) -> Self {
        let mut overlay = Self::default();
        for binding in bindings {
            let entry = HelpEntry {
                key: binding.key.to_string(),
                description: binding.description.to_string(),
            };
            let is_excluded = Keystroke::from_char(binding.key)
                .map(|k| excluded.contains(&k))
                .unwrap_or(false);
            if is_excluded {
                overlay.disabled.push(entry);
            } else {
                overlay.enabled.push(entry);
            }
        }
        overlay
    }

    /// Plain-text rendering, used by `--keys`.
    pub fn to_lines(&self) -> Vec<String> {
        let mut lines: Vec<String> = self.enabled.iter()
            .map(|e| format!("  {:4} {}", e.key, e.description))
            .collect();
        if !self.disabled.is_empty() {
            lines.push(String::new());
            lines.push("Disabled in settings:".to_string());
            lines.extend(self.disabled.iter().map(|e| format!("  {:4} {}", e.key, e.description)));
        }
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keybindings::parse_excluded_keys;

    #[test]
    fn test_partition_by_exclusions() {
        let excluded = parse_excluded_keys("Dr").unwrap();
        let overlay = HelpOverlay::build(&excluded);
        let disabled: Vec<&str> = overlay.disabled.iter().map(|e| e.key.as_str()).collect();
        assert_eq!(disabled, vec!["r", "D"]);
        assert_eq!(overlay.enabled.len() + overlay.disabled.len(), BINDINGS.len());
        assert!(overlay.enabled.iter().all(|e| e.key != "D" && e.key != "r"));
    }

    #[test]
    fn test_enabled_keeps_table_order() {
        let overlay = HelpOverlay::build(&[]);
        assert!(overlay.disabled.is_empty());
        assert_eq!(overlay.enabled[0].key, "j");
        assert_eq!(overlay.enabled.last().map(|e| e.key.as_str()), Some("?"));
    }

    #[test]
    fn test_lines_show_disabled_section() {
        let excluded = parse_excluded_keys("D").unwrap();
        let lines = HelpOverlay::build(&excluded).to_lines();
        let marker = lines.iter().position(|l| l == "Disabled in settings:").unwrap();
        assert!(lines[marker + 1].contains("Delete entry"));
    }
}
