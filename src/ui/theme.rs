use ratatui::style::{Color, Modifier, Style};

// ═══════════════════════════════════════════════════════════════════════════════
// Icons
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy)]
pub struct ThemeChars {
    pub folder_closed: char,
    pub folder_open: char,
    pub file: char,
    pub selected: char,
}

impl Default for ThemeChars {
    fn default() -> Self {
        Self {
            folder_closed: '▸',
            folder_open: '▾',
            file: ' ',
            selected: '*',
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Base palette
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy)]
pub struct Palette {
    pub bg: Color,
    pub bg_alt: Color,
    pub fg: Color,
    pub fg_dim: Color,
    pub fg_strong: Color,
    pub fg_inverse: Color,
    pub accent: Color,
    pub shortcut: Color,
    pub positive: Color,
    pub highlight: Color,
}

// ═══════════════════════════════════════════════════════════════════════════════
// Per-area colors
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy)]
pub struct PanelColors {
    pub border: Color,
    pub border_active: Color,
    pub file_text: Color,
    pub directory_text: Color,
    pub focused_bg: Color,
    pub focused_text: Color,
    pub marked_text: Color,
}

#[derive(Clone, Copy)]
pub struct TabColors {
    pub text: Color,
    pub current_text: Color,
    pub current_bg: Color,
    /// Flash shown when an already-open tab is revealed
    pub flash_bg: Color,
}

#[derive(Clone, Copy)]
pub struct DialogColors {
    pub bg: Color,
    pub border: Color,
    pub title: Color,
    pub text: Color,
    pub text_dim: Color,
    pub input_text: Color,
    pub input_cursor_bg: Color,
    pub selected_bg: Color,
    pub selected_text: Color,
    pub help_key_text: Color,
    pub error_text: Color,
}

#[derive(Clone, Copy)]
pub struct StatusBarColors {
    pub bg: Color,
    pub text: Color,
    pub key: Color,
    pub error: Color,
}

#[derive(Clone)]
pub struct Theme {
    pub chars: ThemeChars,
    pub palette: Palette,
    pub panel: PanelColors,
    pub tab: TabColors,
    pub dialog: DialogColors,
    pub status_bar: StatusBarColors,
}

impl Default for Theme {
    fn default() -> Self {
        Self::dark()
    }
}

impl Theme {
    pub fn dark() -> Self {
        let palette = Palette {
            bg: Color::Indexed(234),
            bg_alt: Color::Indexed(236),
            fg: Color::Indexed(252),
            fg_dim: Color::Indexed(244),
            fg_strong: Color::Indexed(255),
            fg_inverse: Color::Indexed(234),
            accent: Color::Indexed(74),
            shortcut: Color::Indexed(179),
            positive: Color::Indexed(114),
            highlight: Color::Indexed(203),
        };
        Self::from_palette(palette)
    }

    pub fn light() -> Self {
        let palette = Palette {
            bg: Color::Indexed(255),
            bg_alt: Color::Indexed(253),
            fg: Color::Indexed(236),
            fg_dim: Color::Indexed(245),
            fg_strong: Color::Indexed(232),
            fg_inverse: Color::Indexed(255),
            accent: Color::Indexed(25),
            shortcut: Color::Indexed(130),
            positive: Color::Indexed(28),
            highlight: Color::Indexed(160),
        };
        Self::from_palette(palette)
    }

    fn from_palette(p: Palette) -> Self {
        Self {
            chars: ThemeChars::default(),
            palette: p,
            panel: PanelColors {
                border: p.fg_dim,
                border_active: p.accent,
                file_text: p.fg,
                directory_text: p.fg_strong,
                focused_bg: p.accent,
                focused_text: p.fg_inverse,
                marked_text: p.shortcut,
            },
            tab: TabColors {
                text: p.fg_dim,
                current_text: p.fg_strong,
                current_bg: p.bg_alt,
                flash_bg: p.positive,
            },
            dialog: DialogColors {
                bg: p.bg_alt,
                border: p.accent,
                title: p.fg_strong,
                text: p.fg,
                text_dim: p.fg_dim,
                input_text: p.fg_strong,
                input_cursor_bg: p.fg,
                selected_bg: p.accent,
                selected_text: p.fg_inverse,
                help_key_text: p.shortcut,
                error_text: p.highlight,
            },
            status_bar: StatusBarColors {
                bg: p.bg_alt,
                text: p.fg,
                key: p.shortcut,
                error: p.highlight,
            },
        }
    }

    /// Pick the theme for a terminal background: `COLORFGBG` ending in a
    /// light color index means a light background.
    pub fn detect() -> Self {
        let light = std::env::var("COLORFGBG")
            .ok()
            .and_then(|v| v.rsplit(';').next().and_then(|bg| bg.parse::<u8>().ok()))
            .is_some_and(|bg| bg == 7 || bg == 15);
        if light { Self::light() } else { Self::dark() }
    }

    pub fn title_style(&self, active: bool) -> Style {
        if active {
            Style::default().fg(self.panel.border_active).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(self.panel.file_text)
        }
    }
}
