use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};
use unicode_width::UnicodeWidthStr;

use crate::nav::host::{SplitDirection, TreeHost};
use crate::nav::KeyNav;
use super::{
    app::{App, FocusArea, SettingsField, TextInput},
    theme::Theme,
    workspace::TabGroup,
};

const APP_TITLE: &str = concat!("treenav v", env!("CARGO_PKG_VERSION"));

pub fn draw(frame: &mut Frame, app: &mut App, nav: &KeyNav) {
    // Clone theme to avoid borrow conflict with mutable app
    let theme = app.theme.clone();
    let theme = &theme;
    let area = frame.area();

    if (area.width as u32 * area.height as u32) > 65534 {
        let msg = Paragraph::new("Terminal too large. Please resize smaller.")
            .style(Style::default().fg(theme.status_bar.error).add_modifier(Modifier::BOLD));
        frame.render_widget(msg, Rect::new(0, 0, area.width.min(80), 1));
        return;
    }

    let background = Block::default().style(Style::default().bg(theme.palette.bg));
    frame.render_widget(background, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(1)])
        .split(area);
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(32), Constraint::Min(20)])
        .split(chunks[0]);

    let row_rects = draw_tree(frame, app, columns[0], theme);
    draw_editor(frame, app, columns[1], theme);
    draw_status_bar(frame, app, nav, chunks[1], theme);

    if app.preview.is_some() {
        draw_preview(frame, app, columns[1], theme);
    }
    if app.context_menu.is_some() {
        let anchor = app
            .focused
            .as_ref()
            .and_then(|f| row_rects.iter().find(|(id, _)| id == f))
            .map(|(_, rect)| *rect)
            .unwrap_or(columns[0]);
        draw_context_menu(frame, app, anchor, area, theme);
    }
    if app.help.is_some() {
        draw_help(frame, app, area, theme);
    }
    if app.settings_form.is_some() {
        draw_settings(frame, app, area, theme);
    }
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    )
}

fn dialog_block<'a>(title: &'a str, theme: &Theme) -> Block<'a> {
    Block::default()
        .title(title)
        .title_style(Style::default().fg(theme.dialog.title).add_modifier(Modifier::BOLD))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.dialog.border))
        .style(Style::default().bg(theme.dialog.bg))
}

/// Text field with a block cursor.
fn input_spans<'a>(input: &TextInput, theme: &Theme) -> Vec<Span<'a>> {
    let chars: Vec<char> = input.value.chars().collect();
    let cursor = input.cursor.min(chars.len());
    let before: String = chars[..cursor].iter().collect();
    let at: String = chars.get(cursor).map(|c| c.to_string()).unwrap_or_else(|| " ".to_string());
    let after: String = chars.get(cursor + 1..).map(|rest| rest.iter().collect()).unwrap_or_default();
    let text = Style::default().fg(theme.dialog.input_text);
    vec![
        Span::styled(before, text),
        Span::styled(at, Style::default().fg(theme.palette.bg).bg(theme.dialog.input_cursor_bg)),
        Span::styled(after, text),
    ]
}

/// Draw the file tree. Returns the screen rect of each visible row so
/// popups can anchor to the focused one.
fn draw_tree(
    frame: &mut Frame,
    app: &mut App,
    area: Rect,
    theme: &Theme,
) -> Vec<(crate::nav::host::NodeId, Rect)> {
    let active = app.focus_area == FocusArea::Panel;
    let block = Block::default()
        .title(format!(" {} ", APP_TITLE))
        .title_style(theme.title_style(active))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(if active { theme.panel.border_active } else { theme.panel.border }));
    let inner = block.inner(area);
    frame.render_widget(block, area);
    if inner.height == 0 || inner.width == 0 {
        return Vec::new();
    }

    let rows = app.visible_rows();
    let height = inner.height as usize;
    if let Some(idx) = app.focused.as_ref().and_then(|f| rows.iter().position(|(r, _)| r == f)) {
        if idx < app.tree_scroll {
            app.tree_scroll = idx;
        } else if idx >= app.tree_scroll + height {
            app.tree_scroll = idx + 1 - height;
        }
    }
    app.tree_scroll = app.tree_scroll.min(rows.len().saturating_sub(1));

    let mut rects = Vec::new();
    for (offset, (id, depth)) in rows.iter().skip(app.tree_scroll).take(height).enumerate() {
        let rect = Rect::new(inner.x, inner.y + offset as u16, inner.width, 1);
        let Some(node) = app.node(id) else { continue };
        let name = id
            .path()
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let icon = match node.kind {
            crate::nav::host::NodeKind::Folder { collapsed: true } => theme.chars.folder_closed,
            crate::nav::host::NodeKind::Folder { collapsed: false } => theme.chars.folder_open,
            crate::nav::host::NodeKind::File { .. } => theme.chars.file,
        };
        let marker = if app.selection.contains(id) { theme.chars.selected } else { ' ' };
        let prefix = format!("{}{}{} ", marker, "  ".repeat(*depth), icon);

        let is_focused = app.focused.as_ref() == Some(id);
        let mut style = if node.is_file() {
            Style::default().fg(theme.panel.file_text)
        } else {
            Style::default().fg(theme.panel.directory_text).add_modifier(Modifier::BOLD)
        };
        if app.selection.contains(id) {
            style = style.fg(theme.panel.marked_text);
        }
        if is_focused && active {
            style = style.fg(theme.panel.focused_text).bg(theme.panel.focused_bg);
        } else if is_focused {
            style = style.add_modifier(Modifier::UNDERLINED);
        }

        let renaming = app.rename.as_ref().filter(|r| &r.target == id);
        let line = match renaming {
            Some(state) => {
                let mut spans = vec![Span::styled(prefix, style)];
                spans.extend(input_spans(&state.input, theme));
                Line::from(spans)
            }
            None => {
                let width = (inner.width as usize).saturating_sub(prefix.width());
                Line::from(Span::styled(format!("{}{:<width$}", prefix, name, width = width), style))
            }
        };
        frame.render_widget(Paragraph::new(line), rect);
        rects.push((id.clone(), rect));
    }
    rects
}

fn draw_editor(frame: &mut Frame, app: &App, area: Rect, theme: &Theme) {
    let window = app.workspace.current_window();
    let Some(groups) = app.workspace.windows.get(window).map(|w| &w.groups) else { return };
    if groups.is_empty() {
        return;
    }
    // The first split decides whether groups sit side by side or stacked
    let direction = match groups.get(1).and_then(|g| g.split) {
        Some(SplitDirection::Horizontal) => Direction::Vertical,
        _ => Direction::Horizontal,
    };
    let constraints: Vec<Constraint> = groups.iter().map(|_| Constraint::Ratio(1, groups.len() as u32)).collect();
    let rects = Layout::default().direction(direction).constraints(constraints).split(area);

    for (group, rect) in groups.iter().zip(rects.iter()) {
        draw_tab_group(frame, app, group, *rect, theme);
    }

    if app.workspace.windows.len() > 1 {
        let label = format!(" window {}/{} ", window + 1, app.workspace.windows.len());
        let x = area.x + area.width.saturating_sub(label.width() as u16 + 1);
        frame.render_widget(
            Paragraph::new(Span::styled(label.clone(), Style::default().fg(theme.tab.text))),
            Rect::new(x, area.y, (label.width() as u16).min(area.width), 1),
        );
    }
}

fn draw_tab_group(frame: &mut Frame, app: &App, group: &TabGroup, area: Rect, theme: &Theme) {
    let holds_active = app
        .workspace
        .active
        .is_some_and(|a| group.leaves.iter().any(|l| l.id == a));
    let active = holds_active && app.focus_area == FocusArea::Editor;
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(if active { theme.panel.border_active } else { theme.panel.border }));
    let inner = block.inner(area);
    frame.render_widget(block, area);
    if inner.height < 2 || inner.width == 0 {
        return;
    }

    let mut tabs = Vec::new();
    for (i, leaf) in group.leaves.iter().enumerate() {
        let title = leaf
            .file
            .as_ref()
            .and_then(|f| f.file_name())
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "New tab".to_string());
        let mut style = Style::default().fg(theme.tab.text);
        if i == group.current {
            style = style.fg(theme.tab.current_text).bg(theme.tab.current_bg).add_modifier(Modifier::BOLD);
        }
        if app.workspace.highlighted.contains(&leaf.id) {
            style = style.bg(theme.tab.flash_bg);
        }
        tabs.push(Span::styled(format!(" {} ", title), style));
        tabs.push(Span::raw("│"));
    }
    frame.render_widget(Paragraph::new(Line::from(tabs)), Rect::new(inner.x, inner.y, inner.width, 1));

    let body = Rect::new(inner.x, inner.y + 1, inner.width, inner.height - 1);
    let lines: Vec<Line> = match group.current_leaf().and_then(|l| l.file.as_ref()) {
        Some(file) => app
            .file_lines(file, body.height as usize)
            .into_iter()
            .map(|l| Line::from(Span::styled(l, Style::default().fg(theme.panel.file_text))))
            .collect(),
        None => vec![Line::from(Span::styled(
            "No file is open",
            Style::default().fg(theme.dialog.text_dim),
        ))],
    };
    frame.render_widget(Paragraph::new(lines), body);
}

fn draw_preview(frame: &mut Frame, app: &App, area: Rect, theme: &Theme) {
    let Some(preview) = app.preview.as_ref() else { return };
    let rect = centered_rect(area.width * 4 / 5, area.height * 3 / 5, area);
    frame.render_widget(Clear, rect);
    let title = format!(" {} ", preview.target.path().display());
    let block = dialog_block(&title, theme);
    let inner = block.inner(rect);
    frame.render_widget(block, rect);
    let lines: Vec<Line> = preview
        .lines
        .iter()
        .map(|l| Line::from(Span::styled(l.clone(), Style::default().fg(theme.dialog.text))))
        .collect();
    frame.render_widget(Paragraph::new(lines), inner);
}

fn draw_context_menu(frame: &mut Frame, app: &App, anchor: Rect, area: Rect, theme: &Theme) {
    let Some(menu) = app.context_menu.as_ref() else { return };
    let width = menu.items.iter().map(|i| i.label().width()).max().unwrap_or(0) as u16 + 4;
    let height = menu.items.len() as u16 + 2;
    let width = width.min(area.width.max(1));
    let height = height.min(area.height.max(1));
    let max_x = area.x.saturating_add(area.width.saturating_sub(width));
    let max_y = area.y.saturating_add(area.height.saturating_sub(height));
    let menu_area = Rect::new(anchor.x.saturating_add(4).min(max_x), anchor.y.saturating_add(1).min(max_y), width, height);

    frame.render_widget(Clear, menu_area);
    let block = dialog_block(" Menu ", theme);
    let inner = block.inner(menu_area);
    frame.render_widget(block, menu_area);
    if inner.height == 0 || inner.width == 0 {
        return;
    }

    let selected_style = Style::default()
        .fg(theme.dialog.selected_text)
        .bg(theme.dialog.selected_bg)
        .add_modifier(Modifier::BOLD);
    let normal_style = Style::default().fg(theme.dialog.text);
    // Rows past the clamped height are dropped, not clipped
    for (i, item) in menu.items.iter().enumerate().take(inner.height as usize) {
        let y = inner.y + i as u16;
        let style = if i == menu.selected { selected_style } else { normal_style };
        let label = format!(" {:<width$}", item.label(), width = inner.width.saturating_sub(1) as usize);
        frame.render_widget(Paragraph::new(Span::styled(label, style)), Rect::new(inner.x, y, inner.width, 1));
    }
}

fn draw_help(frame: &mut Frame, app: &App, area: Rect, theme: &Theme) {
    let Some(help) = app.help.as_ref() else { return };
    let key_style = Style::default().fg(theme.dialog.help_key_text).add_modifier(Modifier::BOLD);
    let text_style = Style::default().fg(theme.dialog.text);
    let dim_style = Style::default().fg(theme.dialog.text_dim);

    let mut lines: Vec<Line> = help
        .enabled
        .iter()
        .map(|e| Line::from(vec![Span::styled(format!(" {:>3}  ", e.key), key_style), Span::styled(e.description.clone(), text_style)]))
        .collect();
    if !help.disabled.is_empty() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(" Disabled in settings", dim_style.add_modifier(Modifier::BOLD))));
        lines.extend(help.disabled.iter().map(|e| {
            Line::from(vec![
                Span::styled(format!(" {:>3}  ", e.key), dim_style),
                Span::styled(e.description.clone(), dim_style.add_modifier(Modifier::CROSSED_OUT)),
            ])
        }));
    }

    let width = lines.iter().map(|l| l.width()).max().unwrap_or(0) as u16 + 4;
    let rect = centered_rect(width, lines.len() as u16 + 2, area);
    frame.render_widget(Clear, rect);
    let block = dialog_block(" Keys ", theme);
    let inner = block.inner(rect);
    frame.render_widget(block, rect);
    frame.render_widget(Paragraph::new(lines), inner);
}

fn draw_settings(frame: &mut Frame, app: &App, area: Rect, theme: &Theme) {
    let Some(form) = app.settings_form.as_ref() else { return };
    let rect = centered_rect(64, 11, area);
    frame.render_widget(Clear, rect);
    let block = dialog_block(" Settings ", theme);
    let inner = block.inner(rect);
    frame.render_widget(block, rect);

    let label = |field: SettingsField, text: &str| {
        let style = if form.field == field {
            Style::default().fg(theme.dialog.selected_text).bg(theme.dialog.selected_bg)
        } else {
            Style::default().fg(theme.dialog.text)
        };
        Span::styled(format!(" {:<28}", text), style)
    };
    let check = |on: bool, enabled: bool| {
        let style = if enabled { Style::default().fg(theme.dialog.input_text) } else { Style::default().fg(theme.dialog.text_dim) };
        Span::styled(if on { " [x]" } else { " [ ]" }, style)
    };

    let mut keys_line = vec![label(SettingsField::ExcludedKeys, "Excluded keys")];
    keys_line.push(Span::raw(" "));
    if form.field == SettingsField::ExcludedKeys {
        keys_line.extend(input_spans(&form.keys_input, theme));
    } else {
        keys_line.push(Span::styled(form.keys_input.value.clone(), Style::default().fg(theme.dialog.input_text)));
    }

    let mut lines = vec![
        keys_line,
        vec![
            label(SettingsField::PreventDuplicates, "Prevent duplicate opens"),
            check(form.draft.prevent_duplicate_opens, true),
        ],
        vec![
            label(SettingsField::VisualAid, "Flash revealed tab"),
            check(form.draft.background_open_visual_aid, form.draft.visual_aid_editable()),
        ],
        vec![],
    ];
    if let Some(error) = form.error.as_ref() {
        lines.push(vec![Span::styled(format!(" {}", error), Style::default().fg(theme.dialog.error_text))]);
    }
    lines.push(vec![Span::styled(
        " ↑↓ field  Space toggle  Enter apply keys  Esc save & close",
        Style::default().fg(theme.dialog.text_dim),
    )]);
    let lines: Vec<Line> = lines.into_iter().map(Line::from).collect();
    frame.render_widget(Paragraph::new(lines), inner);
}

fn draw_status_bar(frame: &mut Frame, app: &App, nav: &KeyNav, area: Rect, theme: &Theme) {
    let bar = Style::default().bg(theme.status_bar.bg).fg(theme.status_bar.text);

    let left: Vec<Span> = match app.message.as_ref() {
        Some(msg) => {
            let color = if app.message_is_error { theme.status_bar.error } else { theme.status_bar.text };
            vec![Span::styled(format!(" {} ", msg), bar.fg(color).add_modifier(Modifier::BOLD))]
        }
        None => {
            let key = bar.fg(theme.status_bar.key);
            vec![
                Span::styled(" ?", key),
                Span::styled(" keys  ", bar),
                Span::styled("^E", key),
                Span::styled(" panel/editor  ", bar),
                Span::styled("^P", key),
                Span::styled(" settings  ", bar),
                Span::styled("^Q", key),
                Span::styled(" quit ", bar),
            ]
        }
    };

    let state = if nav.is_attached() { "nav on" } else { "nav off" };
    let excluded = &nav.settings().excluded_keys;
    let right = if excluded.is_empty() {
        format!(" {} ", state)
    } else {
        format!(" {} | excluded: {} ", state, excluded)
    };

    let used: usize = left.iter().map(|s| s.content.width()).sum::<usize>() + right.width();
    let mut spans = left;
    spans.push(Span::styled(" ".repeat((area.width as usize).saturating_sub(used)), bar));
    spans.push(Span::styled(right, bar));
    frame.render_widget(Paragraph::new(Line::from(spans)).style(bar), area);
}
