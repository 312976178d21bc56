use ansi_to_tui::IntoText;
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState, Wrap},
};

use logsift::FilterExpression;

use crate::app::{AppState, InputMode, LogLevel};

/// Draw the entire UI
pub fn draw(frame: &mut Frame, state: &mut AppState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Header
            Constraint::Min(3),    // Log view
            Constraint::Length(1), // Status bar
            Constraint::Length(1), // Filter bar
        ])
        .split(frame.area());

    draw_header(frame, state, chunks[0]);
    draw_log_view(frame, state, chunks[1]);
    draw_status_bar(frame, state, chunks[2]);
    draw_filter_bar(frame, state, chunks[3]);

    // Draw help overlay if active
    if state.show_help {
        draw_help_overlay(frame);
    }
}

/// Draw the header showing the current source
fn draw_header(frame: &mut Frame, state: &AppState, area: Rect) {
    let header = Paragraph::new(Line::from(vec![
        Span::styled(" logsift ", Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)),
        Span::raw("| "),
        Span::styled(state.source.name(), Style::default().fg(Color::Cyan)),
    ]))
    .style(Style::default().bg(Color::DarkGray));

    frame.render_widget(header, area);
}

/// Turn one displayed line into styled lines: ANSI codes if present,
/// otherwise level color plus keyword highlights
fn styled_line(line: &str, expression: &FilterExpression, level_colors: bool) -> Vec<Line<'static>> {
    if line.contains('\x1b') {
        return line
            .as_bytes()
            .into_text()
            .unwrap_or_else(|_| Text::raw(line.to_string()))
            .lines;
    }

    let base = match LogLevel::detect(line).color() {
        Some(color) if level_colors => Style::default().fg(color),
        _ => Style::default(),
    };
    let highlight = Style::default().fg(Color::Black).bg(Color::Yellow);

    let mut spans = Vec::new();
    let mut pos = 0;
    for range in expression.highlight_ranges(line) {
        if range.start > pos {
            spans.push(Span::styled(line[pos..range.start].to_string(), base));
        }
        spans.push(Span::styled(line[range.clone()].to_string(), highlight));
        pos = range.end;
    }
    if pos < line.len() || spans.is_empty() {
        spans.push(Span::styled(line[pos..].to_string(), base));
    }
    vec![Line::from(spans)]
}

/// Draw the main log view
fn draw_log_view(frame: &mut Frame, state: &mut AppState, area: Rect) {
    let height = area.height as usize;
    if let Some(surface) = state.view.surface_mut() {
        surface.set_viewport_height(height);
    }
    if height == 0 {
        return;
    }
    let Some(surface) = state.view.surface() else {
        return;
    };

    let expression = state.view.filter_expression();
    let mut lines_content: Vec<Line<'static>> = Vec::with_capacity(height);
    for line in surface.visible_lines() {
        lines_content.extend(styled_line(line, expression, state.level_colors_enabled));
    }

    let mut paragraph_scroll = 0;
    if state.line_wrap && surface.is_at_bottom() {
        // Wrapped rows can push the last lines out of the viewport; skip
        // leading rows so the tail stays visible.
        let width = (area.width as usize).max(1);
        let rows: usize = lines_content
            .iter()
            .map(|line| line.width().max(1).div_ceil(width))
            .sum();
        paragraph_scroll = rows.saturating_sub(height);
    }

    let mut paragraph = Paragraph::new(lines_content);
    if state.line_wrap {
        paragraph = paragraph
            .wrap(Wrap { trim: false })
            .scroll((paragraph_scroll.min(u16::MAX as usize) as u16, 0));
    }
    frame.render_widget(paragraph, area);

    // Draw scrollbar if there are more lines than visible
    let shown = surface.line_count();
    if shown > height {
        let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
            .begin_symbol(Some("▲"))
            .end_symbol(Some("▼"));
        let mut scrollbar_state = ScrollbarState::new(shown.saturating_sub(height)).position(surface.scroll());
        frame.render_stateful_widget(scrollbar, area, &mut scrollbar_state);
    }

    let (total, _) = state.line_counts();
    if total == 0 {
        let msg = Paragraph::new("Waiting for log lines...").style(Style::default().fg(Color::DarkGray));
        frame.render_widget(msg, area);
    } else if shown == 0 && !expression.is_identity() {
        let msg = Paragraph::new("No lines match the current filter").style(Style::default().fg(Color::Yellow));
        frame.render_widget(msg, area);
    }
}

/// Draw the status bar
fn draw_status_bar(frame: &mut Frame, state: &AppState, area: Rect) {
    let (total, shown) = state.line_counts();

    let mode_str = match state.mode {
        InputMode::Normal => "NORMAL",
        InputMode::FilterEditing => "FILTER",
    };

    let follow_indicator = if state.is_following() { "[F]" } else { "" };
    let wrap_indicator = if state.line_wrap { "[W]" } else { "" };
    let color_indicator = if state.level_colors_enabled { "[C]" } else { "" };

    let indicators: Vec<&str> = [follow_indicator, wrap_indicator, color_indicator]
        .iter()
        .filter(|s| !s.is_empty())
        .copied()
        .collect();
    let indicators_str = if indicators.is_empty() {
        String::new()
    } else {
        format!(" {}", indicators.join(" "))
    };

    let expression = state.view.filter_expression();
    let filter_str = if expression.is_identity() {
        String::new()
    } else {
        format!(" | filter: {}", expression.keywords().join(" | "))
    };

    let help_text = match state.mode {
        InputMode::FilterEditing => " Enter:apply  Esc:cancel ",
        InputMode::Normal => " ?:help  /:filter  x:clear  y:copy ",
    };

    let status = Line::from(vec![
        Span::styled(format!(" {} ", mode_str), Style::default().bg(Color::Blue).fg(Color::White)),
        Span::raw(format!(" {}/{} lines{}{} ", shown, total, indicators_str, filter_str)),
        Span::styled(help_text, Style::default().fg(Color::DarkGray)),
    ]);

    let paragraph = Paragraph::new(status).style(Style::default().bg(Color::Black));
    frame.render_widget(paragraph, area);
}

/// Draw the filter input bar
fn draw_filter_bar(frame: &mut Frame, state: &AppState, area: Rect) {
    match state.mode {
        InputMode::FilterEditing => {
            let chunks = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([
                    Constraint::Length(1), // "/" prefix
                    Constraint::Min(1),    // textarea
                ])
                .split(area);

            let prefix = Paragraph::new("/").style(Style::default().fg(Color::Yellow));
            frame.render_widget(prefix, chunks[0]);
            frame.render_widget(&state.filter_textarea, chunks[1]);
        }
        InputMode::Normal => {
            if let Some(msg) = &state.status_message {
                let content = Line::from(Span::styled(msg.as_str(), Style::default().fg(Color::Yellow)));
                frame.render_widget(Paragraph::new(content), area);
            }
        }
    }
}

/// Draw the help overlay
fn draw_help_overlay(frame: &mut Frame) {
    let area = frame.area();

    // Center the help box
    let width = 50.min(area.width.saturating_sub(4));
    let height = 20.min(area.height.saturating_sub(4));
    let x = (area.width - width) / 2;
    let y = (area.height - height) / 2;
    let help_area = Rect::new(x, y, width, height);

    frame.render_widget(Clear, help_area);

    let help_text = vec![
        Line::from(Span::styled("Keyboard Shortcuts", Style::default().add_modifier(Modifier::BOLD))),
        Line::from(""),
        Line::from("Navigation:"),
        Line::from("  j/k, ↑/↓     Scroll up/down"),
        Line::from("  g/G          Go to top/bottom (follow)"),
        Line::from("  PgUp/PgDn    Page up/down"),
        Line::from(""),
        Line::from("Filtering:"),
        Line::from("  /            Edit keywords (any one matches)"),
        Line::from("  Esc          Clear filter"),
        Line::from(""),
        Line::from("Log:"),
        Line::from("  x            Clear log"),
        Line::from("  y            Copy filtered lines"),
        Line::from("  w            Toggle line wrapping"),
        Line::from("  c            Toggle level colors"),
        Line::from("  ?            Toggle this help"),
        Line::from("  q            Quit"),
    ];

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .style(Style::default().bg(Color::Black));

    let paragraph = Paragraph::new(help_text).block(block);
    frame.render_widget(paragraph, help_area);
}
