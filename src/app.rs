use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use ratatui::style::{Color, Style};
use tui_textarea::{CursorMove, TextArea};

use logsift::{Config, LogView};

use crate::sources::{LogSourceType, SourceStatus};
use crate::terminal::TerminalSurface;

/// Detected log level
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
    None,
}

impl LogLevel {
    /// Detect log level from a line of text
    pub fn detect(line: &str) -> Self {
        let upper = line.to_uppercase();
        if upper.contains("ERROR") || upper.contains("[E]") || upper.contains("ERR]") {
            LogLevel::Error
        } else if upper.contains("WARN") || upper.contains("[W]") || upper.contains("WRN]") {
            LogLevel::Warn
        } else if upper.contains("INFO") || upper.contains("[I]") || upper.contains("INF]") {
            LogLevel::Info
        } else if upper.contains("DEBUG") || upper.contains("[D]") || upper.contains("DBG]") {
            LogLevel::Debug
        } else if upper.contains("TRACE") || upper.contains("[T]") || upper.contains("TRC]") {
            LogLevel::Trace
        } else {
            LogLevel::None
        }
    }

    /// Get the color for this log level
    pub fn color(&self) -> Option<Color> {
        match self {
            LogLevel::Error => Some(Color::Red),
            LogLevel::Warn => Some(Color::Yellow),
            LogLevel::Info => Some(Color::Green),
            LogLevel::Debug => Some(Color::Blue),
            LogLevel::Trace => Some(Color::DarkGray),
            LogLevel::None => None,
        }
    }
}

/// Input mode for the application
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputMode {
    /// Normal navigation mode
    Normal,
    /// Editing the filter text
    FilterEditing,
}

/// Main application state
pub struct AppState<'a> {
    /// The filtered log view
    pub view: LogView<TerminalSurface>,
    /// Where the log comes from
    pub source: LogSourceType,
    /// Current input mode
    pub mode: InputMode,
    /// Filter text input widget
    pub filter_textarea: TextArea<'a>,
    /// Expression in effect when filter editing started
    filter_before_edit: String,
    /// Whether the app should quit
    pub should_quit: bool,
    /// Status message to display
    pub status_message: Option<String>,
    /// Last time filter input changed (for debounce)
    pub filter_last_change: Option<Instant>,
    /// Whether we need to recompute filter (after debounce)
    pub filter_needs_recompute: bool,
    filter_debounce: Duration,
    /// Whether to show help overlay
    pub show_help: bool,
    /// Whether to apply log level coloring (for lines without ANSI)
    pub level_colors_enabled: bool,
    /// Whether to wrap long lines
    pub line_wrap: bool,
}

fn filter_textarea<'a>(text: &str) -> TextArea<'a> {
    let mut textarea = TextArea::new(vec![text.to_string()]);
    textarea.set_cursor_line_style(Style::default());
    textarea.set_placeholder_text("type keywords to filter...");
    textarea.set_placeholder_style(Style::default().fg(Color::DarkGray));
    textarea.move_cursor(CursorMove::End);
    textarea
}

impl<'a> AppState<'a> {
    pub fn new(config: &Config, source: LogSourceType, initial_text: &str) -> Self {
        let view = LogView::new(TerminalSurface::new(), initial_text, &config.view);

        Self {
            view,
            source,
            mode: InputMode::Normal,
            filter_textarea: filter_textarea(""),
            filter_before_edit: String::new(),
            should_quit: false,
            status_message: None,
            filter_last_change: None,
            filter_needs_recompute: false,
            filter_debounce: Duration::from_millis(config.filter_debounce_ms),
            show_help: false,
            level_colors_enabled: config.level_colors,
            line_wrap: config.soft_wrap,
        }
    }

    fn surface_mut(&mut self) -> Option<&mut TerminalSurface> {
        self.view.surface_mut()
    }

    /// Whether new lines will keep the view at the bottom
    pub fn is_following(&self) -> bool {
        self.view.is_following()
    }

    /// Toggle log level coloring
    pub fn toggle_level_colors(&mut self) {
        self.level_colors_enabled = !self.level_colors_enabled;
        self.status_message = Some(format!(
            "Level colors: {}",
            if self.level_colors_enabled { "on" } else { "off" }
        ));
    }

    /// Toggle line wrapping
    pub fn toggle_line_wrap(&mut self) {
        self.line_wrap = !self.line_wrap;
        self.status_message = Some(format!(
            "Line wrap: {}",
            if self.line_wrap { "on" } else { "off" }
        ));
    }

    /// Show or hide the help overlay. The log view is hidden underneath it.
    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
        self.view.set_visible(!self.show_help);
    }

    pub fn scroll_up(&mut self, n: usize) {
        if let Some(surface) = self.surface_mut() {
            surface.scroll_up(n);
        }
    }

    pub fn scroll_down(&mut self, n: usize) {
        if let Some(surface) = self.surface_mut() {
            surface.scroll_down(n);
        }
    }

    /// Go to the top of the log
    pub fn go_to_top(&mut self) {
        if let Some(surface) = self.surface_mut() {
            surface.go_to_top();
        }
    }

    /// Go to the bottom of the log; new lines will be followed again
    pub fn go_to_bottom(&mut self) {
        if let Some(surface) = self.surface_mut() {
            surface.go_to_bottom();
        }
    }

    /// Get the current filter input text
    pub fn filter_input(&self) -> String {
        self.filter_textarea.lines().join(" ")
    }

    /// Start editing the filter, keeping the current expression
    pub fn begin_filter_edit(&mut self) {
        self.filter_before_edit = self.view.filter_expression().pattern.clone();
        self.filter_textarea = filter_textarea(&self.filter_before_edit);
        self.mode = InputMode::FilterEditing;
    }

    /// Push the filter input into the view
    fn push_filter(&mut self) {
        let input = self.filter_input();
        self.view.set_filter_expression(&input);
        self.filter_last_change = None;
        self.filter_needs_recompute = false;
    }

    /// Apply the current filter input and leave editing
    pub fn apply_filter(&mut self) {
        self.push_filter();
        self.mode = InputMode::Normal;
    }

    /// Cancel filter editing and restore the previous expression
    pub fn cancel_filter(&mut self) {
        let prev = std::mem::take(&mut self.filter_before_edit);
        self.filter_textarea = filter_textarea(&prev);
        self.push_filter();
        self.mode = InputMode::Normal;
    }

    /// Drop the filter and show the whole log
    pub fn clear_filter(&mut self) {
        if self.view.filter_expression().is_identity() && self.filter_input().is_empty() {
            return;
        }
        self.filter_textarea = filter_textarea("");
        self.push_filter();
        self.status_message = Some("Filter cleared".to_string());
    }

    /// Filter input changed; apply now or after the debounce delay
    pub fn filter_changed(&mut self) {
        if self.filter_debounce.is_zero() {
            self.push_filter();
        } else {
            self.filter_last_change = Some(Instant::now());
            self.filter_needs_recompute = true;
        }
    }

    /// Check if debounce period has passed and recompute if needed
    pub fn check_filter_debounce(&mut self) {
        if let Some(last_change) = self.filter_last_change {
            if last_change.elapsed() >= self.filter_debounce && self.filter_needs_recompute {
                self.push_filter();
            }
        }
    }

    /// Empty the log, if this view offers clearing
    pub fn clear_log(&mut self) {
        if self.view.clear() {
            self.status_message = Some("Log cleared".to_string());
        } else {
            self.status_message = Some("Clearing is disabled".to_string());
        }
    }

    /// Copy the filtered text to the system clipboard
    pub fn copy_filtered(&mut self) {
        let text = self.view.filtered_text();
        let lines = text.lines().count();
        self.status_message = Some(match copy_to_clipboard(text) {
            Ok(()) => format!("Copied {} lines", lines),
            Err(e) => {
                log::warn!("Clipboard copy failed: {:#}", e);
                format!("Copy failed: {}", e)
            }
        });
    }

    /// Record an out-of-band event from the source
    pub fn handle_source_status(&mut self, status: SourceStatus) {
        match status {
            SourceStatus::Error(msg) => {
                log::warn!("{}: {}", self.source.name(), msg);
                self.status_message = Some(format!("Error: {}", msg));
            }
            SourceStatus::EndOfStream => {
                log::info!("{}: stream ended", self.source.name());
                self.status_message = Some("Stream ended".to_string());
            }
        }
    }

    /// Get total and visible line counts
    pub fn line_counts(&self) -> (usize, usize) {
        self.view.line_counts()
    }

    /// Stop the source and release the view
    pub fn shutdown(&mut self) {
        self.view.dispose();
    }
}

fn copy_to_clipboard(text: String) -> Result<()> {
    let mut clipboard = arboard::Clipboard::new().context("opening clipboard")?;
    clipboard.set_text(text).context("setting clipboard text")?;
    Ok(())
}
