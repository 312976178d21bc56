use logsift::{DisplaySurface, ScrollMetrics};

/// A `DisplaySurface` backed by plain line storage, scrolled in terminal rows.
///
/// `scroll` is the index of the top visible line; the UI reports the
/// viewport height on every draw.
#[derive(Debug, Default)]
pub struct TerminalSurface {
    lines: Vec<String>,
    scroll: usize,
    height: usize,
    disposed: bool,
}

impl TerminalSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Called by the UI before drawing. Keeps the offset in range.
    pub fn set_viewport_height(&mut self, height: usize) {
        let was_at_bottom = self.is_at_bottom();
        self.height = height;
        if was_at_bottom {
            self.scroll = self.max_scroll();
        } else {
            self.scroll = self.scroll.min(self.max_scroll());
        }
    }

    fn max_scroll(&self) -> usize {
        self.lines.len().saturating_sub(self.height)
    }

    pub fn scroll(&self) -> usize {
        self.scroll
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn is_at_bottom(&self) -> bool {
        self.scroll >= self.max_scroll()
    }

    /// Lines currently in the viewport
    pub fn visible_lines(&self) -> &[String] {
        let start = self.scroll.min(self.lines.len());
        let end = (start + self.height).min(self.lines.len());
        &self.lines[start..end]
    }

    pub fn scroll_up(&mut self, n: usize) {
        self.scroll = self.scroll.saturating_sub(n);
    }

    pub fn scroll_down(&mut self, n: usize) {
        self.scroll = (self.scroll + n).min(self.max_scroll());
    }

    pub fn go_to_top(&mut self) {
        self.scroll = 0;
    }

    pub fn go_to_bottom(&mut self) {
        self.scroll = self.max_scroll();
    }
}

impl DisplaySurface for TerminalSurface {
    fn render(&mut self, text: &str) {
        if self.disposed {
            return;
        }
        self.lines = text.lines().map(str::to_string).collect();
        self.scroll = self.scroll.min(self.max_scroll());
    }

    fn scroll_state(&self) -> Option<ScrollMetrics> {
        // Not laid out yet
        if self.height == 0 {
            return None;
        }
        Some(ScrollMetrics::new(
            self.scroll as u32,
            self.height as u32,
            self.lines.len() as u32,
        ))
    }

    fn scroll_to_end(&mut self) {
        self.scroll = self.max_scroll();
    }

    fn dispose(&mut self) {
        self.lines = Vec::new();
        self.scroll = 0;
        self.disposed = true;
    }
}
