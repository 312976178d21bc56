//! The capability a host UI hands to a [`LogView`](crate::view::LogView).
//!
//! Any toolkit can back a view by implementing [`DisplaySurface`]; the core
//! never names a widget type.

/// Vertical scroll metrics of a display surface, in whatever unit the
/// surface measures in (pixels, rows, ...).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ScrollMetrics {
    /// Current scroll offset from the top
    pub offset: u32,
    /// Extent of the visible region
    pub visible: u32,
    /// Maximum scroll extent (total content extent)
    pub max: u32,
}

impl ScrollMetrics {
    pub fn new(offset: u32, visible: u32, max: u32) -> Self {
        Self { offset, visible, max }
    }

    /// Whether the visible region ends within `tolerance` of the bottom
    pub fn is_at_bottom(&self, tolerance: u32) -> bool {
        self.offset.saturating_add(self.visible) >= self.max.saturating_sub(tolerance)
    }
}

/// A text display the filtered log is rendered into.
///
/// Methods are only ever called from the UI context that owns the view.
pub trait DisplaySurface {
    /// Replace the whole displayed content
    fn render(&mut self, text: &str);

    /// Current scroll metrics, or `None` if the surface can't report them yet.
    /// A surface without metrics is treated as following the tail.
    fn scroll_state(&self) -> Option<ScrollMetrics>;

    /// Move the caret to the end of the content and scroll it into view
    fn scroll_to_end(&mut self);

    /// Release the resources behind the surface. Called at most once.
    fn dispose(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_at_bottom_within_tolerance() {
        assert!(ScrollMetrics::new(90, 10, 100).is_at_bottom(0));
        assert!(ScrollMetrics::new(81, 10, 100).is_at_bottom(10));
        assert!(!ScrollMetrics::new(79, 10, 100).is_at_bottom(10));
    }

    #[test]
    fn test_short_content_is_at_bottom() {
        // Content shorter than the viewport can't be scrolled away from the end
        assert!(ScrollMetrics::new(0, 40, 12).is_at_bottom(0));
        assert!(ScrollMetrics::default().is_at_bottom(0));
    }

    #[test]
    fn test_large_values_do_not_overflow() {
        assert!(ScrollMetrics::new(u32::MAX, u32::MAX, u32::MAX).is_at_bottom(10));
    }
}
