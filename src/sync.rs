use crate::surface::DisplaySurface;

/// What a sync step did with the scroll position
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The view was following the tail and was moved to the new end
    Anchored,
    /// The user was scrolled up; the position was left alone
    Kept,
}

/// Replaces surface content while keeping "follow the tail" semantics.
///
/// Whether the surface was at the bottom is measured before the content is
/// replaced. Only then is the caret moved to the end. There is no sticky
/// follow mode: every update re-measures.
#[derive(Clone, Copy, Debug)]
pub struct ViewSync {
    /// Distance from the maximum scroll extent still counted as "at bottom"
    pub tolerance: u32,
}

impl ViewSync {
    pub fn new(tolerance: u32) -> Self {
        Self { tolerance }
    }

    /// Whether `surface` is currently showing its last content
    pub fn was_at_bottom<S: DisplaySurface + ?Sized>(&self, surface: &S) -> bool {
        surface
            .scroll_state()
            .map(|metrics| metrics.is_at_bottom(self.tolerance))
            .unwrap_or(true)
    }

    /// Full replace of the displayed text, then re-anchor if we were at the bottom
    pub fn apply<S: DisplaySurface + ?Sized>(&self, surface: &mut S, text: &str) -> SyncOutcome {
        let at_bottom = self.was_at_bottom(surface);
        surface.render(text);

        if at_bottom {
            surface.scroll_to_end();
            SyncOutcome::Anchored
        } else {
            SyncOutcome::Kept
        }
    }
}
