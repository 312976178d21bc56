//! A live filtered view over a growing log.
//!
//! A [`LogView`] lives on the UI context. Producers get a [`Feed`], which
//! appends to the shared buffer from any thread and only flags the view as
//! dirty; the UI then calls [`LogView::process_pending`] (usually after
//! awaiting [`ChangeSignal::changed`]) to recompute and redraw.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::Notify;

use crate::buffer::LogBuffer;
use crate::config::ViewConfig;
use crate::filter::FilterExpression;
use crate::subscription::Subscription;
use crate::surface::DisplaySurface;
use crate::sync::{SyncOutcome, ViewSync};

/// State shared between the view and its producers
#[derive(Debug, Default)]
struct Shared {
    buffer: LogBuffer,
    /// Set by producers, cleared by the UI when it recomputes
    dirty: AtomicBool,
    disposed: AtomicBool,
    notify: Notify,
}

impl Shared {
    fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }
}

/// Producer-side handle: appends fragments and wakes the UI.
///
/// Cheap to clone and safe to move to another thread or task.
#[derive(Clone, Debug)]
pub struct Feed {
    shared: Arc<Shared>,
}

impl Feed {
    /// Append a fragment to the raw log. A no-op once the view is disposed.
    pub fn append(&self, fragment: &str) {
        if fragment.is_empty() || self.shared.is_disposed() {
            return;
        }
        // Re-checked under the buffer lock so a dispose racing this append
        // can't be followed by text landing in a released buffer.
        let shared = &self.shared;
        if !shared.buffer.append_if(fragment, || !shared.is_disposed()) {
            return;
        }
        self.shared.dirty.store(true, Ordering::Release);
        self.shared.notify.notify_one();
    }

    /// Whether the view behind this feed has been disposed
    pub fn is_closed(&self) -> bool {
        self.shared.is_disposed()
    }
}

/// UI-side wakeup for producer appends
#[derive(Clone, Debug)]
pub struct ChangeSignal {
    shared: Arc<Shared>,
}

impl ChangeSignal {
    /// Resolves once a producer has appended since the last wakeup.
    /// Bursts of appends collapse into one wakeup. Resolves immediately
    /// after the view is disposed.
    pub async fn changed(&self) {
        // Created before the check so a concurrent dispose still wakes it
        let notified = self.shared.notify.notified();
        if self.shared.is_disposed() {
            return;
        }
        notified.await;
    }
}

/// The filtered, tail-following view of one log.
pub struct LogView<S: DisplaySurface> {
    shared: Arc<Shared>,
    expression: FilterExpression,
    sync: ViewSync,
    config: ViewConfig,
    /// `None` once disposed
    surface: Option<S>,
    visible: bool,
    /// A refresh was skipped while hidden
    stale: bool,
    /// (raw lines, shown lines) as of the last refresh
    counts: (usize, usize),
    last_outcome: Option<SyncOutcome>,
    subscriptions: Vec<Subscription>,
}

impl<S: DisplaySurface> LogView<S> {
    /// Create a view seeded with `initial_text` and render it once
    pub fn new(surface: S, initial_text: impl Into<String>, config: &ViewConfig) -> Self {
        let shared = Arc::new(Shared {
            buffer: LogBuffer::with_text(initial_text),
            ..Shared::default()
        });

        let mut view = Self {
            shared,
            expression: FilterExpression::default(),
            sync: ViewSync::new(config.bottom_tolerance),
            config: config.clone(),
            surface: Some(surface),
            visible: true,
            stale: false,
            counts: (0, 0),
            last_outcome: None,
            subscriptions: Vec::new(),
        };
        log::debug!("Created log view ({} bytes seeded)", view.shared.buffer.len());
        view.refresh();
        view
    }

    /// A producer handle for this view
    pub fn feed(&self) -> Feed {
        Feed {
            shared: Arc::clone(&self.shared),
        }
    }

    pub fn change_signal(&self) -> ChangeSignal {
        ChangeSignal {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Keep `subscription` alive until the view is disposed
    pub fn own(&mut self, mut subscription: Subscription) {
        if self.is_disposed() {
            subscription.unsubscribe();
            return;
        }
        self.subscriptions.push(subscription);
    }

    /// Recompute once if producers appended since the last call.
    /// Returns whether anything was pending.
    pub fn process_pending(&mut self) -> bool {
        if self.is_disposed() {
            return false;
        }
        if !self.shared.dirty.swap(false, Ordering::AcqRel) {
            return false;
        }
        self.refresh();
        true
    }

    /// Replace the filter expression and refilter
    pub fn set_filter_expression(&mut self, text: &str) {
        if self.is_disposed() {
            return;
        }
        if text == self.expression.pattern {
            return;
        }
        self.expression = FilterExpression::parse(text);
        self.refresh();
    }

    pub fn filter_expression(&self) -> &FilterExpression {
        &self.expression
    }

    /// Empty the raw log and refilter. Returns false when the view has no
    /// clear action or is disposed.
    pub fn clear(&mut self) -> bool {
        if self.is_disposed() || !self.config.clear_action {
            return false;
        }
        self.shared.buffer.clear();
        self.refresh();
        true
    }

    pub fn can_clear(&self) -> bool {
        self.config.clear_action
    }

    /// Hidden views skip rendering; showing one again brings it up to date.
    pub fn set_visible(&mut self, visible: bool) {
        if self.is_disposed() || self.visible == visible {
            return;
        }
        self.visible = visible;
        if visible && self.stale {
            self.refresh();
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Recompute the filtered text from the current buffer and expression and
    /// push it to the surface.
    pub fn refresh(&mut self) -> Option<SyncOutcome> {
        if self.is_disposed() {
            return None;
        }
        if !self.visible && !self.config.render_when_hidden {
            self.stale = true;
            return None;
        }

        let raw = self.shared.buffer.snapshot();
        let shown = self.expression.apply(&raw);
        self.counts = (count_lines(&raw), count_lines(&shown));

        let surface = self.surface.as_mut()?;
        let outcome = self.sync.apply(surface, &shown);
        log::trace!(
            "Refreshed view: {}/{} lines, {:?}",
            self.counts.1,
            self.counts.0,
            outcome
        );

        self.stale = false;
        self.last_outcome = Some(outcome);
        Some(outcome)
    }

    /// The filtered text for the current buffer and expression
    pub fn filtered_text(&self) -> String {
        self.expression.apply(&self.shared.buffer.snapshot())
    }

    pub fn raw_text(&self) -> String {
        self.shared.buffer.snapshot()
    }

    /// (raw lines, shown lines) as of the last refresh
    pub fn line_counts(&self) -> (usize, usize) {
        self.counts
    }

    /// Whether the next update will re-anchor to the bottom, using the same
    /// tolerance as the sync step
    pub fn is_following(&self) -> bool {
        self.surface
            .as_ref()
            .map(|surface| self.sync.was_at_bottom(surface))
            .unwrap_or(false)
    }

    pub fn last_outcome(&self) -> Option<SyncOutcome> {
        self.last_outcome
    }

    pub fn surface(&self) -> Option<&S> {
        self.surface.as_ref()
    }

    pub fn surface_mut(&mut self) -> Option<&mut S> {
        self.surface.as_mut()
    }

    pub fn is_disposed(&self) -> bool {
        self.shared.is_disposed()
    }

    /// Stop producers, run owned unsubscribes, release the surface and drop
    /// the raw log. Safe to call any number of times.
    pub fn dispose(&mut self) {
        if self.shared.disposed.swap(true, Ordering::AcqRel) {
            return;
        }

        for mut subscription in self.subscriptions.drain(..) {
            subscription.unsubscribe();
        }
        if let Some(mut surface) = self.surface.take() {
            surface.dispose();
        }
        self.shared.buffer.release();
        self.counts = (0, 0);
        self.shared.notify.notify_waiters();
        log::debug!("Disposed log view");
    }
}

impl<S: DisplaySurface> Drop for LogView<S> {
    fn drop(&mut self) {
        self.dispose();
    }
}

/// Number of lines in `text`; a trailing line without `\n` counts
fn count_lines(text: &str) -> usize {
    let breaks = text.matches('\n').count();
    if text.is_empty() || text.ends_with('\n') {
        breaks
    } else {
        breaks + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::ScrollMetrics;
    use std::sync::Mutex;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    /// Row-based surface recording every call into shared state
    #[derive(Clone, Default)]
    struct TestSurface {
        state: Arc<Mutex<TestSurfaceState>>,
    }

    #[derive(Default)]
    struct TestSurfaceState {
        text: String,
        offset: u32,
        height: u32,
        renders: usize,
        disposed: usize,
    }

    impl TestSurface {
        fn with_height(height: u32) -> Self {
            let display = TestSurface::default();
            display.state.lock().unwrap().height = height;
            display
        }

        fn text(&self) -> String {
            self.state.lock().unwrap().text.clone()
        }

        fn renders(&self) -> usize {
            self.state.lock().unwrap().renders
        }

        fn offset(&self) -> u32 {
            self.state.lock().unwrap().offset
        }

        fn set_offset(&self, offset: u32) {
            self.state.lock().unwrap().offset = offset;
        }

        fn disposed(&self) -> usize {
            self.state.lock().unwrap().disposed
        }
    }

    impl TestSurfaceState {
        fn lines(&self) -> u32 {
            self.text.lines().count() as u32
        }
    }

    impl DisplaySurface for TestSurface {
        fn render(&mut self, text: &str) {
            let mut state = self.state.lock().unwrap();
            state.text = text.to_string();
            state.renders += 1;
            let max_offset = state.lines().saturating_sub(state.height);
            state.offset = state.offset.min(max_offset);
        }

        fn scroll_state(&self) -> Option<ScrollMetrics> {
            let state = self.state.lock().unwrap();
            Some(ScrollMetrics::new(state.offset, state.height, state.lines()))
        }

        fn scroll_to_end(&mut self) {
            let mut state = self.state.lock().unwrap();
            state.offset = state.lines().saturating_sub(state.height);
        }

        fn dispose(&mut self) {
            self.state.lock().unwrap().disposed += 1;
        }
    }

    fn config() -> ViewConfig {
        ViewConfig {
            bottom_tolerance: 0,
            ..ViewConfig::default()
        }
    }

    fn numbered(n: u32) -> String {
        (0..n).map(|i| format!("line {}\n", i)).collect()
    }

    #[test]
    fn test_new_renders_seed() {
        let display = TestSurface::with_height(5);
        let view = LogView::new(display.clone(), "a1\nb2\n", &config());
        assert_eq!(display.text(), "a1\nb2\n");
        assert_eq!(view.line_counts(), (2, 2));
    }

    #[test]
    fn test_append_waits_for_ui_step() {
        let display = TestSurface::with_height(5);
        let mut view = LogView::new(display.clone(), "", &config());
        let feed = view.feed();

        feed.append("first\n");
        feed.append("second\n");
        // producers never touch the surface
        assert_eq!(display.text(), "");

        assert!(view.process_pending());
        assert_eq!(display.text(), "first\nsecond\n");
        assert_eq!(display.renders(), 2);
        assert!(!view.process_pending());
    }

    #[test]
    fn test_filter_applies_to_current_and_future_text() {
        let display = TestSurface::with_height(5);
        let mut view = LogView::new(display.clone(), "a1\nb2\nc1\n", &config());

        view.set_filter_expression("1");
        assert_eq!(display.text(), "a1\nc1\n");

        view.feed().append("d1\ne2\n");
        view.process_pending();
        assert_eq!(display.text(), "a1\nc1\nd1\n");
        assert_eq!(view.line_counts(), (5, 3));

        view.set_filter_expression("");
        assert_eq!(display.text(), "a1\nb2\nc1\nd1\ne2\n");
    }

    #[test]
    fn test_follows_tail_only_when_at_bottom() {
        let display = TestSurface::with_height(10);
        let mut view = LogView::new(display.clone(), numbered(50), &config());
        assert_eq!(display.offset(), 40);

        view.feed().append("new line\n");
        view.process_pending();
        assert_eq!(display.offset(), 41);
        assert_eq!(view.last_outcome(), Some(SyncOutcome::Anchored));

        display.set_offset(15);
        view.feed().append("new line\n");
        view.process_pending();
        assert_eq!(display.offset(), 15);
        assert_eq!(view.last_outcome(), Some(SyncOutcome::Kept));
    }

    #[test]
    fn test_clear_empties_and_refilters() {
        let display = TestSurface::with_height(5);
        let mut view = LogView::new(display.clone(), "x\ny\n", &config());
        assert!(view.clear());
        assert_eq!(display.text(), "");
        assert_eq!(view.raw_text(), "");

        view.feed().append("z\n");
        view.process_pending();
        assert_eq!(display.text(), "z\n");
    }

    #[test]
    fn test_clear_disabled_by_config() {
        let display = TestSurface::with_height(5);
        let config = ViewConfig {
            clear_action: false,
            ..config()
        };
        let mut view = LogView::new(display.clone(), "keep\n", &config);
        assert!(!view.can_clear());
        assert!(!view.clear());
        assert_eq!(view.raw_text(), "keep\n");
    }

    #[test]
    fn test_hidden_view_converges_when_shown() {
        let display = TestSurface::with_height(5);
        let mut view = LogView::new(display.clone(), "a\n", &config());
        view.set_visible(false);

        view.feed().append("b\n");
        assert!(view.process_pending());
        view.set_filter_expression("b");
        assert_eq!(display.text(), "a\n");
        assert_eq!(display.renders(), 1);

        view.set_visible(true);
        assert_eq!(display.text(), "b\n");
        assert_eq!(display.renders(), 2);
    }

    #[test]
    fn test_render_when_hidden() {
        let display = TestSurface::with_height(5);
        let config = ViewConfig {
            render_when_hidden: true,
            ..config()
        };
        let mut view = LogView::new(display.clone(), "", &config);
        view.set_visible(false);
        view.feed().append("c\n");
        view.process_pending();
        assert_eq!(display.text(), "c\n");
    }

    #[test]
    fn test_dispose_is_idempotent_and_silences_mutators() {
        let display = TestSurface::with_height(5);
        let mut view = LogView::new(display.clone(), "a\n", &config());
        let feed = view.feed();

        let unsubscribed = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&unsubscribed);
        view.own(Subscription::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        view.dispose();
        view.dispose();
        assert!(feed.is_closed());
        assert_eq!(display.disposed(), 1);
        assert_eq!(unsubscribed.load(Ordering::SeqCst), 1);

        feed.append("late\n");
        assert!(!view.process_pending());
        view.set_filter_expression("late");
        assert!(!view.clear());
        assert!(view.refresh().is_none());
        assert_eq!(view.raw_text(), "");
        assert_eq!(view.line_counts(), (0, 0));
        assert_eq!(display.text(), "a\n");
        assert_eq!(display.renders(), 1);

        drop(view);
        assert_eq!(display.disposed(), 1);
    }

    #[test]
    fn test_dispose_releases_raw_log() {
        let mut view = LogView::new(TestSurface::with_height(5), "x".repeat(1 << 20), &config());
        let feed = view.feed();
        view.dispose();

        assert_eq!(view.raw_text(), "");
        feed.append("after dispose\n");
        assert_eq!(view.raw_text(), "");
    }

    #[test]
    fn test_appends_racing_dispose_leave_buffer_empty() {
        for _ in 0..50 {
            let mut view = LogView::new(TestSurface::with_height(5), "", &config());
            let feed = view.feed();
            let producer = std::thread::spawn(move || {
                while !feed.is_closed() {
                    feed.append("tick\n");
                }
                feed.append("tick\n");
            });
            std::thread::yield_now();
            view.dispose();
            producer.join().unwrap();
            assert_eq!(view.raw_text(), "");
        }
    }

    #[test]
    fn test_is_following_uses_tolerance() {
        let display = TestSurface::with_height(10);
        let config = ViewConfig {
            bottom_tolerance: 1,
            ..ViewConfig::default()
        };
        let mut view = LogView::new(display.clone(), numbered(50), &config);
        assert!(view.is_following());

        // one row up is still within tolerance, and the next append snaps back
        display.set_offset(39);
        assert!(view.is_following());
        view.feed().append("new line\n");
        view.process_pending();
        assert_eq!(display.offset(), 41);

        display.set_offset(30);
        assert!(!view.is_following());

        view.dispose();
        assert!(!view.is_following());
    }

    #[test]
    fn test_own_after_dispose_unsubscribes_immediately() {
        let mut view = LogView::new(TestSurface::with_height(1), "", &config());
        view.dispose();

        let unsubscribed = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&unsubscribed);
        view.own(Subscription::new(move || flag.store(true, Ordering::SeqCst)));
        assert!(unsubscribed.load(Ordering::SeqCst));
    }

    #[test]
    fn test_drop_disposes() {
        let display = TestSurface::with_height(1);
        let feed = {
            let view = LogView::new(display.clone(), "", &config());
            view.feed()
        };
        assert!(feed.is_closed());
        assert_eq!(display.disposed(), 1);
    }

    #[test]
    fn test_count_lines() {
        assert_eq!(count_lines(""), 0);
        assert_eq!(count_lines("a\n"), 1);
        assert_eq!(count_lines("a\nb"), 2);
        assert_eq!(count_lines("\n\n"), 2);
    }

    #[tokio::test]
    async fn test_change_signal_wakes_on_append() {
        let mut view = LogView::new(TestSurface::with_height(5), "", &config());
        let signal = view.change_signal();
        let feed = view.feed();

        let producer = tokio::spawn(async move {
            feed.append("hello\n");
        });

        tokio::time::timeout(Duration::from_secs(5), signal.changed())
            .await
            .expect("signal should fire after append");
        producer.await.unwrap();

        assert!(view.process_pending());
        assert_eq!(view.filtered_text(), "hello\n");
    }

    #[tokio::test]
    async fn test_change_signal_resolves_after_dispose() {
        let mut view = LogView::new(TestSurface::with_height(5), "", &config());
        let signal = view.change_signal();
        view.dispose();

        tokio::time::timeout(Duration::from_secs(5), signal.changed())
            .await
            .expect("disposed views never block the UI loop");
    }
}
