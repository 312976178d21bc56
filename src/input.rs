use anyhow::Result;
use crossterm::event::{
    Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseEvent, MouseEventKind,
};
use tui_textarea::Input;

use crate::app::{AppState, InputMode};

const WHEEL_LINES: usize = 3;

/// Handle every event `next` has queued, stopping early on quit
pub fn drain_events(
    state: &mut AppState,
    page_size: usize,
    mut next: impl FnMut() -> Result<Option<Event>>,
) -> Result<()> {
    while !state.should_quit {
        match next()? {
            Some(event) => handle_event(state, event, page_size),
            None => break,
        }
    }
    Ok(())
}

/// Dispatch one terminal event
pub fn handle_event(state: &mut AppState, event: Event, page_size: usize) {
    match event {
        // Only handle key press events (not release)
        Event::Key(key) if key.kind == KeyEventKind::Press => handle_key(state, key, page_size),
        Event::Mouse(mouse) => handle_mouse(state, mouse),
        _ => {}
    }
}

/// Handle a mouse event
pub fn handle_mouse(state: &mut AppState, mouse: MouseEvent) {
    match mouse.kind {
        MouseEventKind::ScrollUp => state.scroll_up(WHEEL_LINES),
        MouseEventKind::ScrollDown => state.scroll_down(WHEEL_LINES),
        _ => {}
    }
}

/// Handle a key event and update app state accordingly
pub fn handle_key(state: &mut AppState, key: KeyEvent, page_size: usize) {
    // Help overlay takes priority
    if state.show_help {
        if matches!(key.code, KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('?')) {
            state.toggle_help();
        }
        return;
    }

    match state.mode {
        InputMode::Normal => handle_normal_mode(state, key, page_size),
        InputMode::FilterEditing => handle_filter_mode(state, key),
    }
}

fn handle_normal_mode(state: &mut AppState, key: KeyEvent, page_size: usize) {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    match key.code {
        // Ctrl+C also quits
        KeyCode::Char('c') if ctrl => {
            state.should_quit = true;
        }
        KeyCode::Char('d') if ctrl => state.scroll_down(page_size),
        KeyCode::Char('u') if ctrl => state.scroll_up(page_size),

        KeyCode::Char('q') => {
            state.should_quit = true;
        }
        KeyCode::Char('?') => state.toggle_help(),

        // Navigation
        KeyCode::Char('j') | KeyCode::Down => state.scroll_down(1),
        KeyCode::Char('k') | KeyCode::Up => state.scroll_up(1),
        KeyCode::PageDown => state.scroll_down(page_size),
        KeyCode::PageUp => state.scroll_up(page_size),
        KeyCode::Char('g') | KeyCode::Home => state.go_to_top(),
        KeyCode::Char('G') | KeyCode::End => state.go_to_bottom(),

        // Enter filter mode
        KeyCode::Char('/') => state.begin_filter_edit(),
        // Clear filter
        KeyCode::Esc => state.clear_filter(),

        KeyCode::Char('x') => state.clear_log(),
        KeyCode::Char('y') => state.copy_filtered(),
        KeyCode::Char('w') => state.toggle_line_wrap(),
        KeyCode::Char('c') => state.toggle_level_colors(),

        _ => {}
    }
}

fn handle_filter_mode(state: &mut AppState, key: KeyEvent) {
    match key.code {
        KeyCode::Enter => state.apply_filter(),
        KeyCode::Esc => state.cancel_filter(),
        _ => {
            // Forward all other keys to the textarea
            let input = Input::from(key);
            if state.filter_textarea.input(input) {
                state.filter_changed();
            }
        }
    }
}
