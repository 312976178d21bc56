mod app;
mod input;
mod logger;
mod sources;
mod terminal;
mod ui;

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use tokio::sync::mpsc;
use tokio::time::{Interval, MissedTickBehavior};

use app::AppState;
use logsift::{ChangeSignal, Config};
use sources::{LogSource, LogSourceType, SourceStatus, command::CommandSource, file::FileSource};

fn usage() -> ! {
    eprintln!("Usage: logsift <file_path>");
    eprintln!("       logsift -- <command> [args...]");
    std::process::exit(1);
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args: Vec<String> = std::env::args().skip(1).collect();
    let source_type = match args.split_first() {
        Some((flag, rest)) if flag == "--" => match rest.split_first() {
            Some((program, args)) => LogSourceType::Command {
                program: program.clone(),
                args: args.to_vec(),
            },
            None => usage(),
        },
        Some((path, rest)) if rest.is_empty() && !path.starts_with('-') => LogSourceType::File {
            path: PathBuf::from(path),
        },
        _ => usage(),
    };

    match logger::init() {
        Ok(log_file) => log::info!("Logging to {}", log_file.display()),
        Err(e) => eprintln!("logsift: logging disabled: {:#}", e),
    }

    let config = Config::load();

    let source: Box<dyn LogSource> = match &source_type {
        LogSourceType::File { path } => Box::new(FileSource::new(
            path.clone(),
            config.tail_lines,
            config.channel_buffer,
        )),
        LogSourceType::Command { program, args } => Box::new(CommandSource::new(
            program.clone(),
            args.clone(),
            config.channel_buffer,
        )),
    };

    // Initialize state
    let mut state = AppState::new(&config, source_type, "");
    let signal = state.view.change_signal();

    // Start the producer; it stops when the view is disposed
    log::info!("Following {}", state.source.name());
    let (mut status_rx, subscription) = source.stream(state.view.feed()).await.into_parts();
    state.view.own(subscription);

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Setup panic hook to restore terminal on panic
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), DisableMouseCapture, LeaveAlternateScreen);
        original_hook(panic);
    }));

    // Main event loop
    let result = run_event_loop(&mut terminal, &mut state, &signal, &mut status_rx).await;

    state.shutdown();

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), DisableMouseCapture, LeaveAlternateScreen)?;

    result
}

async fn run_event_loop<'a>(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    state: &mut AppState<'a>,
    signal: &ChangeSignal,
    status_rx: &mut mpsc::Receiver<SourceStatus>,
) -> Result<()> {
    let mut tick = tokio::time::interval(Duration::from_millis(16));
    tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        // Check filter debounce before drawing
        state.check_filter_debounce();

        // Draw UI
        terminal.draw(|frame| {
            ui::draw(frame, state);
        })?;

        // Log view height: header, status bar and filter bar take a row each
        let page_size = terminal.size()?.height.saturating_sub(3) as usize;

        step(state, signal, status_rx, &mut tick, page_size, poll_event).await?;

        // Check if we should quit
        if state.should_quit {
            break;
        }
    }

    Ok(())
}

/// Terminal event if one is ready, without blocking
fn poll_event() -> Result<Option<Event>> {
    if event::poll(Duration::ZERO)? {
        Ok(Some(event::read()?))
    } else {
        Ok(None)
    }
}

/// Wait for the next tick, producer wakeup or source status, then handle
/// all pending input. Input is drained after every branch so a busy
/// producer can't starve the keyboard.
async fn step(
    state: &mut AppState<'_>,
    signal: &ChangeSignal,
    status_rx: &mut mpsc::Receiver<SourceStatus>,
    tick: &mut Interval,
    page_size: usize,
    next_event: impl FnMut() -> Result<Option<Event>>,
) -> Result<()> {
    tokio::select! {
        _ = tick.tick() => {}

        // New text from the producer
        _ = signal.changed() => {
            state.view.process_pending();
        }

        Some(status) = status_rx.recv() => {
            state.handle_source_status(status);
        }
    }

    input::drain_events(state, page_size, next_event)
}
