use std::process::Stdio;
use tokio::process::Command;
use tokio::sync::mpsc;

use super::{LogSource, SourceStatus, SourceStream, append_line, pump};
use logsift::Feed;

/// Runs a command and captures its stdout and stderr, the way a run
/// console does
pub struct CommandSource {
    program: String,
    args: Vec<String>,
    channel_buffer: usize,
}

impl CommandSource {
    pub fn new(program: String, args: Vec<String>, channel_buffer: usize) -> Self {
        Self {
            program,
            args,
            channel_buffer,
        }
    }
}

#[async_trait::async_trait]
impl LogSource for CommandSource {
    async fn stream(&self, feed: Feed) -> SourceStream {
        let (tx, rx) = mpsc::channel(self.channel_buffer);
        let program = self.program.clone();
        let args = self.args.clone();

        let task = tokio::spawn(async move {
            let result = Command::new(&program)
                .args(&args)
                .stdin(Stdio::null())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .kill_on_drop(true)
                .spawn();

            match result {
                Ok(mut child) => {
                    log::info!("Started '{}' (pid {:?})", program, child.id());

                    // Spawn task to read stderr
                    let stderr_handle = child.stderr.take().map(|stderr| {
                        let feed = feed.clone();
                        tokio::spawn(async move { pump(stderr, &feed).await })
                    });

                    // Read stdout in main task
                    if let Some(stdout) = child.stdout.take() {
                        if let Err(e) = pump(stdout, &feed).await {
                            log::warn!("Reading stdout of '{}' failed: {}", program, e);
                        }
                    }

                    // Wait for stderr task
                    if let Some(handle) = stderr_handle {
                        if let Ok(Err(e)) = handle.await {
                            log::warn!("Reading stderr of '{}' failed: {}", program, e);
                        }
                    }

                    match child.wait().await {
                        Ok(status) => {
                            append_line(&feed, &format!("[{}]", status));
                            if !status.success() {
                                let _ = tx
                                    .send(SourceStatus::Error(format!(
                                        "{} exited with {}",
                                        program, status
                                    )))
                                    .await;
                            }
                        }
                        Err(e) => {
                            let _ = tx
                                .send(SourceStatus::Error(format!(
                                    "Error waiting for {}: {}",
                                    program, e
                                )))
                                .await;
                        }
                    }

                    let _ = tx.send(SourceStatus::EndOfStream).await;
                }
                Err(e) => {
                    log::warn!("Failed to start '{}': {}", program, e);
                    let _ = tx
                        .send(SourceStatus::Error(format!(
                            "Failed to start '{}': {}",
                            program, e
                        )))
                        .await;
                    let _ = tx.send(SourceStatus::EndOfStream).await;
                }
            }
        });

        SourceStream { status: rx, task }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::terminal::TerminalSurface;
    use logsift::{LogView, ViewConfig};

    fn shell(script: &str) -> CommandSource {
        CommandSource::new(
            "sh".to_string(),
            vec!["-c".to_string(), script.to_string()],
            16,
        )
    }

    async fn drain(status: &mut mpsc::Receiver<SourceStatus>) -> Vec<SourceStatus> {
        let mut events = Vec::new();
        while let Some(event) = status.recv().await {
            let done = event == SourceStatus::EndOfStream;
            events.push(event);
            if done {
                break;
            }
        }
        events
    }

    #[tokio::test]
    async fn test_captures_output_and_exit_status() {
        let mut view = LogView::new(TerminalSurface::new(), "", &ViewConfig::default());
        let source = shell("echo out; echo err 1>&2; exit 3");

        let mut stream = source.stream(view.feed()).await;
        let events = drain(&mut stream.status).await;

        assert!(matches!(events.first(), Some(SourceStatus::Error(msg)) if msg.contains("exit status: 3")));
        assert_eq!(events.last(), Some(&SourceStatus::EndOfStream));

        assert!(view.process_pending());
        let text = view.raw_text();
        assert!(text.contains("out\n"));
        assert!(text.contains("err\n"));
        assert!(text.ends_with("[exit status: 3]\n"));
    }

    #[tokio::test]
    async fn test_missing_program_reports_error() {
        let view = LogView::new(TerminalSurface::new(), "", &ViewConfig::default());
        let source = CommandSource::new("logsift-no-such-program".to_string(), Vec::new(), 4);

        let mut stream = source.stream(view.feed()).await;
        let events = drain(&mut stream.status).await;

        assert!(matches!(events.first(), Some(SourceStatus::Error(msg)) if msg.starts_with("Failed to start")));
        assert_eq!(view.raw_text(), "");
    }

    #[tokio::test]
    async fn test_invalid_utf8_line_does_not_end_stream() {
        let view = LogView::new(TerminalSurface::new(), "", &ViewConfig::default());
        let source = shell("printf 'a\\n\\377\\nb\\nc\\n'");

        let mut stream = source.stream(view.feed()).await;
        let events = drain(&mut stream.status).await;

        assert_eq!(events, vec![SourceStatus::EndOfStream]);
        assert_eq!(view.raw_text(), "a\n\u{FFFD}\nb\nc\n[exit status: 0]\n");
    }
}
