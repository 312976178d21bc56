use std::path::PathBuf;
use tokio::process::Command;
use tokio::sync::mpsc;

use super::{LogSource, SourceStatus, SourceStream, pump};
use logsift::Feed;

/// A log source that follows a file using tail -F
pub struct FileSource {
    path: PathBuf,
    /// Existing lines to include before following
    tail_lines: u32,
    channel_buffer: usize,
}

impl FileSource {
    pub fn new(path: PathBuf, tail_lines: u32, channel_buffer: usize) -> Self {
        Self {
            path,
            tail_lines,
            channel_buffer,
        }
    }
}

#[async_trait::async_trait]
impl LogSource for FileSource {
    async fn stream(&self, feed: Feed) -> SourceStream {
        let (tx, rx) = mpsc::channel(self.channel_buffer);
        let path = self.path.clone();
        let tail_lines = self.tail_lines;

        let task = tokio::spawn(async move {
            let result = Command::new("tail")
                .arg("-n")
                .arg(tail_lines.to_string())
                .arg("-F")
                .arg(&path)
                .stdout(std::process::Stdio::piped())
                .stderr(std::process::Stdio::null())
                .kill_on_drop(true)
                .spawn();

            match result {
                Ok(mut child) => {
                    let mut read_failed = false;
                    if let Some(stdout) = child.stdout.take() {
                        if let Err(e) = pump(stdout, &feed).await {
                            log::warn!("Reading {} failed: {}", path.display(), e);
                            read_failed = true;
                            let _ = tx
                                .send(SourceStatus::Error(format!(
                                    "Error reading {}: {}",
                                    path.display(),
                                    e
                                )))
                                .await;
                        }
                    }

                    // tail -F keeps running after we stop reading
                    let stopped = read_failed || feed.is_closed();
                    if stopped {
                        let _ = child.start_kill();
                    }

                    // Wait for process to exit
                    match child.wait().await {
                        Ok(status) if !status.success() && !stopped => {
                            let _ = tx
                                .send(SourceStatus::Error(format!(
                                    "tail exited with status: {}",
                                    status
                                )))
                                .await;
                        }
                        Err(e) => {
                            let _ = tx
                                .send(SourceStatus::Error(format!("Error waiting for tail: {}", e)))
                                .await;
                        }
                        _ => {}
                    }

                    let _ = tx.send(SourceStatus::EndOfStream).await;
                }
                Err(e) => {
                    log::warn!("Failed to spawn tail for {}: {}", path.display(), e);
                    let _ = tx
                        .send(SourceStatus::Error(format!("Failed to spawn tail: {}", e)))
                        .await;
                    let _ = tx.send(SourceStatus::EndOfStream).await;
                }
            }
        });

        SourceStream { status: rx, task }
    }
}
