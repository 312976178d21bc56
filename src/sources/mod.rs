//! Log producers.
//!
//! Each source runs on its own tokio task and appends text straight into a
//! view through a [`Feed`]. Anything the user should hear about besides the
//! log text itself comes back on the status channel.
//! - Local files (via `tail -F`)
//! - Child processes (stdout and stderr, like a run console)

pub mod command;
pub mod file;

use std::io;
use std::path::PathBuf;

use logsift::{Feed, Subscription};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Describes how a log source is configured
#[derive(Clone, Debug)]
pub enum LogSourceType {
    File { path: PathBuf },
    Command { program: String, args: Vec<String> },
}

impl LogSourceType {
    pub fn name(&self) -> String {
        match self {
            LogSourceType::File { path } => path
                .file_name()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_else(|| path.display().to_string()),
            LogSourceType::Command { program, args } => {
                if args.is_empty() {
                    format!("$ {}", program)
                } else {
                    format!("$ {} {}", program, args.join(" "))
                }
            }
        }
    }
}

/// Out-of-band events from a running source
#[derive(Debug, PartialEq, Eq)]
pub enum SourceStatus {
    Error(String),
    EndOfStream,
}

/// A started source: its status channel and the task feeding the view
pub struct SourceStream {
    pub status: mpsc::Receiver<SourceStatus>,
    pub task: JoinHandle<()>,
}

impl SourceStream {
    /// Split off a subscription that stops the producer task
    pub fn into_parts(self) -> (mpsc::Receiver<SourceStatus>, Subscription) {
        let task = self.task;
        (self.status, Subscription::new(move || task.abort()))
    }
}

/// Trait for log sources
#[async_trait::async_trait]
pub trait LogSource: Send + Sync {
    /// Start producing into `feed`
    async fn stream(&self, feed: Feed) -> SourceStream;
}

/// Append one line read from a source, restoring its line break
pub(crate) fn append_line(feed: &Feed, line: &str) {
    let mut fragment = String::with_capacity(line.len() + 1);
    fragment.push_str(line);
    fragment.push('\n');
    feed.append(&fragment);
}

/// Copy lines from a pipe into the feed until EOF or the view closes.
/// Bytes that aren't valid UTF-8 are replaced rather than ending the stream.
pub(crate) async fn pump<R: AsyncRead + Unpin>(reader: R, feed: &Feed) -> io::Result<()> {
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            return Ok(());
        }
        if feed.is_closed() {
            return Ok(());
        }
        let line = String::from_utf8_lossy(&buf);
        let line = line.strip_suffix('\n').unwrap_or(&line);
        append_line(feed, line.strip_suffix('\r').unwrap_or(line));
    }
}
