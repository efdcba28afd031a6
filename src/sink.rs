//! Log sink module.
//!
//! A sink receives the user-facing lines produced by the generator
//! (`Sent payload N°5, message: ...`). Sinks may be called from any task, so
//! implementations must be `Send + Sync` and do their own hand-off to whatever
//! owns the display.

use std::io::{self, Write};
use std::sync::Mutex;

use tokio::sync::mpsc;
use tracing::{info, warn};

/// Destination for user-facing log lines.
pub trait LogSink: Send + Sync {
    /// Append one line.
    fn append(&self, line: String);
}

/// Sink that forwards lines over an unbounded channel.
///
/// Lines sent after the receiver is dropped are discarded.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<String>,
}

impl ChannelSink {
    /// Create a sink and the receiver that drains it.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl LogSink for ChannelSink {
    fn append(&self, line: String) {
        // A closed receiver means nobody is watching any more
        let _ = self.tx.send(line);
    }
}

/// Sink that writes each line, newline-terminated, to a writer.
///
/// The binary uses it on stdout so user-facing lines are shown regardless of
/// the log filter.
#[derive(Debug)]
pub struct WriterSink<W> {
    writer: Mutex<W>,
}

impl<W: Write + Send> WriterSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    /// Give back the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl WriterSink<io::Stdout> {
    /// Sink printing to standard output.
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send> LogSink for WriterSink<W> {
    fn append(&self, line: String) {
        let Ok(mut writer) = self.writer.lock() else {
            return;
        };

        if let Err(e) = writeln!(writer, "{}", line).and_then(|_| writer.flush()) {
            warn!(error = %e, "Failed to write output line");
        }
    }
}

/// Sink that emits every line as a tracing event, for headless diagnostics.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn append(&self, line: String) {
        info!(target: "a2g_demo::output", "{}", line);
    }
}

/// Sink that keeps every line in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    lines: Mutex<Vec<String>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the lines appended so far.
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().map(|l| l.clone()).unwrap_or_default()
    }
}

impl LogSink for MemorySink {
    fn append(&self, line: String) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push(line);
        }
    }
}

impl<S: LogSink + ?Sized> LogSink for std::sync::Arc<S> {
    fn append(&self, line: String) {
        (**self).append(line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_channel_sink_delivers_in_order() {
        let (sink, mut rx) = ChannelSink::new();
        sink.append("one".to_string());
        sink.append("two".to_string());
        drop(sink);

        assert_eq!(rx.recv().await.as_deref(), Some("one"));
        assert_eq!(rx.recv().await.as_deref(), Some("two"));
        assert_eq!(rx.recv().await, None);
    }

    #[test]
    fn test_channel_sink_ignores_closed_receiver() {
        let (sink, rx) = ChannelSink::new();
        drop(rx);
        sink.append("nobody listens".to_string());
    }

    #[test]
    fn test_writer_sink_writes_every_line() {
        let sink = WriterSink::new(Vec::new());
        sink.append("Bot activation has failed, message: boom".to_string());
        sink.append("Sent payload N°1, message: ok".to_string());

        let output = String::from_utf8(sink.into_inner()).unwrap();
        assert_eq!(
            output,
            "Bot activation has failed, message: boom\nSent payload N°1, message: ok\n"
        );
    }

    #[test]
    fn test_tracing_sink_accepts_lines_without_subscriber() {
        TracingSink.append("diagnostic only".to_string());
    }

    #[test]
    fn test_memory_sink_through_arc() {
        let sink = Arc::new(MemorySink::new());
        let shared: Arc<dyn LogSink> = sink.clone();

        std::thread::spawn(move || shared.append("from another thread".to_string()))
            .join()
            .unwrap();

        assert_eq!(sink.lines(), vec!["from another thread".to_string()]);
    }
}
