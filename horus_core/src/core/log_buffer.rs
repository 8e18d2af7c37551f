//! Process-global structured log sink.
//!
//! Every record carries the emitting node, its tick number, and IPC timing
//! when the record came from a publish/receive. Records land in a bounded
//! in-memory ring (overflow drops oldest) and are echoed to the console,
//! filtered by the `LOG_LEVEL` environment variable
//! (`DEBUG|INFO|WARN|ERROR`, default `INFO`). Ordering is guaranteed per
//! node only.

use std::collections::VecDeque;
use std::io::Write;

use colored::Colorize;
use lazy_static::lazy_static;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// Maximum records retained before drop-oldest kicks in.
pub const MAX_LOG_ENTRIES: usize = 5000;

/// Record category. `Publish`/`Subscribe` are emitted by the topic handles,
/// the rest by node code and the scheduler.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum LogType {
    Publish,
    Subscribe,
    Info,
    Warning,
    Error,
    Debug,
}

/// One structured log record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    /// Wall-clock nanoseconds since epoch.
    pub timestamp_ns: u64,
    pub level: LogType,
    /// Emitting node name, `-` when unattributed.
    pub node: String,
    /// Scheduler tick during which the record was emitted.
    pub tick: u64,
    /// Topic for publish/receive/drop records.
    pub topic: Option<String>,
    pub message: String,
    /// Microseconds into the current tick when emitted.
    pub tick_us: u64,
    /// Nanoseconds the ring copy took (publish/receive records only).
    pub ipc_ns: u64,
}

/// Bounded in-memory ring of log records.
pub struct LogBuffer {
    entries: Mutex<VecDeque<LogEntry>>,
}

impl LogBuffer {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(VecDeque::with_capacity(MAX_LOG_ENTRIES)),
        }
    }

    /// Append a record, dropping the oldest when full.
    pub fn push(&self, entry: LogEntry) {
        let mut entries = self.entries.lock();
        if entries.len() == MAX_LOG_ENTRIES {
            entries.pop_front();
        }
        entries.push_back(entry);
    }

    /// Snapshot of all retained records, oldest first.
    pub fn get_all(&self) -> Vec<LogEntry> {
        self.entries.lock().iter().cloned().collect()
    }

    /// Retained records emitted by `node`.
    pub fn for_node(&self, node: &str) -> Vec<LogEntry> {
        self.entries
            .lock()
            .iter()
            .filter(|e| e.node == node)
            .cloned()
            .collect()
    }

    /// Retained records tagged with `topic`.
    pub fn for_topic(&self, topic: &str) -> Vec<LogEntry> {
        self.entries
            .lock()
            .iter()
            .filter(|e| e.topic.as_deref() == Some(topic))
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

impl Default for LogBuffer {
    fn default() -> Self {
        Self::new()
    }
}

lazy_static! {
    /// The process-wide sink.
    pub static ref GLOBAL_LOG_BUFFER: LogBuffer = LogBuffer::new();

    /// Minimum console echo level parsed once from `LOG_LEVEL`.
    static ref MIN_CONSOLE_LEVEL: u8 = parse_log_level();
}

fn parse_log_level() -> u8 {
    match std::env::var("LOG_LEVEL")
        .unwrap_or_default()
        .to_ascii_uppercase()
        .as_str()
    {
        "DEBUG" => 0,
        "WARN" => 2,
        "ERROR" => 3,
        _ => 1, // INFO default
    }
}

fn level_rank(level: &LogType) -> Option<u8> {
    match level {
        LogType::Debug => Some(0),
        LogType::Info => Some(1),
        LogType::Warning => Some(2),
        LogType::Error => Some(3),
        // Publish/Subscribe records go to the buffer only.
        LogType::Publish | LogType::Subscribe => None,
    }
}

/// Append a record to the global sink and echo it to the console when its
/// level clears `LOG_LEVEL`.
pub fn publish_log(entry: LogEntry) {
    if let Some(rank) = level_rank(&entry.level) {
        if rank >= *MIN_CONSOLE_LEVEL {
            echo(&entry);
        }
    }
    GLOBAL_LOG_BUFFER.push(entry);
}

fn echo(entry: &LogEntry) {
    let stamp = chrono::Local::now().format("%H:%M:%S%.3f");
    let tag = match entry.level {
        LogType::Info => "[INFO]".blue(),
        LogType::Warning => "[WARN]".yellow(),
        LogType::Error => "[ERROR]".red(),
        LogType::Debug => "[DEBUG]".bright_black(),
        _ => return,
    };
    let line = format!(
        "{} {} {} {}\n",
        stamp,
        tag,
        format!("[{}]", entry.node).yellow(),
        entry.message
    );
    if entry.level == LogType::Error {
        let _ = std::io::stderr().write_all(line.as_bytes());
    } else {
        let _ = std::io::stdout().write_all(line.as_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(node: &str, message: &str) -> LogEntry {
        LogEntry {
            timestamp_ns: crate::time::timestamp_now(),
            level: LogType::Info,
            node: node.to_string(),
            tick: 0,
            topic: None,
            message: message.to_string(),
            tick_us: 0,
            ipc_ns: 0,
        }
    }

    #[test]
    fn test_push_and_filter() {
        let buf = LogBuffer::new();
        buf.push(entry("alpha", "one"));
        buf.push(entry("beta", "two"));
        buf.push(LogEntry {
            topic: Some("scan".to_string()),
            ..entry("alpha", "three")
        });

        assert_eq!(buf.len(), 3);
        assert_eq!(buf.for_node("alpha").len(), 2);
        assert_eq!(buf.for_node("beta").len(), 1);
        assert_eq!(buf.for_topic("scan").len(), 1);
    }

    #[test]
    fn test_overflow_drops_oldest() {
        let buf = LogBuffer::new();
        for i in 0..(MAX_LOG_ENTRIES + 10) {
            buf.push(entry("n", &format!("m{}", i)));
        }
        assert_eq!(buf.len(), MAX_LOG_ENTRIES);
        let all = buf.get_all();
        assert_eq!(all.first().unwrap().message, "m10");
        assert_eq!(
            all.last().unwrap().message,
            format!("m{}", MAX_LOG_ENTRIES + 9)
        );
    }

    #[test]
    fn test_per_node_order_is_preserved() {
        let buf = LogBuffer::new();
        for i in 0..20 {
            buf.push(entry("ordered", &format!("{}", i)));
        }
        let msgs: Vec<usize> = buf
            .for_node("ordered")
            .iter()
            .map(|e| e.message.parse().unwrap())
            .collect();
        assert!(msgs.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_clear() {
        let buf = LogBuffer::new();
        buf.push(entry("n", "m"));
        buf.clear();
        assert!(buf.is_empty());
    }
}
