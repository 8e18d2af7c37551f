//! Core node abstractions: the lifecycle contract, the per-callback
//! context, and the structured log sink.

pub mod log_buffer;
pub mod node;

pub use log_buffer::{publish_log, LogBuffer, LogEntry, LogType, GLOBAL_LOG_BUFFER};
pub use node::{LogSummary, Node, NodeInfo, NodeState, TopicMetadata, MAX_NODE_NAME_LEN};
