//! Unified error handling for HORUS
//!
//! This module provides a centralized error type for the entire HORUS system,
//! ensuring consistent error handling across all components.

use thiserror::Error;

/// Main error type for HORUS operations
#[derive(Debug, Error)]
pub enum HorusError {
    /// I/O related errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration parsing or validation errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Topic name rejected at bind time
    #[error("Invalid topic name '{name}': {reason}")]
    InvalidTopicName { name: String, reason: &'static str },

    /// Topic already bound to a different message type
    #[error("Type mismatch on topic '{topic}': bound to {bound}, requested {requested}")]
    TypeMismatch {
        topic: String,
        bound: String,
        requested: String,
    },

    /// A publisher already exists for this topic within the process
    #[error("Topic '{0}' already has a publisher")]
    DuplicatePublisher(String),

    /// The channel's subscriber cursor table is full
    #[error("Topic '{topic}' already has the maximum of {max} subscribers")]
    TooManySubscribers { topic: String, max: usize },

    /// Message layout exceeds the per-topic slot limit
    #[error("Message of {size} bytes on topic '{topic}' exceeds the {max} byte limit")]
    MessageTooLarge {
        topic: String,
        size: usize,
        max: usize,
    },

    /// Node-related errors
    #[error("Node '{node}' error: {message}")]
    Node { node: String, message: String },

    /// Scheduling errors
    #[error("Scheduling error: {0}")]
    Scheduling(String),

    /// Memory management errors
    #[error("Memory error: {0}")]
    Memory(String),

    /// Invalid input/argument errors
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Initialization errors
    #[error("Initialization failed: {0}")]
    InitializationFailed(String),

    /// Already exists errors (for creation operations)
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    /// Operation not supported on this platform
    #[error("Unsupported: {0}")]
    Unsupported(String),

    /// Internal errors with source location for debugging.
    /// Use the `horus_internal!()` macro to create these — it captures file/line automatically.
    #[error("Internal error: {message} (at {file}:{line})")]
    Internal {
        message: String,
        file: &'static str,
        line: u32,
    },
}

/// Create an internal error with automatic file/line capture.
///
/// ```rust,ignore
/// use horus_core::horus_internal;
/// return Err(horus_internal!("Unexpected state: {:?}", state));
/// ```
#[macro_export]
macro_rules! horus_internal {
    ($($arg:tt)*) => {
        $crate::error::HorusError::Internal {
            message: format!($($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

/// Convenience type alias for Results using HorusError
pub type HorusResult<T> = std::result::Result<T, HorusError>;

// Helper methods
impl HorusError {
    /// Create a configuration error with a custom message
    pub fn config<S: Into<String>>(msg: S) -> Self {
        HorusError::Config(msg.into())
    }

    /// Create a node error with node name and message
    pub fn node<S: Into<String>, T: Into<String>>(node: S, message: T) -> Self {
        HorusError::Node {
            node: node.into(),
            message: message.into(),
        }
    }

    /// Create a scheduling error
    pub fn scheduling<S: Into<String>>(msg: S) -> Self {
        HorusError::Scheduling(msg.into())
    }

    /// Create a memory error
    pub fn memory<S: Into<String>>(msg: S) -> Self {
        HorusError::Memory(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input<S: Into<String>>(msg: S) -> Self {
        HorusError::InvalidInput(msg.into())
    }

    /// Create an internal error (without file/line — prefer horus_internal! macro)
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        HorusError::Internal {
            message: msg.into(),
            file: "unknown",
            line: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = HorusError::DuplicatePublisher("motor_cmd".to_string());
        assert_eq!(err.to_string(), "Topic 'motor_cmd' already has a publisher");

        let err = HorusError::TypeMismatch {
            topic: "pose".to_string(),
            bound: "Pose2D".to_string(),
            requested: "Twist".to_string(),
        };
        assert!(err.to_string().contains("pose"));
        assert!(err.to_string().contains("Pose2D"));
    }

    #[test]
    fn test_internal_macro_captures_location() {
        let err = horus_internal!("bad state {}", 7);
        match err {
            HorusError::Internal {
                message,
                file,
                line,
            } => {
                assert_eq!(message, "bad state 7");
                assert!(file.ends_with("error.rs"));
                assert!(line > 0);
            }
            _ => panic!("expected Internal variant"),
        }
    }
}
