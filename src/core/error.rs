//! Error types for chitra.
//!
//! Uses thiserror for structured errors with context. The split follows the
//! lifecycle of a frame: configuration errors are caught before any frame is
//! dispatched, executor errors surface at dispatch time, and stream errors
//! come from the frame source/presenter boundary.

use crate::core::config::ExecutionMode;
use thiserror::Error;

/// Errors rejected at configuration time, before any frame is dispatched.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("invalid tensor dimensions {channels}x{height}x{width}: every axis must be non-zero")]
    InvalidDimensions {
        channels: usize,
        height: usize,
        width: usize,
    },

    #[error("light-tunnel radius {radius} exceeds the largest in-bounds radius {limit} for a {width}x{height} frame")]
    RadiusPrecondition {
        radius: f32,
        limit: f32,
        width: usize,
        height: usize,
    },

    #[error("gaussian weight set folds to a non-renormalizable sum ({sum})")]
    DegenerateKernel { sum: f32 },
}

/// Errors from the executor state machine.
#[derive(Error, Debug)]
pub enum ExecutorError {
    #[error("{mode:?} backend could not be constructed: {reason}")]
    BackendUnavailable { mode: ExecutionMode, reason: String },

    #[error("frame dispatched on a disposed executor")]
    Disposed,

    #[error("configuration rejected: {0}")]
    Config(#[from] ConfigError),
}

/// Errors from the frame source / presenter boundary.
#[derive(Error, Debug)]
pub enum StreamError {
    #[error("frame buffer is {actual} bytes, expected {expected} for {width}x{height}x{channels}")]
    FrameSizeMismatch {
        expected: usize,
        actual: usize,
        width: usize,
        height: usize,
        channels: usize,
    },

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Top-level error type for chitra.
///
/// Encompasses all error categories and enables automatic conversion from
/// the subsystem errors.
#[derive(Error, Debug)]
pub enum ChitraError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("execution error: {0}")]
    Executor(#[from] ExecutorError),

    #[error("stream error: {0}")]
    Stream(#[from] StreamError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ExecutorError {
    /// Whether the frame loop can keep running after this error.
    ///
    /// A missing backend is recoverable (the executor falls back to CPU);
    /// dispatch-after-dispose is a programming error and is not.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, ExecutorError::BackendUnavailable { .. })
    }
}

/// Result type alias for chitra operations.
pub type ChitraResult<T> = Result<T, ChitraError>;

/// Result type alias for configuration checks.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Result type alias for executor operations.
pub type ExecResult<T> = Result<T, ExecutorError>;
