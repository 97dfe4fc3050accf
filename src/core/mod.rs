//! Core types for the chitra filter engine.
//!
//! This module contains the foundational pieces the rest of the crate builds
//! on:
//! - The frame tensor and its raw-buffer read path
//! - The filter/backend configuration surface
//! - Error types

pub mod config;
pub mod error;
pub mod tensor;

// Re-export commonly used types
pub use config::{ExecutionMode, FilterConfig, FilterInfo, FilterKind, CATALOG};
pub use error::{ChitraError, ChitraResult, ConfigError, ExecutorError, StreamError};
pub use tensor::{FrameTensor, RawLayout, RGBA_CHANNELS};
