//! # Chitra - Real-time Per-pixel Video Filters
//!
//! Chitra applies per-pixel, data-parallel image filters to a live video
//! frame stream and runs identically on two execution backends: a
//! deterministic sequential CPU scan, or a data-parallel regime with one
//! independent logical unit of work per output element.
//!
//! ## Features
//!
//! - **Pure filter functions**: every filter is a stateless function of the
//!   input tensor and an explicit `(channel, y, x)` coordinate, unit-testable
//!   by direct invocation
//! - **Backend equivalence**: one filter definition runs under both
//!   execution modes with identical output
//! - **Hot-swap**: filter, enable flag and backend can change between frames,
//!   never mid-frame
//! - **Defined boundaries**: out-of-margin coordinates pass through; they are
//!   never errors
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use chitra::prelude::*;
//!
//! // Select a filter and a backend.
//! let config = FilterConfig::new(FilterKind::Gaussian {
//!     weights: GaussianWeights::from_sigma(1.5),
//! })
//! .with_backend(ExecutionMode::Gpu);
//!
//! // Wire a source and presenter and run the loop.
//! let source = ImageSource::from_path("frame.png", false)?;
//! let mut frame_loop = FrameLoop::new(source, LastFramePresenter::new(), config);
//!
//! let fps = frame_loop.fps_handle();
//! let control = frame_loop.control();
//! frame_loop.run(60)?;
//! println!("{:.0} fps", fps.get());
//!
//! // Toggle the filter off; takes effect from the next frame.
//! control.set_enabled(false);
//! ```
//!
//! ## Architecture
//!
//! The library is organized into four modules:
//!
//! - [`core`]: the frame tensor, the configuration surface, error types
//! - [`filters`]: the pure per-pixel filter functions
//! - [`execution`]: the backend state machine and the frame loop
//! - [`video`]: the source/presenter boundary with external collaborators
//!
//! ## Writing a Custom Filter
//!
//! Implement [`PixelFilter`](filters::PixelFilter): a pure function from the
//! input tensor and an output coordinate to an intensity. Filters must not
//! depend on evaluation order — the data-parallel backend evaluates
//! coordinates in no particular order.
//!
//! ```rust,ignore
//! use chitra::prelude::*;
//!
//! struct Negate;
//!
//! impl PixelFilter for Negate {
//!     fn name(&self) -> &'static str {
//!         "negate"
//!     }
//!
//!     fn eval(&self, src: &FrameTensor, c: usize, y: usize, x: usize) -> f32 {
//!         1.0 - src.get(c, y, x)
//!     }
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod core;
pub mod execution;
pub mod filters;
pub mod video;

/// Prelude module for convenient imports.
///
/// Import everything commonly needed with:
/// ```rust,ignore
/// use chitra::prelude::*;
/// ```
pub mod prelude {
    // Core types
    pub use crate::core::config::{
        ExecutionMode, FilterConfig, FilterInfo, FilterKind, CATALOG,
    };
    pub use crate::core::tensor::{FrameTensor, RawLayout, RGBA_CHANNELS};

    // Errors
    pub use crate::core::error::{
        ChitraError, ChitraResult, ConfigError, ExecutorError, StreamError,
    };

    // Filters
    pub use crate::filters::{
        BlueCast, EdgeDetect3x3, Emboss3x3, Gaussian5x5, GaussianWeights, LightTunnel,
        Passthrough, PixelFilter, LAPLACIAN_3X3,
    };

    // Execution
    pub use crate::execution::executor::Executor;
    pub use crate::execution::frame_loop::{
        ControlHandle, FpsHandle, FrameLoop, FrameStatus, FrameUpdate, LoopStats, SkipReason,
    };

    // Video boundary
    pub use crate::video::{
        tensor_to_rgba, FramePresenter, FrameSource, ImageSource, LastFramePresenter,
        NullPresenter, RawFrame,
    };
}

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
