//! Filter functions.
//!
//! Every filter is a pure, stateless function of the input tensor and an
//! explicit `(channel, y, x)` output coordinate. Filters never mutate their
//! input and never depend on any other output element, which is what lets the
//! executor evaluate them sequentially or data-parallel with identical
//! results.
//!
//! Neighborhood filters own their bounds-checking: coordinates whose
//! neighborhood would leave the tensor are passed through unmodified, never
//! treated as errors.

pub mod color;
pub mod convolve;
pub mod warp;

use crate::core::tensor::FrameTensor;

pub use color::BlueCast;
pub use convolve::{EdgeDetect3x3, Emboss3x3, Gaussian5x5, GaussianWeights, LAPLACIAN_3X3};
pub use warp::LightTunnel;

/// A pure per-output-element filter function.
///
/// `eval` must depend only on `src` and the coordinate — no interior
/// mutability, no evaluation-order assumptions. The executor relies on this
/// to dispatch elements in any order under the data-parallel backend.
pub trait PixelFilter: Send + Sync {
    /// Stable identifier used in logs and the CLI catalog.
    fn name(&self) -> &'static str;

    /// Output intensity at `(channel, y, x)`.
    fn eval(&self, src: &FrameTensor, channel: usize, y: usize, x: usize) -> f32;
}

/// Identity filter; stands in whenever filtering is disabled so the executor
/// and telemetry behave uniformly.
#[derive(Debug, Clone, Copy, Default)]
pub struct Passthrough;

impl PixelFilter for Passthrough {
    fn name(&self) -> &'static str {
        "passthrough"
    }

    #[inline]
    fn eval(&self, src: &FrameTensor, channel: usize, y: usize, x: usize) -> f32 {
        src.get(channel, y, x)
    }
}
