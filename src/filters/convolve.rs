//! Neighborhood convolution filters.
//!
//! All three filters share the same boundary convention: an output coordinate
//! whose neighborhood would read outside the tensor passes the source value
//! through unmodified. The interior predicates are written with additive
//! bounds (`y + margin < height`) so they are underflow-safe for tensors
//! smaller than the kernel.

use crate::core::error::{ConfigError, ConfigResult};
use crate::core::tensor::FrameTensor;
use crate::filters::PixelFilter;
use serde::{Deserialize, Serialize};

/// Channels carrying color data in an RGBA tensor; the alpha channel is
/// index 3.
const COLOR_CHANNELS: usize = 3;

/// The fixed Laplacian edge-detect kernel, row-major top-left to
/// bottom-right.
pub const LAPLACIAN_3X3: [f32; 9] = [
    -1.0, -1.0, -1.0, //
    -1.0, 8.0, -1.0, //
    -1.0, -1.0, -1.0,
];

#[inline]
fn interior(y: usize, x: usize, height: usize, width: usize, margin: usize) -> bool {
    y >= margin && y + margin < height && x >= margin && x + margin < width
}

/// 3x3 convolution over the color channels with a caller-supplied kernel.
///
/// Interior pixels get the weighted 9-neighborhood sum per color channel and
/// an alpha forced to full opacity; border pixels pass through, alpha
/// included.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeDetect3x3 {
    kernel: [f32; 9],
}

impl EdgeDetect3x3 {
    /// Create the filter with an explicit 3x3 kernel (row-major, top-left to
    /// bottom-right).
    pub fn new(kernel: [f32; 9]) -> Self {
        EdgeDetect3x3 { kernel }
    }
}

impl Default for EdgeDetect3x3 {
    fn default() -> Self {
        Self::new(LAPLACIAN_3X3)
    }
}

impl PixelFilter for EdgeDetect3x3 {
    fn name(&self) -> &'static str {
        "edge_detect"
    }

    fn eval(&self, src: &FrameTensor, channel: usize, y: usize, x: usize) -> f32 {
        if !interior(y, x, src.height(), src.width(), 1) {
            return src.get(channel, y, x);
        }
        if channel >= COLOR_CHANNELS {
            // Alpha is forced to full opacity across the interior.
            return 1.0;
        }
        let k = &self.kernel;
        k[0] * src.get(channel, y - 1, x - 1)
            + k[1] * src.get(channel, y - 1, x)
            + k[2] * src.get(channel, y - 1, x + 1)
            + k[3] * src.get(channel, y, x - 1)
            + k[4] * src.get(channel, y, x)
            + k[5] * src.get(channel, y, x + 1)
            + k[6] * src.get(channel, y + 1, x - 1)
            + k[7] * src.get(channel, y + 1, x)
            + k[8] * src.get(channel, y + 1, x + 1)
    }
}

/// Emboss: two fixed directional Sobel gradients summed and recentered.
///
/// Operates per channel on the first `color_channels` channels; the 0.5 term
/// lifts the signed gradient sum back into visible range. Everything outside
/// the one-pixel interior margin, and every channel at or above
/// `color_channels`, passes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Emboss3x3 {
    color_channels: usize,
}

impl Emboss3x3 {
    /// Create the filter for tensors whose first `color_channels` channels
    /// carry color data.
    pub fn new(color_channels: usize) -> Self {
        Emboss3x3 { color_channels }
    }
}

impl Default for Emboss3x3 {
    fn default() -> Self {
        Self::new(COLOR_CHANNELS)
    }
}

impl PixelFilter for Emboss3x3 {
    fn name(&self) -> &'static str {
        "emboss"
    }

    fn eval(&self, src: &FrameTensor, channel: usize, y: usize, x: usize) -> f32 {
        if channel >= self.color_channels || !interior(y, x, src.height(), src.width(), 1) {
            return src.get(channel, y, x);
        }
        // Horizontal gradient: left column negative, right column positive.
        let c = -src.get(channel, y - 1, x - 1) - 2.0 * src.get(channel, y, x - 1)
            - src.get(channel, y + 1, x - 1)
            + src.get(channel, y - 1, x + 1)
            + 2.0 * src.get(channel, y, x + 1)
            + src.get(channel, y + 1, x + 1);
        // Vertical gradient: top row negative, bottom row positive.
        let d = -src.get(channel, y - 1, x - 1) - 2.0 * src.get(channel, y - 1, x)
            - src.get(channel, y - 1, x + 1)
            + src.get(channel, y + 1, x - 1)
            + 2.0 * src.get(channel, y + 1, x)
            + src.get(channel, y + 1, x + 1);
        c + d + 0.5
    }
}

/// The six independent weights of a symmetric 5x5 Gaussian kernel.
///
/// Naming follows the (row, column) distance from the center:
/// `k00` center, `k01` distance-1 cross, `k02` distance-2 cross, `k11`
/// distance-1 diagonal, `k12` knight's-move, `k22` distance-2 diagonal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GaussianWeights {
    /// Center weight.
    pub k00: f32,
    /// Axis-adjacent distance-1 weight (4 neighbors).
    pub k01: f32,
    /// Axis-aligned distance-2 weight (4 neighbors).
    pub k02: f32,
    /// Diagonal distance-1 weight (4 neighbors).
    pub k11: f32,
    /// Knight's-move weight (8 neighbors).
    pub k12: f32,
    /// Diagonal distance-2 weight (4 neighbors).
    pub k22: f32,
}

impl GaussianWeights {
    /// Derive the sextuple from a Gaussian standard deviation:
    /// `exp(-d^2 / 2 sigma^2)` for each symmetry class's squared distance.
    pub fn from_sigma(sigma: f32) -> Self {
        let g = |dist_sq: f32| (-dist_sq / (2.0 * sigma * sigma)).exp();
        GaussianWeights {
            k00: g(0.0),
            k01: g(1.0),
            k02: g(4.0),
            k11: g(2.0),
            k12: g(5.0),
            k22: g(8.0),
        }
    }

    /// Sum of the full 25-cell kernel, folded through the symmetry
    /// multiplicities: one center, four of each 4-fold class, eight
    /// knight's-moves.
    pub fn folded_sum(&self) -> f32 {
        self.k00 + (self.k01 + self.k02 + self.k11 + self.k22) * 4.0 + self.k12 * 8.0
    }

    /// The folded sum, rejected when it cannot serve as a renormalization
    /// divisor.
    pub fn validated_sum(&self) -> ConfigResult<f32> {
        let sum = self.folded_sum();
        if !sum.is_finite() || sum == 0.0 {
            return Err(ConfigError::DegenerateKernel { sum });
        }
        Ok(sum)
    }
}

impl Default for GaussianWeights {
    fn default() -> Self {
        Self::from_sigma(1.0)
    }
}

/// 5x5 weighted Gaussian convolution with renormalization.
///
/// The 4-fold/8-fold symmetry of the kernel folds the 25 multiplies down to
/// six weighted neighbor sums; dividing by the folded weight sum preserves
/// energy for any weight set. Valid only with a two-pixel margin and for
/// color channels; elsewhere pass-through.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gaussian5x5 {
    weights: GaussianWeights,
    color_channels: usize,
    norm: f32,
}

impl Gaussian5x5 {
    /// Create the filter, validating that the weight set is renormalizable.
    pub fn new(weights: GaussianWeights) -> ConfigResult<Self> {
        Self::with_color_channels(weights, COLOR_CHANNELS)
    }

    /// As [`new`](Self::new) with an explicit color-channel count.
    pub fn with_color_channels(weights: GaussianWeights, color_channels: usize) -> ConfigResult<Self> {
        let norm = weights.validated_sum()?;
        Ok(Gaussian5x5 {
            weights,
            color_channels,
            norm,
        })
    }
}

impl PixelFilter for Gaussian5x5 {
    fn name(&self) -> &'static str {
        "gaussian"
    }

    fn eval(&self, src: &FrameTensor, channel: usize, y: usize, x: usize) -> f32 {
        if channel >= self.color_channels || !interior(y, x, src.height(), src.width(), 2) {
            return src.get(channel, y, x);
        }
        let w = &self.weights;
        let at = |dy: isize, dx: isize| {
            src.get(
                channel,
                (y as isize + dy) as usize,
                (x as isize + dx) as usize,
            )
        };
        let g = w.k00 * at(0, 0)
            + w.k01 * (at(-1, 0) + at(0, -1) + at(0, 1) + at(1, 0))
            + w.k02 * (at(-2, 0) + at(0, -2) + at(0, 2) + at(2, 0))
            + w.k11 * (at(-1, -1) + at(-1, 1) + at(1, -1) + at(1, 1))
            + w.k12
                * (at(-2, -1)
                    + at(-2, 1)
                    + at(-1, -2)
                    + at(-1, 2)
                    + at(1, -2)
                    + at(1, 2)
                    + at(2, -1)
                    + at(2, 1))
            + w.k22 * (at(-2, -2) + at(-2, 2) + at(2, -2) + at(2, 2));
        g / self.norm
    }
}
