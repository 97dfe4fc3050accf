//! Per-pixel color remap filters.

use crate::core::tensor::FrameTensor;
use crate::filters::PixelFilter;

/// Ceilings for the blue-cast remap, on the normalized intensity scale.
///
/// The remap flips each color channel against a fixed ceiling: red against
/// full intensity, green against a near-zero ceiling, blue against a mid
/// ceiling, which together push the frame toward a magenta cast.
const CAST_CEILING: [f32; 3] = [255.0 / 256.0, 20.0 / 256.0, 147.0 / 256.0];

/// The "blue filter": a per-pixel color remap toward a magenta cast.
///
/// Each color channel is flipped against its ceiling and clamped back into
/// the normalized range; alpha passes through untouched. No neighborhood
/// reads.
#[derive(Debug, Clone, Copy, Default)]
pub struct BlueCast;

impl PixelFilter for BlueCast {
    fn name(&self) -> &'static str {
        "blue_cast"
    }

    #[inline]
    fn eval(&self, src: &FrameTensor, channel: usize, y: usize, x: usize) -> f32 {
        let v = src.get(channel, y, x);
        match channel {
            0 | 1 | 2 => (CAST_CEILING[channel] - v).clamp(0.0, 1.0),
            _ => v,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_red_channel_flips_against_full_intensity() {
        let src = FrameTensor::constant(4, 3, 3, 0.25).unwrap();
        let filter = BlueCast;
        let out = filter.eval(&src, 0, 1, 1);
        assert!((out - (255.0 / 256.0 - 0.25)).abs() < 1e-6);
    }

    #[test]
    fn test_green_channel_clamps_at_zero() {
        // Ceiling 20/256 is below most intensities, so the flip clamps to 0.
        let src = FrameTensor::constant(4, 3, 3, 0.5).unwrap();
        let filter = BlueCast;
        assert_eq!(filter.eval(&src, 1, 0, 0), 0.0);
    }

    #[test]
    fn test_blue_channel_mid_ceiling() {
        let src = FrameTensor::constant(4, 3, 3, 0.25).unwrap();
        let filter = BlueCast;
        let out = filter.eval(&src, 2, 2, 2);
        assert!((out - (147.0 / 256.0 - 0.25)).abs() < 1e-6);
    }

    #[test]
    fn test_alpha_passes_through() {
        let src = FrameTensor::from_fn(4, 2, 2, |c, _, _| if c == 3 { 0.8 } else { 0.1 }).unwrap();
        let filter = BlueCast;
        assert_eq!(filter.eval(&src, 3, 1, 0), 0.8);
    }

    #[test]
    fn test_output_stays_normalized() {
        let src = FrameTensor::constant(4, 2, 2, 0.0).unwrap();
        let filter = BlueCast;
        for c in 0..4 {
            let v = filter.eval(&src, c, 0, 0);
            assert!((0.0..=1.0).contains(&v));
        }
    }
}
