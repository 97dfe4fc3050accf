//! Geometric warp filters.

use crate::core::tensor::FrameTensor;
use crate::filters::PixelFilter;

/// Geometric midpoint of an axis, with the half-pixel correction for odd
/// extents. Always integer-valued: `extent/2` for even extents,
/// `(extent-1)/2` for odd ones.
#[inline]
pub(crate) fn midpoint(extent: usize) -> f32 {
    extent as f32 / 2.0 - 0.5 * (extent % 2) as f32
}

/// Largest radius whose backward-mapped boundary samples stay in-bounds for
/// every angle.
///
/// The mapped sample is `midpoint - floor(radius * trig)`, so the reach is
/// `ceil(radius)` on the positive side of each axis; the radius must fit on
/// both sides of both midpoints.
pub(crate) fn max_radius(width: usize, height: usize) -> f32 {
    let mid_x = midpoint(width);
    let mid_y = midpoint(height);
    mid_x
        .min(mid_y)
        .min(width as f32 - 1.0 - mid_x)
        .min(height as f32 - 1.0 - mid_y)
}

/// Radial "light tunnel" distortion, backward-mapped.
///
/// Pixels within `radius` of the frame midpoint pass through; every pixel
/// outside resamples the point exactly `radius` out from the midpoint along
/// its own angle, smearing the boundary ring over the frame's exterior. The
/// sampled coordinate is in-bounds by construction once the radius
/// precondition holds, so this filter has no pass-through boundary case.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightTunnel {
    radius: f32,
}

impl LightTunnel {
    /// Create the warp. The radius precondition against the frame shape is
    /// checked at configuration time, not here.
    pub fn new(radius: f32) -> Self {
        LightTunnel { radius }
    }

    /// The undistorted interior radius.
    pub fn radius(&self) -> f32 {
        self.radius
    }
}

impl PixelFilter for LightTunnel {
    fn name(&self) -> &'static str {
        "light_tunnel"
    }

    fn eval(&self, src: &FrameTensor, channel: usize, y: usize, x: usize) -> f32 {
        let mid_x = midpoint(src.width());
        let mid_y = midpoint(src.height());

        // Squared distances avoid the sqrt on the common interior path.
        let dx = x as f32 - mid_x;
        let dy = y as f32 - mid_y;
        if dx * dx + dy * dy <= self.radius * self.radius {
            return src.get(channel, y, x);
        }

        let angle = (mid_y - y as f32).atan2(mid_x - x as f32);
        let sample_x = mid_x - (self.radius * angle.cos()).floor();
        let sample_y = mid_y - (self.radius * angle.sin()).floor();
        src.get(channel, sample_y as usize, sample_x as usize)
    }
}
