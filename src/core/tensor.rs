//! The 3-D frame tensor and its raw-buffer read path.
//!
//! A [`FrameTensor`] is a channel-major `channels x height x width` array of
//! normalized `f32` intensities. Row index `y` increases downward in display
//! space; capture buffers that are stored bottom-up (or mirrored) declare it
//! in [`RawLayout`] and the flips are applied once, during the raw-buffer
//! read. Filters only ever see display-space coordinates.
//!
//! Filters never mutate their input tensor: the executor reads one tensor and
//! writes a disjoint output tensor of identical shape.

use crate::core::error::{ChitraResult, ConfigError, ConfigResult, StreamError};
use std::fmt;

/// Number of channels in an interleaved RGBA capture buffer.
pub const RGBA_CHANNELS: usize = 4;

/// Scale divisor mapping 8-bit intensities into the normalized range.
const INTENSITY_SCALE: f32 = 256.0;

/// Orientation flags for a raw capture buffer.
///
/// Both transforms are applied during the raw-buffer -> tensor read, so the
/// tensor itself is always display-oriented.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RawLayout {
    /// Buffer rows run bottom-up (row 0 of the buffer is the bottom of the
    /// displayed image).
    pub bottom_up: bool,
    /// The feed is mirrored left-to-right (front-facing camera).
    pub mirrored: bool,
}

/// A channel-major `channels x height x width` tensor of normalized
/// intensities.
pub struct FrameTensor {
    data: Vec<f32>,
    channels: usize,
    height: usize,
    width: usize,
}

impl Clone for FrameTensor {
    fn clone(&self) -> Self {
        FrameTensor {
            data: self.data.clone(),
            channels: self.channels,
            height: self.height,
            width: self.width,
        }
    }
}

impl FrameTensor {
    /// Create a zero-filled tensor.
    ///
    /// Rejects shapes with any zero axis.
    pub fn new(channels: usize, height: usize, width: usize) -> ConfigResult<Self> {
        validate_shape(channels, height, width)?;
        Ok(FrameTensor {
            data: vec![0.0; channels * height * width],
            channels,
            height,
            width,
        })
    }

    /// Create a tensor filled with a single value.
    pub fn constant(channels: usize, height: usize, width: usize, value: f32) -> ConfigResult<Self> {
        validate_shape(channels, height, width)?;
        Ok(FrameTensor {
            data: vec![value; channels * height * width],
            channels,
            height,
            width,
        })
    }

    /// Create a tensor by evaluating `f` at every `(channel, y, x)`.
    pub fn from_fn<F>(channels: usize, height: usize, width: usize, mut f: F) -> ConfigResult<Self>
    where
        F: FnMut(usize, usize, usize) -> f32,
    {
        let mut tensor = Self::new(channels, height, width)?;
        for c in 0..channels {
            for y in 0..height {
                for x in 0..width {
                    let idx = tensor.index_of(c, y, x);
                    tensor.data[idx] = f(c, y, x);
                }
            }
        }
        Ok(tensor)
    }

    /// Read an interleaved 8-bit RGBA capture buffer into a tensor.
    ///
    /// Applies the vertical flip (for bottom-up buffers) and the horizontal
    /// mirror declared in `layout`, and scales each 8-bit intensity by 1/256
    /// into the normalized range.
    pub fn from_raw(
        raw: &[u8],
        width: usize,
        height: usize,
        layout: RawLayout,
    ) -> ChitraResult<Self> {
        validate_shape(RGBA_CHANNELS, height, width)?;
        let expected = width * height * RGBA_CHANNELS;
        if raw.len() != expected {
            return Err(StreamError::FrameSizeMismatch {
                expected,
                actual: raw.len(),
                width,
                height,
                channels: RGBA_CHANNELS,
            }
            .into());
        }

        let mut tensor = Self::new(RGBA_CHANNELS, height, width)?;
        for c in 0..RGBA_CHANNELS {
            for y in 0..height {
                let src_y = if layout.bottom_up { height - 1 - y } else { y };
                for x in 0..width {
                    let src_x = if layout.mirrored { width - 1 - x } else { x };
                    let byte = raw[(src_y * width + src_x) * RGBA_CHANNELS + c];
                    let idx = tensor.index_of(c, y, x);
                    tensor.data[idx] = byte as f32 / INTENSITY_SCALE;
                }
            }
        }
        Ok(tensor)
    }

    /// Number of channels.
    #[inline]
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Height in pixels.
    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Width in pixels.
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Total number of elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True when the tensor holds no elements (never, for a validated shape).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Read the intensity at `(channel, y, x)`.
    ///
    /// # Panics
    /// Panics if the coordinate is out of bounds.
    #[inline]
    pub fn get(&self, channel: usize, y: usize, x: usize) -> f32 {
        self.bounds_check(channel, y, x);
        self.data[self.index_of(channel, y, x)]
    }

    /// Store `value` at `(channel, y, x)`.
    ///
    /// # Panics
    /// Panics if the coordinate is out of bounds.
    #[inline]
    pub fn set(&mut self, channel: usize, y: usize, x: usize, value: f32) {
        self.bounds_check(channel, y, x);
        let idx = self.index_of(channel, y, x);
        self.data[idx] = value;
    }

    /// Flat view of the underlying buffer, channel-major.
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Mutable flat view of the underlying buffer.
    pub fn as_mut_slice(&mut self) -> &mut [f32] {
        &mut self.data
    }

    /// Flat index of `(channel, y, x)` in the channel-major buffer.
    #[inline]
    pub(crate) fn index_of(&self, channel: usize, y: usize, x: usize) -> usize {
        (channel * self.height + y) * self.width + x
    }

    /// Inverse of [`index_of`](Self::index_of): `(channel, y, x)` of a flat
    /// index.
    #[inline]
    pub(crate) fn coords_of(&self, index: usize) -> (usize, usize, usize) {
        let x = index % self.width;
        let rest = index / self.width;
        let y = rest % self.height;
        let channel = rest / self.height;
        (channel, y, x)
    }

    #[inline]
    fn bounds_check(&self, channel: usize, y: usize, x: usize) {
        assert!(
            channel < self.channels && y < self.height && x < self.width,
            "coordinate ({channel},{y},{x}) out of bounds for tensor {}x{}x{}",
            self.channels,
            self.height,
            self.width,
        );
    }
}

fn validate_shape(channels: usize, height: usize, width: usize) -> ConfigResult<()> {
    if channels == 0 || height == 0 || width == 0 {
        return Err(ConfigError::InvalidDimensions {
            channels,
            height,
            width,
        });
    }
    Ok(())
}

impl std::ops::Index<(usize, usize, usize)> for FrameTensor {
    type Output = f32;

    #[inline]
    fn index(&self, (channel, y, x): (usize, usize, usize)) -> &f32 {
        self.bounds_check(channel, y, x);
        &self.data[self.index_of(channel, y, x)]
    }
}

impl fmt::Debug for FrameTensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "FrameTensor {{ {}x{}x{} }}",
            self.channels, self.height, self.width
        )?;
        for c in 0..self.channels.min(4) {
            writeln!(f, "  channel {c}:")?;
            for y in 0..self.height.min(6) {
                write!(f, "    [")?;
                for x in 0..self.width.min(10) {
                    if x > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{:.3}", self.get(c, y, x))?;
                }
                if self.width > 10 {
                    write!(f, ", ...")?;
                }
                writeln!(f, "]")?;
            }
        }
        Ok(())
    }
}
