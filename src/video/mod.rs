//! Frame source and presenter boundary.
//!
//! The engine does not own capture or presentation. A [`FrameSource`] hands
//! over the current raw pixel buffer (with its orientation flags) or reports
//! that no frame is available; a [`FramePresenter`] consumes the filtered
//! output tensor. [`ImageSource`] adapts a still image into an endlessly
//! repeating feed for the demo binary, tests and benches.

use crate::core::error::StreamError;
use crate::core::tensor::{FrameTensor, RawLayout};
use image::RgbaImage;
use std::path::Path;

/// One raw frame as delivered by a capture source: interleaved 8-bit RGBA
/// plus the flags describing its orientation.
#[derive(Debug, Clone)]
pub struct RawFrame {
    /// Interleaved RGBA bytes, `width * height * 4` of them.
    pub data: Vec<u8>,
    /// Width in pixels.
    pub width: usize,
    /// Height in pixels.
    pub height: usize,
    /// Orientation of `data`.
    pub layout: RawLayout,
}

/// A live source of raw frames.
///
/// Returning `Ok(None)` means no frame is currently available; the frame
/// loop skips that iteration rather than treating it as an error.
pub trait FrameSource {
    /// Pull the current frame, if one is available.
    fn next_frame(&mut self) -> Result<Option<RawFrame>, StreamError>;
}

/// Consumer of filtered output tensors.
pub trait FramePresenter {
    /// Present one filtered frame.
    fn present(&mut self, frame: &FrameTensor) -> Result<(), StreamError>;
}

/// A still image replayed as an endless feed.
pub struct ImageSource {
    frame: RawFrame,
}

impl ImageSource {
    /// Load an image file as the repeating frame.
    pub fn from_path(path: impl AsRef<Path>, mirrored: bool) -> Result<Self, StreamError> {
        let image = image::open(path)?;
        Ok(Self::from_rgba(image.to_rgba8(), mirrored))
    }

    /// Wrap an in-memory RGBA image as the repeating frame.
    pub fn from_rgba(image: RgbaImage, mirrored: bool) -> Self {
        let width = image.width() as usize;
        let height = image.height() as usize;
        ImageSource {
            frame: RawFrame {
                data: image.into_raw(),
                width,
                height,
                // Decoded images are top-down, unlike typical capture
                // buffers.
                layout: RawLayout {
                    bottom_up: false,
                    mirrored,
                },
            },
        }
    }

    /// Frame dimensions.
    pub fn dimensions(&self) -> (usize, usize) {
        (self.frame.width, self.frame.height)
    }
}

impl FrameSource for ImageSource {
    fn next_frame(&mut self) -> Result<Option<RawFrame>, StreamError> {
        Ok(Some(self.frame.clone()))
    }
}

/// Keeps only the most recent presented frame, already quantized for
/// encoding.
#[derive(Default)]
pub struct LastFramePresenter {
    last: Option<RgbaImage>,
}

impl LastFramePresenter {
    /// Create an empty presenter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the most recently presented frame, if any.
    pub fn take_last(&mut self) -> Option<RgbaImage> {
        self.last.take()
    }
}

impl FramePresenter for LastFramePresenter {
    fn present(&mut self, frame: &FrameTensor) -> Result<(), StreamError> {
        self.last = Some(tensor_to_rgba(frame));
        Ok(())
    }
}

/// Discards every frame; used by benches and throughput measurements.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullPresenter;

impl FramePresenter for NullPresenter {
    fn present(&mut self, _frame: &FrameTensor) -> Result<(), StreamError> {
        Ok(())
    }
}

/// Quantize a normalized tensor back into an 8-bit RGBA image.
///
/// Tensors with fewer than four channels get an opaque alpha.
pub fn tensor_to_rgba(tensor: &FrameTensor) -> RgbaImage {
    let width = tensor.width();
    let height = tensor.height();
    let quantize = |v: f32| (v * 256.0).clamp(0.0, 255.0) as u8;

    RgbaImage::from_fn(width as u32, height as u32, |x, y| {
        let (x, y) = (x as usize, y as usize);
        let sample = |c: usize| {
            if c < tensor.channels() {
                quantize(tensor.get(c, y, x))
            } else if c == 3 {
                255
            } else {
                0
            }
        };
        image::Rgba([sample(0), sample(1), sample(2), sample(3)])
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::tensor::RGBA_CHANNELS;

    fn gradient_image(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, y| {
            image::Rgba([(x * 10) as u8, (y * 10) as u8, 128, 255])
        })
    }

    #[test]
    fn test_image_source_loops() {
        let mut source = ImageSource::from_rgba(gradient_image(4, 3), false);
        for _ in 0..3 {
            let frame = source.next_frame().unwrap().expect("frame available");
            assert_eq!(frame.width, 4);
            assert_eq!(frame.height, 3);
            assert_eq!(frame.data.len(), 4 * 3 * RGBA_CHANNELS);
            assert!(!frame.layout.bottom_up);
        }
    }

    #[test]
    fn test_mirrored_flag_propagates() {
        let source = ImageSource::from_rgba(gradient_image(2, 2), true);
        assert!(source.frame.layout.mirrored);
    }

    #[test]
    fn test_quantization_round_trip() {
        let frame = gradient_image(4, 4);
        let mut source = ImageSource::from_rgba(frame.clone(), false);
        let raw = source.next_frame().unwrap().unwrap();
        let tensor = FrameTensor::from_raw(&raw.data, raw.width, raw.height, raw.layout).unwrap();
        let back = tensor_to_rgba(&tensor);
        assert_eq!(back, frame);
    }

    #[test]
    fn test_three_channel_tensor_gets_opaque_alpha() {
        let tensor = FrameTensor::constant(3, 2, 2, 0.5).unwrap();
        let rgba = tensor_to_rgba(&tensor);
        assert_eq!(rgba.get_pixel(0, 0)[3], 255);
        assert_eq!(rgba.get_pixel(0, 0)[0], 128);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.png");

        let tensor = FrameTensor::constant(4, 8, 8, 0.25).unwrap();
        tensor_to_rgba(&tensor).save(&path).unwrap();

        let reloaded = image::open(&path).unwrap().to_rgba8();
        assert_eq!(reloaded.get_pixel(4, 4)[0], 64);
    }
}
