//! RGB rasters built from decoded images.
//!
//! Any format the `image` crate can decode is converted to a packed RGB
//! [`Pixmap`] (alpha is dropped) and written back out as PNG.

use image::{ImageBuffer, ImageFormat, Rgb};
use std::io;
use std::path::{Path, PathBuf};
use tracing::info;

/// Errors that can occur while building or saving a raster.
#[derive(Debug, thiserror::Error)]
pub enum RasterError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Invalid pixel data: expected {expected} bytes, got {actual}")]
    InvalidPixelData { expected: usize, actual: usize },

    #[error("Invalid raster dimensions: width={width}, height={height}")]
    InvalidDimensions { width: u32, height: u32 },
}

/// A raster with 3 bytes (R, G, B) per pixel, rows top to bottom.
#[derive(Debug, Clone, PartialEq)]
pub struct Pixmap {
    pub width: u32,
    pub height: u32,
    pub samples: Vec<u8>,
}

impl Pixmap {
    /// Creates a new Pixmap, checking the sample buffer length.
    pub fn new(width: u32, height: u32, samples: Vec<u8>) -> Result<Self, RasterError> {
        if width == 0 || height == 0 {
            return Err(RasterError::InvalidDimensions { width, height });
        }
        let expected = (width as usize) * (height as usize) * 3;
        if samples.len() != expected {
            return Err(RasterError::InvalidPixelData {
                expected,
                actual: samples.len(),
            });
        }
        Ok(Pixmap {
            width,
            height,
            samples,
        })
    }

    /// Decodes an image file and converts it to RGB.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, RasterError> {
        let rgb = image::open(path)?.to_rgb8();
        let (width, height) = rgb.dimensions();
        Pixmap::new(width, height, rgb.into_raw())
    }

    /// Returns the number of pixels in the raster.
    pub fn pixel_count(&self) -> usize {
        (self.width as usize) * (self.height as usize)
    }

    /// Writes the raster as PNG.
    pub fn save_png(&self, path: impl AsRef<Path>) -> Result<(), RasterError> {
        let buffer = ImageBuffer::<Rgb<u8>, _>::from_raw(
            self.width,
            self.height,
            self.samples.as_slice(),
        )
        .ok_or(RasterError::InvalidPixelData {
            expected: self.pixel_count() * 3,
            actual: self.samples.len(),
        })?;
        buffer.save_with_format(path, ImageFormat::Png)?;
        Ok(())
    }
}

/// Returns `<input>-from-image.png` next to the input.
pub fn default_png_path(input: &Path) -> PathBuf {
    let mut name = input.as_os_str().to_os_string();
    name.push("-from-image.png");
    PathBuf::from(name)
}

/// Converts any decodable image to an RGB PNG. Returns the raster size.
pub fn image_to_png(input: &Path, output: &Path) -> Result<(u32, u32), RasterError> {
    info!(input = %input.display(), "reading image");
    let pixmap = Pixmap::open(input)?;
    info!(output = %output.display(), width = pixmap.width, height = pixmap.height, "writing png");
    pixmap.save_png(output)?;
    Ok((pixmap.width, pixmap.height))
}
