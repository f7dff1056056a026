//! Rendered barcode bitmaps.

use std::path::Path;

use image::GrayImage;
use rxing::common::BitMatrix;

use super::luma::LumaView;
use crate::format::BarcodeFormat;

/// Luma value of a dark module.
pub const DARK: u8 = 0;
/// Luma value of a light module.
pub const LIGHT: u8 = 255;

/// An encoded barcode as a grayscale pixel matrix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BarcodeImage {
    format: BarcodeFormat,
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl BarcodeImage {
    /// Rasterize a writer's bit matrix, one pixel per matrix cell.
    pub(crate) fn from_bit_matrix(format: BarcodeFormat, matrix: &BitMatrix) -> Self {
        let width = matrix.getWidth();
        let height = matrix.getHeight();
        let mut pixels = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                pixels.push(if matrix.get(x, y) { DARK } else { LIGHT });
            }
        }
        Self {
            format,
            width,
            height,
            pixels,
        }
    }

    pub fn format(&self) -> BarcodeFormat {
        self.format
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Row-major luma bytes.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn is_dark(&self, x: u32, y: u32) -> bool {
        x < self.width
            && y < self.height
            && self.pixels[(y * self.width + x) as usize] == DARK
    }

    /// Borrow the bitmap as decoder input.
    pub fn luma_view(&self) -> LumaView<'_> {
        LumaView::full(&self.pixels, self.width, self.height)
            .unwrap_or_else(|| unreachable!("bitmap buffer always matches its dimensions"))
    }

    /// Copy into an `image` buffer for saving or further processing.
    pub fn to_gray_image(&self) -> GrayImage {
        GrayImage::from_raw(self.width, self.height, self.pixels.clone())
            .unwrap_or_else(|| GrayImage::new(self.width, self.height))
    }

    /// Write the bitmap to disk; the file type follows the path's extension.
    pub fn save(&self, path: &Path) -> Result<(), image::ImageError> {
        self.to_gray_image().save(path)
    }
}
