//! Grayscale conversion of downloaded images.
//!
//! Luminance uses the ITU-R BT.601 luma weights,
//! `Y = 0.299 R + 0.587 G + 0.114 B`, evaluated in integer fixed point with
//! round-half-up so that gray inputs (`R = G = B`) map to themselves.

use std::io::Cursor;
use std::path::Path;

use image::{DynamicImage, GrayImage, ImageFormat, ImageReader, Luma};
use tracing::{debug, instrument};

use grayscout_shared::{GrayscoutError, Result};

/// BT.601 weights scaled by 1000.
const WEIGHT_R: u32 = 299;
const WEIGHT_G: u32 = 587;
const WEIGHT_B: u32 = 114;
const WEIGHT_SCALE: u32 = 1000;

/// Luma of one 8-bit RGB pixel.
pub fn luma_bt601(r: u8, g: u8, b: u8) -> u8 {
    let weighted = WEIGHT_R * u32::from(r) + WEIGHT_G * u32::from(g) + WEIGHT_B * u32::from(b);
    ((weighted + WEIGHT_SCALE / 2) / WEIGHT_SCALE) as u8
}

/// Convert a decoded image to single-channel luminance. Alpha is dropped.
pub fn grayscale_image(image: &DynamicImage) -> GrayImage {
    let rgb = image.to_rgb8();
    GrayImage::from_fn(rgb.width(), rgb.height(), |x, y| {
        let [r, g, b] = rgb.get_pixel(x, y).0;
        Luma([luma_bt601(r, g, b)])
    })
}

/// Decode `src`, convert it to grayscale, and write the result to `dest`.
///
/// The source format is sniffed from the file contents. The output container
/// follows `src`'s extension, or the sniffed format when the extension is
/// unknown. Nothing is written to `dest` unless encoding succeeds.
#[instrument(skip_all, fields(src = %src.display(), dest = %dest.display()))]
pub fn to_grayscale(src: &Path, dest: &Path) -> Result<()> {
    let reader = ImageReader::open(src)
        .map_err(|e| GrayscoutError::io(src, e))?
        .with_guessed_format()
        .map_err(|e| GrayscoutError::io(src, e))?;
    let sniffed = reader.format();

    let decoded = reader
        .decode()
        .map_err(|e| GrayscoutError::decode(src, e.to_string()))?;

    let format = ImageFormat::from_path(src)
        .ok()
        .or(sniffed)
        .ok_or_else(|| GrayscoutError::encode(dest, "cannot determine output format"))?;

    let gray = grayscale_image(&decoded);
    debug!(width = gray.width(), height = gray.height(), ?format, "converted to grayscale");

    let mut encoded = Cursor::new(Vec::new());
    DynamicImage::ImageLuma8(gray)
        .write_to(&mut encoded, format)
        .map_err(|e| GrayscoutError::encode(dest, e.to_string()))?;

    std::fs::write(dest, encoded.into_inner()).map_err(|e| GrayscoutError::io(dest, e))?;
    Ok(())
}
