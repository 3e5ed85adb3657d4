//! QR decoding backend for `qrgate-core`.
//!
//! [`QrDecoder`] implements [`qrgate_core::Decoder`] on top of `rqrr`: the RGBA
//! raster is reduced to luma with `image`, optionally inverted, and searched
//! for QR grids. The first grid that decodes wins.
//!
//! ```no_run
//! use qrgate_core::{DecodeOptions, Decoder};
//! use qrgate_decode::QrDecoder;
//!
//! let pixels = vec![255u8; 640 * 480 * 4];
//! let mut decoder = QrDecoder::default();
//! let found = decoder.decode(&pixels, 640, 480, &DecodeOptions::default());
//! assert!(matches!(found, Ok(None)));
//! ```

use image::{imageops, GrayImage, ImageBuffer, Rgba};
use qrgate_core::{DecodeError, DecodeOptions, DecodedPayload, Decoder, RgbaFrame};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Stateless `rqrr` decoder.
#[derive(Clone, Copy, Debug, Default)]
pub struct QrDecoder;

impl QrDecoder {
    pub fn new() -> Self {
        Self
    }
}

impl Decoder for QrDecoder {
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "trace", skip(self, pixels, options))
    )]
    fn decode(
        &mut self,
        pixels: &[u8],
        width: u32,
        height: u32,
        options: &DecodeOptions,
    ) -> Result<Option<DecodedPayload>, DecodeError> {
        let gray = luma_from_rgba(pixels, width, height)?;
        for &inverted in options.inversion.passes() {
            let found = if inverted {
                let mut negative = gray.clone();
                imageops::invert(&mut negative);
                decode_gray(&negative)
            } else {
                decode_gray(&gray)
            };
            if found.is_some() {
                return Ok(found);
            }
        }
        Ok(None)
    }
}

/// Convert a row-major RGBA buffer to an 8-bit luma image.
pub fn luma_from_rgba(pixels: &[u8], width: u32, height: u32) -> Result<GrayImage, DecodeError> {
    if width == 0 || height == 0 {
        return Err(DecodeError::InvalidDimensions { width, height });
    }
    let expected = RgbaFrame::byte_len(width, height);
    if pixels.len() != expected {
        return Err(DecodeError::InvalidBuffer {
            expected,
            got: pixels.len(),
        });
    }
    let rgba = ImageBuffer::<Rgba<u8>, &[u8]>::from_raw(width, height, pixels).ok_or(
        DecodeError::InvalidBuffer {
            expected,
            got: pixels.len(),
        },
    )?;
    Ok(imageops::grayscale(&rgba))
}

/// Search a luma image for QR grids and return the first decodable payload.
///
/// Grids that are detected but fail to decode are logged and skipped.
pub fn decode_gray(img: &GrayImage) -> Option<DecodedPayload> {
    let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(
        img.width() as usize,
        img.height() as usize,
        |x, y| img.get_pixel(x as u32, y as u32)[0],
    );
    let grids = prepared.detect_grids();
    if grids.is_empty() {
        return None;
    }

    for grid in &grids {
        match grid.decode() {
            Ok((meta, content)) => {
                log::debug!(
                    "QR decoded: {} bytes, version {}, ECC {}",
                    content.len(),
                    meta.version.0,
                    meta.ecc_level
                );
                return Some(DecodedPayload::new(content));
            }
            Err(err) => log::warn!("QR grid found but failed to decode: {err:?}"),
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbaImage;
    use qrgate_core::Inversion;

    fn solid(width: u32, height: u32, value: u8) -> Vec<u8> {
        RgbaImage::from_pixel(width, height, Rgba([value, value, value, 255])).into_raw()
    }

    #[test]
    fn blank_frame_has_no_code() {
        let pixels = solid(64, 48, 255);
        let mut decoder = QrDecoder::new();
        for inversion in [
            Inversion::DontInvert,
            Inversion::OnlyInvert,
            Inversion::AttemptBoth,
            Inversion::InvertFirst,
        ] {
            let options = DecodeOptions { inversion };
            assert_eq!(decoder.decode(&pixels, 64, 48, &options), Ok(None));
        }
    }

    #[test]
    fn noise_without_finder_patterns_has_no_code() {
        let img = RgbaImage::from_fn(96, 96, |x, y| {
            let v = if (x / 3 + y / 5) % 2 == 0 { 0 } else { 255 };
            Rgba([v, v, v, 255])
        });
        let options = DecodeOptions {
            inversion: Inversion::AttemptBoth,
        };
        let found = QrDecoder::new()
            .decode(img.as_raw(), img.width(), img.height(), &options)
            .expect("valid frame");
        assert_eq!(found, None);
    }

    #[test]
    fn short_buffer_is_rejected() {
        let mut decoder = QrDecoder::new();
        let err = decoder
            .decode(&[0u8; 10], 4, 4, &DecodeOptions::default())
            .expect_err("short buffer");
        assert_eq!(
            err,
            DecodeError::InvalidBuffer {
                expected: 64,
                got: 10
            }
        );
    }

    #[test]
    fn zero_dimensions_are_rejected() {
        let mut decoder = QrDecoder::new();
        let err = decoder
            .decode(&[], 0, 4, &DecodeOptions::default())
            .expect_err("zero width");
        assert_eq!(
            err,
            DecodeError::InvalidDimensions {
                width: 0,
                height: 4
            }
        );
    }

    #[test]
    fn luma_conversion_keeps_extremes() {
        let white = luma_from_rgba(&solid(2, 2, 255), 2, 2).expect("white");
        assert!(white.pixels().all(|p| p[0] == 255));
        let black = luma_from_rgba(&solid(2, 2, 0), 2, 2).expect("black");
        assert!(black.pixels().all(|p| p[0] == 0));
    }
}
