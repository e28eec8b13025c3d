//! Frame preprocessing stages for the scan pipeline
//!
//! Every transform allocates a fresh output buffer; input frames are never
//! mutated in place. The stages raise detection odds on low-contrast or
//! noisy captures before the decode engine sees them.

use crate::decode::Decoded;
use crate::frame::{BYTES_PER_PIXEL, Frame, FrameError, Roi};

/// Rec. 601 luma weights, the classic 0.299/0.587/0.114 grayscale.
pub(crate) const LUMA_R: f32 = 0.299;
pub(crate) const LUMA_G: f32 = 0.587;
pub(crate) const LUMA_B: f32 = 0.114;

/// Contrast stretch slope around the 128 midpoint.
const CONTRAST_SLOPE: f32 = 1.5;

/// Fraction of each dimension covered by the centered retry crop.
const ROI_FRACTION: f64 = 0.8;

/// Margin left on each side by [`center_roi`].
const ROI_MARGIN: f64 = 0.1;

/// Grayscale conversion fused with a linear contrast stretch.
///
/// Each pixel collapses to its luma, which is then stretched away from the
/// 128 midpoint by a factor of 1.5 and clamped to the byte range. The result
/// lands in all three color channels; alpha is carried over unchanged. Not
/// idempotent: reapplying pushes values further toward the extremes until
/// they saturate.
#[must_use]
pub fn enhance_contrast(frame: &Frame) -> Frame {
    let mut pixels = frame.pixels().to_vec();

    let simd_end = pixels.len() - pixels.len() % simd::LANE_BYTES;
    let (simd_part, remainder) = pixels.split_at_mut(simd_end);
    simd::enhance_rgba(simd_part);
    for px in remainder.chunks_exact_mut(BYTES_PER_PIXEL) {
        let value = enhance_pixel(px[0], px[1], px[2]);
        px[0] = value;
        px[1] = value;
        px[2] = value;
    }

    Frame::from_raw(frame.width(), frame.height(), pixels)
}

/// Scalar reference for the contrast stretch; the SIMD path in [`simd`]
/// performs the identical operation sequence lane-wise.
#[inline]
fn enhance_pixel(r: u8, g: u8, b: u8) -> u8 {
    let luma = f32::from(r) * LUMA_R + f32::from(g) * LUMA_G + f32::from(b) * LUMA_B;
    let stretched = (luma - 128.0) * CONTRAST_SLOPE + 128.0;
    let clamped = stretched.clamp(0.0, 255.0);
    (clamped + 0.5) as u8
}

/// Collapse an RGBA frame to a row-major luma plane.
#[must_use]
pub fn luma_plane(frame: &Frame) -> Vec<u8> {
    frame
        .pixels()
        .chunks_exact(BYTES_PER_PIXEL)
        .map(|px| {
            let luma =
                f32::from(px[0]) * LUMA_R + f32::from(px[1]) * LUMA_G + f32::from(px[2]) * LUMA_B;
            (luma + 0.5) as u8
        })
        .collect()
}

/// 3x3 box blur over the color channels.
///
/// Interior pixels become the rounded mean of their 3x3 neighborhood in the
/// source buffer; the one-pixel border and every alpha byte are copied
/// through untouched. Neighborhood reads always hit the original buffer, so
/// already-blurred rows never bleed into later ones. Frames too small to
/// have an interior come back as plain copies.
#[must_use]
pub fn denoise(frame: &Frame) -> Frame {
    let width = frame.width() as usize;
    let height = frame.height() as usize;
    let src = frame.pixels();
    let mut out = src.to_vec();

    if width > 2 && height > 2 {
        for y in 1..height - 1 {
            for x in 1..width - 1 {
                let base = (y * width + x) * BYTES_PER_PIXEL;
                for channel in 0..3 {
                    let mut sum = 0u32;
                    for ny in y - 1..=y + 1 {
                        let row = ny * width;
                        for nx in x - 1..=x + 1 {
                            sum += u32::from(src[(row + nx) * BYTES_PER_PIXEL + channel]);
                        }
                    }
                    // +4 rounds the /9 mean to nearest
                    out[base + channel] = ((sum + 4) / 9) as u8;
                }
            }
        }
    }

    Frame::from_raw(frame.width(), frame.height(), out)
}

/// Centered region covering 80% of each dimension, floor-rounded.
///
/// A fixed heuristic rather than content analysis: the same dimensions
/// always produce the same crop, so callers can rely on it across versions.
#[must_use]
pub fn center_roi(width: u32, height: u32) -> Roi {
    let x = (f64::from(width) * ROI_MARGIN) as u32;
    let y = (f64::from(height) * ROI_MARGIN) as u32;
    let roi_width = (f64::from(width) * ROI_FRACTION) as u32;
    let roi_height = (f64::from(height) * ROI_FRACTION) as u32;
    Roi::new(x, y, roi_width, roi_height)
}

/// Copy the pixels inside `roi` into a standalone frame.
pub fn extract_roi(frame: &Frame, roi: Roi) -> Result<Frame, FrameError> {
    if !roi.fits_within(frame.width(), frame.height()) {
        return Err(FrameError::RoiOutOfBounds {
            roi,
            width: frame.width(),
            height: frame.height(),
        });
    }

    let src = frame.pixels();
    let src_stride = frame.width() as usize * BYTES_PER_PIXEL;
    let row_bytes = roi.width as usize * BYTES_PER_PIXEL;
    let mut pixels = Vec::with_capacity(roi.height as usize * row_bytes);

    for y in roi.y..roi.y + roi.height {
        let start = y as usize * src_stride + roi.x as usize * BYTES_PER_PIXEL;
        pixels.extend_from_slice(&src[start..start + row_bytes]);
    }

    Ok(Frame::from_raw(roi.width, roi.height, pixels))
}

/// Translate a decode result from crop-local coordinates back into the
/// frame the crop was taken from.
///
/// Pure coordinate arithmetic; payload and metadata are untouched.
#[must_use]
pub fn remap_coordinates(decoded: Decoded, roi: Roi) -> Decoded {
    let location = decoded.location.offset_by(roi.x as f32, roi.y as f32);
    Decoded { location, ..decoded }
}

mod simd {
    use wide::f32x8;

    use super::{CONTRAST_SLOPE, LUMA_B, LUMA_G, LUMA_R};

    /// Bytes consumed per SIMD iteration: 8 RGBA pixels.
    pub const LANE_BYTES: usize = 32;

    /// Contrast-stretch 8 RGBA pixels at a time.
    ///
    /// `data` length must be a multiple of [`LANE_BYTES`]. Lane math runs
    /// the same mul/add/clamp sequence as the scalar path, so both produce
    /// byte-identical output.
    pub fn enhance_rgba(data: &mut [u8]) {
        debug_assert_eq!(data.len() % LANE_BYTES, 0);

        for chunk in data.chunks_exact_mut(LANE_BYTES) {
            let r = gather(chunk, 0);
            let g = gather(chunk, 1);
            let b = gather(chunk, 2);

            let luma =
                r * f32x8::splat(LUMA_R) + g * f32x8::splat(LUMA_G) + b * f32x8::splat(LUMA_B);
            let stretched =
                (luma - f32x8::splat(128.0)) * f32x8::splat(CONTRAST_SLOPE) + f32x8::splat(128.0);
            let clamped = stretched.max(f32x8::splat(0.0)).min(f32x8::splat(255.0));

            let values = (clamped + f32x8::splat(0.5)).to_array();
            for (pixel, value) in chunk.chunks_exact_mut(4).zip(values) {
                let value = value as u8;
                pixel[0] = value;
                pixel[1] = value;
                pixel[2] = value;
            }
        }
    }

    #[inline]
    fn gather(chunk: &[u8], channel: usize) -> f32x8 {
        f32x8::new([
            f32::from(chunk[channel]),
            f32::from(chunk[channel + 4]),
            f32::from(chunk[channel + 8]),
            f32::from(chunk[channel + 12]),
            f32::from(chunk[channel + 16]),
            f32::from(chunk[channel + 20]),
            f32::from(chunk[channel + 24]),
            f32::from(chunk[channel + 28]),
        ])
    }
}
