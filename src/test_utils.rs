//! Synthetic frame builders for tests and examples.
//!
//! Compiled only with the `test-utils` feature. The crate dev-depends on
//! itself with the feature enabled, so unit and integration tests always
//! have these available.

use qrcode::{Color, QrCode};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::frame::{BYTES_PER_PIXEL, Frame};

/// Blank modules framing a generated code on every side.
const QUIET_MODULES: u32 = 4;

/// Frame filled with one gray level, alpha fully opaque.
#[must_use]
pub fn solid_frame(width: u32, height: u32, level: u8) -> Frame {
    Frame::filled(width, height, [level, level, level, 255])
}

/// Overwrite one pixel with a gray level, alpha untouched.
pub fn set_gray(frame: &mut Frame, x: u32, y: u32, level: u8) {
    let at = frame.offset(x, y);
    frame.pixels_mut()[at..at + 3].fill(level);
}

/// Frame of uniform noise. The same seed always yields the same pixels;
/// alpha is fully opaque.
#[must_use]
pub fn noise_frame(width: u32, height: u32, seed: u64) -> Frame {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut pixels = vec![0u8; width as usize * height as usize * BYTES_PER_PIXEL];
    rng.fill(&mut pixels[..]);
    for px in pixels.chunks_exact_mut(BYTES_PER_PIXEL) {
        px[3] = 255;
    }
    Frame::new(width, height, pixels).expect("generated buffer matches its dimensions")
}

/// Color-inverted copy of a frame, alpha untouched.
#[must_use]
pub fn invert_frame(frame: &Frame) -> Frame {
    let mut inverted = frame.clone();
    for px in inverted.pixels_mut().chunks_exact_mut(BYTES_PER_PIXEL) {
        px[0] = 255 - px[0];
        px[1] = 255 - px[1];
        px[2] = 255 - px[2];
    }
    inverted
}

/// Frame holding `payload` as a QR symbol centered on a white background.
///
/// The symbol is drawn at the largest whole-pixel module size that fits the
/// frame together with a four-module quiet zone.
///
/// # Panics
///
/// Panics when the payload cannot be encoded or the frame is too small to
/// hold the symbol at one pixel per module.
#[must_use]
pub fn qr_frame(payload: &str, width: u32, height: u32) -> Frame {
    let code = QrCode::new(payload.as_bytes()).expect("payload must be encodable");
    let modules = code.width();
    let colors = code.to_colors();

    let total = modules as u32 + 2 * QUIET_MODULES;
    let scale = width.min(height) / total;
    assert!(
        scale >= 1,
        "{width}x{height} frame cannot hold {total} modules"
    );

    let symbol_px = modules as u32 * scale;
    let x0 = (width - symbol_px) / 2;
    let y0 = (height - symbol_px) / 2;

    let mut frame = solid_frame(width, height, 255);
    for (index, color) in colors.iter().enumerate() {
        if *color == Color::Dark {
            let mx = (index % modules) as u32;
            let my = (index / modules) as u32;
            for dy in 0..scale {
                for dx in 0..scale {
                    set_gray(&mut frame, x0 + mx * scale + dx, y0 + my * scale + dy, 0);
                }
            }
        }
    }

    frame
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noise_frame_is_deterministic_per_seed() {
        assert_eq!(noise_frame(16, 16, 7), noise_frame(16, 16, 7));
        assert_ne!(noise_frame(16, 16, 7), noise_frame(16, 16, 8));
    }

    #[test]
    fn qr_frame_centers_symbol_on_white() {
        let frame = qr_frame("HELLO", 100, 100);
        assert_eq!(frame.width(), 100);

        // corners stay inside the quiet zone
        for (x, y) in [(0, 0), (99, 0), (0, 99), (99, 99)] {
            assert_eq!(frame.pixels()[frame.offset(x, y)], 255);
        }

        let dark = frame
            .pixels()
            .chunks_exact(BYTES_PER_PIXEL)
            .filter(|px| px[0] == 0)
            .count();
        assert!(dark > 0, "symbol should paint dark modules");
    }

    #[test]
    fn invert_frame_flips_colors_not_alpha() {
        let mut frame = solid_frame(2, 2, 10);
        set_gray(&mut frame, 0, 0, 200);

        let inverted = invert_frame(&frame);
        assert_eq!(inverted.pixels()[inverted.offset(0, 0)], 55);
        assert_eq!(inverted.pixels()[inverted.offset(1, 1)], 245);
        assert_eq!(inverted.pixels()[3], 255);
    }
}
