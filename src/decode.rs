//! Decode engine abstraction and the rqrr-backed implementation

use serde::Serialize;

use crate::frame::{Frame, Point};
use crate::preprocess::luma_plane;

/// How aggressively polarity-reversed codes are tried.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum InversionStrategy {
    /// Normal polarity only
    #[default]
    DontInvert,
    /// Reversed polarity only
    OnlyInvert,
    /// Normal first, then reversed
    AttemptBoth,
    /// Reversed first, then normal
    InvertFirst,
}

/// Detector tuning hints forwarded to the decode engine.
///
/// Engines that cannot honor a hint ignore it; hints never change what a
/// decode means, only how hard the detector looks.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LocateHints {
    /// Keep the previous detector state until a code is found
    pub skip_until_found: bool,
    /// Assume the code is not perspective-distorted
    pub assume_square: bool,
    /// Restrict detection to the image center
    pub center_roi: bool,
    /// Reject finder patterns with higher module-size deviation
    pub max_finder_pattern_std_dev: Option<f32>,
}

/// Per-attempt decode parameters.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DecodeOptions {
    pub inversion: InversionStrategy,
    pub hints: LocateHints,
}

/// Corner and pattern geometry of a decoded symbol, in pixel space of the
/// buffer that was decoded.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct SymbolLocation {
    pub top_left: Point,
    pub top_right: Point,
    pub bottom_left: Point,
    pub bottom_right: Point,
    pub top_left_finder: Point,
    pub top_right_finder: Point,
    pub bottom_left_finder: Point,
    /// Present on symbols large enough to carry an alignment pattern
    pub bottom_right_alignment: Option<Point>,
}

impl SymbolLocation {
    /// Location shifted by a pixel offset.
    #[must_use]
    pub fn offset_by(self, dx: f32, dy: f32) -> Self {
        Self {
            top_left: self.top_left.offset_by(dx, dy),
            top_right: self.top_right.offset_by(dx, dy),
            bottom_left: self.bottom_left.offset_by(dx, dy),
            bottom_right: self.bottom_right.offset_by(dx, dy),
            top_left_finder: self.top_left_finder.offset_by(dx, dy),
            top_right_finder: self.top_right_finder.offset_by(dx, dy),
            bottom_left_finder: self.bottom_left_finder.offset_by(dx, dy),
            bottom_right_alignment: self.bottom_right_alignment.map(|p| p.offset_by(dx, dy)),
        }
    }
}

/// A successfully decoded symbol.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Decoded {
    /// Payload as text
    pub text: String,
    /// Raw payload bytes before text conversion
    pub bytes: Vec<u8>,
    /// Geometry in the decoded buffer's pixel space
    pub location: SymbolLocation,
}

/// Failure inside a decode engine.
///
/// Distinct from "no code in this frame", which is a successful `None`.
#[derive(Debug, thiserror::Error)]
#[error("{detail}")]
pub struct DecodeError {
    detail: String,
}

impl DecodeError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self {
            detail: msg.into(),
        }
    }
}

/// A symbol decode engine.
pub trait Decoder: Send {
    /// Search one frame for a code.
    ///
    /// `Ok(None)` means the frame held no readable code; `Err` means the
    /// engine itself failed. The scan pipeline treats the engine as opaque
    /// and only sequences which buffers it sees.
    fn decode(
        &self,
        frame: &Frame,
        options: &DecodeOptions,
    ) -> Result<Option<Decoded>, DecodeError>;
}

/// QR decode engine backed by the `rqrr` crate.
///
/// rqrr runs its own adaptive binarization over a grayscale plane, so each
/// attempt converts the RGBA frame to luma first. Inversion strategies are
/// realized by handing rqrr the normal and/or bit-flipped plane in the order
/// the strategy dictates. Locate hints have no rqrr equivalent and are
/// accepted but ignored.
#[derive(Clone, Copy, Debug, Default)]
pub struct RqrrDecoder;

impl Decoder for RqrrDecoder {
    fn decode(
        &self,
        frame: &Frame,
        options: &DecodeOptions,
    ) -> Result<Option<Decoded>, DecodeError> {
        let width = frame.width() as usize;
        let height = frame.height() as usize;
        if width == 0 || height == 0 {
            return Ok(None);
        }

        let luma = luma_plane(frame);
        let passes: &[bool] = match options.inversion {
            InversionStrategy::DontInvert => &[false],
            InversionStrategy::OnlyInvert => &[true],
            InversionStrategy::AttemptBoth => &[false, true],
            InversionStrategy::InvertFirst => &[true, false],
        };

        for &inverted in passes {
            let decoded = if inverted {
                let flipped: Vec<u8> = luma.iter().map(|&v| 255 - v).collect();
                decode_plane(&flipped, width, height)
            } else {
                decode_plane(&luma, width, height)
            };
            if decoded.is_some() {
                return Ok(decoded);
            }
        }

        Ok(None)
    }
}

/// Run rqrr over one luma plane and decode the first readable grid.
fn decode_plane(luma: &[u8], width: usize, height: usize) -> Option<Decoded> {
    let mut prepared =
        rqrr::PreparedImage::prepare_from_greyscale(width, height, |x, y| luma[y * width + x]);

    for grid in prepared.detect_grids() {
        let mut bytes = Vec::new();
        let meta = match grid.decode_to(&mut bytes) {
            Ok(meta) => meta,
            Err(err) => {
                log::debug!("grid rejected: {err}");
                continue;
            }
        };

        let text = String::from_utf8_lossy(&bytes).into_owned();
        let location = locate_symbol(&grid.bounds, meta.version.0);
        return Some(Decoded {
            text,
            bytes,
            location,
        });
    }

    None
}

/// Estimate finder and alignment pattern centers from the symbol's corner
/// geometry.
///
/// rqrr reports the four outer corners clockwise from the top left. Pattern
/// centers sit at fixed module offsets, so they interpolate bilinearly
/// across the corner quad: finder centers 3.5 modules in from their corner,
/// the alignment center 6.5 modules in from the bottom right. Version 1
/// symbols carry no alignment pattern.
fn locate_symbol(bounds: &[rqrr::Point; 4], version: usize) -> SymbolLocation {
    let top_left = corner_point(bounds[0]);
    let top_right = corner_point(bounds[1]);
    let bottom_right = corner_point(bounds[2]);
    let bottom_left = corner_point(bounds[3]);

    let modules = (version * 4 + 17) as f32;
    let near = 3.5 / modules;
    let far = (modules - 3.5) / modules;

    let within = |u: f32, v: f32| -> Point {
        let top = lerp(top_left, top_right, u);
        let bottom = lerp(bottom_left, bottom_right, u);
        lerp(top, bottom, v)
    };

    SymbolLocation {
        top_left,
        top_right,
        bottom_left,
        bottom_right,
        top_left_finder: within(near, near),
        top_right_finder: within(far, near),
        bottom_left_finder: within(near, far),
        bottom_right_alignment: (version >= 2).then(|| {
            let align = (modules - 6.5) / modules;
            within(align, align)
        }),
    }
}

fn lerp(a: Point, b: Point, t: f32) -> Point {
    Point::new(a.x + (b.x - a.x) * t, a.y + (b.y - a.y) * t)
}

fn corner_point(p: rqrr::Point) -> Point {
    Point::new(p.x as f32, p.y as f32)
}
