//! Pixel buffer and geometry types shared across the scan pipeline

use serde::Serialize;

/// RGBA, one byte per channel.
pub const BYTES_PER_PIXEL: usize = 4;

/// Errors constructing or slicing pixel buffers.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("pixel buffer is {actual} bytes, expected {expected} for {width}x{height} RGBA")]
    DimensionMismatch {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },

    #[error("region {roi:?} exceeds the {width}x{height} frame")]
    RoiOutOfBounds { roi: Roi, width: u32, height: u32 },
}

/// An RGBA frame captured from a camera, canvas or image file.
///
/// Pixels are row-major, four bytes per pixel. The byte length is checked
/// against the declared dimensions at construction, so a `Frame` that exists
/// is always internally consistent.
#[derive(Clone, PartialEq, Eq)]
pub struct Frame {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Frame {
    /// Build a frame from raw RGBA bytes, rejecting buffers whose length
    /// does not match the dimensions.
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self, FrameError> {
        let expected = width as usize * height as usize * BYTES_PER_PIXEL;
        if pixels.len() != expected {
            return Err(FrameError::DimensionMismatch {
                width,
                height,
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Frame filled with a single RGBA color.
    #[must_use]
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let count = width as usize * height as usize;
        let mut pixels = Vec::with_capacity(count * BYTES_PER_PIXEL);
        for _ in 0..count {
            pixels.extend_from_slice(&rgba);
        }
        Self {
            width,
            height,
            pixels,
        }
    }

    /// Internal constructor for buffers whose length is correct by
    /// construction.
    pub(crate) fn from_raw(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        debug_assert_eq!(
            pixels.len(),
            width as usize * height as usize * BYTES_PER_PIXEL,
            "buffer length must match {width}x{height}"
        );
        Self {
            width,
            height,
            pixels,
        }
    }

    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    #[must_use]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    #[must_use]
    pub fn pixels_mut(&mut self) -> &mut [u8] {
        &mut self.pixels
    }

    /// Byte offset of the pixel at (x, y).
    #[must_use]
    #[inline]
    pub fn offset(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * BYTES_PER_PIXEL
    }
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.pixels.len())
            .finish()
    }
}

/// Unvalidated frame fields as they travel to the scan worker.
///
/// The worker turns this back into a [`Frame`] with [`FrameData::into_frame`]
/// and answers with an error response when the buffer does not match the
/// declared dimensions. Hosts holding an already validated [`Frame`] convert
/// losslessly via `From`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameData {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl FrameData {
    /// Validate the buffer length against the dimensions.
    pub fn into_frame(self) -> Result<Frame, FrameError> {
        Frame::new(self.width, self.height, self.pixels)
    }
}

impl From<Frame> for FrameData {
    fn from(frame: Frame) -> Self {
        Self {
            width: frame.width,
            height: frame.height,
            pixels: frame.pixels,
        }
    }
}

/// A sub-rectangle of a frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Roi {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Roi {
    #[must_use]
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Whether the region lies fully inside a `width` x `height` frame.
    #[must_use]
    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        // u64 sums so x + width cannot wrap
        u64::from(self.x) + u64::from(self.width) <= u64::from(width)
            && u64::from(self.y) + u64::from(self.height) <= u64::from(height)
    }
}

/// A position in pixel space.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Point shifted by an (x, y) pixel offset.
    #[must_use]
    pub fn offset_by(self, dx: f32, dy: f32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_accepts_matching_buffer() {
        let frame = Frame::new(2, 3, vec![0; 24]).unwrap();
        assert_eq!(frame.width(), 2);
        assert_eq!(frame.height(), 3);
        assert_eq!(frame.pixels().len(), 24);
    }

    #[test]
    fn new_rejects_short_and_long_buffers() {
        for len in [0, 23, 25] {
            let err = Frame::new(2, 3, vec![0; len]).unwrap_err();
            let msg = err.to_string();
            assert!(msg.contains("expected 24"), "unexpected message: {msg}");
            assert!(msg.contains(&len.to_string()), "unexpected message: {msg}");
        }
    }

    #[test]
    fn filled_sets_every_pixel() {
        let frame = Frame::filled(2, 2, [1, 2, 3, 4]);
        for px in frame.pixels().chunks_exact(BYTES_PER_PIXEL) {
            assert_eq!(px, [1, 2, 3, 4]);
        }
    }

    #[test]
    fn offset_indexes_row_major() {
        let frame = Frame::filled(4, 3, [0; 4]);
        assert_eq!(frame.offset(0, 0), 0);
        assert_eq!(frame.offset(2, 1), (4 + 2) * BYTES_PER_PIXEL);
        assert_eq!(frame.offset(3, 2), (2 * 4 + 3) * BYTES_PER_PIXEL);
    }

    #[test]
    fn frame_data_round_trips() {
        let frame = Frame::filled(3, 2, [9, 8, 7, 6]);
        let data = FrameData::from(frame.clone());
        assert_eq!(data.into_frame().unwrap(), frame);
    }

    #[test]
    fn frame_data_validates_on_entry() {
        let data = FrameData {
            width: 100,
            height: 100,
            pixels: vec![0; 17],
        };
        assert!(matches!(
            data.into_frame(),
            Err(FrameError::DimensionMismatch {
                expected: 40_000,
                actual: 17,
                ..
            })
        ));
    }

    #[test]
    fn roi_fits_within_handles_edges_and_overflow() {
        let roi = Roi::new(0, 0, 10, 10);
        assert!(roi.fits_within(10, 10));
        assert!(!Roi::new(1, 0, 10, 10).fits_within(10, 10));
        assert!(!Roi::new(0, 5, 5, 6).fits_within(10, 10));
        // would wrap in u32 arithmetic
        assert!(!Roi::new(u32::MAX, 0, u32::MAX, 1).fits_within(10, 10));
    }

    #[test]
    fn point_offset_translates_both_axes() {
        let moved = Point::new(1.5, -2.0).offset_by(10.0, 20.0);
        assert_eq!(moved, Point::new(11.5, 18.0));
    }
}
