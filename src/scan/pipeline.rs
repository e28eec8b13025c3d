//! Fallback decode orchestration

use std::time::{Duration, Instant};

use log::debug;

use crate::decode::{DecodeOptions, Decoded, Decoder, InversionStrategy};
use crate::frame::Frame;
use crate::preprocess::{center_roi, denoise, enhance_contrast, extract_roi, remap_coordinates};

use super::request::{ScanFault, ScanOptions};
use super::{ROI_MIN_HEIGHT, ROI_MIN_WIDTH};

/// Terminal state of one scan: what was found, if anything, and how long
/// the attempt chain ran.
#[derive(Clone, Debug, PartialEq)]
pub struct ScanOutcome {
    /// `None` when no stage found a code. An expected result, not a failure.
    pub decoded: Option<Decoded>,
    pub elapsed: Duration,
}

/// Run one frame through the decode fallback chain.
///
/// Stages run in a fixed order, stopping at the first hit:
///
/// 1. the frame exactly as captured
/// 2. contrast-enhanced
/// 3. contrast-enhanced, then box-blurred
/// 4. the centered 80% crop of the raw frame, only when both dimensions
///    exceed the retry threshold; hits are remapped to full-frame space
///
/// Stage 1 decodes with the caller's inversion strategy, defaulting to
/// `DontInvert`. Later stages default to `AttemptBoth`; an explicitly set
/// strategy applies to every stage unchanged.
pub fn scan_frame(
    decoder: &dyn Decoder,
    frame: &Frame,
    options: &ScanOptions,
) -> Result<ScanOutcome, ScanFault> {
    let started = Instant::now();

    let first_pass = DecodeOptions {
        inversion: options.inversion.unwrap_or(InversionStrategy::DontInvert),
        hints: options.hints,
    };
    let retry_pass = DecodeOptions {
        inversion: options.inversion.unwrap_or(InversionStrategy::AttemptBoth),
        hints: options.hints,
    };

    if let Some(decoded) = decoder.decode(frame, &first_pass)? {
        debug!("decoded on the raw frame");
        return Ok(finish(Some(decoded), started));
    }

    let enhanced = enhance_contrast(frame);
    if let Some(decoded) = decoder.decode(&enhanced, &retry_pass)? {
        debug!("decoded after contrast enhancement");
        return Ok(finish(Some(decoded), started));
    }

    let denoised = denoise(&enhanced);
    if let Some(decoded) = decoder.decode(&denoised, &retry_pass)? {
        debug!("decoded after denoise");
        return Ok(finish(Some(decoded), started));
    }

    if frame.width() > ROI_MIN_WIDTH && frame.height() > ROI_MIN_HEIGHT {
        let roi = center_roi(frame.width(), frame.height());
        let cropped = extract_roi(frame, roi)?;
        if let Some(decoded) = decoder.decode(&cropped, &retry_pass)? {
            debug!("decoded on the {}x{} center crop", roi.width, roi.height);
            return Ok(finish(Some(remap_coordinates(decoded, roi)), started));
        }
    }

    Ok(finish(None, started))
}

fn finish(decoded: Option<Decoded>, started: Instant) -> ScanOutcome {
    ScanOutcome {
        decoded,
        elapsed: started.elapsed(),
    }
}
