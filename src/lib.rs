//! QR frame scanning: preprocessing fallbacks, a pluggable decode engine
//! and a throttled worker-thread service.

pub mod decode;
pub mod frame;
pub mod preprocess;
pub mod scan;

#[cfg(feature = "test-utils")]
pub mod test_utils;

// Re-export the scanning surface
pub use decode::{
    DecodeError, DecodeOptions, Decoded, Decoder, InversionStrategy, LocateHints, RqrrDecoder,
    SymbolLocation,
};
pub use frame::{Frame, FrameData, FrameError, Point, Roi};
pub use scan::{
    RequestId, ScanFault, ScanOptions, ScanOutcome, ScanRequest, ScanResponse, ScanService,
    ServiceError, scan_frame,
};
