//! Scan worker infrastructure
//!
//! A host hands frames to a dedicated worker thread over channels and picks
//! up decode results asynchronously. The worker admits at most one scan per
//! throttle interval, processes requests to completion in arrival order and
//! contains every per-scan failure to that scan's response.

mod pipeline;
mod request;
mod service;
mod session;
mod worker;

pub use pipeline::{ScanOutcome, scan_frame};
pub use request::{RequestId, ScanFault, ScanOptions, ScanRequest, ScanResponse};
pub use service::{ScanService, ServiceError};
pub use session::{Admission, ScanSession, SessionState};
pub use worker::scan_worker;

use std::time::Duration;

/// Minimum interval between accepted scans, measured start to start.
pub const MIN_SCAN_INTERVAL: Duration = Duration::from_millis(100);

/// Frames strictly wider and taller than this get a fourth, center-cropped
/// decode attempt.
pub const ROI_MIN_WIDTH: u32 = 640;
pub const ROI_MIN_HEIGHT: u32 = 480;

/// Running-average timing is logged once per this many recorded scans.
pub const STATS_LOG_EVERY: u64 = 30;
