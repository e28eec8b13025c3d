//! Scan worker - runs in a dedicated thread

use std::panic::{self, AssertUnwindSafe};
use std::time::{Duration, Instant};

use flume::{Receiver, Sender};
use log::{debug, warn};

use crate::decode::Decoder;
use crate::frame::FrameData;

use super::pipeline::scan_frame;
use super::request::{RequestId, ScanFault, ScanOptions, ScanRequest, ScanResponse};
use super::session::{Admission, ScanSession};

/// Main worker loop. Owns the decode engine and session state for one
/// scanner and runs until the request channel disconnects.
///
/// Scans are admitted through the session throttle; throttled frames are
/// dropped without a response. Every admitted scan produces exactly one
/// response, and any failure inside it, decode faults and panics included,
/// is contained to that response.
#[expect(
    clippy::needless_pass_by_value,
    reason = "values are moved into the worker thread, which needs ownership"
)]
pub fn scan_worker(
    decoder: Box<dyn Decoder>,
    requests: Receiver<ScanRequest>,
    responses: Sender<ScanResponse>,
) {
    let mut session = ScanSession::new();

    for request in requests {
        match request {
            ScanRequest::Init { id } => {
                session.init();
                debug!("scan session armed");
                let _ = responses.send(ScanResponse::Ready { id, cleanup: false });
            }

            ScanRequest::Scan { id, frame, options } => match session.admit(Instant::now()) {
                Admission::NotReady => {
                    let _ = responses.send(ScanResponse::Error {
                        id,
                        fault: ScanFault::NotInitialized,
                        elapsed: Duration::ZERO,
                    });
                }
                Admission::Throttled => {
                    debug!("scan dropped by throttle");
                }
                Admission::Accepted => {
                    let response = run_scan(decoder.as_ref(), &mut session, id, frame, options);
                    let _ = responses.send(response);
                }
            },

            ScanRequest::Destroy { id } => {
                session.destroy();
                debug!("scan session disarmed");
                let _ = responses.send(ScanResponse::Ready { id, cleanup: true });
            }
        }
    }

    debug!("scan worker shutting down");
}

/// Run one admitted scan to completion, containing any failure to this
/// request's response.
fn run_scan(
    decoder: &dyn Decoder,
    session: &mut ScanSession,
    id: Option<RequestId>,
    frame: FrameData,
    options: ScanOptions,
) -> ScanResponse {
    let started = Instant::now();

    let frame = match frame.into_frame() {
        Ok(frame) => frame,
        Err(err) => {
            warn!("rejected scan frame: {err}");
            return ScanResponse::Error {
                id,
                fault: ScanFault::Frame(err),
                elapsed: started.elapsed(),
            };
        }
    };

    let attempt = panic::catch_unwind(AssertUnwindSafe(|| scan_frame(decoder, &frame, &options)));

    match attempt {
        Ok(Ok(outcome)) => {
            session.record_scan(outcome.elapsed);
            ScanResponse::Result {
                id,
                outcome: outcome.decoded,
                elapsed: outcome.elapsed,
            }
        }
        Ok(Err(fault)) => {
            let elapsed = started.elapsed();
            warn!("scan failed after {:.1}ms: {fault}", elapsed.as_secs_f64() * 1000.0);
            session.record_scan(elapsed);
            ScanResponse::Error { id, fault, elapsed }
        }
        Err(payload) => {
            let elapsed = started.elapsed();
            let fault = ScanFault::Panicked {
                detail: panic_detail(payload.as_ref()),
            };
            warn!("scan panicked after {:.1}ms: {fault}", elapsed.as_secs_f64() * 1000.0);
            session.record_scan(elapsed);
            ScanResponse::Error { id, fault, elapsed }
        }
    }
}

fn panic_detail(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
