//! Scan request and response types

use std::time::Duration;

use crate::decode::{DecodeError, Decoded, InversionStrategy, LocateHints};
use crate::frame::{FrameData, FrameError};

/// Unique identifier correlating a request with its response.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RequestId(pub u64);

impl RequestId {
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }
}

/// Caller-supplied scan parameters.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ScanOptions {
    /// Explicit inversion strategy for every attempt. Left unset, the
    /// pipeline starts at `DontInvert` and escalates retry stages to
    /// `AttemptBoth`.
    pub inversion: Option<InversionStrategy>,
    /// Detector hints forwarded to the decode engine
    pub hints: LocateHints,
}

/// Request sent to the scan worker.
#[derive(Debug)]
pub enum ScanRequest {
    /// Arm the worker and reset its counters
    Init { id: Option<RequestId> },

    /// Decode one frame
    Scan {
        id: Option<RequestId>,
        frame: FrameData,
        options: ScanOptions,
    },

    /// Disarm the worker and reset its counters
    Destroy { id: Option<RequestId> },
}

impl ScanRequest {
    /// Correlation id supplied by the host, if any.
    #[must_use]
    pub fn id(&self) -> Option<RequestId> {
        match self {
            Self::Init { id } | Self::Destroy { id } | Self::Scan { id, .. } => *id,
        }
    }
}

/// Errors surfaced in a scan error response.
#[derive(Debug, thiserror::Error)]
pub enum ScanFault {
    #[error("scan before init; send an init request first")]
    NotInitialized,

    #[error(transparent)]
    Frame(#[from] FrameError),

    #[error("decode engine: {0}")]
    Decode(#[from] DecodeError),

    #[error("decode engine panicked: {detail}")]
    Panicked { detail: String },
}

/// Response from the scan worker.
///
/// Every variant echoes the request's correlation id unchanged. Throttled
/// scans produce no response at all.
#[derive(Debug)]
pub enum ScanResponse {
    /// Worker is armed; `cleanup` marks the acknowledgement of a destroy
    Ready { id: Option<RequestId>, cleanup: bool },

    /// Scan finished; `outcome` is `None` when no code was found
    Result {
        id: Option<RequestId>,
        outcome: Option<Decoded>,
        elapsed: Duration,
    },

    /// Scan failed
    Error {
        id: Option<RequestId>,
        fault: ScanFault,
        elapsed: Duration,
    },
}

impl ScanResponse {
    /// Correlation id echoed from the originating request, if any.
    #[must_use]
    pub fn id(&self) -> Option<RequestId> {
        match self {
            Self::Ready { id, .. } | Self::Result { id, .. } | Self::Error { id, .. } => *id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requests_expose_their_correlation_id() {
        let id = Some(RequestId::new(7));
        assert_eq!(ScanRequest::Init { id }.id(), id);
        assert_eq!(ScanRequest::Destroy { id: None }.id(), None);

        let scan = ScanRequest::Scan {
            id,
            frame: FrameData {
                width: 1,
                height: 1,
                pixels: vec![0; 4],
            },
            options: ScanOptions::default(),
        };
        assert_eq!(scan.id(), id);
    }

    #[test]
    fn responses_expose_their_correlation_id() {
        let id = Some(RequestId::new(3));
        let ready = ScanResponse::Ready { id, cleanup: true };
        assert_eq!(ready.id(), id);

        let result = ScanResponse::Result {
            id,
            outcome: None,
            elapsed: Duration::from_millis(5),
        };
        assert_eq!(result.id(), id);

        let error = ScanResponse::Error {
            id: None,
            fault: ScanFault::NotInitialized,
            elapsed: Duration::ZERO,
        };
        assert_eq!(error.id(), None);
    }

    #[test]
    fn fault_messages_are_self_describing() {
        let fault = ScanFault::NotInitialized;
        assert!(fault.to_string().contains("init"));

        let panicked = ScanFault::Panicked {
            detail: "boom".to_string(),
        };
        assert!(panicked.to_string().contains("boom"));
    }
}
