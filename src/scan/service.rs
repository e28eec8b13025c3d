//! Scan service - host-side handle to a worker thread

use flume::{Receiver, Sender};
use log::debug;

use crate::decode::{Decoder, RqrrDecoder};
use crate::frame::FrameData;

use super::request::{RequestId, ScanOptions, ScanRequest, ScanResponse};
use super::worker::scan_worker;

/// Errors from the host side of the scan channel.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("scan worker is gone and can no longer accept requests")]
    WorkerGone,
}

/// Owns one scan worker thread and assigns correlation ids to requests.
///
/// Requests are fire-and-forget; responses arrive on a separate channel and
/// can be drained with [`ScanService::poll_responses`] or awaited through
/// [`ScanService::response_receiver`]. Dropping the service disconnects the
/// request channel, which ends the worker loop; responses already in flight
/// stay readable afterwards.
pub struct ScanService {
    request_tx: Sender<ScanRequest>,
    response_rx: Receiver<ScanResponse>,
    next_request_id: u64,
}

impl ScanService {
    /// Spawn a scanner backed by the rqrr engine.
    #[must_use]
    pub fn new() -> Self {
        Self::with_decoder(Box::new(RqrrDecoder))
    }

    /// Spawn a scanner with a custom decode engine.
    #[must_use]
    pub fn with_decoder(decoder: Box<dyn Decoder>) -> Self {
        // flume channels are unbounded so the host never blocks on a slow
        // scan; the throttle keeps the queue from growing without limit
        let (request_tx, request_rx) = flume::unbounded();
        let (response_tx, response_rx) = flume::unbounded();

        std::thread::spawn(move || {
            scan_worker(decoder, request_rx, response_tx);
        });
        debug!("scan worker spawned");

        Self {
            request_tx,
            response_rx,
            next_request_id: 1,
        }
    }

    /// Arm the worker. Answered with a `Ready` response.
    pub fn init(&mut self) -> Result<RequestId, ServiceError> {
        let id = self.next_id();
        self.send(ScanRequest::Init { id: Some(id) })?;
        Ok(id)
    }

    /// Submit one frame for scanning.
    ///
    /// The returned id correlates the eventual response. A frame arriving
    /// inside the worker's throttle window produces no response at all, so
    /// hosts must not block indefinitely on a specific id.
    pub fn scan(
        &mut self,
        frame: impl Into<FrameData>,
        options: ScanOptions,
    ) -> Result<RequestId, ServiceError> {
        let id = self.next_id();
        self.send(ScanRequest::Scan {
            id: Some(id),
            frame: frame.into(),
            options,
        })?;
        Ok(id)
    }

    /// Disarm the worker. Answered with a `Ready` response carrying the
    /// cleanup flag.
    pub fn destroy(&mut self) -> Result<RequestId, ServiceError> {
        let id = self.next_id();
        self.send(ScanRequest::Destroy { id: Some(id) })?;
        Ok(id)
    }

    /// Drain every response that has arrived so far, without blocking.
    pub fn poll_responses(&mut self) -> Vec<ScanResponse> {
        let mut responses = vec![];
        while let Ok(response) = self.response_rx.try_recv() {
            responses.push(response);
        }
        responses
    }

    /// The response channel, for hosts that want blocking or timed waits.
    #[must_use]
    pub fn response_receiver(&self) -> &Receiver<ScanResponse> {
        &self.response_rx
    }

    fn send(&self, request: ScanRequest) -> Result<(), ServiceError> {
        self.request_tx
            .send(request)
            .map_err(|_| ServiceError::WorkerGone)
    }

    fn next_id(&mut self) -> RequestId {
        let id = RequestId::new(self.next_request_id);
        self.next_request_id += 1;
        id
    }
}

impl Default for ScanService {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_ids_are_sequential_and_unique() {
        let mut service = ScanService::new();
        let first = service.init().unwrap();
        let second = service.destroy().unwrap();
        assert_ne!(first, second);
        assert_eq!(first, RequestId::new(1));
        assert_eq!(second, RequestId::new(2));
    }
}
