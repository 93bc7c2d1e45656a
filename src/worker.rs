//! A single background thread that runs at most one trace request at a time.
//!
//! The engine itself is pure; this is the integration a caller with a latency-sensitive
//! foreground thread uses. Results are tagged with the id returned by
//! [`TraceWorker::submit`] so a caller can drop results it no longer wants.

use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread;

use thiserror::Error;

use crate::SketchResult;

/// Identifier handed out for each accepted request.
pub type RequestId = u64;

type Job<T> = Box<dyn FnOnce() -> SketchResult<T> + Send + 'static>;

/// Why a request was not accepted.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SubmitError {
    /// Another request has not delivered its result yet.
    #[error("trace request {in_flight} is still running")]
    Busy { in_flight: RequestId },
    /// The worker thread is gone.
    #[error("trace worker has shut down")]
    Disconnected,
}

/// Owns the job channel and the single in-flight slot.
///
/// Dropping the worker returns immediately. The thread is detached: it finishes the request it
/// is running, if any, discards the result, and exits.
pub struct TraceWorker<T: Send + 'static> {
    jobs: Sender<(RequestId, Job<T>)>,
    results: Receiver<(RequestId, SketchResult<T>)>,
    in_flight: Option<RequestId>,
    next_id: RequestId,
}

impl<T: Send + 'static> TraceWorker<T> {
    /// Spawn the worker thread.
    pub fn spawn() -> Self {
        let (job_tx, job_rx) = mpsc::channel::<(RequestId, Job<T>)>();
        let (result_tx, result_rx) = mpsc::channel();
        thread::spawn(move || {
            while let Ok((id, job)) = job_rx.recv() {
                tracing::debug!(request = id, "trace request started");
                let result = job();
                if result_tx.send((id, result)).is_err() {
                    break;
                }
            }
        });
        Self {
            jobs: job_tx,
            results: result_rx,
            in_flight: None,
            next_id: 1,
        }
    }

    /// Whether a request is running or its result has not been collected.
    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Start `job` unless another request is still in flight.
    pub fn submit<F>(&mut self, job: F) -> Result<RequestId, SubmitError>
    where
        F: FnOnce() -> SketchResult<T> + Send + 'static,
    {
        if let Some(in_flight) = self.in_flight {
            tracing::warn!(in_flight, "rejected trace request while another is running");
            return Err(SubmitError::Busy { in_flight });
        }
        let id = self.next_id;
        self.jobs
            .send((id, Box::new(job)))
            .map_err(|_| SubmitError::Disconnected)?;
        self.next_id += 1;
        self.in_flight = Some(id);
        Ok(id)
    }

    /// Collect the finished result, if any, without blocking.
    pub fn try_recv(&mut self) -> Option<(RequestId, SketchResult<T>)> {
        match self.results.try_recv() {
            Ok(done) => Some(self.finish(done)),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                self.in_flight = None;
                None
            }
        }
    }

    /// Block until the in-flight request finishes. Returns `None` when nothing is running.
    pub fn recv(&mut self) -> Option<(RequestId, SketchResult<T>)> {
        self.in_flight?;
        match self.results.recv() {
            Ok(done) => Some(self.finish(done)),
            Err(_) => {
                self.in_flight = None;
                None
            }
        }
    }

    fn finish(&mut self, done: (RequestId, SketchResult<T>)) -> (RequestId, SketchResult<T>) {
        if self.in_flight == Some(done.0) {
            self.in_flight = None;
        }
        done
    }
}
