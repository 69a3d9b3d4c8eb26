use std::time::Instant;

use metrics::{counter, gauge};
use thiserror::Error;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{info, warn};

use crate::domain::request::RenderRequest;

const SOURCE: &str = "application::jobs::queue";

pub(crate) const METRIC_JOBS_ENQUEUED: &str = "texttool_jobs_enqueued_total";
pub(crate) const METRIC_JOBS_REJECTED: &str = "texttool_jobs_rejected_total";
pub(crate) const METRIC_QUEUE_LEN: &str = "texttool_queue_len";

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum QueueError {
    #[error("task queue is full ({capacity} tasks pending)")]
    Full { capacity: usize },
    #[error("task queue is no longer accepting tasks")]
    Closed,
}

/// A request waiting for the worker.
#[derive(Debug)]
pub struct QueueEntry {
    pub request: RenderRequest,
    pub enqueued_at: Instant,
}

/// Submission handle of the bounded FIFO drained by the single worker.
#[derive(Debug, Clone)]
pub struct TaskQueue {
    sender: mpsc::Sender<QueueEntry>,
}

impl TaskQueue {
    /// Create the queue and the receiving end the worker owns. Capacity is at least one.
    pub fn bounded(capacity: usize) -> (Self, mpsc::Receiver<QueueEntry>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self { sender }, receiver)
    }

    /// Enqueue without waiting. A full queue rejects the request and is left untouched.
    ///
    /// Returns the number of pending tasks including this one, counted from
    /// the tasks that were ahead of it at submission.
    pub fn try_enqueue(&self, request: RenderRequest) -> Result<usize, QueueError> {
        let ahead = self.len();
        let job_id = request.job_id;
        let requester = request.requester.clone();
        let entry = QueueEntry {
            request,
            enqueued_at: Instant::now(),
        };

        match self.sender.try_send(entry) {
            Ok(()) => {
                let pending = ahead + 1;
                counter!(METRIC_JOBS_ENQUEUED).increment(1);
                gauge!(METRIC_QUEUE_LEN).set(pending as f64);
                info!(
                    target = SOURCE,
                    op = "enqueue",
                    result = "queued",
                    job_id = %job_id,
                    requester = %requester,
                    pending,
                    capacity = self.capacity(),
                    "Task queued"
                );
                Ok(pending)
            }
            Err(TrySendError::Full(_)) => {
                counter!(METRIC_JOBS_REJECTED).increment(1);
                warn!(
                    target = SOURCE,
                    op = "enqueue",
                    result = "full",
                    job_id = %job_id,
                    requester = %requester,
                    capacity = self.capacity(),
                    "Task rejected: queue is full"
                );
                Err(QueueError::Full {
                    capacity: self.capacity(),
                })
            }
            Err(TrySendError::Closed(_)) => Err(QueueError::Closed),
        }
    }

    /// Tasks waiting to be picked up; the one currently running is not counted.
    pub fn len(&self) -> usize {
        self.sender.max_capacity() - self.sender.capacity()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.sender.max_capacity()
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}
