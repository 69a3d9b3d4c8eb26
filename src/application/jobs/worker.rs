//! The single long-lived consumer of the task queue.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use metrics::{counter, gauge};
use tokio::sync::{Notify, mpsc};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use super::context::JobContext;
use super::process::process_job;
use super::queue::{METRIC_QUEUE_LEN, QueueEntry, TaskQueue};

const SOURCE: &str = "application::jobs::worker";

const METRIC_JOBS_COMPLETED: &str = "texttool_jobs_completed_total";
const METRIC_JOBS_FAILED: &str = "texttool_jobs_failed_total";
const METRIC_WORKER_PANICS: &str = "texttool_worker_panics_total";

/// Owns the queue and the worker task draining it.
pub struct TaskService {
    queue: TaskQueue,
    drain: Arc<Notify>,
    handle: JoinHandle<()>,
}

impl TaskService {
    /// Spawn the worker. Must be called within a tokio runtime.
    pub fn start(ctx: JobContext, capacity: usize, backoff: Duration) -> Self {
        let (queue, receiver) = TaskQueue::bounded(capacity);
        let drain = Arc::new(Notify::new());
        let handle = tokio::spawn(run_worker(
            ctx,
            queue.clone(),
            receiver,
            drain.clone(),
            backoff,
        ));

        info!(
            target = SOURCE,
            op = "start",
            capacity = queue.capacity(),
            backoff_ms = backoff.as_millis() as u64,
            "Task worker started"
        );

        Self {
            queue,
            drain,
            handle,
        }
    }

    /// Submission handle for the queue.
    pub fn queue(&self) -> TaskQueue {
        self.queue.clone()
    }

    /// Stop accepting tasks, finish everything already queued, then join the worker.
    pub async fn drain(self) {
        self.drain.notify_one();
        if let Err(err) = self.handle.await {
            warn!(
                target = SOURCE,
                op = "drain",
                result = "join_error",
                error = %err,
                "Task worker ended abnormally"
            );
        }
    }

    /// Abort the worker; queued tasks are dropped.
    pub fn shutdown(self) {
        self.handle.abort();
    }
}

async fn run_worker(
    ctx: JobContext,
    queue: TaskQueue,
    mut receiver: mpsc::Receiver<QueueEntry>,
    drain: Arc<Notify>,
    backoff: Duration,
) {
    let mut draining = false;

    loop {
        let entry = tokio::select! {
            entry = receiver.recv() => entry,
            _ = drain.notified(), if !draining => {
                draining = true;
                receiver.close();
                info!(
                    target = SOURCE,
                    op = "drain",
                    pending = queue.len(),
                    "Task queue closed; draining pending tasks"
                );
                continue;
            }
        };
        let Some(entry) = entry else {
            break;
        };
        gauge!(METRIC_QUEUE_LEN).set(queue.len() as f64);

        let iteration = AssertUnwindSafe(run_entry(&ctx, entry)).catch_unwind();
        if let Err(panic) = iteration.await {
            counter!(METRIC_WORKER_PANICS).increment(1);
            error!(
                target = SOURCE,
                op = "run_worker",
                result = "panic",
                panic = panic_message(panic.as_ref()),
                backoff_ms = backoff.as_millis() as u64,
                "Task worker iteration panicked; backing off"
            );
            tokio::time::sleep(backoff).await;
        }
    }

    info!(target = SOURCE, op = "run_worker", "Task worker stopped");
}

async fn run_entry(ctx: &JobContext, entry: QueueEntry) {
    let QueueEntry {
        request,
        enqueued_at,
    } = entry;
    let job_id = request.job_id;
    let requester = request.requester.clone();
    let waited_ms = enqueued_at.elapsed().as_millis() as u64;

    match process_job(ctx, request).await {
        Ok(outcome) => {
            counter!(METRIC_JOBS_COMPLETED).increment(1);
            info!(
                target = SOURCE,
                op = "run_entry",
                result = "ok",
                job_id = %job_id,
                images = outcome.images,
                waited_ms,
                "Queued task finished"
            );
        }
        Err(err) => {
            counter!(METRIC_JOBS_FAILED).increment(1);
            warn!(
                target = SOURCE,
                op = "run_entry",
                result = "error",
                job_id = %job_id,
                requester = %requester,
                error = %err,
                "Queued task failed"
            );
            let message = format!("generation failed: {err}");
            if let Err(err) = ctx.delivery.send_text(&requester, &message).await {
                warn!(
                    target = SOURCE,
                    op = "run_entry",
                    result = "report_failed",
                    job_id = %job_id,
                    error = %err,
                    "Could not report task failure to requester"
                );
            }
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.as_str()
    } else {
        "non-string panic payload"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use tempfile::TempDir;

    use crate::application::jobs::QueueError;
    use crate::application::jobs::testing::{BlockSource, RecordingDelivery};
    use crate::application::render::GlyphRenderer;
    use crate::domain::request::{RenderRequest, RequestLimits};
    use crate::domain::types::{RenderParams, RequesterId};
    use crate::infra::workspace::Workspace;

    fn request(requester: &str, font: Option<&str>) -> RenderRequest {
        RenderRequest::new(
            RequesterId::new(requester),
            vec!["ab".to_string(), "cd".to_string()],
            RenderParams {
                font_size: 8,
                canvas_height: 16,
                ..RenderParams::default()
            },
            font.map(str::to_string),
            RequestLimits {
                max_chars_per_task: 100,
                max_images_per_task: 10,
            },
        )
        .expect("valid request")
    }

    fn start(root: &TempDir, delivery: Arc<RecordingDelivery>, capacity: usize) -> TaskService {
        let ctx = JobContext::new(
            Arc::new(BlockSource::default()),
            GlyphRenderer::default(),
            Arc::new(Workspace::new(root.path())),
            delivery,
        );
        TaskService::start(ctx, capacity, Duration::from_millis(5))
    }

    async fn wait_until_empty(queue: &TaskQueue) {
        for _ in 0..500 {
            if queue.is_empty() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
        panic!("worker never picked up the queued task");
    }

    #[tokio::test]
    async fn jobs_run_in_submission_order() {
        let root = TempDir::new().expect("temp dir");
        let delivery = Arc::new(RecordingDelivery::default());
        let service = start(&root, delivery.clone(), 8);
        let queue = service.queue();

        for name in ["first", "second", "third"] {
            queue.try_enqueue(request(name, None)).expect("room");
        }
        service.drain().await;

        assert_eq!(delivery.file_requesters(), ["first", "second", "third"]);
    }

    #[tokio::test]
    async fn worker_survives_failing_and_panicking_jobs() {
        let root = TempDir::new().expect("temp dir");
        let delivery = Arc::new(RecordingDelivery::panicking_for("boom"));
        let service = start(&root, delivery.clone(), 8);
        let queue = service.queue();

        queue
            .try_enqueue(request("no-font", Some(BlockSource::MISSING)))
            .expect("room");
        queue
            .try_enqueue(request("bad-face", Some(BlockSource::PANIC)))
            .expect("room");
        queue.try_enqueue(request("boom", None)).expect("room");
        queue.try_enqueue(request("after", None)).expect("room");
        service.drain().await;

        assert_eq!(delivery.file_requesters(), ["after"]);
        assert_eq!(delivery.texts_for("no-font").len(), 1);
        assert!(delivery.texts_for("no-font")[0].starts_with("generation failed"));
        assert_eq!(delivery.texts_for("bad-face").len(), 1);
        assert!(delivery.texts_for("boom").is_empty());
        assert_eq!(std::fs::read_dir(root.path()).expect("ls").count(), 0);
    }

    #[tokio::test]
    async fn full_queue_rejects_while_worker_is_busy() {
        let root = TempDir::new().expect("temp dir");
        let delivery = Arc::new(RecordingDelivery::gated());
        let service = start(&root, delivery.clone(), 2);
        let queue = service.queue();

        queue.try_enqueue(request("running", None)).expect("room");
        wait_until_empty(&queue).await;
        queue.try_enqueue(request("queued-1", None)).expect("room");
        queue.try_enqueue(request("queued-2", None)).expect("room");

        let err = queue
            .try_enqueue(request("rejected", None))
            .expect_err("queue full");
        assert_eq!(err, QueueError::Full { capacity: 2 });
        assert_eq!(queue.len(), 2);

        delivery.open_gate();
        service.drain().await;
        assert_eq!(
            delivery.file_requesters(),
            ["running", "queued-1", "queued-2"]
        );
    }

    #[tokio::test]
    async fn drain_closes_the_queue() {
        let root = TempDir::new().expect("temp dir");
        let delivery = Arc::new(RecordingDelivery::default());
        let service = start(&root, delivery, 2);
        let queue = service.queue();

        service.drain().await;
        assert!(queue.is_closed());
        assert!(queue.try_enqueue(request("late", None)).is_err());
    }
}
