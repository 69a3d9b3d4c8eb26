//! Render jobs: the shared processing pipeline, the bounded queue and its worker.

mod context;
mod process;
mod queue;
#[cfg(test)]
pub(crate) mod testing;
mod worker;

pub use context::JobContext;
pub use process::{JobError, JobOutcome, process_job, render_tokens};
pub use queue::{QueueEntry, QueueError, TaskQueue};
pub use worker::TaskService;
