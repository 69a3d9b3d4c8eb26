//! Submission flow: directive → validated request → inline render or queue.

use std::time::Instant;

use tracing::{info, warn};

use crate::application::command::HostCommand;
use crate::application::directive;
use crate::application::error::{AppError, ErrorReport};
use crate::application::jobs::{JobContext, JobOutcome, TaskQueue, process_job};
use crate::application::tokenize;
use crate::domain::request::{RenderRequest, RequestLimits};
use crate::domain::types::{RenderParams, RequesterId};

const SOURCE: &str = "application::generate";

/// Result of an accepted `generate`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    /// Single image, rendered and delivered in the caller's turn.
    Delivered(JobOutcome),
    /// Handed to the worker; `pending` includes this task.
    Queued { pending: usize, capacity: usize },
}

pub struct TextToolService {
    ctx: JobContext,
    queue: TaskQueue,
    defaults: RenderParams,
    limits: RequestLimits,
}

impl TextToolService {
    pub fn new(
        ctx: JobContext,
        queue: TaskQueue,
        defaults: RenderParams,
        limits: RequestLimits,
    ) -> Self {
        Self {
            ctx,
            queue,
            defaults,
            limits,
        }
    }

    /// Run one host command and send every reply through the delivery seam.
    pub async fn handle(&self, requester: &RequesterId, command: HostCommand) -> Result<(), AppError> {
        let reply = match command {
            HostCommand::Generate(raw) => match self.generate(requester, &raw).await {
                Ok(Submission::Delivered(_)) => None,
                Ok(Submission::Queued { pending, capacity }) => Some(format!(
                    "added to the task queue, queue length: {pending}/{capacity}"
                )),
                Err(err) => {
                    let report = ErrorReport::from_error(SOURCE, &err);
                    warn!(
                        target = SOURCE,
                        op = "generate",
                        result = if err.is_rejection() { "rejected" } else { "error" },
                        requester = %requester,
                        error = %report.joined(),
                        "Generate request failed"
                    );
                    Some(err.requester_message())
                }
            },
            HostCommand::Task => Some(self.task_status()),
            HostCommand::FontList => Some(self.font_list()?),
            HostCommand::Unknown(other) => Some(format!(
                "unknown command `{other}`; expected generate, task or font_list"
            )),
        };

        if let Some(message) = reply {
            self.ctx.delivery.send_text(requester, &message).await?;
        }
        Ok(())
    }

    /// Validate `raw` and either render it now (one token) or enqueue it.
    pub async fn generate(&self, requester: &RequesterId, raw: &str) -> Result<Submission, AppError> {
        let started_at = Instant::now();
        let request = self.prepare(requester, raw)?;

        if request.is_single() {
            let outcome = process_job(&self.ctx, request).await?;
            info!(
                target = SOURCE,
                op = "generate",
                result = "delivered_inline",
                requester = %requester,
                elapsed_ms = started_at.elapsed().as_millis() as u64,
                "Single image delivered"
            );
            return Ok(Submission::Delivered(outcome));
        }

        let pending = self.queue.try_enqueue(request)?;
        Ok(Submission::Queued {
            pending,
            capacity: self.queue.capacity(),
        })
    }

    /// Parse and validate without side effects.
    pub fn prepare(&self, requester: &RequesterId, raw: &str) -> Result<RenderRequest, AppError> {
        if raw.trim().is_empty() {
            return Err(AppError::validation("no content provided"));
        }

        let parsed = directive::parse(raw);
        let params = parsed.apply(&self.defaults)?;
        let tokens = tokenize::split(&parsed.content, parsed.split_mode());
        if tokens.is_empty() {
            return Err(AppError::validation("no content provided"));
        }

        let request = RenderRequest::new(
            requester.clone(),
            tokens,
            params,
            parsed.font.clone(),
            self.limits,
        )?;
        Ok(request)
    }

    pub fn task_status(&self) -> String {
        format!(
            "current queue length: {}/{}",
            self.queue.len(),
            self.queue.capacity()
        )
    }

    pub fn font_list(&self) -> Result<String, AppError> {
        let names = self.ctx.faces.font_names()?;
        if names.is_empty() {
            return Ok("no fonts configured".to_string());
        }
        Ok(names
            .iter()
            .map(|name| format!("- {name}"))
            .collect::<Vec<_>>()
            .join("\n"))
    }
}
