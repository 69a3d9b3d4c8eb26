//! Validated render requests.

use time::OffsetDateTime;
use uuid::Uuid;

use super::error::DomainError;
use super::types::{RenderParams, RequesterId};

/// Name of the catalog entry every resolution falls back to.
pub const DEFAULT_FONT_NAME: &str = "default";

/// Per-job limits enforced before any rendering starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestLimits {
    pub max_chars_per_task: usize,
    pub max_images_per_task: usize,
}

/// One unit of work: every token renders to one image with the same params and font.
#[derive(Debug, Clone)]
pub struct RenderRequest {
    pub job_id: Uuid,
    pub requester: RequesterId,
    pub tokens: Vec<String>,
    pub params: RenderParams,
    pub font: String,
    pub submitted_at: OffsetDateTime,
}

impl RenderRequest {
    /// Build a request, enforcing `1 <= tokens <= max_images` and the total character budget.
    pub fn new(
        requester: RequesterId,
        tokens: Vec<String>,
        params: RenderParams,
        font: Option<String>,
        limits: RequestLimits,
    ) -> Result<Self, DomainError> {
        if tokens.is_empty() {
            return Err(DomainError::validation("content produced no tokens"));
        }
        if tokens.len() > limits.max_images_per_task {
            return Err(DomainError::limit_exceeded(
                "image count",
                tokens.len(),
                limits.max_images_per_task,
            ));
        }

        let chars: usize = tokens.iter().map(|token| token.chars().count()).sum();
        if chars > limits.max_chars_per_task {
            return Err(DomainError::limit_exceeded(
                "character count",
                chars,
                limits.max_chars_per_task,
            ));
        }

        let font = font
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| DEFAULT_FONT_NAME.to_string());

        Ok(Self {
            job_id: Uuid::new_v4(),
            requester,
            tokens,
            params,
            font,
            submitted_at: OffsetDateTime::now_utc(),
        })
    }

    pub fn is_single(&self) -> bool {
        self.tokens.len() == 1
    }
}
