use std::error::Error as StdError;

use thiserror::Error;

use crate::{
    application::{
        delivery::DeliveryError,
        directive::DirectiveError,
        jobs::{JobError, QueueError},
        render::FontError,
    },
    domain::error::DomainError,
    infra::error::InfraError,
};

/// Error message plus its source chain, for logs and requester-facing text.
#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub source: &'static str,
    pub messages: Vec<String>,
}

impl ErrorReport {
    pub fn from_error(source: &'static str, error: &dyn StdError) -> Self {
        let mut messages = vec![error.to_string()];
        let mut current = error.source();
        while let Some(inner) = current {
            messages.push(inner.to_string());
            current = inner.source();
        }
        Self { source, messages }
    }

    pub fn joined(&self) -> String {
        self.messages.join(": ")
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error("invalid option {0}")]
    Directive(#[from] DirectiveError),
    #[error(transparent)]
    Queue(#[from] QueueError),
    #[error(transparent)]
    Font(#[from] FontError),
    #[error(transparent)]
    Job(#[from] JobError),
    #[error(transparent)]
    Delivery(#[from] DeliveryError),
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected(message.into())
    }

    /// Whether the error was raised before any work started.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            AppError::Domain(_) | AppError::Directive(_) | AppError::Validation(_) | AppError::Queue(_)
        )
    }

    /// Status text sent back to the requester.
    pub fn requester_message(&self) -> String {
        match self {
            AppError::Queue(QueueError::Full { .. }) => {
                "the task queue is full, please try again later".to_string()
            }
            AppError::Queue(QueueError::Closed) => "the task queue is shutting down".to_string(),
            AppError::Validation(message) => message.clone(),
            AppError::Domain(err) => err.to_string(),
            AppError::Directive(err) => format!("invalid option {err}"),
            AppError::Font(err) => format!("generation failed: {err}"),
            AppError::Job(err) => format!("generation failed: {err}"),
            AppError::Delivery(_) | AppError::Infra(_) | AppError::Unexpected(_) => {
                "generation failed: unexpected error".to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::domain::color::ColorError;

    #[test]
    fn report_walks_the_source_chain() {
        let error = DirectiveError::Color {
            key: "text_color",
            source: ColorError::Length("#ABC".to_string()),
        };
        let report = ErrorReport::from_error("test", &error);
        assert_eq!(report.messages.len(), 2);
        assert!(report.joined().starts_with("`text_color`"));
    }

    #[test]
    fn queue_full_is_a_rejection_with_retry_hint() {
        let error = AppError::from(QueueError::Full { capacity: 3 });
        assert!(error.is_rejection());
        assert!(error.requester_message().contains("try again later"));
    }
}
