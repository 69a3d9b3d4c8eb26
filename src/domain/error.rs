use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("domain validation failed: {message}")]
    Validation { message: String },
    #[error("limit exceeded: {limit} is {actual}, maximum {maximum}")]
    LimitExceeded {
        limit: &'static str,
        actual: usize,
        maximum: usize,
    },
}

impl DomainError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn limit_exceeded(limit: &'static str, actual: usize, maximum: usize) -> Self {
        Self::LimitExceeded {
            limit,
            actual,
            maximum,
        }
    }
}
