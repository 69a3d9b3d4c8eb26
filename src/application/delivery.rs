//! Host-side delivery of results to a requester.

use std::path::Path;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::types::RequesterId;

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("delivery io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("delivery rejected: {0}")]
    Rejected(String),
}

/// What the host exposes for sending files and status text back to a requester.
#[async_trait]
pub trait Delivery: Send + Sync {
    /// Deliver the file at `path` under the display `name`. The file may be
    /// deleted as soon as this returns.
    async fn send_file(
        &self,
        requester: &RequesterId,
        path: &Path,
        name: &str,
    ) -> Result<(), DeliveryError>;

    async fn send_text(&self, requester: &RequesterId, message: &str) -> Result<(), DeliveryError>;
}
