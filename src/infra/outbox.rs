//! Filesystem delivery used by the command-line host.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tracing::info;

use crate::application::delivery::{Delivery, DeliveryError};
use crate::domain::types::RequesterId;

const SOURCE: &str = "infra::outbox";

/// Copies delivered files into `<root>/<requester>/` and prints status text to stdout.
#[derive(Debug, Clone)]
pub struct OutboxDelivery {
    root: PathBuf,
}

impl OutboxDelivery {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn requester_dir(&self, requester: &RequesterId) -> PathBuf {
        self.root.join(requester.path_component())
    }
}

#[async_trait]
impl Delivery for OutboxDelivery {
    async fn send_file(
        &self,
        requester: &RequesterId,
        path: &Path,
        name: &str,
    ) -> Result<(), DeliveryError> {
        let dir = self.requester_dir(requester);
        tokio::fs::create_dir_all(&dir).await?;
        let target = dir.join(name);
        let bytes = tokio::fs::copy(path, &target).await?;

        info!(
            target = SOURCE,
            op = "send_file",
            requester = %requester,
            path = %target.display(),
            bytes,
            "File delivered"
        );
        self.send_text(requester, &format!("delivered {}", target.display()))
            .await
    }

    async fn send_text(&self, requester: &RequesterId, message: &str) -> Result<(), DeliveryError> {
        info!(
            target = SOURCE,
            op = "send_text",
            requester = %requester,
            "Status delivered"
        );
        let mut stdout = tokio::io::stdout();
        stdout
            .write_all(format!("[{requester}] {message}\n").as_bytes())
            .await?;
        stdout.flush().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use tempfile::TempDir;

    #[tokio::test]
    async fn files_land_in_the_requester_directory() {
        let outbox = TempDir::new().expect("outbox");
        let source = TempDir::new().expect("source");
        let file = source.path().join("a_000.png");
        std::fs::write(&file, b"bytes").expect("write");

        let delivery = OutboxDelivery::new(outbox.path());
        let requester = RequesterId::new("bob");
        delivery
            .send_file(&requester, &file, "a_000.png")
            .await
            .expect("delivered");

        let delivered = outbox.path().join("bob").join("a_000.png");
        assert_eq!(std::fs::read(delivered).expect("read"), b"bytes");
    }
}
