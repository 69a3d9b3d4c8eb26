//! In-memory collaborators for job tests.

use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::Semaphore;

use crate::application::delivery::{Delivery, DeliveryError};
use crate::application::render::testing::BlockFace;
use crate::application::render::{FaceSource, FontError, GlyphFace};
use crate::domain::types::RequesterId;

/// Serves block faces for every name except the two sentinel names.
#[derive(Debug, Default)]
pub(crate) struct BlockSource;

impl BlockSource {
    pub(crate) const MISSING: &'static str = "missing";
    pub(crate) const PANIC: &'static str = "panic";
}

impl FaceSource for BlockSource {
    fn load_face(&self, name: &str, _size: u32) -> Result<Box<dyn GlyphFace + Send>, FontError> {
        match name {
            Self::MISSING => Err(FontError::Unavailable {
                requested: name.to_string(),
            }),
            Self::PANIC => panic!("face source exploded"),
            _ => Ok(Box::new(BlockFace::universal(4.0, 6.0))),
        }
    }

    fn font_names(&self) -> Result<Vec<String>, FontError> {
        Ok(vec!["default".to_string(), "serif".to_string()])
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Sent {
    File {
        requester: String,
        name: String,
        bytes: Vec<u8>,
    },
    Text {
        requester: String,
        message: String,
    },
}

/// Records every delivery. Optionally holds files at a gate or panics for one requester.
#[derive(Debug)]
pub(crate) struct RecordingDelivery {
    sent: Mutex<Vec<Sent>>,
    gate: Option<Semaphore>,
    panic_for: Option<String>,
}

impl Default for RecordingDelivery {
    fn default() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            gate: None,
            panic_for: None,
        }
    }
}

impl RecordingDelivery {
    /// File deliveries wait until [`RecordingDelivery::open_gate`] is called.
    pub(crate) fn gated() -> Self {
        Self {
            gate: Some(Semaphore::new(0)),
            ..Self::default()
        }
    }

    pub(crate) fn panicking_for(requester: &str) -> Self {
        Self {
            panic_for: Some(requester.to_string()),
            ..Self::default()
        }
    }

    pub(crate) fn open_gate(&self) {
        if let Some(gate) = &self.gate {
            gate.add_permits(1024);
        }
    }

    pub(crate) fn sent(&self) -> Vec<Sent> {
        self.sent.lock().expect("sent lock").clone()
    }

    /// Requesters whose files were delivered, in delivery order.
    pub(crate) fn file_requesters(&self) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter_map(|sent| match sent {
                Sent::File { requester, .. } => Some(requester),
                Sent::Text { .. } => None,
            })
            .collect()
    }

    pub(crate) fn texts_for(&self, requester: &str) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter_map(|sent| match sent {
                Sent::Text {
                    requester: to,
                    message,
                } if to == requester => Some(message),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl Delivery for RecordingDelivery {
    async fn send_file(
        &self,
        requester: &RequesterId,
        path: &Path,
        name: &str,
    ) -> Result<(), DeliveryError> {
        if self.panic_for.as_deref() == Some(requester.as_str()) {
            panic!("delivery exploded for {requester}");
        }
        if let Some(gate) = &self.gate {
            let permit = gate
                .acquire()
                .await
                .map_err(|err| DeliveryError::Rejected(err.to_string()))?;
            permit.forget();
        }
        let bytes = tokio::fs::read(path).await?;
        self.sent.lock().expect("sent lock").push(Sent::File {
            requester: requester.as_str().to_string(),
            name: name.to_string(),
            bytes,
        });
        Ok(())
    }

    async fn send_text(&self, requester: &RequesterId, message: &str) -> Result<(), DeliveryError> {
        self.sent.lock().expect("sent lock").push(Sent::Text {
            requester: requester.as_str().to_string(),
            message: message.to_string(),
        });
        Ok(())
    }
}
