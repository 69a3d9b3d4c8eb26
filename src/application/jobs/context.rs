use std::sync::Arc;

use crate::application::delivery::Delivery;
use crate::application::render::{FaceSource, GlyphRenderer};
use crate::infra::workspace::Workspace;

/// Shared capabilities every render job needs, for both the inline path and the worker.
#[derive(Clone)]
pub struct JobContext {
    pub faces: Arc<dyn FaceSource>,
    pub renderer: GlyphRenderer,
    pub workspace: Arc<Workspace>,
    pub delivery: Arc<dyn Delivery>,
}

impl JobContext {
    pub fn new(
        faces: Arc<dyn FaceSource>,
        renderer: GlyphRenderer,
        workspace: Arc<Workspace>,
        delivery: Arc<dyn Delivery>,
    ) -> Self {
        Self {
            faces,
            renderer,
            workspace,
            delivery,
        }
    }
}
