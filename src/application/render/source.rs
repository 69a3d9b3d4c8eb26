use std::path::PathBuf;

use thiserror::Error;

use super::face::GlyphFace;

#[derive(Debug, Error)]
pub enum FontError {
    #[error("font `{requested}` and the default font are both unavailable")]
    Unavailable { requested: String },
    #[error("failed to load font `{}`: {reason}", path.display())]
    Load { path: PathBuf, reason: String },
    #[error("failed to read font catalog: {0}")]
    Catalog(String),
}

impl FontError {
    pub fn load(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::Load {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// Resolves catalog names to faces instantiated at a pixel size.
pub trait FaceSource: Send + Sync {
    /// Resolve `name` through the catalog's fallback chain and load it at `size` px.
    fn load_face(&self, name: &str, size: u32) -> Result<Box<dyn GlyphFace + Send>, FontError>;

    /// Names a requester may pass as `font:<name>`.
    fn font_names(&self) -> Result<Vec<String>, FontError>;
}
