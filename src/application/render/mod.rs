//! Text rasterization.
//!
//! Rendering is pure: it takes a token, two faces and layout params and
//! returns pixels. Font resolution, encoding and file handling happen in the
//! caller, typically the job worker.

mod face;
mod glyph;
mod layout;
mod source;
#[cfg(test)]
pub(crate) mod testing;

pub use face::{GlyphFace, InkBounds};
pub use glyph::{DEFAULT_PIXEL_BUDGET, GlyphRenderer, RenderError, RenderedImage};
pub use layout::{FaceChoice, FacePair, LayoutPlan, PlannedGlyph};
pub use source::{FaceSource, FontError};
