use std::path::Path;

use ab_glyph::{Font, FontArc, FontVec, GlyphId, InvalidFont, PxScale, ScaleFont, point};

use crate::application::render::{FontError, GlyphFace, InkBounds};

/// An `ab_glyph` font bound to a pixel size.
#[derive(Clone)]
pub struct LoadedFont {
    font: FontArc,
    scale: PxScale,
}

impl std::fmt::Debug for LoadedFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedFont")
            .field("scale", &self.scale)
            .finish_non_exhaustive()
    }
}

impl LoadedFont {
    /// Read and parse a font file. Collections use their first face.
    pub fn open(path: &Path, size_px: f32) -> Result<Self, FontError> {
        let data = std::fs::read(path).map_err(|err| FontError::load(path, err.to_string()))?;
        Self::from_vec(data, size_px).map_err(|err| FontError::load(path, err.to_string()))
    }

    pub fn from_vec(data: Vec<u8>, size_px: f32) -> Result<Self, InvalidFont> {
        let font = FontArc::new(FontVec::try_from_vec_and_index(data, 0)?);
        let scale = em_scale(&font, size_px);
        Ok(Self { font, scale })
    }

    /// Line height at the bound size; zero or non-finite means the font is unusable.
    pub fn line_height(&self) -> f32 {
        self.font.as_scaled(self.scale).height()
    }

    fn glyph_id(&self, ch: char) -> GlyphId {
        self.font.glyph_id(ch)
    }
}

/// `size_px` is the em size. `PxScale` measures ascent-to-descent, so convert.
fn em_scale(font: &FontArc, size_px: f32) -> PxScale {
    match font.units_per_em() {
        Some(units) if units > 0.0 => PxScale::from(size_px * font.height_unscaled() / units),
        _ => PxScale::from(size_px),
    }
}

impl GlyphFace for LoadedFont {
    fn has_glyph(&self, ch: char) -> bool {
        self.glyph_id(ch).0 != 0
    }

    fn ink_bounds(&self, ch: char) -> Option<InkBounds> {
        let glyph = self
            .glyph_id(ch)
            .with_scale_and_position(self.scale, point(0.0, 0.0));
        self.font.outline_glyph(glyph).map(|outlined| {
            let bounds = outlined.px_bounds();
            InkBounds {
                min_x: bounds.min.x,
                min_y: bounds.min.y,
                max_x: bounds.max.x,
                max_y: bounds.max.y,
            }
        })
    }

    fn advance(&self, ch: char) -> f32 {
        self.font.as_scaled(self.scale).h_advance(self.glyph_id(ch))
    }

    fn ascent(&self) -> f32 {
        self.font.as_scaled(self.scale).ascent()
    }

    fn descent(&self) -> f32 {
        -self.font.as_scaled(self.scale).descent()
    }

    fn rasterize(&self, ch: char, origin: (f32, f32), plot: &mut dyn FnMut(i64, i64, f32)) {
        let glyph = self
            .glyph_id(ch)
            .with_scale_and_position(self.scale, point(origin.0, origin.1));
        if let Some(outlined) = self.font.outline_glyph(glyph) {
            let bounds = outlined.px_bounds();
            let (left, top) = (bounds.min.x as i64, bounds.min.y as i64);
            outlined.draw(|x, y, coverage| {
                plot(left + i64::from(x), top + i64::from(y), coverage);
            });
        }
    }
}
