//! Single-pass glyph plan shared by measurement and drawing.

use super::face::{GlyphFace, InkBounds};

/// Which of the two faces supplies a glyph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaceChoice {
    Primary,
    Fallback,
}

/// Primary font plus the face used for characters it cannot draw.
#[derive(Clone, Copy)]
pub struct FacePair<'a> {
    pub primary: &'a dyn GlyphFace,
    pub fallback: &'a dyn GlyphFace,
}

impl<'a> FacePair<'a> {
    pub fn new(primary: &'a dyn GlyphFace, fallback: &'a dyn GlyphFace) -> Self {
        Self { primary, fallback }
    }

    pub fn get(&self, choice: FaceChoice) -> &'a dyn GlyphFace {
        match choice {
            FaceChoice::Primary => self.primary,
            FaceChoice::Fallback => self.fallback,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlannedGlyph {
    pub ch: char,
    pub face: FaceChoice,
    /// Pen x relative to the start of the run.
    pub offset: f32,
    pub advance: f32,
    pub ink: Option<InkBounds>,
}

/// Ordered `(character, face, advance)` plan for one token.
#[derive(Debug, Clone, Default)]
pub struct LayoutPlan {
    glyphs: Vec<PlannedGlyph>,
    width: f32,
}

impl LayoutPlan {
    /// Select a face per character once; drawing replays exactly this plan.
    pub fn build(text: &str, faces: FacePair<'_>) -> Self {
        let mut glyphs = Vec::with_capacity(text.len());
        let mut pen = 0.0_f32;

        for ch in text.chars() {
            let choice = if faces.primary.covers(ch) {
                FaceChoice::Primary
            } else {
                FaceChoice::Fallback
            };
            let face = faces.get(choice);
            let advance = face.advance(ch);
            glyphs.push(PlannedGlyph {
                ch,
                face: choice,
                offset: pen,
                advance,
                ink: face.ink_bounds(ch),
            });
            pen += advance;
        }

        Self { glyphs, width: pen }
    }

    pub fn glyphs(&self) -> &[PlannedGlyph] {
        &self.glyphs
    }

    /// Sum of the advances of the selected faces.
    pub fn width(&self) -> f32 {
        self.width
    }

    /// Union of all glyph ink boxes, positioned along the run.
    pub fn ink_bounds(&self) -> Option<InkBounds> {
        self.glyphs
            .iter()
            .filter_map(|glyph| glyph.ink.map(|ink| ink.translate_x(glyph.offset)))
            .reduce(InkBounds::union)
    }

    pub fn fallback_count(&self) -> usize {
        self.glyphs
            .iter()
            .filter(|glyph| glyph.face == FaceChoice::Fallback)
            .count()
    }
}
