//! Synthetic faces for layout tests: every glyph is a solid block.

use super::face::{GlyphFace, InkBounds};

pub(crate) struct BlockFace {
    advance: f32,
    ascent: f32,
    supports: fn(char) -> bool,
}

impl BlockFace {
    /// Covers printable ASCII except space.
    pub(crate) fn ascii(advance: f32, ascent: f32) -> Self {
        Self {
            advance,
            ascent,
            supports: |ch| ch.is_ascii_graphic(),
        }
    }

    /// Covers every non-whitespace character.
    pub(crate) fn universal(advance: f32, ascent: f32) -> Self {
        Self {
            advance,
            ascent,
            supports: |ch| !ch.is_whitespace(),
        }
    }
}

impl GlyphFace for BlockFace {
    fn has_glyph(&self, ch: char) -> bool {
        (self.supports)(ch)
    }

    fn ink_bounds(&self, ch: char) -> Option<InkBounds> {
        self.has_glyph(ch).then_some(InkBounds {
            min_x: 0.0,
            min_y: -self.ascent,
            max_x: self.advance,
            max_y: 0.0,
        })
    }

    fn advance(&self, _ch: char) -> f32 {
        self.advance
    }

    fn ascent(&self) -> f32 {
        self.ascent
    }

    fn descent(&self) -> f32 {
        self.ascent / 4.0
    }

    fn rasterize(&self, ch: char, origin: (f32, f32), plot: &mut dyn FnMut(i64, i64, f32)) {
        if !self.has_glyph(ch) {
            return;
        }
        let left = origin.0.floor() as i64;
        let baseline = origin.1.floor() as i64;
        for dy in 0..self.ascent as i64 {
            for dx in 0..self.advance as i64 {
                plot(left + dx, baseline - self.ascent as i64 + dy, 1.0);
            }
        }
    }
}
