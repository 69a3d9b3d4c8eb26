/// Ink rectangle of a glyph in pixels, relative to its pen origin on the baseline.
///
/// `y` grows downwards, so ascenders have negative `min_y`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InkBounds {
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
}

impl InkBounds {
    pub fn width(&self) -> f32 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f32 {
        self.max_y - self.min_y
    }

    pub fn translate_x(self, dx: f32) -> Self {
        Self {
            min_x: self.min_x + dx,
            max_x: self.max_x + dx,
            ..self
        }
    }

    pub fn union(self, other: Self) -> Self {
        Self {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }
}

/// A font instantiated at a concrete pixel size.
///
/// The renderer only talks to fonts through this trait, so layout can be
/// exercised without font files.
pub trait GlyphFace {
    /// Whether the face maps `ch` to a real glyph (not the missing-glyph box).
    fn has_glyph(&self, ch: char) -> bool;

    /// Ink bounds of `ch`; `None` when the glyph draws nothing.
    fn ink_bounds(&self, ch: char) -> Option<InkBounds>;

    /// Horizontal advance of `ch` in pixels.
    fn advance(&self, ch: char) -> f32;

    /// Distance from the baseline to the top of the line.
    fn ascent(&self) -> f32;

    /// Distance from the baseline to the bottom of the line, positive.
    fn descent(&self) -> f32;

    /// Rasterize `ch` with its pen origin at `origin` (x, baseline y).
    ///
    /// `plot` receives absolute pixel coordinates and a coverage in `0.0..=1.0`.
    fn rasterize(&self, ch: char, origin: (f32, f32), plot: &mut dyn FnMut(i64, i64, f32));

    /// A face covers `ch` when it has a glyph whose ink is wider than zero.
    fn covers(&self, ch: char) -> bool {
        self.has_glyph(ch)
            && self
                .ink_bounds(ch)
                .is_some_and(|bounds| bounds.width() > 0.0)
    }
}
