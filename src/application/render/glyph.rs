//! Glyph renderer: lays out one token and rasterizes it to RGBA.

use image::{Rgba as Pixel, RgbaImage, imageops};
use thiserror::Error;

use crate::domain::color::Rgba;
use crate::domain::types::{CenterMode, RenderParams};

use super::layout::{FacePair, LayoutPlan};

/// Upper bound on the scratch canvas area (safety margin included).
pub const DEFAULT_PIXEL_BUDGET: u64 = 64 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("canvas has zero area ({width}x{height})")]
    EmptyCanvas { width: u32, height: u32 },
    #[error("scratch canvas {width}x{height} exceeds the pixel budget of {budget}")]
    CanvasTooLarge { width: u64, height: u64, budget: u64 },
}

/// Raster produced for one token, tagged with the DPI it should be encoded with.
#[derive(Debug, Clone)]
pub struct RenderedImage {
    pub image: RgbaImage,
    pub dpi: u32,
    /// Measured run width (floored), before padding.
    pub text_width: u32,
    pub fallback_glyphs: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct GlyphRenderer {
    pixel_budget: u64,
}

impl Default for GlyphRenderer {
    fn default() -> Self {
        Self::new(DEFAULT_PIXEL_BUDGET)
    }
}

impl GlyphRenderer {
    pub fn new(pixel_budget: u64) -> Self {
        Self { pixel_budget }
    }

    /// Render `text` with per-character fallback between the two faces.
    ///
    /// The text is drawn on a scratch canvas inflated by `2 * font_size` on
    /// every side so hinting overshoot is never clipped mid-glyph, then the
    /// nominal canvas is cropped out and composited over the background.
    pub fn render(
        &self,
        text: &str,
        faces: FacePair<'_>,
        params: &RenderParams,
    ) -> Result<RenderedImage, RenderError> {
        let plan = LayoutPlan::build(text, faces);
        let text_width = plan.width().max(0.0).floor() as u32;

        let canvas_width = params
            .canvas_width
            .unwrap_or_else(|| text_width.saturating_add(params.padding.saturating_mul(2)));
        let canvas_height = params.canvas_height;
        if canvas_width == 0 || canvas_height == 0 {
            return Err(RenderError::EmptyCanvas {
                width: canvas_width,
                height: canvas_height,
            });
        }

        let margin = u64::from(params.font_size) * 2;
        let scratch_width = u64::from(canvas_width) + margin * 2;
        let scratch_height = u64::from(canvas_height) + margin * 2;
        if scratch_width.saturating_mul(scratch_height) > self.pixel_budget {
            return Err(RenderError::CanvasTooLarge {
                width: scratch_width,
                height: scratch_height,
                budget: self.pixel_budget,
            });
        }

        let margin_px = margin as i64;
        let reach = scratch_width.max(scratch_height) as i64;
        let x_space = canvas_width as f32 - text_width as f32;
        let pen_x = clamp_position((x_space * params.x_offset_ratio).floor(), reach)
            .saturating_add(margin_px);
        let baseline = clamp_position(baseline_y(&plan, faces, params), reach)
            .saturating_add(margin_px);

        let mut scratch = RgbaImage::new(scratch_width as u32, scratch_height as u32);
        for glyph in plan.glyphs() {
            let origin = (pen_x as f32 + glyph.offset, baseline as f32);
            faces
                .get(glyph.face)
                .rasterize(glyph.ch, origin, &mut |x, y, coverage| {
                    if x < 0 || y < 0 {
                        return;
                    }
                    let (x, y) = (x as u64, y as u64);
                    if x >= scratch_width || y >= scratch_height {
                        return;
                    }
                    blend_over(
                        scratch.get_pixel_mut(x as u32, y as u32),
                        params.text_color,
                        coverage,
                    );
                });
        }

        let cropped = imageops::crop_imm(
            &scratch,
            margin as u32,
            margin as u32,
            canvas_width,
            canvas_height,
        )
        .to_image();

        let mut image = RgbaImage::from_pixel(
            canvas_width,
            canvas_height,
            Pixel(params.bg_color.to_array()),
        );
        imageops::overlay(&mut image, &cropped, 0, 0);

        Ok(RenderedImage {
            image,
            dpi: params.dpi,
            text_width,
            fallback_glyphs: plan.fallback_count(),
        })
    }
}

/// Baseline position inside the nominal canvas, before clamping.
fn baseline_y(plan: &LayoutPlan, faces: FacePair<'_>, params: &RenderParams) -> f32 {
    let canvas_height = params.canvas_height as f32;
    match params.center_mode {
        CenterMode::Visual => (canvas_height * params.y_offset_ratio).floor(),
        CenterMode::Geometry => match plan.ink_bounds() {
            Some(ink) => {
                let top = ((canvas_height - ink.height()) * params.y_offset_ratio).floor();
                (top - ink.min_y).round()
            }
            None => {
                let ascent = faces.primary.ascent();
                let line_height = ascent + faces.primary.descent();
                let top = ((canvas_height - line_height) * params.y_offset_ratio).floor();
                (top + ascent).round()
            }
        },
    }
}

/// Positions beyond `reach` on either side draw nothing, so pin them there.
fn clamp_position(value: f32, reach: i64) -> i64 {
    let reach = reach as f32;
    value.clamp(-reach, reach) as i64
}

/// Source-over blend of `color` scaled by `coverage` onto `dst`.
fn blend_over(dst: &mut Pixel<u8>, color: Rgba, coverage: f32) {
    let src_a = f32::from(color.a) / 255.0 * coverage.clamp(0.0, 1.0);
    if src_a <= 0.0 {
        return;
    }
    let dst_a = f32::from(dst[3]) / 255.0;
    let out_a = src_a + dst_a * (1.0 - src_a);

    let src = [color.r, color.g, color.b];
    for (channel, value) in src.into_iter().enumerate() {
        let blended = (f32::from(value) * src_a
            + f32::from(dst[channel]) * dst_a * (1.0 - src_a))
            / out_a;
        dst[channel] = blended.round().clamp(0.0, 255.0) as u8;
    }
    dst[3] = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
}
