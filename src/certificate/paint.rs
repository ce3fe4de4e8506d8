use ab_glyph::{Font, Glyph, GlyphId, PxScale, ScaleFont, point};
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder, Rgba, RgbaImage};
use imageproc::drawing::{Blend, draw_filled_rect_mut};
use imageproc::rect::Rect;
use tracing::debug;

use super::RenderError;
use super::fonts::{FontBook, ResolvedFace};
use super::style::{Position, StyleConfig};

const UNDERLINE_OFFSET_EM: f32 = 0.1;
const UNDERLINE_THICKNESS_EM: f32 = 0.05;
const SYNTHETIC_BOLD_EM: f32 = 0.04;
const SYNTHETIC_ITALIC_SHEAR: f32 = 0.2;

/// Decoded background artwork. Its size is the size of every output.
#[derive(Debug, Clone)]
pub struct TemplateImage {
    pixels: RgbaImage,
}

impl TemplateImage {
    /// Decode PNG or JPEG bytes.
    pub fn decode(bytes: &[u8]) -> Result<Self, RenderError> {
        let decoded = image::load_from_memory(bytes).map_err(RenderError::TemplateDecode)?;
        Self::from_rgba(decoded.to_rgba8())
    }

    pub fn from_rgba(pixels: RgbaImage) -> Result<Self, RenderError> {
        let (width, height) = pixels.dimensions();
        if width == 0 || height == 0 {
            return Err(RenderError::EmptySurface { width, height });
        }
        Ok(Self { pixels })
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub(crate) fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }
}

/// A validated style bound to the faces it resolved to.
pub(crate) struct TextPen<'f> {
    /// Primary face first, then per-glyph fallbacks.
    faces: Vec<ResolvedFace<'f>>,
    color: Rgba<u8>,
    size_px: f32,
    position: Position,
    underline: bool,
}

impl<'f> TextPen<'f> {
    pub(crate) fn new(style: &StyleConfig, fonts: &'f FontBook) -> Result<Self, RenderError> {
        let color = style.validate()?;
        let descriptor = style.font_descriptor();
        let faces = fonts.resolve_chain(&descriptor);
        let primary = faces.first().ok_or(RenderError::NoFonts)?;
        debug!(
            font = %descriptor,
            face = primary.family,
            fallbacks = faces.len() - 1,
            synthetic_bold = primary.synthetic_bold,
            synthetic_italic = primary.synthetic_italic,
            "resolved font"
        );
        Ok(Self {
            faces,
            color,
            size_px: style.font_size_px,
            position: style.position,
            underline: style.underline,
        })
    }

    fn primary(&self) -> &ResolvedFace<'f> {
        &self.faces[0]
    }
}

struct PlacedGlyph {
    glyph: Glyph,
    face: usize,
}

struct TextLayout {
    glyphs: Vec<PlacedGlyph>,
    width: f32,
    scale: PxScale,
}

/// Owns the drawing surface reused across a batch.
pub(crate) struct Compositor<'t> {
    template: &'t TemplateImage,
    surface: RgbaImage,
}

impl<'t> Compositor<'t> {
    pub(crate) fn new(template: &'t TemplateImage) -> Self {
        Self {
            template,
            surface: template.pixels.clone(),
        }
    }

    /// Repaint the template, then draw `text` centered on the pen's anchor.
    pub(crate) fn paint(&mut self, text: &str, pen: &TextPen<'_>) -> Result<(), RenderError> {
        let layout = layout_line(pen, text)?;
        self.surface.copy_from_slice(self.template.pixels.as_raw());

        let (width, height) = self.surface.dimensions();
        let x = pen.position.x / 100.0 * width as f32;
        let y = pen.position.y / 100.0 * height as f32;

        // Vertical center is the middle of the ascent/descent box.
        let scaled = pen.primary().font.as_scaled(layout.scale);
        let baseline = y + (scaled.ascent() + scaled.descent()) / 2.0;
        draw_glyphs(&mut self.surface, pen, &layout, x - layout.width / 2.0, baseline);

        if pen.underline {
            draw_underline(&mut self.surface, pen, x, y, layout.width);
        }
        Ok(())
    }

    pub(crate) fn encode_png(&self) -> Result<Vec<u8>, RenderError> {
        let mut png = Vec::new();
        let (width, height) = self.surface.dimensions();
        PngEncoder::new(&mut png)
            .write_image(self.surface.as_raw(), width, height, ExtendedColorType::Rgba8)
            .map_err(RenderError::Encode)?;
        Ok(png)
    }

    #[cfg(test)]
    pub(crate) fn surface(&self) -> &RgbaImage {
        &self.surface
    }
}

fn em_scale(font: &impl Font, size_px: f32) -> PxScale {
    let units_per_em = font.units_per_em().unwrap_or(1000.0);
    PxScale::from(size_px * font.height_unscaled() / units_per_em)
}

fn layout_line(pen: &TextPen<'_>, text: &str) -> Result<TextLayout, RenderError> {
    let mut glyphs = Vec::with_capacity(text.len());
    let mut caret = 0.0f32;
    let mut previous: Option<(usize, GlyphId)> = None;
    for ch in text.chars().filter(|ch| !ch.is_control()) {
        let (face, id) = match pick_face(pen, ch) {
            Some(found) => found,
            None if ch.is_whitespace() => {
                // Unmapped spaces take the width of a plain space.
                let font = pen.primary().font;
                caret += font
                    .as_scaled(em_scale(font, pen.size_px))
                    .h_advance(font.glyph_id(' '));
                previous = None;
                continue;
            }
            None => {
                return Err(RenderError::MissingGlyph {
                    family: pen.primary().family.to_string(),
                    ch,
                    code: ch as u32,
                    text: text.to_string(),
                });
            }
        };
        let font = pen.faces[face].font;
        let scale = em_scale(font, pen.size_px);
        let scaled = font.as_scaled(scale);
        let same_face = previous.filter(|(previous_face, _)| *previous_face == face);
        if let Some((_, previous_id)) = same_face {
            caret += scaled.kern(previous_id, id);
        }
        glyphs.push(PlacedGlyph {
            glyph: id.with_scale_and_position(scale, point(caret, 0.0)),
            face,
        });
        caret += scaled.h_advance(id);
        previous = Some((face, id));
    }
    Ok(TextLayout {
        glyphs,
        width: caret,
        scale: em_scale(pen.primary().font, pen.size_px),
    })
}

/// First face in the pen's chain that has a glyph for `ch`.
fn pick_face(pen: &TextPen<'_>, ch: char) -> Option<(usize, GlyphId)> {
    pen.faces.iter().enumerate().find_map(|(index, face)| {
        let id = face.font.glyph_id(ch);
        (id.0 != 0).then_some((index, id))
    })
}

fn draw_glyphs(
    surface: &mut RgbaImage,
    pen: &TextPen<'_>,
    layout: &TextLayout,
    origin_x: f32,
    baseline: f32,
) {
    let bold_spread = (pen.size_px * SYNTHETIC_BOLD_EM).round().max(1.0) as i32;
    let shift = if pen.primary().synthetic_bold {
        bold_spread as f32 / 2.0
    } else {
        0.0
    };
    let origin_x = origin_x - shift;

    for placed in &layout.glyphs {
        let face = &pen.faces[placed.face];
        let spread = if face.synthetic_bold { bold_spread } else { 0 };
        let mut glyph = placed.glyph.clone();
        glyph.position.x += origin_x;
        glyph.position.y += baseline;
        let Some(outline) = face.font.outline_glyph(glyph) else {
            continue;
        };
        let bounds = outline.px_bounds();
        outline.draw(|gx, gy, coverage| {
            let py = bounds.min.y as i32 + gy as i32;
            let mut px = bounds.min.x as i32 + gx as i32;
            if face.synthetic_italic {
                px += ((baseline - py as f32) * SYNTHETIC_ITALIC_SHEAR).round() as i32;
            }
            for dx in 0..=spread {
                blend_pixel(surface, px + dx, py, pen.color, coverage);
            }
        });
    }
}

fn draw_underline(surface: &mut RgbaImage, pen: &TextPen<'_>, x: f32, y: f32, text_width: f32) {
    let thickness = (pen.size_px * UNDERLINE_THICKNESS_EM).max(1.0);
    let line_y = y + pen.size_px * UNDERLINE_OFFSET_EM;
    let left = (x - text_width / 2.0).round() as i32;
    let right = (x + text_width / 2.0).round() as i32;
    if right <= left {
        return;
    }
    let top = (line_y - thickness / 2.0).round() as i32;
    let rows = thickness.round().max(1.0) as u32;

    let mut layer = Blend(std::mem::take(surface));
    draw_filled_rect_mut(
        &mut layer,
        Rect::at(left, top).of_size((right - left) as u32, rows),
        pen.color,
    );
    *surface = layer.0;
}

/// Source-over blend of `color` scaled by `coverage`.
fn blend_pixel(surface: &mut RgbaImage, x: i32, y: i32, color: Rgba<u8>, coverage: f32) {
    if x < 0 || y < 0 || x as u32 >= surface.width() || y as u32 >= surface.height() {
        return;
    }
    let src_a = coverage.clamp(0.0, 1.0) * f32::from(color[3]) / 255.0;
    if src_a <= 0.0 {
        return;
    }
    let dst = surface.get_pixel_mut(x as u32, y as u32);
    let dst_a = f32::from(dst[3]) / 255.0;
    let out_a = src_a + dst_a * (1.0 - src_a);
    for c in 0..3 {
        let value =
            (f32::from(color[c]) * src_a + f32::from(dst[c]) * dst_a * (1.0 - src_a)) / out_a;
        dst[c] = value.round().clamp(0.0, 255.0) as u8;
    }
    dst[3] = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
}
