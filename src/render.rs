//! Text-run rasterizer for the preview pane.
//!
//! The run is laid out in one pass (advances plus optional pair kerning) to
//! size the canvas, then drawn glyph by glyph in a second pass. Points map to
//! pixels one to one. Nothing is cached; every call renders from scratch and
//! identical inputs give identical bytes.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use image::{Rgba, RgbaImage};
use swash::scale::image::{Content, Image};
use swash::scale::{Render, ScaleContext, Scaler, Source, StrikeWith};
use swash::zeno::{Format, Transform};
use swash::FontRef;

use crate::error::RenderError;

/// Transparent border around the glyph run, in pixels.
pub const MARGIN: u32 = 4;

pub const MIN_SIZE: u32 = 6;
pub const MAX_SIZE: u32 = 92;

/// 5-tap LCD filter weights, summing to 256.
pub const LCD_FILTER: [u32; 5] = [0x08, 0x4D, 0x56, 0x4D, 0x08];

/// Sub-pixels added on each side of an oversampled row before filtering.
const LCD_PAD: usize = 2;

const SOURCES: &[Source] = &[Source::Outline, Source::Bitmap(StrikeWith::BestFit)];

// ─── OPTIONS ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl TextColor {
    pub const BLACK: TextColor = TextColor { r: 0, g: 0, b: 0 };

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl Default for TextColor {
    fn default() -> Self {
        Self::BLACK
    }
}

impl FromStr for TextColor {
    type Err = RenderError;

    /// Parses `#rrggbb` (the leading `#` is optional).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || RenderError::InvalidColor(s.to_string());
        let hex = s.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(invalid());
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| invalid());
        Ok(Self::new(channel(0)?, channel(2)?, channel(4)?))
    }
}

impl fmt::Display for TextColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    /// Point size; rendered at the same number of pixels.
    pub size: u32,
    pub color: TextColor,
    pub lcd: bool,
    pub auto_hint: bool,
    pub kerning: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            size: 36,
            color: TextColor::BLACK,
            lcd: false,
            auto_hint: true,
            kerning: true,
        }
    }
}

/// A rendered text run.
#[derive(Debug, Clone)]
pub struct RenderedText {
    pub image: RgbaImage,
    /// Pen x of every glyph, canvas coordinates, after kerning.
    pub pen_positions: Vec<i32>,
    pub ascender: i32,
    /// Negative below the baseline.
    pub descender: i32,
    /// Glyphs that could not be rasterized or composited.
    pub skipped: usize,
}

// ─── KERNING ────────────────────────────────────────────────────

/// Pair kerning from the legacy `kern` table.
struct Kerning<'a> {
    face: ttf_parser::Face<'a>,
    scale: f32,
}

impl<'a> Kerning<'a> {
    fn new(data: &'a [u8], px: f32) -> Option<Self> {
        let face = ttf_parser::Face::parse(data, 0).ok()?;
        if face.tables().kern.is_none() {
            return None;
        }
        let scale = px / f32::from(face.units_per_em());
        Some(Self { face, scale })
    }

    fn pair(&self, left: u16, right: u16) -> i32 {
        let Some(kern) = self.face.tables().kern.as_ref() else {
            return 0;
        };
        let units: i32 = kern
            .subtables
            .into_iter()
            .filter(|s| s.horizontal && !s.variable)
            .filter_map(|s| {
                s.glyphs_kerning(ttf_parser::GlyphId(left), ttf_parser::GlyphId(right))
            })
            .map(i32::from)
            .sum();
        (units as f32 * self.scale).round() as i32
    }
}

// ─── RENDER ─────────────────────────────────────────────────────

fn read_font(path: &Path) -> Result<Vec<u8>, RenderError> {
    if !path.is_file() {
        return Err(RenderError::FontNotFound(path.to_path_buf()));
    }
    std::fs::read(path).map_err(|source| RenderError::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// Render `text` with the font at `font_path`.
pub fn render_text(
    font_path: &Path,
    text: &str,
    opts: &RenderOptions,
) -> Result<RenderedText, RenderError> {
    let data = read_font(font_path)?;
    let font = FontRef::from_index(&data, 0)
        .ok_or_else(|| RenderError::InvalidFont(font_path.to_path_buf()))?;
    let px = opts.size.max(1) as f32;
    let kerning = if opts.kerning {
        Kerning::new(&data, px)
    } else {
        None
    };

    // First pass: glyph ids, pen positions and total advance.
    let charmap = font.charmap();
    let advances = font.glyph_metrics(&[]).scale(px);
    let mut glyphs = Vec::with_capacity(text.len());
    let mut pen_x = 0i32;
    let mut prev: Option<u16> = None;
    for ch in text.chars() {
        let gid = charmap.map(ch);
        if let (Some(kern), Some(left)) = (&kerning, prev) {
            pen_x += kern.pair(left, gid);
        }
        glyphs.push((gid, pen_x));
        pen_x += advances.advance_width(gid).round() as i32;
        prev = Some(gid);
    }
    let run_width = pen_x.max(0) as u32;

    let metrics = font.metrics(&[]).scale(px);
    let ascender = metrics.ascent.round() as i32;
    let descender = -(metrics.descent.round() as i32);
    let run_height = (ascender - descender).max(0) as u32;

    // Second pass: rasterize and composite.
    let mut canvas = RgbaImage::new(run_width + 2 * MARGIN, run_height + 2 * MARGIN);
    let baseline = MARGIN as i32 + ascender;
    let mut context = ScaleContext::new();
    let mut scaler = context.builder(font).size(px).hint(opts.auto_hint).build();
    let mut pen_positions = Vec::with_capacity(glyphs.len());
    let mut skipped = 0;

    for &(gid, offset) in &glyphs {
        let pen = MARGIN as i32 + offset;
        pen_positions.push(pen);
        let Some(glyph) = rasterize(&mut scaler, gid, opts.lcd) else {
            tracing::debug!("Glyph {gid} not rasterized");
            skipped += 1;
            continue;
        };
        if glyph.placement.width == 0 || glyph.placement.height == 0 {
            continue;
        }
        if let Err(e) = draw_glyph(&mut canvas, &glyph, pen, baseline, opts) {
            tracing::warn!("Glyph {gid} skipped: {e}");
            skipped += 1;
        }
    }

    Ok(RenderedText {
        image: canvas,
        pen_positions,
        ascender,
        descender,
        skipped,
    })
}

fn rasterize(scaler: &mut Scaler<'_>, gid: u16, lcd: bool) -> Option<Image> {
    let mut render = Render::new(SOURCES);
    render.format(Format::Alpha);
    if lcd {
        render.transform(Some(Transform::scale(3.0, 1.0)));
    }
    let image = render.render(scaler, gid)?;
    matches!(image.content, Content::Mask).then_some(image)
}

fn draw_glyph(
    canvas: &mut RgbaImage,
    glyph: &Image,
    pen: i32,
    baseline: i32,
    opts: &RenderOptions,
) -> Result<(), RenderError> {
    let p = &glyph.placement;
    let y = baseline - p.top;
    if opts.lcd {
        let mask = SubpixelMask::from_oversampled(
            &glyph.data,
            p.width as usize,
            p.height as usize,
            p.left,
        )?;
        paste_lcd_glyph(canvas, &mask, pen + mask.left, y, opts.color)
    } else {
        let patch = coverage_patch(&glyph.data, p.width, p.height, opts.color)?;
        paste_glyph(canvas, &patch, pen + p.left, y);
        Ok(())
    }
}

/// Solid-color patch whose alpha is the 8-bit coverage mask.
pub fn coverage_patch(
    coverage: &[u8],
    width: u32,
    height: u32,
    color: TextColor,
) -> Result<RgbaImage, RenderError> {
    let expected = width as usize * height as usize;
    if coverage.len() < expected {
        return Err(RenderError::BufferTooSmall {
            actual: coverage.len(),
            expected,
        });
    }
    Ok(RgbaImage::from_fn(width, height, |x, y| {
        let a = coverage[(y * width + x) as usize];
        Rgba([color.r, color.g, color.b, a])
    }))
}

/// Source-over composite of `patch` at `(x, y)`, clipped to the canvas.
pub fn paste_glyph(canvas: &mut RgbaImage, patch: &RgbaImage, x: i32, y: i32) {
    image::imageops::overlay(canvas, patch, i64::from(x), i64::from(y));
}

// ─── LCD ────────────────────────────────────────────────────────

/// One byte per sub-pixel, three sub-pixels (R, G, B) per output pixel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubpixelMask {
    /// Row length in sub-pixels.
    pub width: usize,
    pub rows: usize,
    /// Bytes per row in `buffer`.
    pub pitch: usize,
    /// Left bearing in whole pixels.
    pub left: i32,
    pub buffer: Vec<u8>,
}

impl SubpixelMask {
    /// Filter a 3x horizontally oversampled coverage mask and align it to
    /// whole pixels. `left` is the bearing in sub-pixels.
    pub fn from_oversampled(
        data: &[u8],
        width: usize,
        rows: usize,
        left: i32,
    ) -> Result<Self, RenderError> {
        let expected = width * rows;
        if data.len() < expected {
            return Err(RenderError::BufferTooSmall {
                actual: data.len(),
                expected,
            });
        }
        let padded_left = left - LCD_PAD as i32;
        let shift = padded_left.rem_euclid(3) as usize;
        let filtered_width = width + 2 * LCD_PAD;
        let out_width = (shift + filtered_width).div_ceil(3) * 3;

        let mut buffer = vec![0u8; out_width * rows];
        for r in 0..rows {
            let src = &data[r * width..(r + 1) * width];
            let dst = &mut buffer[r * out_width + shift..r * out_width + shift + filtered_width];
            lcd_filter_row(src, dst);
        }
        Ok(Self {
            width: out_width,
            rows,
            pitch: out_width,
            left: (padded_left - shift as i32).div_euclid(3),
            buffer,
        })
    }

    /// Width in whole pixels.
    pub fn pixel_width(&self) -> usize {
        self.width / 3
    }
}

/// Apply [`LCD_FILTER`] to one row. `out` must be `src.len() + 4` long; each
/// source sub-pixel spreads over the five outputs centred on it.
pub fn lcd_filter_row(src: &[u8], out: &mut [u8]) {
    let taps = LCD_FILTER.len();
    for (i, o) in out.iter_mut().enumerate() {
        let mut acc = 0u32;
        for (k, &w) in LCD_FILTER.iter().enumerate() {
            // out[i] gathers src[i + k - 4]
            let j = i + k;
            if j >= taps - 1 && j - (taps - 1) < src.len() {
                acc += w * u32::from(src[j - (taps - 1)]);
            }
        }
        *o = ((acc + 128) >> 8).min(255) as u8;
    }
}

/// Turn a sub-pixel mask into an RGBA patch: each channel is scaled by the
/// text color and alpha is the strongest of the three raw channels.
pub fn composite_lcd(mask: &SubpixelMask, color: TextColor) -> Result<RgbaImage, RenderError> {
    if mask.width % 3 != 0 {
        return Err(RenderError::LcdWidth(mask.width));
    }
    if mask.pitch < mask.width {
        return Err(RenderError::LcdPitch {
            pitch: mask.pitch,
            width: mask.width,
        });
    }
    let expected = mask.rows * mask.pitch;
    if mask.buffer.len() < expected {
        return Err(RenderError::BufferTooSmall {
            actual: mask.buffer.len(),
            expected,
        });
    }

    let scale = |c: u8, k: u8| ((u32::from(c) * u32::from(k)) / 255).min(255) as u8;
    let px_width = mask.pixel_width();
    let mut patch = RgbaImage::new(px_width as u32, mask.rows as u32);
    for (y, row) in mask.buffer.chunks(mask.pitch).take(mask.rows).enumerate() {
        let row = &row[..mask.width];
        let reds = row.iter().step_by(3);
        let greens = row.iter().skip(1).step_by(3);
        let blues = row.iter().skip(2).step_by(3);
        for (x, ((&r, &g), &b)) in reds.zip(greens).zip(blues).enumerate() {
            patch.put_pixel(
                x as u32,
                y as u32,
                Rgba([
                    scale(r, color.r),
                    scale(g, color.g),
                    scale(b, color.b),
                    r.max(g).max(b),
                ]),
            );
        }
    }
    Ok(patch)
}

/// Validate and composite an LCD glyph. On error the canvas is untouched.
pub fn paste_lcd_glyph(
    canvas: &mut RgbaImage,
    mask: &SubpixelMask,
    x: i32,
    y: i32,
    color: TextColor,
) -> Result<(), RenderError> {
    let patch = composite_lcd(mask, color)?;
    paste_glyph(canvas, &patch, x, y);
    Ok(())
}
