use std::fmt;

use fontdue::layout::{
    CoordinateSystem, HorizontalAlign, Layout, LayoutSettings, TextStyle, VerticalAlign, WrapStyle,
};
use image::RgbaImage;

use crate::paint::blend_over;

/// Error returned by [`FontSystem::load_font`].
#[derive(Debug, Clone)]
pub struct FontLoadError(pub String);

impl fmt::Display for FontLoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "font load error: {}", self.0)
    }
}

impl std::error::Error for FontLoadError {}

/// Opaque handle to a font loaded into a [`FontSystem`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct FontId(pub(crate) usize);

/// A block of text to rasterize into an image.
///
/// All lengths are logical pixels; [`FontSystem::draw_text`] multiplies them
/// by its `scale` argument so high-density buffers keep the same layout.
#[derive(Debug, Clone, PartialEq)]
pub struct TextBlock<'a> {
    pub text: &'a str,
    pub size: f32,
    /// Straight-alpha sRGB fill.
    pub color: [u8; 4],
    /// Left edge of the layout box.
    pub left: f32,
    /// Width of the layout box; lines wrap at word boundaries inside it and
    /// are centered horizontally within it.
    pub width: f32,
    /// Height of the layout box starting at y = 0; lines are centered
    /// vertically within it.
    pub height: f32,
}

/// Owns a collection of loaded fonts.
///
/// Fonts are immutable after loading.
pub struct FontSystem {
    fonts: Vec<fontdue::Font>,
}

impl FontSystem {
    pub fn new() -> Self {
        Self { fonts: Vec::new() }
    }

    /// Parses and stores a TrueType or OpenType font from raw bytes.
    pub fn load_font(&mut self, bytes: &[u8]) -> Result<FontId, FontLoadError> {
        if bytes.is_empty() {
            return Err(FontLoadError("no font data".to_string()));
        }
        let font = fontdue::Font::from_bytes(bytes, fontdue::FontSettings::default())
            .map_err(|e| FontLoadError(e.to_string()))?;
        let id = FontId(self.fonts.len());
        self.fonts.push(font);
        Ok(id)
    }

    pub(crate) fn get(&self, id: FontId) -> Option<&fontdue::Font> {
        self.fonts.get(id.0)
    }

    /// Single-line advance width of `text` at `size` px.
    ///
    /// Uses the pen position after each glyph rather than the bitmap right
    /// edge, so trailing spaces and glyph overhang match what layout wraps on.
    /// Unknown fonts measure as zero.
    #[must_use]
    pub fn measure_width(&self, text: &str, id: FontId, size: f32) -> f32 {
        let Some(font) = self.get(id) else {
            return 0.0;
        };

        let mut layout: Layout<()> = Layout::new(CoordinateSystem::PositiveYDown);
        layout.reset(&LayoutSettings::default());
        layout.append(&[font], &TextStyle::new(text, size, 0));

        layout
            .glyphs()
            .iter()
            .map(|g| {
                let m = font.metrics_indexed(g.key.glyph_index, size);
                (g.x - m.xmin as f32 + m.advance_width).max(0.0)
            })
            .fold(0.0f32, f32::max)
    }

    /// Rasterizes `block` into `image`, compositing glyph coverage over the
    /// existing pixels.
    ///
    /// `scale` maps logical layout units to image pixels (the pixel density of
    /// the buffer). Glyphs falling outside the image are clipped.
    pub fn draw_text(&self, image: &mut RgbaImage, id: FontId, block: &TextBlock<'_>, scale: f32) {
        let Some(font) = self.get(id) else {
            log::warn!("draw_text: unknown {id:?}, skipping");
            return;
        };

        let scale = scale.max(0.01);
        let mut layout: Layout<()> = Layout::new(CoordinateSystem::PositiveYDown);
        layout.reset(&LayoutSettings {
            x: block.left * scale,
            y: 0.0,
            max_width: Some(block.width * scale),
            max_height: Some(block.height * scale),
            horizontal_align: HorizontalAlign::Center,
            vertical_align: VerticalAlign::Middle,
            wrap_style: WrapStyle::Word,
            ..LayoutSettings::default()
        });
        layout.append(&[font], &TextStyle::new(block.text, block.size * scale, 0));

        let [r, g, b, a] = block.color;
        let base_alpha = a as f32 / 255.0;
        let (img_w, img_h) = (image.width() as i64, image.height() as i64);

        for glyph in layout.glyphs() {
            if !glyph.char_data.rasterize() || glyph.width == 0 || glyph.height == 0 {
                continue;
            }

            let (metrics, coverage) = font.rasterize_config(glyph.key);
            let gx = glyph.x.round() as i64;
            let gy = glyph.y.round() as i64;

            for row in 0..metrics.height {
                let py = gy + row as i64;
                if py < 0 || py >= img_h {
                    continue;
                }
                for col in 0..metrics.width {
                    let px = gx + col as i64;
                    if px < 0 || px >= img_w {
                        continue;
                    }
                    let cov = coverage[row * metrics.width + col];
                    if cov == 0 {
                        continue;
                    }
                    let pixel = image.get_pixel_mut(px as u32, py as u32);
                    blend_over(&mut pixel.0, [r, g, b], base_alpha * cov as f32 / 255.0);
                }
            }
        }
    }
}

impl Default for FontSystem {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_bytes_are_rejected() {
        let mut fonts = FontSystem::new();
        let err = fonts.load_font(&[]).unwrap_err();
        assert!(err.to_string().contains("no font data"));
    }

    #[test]
    fn garbage_bytes_are_rejected() {
        let mut fonts = FontSystem::new();
        assert!(fonts.load_font(b"definitely not a font").is_err());
    }

    #[test]
    fn unknown_font_measures_zero() {
        let fonts = FontSystem::new();
        assert_eq!(fonts.measure_width("Redis", FontId(3), 24.0), 0.0);
    }

    #[test]
    fn unknown_font_leaves_image_untouched() {
        let fonts = FontSystem::new();
        let mut img = RgbaImage::new(8, 8);
        let block = TextBlock {
            text: "C++",
            size: 12.0,
            color: [32, 8, 8, 180],
            left: 0.0,
            width: 8.0,
            height: 8.0,
        };
        fonts.draw_text(&mut img, FontId(0), &block, 1.0);
        assert!(img.pixels().all(|p| p.0 == [0, 0, 0, 0]));
    }
}
