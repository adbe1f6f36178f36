//! Label texture generation.
//!
//! Runs once at startup. Each label becomes a square, transparent RGBA image
//! with the text centered in a box and auto-shrunk to fit.

use image::RgbaImage;
use tunnel_engine::text::{AdvanceEstimate, FontId, FontMeasure, FontSystem, TextBlock, TextMeasure};

use crate::config::LabelStyle;

/// Picks the largest font size that fits `max_width` on one line.
///
/// Starts at `start` and steps down by `step` while the text is too wide and
/// the size is above `floor`. When nothing fits, the floor is returned; the
/// text then overflows, which is accepted.
pub fn fit_font_size(
    text: &str,
    max_width: f32,
    start: f32,
    floor: f32,
    step: f32,
    measure: &impl TextMeasure,
) -> f32 {
    if step <= 0.0 {
        return start.max(floor);
    }

    let mut size = start;
    while size > floor && measure.text_width(text, size) > max_width {
        size -= step;
    }
    size.max(floor)
}

/// One rendered label.
#[derive(Debug, Clone)]
pub struct LabelTexture {
    pub text: String,
    pub font_size: f32,
    pub image: RgbaImage,
}

/// Renders labels with a loaded font, or transparent placeholders without one.
pub struct LabelGenerator<'a> {
    style: &'a LabelStyle,
    font: Option<(&'a FontSystem, FontId)>,
}

impl<'a> LabelGenerator<'a> {
    pub fn new(style: &'a LabelStyle, font: Option<(&'a FontSystem, FontId)>) -> Self {
        Self { style, font }
    }

    /// Produces one texture per label, in input order.
    pub fn generate(&self, labels: &[String]) -> Vec<LabelTexture> {
        if self.font.is_none() {
            log::warn!("no font loaded; {} label texture(s) will be blank", labels.len());
        }

        labels.iter().map(|text| self.render_one(text)).collect()
    }

    fn render_one(&self, text: &str) -> LabelTexture {
        let style = self.style;
        let w = style.texture_size as f32;
        let max_width = w * style.fit_ratio;
        let start = style.start_font_size();

        let font_size = match self.font {
            Some((fonts, id)) => fit_font_size(
                text,
                max_width,
                start,
                style.min_font_size,
                style.font_step,
                &FontMeasure { fonts, id },
            ),
            None => fit_font_size(
                text,
                max_width,
                start,
                style.min_font_size,
                style.font_step,
                &AdvanceEstimate::default(),
            ),
        };

        let side = style.raster_size();
        let mut image = RgbaImage::new(side, side);

        if let Some((fonts, id)) = self.font {
            let block = TextBlock {
                text,
                size: font_size,
                color: style.color,
                left: w * style.x_shift,
                width: w * style.box_ratio,
                height: w,
            };
            fonts.draw_text(&mut image, id, &block, style.pixel_density);
        }

        log::info!("label {text:?}: font size {font_size}");

        LabelTexture {
            text: text.to_string(),
            font_size,
            image,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// One unit of width per character per unit of size.
    struct PerChar;

    impl TextMeasure for PerChar {
        fn text_width(&self, text: &str, size: f32) -> f32 {
            text.chars().count() as f32 * size
        }
    }

    #[test]
    fn short_text_keeps_start_size() {
        // 2 chars * 32 = 64 <= 217.6
        assert_eq!(fit_font_size("Hi", 217.6, 32.0, 12.0, 2.0, &PerChar), 32.0);
    }

    #[test]
    fn picks_largest_step_that_fits() {
        // 10 chars: needs size <= 21.76 -> 20 is the first step at or below.
        assert_eq!(fit_font_size("abcdefghij", 217.6, 32.0, 12.0, 2.0, &PerChar), 20.0);
    }

    #[test]
    fn falls_back_to_floor_when_nothing_fits() {
        let long = "x".repeat(100);
        assert_eq!(fit_font_size(&long, 217.6, 32.0, 12.0, 2.0, &PerChar), 12.0);
    }

    #[test]
    fn floor_is_respected_when_step_overshoots() {
        let long = "x".repeat(100);
        assert_eq!(fit_font_size(&long, 10.0, 31.0, 12.0, 4.0, &PerChar), 12.0);
    }

    #[test]
    fn chosen_size_is_a_step_from_start() {
        let est = AdvanceEstimate::default();
        for text in ["C++", "Engineer @ MathWorks", "Cycling & Games", "PostgreSQL"] {
            let size = fit_font_size(text, 217.6, 32.0, 12.0, 2.0, &est);
            assert_eq!((32.0 - size) % 2.0, 0.0, "{text}");
            assert!(size >= 12.0);
            if size > 12.0 {
                assert!(est.text_width(text, size) <= 217.6);
                assert!(size == 32.0 || est.text_width(text, size + 2.0) > 217.6);
            }
        }
    }

    #[test]
    fn blank_textures_without_font_keep_order_and_size() {
        let style = LabelStyle { texture_size: 64, pixel_density: 1.5, ..LabelStyle::default() };
        let labels = vec!["one".to_string(), "two".to_string()];
        let out = LabelGenerator::new(&style, None).generate(&labels);

        assert_eq!(out.len(), 2);
        assert_eq!(out[0].text, "one");
        assert_eq!(out[1].text, "two");
        assert_eq!(out[0].image.dimensions(), (96, 96));
        assert!(out[0].image.pixels().all(|p| p.0[3] == 0));
    }
}
