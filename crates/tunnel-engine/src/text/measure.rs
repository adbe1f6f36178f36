use super::{FontId, FontSystem};

/// Width measurement used by layout decisions such as font-size fitting.
///
/// Kept as a trait so fitting logic can run against a real font or against
/// an estimate when no font is available (headless tests, missing fonts).
pub trait TextMeasure {
    /// Returns the advance width of `text` set on a single line at `size` px.
    fn text_width(&self, text: &str, size: f32) -> f32;
}

/// Measures with a font loaded into a [`FontSystem`].
#[derive(Copy, Clone)]
pub struct FontMeasure<'a> {
    pub fonts: &'a FontSystem,
    pub id: FontId,
}

impl TextMeasure for FontMeasure<'_> {
    fn text_width(&self, text: &str, size: f32) -> f32 {
        self.fonts.measure_width(text, self.id, size)
    }
}

/// Font-free estimate: every character advances `em_ratio × size`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct AdvanceEstimate {
    pub em_ratio: f32,
}

impl Default for AdvanceEstimate {
    /// 0.55 em is close to the average advance of common sans-serif faces.
    fn default() -> Self {
        Self { em_ratio: 0.55 }
    }
}

impl TextMeasure for AdvanceEstimate {
    fn text_width(&self, text: &str, size: f32) -> f32 {
        text.chars().count() as f32 * size * self.em_ratio
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn estimate_scales_with_length_and_size() {
        let est = AdvanceEstimate { em_ratio: 0.5 };
        assert_eq!(est.text_width("abcd", 10.0), 20.0);
        assert_eq!(est.text_width("abcd", 20.0), 40.0);
        assert_eq!(est.text_width("", 20.0), 0.0);
    }

    #[test]
    fn estimate_counts_chars_not_bytes() {
        let est = AdvanceEstimate { em_ratio: 1.0 };
        assert_eq!(est.text_width("é&ü", 1.0), 3.0);
    }
}
