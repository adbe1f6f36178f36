/// Viewport size in logical pixels.
///
/// Everything size-dependent in the sketch (grid layout, camera distance,
/// background buffer, star field) is derived from this value.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    #[inline]
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    #[inline]
    pub fn is_valid(self) -> bool {
        self.width > 0.0 && self.height > 0.0 && self.width.is_finite() && self.height.is_finite()
    }

    /// Smaller of the two dimensions.
    #[inline]
    pub fn min_side(self) -> f32 {
        self.width.min(self.height)
    }

    /// Larger of the two dimensions.
    #[inline]
    pub fn max_side(self) -> f32 {
        self.width.max(self.height)
    }

    /// Width over height; 1.0 for degenerate viewports.
    #[inline]
    pub fn aspect(self) -> f32 {
        if self.is_valid() { self.width / self.height } else { 1.0 }
    }

    /// Whole-pixel dimensions for CPU buffers covering the viewport.
    ///
    /// Fractional logical sizes (odd DPI scales) round to the nearest pixel and
    /// never go below 1.
    #[inline]
    pub fn pixel_size(self) -> (u32, u32) {
        let w = if self.width.is_finite() { self.width.round().max(1.0) } else { 1.0 };
        let h = if self.height.is_finite() { self.height.round().max(1.0) } else { 1.0 };
        (w as u32, h as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn min_and_max_side() {
        let v = Viewport::new(1280.0, 720.0);
        assert_eq!(v.min_side(), 720.0);
        assert_eq!(v.max_side(), 1280.0);
    }

    #[test]
    fn aspect_of_degenerate_viewport_is_one() {
        assert_eq!(Viewport::new(0.0, 720.0).aspect(), 1.0);
        assert_eq!(Viewport::new(f32::NAN, 10.0).aspect(), 1.0);
    }

    #[test]
    fn pixel_size_rounds_and_clamps() {
        assert_eq!(Viewport::new(799.6, 600.2).pixel_size(), (800, 600));
        assert_eq!(Viewport::new(0.0, 0.0).pixel_size(), (1, 1));
    }
}
