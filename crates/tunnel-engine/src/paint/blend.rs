//! CPU-side compositing for straight-alpha RGBA8 image buffers.

/// Composites `src` (straight sRGB) with coverage `alpha` in `[0, 1]` over
/// `dst` using the source-over operator.
///
/// Blending happens on gamma-encoded values, which is what 2D canvas APIs do
/// and what the backdrop and label art are tuned for.
#[inline]
pub fn blend_over(dst: &mut [u8; 4], src: [u8; 3], alpha: f32) {
    let sa = alpha.clamp(0.0, 1.0);
    if sa <= 0.0 {
        return;
    }

    let da = dst[3] as f32 / 255.0;
    let out_a = sa + da * (1.0 - sa);
    if out_a <= 0.0 {
        return;
    }

    let dst_w = da * (1.0 - sa);
    for c in 0..3 {
        let v = (src[c] as f32 * sa + dst[c] as f32 * dst_w) / out_a;
        dst[c] = v.round().clamp(0.0, 255.0) as u8;
    }
    dst[3] = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opaque_source_replaces_destination() {
        let mut px = [10, 20, 30, 255];
        blend_over(&mut px, [200, 100, 50], 1.0);
        assert_eq!(px, [200, 100, 50, 255]);
    }

    #[test]
    fn zero_alpha_is_noop() {
        let mut px = [10, 20, 30, 40];
        blend_over(&mut px, [200, 100, 50], 0.0);
        assert_eq!(px, [10, 20, 30, 40]);
    }

    #[test]
    fn over_transparent_keeps_source_color() {
        let mut px = [0, 0, 0, 0];
        blend_over(&mut px, [32, 8, 8], 180.0 / 255.0);
        assert_eq!(px, [32, 8, 8, 180]);
    }

    #[test]
    fn half_over_opaque_averages() {
        let mut px = [0, 0, 0, 255];
        blend_over(&mut px, [200, 100, 50], 0.5);
        assert_eq!(px, [100, 50, 25, 255]);
    }
}
