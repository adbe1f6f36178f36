/// Hue/saturation/brightness color, the authoring space of the backdrop.
///
/// - `hue` in degrees, wrapped into `[0, 360)`
/// - `saturation` and `brightness` in `[0, 1]`
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Hsb {
    pub hue: f32,
    pub saturation: f32,
    pub brightness: f32,
}

impl Hsb {
    #[inline]
    pub const fn new(hue: f32, saturation: f32, brightness: f32) -> Self {
        Self { hue, saturation, brightness }
    }

    /// Builds from percentage saturation/brightness (`0`–`100`).
    #[inline]
    pub fn from_percent(hue: f32, saturation: f32, brightness: f32) -> Self {
        Self::new(hue, saturation / 100.0, brightness / 100.0)
    }

    /// Converts to gamma-encoded sRGB components in `[0, 1]`.
    pub fn to_srgb(self) -> [f32; 3] {
        let s = self.saturation.clamp(0.0, 1.0);
        let v = self.brightness.clamp(0.0, 1.0);
        if s <= 0.0 {
            return [v, v, v];
        }

        let h = self.hue.rem_euclid(360.0) / 60.0;
        let sector = h.floor();
        let f = h - sector;
        let p = v * (1.0 - s);
        let q = v * (1.0 - s * f);
        let t = v * (1.0 - s * (1.0 - f));

        match sector as u32 {
            0 => [v, t, p],
            1 => [q, v, p],
            2 => [p, v, t],
            3 => [p, q, v],
            4 => [t, p, v],
            _ => [v, p, q],
        }
    }

    /// Converts to sRGB bytes.
    pub fn to_srgb_u8(self) -> [u8; 3] {
        let [r, g, b] = self.to_srgb();
        [unit_to_u8(r), unit_to_u8(g), unit_to_u8(b)]
    }
}

#[inline]
fn unit_to_u8(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primaries() {
        assert_eq!(Hsb::new(0.0, 1.0, 1.0).to_srgb_u8(), [255, 0, 0]);
        assert_eq!(Hsb::new(120.0, 1.0, 1.0).to_srgb_u8(), [0, 255, 0]);
        assert_eq!(Hsb::new(240.0, 1.0, 1.0).to_srgb_u8(), [0, 0, 255]);
    }

    #[test]
    fn zero_saturation_is_gray() {
        assert_eq!(Hsb::from_percent(210.0, 0.0, 50.0).to_srgb_u8(), [128, 128, 128]);
    }

    #[test]
    fn hue_wraps_around() {
        assert_eq!(Hsb::new(360.0, 1.0, 1.0).to_srgb_u8(), Hsb::new(0.0, 1.0, 1.0).to_srgb_u8());
        assert_eq!(Hsb::new(-120.0, 1.0, 1.0).to_srgb_u8(), [0, 0, 255]);
    }

    #[test]
    fn backdrop_blue_matches_reference() {
        // hsb(210, 40%, 20%) is a dark slate blue.
        assert_eq!(Hsb::from_percent(210.0, 40.0, 20.0).to_srgb_u8(), [31, 41, 51]);
    }
}
