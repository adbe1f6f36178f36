//! Animated backdrop: radial gradient, nebula blobs, grain and a twinkling
//! star field, painted on the CPU into one RGBA buffer per frame.

use std::f32::consts::TAU;

use image::RgbaImage;
use noise::{NoiseFn, Perlin};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tunnel_engine::paint::{blend_over, Hsb};

use crate::config::BackgroundConfig;

/// Offset added to the background time before sampling nebula noise.
const NEBULA_TIME_OFFSET: f32 = 1000.0;

const STAR_COLOR: [u8; 3] = [255, 255, 255];

/// One background star. Positions are in buffer pixels.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Star {
    pub x: f32,
    pub y: f32,
    /// Diameter before twinkle scaling.
    pub base_size: f32,
    /// Twinkle phase in radians.
    pub phase: f32,
    /// Parallax depth in (0, 1]; nearer stars twinkle faster.
    pub depth: f32,
}

impl Star {
    /// Twinkle factor in `[0, 1]` at `elapsed_ms`.
    pub fn twinkle(&self, elapsed_ms: f64) -> f32 {
        let arg = elapsed_ms * 0.004 / self.depth as f64 + self.phase as f64;
        ((arg.sin() + 1.0) * 0.5) as f32
    }
}

/// Star positions for one buffer size.
#[derive(Debug, Clone, Default)]
pub struct StarField {
    pub width: u32,
    pub height: u32,
    pub stars: Vec<Star>,
}

impl StarField {
    pub fn generate(rng: &mut impl Rng, count: u32, width: u32, height: u32) -> Self {
        let (w, h) = (width as f32, height as f32);
        let stars = (0..count)
            .map(|_| Star {
                x: rng.random::<f32>() * w,
                y: rng.random::<f32>() * h,
                base_size: rng.random_range(0.5..2.5),
                phase: rng.random::<f32>() * TAU,
                depth: rng.random_range(0.1..=1.0),
            })
            .collect();

        Self { width, height, stars }
    }

    pub fn all_in_bounds(&self) -> bool {
        let (w, h) = (self.width as f32, self.height as f32);
        self.stars
            .iter()
            .all(|s| s.x >= 0.0 && s.x < w.max(1.0) && s.y >= 0.0 && s.y < h.max(1.0))
    }
}

/// Owns the backdrop buffer and everything needed to repaint it.
pub struct BackgroundPainter {
    config: BackgroundConfig,
    rng: ChaCha8Rng,
    noise: Perlin,
    /// Composite color for pixels covered by the first `i` gradient rings.
    gradient: Vec<[u8; 4]>,
    image: RgbaImage,
    stars: StarField,
}

impl BackgroundPainter {
    pub fn new(config: BackgroundConfig, seed: u64) -> Self {
        let gradient = gradient_lut(config.gradient_rings);
        Self {
            config,
            rng: ChaCha8Rng::seed_from_u64(seed),
            noise: Perlin::new(seed as u32),
            gradient,
            image: RgbaImage::new(1, 1),
            stars: StarField::default(),
        }
    }

    /// Reallocates the buffer and regenerates the star field for a new size.
    pub fn resize(&mut self, width: u32, height: u32) {
        let (width, height) = (width.max(1), height.max(1));
        if self.image.dimensions() == (width, height) && !self.stars.stars.is_empty() {
            return;
        }

        self.image = RgbaImage::new(width, height);
        self.stars = StarField::generate(&mut self.rng, self.config.star_count, width, height);
        log::debug!(
            "background buffer {width}x{height}, {} stars",
            self.stars.stars.len()
        );
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn stars(&self) -> &StarField {
        &self.stars
    }

    /// Repaints the whole buffer for background time `t`.
    pub fn paint(&mut self, t: f32, elapsed_ms: f64) {
        self.paint_gradient();
        self.paint_nebula(t + NEBULA_TIME_OFFSET);
        self.paint_grain();
        self.paint_stars(t, elapsed_ms);
    }

    fn paint_gradient(&mut self) {
        let rings = self.config.gradient_rings;
        let (w, h) = self.image.dimensions();
        let (hw, hh) = (w as f32 / 2.0, h as f32 / 2.0);

        for (x, y, px) in self.image.enumerate_pixels_mut() {
            let nx = (x as f32 + 0.5 - hw) / hw;
            let ny = (y as f32 + 0.5 - hh) / hh;
            let d = (nx * nx + ny * ny).sqrt();
            px.0 = self.gradient[rings_covering(d, rings)];
        }
    }

    fn paint_nebula(&mut self, t: f32) {
        let (w, h) = self.image.dimensions();
        let (w, h) = (w as f32, h as f32);

        for layer in 0..self.config.nebula_layers {
            let l = layer as f32;
            let cx = w * (0.2 + 0.6 * smooth_noise(&self.noise, (t * 0.0003 + l) as f64));
            let cy = h * (0.3 + 0.4 * smooth_noise(&self.noise, (t * 0.0004 + l + 5.0) as f64));
            let max_r = w * (0.25 + l * 0.08);
            let hue = map_range(l, 0.0, 4.0, 200.0, 320.0);
            let alpha_base = map_range(l, 0.0, 4.0, 30.0, 80.0);

            for _ in 0..self.config.blobs_per_layer {
                let r = max_r * self.rng.random::<f32>().powf(1.6);
                let ang = self.rng.random::<f32>() * TAU;
                let px = cx + ang.cos() * r * self.rng.random_range(0.2..1.0);
                let py = cy + ang.sin() * r * self.rng.random_range(0.2..1.0);
                let diameter = self.rng.random_range(40.0..220.0);
                let alpha = alpha_base * (1.0 - r / max_r) * 0.9;
                let color =
                    Hsb::from_percent(hue - self.rng.random_range(10.0..40.0), 80.0, 90.0).to_srgb_u8();

                fill_disc(&mut self.image, px, py, diameter / 2.0, color, alpha / 255.0);
            }
        }
    }

    fn paint_grain(&mut self) {
        let (w, h) = self.image.dimensions();
        let color = Hsb::from_percent(260.0, 20.0, 95.0).to_srgb_u8();

        for _ in 0..self.config.grain_dots {
            let x = self.rng.random::<f32>() * w as f32;
            let y = self.rng.random::<f32>() * h as f32;
            let diameter = self.rng.random_range(0.5..1.5);
            fill_disc(&mut self.image, x, y, diameter / 2.0, color, 10.0 / 255.0);
        }
    }

    fn paint_stars(&mut self, t: f32, elapsed_ms: f64) {
        for s in &self.stars.stars {
            let tw = s.twinkle(elapsed_ms);
            let size = s.base_size * (0.6 + tw * 1.4);
            let alpha = map_range(tw, 0.0, 1.0, 100.0, 255.0) * (0.9 + 0.1 * (1.0 - s.depth));
            let x = s.x + ((t + s.phase) * 0.0008).sin() * 1.5;
            let y = s.y + ((t + s.phase) * 0.0006).cos() * 1.5;
            fill_disc(&mut self.image, x, y, size / 2.0, STAR_COLOR, alpha / 255.0);
        }
    }
}

/// Number of gradient rings covering a pixel at normalized elliptical
/// distance `d` from the center. Ring `i` spans `d <= 1 - i / rings`.
fn rings_covering(d: f32, rings: u32) -> usize {
    if d.is_nan() || d > 1.0 {
        return 0;
    }
    let covered = ((1.0 - d) * rings as f32).floor() as usize + 1;
    covered.min(rings as usize)
}

/// Cumulative source-over composite of the first `i` rings, for every `i`.
fn gradient_lut(rings: u32) -> Vec<[u8; 4]> {
    let mut lut = Vec::with_capacity(rings as usize + 1);
    let mut px = [0u8; 4];
    lut.push(px);

    for i in 0..rings {
        let r = i as f32 / rings as f32;
        let brightness = 10.0 + (25.0 - 10.0) * r;
        let color = Hsb::from_percent(210.0 + r * 40.0, 40.0, brightness).to_srgb_u8();
        let alpha = map_range(r, 0.0, 1.0, 30.0, 180.0) / 255.0;
        blend_over(&mut px, color, alpha);
        lut.push(px);
    }

    lut
}

/// Fractal 1D noise in `[0, 1]`: four octaves, amplitude halved per octave.
fn smooth_noise(noise: &Perlin, x: f64) -> f32 {
    let mut total = 0.0;
    let mut norm = 0.0;
    let mut amplitude = 0.5;
    let mut frequency = 1.0;

    for _ in 0..4 {
        total += noise.get([x * frequency, 0.5]) * amplitude;
        norm += amplitude;
        amplitude *= 0.5;
        frequency *= 2.0;
    }

    ((total / norm + 1.0) * 0.5).clamp(0.0, 1.0) as f32
}

fn map_range(v: f32, a0: f32, a1: f32, b0: f32, b1: f32) -> f32 {
    b0 + (v - a0) / (a1 - a0) * (b1 - b0)
}

/// Anti-aliased filled circle, composited source-over.
fn fill_disc(image: &mut RgbaImage, cx: f32, cy: f32, radius: f32, color: [u8; 3], alpha: f32) {
    if radius <= 0.0 || alpha <= 0.0 {
        return;
    }

    let (w, h) = image.dimensions();
    let x0 = (cx - radius - 1.0).floor().clamp(0.0, w as f32) as u32;
    let x1 = (cx + radius + 1.0).ceil().clamp(0.0, w as f32) as u32;
    let y0 = (cy - radius - 1.0).floor().clamp(0.0, h as f32) as u32;
    let y1 = (cy + radius + 1.0).ceil().clamp(0.0, h as f32) as u32;

    for py in y0..y1 {
        for px in x0..x1 {
            let dx = px as f32 + 0.5 - cx;
            let dy = py as f32 + 0.5 - cy;
            let coverage = (radius - (dx * dx + dy * dy).sqrt() + 0.5).clamp(0.0, 1.0);
            if coverage > 0.0 {
                blend_over(&mut image.get_pixel_mut(px, py).0, color, alpha * coverage);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> BackgroundConfig {
        BackgroundConfig {
            blobs_per_layer: 4,
            grain_dots: 50,
            star_count: 40,
            ..BackgroundConfig::default()
        }
    }

    #[test]
    fn resize_matches_viewport() {
        let mut bg = BackgroundPainter::new(small_config(), 1);
        bg.resize(320, 200);
        assert_eq!(bg.image().dimensions(), (320, 200));
        assert_eq!(bg.stars().width, 320);
        assert_eq!(bg.stars().stars.len(), 40);
        assert!(bg.stars().all_in_bounds());

        bg.resize(64, 480);
        assert_eq!(bg.image().dimensions(), (64, 480));
        assert_eq!((bg.stars().width, bg.stars().height), (64, 480));
        assert!(bg.stars().all_in_bounds());
    }

    #[test]
    fn zero_size_is_clamped() {
        let mut bg = BackgroundPainter::new(small_config(), 1);
        bg.resize(0, 0);
        assert_eq!(bg.image().dimensions(), (1, 1));
        bg.paint(0.0, 0.0);
    }

    #[test]
    fn ring_coverage() {
        assert_eq!(rings_covering(0.0, 100), 100);
        assert_eq!(rings_covering(1.0, 100), 1);
        assert_eq!(rings_covering(1.01, 100), 0);
        assert_eq!(rings_covering(0.5, 100), 51);
        assert_eq!(rings_covering(f32::NAN, 100), 0);
    }

    #[test]
    fn gradient_builds_up_toward_the_center() {
        let lut = gradient_lut(100);
        assert_eq!(lut.len(), 101);
        assert_eq!(lut[0], [0, 0, 0, 0]);
        assert_eq!(lut[1][3], 30);
        for pair in lut.windows(2) {
            assert!(pair[1][3] >= pair[0][3]);
        }
        assert!(lut[100][3] > 250);
    }

    #[test]
    fn gradient_leaves_corners_clear() {
        let mut bg = BackgroundPainter::new(small_config(), 1);
        bg.resize(100, 60);
        bg.paint_gradient();
        assert_eq!(bg.image().get_pixel(0, 0).0[3], 0);
        assert!(bg.image().get_pixel(50, 30).0[3] > 250);
    }

    #[test]
    fn twinkle_stays_in_unit_range() {
        let star = Star { x: 0.0, y: 0.0, base_size: 1.0, phase: 1.3, depth: 0.2 };
        for ms in [0.0, 16.7, 1234.5, 99_999.0] {
            let tw = star.twinkle(ms);
            assert!((0.0..=1.0).contains(&tw));
        }
    }

    #[test]
    fn painting_is_deterministic_per_seed() {
        let mut a = BackgroundPainter::new(small_config(), 7);
        let mut b = BackgroundPainter::new(small_config(), 7);
        a.resize(80, 60);
        b.resize(80, 60);
        a.paint(0.4, 16.0);
        b.paint(0.4, 16.0);
        assert_eq!(a.image().as_raw(), b.image().as_raw());
    }

    #[test]
    fn noise_is_normalized() {
        let perlin = Perlin::new(3);
        for i in 0..200 {
            let v = smooth_noise(&perlin, i as f64 * 0.37);
            assert!((0.0..=1.0).contains(&v));
        }
    }

    #[test]
    fn disc_clips_at_edges() {
        let mut img = RgbaImage::new(8, 8);
        fill_disc(&mut img, -1.0, -1.0, 3.0, [255, 0, 0], 1.0);
        fill_disc(&mut img, 100.0, 100.0, 3.0, [255, 0, 0], 1.0);
        assert!(img.get_pixel(0, 0).0[3] > 0);
        assert_eq!(img.get_pixel(7, 7).0[3], 0);
    }
}
