//! Sketch configuration.
//!
//! Everything is fixed at startup. `SketchConfig::validate` is the only gate;
//! the rest of the crate assumes a validated config.

use std::fmt;
use std::str::FromStr;

/// Labels shown on the face-center cubes when none are configured.
pub const DEFAULT_LABELS: [&str; 17] = [
    "BTech CSE",
    "Engineer @ MathWorks",
    "Django",
    "C++",
    "Python",
    "Qt Core",
    "Redis",
    "PostgreSQL",
    "SQLite",
    "NDS.Live",
    "MATLAB",
    "JavaScript",
    "Docker",
    "Kubernetes",
    "Cybersecurity",
    "InfoSec",
    "Cycling & Games",
];

/// Background rendering mode.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum BackgroundVariant {
    /// Gradient, nebula, grain and twinkling stars regenerated every frame.
    #[default]
    Animated,
    /// Plain clear color, no backdrop.
    Flat,
}

impl FromStr for BackgroundVariant {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "animated" => Ok(Self::Animated),
            "flat" => Ok(Self::Flat),
            other => Err(ConfigError::UnknownBackground(other.to_string())),
        }
    }
}

/// Parameters of the label textures.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelStyle {
    /// Logical edge length of the square texture.
    pub texture_size: u32,
    /// Raster pixels per logical unit.
    pub pixel_density: f32,
    pub max_font_size: f32,
    pub min_font_size: f32,
    pub font_step: f32,
    /// Fraction of the texture width a single line may occupy.
    pub fit_ratio: f32,
    /// Left edge of the text box as a fraction of the texture width.
    pub x_shift: f32,
    /// Width of the text box as a fraction of the texture width.
    pub box_ratio: f32,
    /// Straight-alpha sRGB text color.
    pub color: [u8; 4],
}

impl Default for LabelStyle {
    fn default() -> Self {
        Self {
            texture_size: 256,
            pixel_density: 2.0,
            max_font_size: 48.0,
            min_font_size: 12.0,
            font_step: 2.0,
            fit_ratio: 0.85,
            x_shift: 0.1,
            box_ratio: 0.8,
            color: [32, 8, 8, 180],
        }
    }
}

impl LabelStyle {
    /// First size tried by the fit loop: `min(max_font_size, floor(W / 8))`.
    pub fn start_font_size(&self) -> f32 {
        self.max_font_size.min((self.texture_size / 8) as f32)
    }

    /// Raster edge length in pixels.
    pub fn raster_size(&self) -> u32 {
        ((self.texture_size as f32 * self.pixel_density).round() as u32).max(1)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BackgroundConfig {
    pub variant: BackgroundVariant,
    /// Clear color behind everything, sRGB.
    pub clear_color: [u8; 3],
    pub gradient_rings: u32,
    pub nebula_layers: u32,
    pub blobs_per_layer: u32,
    pub grain_dots: u32,
    pub star_count: u32,
    /// Background time added per frame.
    pub time_step: f32,
    /// Backdrop plane distance along -Z.
    pub plane_distance: f32,
    /// Backdrop side as a multiple of the larger viewport side.
    pub plane_scale: f32,
}

impl Default for BackgroundConfig {
    fn default() -> Self {
        Self {
            variant: BackgroundVariant::Animated,
            clear_color: [10, 10, 10],
            gradient_rings: 100,
            nebula_layers: 5,
            blobs_per_layer: 80,
            grain_dots: 2000,
            star_count: 300,
            time_step: 0.4,
            plane_distance: 5000.0,
            plane_scale: 40.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CameraConfig {
    /// Radians of orbit per logical pixel of drag.
    pub orbit_sensitivity: f32,
    /// Fractional distance change per wheel line.
    pub zoom_sensitivity: f32,
    pub zoom_min: f32,
    pub zoom_max: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            orbit_sensitivity: 0.005,
            zoom_sensitivity: 0.1,
            zoom_min: 0.1,
            zoom_max: 4.0,
        }
    }
}

/// Complete sketch configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct SketchConfig {
    /// Cubes per grid edge; odd so each face has a center cube.
    pub grid_size: u32,
    /// Concentric tunnel copies drawn per frame.
    pub frames: u32,
    /// Zoom accumulator advance per frame.
    pub zoom_speed: f32,
    pub labels: Vec<String>,
    pub label_style: LabelStyle,
    /// Cube edge color, sRGB.
    pub stroke: [u8; 3],
    pub background: BackgroundConfig,
    pub camera: CameraConfig,
    /// Seed for star placement and nebula scatter.
    pub seed: u64,
}

impl Default for SketchConfig {
    fn default() -> Self {
        Self {
            grid_size: 5,
            frames: 4,
            zoom_speed: 2.0,
            labels: DEFAULT_LABELS.iter().map(|s| s.to_string()).collect(),
            label_style: LabelStyle::default(),
            stroke: [32, 8, 8],
            background: BackgroundConfig::default(),
            camera: CameraConfig::default(),
            seed: 2024,
        }
    }
}

impl SketchConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.grid_size < 3 {
            return Err(ConfigError::GridTooSmall(self.grid_size));
        }
        if self.grid_size % 2 == 0 {
            return Err(ConfigError::EvenGridSize(self.grid_size));
        }
        if self.frames == 0 {
            return Err(ConfigError::NoFrames);
        }
        if self.labels.is_empty() {
            return Err(ConfigError::NoLabels);
        }

        let style = &self.label_style;
        positive("zoom_speed", self.zoom_speed)?;
        positive("label_style.pixel_density", style.pixel_density)?;
        positive("label_style.min_font_size", style.min_font_size)?;
        positive("label_style.font_step", style.font_step)?;
        positive("label_style.fit_ratio", style.fit_ratio)?;
        positive("label_style.box_ratio", style.box_ratio)?;
        positive("background.plane_distance", self.background.plane_distance)?;
        positive("background.plane_scale", self.background.plane_scale)?;
        positive("camera.zoom_min", self.camera.zoom_min)?;
        if style.texture_size == 0 {
            return Err(ConfigError::NonPositive("label_style.texture_size"));
        }
        if self.camera.zoom_max < self.camera.zoom_min {
            return Err(ConfigError::InvalidRange {
                name: "camera.zoom",
                min: self.camera.zoom_min,
                max: self.camera.zoom_max,
            });
        }

        Ok(())
    }
}

fn positive(name: &'static str, value: f32) -> Result<(), ConfigError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::NonPositive(name))
    }
}

/// Rejected configuration.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    GridTooSmall(u32),
    EvenGridSize(u32),
    NoFrames,
    NoLabels,
    NonPositive(&'static str),
    /// Range whose upper bound lies below its lower bound.
    InvalidRange { name: &'static str, min: f32, max: f32 },
    UnknownBackground(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::GridTooSmall(n) => write!(f, "grid size {n} is too small (minimum 3)"),
            ConfigError::EvenGridSize(n) => {
                write!(f, "grid size {n} is even; face centers need an odd size")
            }
            ConfigError::NoFrames => write!(f, "at least one tunnel frame is required"),
            ConfigError::NoLabels => write!(f, "label list is empty"),
            ConfigError::NonPositive(name) => write!(f, "{name} must be positive and finite"),
            ConfigError::InvalidRange { name, min, max } => {
                write!(f, "{name} range is empty: max {max} is below min {min}")
            }
            ConfigError::UnknownBackground(s) => {
                write!(f, "unknown background variant {s:?} (expected \"animated\" or \"flat\")")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        assert_eq!(SketchConfig::default().validate(), Ok(()));
    }

    #[test]
    fn even_and_small_grids_are_rejected() {
        let mut cfg = SketchConfig::default();
        cfg.grid_size = 4;
        assert_eq!(cfg.validate(), Err(ConfigError::EvenGridSize(4)));
        cfg.grid_size = 1;
        assert_eq!(cfg.validate(), Err(ConfigError::GridTooSmall(1)));
    }

    #[test]
    fn empty_labels_and_zero_frames_are_rejected() {
        let mut cfg = SketchConfig::default();
        cfg.frames = 0;
        assert_eq!(cfg.validate(), Err(ConfigError::NoFrames));

        let mut cfg = SketchConfig::default();
        cfg.labels.clear();
        assert_eq!(cfg.validate(), Err(ConfigError::NoLabels));
    }

    #[test]
    fn non_positive_density_is_rejected() {
        let mut cfg = SketchConfig::default();
        cfg.label_style.pixel_density = 0.0;
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::NonPositive("label_style.pixel_density"))
        );

        cfg.label_style.pixel_density = f32::NAN;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn inverted_zoom_range_is_rejected() {
        let mut cfg = SketchConfig::default();
        cfg.camera.zoom_min = 2.0;
        cfg.camera.zoom_max = 0.5;
        let err = cfg.validate().unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidRange { name: "camera.zoom", min: 2.0, max: 0.5 }
        );
        assert_eq!(err.to_string(), "camera.zoom range is empty: max 0.5 is below min 2");

        cfg.camera.zoom_max = 2.0;
        assert_eq!(cfg.validate(), Ok(()));
    }

    #[test]
    fn start_size_follows_texture_size() {
        let style = LabelStyle::default();
        assert_eq!(style.start_font_size(), 32.0);
        assert_eq!(style.raster_size(), 512);

        let big = LabelStyle { texture_size: 1024, ..LabelStyle::default() };
        assert_eq!(big.start_font_size(), 48.0);
    }

    #[test]
    fn background_variant_parses() {
        assert_eq!("flat".parse(), Ok(BackgroundVariant::Flat));
        assert_eq!(" Animated ".parse(), Ok(BackgroundVariant::Animated));
        assert!("fancy".parse::<BackgroundVariant>().is_err());
    }
}
