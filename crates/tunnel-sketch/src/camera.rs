//! Sketch cameras.
//!
//! `BaseCamera` is the fixed default view derived from the viewport. The
//! backdrop always uses it. `OrbitCamera` rotates and dollies around the
//! origin on top of it and drives the cube tunnel.

use glam::{Mat4, Vec3};
use tunnel_engine::coords::Viewport;

use crate::config::CameraConfig;

const FOV_Y_DEG: f32 = 60.0;
const PITCH_LIMIT: f32 = 89.0 * std::f32::consts::PI / 180.0;

/// Default perspective camera on +Z looking at the origin.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct BaseCamera {
    /// Eye distance at which one world unit covers one logical pixel at z = 0.
    pub eye_distance: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl BaseCamera {
    /// `min_far` extends the far plane when the default `10 × eye` would cut
    /// off geometry placed further back (the backdrop on short windows).
    pub fn new(viewport: Viewport, min_far: f32) -> Self {
        let half_fov = (FOV_Y_DEG / 2.0).to_radians();
        let eye_distance = (viewport.height.max(1.0) / 2.0) / half_fov.tan();
        Self {
            eye_distance,
            aspect: viewport.aspect(),
            near: eye_distance / 10.0,
            far: (eye_distance * 10.0).max(min_far),
        }
    }

    pub fn projection(&self) -> Mat4 {
        Mat4::perspective_rh(FOV_Y_DEG.to_radians(), self.aspect, self.near, self.far)
    }

    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(Vec3::new(0.0, 0.0, self.eye_distance), Vec3::ZERO, Vec3::Y)
    }

    pub fn view_proj(&self) -> Mat4 {
        self.projection() * self.view()
    }
}

/// Drag-to-orbit, wheel-to-zoom camera around the origin.
#[derive(Debug, Clone, PartialEq)]
pub struct OrbitCamera {
    /// Radians around +Y; 0 keeps the eye on +Z.
    pub yaw: f32,
    /// Radians above the XZ plane, clamped to ±89°.
    pub pitch: f32,
    /// Multiplier on the base eye distance.
    pub zoom: f32,
    config: CameraConfig,
}

impl OrbitCamera {
    pub fn new(config: CameraConfig) -> Self {
        Self {
            yaw: 0.0,
            pitch: 0.0,
            zoom: 1.0,
            config,
        }
    }

    /// Applies a pointer drag in logical pixels.
    pub fn drag(&mut self, dx: f32, dy: f32) {
        let s = self.config.orbit_sensitivity;
        self.yaw -= dx * s;
        self.pitch = (self.pitch + dy * s).clamp(-PITCH_LIMIT, PITCH_LIMIT);
    }

    /// Applies wheel motion in lines; positive moves closer.
    pub fn scroll(&mut self, lines: f32) {
        let factor = 1.0 - lines * self.config.zoom_sensitivity;
        self.zoom = (self.zoom * factor).clamp(self.config.zoom_min, self.config.zoom_max);
    }

    pub fn reset(&mut self) {
        self.yaw = 0.0;
        self.pitch = 0.0;
        self.zoom = 1.0;
    }

    pub fn is_home(&self) -> bool {
        self.yaw == 0.0 && self.pitch == 0.0 && self.zoom == 1.0
    }

    pub fn eye(&self, base: &BaseCamera) -> Vec3 {
        let d = base.eye_distance * self.zoom;
        Vec3::new(
            d * self.pitch.cos() * self.yaw.sin(),
            d * self.pitch.sin(),
            d * self.pitch.cos() * self.yaw.cos(),
        )
    }

    pub fn view_proj(&self, base: &BaseCamera) -> Mat4 {
        base.projection() * Mat4::look_at_rh(self.eye(base), Vec3::ZERO, Vec3::Y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32, eps: f32) -> bool {
        (a - b).abs() <= eps
    }

    #[test]
    fn base_camera_matches_default_sketch_camera() {
        let cam = BaseCamera::new(Viewport::new(1280.0, 720.0), 0.0);
        assert!(approx(cam.eye_distance, 623.538, 1e-2));
        assert!(approx(cam.near, cam.eye_distance / 10.0, 1e-4));
        assert!(approx(cam.far, cam.eye_distance * 10.0, 1e-2));
    }

    #[test]
    fn far_plane_is_extended_on_request() {
        let cam = BaseCamera::new(Viewport::new(400.0, 200.0), 6000.0);
        assert_eq!(cam.far, 6000.0);
    }

    #[test]
    fn home_orbit_matches_base_view() {
        let base = BaseCamera::new(Viewport::new(800.0, 600.0), 0.0);
        let orbit = OrbitCamera::new(CameraConfig::default());
        let a = orbit.view_proj(&base);
        let b = base.view_proj();
        assert!(a.abs_diff_eq(b, 1e-4));
    }

    #[test]
    fn pitch_is_clamped() {
        let mut orbit = OrbitCamera::new(CameraConfig::default());
        orbit.drag(0.0, 1.0e6);
        assert!(approx(orbit.pitch, PITCH_LIMIT, 1e-6));
        orbit.drag(0.0, -2.0e6);
        assert!(approx(orbit.pitch, -PITCH_LIMIT, 1e-6));
    }

    #[test]
    fn zoom_is_clamped_and_reset_restores_home() {
        let mut orbit = OrbitCamera::new(CameraConfig::default());
        for _ in 0..100 {
            orbit.scroll(3.0);
        }
        assert!(approx(orbit.zoom, 0.1, 1e-6));
        for _ in 0..100 {
            orbit.scroll(-3.0);
        }
        assert!(approx(orbit.zoom, 4.0, 1e-6));

        orbit.drag(40.0, 12.0);
        assert!(!orbit.is_home());
        orbit.reset();
        assert!(orbit.is_home());
    }

    #[test]
    fn orbit_keeps_eye_distance() {
        let base = BaseCamera::new(Viewport::new(800.0, 600.0), 0.0);
        let mut orbit = OrbitCamera::new(CameraConfig::default());
        orbit.drag(120.0, -80.0);
        assert!(approx(orbit.eye(&base).length(), base.eye_distance, 1e-2));
    }
}
