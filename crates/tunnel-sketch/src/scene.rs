//! All mutable sketch state, advanced once per frame.

use glam::{Mat4, Vec3};
use image::RgbaImage;
use tunnel_engine::coords::Viewport;
use tunnel_engine::input::{InputFrame, InputState, Key, MouseButton};
use tunnel_engine::render::CubeInstance;

use crate::background::BackgroundPainter;
use crate::camera::{BaseCamera, OrbitCamera};
use crate::config::{BackgroundVariant, SketchConfig};
use crate::grid::{build_instances, FaceLabelMap, GridLayout};
use crate::labels::LabelTexture;

/// What the app should do after input was applied.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SceneAction {
    Continue,
    Exit,
}

pub struct TunnelScene {
    config: SketchConfig,
    labels: Vec<LabelTexture>,
    face_map: FaceLabelMap,

    viewport: Viewport,
    layout: GridLayout,
    base_camera: BaseCamera,
    orbit: OrbitCamera,

    /// Zoom accumulator, kept wrapped to the current cycle length.
    zoom: f32,
    /// Background time; drives nebula drift and star jitter.
    bg_time: f32,
    paused: bool,

    background: Option<BackgroundPainter>,
}

impl TunnelScene {
    /// Builds the scene from a validated config and pre-rendered labels.
    pub fn new(config: SketchConfig, labels: Vec<LabelTexture>) -> Self {
        let face_map = FaceLabelMap::new(config.grid_size, labels.len());
        let background = match config.background.variant {
            BackgroundVariant::Animated => {
                Some(BackgroundPainter::new(config.background.clone(), config.seed))
            }
            BackgroundVariant::Flat => None,
        };
        let orbit = OrbitCamera::new(config.camera.clone());

        let viewport = Viewport::new(1.0, 1.0);
        let mut scene = Self {
            layout: GridLayout::new(config.grid_size, viewport.min_side()),
            base_camera: BaseCamera::new(viewport, 0.0),
            config,
            labels,
            face_map,
            viewport,
            orbit,
            zoom: 0.0,
            bg_time: 0.0,
            paused: false,
            background,
        };
        scene.resize(viewport);
        scene
    }

    /// Rebuilds every size-dependent piece for `viewport` (logical px).
    pub fn resize(&mut self, viewport: Viewport) {
        if !viewport.is_valid() {
            return;
        }

        self.viewport = viewport;
        self.layout = GridLayout::new(self.config.grid_size, viewport.min_side());
        self.zoom = self.layout.wrap_zoom(self.zoom);

        let backdrop_far = self.config.background.plane_distance * 1.5;
        self.base_camera = BaseCamera::new(viewport, backdrop_far);

        if let Some(bg) = self.background.as_mut() {
            let (w, h) = viewport.pixel_size();
            bg.resize(w, h);
        }

        log::debug!(
            "grid layout for {}x{}: cube {:.1}, spacing {:.1}, cycle {:.1}",
            viewport.width,
            viewport.height,
            self.layout.cube_size,
            self.layout.spacing,
            self.layout.cycle_length
        );
    }

    /// Applies keyboard, drag and wheel input for this frame.
    pub fn handle_input(&mut self, input: &InputState, frame: &InputFrame) -> SceneAction {
        if frame.key_pressed(Key::Escape) {
            return SceneAction::Exit;
        }
        if frame.key_pressed(Key::R) {
            self.orbit.reset();
            log::info!("camera reset");
        }
        if frame.key_pressed(Key::Space) {
            self.paused = !self.paused;
            log::info!("animation {}", if self.paused { "paused" } else { "resumed" });
        }

        if input.button_down(MouseButton::Left) {
            let (dx, dy) = frame.pointer_delta;
            if dx != 0.0 || dy != 0.0 {
                self.orbit.drag(dx, dy);
            }
        }
        if frame.scroll_lines != 0.0 {
            self.orbit.scroll(frame.scroll_lines);
        }

        SceneAction::Continue
    }

    /// Advances zoom and background time by one frame unless paused.
    pub fn advance(&mut self) {
        if self.paused {
            return;
        }
        self.zoom = self.layout.wrap_zoom(self.zoom + self.config.zoom_speed);
        self.bg_time += self.config.background.time_step;
    }

    /// Repaints the backdrop buffer; `None` for the flat variant.
    pub fn paint_background(&mut self, elapsed_ms: f64) -> Option<&RgbaImage> {
        let t = self.bg_time;
        let bg = self.background.as_mut()?;
        bg.paint(t, elapsed_ms);
        Some(bg.image())
    }

    pub fn instances(&self) -> Vec<CubeInstance> {
        build_instances(&self.layout, &self.face_map, self.zoom, self.config.frames)
    }

    /// Images for the texture array, in layer order.
    pub fn label_layers(&self) -> Vec<RgbaImage> {
        self.face_map
            .layers()
            .iter()
            .filter_map(|&i| self.labels.get(i).map(|l| l.image.clone()))
            .collect()
    }

    pub fn cube_view_proj(&self) -> Mat4 {
        self.orbit.view_proj(&self.base_camera)
    }

    /// Model-view-projection of the backdrop plane under the base camera.
    pub fn backdrop_mvp(&self) -> Mat4 {
        let bg = &self.config.background;
        let side = self.viewport.max_side() * bg.plane_scale;
        self.base_camera.view_proj()
            * Mat4::from_translation(Vec3::new(0.0, 0.0, -bg.plane_distance))
            * Mat4::from_scale(Vec3::new(side, side, 1.0))
    }

    pub fn config(&self) -> &SketchConfig {
        &self.config
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn bg_time(&self) -> f32 {
        self.bg_time
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn layout(&self) -> &GridLayout {
        &self.layout
    }

    pub fn background(&self) -> Option<&BackgroundPainter> {
        self.background.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tunnel_engine::input::{InputEvent, KeyState, MouseButtonState};

    fn test_config(variant: BackgroundVariant) -> SketchConfig {
        let mut cfg = SketchConfig::default();
        cfg.background.variant = variant;
        cfg.background.blobs_per_layer = 2;
        cfg.background.grain_dots = 10;
        cfg.background.star_count = 20;
        cfg
    }

    fn blank_labels(n: usize) -> Vec<LabelTexture> {
        (0..n)
            .map(|i| LabelTexture {
                text: format!("label {i}"),
                font_size: 32.0,
                image: RgbaImage::new(4, 4),
            })
            .collect()
    }

    fn press(state: &mut InputState, frame: &mut InputFrame, key: Key) {
        state.apply_event(frame, InputEvent::Key { key, state: KeyState::Pressed, repeat: false });
        state.apply_event(frame, InputEvent::Key { key, state: KeyState::Released, repeat: false });
    }

    #[test]
    fn zoom_wraps_at_cycle_length() {
        let mut scene = TunnelScene::new(test_config(BackgroundVariant::Flat), blank_labels(17));
        scene.resize(Viewport::new(750.0, 750.0));
        let cycle = scene.layout().cycle_length;

        let steps = (cycle / 2.0).ceil() as usize + 3;
        for _ in 0..steps {
            scene.advance();
            assert!(scene.zoom() >= 0.0 && scene.zoom() < cycle);
        }
        let expected = (steps as f32 * 2.0).rem_euclid(cycle);
        assert!((scene.zoom() - expected).abs() < 1e-2);
    }

    #[test]
    fn resize_updates_background_before_next_frame() {
        let mut scene =
            TunnelScene::new(test_config(BackgroundVariant::Animated), blank_labels(3));
        scene.resize(Viewport::new(200.0, 120.0));

        let bg = scene.background().map(|b| (b.image().dimensions(), b.stars().all_in_bounds()));
        assert_eq!(bg, Some(((200, 120), true)));

        let image = scene.paint_background(0.0).map(|i| i.dimensions());
        assert_eq!(image, Some((200, 120)));
    }

    #[test]
    fn invalid_viewport_is_ignored() {
        let mut scene = TunnelScene::new(test_config(BackgroundVariant::Flat), blank_labels(1));
        scene.resize(Viewport::new(300.0, 300.0));
        let before = *scene.layout();
        scene.resize(Viewport::new(0.0, 300.0));
        assert_eq!(*scene.layout(), before);
    }

    #[test]
    fn flat_variant_has_no_backdrop() {
        let mut scene = TunnelScene::new(test_config(BackgroundVariant::Flat), blank_labels(2));
        assert!(scene.paint_background(0.0).is_none());
    }

    #[test]
    fn space_pauses_and_escape_exits() {
        let mut scene = TunnelScene::new(test_config(BackgroundVariant::Flat), blank_labels(2));
        scene.resize(Viewport::new(400.0, 400.0));
        let mut state = InputState::default();
        let mut frame = InputFrame::default();

        press(&mut state, &mut frame, Key::Space);
        assert_eq!(scene.handle_input(&state, &frame), SceneAction::Continue);
        assert!(scene.is_paused());

        let (z, t) = (scene.zoom(), scene.bg_time());
        scene.advance();
        assert_eq!((scene.zoom(), scene.bg_time()), (z, t));

        frame.clear();
        press(&mut state, &mut frame, Key::Escape);
        assert_eq!(scene.handle_input(&state, &frame), SceneAction::Exit);
    }

    #[test]
    fn drag_orbits_only_while_left_button_held() {
        let mut scene = TunnelScene::new(test_config(BackgroundVariant::Flat), blank_labels(2));
        scene.resize(Viewport::new(400.0, 400.0));
        let home = scene.cube_view_proj();

        let mut state = InputState::default();
        let mut frame = InputFrame::default();
        state.apply_event(&mut frame, InputEvent::PointerMoved { x: 10.0, y: 10.0 });
        state.apply_event(&mut frame, InputEvent::PointerMoved { x: 60.0, y: 10.0 });
        scene.handle_input(&state, &frame);
        assert!(scene.cube_view_proj().abs_diff_eq(home, 1e-5));

        frame.clear();
        state.apply_event(
            &mut frame,
            InputEvent::PointerButton { button: MouseButton::Left, state: MouseButtonState::Pressed },
        );
        state.apply_event(&mut frame, InputEvent::PointerMoved { x: 110.0, y: 30.0 });
        scene.handle_input(&state, &frame);
        assert!(!scene.cube_view_proj().abs_diff_eq(home, 1e-5));

        frame.clear();
        press(&mut state, &mut frame, Key::R);
        scene.handle_input(&state, &frame);
        assert!(scene.cube_view_proj().abs_diff_eq(home, 1e-5));
    }

    #[test]
    fn only_mapped_labels_become_layers() {
        let scene = TunnelScene::new(test_config(BackgroundVariant::Flat), blank_labels(17));
        assert_eq!(scene.label_layers().len(), 6);

        let scene = TunnelScene::new(test_config(BackgroundVariant::Flat), blank_labels(2));
        assert_eq!(scene.label_layers().len(), 2);
    }

    #[test]
    fn backdrop_stays_inside_the_frustum() {
        let mut scene = TunnelScene::new(test_config(BackgroundVariant::Animated), blank_labels(1));
        scene.resize(Viewport::new(320.0, 180.0));
        let clip = scene.backdrop_mvp() * glam::Vec4::new(0.0, 0.0, 0.0, 1.0);
        let depth = clip.z / clip.w;
        assert!(depth > 0.0 && depth < 1.0);
    }
}
