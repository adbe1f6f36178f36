//! Application layer: the `Sketch` builder and the engine `App` that drives
//! the scene and both renderers.

use anyhow::{Context, Result};
use winit::dpi::LogicalSize;
use winit::window::WindowId;

use tunnel_engine::coords::Viewport;
use tunnel_engine::core::{App, AppControl, FrameCtx};
use tunnel_engine::device::GpuInit;
use tunnel_engine::paint::Color;
use tunnel_engine::render::{BackdropRenderer, CubeRenderer};
use tunnel_engine::text::FontSystem;
use tunnel_engine::window::{Runtime, RuntimeConfig};

use crate::config::{BackgroundVariant, SketchConfig};
use crate::labels::LabelGenerator;
use crate::scene::{SceneAction, TunnelScene};

/// Builder for the cube tunnel window.
///
/// ```rust,ignore
/// Sketch::new()
///     .title("Cube Tunnel")
///     .labels(["Rust", "wgpu"])
///     .background(BackgroundVariant::Flat)
///     .run()?;
/// ```
pub struct Sketch {
    title: String,
    width: f64,
    height: f64,
    config: SketchConfig,
    font: Option<Vec<u8>>,
    gpu: GpuInit,
}

impl Sketch {
    pub fn new() -> Self {
        Self {
            title: "tunnel".to_string(),
            width: 1280.0,
            height: 720.0,
            config: SketchConfig::default(),
            font: None,
            gpu: GpuInit::default(),
        }
    }

    /// Set the window title.
    pub fn title(mut self, t: impl Into<String>) -> Self {
        self.title = t.into();
        self
    }

    /// Set the initial window size in logical pixels.
    pub fn size(mut self, width: f64, height: f64) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Replace the label list. Face `i` shows label `i mod len`.
    pub fn labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.labels = labels.into_iter().map(Into::into).collect();
        self
    }

    pub fn background(mut self, variant: BackgroundVariant) -> Self {
        self.config.background.variant = variant;
        self
    }

    pub fn grid_size(mut self, n: u32) -> Self {
        self.config.grid_size = n;
        self
    }

    /// TrueType/OpenType bytes for the labels. Without a font the labels stay blank.
    pub fn font(mut self, data: Vec<u8>) -> Self {
        self.font = Some(data);
        self
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: SketchConfig) -> Self {
        self.config = config;
        self
    }

    pub fn gpu(mut self, gpu: GpuInit) -> Self {
        self.gpu = gpu;
        self
    }

    /// Validates the configuration, renders the labels and runs the window
    /// loop until it exits.
    pub fn run(self) -> Result<()> {
        self.config
            .validate()
            .context("invalid sketch configuration")?;

        let mut fonts = FontSystem::new();
        let font_id = match self.font.as_deref() {
            Some(bytes) => match fonts.load_font(bytes) {
                Ok(id) => Some(id),
                Err(e) => {
                    log::warn!("{e}; labels will be blank");
                    None
                }
            },
            None => None,
        };

        let labels = LabelGenerator::new(&self.config.label_style, font_id.map(|id| (&fonts, id)))
            .generate(&self.config.labels);
        log::info!(
            "generated {} label texture(s), grid {}, {} frame(s), {:?} background",
            labels.len(),
            self.config.grid_size,
            self.config.frames,
            self.config.background.variant
        );

        let app = SketchApp::new(TunnelScene::new(self.config, labels));

        let runtime = RuntimeConfig {
            title: self.title,
            initial_size: LogicalSize::new(self.width, self.height),
        };
        Runtime::run(runtime, self.gpu, app)
    }
}

impl Default for Sketch {
    fn default() -> Self {
        Self::new()
    }
}

/// Engine-facing state: the scene plus the GPU renderers that draw it.
struct SketchApp {
    scene: TunnelScene,
    backdrop: BackdropRenderer,
    cubes: CubeRenderer,
    clear: Color,
    stroke: Color,
}

impl SketchApp {
    fn new(scene: TunnelScene) -> Self {
        let cfg = scene.config();
        let [cr, cg, cb] = cfg.background.clear_color;
        let [sr, sg, sb] = cfg.stroke;
        let clear = Color::from_srgb_u8(cr, cg, cb, 255);
        let stroke = Color::from_srgb_u8(sr, sg, sb, 255);
        let cubes = CubeRenderer::new(scene.label_layers());

        Self {
            scene,
            backdrop: BackdropRenderer::new(),
            cubes,
            clear,
            stroke,
        }
    }
}

impl App for SketchApp {
    fn on_resize(&mut self, _window_id: WindowId, viewport: Viewport) {
        self.scene.resize(viewport);
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        if self.scene.handle_input(ctx.input, ctx.input_frame) == SceneAction::Exit {
            log::info!("exit requested");
            return AppControl::Exit;
        }

        self.scene.advance();

        let instances = self.scene.instances();
        let view_proj = self.scene.cube_view_proj();
        let backdrop_mvp = self.scene.backdrop_mvp();
        let background = self.scene.paint_background(ctx.time.elapsed_ms);

        let backdrop = &mut self.backdrop;
        let cubes = &mut self.cubes;
        let stroke = self.stroke;

        ctx.render(self.clear, |rctx, target| {
            if let Some(image) = background {
                backdrop.render(rctx, target, image, backdrop_mvp);
            }
            cubes.render(rctx, target, view_proj, &instances, stroke);
        })
    }
}
