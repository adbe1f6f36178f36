use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use image::RgbaImage;
use wgpu::util::DeviceExt;

use crate::paint::Color;
use crate::render::{RenderCtx, RenderTarget};

use super::common::{
    depth_state, linear_sampler, premul_alpha_blend, write_rgba_layer, CameraUniform,
    COLOR_TEXTURE_FORMAT,
};

/// Instanced renderer for unit cubes.
///
/// Every instance is drawn as a stroked wireframe (line list over the 12
/// edges). Instances carrying a label layer also get all six faces textured
/// with that layer of the label array, alpha blended without depth writes so
/// transparent label areas do not hide what lies behind them.
///
/// Lines are rasterized at 1 physical pixel; wgpu has no wide-line support.
pub struct CubeRenderer {
    pending_labels: Option<Vec<RgbaImage>>,

    pipeline_format: Option<wgpu::TextureFormat>,
    edge_pipeline: Option<wgpu::RenderPipeline>,
    face_pipeline: Option<wgpu::RenderPipeline>,

    bind_group_layout: Option<wgpu::BindGroupLayout>,
    bind_group: Option<wgpu::BindGroup>,
    camera_ubo: Option<wgpu::Buffer>,
    sampler: Option<wgpu::Sampler>,
    label_texture: Option<wgpu::Texture>,

    face_vbo: Option<wgpu::Buffer>,
    face_ibo: Option<wgpu::Buffer>,
    edge_vbo: Option<wgpu::Buffer>,
    edge_ibo: Option<wgpu::Buffer>,

    instance_vbo: Option<wgpu::Buffer>,
    instance_capacity: usize,
}

impl CubeRenderer {
    /// Creates a renderer whose texture array holds `labels`, one layer each,
    /// in order. All images must share the first image's dimensions; others
    /// are skipped with a warning.
    pub fn new(labels: Vec<RgbaImage>) -> Self {
        Self {
            pending_labels: Some(labels),
            pipeline_format: None,
            edge_pipeline: None,
            face_pipeline: None,
            bind_group_layout: None,
            bind_group: None,
            camera_ubo: None,
            sampler: None,
            label_texture: None,
            face_vbo: None,
            face_ibo: None,
            edge_vbo: None,
            edge_ibo: None,
            instance_vbo: None,
            instance_capacity: 0,
        }
    }

    pub fn render(
        &mut self,
        ctx: &RenderCtx<'_>,
        target: &mut RenderTarget<'_>,
        view_proj: Mat4,
        instances: &[CubeInstance],
        stroke: Color,
    ) {
        if instances.is_empty() {
            return;
        }

        self.ensure_pipelines(ctx);
        self.ensure_static_buffers(ctx);
        self.ensure_label_texture(ctx);
        self.ensure_bindings(ctx);

        // Wireframes for everything first, then the textured subset.
        let mut raw: Vec<CubeInstance> = Vec::with_capacity(instances.len() * 2);
        raw.extend_from_slice(instances);
        raw.extend(instances.iter().filter(|i| i.is_textured()).copied());

        let edge_count = instances.len() as u32;
        let total = raw.len() as u32;

        self.ensure_instance_capacity(ctx, raw.len());

        let Some(instance_vbo) = self.instance_vbo.as_ref() else { return };
        ctx.queue.write_buffer(instance_vbo, 0, bytemuck::cast_slice(&raw));

        let Some(ubo) = self.camera_ubo.as_ref() else { return };
        ctx.queue.write_buffer(
            ubo,
            0,
            bytemuck::bytes_of(&CameraUniform::new(view_proj, stroke.to_array())),
        );

        let Some(edge_pipeline) = self.edge_pipeline.as_ref() else { return };
        let Some(face_pipeline) = self.face_pipeline.as_ref() else { return };
        let Some(bind_group) = self.bind_group.as_ref() else { return };
        let Some(edge_vbo) = self.edge_vbo.as_ref() else { return };
        let Some(edge_ibo) = self.edge_ibo.as_ref() else { return };
        let Some(face_vbo) = self.face_vbo.as_ref() else { return };
        let Some(face_ibo) = self.face_ibo.as_ref() else { return };

        let face_offset = edge_count as u64 * std::mem::size_of::<CubeInstance>() as u64;

        let mut rpass = target.begin_load_pass("tunnel cube pass");
        rpass.set_bind_group(0, bind_group, &[]);

        rpass.set_pipeline(edge_pipeline);
        rpass.set_vertex_buffer(1, instance_vbo.slice(..face_offset));
        rpass.set_vertex_buffer(0, edge_vbo.slice(..));
        rpass.set_index_buffer(edge_ibo.slice(..), wgpu::IndexFormat::Uint16);
        rpass.draw_indexed(0..EDGE_INDEX_COUNT, 0, 0..edge_count);

        if total > edge_count {
            rpass.set_pipeline(face_pipeline);
            rpass.set_vertex_buffer(0, face_vbo.slice(..));
            rpass.set_vertex_buffer(1, instance_vbo.slice(face_offset..));
            rpass.set_index_buffer(face_ibo.slice(..), wgpu::IndexFormat::Uint16);
            rpass.draw_indexed(0..FACE_INDEX_COUNT, 0, 0..total - edge_count);
        }
    }

    // ── private helpers ────────────────────────────────────────────────────

    fn ensure_pipelines(&mut self, ctx: &RenderCtx<'_>) {
        if self.pipeline_format == Some(ctx.surface_format)
            && self.edge_pipeline.is_some()
            && self.face_pipeline.is_some()
        {
            return;
        }

        let shader = ctx.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("tunnel cube shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/cube.wgsl").into()),
        });

        let bind_group_layout =
            ctx.device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("tunnel cube bgl"),
                entries: &[
                    wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Uniform,
                            has_dynamic_offset: false,
                            min_binding_size: CameraUniform::min_binding_size(),
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 1,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Texture {
                            sample_type: wgpu::TextureSampleType::Float { filterable: true },
                            view_dimension: wgpu::TextureViewDimension::D2Array,
                            multisampled: false,
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 2,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                        count: None,
                    },
                ],
            });

        let pipeline_layout =
            ctx.device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("tunnel cube pipeline layout"),
                bind_group_layouts: &[&bind_group_layout],
                immediate_size: 0,
            });

        let make = |label: &'static str,
                    fs: &'static str,
                    topology: wgpu::PrimitiveTopology,
                    depth_write: bool| {
            ctx.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(label),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: Some("vs_main"),
                    compilation_options: Default::default(),
                    buffers: &[CubeVertex::layout(), CubeInstance::layout()],
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: Some(fs),
                    compilation_options: Default::default(),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: ctx.surface_format,
                        blend: Some(premul_alpha_blend()),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                }),
                primitive: wgpu::PrimitiveState {
                    topology,
                    strip_index_format: None,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: None,
                    polygon_mode: wgpu::PolygonMode::Fill,
                    unclipped_depth: false,
                    conservative: false,
                },
                depth_stencil: Some(depth_state(depth_write)),
                multisample: wgpu::MultisampleState::default(),
                multiview_mask: None,
                cache: None,
            })
        };

        let edge_pipeline = make(
            "tunnel cube edge pipeline",
            "fs_edge",
            wgpu::PrimitiveTopology::LineList,
            true,
        );
        let face_pipeline = make(
            "tunnel cube face pipeline",
            "fs_face",
            wgpu::PrimitiveTopology::TriangleList,
            false,
        );

        self.pipeline_format = Some(ctx.surface_format);
        self.edge_pipeline = Some(edge_pipeline);
        self.face_pipeline = Some(face_pipeline);
        self.bind_group_layout = Some(bind_group_layout);
        self.bind_group = None;
    }

    fn ensure_label_texture(&mut self, ctx: &RenderCtx<'_>) {
        if self.label_texture.is_some() {
            return;
        }

        let labels = self.pending_labels.take().unwrap_or_default();
        let (width, height) = labels.first().map_or((1, 1), |img| img.dimensions());

        let layers: Vec<&RgbaImage> = labels
            .iter()
            .enumerate()
            .filter_map(|(i, img)| {
                if img.dimensions() == (width, height) {
                    Some(img)
                } else {
                    log::warn!(
                        "label {i} is {:?}, expected {width}x{height}; skipped",
                        img.dimensions()
                    );
                    None
                }
            })
            .collect();

        let layer_count = layers.len().max(1) as u32;

        let texture = ctx.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("tunnel label texture array"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: layer_count,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: COLOR_TEXTURE_FORMAT,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        if layers.is_empty() {
            write_rgba_layer(ctx.queue, &texture, 0, 1, 1, &[0, 0, 0, 0]);
        }
        for (layer, img) in layers.iter().enumerate() {
            write_rgba_layer(ctx.queue, &texture, layer as u32, width, height, img.as_raw());
        }

        log::debug!("uploaded {layer_count} label layer(s) at {width}x{height}");

        self.label_texture = Some(texture);
        self.bind_group = None;
    }

    fn ensure_bindings(&mut self, ctx: &RenderCtx<'_>) {
        if self.bind_group.is_some() {
            return;
        }
        let Some(bgl) = self.bind_group_layout.as_ref() else { return };
        let Some(texture) = self.label_texture.as_ref() else { return };

        let ubo = self.camera_ubo.get_or_insert_with(|| {
            ctx.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("tunnel cube camera ubo"),
                size: std::mem::size_of::<CameraUniform>() as u64,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            })
        });
        let sampler = self
            .sampler
            .get_or_insert_with(|| linear_sampler(ctx.device, "tunnel label sampler"));

        // Single-layer arrays would default to a plain 2D view.
        let view = texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some("tunnel label array view"),
            dimension: Some(wgpu::TextureViewDimension::D2Array),
            ..Default::default()
        });

        self.bind_group = Some(ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("tunnel cube bind group"),
            layout: bgl,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: ubo.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
            ],
        }));
    }

    fn ensure_static_buffers(&mut self, ctx: &RenderCtx<'_>) {
        if self.face_vbo.is_some() && self.edge_vbo.is_some() {
            return;
        }

        let (face_vertices, face_indices) = face_mesh();
        let (edge_vertices, edge_indices) = edge_mesh();

        let init = |label: &'static str, contents: &[u8], usage: wgpu::BufferUsages| {
            ctx.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents,
                usage,
            })
        };

        self.face_vbo = Some(init(
            "tunnel cube face vbo",
            bytemuck::cast_slice(&face_vertices),
            wgpu::BufferUsages::VERTEX,
        ));
        self.face_ibo = Some(init(
            "tunnel cube face ibo",
            bytemuck::cast_slice(&face_indices),
            wgpu::BufferUsages::INDEX,
        ));
        self.edge_vbo = Some(init(
            "tunnel cube edge vbo",
            bytemuck::cast_slice(&edge_vertices),
            wgpu::BufferUsages::VERTEX,
        ));
        self.edge_ibo = Some(init(
            "tunnel cube edge ibo",
            bytemuck::cast_slice(&edge_indices),
            wgpu::BufferUsages::INDEX,
        ));
    }

    fn ensure_instance_capacity(&mut self, ctx: &RenderCtx<'_>, required: usize) {
        if required <= self.instance_capacity && self.instance_vbo.is_some() {
            return;
        }
        let new_cap = required.next_power_of_two().max(64);
        let new_size = (new_cap * std::mem::size_of::<CubeInstance>()) as u64;
        self.instance_vbo = Some(ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("tunnel cube instance vbo"),
            size: new_size,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        }));
        self.instance_capacity = new_cap;
    }
}

// ── GPU types ─────────────────────────────────────────────────────────────

/// One cube: model matrix plus an optional label layer.
///
/// Instance data layout (80 bytes):
///
///  offset  0  model   [[f32; 4]; 4]   loc 2..5 (columns)
///  offset 64  layer   u32             loc 6    (`u32::MAX` = wireframe only)
///  offset 68  _pad    [u32; 3]
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct CubeInstance {
    model: [[f32; 4]; 4],
    layer: u32,
    _pad: [u32; 3],
}

impl CubeInstance {
    const NO_LAYER: u32 = u32::MAX;

    const ATTRS: [wgpu::VertexAttribute; 5] = wgpu::vertex_attr_array![
        2 => Float32x4,
        3 => Float32x4,
        4 => Float32x4,
        5 => Float32x4,
        6 => Uint32
    ];

    /// Stroke-only cube.
    pub fn wireframe(model: Mat4) -> Self {
        Self {
            model: model.to_cols_array_2d(),
            layer: Self::NO_LAYER,
            _pad: [0; 3],
        }
    }

    /// Stroked cube whose faces show label layer `layer`.
    pub fn textured(model: Mat4, layer: u32) -> Self {
        Self {
            model: model.to_cols_array_2d(),
            layer,
            _pad: [0; 3],
        }
    }

    pub fn model(&self) -> Mat4 {
        Mat4::from_cols_array_2d(&self.model)
    }

    pub fn layer(&self) -> Option<u32> {
        (self.layer != Self::NO_LAYER).then_some(self.layer)
    }

    pub fn is_textured(&self) -> bool {
        self.layer != Self::NO_LAYER
    }

    fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<CubeInstance>() as u64,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &Self::ATTRS,
        }
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct CubeVertex {
    pos: [f32; 3],
    uv: [f32; 2],
}

impl CubeVertex {
    const ATTRS: [wgpu::VertexAttribute; 2] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x2];

    fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<CubeVertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

// ── unit cube meshes ──────────────────────────────────────────────────────

const FACE_INDEX_COUNT: u32 = 36;
const EDGE_INDEX_COUNT: u32 = 24;

/// Corners of each face as seen from outside: top-left, top-right,
/// bottom-right, bottom-left. Side faces keep +Y up; top and bottom faces
/// read upright from the front.
const FACE_CORNERS: [[[f32; 3]; 4]; 6] = [
    // +Z
    [[-0.5, 0.5, 0.5], [0.5, 0.5, 0.5], [0.5, -0.5, 0.5], [-0.5, -0.5, 0.5]],
    // -Z
    [[0.5, 0.5, -0.5], [-0.5, 0.5, -0.5], [-0.5, -0.5, -0.5], [0.5, -0.5, -0.5]],
    // +X
    [[0.5, 0.5, 0.5], [0.5, 0.5, -0.5], [0.5, -0.5, -0.5], [0.5, -0.5, 0.5]],
    // -X
    [[-0.5, 0.5, -0.5], [-0.5, 0.5, 0.5], [-0.5, -0.5, 0.5], [-0.5, -0.5, -0.5]],
    // +Y
    [[-0.5, 0.5, -0.5], [0.5, 0.5, -0.5], [0.5, 0.5, 0.5], [-0.5, 0.5, 0.5]],
    // -Y
    [[-0.5, -0.5, 0.5], [0.5, -0.5, 0.5], [0.5, -0.5, -0.5], [-0.5, -0.5, -0.5]],
];

const CORNER_UVS: [[f32; 2]; 4] = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];

fn face_mesh() -> (Vec<CubeVertex>, Vec<u16>) {
    let mut vertices = Vec::with_capacity(24);
    let mut indices = Vec::with_capacity(FACE_INDEX_COUNT as usize);

    for corners in FACE_CORNERS.iter() {
        let base = vertices.len() as u16;
        for (pos, uv) in corners.iter().zip(CORNER_UVS.iter()) {
            vertices.push(CubeVertex { pos: *pos, uv: *uv });
        }
        indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    (vertices, indices)
}

/// Corner `i` has coordinate bits x = i & 1, y = i & 2, z = i & 4.
fn edge_mesh() -> (Vec<CubeVertex>, Vec<u16>) {
    let vertices: Vec<CubeVertex> = (0u16..8)
        .map(|i| {
            let c = |bit: u16| if i & bit == 0 { -0.5 } else { 0.5 };
            CubeVertex {
                pos: [c(1), c(2), c(4)],
                uv: [0.0, 0.0],
            }
        })
        .collect();

    let mut indices = Vec::with_capacity(EDGE_INDEX_COUNT as usize);
    for i in 0u16..8 {
        for bit in [1u16, 2, 4] {
            if i & bit == 0 {
                indices.extend_from_slice(&[i, i | bit]);
            }
        }
    }

    (vertices, indices)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dist(a: [f32; 3], b: [f32; 3]) -> f32 {
        glam::Vec3::from(a).distance(glam::Vec3::from(b))
    }

    #[test]
    fn edge_mesh_has_twelve_unit_edges() {
        let (v, i) = edge_mesh();
        assert_eq!(v.len(), 8);
        assert_eq!(i.len() as u32, EDGE_INDEX_COUNT);
        for pair in i.chunks(2) {
            let d = dist(v[pair[0] as usize].pos, v[pair[1] as usize].pos);
            assert!((d - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn face_mesh_covers_six_planar_faces() {
        let (v, i) = face_mesh();
        assert_eq!(v.len(), 24);
        assert_eq!(i.len() as u32, FACE_INDEX_COUNT);

        // Every face lies on one axis plane at ±0.5.
        for face in v.chunks(4) {
            let on_plane = (0..3).any(|axis| {
                let first = face[0].pos[axis];
                first.abs() == 0.5 && face.iter().all(|c| c.pos[axis] == first)
            });
            assert!(on_plane);
        }
    }

    #[test]
    fn front_face_reads_left_to_right() {
        // Top-left corner of the +Z face sits at -X, +Y.
        let (v, _) = face_mesh();
        assert_eq!(v[0].pos, [-0.5, 0.5, 0.5]);
        assert_eq!(v[0].uv, [0.0, 0.0]);
        assert_eq!(v[2].uv, [1.0, 1.0]);
    }

    #[test]
    fn instance_layer_round_trip() {
        let m = Mat4::from_translation(glam::Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(CubeInstance::wireframe(m).layer(), None);
        assert_eq!(CubeInstance::textured(m, 4).layer(), Some(4));
        assert_eq!(CubeInstance::textured(m, 4).model(), m);
        assert_eq!(std::mem::size_of::<CubeInstance>(), 80);
    }
}
