use crate::camera::FlyCamera;
use bytemuck::{Pod, Zeroable};
use glam::Mat3;
use gridscape_common::FrameState;
use gridscape_render::{
    ContextLimits, DrawDescriptor, RenderContext, RenderError, ResolvedUniforms, UniformTable,
    VertexAttribute,
};
use wgpu::util::DeviceExt;

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct TerrainVertex {
    position: [f32; 3],
    uv: [f32; 2],
}

/// Leading part of the WGSL `Frame` block, up to the light array.
#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct FrameHeader {
    projection: [[f32; 4]; 4],
    view: [[f32; 4]; 4],
    model: [[f32; 4]; 4],
    // mat3x3 columns are padded to 16 bytes
    view_normal: [[f32; 4]; 3],
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct LightUniform {
    direction: [f32; 4],
    color: [f32; 4],
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct FrameTail {
    time: f32,
    _pad: [f32; 3],
}

fn mat3_padded(m: Mat3) -> [[f32; 4]; 3] {
    let c = m.to_cols_array_2d();
    [
        [c[0][0], c[0][1], c[0][2], 0.0],
        [c[1][0], c[1][1], c[1][2], 0.0],
        [c[2][0], c[2][1], c[2][2], 0.0],
    ]
}

fn vertex_format(components: u32) -> Option<wgpu::VertexFormat> {
    match components {
        1 => Some(wgpu::VertexFormat::Float32),
        2 => Some(wgpu::VertexFormat::Float32x2),
        3 => Some(wgpu::VertexFormat::Float32x3),
        4 => Some(wgpu::VertexFormat::Float32x4),
        _ => None,
    }
}

/// wgpu attributes for tightly packed `f32` components, plus the stride.
fn vertex_attributes(
    attributes: &[VertexAttribute],
) -> Result<(Vec<wgpu::VertexAttribute>, u64), RenderError> {
    let mut offset = 0;
    let mut out = Vec::with_capacity(attributes.len());
    for attribute in attributes {
        let format = vertex_format(attribute.components).ok_or_else(|| {
            RenderError::Backend(format!(
                "attribute {} has {} components",
                attribute.name, attribute.components
            ))
        })?;
        out.push(wgpu::VertexAttribute {
            format,
            offset,
            shader_location: attribute.location,
        });
        offset += format.size();
    }
    Ok((out, offset))
}

/// Pack resolved uniforms plus camera matrices into the WGSL `Frame` layout.
///
/// `model`, `time`, `light{i}` and `light_color{i}` come from the table;
/// a missing or mistyped entry is an error.
pub fn pack_frame_uniforms(
    resolved: &ResolvedUniforms,
    camera: &FlyCamera,
    light_count: u32,
) -> Result<Vec<u8>, RenderError> {
    let header = FrameHeader {
        projection: camera.projection_matrix().to_cols_array_2d(),
        view: camera.view_matrix().to_cols_array_2d(),
        model: resolved.mat4("model")?.to_cols_array_2d(),
        view_normal: mat3_padded(camera.view_normal_matrix()),
    };

    let mut bytes = Vec::with_capacity(
        std::mem::size_of::<FrameHeader>()
            + light_count as usize * std::mem::size_of::<LightUniform>()
            + std::mem::size_of::<FrameTail>(),
    );
    bytes.extend_from_slice(bytemuck::bytes_of(&header));
    for i in 0..light_count {
        let light = LightUniform {
            direction: resolved.vec3(&format!("light{i}"))?.extend(0.0).to_array(),
            color: resolved.vec3(&format!("light_color{i}"))?.extend(1.0).to_array(),
        };
        bytes.extend_from_slice(bytemuck::bytes_of(&light));
    }
    bytes.extend_from_slice(bytemuck::bytes_of(&FrameTail {
        time: resolved.float("time")?,
        _pad: [0.0; 3],
    }));
    Ok(bytes)
}

/// Rendering context over a wgpu device and surface format.
pub struct WgpuContext<'a> {
    device: &'a wgpu::Device,
    surface_format: wgpu::TextureFormat,
    width: u32,
    height: u32,
    scale_factor: f32,
}

impl<'a> WgpuContext<'a> {
    pub fn new(
        device: &'a wgpu::Device,
        surface_format: wgpu::TextureFormat,
        width: u32,
        height: u32,
        scale_factor: f32,
    ) -> Self {
        Self {
            device,
            surface_format,
            width,
            height,
            scale_factor,
        }
    }
}

impl RenderContext for WgpuContext<'_> {
    type Draw = TerrainDraw;

    /// wgpu only rasterizes one-pixel lines.
    fn limits(&self) -> ContextLimits {
        ContextLimits {
            device_pixel_ratio: self.scale_factor,
            line_width_range: [1.0, 1.0],
        }
    }

    fn create_draw(&mut self, descriptor: DrawDescriptor) -> Result<TerrainDraw, RenderError> {
        TerrainDraw::new(
            self.device,
            self.surface_format,
            self.width,
            self.height,
            descriptor,
        )
    }
}

/// GPU-resident terrain draw: pipeline, mesh buffers and the frame uniform block.
pub struct TerrainDraw {
    pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
    depth_texture: wgpu::TextureView,
    uniforms: UniformTable,
    light_count: u32,
    line_width: f32,
    vertex_count: usize,
}

impl TerrainDraw {
    fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        width: u32,
        height: u32,
        descriptor: DrawDescriptor,
    ) -> Result<Self, RenderError> {
        let DrawDescriptor {
            label,
            vertex_shader,
            vertex_entry,
            fragment_shader,
            fragment_entry,
            mesh,
            uniforms,
            light_count,
            line_width,
        } = descriptor;

        let (attributes, stride) = vertex_attributes(&DrawDescriptor::ATTRIBUTES)?;
        if stride != std::mem::size_of::<TerrainVertex>() as u64 {
            return Err(RenderError::Backend(format!(
                "attribute table spans {stride} bytes, vertex is {}",
                std::mem::size_of::<TerrainVertex>()
            )));
        }

        let uniform_size = std::mem::size_of::<FrameHeader>()
            + light_count as usize * std::mem::size_of::<LightUniform>()
            + std::mem::size_of::<FrameTail>();
        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("frame_uniform_buffer"),
            size: uniform_size as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("frame_bind_group_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("frame_bind_group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("terrain_pipeline_layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        // Shader and pipeline errors are reported here instead of the device's
        // uncaptured-error handler.
        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let vertex_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("terrain_vertex_shader"),
            source: wgpu::ShaderSource::Wgsl(vertex_shader.into()),
        });
        let fragment_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("terrain_fragment_shader"),
            source: wgpu::ShaderSource::Wgsl(fragment_shader.into()),
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(label.as_str()),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &vertex_module,
                entry_point: Some(vertex_entry),
                compilation_options: Default::default(),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: stride,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &attributes,
                }],
            },
            fragment: Some(wgpu::FragmentState {
                module: &fragment_module,
                entry_point: Some(fragment_entry),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: wgpu::TextureFormat::Depth32Float,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: Default::default(),
                bias: Default::default(),
            }),
            multisample: Default::default(),
            multiview: None,
            cache: None,
        });
        if let Some(error) = pollster::block_on(device.pop_error_scope()) {
            tracing::error!("failed to build {label} pipeline: {error}");
            return Err(RenderError::Backend(error.to_string()));
        }

        let vertices: Vec<TerrainVertex> = mesh
            .positions
            .iter()
            .zip(&mesh.uvs)
            .map(|(p, uv)| TerrainVertex {
                position: p.to_array(),
                uv: uv.to_array(),
            })
            .collect();
        let indices = mesh.indices();

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("terrain_vertex_buffer"),
            contents: bytemuck::cast_slice(&vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("terrain_index_buffer"),
            contents: bytemuck::cast_slice(&indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        let depth_texture = Self::create_depth_texture(device, width, height);

        tracing::debug!(
            vertices = vertices.len(),
            indices = indices.len(),
            uniform_bytes = uniform_size,
            line_width,
            "uploaded {label}"
        );

        Ok(Self {
            pipeline,
            uniform_buffer,
            uniform_bind_group,
            vertex_buffer,
            index_buffer,
            index_count: indices.len() as u32,
            depth_texture,
            uniforms,
            light_count,
            line_width,
            vertex_count: vertices.len(),
        })
    }

    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        self.depth_texture = Self::create_depth_texture(device, width, height);
    }

    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    pub fn triangle_count(&self) -> u32 {
        self.index_count / 3
    }

    /// Requested line width; wireframe is not drawn on wgpu, so it is informational.
    pub fn line_width(&self) -> f32 {
        self.line_width
    }

    /// Draw one frame into `view`.
    pub fn render(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        view: &wgpu::TextureView,
        camera: &FlyCamera,
        frame: &FrameState,
    ) -> Result<(), RenderError> {
        let resolved = self.uniforms.resolve(frame);
        let bytes = pack_frame_uniforms(&resolved, camera, self.light_count)?;
        queue.write_buffer(&self.uniform_buffer, 0, &bytes);

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("terrain_encoder"),
        });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("terrain_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: 0.5,
                            g: 0.5,
                            b: 0.7,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });

            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, &self.uniform_bind_group, &[]);
            pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
            pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            pass.draw_indexed(0..self.index_count, 0, 0..1);
        }

        queue.submit(std::iter::once(encoder.finish()));
        Ok(())
    }

    fn create_depth_texture(device: &wgpu::Device, width: u32, height: u32) -> wgpu::TextureView {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("depth_texture"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Depth32Float,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        texture.create_view(&Default::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridscape_render::{LIGHT_COUNT, terrain_descriptor};

    fn resolved(time: f32) -> ResolvedUniforms {
        terrain_descriptor(&ContextLimits::default())
            .unwrap()
            .uniforms
            .resolve(&FrameState::at(time))
    }

    #[test]
    fn frame_block_matches_wgsl_layout() {
        assert_eq!(std::mem::size_of::<FrameHeader>(), 240);
        assert_eq!(std::mem::size_of::<LightUniform>(), 32);
        assert_eq!(std::mem::size_of::<FrameTail>(), 16);

        let bytes = pack_frame_uniforms(&resolved(0.0), &FlyCamera::default(), LIGHT_COUNT).unwrap();
        assert_eq!(bytes.len(), 240 + 32 * LIGHT_COUNT as usize + 16);
        assert_eq!(bytes.len() % 16, 0);
    }

    #[test]
    fn time_lands_after_lights() {
        let bytes = pack_frame_uniforms(&resolved(12.5), &FlyCamera::default(), LIGHT_COUNT).unwrap();
        let offset = 240 + 32 * LIGHT_COUNT as usize;
        let time: f32 = bytemuck::pod_read_unaligned(&bytes[offset..offset + 4]);
        assert_eq!(time, 12.5);
    }

    #[test]
    fn model_is_identity_in_block() {
        let bytes = pack_frame_uniforms(&resolved(0.0), &FlyCamera::default(), LIGHT_COUNT).unwrap();
        let model: [f32; 16] = bytemuck::pod_read_unaligned(&bytes[128..192]);
        assert_eq!(model, glam::Mat4::IDENTITY.to_cols_array());
    }

    #[test]
    fn missing_light_is_an_error() {
        let err = pack_frame_uniforms(&resolved(0.0), &FlyCamera::default(), LIGHT_COUNT + 1)
            .unwrap_err();
        assert!(matches!(err, RenderError::MissingUniform(name) if name == "light2"));
    }

    #[test]
    fn vertex_layout_follows_descriptor_attributes() {
        let (attributes, stride) = vertex_attributes(&DrawDescriptor::ATTRIBUTES).unwrap();
        assert_eq!(stride, std::mem::size_of::<TerrainVertex>() as u64);
        assert_eq!(attributes.len(), 2);
        assert_eq!(attributes[0].shader_location, 0);
        assert_eq!(attributes[0].format, wgpu::VertexFormat::Float32x3);
        assert_eq!(attributes[0].offset, 0);
        assert_eq!(attributes[1].shader_location, 1);
        assert_eq!(attributes[1].format, wgpu::VertexFormat::Float32x2);
        assert_eq!(attributes[1].offset, 12);
    }

    #[test]
    fn unsupported_attribute_width_is_an_error() {
        let wide = [VertexAttribute {
            name: "weights",
            location: 0,
            components: 5,
        }];
        assert!(matches!(
            vertex_attributes(&wide),
            Err(RenderError::Backend(msg)) if msg == "attribute weights has 5 components"
        ));
    }

    fn test_device() -> Option<(wgpu::Device, wgpu::Queue)> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
        let adapter =
            pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions::default()))?;
        pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor::default(), None)).ok()
    }

    #[test]
    #[ignore = "needs a GPU adapter"]
    fn terrain_builds_on_a_device() {
        let Some((device, _queue)) = test_device() else {
            return;
        };
        let mut ctx = WgpuContext::new(&device, wgpu::TextureFormat::Rgba8Unorm, 64, 64, 1.0);
        let draw = gridscape_render::terrain(&mut ctx).unwrap();
        assert_eq!(draw.vertex_count(), 251 * 251);
    }

    #[test]
    #[ignore = "needs a GPU adapter"]
    fn invalid_wgsl_is_a_backend_error() {
        let Some((device, _queue)) = test_device() else {
            return;
        };
        let mut descriptor = terrain_descriptor(&ContextLimits::default()).unwrap();
        descriptor.vertex_shader = "fn vs_main( {".into();
        let mut ctx = WgpuContext::new(&device, wgpu::TextureFormat::Rgba8Unorm, 64, 64, 1.0);
        match ctx.create_draw(descriptor) {
            Err(RenderError::Backend(_)) => {}
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("invalid WGSL produced a draw"),
        }
    }
}
