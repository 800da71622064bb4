//! The wgpu side of scene rendering.
//!
//! [`ScenePass`] owns one uniform buffer per constant region, the filled and
//! wireframe pipelines and a depth buffer. Each frame it waits for a free region,
//! lets the [`Renderer`] walk the scene into that region, uploads it and submits.
//!
//! # Bind Groups
//!
//! - **Group 0**: [`InstanceConstants`] for the current node, selected with a
//!   dynamic offset into the frame's region buffer.

use std::num::NonZeroU64;

use crate::config::RendererConfig;
use crate::error::{Result, SceneError};
use crate::gpu::GpuContext;
use crate::mesh::{Mesh, MeshId, MeshLibrary, Vertex3d};
use crate::render::{FillMode, FrameStats, FrameThrottle, InstanceConstants, RenderEncoder, Renderer};
use crate::scene::{Node, Scene};

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

pub struct ScenePass {
    renderer: Renderer,
    throttle: FrameThrottle,
    fill_pipeline: wgpu::RenderPipeline,
    /// `None` when the device cannot rasterize lines.
    wireframe_pipeline: Option<wgpu::RenderPipeline>,
    constant_buffers: Vec<wgpu::Buffer>,
    constant_bind_groups: Vec<wgpu::BindGroup>,
    depth_view: wgpu::TextureView,
    depth_size: (u32, u32),
}

impl ScenePass {
    /// Build the pipelines and per-region buffers.
    ///
    /// Fails if the shader or pipelines do not validate, or if `config` asks for
    /// a constant alignment the device cannot honour.
    pub fn new(gpu: &GpuContext, config: RendererConfig) -> Result<Self> {
        let device = &gpu.device;

        let min_alignment = device.limits().min_uniform_buffer_offset_alignment as usize;
        if config.constant_alignment < min_alignment {
            return Err(SceneError::InvalidConfig(format!(
                "constant_alignment {} is below the device minimum of {}",
                config.constant_alignment, min_alignment
            )));
        }
        let renderer = Renderer::new(config)?;
        let config = renderer.config();

        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Scene Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("../shaders/scene.wgsl").into()),
        });
        if let Some(error) = pollster::block_on(device.pop_error_scope()) {
            return Err(SceneError::ShaderCompilation(error.to_string()));
        }

        device.push_error_scope(wgpu::ErrorFilter::Validation);

        let constant_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Instance Constants Bind Group Layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: true,
                        min_binding_size: NonZeroU64::new(InstanceConstants::SIZE as u64),
                    },
                    count: None,
                }],
            });

        let constant_buffers: Vec<wgpu::Buffer> = (0..config.frames_in_flight)
            .map(|region| {
                device.create_buffer(&wgpu::BufferDescriptor {
                    label: Some(&format!("Instance Constants Region {region}")),
                    size: config.constant_buffer_length as u64,
                    usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                    mapped_at_creation: false,
                })
            })
            .collect();

        let constant_bind_groups = constant_buffers
            .iter()
            .map(|buffer| {
                device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some("Instance Constants Bind Group"),
                    layout: &constant_bind_group_layout,
                    entries: &[wgpu::BindGroupEntry {
                        binding: 0,
                        resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                            buffer,
                            offset: 0,
                            size: NonZeroU64::new(InstanceConstants::SIZE as u64),
                        }),
                    }],
                })
            })
            .collect();

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Scene Pipeline Layout"),
            bind_group_layouts: &[&constant_bind_group_layout],
            push_constant_ranges: &[],
        });

        let fill_pipeline = create_pipeline(
            gpu,
            &pipeline_layout,
            &shader,
            wgpu::PolygonMode::Fill,
            "Scene Fill Pipeline",
        );
        let wireframe_pipeline = gpu.supports_wireframe().then(|| {
            create_pipeline(
                gpu,
                &pipeline_layout,
                &shader,
                wgpu::PolygonMode::Line,
                "Scene Wireframe Pipeline",
            )
        });

        if let Some(error) = pollster::block_on(device.pop_error_scope()) {
            return Err(SceneError::PipelineCreation(error.to_string()));
        }

        let depth_view = create_depth_view(gpu);

        Ok(Self {
            throttle: FrameThrottle::new(renderer.config().frames_in_flight),
            renderer,
            fill_pipeline,
            wireframe_pipeline,
            constant_buffers,
            constant_bind_groups,
            depth_view,
            depth_size: (gpu.width(), gpu.height()),
        })
    }

    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    /// Recreate the depth buffer if the surface changed size.
    pub fn ensure_depth_size(&mut self, gpu: &GpuContext) {
        if self.depth_size != (gpu.width(), gpu.height()) {
            self.depth_view = create_depth_view(gpu);
            self.depth_size = (gpu.width(), gpu.height());
        }
    }

    /// Render and present one frame of `scene` from `point_of_view`.
    ///
    /// Blocks while every region is still in use by the GPU. Returns `None` when
    /// the frame was skipped, either because no surface texture was available or
    /// because there is nothing to look through.
    pub fn render_frame(
        &mut self,
        gpu: &GpuContext,
        scene: &Scene,
        point_of_view: Option<&Node>,
        meshes: &MeshLibrary<Mesh>,
    ) -> Option<FrameStats> {
        self.ensure_depth_size(gpu);

        let token = self.throttle.acquire_with(|| {
            let _ = gpu.device.poll(wgpu::PollType::Poll);
        });

        let output = match gpu.surface.get_current_texture() {
            Ok(output) => output,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::debug!("Surface lost or outdated; reconfiguring");
                gpu.reconfigure();
                return None;
            }
            Err(e) => {
                log::warn!("Skipping frame: {e}");
                return None;
            }
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Scene Encoder"),
            });

        let stats = {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Scene Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.renderer.config().clear_color.into()),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            let mut pass_encoder = WgpuEncoder {
                render_pass: &mut render_pass,
                fill_pipeline: &self.fill_pipeline,
                wireframe_pipeline: self.wireframe_pipeline.as_ref(),
                constant_bind_groups: &self.constant_bind_groups,
                meshes,
            };
            self.renderer
                .draw(scene, point_of_view, gpu.aspect(), &mut pass_encoder)
        };

        match stats {
            Some(stats) => {
                let ring = self.renderer.ring();
                let used = (stats.instances * ring.stride()).min(ring.capacity());
                gpu.queue.write_buffer(
                    &self.constant_buffers[stats.region],
                    0,
                    &ring.region(stats.region)[..used],
                );
                gpu.queue.submit(std::iter::once(encoder.finish()));
                // The region is free again once the GPU has consumed this submission.
                gpu.queue.on_submitted_work_done(move || drop(token));
            }
            None => {
                drop(token);
                gpu.queue.submit(std::iter::once(encoder.finish()));
            }
        }

        output.present();
        stats
    }
}

fn create_pipeline(
    gpu: &GpuContext,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    polygon_mode: wgpu::PolygonMode,
    label: &str,
) -> wgpu::RenderPipeline {
    gpu.device
        .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(label),
            layout: Some(layout),
            vertex: wgpu::VertexState {
                module: shader,
                entry_point: Some("vs_main"),
                buffers: &[Vertex3d::LAYOUT],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: gpu.config.format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: Some(wgpu::Face::Back),
                front_face: wgpu::FrontFace::Ccw,
                polygon_mode,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        })
}

fn create_depth_view(gpu: &GpuContext) -> wgpu::TextureView {
    let texture = gpu.device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Scene Depth Texture"),
        size: wgpu::Extent3d {
            width: gpu.width(),
            height: gpu.height(),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}

/// Replays the renderer's commands into a wgpu render pass.
struct WgpuEncoder<'a, 'pass> {
    render_pass: &'a mut wgpu::RenderPass<'pass>,
    fill_pipeline: &'a wgpu::RenderPipeline,
    wireframe_pipeline: Option<&'a wgpu::RenderPipeline>,
    constant_bind_groups: &'a [wgpu::BindGroup],
    meshes: &'a MeshLibrary<Mesh>,
}

impl RenderEncoder for WgpuEncoder<'_, '_> {
    fn set_instance_constants(&mut self, region: usize, offset: usize) {
        self.render_pass
            .set_bind_group(0, &self.constant_bind_groups[region], &[offset as u32]);
    }

    fn draw_mesh(&mut self, mesh_id: MeshId, fill_mode: FillMode) {
        let Some(mesh) = self.meshes.get(mesh_id) else {
            log::debug!("Skipping unknown {mesh_id:?}");
            return;
        };

        // Without line rasterization highlighted nodes fall back to the fill pipeline.
        let pipeline = match fill_mode {
            FillMode::Wireframe => self.wireframe_pipeline.unwrap_or(self.fill_pipeline),
            FillMode::Fill => self.fill_pipeline,
        };
        self.render_pass.set_pipeline(pipeline);

        for (slot, binding) in mesh.vertex_buffers.iter().enumerate() {
            self.render_pass
                .set_vertex_buffer(slot as u32, binding.buffer.slice(binding.offset..));
        }

        for submesh in &mesh.submeshes {
            if submesh.topology != wgpu::PrimitiveTopology::TriangleList {
                log::debug!("Skipping {:?} submesh of {mesh_id:?}", submesh.topology);
                continue;
            }
            self.render_pass.set_index_buffer(
                submesh.index_buffer.slice(submesh.index_offset..),
                submesh.index_format,
            );
            self.render_pass
                .draw_indexed(0..submesh.index_count, 0, 0..1);
        }
    }
}
