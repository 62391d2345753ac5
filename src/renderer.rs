// renderer.rs — wgpu surface, sphere + marker pipelines, egui overlay

use glam::Mat4;
use image::{GenericImage, Rgba, RgbaImage};
use wgpu::util::DeviceExt;
use winit::window::Window;

use crate::hotspot::Marker;
use crate::mesh::{self, Vertex, SPHERE_RADIUS, SPHERE_SEGMENTS};

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct SceneUniform {
    view_proj: [[f32; 4]; 4],
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct MarkerVertex {
    position: [f32; 3],
    corner: [f32; 2],
    color: [f32; 3],
}

/// Disc corner offsets in quad space, two triangles.
const QUAD_CORNERS: [(usize, [f32; 2]); 6] = [
    (0, [-1.0, -1.0]),
    (1, [1.0, -1.0]),
    (2, [1.0, 1.0]),
    (0, [-1.0, -1.0]),
    (2, [1.0, 1.0]),
    (3, [-1.0, 1.0]),
];

const MARKER_BUFFER_START_CAPACITY: usize = 32;

pub struct Renderer {
    surface: wgpu::Surface,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    pub size: winit::dpi::PhysicalSize<u32>,

    // panorama sphere
    sphere_pipeline: wgpu::RenderPipeline,
    sphere_vertices: wgpu::Buffer,
    sphere_indices: wgpu::Buffer,
    sphere_index_count: u32,
    texture_bind_group_layout: wgpu::BindGroupLayout,
    texture_bind_group: Option<wgpu::BindGroup>,
    sampler: wgpu::Sampler,

    // hotspot markers
    marker_pipeline: wgpu::RenderPipeline,
    marker_vertices: wgpu::Buffer,
    marker_capacity: usize,
    marker_vertex_count: u32,

    // shared camera uniform
    scene_uniform: SceneUniform,
    scene_buffer: wgpu::Buffer,
    scene_bind_group: wgpu::BindGroup,

    // UI overlay
    pub egui_ctx: egui::Context,
    pub egui_state: egui_winit::State,
    egui_renderer: egui_wgpu::Renderer,
}

impl Renderer {
    pub async fn new(window: std::sync::Arc<Window>) -> Self {
        let size = window.inner_size();
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = unsafe { instance.create_surface(window.as_ref()) }.unwrap();
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .unwrap();

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    features: wgpu::Features::empty(),
                    limits: wgpu::Limits::default().using_resolution(adapter.limits()),
                    label: None,
                },
                None,
            )
            .await
            .unwrap();

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .unwrap_or(surface_caps.formats[0]);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
        };
        surface.configure(&device, &config);

        // --- sphere geometry -------------------------------------------
        let sphere = mesh::build_sphere(SPHERE_RADIUS, SPHERE_SEGMENTS, SPHERE_SEGMENTS);
        let sphere_vertices = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("sphere_vertices"),
            contents: bytemuck::cast_slice(&sphere.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let sphere_indices = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("sphere_indices"),
            contents: bytemuck::cast_slice(&sphere.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        let sphere_index_count = sphere.indices.len() as u32;

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            // The panorama wraps horizontally; V clamps at the poles.
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        // --- camera uniform --------------------------------------------
        let scene_uniform = SceneUniform {
            view_proj: Mat4::IDENTITY.to_cols_array_2d(),
        };
        let scene_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("scene_uniform"),
            contents: bytemuck::cast_slice(&[scene_uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let scene_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
                label: Some("scene_bind_group_layout"),
            });
        let scene_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &scene_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: scene_buffer.as_entire_binding(),
            }],
            label: Some("scene_bind_group"),
        });

        let texture_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                entries: &[
                    wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Texture {
                            multisampled: false,
                            view_dimension: wgpu::TextureViewDimension::D2,
                            sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 1,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                        count: None,
                    },
                ],
                label: Some("texture_bind_group_layout"),
            });

        // --- sphere pipeline -------------------------------------------
        let sphere_shader = device.create_shader_module(wgpu::include_wgsl!("shader_sphere.wgsl"));
        let sphere_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("sphere_pipeline_layout"),
            bind_group_layouts: &[&scene_bind_group_layout, &texture_bind_group_layout],
            push_constant_ranges: &[],
        });

        let sphere_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("sphere_pipeline"),
            layout: Some(&sphere_layout),
            vertex: wgpu::VertexState {
                module: &sphere_shader,
                entry_point: "vs_main",
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x2],
                }],
            },
            fragment: Some(wgpu::FragmentState {
                module: &sphere_shader,
                entry_point: "fs_main",
                targets: &[Some(wgpu::ColorTargetState {
                    format: config.format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                // The mesh is wound inward-facing; culling back faces drops
                // the far hemisphere's outside.
                cull_mode: Some(wgpu::Face::Back),
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState {
                count: 1,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            multiview: None,
        });

        // --- marker pipeline -------------------------------------------
        let marker_shader = device.create_shader_module(wgpu::include_wgsl!("shader_marker.wgsl"));
        let marker_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("marker_pipeline_layout"),
            bind_group_layouts: &[&scene_bind_group_layout],
            push_constant_ranges: &[],
        });

        let marker_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("marker_pipeline"),
            layout: Some(&marker_layout),
            vertex: wgpu::VertexState {
                module: &marker_shader,
                entry_point: "vs_main",
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<MarkerVertex>() as wgpu::BufferAddress,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &wgpu::vertex_attr_array![
                        0 => Float32x3, 1 => Float32x2, 2 => Float32x3
                    ],
                }],
            },
            fragment: Some(wgpu::FragmentState {
                module: &marker_shader,
                entry_point: "fs_main",
                targets: &[Some(wgpu::ColorTargetState {
                    format: config.format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState {
                count: 1,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            multiview: None,
        });

        let marker_capacity = MARKER_BUFFER_START_CAPACITY;
        let marker_vertices = Self::make_marker_buffer(&device, marker_capacity);

        // --- egui -------------------------------------------------------
        let egui_ctx = egui::Context::default();
        let mut egui_state = egui_winit::State::new(window.as_ref());
        egui_state.set_pixels_per_point(window.scale_factor() as f32);
        let egui_renderer = egui_wgpu::Renderer::new(&device, config.format, None, 1);

        Self {
            surface,
            device,
            queue,
            config,
            size,
            sphere_pipeline,
            sphere_vertices,
            sphere_indices,
            sphere_index_count,
            texture_bind_group_layout,
            texture_bind_group: None,
            sampler,
            marker_pipeline,
            marker_vertices,
            marker_capacity,
            marker_vertex_count: 0,
            scene_uniform,
            scene_buffer,
            scene_bind_group,
            egui_ctx,
            egui_state,
            egui_renderer,
        }
    }

    fn make_marker_buffer(device: &wgpu::Device, capacity: usize) -> wgpu::Buffer {
        device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("marker_vertices"),
            size: (capacity * 6 * std::mem::size_of::<MarkerVertex>()) as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.size = new_size;
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
        }
    }

    pub fn aspect(&self) -> f32 {
        self.size.width.max(1) as f32 / self.size.height.max(1) as f32
    }

    pub fn update_scene(&mut self, view_proj: Mat4) {
        self.scene_uniform.view_proj = view_proj.to_cols_array_2d();
        self.queue
            .write_buffer(&self.scene_buffer, 0, bytemuck::cast_slice(&[self.scene_uniform]));
    }

    /// Whether a panorama texture is resident. The sphere is only drawn once
    /// this is true, so nothing renders over a black placeholder.
    pub fn has_panorama(&self) -> bool {
        self.texture_bind_group.is_some()
    }

    /// Upload a decoded panorama. Oversized images are scaled down to the
    /// adapter limit; images shorter than 2:1 are letterboxed with black at
    /// the top so the sampler's V range stays meaningful.
    pub fn load_panorama(&mut self, img: RgbaImage) {
        let max_dim = self.device.limits().max_texture_dimension_2d;
        let (src_w, src_h) = img.dimensions();

        let img = if src_w > max_dim || src_h > max_dim {
            let scale = (max_dim as f32 / src_w.max(src_h) as f32).min(1.0);
            let new_w = (src_w as f32 * scale) as u32;
            let new_h = (src_h as f32 * scale) as u32;
            log::warn!(
                "panorama {src_w}x{src_h} exceeds GPU limit {max_dim}, scaling to {new_w}x{new_h}"
            );
            image::DynamicImage::ImageRgba8(img)
                .resize(new_w, new_h, image::imageops::FilterType::Lanczos3)
                .to_rgba8()
        } else {
            img
        };

        let (src_w, src_h) = img.dimensions();
        let target_h = src_w / 2;
        let img = if target_h > 0 && src_h < target_h {
            log::info!("letterboxing {src_w}x{src_h} panorama onto a 2:1 canvas");
            let mut canvas = RgbaImage::from_pixel(src_w, target_h, Rgba([0, 0, 0, 255]));
            let y_offset = target_h - src_h;
            let _ = canvas.copy_from(&img, 0, y_offset);
            canvas
        } else {
            img
        };

        let (width, height) = img.dimensions();
        let texture_size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };

        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            size: texture_size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            label: Some("panorama_texture"),
            view_formats: &[],
        });

        self.queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &img,
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(4 * width),
                rows_per_image: Some(height),
            },
            texture_size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        self.texture_bind_group = Some(self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &self.texture_bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
            label: Some("panorama_bind_group"),
        }));
    }

    /// Drop the current panorama (a new load started or the mount errored).
    pub fn clear_panorama(&mut self) {
        self.texture_bind_group = None;
        self.marker_vertex_count = 0;
    }

    /// Rebuild the marker vertex buffer from the billboarded quads.
    pub fn update_markers(&mut self, markers: &[Marker]) {
        if markers.len() > self.marker_capacity {
            self.marker_capacity = markers.len().next_power_of_two();
            self.marker_vertices = Self::make_marker_buffer(&self.device, self.marker_capacity);
        }

        let mut vertices = Vec::with_capacity(markers.len() * 6);
        for m in markers {
            let corners = m.quad_corners();
            for (idx, corner) in QUAD_CORNERS {
                vertices.push(MarkerVertex {
                    position: corners[idx].to_array(),
                    corner,
                    color: m.color,
                });
            }
        }
        self.marker_vertex_count = vertices.len() as u32;
        if !vertices.is_empty() {
            self.queue
                .write_buffer(&self.marker_vertices, 0, bytemuck::cast_slice(&vertices));
        }
    }

    /// Draw one frame: sphere (if a texture is resident), markers (if
    /// requested), then the egui overlay.
    pub fn render_with_ui(
        &mut self,
        window: &Window,
        draw_markers: bool,
        run_ui: impl FnOnce(&egui::Context),
    ) -> Result<(), wgpu::SurfaceError> {
        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("frame_encoder"),
            });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("scene_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: 0.08,
                            g: 0.08,
                            b: 0.1,
                            a: 1.0,
                        }),
                        store: true,
                    },
                })],
                depth_stencil_attachment: None,
            });

            if let Some(texture_bind_group) = &self.texture_bind_group {
                pass.set_pipeline(&self.sphere_pipeline);
                pass.set_bind_group(0, &self.scene_bind_group, &[]);
                pass.set_bind_group(1, texture_bind_group, &[]);
                pass.set_vertex_buffer(0, self.sphere_vertices.slice(..));
                pass.set_index_buffer(self.sphere_indices.slice(..), wgpu::IndexFormat::Uint32);
                pass.draw_indexed(0..self.sphere_index_count, 0, 0..1);

                // Markers sit inside the sphere and draw over it; they are
                // skipped entirely until the texture is ready.
                if draw_markers && self.marker_vertex_count > 0 {
                    pass.set_pipeline(&self.marker_pipeline);
                    pass.set_bind_group(0, &self.scene_bind_group, &[]);
                    pass.set_vertex_buffer(0, self.marker_vertices.slice(..));
                    pass.draw(0..self.marker_vertex_count, 0..1);
                }
            }
        }

        // --- egui overlay ----------------------------------------------
        let raw_input = self.egui_state.take_egui_input(window);
        let full_output = self.egui_ctx.run(raw_input, run_ui);

        self.egui_state
            .handle_platform_output(window, &self.egui_ctx, full_output.platform_output);
        let clipped_primitives = self.egui_ctx.tessellate(full_output.shapes);

        let screen_descriptor = egui_wgpu::renderer::ScreenDescriptor {
            size_in_pixels: [self.config.width, self.config.height],
            pixels_per_point: window.scale_factor() as f32,
        };

        for (id, delta) in &full_output.textures_delta.set {
            self.egui_renderer
                .update_texture(&self.device, &self.queue, *id, delta);
        }
        self.egui_renderer.update_buffers(
            &self.device,
            &self.queue,
            &mut encoder,
            &clipped_primitives,
            &screen_descriptor,
        );

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("overlay_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: true,
                    },
                })],
                depth_stencil_attachment: None,
            });
            self.egui_renderer
                .render(&mut pass, &clipped_primitives, &screen_descriptor);
        }

        for id in &full_output.textures_delta.free {
            self.egui_renderer.free_texture(id);
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }
}
