//! WGPU-based rendering engine for the haunted winter scene
//!
//! Owns the surface, device and every frame-level GPU resource. Each frame
//! runs up to three passes: the moonlight shadow map (only when the light
//! moved), the lit scene followed by both snow layers, then the UI overlay.

use std::sync::Arc;
use wgpu::TextureFormat;

use crate::{
    error::{Error, Result},
    gfx::{
        lighting::ShadowState,
        resources::{
            global_bindings::{update_global_ubo, GlobalBindings, GlobalUBO},
            texture_resource::TextureResource,
        },
        scene::{object::DrawObject, vertex::Vertex3D, Scene},
    },
    wgpu_utils::{
        binding_builder::{BindGroupBuilder, BindGroupLayoutBuilder, BindGroupLayoutWithDesc},
        binding_types,
    },
};

use super::{
    pipeline_manager::{DepthConfig, PipelineConfig, PipelineManager},
    snow_renderer::SnowRenderer,
};

const SHADOW_MAP_SIZE: u32 = 2048;

const SCENE_PIPELINE: &str = "Scene";
const SHADOW_PIPELINE: &str = "Shadow";
const SNOWFLAKE_PIPELINE: &str = "Snowflakes";
const SNOW_POINTS_PIPELINE: &str = "Snow Points";

/// Core rendering engine managing GPU resources and draw calls
pub struct RenderEngine {
    surface: wgpu::Surface<'static>,
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    config: wgpu::SurfaceConfiguration,
    depth_texture: TextureResource,
    format: TextureFormat,
    pub pipeline_manager: PipelineManager,
    global_ubo: GlobalUBO,
    global_bindings: GlobalBindings,

    shadow_map: TextureResource,
    shadow_layout: BindGroupLayoutWithDesc,
    shadow_bind_group: wgpu::BindGroup,
    shadow_state: ShadowState,

    snow_renderer: SnowRenderer,
}

impl RenderEngine {
    /// Creates a new render engine for the given window
    ///
    /// # Arguments
    /// * `window` - Window surface target for rendering
    /// * `width` - Initial surface width in pixels
    /// * `height` - Initial surface height in pixels
    /// * `vsync` - Present in sync with the display
    pub async fn new(
        window: impl Into<wgpu::SurfaceTarget<'static>>,
        width: u32,
        height: u32,
        vsync: bool,
    ) -> Result<RenderEngine> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance.create_surface(window)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await?;
        log::info!("Using adapter {:?}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("WGPU Device"),
                required_features: wgpu::Features::default(),
                required_limits: wgpu::Limits::downlevel_defaults(),
                memory_hints: wgpu::MemoryHints::default(),
                trace: wgpu::Trace::Off,
            })
            .await?;

        let surface_capabilities = surface.get_capabilities(&adapter);
        // Shaders encode gamma themselves
        let format = surface_capabilities
            .formats
            .iter()
            .copied()
            .find(|f| !f.is_srgb())
            .or_else(|| surface_capabilities.formats.first().copied())
            .ok_or_else(|| Error::GpuNotReady("surface reports no formats".to_string()))?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: width.max(1),
            height: height.max(1),
            present_mode: choose_present_mode(&surface_capabilities.present_modes, vsync),
            alpha_mode: surface_capabilities
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let depth_texture =
            TextureResource::create_depth_texture(&device, &config, "depth_texture");
        let shadow_map = TextureResource::create_shadow_map(&device, SHADOW_MAP_SIZE);

        let shadow_layout = BindGroupLayoutBuilder::new()
            .next_binding_fragment(binding_types::depth_texture_2d())
            .next_binding_fragment(binding_types::sampler(wgpu::SamplerBindingType::Comparison))
            .create(&device, "Shadow Bind Group Layout");
        let shadow_bind_group = BindGroupBuilder::new(&shadow_layout)
            .texture(&shadow_map.view)
            .sampler(&shadow_map.sampler)
            .create(&device, "Shadow Bind Group");

        let global_ubo = GlobalUBO::new(&device);
        let mut global_bindings = GlobalBindings::new(&device);
        global_bindings.create_bind_group(&device, &global_ubo);

        let snow_renderer = SnowRenderer::new(&device);

        let device = Arc::new(device);
        let mut pipeline_manager = PipelineManager::new(device.clone());
        pipeline_manager.load_shader("scene", include_str!("shaders/scene.wgsl"));
        pipeline_manager.load_shader("shadow", include_str!("shaders/shadow.wgsl"));
        pipeline_manager.load_shader("snowflake", include_str!("shaders/snowflake.wgsl"));
        pipeline_manager.load_shader("snow_points", include_str!("shaders/snow_points.wgsl"));

        log::info!("Render engine ready ({}x{}, {:?})", config.width, config.height, format);

        Ok(RenderEngine {
            surface,
            device,
            queue: Arc::new(queue),
            config,
            depth_texture,
            format,
            pipeline_manager,
            global_ubo,
            global_bindings,
            shadow_map,
            shadow_layout,
            shadow_bind_group,
            shadow_state: ShadowState::default(),
            snow_renderer,
        })
    }

    /// Uploads the scene and builds every pipeline that draws it
    ///
    /// Pipelines need the object and material layouts, which exist once the
    /// scene's GPU resources do.
    pub fn prepare_scene(&mut self, scene: &mut Scene) -> Result<()> {
        scene.init_gpu_resources(&self.device, &self.queue);

        let object_layout = scene
            .object_bind_group_layout()
            .cloned()
            .ok_or_else(|| Error::GpuNotReady("object bind group layout".to_string()))?;
        let material_layout = scene
            .material_manager
            .get_bind_group_layout()
            .cloned()
            .ok_or_else(|| Error::GpuNotReady("material bind group layout".to_string()))?;
        let globals_layout = self.global_bindings.bind_group_layout().clone();
        let snow_layout = self.snow_renderer.bind_group_layout().clone();
        let depth_format = TextureResource::DEPTH_FORMAT;

        self.pipeline_manager.register_pipeline(
            SHADOW_PIPELINE,
            PipelineConfig::default_with_shader("shadow")
                .with_label("Shadow Pipeline")
                .with_vertex_only()
                .with_cull_mode(None)
                .with_depth(DepthConfig::opaque(depth_format).with_bias(2, 2.0))
                .with_bind_group_layouts(vec![globals_layout.clone(), object_layout.clone()]),
        );

        // Planes are seen from both sides
        self.pipeline_manager.register_pipeline(
            SCENE_PIPELINE,
            PipelineConfig::default_with_shader("scene")
                .with_label("Scene Pipeline")
                .with_cull_mode(None)
                .with_depth(DepthConfig::opaque(depth_format))
                .with_color_target(self.format, Some(wgpu::BlendState::REPLACE))
                .with_bind_group_layouts(vec![
                    globals_layout.clone(),
                    object_layout,
                    material_layout,
                    self.shadow_layout.layout.clone(),
                ]),
        );

        self.pipeline_manager.register_pipeline(
            SNOWFLAKE_PIPELINE,
            PipelineConfig::default_with_shader("snowflake")
                .with_label("Snowflake Pipeline")
                .with_vertex_buffers(vec![
                    Vertex3D::desc(),
                    SnowRenderer::flake_instance_layout(),
                ])
                .with_depth(DepthConfig::opaque(depth_format))
                .with_color_target(self.format, Some(wgpu::BlendState::ALPHA_BLENDING))
                .with_bind_group_layouts(vec![globals_layout.clone(), snow_layout.clone()]),
        );

        // Translucent sprites test depth but never occlude each other
        self.pipeline_manager.register_pipeline(
            SNOW_POINTS_PIPELINE,
            PipelineConfig::default_with_shader("snow_points")
                .with_label("Snow Points Pipeline")
                .with_vertex_buffers(vec![SnowRenderer::drift_instance_layout()])
                .with_cull_mode(None)
                .with_depth(DepthConfig::read_only(depth_format))
                .with_color_target(self.format, Some(wgpu::BlendState::ALPHA_BLENDING))
                .with_bind_group_layouts(vec![globals_layout, snow_layout]),
        );

        self.pipeline_manager.create_all_pipelines()?;
        let stats = self.pipeline_manager.get_stats();
        log::info!(
            "{} pipelines ready from {} shaders",
            stats.total_pipelines,
            stats.loaded_shaders
        );
        self.shadow_state.invalidate();
        Ok(())
    }

    /// Syncs uniforms, transforms, materials and snow with the GPU
    ///
    /// Unchanged uniforms and clean particle pools are skipped.
    pub fn update(&mut self, scene: &mut Scene) {
        update_global_ubo(
            &mut self.global_ubo,
            &self.queue,
            &scene.camera_manager.camera,
            &scene.lighting,
            &scene.fog,
        );
        scene.update_gpu_resources(&self.device, &self.queue);
        if let Some(snow) = scene.snow.as_mut() {
            self.snow_renderer.upload(&self.device, &self.queue, snow);
        }
    }

    /// Renders a frame with an optional UI overlay
    ///
    /// A lost or outdated surface is reconfigured and the frame skipped.
    ///
    /// # Arguments
    /// * `scene` - Scene containing objects to render
    /// * `ui_callback` - Optional function that renders UI elements
    pub fn render_frame<F>(&mut self, scene: &Scene, ui_callback: Option<F>)
    where
        F: FnOnce(&wgpu::Device, &wgpu::Queue, &mut wgpu::CommandEncoder, &wgpu::TextureView),
    {
        let Some(global_bind_group) = self.global_bindings.bind_group() else {
            log::warn!("Global bind group missing, skipping frame");
            return;
        };

        let surface_texture = match self.surface.get_current_texture() {
            Ok(texture) => texture,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::debug!("Surface lost or outdated, reconfiguring");
                self.surface.configure(&self.device, &self.config);
                return;
            }
            Err(wgpu::SurfaceError::Timeout) => {
                log::debug!("Surface timed out, skipping frame");
                return;
            }
            Err(e) => {
                log::warn!("Failed to acquire surface texture: {e}");
                return;
            }
        };

        let surface_texture_view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        // PASS 1: shadow map, only when the moonlight moved
        let moon = scene.lighting.moon;
        if self.shadow_state.needs_update(&moon) {
            if let Some(shadow_pipeline) = self.pipeline_manager.pipeline(SHADOW_PIPELINE) {
                log::debug!("Rendering shadow map for moon at {:?}", moon.position);
                let mut shadow_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("Shadow Depth Pass"),
                    color_attachments: &[],
                    depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                        view: &self.shadow_map.view,
                        depth_ops: Some(wgpu::Operations {
                            load: wgpu::LoadOp::Clear(1.0),
                            store: wgpu::StoreOp::Store,
                        }),
                        stencil_ops: None,
                    }),
                    occlusion_query_set: None,
                    timestamp_writes: None,
                });

                shadow_pass.set_pipeline(shadow_pipeline);
                shadow_pass.set_bind_group(0, global_bind_group, &[]);
                for object in scene.objects.iter() {
                    if !object.cast_shadow || !scene.is_visible(object) {
                        continue;
                    }
                    if let Some(transform) = object.get_transform_bind_group() {
                        shadow_pass.set_bind_group(1, transform, &[]);
                        shadow_pass.draw_mesh(&object.mesh);
                    }
                }
                drop(shadow_pass);
                self.shadow_state.mark_rendered(&moon);
            }
        }

        // PASS 2: lit scene followed by both snow layers
        {
            let [r, g, b] = scene.background.map(|c| f64::from(c).powf(1.0 / 2.2));
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Main Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &surface_texture_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color { r, g, b, a: 1.0 }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            if let Some(pipeline) = self.pipeline_manager.pipeline(SCENE_PIPELINE) {
                render_pass.set_pipeline(pipeline);
                render_pass.set_bind_group(0, global_bind_group, &[]);
                render_pass.set_bind_group(3, &self.shadow_bind_group, &[]);

                for object in scene.objects.iter() {
                    if !scene.is_visible(object) {
                        continue;
                    }
                    let material = scene.get_material_for_object(object);
                    let (Some(material_bind_group), Some(transform)) =
                        (material.get_bind_group(), object.get_transform_bind_group())
                    else {
                        log::debug!("Skipping '{}': GPU resources missing", object.name);
                        continue;
                    };
                    render_pass.set_bind_group(1, transform, &[]);
                    render_pass.set_bind_group(2, material_bind_group, &[]);
                    render_pass.draw_mesh(&object.mesh);
                }
            }

            if scene.snow.is_some() {
                if let Some(pipeline) = self.pipeline_manager.pipeline(SNOWFLAKE_PIPELINE) {
                    render_pass.set_bind_group(0, global_bind_group, &[]);
                    self.snow_renderer.draw_flakes(&mut render_pass, pipeline);
                }
                if let Some(pipeline) = self.pipeline_manager.pipeline(SNOW_POINTS_PIPELINE) {
                    render_pass.set_bind_group(0, global_bind_group, &[]);
                    self.snow_renderer.draw_drift(&mut render_pass, pipeline);
                }
            }
        }

        // PASS 3: UI overlay
        if let Some(ui_callback) = ui_callback {
            ui_callback(
                &self.device,
                &self.queue,
                &mut encoder,
                &surface_texture_view,
            );
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        surface_texture.present();
    }

    /// Resizes the surface and recreates the depth buffer
    ///
    /// Zero sizes (minimized windows) are ignored. The shadow map keeps its
    /// fixed resolution.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }

        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
        self.depth_texture =
            TextureResource::create_depth_texture(&self.device, &self.config, "depth_texture");
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.format
    }
}

/// Fifo is always supported; Immediate only where the surface offers it
fn choose_present_mode(available: &[wgpu::PresentMode], vsync: bool) -> wgpu::PresentMode {
    if !vsync && available.contains(&wgpu::PresentMode::Immediate) {
        wgpu::PresentMode::Immediate
    } else {
        wgpu::PresentMode::Fifo
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_present_mode_falls_back_to_fifo() {
        let modes = [wgpu::PresentMode::Fifo, wgpu::PresentMode::Immediate];
        assert_eq!(choose_present_mode(&modes, true), wgpu::PresentMode::Fifo);
        assert_eq!(choose_present_mode(&modes, false), wgpu::PresentMode::Immediate);
        assert_eq!(
            choose_present_mode(&[wgpu::PresentMode::Fifo], false),
            wgpu::PresentMode::Fifo
        );
    }
}
