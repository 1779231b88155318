//! Snow rendering
//!
//! Both snow layers are drawn with GPU instancing straight from the particle
//! pools' storage: flakes as one small sphere per [`Snowflake`], drift points
//! as camera-facing quads built in the vertex shader from the flat
//! coordinate buffer. Buffers are rewritten only when a pool is dirty.

use wgpu::{Buffer, Device, Queue, RenderPass, RenderPipeline};

use crate::{
    config::LayerStyle,
    gfx::{
        geometry::generate_sphere,
        scene::object::{DrawObject, Mesh},
    },
    simulation::{
        particles::{ParticlePool, ParticleStorage, Snowflake},
        snow::SnowField,
    },
    wgpu_utils::{
        binding_builder::{BindGroupBuilder, BindGroupLayoutBuilder, BindGroupLayoutWithDesc},
        binding_types,
        uniform_buffer::UniformBuffer,
    },
};

/// Vertices per drift quad (two triangles, no index buffer)
const QUAD_VERTICES: u32 = 6;

/// Look of a snow layer as seen by the shaders
///
/// MUST match `SnowStyle` in `snowflake.wgsl` and `snow_points.wgsl`.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SnowStyleUniform {
    /// rgb + opacity
    pub color: [f32; 4],
    /// size, unused, unused, unused
    pub params: [f32; 4],
}

impl From<LayerStyle> for SnowStyleUniform {
    fn from(style: LayerStyle) -> Self {
        let [r, g, b] = style.color;
        Self {
            color: [r, g, b, style.opacity],
            params: [style.size, 0.0, 0.0, 0.0],
        }
    }
}

/// Instance buffer plus style bind group of one layer
struct LayerBuffers {
    instances: Buffer,
    instance_count: u32,
    style: UniformBuffer<SnowStyleUniform>,
    bind_group: wgpu::BindGroup,
}

impl LayerBuffers {
    fn new(
        device: &Device,
        layout: &BindGroupLayoutWithDesc,
        bytes: usize,
        instance_count: u32,
        style: SnowStyleUniform,
        label: &str,
    ) -> Self {
        let instances = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(&format!("{label} Instance Buffer")),
            size: bytes.max(4) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let style = UniformBuffer::new_with_data(device, &style);
        let bind_group = BindGroupBuilder::new(layout)
            .resource(style.binding_resource())
            .create(device, &format!("{label} Style Bind Group"));

        Self {
            instances,
            instance_count,
            style,
            bind_group,
        }
    }

    /// Rewrites the instances if the pool moved, recreating on a size change
    fn sync<S: ParticleStorage>(
        slot: &mut Option<Self>,
        device: &Device,
        queue: &Queue,
        layout: &BindGroupLayoutWithDesc,
        pool: &mut ParticlePool<S>,
        style: SnowStyleUniform,
        label: &str,
    ) {
        let count = pool.len() as u32;
        if slot.as_ref().map_or(true, |layer| layer.instance_count != count) {
            log::debug!("Allocating {label} buffers for {count} particles");
            *slot = Some(Self::new(
                device,
                layout,
                pool.storage().as_bytes().len(),
                count,
                style,
                label,
            ));
        }
        let Some(layer) = slot.as_mut() else {
            return;
        };

        layer.style.update_content(queue, style);
        if pool.is_dirty() {
            let bytes = pool.storage().as_bytes();
            if !bytes.is_empty() {
                queue.write_buffer(&layer.instances, 0, bytes);
            }
            pool.mark_uploaded();
        }
    }
}

/// GPU side of the snow field
pub struct SnowRenderer {
    style_layout: BindGroupLayoutWithDesc,
    flake_mesh: Option<Mesh>,
    flake_radius: f32,
    flakes: Option<LayerBuffers>,
    drift: Option<LayerBuffers>,
}

impl SnowRenderer {
    pub fn new(device: &Device) -> Self {
        Self {
            style_layout: BindGroupLayoutBuilder::new()
                .next_binding_rendering(binding_types::uniform())
                .create(device, "Snow Style Bind Group Layout"),
            flake_mesh: None,
            flake_radius: 0.0,
            flakes: None,
            drift: None,
        }
    }

    /// Layout of the per-layer style bind group (group 1 of both snow pipelines)
    pub fn bind_group_layout(&self) -> &wgpu::BindGroupLayout {
        &self.style_layout.layout
    }

    /// Per-instance flake position at location 3, after the mesh attributes
    pub fn flake_instance_layout() -> wgpu::VertexBufferLayout<'static> {
        const ATTRIBUTES: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![3 => Float32x3];
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Snowflake>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &ATTRIBUTES,
        }
    }

    /// Per-instance drift point centre at location 0
    pub fn drift_instance_layout() -> wgpu::VertexBufferLayout<'static> {
        const ATTRIBUTES: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x3];
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &ATTRIBUTES,
        }
    }

    /// Uploads whatever changed in the snow field since the last call
    pub fn upload(&mut self, device: &Device, queue: &Queue, snow: &mut SnowField) {
        let radius = snow.flake_style.size;
        if self.flake_mesh.is_none() || self.flake_radius != radius {
            let mut mesh = Mesh::from_geometry(&generate_sphere(radius, 8, 8));
            mesh.init_gpu_resources(device, "Snowflake");
            self.flake_mesh = Some(mesh);
            self.flake_radius = radius;
        }

        LayerBuffers::sync(
            &mut self.flakes,
            device,
            queue,
            &self.style_layout,
            &mut snow.flakes,
            snow.flake_style.into(),
            "Snowflake",
        );
        LayerBuffers::sync(
            &mut self.drift,
            device,
            queue,
            &self.style_layout,
            &mut snow.drift,
            snow.drift_style.into(),
            "Snow Drift",
        );
    }

    /// Draws every flake as an instanced sphere
    pub fn draw_flakes(&self, render_pass: &mut RenderPass<'_>, pipeline: &RenderPipeline) {
        let (Some(mesh), Some(layer)) = (&self.flake_mesh, &self.flakes) else {
            return;
        };
        if layer.instance_count == 0 {
            return;
        }
        render_pass.set_pipeline(pipeline);
        render_pass.set_bind_group(1, &layer.bind_group, &[]);
        render_pass.set_vertex_buffer(1, layer.instances.slice(..));
        render_pass.draw_mesh_instanced(mesh, 0..layer.instance_count);
    }

    /// Draws every drift point as a camera-facing quad
    pub fn draw_drift(&self, render_pass: &mut RenderPass<'_>, pipeline: &RenderPipeline) {
        let Some(layer) = &self.drift else {
            return;
        };
        if layer.instance_count == 0 {
            return;
        }
        render_pass.set_pipeline(pipeline);
        render_pass.set_bind_group(1, &layer.bind_group, &[]);
        render_pass.set_vertex_buffer(0, layer.instances.slice(..));
        render_pass.draw(0..QUAD_VERTICES, 0..layer.instance_count);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SnowConfig;

    #[test]
    fn test_style_uniform_packs_opacity_and_size() {
        let style = SnowConfig::default().drift.style;
        let uniform = SnowStyleUniform::from(style);
        assert_eq!(uniform.color[3], 0.8);
        assert_eq!(uniform.params[0], 0.2);
        assert_eq!(std::mem::size_of::<SnowStyleUniform>(), 32);
    }

    #[test]
    fn test_instance_layouts_match_storage() {
        assert_eq!(SnowRenderer::flake_instance_layout().array_stride, 12);
        assert_eq!(SnowRenderer::drift_instance_layout().array_stride, 12);
        assert_eq!(
            SnowRenderer::flake_instance_layout().attributes[0].shader_location,
            3
        );
    }
}
