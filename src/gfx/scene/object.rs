use std::ops::Range;

use cgmath::Matrix4;
use wgpu::{util::DeviceExt, Device};

use super::{scene::GroupId, transform::Transform, vertex::Vertex3D};
use crate::{
    gfx::geometry::GeometryData,
    wgpu_utils::{
        binding_builder::{BindGroupBuilder, BindGroupLayoutBuilder, BindGroupLayoutWithDesc},
        binding_types,
        uniform_buffer::UniformBuffer,
    },
};

/// Triangle mesh with lazily created GPU buffers
pub struct Mesh {
    vertices: Vec<Vertex3D>,
    indices: Vec<u32>,
    vertex_buffer: Option<wgpu::Buffer>,
    index_buffer: Option<wgpu::Buffer>,
    pub index_count: u32,
    pub vertex_count: u32,
}

impl Mesh {
    pub fn from_geometry(geometry: &GeometryData) -> Self {
        let (vertices, indices) = geometry.to_scene_format();
        Self {
            index_count: indices.len() as u32,
            vertex_count: vertices.len() as u32,
            vertices,
            indices,
            vertex_buffer: None,
            index_buffer: None,
        }
    }

    pub fn init_gpu_resources(&mut self, device: &Device, label: &str) {
        if self.vertex_buffer.is_some() {
            return;
        }

        self.vertex_buffer = Some(device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label} Vertex Buffer")),
            contents: bytemuck::cast_slice(&self.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        }));
        self.index_buffer = Some(device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label} Index Buffer")),
            contents: bytemuck::cast_slice(&self.indices),
            usage: wgpu::BufferUsages::INDEX,
        }));
    }
}

/// Per-object uniform: world matrix, its normal matrix and shading flags
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ObjectUniform {
    pub model: [[f32; 4]; 4],
    pub normal_matrix: [[f32; 4]; 4],
    /// receive_shadow, unused, unused, unused
    pub flags: [f32; 4],
}

impl ObjectUniform {
    pub fn new(world: Matrix4<f32>, receive_shadow: bool) -> Self {
        Self {
            model: world.into(),
            normal_matrix: Transform::normal_matrix(&world).into(),
            flags: [if receive_shadow { 1.0 } else { 0.0 }, 0.0, 0.0, 0.0],
        }
    }
}

type ObjectUBO = UniformBuffer<ObjectUniform>;

/// Layout shared by every object's transform bind group
pub struct ObjectBindings {
    bind_group_layout: BindGroupLayoutWithDesc,
}

impl ObjectBindings {
    pub fn new(device: &Device) -> Self {
        Self {
            bind_group_layout: BindGroupLayoutBuilder::new()
                .next_binding_rendering(binding_types::uniform())
                .create(device, "Object Bind Group Layout"),
        }
    }

    pub fn bind_group_layout(&self) -> &wgpu::BindGroupLayout {
        &self.bind_group_layout.layout
    }
}

pub struct ObjectGpuResources {
    transform_ubo: ObjectUBO,
    transform_bind_group: wgpu::BindGroup,
}

/// A mesh placed in the scene
pub struct Object {
    pub name: String,
    pub mesh: Mesh,
    pub material_id: Option<String>,
    pub transform: Transform,
    pub parent: Option<GroupId>,
    pub cast_shadow: bool,
    pub receive_shadow: bool,
    pub visible: bool,
    pub gpu_resources: Option<ObjectGpuResources>, // None until init_gpu_resources called
}

impl Object {
    pub fn new(name: &str, geometry: &GeometryData) -> Self {
        Self {
            name: name.to_string(),
            mesh: Mesh::from_geometry(geometry),
            material_id: None,
            transform: Transform::default(),
            parent: None,
            cast_shadow: false,
            receive_shadow: false,
            visible: true,
            gpu_resources: None,
        }
    }

    pub fn set_material(&mut self, material_id: &str) {
        self.material_id = Some(material_id.to_string());
    }

    pub fn get_material_id(&self) -> Option<&str> {
        self.material_id.as_deref()
    }

    pub fn init_gpu_resources(
        &mut self,
        device: &Device,
        bindings: &ObjectBindings,
        world: Matrix4<f32>,
    ) {
        self.mesh.init_gpu_resources(device, &self.name);

        if self.gpu_resources.is_some() {
            return;
        }

        let transform_ubo =
            ObjectUBO::new_with_data(device, &ObjectUniform::new(world, self.receive_shadow));
        let transform_bind_group = BindGroupBuilder::new(&bindings.bind_group_layout)
            .resource(transform_ubo.binding_resource())
            .create(device, &format!("{} Transform Bind Group", self.name));

        self.gpu_resources = Some(ObjectGpuResources {
            transform_ubo,
            transform_bind_group,
        });
    }

    /// Writes the world matrix to the GPU if it changed since the last write
    pub fn update_transform(&mut self, queue: &wgpu::Queue, world: Matrix4<f32>) {
        let uniform = ObjectUniform::new(world, self.receive_shadow);
        if let Some(gpu_resources) = &mut self.gpu_resources {
            gpu_resources.transform_ubo.update_content(queue, uniform);
        }
    }

    /// Get the transform bind group for rendering
    pub fn get_transform_bind_group(&self) -> Option<&wgpu::BindGroup> {
        self.gpu_resources
            .as_ref()
            .map(|res| &res.transform_bind_group)
    }
}

/// Fluent configuration of an object just added to a [`Scene`](super::Scene)
pub struct ObjectBuilder<'a> {
    object: &'a mut Object,
    index: usize,
}

impl<'a> ObjectBuilder<'a> {
    pub(crate) fn new(object: &'a mut Object, index: usize) -> Self {
        Self { object, index }
    }

    pub fn with_material(self, material_id: &str) -> Self {
        self.object.set_material(material_id);
        self
    }

    pub fn with_position(self, x: f32, y: f32, z: f32) -> Self {
        self.object.transform.position = cgmath::Vector3::new(x, y, z);
        self
    }

    /// Euler rotation in radians, applied X then Y then Z
    pub fn with_rotation(self, x: f32, y: f32, z: f32) -> Self {
        self.object.transform.rotation = cgmath::Vector3::new(x, y, z);
        self
    }

    pub fn with_transform(self, transform: Transform) -> Self {
        self.object.transform = transform;
        self
    }

    pub fn in_group(self, group: GroupId) -> Self {
        self.object.parent = Some(group);
        self
    }

    pub fn cast_shadow(self, cast: bool) -> Self {
        self.object.cast_shadow = cast;
        self
    }

    pub fn receive_shadow(self, receive: bool) -> Self {
        self.object.receive_shadow = receive;
        self
    }

    /// Index of the object in the scene
    pub fn index(&self) -> usize {
        self.index
    }
}

/// Indexed mesh drawing on a render pass
pub trait DrawObject {
    fn draw_mesh(&mut self, mesh: &Mesh);
    fn draw_mesh_instanced(&mut self, mesh: &Mesh, instances: Range<u32>);
}

impl DrawObject for wgpu::RenderPass<'_> {
    fn draw_mesh(&mut self, mesh: &Mesh) {
        self.draw_mesh_instanced(mesh, 0..1);
    }

    fn draw_mesh_instanced(&mut self, mesh: &Mesh, instances: Range<u32>) {
        let (Some(vertex_buffer), Some(index_buffer)) = (&mesh.vertex_buffer, &mesh.index_buffer)
        else {
            return; // Skip drawing if not uploaded
        };

        self.set_vertex_buffer(0, vertex_buffer.slice(..));
        self.set_index_buffer(index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        self.draw_indexed(0..mesh.index_count, 0, instances);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::geometry::generate_box;

    #[test]
    fn test_object_defaults() {
        let object = Object::new("walls", &generate_box(4.0, 2.5, 4.0));
        assert!(object.visible);
        assert!(!object.cast_shadow);
        assert_eq!(object.mesh.vertex_count, 24);
        assert_eq!(object.mesh.index_count, 36);
        assert!(object.get_material_id().is_none());
    }

    #[test]
    fn test_object_uniform_layout() {
        assert_eq!(std::mem::size_of::<ObjectUniform>(), 144);
        let uniform = ObjectUniform::new(Transform::default().matrix(), true);
        assert_eq!(uniform.flags[0], 1.0);
    }
}
