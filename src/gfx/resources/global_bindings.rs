//! Global uniform bindings for camera, lights and fog
//!
//! One uniform block per frame, bound to slot 0 of every pipeline.

use crate::{
    gfx::{
        camera::{camera_utils::Camera, orbit_camera::OrbitCamera},
        lighting::{Fog, Lighting},
    },
    wgpu_utils::{
        binding_builder::{BindGroupBuilder, BindGroupLayoutBuilder, BindGroupLayoutWithDesc},
        binding_types,
        uniform_buffer::UniformBuffer,
    },
};

/// Global uniform buffer content
///
/// MUST match the `Globals` struct in the shaders exactly. Every member is a
/// `vec4` or `mat4` so the WGSL layout needs no manual padding.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GlobalUniform {
    pub view_proj: [[f32; 4]; 4],
    pub light_view_proj: [[f32; 4]; 4],
    pub camera_position: [f32; 4],
    /// Camera right axis, used to face point sprites
    pub camera_right: [f32; 4],
    pub camera_up: [f32; 4],
    /// rgb + intensity
    pub ambient: [f32; 4],
    /// Direction towards the moon + intensity
    pub moon_direction: [f32; 4],
    /// rgb + shadow flag
    pub moon_color: [f32; 4],
    /// xyz + range
    pub point_position: [f32; 4],
    /// rgb + intensity
    pub point_color: [f32; 4],
    pub fog_color: [f32; 4],
    /// near, far, unused, unused
    pub fog_range: [f32; 4],
}

impl GlobalUniform {
    /// Packs the camera, lights and fog for the current frame
    pub fn new(camera: &OrbitCamera, lighting: &Lighting, fog: &Fog) -> Self {
        let (right, up) = camera.basis();
        let moon = &lighting.moon;
        let direction = moon.direction();
        let door = &lighting.door;

        Self {
            view_proj: camera.build_view_projection_matrix().into(),
            light_view_proj: moon.view_proj().into(),
            camera_position: [camera.eye.x, camera.eye.y, camera.eye.z, 1.0],
            camera_right: [right.x, right.y, right.z, 0.0],
            camera_up: [up.x, up.y, up.z, 0.0],
            ambient: extend(lighting.ambient.color, lighting.ambient.intensity),
            moon_direction: [direction.x, direction.y, direction.z, moon.intensity],
            moon_color: extend(moon.color, if moon.cast_shadow { 1.0 } else { 0.0 }),
            point_position: extend(door.position, door.range),
            point_color: extend(door.color, door.intensity),
            fog_color: extend(fog.color, 1.0),
            fog_range: [fog.near, fog.far, 0.0, 0.0],
        }
    }
}

fn extend(v: [f32; 3], w: f32) -> [f32; 4] {
    [v[0], v[1], v[2], w]
}

/// Type alias for the global uniform buffer
pub type GlobalUBO = UniformBuffer<GlobalUniform>;

/// Updates the global uniform buffer from the scene's camera and lights
///
/// Unchanged frames (a still camera with static lights) skip the write.
pub fn update_global_ubo(
    ubo: &mut GlobalUBO,
    queue: &wgpu::Queue,
    camera: &OrbitCamera,
    lighting: &Lighting,
    fog: &Fog,
) {
    ubo.update_content(queue, GlobalUniform::new(camera, lighting, fog));
}

/// Manages bind group layouts and bind groups for global uniforms
pub struct GlobalBindings {
    bind_group_layout: BindGroupLayoutWithDesc,
    bind_group: Option<wgpu::BindGroup>,
}

impl GlobalBindings {
    /// Sets up the layout; the bind group is created by `create_bind_group`
    pub fn new(device: &wgpu::Device) -> Self {
        let bind_group_layout = BindGroupLayoutBuilder::new()
            .next_binding_rendering(binding_types::uniform())
            .create(device, "Globals Bind Group Layout");

        GlobalBindings {
            bind_group_layout,
            bind_group: None,
        }
    }

    pub fn create_bind_group(&mut self, device: &wgpu::Device, ubo: &GlobalUBO) {
        self.bind_group = Some(
            BindGroupBuilder::new(&self.bind_group_layout)
                .resource(ubo.binding_resource())
                .create(device, "Global Bind Group"),
        );
    }

    pub fn bind_group_layout(&self) -> &wgpu::BindGroupLayout {
        &self.bind_group_layout.layout
    }

    /// Returns the bind group, if `create_bind_group` has run
    pub fn bind_group(&self) -> Option<&wgpu::BindGroup> {
        self.bind_group.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::Vector3;

    #[test]
    fn test_uniform_size_is_vec4_aligned() {
        assert_eq!(std::mem::size_of::<GlobalUniform>(), 288);
        assert_eq!(std::mem::size_of::<GlobalUniform>() % 16, 0);
    }

    #[test]
    fn test_packs_lights_and_fog() {
        let camera = OrbitCamera::looking_at(
            Vector3::new(0.0, 1.5, 8.0),
            Vector3::new(0.0, 1.0, 2.0),
            1.5,
        );
        let lighting = Lighting::default();
        let uniform = GlobalUniform::new(&camera, &lighting, &Fog::default());

        assert_eq!(uniform.point_position, [0.0, 2.2, 2.7, 7.0]);
        assert_eq!(uniform.moon_direction[3], 0.5);
        assert_eq!(uniform.moon_color[3], 1.0);
        assert_eq!(uniform.fog_range[..2], [1.0, 15.0]);
        assert!((uniform.camera_position[2] - 8.0).abs() < 1e-4);
    }
}
