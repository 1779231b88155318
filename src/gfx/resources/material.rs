//! Material system
//!
//! Provides material definitions and centralized management with GPU resource handling.
//! Materials are stored in MaterialManager and objects reference them by ID.

use std::collections::HashMap;
use wgpu::Device;

use super::{procedural::ProceduralTexture, texture_resource::TextureResource};
use crate::wgpu_utils::{
    binding_builder::{BindGroupBuilder, BindGroupLayoutBuilder, BindGroupLayoutWithDesc},
    binding_types,
    uniform_buffer::UniformBuffer,
};

/// Material ID for referencing materials
pub type MaterialId = String;

/// GPU uniform data for materials
///
/// `params` packs roughness, metallic, the unlit flag and whether a colour
/// map is bound.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MaterialUniform {
    pub base_color: [f32; 4],
    pub emissive: [f32; 4],
    pub params: [f32; 4],
}

type MaterialUBO = UniformBuffer<MaterialUniform>;

/// Shared layout for every material bind group
///
/// Binding 0 is the material uniform, binding 1 the colour map and binding 2
/// its sampler. Materials without a map bind a 1x1 white texture.
pub struct MaterialBindings {
    bind_group_layout: BindGroupLayoutWithDesc,
    fallback_map: TextureResource,
}

impl MaterialBindings {
    pub fn new(device: &Device, queue: &wgpu::Queue) -> Self {
        let bind_group_layout = BindGroupLayoutBuilder::new()
            .next_binding_fragment(binding_types::uniform())
            .next_binding_fragment(binding_types::texture_2d())
            .next_binding_fragment(binding_types::sampler(wgpu::SamplerBindingType::Filtering))
            .create(device, "Material Bind Group Layout");

        let fallback_map = TextureResource::create_from_rgba_data(
            device,
            queue,
            &[255, 255, 255, 255],
            1,
            1,
            "White Fallback Map",
        );

        MaterialBindings {
            bind_group_layout,
            fallback_map,
        }
    }

    pub fn bind_group_layout(&self) -> &wgpu::BindGroupLayout {
        &self.bind_group_layout.layout
    }

    fn create_bind_group(
        &self,
        device: &Device,
        ubo: &MaterialUBO,
        map: Option<&TextureResource>,
        label: &str,
    ) -> wgpu::BindGroup {
        let map = map.unwrap_or(&self.fallback_map);
        BindGroupBuilder::new(&self.bind_group_layout)
            .resource(ubo.binding_resource())
            .texture(&map.view)
            .sampler(&map.sampler)
            .create(device, label)
    }
}

struct MaterialGpu {
    ubo: MaterialUBO,
    map: Option<TextureResource>,
    bind_group: wgpu::BindGroup,
}

/// Surface appearance shared by any number of objects
///
/// `unlit` materials skip lighting but are still fogged.
pub struct Material {
    pub name: String,
    pub base_color: [f32; 4],
    pub metallic: f32,
    pub roughness: f32,
    pub emissive: [f32; 3],
    pub emissive_intensity: f32,
    pub unlit: bool,
    pub color_map: Option<ProceduralTexture>,

    gpu: Option<MaterialGpu>,
}

impl Default for Material {
    fn default() -> Self {
        Self::new("default", [0.8, 0.8, 0.8, 1.0], 0.0, 1.0)
    }
}

impl Material {
    /// Creates a new material
    ///
    /// # Arguments
    /// * `name` - Unique name for this material
    /// * `base_color` - RGBA base color
    /// * `metallic` - Metallic factor (0.0 = dielectric, 1.0 = metallic)
    /// * `roughness` - Surface roughness (0.0 = mirror, 1.0 = rough)
    pub fn new(name: &str, base_color: [f32; 4], metallic: f32, roughness: f32) -> Self {
        Self {
            name: name.to_string(),
            base_color,
            metallic: metallic.clamp(0.0, 1.0),
            roughness: roughness.clamp(0.0, 1.0),
            emissive: [0.0, 0.0, 0.0],
            emissive_intensity: 1.0,
            unlit: false,
            color_map: None,
            gpu: None,
        }
    }

    /// Creates a material from a `0xRRGGBB` colour
    pub fn from_hex(name: &str, hex: u32) -> Self {
        let [r, g, b] = hex_to_rgb(hex);
        Self::new(name, [r, g, b, 1.0], 0.0, 1.0)
    }

    /// Builder pattern: Set base color from RGB values
    pub fn with_color(mut self, r: f32, g: f32, b: f32) -> Self {
        self.base_color = [r, g, b, self.base_color[3]];
        self
    }

    /// Builder pattern: Set alpha transparency
    pub fn with_alpha(mut self, alpha: f32) -> Self {
        self.base_color[3] = alpha.clamp(0.0, 1.0);
        self
    }

    /// Builder pattern: Set roughness factor
    pub fn with_roughness(mut self, roughness: f32) -> Self {
        self.roughness = roughness.clamp(0.0, 1.0);
        self
    }

    /// Builder pattern: Set emissive color and intensity
    pub fn with_emission(mut self, r: f32, g: f32, b: f32, intensity: f32) -> Self {
        self.emissive = [r, g, b];
        self.emissive_intensity = intensity.max(0.0);
        self
    }

    /// Builder pattern: Shade with the flat colour only
    pub fn unlit(mut self) -> Self {
        self.unlit = true;
        self
    }

    /// Builder pattern: Multiply the base colour by a colour map
    pub fn with_color_map(mut self, map: ProceduralTexture) -> Self {
        self.color_map = Some(map);
        self.base_color = [1.0, 1.0, 1.0, self.base_color[3]];
        self
    }

    pub fn uniform(&self) -> MaterialUniform {
        MaterialUniform {
            base_color: self.base_color,
            emissive: [
                self.emissive[0],
                self.emissive[1],
                self.emissive[2],
                self.emissive_intensity,
            ],
            params: [
                self.roughness,
                self.metallic,
                if self.unlit { 1.0 } else { 0.0 },
                if self.color_map.is_some() { 1.0 } else { 0.0 },
            ],
        }
    }

    /// Creates or refreshes the GPU copy of this material
    ///
    /// The colour map is uploaded once; later calls only rewrite the uniform
    /// when a property changed.
    pub fn update_gpu_resources(
        &mut self,
        device: &Device,
        queue: &wgpu::Queue,
        bindings: &MaterialBindings,
    ) {
        let uniform = self.uniform();

        if let Some(gpu) = &mut self.gpu {
            gpu.ubo.update_content(queue, uniform);
            return;
        }

        let ubo = MaterialUBO::new_with_data(device, &uniform);
        let map = self.color_map.as_ref().map(|texture| {
            TextureResource::create_from_rgba_data(
                device,
                queue,
                &texture.pixels,
                texture.width,
                texture.height,
                &texture.name,
            )
        });
        let bind_group = bindings.create_bind_group(
            device,
            &ubo,
            map.as_ref(),
            &format!("Material Bind Group: {}", self.name),
        );
        log::debug!("Created GPU resources for material '{}'", self.name);

        self.gpu = Some(MaterialGpu {
            ubo,
            map,
            bind_group,
        });
    }

    /// Gets the bind group for rendering
    pub fn get_bind_group(&self) -> Option<&wgpu::BindGroup> {
        self.gpu.as_ref().map(|gpu| &gpu.bind_group)
    }

    /// True once a colour map has been uploaded
    pub fn has_gpu_map(&self) -> bool {
        self.gpu.as_ref().is_some_and(|gpu| gpu.map.is_some())
    }
}

/// Manages all materials in the scene
///
/// Centralized storage for all materials. Objects reference materials by ID
/// rather than storing material data directly, enabling efficient sharing
/// of GPU resources between objects.
pub struct MaterialManager {
    materials: HashMap<MaterialId, Material>,
    default_material_id: MaterialId,
    bindings: Option<MaterialBindings>,
}

impl Default for MaterialManager {
    fn default() -> Self {
        Self::new()
    }
}

impl MaterialManager {
    /// Creates a new material manager with a default material
    pub fn new() -> Self {
        let default_material = Material::default();
        let default_material_id = default_material.name.clone();

        let mut materials = HashMap::new();
        materials.insert(default_material_id.clone(), default_material);

        Self {
            materials,
            default_material_id,
            bindings: None,
        }
    }

    /// Adds a material, replacing any material with the same name
    pub fn add_material(&mut self, material: Material) {
        self.materials.insert(material.name.clone(), material);
    }

    pub fn get_material(&self, id: &str) -> Option<&Material> {
        self.materials.get(id)
    }

    pub fn get_material_mut(&mut self, id: &str) -> Option<&mut Material> {
        self.materials.get_mut(id)
    }

    /// Gets the default material
    pub fn get_default_material(&self) -> &Material {
        // The default entry is inserted in `new` and never removed
        &self.materials[&self.default_material_id]
    }

    /// Gets material for an object with fallback to default
    pub fn get_material_for_object(&self, material_id: Option<&str>) -> &Material {
        material_id
            .and_then(|id| self.get_material(id))
            .unwrap_or_else(|| self.get_default_material())
    }

    /// Lists all material IDs
    pub fn list_materials(&self) -> Vec<&MaterialId> {
        self.materials.keys().collect()
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }

    /// Updates GPU resources for all materials
    ///
    /// The shared bind group layout is created on the first call.
    pub fn update_all_gpu_resources(&mut self, device: &Device, queue: &wgpu::Queue) {
        let bindings = self
            .bindings
            .get_or_insert_with(|| MaterialBindings::new(device, queue));

        for material in self.materials.values_mut() {
            material.update_gpu_resources(device, queue, bindings);
        }
    }

    /// Gets material bind group layout for pipeline creation
    pub fn get_bind_group_layout(&self) -> Option<&wgpu::BindGroupLayout> {
        self.bindings.as_ref().map(|b| b.bind_group_layout())
    }
}

/// Converts `0xRRGGBB` to linear-space RGB floats
///
/// Colours are authored in sRGB. Shading happens on linear values and the
/// shaders gamma-encode their output.
pub fn hex_to_rgb(hex: u32) -> [f32; 3] {
    let channel = |shift: u32| srgb_to_linear(((hex >> shift) & 0xff) as f32 / 255.0);
    [channel(16), channel(8), channel(0)]
}

fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_material_is_fallback() {
        let mut manager = MaterialManager::new();
        manager.add_material(Material::from_hex("roof", 0xb35f45));

        assert_eq!(manager.get_material_for_object(Some("roof")).name, "roof");
        assert_eq!(manager.get_material_for_object(Some("missing")).name, "default");
        assert_eq!(manager.get_material_for_object(None).name, "default");
        assert_eq!(manager.len(), 2);
    }

    #[test]
    fn test_hex_conversion() {
        assert_eq!(hex_to_rgb(0xffffff), [1.0, 1.0, 1.0]);
        assert_eq!(hex_to_rgb(0x000000), [0.0, 0.0, 0.0]);
        let [r, g, b] = hex_to_rgb(0xff7d46);
        assert!(r > g && g > b);
    }

    #[test]
    fn test_uniform_packs_flags() {
        let ornament = Material::from_hex("ornament", 0x336699)
            .unlit()
            .with_emission(1.0, 1.0, 1.0, 0.7);
        let uniform = ornament.uniform();
        assert_eq!(uniform.params[2], 1.0);
        assert_eq!(uniform.params[3], 0.0);
        assert_eq!(uniform.emissive, [1.0, 1.0, 1.0, 0.7]);
        assert_eq!(std::mem::size_of::<MaterialUniform>(), 48);
    }

    #[test]
    fn test_color_map_resets_tint() {
        let walls = Material::from_hex("walls", 0x123456)
            .with_color_map(ProceduralTexture::bricks(32));
        let uniform = walls.uniform();
        assert_eq!(&uniform.base_color[..3], &[1.0, 1.0, 1.0]);
        assert_eq!(uniform.params[3], 1.0);
    }
}
