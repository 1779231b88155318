use cgmath::{Matrix4, SquareMatrix};
use wgpu::Device;

use crate::{
    gfx::{
        camera::camera_utils::CameraManager,
        geometry::GeometryData,
        lighting::{Fog, Lighting},
        resources::material::{hex_to_rgb, Material, MaterialManager},
    },
    simulation::snow::SnowField,
};

use super::{
    object::{Object, ObjectBindings, ObjectBuilder},
    transform::Transform,
};

/// Handle to a [`Group`] inside a scene
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GroupId(pub usize);

/// A named transform shared by several objects
#[derive(Debug, Clone)]
pub struct Group {
    pub name: String,
    pub transform: Transform,
    pub visible: bool,
}

/// Main scene containing objects, materials, lights and the camera
pub struct Scene {
    pub camera_manager: CameraManager,
    pub groups: Vec<Group>,
    pub objects: Vec<Object>,
    pub material_manager: MaterialManager, // Centralized material storage
    pub lighting: Lighting,
    pub fog: Fog,
    pub background: [f32; 3],
    /// Falling snow, installed by the snow simulation
    pub snow: Option<SnowField>,
    object_bindings: Option<ObjectBindings>,
}

impl Scene {
    /// Creates an empty night scene with default lights and fog
    pub fn new(camera_manager: CameraManager) -> Self {
        Self {
            camera_manager,
            groups: Vec::new(),
            objects: Vec::new(),
            material_manager: MaterialManager::new(),
            lighting: Lighting::default(),
            fog: Fog::default(),
            background: hex_to_rgb(0x000033),
            snow: None,
            object_bindings: None,
        }
    }

    /// Updates the scene (camera damping and matrices)
    pub fn update(&mut self) {
        self.camera_manager.update();
    }

    /// Adds an empty group and returns its handle
    pub fn add_group(&mut self, name: &str, transform: Transform) -> GroupId {
        self.groups.push(Group {
            name: name.to_string(),
            transform,
            visible: true,
        });
        GroupId(self.groups.len() - 1)
    }

    pub fn group(&self, id: GroupId) -> Option<&Group> {
        self.groups.get(id.0)
    }

    pub fn group_mut(&mut self, id: GroupId) -> Option<&mut Group> {
        self.groups.get_mut(id.0)
    }

    pub fn find_group(&self, name: &str) -> Option<GroupId> {
        self.groups.iter().position(|g| g.name == name).map(GroupId)
    }

    /// Adds an object built from procedural geometry
    ///
    /// Returns a builder for setting its material, placement and shadows.
    pub fn add_object(&mut self, name: &str, geometry: &GeometryData) -> ObjectBuilder<'_> {
        let name = self.ensure_unique_name(name);
        self.objects.push(Object::new(&name, geometry));
        let index = self.objects.len() - 1;
        ObjectBuilder::new(&mut self.objects[index], index)
    }

    /// Adds a material, replacing any existing material with the same name
    pub fn add_material(&mut self, material: Material) {
        self.material_manager.add_material(material);
    }

    /// Objects whose parent is `group`
    pub fn objects_in_group(&self, group: GroupId) -> impl Iterator<Item = &Object> {
        self.objects
            .iter()
            .filter(move |object| object.parent == Some(group))
    }

    /// World matrix of an object, including its group transform
    pub fn world_matrix(&self, object: &Object) -> Matrix4<f32> {
        let parent = object
            .parent
            .and_then(|id| self.group(id))
            .map(|group| group.transform.matrix())
            .unwrap_or_else(Matrix4::identity);
        parent * object.transform.matrix()
    }

    /// True if the object and its group are both visible
    pub fn is_visible(&self, object: &Object) -> bool {
        object.visible
            && object
                .parent
                .and_then(|id| self.group(id))
                .map_or(true, |group| group.visible)
    }

    /// Gets material for rendering an object
    pub fn get_material_for_object(&self, object: &Object) -> &Material {
        self.material_manager
            .get_material_for_object(object.get_material_id())
    }

    /// Initializes GPU resources for all objects and materials
    ///
    /// Must be called after the GPU context is available and before rendering.
    /// Objects added later are picked up by the next call.
    pub fn init_gpu_resources(&mut self, device: &Device, queue: &wgpu::Queue) {
        let worlds: Vec<Matrix4<f32>> = self.objects.iter().map(|o| self.world_matrix(o)).collect();
        let bindings = self
            .object_bindings
            .get_or_insert_with(|| ObjectBindings::new(device));

        for (object, world) in self.objects.iter_mut().zip(worlds) {
            object.init_gpu_resources(device, bindings, world);
        }

        self.material_manager.update_all_gpu_resources(device, queue);
        log::info!(
            "Uploaded {} objects and {} materials to the GPU",
            self.objects.len(),
            self.material_manager.len()
        );
    }

    /// Syncs object transforms and material properties to the GPU
    ///
    /// Unchanged uniforms are skipped by the buffers themselves.
    pub fn update_gpu_resources(&mut self, device: &Device, queue: &wgpu::Queue) {
        let worlds: Vec<Matrix4<f32>> = self.objects.iter().map(|o| self.world_matrix(o)).collect();
        for (object, world) in self.objects.iter_mut().zip(worlds) {
            object.update_transform(queue, world);
        }
        self.material_manager.update_all_gpu_resources(device, queue);
    }

    /// Layout of the per-object bind group, once GPU resources exist
    pub fn object_bind_group_layout(&self) -> Option<&wgpu::BindGroupLayout> {
        self.object_bindings.as_ref().map(|b| b.bind_group_layout())
    }

    /// Gets statistics about the scene
    pub fn statistics(&self) -> SceneStatistics {
        let total_triangles = self.objects.iter().map(|o| o.mesh.index_count / 3).sum();
        let total_vertices = self.objects.iter().map(|o| o.mesh.vertex_count).sum();
        let (snowflakes, drift_particles) = self
            .snow
            .as_ref()
            .map_or((0, 0), |snow| (snow.flakes.len(), snow.drift.len()));

        SceneStatistics {
            object_count: self.objects.len(),
            group_count: self.groups.len(),
            material_count: self.material_manager.len(),
            total_triangles,
            total_vertices,
            snowflakes,
            drift_particles,
        }
    }

    pub fn ensure_unique_name(&self, desired_name: &str) -> String {
        let mut counter = 0;
        let mut test_name = desired_name.to_string();

        while self.objects.iter().any(|obj| obj.name == test_name) {
            counter += 1;
            test_name = format!("{} ({})", desired_name, counter);
        }

        test_name
    }
}

/// Scene statistics for debugging and UI display
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SceneStatistics {
    pub object_count: usize,
    pub group_count: usize,
    pub material_count: usize,
    pub total_triangles: u32,
    pub total_vertices: u32,
    pub snowflakes: usize,
    pub drift_particles: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::{
        camera::{CameraController, OrbitCamera},
        geometry::{generate_box, generate_sphere},
    };
    use cgmath::{InnerSpace, Vector3, Vector4};

    fn test_scene() -> Scene {
        let camera = OrbitCamera::new(5.0, 0.2, 0.0, Vector3::new(0.0, 0.0, 0.0), 1.0);
        Scene::new(CameraManager::new(camera, CameraController::new(0.005, 0.1)))
    }

    #[test]
    fn test_group_transform_applies_to_children() {
        let mut scene = test_scene();
        let tree = scene.add_group("tree", Transform::from_position(4.0, 0.0, 1.0));
        scene
            .add_object("trunk", &generate_box(0.2, 1.0, 0.2))
            .with_position(0.0, 0.5, 0.0)
            .in_group(tree);

        let trunk = &scene.objects[0];
        let origin = scene.world_matrix(trunk) * Vector4::new(0.0, 0.0, 0.0, 1.0);
        assert!((origin - Vector4::new(4.0, 0.5, 1.0, 1.0)).magnitude() < 1e-6);
        assert_eq!(scene.objects_in_group(tree).count(), 1);
    }

    #[test]
    fn test_hidden_group_hides_children() {
        let mut scene = test_scene();
        let graves = scene.add_group("graves", Transform::default());
        scene.add_object("grave", &generate_box(0.6, 0.8, 0.2)).in_group(graves);
        scene.add_object("walls", &generate_box(4.0, 2.5, 4.0));

        scene.group_mut(graves).unwrap().visible = false;
        assert!(!scene.is_visible(&scene.objects[0]));
        assert!(scene.is_visible(&scene.objects[1]));
    }

    #[test]
    fn test_duplicate_names_are_suffixed() {
        let mut scene = test_scene();
        scene.add_object("grave", &generate_box(0.6, 0.8, 0.2));
        scene.add_object("grave", &generate_box(0.6, 0.8, 0.2));
        assert_eq!(scene.objects[1].name, "grave (1)");
    }

    #[test]
    fn test_statistics_count_geometry() {
        let mut scene = test_scene();
        scene.add_group("house", Transform::default());
        scene.add_object("walls", &generate_box(4.0, 2.5, 4.0));
        scene.add_object("ornament", &generate_sphere(0.1, 8, 8));
        scene.add_material(Material::from_hex("roof", 0xb35f45));

        let stats = scene.statistics();
        assert_eq!(stats.object_count, 2);
        assert_eq!(stats.group_count, 1);
        assert_eq!(stats.material_count, 2);
        assert_eq!(stats.total_triangles, 12 + 8 * 14);
        assert_eq!(stats.snowflakes, 0);
    }

    #[test]
    fn test_find_group_by_name() {
        let mut scene = test_scene();
        let house = scene.add_group("house", Transform::default());
        assert_eq!(scene.find_group("house"), Some(house));
        assert_eq!(scene.find_group("barn"), None);
    }
}
