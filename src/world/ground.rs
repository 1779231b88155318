use std::f32::consts::FRAC_PI_2;

use crate::{
    config::WorldConfig,
    gfx::{
        geometry::generate_plane,
        resources::{material::Material, procedural::ProceduralTexture},
        scene::Scene,
    },
};

/// Snow-covered floor, the only shadow receiver
pub fn build(scene: &mut Scene, config: &WorldConfig) -> usize {
    scene.add_material(
        Material::from_hex("snow ground", 0xffffff)
            .with_color_map(ProceduralTexture::snow_ground(config.texture_size)),
    );

    scene
        .add_object("floor", &generate_plane(config.floor_size, config.floor_size, 1, 1))
        .with_material("snow ground")
        .with_rotation(-FRAC_PI_2, 0.0, 0.0)
        .receive_shadow(true)
        .index()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::tests::empty_scene;
    use cgmath::{InnerSpace, Vector4};

    #[test]
    fn test_floor_faces_up() {
        let mut scene = empty_scene();
        let config = WorldConfig {
            texture_size: 16,
            ..WorldConfig::default()
        };
        let index = build(&mut scene, &config);

        let floor = &scene.objects[index];
        assert!(floor.receive_shadow);
        assert!(!floor.cast_shadow);
        assert!(floor.parent.is_none());

        let normal = scene.world_matrix(floor) * Vector4::new(0.0, 0.0, 1.0, 0.0);
        assert!((normal.truncate().normalize().y - 1.0).abs() < 1e-5);
    }
}
