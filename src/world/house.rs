use std::f32::consts::FRAC_PI_4;

use crate::{
    config::WorldConfig,
    gfx::{
        geometry::{generate_box, generate_cone, generate_plane},
        resources::{material::Material, procedural::ProceduralTexture},
        scene::{GroupId, Scene, Transform},
    },
};

pub const WALL_WIDTH: f32 = 4.0;
pub const WALL_HEIGHT: f32 = 2.5;

/// Walls, door and roof
///
/// The door light itself lives in the scene lighting.
pub fn build(scene: &mut Scene, config: &WorldConfig) -> GroupId {
    let group = scene.add_group("house", Transform::default());

    scene.add_material(
        Material::from_hex("bricks", 0xffffff)
            .with_color_map(ProceduralTexture::bricks(config.texture_size)),
    );
    scene.add_material(
        Material::from_hex("door", 0xffffff)
            .with_color_map(ProceduralTexture::wooden_door(config.texture_size)),
    );
    scene.add_material(Material::from_hex("roof", 0xb35f45));

    scene
        .add_object("walls", &generate_box(WALL_WIDTH, WALL_HEIGHT, WALL_WIDTH))
        .with_material("bricks")
        .with_position(0.0, WALL_HEIGHT / 2.0, 0.0)
        .in_group(group)
        .cast_shadow(true);

    // Just proud of the front wall to avoid z-fighting
    scene
        .add_object("door", &generate_plane(1.0, 1.9, 1, 1))
        .with_material("door")
        .with_position(0.0, 1.0, WALL_WIDTH / 2.0 + 0.01)
        .in_group(group)
        .cast_shadow(true);

    scene
        .add_object("roof", &generate_cone(3.5, 1.0, 4))
        .with_material("roof")
        .with_position(0.0, WALL_HEIGHT + 0.5, 0.0)
        .with_rotation(0.0, FRAC_PI_4, 0.0)
        .in_group(group)
        .cast_shadow(true);

    group
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::tests::empty_scene;

    #[test]
    fn test_house_parts() {
        let mut scene = empty_scene();
        let config = WorldConfig {
            texture_size: 16,
            ..WorldConfig::default()
        };
        let group = build(&mut scene, &config);

        let names: Vec<_> = scene
            .objects_in_group(group)
            .map(|o| o.name.as_str())
            .collect();
        assert_eq!(names, ["walls", "door", "roof"]);

        let roof = &scene.objects[2];
        assert_eq!(roof.transform.position.y, 3.0);
        assert_eq!(roof.transform.rotation.y, FRAC_PI_4);
        assert_eq!(scene.get_material_for_object(roof).name, "roof");

        let walls = scene.material_manager.get_material("bricks").unwrap();
        assert!(walls.color_map.is_some());
    }
}
