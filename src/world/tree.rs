use rand::Rng;

use crate::{
    gfx::{
        geometry::{generate_cone, generate_cylinder, generate_sphere},
        resources::material::Material,
        scene::{GroupId, Scene, Transform},
    },
};

/// Ornament offsets from the tree base
const ORNAMENTS: [[f32; 3]; 5] = [
    [-0.5, 1.8, 0.5],
    [0.5, 1.5, -0.5],
    [-0.5, 2.1, -0.5],
    [0.5, 2.0, 0.5],
    [0.0, 1.2, 0.0],
];

const ORNAMENT_GLOW: f32 = 0.7;

/// A pine tree with glowing baubles, placed beside the house
pub fn build<R: Rng + ?Sized>(scene: &mut Scene, rng: &mut R) -> GroupId {
    let group = scene.add_group("tree", Transform::from_position(4.0, 0.0, 1.0));

    scene.add_material(Material::from_hex("trunk", 0x8b4513));
    scene.add_material(Material::from_hex("foliage", 0x228b22));

    scene
        .add_object("trunk", &generate_cylinder(0.2, 0.2, 1.0, 8))
        .with_material("trunk")
        .with_position(0.0, 0.5, 0.0)
        .in_group(group)
        .cast_shadow(true);

    scene
        .add_object("foliage", &generate_cone(1.0, 3.0, 8))
        .with_material("foliage")
        .with_position(0.0, 2.0, 0.0)
        .in_group(group)
        .cast_shadow(true);

    let bauble = generate_sphere(0.1, 8, 8);
    for (i, [x, y, z]) in ORNAMENTS.into_iter().enumerate() {
        let material = format!("ornament {i}");
        let color = rng.random_range(0..=0xffffff);
        scene.add_material(
            Material::from_hex(&material, color)
                .with_emission(1.0, 1.0, 1.0, ORNAMENT_GLOW)
                .unlit(),
        );
        scene
            .add_object(&material, &bauble)
            .with_material(&material)
            .with_position(x, y, z)
            .in_group(group);
    }

    group
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::tests::empty_scene;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_tree_with_five_glowing_ornaments() {
        let mut scene = empty_scene();
        let group = build(&mut scene, &mut ChaCha8Rng::seed_from_u64(8));

        assert_eq!(scene.objects_in_group(group).count(), 7);
        let ornaments: Vec<_> = scene
            .objects
            .iter()
            .filter(|o| o.name.starts_with("ornament"))
            .collect();
        assert_eq!(ornaments.len(), 5);
        for ornament in ornaments {
            let material = scene.get_material_for_object(ornament);
            assert!(material.unlit);
            assert_eq!(material.emissive, [1.0, 1.0, 1.0]);
            assert_eq!(material.emissive_intensity, ORNAMENT_GLOW);
            assert!(!ornament.cast_shadow);
        }

        // Group offset moves the trunk to (4, 0.5, 1)
        let trunk = &scene.objects[0];
        let world = scene.world_matrix(trunk);
        assert!((world.w.x - 4.0).abs() < 1e-6);
        assert!((world.w.y - 0.5).abs() < 1e-6);
        assert!((world.w.z - 1.0).abs() < 1e-6);
    }
}
