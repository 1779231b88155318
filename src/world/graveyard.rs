use std::f32::consts::TAU;

use rand::Rng;

use crate::{
    config::WorldConfig,
    gfx::{
        geometry::generate_box,
        resources::material::Material,
        scene::{GroupId, Scene, Transform},
    },
};

const GRAVE_MATERIAL: &str = "grave";
const GRAVE_HEIGHT: f32 = 0.3;
/// Tilt range in radians, centred on zero
const GRAVE_TILT: f32 = 0.4;

/// Scatters headstones on a ring around the house
pub fn build<R: Rng + ?Sized>(scene: &mut Scene, config: &WorldConfig, rng: &mut R) -> GroupId {
    let group = scene.add_group("graves", Transform::default());
    scene.add_material(Material::from_hex(GRAVE_MATERIAL, 0xb2b6b1));

    let geometry = generate_box(0.6, 0.8, 0.2);
    for i in 0..config.grave_count {
        let angle = rng.random::<f32>() * TAU;
        let radius = config.grave_min_radius + rng.random::<f32>() * config.grave_radius_spread;
        let tilt_z = (rng.random::<f32>() - 0.5) * GRAVE_TILT;
        let tilt_y = (rng.random::<f32>() - 0.5) * GRAVE_TILT;

        scene
            .add_object(&format!("grave {i}"), &geometry)
            .with_material(GRAVE_MATERIAL)
            .with_position(angle.cos() * radius, GRAVE_HEIGHT, angle.sin() * radius)
            .with_rotation(0.0, tilt_y, tilt_z)
            .in_group(group)
            .cast_shadow(true);
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
    fn test_graves_stay_on_the_ring() {
        let mut scene = empty_scene();
        let config = WorldConfig::default();
        let group = build(&mut scene, &config, &mut ChaCha8Rng::seed_from_u64(42));

        let graves: Vec<_> = scene.objects_in_group(group).collect();
        assert_eq!(graves.len(), 50);
        for grave in graves {
            let p = grave.transform.position;
            let radius = (p.x * p.x + p.z * p.z).sqrt();
            assert!(radius >= 3.0 - 1e-4 && radius < 9.0 + 1e-4, "radius {radius}");
            assert_eq!(p.y, GRAVE_HEIGHT);
            assert_eq!(grave.transform.rotation.x, 0.0);
            assert!(grave.transform.rotation.y.abs() <= 0.2);
            assert!(grave.transform.rotation.z.abs() <= 0.2);
            assert!(grave.cast_shadow);
        }
    }

    #[test]
    fn test_grave_count_follows_config() {
        let mut scene = empty_scene();
        let config = WorldConfig {
            grave_count: 0,
            ..WorldConfig::default()
        };
        let group = build(&mut scene, &config, &mut ChaCha8Rng::seed_from_u64(1));
        assert_eq!(scene.objects_in_group(group).count(), 0);
    }
}
