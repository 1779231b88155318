//! Scene contents
//!
//! Builds the haunted house, the graveyard, the decorated tree and the snowy
//! floor into a [`Scene`]. All randomness comes from the injected generator,
//! so a fixed seed always produces the same layout.

pub mod graveyard;
pub mod ground;
pub mod house;
pub mod tree;

use rand::Rng;

use crate::{
    config::WorldConfig,
    gfx::{
        lighting::{Fog, Lighting},
        resources::material::hex_to_rgb,
        scene::{GroupId, Scene},
    },
};

/// Night sky, also the fog colour
pub const SKY_COLOR: u32 = 0x000033;

/// Handles to the groups created by [`build_world`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorldLayout {
    pub house: GroupId,
    pub graves: GroupId,
    pub tree: GroupId,
}

/// Populates `scene` with every static object, light and the fog
pub fn build_world<R: Rng + ?Sized>(
    scene: &mut Scene,
    config: &WorldConfig,
    rng: &mut R,
) -> WorldLayout {
    apply_atmosphere(scene);

    let graves = graveyard::build(scene, config, rng);
    let house = house::build(scene, config);
    let tree = tree::build(scene, rng);
    ground::build(scene, config);

    let stats = scene.statistics();
    log::info!(
        "World built: {} objects in {} groups, {} triangles",
        stats.object_count,
        stats.group_count,
        stats.total_triangles
    );

    WorldLayout {
        house,
        graves,
        tree,
    }
}

/// Night lighting, fog and sky
pub fn apply_atmosphere(scene: &mut Scene) {
    scene.lighting = Lighting::default();
    scene.fog = Fog::default();
    scene.background = hex_to_rgb(SKY_COLOR);
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::gfx::camera::{CameraController, CameraManager, OrbitCamera};
    use cgmath::Vector3;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    pub(crate) fn empty_scene() -> Scene {
        let camera = OrbitCamera::new(5.0, 0.2, 0.0, Vector3::new(0.0, 0.0, 0.0), 1.0);
        Scene::new(CameraManager::new(camera, CameraController::new(0.005, 0.1)))
    }

    fn small_world() -> WorldConfig {
        WorldConfig {
            texture_size: 16,
            ..WorldConfig::default()
        }
    }

    #[test]
    fn test_world_has_every_part() {
        let mut scene = empty_scene();
        let layout = build_world(&mut scene, &small_world(), &mut ChaCha8Rng::seed_from_u64(1));

        assert_eq!(scene.objects_in_group(layout.graves).count(), 50);
        assert_eq!(scene.objects_in_group(layout.house).count(), 3);
        assert_eq!(scene.objects_in_group(layout.tree).count(), 7);
        assert_eq!(scene.groups.len(), 3);
        // graves + house + tree + floor
        assert_eq!(scene.objects.len(), 50 + 3 + 7 + 1);
        assert_eq!(scene.background, hex_to_rgb(SKY_COLOR));
    }

    #[test]
    fn test_same_seed_same_layout() {
        let positions = |seed| {
            let mut scene = empty_scene();
            build_world(&mut scene, &small_world(), &mut ChaCha8Rng::seed_from_u64(seed));
            scene
                .objects
                .iter()
                .map(|o| o.transform.position)
                .collect::<Vec<_>>()
        };

        assert_eq!(positions(5), positions(5));
        assert_ne!(positions(5), positions(6));
    }
}
