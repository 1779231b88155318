//! Lights and fog
//!
//! The night scene has one ambient term, a shadow-casting moonlight, the warm
//! lamp above the door and linear fog fading into the background colour.

use cgmath::{InnerSpace, Matrix4, Point3, Vector3};

use crate::gfx::resources::material::hex_to_rgb;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AmbientLight {
    pub color: [f32; 3],
    pub intensity: f32,
}

/// Directional light shining from `position` towards the origin
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionalLight {
    pub color: [f32; 3],
    pub intensity: f32,
    pub position: [f32; 3],
    pub cast_shadow: bool,
}

impl DirectionalLight {
    /// Half-width of the orthographic shadow volume
    pub const SHADOW_EXTENT: f32 = 12.0;
    const SHADOW_DISTANCE: f32 = 20.0;

    /// Unit vector pointing from the scene towards the light
    pub fn direction(&self) -> Vector3<f32> {
        let position = Vector3::from(self.position);
        if position.magnitude2() < 1e-8 {
            Vector3::unit_y()
        } else {
            position.normalize()
        }
    }

    /// View-projection used to render and sample the shadow map
    ///
    /// The shadow camera sits a fixed distance along the light direction, so
    /// dragging the light closer to the origin does not clip the volume.
    pub fn view_proj(&self) -> Matrix4<f32> {
        let direction = self.direction();
        let eye = direction * Self::SHADOW_DISTANCE;
        let eye = Point3::new(eye.x, eye.y, eye.z);
        // Straight-down light would make the up vector parallel to the view
        let up = if direction.y.abs() > 0.99 {
            Vector3::unit_z()
        } else {
            Vector3::unit_y()
        };
        let view = Matrix4::look_at_rh(eye, Point3::new(0.0, 0.0, 0.0), up);
        let e = Self::SHADOW_EXTENT;
        let proj = cgmath::ortho(-e, e, -e, e, 0.1, Self::SHADOW_DISTANCE * 2.0);
        crate::gfx::camera::orbit_camera::OPENGL_TO_WGPU_MATRIX * proj * view
    }
}

/// Omni light with a linear falloff to zero at `range`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointLight {
    pub color: [f32; 3],
    pub intensity: f32,
    pub range: f32,
    pub position: [f32; 3],
}

/// Linear fog between `near` and `far` camera distance
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fog {
    pub color: [f32; 3],
    pub near: f32,
    pub far: f32,
}

/// Every light in the scene
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lighting {
    pub ambient: AmbientLight,
    pub moon: DirectionalLight,
    pub door: PointLight,
}

impl Default for Lighting {
    fn default() -> Self {
        Self {
            ambient: AmbientLight {
                color: hex_to_rgb(0xa0a0ff),
                intensity: 0.5,
            },
            moon: DirectionalLight {
                color: hex_to_rgb(0xffffff),
                intensity: 0.5,
                position: [4.0, 5.0, -2.0],
                cast_shadow: true,
            },
            door: PointLight {
                color: hex_to_rgb(0xff7d46),
                intensity: 1.0,
                range: 7.0,
                position: [0.0, 2.2, 2.7],
            },
        }
    }
}

impl Default for Fog {
    fn default() -> Self {
        Self {
            color: hex_to_rgb(0x000033),
            near: 1.0,
            far: 15.0,
        }
    }
}

/// Remembers the moonlight the shadow map was last rendered with
///
/// Everything that casts shadows is static, so the map only needs to be
/// redrawn when the moonlight moves or starts casting.
#[derive(Debug, Default)]
pub struct ShadowState {
    rendered_for: Option<[f32; 3]>,
}

impl ShadowState {
    const EPSILON: f32 = 0.001;

    /// True when the shadow map is stale for `moon`
    pub fn needs_update(&self, moon: &DirectionalLight) -> bool {
        if !moon.cast_shadow {
            return false;
        }
        match self.rendered_for {
            None => true,
            Some(previous) => previous
                .iter()
                .zip(moon.position)
                .any(|(a, b)| (a - b).abs() > Self::EPSILON),
        }
    }

    pub fn mark_rendered(&mut self, moon: &DirectionalLight) {
        self.rendered_for = Some(moon.position);
    }

    /// Forces the next frame to redraw the shadow map
    pub fn invalidate(&mut self) {
        self.rendered_for = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::Vector4;

    #[test]
    fn test_default_lighting_matches_night_scene() {
        let lighting = Lighting::default();
        assert_eq!(lighting.ambient.intensity, 0.5);
        assert_eq!(lighting.moon.position, [4.0, 5.0, -2.0]);
        assert_eq!(lighting.door.range, 7.0);
        assert_eq!(lighting.door.position, [0.0, 2.2, 2.7]);
        assert_eq!(Fog::default().far, 15.0);
    }

    #[test]
    fn test_shadow_state_tracks_moon_position() {
        let mut moon = Lighting::default().moon;
        let mut state = ShadowState::default();
        assert!(state.needs_update(&moon));

        state.mark_rendered(&moon);
        assert!(!state.needs_update(&moon));

        moon.intensity = 0.9;
        assert!(!state.needs_update(&moon));

        moon.position[0] = 3.0;
        assert!(state.needs_update(&moon));

        moon.cast_shadow = false;
        assert!(!state.needs_update(&moon));
    }

    #[test]
    fn test_origin_projects_inside_shadow_volume() {
        let moon = Lighting::default().moon;
        let clip = moon.view_proj() * Vector4::new(0.0, 0.0, 0.0, 1.0);
        assert!(clip.x.abs() < 1e-4 && clip.y.abs() < 1e-4);
        assert!(clip.z > 0.0 && clip.z < 1.0, "depth = {}", clip.z);
    }

    #[test]
    fn test_zero_position_falls_back_to_overhead() {
        let mut moon = Lighting::default().moon;
        moon.position = [0.0, 0.0, 0.0];
        assert_eq!(moon.direction(), Vector3::unit_y());
        let clip = moon.view_proj() * Vector4::new(0.0, 0.0, 0.0, 1.0);
        assert!(clip.z.is_finite());
    }
}
