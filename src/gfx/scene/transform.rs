//! Position, Euler rotation and scale of scene nodes

use cgmath::{Matrix, Matrix4, Rad, SquareMatrix, Vector3, Vector4};

/// Translation, rotation and scale of an object or group
///
/// Rotation is in radians and applied in X, Y, Z order, so the model matrix
/// is `T * Rx * Ry * Rz * S`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vector3<f32>,
    pub rotation: Vector3<f32>,
    pub scale: Vector3<f32>,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vector3::new(0.0, 0.0, 0.0),
            rotation: Vector3::new(0.0, 0.0, 0.0),
            scale: Vector3::new(1.0, 1.0, 1.0),
        }
    }
}

impl Transform {
    pub fn from_position(x: f32, y: f32, z: f32) -> Self {
        Self {
            position: Vector3::new(x, y, z),
            ..Default::default()
        }
    }

    pub fn with_rotation(mut self, x: f32, y: f32, z: f32) -> Self {
        self.rotation = Vector3::new(x, y, z);
        self
    }

    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = Vector3::new(scale, scale, scale);
        self
    }

    /// Local model matrix
    pub fn matrix(&self) -> Matrix4<f32> {
        let t = Matrix4::from_translation(self.position);
        let r = Matrix4::from_angle_x(Rad(self.rotation.x))
            * Matrix4::from_angle_y(Rad(self.rotation.y))
            * Matrix4::from_angle_z(Rad(self.rotation.z));
        let s = Matrix4::from_nonuniform_scale(self.scale.x, self.scale.y, self.scale.z);
        t * r * s
    }

    /// Inverse-transpose of the upper 3x3, widened to a 4x4 for uniform layout
    pub fn normal_matrix(model: &Matrix4<f32>) -> Matrix4<f32> {
        let mut linear = *model;
        linear.x.w = 0.0;
        linear.y.w = 0.0;
        linear.z.w = 0.0;
        linear.w = Vector4::unit_w();
        linear
            .invert()
            .map(|inverse| inverse.transpose())
            .unwrap_or_else(Matrix4::identity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::InnerSpace;
    use std::f32::consts::FRAC_PI_2;

    fn close(a: Vector4<f32>, b: Vector4<f32>) -> bool {
        (a - b).magnitude() < 1e-5
    }

    #[test]
    fn test_identity_by_default() {
        assert_eq!(Transform::default().matrix(), Matrix4::identity());
    }

    #[test]
    fn test_translation_applies_after_rotation_and_scale() {
        let transform = Transform::from_position(1.0, 2.0, 3.0)
            .with_rotation(0.0, FRAC_PI_2, 0.0)
            .with_scale(2.0);
        let p = transform.matrix() * Vector4::new(1.0, 0.0, 0.0, 1.0);
        // x axis scaled to 2 then rotated about Y onto -z
        assert!(close(p, Vector4::new(1.0, 2.0, 1.0, 1.0)), "{p:?}");
    }

    #[test]
    fn test_floor_rotation_lays_plane_flat() {
        let floor = Transform::default().with_rotation(-FRAC_PI_2, 0.0, 0.0);
        let normal = floor.matrix() * Vector4::new(0.0, 0.0, 1.0, 0.0);
        assert!(close(normal, Vector4::new(0.0, 1.0, 0.0, 0.0)), "{normal:?}");
    }

    #[test]
    fn test_normal_matrix_undoes_non_uniform_scale() {
        let mut transform = Transform::default();
        transform.scale = Vector3::new(2.0, 1.0, 1.0);
        let normal_matrix = Transform::normal_matrix(&transform.matrix());
        let n = normal_matrix * Vector4::new(1.0, 0.0, 0.0, 0.0);
        assert!(close(n, Vector4::new(0.5, 0.0, 0.0, 0.0)));
    }
}
