use super::camera_utils::{convert_matrix4_to_array, Camera, CameraUniform};
use cgmath::*;

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: cgmath::Matrix4<f32> = cgmath::Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.5,
    0.0, 0.0, 0.0, 1.0,
);

/// Y-up orbit camera
///
/// The eye sits on a sphere of radius `distance` around `target`. Rotation and
/// pan requests are accumulated and, when damping is enabled, bled into the
/// camera a fraction at a time by [`OrbitCamera::update_damping`].
#[derive(Debug, Clone, Copy)]
pub struct OrbitCamera {
    pub distance: f32,
    pub pitch: f32,
    pub yaw: f32,
    pub eye: Vector3<f32>,
    pub target: Vector3<f32>,
    pub up: Vector3<f32>,
    pub bounds: OrbitCameraBounds,
    pub aspect: f32,
    pub fovy: Rad<f32>,
    pub znear: f32,
    pub zfar: f32,
    /// Fraction of the pending motion applied per frame, `None` for immediate motion
    pub damping: Option<f32>,
    pub uniform: CameraUniform,
    pending_yaw: f32,
    pending_pitch: f32,
    pending_pan: Vector2<f32>,
    home: (f32, f32, f32, Vector3<f32>),
}

impl Camera for OrbitCamera {
    fn build_view_projection_matrix(&self) -> Matrix4<f32> {
        let eye = Point3::from_vec(self.eye);
        let target = Point3::from_vec(self.target);
        let view = Matrix4::look_at_rh(eye, target, self.up);
        let proj =
            OPENGL_TO_WGPU_MATRIX * perspective(self.fovy, self.aspect, self.znear, self.zfar);
        proj * view
    }
}

impl OrbitCamera {
    pub fn new(distance: f32, pitch: f32, yaw: f32, target: Vector3<f32>, aspect: f32) -> Self {
        let mut camera = Self {
            distance,
            pitch,
            yaw,
            eye: Vector3::zero(), // Will be auto-calculted in `update()` nevertheless.
            target,
            up: Vector3::unit_y(),
            bounds: OrbitCameraBounds::default(),
            aspect,
            fovy: Rad::from(Deg(75.0)),
            znear: 0.1,
            zfar: 100.0,
            damping: None,
            uniform: CameraUniform::default(),
            pending_yaw: 0.0,
            pending_pitch: 0.0,
            pending_pan: Vector2::zero(),
            home: (distance, pitch, yaw, target),
        };
        camera.update();
        camera
    }

    /// Places the camera at `eye` looking at `target`
    ///
    /// Distance, pitch and yaw are derived from the offset between the two
    /// points. The resulting pose also becomes the reset pose.
    pub fn looking_at(eye: Vector3<f32>, target: Vector3<f32>, aspect: f32) -> Self {
        let offset = eye - target;
        let distance = offset.magnitude();
        let horizontal = (offset.x * offset.x + offset.z * offset.z).sqrt();
        let pitch = offset.y.atan2(horizontal);
        let yaw = offset.x.atan2(offset.z);
        Self::new(distance, pitch, yaw, target, aspect)
    }

    pub fn with_bounds(mut self, bounds: OrbitCameraBounds) -> Self {
        self.bounds = bounds;
        self
    }

    pub fn with_damping(mut self, factor: f32) -> Self {
        self.damping = Some(factor.clamp(0.0, 1.0));
        self
    }

    pub fn with_clip_planes(mut self, znear: f32, zfar: f32) -> Self {
        self.znear = znear;
        self.zfar = zfar;
        self
    }

    pub fn with_fov(mut self, fovy: Deg<f32>) -> Self {
        self.fovy = Rad::from(fovy);
        self
    }

    pub fn reset_to_default(&mut self) {
        let (distance, pitch, yaw, target) = self.home;
        self.distance = distance;
        self.pitch = pitch;
        self.yaw = yaw;
        self.target = target;
        self.pending_yaw = 0.0;
        self.pending_pitch = 0.0;
        self.pending_pan = Vector2::zero();

        self.update();
    }

    pub fn set_distance(&mut self, distance: f32) {
        self.distance = distance.clamp(
            self.bounds.min_distance.unwrap_or(f32::EPSILON),
            self.bounds.max_distance.unwrap_or(f32::MAX),
        );
        self.update();
    }

    pub fn add_distance(&mut self, delta: f32) {
        let corrected_zoom = f32::log10(self.distance.max(1.1)) * delta;
        self.set_distance(self.distance + corrected_zoom);
    }

    pub fn set_pitch(&mut self, pitch: f32) {
        self.pitch = pitch.clamp(self.bounds.min_pitch, self.bounds.max_pitch);
        self.update();
    }

    pub fn add_pitch(&mut self, delta: f32) {
        self.set_pitch(self.pitch + delta);
    }

    pub fn set_yaw(&mut self, yaw: f32) {
        let mut bounded_yaw = yaw;
        if let Some(min_yaw) = self.bounds.min_yaw {
            bounded_yaw = bounded_yaw.clamp(min_yaw, f32::MAX);
        }
        if let Some(max_yaw) = self.bounds.max_yaw {
            bounded_yaw = bounded_yaw.clamp(f32::MIN, max_yaw);
        }
        self.yaw = bounded_yaw;
        self.update();
    }

    pub fn add_yaw(&mut self, delta: f32) {
        self.set_yaw(self.yaw + delta);
    }

    /// Requests a rotation, applied now or spread over later frames when damped
    pub fn rotate(&mut self, yaw_delta: f32, pitch_delta: f32) {
        if self.damping.is_some() {
            self.pending_yaw += yaw_delta;
            self.pending_pitch += pitch_delta;
        } else {
            self.add_yaw(yaw_delta);
            self.add_pitch(pitch_delta);
        }
    }

    /// Requests a pan, applied now or spread over later frames when damped
    pub fn request_pan(&mut self, delta: (f32, f32)) {
        if self.damping.is_some() {
            self.pending_pan += Vector2::new(delta.0, delta.1);
        } else {
            self.pan(delta);
        }
    }

    /// Applies one frame's share of the pending motion
    ///
    /// Each frame moves by `pending * factor` and the remainder decays by
    /// `1 - factor`, so motion eases out after the input stops.
    pub fn update_damping(&mut self) {
        let Some(factor) = self.damping else {
            return;
        };

        if self.pending_yaw != 0.0 || self.pending_pitch != 0.0 {
            self.add_yaw(self.pending_yaw * factor);
            self.add_pitch(self.pending_pitch * factor);
            self.pending_yaw *= 1.0 - factor;
            self.pending_pitch *= 1.0 - factor;
        }

        if self.pending_pan != Vector2::zero() {
            let step = self.pending_pan * factor;
            self.pan((step.x, step.y));
            self.pending_pan *= 1.0 - factor;
        }

        if self.pending_yaw.abs() < 1e-6 && self.pending_pitch.abs() < 1e-6 {
            self.pending_yaw = 0.0;
            self.pending_pitch = 0.0;
        }
        if self.pending_pan.magnitude2() < 1e-12 {
            self.pending_pan = Vector2::zero();
        }
    }

    /// True while damped motion is still being applied
    pub fn is_settling(&self) -> bool {
        self.pending_yaw != 0.0 || self.pending_pitch != 0.0 || self.pending_pan != Vector2::zero()
    }

    /// Pans the camera relative to the current view direction
    /// delta.0 = horizontal pan (left/right relative to camera view)
    /// delta.1 = vertical pan (up/down relative to camera view)
    pub fn pan(&mut self, delta: (f32, f32)) {
        let forward = (self.target - self.eye).normalize();
        let right = forward.cross(self.up).normalize();
        let up = right.cross(forward).normalize();

        // Scale by distance for a consistent feel at all zoom levels
        let pan_scale = self.distance * 0.1;

        let total_movement = right * delta.0 * pan_scale + up * delta.1 * pan_scale;

        self.eye += total_movement;
        self.target += total_movement;
    }

    /// Unit vectors of the camera's right and up axes in world space
    pub fn basis(&self) -> (Vector3<f32>, Vector3<f32>) {
        let forward = (self.target - self.eye).normalize();
        let right = forward.cross(self.up).normalize();
        let up = right.cross(forward).normalize();
        (right, up)
    }

    /// Updates the camera after changing `distance`, `pitch` or `yaw`.
    fn update(&mut self) {
        self.eye =
            calculate_cartesian_eye_position(self.pitch, self.yaw, self.distance, self.target);
    }

    /// Ignores a minimized window, which reports a zero width or height
    pub fn resize_projection(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.aspect = width as f32 / height as f32;
    }

    pub fn update_view_proj(&mut self) {
        self.uniform.view_position = [self.eye.x, self.eye.y, self.eye.z, 1.0];
        self.uniform.view_proj = convert_matrix4_to_array(self.build_view_projection_matrix());
    }
}

#[derive(Debug, Clone, Copy)]
pub struct OrbitCameraBounds {
    pub min_distance: Option<f32>,
    pub max_distance: Option<f32>,
    pub min_pitch: f32,
    pub max_pitch: f32,
    pub min_yaw: Option<f32>,
    pub max_yaw: Option<f32>,
}

impl Default for OrbitCameraBounds {
    fn default() -> Self {
        Self {
            min_distance: Some(1.0),
            max_distance: Some(40.0),
            min_pitch: -std::f32::consts::PI / 2.0 + 0.01,
            max_pitch: std::f32::consts::PI / 2.0 - 0.01,
            min_yaw: None,
            max_yaw: None,
        }
    }
}

fn calculate_cartesian_eye_position(
    pitch: f32,
    yaw: f32,
    distance: f32,
    target: Vector3<f32>,
) -> Vector3<f32> {
    Vector3::new(
        distance * yaw.sin() * pitch.cos(),
        distance * pitch.sin(),
        distance * yaw.cos() * pitch.cos(),
    ) + target
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Vector3<f32>, b: Vector3<f32>) -> bool {
        (a - b).magnitude() < 1e-4
    }

    #[test]
    fn test_looking_at_reproduces_eye() {
        let eye = Vector3::new(0.0, 1.5, 8.0);
        let target = Vector3::new(0.0, 1.0, 2.0);
        let camera = OrbitCamera::looking_at(eye, target, 16.0 / 9.0);

        assert!(close(camera.eye, eye), "eye = {:?}", camera.eye);
        assert!((camera.yaw).abs() < 1e-6);
        assert!(camera.pitch > 0.0);
    }

    #[test]
    fn test_undamped_rotation_is_immediate() {
        let mut camera = OrbitCamera::new(5.0, 0.0, 0.0, Vector3::zero(), 1.0);
        camera.rotate(0.5, 0.0);
        assert!((camera.yaw - 0.5).abs() < 1e-6);
        assert!(!camera.is_settling());
    }

    #[test]
    fn test_damped_rotation_converges() {
        let mut camera = OrbitCamera::new(5.0, 0.0, 0.0, Vector3::zero(), 1.0).with_damping(0.05);
        camera.rotate(1.0, 0.0);

        camera.update_damping();
        assert!((camera.yaw - 0.05).abs() < 1e-6);

        for _ in 0..500 {
            camera.update_damping();
        }
        assert!((camera.yaw - 1.0).abs() < 1e-3);
        assert!(!camera.is_settling());
    }

    #[test]
    fn test_pitch_is_clamped() {
        let mut camera = OrbitCamera::new(5.0, 0.0, 0.0, Vector3::zero(), 1.0);
        camera.add_pitch(10.0);
        assert!(camera.pitch < std::f32::consts::FRAC_PI_2);
    }

    #[test]
    fn test_reset_returns_to_initial_pose() {
        let eye = Vector3::new(0.0, 1.5, 8.0);
        let target = Vector3::new(0.0, 1.0, 2.0);
        let mut camera = OrbitCamera::looking_at(eye, target, 1.0);
        camera.add_yaw(1.0);
        camera.pan((0.3, 0.2));

        camera.reset_to_default();
        assert!(close(camera.eye, eye));
        assert!(close(camera.target, target));
    }

    #[test]
    fn test_resize_ignores_zero_dimensions() {
        let mut camera = OrbitCamera::new(5.0, 0.0, 0.0, Vector3::zero(), 1.5);
        camera.resize_projection(800, 0);
        assert_eq!(camera.aspect, 1.5);
        camera.resize_projection(0, 600);
        assert_eq!(camera.aspect, 1.5);
        camera.update_view_proj();
        assert!(camera.uniform.view_proj.iter().flatten().all(|v| v.is_finite()));

        camera.resize_projection(800, 400);
        assert_eq!(camera.aspect, 2.0);
    }
}
