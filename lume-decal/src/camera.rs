use glam::{Mat3, Mat4, UVec4, Vec3, Vec4};

use crate::cluster::ClusterGridLayout;
use crate::config::CameraConfig;
use crate::input::CameraInput;
use crate::obb::Obb;
use crate::types::CameraUniform;

/// Per-frame camera snapshot. Everything downstream of input reads this copy.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraState {
    pub view: Mat4,
    /// Vulkan clip space: depth in [0, 1], Y pointing down.
    pub projection: Mat4,
    pub inverse_projection: Mat4,
    pub inverse_view_projection: Mat4,
    pub position: Vec3,
    /// Columns: right, up, back.
    pub orientation: Mat3,
    pub near: f32,
    pub far: f32,
    pub width: u32,
    pub height: u32,
}

impl CameraState {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        position: Vec3,
        forward: Vec3,
        world_up: Vec3,
        fov_y: f32,
        near: f32,
        far: f32,
        width: u32,
        height: u32,
    ) -> Self {
        let forward = forward.normalize();
        let view = Mat4::look_to_rh(position, forward, world_up);
        let aspect = width.max(1) as f32 / height.max(1) as f32;
        let mut projection = Mat4::perspective_rh(fov_y, aspect, near, far);
        projection.y_axis.y *= -1.0;

        let back = -forward;
        let right = forward.cross(world_up).normalize();
        let up = back.cross(right);

        Self {
            view,
            projection,
            inverse_projection: projection.inverse(),
            inverse_view_projection: (projection * view).inverse(),
            position,
            orientation: Mat3::from_cols(right, up, back),
            near,
            far,
            width,
            height,
        }
    }

    pub fn forward(&self) -> Vec3 {
        -self.orientation.z_axis
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection * self.view
    }

    /// Thin box lying on the near clip plane, covering its full width and height.
    pub fn near_slab(&self, thickness: f32) -> Obb {
        let corner = self.inverse_projection.project_point3(Vec3::new(1.0, 1.0, 0.0));
        Obb {
            center: self.position + self.forward() * self.near,
            extents: Vec3::new(corner.x.abs(), corner.y.abs(), thickness),
            orientation: self.orientation,
        }
    }

    /// Distance in front of the camera along the view axis.
    pub fn linear_depth(&self, world: Vec3) -> f32 {
        -self.view.transform_point3(world).z
    }

    pub fn uniform(&self, grid: &ClusterGridLayout) -> CameraUniform {
        let view_projection = self.view_projection();
        CameraUniform {
            view: self.view,
            projection: self.projection,
            view_projection,
            inverse_view_projection: self.inverse_view_projection,
            inverse_projection: self.inverse_projection,
            position: self.position.extend(1.0),
            params: Vec4::new(self.near, self.far, self.width as f32, self.height as f32),
            grid: UVec4::new(grid.num_x_tiles, grid.num_y_tiles, grid.num_z_tiles, grid.words_per_cell),
        }
    }
}

/// First-person camera: WASD moves, mouse looks, the wheel zooms.
#[derive(Clone, Debug)]
pub struct FlyCamera {
    pub position: Vec3,
    /// Degrees. -90 looks down -Z.
    pub yaw: f32,
    pub pitch: f32,
    /// Vertical field of view in degrees.
    pub fov: f32,
    pub near: f32,
    pub far: f32,
    pub speed: f32,
    pub sensitivity: f32,
}

impl FlyCamera {
    pub const MIN_FOV: f32 = 1.0;
    pub const MAX_FOV: f32 = 45.0;
    const PITCH_LIMIT: f32 = 89.0;

    pub fn new(config: &CameraConfig) -> Self {
        Self {
            position: Vec3::from(config.position),
            yaw: config.yaw,
            pitch: config.pitch.clamp(-Self::PITCH_LIMIT, Self::PITCH_LIMIT),
            fov: config.fov.clamp(Self::MIN_FOV, Self::MAX_FOV),
            near: config.near,
            far: config.far,
            speed: config.speed,
            sensitivity: config.sensitivity,
        }
    }

    pub fn forward(&self) -> Vec3 {
        let (yaw, pitch) = (self.yaw.to_radians(), self.pitch.to_radians());
        Vec3::new(yaw.cos() * pitch.cos(), pitch.sin(), yaw.sin() * pitch.cos()).normalize()
    }

    pub fn update(&mut self, input: &CameraInput, dt: f32) {
        self.yaw += input.look.x * self.sensitivity;
        self.pitch = (self.pitch - input.look.y * self.sensitivity).clamp(-Self::PITCH_LIMIT, Self::PITCH_LIMIT);
        self.fov = (self.fov - input.scroll).clamp(Self::MIN_FOV, Self::MAX_FOV);

        let forward = self.forward();
        let right = forward.cross(Vec3::Y).normalize();
        let step = self.speed * dt;
        self.position += forward * input.forward * step + right * input.right * step;
    }

    pub fn state(&self, width: u32, height: u32) -> CameraState {
        CameraState::new(
            self.position,
            self.forward(),
            Vec3::Y,
            self.fov.to_radians(),
            self.near,
            self.far,
            width,
            height,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera() -> CameraState {
        CameraState::new(Vec3::ZERO, -Vec3::Z, Vec3::Y, 45f32.to_radians(), 0.1, 35.0, 1280, 720)
    }

    #[test]
    fn test_orientation_matches_view() {
        let cam = camera();
        assert!(cam.forward().abs_diff_eq(-Vec3::Z, 1e-6));
        assert!(cam.orientation.x_axis.abs_diff_eq(Vec3::X, 1e-6));
        assert!(cam.orientation.y_axis.abs_diff_eq(Vec3::Y, 1e-6));
        assert!((cam.linear_depth(Vec3::new(0.0, 0.0, -3.0)) - 3.0).abs() < 1e-5);
    }

    #[test]
    fn test_near_slab_covers_near_plane() {
        let cam = camera();
        let slab = cam.near_slab(0.01);
        let half_height = 0.1 * (22.5f32).to_radians().tan();
        assert!(slab.center.abs_diff_eq(Vec3::new(0.0, 0.0, -0.1), 1e-6));
        assert!((slab.extents.y - half_height).abs() < 1e-5);
        assert!((slab.extents.x - half_height * 1280.0 / 720.0).abs() < 1e-5);
        assert_eq!(slab.extents.z, 0.01);
    }

    #[test]
    fn test_projection_flips_y() {
        let cam = camera();
        let clip = cam.view_projection().project_point3(Vec3::new(0.0, 1.0, -5.0));
        assert!(clip.y < 0.0);
        assert!(clip.z > 0.0 && clip.z < 1.0);
    }

    #[test]
    fn test_fly_camera_clamps_pitch_and_fov() {
        let mut fly = FlyCamera::new(&CameraConfig::default());
        fly.update(&CameraInput { look: glam::Vec2::new(0.0, -10_000.0), scroll: 100.0, ..Default::default() }, 0.016);
        assert_eq!(fly.pitch, 89.0);
        assert_eq!(fly.fov, FlyCamera::MIN_FOV);
        fly.update(&CameraInput { scroll: -100.0, ..Default::default() }, 0.016);
        assert_eq!(fly.fov, FlyCamera::MAX_FOV);
    }

    #[test]
    fn test_fly_camera_moves_along_forward() {
        let mut fly = FlyCamera::new(&CameraConfig::default());
        fly.position = Vec3::ZERO;
        fly.yaw = -90.0;
        fly.pitch = 0.0;
        fly.speed = 2.0;
        fly.update(&CameraInput { forward: 1.0, ..Default::default() }, 0.5);
        assert!(fly.position.abs_diff_eq(Vec3::new(0.0, 0.0, -1.0), 1e-5));
    }
}
