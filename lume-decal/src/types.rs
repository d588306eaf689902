use bytemuck::{Pod, Zeroable};
use glam::{Mat3, Mat4, UVec4, Vec3, Vec4};

use crate::obb::Obb;
use crate::N_MAX_STORED_DECALS;

/// Rotation frame of a decal: columns are (right, up, forward) with forward = -normal,
/// then spun about forward by `rotation` radians.
///
/// The up reference is world Y unless the normal is within ~8 degrees of it, where
/// the cross product would degenerate; world Z is used there instead.
pub fn decal_frame(normal: Vec3, rotation: f32) -> Mat3 {
    let normal = normal.normalize();
    let forward = -normal;
    let up_ref = if normal.dot(Vec3::Y).abs() >= 0.99 { Vec3::Z } else { Vec3::Y };
    let right = up_ref.cross(forward).normalize();
    let up = forward.cross(right);

    let spin = Mat3::from_axis_angle(forward, rotation);
    Mat3::from_cols(spin * right, spin * up, forward)
}

/// A committed decal. Never edited in place; the store replaces whole records.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DecalRecord {
    pub position: Vec3,
    pub normal: Vec3,
    /// Width, height and thickness of the projection box.
    pub size: Vec3,
    pub rotation: f32,
    pub angle_fade: f32,
    pub albedo: f32,
    pub intensity: f32,
    pub albedo_index: u32,
    pub normal_index: u32,
}

impl DecalRecord {
    pub fn orientation(&self) -> Mat3 {
        decal_frame(self.normal, self.rotation)
    }

    pub fn oriented_box(&self) -> Obb {
        Obb {
            center: self.position,
            extents: self.size * 0.5,
            orientation: self.orientation(),
        }
    }

    /// Maps the unit proxy box `[-1, 1]^3` onto the decal volume.
    pub fn world_from_decal(&self) -> Mat4 {
        let frame = self.orientation();
        let extents = self.size * 0.5;
        Mat4::from_cols(
            (frame.x_axis * extents.x).extend(0.0),
            (frame.y_axis * extents.y).extend(0.0),
            (frame.z_axis * extents.z).extend(0.0),
            self.position.extend(1.0),
        )
    }

    pub fn to_gpu(&self) -> GpuDecal {
        let world_from_decal = self.world_from_decal();
        GpuDecal {
            world_from_decal,
            decal_from_world: world_from_decal.inverse(),
            normal_fade: self.normal.normalize().extend(self.angle_fade),
            albedo: self.albedo,
            intensity: self.intensity,
            albedo_index: self.albedo_index,
            normal_index: self.normal_index,
        }
    }
}

/// Live placement parameters; everything a record has except where it goes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CursorPreview {
    pub size: Vec3,
    pub rotation: f32,
    pub angle_fade: f32,
    pub albedo: f32,
    pub intensity: f32,
    pub albedo_index: u32,
    pub normal_index: u32,
}

impl CursorPreview {
    pub fn place(&self, position: Vec3, normal: Vec3) -> DecalRecord {
        DecalRecord {
            position,
            normal,
            size: self.size,
            rotation: self.rotation,
            angle_fade: self.angle_fade,
            albedo: self.albedo,
            intensity: self.intensity,
            albedo_index: self.albedo_index,
            normal_index: self.normal_index,
        }
    }

    pub fn to_uniform(&self, show_cursor: bool, show_all: bool) -> CursorUniform {
        CursorUniform {
            size_rotation: self.size.extend(self.rotation),
            params: Vec4::new(self.angle_fade, self.albedo, self.intensity, 0.0),
            indices: UVec4::new(self.albedo_index, self.normal_index, show_cursor as u32, show_all as u32),
        }
    }
}

/// Inclusive depth-tile range of one decal.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct ZBounds {
    pub min: u32,
    pub max: u32,
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct GpuDecal {
    pub world_from_decal: Mat4,
    pub decal_from_world: Mat4,
    /// xyz: normal, w: angle fade.
    pub normal_fade: Vec4,
    pub albedo: f32,
    pub intensity: f32,
    pub albedo_index: u32,
    pub normal_index: u32,
}

/// Partition as the GPU sees it. Cluster bit `p` belongs to decal `indices[p]`.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct GpuIndexList {
    pub indices: [u32; N_MAX_STORED_DECALS],
    pub num_straddling: u32,
    pub active_count: u32,
    pub _padding: [u32; 2],
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct PickResult {
    pub position: Vec4,
    pub normal: Vec4,
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct CameraUniform {
    pub view: Mat4,
    pub projection: Mat4,
    pub view_projection: Mat4,
    pub inverse_view_projection: Mat4,
    pub inverse_projection: Mat4,
    pub position: Vec4,
    /// near, far, width, height
    pub params: Vec4,
    /// tiles x, tiles y, tiles z, words per cell
    pub grid: UVec4,
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct CursorUniform {
    pub size_rotation: Vec4,
    /// angle fade, albedo, intensity, unused
    pub params: Vec4,
    /// albedo index, normal index, show cursor, show all decals
    pub indices: UVec4,
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct LightUniform {
    pub sun_direction: Vec4,
    pub irradiance: Vec4,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(normal: Vec3, rotation: f32) -> DecalRecord {
        DecalRecord {
            position: Vec3::new(1.0, 2.0, 3.0),
            normal,
            size: Vec3::new(2.0, 1.0, 0.5),
            rotation,
            angle_fade: 0.5,
            albedo: 1.0,
            intensity: 1.0,
            albedo_index: 3,
            normal_index: 3,
        }
    }

    #[test]
    fn test_frame_is_right_handed_and_faces_into_surface() {
        for normal in [Vec3::X, Vec3::Y, -Vec3::Y, Vec3::new(0.3, 0.99, 0.1), Vec3::new(-1.0, 0.2, 0.7)] {
            let frame = decal_frame(normal, 0.7);
            assert!((frame.determinant() - 1.0).abs() < 1e-4);
            assert!(frame.z_axis.abs_diff_eq(-normal.normalize(), 1e-5));
            assert!(frame.x_axis.dot(frame.y_axis).abs() < 1e-5);
        }
    }

    #[test]
    fn test_vertical_normal_uses_fallback_up() {
        let frame = decal_frame(Vec3::Y, 0.0);
        assert!(frame.x_axis.is_finite() && frame.y_axis.is_finite());
        assert!((frame.x_axis.length() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_world_from_decal_maps_unit_box_corner() {
        let r = record(Vec3::Z, 0.0);
        let corner = r.world_from_decal().transform_point3(Vec3::ONE);
        let obb = r.oriented_box();
        let expected = obb.center + obb.orientation * obb.extents;
        assert!(corner.abs_diff_eq(expected, 1e-5));

        let gpu = r.to_gpu();
        let back = gpu.decal_from_world.transform_point3(corner);
        assert!(back.abs_diff_eq(Vec3::ONE, 1e-4));
    }

    #[test]
    fn test_gpu_layouts_match_shader_structs() {
        assert_eq!(std::mem::size_of::<GpuDecal>(), 160);
        assert_eq!(std::mem::size_of::<GpuIndexList>(), 272);
        assert_eq!(std::mem::size_of::<PickResult>(), 32);
        assert_eq!(std::mem::size_of::<CameraUniform>(), 368);
        assert_eq!(std::mem::size_of::<ZBounds>(), 8);
    }

    #[test]
    fn test_preview_place_keeps_shading_fields() {
        let preview = CursorPreview {
            size: Vec3::splat(0.5),
            rotation: 1.0,
            angle_fade: 0.2,
            albedo: 0.8,
            intensity: 0.9,
            albedo_index: 5,
            normal_index: 5,
        };
        let placed = preview.place(Vec3::X, Vec3::Y);
        assert_eq!(placed.position, Vec3::X);
        assert_eq!(placed.size, preview.size);
        assert_eq!(placed.albedo_index, 5);
    }
}
