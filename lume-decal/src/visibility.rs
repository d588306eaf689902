use crate::camera::CameraState;
use crate::obb::Obb;
use crate::types::{DecalRecord, ZBounds};
use crate::NUM_Z_TILES;

/// Per-frame classification of every active decal.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Visibility {
    pub z_bounds: Vec<ZBounds>,
    pub straddling: Vec<bool>,
}

impl Visibility {
    pub fn num_straddling(&self) -> usize {
        self.straddling.iter().filter(|&&s| s).count()
    }
}

/// Depth tile range and near-plane straddle test.
#[derive(Clone, Copy, Debug)]
pub struct VisibilityClassifier {
    pub slab_thickness: f32,
}

impl Default for VisibilityClassifier {
    fn default() -> Self {
        Self { slab_thickness: 0.01 }
    }
}

/// Depth tile holding a linear view depth, clamped to the grid.
pub fn z_tile(depth: f32, near: f32, far: f32) -> u32 {
    let normalized = ((depth - near) / (far - near)).clamp(0.0, 1.0);
    ((normalized * NUM_Z_TILES as f32) as u32).min(NUM_Z_TILES - 1)
}

impl VisibilityClassifier {
    pub fn new(slab_thickness: f32) -> Self {
        Self { slab_thickness }
    }

    pub fn z_bounds(&self, obb: &Obb, camera: &CameraState) -> ZBounds {
        let (min_depth, max_depth) = obb
            .corners()
            .iter()
            .map(|&corner| camera.linear_depth(corner))
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), d| (lo.min(d), hi.max(d)));

        ZBounds {
            min: z_tile(min_depth, camera.near, camera.far),
            max: z_tile(max_depth, camera.near, camera.far),
        }
    }

    pub fn straddles(&self, obb: &Obb, camera: &CameraState) -> bool {
        camera.near_slab(self.slab_thickness).intersects(obb)
    }

    pub fn classify(&self, decals: &[DecalRecord], camera: &CameraState) -> Visibility {
        let slab = camera.near_slab(self.slab_thickness);
        let mut visibility = Visibility {
            z_bounds: Vec::with_capacity(decals.len()),
            straddling: Vec::with_capacity(decals.len()),
        };
        for decal in decals {
            let obb = decal.oriented_box();
            visibility.z_bounds.push(self.z_bounds(&obb, camera));
            visibility.straddling.push(slab.intersects(&obb));
        }
        visibility
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Mat3, Vec3};

    fn camera() -> CameraState {
        CameraState::new(Vec3::new(1.0, 2.0, 3.0), Vec3::new(0.3, -0.2, -1.0), Vec3::Y, 45f32.to_radians(), 0.1, 35.0, 1280, 720)
    }

    fn cube(center: Vec3, half: f32) -> Obb {
        Obb { center, extents: Vec3::splat(half), orientation: Mat3::IDENTITY }
    }

    #[test]
    fn test_box_around_camera_straddles() {
        let cam = camera();
        let classifier = VisibilityClassifier::default();
        assert!(classifier.straddles(&cube(cam.position, 1.0), &cam));
    }

    #[test]
    fn test_distant_small_box_does_not_straddle() {
        let cam = camera();
        let classifier = VisibilityClassifier::default();
        let far_box = cube(cam.position + cam.forward() * 1000.0, 0.01);
        assert!(!classifier.straddles(&far_box, &cam));
    }

    #[test]
    fn test_box_behind_camera_does_not_straddle() {
        let cam = camera();
        let classifier = VisibilityClassifier::default();
        assert!(!classifier.straddles(&cube(cam.position - cam.forward() * 2.0, 0.5), &cam));
    }

    #[test]
    fn test_z_tiles_stay_in_range() {
        let cam = camera();
        let classifier = VisibilityClassifier::default();
        for step in -20..60 {
            let center = cam.position + cam.forward() * step as f32 + Vec3::new(0.2, -0.1, 0.3) * step as f32;
            for half in [0.0, 0.05, 1.0, 50.0] {
                let bounds = classifier.z_bounds(&cube(center, half), &cam);
                assert!(bounds.min <= bounds.max);
                assert!(bounds.max <= NUM_Z_TILES - 1);
            }
        }
    }

    #[test]
    fn test_z_tile_mapping() {
        assert_eq!(z_tile(0.0, 0.1, 35.0), 0);
        assert_eq!(z_tile(3.3, 0.1, 35.0), 1);
        assert_eq!(z_tile(35.0, 0.1, 35.0), 15);
        assert_eq!(z_tile(1000.0, 0.1, 35.0), 15);
    }

    #[test]
    fn test_classify_flags_each_decal() {
        let cam = camera();
        let classifier = VisibilityClassifier::default();
        let record = |position| DecalRecord {
            position,
            normal: Vec3::Y,
            size: Vec3::splat(1.0),
            rotation: 0.0,
            angle_fade: 0.5,
            albedo: 1.0,
            intensity: 1.0,
            albedo_index: 0,
            normal_index: 0,
        };
        let decals = [record(cam.position + cam.forward() * 10.0), record(cam.position), record(cam.position - Vec3::Y * 20.0)];
        let visibility = classifier.classify(&decals, &cam);
        assert_eq!(visibility.straddling, vec![false, true, false]);
        assert_eq!(visibility.num_straddling(), 1);
        assert_eq!(visibility.z_bounds.len(), 3);
    }
}
