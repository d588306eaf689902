use std::cmp::Ordering;

use glam::{Mat3, Vec3};

/// Slack added to the absolute rotation terms so near-parallel edge pairs do not
/// produce a spurious separating axis from a near-zero cross product.
const SAT_EPSILON: f32 = 1e-6;

/// Oriented bounding box. `orientation` columns are the box's local axes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Obb {
    pub center: Vec3,
    /// Half extents along each local axis.
    pub extents: Vec3,
    pub orientation: Mat3,
}

impl Obb {
    pub fn corners(&self) -> [Vec3; 8] {
        let mut corners = [Vec3::ZERO; 8];
        for (i, corner) in corners.iter_mut().enumerate() {
            let sign = Vec3::new(
                if i & 1 == 0 { -1.0 } else { 1.0 },
                if i & 2 == 0 { -1.0 } else { 1.0 },
                if i & 4 == 0 { -1.0 } else { 1.0 },
            );
            *corner = self.center + self.orientation * (sign * self.extents);
        }
        corners
    }

    /// Separating axis test over the 15 candidate axes.
    ///
    /// Operands are put in a canonical order first, so swapping them always
    /// evaluates the same floating point expression.
    pub fn intersects(&self, other: &Obb) -> bool {
        match self.canonical_cmp(other) {
            Ordering::Greater => separating_axis_overlap(other, self),
            _ => separating_axis_overlap(self, other),
        }
    }

    fn key(&self) -> [f32; 15] {
        let o = self.orientation.to_cols_array();
        [
            self.center.x, self.center.y, self.center.z,
            self.extents.x, self.extents.y, self.extents.z,
            o[0], o[1], o[2], o[3], o[4], o[5], o[6], o[7], o[8],
        ]
    }

    fn canonical_cmp(&self, other: &Obb) -> Ordering {
        self.key()
            .iter()
            .zip(other.key().iter())
            .map(|(a, b)| a.total_cmp(b))
            .find(|ordering| ordering.is_ne())
            .unwrap_or(Ordering::Equal)
    }
}

fn separating_axis_overlap(a: &Obb, b: &Obb) -> bool {
    let a_axes = [a.orientation.x_axis, a.orientation.y_axis, a.orientation.z_axis];
    let b_axes = [b.orientation.x_axis, b.orientation.y_axis, b.orientation.z_axis];
    let ae = a.extents.to_array();
    let be = b.extents.to_array();

    // B expressed in A's frame.
    let mut r = [[0.0f32; 3]; 3];
    let mut abs_r = [[0.0f32; 3]; 3];
    for i in 0..3 {
        for j in 0..3 {
            r[i][j] = a_axes[i].dot(b_axes[j]);
            abs_r[i][j] = r[i][j].abs() + SAT_EPSILON;
        }
    }

    let d = b.center - a.center;
    let t = [d.dot(a_axes[0]), d.dot(a_axes[1]), d.dot(a_axes[2])];

    for i in 0..3 {
        let ra = ae[i];
        let rb = be[0] * abs_r[i][0] + be[1] * abs_r[i][1] + be[2] * abs_r[i][2];
        if t[i].abs() > ra + rb {
            return false;
        }
    }

    for j in 0..3 {
        let ra = ae[0] * abs_r[0][j] + ae[1] * abs_r[1][j] + ae[2] * abs_r[2][j];
        let rb = be[j];
        let distance = t[0] * r[0][j] + t[1] * r[1][j] + t[2] * r[2][j];
        if distance.abs() > ra + rb {
            return false;
        }
    }

    for i in 0..3 {
        let (i1, i2) = ((i + 1) % 3, (i + 2) % 3);
        for j in 0..3 {
            let (j1, j2) = ((j + 1) % 3, (j + 2) % 3);
            let ra = ae[i1] * abs_r[i2][j] + ae[i2] * abs_r[i1][j];
            let rb = be[j1] * abs_r[i][j2] + be[j2] * abs_r[i][j1];
            let distance = t[i2] * r[i1][j] - t[i1] * r[i2][j];
            if distance.abs() > ra + rb {
                return false;
            }
        }
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn axis_aligned(center: Vec3, extents: Vec3) -> Obb {
        Obb { center, extents, orientation: Mat3::IDENTITY }
    }

    /// Deterministic pseudo-random boxes, including flat and zero-volume ones.
    fn boxes() -> Vec<Obb> {
        let mut state = 0x2545_f491u32;
        let mut next = move || {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            (state as f32 / u32::MAX as f32) * 2.0 - 1.0
        };

        let mut out = Vec::new();
        for k in 0..48 {
            let center = Vec3::new(next(), next(), next()) * 3.0;
            let mut extents = Vec3::new(next().abs(), next().abs(), next().abs()) * 2.0;
            match k % 6 {
                0 => extents = Vec3::ZERO,
                1 => extents.z = 0.0,
                _ => {}
            }
            let axis = Vec3::new(next(), next(), next()).try_normalize().unwrap_or(Vec3::Y);
            let orientation = Mat3::from_axis_angle(axis, next() * std::f32::consts::PI);
            out.push(Obb { center, extents, orientation });
        }
        out
    }

    #[test]
    fn test_overlapping_and_separated_axis_aligned() {
        let a = axis_aligned(Vec3::ZERO, Vec3::ONE);
        assert!(a.intersects(&axis_aligned(Vec3::new(1.5, 0.0, 0.0), Vec3::ONE)));
        assert!(!a.intersects(&axis_aligned(Vec3::new(2.5, 0.0, 0.0), Vec3::ONE)));
        assert!(a.intersects(&a));
    }

    #[test]
    fn test_rotated_box_separated_only_by_its_own_axis() {
        // Every cube face axis overlaps; only the diamond's diagonal axis separates.
        let cube = axis_aligned(Vec3::ZERO, Vec3::ONE);
        let diamond = Obb {
            center: Vec3::new(1.6, 1.6, 0.0),
            extents: Vec3::splat(0.5),
            orientation: Mat3::from_rotation_z(std::f32::consts::FRAC_PI_4),
        };
        assert!(!cube.intersects(&diamond));
        assert!(!diamond.intersects(&cube));

        let touching = Obb { center: Vec3::new(1.2, 1.2, 0.0), ..diamond };
        assert!(cube.intersects(&touching));
    }

    #[test]
    fn test_intersection_is_symmetric() {
        let boxes = boxes();
        for a in &boxes {
            for b in &boxes {
                assert_eq!(a.intersects(b), b.intersects(a), "{:?} vs {:?}", a, b);
            }
        }
    }

    #[test]
    fn test_degenerate_boxes() {
        let point = axis_aligned(Vec3::ZERO, Vec3::ZERO);
        let plane = Obb { extents: Vec3::new(1.0, 1.0, 0.0), ..axis_aligned(Vec3::ZERO, Vec3::ZERO) };
        assert!(point.intersects(&plane));
        assert!(plane.intersects(&point));
        let far_point = axis_aligned(Vec3::new(0.0, 0.0, 0.5), Vec3::ZERO);
        assert!(!far_point.intersects(&plane));
        assert!(!plane.intersects(&far_point));
    }

    #[test]
    fn test_corners_span_box() {
        let obb = Obb {
            center: Vec3::new(1.0, 2.0, 3.0),
            extents: Vec3::new(1.0, 2.0, 3.0),
            orientation: Mat3::IDENTITY,
        };
        let corners = obb.corners();
        let min = corners.iter().copied().reduce(Vec3::min).unwrap();
        let max = corners.iter().copied().reduce(Vec3::max).unwrap();
        assert_eq!(min, Vec3::ZERO);
        assert_eq!(max, Vec3::new(2.0, 4.0, 6.0));
    }
}
