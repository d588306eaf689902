use std::path::Path;

use anyhow::{Context, Result};
use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3};
use log::info;
use lume_core::device::*;
use lume_core::{Device, LumeResult};

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub color: [f32; 3],
}

impl Vertex {
    pub fn layout() -> VertexLayout {
        VertexLayout {
            array_stride: std::mem::size_of::<Vertex>() as u32,
            attributes: vec![
                VertexAttribute { location: 0, format: VertexFormat::Float32x3, offset: 0 },
                VertexAttribute { location: 1, format: VertexFormat::Float32x3, offset: 12 },
                VertexAttribute { location: 2, format: VertexFormat::Float32x3, offset: 24 },
            ],
        }
    }
}

/// Triangle soup the decals get projected onto.
#[derive(Clone, Debug, Default)]
pub struct Scene {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl Scene {
    /// Floor, three walls and two boxes, all facing into the room.
    pub fn room() -> Self {
        let mut scene = Self::default();
        let floor = Vec3::new(0.55, 0.55, 0.52);
        let wall = Vec3::new(0.72, 0.70, 0.66);

        scene.quad(Vec3::ZERO, Vec3::Y, Vec3::X, Vec2::new(5.0, 5.0), floor);
        scene.quad(Vec3::new(0.0, 2.0, -5.0), Vec3::Z, Vec3::X, Vec2::new(5.0, 2.0), wall);
        scene.quad(Vec3::new(-5.0, 2.0, 0.0), Vec3::X, Vec3::Z, Vec2::new(5.0, 2.0), wall);
        scene.quad(Vec3::new(5.0, 2.0, 0.0), -Vec3::X, Vec3::Z, Vec2::new(5.0, 2.0), wall);

        scene.cuboid(Vec3::new(-1.8, 0.5, -2.0), Vec3::new(0.5, 0.5, 0.5), Vec3::new(0.62, 0.45, 0.35));
        scene.cuboid(Vec3::new(1.5, 0.9, -1.0), Vec3::new(0.6, 0.9, 0.4), Vec3::new(0.40, 0.50, 0.62));
        scene
    }

    pub fn load_obj(path: &Path) -> Result<Self> {
        let (models, _materials) = tobj::load_obj(path, &tobj::GPU_LOAD_OPTIONS)
            .with_context(|| format!("Failed to load OBJ file: {}", path.display()))?;

        let mut scene = Self::default();
        for model in models {
            let mesh = &model.mesh;
            let base = scene.vertices.len() as u32;
            let count = mesh.positions.len() / 3;
            let has_normals = mesh.normals.len() == mesh.positions.len();

            for i in 0..count {
                let position = [mesh.positions[i * 3], mesh.positions[i * 3 + 1], mesh.positions[i * 3 + 2]];
                let normal = if has_normals {
                    [mesh.normals[i * 3], mesh.normals[i * 3 + 1], mesh.normals[i * 3 + 2]]
                } else {
                    [0.0; 3]
                };
                scene.vertices.push(Vertex { position, normal, color: [0.7; 3] });
            }
            scene.indices.extend(mesh.indices.iter().map(|&index| index + base));

            if !has_normals {
                scene.smooth_normals(base as usize);
            }
        }

        info!("Loaded {} ({} vertices, {} triangles)", path.display(), scene.vertices.len(), scene.indices.len() / 3);
        Ok(scene)
    }

    /// Rectangle centred at `center` facing `normal`. Counter-clockwise seen
    /// from the side the normal points to.
    pub fn quad(&mut self, center: Vec3, normal: Vec3, tangent: Vec3, half: Vec2, color: Vec3) {
        let u = tangent * half.x;
        let v = normal.cross(tangent) * half.y;
        let base = self.vertices.len() as u32;

        for corner in [center - u - v, center + u - v, center + u + v, center - u + v] {
            self.vertices.push(Vertex {
                position: corner.to_array(),
                normal: normal.to_array(),
                color: color.to_array(),
            });
        }
        self.indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    /// Axis-aligned box resting on its bottom face, which is left out.
    pub fn cuboid(&mut self, center: Vec3, half: Vec3, color: Vec3) {
        for normal in [Vec3::X, -Vec3::X, Vec3::Z, -Vec3::Z, Vec3::Y] {
            let tangent = if normal.y.abs() > 0.5 { Vec3::X } else { Vec3::Y };
            let bitangent = normal.cross(tangent);
            let extents = Vec2::new(tangent.abs().dot(half), bitangent.abs().dot(half));
            self.quad(center + normal * normal.abs().dot(half), normal, tangent, extents, color);
        }
    }

    /// Area-weighted vertex normals for meshes that ship without any,
    /// over vertices from `first` on.
    fn smooth_normals(&mut self, first: usize) {
        let mut accumulated = vec![Vec3::ZERO; self.vertices.len() - first];
        for triangle in self.indices.chunks_exact(3) {
            let [a, b, c] = [triangle[0], triangle[1], triangle[2]].map(|i| i as usize);
            if a < first || b < first || c < first {
                continue;
            }
            let [pa, pb, pc] = [a, b, c].map(|i| Vec3::from(self.vertices[i].position));
            let face = (pb - pa).cross(pc - pa);
            for i in [a, b, c] {
                accumulated[i - first] += face;
            }
        }
        for (vertex, normal) in self.vertices[first..].iter_mut().zip(accumulated) {
            vertex.normal = normal.try_normalize().unwrap_or(Vec3::Y).to_array();
        }
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// The scene uploaded once into host-visible vertex and index buffers.
pub struct SceneMesh<D: Device> {
    pub vertex_buffer: D::Buffer,
    pub index_buffer: D::Buffer,
    pub index_count: u32,
}

impl<D: Device> SceneMesh<D> {
    pub fn upload(device: &D, scene: &Scene) -> LumeResult<Self> {
        let vertex_bytes: &[u8] = bytemuck::cast_slice(&scene.vertices);
        let vertex_buffer = device.create_buffer(BufferDescriptor {
            size: vertex_bytes.len() as u64,
            usage: BufferUsage::VERTEX,
            location: MemoryLocation::CpuToGpu,
        })?;
        vertex_buffer.write_data(0, vertex_bytes)?;

        let index_bytes: &[u8] = bytemuck::cast_slice(&scene.indices);
        let index_buffer = device.create_buffer(BufferDescriptor {
            size: index_bytes.len() as u64,
            usage: BufferUsage::INDEX,
            location: MemoryLocation::CpuToGpu,
        })?;
        index_buffer.write_data(0, index_bytes)?;

        info!("Scene uploaded: {} triangles", scene.triangle_count());
        Ok(Self { vertex_buffer, index_buffer, index_count: scene.indices.len() as u32 })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn face_normal(scene: &Scene, triangle: &[u32]) -> Vec3 {
        let [a, b, c] = [triangle[0], triangle[1], triangle[2]].map(|i| Vec3::from(scene.vertices[i as usize].position));
        (b - a).cross(c - a)
    }

    #[test]
    fn test_room_triangles_wind_towards_their_normal() {
        let scene = Scene::room();
        assert_eq!(scene.triangle_count(), 4 * 2 + 2 * 5 * 2);
        for triangle in scene.indices.chunks_exact(3) {
            let stored = Vec3::from(scene.vertices[triangle[0] as usize].normal);
            assert!(face_normal(&scene, triangle).dot(stored) > 0.0);
            assert!((stored.length() - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_cuboid_spans_its_extents() {
        let mut scene = Scene::default();
        scene.cuboid(Vec3::new(1.0, 2.0, 3.0), Vec3::new(0.5, 1.0, 1.5), Vec3::ONE);

        let (min, max) = scene.vertices.iter().fold((Vec3::splat(f32::MAX), Vec3::splat(f32::MIN)), |(lo, hi), v| {
            let p = Vec3::from(v.position);
            (lo.min(p), hi.max(p))
        });
        assert!(min.abs_diff_eq(Vec3::new(0.5, 1.0, 1.5), 1e-6));
        assert!(max.abs_diff_eq(Vec3::new(1.5, 3.0, 4.5), 1e-6));
    }

    #[test]
    fn test_smooth_normals_follow_winding() {
        let mut scene = Scene::default();
        for position in [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]] {
            scene.vertices.push(Vertex { position, normal: [0.0; 3], color: [1.0; 3] });
        }
        scene.indices = vec![0, 1, 2];
        scene.smooth_normals(0);
        for vertex in &scene.vertices {
            assert!(Vec3::from(vertex.normal).abs_diff_eq(Vec3::Z, 1e-6));
        }
    }

    #[test]
    fn test_vertex_layout_matches_struct() {
        let layout = Vertex::layout();
        assert_eq!(layout.array_stride, 36);
        assert_eq!(layout.attributes.last().map(|a| a.offset), Some(24));
    }
}
