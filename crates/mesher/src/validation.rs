//! Mesh validation utilities.
//!
//! `MeshValidator` checks assembled buffers: strides, in-range indices, face
//! ranges, outward winding, atlas range and island overlap.

use glam::{Vec2, Vec3};

use crate::viewport::mesh::GeometryBuffers;
use crate::viewport::picking::Aabb;

/// Validator for `GeometryBuffers` integrity checks.
pub struct MeshValidator<'a> {
    mesh: &'a GeometryBuffers,
}

impl<'a> MeshValidator<'a> {
    pub fn new(mesh: &'a GeometryBuffers) -> Self {
        Self { mesh }
    }

    pub fn vertex_count(&self) -> usize {
        self.mesh.vertex_count()
    }

    pub fn triangle_count(&self) -> usize {
        self.mesh.triangle_count()
    }

    /// Positions, normals and colors hold 3 floats per vertex, uvs 2.
    pub fn is_stride_valid(&self) -> bool {
        let m = self.mesh;
        m.positions.len() % 3 == 0
            && m.normals.len() == m.positions.len()
            && m.colors.len() == m.positions.len()
            && m.uvs.len() == self.vertex_count() * 2
    }

    pub fn is_index_stride_valid(&self) -> bool {
        self.mesh.indices.len() % 3 == 0
    }

    pub fn are_indices_in_range(&self) -> bool {
        let max_idx = self.vertex_count() as u32;
        self.mesh.indices.iter().all(|&i| i < max_idx)
    }

    /// Faces cover the triangles in order, and each face references its own
    /// vertex block that follows the previous face's.
    pub fn are_face_ranges_consistent(&self) -> bool {
        let mut next_triangle = 0;
        let mut vertex_floor = 0;
        for face in &self.mesh.faces {
            if face.start != next_triangle || face.end < face.start || face.end > self.triangle_count() {
                return false;
            }
            next_triangle = face.end;

            let vertices = face.triangles().flat_map(|t| self.mesh.triangle(t));
            let (lo, hi) = vertices.fold((usize::MAX, 0), |(lo, hi), v| (lo.min(v), hi.max(v)));
            if face.start == face.end {
                continue;
            }
            if lo < vertex_floor {
                return false;
            }
            vertex_floor = hi + 1;
        }
        next_triangle == self.triangle_count()
    }

    pub fn are_normals_normalized(&self, epsilon: f32) -> bool {
        (0..self.vertex_count()).all(|i| (self.mesh.normal(i).length() - 1.0).abs() <= epsilon)
    }

    /// Triangles whose winding disagrees with their vertex normals.
    /// Degenerate triangles are skipped.
    pub fn inward_triangles(&self) -> Vec<usize> {
        (0..self.triangle_count())
            .filter(|&t| {
                let [a, b, c] = self.mesh.triangle(t);
                let (pa, pb, pc) = (self.mesh.position(a), self.mesh.position(b), self.mesh.position(c));
                let geometric = (pb - pa).cross(pc - pa);
                let shading = self.mesh.normal(a) + self.mesh.normal(b) + self.mesh.normal(c);
                geometric.length_squared() > 1e-12 && geometric.dot(shading) <= 0.0
            })
            .collect()
    }

    pub fn are_uvs_in_range(&self) -> bool {
        self.mesh.uvs.iter().all(|&c| (0.0..=1.0).contains(&c))
    }

    /// Atlas-space bounding box of each face's UV island
    pub fn uv_islands(&self) -> Vec<(Vec2, Vec2)> {
        self.mesh
            .faces
            .iter()
            .map(|face| {
                let mut lo = Vec2::splat(f32::MAX);
                let mut hi = Vec2::splat(f32::MIN);
                for t in face.triangles() {
                    for v in self.mesh.triangle(t) {
                        let uv = Vec2::new(self.mesh.uvs[v * 2], self.mesh.uvs[v * 2 + 1]);
                        lo = lo.min(uv);
                        hi = hi.max(uv);
                    }
                }
                (lo, hi)
            })
            .collect()
    }

    /// Pairs of faces whose UV islands overlap
    pub fn overlapping_islands(&self) -> Vec<(usize, usize)> {
        let islands = self.uv_islands();
        let mut pairs = Vec::new();
        for i in 0..islands.len() {
            for j in i + 1..islands.len() {
                let ((alo, ahi), (blo, bhi)) = (islands[i], islands[j]);
                if alo.x < bhi.x && blo.x < ahi.x && alo.y < bhi.y && blo.y < ahi.y {
                    pairs.push((self.mesh.faces[i].index, self.mesh.faces[j].index));
                }
            }
        }
        pairs
    }

    pub fn aabb(&self) -> Option<Aabb> {
        Aabb::from_buffers(self.mesh)
    }

    /// Dimensions (width, height, depth) of the bounding box
    pub fn dimensions(&self) -> [f32; 3] {
        self.aabb().map_or([0.0; 3], |aabb| (aabb.max - aabb.min).to_array())
    }

    pub fn assert_dimensions_approx(&self, expected: [f32; 3], tolerance: f32) -> bool {
        let dims = Vec3::from(self.dimensions());
        (dims - Vec3::from(expected)).abs().max_element() < tolerance
    }

    /// Run all validation checks and return a list of error messages.
    /// An empty list means the mesh is valid.
    pub fn validate_all(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if !self.is_stride_valid() {
            errors.push(format!(
                "Buffer strides disagree: {} positions, {} normals, {} uvs, {} colors",
                self.mesh.positions.len(),
                self.mesh.normals.len(),
                self.mesh.uvs.len(),
                self.mesh.colors.len()
            ));
            // Remaining checks index the buffers per vertex
            return errors;
        }

        if !self.is_index_stride_valid() {
            errors.push(format!(
                "Index buffer length {} is not a multiple of 3",
                self.mesh.indices.len()
            ));
            return errors;
        }

        if !self.are_indices_in_range() {
            let max_idx = self.vertex_count() as u32;
            let out_of_range: Vec<_> = self.mesh.indices.iter().filter(|&&i| i >= max_idx).take(5).collect();
            errors.push(format!(
                "Indices out of range (vertex_count={}): {:?}",
                max_idx, out_of_range
            ));
            return errors;
        }

        if !self.are_face_ranges_consistent() {
            errors.push("Face triangle ranges do not tile the index buffer".to_string());
        }

        if self.vertex_count() > 0 && !self.are_normals_normalized(0.1) {
            errors.push("Some normals are not unit-length (epsilon=0.1)".to_string());
        }

        let inward = self.inward_triangles();
        if !inward.is_empty() {
            errors.push(format!(
                "{} triangles wind against their normals: {:?}",
                inward.len(),
                &inward[..inward.len().min(5)]
            ));
        }

        if !self.are_uvs_in_range() {
            errors.push("Some uvs fall outside [0, 1]".to_string());
        }

        if self.are_face_ranges_consistent() {
            let overlaps = self.overlapping_islands();
            if !overlaps.is_empty() {
                errors.push(format!("Overlapping UV islands: {:?}", overlaps));
            }
        }

        errors
    }
}
