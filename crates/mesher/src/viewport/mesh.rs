use std::ops::Range;

use glam::Vec3;

/// Per-face slice of an assembled mesh, used for face picking and gizmo
/// placement
#[derive(Debug, Clone, PartialEq)]
pub struct FaceMetadata {
    /// First triangle of the face in `GeometryBuffers::indices / 3`
    pub start: usize,
    /// One past the face's last triangle
    pub end: usize,
    /// Kernel face ordinal
    pub index: usize,
    pub is_planar: bool,
    /// Centroid of the face's vertices
    pub average: [f64; 3],
    /// Mean of the face's vertex normals
    pub normal: [f64; 3],
    pub uv_bounds: Option<[f64; 4]>,
}

impl FaceMetadata {
    pub fn triangles(&self) -> Range<usize> {
        self.start..self.end
    }

    pub fn contains_triangle(&self, triangle: usize) -> bool {
        self.triangles().contains(&triangle)
    }
}

/// Renderable triangle buffers: positions/normals/colors 3 floats per vertex,
/// uvs 2 floats per vertex, indices 3 per triangle
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeometryBuffers {
    pub positions: Vec<f32>,
    pub normals: Vec<f32>,
    pub uvs: Vec<f32>,
    /// Output slot for highlighting, black until a consumer writes it
    pub colors: Vec<f32>,
    pub indices: Vec<u32>,
    pub faces: Vec<FaceMetadata>,
}

impl GeometryBuffers {
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn position(&self, vertex: usize) -> Vec3 {
        let b = vertex * 3;
        Vec3::new(self.positions[b], self.positions[b + 1], self.positions[b + 2])
    }

    pub fn normal(&self, vertex: usize) -> Vec3 {
        let b = vertex * 3;
        Vec3::new(self.normals[b], self.normals[b + 1], self.normals[b + 2])
    }

    pub fn triangle(&self, triangle: usize) -> [usize; 3] {
        let b = triangle * 3;
        [
            self.indices[b] as usize,
            self.indices[b + 1] as usize,
            self.indices[b + 2] as usize,
        ]
    }

    /// Face owning a triangle of the concatenated index buffer
    pub fn face_for_triangle(&self, triangle: usize) -> Option<&FaceMetadata> {
        self.faces.iter().find(|f| f.contains_triangle(triangle))
    }

    /// Colors every vertex referenced by the face's triangles
    pub fn highlight_face(&mut self, face_index: usize, color: [f32; 3]) -> bool {
        let Some(range) = self
            .faces
            .iter()
            .find(|f| f.index == face_index)
            .map(FaceMetadata::triangles)
        else {
            return false;
        };

        for tri in range {
            for v in self.triangle(tri) {
                let c = v * 3;
                if c + 2 < self.colors.len() {
                    self.colors[c..c + 3].copy_from_slice(&color);
                }
            }
        }
        true
    }

    pub fn clear_colors(&mut self) {
        self.colors.iter_mut().for_each(|c| *c = 0.0);
    }
}
