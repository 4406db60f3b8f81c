//! Concatenates face records into renderable buffers.

use glam::DVec3;
use shared::{EdgeRecord, FaceRecord};

use crate::viewport::edge::EdgeGeometry;
use crate::viewport::mesh::{FaceMetadata, GeometryBuffers};

/// Builds one vertex/index buffer from all faces, in face order.
///
/// Indices are offset by the vertices of every earlier face; vertices are
/// never shared between faces. Returns None when there is nothing to draw or
/// when an offset index does not fit in `u32`.
pub fn assemble(faces: &[FaceRecord]) -> Option<GeometryBuffers> {
    if faces.is_empty() {
        return None;
    }

    let vertex_total: usize = faces.iter().map(FaceRecord::node_count).sum();
    let index_total: usize = faces.iter().map(|f| f.tri_indexes.len()).sum();

    let mut out = GeometryBuffers {
        positions: Vec::with_capacity(vertex_total * 3),
        normals: Vec::with_capacity(vertex_total * 3),
        uvs: Vec::with_capacity(vertex_total * 2),
        colors: vec![0.0; vertex_total * 3],
        indices: Vec::with_capacity(index_total),
        faces: Vec::with_capacity(faces.len()),
    };

    let mut offset = 0u32;
    for face in faces {
        let nodes = face.node_count();
        let start = out.triangle_count();

        out.positions.extend(face.vertex_coord.iter().map(|&c| c as f32));
        out.normals.extend(face.normal_coord.iter().map(|&c| c as f32));
        if face.has_uvs() {
            out.uvs.extend(face.uv_coord.iter().map(|&c| c as f32));
        } else {
            out.uvs.resize(out.uvs.len() + nodes * 2, 0.0);
        }
        for &i in &face.tri_indexes {
            let Some(index) = i.checked_add(offset) else {
                tracing::warn!("face {}: index {} + offset {} overflows u32", face.face_index, i, offset);
                return None;
            };
            out.indices.push(index);
        }

        let normal_sum = face
            .normal_coord
            .chunks_exact(3)
            .fold(DVec3::ZERO, |acc, n| acc + DVec3::new(n[0], n[1], n[2]));
        out.faces.push(FaceMetadata {
            start,
            end: out.triangle_count(),
            index: face.face_index,
            is_planar: face.is_planar,
            average: face.average,
            normal: normal_sum.normalize_or_zero().to_array(),
            uv_bounds: face.uv_bounds,
        });

        offset = match u32::try_from(nodes).ok().and_then(|n| offset.checked_add(n)) {
            Some(next) => next,
            None => {
                tracing::warn!("vertex count exceeds u32 after face {}", face.face_index);
                return None;
            }
        };
    }

    Some(out)
}

/// Edge overlay buffers for the edge records of one mesh
pub fn assemble_edges(edges: &[EdgeRecord]) -> EdgeGeometry {
    EdgeGeometry::from_records(edges)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle_face(face_index: usize, z: f64, with_uvs: bool) -> FaceRecord {
        FaceRecord {
            vertex_coord: vec![0.0, 0.0, z, 1.0, 0.0, z, 0.0, 1.0, z],
            uv_coord: if with_uvs { vec![0.0, 0.0, 1.0, 0.0, 0.0, 1.0] } else { Vec::new() },
            normal_coord: vec![0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0],
            tri_indexes: vec![0, 1, 2],
            number_of_triangles: 1,
            face_index,
            is_planar: true,
            average: [1.0 / 3.0, 1.0 / 3.0, z],
            uv_bounds: None,
        }
    }

    #[test]
    fn test_empty_input_is_none() {
        assert!(assemble(&[]).is_none());
    }

    #[test]
    fn test_indices_offset_by_running_vertex_total() {
        let faces = vec![triangle_face(0, 0.0, true), triangle_face(1, 1.0, true), triangle_face(2, 2.0, true)];
        let g = assemble(&faces).unwrap();

        assert_eq!(g.vertex_count(), 9);
        assert_eq!(g.indices, vec![0, 1, 2, 3, 4, 5, 6, 7, 8]);
        for (i, meta) in g.faces.iter().enumerate() {
            assert_eq!(meta.triangles(), i..i + 1);
            for tri in meta.triangles() {
                for v in g.triangle(tri) {
                    assert!((i * 3..(i + 1) * 3).contains(&v));
                }
            }
        }
        assert_eq!(g.position(4).z, 1.0);
    }

    #[test]
    fn test_colors_black_and_uvs_padded() {
        let faces = vec![triangle_face(0, 0.0, false), triangle_face(1, 1.0, true)];
        let g = assemble(&faces).unwrap();

        assert_eq!(g.colors.len(), g.positions.len());
        assert!(g.colors.iter().all(|&c| c == 0.0));
        assert_eq!(g.uvs.len(), g.vertex_count() * 2);
        assert!(g.uvs[..6].iter().all(|&c| c == 0.0));
        assert_eq!(&g.uvs[6..8], &[0.0, 0.0]);
        assert_eq!(&g.uvs[8..10], &[1.0, 0.0]);
    }

    #[test]
    fn test_index_overflow_is_none() {
        let mut late = triangle_face(1, 1.0, true);
        late.tri_indexes = vec![0, 1, u32::MAX];
        assert!(assemble(&[triangle_face(0, 0.0, true), late.clone()]).is_none());

        // Same indices on the first face carry no offset
        assert!(assemble(&[late]).is_some());
    }

    #[test]
    fn test_face_metadata() {
        let g = assemble(&[triangle_face(7, 0.0, true)]).unwrap();
        let meta = &g.faces[0];
        assert_eq!(meta.index, 7);
        assert!(meta.is_planar);
        assert_eq!(meta.normal, [0.0, 0.0, 1.0]);
        assert_eq!(g.face_for_triangle(0).map(|f| f.index), Some(7));
    }
}
