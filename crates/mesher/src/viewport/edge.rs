//! Edge overlay geometry and picking
//!
//! Edge records become line-segment pairs in one buffer. Every vertex maps back
//! to its edge index, and each record keeps its vertex range so picking and
//! fillet selection can address whole edges.

use std::collections::{BTreeSet, HashMap};

use glam::{Mat4, Vec3, Vec4};
use shared::EdgeRecord;

/// Vertex range of one edge record in the overlay buffer (inclusive `end`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeRange {
    pub start: usize,
    pub end: usize,
    pub edge_index: u32,
}

/// Line-segment overlay: 3 floats per vertex, two vertices per segment
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EdgeGeometry {
    pub positions: Vec<f32>,
    pub colors: Vec<f32>,
    /// Edge index of every vertex
    pub vertex_edge_indices: Vec<u32>,
    pub ranges: Vec<EdgeRange>,
}

/// Result of edge picking
#[derive(Debug, Clone)]
pub struct EdgeHit {
    pub edge_index: u32,
    /// Vertex nearest the cursor on the picked segment
    pub vertex: usize,
    /// Screen-space distance in pixels
    pub distance: f32,
}

impl EdgeGeometry {
    pub fn from_records(edges: &[EdgeRecord]) -> Self {
        let mut geometry = Self::default();
        for record in edges {
            let points: Vec<Vec3> = record
                .vertex_coord
                .chunks_exact(3)
                .map(|p| Vec3::new(p[0] as f32, p[1] as f32, p[2] as f32))
                .collect();
            if points.len() < 2 {
                continue;
            }

            let start = geometry.vertex_count();
            for pair in points.windows(2) {
                for p in pair {
                    geometry.positions.extend_from_slice(&[p.x, p.y, p.z]);
                    geometry.vertex_edge_indices.push(record.edge_index);
                }
            }
            geometry.ranges.push(EdgeRange {
                start,
                end: geometry.vertex_count() - 1,
                edge_index: record.edge_index,
            });
        }
        geometry.colors = vec![0.0; geometry.positions.len()];
        geometry
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    pub fn segment_count(&self) -> usize {
        self.vertex_count() / 2
    }

    fn position(&self, vertex: usize) -> Vec3 {
        let b = vertex * 3;
        Vec3::new(self.positions[b], self.positions[b + 1], self.positions[b + 2])
    }

    pub fn edge_at_vertex(&self, vertex: usize) -> Option<u32> {
        self.vertex_edge_indices.get(vertex).copied()
    }

    /// All fragments tracing one edge
    pub fn ranges_for_edge(&self, edge_index: u32) -> impl Iterator<Item = &EdgeRange> + '_ {
        self.ranges.iter().filter(move |r| r.edge_index == edge_index)
    }

    pub fn unique_edge_count(&self) -> usize {
        self.ranges.iter().map(|r| r.edge_index).collect::<BTreeSet<_>>().len()
    }

    pub fn highlight_edge(&mut self, edge_index: u32, color: [f32; 3]) -> bool {
        let ranges: Vec<EdgeRange> = self.ranges_for_edge(edge_index).copied().collect();
        for r in &ranges {
            for v in r.start..=r.end {
                let c = v * 3;
                if c + 2 < self.colors.len() {
                    self.colors[c..c + 3].copy_from_slice(&color);
                }
            }
        }
        !ranges.is_empty()
    }

    pub fn clear_colors(&mut self) {
        self.colors.iter_mut().for_each(|c| *c = 0.0);
    }

    /// Pick the edge segment nearest the cursor in screen space
    pub fn pick_edge_2d(
        &self,
        cursor_screen: [f32; 2],
        view_proj: &Mat4,
        screen_size: [f32; 2],
        pixel_tolerance: f32,
    ) -> Option<EdgeHit> {
        let mut best: Option<EdgeHit> = None;

        for seg in 0..self.segment_count() {
            let (i0, i1) = (seg * 2, seg * 2 + 1);
            let Some(p0) = project_point(self.position(i0), view_proj, screen_size) else { continue };
            let Some(p1) = project_point(self.position(i1), view_proj, screen_size) else { continue };

            let (dist, t) = point_to_segment_2d(cursor_screen, p0, p1);
            if dist > pixel_tolerance || best.as_ref().is_some_and(|b| b.distance <= dist) {
                continue;
            }
            best = Some(EdgeHit {
                edge_index: self.vertex_edge_indices[i0],
                vertex: if t < 0.5 { i0 } else { i1 },
                distance: dist,
            });
        }

        best
    }

    /// Edges sharing an end point with `edge_index`
    pub fn adjacent_edges(&self, edge_index: u32) -> Vec<u32> {
        let mut endpoints: HashMap<QuantizedPos, BTreeSet<u32>> = HashMap::new();
        for r in &self.ranges {
            for v in [r.start, r.end] {
                endpoints
                    .entry(quantize_position(self.position(v)))
                    .or_default()
                    .insert(r.edge_index);
            }
        }

        let mut adjacent = BTreeSet::new();
        for r in self.ranges_for_edge(edge_index) {
            for v in [r.start, r.end] {
                if let Some(edges) = endpoints.get(&quantize_position(self.position(v))) {
                    adjacent.extend(edges.iter().copied().filter(|&e| e != edge_index));
                }
            }
        }
        adjacent.into_iter().collect()
    }
}

type QuantizedPos = (i64, i64, i64);

fn quantize_position(pos: Vec3) -> QuantizedPos {
    let scale = 10000.0;
    (
        (pos.x * scale).round() as i64,
        (pos.y * scale).round() as i64,
        (pos.z * scale).round() as i64,
    )
}

/// Distance from a 2D point to a segment, plus the clamped segment parameter
fn point_to_segment_2d(point: [f32; 2], p0: [f32; 2], p1: [f32; 2]) -> (f32, f32) {
    let dx = p1[0] - p0[0];
    let dy = p1[1] - p0[1];
    let len_sq = dx * dx + dy * dy;

    if len_sq < 1e-8 {
        let ddx = point[0] - p0[0];
        let ddy = point[1] - p0[1];
        return ((ddx * ddx + ddy * ddy).sqrt(), 0.0);
    }

    let t = ((point[0] - p0[0]) * dx + (point[1] - p0[1]) * dy) / len_sq;
    let t = t.clamp(0.0, 1.0);

    let ddx = point[0] - (p0[0] + t * dx);
    let ddy = point[1] - (p0[1] + t * dy);
    ((ddx * ddx + ddy * ddy).sqrt(), t)
}

/// Project a 3D point to 2D screen coordinates
fn project_point(point: Vec3, view_proj: &Mat4, screen_size: [f32; 2]) -> Option<[f32; 2]> {
    let p = *view_proj * Vec4::new(point.x, point.y, point.z, 1.0);
    if p.w <= 0.0 {
        return None;
    }

    let ndc = p.truncate() / p.w;
    Some([
        (ndc.x + 1.0) * 0.5 * screen_size[0],
        (1.0 - ndc.y) * 0.5 * screen_size[1],
    ])
}
