//! Mesh extraction from kernel shapes.
//!
//! Drives the kernel's incremental mesher and converts per-face triangulations
//! into [`FaceRecord`]s and unique edges into [`EdgeRecord`]s.

use std::collections::{HashMap, HashSet};

use glam::DVec3;
use shared::{EdgeRecord, FaceRecord, ShapeMesh};

use super::atlas::UvBox;
use crate::error::{MeshError, Result};
use crate::kernel::deflection::arc_length;
use crate::kernel::{Kernel, Triangulation, UvBounds};
use crate::settings::MesherSettings;

/// Key deduplicating topological edges
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeKey {
    /// Kernel's own stable identity
    Native(u64),
    /// Structural hash truncated to the configured modulus
    Hashed(u64),
}

/// Counters from the most recent extraction
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractionStats {
    pub faces: usize,
    pub triangles: usize,
    /// Distinct edges found by the shape-level pre-pass
    pub unique_edges: usize,
    pub edge_records: usize,
    pub free_edges: usize,
    /// Distinct native edges that share a hash key
    pub hash_collisions: usize,
    /// Shared edges traced from their curve because the kernel had no polygon
    pub polygon_fallbacks: usize,
}

/// Result of [`MeshExtractor::extract`]. `uv_boxes` hold raw arclength sizes.
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub mesh: ShapeMesh,
    pub uv_boxes: Vec<UvBox>,
    pub stats: ExtractionStats,
}

/// Nullifies every listed face triangulation when dropped, so the kernel
/// cache is released on success, error and unwind alike.
pub struct TriangulationGuard<'k, K: Kernel> {
    kernel: &'k K,
    faces: Vec<K::Face>,
}

impl<'k, K: Kernel> TriangulationGuard<'k, K> {
    pub fn new(kernel: &'k K, faces: Vec<K::Face>) -> Self {
        Self { kernel, faces }
    }

    pub fn faces(&self) -> &[K::Face] {
        &self.faces
    }
}

impl<K: Kernel> Drop for TriangulationGuard<'_, K> {
    fn drop(&mut self) {
        for face in &self.faces {
            self.kernel.nullify_triangulation(face);
        }
    }
}

/// Extraction pass state, reused between calls and reset at the top of each.
#[derive(Debug, Default)]
pub struct MeshExtractor {
    /// Edge key → stable edge index from the pre-pass
    edge_indices: HashMap<EdgeKey, u32>,
    /// Edges already met while walking faces (and free edges once emitted)
    visited_edges: HashSet<EdgeKey>,
    /// Hash key → native identity, for collision accounting
    hash_owners: HashMap<u64, u64>,
    /// Native identities already checked for collisions
    seen_identities: HashSet<u64>,
    stats: ExtractionStats,
}

impl MeshExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_stats(&self) -> &ExtractionStats {
        &self.stats
    }

    fn reset(&mut self) {
        self.edge_indices.clear();
        self.visited_edges.clear();
        self.hash_owners.clear();
        self.seen_identities.clear();
        self.stats = ExtractionStats::default();
    }

    fn edge_key<K: Kernel>(&self, kernel: &K, edge: &K::Edge, settings: &MesherSettings) -> EdgeKey {
        if settings.edges.prefer_native_identity {
            if let Some(id) = kernel.edge_identity(edge) {
                return EdgeKey::Native(id);
            }
        }
        EdgeKey::Hashed(kernel.edge_hash(edge, settings.edges.hash_modulus))
    }

    /// Stable index for `key`, assigning the next one if unseen
    fn edge_index(&mut self, key: EdgeKey) -> u32 {
        let next = self.edge_indices.len() as u32;
        *self.edge_indices.entry(key).or_insert(next)
    }

    /// Shape-level edge traversal assigning one index per unique edge.
    ///
    /// Collisions are counted once per native edge whose hash key is already
    /// owned by another native edge, in both identity modes. In hash-only mode
    /// such edges merge into one index.
    fn index_edges<K: Kernel>(&mut self, kernel: &K, shape: &K::Shape, settings: &MesherSettings) -> Vec<K::Edge> {
        let mut unique = Vec::new();
        for edge in kernel.edges(shape) {
            if let Some(id) = kernel.edge_identity(&edge) {
                if self.seen_identities.insert(id) {
                    self.note_collision(kernel, &edge, id, settings);
                }
            }

            let key = self.edge_key(kernel, &edge, settings);
            if self.edge_indices.contains_key(&key) {
                continue;
            }
            self.edge_index(key);
            unique.push(edge);
        }
        self.stats.unique_edges = self.edge_indices.len();
        unique
    }

    fn note_collision<K: Kernel>(&mut self, kernel: &K, edge: &K::Edge, id: u64, settings: &MesherSettings) {
        let hash = kernel.edge_hash(edge, settings.edges.hash_modulus);
        let owner = *self.hash_owners.entry(hash).or_insert(id);
        if owner != id {
            self.stats.hash_collisions += 1;
            tracing::warn!(
                "edge hash collision: edges {} and {} share key {} (modulus {})",
                owner,
                id,
                hash,
                settings.edges.hash_modulus
            );
        }
    }

    /// Unique edges of `shape` in edge-index order
    pub fn unique_edges<K: Kernel>(&mut self, kernel: &K, shape: &K::Shape, settings: &MesherSettings) -> Vec<K::Edge> {
        self.reset();
        self.index_edges(kernel, shape, settings)
    }

    /// Triangulates `shape` and converts every face and unique edge.
    ///
    /// Fails without a partial result if any face lacks a triangulation. Face
    /// triangulations are released before returning on every path.
    pub fn extract<K: Kernel>(
        &mut self,
        kernel: &K,
        shape: &K::Shape,
        max_deviation: f64,
        settings: &MesherSettings,
    ) -> Result<Extraction> {
        self.reset();
        if kernel.is_null(shape) {
            tracing::error!("extract: shape is null");
            return Err(MeshError::NullShape);
        }

        self.index_edges(kernel, shape, settings);

        let guard = TriangulationGuard::new(kernel, kernel.faces(shape));
        let angular = max_deviation * settings.meshing.angular_deflection_factor;
        kernel.incremental_mesh(shape, max_deviation, angular)?;

        let mut faces = Vec::with_capacity(guard.faces().len());
        let mut edges = Vec::new();
        let mut uv_boxes = Vec::new();

        for (face_index, face) in guard.faces().iter().enumerate() {
            let triangulation = kernel
                .triangulation(face)
                .filter(|t| !t.is_empty())
                .ok_or_else(|| {
                    tracing::error!("extract: face {} has no triangulation", face_index);
                    MeshError::MissingTriangulation { face_index }
                })?;

            let (record, uv_box) = self.face_record(kernel, face, face_index, &triangulation, settings)?;
            if let Some((width, height)) = uv_box {
                uv_boxes.push(UvBox::new(faces.len(), width, height));
            }

            self.shared_edges(kernel, face, &record, max_deviation, settings, &mut edges)?;
            faces.push(record);
        }

        drop(guard);

        self.free_edges(kernel, shape, max_deviation, settings, &mut edges);

        self.stats.faces = faces.len();
        self.stats.triangles = faces.iter().map(|f| f.number_of_triangles).sum();
        self.stats.edge_records = edges.len();

        tracing::info!(
            "extract: {} faces, {} triangles, {} edge records ({} unique, {} free)",
            self.stats.faces,
            self.stats.triangles,
            self.stats.edge_records,
            self.stats.unique_edges,
            self.stats.free_edges
        );

        Ok(Extraction {
            mesh: ShapeMesh { faces, edges },
            uv_boxes,
            stats: self.stats.clone(),
        })
    }

    /// Builds one face record; also returns the face's iso-curve arclengths
    /// when it has UV nodes.
    fn face_record<K: Kernel>(
        &self,
        kernel: &K,
        face: &K::Face,
        face_index: usize,
        triangulation: &Triangulation,
        settings: &MesherSettings,
    ) -> Result<(FaceRecord, Option<(f64, f64)>)> {
        let invalid = |reason: String| MeshError::InvalidTriangulation { face_index, reason };
        let node_count = triangulation.node_count();
        let location = triangulation.location;

        // Positions and centroid
        let mut vertex_coord = Vec::with_capacity(node_count * 3);
        let mut sum = DVec3::ZERO;
        for node in &triangulation.nodes {
            let p = location.transform_point3(*node);
            vertex_coord.extend_from_slice(&[p.x, p.y, p.z]);
            sum += p;
        }
        let average = sum / node_count as f64;

        let reversed = !kernel.face_orientation(face).is_forward();
        let surface = kernel.surface(face);
        let is_planar = surface.as_ref().is_some_and(|s| s.is_planar());

        // UVs normalized to the face's own parametric bounds
        let mut uv_coord = Vec::new();
        let mut uv_bounds = None;
        let mut arclengths = None;
        if let Some(uv_nodes) = &triangulation.uv_nodes {
            if uv_nodes.len() != node_count {
                return Err(invalid(format!("{} uv nodes for {} nodes", uv_nodes.len(), node_count)));
            }
            if let Some(bounds) = UvBounds::from_points(uv_nodes) {
                arclengths = Some(iso_arclengths(surface.as_deref(), &bounds, settings.meshing.iso_segments));
                uv_coord.reserve(node_count * 2);
                for uv in uv_nodes {
                    let n = bounds.normalize(*uv);
                    let x = if reversed { 1.0 - n.x } else { n.x };
                    uv_coord.extend_from_slice(&[x, n.y]);
                }
                uv_bounds = Some(bounds.to_array());
            }
        }

        let normals = kernel.triangulation_normals(face, triangulation);
        if normals.len() != node_count {
            return Err(invalid(format!("{} normals for {} nodes", normals.len(), node_count)));
        }
        let mut normal_coord = Vec::with_capacity(node_count * 3);
        for n in normals {
            let n = location.transform_vector3(n).normalize_or_zero();
            normal_coord.extend_from_slice(&[n.x, n.y, n.z]);
        }

        // Winding follows the visible side
        let mut tri_indexes = Vec::with_capacity(triangulation.triangle_count() * 3);
        for &[a, b, c] in &triangulation.triangles {
            if a >= node_count || b >= node_count || c >= node_count {
                return Err(invalid(format!("triangle [{a}, {b}, {c}] outside {node_count} nodes")));
            }
            let (a, b) = if reversed { (b, a) } else { (a, b) };
            for i in [a, b, c] {
                tri_indexes.push(u32::try_from(i).map_err(|_| invalid(format!("node index {i} exceeds u32")))?);
            }
        }

        let record = FaceRecord {
            vertex_coord,
            uv_coord,
            normal_coord,
            number_of_triangles: tri_indexes.len() / 3,
            tri_indexes,
            face_index,
            is_planar,
            average: average.to_array(),
            uv_bounds,
        };
        tracing::debug!(
            "face {}: {} nodes, {} triangles, planar={}, reversed={}",
            face_index,
            node_count,
            record.number_of_triangles,
            is_planar,
            reversed
        );
        Ok((record, arclengths))
    }

    /// Emits an edge record for every edge of `face` that an earlier face
    /// already bounded, traced along this face's triangulation.
    fn shared_edges<K: Kernel>(
        &mut self,
        kernel: &K,
        face: &K::Face,
        record: &FaceRecord,
        max_deviation: f64,
        settings: &MesherSettings,
        out: &mut Vec<EdgeRecord>,
    ) -> Result<()> {
        let mut on_this_face = HashSet::new();
        for edge in kernel.face_edges(face) {
            let key = self.edge_key(kernel, &edge, settings);
            // Seams appear twice on one face
            if !on_this_face.insert(key) {
                continue;
            }
            if !self.visited_edges.contains(&key) {
                self.visited_edges.insert(key);
                continue;
            }

            let vertex_coord = match kernel.polygon_on_triangulation(&edge, face) {
                Some(nodes) => {
                    let mut coords = Vec::with_capacity(nodes.len() * 3);
                    for i in nodes {
                        let p = record.vertex_coord.get(i * 3..i * 3 + 3).ok_or_else(|| {
                            tracing::error!("face {}: edge polygon node {} out of range", record.face_index, i);
                            MeshError::InvalidTriangulation {
                                face_index: record.face_index,
                                reason: format!("edge polygon node {i} outside {} nodes", record.node_count()),
                            }
                        })?;
                        coords.extend_from_slice(p);
                    }
                    coords
                }
                None => {
                    self.stats.polygon_fallbacks += 1;
                    tracing::warn!(
                        "face {}: edge has no polygon on triangulation, sampling its curve",
                        record.face_index
                    );
                    curve_polyline(kernel, &edge, max_deviation, settings)
                }
            };

            let edge_index = self.edge_index(key);
            out.push(EdgeRecord {
                vertex_coord,
                edge_index,
            });
        }
        Ok(())
    }

    /// Tessellates edges no face has bounded (wire-only curves)
    fn free_edges<K: Kernel>(
        &mut self,
        kernel: &K,
        shape: &K::Shape,
        max_deviation: f64,
        settings: &MesherSettings,
        out: &mut Vec<EdgeRecord>,
    ) {
        for edge in kernel.edges(shape) {
            let key = self.edge_key(kernel, &edge, settings);
            if !self.visited_edges.insert(key) {
                continue;
            }
            let vertex_coord = curve_polyline(kernel, &edge, max_deviation, settings);
            if vertex_coord.is_empty() {
                tracing::warn!("free edge without a curve skipped");
                continue;
            }
            let edge_index = self.edge_index(key);
            out.push(EdgeRecord {
                vertex_coord,
                edge_index,
            });
            self.stats.free_edges += 1;
        }
    }
}

/// World-space arclengths `(width, height)` of the iso-curves through the
/// middle of `bounds`. Without a surface the parametric spans are used.
fn iso_arclengths(surface: Option<&dyn crate::kernel::Surface>, bounds: &UvBounds, segments: usize) -> (f64, f64) {
    let Some(surface) = surface else {
        return (bounds.u_span(), bounds.v_span());
    };
    let mid = bounds.mid();
    let along_u = surface.v_iso(mid.y);
    let along_v = surface.u_iso(mid.x);
    (
        arc_length(|t| along_u.value(t), bounds.u_min, bounds.u_max, segments),
        arc_length(|t| along_v.value(t), bounds.v_min, bounds.v_max, segments),
    )
}

fn curve_polyline<K: Kernel>(kernel: &K, edge: &K::Edge, max_deviation: f64, settings: &MesherSettings) -> Vec<f64> {
    let Some(curve) = kernel.edge_curve(edge) else {
        return Vec::new();
    };
    curve
        .tangential_deflection(settings.meshing.free_edge_angular_deflection, max_deviation)
        .iter()
        .flat_map(|p| p.to_array())
        .collect()
}
