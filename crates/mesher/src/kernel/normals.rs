//! Per-node normals for face triangulations.

use glam::DVec3;

use super::{Orientation, Surface, Triangulation};

/// Area-weighted vertex normals from the stored triangle winding, flipped for
/// reversed faces.
pub fn triangulated_normals(triangulation: &Triangulation, orientation: Orientation) -> Vec<DVec3> {
    let nodes = &triangulation.nodes;
    let mut acc = vec![DVec3::ZERO; nodes.len()];

    for tri in &triangulation.triangles {
        if tri.iter().any(|&i| i >= nodes.len()) {
            continue;
        }
        let [a, b, c] = *tri;
        // Unnormalized cross product weights by area
        let n = (nodes[b] - nodes[a]).cross(nodes[c] - nodes[a]);
        for i in [a, b, c] {
            acc[i] += n;
        }
    }

    let sign = if orientation == Orientation::Reversed { -1.0 } else { 1.0 };
    acc.into_iter().map(|n| n.normalize_or_zero() * sign).collect()
}

/// Exact surface normals evaluated at the triangulation's UV nodes.
///
/// Nodes where the surface is singular (poles) keep the triangulated normal.
/// Without UV nodes this is [`triangulated_normals`].
pub fn surface_normals(
    surface: &dyn Surface,
    triangulation: &Triangulation,
    orientation: Orientation,
) -> Vec<DVec3> {
    let mut normals = triangulated_normals(triangulation, orientation);
    let Some(uv_nodes) = &triangulation.uv_nodes else {
        return normals;
    };

    let sign = if orientation == Orientation::Reversed { -1.0 } else { 1.0 };
    for (normal, uv) in normals.iter_mut().zip(uv_nodes) {
        if let Some(n) = surface.normal(uv.x, uv.y) {
            *normal = n * sign;
        }
    }
    normals
}
