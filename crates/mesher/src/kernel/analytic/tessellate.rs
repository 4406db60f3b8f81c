//! Face tessellation for the analytic kernel.

use std::f64::consts::{FRAC_PI_2, TAU};

use glam::{DVec2, DVec3};

use super::geometry::SurfaceGeom;
use super::topology::{Domain, FaceData, Side};
use crate::kernel::Surface;

/// Upper bound on segments along one parametric direction
const MAX_SEGMENTS: usize = 128;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Layout {
    /// `(nu + 1) × (nv + 1)` nodes, index `j * (nu + 1) + i`
    Grid { nu: usize, nv: usize },
    /// Center node followed by `segments` rim nodes
    Fan { segments: usize },
}

/// Cached face tessellation in the face's local frame
#[derive(Debug, Clone)]
pub(crate) struct Tessellation {
    pub nodes: Vec<DVec3>,
    pub uv_nodes: Vec<DVec2>,
    pub triangles: Vec<[usize; 3]>,
    pub layout: Layout,
    pub deflection: (f64, f64),
}

impl Tessellation {
    /// Node indices tracing one side of the domain boundary
    pub fn polygon(&self, side: Side) -> Option<Vec<usize>> {
        match (self.layout, side) {
            (Layout::Grid { nu, .. }, Side::VMin) => Some((0..=nu).collect()),
            (Layout::Grid { nu, nv }, Side::VMax) => Some((0..=nu).map(|i| nv * (nu + 1) + i).collect()),
            (Layout::Grid { nu, nv }, Side::UMin) => Some((0..=nv).map(|j| j * (nu + 1)).collect()),
            (Layout::Grid { nu, nv }, Side::UMax) => Some((0..=nv).map(|j| j * (nu + 1) + nu).collect()),
            (Layout::Fan { segments }, Side::Rim) => Some((1..=segments).chain(std::iter::once(1)).collect()),
            _ => None,
        }
    }
}

/// Segments needed along a direction of parametric `span`, bending with
/// `radius` (`None` when straight)
fn segments(span: f64, radius: Option<f64>, linear: f64, angular: f64) -> usize {
    let Some(r) = radius else {
        return 1;
    };
    let by_angle = span / angular;
    // Chord sagitta r·(1 - cos(θ/2)) ≤ linear
    let by_sagitta = if linear < r {
        span / (2.0 * (1.0 - linear / r).acos())
    } else {
        1.0
    };
    let min = ((span / FRAC_PI_2).ceil() as usize).max(1);
    (by_angle.max(by_sagitta).ceil() as usize).clamp(min, MAX_SEGMENTS)
}

/// Tessellates one face. Returns `None` for degenerate domains.
pub(crate) fn tessellate(face: &FaceData, linear: f64, angular: f64) -> Option<Tessellation> {
    if face.domain.is_degenerate() {
        return None;
    }
    match face.domain {
        Domain::Rect { u, v } => Some(grid(&face.surface, u, v, linear, angular)),
        Domain::Disk { radius } => Some(fan(&face.surface, radius, linear, angular)),
    }
}

fn grid(surface: &SurfaceGeom, u: (f64, f64), v: (f64, f64), linear: f64, angular: f64) -> Tessellation {
    let (ru, rv) = surface.curvature_radii();
    let nu = segments(u.1 - u.0, ru, linear, angular);
    let nv = segments(v.1 - v.0, rv, linear, angular);
    let stride = nu + 1;

    let mut nodes = Vec::with_capacity(stride * (nv + 1));
    let mut uv_nodes = Vec::with_capacity(stride * (nv + 1));
    for j in 0..=nv {
        let pv = v.0 + (v.1 - v.0) * j as f64 / nv as f64;
        for i in 0..=nu {
            let pu = u.0 + (u.1 - u.0) * i as f64 / nu as f64;
            nodes.push(surface.value(pu, pv));
            uv_nodes.push(DVec2::new(pu, pv));
        }
    }

    // Rows collapsed onto a single point (sphere poles)
    let collapsed: Vec<bool> = (0..=nv)
        .map(|j| {
            let row = &nodes[j * stride..(j + 1) * stride];
            row.iter().all(|p| p.distance(row[0]) < 1e-12)
        })
        .collect();

    let mut triangles = Vec::with_capacity(nu * nv * 2);
    for j in 0..nv {
        for i in 0..nu {
            let a = j * stride + i;
            let b = a + 1;
            let c = a + stride + 1;
            let d = a + stride;
            match (collapsed[j], collapsed[j + 1]) {
                (false, false) => {
                    triangles.push([a, b, c]);
                    triangles.push([a, c, d]);
                }
                (true, false) => triangles.push([a, c, d]),
                (false, true) => triangles.push([a, b, c]),
                (true, true) => {}
            }
        }
    }

    Tessellation {
        nodes,
        uv_nodes,
        triangles,
        layout: Layout::Grid { nu, nv },
        deflection: (linear, angular),
    }
}

fn fan(surface: &SurfaceGeom, radius: f64, linear: f64, angular: f64) -> Tessellation {
    let n = segments(TAU, Some(radius), linear, angular);

    let mut uv_nodes = Vec::with_capacity(n + 1);
    uv_nodes.push(DVec2::ZERO);
    for k in 0..n {
        let t = TAU * k as f64 / n as f64;
        uv_nodes.push(DVec2::new(radius * t.cos(), radius * t.sin()));
    }
    let nodes = uv_nodes.iter().map(|uv| surface.value(uv.x, uv.y)).collect();
    let triangles = (0..n).map(|k| [0, k + 1, (k + 1) % n + 1]).collect();

    Tessellation {
        nodes,
        uv_nodes,
        triangles,
        layout: Layout::Fan { segments: n },
        deflection: (linear, angular),
    }
}
