//! Factory functions for creating test data.
//!
//! Hand-built analytic shapes for the topologies a well-behaved modeler never
//! produces (non-manifold, UV-less, degenerate), plus protocol request
//! factories used by the harness and the integration tests.

use glam::DVec3;
use shared::{Operation, WorkerRequest};

use crate::kernel::analytic::geometry::{Plane, SurfaceGeom};
use crate::kernel::analytic::{AnalyticKernel, Domain, Shape, ShapeBuilder, Side};
use crate::kernel::Orientation;

// ── Shape factories ─────────────────────────────────────────────

fn plane(origin: DVec3, x: DVec3, y: DVec3) -> SurfaceGeom {
    SurfaceGeom::Plane(Plane::new(origin, x, y))
}

/// Unit square in the XY plane, bounded by its four edges.
fn square_with(kernel: &AnalyticKernel, orientation: Orientation, uv_nodes: bool) -> Shape {
    let mut b = ShapeBuilder::new(kernel);
    let face = b.face(plane(DVec3::ZERO, DVec3::X, DVec3::Y), Domain::rect((0.0, 1.0), (0.0, 1.0)), orientation);
    let bottom = b.line(DVec3::ZERO, DVec3::X);
    let top = b.line(DVec3::Y, DVec3::new(1.0, 1.0, 0.0));
    let left = b.line(DVec3::ZERO, DVec3::Y);
    let right = b.line(DVec3::X, DVec3::new(1.0, 1.0, 0.0));
    b.bound(face, &bottom, Side::VMin)
        .bound(face, &top, Side::VMax)
        .bound(face, &left, Side::UMin)
        .bound(face, &right, Side::UMax);
    if !uv_nodes {
        b.without_uv_nodes(face);
    }
    b.build()
}

/// Forward unit square facing +Z.
pub fn square(kernel: &AnalyticKernel) -> Shape {
    square_with(kernel, Orientation::Forward, true)
}

/// Unit square in the XY plane whose visible side faces -Z.
pub fn reversed_square(kernel: &AnalyticKernel) -> Shape {
    square_with(kernel, Orientation::Reversed, true)
}

/// Unit square whose triangulation carries no UV nodes.
pub fn uvless_square(kernel: &AnalyticKernel) -> Shape {
    square_with(kernel, Orientation::Forward, false)
}

/// Three unit squares hinged on one edge along +X (a non-manifold fin).
pub fn fin(kernel: &AnalyticKernel) -> Shape {
    let mut b = ShapeBuilder::new(kernel);
    let hinge = b.line(DVec3::ZERO, DVec3::X);
    for y_dir in [DVec3::Y, DVec3::Z, DVec3::NEG_Y] {
        let face = b.face(plane(DVec3::ZERO, DVec3::X, y_dir), Domain::rect((0.0, 1.0), (0.0, 1.0)), Orientation::Forward);
        b.bound(face, &hinge, Side::VMin);
    }
    b.build()
}

/// Two squares sharing an edge, the second reversed against the first.
pub fn folded_pair(kernel: &AnalyticKernel) -> Shape {
    let mut b = ShapeBuilder::new(kernel);
    let hinge = b.line(DVec3::ZERO, DVec3::X);
    let floor = b.face(plane(DVec3::ZERO, DVec3::X, DVec3::Y), Domain::rect((0.0, 1.0), (0.0, 1.0)), Orientation::Forward);
    let wall = b.face(plane(DVec3::ZERO, DVec3::X, DVec3::Z), Domain::rect((0.0, 1.0), (0.0, 1.0)), Orientation::Reversed);
    b.bound(floor, &hinge, Side::VMin)
        .bound_oriented(wall, &hinge, Side::VMin, Orientation::Reversed);
    b.build()
}

/// A valid square followed by a face with an empty domain, which the kernel
/// never triangulates.
pub fn with_degenerate_face(kernel: &AnalyticKernel) -> Shape {
    let mut b = ShapeBuilder::new(kernel);
    b.face(plane(DVec3::ZERO, DVec3::X, DVec3::Y), Domain::rect((0.0, 1.0), (0.0, 1.0)), Orientation::Forward);
    b.face(plane(DVec3::Z, DVec3::X, DVec3::Y), Domain::rect((0.0, 1.0), (0.5, 0.5)), Orientation::Forward);
    b.build()
}

/// Closed triangle of wire edges with no faces.
pub fn wire_triangle(kernel: &AnalyticKernel) -> Shape {
    let mut b = ShapeBuilder::new(kernel);
    let a = b.line(DVec3::ZERO, DVec3::X);
    let c = b.line(DVec3::X, DVec3::Y);
    let d = b.line(DVec3::Y, DVec3::ZERO);
    b.wire(&a).wire(&c).wire(&d);
    b.build()
}

// ── Request factories ───────────────────────────────────────────

/// Box request spanning `origin .. origin + size`.
pub fn box_request(name: &str, origin: [f64; 3], size: [f64; 3]) -> WorkerRequest {
    WorkerRequest::execute(name, Operation::MakeBox { origin, size })
}

/// Unit cube spanning `[0,1]³`.
pub fn unit_cube_request(name: &str) -> WorkerRequest {
    box_request(name, [0.0; 3], [1.0; 3])
}

pub fn cylinder_request(name: &str, radius: f64, height: f64) -> WorkerRequest {
    WorkerRequest::execute(
        name,
        Operation::MakeCylinder {
            center: [0.0; 3],
            radius,
            height,
        },
    )
}

pub fn sphere_request(name: &str, radius: f64) -> WorkerRequest {
    WorkerRequest::execute(
        name,
        Operation::MakeSphere {
            center: [0.0; 3],
            radius,
        },
    )
}

pub fn translate_request(name: &str, shape: &str, offset: [f64; 3]) -> WorkerRequest {
    WorkerRequest::execute(
        name,
        Operation::Translate {
            shape: shape.to_string(),
            offset,
        },
    )
}

pub fn remove_request(shape: &str) -> WorkerRequest {
    WorkerRequest::execute(
        shape,
        Operation::Remove {
            shape: shape.to_string(),
        },
    )
}

/// Surface lookup at the middle of a face's own parameter bounds.
pub fn query_request(name: &str, shape: &str, face_index: usize) -> WorkerRequest {
    WorkerRequest::execute(
        name,
        Operation::QuerySurface {
            shape: shape.to_string(),
            face_index,
            u: 0.5,
            v: 0.5,
            uv_bounds: None,
        },
    )
}
