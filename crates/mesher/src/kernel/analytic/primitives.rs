//! Primitive solids and wires built from analytic topology.

use std::f64::consts::{FRAC_PI_2, TAU};

use glam::DVec3;

use super::geometry::{Circle, CurveGeom, Cylinder, Plane, Sphere, SurfaceGeom};
use super::topology::{Domain, Shape, ShapeBuilder, Side};
use super::AnalyticKernel;
use crate::kernel::{KernelError, Orientation};

fn positive(name: &str, value: f64) -> Result<(), KernelError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(KernelError::InvalidArgument(format!("{name} must be positive, got {value}")))
    }
}

fn plane_face(
    b: &mut ShapeBuilder<'_>,
    origin: DVec3,
    x: DVec3,
    y: DVec3,
    extent: (f64, f64),
    orientation: Orientation,
) -> usize {
    b.face(
        SurfaceGeom::Plane(Plane::new(origin, x, y)),
        Domain::rect((0.0, extent.0), (0.0, extent.1)),
        orientation,
    )
}

/// Axis-aligned box: 6 planar faces, 12 edges each shared by two faces.
///
/// Face planes use the box's axes as parameter directions; faces whose plane
/// normal points inward are reversed.
pub(crate) fn make_box(kernel: &AnalyticKernel, origin: DVec3, size: DVec3) -> Result<Shape, KernelError> {
    positive("box width", size.x)?;
    positive("box depth", size.y)?;
    positive("box height", size.z)?;

    let (sx, sy, sz) = (DVec3::X * size.x, DVec3::Y * size.y, DVec3::Z * size.z);
    let mut b = ShapeBuilder::new(kernel);

    // ex[j][k] runs along X at y = j·sy, z = k·sz (likewise ey, ez)
    let mut ex = Vec::new();
    let mut ey = Vec::new();
    let mut ez = Vec::new();
    for j in 0..2 {
        let mut row_x = Vec::new();
        let mut row_y = Vec::new();
        let mut row_z = Vec::new();
        for k in 0..2 {
            let (fj, fk) = (j as f64, k as f64);
            let p = origin + sy * fj + sz * fk;
            row_x.push(b.line(p, p + sx));
            let p = origin + sx * fj + sz * fk;
            row_y.push(b.line(p, p + sy));
            let p = origin + sx * fj + sy * fk;
            row_z.push(b.line(p, p + sz));
        }
        ex.push(row_x);
        ey.push(row_y);
        ez.push(row_z);
    }

    let extent_xy = (size.x, size.y);
    let extent_xz = (size.x, size.z);
    let extent_yz = (size.y, size.z);

    let bottom = plane_face(&mut b, origin, DVec3::X, DVec3::Y, extent_xy, Orientation::Reversed);
    b.bound(bottom, &ex[0][0], Side::VMin)
        .bound(bottom, &ey[1][0], Side::UMax)
        .bound(bottom, &ex[1][0], Side::VMax)
        .bound(bottom, &ey[0][0], Side::UMin);

    let top = plane_face(&mut b, origin + sz, DVec3::X, DVec3::Y, extent_xy, Orientation::Forward);
    b.bound(top, &ex[0][1], Side::VMin)
        .bound(top, &ey[1][1], Side::UMax)
        .bound(top, &ex[1][1], Side::VMax)
        .bound(top, &ey[0][1], Side::UMin);

    let front = plane_face(&mut b, origin, DVec3::X, DVec3::Z, extent_xz, Orientation::Forward);
    b.bound(front, &ex[0][0], Side::VMin)
        .bound(front, &ez[1][0], Side::UMax)
        .bound(front, &ex[0][1], Side::VMax)
        .bound(front, &ez[0][0], Side::UMin);

    let back = plane_face(&mut b, origin + sy, DVec3::X, DVec3::Z, extent_xz, Orientation::Reversed);
    b.bound(back, &ex[1][0], Side::VMin)
        .bound(back, &ez[1][1], Side::UMax)
        .bound(back, &ex[1][1], Side::VMax)
        .bound(back, &ez[0][1], Side::UMin);

    let left = plane_face(&mut b, origin, DVec3::Y, DVec3::Z, extent_yz, Orientation::Reversed);
    b.bound(left, &ey[0][0], Side::VMin)
        .bound(left, &ez[0][1], Side::UMax)
        .bound(left, &ey[0][1], Side::VMax)
        .bound(left, &ez[0][0], Side::UMin);

    let right = plane_face(&mut b, origin + sx, DVec3::Y, DVec3::Z, extent_yz, Orientation::Forward);
    b.bound(right, &ey[1][0], Side::VMin)
        .bound(right, &ez[1][1], Side::UMax)
        .bound(right, &ey[1][1], Side::VMax)
        .bound(right, &ez[1][0], Side::UMin);

    Ok(b.build())
}

/// Z-aligned cylinder: lateral face with a seam, two disk caps.
pub(crate) fn make_cylinder(
    kernel: &AnalyticKernel,
    center: DVec3,
    radius: f64,
    height: f64,
) -> Result<Shape, KernelError> {
    positive("cylinder radius", radius)?;
    positive("cylinder height", height)?;

    let top_center = center + DVec3::Z * height;
    let mut b = ShapeBuilder::new(kernel);

    let seam = b.line(center + DVec3::X * radius, top_center + DVec3::X * radius);
    let bottom_rim = b.edge(
        CurveGeom::Circle(Circle {
            center,
            x_dir: DVec3::X,
            y_dir: DVec3::Y,
            radius,
        }),
        (0.0, TAU),
    );
    let top_rim = b.edge(
        CurveGeom::Circle(Circle {
            center: top_center,
            x_dir: DVec3::X,
            y_dir: DVec3::Y,
            radius,
        }),
        (0.0, TAU),
    );

    let lateral = b.face(
        SurfaceGeom::Cylinder(Cylinder {
            origin: center,
            x_dir: DVec3::X,
            y_dir: DVec3::Y,
            axis: DVec3::Z,
            radius,
        }),
        Domain::rect((0.0, TAU), (0.0, height)),
        Orientation::Forward,
    );
    b.bound(lateral, &bottom_rim, Side::VMin)
        .bound(lateral, &seam, Side::UMax)
        .bound(lateral, &top_rim, Side::VMax)
        .bound_oriented(lateral, &seam, Side::UMin, Orientation::Reversed);

    let top = b.face(
        SurfaceGeom::Plane(Plane::new(top_center, DVec3::X, DVec3::Y)),
        Domain::Disk { radius },
        Orientation::Forward,
    );
    b.bound(top, &top_rim, Side::Rim);

    let bottom = b.face(
        SurfaceGeom::Plane(Plane::new(center, DVec3::X, DVec3::Y)),
        Domain::Disk { radius },
        Orientation::Reversed,
    );
    b.bound(bottom, &bottom_rim, Side::Rim);

    Ok(b.build())
}

/// Sphere: one face, a meridian seam, degenerate poles without edges.
pub(crate) fn make_sphere(kernel: &AnalyticKernel, center: DVec3, radius: f64) -> Result<Shape, KernelError> {
    positive("sphere radius", radius)?;

    let mut b = ShapeBuilder::new(kernel);
    let seam = b.edge(
        CurveGeom::Circle(Circle {
            center,
            x_dir: DVec3::X,
            y_dir: DVec3::Z,
            radius,
        }),
        (-FRAC_PI_2, FRAC_PI_2),
    );
    let face = b.face(
        SurfaceGeom::Sphere(Sphere {
            center,
            x_dir: DVec3::X,
            y_dir: DVec3::Y,
            axis: DVec3::Z,
            radius,
        }),
        Domain::rect((0.0, TAU), (-FRAC_PI_2, FRAC_PI_2)),
        Orientation::Forward,
    );
    b.bound(face, &seam, Side::UMax)
        .bound_oriented(face, &seam, Side::UMin, Orientation::Reversed);

    Ok(b.build())
}

pub(crate) fn make_line(kernel: &AnalyticKernel, start: DVec3, end: DVec3) -> Result<Shape, KernelError> {
    positive("line length", start.distance(end))?;
    let mut b = ShapeBuilder::new(kernel);
    let edge = b.line(start, end);
    b.wire(&edge);
    Ok(b.build())
}

pub(crate) fn make_circle(kernel: &AnalyticKernel, center: DVec3, radius: f64) -> Result<Shape, KernelError> {
    positive("circle radius", radius)?;
    let mut b = ShapeBuilder::new(kernel);
    let edge = b.edge(
        CurveGeom::Circle(Circle {
            center,
            x_dir: DVec3::X,
            y_dir: DVec3::Y,
            radius,
        }),
        (0.0, TAU),
    );
    b.wire(&edge);
    Ok(b.build())
}
