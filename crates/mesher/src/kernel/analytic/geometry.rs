//! Analytic curves and surfaces.

use glam::{DAffine3, DVec3};
use shared::SurfaceKind;

use crate::kernel::{Curve, Surface};

/// `origin + u·x_dir + v·y_dir`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    pub origin: DVec3,
    pub x_dir: DVec3,
    pub y_dir: DVec3,
}

/// `origin + r·(cos u·x_dir + sin u·y_dir) + v·axis`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cylinder {
    pub origin: DVec3,
    pub x_dir: DVec3,
    pub y_dir: DVec3,
    pub axis: DVec3,
    pub radius: f64,
}

/// `center + r·(cos v·(cos u·x_dir + sin u·y_dir) + sin v·axis)`, with
/// `v ∈ [-π/2, π/2]`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sphere {
    pub center: DVec3,
    pub x_dir: DVec3,
    pub y_dir: DVec3,
    pub axis: DVec3,
    pub radius: f64,
}

/// `origin + t·dir`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Line {
    pub origin: DVec3,
    pub dir: DVec3,
}

/// `center + r·(cos t·x_dir + sin t·y_dir)`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Circle {
    pub center: DVec3,
    pub x_dir: DVec3,
    pub y_dir: DVec3,
    pub radius: f64,
}

impl Plane {
    pub fn new(origin: DVec3, x_dir: DVec3, y_dir: DVec3) -> Self {
        Self { origin, x_dir, y_dir }
    }

    pub fn value(&self, u: f64, v: f64) -> DVec3 {
        self.origin + self.x_dir * u + self.y_dir * v
    }

    pub fn transformed(&self, t: &DAffine3) -> Self {
        Self {
            origin: t.transform_point3(self.origin),
            x_dir: t.transform_vector3(self.x_dir),
            y_dir: t.transform_vector3(self.y_dir),
        }
    }
}

impl Cylinder {
    pub fn value(&self, u: f64, v: f64) -> DVec3 {
        self.origin + self.radial(u) * self.radius + self.axis * v
    }

    fn radial(&self, u: f64) -> DVec3 {
        self.x_dir * u.cos() + self.y_dir * u.sin()
    }

    pub fn transformed(&self, t: &DAffine3) -> Self {
        Self {
            origin: t.transform_point3(self.origin),
            x_dir: t.transform_vector3(self.x_dir),
            y_dir: t.transform_vector3(self.y_dir),
            axis: t.transform_vector3(self.axis),
            radius: self.radius,
        }
    }
}

impl Sphere {
    pub fn value(&self, u: f64, v: f64) -> DVec3 {
        self.center + self.direction(u, v) * self.radius
    }

    fn direction(&self, u: f64, v: f64) -> DVec3 {
        (self.x_dir * u.cos() + self.y_dir * u.sin()) * v.cos() + self.axis * v.sin()
    }

    pub fn transformed(&self, t: &DAffine3) -> Self {
        Self {
            center: t.transform_point3(self.center),
            x_dir: t.transform_vector3(self.x_dir),
            y_dir: t.transform_vector3(self.y_dir),
            axis: t.transform_vector3(self.axis),
            radius: self.radius,
        }
    }
}

impl Line {
    pub fn through(start: DVec3, end: DVec3) -> Self {
        Self {
            origin: start,
            dir: end - start,
        }
    }

    pub fn value(&self, t: f64) -> DVec3 {
        self.origin + self.dir * t
    }
}

impl Circle {
    pub fn value(&self, t: f64) -> DVec3 {
        self.center + (self.x_dir * t.cos() + self.y_dir * t.sin()) * self.radius
    }
}

// ============================================================================
// Geometry carried by topology
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SurfaceGeom {
    Plane(Plane),
    Cylinder(Cylinder),
    Sphere(Sphere),
}

impl SurfaceGeom {
    pub fn transformed(&self, t: &DAffine3) -> Self {
        match self {
            SurfaceGeom::Plane(s) => SurfaceGeom::Plane(s.transformed(t)),
            SurfaceGeom::Cylinder(s) => SurfaceGeom::Cylinder(s.transformed(t)),
            SurfaceGeom::Sphere(s) => SurfaceGeom::Sphere(s.transformed(t)),
        }
    }

    /// Radius of curvature along each parametric direction; `None` when straight
    pub fn curvature_radii(&self) -> (Option<f64>, Option<f64>) {
        match self {
            SurfaceGeom::Plane(_) => (None, None),
            SurfaceGeom::Cylinder(c) => (Some(c.radius), None),
            SurfaceGeom::Sphere(s) => (Some(s.radius), Some(s.radius)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CurveGeom {
    Line(Line),
    Circle(Circle),
}

impl CurveGeom {
    pub fn transformed(&self, t: &DAffine3) -> Self {
        match self {
            CurveGeom::Line(l) => CurveGeom::Line(Line {
                origin: t.transform_point3(l.origin),
                dir: t.transform_vector3(l.dir),
            }),
            CurveGeom::Circle(c) => CurveGeom::Circle(Circle {
                center: t.transform_point3(c.center),
                x_dir: t.transform_vector3(c.x_dir),
                y_dir: t.transform_vector3(c.y_dir),
                radius: c.radius,
            }),
        }
    }

    pub fn value(&self, t: f64) -> DVec3 {
        match self {
            CurveGeom::Line(l) => l.value(t),
            CurveGeom::Circle(c) => c.value(t),
        }
    }
}

/// Curve adaptor bounded to a parameter range
#[derive(Debug, Clone, Copy)]
pub struct TrimmedCurve {
    pub geom: CurveGeom,
    pub first: f64,
    pub last: f64,
}

impl Curve for TrimmedCurve {
    fn value(&self, t: f64) -> DVec3 {
        self.geom.value(t)
    }

    fn first_parameter(&self) -> f64 {
        self.first
    }

    fn last_parameter(&self) -> f64 {
        self.last
    }
}

fn trimmed(geom: CurveGeom, first: f64, last: f64) -> Box<dyn Curve> {
    Box::new(TrimmedCurve { geom, first, last })
}

impl Surface for SurfaceGeom {
    fn value(&self, u: f64, v: f64) -> DVec3 {
        match self {
            SurfaceGeom::Plane(s) => s.value(u, v),
            SurfaceGeom::Cylinder(s) => s.value(u, v),
            SurfaceGeom::Sphere(s) => s.value(u, v),
        }
    }

    fn d1(&self, u: f64, v: f64) -> (DVec3, DVec3) {
        match self {
            SurfaceGeom::Plane(s) => (s.x_dir, s.y_dir),
            SurfaceGeom::Cylinder(s) => (
                (s.y_dir * u.cos() - s.x_dir * u.sin()) * s.radius,
                s.axis,
            ),
            SurfaceGeom::Sphere(s) => {
                let radial = s.x_dir * u.cos() + s.y_dir * u.sin();
                let tangent = s.y_dir * u.cos() - s.x_dir * u.sin();
                (
                    tangent * (s.radius * v.cos()),
                    (s.axis * v.cos() - radial * v.sin()) * s.radius,
                )
            }
        }
    }

    fn normal(&self, u: f64, v: f64) -> Option<DVec3> {
        match self {
            // Defined at the poles too
            SurfaceGeom::Sphere(s) => Some(s.direction(u, v).normalize_or_zero()),
            _ => {
                let (du, dv) = self.d1(u, v);
                let n = du.cross(dv);
                (n.length_squared() > 1e-24).then(|| n.normalize())
            }
        }
    }

    fn u_iso(&self, u: f64) -> Box<dyn Curve> {
        match *self {
            SurfaceGeom::Plane(s) => trimmed(
                CurveGeom::Line(Line {
                    origin: s.origin + s.x_dir * u,
                    dir: s.y_dir,
                }),
                f64::NEG_INFINITY,
                f64::INFINITY,
            ),
            SurfaceGeom::Cylinder(s) => trimmed(
                CurveGeom::Line(Line {
                    origin: s.origin + s.radial(u) * s.radius,
                    dir: s.axis,
                }),
                f64::NEG_INFINITY,
                f64::INFINITY,
            ),
            // Meridian
            SurfaceGeom::Sphere(s) => trimmed(
                CurveGeom::Circle(Circle {
                    center: s.center,
                    x_dir: s.x_dir * u.cos() + s.y_dir * u.sin(),
                    y_dir: s.axis,
                    radius: s.radius,
                }),
                -std::f64::consts::FRAC_PI_2,
                std::f64::consts::FRAC_PI_2,
            ),
        }
    }

    fn v_iso(&self, v: f64) -> Box<dyn Curve> {
        match *self {
            SurfaceGeom::Plane(s) => trimmed(
                CurveGeom::Line(Line {
                    origin: s.origin + s.y_dir * v,
                    dir: s.x_dir,
                }),
                f64::NEG_INFINITY,
                f64::INFINITY,
            ),
            SurfaceGeom::Cylinder(s) => trimmed(
                CurveGeom::Circle(Circle {
                    center: s.origin + s.axis * v,
                    x_dir: s.x_dir,
                    y_dir: s.y_dir,
                    radius: s.radius,
                }),
                0.0,
                std::f64::consts::TAU,
            ),
            // Parallel
            SurfaceGeom::Sphere(s) => trimmed(
                CurveGeom::Circle(Circle {
                    center: s.center + s.axis * (s.radius * v.sin()),
                    x_dir: s.x_dir,
                    y_dir: s.y_dir,
                    radius: s.radius * v.cos(),
                }),
                0.0,
                std::f64::consts::TAU,
            ),
        }
    }

    fn kind(&self) -> SurfaceKind {
        match self {
            SurfaceGeom::Plane(_) => SurfaceKind::Plane,
            SurfaceGeom::Cylinder(_) => SurfaceKind::Cylinder,
            SurfaceGeom::Sphere(_) => SurfaceKind::Sphere,
        }
    }
}
