//! Geometry kernel seam.
//!
//! The mesher never reaches into kernel internals: everything it needs from a
//! boundary-representation engine is expressed by the [`Kernel`] trait (topology
//! traversal, triangulation on demand, edge identity, curve/surface adaptors)
//! and the [`Modeler`] trait (shape construction used by the worker's operation
//! table). [`analytic`] provides a small reference kernel used by the CLI, the
//! wasm bridge and the test suite.

pub mod analytic;
pub mod deflection;
pub mod normals;

use glam::{DAffine3, DVec2, DVec3};
use shared::SurfaceKind;
use thiserror::Error;

/// Errors reported by a kernel implementation
#[derive(Debug, Error)]
pub enum KernelError {
    #[error("operation '{0}' is not supported by this kernel")]
    Unsupported(&'static str),
    #[error("shape is null")]
    NullShape,
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("kernel failure: {0}")]
    Failed(String),
}

/// Orientation of a face (or edge) relative to its underlying geometry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Orientation {
    Forward,
    Reversed,
    Internal,
    External,
}

impl Orientation {
    pub fn is_forward(self) -> bool {
        self == Orientation::Forward
    }

    pub fn reversed(self) -> Self {
        match self {
            Orientation::Forward => Orientation::Reversed,
            Orientation::Reversed => Orientation::Forward,
            other => other,
        }
    }
}

/// Parametric bounding box of a face's UV nodes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UvBounds {
    pub u_min: f64,
    pub u_max: f64,
    pub v_min: f64,
    pub v_max: f64,
}

impl UvBounds {
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a DVec2>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut bounds = Self {
            u_min: first.x,
            u_max: first.x,
            v_min: first.y,
            v_max: first.y,
        };
        for p in iter {
            bounds.u_min = bounds.u_min.min(p.x);
            bounds.u_max = bounds.u_max.max(p.x);
            bounds.v_min = bounds.v_min.min(p.y);
            bounds.v_max = bounds.v_max.max(p.y);
        }
        Some(bounds)
    }

    pub fn from_array(a: [f64; 4]) -> Self {
        Self {
            u_min: a[0],
            u_max: a[1],
            v_min: a[2],
            v_max: a[3],
        }
    }

    pub fn to_array(self) -> [f64; 4] {
        [self.u_min, self.u_max, self.v_min, self.v_max]
    }

    pub fn u_span(&self) -> f64 {
        self.u_max - self.u_min
    }

    pub fn v_span(&self) -> f64 {
        self.v_max - self.v_min
    }

    pub fn mid(&self) -> DVec2 {
        DVec2::new(
            self.u_min + self.u_span() * 0.5,
            self.v_min + self.v_span() * 0.5,
        )
    }

    /// Maps a parameter pair into `[0,1]²`. A zero-span direction maps to 0.
    pub fn normalize(&self, uv: DVec2) -> DVec2 {
        let norm = |x: f64, min: f64, span: f64| if span > 0.0 { (x - min) / span } else { 0.0 };
        DVec2::new(
            norm(uv.x, self.u_min, self.u_span()),
            norm(uv.y, self.v_min, self.v_span()),
        )
    }
}

/// Kernel-produced discretization of one face.
///
/// Nodes are in the face's local frame; `location` places them in the shape's
/// placement space. Triangles are 0-based and wound as stored by the kernel,
/// without any orientation correction.
#[derive(Debug, Clone, PartialEq)]
pub struct Triangulation {
    pub nodes: Vec<DVec3>,
    pub uv_nodes: Option<Vec<DVec2>>,
    pub triangles: Vec<[usize; 3]>,
    pub location: DAffine3,
}

impl Triangulation {
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() || self.triangles.is_empty()
    }

    pub fn uv_bounds(&self) -> Option<UvBounds> {
        self.uv_nodes.as_ref().and_then(|uv| UvBounds::from_points(uv))
    }
}

/// Parametric curve adaptor
pub trait Curve {
    fn value(&self, t: f64) -> DVec3;
    fn first_parameter(&self) -> f64;
    fn last_parameter(&self) -> f64;

    /// Adaptive polyline over the full parameter range
    fn tangential_deflection(&self, angular_deflection: f64, curvature_deflection: f64) -> Vec<DVec3> {
        deflection::tangential_deflection(
            |t| self.value(t),
            self.first_parameter(),
            self.last_parameter(),
            angular_deflection,
            curvature_deflection,
        )
    }
}

/// Parametric surface adaptor
pub trait Surface {
    fn value(&self, u: f64, v: f64) -> DVec3;

    /// First derivatives `(dS/du, dS/dv)`
    fn d1(&self, u: f64, v: f64) -> (DVec3, DVec3);

    /// Unit normal along `dS/du × dS/dv`, `None` at singular points
    fn normal(&self, u: f64, v: f64) -> Option<DVec3> {
        let (du, dv) = self.d1(u, v);
        let n = du.cross(dv);
        (n.length_squared() > 1e-24).then(|| n.normalize())
    }

    /// Curve at fixed `u`, parameterized by `v`
    fn u_iso(&self, u: f64) -> Box<dyn Curve>;

    /// Curve at fixed `v`, parameterized by `u`
    fn v_iso(&self, v: f64) -> Box<dyn Curve>;

    fn kind(&self) -> SurfaceKind;

    fn is_planar(&self) -> bool {
        self.kind() == SurfaceKind::Plane
    }
}

/// Read-only topology and tessellation access.
///
/// Methods take `&self`: kernels keep their caches behind interior mutability
/// and are owned by a single worker thread.
pub trait Kernel {
    type Shape: Clone;
    type Face: Clone;
    type Edge: Clone;

    fn is_null(&self, shape: &Self::Shape) -> bool;

    /// Populates per-face triangulations for the whole shape
    fn incremental_mesh(
        &self,
        shape: &Self::Shape,
        linear_deflection: f64,
        angular_deflection: f64,
    ) -> Result<(), KernelError>;

    /// Faces in stable traversal order
    fn faces(&self, shape: &Self::Shape) -> Vec<Self::Face>;

    /// Edges in explorer order; an edge may be visited more than once
    fn edges(&self, shape: &Self::Shape) -> Vec<Self::Edge>;

    fn face_edges(&self, face: &Self::Face) -> Vec<Self::Edge>;

    fn face_orientation(&self, face: &Self::Face) -> Orientation;

    fn triangulation(&self, face: &Self::Face) -> Option<Triangulation>;

    /// Drops the face's cached triangulation. Must not panic.
    fn nullify_triangulation(&self, face: &Self::Face);

    /// Underlying surface, placed in the shape's placement space
    fn surface(&self, face: &Self::Face) -> Option<Box<dyn Surface>>;

    /// Per-node normals in the triangulation's local frame, pointing out of the
    /// visible side of the face
    fn triangulation_normals(&self, face: &Self::Face, triangulation: &Triangulation) -> Vec<DVec3> {
        normals::triangulated_normals(triangulation, self.face_orientation(face))
    }

    /// Structural hash in `0..modulus`, independent of the edge's orientation
    fn edge_hash(&self, edge: &Self::Edge, modulus: u64) -> u64;

    /// Native stable identity, when the kernel has one
    fn edge_identity(&self, _edge: &Self::Edge) -> Option<u64> {
        None
    }

    /// Indices into `face`'s triangulation nodes tracing `edge`
    fn polygon_on_triangulation(&self, edge: &Self::Edge, face: &Self::Face) -> Option<Vec<usize>>;

    /// 3D curve of the edge, placed in the shape's placement space
    fn edge_curve(&self, edge: &Self::Edge) -> Option<Box<dyn Curve>>;
}

/// Shape construction used by the worker's operation table
pub trait Modeler: Kernel {
    fn make_box(&self, origin: DVec3, size: DVec3) -> Result<Self::Shape, KernelError>;
    fn make_cylinder(&self, center: DVec3, radius: f64, height: f64) -> Result<Self::Shape, KernelError>;
    fn make_sphere(&self, center: DVec3, radius: f64) -> Result<Self::Shape, KernelError>;
    fn make_line(&self, start: DVec3, end: DVec3) -> Result<Self::Shape, KernelError>;
    fn make_circle(&self, center: DVec3, radius: f64) -> Result<Self::Shape, KernelError>;

    /// New shape instance placed by `transform` on top of the current placement
    fn transform(&self, shape: &Self::Shape, transform: DAffine3) -> Result<Self::Shape, KernelError>;

    /// Independent copy with fresh topology
    fn copy(&self, shape: &Self::Shape) -> Result<Self::Shape, KernelError> {
        self.transform(shape, DAffine3::IDENTITY)
    }

    fn compound(&self, shapes: &[Self::Shape]) -> Result<Self::Shape, KernelError>;

    fn fuse(&self, _shapes: &[Self::Shape]) -> Result<Self::Shape, KernelError> {
        Err(KernelError::Unsupported("fuse"))
    }

    fn cut(&self, _target: &Self::Shape, _tools: &[Self::Shape]) -> Result<Self::Shape, KernelError> {
        Err(KernelError::Unsupported("cut"))
    }

    fn fillet(
        &self,
        _shape: &Self::Shape,
        _radius: f64,
        _edges: &[Self::Edge],
    ) -> Result<Self::Shape, KernelError> {
        Err(KernelError::Unsupported("fillet"))
    }

    fn offset(&self, _shape: &Self::Shape, _distance: f64) -> Result<Self::Shape, KernelError> {
        Err(KernelError::Unsupported("offset"))
    }

    /// Copy of `shape` with one face's orientation flipped
    fn reverse_face(&self, shape: &Self::Shape, face_index: usize) -> Result<Self::Shape, KernelError>;
}
