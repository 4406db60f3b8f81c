//! Reference boundary-representation kernel.
//!
//! Planes (rectangular and disk-bounded), cylinders and spheres, bounded by line
//! and circle edges. Supports placement transforms, compounds (topology merge
//! without intersection) and wire-only shapes. Boolean and offset operations
//! are left to a full kernel.

pub mod geometry;
mod primitives;
mod tessellate;
pub mod topology;

use std::cell::{Cell, RefCell};
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use glam::{DAffine3, DVec3};

pub use topology::{Domain, Edge, Face, Shape, ShapeBuilder, Side};

use self::geometry::TrimmedCurve;
use self::tessellate::Tessellation;
use super::{normals, Curve, Kernel, KernelError, Modeler, Orientation, Surface, Triangulation};

pub struct AnalyticKernel {
    next_id: Cell<u64>,
    /// Face id → tessellation, populated by `incremental_mesh`
    triangulations: RefCell<HashMap<u64, Tessellation>>,
}

impl Default for AnalyticKernel {
    fn default() -> Self {
        Self::new()
    }
}

impl AnalyticKernel {
    pub fn new() -> Self {
        Self {
            next_id: Cell::new(1),
            triangulations: RefCell::new(HashMap::new()),
        }
    }

    pub(crate) fn alloc_id(&self) -> u64 {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        id
    }

    /// Number of face triangulations currently held in the cache
    pub fn cached_triangulations(&self) -> usize {
        self.triangulations.borrow().len()
    }
}

impl Kernel for AnalyticKernel {
    type Shape = Shape;
    type Face = Face;
    type Edge = Edge;

    fn is_null(&self, shape: &Shape) -> bool {
        shape.is_null()
    }

    fn incremental_mesh(&self, shape: &Shape, linear: f64, angular: f64) -> Result<(), KernelError> {
        let data = shape.data().ok_or(KernelError::NullShape)?;
        if !(linear.is_finite() && linear > 0.0 && angular.is_finite() && angular > 0.0) {
            return Err(KernelError::InvalidArgument(format!(
                "deflection must be positive (linear {linear}, angular {angular})"
            )));
        }

        let mut cache = self.triangulations.borrow_mut();
        for face in &data.faces {
            let id = face.data.id;
            if cache.get(&id).is_some_and(|t| t.deflection == (linear, angular)) {
                continue;
            }
            match tessellate::tessellate(&face.data, linear, angular) {
                Some(t) => {
                    tracing::debug!(face = id, nodes = t.nodes.len(), triangles = t.triangles.len(), "tessellated");
                    cache.insert(id, t);
                }
                None => {
                    tracing::debug!(face = id, "degenerate face domain, no triangulation");
                    cache.remove(&id);
                }
            }
        }
        Ok(())
    }

    fn faces(&self, shape: &Shape) -> Vec<Face> {
        shape.data().map(|d| d.faces.clone()).unwrap_or_default()
    }

    fn edges(&self, shape: &Shape) -> Vec<Edge> {
        let Some(data) = shape.data() else {
            return Vec::new();
        };
        data.faces
            .iter()
            .flat_map(|face| self.face_edges(face))
            .chain(data.wires.iter().cloned())
            .collect()
    }

    fn face_edges(&self, face: &Face) -> Vec<Edge> {
        face.data
            .boundary
            .iter()
            .map(|b| Edge {
                data: Rc::clone(&b.edge),
                location: face.location,
                orientation: b.orientation,
            })
            .collect()
    }

    fn face_orientation(&self, face: &Face) -> Orientation {
        face.data.orientation
    }

    fn triangulation(&self, face: &Face) -> Option<Triangulation> {
        let cache = self.triangulations.borrow();
        let t = cache.get(&face.data.id)?;
        Some(Triangulation {
            nodes: t.nodes.clone(),
            uv_nodes: face.data.uv_nodes.then(|| t.uv_nodes.clone()),
            triangles: t.triangles.clone(),
            location: face.location,
        })
    }

    fn nullify_triangulation(&self, face: &Face) {
        if let Ok(mut cache) = self.triangulations.try_borrow_mut() {
            cache.remove(&face.data.id);
        }
    }

    fn surface(&self, face: &Face) -> Option<Box<dyn Surface>> {
        Some(Box::new(face.data.surface.transformed(&face.location)))
    }

    fn triangulation_normals(&self, face: &Face, triangulation: &Triangulation) -> Vec<DVec3> {
        normals::surface_normals(&face.data.surface, triangulation, face.data.orientation)
    }

    fn edge_hash(&self, edge: &Edge, modulus: u64) -> u64 {
        let mut hasher = DefaultHasher::new();
        edge.data.id.hash(&mut hasher);
        hasher.finish() % modulus.max(1)
    }

    fn edge_identity(&self, edge: &Edge) -> Option<u64> {
        Some(edge.data.id)
    }

    fn polygon_on_triangulation(&self, edge: &Edge, face: &Face) -> Option<Vec<usize>> {
        let side = face.data.side_of(edge.data.id)?;
        self.triangulations.borrow().get(&face.data.id)?.polygon(side)
    }

    fn edge_curve(&self, edge: &Edge) -> Option<Box<dyn Curve>> {
        Some(Box::new(TrimmedCurve {
            geom: edge.data.curve.transformed(&edge.location),
            first: edge.data.range.0,
            last: edge.data.range.1,
        }))
    }
}

impl Modeler for AnalyticKernel {
    fn make_box(&self, origin: DVec3, size: DVec3) -> Result<Shape, KernelError> {
        primitives::make_box(self, origin, size)
    }

    fn make_cylinder(&self, center: DVec3, radius: f64, height: f64) -> Result<Shape, KernelError> {
        primitives::make_cylinder(self, center, radius, height)
    }

    fn make_sphere(&self, center: DVec3, radius: f64) -> Result<Shape, KernelError> {
        primitives::make_sphere(self, center, radius)
    }

    fn make_line(&self, start: DVec3, end: DVec3) -> Result<Shape, KernelError> {
        primitives::make_line(self, start, end)
    }

    fn make_circle(&self, center: DVec3, radius: f64) -> Result<Shape, KernelError> {
        primitives::make_circle(self, center, radius)
    }

    fn transform(&self, shape: &Shape, transform: DAffine3) -> Result<Shape, KernelError> {
        let data = shape.data().ok_or(KernelError::NullShape)?;
        Ok(topology::reinstance(self, data, transform, None))
    }

    fn compound(&self, shapes: &[Shape]) -> Result<Shape, KernelError> {
        let mut merged = topology::ShapeData::default();
        for shape in shapes {
            let data = shape.data().ok_or(KernelError::NullShape)?;
            merged.faces.extend(data.faces.iter().cloned());
            merged.wires.extend(data.wires.iter().cloned());
        }
        Ok(Shape(Some(Rc::new(merged))))
    }

    fn reverse_face(&self, shape: &Shape, face_index: usize) -> Result<Shape, KernelError> {
        let data = shape.data().ok_or(KernelError::NullShape)?;
        if face_index >= data.faces.len() {
            return Err(KernelError::InvalidArgument(format!(
                "face index {face_index} out of range ({} faces)",
                data.faces.len()
            )));
        }
        Ok(topology::reinstance(self, data, DAffine3::IDENTITY, Some(face_index)))
    }
}
