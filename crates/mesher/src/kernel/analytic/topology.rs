//! Faces, edges and shapes of the analytic kernel.

use std::collections::HashMap;
use std::rc::Rc;

use glam::{DAffine3, DVec3};

use super::geometry::{CurveGeom, Line, SurfaceGeom};
use super::AnalyticKernel;
use crate::kernel::Orientation;

/// Parametric domain of a face
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Domain {
    /// `[u0, u1] × [v0, v1]`
    Rect { u: (f64, f64), v: (f64, f64) },
    /// Disk of `radius` around the surface origin, Cartesian parameters
    Disk { radius: f64 },
}

impl Domain {
    pub fn rect(u: (f64, f64), v: (f64, f64)) -> Self {
        Domain::Rect { u, v }
    }

    /// True when the domain encloses no area
    pub fn is_degenerate(&self) -> bool {
        match *self {
            Domain::Rect { u, v } => !(u.1 - u.0 > 0.0 && v.1 - v.0 > 0.0),
            Domain::Disk { radius } => !(radius > 0.0),
        }
    }
}

/// Which part of a face's domain boundary an edge runs along
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    UMin,
    UMax,
    VMin,
    VMax,
    Rim,
}

#[derive(Debug)]
pub struct EdgeData {
    pub id: u64,
    pub curve: CurveGeom,
    pub range: (f64, f64),
}

#[derive(Debug, Clone)]
pub struct BoundaryEdge {
    pub edge: Rc<EdgeData>,
    pub side: Side,
    pub orientation: Orientation,
}

#[derive(Debug)]
pub struct FaceData {
    pub id: u64,
    pub surface: SurfaceGeom,
    pub domain: Domain,
    pub orientation: Orientation,
    pub boundary: Vec<BoundaryEdge>,
    /// Whether triangulations carry UV nodes
    pub uv_nodes: bool,
}

impl FaceData {
    pub fn side_of(&self, edge_id: u64) -> Option<Side> {
        self.boundary
            .iter()
            .find(|b| b.edge.id == edge_id)
            .map(|b| b.side)
    }
}

/// Face handle: shared face data plus its placement
#[derive(Debug, Clone)]
pub struct Face {
    pub(crate) data: Rc<FaceData>,
    pub(crate) location: DAffine3,
}

impl Face {
    pub fn id(&self) -> u64 {
        self.data.id
    }
}

/// Edge handle: shared edge data, placement and use orientation
#[derive(Debug, Clone)]
pub struct Edge {
    pub(crate) data: Rc<EdgeData>,
    pub(crate) location: DAffine3,
    pub(crate) orientation: Orientation,
}

impl Edge {
    pub fn id(&self) -> u64 {
        self.data.id
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }
}

#[derive(Debug, Default)]
pub struct ShapeData {
    pub faces: Vec<Face>,
    /// Edges not bounding any face
    pub wires: Vec<Edge>,
}

/// Shape handle. The default value is the null shape.
#[derive(Debug, Clone, Default)]
pub struct Shape(pub(crate) Option<Rc<ShapeData>>);

impl Shape {
    pub fn null() -> Self {
        Shape(None)
    }

    pub fn is_null(&self) -> bool {
        self.0.is_none()
    }

    pub fn face_count(&self) -> usize {
        self.0.as_ref().map_or(0, |d| d.faces.len())
    }

    pub fn wire_count(&self) -> usize {
        self.0.as_ref().map_or(0, |d| d.wires.len())
    }

    pub(crate) fn data(&self) -> Option<&ShapeData> {
        self.0.as_deref()
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Hand assembly of topology.
///
/// Used by the primitive constructors and by tests that need shapes a modeler
/// would never produce: non-manifold edges, missing UV nodes, inconsistent
/// orientations, degenerate domains.
pub struct ShapeBuilder<'k> {
    kernel: &'k AnalyticKernel,
    faces: Vec<FaceData>,
    wires: Vec<Rc<EdgeData>>,
    location: DAffine3,
}

impl<'k> ShapeBuilder<'k> {
    pub fn new(kernel: &'k AnalyticKernel) -> Self {
        Self {
            kernel,
            faces: Vec::new(),
            wires: Vec::new(),
            location: DAffine3::IDENTITY,
        }
    }

    pub fn edge(&mut self, curve: CurveGeom, range: (f64, f64)) -> Rc<EdgeData> {
        Rc::new(EdgeData {
            id: self.kernel.alloc_id(),
            curve,
            range,
        })
    }

    /// Straight edge, parameter range `[0, 1]`
    pub fn line(&mut self, start: DVec3, end: DVec3) -> Rc<EdgeData> {
        self.edge(CurveGeom::Line(Line::through(start, end)), (0.0, 1.0))
    }

    /// Adds a face and returns its position in traversal order
    pub fn face(&mut self, surface: SurfaceGeom, domain: Domain, orientation: Orientation) -> usize {
        self.faces.push(FaceData {
            id: self.kernel.alloc_id(),
            surface,
            domain,
            orientation,
            boundary: Vec::new(),
            uv_nodes: true,
        });
        self.faces.len() - 1
    }

    pub fn bound(&mut self, face: usize, edge: &Rc<EdgeData>, side: Side) -> &mut Self {
        self.bound_oriented(face, edge, side, Orientation::Forward)
    }

    pub fn bound_oriented(
        &mut self,
        face: usize,
        edge: &Rc<EdgeData>,
        side: Side,
        orientation: Orientation,
    ) -> &mut Self {
        if let Some(f) = self.faces.get_mut(face) {
            f.boundary.push(BoundaryEdge {
                edge: Rc::clone(edge),
                side,
                orientation,
            });
        }
        self
    }

    pub fn without_uv_nodes(&mut self, face: usize) -> &mut Self {
        if let Some(f) = self.faces.get_mut(face) {
            f.uv_nodes = false;
        }
        self
    }

    pub fn wire(&mut self, edge: &Rc<EdgeData>) -> &mut Self {
        self.wires.push(Rc::clone(edge));
        self
    }

    pub fn placed(&mut self, location: DAffine3) -> &mut Self {
        self.location = location;
        self
    }

    pub fn build(self) -> Shape {
        let location = self.location;
        let faces = self
            .faces
            .into_iter()
            .map(|data| Face {
                data: Rc::new(data),
                location,
            })
            .collect();
        let wires = self
            .wires
            .into_iter()
            .map(|data| Edge {
                data,
                location,
                orientation: Orientation::Forward,
            })
            .collect();
        Shape(Some(Rc::new(ShapeData { faces, wires })))
    }
}

/// Copies `shape` with fresh face and edge ids, composing `transform` onto every
/// placement. Edges shared between faces stay shared in the copy. When
/// `flip_face` is set, that face's orientation is reversed.
pub(crate) fn reinstance(
    kernel: &AnalyticKernel,
    shape: &ShapeData,
    transform: DAffine3,
    flip_face: Option<usize>,
) -> Shape {
    let mut edge_map: HashMap<u64, Rc<EdgeData>> = HashMap::new();
    let mut fresh_edge = |old: &Rc<EdgeData>| -> Rc<EdgeData> {
        Rc::clone(edge_map.entry(old.id).or_insert_with(|| {
            Rc::new(EdgeData {
                id: kernel.alloc_id(),
                curve: old.curve,
                range: old.range,
            })
        }))
    };

    let faces = shape
        .faces
        .iter()
        .enumerate()
        .map(|(i, face)| {
            let src = &face.data;
            let orientation = if flip_face == Some(i) {
                src.orientation.reversed()
            } else {
                src.orientation
            };
            let boundary = src
                .boundary
                .iter()
                .map(|b| BoundaryEdge {
                    edge: fresh_edge(&b.edge),
                    side: b.side,
                    orientation: b.orientation,
                })
                .collect();
            Face {
                data: Rc::new(FaceData {
                    id: kernel.alloc_id(),
                    surface: src.surface,
                    domain: src.domain,
                    orientation,
                    boundary,
                    uv_nodes: src.uv_nodes,
                }),
                location: transform * face.location,
            }
        })
        .collect();

    let wires = shape
        .wires
        .iter()
        .map(|edge| Edge {
            data: fresh_edge(&edge.data),
            location: transform * edge.location,
            orientation: edge.orientation,
        })
        .collect();

    Shape(Some(Rc::new(ShapeData { faces, wires })))
}
