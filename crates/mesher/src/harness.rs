//! Headless test harness for driving a kernel session programmatically.
//!
//! Wraps a `KernelSession` over the analytic kernel and keeps the last mesh
//! or error per shape name, the way the worker's consumer would.

use std::collections::HashMap;

use shared::{ExecuteRequest, Operation, ShapeMesh, SurfaceInfo, WorkerRequest, WorkerResponse};

use crate::build::{assemble, assemble_edges, ExtractionStats, KernelSession};
use crate::kernel::analytic::AnalyticKernel;
use crate::settings::MesherSettings;
use crate::validation::MeshValidator;
use crate::viewport::edge::EdgeGeometry;
use crate::viewport::mesh::GeometryBuffers;

/// Headless test harness: session, last meshes and last errors
pub struct TestHarness {
    session: KernelSession<AnalyticKernel>,
    last_meshes: HashMap<String, ShapeMesh>,
    last_buffers: HashMap<String, GeometryBuffers>,
    last_surfaces: HashMap<String, SurfaceInfo>,
    last_errors: HashMap<String, String>,
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

impl TestHarness {
    /// Harness with a coarse resolution so tests stay fast
    pub fn new() -> Self {
        Self::with_settings(MesherSettings::default().with_resolution(0.05))
    }

    pub fn with_settings(settings: MesherSettings) -> Self {
        Self {
            session: KernelSession::new(AnalyticKernel::new(), settings),
            last_meshes: HashMap::new(),
            last_buffers: HashMap::new(),
            last_surfaces: HashMap::new(),
            last_errors: HashMap::new(),
        }
    }

    // ── Requests ──────────────────────────────────────────────

    /// Send a request and record its outcome; returns the raw responses
    pub fn send(&mut self, request: WorkerRequest) -> Vec<WorkerResponse> {
        let responses = self.session.handle(request);
        for response in &responses {
            match response {
                WorkerResponse::Execute(e) => {
                    if let Some(mesh) = e.mesh() {
                        self.last_errors.remove(&e.name);
                        self.last_meshes.insert(e.name.clone(), mesh.clone());
                        match assemble(&mesh.faces) {
                            Some(buffers) => {
                                self.last_buffers.insert(e.name.clone(), buffers);
                            }
                            None => {
                                self.last_buffers.remove(&e.name);
                            }
                        }
                    } else if let Some(info) = e.surface() {
                        self.last_errors.remove(&e.name);
                        self.last_surfaces.insert(e.name.clone(), info.clone());
                    }
                }
                WorkerResponse::Error(msg) => {
                    let name = msg.split(':').next().unwrap_or_default().to_string();
                    self.last_errors.insert(name, msg.clone());
                }
                WorkerResponse::StartupCallback => {}
            }
        }
        responses
    }

    /// Run an operation under a fresh unique name and return that name
    pub fn run(&mut self, operation: Operation) -> String {
        let name = uuid::Uuid::new_v4().to_string();
        self.send(WorkerRequest::Execute(ExecuteRequest::new(name.clone(), operation)));
        name
    }

    // ── Shape creation ────────────────────────────────────────

    /// Create a box with its min corner at the origin and return its name
    pub fn create_cube(&mut self, w: f64, h: f64, d: f64) -> String {
        self.run(Operation::MakeBox {
            origin: [0.0; 3],
            size: [w, h, d],
        })
    }

    pub fn create_cylinder(&mut self, r: f64, h: f64) -> String {
        self.run(Operation::MakeCylinder {
            center: [0.0; 3],
            radius: r,
            height: h,
        })
    }

    pub fn create_sphere(&mut self, r: f64) -> String {
        self.run(Operation::MakeSphere {
            center: [0.0; 3],
            radius: r,
        })
    }

    pub fn translate(&mut self, shape: &str, offset: [f64; 3]) -> String {
        self.run(Operation::Translate {
            shape: shape.to_string(),
            offset,
        })
    }

    pub fn compound(&mut self, shapes: &[&str]) -> String {
        self.run(Operation::Compound {
            shapes: shapes.iter().map(|s| s.to_string()).collect(),
        })
    }

    /// Remove a shape; forgets its cached mesh too
    pub fn remove(&mut self, shape: &str) {
        self.send(WorkerRequest::execute(
            shape,
            Operation::Remove {
                shape: shape.to_string(),
            },
        ));
        self.last_meshes.remove(shape);
        self.last_buffers.remove(shape);
    }

    /// Query a face at raw parameters, with the face's own parameter bounds
    pub fn query(&mut self, shape: &str, face_index: usize, u: f64, v: f64) -> Option<SurfaceInfo> {
        let uv_bounds = self
            .last_meshes
            .get(shape)
            .and_then(|m| m.faces.get(face_index))
            .and_then(|f| f.uv_bounds);
        let name = self.run(Operation::QuerySurface {
            shape: shape.to_string(),
            face_index,
            u,
            v,
            uv_bounds,
        });
        self.last_surfaces.remove(&name)
    }

    // ── Inspection ────────────────────────────────────────────

    pub fn shape_count(&self) -> usize {
        self.session.shape_count()
    }

    pub fn has_shape(&self, name: &str) -> bool {
        self.session.shape(name).is_some()
    }

    pub fn last_mesh(&self, name: &str) -> Option<&ShapeMesh> {
        self.last_meshes.get(name)
    }

    pub fn buffers(&self, name: &str) -> Option<&GeometryBuffers> {
        self.last_buffers.get(name)
    }

    pub fn edge_geometry(&self, name: &str) -> Option<EdgeGeometry> {
        self.last_meshes.get(name).map(|m| assemble_edges(&m.edges))
    }

    /// Validator over the assembled buffers of `name`
    pub fn validate_mesh(&self, name: &str) -> Option<MeshValidator<'_>> {
        self.last_buffers.get(name).map(MeshValidator::new)
    }

    pub fn last_stats(&self) -> Option<&ExtractionStats> {
        self.session.last_stats()
    }

    pub fn errors(&self) -> &HashMap<String, String> {
        &self.last_errors
    }

    pub fn cached_triangulations(&self) -> usize {
        self.session.kernel().cached_triangulations()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_and_validate() {
        let mut h = TestHarness::new();
        let id = h.create_cube(2.0, 3.0, 4.0);
        assert!(h.errors().is_empty());
        assert!(h.has_shape(&id));

        let v = h.validate_mesh(&id).unwrap();
        assert!(v.validate_all().is_empty(), "{:?}", v.validate_all());
        assert!(v.assert_dimensions_approx([2.0, 3.0, 4.0], 1e-4));
    }

    #[test]
    fn test_failure_is_recorded() {
        let mut h = TestHarness::new();
        let id = h.translate("missing", [1.0, 0.0, 0.0]);
        assert!(h.errors().contains_key(&id));
        assert!(h.last_mesh(&id).is_none());
        assert_eq!(h.shape_count(), 0);
    }

    #[test]
    fn test_remove_forgets_mesh() {
        let mut h = TestHarness::new();
        let id = h.create_sphere(1.0);
        h.remove(&id);
        assert!(h.last_mesh(&id).is_none());
        assert_eq!(h.shape_count(), 0);
    }
}
