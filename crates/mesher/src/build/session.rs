//! Kernel session: the state one worker owns and the request entry point.

use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};

use shared::{
    ExecuteRequest, ExecuteResponse, ResponsePayload, ShapeMesh, ShapeName, WorkerRequest, WorkerResponse,
    PROTOCOL_VERSION,
};

use super::mesh_extraction::{ExtractionStats, MeshExtractor};
use super::operations::{self, Outcome};
use super::shape_to_mesh;
use crate::error::{MeshError, Result};
use crate::kernel::Modeler;
use crate::settings::MesherSettings;

/// Kernel, shape-name table and extraction scratch of one worker.
///
/// The shape table only changes after an operation fully succeeded; a failed
/// request leaves the session exactly as it was.
pub struct KernelSession<K: Modeler> {
    kernel: K,
    shapes: HashMap<ShapeName, K::Shape>,
    settings: MesherSettings,
    extractor: MeshExtractor,
    last_stats: Option<ExtractionStats>,
}

impl<K: Modeler> KernelSession<K> {
    pub fn new(kernel: K, settings: MesherSettings) -> Self {
        Self {
            kernel,
            shapes: HashMap::new(),
            settings,
            extractor: MeshExtractor::new(),
            last_stats: None,
        }
    }

    /// Handshake sent once the kernel is ready for requests
    pub fn startup(&self) -> WorkerResponse {
        WorkerResponse::StartupCallback
    }

    pub fn kernel(&self) -> &K {
        &self.kernel
    }

    pub fn settings(&self) -> &MesherSettings {
        &self.settings
    }

    pub fn shape(&self, name: &str) -> Option<&K::Shape> {
        self.shapes.get(name)
    }

    /// Stored shape names, sorted
    pub fn shape_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.shapes.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn shape_count(&self) -> usize {
        self.shapes.len()
    }

    /// Registers a shape built outside the protocol
    pub fn insert_shape(&mut self, name: impl Into<ShapeName>, shape: K::Shape) {
        self.shapes.insert(name.into(), shape);
    }

    /// Statistics of the last successful extraction
    pub fn last_stats(&self) -> Option<&ExtractionStats> {
        self.last_stats.as_ref()
    }

    /// Meshes a shape handle directly, without touching the shape table
    pub fn mesh_shape(&mut self, shape: &K::Shape) -> Result<ShapeMesh> {
        let deviation = self.settings.meshing.resolution;
        let (mesh, stats) = shape_to_mesh(&mut self.extractor, &self.kernel, shape, deviation, &self.settings)?;
        self.last_stats = Some(stats);
        Ok(mesh)
    }

    /// Answers one request. Never panics: kernel errors and panics alike
    /// become a null payload preceded by an `error` message.
    pub fn handle(&mut self, request: WorkerRequest) -> Vec<WorkerResponse> {
        match request {
            WorkerRequest::Execute(request) => self.handle_execute(&request),
        }
    }

    fn handle_execute(&mut self, request: &ExecuteRequest) -> Vec<WorkerResponse> {
        let name = request.name.clone();
        let result = catch_unwind(AssertUnwindSafe(|| self.execute(request)))
            .unwrap_or_else(|panic| Err(MeshError::Panicked(panic_message(panic.as_ref()))));

        match result {
            Ok(payload) => vec![WorkerResponse::Execute(ExecuteResponse {
                name,
                payload: Some(payload),
            })],
            Err(e) => {
                tracing::error!("{} '{}' failed: {}", request.operation.kind(), name, e);
                vec![
                    WorkerResponse::Error(format!("{name}: {e}")),
                    WorkerResponse::Execute(ExecuteResponse::failed(name)),
                ]
            }
        }
    }

    /// Runs one request, storing the resulting shape on success
    pub fn execute(&mut self, request: &ExecuteRequest) -> Result<ResponsePayload> {
        if request.version != PROTOCOL_VERSION {
            return Err(MeshError::UnsupportedVersion(request.version));
        }
        tracing::debug!("execute '{}': {}", request.name, request.operation.kind());

        let outcome = operations::apply(
            &self.kernel,
            &self.shapes,
            &mut self.extractor,
            &self.settings,
            &request.operation,
        )?;

        match outcome {
            Outcome::Shape(shape) => {
                let mesh = self.mesh_shape(&shape)?;
                self.shapes.insert(request.name.clone(), shape);
                Ok(ResponsePayload::Mesh(mesh))
            }
            Outcome::Removed(name) => {
                if self.shapes.remove(&name).is_none() {
                    tracing::debug!("remove: no shape named '{}'", name);
                }
                Ok(ResponsePayload::Mesh(ShapeMesh::default()))
            }
            Outcome::Surface(info) => Ok(ResponsePayload::Surface(info)),
        }
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use crate::kernel::analytic::{AnalyticKernel, Shape};
    use shared::Operation;

    fn session() -> KernelSession<AnalyticKernel> {
        KernelSession::new(AnalyticKernel::new(), MesherSettings::default().with_resolution(0.1))
    }

    fn only_execute(responses: &[WorkerResponse]) -> &ExecuteResponse {
        responses
            .iter()
            .find_map(|r| match r {
                WorkerResponse::Execute(e) => Some(e),
                _ => None,
            })
            .unwrap()
    }

    #[test]
    fn test_success_stores_shape() {
        let mut s = session();
        let responses = s.handle(fixtures::unit_cube_request("cube"));
        assert_eq!(responses.len(), 1);
        let mesh = only_execute(&responses).mesh().unwrap();
        assert_eq!(mesh.faces.len(), 6);
        assert!(s.shape("cube").is_some());
        assert_eq!(s.last_stats().map(|st| st.unique_edges), Some(12));
        assert_eq!(s.kernel().cached_triangulations(), 0);
    }

    #[test]
    fn test_failure_reports_and_leaves_table() {
        let mut s = session();
        let responses = s.handle(fixtures::box_request("flat", [0.0; 3], [1.0, 1.0, 0.0]));
        assert_eq!(responses.len(), 2);
        assert!(matches!(&responses[0], WorkerResponse::Error(msg) if msg.starts_with("flat:")));
        assert!(only_execute(&responses).payload.is_none());
        assert_eq!(s.shape_count(), 0);
    }

    #[test]
    fn test_unmeshable_shape_not_stored() {
        let mut s = session();
        let broken = fixtures::with_degenerate_face(s.kernel());
        s.insert_shape("broken", broken);

        let responses = s.handle(fixtures::translate_request("moved", "broken", [1.0, 0.0, 0.0]));
        assert!(only_execute(&responses).payload.is_none());
        assert!(s.shape("moved").is_none());
        assert_eq!(s.kernel().cached_triangulations(), 0);
    }

    #[test]
    fn test_null_shape_then_recovery() {
        let mut s = session();
        assert!(matches!(s.mesh_shape(&Shape::null()), Err(MeshError::NullShape)));

        let responses = s.handle(fixtures::unit_cube_request("cube"));
        assert!(only_execute(&responses).mesh().is_some());
    }

    #[test]
    fn test_unknown_version_is_null() {
        let mut s = session();
        let mut request = ExecuteRequest::new("cube", Operation::MakeBox {
            origin: [0.0; 3],
            size: [1.0; 3],
        });
        request.version = PROTOCOL_VERSION + 1;
        let responses = s.handle(WorkerRequest::Execute(request));
        assert!(only_execute(&responses).payload.is_none());
        assert_eq!(s.shape_count(), 0);
    }

    #[test]
    fn test_remove_answers_empty_mesh() {
        let mut s = session();
        s.handle(fixtures::unit_cube_request("cube"));
        let responses = s.handle(fixtures::remove_request("cube"));
        let mesh = only_execute(&responses).mesh().unwrap();
        assert!(mesh.faces.is_empty() && mesh.edges.is_empty());
        assert_eq!(s.shape_count(), 0);
    }

    #[test]
    fn test_query_does_not_store() {
        let mut s = session();
        s.handle(fixtures::unit_cube_request("cube"));
        let responses = s.handle(fixtures::query_request("probe", "cube", 1));
        let info = only_execute(&responses).surface().unwrap();
        assert_eq!(info.point, [0.5, 0.5, 1.0]);
        assert_eq!(s.shape_names(), vec!["cube"]);
    }

    #[test]
    fn test_derived_shapes() {
        let mut s = session();
        s.handle(fixtures::unit_cube_request("a"));
        s.handle(fixtures::translate_request("b", "a", [2.0, 0.0, 0.0]));
        let responses = s.handle(WorkerRequest::execute(
            "both",
            Operation::Compound {
                shapes: vec!["a".into(), "b".into()],
            },
        ));
        let mesh = only_execute(&responses).mesh().unwrap();
        assert_eq!(mesh.faces.len(), 12);
        assert_eq!(s.shape_names(), vec!["a", "b", "both"]);
    }

    #[test]
    fn test_panic_message() {
        let boxed: Box<dyn std::any::Any + Send> = Box::new("boom");
        assert_eq!(panic_message(boxed.as_ref()), "boom");
        let boxed: Box<dyn std::any::Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(boxed.as_ref()), "bang");
    }
}
