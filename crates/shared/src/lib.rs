//! Wire types shared by the interactive thread and the kernel worker.
//!
//! Everything here crosses the worker boundary by value: requests carry a
//! shape name and a typed [`Operation`], responses carry per-face and per-edge
//! mesh records or surface query results. No live kernel handles ever appear
//! in these types.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Version of the operation schema understood by the worker.
pub const PROTOCOL_VERSION: u32 = 1;

/// Name under which a shape is stored in the worker's shape table
pub type ShapeName = String;

fn default_version() -> u32 {
    PROTOCOL_VERSION
}

// ============================================================================
// Operations
// ============================================================================

/// Geometric operation executed by the worker.
///
/// Closed replacement for shipping callback source text across the worker
/// boundary: every kind has a fixed, typed argument schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    /// Axis-aligned box spanning `origin .. origin + size`
    MakeBox { origin: [f64; 3], size: [f64; 3] },
    /// Z-aligned cylinder standing on `center`
    MakeCylinder {
        center: [f64; 3],
        radius: f64,
        height: f64,
    },
    MakeSphere { center: [f64; 3], radius: f64 },
    /// Wire-only straight edge
    MakeLine { start: [f64; 3], end: [f64; 3] },
    /// Wire-only circle in the XY plane through `center`
    MakeCircle { center: [f64; 3], radius: f64 },
    Translate { shape: ShapeName, offset: [f64; 3] },
    Rotate {
        shape: ShapeName,
        #[serde(default)]
        origin: [f64; 3],
        axis: [f64; 3],
        degrees: f64,
    },
    Copy { shape: ShapeName },
    /// Topology merge of several shapes without intersection
    Compound { shapes: Vec<ShapeName> },
    Fuse { shapes: Vec<ShapeName> },
    Cut {
        target: ShapeName,
        tools: Vec<ShapeName>,
    },
    /// Rounds the edges listed by their edge index
    Fillet {
        shape: ShapeName,
        radius: f64,
        edges: Vec<u32>,
    },
    Offset { shape: ShapeName, distance: f64 },
    /// Drops a shape from the worker's shape table
    Remove { shape: ShapeName },
    /// Surface point/normal lookup used for cursor snapping
    QuerySurface {
        shape: ShapeName,
        face_index: usize,
        u: f64,
        v: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        uv_bounds: Option<[f64; 4]>,
    },
}

impl Operation {
    /// Short snake_case name of the operation kind (matches the serde tag)
    pub fn kind(&self) -> &'static str {
        match self {
            Operation::MakeBox { .. } => "make_box",
            Operation::MakeCylinder { .. } => "make_cylinder",
            Operation::MakeSphere { .. } => "make_sphere",
            Operation::MakeLine { .. } => "make_line",
            Operation::MakeCircle { .. } => "make_circle",
            Operation::Translate { .. } => "translate",
            Operation::Rotate { .. } => "rotate",
            Operation::Copy { .. } => "copy",
            Operation::Compound { .. } => "compound",
            Operation::Fuse { .. } => "fuse",
            Operation::Cut { .. } => "cut",
            Operation::Fillet { .. } => "fillet",
            Operation::Offset { .. } => "offset",
            Operation::Remove { .. } => "remove",
            Operation::QuerySurface { .. } => "query_surface",
        }
    }

    /// Read-only operations answer with metadata and never store a shape
    pub fn is_query(&self) -> bool {
        matches!(self, Operation::QuerySurface { .. })
    }

    /// Names of previously created shapes this operation reads
    pub fn referenced_shapes(&self) -> Vec<&str> {
        match self {
            Operation::MakeBox { .. }
            | Operation::MakeCylinder { .. }
            | Operation::MakeSphere { .. }
            | Operation::MakeLine { .. }
            | Operation::MakeCircle { .. } => Vec::new(),
            Operation::Translate { shape, .. }
            | Operation::Rotate { shape, .. }
            | Operation::Copy { shape }
            | Operation::Fillet { shape, .. }
            | Operation::Offset { shape, .. }
            | Operation::Remove { shape }
            | Operation::QuerySurface { shape, .. } => vec![shape.as_str()],
            Operation::Compound { shapes } | Operation::Fuse { shapes } => {
                shapes.iter().map(String::as_str).collect()
            }
            Operation::Cut { target, tools } => std::iter::once(target.as_str())
                .chain(tools.iter().map(String::as_str))
                .collect(),
        }
    }
}

// ============================================================================
// Mesh records
// ============================================================================

/// Triangulation of one topological face.
///
/// Indices in `tri_indexes` are local to this face. Positions and normals are
/// already in the shape's placement space.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FaceRecord {
    /// 3 floats per node
    pub vertex_coord: Vec<f64>,
    /// 2 floats per node, atlas space after packing; empty when the surface
    /// has no parametric coordinates
    pub uv_coord: Vec<f64>,
    /// 3 floats per node
    pub normal_coord: Vec<f64>,
    pub tri_indexes: Vec<u32>,
    pub number_of_triangles: usize,
    /// Ordinal in the kernel's face traversal order
    pub face_index: usize,
    pub is_planar: bool,
    /// Centroid of the face's nodes
    pub average: [f64; 3],
    /// Raw parametric bounds `[u_min, u_max, v_min, v_max]`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uv_bounds: Option<[f64; 4]>,
}

impl FaceRecord {
    pub fn node_count(&self) -> usize {
        self.vertex_coord.len() / 3
    }

    pub fn has_uvs(&self) -> bool {
        !self.uv_coord.is_empty()
    }

    /// Local index triples
    pub fn triangles(&self) -> impl Iterator<Item = [u32; 3]> + '_ {
        self.tri_indexes.chunks_exact(3).map(|t| [t[0], t[1], t[2]])
    }

    pub fn position(&self, node: usize) -> [f64; 3] {
        let b = node * 3;
        [
            self.vertex_coord[b],
            self.vertex_coord[b + 1],
            self.vertex_coord[b + 2],
        ]
    }

    pub fn normal(&self, node: usize) -> [f64; 3] {
        let b = node * 3;
        [
            self.normal_coord[b],
            self.normal_coord[b + 1],
            self.normal_coord[b + 2],
        ]
    }
}

/// Polyline tracing one topological edge.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeRecord {
    /// 3 floats per point
    pub vertex_coord: Vec<f64>,
    /// Identity of the underlying edge, shared by every fragment tracing it
    pub edge_index: u32,
}

impl EdgeRecord {
    pub fn point_count(&self) -> usize {
        self.vertex_coord.len() / 3
    }
}

/// Extraction result: face records and edge records.
///
/// Serialized as a two-element array `[faces, edges]`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ShapeMesh {
    pub faces: Vec<FaceRecord>,
    pub edges: Vec<EdgeRecord>,
}

impl ShapeMesh {
    pub fn triangle_count(&self) -> usize {
        self.faces.iter().map(|f| f.number_of_triangles).sum()
    }

    pub fn vertex_count(&self) -> usize {
        self.faces.iter().map(FaceRecord::node_count).sum()
    }
}

impl Serialize for ShapeMesh {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        (&self.faces, &self.edges).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ShapeMesh {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let (faces, edges) = <(Vec<FaceRecord>, Vec<EdgeRecord>)>::deserialize(deserializer)?;
        Ok(Self { faces, edges })
    }
}

// ============================================================================
// Surface queries
// ============================================================================

/// Geometric type of a face's underlying surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SurfaceKind {
    Plane,
    Cylinder,
    Cone,
    Sphere,
    Torus,
    BSpline,
    Other,
}

/// Answer to [`Operation::QuerySurface`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurfaceInfo {
    /// Exact surface point at the queried parameters
    pub point: [f64; 3],
    pub face_type: SurfaceKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub normal: Option<[f64; 3]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tangent_u: Option<[f64; 3]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tangent_v: Option<[f64; 3]>,
    /// 3x3 samples over the uv bounds (min/mid/max), then the uv origin
    pub grid: Vec<[f64; 3]>,
    /// Parameters of the first nine `grid` samples
    pub uvs: Vec<[f64; 2]>,
}

// ============================================================================
// Worker messages
// ============================================================================

/// Body of an `execute` request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecuteRequest {
    /// Result name; successful shapes are stored under it
    pub name: ShapeName,
    #[serde(default = "default_version")]
    pub version: u32,
    pub operation: Operation,
}

impl ExecuteRequest {
    pub fn new(name: impl Into<ShapeName>, operation: Operation) -> Self {
        Self {
            name: name.into(),
            version: PROTOCOL_VERSION,
            operation,
        }
    }
}

/// Message sent from the interactive thread to the worker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum WorkerRequest {
    Execute(ExecuteRequest),
}

impl WorkerRequest {
    pub fn execute(name: impl Into<ShapeName>, operation: Operation) -> Self {
        WorkerRequest::Execute(ExecuteRequest::new(name, operation))
    }

    pub fn name(&self) -> &str {
        match self {
            WorkerRequest::Execute(req) => &req.name,
        }
    }
}

/// Successful result of an `execute` request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResponsePayload {
    Mesh(ShapeMesh),
    Surface(SurfaceInfo),
}

/// Body of an `execute` response; `payload` is null on failure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecuteResponse {
    pub name: ShapeName,
    pub payload: Option<ResponsePayload>,
}

impl ExecuteResponse {
    pub fn failed(name: impl Into<ShapeName>) -> Self {
        Self {
            name: name.into(),
            payload: None,
        }
    }

    pub fn mesh(&self) -> Option<&ShapeMesh> {
        match &self.payload {
            Some(ResponsePayload::Mesh(mesh)) => Some(mesh),
            _ => None,
        }
    }

    pub fn surface(&self) -> Option<&SurfaceInfo> {
        match &self.payload {
            Some(ResponsePayload::Surface(info)) => Some(info),
            _ => None,
        }
    }
}

/// Message sent from the worker to the interactive thread
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum WorkerResponse {
    /// Sent once, after the kernel finished loading
    StartupCallback,
    Execute(ExecuteResponse),
    /// Human-readable failure description for the UI
    Error(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip<T: Serialize + for<'de> Deserialize<'de> + PartialEq + std::fmt::Debug>(val: &T) {
        let json = serde_json::to_string(val).expect("serialize");
        let back: T = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(*val, back);
    }

    fn unit_square_face() -> FaceRecord {
        FaceRecord {
            vertex_coord: vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0, 0.0],
            uv_coord: vec![0.0, 0.0, 1.0, 0.0, 1.0, 1.0, 0.0, 1.0],
            normal_coord: vec![0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0],
            tri_indexes: vec![0, 1, 2, 0, 2, 3],
            number_of_triangles: 2,
            face_index: 0,
            is_planar: true,
            average: [0.5, 0.5, 0.0],
            uv_bounds: Some([0.0, 1.0, 0.0, 1.0]),
        }
    }

    #[test]
    fn test_operation_tag() {
        let op = Operation::MakeBox {
            origin: [0.0; 3],
            size: [1.0; 3],
        };
        let json = serde_json::to_string(&op).unwrap();
        assert!(json.contains(r#""op":"make_box""#));
        assert_eq!(op.kind(), "make_box");
        roundtrip(&op);
    }

    #[test]
    fn test_rotate_origin_defaults() {
        let json = r#"{"op":"rotate","shape":"a","axis":[0,0,1],"degrees":90}"#;
        let op: Operation = serde_json::from_str(json).unwrap();
        match op {
            Operation::Rotate { origin, .. } => assert_eq!(origin, [0.0; 3]),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_referenced_shapes() {
        let op = Operation::Cut {
            target: "a".into(),
            tools: vec!["b".into(), "c".into()],
        };
        assert_eq!(op.referenced_shapes(), vec!["a", "b", "c"]);
        assert!(Operation::MakeSphere {
            center: [0.0; 3],
            radius: 1.0
        }
        .referenced_shapes()
        .is_empty());
    }

    #[test]
    fn test_face_record_camel_case() {
        let json = serde_json::to_string(&unit_square_face()).unwrap();
        assert!(json.contains(r#""vertexCoord""#));
        assert!(json.contains(r#""triIndexes""#));
        assert!(json.contains(r#""isPlanar":true"#));
        assert!(json.contains(r#""uvBounds""#));
    }

    #[test]
    fn test_face_record_accessors() {
        let face = unit_square_face();
        assert_eq!(face.node_count(), 4);
        assert!(face.has_uvs());
        assert_eq!(face.triangles().collect::<Vec<_>>(), vec![[0, 1, 2], [0, 2, 3]]);
        assert_eq!(face.position(2), [1.0, 1.0, 0.0]);
        assert_eq!(face.normal(3), [0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_shape_mesh_is_two_element_array() {
        let mesh = ShapeMesh {
            faces: vec![unit_square_face()],
            edges: vec![EdgeRecord {
                vertex_coord: vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0],
                edge_index: 3,
            }],
        };
        let value = serde_json::to_value(&mesh).unwrap();
        let arr = value.as_array().expect("array");
        assert_eq!(arr.len(), 2);
        assert_eq!(arr[1][0]["edgeIndex"], 3);
        assert_eq!(mesh.triangle_count(), 2);
        assert_eq!(mesh.vertex_count(), 4);
        roundtrip(&mesh);
    }

    #[test]
    fn test_request_envelope() {
        let req = WorkerRequest::execute(
            "Box #1",
            Operation::MakeBox {
                origin: [0.0; 3],
                size: [1.0, 2.0, 3.0],
            },
        );
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(value["type"], "execute");
        assert_eq!(value["payload"]["name"], "Box #1");
        assert_eq!(value["payload"]["version"], PROTOCOL_VERSION);
        assert_eq!(value["payload"]["operation"]["op"], "make_box");
        assert_eq!(req.name(), "Box #1");
    }

    #[test]
    fn test_request_version_defaults() {
        let json = r#"{"type":"execute","payload":{"name":"s","operation":{"op":"make_sphere","center":[0,0,0],"radius":1}}}"#;
        let req: WorkerRequest = serde_json::from_str(json).unwrap();
        let WorkerRequest::Execute(body) = req;
        assert_eq!(body.version, PROTOCOL_VERSION);
    }

    #[test]
    fn test_startup_callback_shape() {
        let json = serde_json::to_string(&WorkerResponse::StartupCallback).unwrap();
        assert_eq!(json, r#"{"type":"startupCallback"}"#);
        roundtrip(&WorkerResponse::StartupCallback);
    }

    #[test]
    fn test_failed_response_has_null_payload() {
        let resp = WorkerResponse::Execute(ExecuteResponse::failed("x"));
        let value = serde_json::to_value(&resp).unwrap();
        assert_eq!(value["type"], "execute");
        assert!(value["payload"]["payload"].is_null());
        roundtrip(&resp);
    }

    #[test]
    fn test_untagged_payload_variants() {
        let surface = ExecuteResponse {
            name: "SurfaceQuery".into(),
            payload: Some(ResponsePayload::Surface(SurfaceInfo {
                point: [1.0, 2.0, 3.0],
                face_type: SurfaceKind::Plane,
                normal: Some([0.0, 0.0, 1.0]),
                tangent_u: None,
                tangent_v: None,
                grid: vec![[0.0; 3]; 10],
                uvs: vec![[0.0; 2]; 9],
            })),
        };
        roundtrip(&surface);
        assert!(surface.surface().is_some());
        assert!(surface.mesh().is_none());

        let mesh = ExecuteResponse {
            name: "m".into(),
            payload: Some(ResponsePayload::Mesh(ShapeMesh::default())),
        };
        roundtrip(&mesh);
        assert!(mesh.mesh().is_some());
    }

    #[test]
    fn test_error_message() {
        let resp = WorkerResponse::Error("Shape could not be meshed".into());
        let value = serde_json::to_value(&resp).unwrap();
        assert_eq!(value["type"], "error");
        assert_eq!(value["payload"], "Shape could not be meshed");
    }
}
