//! Renderer-side buffers: assembled triangle geometry with per-face
//! metadata, the edge overlay, and ray picking over both.

pub mod edge;
pub mod mesh;
pub mod picking;

pub use edge::{EdgeGeometry, EdgeHit, EdgeRange};
pub use mesh::{FaceMetadata, GeometryBuffers};
pub use picking::{pick_face, FaceHit, Ray};
