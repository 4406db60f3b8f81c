//! Shape to mesh pipeline.
//!
//! MeshExtractor walks the kernel's faces and edges, AtlasPacker lays every
//! face's UV island into one shared atlas, and the assembler concatenates the
//! face records into renderable buffers.

pub mod assembler;
pub mod atlas;
pub mod mesh_extraction;
pub mod operations;
pub mod query;
pub mod session;

pub use assembler::{assemble, assemble_edges};
pub use mesh_extraction::{EdgeKey, Extraction, ExtractionStats, MeshExtractor, TriangulationGuard};
pub use session::KernelSession;

use shared::ShapeMesh;

use crate::error::Result;
use crate::kernel::Kernel;
use crate::settings::MesherSettings;

/// Extracts `shape` and packs its face UVs into the shared atlas.
pub fn shape_to_mesh<K: Kernel>(
    extractor: &mut MeshExtractor,
    kernel: &K,
    shape: &K::Shape,
    max_deviation: f64,
    settings: &MesherSettings,
) -> Result<(ShapeMesh, ExtractionStats)> {
    let Extraction {
        mut mesh,
        mut uv_boxes,
        stats,
    } = extractor.extract(kernel, shape, max_deviation, settings)?;
    atlas::pack_faces(&mut mesh.faces, &mut uv_boxes, settings.atlas.uv_padding);
    Ok((mesh, stats))
}
