//! Error types for extraction and request handling

use thiserror::Error;

use crate::kernel::KernelError;

#[derive(Debug, Error)]
pub enum MeshError {
    #[error("shape is null")]
    NullShape,
    #[error("face {face_index} has no triangulation")]
    MissingTriangulation { face_index: usize },
    #[error("face {face_index} has an invalid triangulation: {reason}")]
    InvalidTriangulation { face_index: usize, reason: String },
    #[error(transparent)]
    Kernel(#[from] KernelError),
    #[error("unknown shape '{0}'")]
    UnknownShape(String),
    #[error("shape '{shape}' has no face {face_index}")]
    UnknownFace { shape: String, face_index: usize },
    #[error("unsupported protocol version {0}")]
    UnsupportedVersion(u32),
    #[error("kernel panicked: {0}")]
    Panicked(String),
}

pub type Result<T, E = MeshError> = std::result::Result<T, E>;
