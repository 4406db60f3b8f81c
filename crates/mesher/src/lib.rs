// Library crate: kernel seam, extraction pipeline and worker, shared by the
// CLI binary, the wasm bridge and the integration tests.

pub mod build;
pub mod error;
pub mod fixtures;
pub mod harness;
pub mod kernel;
pub mod settings;
pub mod validation;
pub mod viewport;
pub mod worker;

pub use error::{MeshError, Result};
pub use settings::MesherSettings;
