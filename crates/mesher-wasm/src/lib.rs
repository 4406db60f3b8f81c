use wasm_bindgen::prelude::*;

use shape_mesher::build::{assemble, KernelSession};
use shape_mesher::kernel::analytic::AnalyticKernel;
use shape_mesher::MesherSettings;
use shared::{WorkerRequest, WorkerResponse};

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, JsError> {
    serde_json::to_string(value).map_err(|e| JsError::new(&format!("serialize error: {}", e)))
}

/// Kernel session living inside a web worker.
///
/// The JS side posts request JSON in and forwards every returned message to
/// the main thread, which keeps the one-request-in-flight rule.
#[wasm_bindgen]
pub struct WasmWorker {
    session: KernelSession<AnalyticKernel>,
}

#[wasm_bindgen]
impl WasmWorker {
    #[wasm_bindgen(constructor)]
    pub fn new(resolution: Option<f64>) -> WasmWorker {
        let mut settings = MesherSettings::default();
        if let Some(r) = resolution.filter(|r| *r > 0.0) {
            settings = settings.with_resolution(r);
        }
        WasmWorker {
            session: KernelSession::new(AnalyticKernel::new(), settings),
        }
    }

    /// Startup handshake message
    pub fn startup(&self) -> Result<String, JsError> {
        to_json(&self.session.startup())
    }

    /// Handles one request; returns a JSON array of response messages
    #[wasm_bindgen(js_name = handleMessage)]
    pub fn handle_message(&mut self, request_json: &str) -> Result<String, JsError> {
        let request: WorkerRequest =
            serde_json::from_str(request_json).map_err(|e| JsError::new(&e.to_string()))?;

        let responses = self.session.handle(request);
        for response in &responses {
            if let WorkerResponse::Error(msg) = response {
                web_sys::console::error_1(&JsValue::from_str(msg));
            }
        }
        to_json(&responses)
    }

    #[wasm_bindgen(js_name = shapeCount)]
    pub fn shape_count(&self) -> usize {
        self.session.shape_count()
    }
}

/// Concatenates the face records of a mesh into flat render buffers.
///
/// Takes the `[faces, edges]` payload JSON and returns a JSON object with
/// positions, normals, uvs and indices, or null for a face-less mesh.
#[wasm_bindgen(js_name = assembleMesh)]
pub fn assemble_mesh(mesh_json: &str) -> Result<String, JsError> {
    let mesh: shared::ShapeMesh =
        serde_json::from_str(mesh_json).map_err(|e| JsError::new(&e.to_string()))?;

    let Some(buffers) = assemble(&mesh.faces) else {
        return Ok("null".to_string());
    };
    let info = serde_json::json!({
        "positions": buffers.positions,
        "normals": buffers.normals,
        "uvs": buffers.uvs,
        "indices": buffers.indices,
        "faceRanges": buffers.faces.iter().map(|f| [f.start, f.end]).collect::<Vec<_>>(),
    });
    Ok(info.to_string())
}
