//! Integration tests for the worker JSON protocol.
//!
//! Tests the full message pipeline: JSON string -> parse -> session -> JSON.

use serde_json::{json, Value};
use shape_mesher::build::KernelSession;
use shape_mesher::kernel::analytic::AnalyticKernel;
use shape_mesher::MesherSettings;
use shared::{WorkerRequest, WorkerResponse};

fn session() -> KernelSession<AnalyticKernel> {
    KernelSession::new(AnalyticKernel::new(), MesherSettings::default().with_resolution(0.1))
}

/// Feed one request as JSON and return the responses as JSON values
fn send(session: &mut KernelSession<AnalyticKernel>, request: Value) -> Vec<Value> {
    let request: WorkerRequest = serde_json::from_value(request).unwrap();
    session
        .handle(request)
        .iter()
        .map(|r| serde_json::to_value(r).unwrap())
        .collect()
}

fn execute(name: &str, operation: Value) -> Value {
    json!({ "type": "execute", "payload": { "name": name, "operation": operation } })
}

#[test]
fn test_startup_message() {
    let s = session();
    let msg = serde_json::to_value(s.startup()).unwrap();
    assert_eq!(msg, json!({ "type": "startupCallback" }));
}

#[test]
fn test_make_box_payload_shape() {
    let mut s = session();
    let out = send(
        &mut s,
        execute("cube", json!({ "op": "make_box", "origin": [0, 0, 0], "size": [1, 1, 1] })),
    );
    assert_eq!(out.len(), 1);
    assert_eq!(out[0]["type"], "execute");
    assert_eq!(out[0]["payload"]["name"], "cube");

    let payload = &out[0]["payload"]["payload"];
    let faces = payload[0].as_array().unwrap();
    let edges = payload[1].as_array().unwrap();
    assert_eq!(faces.len(), 6);
    assert_eq!(edges.len(), 12);

    let top = &faces[1];
    assert_eq!(top["numberOfTriangles"], 2);
    assert_eq!(top["isPlanar"], true);
    let average: [f64; 3] = serde_json::from_value(top["average"].clone()).unwrap();
    for (got, want) in average.iter().zip([0.5, 0.5, 1.0]) {
        assert!((got - want).abs() < 1e-12);
    }
    assert_eq!(top["faceIndex"], 1);
    assert!(edges[0]["edgeIndex"].is_u64());
}

#[test]
fn test_unknown_reference_returns_null_with_error() {
    let mut s = session();
    let out = send(
        &mut s,
        execute("moved", json!({ "op": "translate", "shape": "nothing", "offset": [1, 0, 0] })),
    );
    assert_eq!(out.len(), 2);
    assert_eq!(out[0]["type"], "error");
    assert!(out[0]["payload"].as_str().unwrap().contains("nothing"));
    assert_eq!(out[1]["payload"], json!({ "name": "moved", "payload": null }));
}

#[test]
fn test_version_mismatch_returns_null() {
    let mut s = session();
    let request = json!({
        "type": "execute",
        "payload": {
            "name": "cube",
            "version": 99,
            "operation": { "op": "make_box", "origin": [0, 0, 0], "size": [1, 1, 1] }
        }
    });
    let out = send(&mut s, request);
    assert_eq!(out.last().unwrap()["payload"]["payload"], Value::Null);
    assert_eq!(s.shape_count(), 0);
}

#[test]
fn test_malformed_operation_is_rejected_by_parser() {
    let raw = r#"{"type": "execute", "payload": {"name": "x", "operation": {"op": "make_pyramid"}}}"#;
    assert!(serde_json::from_str::<WorkerRequest>(raw).is_err());
}

#[test]
fn test_query_surface_payload() {
    let mut s = session();
    send(
        &mut s,
        execute("ball", json!({ "op": "make_sphere", "center": [0, 0, 0], "radius": 1.0 })),
    );
    let out = send(
        &mut s,
        execute(
            "snap",
            json!({ "op": "query_surface", "shape": "ball", "face_index": 0, "u": 0.0, "v": 0.0,
                    "uv_bounds": [0.0, 6.283185307179586, -1.5707963267948966, 1.5707963267948966] }),
        ),
    );
    let info = &out[0]["payload"]["payload"];
    assert_eq!(info["faceType"], "sphere");
    assert_eq!(info["grid"].as_array().unwrap().len(), 10);
    assert_eq!(info["uvs"].as_array().unwrap().len(), 9);
    assert!(info["normal"].is_array());

    let parsed: WorkerResponse = serde_json::from_value(out[0].clone()).unwrap();
    match parsed {
        WorkerResponse::Execute(e) => assert!(e.surface().is_some()),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_wire_and_remove_flow() {
    let mut s = session();
    let out = send(
        &mut s,
        execute("ring", json!({ "op": "make_circle", "center": [0, 0, 0], "radius": 2.0 })),
    );
    let payload = &out[0]["payload"]["payload"];
    assert!(payload[0].as_array().unwrap().is_empty());
    assert_eq!(payload[1].as_array().unwrap().len(), 1);

    let out = send(&mut s, execute("ring", json!({ "op": "remove", "shape": "ring" })));
    assert_eq!(out[0]["payload"]["payload"], json!([[], []]));
    assert_eq!(s.shape_count(), 0);
}

#[test]
fn test_unsupported_boolean_is_null() {
    let mut s = session();
    send(
        &mut s,
        execute("a", json!({ "op": "make_box", "origin": [0, 0, 0], "size": [1, 1, 1] })),
    );
    let out = send(&mut s, execute("u", json!({ "op": "fuse", "shapes": ["a", "a"] })));
    assert_eq!(out[0]["type"], "error");
    assert_eq!(out[1]["payload"]["payload"], Value::Null);
    assert_eq!(s.shape_names(), vec!["a"]);
}
