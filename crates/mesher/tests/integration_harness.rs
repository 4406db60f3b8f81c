//! Integration tests for TestHarness.
//!
//! Tests the headless harness API for driving a kernel session.

use shape_mesher::harness::TestHarness;

#[test]
fn test_harness_create_and_build() {
    let mut h = TestHarness::new();
    let id = h.create_cube(2.0, 3.0, 4.0);

    assert_eq!(h.shape_count(), 1);
    assert!(h.errors().is_empty());

    let v = h.validate_mesh(&id).unwrap();
    let errors = v.validate_all();
    assert!(errors.is_empty(), "Validation errors: {:?}", errors);
    assert!(v.vertex_count() > 0);
    assert_eq!(h.cached_triangulations(), 0);
}

#[test]
fn test_harness_translate_keeps_source() {
    let mut h = TestHarness::new();
    let a = h.create_cube(1.0, 1.0, 1.0);
    let b = h.translate(&a, [5.0, 0.0, 0.0]);
    assert_eq!(h.shape_count(), 2);

    let moved = h.validate_mesh(&b).unwrap().aabb().unwrap();
    assert!((moved.min.x - 5.0).abs() < 1e-5);
    let original = h.validate_mesh(&a).unwrap().aabb().unwrap();
    assert!(original.min.x.abs() < 1e-5);
}

#[test]
fn test_harness_compound_counts_faces() {
    let mut h = TestHarness::new();
    let a = h.create_cube(1.0, 1.0, 1.0);
    let b = h.create_cylinder(0.5, 1.0);
    let both = h.compound(&[&a, &b]);

    let mesh = h.last_mesh(&both).unwrap();
    assert_eq!(mesh.faces.len(), 9);
    let v = h.validate_mesh(&both).unwrap();
    assert!(v.overlapping_islands().is_empty());
}

#[test]
fn test_harness_remove() {
    let mut h = TestHarness::new();
    let a = h.create_cube(1.0, 1.0, 1.0);
    h.create_sphere(1.0);
    assert_eq!(h.shape_count(), 2);

    h.remove(&a);
    assert_eq!(h.shape_count(), 1);
    assert!(!h.has_shape(&a));

    // Removing twice is harmless
    h.remove(&a);
    assert_eq!(h.shape_count(), 1);
}

#[test]
fn test_harness_query_face() {
    let mut h = TestHarness::new();
    let cube = h.create_cube(2.0, 2.0, 2.0);

    let info = h.query(&cube, 1, 1.0, 1.0).unwrap();
    assert_eq!(info.point, [1.0, 1.0, 2.0]);
    assert_eq!(info.normal, Some([0.0, 0.0, 1.0]));
    // Grid corners follow the face's own parameter bounds
    assert_eq!(info.grid[0], [0.0, 0.0, 2.0]);
    assert_eq!(info.grid[8], [2.0, 2.0, 2.0]);

    assert!(h.query(&cube, 42, 0.0, 0.0).is_none());
    assert_eq!(h.shape_count(), 1);
}

#[test]
fn test_harness_errors_do_not_break_session() {
    let mut h = TestHarness::new();
    let bad = h.create_cube(1.0, 0.0, 1.0);
    assert!(h.errors().contains_key(&bad));
    assert!(!h.has_shape(&bad));

    let good = h.create_cube(1.0, 1.0, 1.0);
    assert!(h.has_shape(&good));
    assert!(!h.errors().contains_key(&good));
    assert_eq!(h.last_stats().map(|s| s.unique_edges), Some(12));
}

#[test]
fn test_harness_edge_geometry() {
    let mut h = TestHarness::new();
    let cube = h.create_cube(1.0, 1.0, 1.0);
    let edges = h.edge_geometry(&cube).unwrap();
    assert_eq!(edges.unique_edge_count(), 12);
}
