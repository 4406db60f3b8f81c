//! Integration tests for the extraction pipeline.
//!
//! Tests end-to-end: kernel shape -> shape_to_mesh -> assemble -> validate and pick.

use glam::{DVec3, Vec3};
use shape_mesher::build::{assemble, assemble_edges, shape_to_mesh, MeshExtractor};
use shape_mesher::fixtures;
use shape_mesher::kernel::analytic::{AnalyticKernel, Shape};
use shape_mesher::kernel::Modeler;
use shape_mesher::validation::MeshValidator;
use shape_mesher::viewport::{pick_face, Ray};
use shape_mesher::MesherSettings;
use shared::ShapeMesh;

fn mesh(kernel: &AnalyticKernel, shape: &Shape) -> ShapeMesh {
    let settings = MesherSettings::default();
    shape_to_mesh(&mut MeshExtractor::new(), kernel, shape, 0.1, &settings).unwrap().0
}

fn assert_valid(mesh: &ShapeMesh) {
    let buffers = assemble(&mesh.faces).unwrap();
    let errors = MeshValidator::new(&buffers).validate_all();
    assert!(errors.is_empty(), "Validation errors: {:?}", errors);
}

#[test]
fn test_cube_end_to_end() {
    let kernel = AnalyticKernel::new();
    let cube = kernel.make_box(DVec3::ZERO, DVec3::ONE).unwrap();
    let mesh = mesh(&kernel, &cube);

    let buffers = assemble(&mesh.faces).unwrap();
    let v = MeshValidator::new(&buffers);
    assert!(v.validate_all().is_empty(), "Validation errors: {:?}", v.validate_all());
    assert_eq!(v.vertex_count(), 24);
    assert_eq!(v.triangle_count(), 12);
    assert!(v.assert_dimensions_approx([1.0, 1.0, 1.0], 1e-6));
    assert_eq!(buffers.faces.len(), 6);
    assert_eq!(kernel.cached_triangulations(), 0);
}

#[test]
fn test_face_indices_stay_within_own_vertex_block() {
    let kernel = AnalyticKernel::new();
    let cube = kernel.make_box(DVec3::ZERO, DVec3::ONE).unwrap();
    let mesh = mesh(&kernel, &cube);
    let buffers = assemble(&mesh.faces).unwrap();

    let mut offset = 0u32;
    for (record, meta) in mesh.faces.iter().zip(&buffers.faces) {
        let count = record.node_count() as u32;
        for t in meta.triangles() {
            for v in buffers.triangle(t) {
                assert!((offset..offset + count).contains(&(v as u32)));
            }
        }
        offset += count;
    }
    assert_eq!(offset as usize, buffers.vertex_count());
}

#[test]
fn test_curved_shapes_validate() {
    let kernel = AnalyticKernel::new();
    assert_valid(&mesh(&kernel, &kernel.make_cylinder(DVec3::ZERO, 1.0, 2.0).unwrap()));
    assert_valid(&mesh(&kernel, &kernel.make_sphere(DVec3::ZERO, 1.5).unwrap()));
}

#[test]
fn test_reversed_face_winds_with_its_normal() {
    let kernel = AnalyticKernel::new();
    let cube = kernel.make_box(DVec3::ZERO, DVec3::ONE).unwrap();
    let flipped = kernel.reverse_face(&cube, 1).unwrap();
    let mesh = mesh(&kernel, &flipped);

    let buffers = assemble(&mesh.faces).unwrap();
    assert!(MeshValidator::new(&buffers).inward_triangles().is_empty());
    assert!(buffers.faces[1].normal[2] < 0.0);
}

#[test]
fn test_compound_atlas_is_shared() {
    let kernel = AnalyticKernel::new();
    let parts = [
        kernel.make_box(DVec3::ZERO, DVec3::ONE).unwrap(),
        kernel.make_sphere(DVec3::new(4.0, 0.0, 0.0), 1.0).unwrap(),
        kernel.make_cylinder(DVec3::new(-4.0, 0.0, 0.0), 0.5, 3.0).unwrap(),
    ];
    let shape = kernel.compound(&parts).unwrap();
    let mesh = mesh(&kernel, &shape);

    let buffers = assemble(&mesh.faces).unwrap();
    let v = MeshValidator::new(&buffers);
    assert!(v.are_uvs_in_range());
    assert!(v.overlapping_islands().is_empty());
}

#[test]
fn test_pick_top_face_of_cube() {
    let kernel = AnalyticKernel::new();
    let cube = kernel.make_box(DVec3::ZERO, DVec3::ONE).unwrap();
    let buffers = assemble(&mesh(&kernel, &cube).faces).unwrap();

    let ray = Ray {
        origin: Vec3::new(0.25, 0.5, 5.0),
        direction: Vec3::NEG_Z,
    };
    let hit = pick_face(&ray, &buffers).unwrap();
    assert_eq!(hit.face_index, 1);
    assert!((hit.distance - 4.0).abs() < 1e-5);
    assert!((hit.point - Vec3::new(0.25, 0.5, 1.0)).length() < 1e-5);

    let miss = Ray {
        origin: Vec3::new(3.0, 3.0, 5.0),
        direction: Vec3::NEG_Z,
    };
    assert!(pick_face(&miss, &buffers).is_none());
}

#[test]
fn test_edge_geometry_maps_back_to_edges() {
    let kernel = AnalyticKernel::new();
    let cube = kernel.make_box(DVec3::ZERO, DVec3::ONE).unwrap();
    let edges = assemble_edges(&mesh(&kernel, &cube).edges);

    assert_eq!(edges.unique_edge_count(), 12);
    assert_eq!(edges.segment_count(), 12);
    for vertex in 0..edges.vertex_count() {
        assert!(edges.edge_at_vertex(vertex).is_some());
    }
    // Every cube edge touches four others at its two corners
    assert_eq!(edges.adjacent_edges(0).len(), 4);
}

#[test]
fn test_wire_shape_has_no_buffers_but_edges() {
    let kernel = AnalyticKernel::new();
    let mesh = mesh(&kernel, &fixtures::wire_triangle(&kernel));
    assert!(assemble(&mesh.faces).is_none());
    assert_eq!(assemble_edges(&mesh.edges).unique_edge_count(), 3);
}
