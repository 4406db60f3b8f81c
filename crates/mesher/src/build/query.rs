//! Surface lookups for cursor snapping.

use shared::SurfaceInfo;

use crate::error::{MeshError, Result};
use crate::kernel::Kernel;

/// Evaluates face `face_index` of `shape` at raw parameters `(u, v)`.
///
/// `grid` samples the min/mid/max parameters of `uv_bounds` (u-major, 9
/// points) followed by the parameter origin; missing bounds collapse the grid
/// onto the origin. Normal and tangents are left out where the surface is
/// singular.
pub fn query_surface<K: Kernel>(
    kernel: &K,
    shape_name: &str,
    shape: &K::Shape,
    face_index: usize,
    u: f64,
    v: f64,
    uv_bounds: Option<[f64; 4]>,
) -> Result<SurfaceInfo> {
    if kernel.is_null(shape) {
        return Err(MeshError::NullShape);
    }
    let unknown_face = || MeshError::UnknownFace {
        shape: shape_name.to_string(),
        face_index,
    };
    let face = kernel.faces(shape).into_iter().nth(face_index).ok_or_else(unknown_face)?;
    let surface = kernel.surface(&face).ok_or_else(unknown_face)?;

    let [u_min, u_max, v_min, v_max] = uv_bounds.unwrap_or([0.0; 4]);
    let us = [u_min, (u_min + u_max) * 0.5, u_max];
    let vs = [v_min, (v_min + v_max) * 0.5, v_max];

    let mut grid = Vec::with_capacity(10);
    let mut uvs = Vec::with_capacity(9);
    for &gu in &us {
        for &gv in &vs {
            uvs.push([gu, gv]);
            grid.push(surface.value(gu, gv).to_array());
        }
    }
    grid.push(surface.value(0.0, 0.0).to_array());

    let (du, dv) = surface.d1(u, v);
    let tangent = |d: glam::DVec3| d.try_normalize().map(|t| t.to_array());

    Ok(SurfaceInfo {
        point: surface.value(u, v).to_array(),
        face_type: surface.kind(),
        normal: surface.normal(u, v).map(|n| n.to_array()),
        tangent_u: tangent(du),
        tangent_v: tangent(dv),
        grid,
        uvs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::analytic::AnalyticKernel;
    use crate::kernel::Modeler;
    use glam::DVec3;
    use shared::SurfaceKind;

    #[test]
    fn test_query_box_top_face() {
        let kernel = AnalyticKernel::new();
        let shape = kernel.make_box(DVec3::ZERO, DVec3::ONE).unwrap();

        // Face 1 is the top face, parameterized along +X and +Y at z = 1
        let info = query_surface(&kernel, "cube", &shape, 1, 0.25, 0.75, Some([0.0, 1.0, 0.0, 1.0])).unwrap();
        assert_eq!(info.face_type, SurfaceKind::Plane);
        assert_eq!(info.point, [0.25, 0.75, 1.0]);
        assert_eq!(info.normal, Some([0.0, 0.0, 1.0]));
        assert_eq!(info.tangent_u, Some([1.0, 0.0, 0.0]));
        assert_eq!(info.grid.len(), 10);
        assert_eq!(info.uvs.len(), 9);
        assert_eq!(info.uvs[4], [0.5, 0.5]);
        assert_eq!(info.grid[4], [0.5, 0.5, 1.0]);
        assert_eq!(info.grid[9], [0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_query_without_bounds_collapses_grid() {
        let kernel = AnalyticKernel::new();
        let shape = kernel.make_box(DVec3::ZERO, DVec3::ONE).unwrap();
        let info = query_surface(&kernel, "cube", &shape, 1, 0.5, 0.5, None).unwrap();
        assert!(info.grid.iter().all(|p| *p == [0.0, 0.0, 1.0]));
    }

    #[test]
    fn test_query_unknown_face() {
        let kernel = AnalyticKernel::new();
        let shape = kernel.make_box(DVec3::ZERO, DVec3::ONE).unwrap();
        let err = query_surface(&kernel, "cube", &shape, 6, 0.0, 0.0, None).unwrap_err();
        assert!(matches!(err, MeshError::UnknownFace { face_index: 6, .. }));
    }

    #[test]
    fn test_query_sphere_pole_normal() {
        let kernel = AnalyticKernel::new();
        let shape = kernel.make_sphere(DVec3::ZERO, 2.0).unwrap();
        let info = query_surface(&kernel, "ball", &shape, 0, 0.0, std::f64::consts::FRAC_PI_2, None).unwrap();
        assert_eq!(info.face_type, SurfaceKind::Sphere);
        assert!((DVec3::from_array(info.point) - DVec3::new(0.0, 0.0, 2.0)).length() < 1e-9);
        let n = DVec3::from_array(info.normal.unwrap());
        assert!((n - DVec3::Z).length() < 1e-9);
        assert!(info.tangent_v.is_some());
    }
}
