use glam::{Mat4, Vec2, Vec3, Vec4};

use super::mesh::GeometryBuffers;

/// A ray in world space
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    /// Cast a ray through a screen position given the camera's view-projection
    pub fn from_screen(cursor: [f32; 2], view_proj: &Mat4, screen_size: [f32; 2]) -> Self {
        // Screen → NDC
        let ndc_x = cursor[0] / (screen_size[0] * 0.5) - 1.0;
        let ndc_y = 1.0 - cursor[1] / (screen_size[1] * 0.5);

        let vp_inv = view_proj.inverse();
        let near_world = vp_inv * Vec4::new(ndc_x, ndc_y, -1.0, 1.0);
        let far_world = vp_inv * Vec4::new(ndc_x, ndc_y, 1.0, 1.0);

        let near = near_world.truncate() / near_world.w;
        let far = far_world.truncate() / far_world.w;

        Self {
            origin: near,
            direction: (far - near).normalize_or_zero(),
        }
    }

    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    /// Bounds of every vertex in the buffers, None when there are none
    pub fn from_buffers(buffers: &GeometryBuffers) -> Option<Self> {
        let count = buffers.vertex_count();
        if count == 0 {
            return None;
        }

        let mut min = Vec3::splat(f32::MAX);
        let mut max = Vec3::splat(f32::MIN);
        for i in 0..count {
            let p = buffers.position(i);
            min = min.min(p);
            max = max.max(p);
        }
        Some(Self { min, max })
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }
}

/// Ray-AABB intersection using the slab method.
/// Returns the distance along the ray to the nearest hit, or None.
pub fn ray_aabb(ray: &Ray, aabb: &Aabb) -> Option<f32> {
    let inv_dir = Vec3::ONE / ray.direction;

    let t1 = (aabb.min - ray.origin) * inv_dir;
    let t2 = (aabb.max - ray.origin) * inv_dir;

    let tmin = t1.min(t2).max_element();
    let tmax = t1.max(t2).min_element();

    if tmax < 0.0 || tmin > tmax {
        return None;
    }

    Some(if tmin < 0.0 { tmax } else { tmin })
}

/// Möller-Trumbore ray-triangle intersection.
/// Returns `(t, u, v)`: distance along the ray and the barycentric weights of
/// `v1` and `v2`.
pub fn ray_triangle_intersect(ray: &Ray, v0: Vec3, v1: Vec3, v2: Vec3) -> Option<(f32, f32, f32)> {
    const EPSILON: f32 = 1e-7;

    let edge1 = v1 - v0;
    let edge2 = v2 - v0;
    let h = ray.direction.cross(edge2);
    let a = edge1.dot(h);

    // Ray is parallel to triangle
    if a.abs() < EPSILON {
        return None;
    }

    let f = 1.0 / a;
    let s = ray.origin - v0;
    let u = f * s.dot(h);
    if !(0.0..=1.0).contains(&u) {
        return None;
    }

    let q = s.cross(edge1);
    let v = f * ray.direction.dot(q);
    if v < 0.0 || u + v > 1.0 {
        return None;
    }

    let t = f * edge2.dot(q);

    // Intersection is behind ray origin
    if t > EPSILON {
        Some((t, u, v))
    } else {
        None
    }
}

/// Result of picking a face of an assembled mesh
#[derive(Debug, Clone)]
pub struct FaceHit {
    /// Kernel face ordinal from the face metadata
    pub face_index: usize,
    /// Triangle index into `indices / 3`
    pub triangle_index: usize,
    pub distance: f32,
    pub point: Vec3,
    /// Atlas coordinate interpolated at the hit
    pub uv: Vec2,
}

/// Nearest face hit by the ray
pub fn pick_face(ray: &Ray, buffers: &GeometryBuffers) -> Option<FaceHit> {
    let bounds = Aabb::from_buffers(buffers)?;
    ray_aabb(ray, &bounds)?;

    let mut best: Option<(usize, f32, f32, f32)> = None;
    for tri in 0..buffers.triangle_count() {
        let [i0, i1, i2] = buffers.triangle(tri);
        let hit = ray_triangle_intersect(
            ray,
            buffers.position(i0),
            buffers.position(i1),
            buffers.position(i2),
        );
        if let Some((t, u, v)) = hit {
            if best.is_none_or(|(_, bt, _, _)| t < bt) {
                best = Some((tri, t, u, v));
            }
        }
    }

    let (triangle_index, distance, u, v) = best?;
    let face = buffers.face_for_triangle(triangle_index)?;
    let [i0, i1, i2] = buffers.triangle(triangle_index);
    let uv_at = |i: usize| {
        buffers
            .uvs
            .get(i * 2..i * 2 + 2)
            .map_or(Vec2::ZERO, |c| Vec2::new(c[0], c[1]))
    };

    Some(FaceHit {
        face_index: face.index,
        triangle_index,
        distance,
        point: ray.at(distance),
        uv: uv_at(i0) * (1.0 - u - v) + uv_at(i1) * u + uv_at(i2) * v,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::viewport::mesh::FaceMetadata;

    /// Two unit quads: one at z=0 (face 3), one at z=1 (face 5)
    fn stacked_quads() -> GeometryBuffers {
        let mut positions = Vec::new();
        let mut uvs = Vec::new();
        for z in [0.0f32, 1.0] {
            for (x, y) in [(0.0f32, 0.0f32), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)] {
                positions.extend_from_slice(&[x, y, z]);
                uvs.extend_from_slice(&[x * 0.5, y * 0.5]);
            }
        }
        let face = |start, index, z| FaceMetadata {
            start,
            end: start + 2,
            index,
            is_planar: true,
            average: [0.5, 0.5, z],
            normal: [0.0, 0.0, 1.0],
            uv_bounds: None,
        };
        GeometryBuffers {
            normals: vec![0.0; positions.len()],
            colors: vec![0.0; positions.len()],
            positions,
            uvs,
            indices: vec![0, 1, 2, 0, 2, 3, 4, 5, 6, 4, 6, 7],
            faces: vec![face(0, 3, 0.0), face(2, 5, 1.0)],
        }
    }

    #[test]
    fn test_ray_triangle_hit_and_miss() {
        let ray = Ray {
            origin: Vec3::new(0.25, 0.25, 5.0),
            direction: Vec3::NEG_Z,
        };
        let (t, u, v) = ray_triangle_intersect(&ray, Vec3::ZERO, Vec3::X, Vec3::Y).unwrap();
        assert!((t - 5.0).abs() < 1e-5);
        assert!((u - 0.25).abs() < 1e-5);
        assert!((v - 0.25).abs() < 1e-5);

        let away = Ray {
            origin: Vec3::new(0.25, 0.25, 5.0),
            direction: Vec3::Z,
        };
        assert!(ray_triangle_intersect(&away, Vec3::ZERO, Vec3::X, Vec3::Y).is_none());
    }

    #[test]
    fn test_pick_face_nearest_wins() {
        let buffers = stacked_quads();
        let ray = Ray {
            origin: Vec3::new(0.5, 0.25, 10.0),
            direction: Vec3::NEG_Z,
        };
        let hit = pick_face(&ray, &buffers).unwrap();
        assert_eq!(hit.face_index, 5);
        assert!((hit.distance - 9.0).abs() < 1e-4);
        assert!((hit.point.z - 1.0).abs() < 1e-4);
        assert!((hit.uv - Vec2::new(0.25, 0.125)).length() < 1e-4);

        let below = Ray {
            origin: Vec3::new(0.5, 0.25, -10.0),
            direction: Vec3::Z,
        };
        assert_eq!(pick_face(&below, &buffers).unwrap().face_index, 3);
    }

    #[test]
    fn test_pick_face_misses_outside_bounds() {
        let buffers = stacked_quads();
        let ray = Ray {
            origin: Vec3::new(3.0, 3.0, 10.0),
            direction: Vec3::NEG_Z,
        };
        assert!(pick_face(&ray, &buffers).is_none());
        assert!(pick_face(&ray, &GeometryBuffers::default()).is_none());
    }

    #[test]
    fn test_ray_from_screen_center() {
        let ray = Ray::from_screen([100.0, 100.0], &Mat4::IDENTITY, [200.0, 200.0]);
        assert!(ray.origin.x.abs() < 1e-6 && ray.origin.y.abs() < 1e-6);
        assert!((ray.direction - Vec3::Z).length() < 1e-6);
    }
}
