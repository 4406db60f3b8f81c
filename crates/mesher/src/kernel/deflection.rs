//! Polyline sampling of parametric curves.

use glam::DVec3;

/// Recursion limit for adaptive subdivision (at most 2^12 segments)
const MAX_DEPTH: u32 = 12;

/// Adaptive polyline over `[first, last]`.
///
/// A span is split at its parameter midpoint while the midpoint deviates from
/// the chord by more than `curvature_deflection` or the two half-chords turn by
/// more than `angular_deflection` radians. Always returns at least the two end
/// points.
pub fn tangential_deflection(
    value: impl Fn(f64) -> DVec3,
    first: f64,
    last: f64,
    angular_deflection: f64,
    curvature_deflection: f64,
) -> Vec<DVec3> {
    let start = value(first);
    let mut points = vec![start];
    subdivide(
        &value,
        (first, start),
        (last, value(last)),
        angular_deflection.max(f64::EPSILON),
        curvature_deflection.max(f64::EPSILON),
        0,
        &mut points,
    );
    points
}

fn subdivide(
    value: &impl Fn(f64) -> DVec3,
    a: (f64, DVec3),
    b: (f64, DVec3),
    angular: f64,
    deflection: f64,
    depth: u32,
    out: &mut Vec<DVec3>,
) {
    let tm = 0.5 * (a.0 + b.0);
    let pm = value(tm);

    let split = depth < MAX_DEPTH
        && (distance_to_segment(pm, a.1, b.1) > deflection || turn_angle(a.1, pm, b.1) > angular);

    if split {
        subdivide(value, a, (tm, pm), angular, deflection, depth + 1, out);
        subdivide(value, (tm, pm), b, angular, deflection, depth + 1, out);
    } else {
        out.push(b.1);
    }
}

fn distance_to_segment(p: DVec3, a: DVec3, b: DVec3) -> f64 {
    let ab = b - a;
    let len2 = ab.length_squared();
    if len2 <= f64::EPSILON {
        return p.distance(a);
    }
    let t = ((p - a).dot(ab) / len2).clamp(0.0, 1.0);
    p.distance(a + ab * t)
}

fn turn_angle(a: DVec3, m: DVec3, b: DVec3) -> f64 {
    let d0 = m - a;
    let d1 = b - m;
    if d0.length_squared() <= f64::EPSILON || d1.length_squared() <= f64::EPSILON {
        return 0.0;
    }
    d0.angle_between(d1)
}

/// Arclength of `value` over `[first, last]` approximated by summing
/// `segments` equal-parameter chords.
pub fn arc_length(value: impl Fn(f64) -> DVec3, first: f64, last: f64, segments: usize) -> f64 {
    let segments = segments.max(1);
    let step = (last - first) / segments as f64;
    let mut prev = value(first);
    let mut length = 0.0;
    for s in 1..=segments {
        let p = value(first + step * s as f64);
        length += p.distance(prev);
        prev = p;
    }
    length
}
