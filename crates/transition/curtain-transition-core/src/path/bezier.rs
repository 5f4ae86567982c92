//! Cubic bezier chain math over flat point lists.
//!
//! A path is laid out as `anchor, out-tangent, in-tangent, anchor, ...`.
//! Segment `i` uses points `3i, 3i+1, 3i+2, 3i+3` where the last index wraps
//! around, so an open path has `3k+1` points and a looped one `3k`.
//! Evaluation never panics: degenerate input collapses to the nearest valid
//! point.

use crate::math::{self, Quat, Vec3, ZERO};

/// Control points of one segment in storage order:
/// start, start tangent, end tangent, end.
pub type SegmentPoints = [Vec3; 4];

#[inline]
fn wrap(index: usize, len: usize) -> usize {
    index % len
}

/// Number of whole segments described by `points`.
#[inline]
pub fn segment_count(points: &[Vec3]) -> usize {
    points.len() / 3
}

/// The four control points of `segment`. Callers must pass a segment below
/// [`segment_count`].
pub fn segment_points(points: &[Vec3], segment: usize) -> SegmentPoints {
    let i = segment * 3;
    [
        points[i],
        points[i + 1],
        points[i + 2],
        points[wrap(i + 3, points.len())],
    ]
}

/// Position on a cubic segment (Bernstein blend).
#[inline]
pub fn evaluate_segment(start: Vec3, end: Vec3, start_tangent: Vec3, end_tangent: Vec3, t: f32) -> Vec3 {
    let u = 1.0 - t;
    let t2 = t * t;
    let u2 = u * u;
    let a = u2 * u;
    let b = 3.0 * u2 * t;
    let c = 3.0 * u * t2;
    let d = t2 * t;
    [
        a * start[0] + b * start_tangent[0] + c * end_tangent[0] + d * end[0],
        a * start[1] + b * start_tangent[1] + c * end_tangent[1] + d * end[1],
        a * start[2] + b * start_tangent[2] + c * end_tangent[2] + d * end[2],
    ]
}

#[inline]
fn evaluate_points(seg: &SegmentPoints, t: f32) -> Vec3 {
    evaluate_segment(seg[0], seg[3], seg[1], seg[2], t)
}

/// Unit tangent of a cubic segment (derivative direction of the Bernstein
/// blend). Zero when the derivative vanishes.
pub fn tangent(start: Vec3, end: Vec3, start_tangent: Vec3, end_tangent: Vec3, t: f32) -> Vec3 {
    let u = 1.0 - t;
    let ka = -(u * u);
    let kb = u * (u - 2.0 * t);
    let kc = -(t * (t - 2.0 * u));
    let kd = t * t;
    math::normalize([
        ka * start[0] + kb * start_tangent[0] + kc * end_tangent[0] + kd * end[0],
        ka * start[1] + kb * start_tangent[1] + kc * end_tangent[1] + kd * end[1],
        ka * start[2] + kb * start_tangent[2] + kc * end_tangent[2] + kd * end[2],
    ])
}

/// Unit vector perpendicular to the tangent and `up`.
pub fn binormal(start: Vec3, end: Vec3, start_tangent: Vec3, end_tangent: Vec3, up: Vec3, t: f32) -> Vec3 {
    let tan = tangent(start, end, start_tangent, end_tangent, t);
    math::normalize(math::cross(up, tan))
}

/// Unit normal completing the (tangent, binormal, normal) frame.
pub fn normal(start: Vec3, end: Vec3, start_tangent: Vec3, end_tangent: Vec3, up: Vec3, t: f32) -> Vec3 {
    let tan = tangent(start, end, start_tangent, end_tangent, t);
    let bi = binormal(start, end, start_tangent, end_tangent, up, t);
    math::normalize(math::cross(tan, bi))
}

/// Approximate arc length: sum of `samples` chord lengths.
pub fn segment_length(start: Vec3, end: Vec3, start_tangent: Vec3, end_tangent: Vec3, samples: usize) -> f32 {
    let samples = samples.max(1);
    let mut length = 0.0;
    let mut from = evaluate_segment(start, end, start_tangent, end_tangent, 0.0);
    for i in 0..samples {
        let t = (i + 1) as f32 / samples as f32;
        let to = evaluate_segment(start, end, start_tangent, end_tangent, t);
        length += math::distance(from, to);
        from = to;
    }
    length
}

fn points_length(seg: &SegmentPoints, samples: usize) -> f32 {
    segment_length(seg[0], seg[3], seg[1], seg[2], samples)
}

/// Approximate length of the whole chain.
pub fn path_length(points: &[Vec3], samples: usize) -> f32 {
    (0..segment_count(points))
        .map(|i| points_length(&segment_points(points, i), samples))
        .sum()
}

/// Resample the chain into points spaced evenly by arc length,
/// roughly `points_per_segment` per segment. Each segment is walked in
/// `ceil(length * resolution * 10)` steps; overshoot past a spacing
/// boundary carries into the next interval.
pub fn spaced_points(points: &[Vec3], points_per_segment: usize, resolution: f32, samples: usize) -> Vec<Vec3> {
    let Some(&first) = points.first() else {
        return Vec::new();
    };
    let segments = segment_count(points);
    let mut out = vec![first];
    if segments == 0 || points_per_segment == 0 {
        return out;
    }

    let spacing = path_length(points, samples) / segments as f32 / points_per_segment as f32;
    if !(spacing > f32::EPSILON) {
        return out;
    }

    let mut previous = first;
    let mut since_last = 0.0f32;
    for s in 0..segments {
        let seg = segment_points(points, s);
        let divisions = (points_length(&seg, samples) * resolution * 10.0).ceil().max(1.0) as usize;
        for step in 1..=divisions {
            let t = step as f32 / divisions as f32;
            let on_curve = evaluate_points(&seg, t);
            since_last += math::distance(previous, on_curve);
            while since_last >= spacing {
                let overshoot = since_last - spacing;
                let back = math::normalize(math::sub(previous, on_curve));
                let spaced = math::add(on_curve, math::scale(back, overshoot));
                out.push(spaced);
                since_last = overshoot;
                previous = spaced;
            }
            previous = on_curve;
        }
    }
    out
}

/// Segment index and segment-local parameter for a global parameter,
/// weighting segments by length. `None` when `t` falls outside the chain
/// or the chain has no measurable length.
fn locate(points: &[Vec3], t: f32, samples: usize) -> Option<(usize, f32)> {
    let total = path_length(points, samples);
    if !(total > f32::EPSILON) || t < 0.0 {
        return None;
    }
    let mut covered = 0.0f32;
    for i in 0..segment_count(points) {
        let share = points_length(&segment_points(points, i), samples) / total;
        if covered + share > t {
            let local = if share > 0.0 { (t - covered) / share } else { 0.0 };
            return Some((i, local.clamp(0.0, 1.0)));
        }
        covered += share;
    }
    None
}

/// Clamped fallback: first segment start for `t < 0.5`, last segment end
/// otherwise.
fn locate_or_clamp(points: &[Vec3], t: f32, samples: usize) -> (usize, f32) {
    locate(points, t, samples).unwrap_or_else(|| {
        if t < 0.5 {
            (0, 0.0)
        } else {
            (segment_count(points).saturating_sub(1), 1.0)
        }
    })
}

/// Position at global parameter `t` using live cubic evaluation.
pub fn evaluate_cubic_path(points: &[Vec3], t: f32, samples: usize) -> Vec3 {
    if segment_count(points) == 0 {
        return points.first().copied().unwrap_or(ZERO);
    }
    let (segment, local) = locate_or_clamp(points, t, samples);
    evaluate_points(&segment_points(points, segment), local)
}

/// Orientation at global parameter `t`: forward along the tangent, aligned
/// to `up`.
pub fn evaluate_cubic_rotation(points: &[Vec3], up: Vec3, t: f32, samples: usize) -> Quat {
    if segment_count(points) == 0 {
        return math::IDENTITY;
    }
    let (segment, local) = locate_or_clamp(points, t, samples);
    let seg = segment_points(points, segment);
    math::look_rotation(tangent(seg[0], seg[3], seg[1], seg[2], local), up)
}

/// Position on a baked polyline at `t` in [0, 1].
pub fn evaluate_spaced_path(spaced: &[Vec3], t: f32) -> Vec3 {
    match spaced.len() {
        0 => ZERO,
        1 => spaced[0],
        n => {
            let step = 1.0 / (n - 1) as f32;
            let t = t.clamp(0.0, 1.0);
            let i = ((t / step) as usize).min(n - 2);
            let local = ((t - i as f32 * step) / step).clamp(0.0, 1.0);
            math::lerp(spaced[i], spaced[i + 1], local)
        }
    }
}

/// Orientation on a baked polyline: blends the look rotations of the
/// current and next polyline edges. On the last edge of a looped path the
/// next edge is the first one.
pub fn evaluate_spaced_rotation(spaced: &[Vec3], looped: bool, up: Vec3, t: f32) -> Quat {
    let n = spaced.len();
    if n < 2 {
        return math::IDENTITY;
    }
    let step = 1.0 / (n - 1) as f32;
    let t = t.clamp(0.0, 1.0);
    let i = ((t / step) as usize).min(n - 2);

    let current = math::sub(spaced[i + 1], spaced[i]);
    let next = if i + 2 < n {
        math::sub(spaced[i + 2], spaced[i + 1])
    } else if looped {
        math::sub(spaced[1], spaced[0])
    } else {
        current
    };

    let local = ((t - i as f32 * step) / step).clamp(0.0, 1.0);
    curtain_api_core::nlerp_quat(
        math::look_rotation(current, up),
        math::look_rotation(next, up),
        local,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32, eps: f32) {
        assert!((a - b).abs() <= eps, "left={a} right={b} eps={eps}");
    }

    fn straight() -> Vec<Vec3> {
        vec![
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [2.0, 0.0, 0.0],
            [3.0, 0.0, 0.0],
        ]
    }

    #[test]
    fn segment_endpoints_and_midpoint() {
        let p = straight();
        assert_eq!(evaluate_segment(p[0], p[3], p[1], p[2], 0.0), p[0]);
        assert_eq!(evaluate_segment(p[0], p[3], p[1], p[2], 1.0), p[3]);
        approx(evaluate_segment(p[0], p[3], p[1], p[2], 0.5)[0], 1.5, 1e-6);
    }

    #[test]
    fn straight_segment_length_is_exact() {
        approx(path_length(&straight(), 25), 3.0, 1e-4);
    }

    #[test]
    fn looped_segment_wraps_to_first_point() {
        let looped = vec![
            [0.0, 0.0, 0.0],
            [1.0, 1.0, 0.0],
            [2.0, 1.0, 0.0],
            [3.0, 0.0, 0.0],
            [2.0, -1.0, 0.0],
            [1.0, -1.0, 0.0],
        ];
        assert_eq!(segment_count(&looped), 2);
        assert_eq!(segment_points(&looped, 1)[3], looped[0]);
    }

    #[test]
    fn cubic_path_clamps_out_of_range() {
        let p = straight();
        assert_eq!(evaluate_cubic_path(&p, -2.0, 25), p[0]);
        assert_eq!(evaluate_cubic_path(&p, 7.0, 25), p[3]);
        approx(evaluate_cubic_path(&p, 0.5, 25)[0], 1.5, 1e-3);
    }

    #[test]
    fn degenerate_paths_do_not_panic() {
        assert_eq!(evaluate_cubic_path(&[], 0.5, 25), ZERO);
        assert_eq!(evaluate_cubic_path(&[[1.0, 2.0, 3.0]], 0.5, 25), [1.0, 2.0, 3.0]);
        let collapsed = vec![[1.0, 1.0, 1.0]; 4];
        assert_eq!(evaluate_cubic_path(&collapsed, 0.7, 25), [1.0, 1.0, 1.0]);
        assert_eq!(spaced_points(&collapsed, 10, 1.0, 25).len(), 1);
        assert_eq!(evaluate_spaced_path(&[], 0.3), ZERO);
        assert_eq!(evaluate_spaced_rotation(&[ZERO], false, [0.0, 1.0, 0.0], 0.3), math::IDENTITY);
    }

    #[test]
    fn spaced_points_are_evenly_spaced() {
        let p = straight();
        let spaced = spaced_points(&p, 10, 1.0, 25);
        assert!(spaced.len() >= 10 && spaced.len() <= 11, "len={}", spaced.len());
        for pair in spaced.windows(2) {
            approx(math::distance(pair[0], pair[1]), 0.3, 1e-3);
        }
    }

    #[test]
    fn tangent_of_straight_line_points_forward() {
        let p = straight();
        let tan = tangent(p[0], p[3], p[1], p[2], 0.3);
        approx(tan[0], 1.0, 1e-6);
        let q = evaluate_cubic_rotation(&p, [0.0, 1.0, 0.0], 0.3, 25);
        let fwd = math::rotate(q, [0.0, 0.0, 1.0]);
        approx(fwd[0], 1.0, 1e-5);
    }

    #[test]
    fn frame_vectors_are_orthogonal() {
        let p = [[0.0, 0.0, 0.0], [1.0, 2.0, 0.0], [3.0, 2.0, 1.0], [4.0, 0.0, 0.0]];
        let up = [0.0, 1.0, 0.0];
        let tan = tangent(p[0], p[3], p[1], p[2], 0.4);
        let bi = binormal(p[0], p[3], p[1], p[2], up, 0.4);
        let n = normal(p[0], p[3], p[1], p[2], up, 0.4);
        approx(math::dot(tan, bi), 0.0, 1e-5);
        approx(math::dot(tan, n), 0.0, 1e-5);
        approx(math::dot(bi, n), 0.0, 1e-5);
    }
}
