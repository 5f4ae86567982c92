//! Small vector/quaternion helpers over plain arrays.

pub type Vec3 = [f32; 3];
/// Quaternion (x, y, z, w)
pub type Quat = [f32; 4];

pub const ZERO: Vec3 = [0.0, 0.0, 0.0];
pub const IDENTITY: Quat = [0.0, 0.0, 0.0, 1.0];

const EPS: f32 = 1e-6;

#[inline]
pub fn add(a: Vec3, b: Vec3) -> Vec3 {
    [a[0] + b[0], a[1] + b[1], a[2] + b[2]]
}

#[inline]
pub fn sub(a: Vec3, b: Vec3) -> Vec3 {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

#[inline]
pub fn scale(a: Vec3, s: f32) -> Vec3 {
    [a[0] * s, a[1] * s, a[2] * s]
}

#[inline]
pub fn dot(a: Vec3, b: Vec3) -> f32 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

#[inline]
pub fn cross(a: Vec3, b: Vec3) -> Vec3 {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

#[inline]
pub fn length(a: Vec3) -> f32 {
    dot(a, a).sqrt()
}

#[inline]
pub fn distance(a: Vec3, b: Vec3) -> f32 {
    length(sub(a, b))
}

/// Unit vector, or zero when `a` is (nearly) zero.
#[inline]
pub fn normalize(a: Vec3) -> Vec3 {
    let len = length(a);
    if len <= EPS {
        ZERO
    } else {
        scale(a, 1.0 / len)
    }
}

#[inline]
pub fn lerp(a: Vec3, b: Vec3, t: f32) -> Vec3 {
    [
        a[0] + (b[0] - a[0]) * t,
        a[1] + (b[1] - a[1]) * t,
        a[2] + (b[2] - a[2]) * t,
    ]
}

pub fn normalize_quat(q: Quat) -> Quat {
    let mag = (q[0] * q[0] + q[1] * q[1] + q[2] * q[2] + q[3] * q[3]).sqrt();
    if mag <= EPS {
        IDENTITY
    } else {
        [q[0] / mag, q[1] / mag, q[2] / mag, q[3] / mag]
    }
}

#[inline]
pub fn quat_conjugate(q: Quat) -> Quat {
    [-q[0], -q[1], -q[2], q[3]]
}

pub fn quat_mul(a: Quat, b: Quat) -> Quat {
    [
        a[3] * b[0] + a[0] * b[3] + a[1] * b[2] - a[2] * b[1],
        a[3] * b[1] - a[0] * b[2] + a[1] * b[3] + a[2] * b[0],
        a[3] * b[2] + a[0] * b[1] - a[1] * b[0] + a[2] * b[3],
        a[3] * b[3] - a[0] * b[0] - a[1] * b[1] - a[2] * b[2],
    ]
}

/// Rotation from euler angles in degrees, applied Z, then X, then Y.
pub fn quat_from_euler_degrees(euler: Vec3) -> Quat {
    let half = |deg: f32| (deg.to_radians() * 0.5).sin_cos();
    let (sx, cx) = half(euler[0]);
    let (sy, cy) = half(euler[1]);
    let (sz, cz) = half(euler[2]);
    let qx = [sx, 0.0, 0.0, cx];
    let qy = [0.0, sy, 0.0, cy];
    let qz = [0.0, 0.0, sz, cz];
    quat_mul(quat_mul(qy, qx), qz)
}

/// Rotate `v` by the unit quaternion `q`.
pub fn rotate(q: Quat, v: Vec3) -> Vec3 {
    let u = [q[0], q[1], q[2]];
    let t = scale(cross(u, v), 2.0);
    add(add(v, scale(t, q[3])), cross(u, t))
}

/// Rotation whose forward (+Z) axis points along `forward` and whose up
/// (+Y) axis is as close to `up` as possible. Degenerate input yields
/// identity.
pub fn look_rotation(forward: Vec3, up: Vec3) -> Quat {
    let f = normalize(forward);
    if f == ZERO {
        return IDENTITY;
    }
    let mut r = normalize(cross(up, f));
    if r == ZERO {
        // up is parallel to forward; pick any perpendicular axis.
        let alt = if f[1].abs() < 0.99 { [0.0, 1.0, 0.0] } else { [1.0, 0.0, 0.0] };
        r = normalize(cross(alt, f));
    }
    let u = cross(f, r);
    quat_from_basis(r, u, f)
}

/// Quaternion from an orthonormal basis given as the x, y, z columns.
fn quat_from_basis(x: Vec3, y: Vec3, z: Vec3) -> Quat {
    let (m00, m01, m02) = (x[0], y[0], z[0]);
    let (m10, m11, m12) = (x[1], y[1], z[1]);
    let (m20, m21, m22) = (x[2], y[2], z[2]);
    let trace = m00 + m11 + m22;
    let q = if trace > 0.0 {
        let s = (trace + 1.0).sqrt() * 2.0;
        [(m21 - m12) / s, (m02 - m20) / s, (m10 - m01) / s, 0.25 * s]
    } else if m00 > m11 && m00 > m22 {
        let s = (1.0 + m00 - m11 - m22).sqrt() * 2.0;
        [0.25 * s, (m01 + m10) / s, (m02 + m20) / s, (m21 - m12) / s]
    } else if m11 > m22 {
        let s = (1.0 + m11 - m00 - m22).sqrt() * 2.0;
        [(m01 + m10) / s, 0.25 * s, (m12 + m21) / s, (m02 - m20) / s]
    } else {
        let s = (1.0 + m22 - m00 - m11).sqrt() * 2.0;
        [(m02 + m20) / s, (m12 + m21) / s, 0.25 * s, (m10 - m01) / s]
    };
    normalize_quat(q)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx3(a: Vec3, b: Vec3, eps: f32) {
        for i in 0..3 {
            assert!((a[i] - b[i]).abs() <= eps, "left={a:?} right={b:?}");
        }
    }

    #[test]
    fn look_rotation_maps_forward_axis() {
        let dirs = [[1.0, 0.0, 0.0], [0.0, 0.0, -1.0], [0.3, 0.2, 0.9]];
        for d in dirs {
            let q = look_rotation(d, [0.0, 1.0, 0.0]);
            approx3(rotate(q, [0.0, 0.0, 1.0]), normalize(d), 1e-5);
        }
    }

    #[test]
    fn look_rotation_handles_parallel_up() {
        let q = look_rotation([0.0, 1.0, 0.0], [0.0, 1.0, 0.0]);
        approx3(rotate(q, [0.0, 0.0, 1.0]), [0.0, 1.0, 0.0], 1e-5);
        assert_eq!(look_rotation(ZERO, [0.0, 1.0, 0.0]), IDENTITY);
    }

    #[test]
    fn euler_single_axis_rotates_expected_axis() {
        let q = quat_from_euler_degrees([0.0, 90.0, 0.0]);
        approx3(rotate(q, [0.0, 0.0, 1.0]), [1.0, 0.0, 0.0], 1e-5);
        let q = quat_from_euler_degrees([0.0, 0.0, 90.0]);
        approx3(rotate(q, [1.0, 0.0, 0.0]), [0.0, 1.0, 0.0], 1e-5);
    }

    #[test]
    fn conjugate_undoes_rotation() {
        let q = look_rotation([1.0, 1.0, 0.0], [0.0, 1.0, 0.0]);
        let v = [1.0, 2.0, 3.0];
        approx3(rotate(quat_conjugate(q), rotate(q, v)), v, 1e-5);
        approx3(rotate(quat_mul(quat_conjugate(q), q), v), v, 1e-5);
    }
}
