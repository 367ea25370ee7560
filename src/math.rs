use nalgebra as na;
use num_traits::Float;
use std::f64::consts::PI;

/// Wraps an angle into (-pi, pi].
#[inline]
pub fn wrap_angle(a: f64) -> f64 {
    if !a.is_finite() {
        return a;
    }

    let r = a.rem_euclid(2.0 * PI);
    let r = if r > PI { r - 2.0 * PI } else { r };

    if r <= -PI {
        PI
    } else {
        r
    }
}

#[inline]
pub fn wrap_angles(a: na::Vector2<f64>) -> na::Vector2<f64> {
    a.map(wrap_angle)
}

/// Azimuth/elevation of `vec`.
///
/// Azimuth is undefined for a vector along the z axis; in that case the
/// azimuth of `fallback` is kept and the elevation is +-pi/2 by the sign of z.
/// A zero vector yields `fallback` unchanged.
pub fn angles_of(vec: &na::Vector3<f64>, fallback: na::Vector2<f64>) -> na::Vector2<f64> {
    let planar = Float::hypot(vec.x, vec.y);

    if planar == 0.0 {
        if vec.z == 0.0 {
            return fallback;
        }

        return na::Vector2::new(fallback.x, Float::signum(vec.z) * PI / 2.0);
    }

    na::Vector2::new(Float::atan2(vec.y, vec.x), Float::atan2(vec.z, planar))
}

/// Vector of length `r` pointing along azimuth/elevation `angles`.
#[inline]
pub fn from_angles(angles: na::Vector2<f64>, r: f64) -> na::Vector3<f64> {
    let (sa, ca) = Float::sin_cos(angles.x);
    let (sb, cb) = Float::sin_cos(angles.y);

    na::Vector3::new(r * ca * cb, r * sa * cb, r * sb)
}

/// Distance from `pt` to the line through `origin` along `dir`.
#[inline]
pub fn line_distance(pt: &na::Point3<f64>, origin: &na::Point3<f64>, dir: &na::Vector3<f64>) -> f64 {
    (pt - origin).cross(dir).norm() / dir.norm()
}

/// Root of the summed squared distances of `points` to the line through
/// `origin` and `through`. `None` when the two coincide.
pub fn line_fit_error<'a, I>(origin: &na::Point3<f64>, through: &na::Point3<f64>, points: I) -> Option<f64>
where
    I: IntoIterator<Item = &'a na::Point3<f64>>,
{
    let dir = through - origin;

    if dir.norm_squared() == 0.0 {
        return None;
    }

    let sum: f64 = points
        .into_iter()
        .map(|p| {
            let d = line_distance(p, origin, &dir);
            d * d
        })
        .sum();

    Some(sum.sqrt())
}
