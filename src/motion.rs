use crate::math::{angles_of, from_angles, wrap_angle, wrap_angles};
use log::debug;
use nalgebra as na;
use num_traits::Float;

/// Default bound on the per-frame angular change of either axis.
pub const MAX_VELOCITY_DEG: f64 = 80.0;

/// Angular motion model of a joint rotating about its anchor at a fixed radius.
///
/// The state is the (azimuth, elevation) pair of the joint as seen from the
/// anchor, plus an angular velocity per frame. Observations are reconciled
/// with the state by clamping the observed angular step to `v_max` and
/// averaging it with the previous velocity.
#[derive(Debug, Clone)]
pub struct MotionFilter {
    state: na::Vector2<f64>,
    velocity: na::Vector2<f64>,
    radius: f64,
    v_max: na::Vector2<f64>,
    saturations: u64,
}

impl MotionFilter {
    pub fn new(joint: na::Point3<f64>, anchor: na::Point3<f64>, radius: f64) -> Self {
        Self::with_max_velocity(joint, anchor, radius, MAX_VELOCITY_DEG)
    }

    pub fn with_max_velocity(
        joint: na::Point3<f64>,
        anchor: na::Point3<f64>,
        radius: f64,
        max_velocity_deg: f64,
    ) -> Self {
        let v_max = Float::to_radians(max_velocity_deg);

        Self {
            state: angles_of(&(joint - anchor), na::Vector2::zeros()),
            velocity: na::Vector2::zeros(),
            radius,
            v_max: na::Vector2::new(v_max, v_max),
            saturations: 0,
        }
    }

    #[inline]
    pub fn angles(&self) -> na::Vector2<f64> {
        self.state
    }

    #[inline]
    pub fn velocity(&self) -> na::Vector2<f64> {
        self.velocity
    }

    #[inline]
    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// Number of observations whose angular step had to be clamped.
    #[inline]
    pub fn saturations(&self) -> u64 {
        self.saturations
    }

    /// Overwrites the angular state, e.g. when replaying history.
    pub fn set_state(&mut self, angles: na::Vector2<f64>, velocity: na::Vector2<f64>) {
        self.state = wrap_angles(angles);
        self.velocity = velocity;
    }

    /// Reconciles the observed `point` with the current state and returns
    /// the corrected joint position, always at `radius` from `anchor`.
    pub fn update(&mut self, point: na::Point3<f64>, anchor: na::Point3<f64>) -> na::Point3<f64> {
        let observed = angles_of(&(point - anchor), self.state);
        let mut delta = wrap_angles(observed - self.state);

        for i in 0..2 {
            if Float::abs(delta[i]) >= self.v_max[i] {
                debug!(
                    target: "armtrack::motion",
                    "angular step saturated on axis {}: {:.2} deg clamped to {:.2} deg",
                    i,
                    Float::to_degrees(delta[i]),
                    Float::to_degrees(self.v_max[i]),
                );

                delta[i] = Float::signum(delta[i]) * self.v_max[i];
                self.saturations += 1;
            }
        }

        self.velocity = (delta + self.velocity) / 2.0;
        self.state = wrap_angles(self.state + self.velocity);

        anchor + from_angles(self.state, self.radius)
    }

    /// Position one velocity step ahead of the current state. The state is
    /// left untouched.
    #[inline]
    pub fn predict(&self, anchor: na::Point3<f64>) -> na::Point3<f64> {
        anchor + from_angles(self.state + self.velocity, self.radius)
    }

    /// Rotates `point` about `anchor` by the current velocity, keeping its
    /// own distance from the anchor.
    pub fn project(&self, point: na::Point3<f64>, anchor: na::Point3<f64>) -> na::Point3<f64> {
        let vec = point - anchor;
        let r = vec.norm();

        if r == 0.0 {
            return point;
        }

        let angles = angles_of(&vec, self.state) + self.velocity;
        let angles = na::Vector2::new(wrap_angle(angles.x), angles.y);

        anchor + from_angles(angles, r)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::PI;

    fn on_sphere(anchor: na::Point3<f64>, alpha: f64, beta: f64, r: f64) -> na::Point3<f64> {
        anchor + from_angles(na::Vector2::new(alpha, beta), r)
    }

    #[test]
    fn update_lands_on_sphere() {
        let anchor = na::Point3::new(10.0, -5.0, 900.0);
        let mut mf = MotionFilter::new(anchor + na::Vector3::new(30.0, 0.0, 0.0), anchor, 30.0);

        let observations = [
            na::Vector3::new(80.0, 3.0, -2.0),
            na::Vector3::new(1.0, 1.0, 1.0),
            na::Vector3::new(-400.0, 250.0, 10.0),
            na::Vector3::new(0.0, 0.0, 45.0),
            na::Vector3::new(5.0, -29.0, -3.0),
        ];

        for obs in observations {
            let out = mf.update(anchor + obs, anchor);

            assert_abs_diff_eq!(na::distance(&out, &anchor), 30.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn state_stays_wrapped() {
        let anchor = na::Point3::origin();
        let mut mf = MotionFilter::new(on_sphere(anchor, 3.0, 0.0, 10.0), anchor, 10.0);

        // keep pushing across the +-pi seam in both directions
        for step in 0..40 {
            let alpha = 3.0 + 0.7 * step as f64;
            let beta = if step % 2 == 0 { 1.2 } else { -1.2 };
            mf.update(on_sphere(anchor, alpha, beta, 10.0), anchor);

            let a = mf.angles();
            assert!(a.x > -PI && a.x <= PI, "alpha {} out of range", a.x);
            assert!(a.y > -PI && a.y <= PI, "beta {} out of range", a.y);
        }
    }

    #[test]
    fn saturation_keeps_sign() {
        let anchor = na::Point3::origin();
        let v_max = MAX_VELOCITY_DEG.to_radians();

        let mut mf = MotionFilter::new(on_sphere(anchor, 0.0, 0.0, 10.0), anchor, 10.0);
        mf.update(on_sphere(anchor, -2.5, 0.0, 10.0), anchor);

        assert_eq!(mf.saturations(), 1);
        // applied step is -v_max, averaged with the zero initial velocity
        assert_abs_diff_eq!(mf.velocity().x, -v_max / 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(mf.angles().x, -v_max / 2.0, epsilon = 1e-12);

        let mut mf = MotionFilter::new(on_sphere(anchor, 0.0, 0.0, 10.0), anchor, 10.0);
        mf.update(on_sphere(anchor, 0.0, 1.5, 10.0), anchor);

        assert_eq!(mf.saturations(), 1);
        assert_abs_diff_eq!(mf.velocity().y, v_max / 2.0, epsilon = 1e-12);
    }

    #[test]
    fn step_across_seam_is_short_way_round() {
        let anchor = na::Point3::origin();
        let mut mf = MotionFilter::new(on_sphere(anchor, PI - 0.05, 0.0, 10.0), anchor, 10.0);

        mf.update(on_sphere(anchor, -PI + 0.05, 0.0, 10.0), anchor);

        assert_eq!(mf.saturations(), 0);
        assert_abs_diff_eq!(mf.velocity().x, 0.05, epsilon = 1e-9);
    }

    #[test]
    fn predict_does_not_commit() {
        let anchor = na::Point3::new(0.0, 0.0, 500.0);
        let mut mf = MotionFilter::new(on_sphere(anchor, 0.2, 0.1, 25.0), anchor, 25.0);
        mf.set_state(na::Vector2::new(0.2, 0.1), na::Vector2::new(0.05, -0.02));

        let p1 = mf.predict(anchor);
        let p2 = mf.predict(anchor);

        assert_eq!(p1, p2);
        assert_abs_diff_eq!(p1, on_sphere(anchor, 0.25, 0.08, 25.0), epsilon = 1e-9);
        assert_abs_diff_eq!(mf.angles(), na::Vector2::new(0.2, 0.1), epsilon = 1e-12);
    }

    #[test]
    fn constant_angular_velocity_converges() {
        let anchor = na::Point3::new(5.0, 5.0, 700.0);
        let step = 4.0f64.to_radians();
        let r = 40.0;
        let mut mf = MotionFilter::new(on_sphere(anchor, 0.0, 0.3, r), anchor, r);

        let mut last_error = f64::MAX;
        for frame in 1..=25 {
            let truth = on_sphere(anchor, step * frame as f64, 0.3, r);
            let out = mf.update(truth, anchor);
            last_error = na::distance(&out, &truth);

            let v = mf.velocity();
            assert!(v.x >= 0.0 && v.x <= 2.0 * step, "velocity out of bounds: {}", v.x);
        }

        assert!(last_error < 1e-3, "tracking error {}", last_error);
        assert_abs_diff_eq!(mf.velocity().x, step, epsilon = 1e-4);
    }

    #[test]
    fn feeding_back_prediction_keeps_velocity() {
        let anchor = na::Point3::new(-3.0, 8.0, 800.0);
        let v = na::Vector2::new(3.0f64.to_radians(), -1.0f64.to_radians());
        let mut mf = MotionFilter::new(on_sphere(anchor, 2.9, 0.4, 35.0), anchor, 35.0);
        mf.set_state(na::Vector2::new(2.9, 0.4), v);

        // crosses the +-pi seam on the way
        for _ in 0..12 {
            let before = mf.angles();
            let predicted = mf.predict(anchor);
            let out = mf.update(predicted, anchor);

            assert_abs_diff_eq!(out, predicted, epsilon = 1e-9);
            assert_abs_diff_eq!(mf.velocity(), v, epsilon = 1e-9);
            assert_abs_diff_eq!(mf.angles(), wrap_angles(before + v), epsilon = 1e-9);
        }

        assert_eq!(mf.saturations(), 0);
    }

    #[test]
    fn project_with_zero_velocity_is_identity() {
        let anchor = na::Point3::new(1.0, 2.0, 600.0);
        let mf = MotionFilter::new(on_sphere(anchor, 1.0, 0.2, 20.0), anchor, 20.0);
        let pt = anchor + na::Vector3::new(-12.0, 7.0, 33.0);

        assert_abs_diff_eq!(mf.project(pt, anchor), pt, epsilon = 1e-9);
    }

    #[test]
    fn project_keeps_own_radius() {
        let anchor = na::Point3::origin();
        let mut mf = MotionFilter::new(on_sphere(anchor, 0.0, 0.0, 20.0), anchor, 20.0);
        mf.set_state(na::Vector2::new(0.0, 0.0), na::Vector2::new(0.1, 0.0));

        let pt = on_sphere(anchor, 0.5, 0.0, 45.0);
        let out = mf.project(pt, anchor);

        assert_abs_diff_eq!(na::distance(&out, &anchor), 45.0, epsilon = 1e-9);
        assert_abs_diff_eq!(out, on_sphere(anchor, 0.6, 0.0, 45.0), epsilon = 1e-9);
    }
}
