use crate::camera::CoordinateTransform;
use crate::config::TrackerConfig;
use crate::error::Error;
use crate::frame::Frame;
use crate::joint::{ArmStates, Joint, JointState, Segment, Side};
use crate::math::line_fit_error;
use crate::motion::MotionFilter;
use crate::window::Window;

use log::{info, trace};
use nalgebra as na;
use ndarray::prelude::*;

/// How a segment's joint was placed during the last fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observation {
    /// A foreground candidate was found and filtered
    Observed,
    /// No candidate in the search window; the prediction was kept
    Predicted,
}

/// Arm joints of one person, seeded interactively and then fitted frame by frame.
///
/// Shoulders and head are fixed anchors. Every elbow and wrist is moved by
/// exactly one `MotionFilter`, owned in a table indexed by `Segment`.
#[derive(Debug, Clone)]
pub struct Skeleton {
    transform: CoordinateTransform,
    config: TrackerConfig,
    positions: [na::Point3<f64>; 7],
    seeded: usize,
    length_up: f64,
    length_bot: f64,
    filters: Option<[MotionFilter; 4]>,
    states: Option<ArmStates>,
    observations: [Observation; 4],
}

impl Skeleton {
    pub fn new(transform: CoordinateTransform, config: TrackerConfig) -> Self {
        Self {
            transform,
            config,
            positions: [na::Point3::origin(); 7],
            seeded: 0,
            length_up: 0.0,
            length_bot: 0.0,
            filters: None,
            states: None,
            observations: [Observation::Predicted; 4],
        }
    }

    #[inline]
    pub fn transform(&self) -> &CoordinateTransform {
        &self.transform
    }

    #[inline]
    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    #[inline]
    pub fn is_initialized(&self) -> bool {
        self.filters.is_some()
    }

    /// Joint the next `set_point` call will seed.
    #[inline]
    pub fn next_seed(&self) -> Option<Joint> {
        Joint::SEED_ORDER.get(self.seeded).copied()
    }

    /// Seeds the next joint in `Joint::SEED_ORDER` with a world point.
    ///
    /// The last point derives the segment lengths (means over both sides)
    /// and creates the motion filters at rest.
    pub fn set_point(&mut self, pt: na::Point3<f64>) -> Result<Joint, Error> {
        let joint = self.next_seed().ok_or(Error::SeedingComplete)?;

        self.positions[joint.seed_index()] = pt;
        self.seeded += 1;

        if self.seeded == Joint::SEED_ORDER.len() {
            self.initialize();
        }

        Ok(joint)
    }

    /// Seeds the next joint from a depth image click.
    pub fn set_pixel(&mut self, px: f64, py: f64, depth: f64) -> Result<Joint, Error> {
        let pt = self.transform.image_to_world(px, py, depth);

        self.set_point(pt)
    }

    fn initialize(&mut self) {
        let dist = |a: Joint, b: Joint| {
            na::distance(&self.positions[a.seed_index()], &self.positions[b.seed_index()])
        };

        let (mut up, mut bot) = (0.0, 0.0);
        for side in Side::ALL {
            up += dist(Segment::upper(side).anchor(), Segment::upper(side).moving());
            bot += dist(Segment::lower(side).anchor(), Segment::lower(side).moving());
        }

        self.length_up = up / 2.0;
        self.length_bot = bot / 2.0;

        let max_velocity = self.config.max_velocity_deg;
        let filters = Segment::ALL.map(|seg| {
            let length = if seg.is_upper() {
                self.length_up
            } else {
                self.length_bot
            };

            MotionFilter::with_max_velocity(
                self.positions[seg.moving().seed_index()],
                self.positions[seg.anchor().seed_index()],
                length,
                max_velocity,
            )
        });

        let states = ArmStates::new(Joint::TRACKED.map(|joint| {
            let filter = joint.segment().map(|seg| &filters[seg.index()]);

            JointState::new(
                self.positions[joint.seed_index()],
                filter.map(|f| f.angles()).unwrap_or(na::Vector2::zeros()),
                filter.map(|f| f.velocity()).unwrap_or(na::Vector2::zeros()),
            )
        }));

        info!(
            target: "armtrack::skeleton",
            "skeleton seeded: upper arm {:.2}, forearm {:.2}",
            self.length_up,
            self.length_bot
        );

        self.filters = Some(filters);
        self.states = Some(states);
    }

    /// Back to the seeding state.
    pub fn reset(&mut self) {
        self.seeded = 0;
        self.filters = None;
        self.states = None;
        self.observations = [Observation::Predicted; 4];
    }

    /// (upper arm, forearm) lengths fixed at seeding.
    #[inline]
    pub fn segment_lengths(&self) -> (f64, f64) {
        (self.length_up, self.length_bot)
    }

    #[inline]
    pub fn position(&self, joint: Joint) -> na::Point3<f64> {
        self.positions[joint.seed_index()]
    }

    #[inline]
    pub fn pixel(&self, joint: Joint) -> (i64, i64) {
        self.transform.world_to_image(&self.position(joint))
    }

    /// Full states of the tracked joints.
    #[inline]
    pub fn states(&self) -> Result<&ArmStates, Error> {
        self.states.as_ref().ok_or(Error::Uninitialized)
    }

    #[inline]
    pub fn state(&self, joint: Joint) -> Option<&JointState> {
        self.states.as_ref()?.get(joint)
    }

    #[inline]
    pub fn filter(&self, segment: Segment) -> Option<&MotionFilter> {
        self.filters.as_ref().map(|f| &f[segment.index()])
    }

    #[inline]
    pub(crate) fn filter_mut(&mut self, segment: Segment) -> Result<&mut MotionFilter, Error> {
        self.filters
            .as_mut()
            .map(|f| &mut f[segment.index()])
            .ok_or(Error::Uninitialized)
    }

    /// Outcome of each segment in the last `fit`, indexed like `Segment::ALL`.
    #[inline]
    pub fn observations(&self) -> &[Observation; 4] {
        &self.observations
    }

    /// Saturated observations over all filters.
    pub fn saturations(&self) -> u64 {
        self.filters
            .as_ref()
            .map(|f| f.iter().map(MotionFilter::saturations).sum())
            .unwrap_or(0)
    }

    /// Overwrites a tracked joint's position and its owning filter's state.
    pub fn set_state(&mut self, joint: Joint, state: JointState) -> Result<(), Error> {
        let segment = joint.segment().ok_or(Error::NotAdjustable(joint))?;

        self.filter_mut(segment)?
            .set_state(state.angles, state.velocity);
        self.place(joint, state)
    }

    /// Writes a joint's full state without touching its filter.
    pub(crate) fn place(&mut self, joint: Joint, state: JointState) -> Result<(), Error> {
        let states = self.states.as_mut().ok_or(Error::Uninitialized)?;

        states.set(joint, state);
        self.positions[joint.seed_index()] = state.position;

        Ok(())
    }

    /// Moves a joint, keeping the angles and velocity of its full state.
    pub(crate) fn carry(&mut self, joint: Joint, position: na::Point3<f64>) -> Result<(), Error> {
        let state = *self.state(joint).ok_or(Error::Uninitialized)?;

        self.place(
            joint,
            JointState {
                position,
                ..state
            },
        )
    }

    /// Tracked joint drawn within the pick radius of a click, wrists first.
    pub fn joint_at(&self, px: i64, py: i64) -> Option<Joint> {
        if !self.is_initialized() {
            return None;
        }

        let r = self.config.pick_radius;

        [
            Joint::WristRight,
            Joint::WristLeft,
            Joint::ElbowRight,
            Joint::ElbowLeft,
        ]
        .into_iter()
        .find(|&joint| {
            let (x, y) = self.pixel(joint);

            (x - px).abs() <= r && (y - py).abs() <= r
        })
    }

    /// Fits every segment to `frame`, upper arm before forearm on each side.
    pub fn fit(&mut self, frame: &Frame) -> Result<ArmStates, Error> {
        if !self.is_initialized() {
            return Err(Error::Uninitialized);
        }

        let cloud = self.transform.point_cloud(frame.depth.view());

        for segment in Segment::ALL {
            let obs = self.fit_segment(segment, frame, cloud.view())?;
            self.observations[segment.index()] = obs;
        }

        self.states().map(|s| *s)
    }

    fn fit_segment(
        &mut self,
        segment: Segment,
        frame: &Frame,
        cloud: ArrayView3<'_, f64>,
    ) -> Result<Observation, Error> {
        let anchor = self.position(segment.anchor());
        let current = self.position(segment.moving());
        let (rows, cols) = frame.dims();
        let cfg = &self.config;

        let filter = self
            .filters
            .as_mut()
            .map(|f| &mut f[segment.index()])
            .ok_or(Error::Uninitialized)?;

        let future = filter.predict(anchor);
        let (x, y) = self.transform.world_to_image(&future);
        let anchor_px = self.transform.world_to_image(&anchor);

        // only pixels in a depth slab around the joint's last position
        let usable = |&(r, c): &(usize, usize)| {
            frame.is_foreground(r, c)
                && (frame.depth[[r, c]] as f64 - current.z).abs() <= cfg.depth_tolerance as f64
        };
        let point = |(r, c): (usize, usize)| {
            na::Point3::new(cloud[[r, c, 0]], cloud[[r, c, 1]], cloud[[r, c, 2]])
        };

        // a prediction on or behind the image plane has no pixel to search
        let candidates: Vec<_> = if future.z <= 0.0 {
            Vec::new()
        } else {
            Window::around(x, y, cfg.candidate_radius)
                .clamp(cols, rows)
                .pixels()
                .filter(usable)
                .map(point)
                .collect()
        };

        let best = if candidates.is_empty() {
            None
        } else {
            let support: Vec<_> = Window::spanning((x, y), anchor_px, cfg.window_margin)
                .clamp(cols, rows)
                .pixels()
                .filter(usable)
                .map(point)
                .collect();

            best_candidate(&anchor, &candidates, &support)
        };

        let (position, obs) = match best {
            Some(pt) => (filter.update(pt, anchor), Observation::Observed),
            None => {
                trace!(
                    target: "armtrack::skeleton",
                    "{}: no foreground near ({}, {}), keeping prediction",
                    segment,
                    x,
                    y
                );

                (future, Observation::Predicted)
            }
        };

        let moved = segment
            .dependent()
            .map(|dep| (dep, filter.project(self.positions[dep.seed_index()], anchor)));

        let state = JointState::new(position, filter.angles(), filter.velocity());

        if let Some((dep, pt)) = moved {
            self.carry(dep, pt)?;
        }

        self.place(segment.moving(), state)?;

        Ok(obs)
    }
}

impl Default for Skeleton {
    fn default() -> Self {
        Self::new(CoordinateTransform::default(), TrackerConfig::default())
    }
}

/// Candidate whose direction from `anchor` best explains the `support` points,
/// i.e. minimal summed squared distance of the support to the anchor-candidate
/// line. The sum is not normalized, so denser support weighs more.
pub fn best_candidate(
    anchor: &na::Point3<f64>,
    candidates: &[na::Point3<f64>],
    support: &[na::Point3<f64>],
) -> Option<na::Point3<f64>> {
    let mut best: Option<(f64, na::Point3<f64>)> = None;

    for c in candidates {
        let score = match line_fit_error(anchor, c, support) {
            Some(score) => score,
            None => continue,
        };

        if best.map_or(true, |(s, _)| score < s) {
            best = Some((score, *c));
        }
    }

    best.map(|(_, c)| c)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::{Calibration, CameraIntrinsics};
    use approx::assert_abs_diff_eq;

    fn transform() -> CoordinateTransform {
        CoordinateTransform::new(Calibration::new(CameraIntrinsics::new(
            500.0, 500.0, 100.0, 100.0, 200, 200,
        )))
    }

    fn pose() -> [na::Point3<f64>; 7] {
        [
            na::Point3::new(0.0, -60.0, 1000.0),
            na::Point3::new(-40.0, -20.0, 1000.0),
            na::Point3::new(40.0, -20.0, 1000.0),
            na::Point3::new(-70.0, 20.0, 1000.0),
            na::Point3::new(70.0, 20.0, 1000.0),
            na::Point3::new(-70.0, 60.0, 1000.0),
            na::Point3::new(70.0, 60.0, 1000.0),
        ]
    }

    fn seeded() -> Skeleton {
        let mut sk = Skeleton::new(transform(), TrackerConfig::default());
        for pt in pose() {
            sk.set_point(pt).unwrap();
        }
        sk
    }

    #[test]
    fn seeding_reproduces_pose() {
        let mut sk = Skeleton::new(transform(), TrackerConfig::default());

        for (joint, pt) in Joint::SEED_ORDER.iter().zip(pose()) {
            assert!(!sk.is_initialized());
            assert_eq!(sk.next_seed(), Some(*joint));
            assert_eq!(sk.set_point(pt).unwrap(), *joint);
        }

        assert!(sk.is_initialized());
        assert!(matches!(
            sk.set_point(na::Point3::origin()),
            Err(Error::SeedingComplete)
        ));

        let truth = pose();
        for (joint, state) in sk.states().unwrap().iter() {
            assert_eq!(state.position, truth[joint.seed_index()]);
            assert_eq!(state.velocity, na::Vector2::zeros());
        }

        let (up, bot) = sk.segment_lengths();
        assert_abs_diff_eq!(up, 50.0, epsilon = 1e-9);
        assert_abs_diff_eq!(bot, 40.0, epsilon = 1e-9);
    }

    #[test]
    fn segment_lengths_are_averaged_over_sides() {
        let mut pts = pose();
        pts[Joint::WristRight.seed_index()] = na::Point3::new(70.0, 80.0, 1000.0);

        let mut sk = Skeleton::new(transform(), TrackerConfig::default());
        for pt in pts {
            sk.set_point(pt).unwrap();
        }

        assert_abs_diff_eq!(sk.segment_lengths().1, 50.0, epsilon = 1e-9);
        assert_abs_diff_eq!(
            sk.filter(Segment::LowerLeft).unwrap().radius(),
            50.0,
            epsilon = 1e-9
        );
    }

    #[test]
    fn uninitialized_access_fails() {
        let mut sk = Skeleton::new(transform(), TrackerConfig::default());
        sk.set_point(na::Point3::new(0.0, 0.0, 1000.0)).unwrap();

        let frame = Frame::unmasked(Array2::from_elem((200, 200), 1000.0));

        assert!(matches!(sk.fit(&frame), Err(Error::Uninitialized)));
        assert!(matches!(sk.states(), Err(Error::Uninitialized)));

        let state = JointState::new(na::Point3::origin(), na::Vector2::zeros(), na::Vector2::zeros());
        assert!(matches!(
            sk.set_state(Joint::ElbowLeft, state),
            Err(Error::Uninitialized)
        ));
    }

    #[test]
    fn empty_mask_keeps_prediction() {
        let mut sk = seeded();
        let v = na::Vector2::new(0.05, 0.0);

        for joint in Joint::TRACKED {
            let mut state = *sk.state(joint).unwrap();
            state.velocity = v;
            sk.set_state(joint, state).unwrap();
        }

        let expected_elbow = sk
            .filter(Segment::UpperLeft)
            .unwrap()
            .predict(sk.position(Joint::ShoulderLeft));

        let frame = Frame::unmasked(Array2::from_elem((200, 200), 1000.0));
        let states = sk.fit(&frame).unwrap();

        assert_eq!(sk.observations(), &[Observation::Predicted; 4]);
        assert_abs_diff_eq!(
            states.get(Joint::ElbowLeft).unwrap().position,
            expected_elbow,
            epsilon = 1e-9
        );

        for (_, state) in states.iter() {
            assert_eq!(state.velocity, v);
        }
    }

    #[test]
    fn best_candidate_follows_the_limb_axis() {
        let anchor = na::Point3::new(0.0, 0.0, 0.0);
        let support: Vec<_> = (1..=20)
            .map(|i| na::Point3::new(i as f64, 0.1 * (i % 2) as f64, 0.0))
            .collect();

        let candidates = [
            na::Point3::new(15.0, 3.0, 0.0),
            na::Point3::new(15.0, 0.0, 0.0),
            na::Point3::new(15.0, -2.0, 0.0),
        ];

        assert_eq!(
            best_candidate(&anchor, &candidates, &support),
            Some(candidates[1])
        );
        assert_eq!(best_candidate(&anchor, &[anchor], &support), None);
        assert_eq!(best_candidate(&anchor, &[], &support), None);
    }

    #[test]
    fn joint_at_picks_within_radius() {
        let sk = seeded();
        let (x, y) = sk.pixel(Joint::WristLeft);

        assert_eq!(sk.joint_at(x + 2, y - 3), Some(Joint::WristLeft));
        assert_eq!(sk.joint_at(x + 4, y), None);

        let (x, y) = sk.pixel(Joint::ElbowRight);
        assert_eq!(sk.joint_at(x, y), Some(Joint::ElbowRight));
    }

    #[test]
    fn prediction_on_image_plane_is_not_searched() {
        let mut sk = Skeleton::new(transform(), TrackerConfig::default());
        for pt in pose() {
            sk.set_point(na::Point3::new(pt.x, pt.y, 50.0)).unwrap();
        }

        // upper arm pointing straight at the camera lands the elbow on z = 0
        let shoulder = sk.position(Joint::ShoulderLeft);
        let toward = na::Vector2::new(std::f64::consts::FRAC_PI_2, -std::f64::consts::FRAC_PI_2);
        let state = JointState::new(
            shoulder + na::Vector3::new(0.0, 0.0, -50.0),
            toward,
            na::Vector2::zeros(),
        );
        sk.set_state(Joint::ElbowLeft, state).unwrap();

        let expected = sk.filter(Segment::UpperLeft).unwrap().predict(shoulder);
        assert_eq!(expected.z, 0.0);

        let frame = Frame::new(
            Array2::from_elem((200, 200), 50.0),
            Array2::from_elem((200, 200), true),
        )
        .unwrap();
        let states = sk.fit(&frame).unwrap();

        assert_eq!(sk.observations()[Segment::UpperLeft.index()], Observation::Predicted);
        assert_eq!(states.get(Joint::ElbowLeft).unwrap().position, expected);
    }

    #[test]
    fn reset_returns_to_seeding() {
        let mut sk = seeded();
        sk.reset();

        assert!(!sk.is_initialized());
        assert_eq!(sk.next_seed(), Some(Joint::Head));
    }
}
