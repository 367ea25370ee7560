use nalgebra as na;
use serde_derive::{Deserialize, Serialize};
use std::fmt;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub const ALL: [Side; 2] = [Side::Left, Side::Right];

    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            Side::Left => "Left",
            Side::Right => "Right",
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Joint {
    Head,
    ShoulderLeft,
    ShoulderRight,
    ElbowLeft,
    ElbowRight,
    WristLeft,
    WristRight,
}

impl Joint {
    /// Order in which seed points are accepted by `Skeleton::set_point`.
    pub const SEED_ORDER: [Joint; 7] = [
        Joint::Head,
        Joint::ShoulderLeft,
        Joint::ShoulderRight,
        Joint::ElbowLeft,
        Joint::ElbowRight,
        Joint::WristLeft,
        Joint::WristRight,
    ];

    /// Joints owning a motion filter, in persisted column order.
    pub const TRACKED: [Joint; 4] = [
        Joint::ElbowLeft,
        Joint::ElbowRight,
        Joint::WristLeft,
        Joint::WristRight,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Joint::Head => "head",
            Joint::ShoulderLeft => "shoulderLeft",
            Joint::ShoulderRight => "shoulderRight",
            Joint::ElbowLeft => "elbowLeft",
            Joint::ElbowRight => "elbowRight",
            Joint::WristLeft => "wristLeft",
            Joint::WristRight => "wristRight",
        }
    }

    pub fn from_name(name: &str) -> Option<Joint> {
        Self::SEED_ORDER.iter().copied().find(|j| j.name() == name)
    }

    /// Joint at `index` of the {shoulder, elbow, wrist} chain on `side`.
    pub fn chain(side: Side, index: usize) -> Option<Joint> {
        match (side, index) {
            (Side::Left, 0) => Some(Joint::ShoulderLeft),
            (Side::Left, 1) => Some(Joint::ElbowLeft),
            (Side::Left, 2) => Some(Joint::WristLeft),
            (Side::Right, 0) => Some(Joint::ShoulderRight),
            (Side::Right, 1) => Some(Joint::ElbowRight),
            (Side::Right, 2) => Some(Joint::WristRight),
            _ => None,
        }
    }

    pub fn side(&self) -> Option<Side> {
        match self {
            Joint::Head => None,
            Joint::ShoulderLeft | Joint::ElbowLeft | Joint::WristLeft => Some(Side::Left),
            Joint::ShoulderRight | Joint::ElbowRight | Joint::WristRight => Some(Side::Right),
        }
    }

    pub fn chain_index(&self) -> Option<usize> {
        match self {
            Joint::Head => None,
            Joint::ShoulderLeft | Joint::ShoulderRight => Some(0),
            Joint::ElbowLeft | Joint::ElbowRight => Some(1),
            Joint::WristLeft | Joint::WristRight => Some(2),
        }
    }

    /// The segment whose motion filter moves this joint.
    pub fn segment(&self) -> Option<Segment> {
        let side = self.side()?;

        match self.chain_index()? {
            1 => Some(Segment::upper(side)),
            2 => Some(Segment::lower(side)),
            _ => None,
        }
    }

    #[inline]
    pub(crate) fn tracked_index(&self) -> Option<usize> {
        Self::TRACKED.iter().position(|j| j == self)
    }

    #[inline]
    pub(crate) fn seed_index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for Joint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A limb piece between an anchor joint and the joint it moves.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Segment {
    UpperLeft,
    LowerLeft,
    UpperRight,
    LowerRight,
}

impl Segment {
    /// Fitting order: each side's upper arm before its forearm.
    pub const ALL: [Segment; 4] = [
        Segment::UpperLeft,
        Segment::LowerLeft,
        Segment::UpperRight,
        Segment::LowerRight,
    ];

    #[inline]
    pub fn upper(side: Side) -> Segment {
        match side {
            Side::Left => Segment::UpperLeft,
            Side::Right => Segment::UpperRight,
        }
    }

    #[inline]
    pub fn lower(side: Side) -> Segment {
        match side {
            Side::Left => Segment::LowerLeft,
            Side::Right => Segment::LowerRight,
        }
    }

    pub fn side(&self) -> Side {
        match self {
            Segment::UpperLeft | Segment::LowerLeft => Side::Left,
            Segment::UpperRight | Segment::LowerRight => Side::Right,
        }
    }

    #[inline]
    pub fn is_upper(&self) -> bool {
        matches!(self, Segment::UpperLeft | Segment::UpperRight)
    }

    pub fn anchor(&self) -> Joint {
        match self {
            Segment::UpperLeft => Joint::ShoulderLeft,
            Segment::UpperRight => Joint::ShoulderRight,
            Segment::LowerLeft => Joint::ElbowLeft,
            Segment::LowerRight => Joint::ElbowRight,
        }
    }

    pub fn moving(&self) -> Joint {
        match self {
            Segment::UpperLeft => Joint::ElbowLeft,
            Segment::UpperRight => Joint::ElbowRight,
            Segment::LowerLeft => Joint::WristLeft,
            Segment::LowerRight => Joint::WristRight,
        }
    }

    /// Joint carried along by this segment's rotation without being observed.
    pub fn dependent(&self) -> Option<Joint> {
        match self {
            Segment::UpperLeft => Some(Joint::WristLeft),
            Segment::UpperRight => Some(Joint::WristRight),
            Segment::LowerLeft | Segment::LowerRight => None,
        }
    }

    #[inline]
    pub(crate) fn index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.anchor(), self.moving())
    }
}

/// Filtered state of one joint at one frame.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct JointState {
    /// World-frame position
    pub position: na::Point3<f64>,

    /// (alpha, beta): azimuth and elevation of the joint around its anchor
    pub angles: na::Vector2<f64>,

    /// Angular velocity per frame for (alpha, beta)
    pub velocity: na::Vector2<f64>,
}

impl JointState {
    #[inline]
    pub fn new(
        position: na::Point3<f64>,
        angles: na::Vector2<f64>,
        velocity: na::Vector2<f64>,
    ) -> Self {
        Self {
            position,
            angles,
            velocity,
        }
    }

    /// Position (3), angles (2), velocity (2) as written to history files.
    pub fn to_row(&self) -> [f64; 7] {
        [
            self.position.x,
            self.position.y,
            self.position.z,
            self.angles.x,
            self.angles.y,
            self.velocity.x,
            self.velocity.y,
        ]
    }

    pub fn from_row(row: &[f64; 7]) -> Self {
        Self {
            position: na::Point3::new(row[0], row[1], row[2]),
            angles: na::Vector2::new(row[3], row[4]),
            velocity: na::Vector2::new(row[5], row[6]),
        }
    }
}

/// States of all tracked joints at one frame, indexed by `Joint::TRACKED`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct ArmStates([JointState; 4]);

impl ArmStates {
    #[inline]
    pub fn new(states: [JointState; 4]) -> Self {
        Self(states)
    }

    #[inline]
    pub fn get(&self, joint: Joint) -> Option<&JointState> {
        self.0.get(joint.tracked_index()?)
    }

    #[inline]
    pub(crate) fn set(&mut self, joint: Joint, state: JointState) {
        if let Some(idx) = joint.tracked_index() {
            self.0[idx] = state;
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Joint, &JointState)> {
        Joint::TRACKED.iter().copied().zip(self.0.iter())
    }
}
