use crate::motion::MAX_VELOCITY_DEG;
use serde_derive::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TrackerConfig {
    /// Largest accepted angular step per frame, per axis
    pub max_velocity_deg: f64,

    /// Foreground pixels farther than this from the joint's last depth are ignored
    pub depth_tolerance: f32,

    /// Half size of the candidate window around the predicted pixel
    pub candidate_radius: i64,

    /// Padding of the anchor-to-prediction comparison window
    pub window_margin: i64,

    /// Max pixel offset on either axis for a click to select a joint
    pub pick_radius: i64,
}

impl TrackerConfig {
    pub fn new(max_velocity_deg: f64, depth_tolerance: f32) -> Self {
        Self {
            max_velocity_deg,
            depth_tolerance,
            candidate_radius: 10,
            window_margin: 10,
            pick_radius: 3,
        }
    }
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self::new(MAX_VELOCITY_DEG, 100.0)
    }
}
