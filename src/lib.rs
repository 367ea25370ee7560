pub mod adjust;
pub mod camera;
pub mod config;
pub mod error;
pub mod frame;
pub mod history;
pub mod joint;
pub mod math;
pub mod motion;
pub mod skeleton;
pub mod tracker;
pub mod window;

pub use adjust::ManualAdjustment;
pub use camera::{Calibration, CameraIntrinsics, CoordinateTransform};
pub use config::TrackerConfig;
pub use error::Error;
pub use frame::Frame;
pub use history::StateHistory;
pub use joint::{ArmStates, Joint, JointState, Segment, Side};
pub use motion::MotionFilter;
pub use skeleton::{Observation, Skeleton};
pub use tracker::ArmTracker;
pub use window::Window;
