#![allow(dead_code)]

use armtrack::{Calibration, CameraIntrinsics, CoordinateTransform, Frame, Joint, Skeleton, TrackerConfig};
use nalgebra as na;
use ndarray::Array2;

/// Depth of every joint in the synthetic scene; one unit spans 5 px.
pub const DEPTH: f64 = 100.0;

/// Both the upper arm and the forearm.
pub const LIMB: f64 = 30.0;

pub fn transform() -> CoordinateTransform {
    CoordinateTransform::new(Calibration::new(CameraIntrinsics::new(
        500.0, 500.0, 320.0, 240.0, 640, 480,
    )))
}

/// Seed pose in `Joint::SEED_ORDER`: arms hanging straight down.
pub fn pose() -> [na::Point3<f64>; 7] {
    [
        na::Point3::new(0.0, -40.0, DEPTH),
        na::Point3::new(-20.0, -20.0, DEPTH),
        na::Point3::new(20.0, -20.0, DEPTH),
        na::Point3::new(-20.0, 10.0, DEPTH),
        na::Point3::new(20.0, 10.0, DEPTH),
        na::Point3::new(-20.0, 40.0, DEPTH),
        na::Point3::new(20.0, 40.0, DEPTH),
    ]
}

pub fn seeded() -> Skeleton {
    let mut sk = Skeleton::new(transform(), TrackerConfig::default());

    for pt in pose() {
        sk.set_point(pt).unwrap();
    }

    sk
}

/// Point at `LIMB` from `anchor`, `deg` degrees from +x in the image plane.
pub fn around(anchor: na::Point3<f64>, deg: f64) -> na::Point3<f64> {
    let a = deg.to_radians();

    anchor + na::Vector3::new(LIMB * a.cos(), LIMB * a.sin(), 0.0)
}

pub fn elbow_left() -> na::Point3<f64> {
    pose()[Joint::ElbowLeft as usize]
}

pub fn shoulder_left() -> na::Point3<f64> {
    pose()[Joint::ShoulderLeft as usize]
}

/// Flat depth frame with the pixels under `points` marked as foreground.
pub fn frame_with(points: &[na::Point3<f64>]) -> Frame {
    let tr = transform();
    let depth = Array2::from_elem((480, 640), DEPTH as f32);
    let mut mask = Array2::from_elem((480, 640), false);

    for pt in points {
        let (x, y) = tr.world_to_image(pt);
        mask[[y as usize, x as usize]] = true;
    }

    Frame::new(depth, mask).unwrap()
}

pub fn empty_frame() -> Frame {
    frame_with(&[])
}
