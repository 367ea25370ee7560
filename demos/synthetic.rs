use armtrack::{
    ArmTracker, Calibration, CameraIntrinsics, CoordinateTransform, Frame, Skeleton, TrackerConfig,
};
use nalgebra as na;
use ndarray::Array2;

const DEPTH: f64 = 100.0;
const LIMB: f64 = 30.0;
const FRAMES: usize = 24;

fn limb(from: na::Point3<f64>, deg: f64) -> na::Point3<f64> {
    let a = deg.to_radians();

    from + na::Vector3::new(LIMB * a.cos(), LIMB * a.sin(), 0.0)
}

/// Both arms hanging down, the forearms swinging outward by `k` degrees.
fn pose(k: f64) -> [na::Point3<f64>; 7] {
    let head = na::Point3::new(0.0, -40.0, DEPTH);
    let shoulder_l = na::Point3::new(-20.0, -20.0, DEPTH);
    let shoulder_r = na::Point3::new(20.0, -20.0, DEPTH);
    let elbow_l = limb(shoulder_l, 90.0);
    let elbow_r = limb(shoulder_r, 90.0);

    [
        head,
        shoulder_l,
        shoulder_r,
        elbow_l,
        elbow_r,
        limb(elbow_l, 90.0 + k),
        limb(elbow_r, 90.0 - k),
    ]
}

fn render(tr: &CoordinateTransform, pose: &[na::Point3<f64>; 7]) -> Result<Frame, armtrack::Error> {
    let (cols, rows) = (tr.intrinsics().width, tr.intrinsics().height);
    let depth = Array2::from_elem((rows, cols), DEPTH as f32);
    let mut mask = Array2::from_elem((rows, cols), false);

    // shoulder to elbow and elbow to wrist on both sides
    for (a, b) in [(1, 3), (3, 5), (2, 4), (4, 6)] {
        for i in 0..=60 {
            let pt = pose[a] + (pose[b] - pose[a]) * (i as f64 / 60.0);
            let (x, y) = tr.world_to_image(&pt);

            if let Some(m) = mask.get_mut((y as usize, x as usize)) {
                *m = true;
            }
        }
    }

    Frame::new(depth, mask)
}

fn main() -> Result<(), armtrack::Error> {
    env_logger::init();

    let tr = CoordinateTransform::new(Calibration::new(CameraIntrinsics::new(
        500.0, 500.0, 320.0, 240.0, 640, 480,
    )));
    let first = render(&tr, &pose(0.0))?;

    let mut skeleton = Skeleton::new(tr.clone(), TrackerConfig::default());
    for pt in pose(0.0) {
        let (x, y) = tr.world_to_image(&pt);
        let depth = first.depth_at(x, y).unwrap_or(0.0);

        skeleton.set_pixel(x as f64, y as f64, depth as f64)?;
    }

    let mut tracker = ArmTracker::new(skeleton, FRAMES)?;
    for k in 0..FRAMES {
        let frame = render(&tr, &pose(1.5 * k as f64))?;

        tracker.process(k, &frame)?;
    }

    println!("saturations: {}", tracker.skeleton().saturations());
    print!("{}", tracker.history().dump());

    Ok(())
}
