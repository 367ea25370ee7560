use nalgebra as na;
use ndarray::prelude::*;
use serde_derive::{Deserialize, Serialize};

/// Pinhole intrinsics of one sensor.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CameraIntrinsics {
    pub fx: f64,
    pub fy: f64,
    pub cx: f64,
    pub cy: f64,
    pub width: usize,
    pub height: usize,

    /// Brown-Conrady (k1, k2, p1, p2, k3); frames are expected undistorted
    pub distortion: [f64; 5],
}

impl CameraIntrinsics {
    pub fn new(fx: f64, fy: f64, cx: f64, cy: f64, width: usize, height: usize) -> Self {
        Self {
            fx,
            fy,
            cx,
            cy,
            width,
            height,
            distortion: [0.0; 5],
        }
    }

    /// Kinect depth sensor calibration.
    pub fn kinect_depth() -> Self {
        Self {
            distortion: [8.279470e-03, -2.103757e-01, -6.704529e-04, 0.0, 3.943653e-01],
            ..Self::new(544.166699, 550.666193, 319.554313, 237.375891, 640, 480)
        }
    }

    /// Kinect color sensor calibration.
    pub fn kinect_color() -> Self {
        Self {
            distortion: [1.284672e-01, -1.447001e-01, -1.255696e-04, 0.0, -2.283035e-01],
            ..Self::new(490.577541, 497.235159, 317.909506, 246.662717, 640, 480)
        }
    }

    #[inline]
    fn project(&self, pt: &na::Point3<f64>) -> (f64, f64) {
        (
            pt.x * self.fx / pt.z + self.cx,
            pt.y * self.fy / pt.z + self.cy,
        )
    }
}

/// Depth-to-color sensor pose.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Extrinsics {
    pub rotation: na::Matrix3<f64>,
    pub translation: na::Vector3<f64>,
}

impl Extrinsics {
    pub fn identity() -> Self {
        Self {
            rotation: na::Matrix3::identity(),
            translation: na::Vector3::zeros(),
        }
    }

    pub fn kinect() -> Self {
        Self {
            rotation: na::Matrix3::new(
                9.9998677518893e-01,
                -3.7700884771569e-03,
                -3.4979822889508e-03,
                3.7402011469390e-03,
                9.9995677981541e-01,
                -8.5117211272654e-03,
                3.5299210472534e-03,
                8.4985254039926e-03,
                9.9995765646519e-01,
            ),
            translation: na::Vector3::new(2.744582e-02, -1.935876e-03, 3.180614e-03),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Calibration {
    pub depth: CameraIntrinsics,
    pub color: CameraIntrinsics,
    pub extrinsics: Extrinsics,
}

impl Calibration {
    pub fn new(depth: CameraIntrinsics) -> Self {
        Self {
            color: depth.clone(),
            depth,
            extrinsics: Extrinsics::identity(),
        }
    }

    pub fn kinect() -> Self {
        Self {
            depth: CameraIntrinsics::kinect_depth(),
            color: CameraIntrinsics::kinect_color(),
            extrinsics: Extrinsics::kinect(),
        }
    }
}

impl Default for Calibration {
    fn default() -> Self {
        Self::kinect()
    }
}

/// Conversions between depth image pixels and the world frame.
#[derive(Debug, Clone)]
pub struct CoordinateTransform {
    calibration: Calibration,
}

impl CoordinateTransform {
    pub fn new(calibration: Calibration) -> Self {
        Self { calibration }
    }

    #[inline]
    pub fn calibration(&self) -> &Calibration {
        &self.calibration
    }

    #[inline]
    pub fn intrinsics(&self) -> &CameraIntrinsics {
        &self.calibration.depth
    }

    /// Projects a world point to the nearest depth pixel. `pt.z` must be nonzero.
    #[inline]
    pub fn world_to_image(&self, pt: &na::Point3<f64>) -> (i64, i64) {
        let (x, y) = self.calibration.depth.project(pt);

        (x.round() as i64, y.round() as i64)
    }

    #[inline]
    pub fn image_to_world(&self, px: f64, py: f64, depth: f64) -> na::Point3<f64> {
        let k = &self.calibration.depth;

        na::Point3::new((px - k.cx) * depth / k.fx, (py - k.cy) * depth / k.fy, depth)
    }

    /// Back-projects every pixel of `depth`; the result has shape `(rows, cols, 3)`.
    pub fn point_cloud(&self, depth: ArrayView2<'_, f32>) -> Array3<f64> {
        let k = &self.calibration.depth;
        let (rows, cols) = depth.dim();
        let mut cloud = Array3::zeros((rows, cols, 3));

        for ((r, c), &z) in depth.indexed_iter() {
            let z = z as f64;

            cloud[[r, c, 0]] = (c as f64 - k.cx) * z / k.fx;
            cloud[[r, c, 1]] = (r as f64 - k.cy) * z / k.fy;
            cloud[[r, c, 2]] = z;
        }

        cloud
    }

    /// Color image pixel seeing the same point as the depth sensor's `pt`.
    pub fn depth_to_color(&self, pt: &na::Point3<f64>) -> Option<(i64, i64)> {
        let ext = &self.calibration.extrinsics;
        let p = na::Point3::from(ext.rotation.transpose() * pt.coords + ext.translation);

        if p.z <= 0.0 {
            return None;
        }

        let (x, y) = self.calibration.color.project(&p);

        Some((x.round() as i64, y.round() as i64))
    }
}

impl Default for CoordinateTransform {
    fn default() -> Self {
        Self::new(Calibration::default())
    }
}
