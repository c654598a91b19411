//! Trajectory densification for smooth rendering.
//!
//! Every resampled point carries the index of the original sample it came
//! from so the renderer can map a picked point back onto the trajectory.

use crate::sample::Point3;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResampleMethod {
    None,
    #[default]
    Linear,
    Spline,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Resampled {
    pub points: Vec<Point3>,
    /// `index_map[i]` is the original index that `points[i]` belongs to.
    pub index_map: Vec<usize>,
}

pub fn resample(points: &[Point3], method: ResampleMethod, segments_per_edge: usize) -> Resampled {
    let segments = segments_per_edge.max(1);
    match method {
        ResampleMethod::Linear if points.len() > 1 => resample_linear(points, segments),
        ResampleMethod::Spline if points.len() > 1 => resample_spline(points, segments),
        _ => Resampled {
            points: points.to_vec(),
            index_map: (0..points.len()).collect(),
        },
    }
}

fn resample_linear(points: &[Point3], segments: usize) -> Resampled {
    let n = points.len();
    let capacity = (n - 1) * segments + 1;
    let mut dense = Vec::with_capacity(capacity);
    let mut index_map = Vec::with_capacity(capacity);

    for (edge, pair) in points.windows(2).enumerate() {
        let (a, b) = (pair[0], pair[1]);
        for s in 0..segments {
            let t = s as f64 / segments as f64;
            dense.push(a.lerp(&b, t));
            index_map.push(edge);
        }
    }
    dense.push(points[n - 1]);
    index_map.push(n - 1);

    Resampled {
        points: dense,
        index_map,
    }
}

fn resample_spline(points: &[Point3], segments: usize) -> Resampled {
    let n = points.len();
    let divisions = ((n - 1) * segments).max(1);
    let curve = CatmullRom::new(points);
    let last = (n - 1) as f64;

    let mut dense = Vec::with_capacity(divisions + 1);
    let mut index_map = Vec::with_capacity(divisions + 1);
    for d in 0..=divisions {
        let t = d as f64 / divisions as f64;
        dense.push(curve.point_at(t));
        // Nearest original index; only precise enough for hit-testing.
        let nearest = (t * last).round().clamp(0.0, last) as usize;
        index_map.push(nearest);
    }

    Resampled {
        points: dense,
        index_map,
    }
}

/// Open centripetal Catmull-Rom curve (alpha = 0.5) through a point list.
/// The missing neighbours at both ends are reflected through the endpoint.
pub struct CatmullRom<'a> {
    points: &'a [Point3],
}

impl<'a> CatmullRom<'a> {
    pub fn new(points: &'a [Point3]) -> Self {
        Self { points }
    }

    /// Evaluates the curve at a global parameter `t` in `[0, 1]`.
    pub fn point_at(&self, t: f64) -> Point3 {
        let pts = self.points;
        let l = pts.len();
        if l == 0 {
            return Point3::zeros();
        }
        if l == 1 {
            return pts[0];
        }

        let p = (l - 1) as f64 * t.clamp(0.0, 1.0);
        let mut seg = p.floor() as usize;
        let mut weight = p - seg as f64;
        if seg >= l - 1 {
            seg = l - 2;
            weight = 1.0;
        }

        let p1 = pts[seg];
        let p2 = pts[seg + 1];
        let p0 = if seg > 0 {
            pts[seg - 1]
        } else {
            pts[0] * 2.0 - pts[1]
        };
        let p3 = if seg + 2 < l {
            pts[seg + 2]
        } else {
            pts[l - 1] * 2.0 - pts[l - 2]
        };

        // Squared distances raised to 0.25 give the centripetal knot spacing.
        let mut dt0 = (p1 - p0).norm_squared().powf(0.25);
        let mut dt1 = (p2 - p1).norm_squared().powf(0.25);
        let mut dt2 = (p3 - p2).norm_squared().powf(0.25);
        if dt1 < 1e-4 {
            dt1 = 1.0;
        }
        if dt0 < 1e-4 {
            dt0 = dt1;
        }
        if dt2 < 1e-4 {
            dt2 = dt1;
        }

        Point3::from_fn(|i, _| {
            let poly = CubicPoly::nonuniform(p0[i], p1[i], p2[i], p3[i], dt0, dt1, dt2);
            poly.eval(weight)
        })
    }
}

/// Hermite cubic `c0 + c1 t + c2 t^2 + c3 t^3` on one segment.
struct CubicPoly {
    c0: f64,
    c1: f64,
    c2: f64,
    c3: f64,
}

impl CubicPoly {
    fn hermite(x0: f64, x1: f64, t0: f64, t1: f64) -> Self {
        Self {
            c0: x0,
            c1: t0,
            c2: -3.0 * x0 + 3.0 * x1 - 2.0 * t0 - t1,
            c3: 2.0 * x0 - 2.0 * x1 + t0 + t1,
        }
    }

    fn nonuniform(x0: f64, x1: f64, x2: f64, x3: f64, dt0: f64, dt1: f64, dt2: f64) -> Self {
        let t1 = (x1 - x0) / dt0 - (x2 - x0) / (dt0 + dt1) + (x2 - x1) / dt1;
        let t2 = (x2 - x1) / dt1 - (x3 - x1) / (dt1 + dt2) + (x3 - x2) / dt2;
        Self::hermite(x1, x2, t1 * dt1, t2 * dt1)
    }

    fn eval(&self, t: f64) -> f64 {
        let t2 = t * t;
        self.c0 + self.c1 * t + self.c2 * t2 + self.c3 * t2 * t
    }
}
