use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{lerp, Angle, Distance};

/// This represents world-space in meters, in a y-up frame.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Pt2D {
    x: f64,
    y: f64,
}

impl Pt2D {
    pub fn new(x: f64, y: f64) -> Pt2D {
        if !x.is_finite() || !y.is_finite() {
            panic!("Bad Pt2D {}, {}", x, y);
        }

        Pt2D { x, y }
    }

    pub fn zero() -> Pt2D {
        Pt2D::new(0.0, 0.0)
    }

    pub fn x(self) -> f64 {
        self.x
    }

    pub fn y(self) -> f64 {
        self.y
    }

    /// Moves `dist` in the direction `theta`.
    pub fn project_away(self, dist: Distance, theta: Angle) -> Pt2D {
        let (sin, cos) = theta.normalized_radians().sin_cos();
        Pt2D::new(
            self.x + dist.inner_meters() * cos,
            self.y + dist.inner_meters() * sin,
        )
    }

    pub fn angle_to(self, to: Pt2D) -> Angle {
        Angle::new_rads((to.y - self.y).atan2(to.x - self.x))
    }

    pub fn offset(self, dx: f64, dy: f64) -> Pt2D {
        Pt2D::new(self.x + dx, self.y + dy)
    }

    pub fn dist_to(self, to: Pt2D) -> Distance {
        Distance::meters(self.raw_dist_to(to))
    }

    /// The euclidean distance without the precision trimming that `Distance` does.
    pub fn raw_dist_to(self, to: Pt2D) -> f64 {
        ((self.x - to.x).powi(2) + (self.y - to.y).powi(2)).sqrt()
    }

    pub fn approx_eq(self, other: Pt2D, threshold: Distance) -> bool {
        self.raw_dist_to(other) <= threshold.inner_meters()
    }

    /// Interpolates towards `other`. `pct` isn't clamped.
    pub fn lerp(self, other: Pt2D, pct: f64) -> Pt2D {
        Pt2D::new(lerp(self.x, other.x, pct), lerp(self.y, other.y, pct))
    }

    /// Twice the signed area of the polygon. Positive means the points wind counter-clockwise.
    pub fn signed_area(pts: &[Pt2D]) -> f64 {
        let mut sum = 0.0;
        for (idx, pt) in pts.iter().enumerate() {
            let next = pts[(idx + 1) % pts.len()];
            sum += pt.x * next.y - next.x * pt.y;
        }
        sum
    }
}

impl fmt::Display for Pt2D {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Pt2D({0}, {1})", self.x, self.y)
    }
}

impl From<lyon::geom::Point<f64>> for Pt2D {
    fn from(pt: lyon::geom::Point<f64>) -> Self {
        Pt2D::new(pt.x, pt.y)
    }
}

impl From<Pt2D> for lyon::geom::Point<f64> {
    fn from(pt: Pt2D) -> Self {
        lyon::geom::point(pt.x, pt.y)
    }
}
