use lyon::geom::{CubicBezierSegment, LineSegment};

use crate::{Angle, Distance, Line, Pt2D, EPSILON_T};

// Used when approximating curve lengths.
const LENGTH_TOLERANCE: f64 = 0.001;

/// A cubic Bezier curve.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bezier {
    curve: CubicBezierSegment<f64>,
}

impl Bezier {
    pub fn new(from: Pt2D, ctrl1: Pt2D, ctrl2: Pt2D, to: Pt2D) -> Bezier {
        Bezier {
            curve: CubicBezierSegment {
                from: from.into(),
                ctrl1: ctrl1.into(),
                ctrl2: ctrl2.into(),
                to: to.into(),
            },
        }
    }

    /// A smooth connector between two road ends. The curve leaves `from` heading in `from_dir`
    /// and arrives at `to` heading opposite `to_dir`, so both directions point into the space
    /// between the two ends.
    pub fn smooth_connector(from: Pt2D, from_dir: Angle, to: Pt2D, to_dir: Angle) -> Bezier {
        let dist = from.dist_to(to);
        // Nearly opposite directions are a straight pass; tighter turns pull the controls in.
        let straightness = (1.0 - from_dir.dot(to_dir)) / 2.0;
        let handle = dist * (0.2 + 0.15 * straightness);
        Bezier::new(
            from,
            from.project_away(handle, from_dir),
            to.project_away(handle, to_dir),
            to,
        )
    }

    pub fn from_pt(&self) -> Pt2D {
        self.curve.from.into()
    }

    pub fn ctrl1(&self) -> Pt2D {
        self.curve.ctrl1.into()
    }

    pub fn ctrl2(&self) -> Pt2D {
        self.curve.ctrl2.into()
    }

    pub fn to_pt(&self) -> Pt2D {
        self.curve.to.into()
    }

    pub fn position(&self, t: f64) -> Pt2D {
        self.curve.sample(t).into()
    }

    /// The direction of travel at `t`. Degenerate control points fall back to nearby samples.
    pub fn tangent(&self, t: f64) -> Angle {
        let d = self.curve.derivative(t);
        if let Some(angle) = Angle::from_vector(d.x, d.y) {
            return angle;
        }
        let before = self.position((t - 0.01).max(0.0));
        let after = self.position((t + 0.01).min(1.0));
        before.angle_to(after)
    }

    pub fn length(&self) -> Distance {
        Distance::meters(self.curve.approximate_length(LENGTH_TOLERANCE))
    }

    /// The sub-curve between two parametric positions. Reverses if `from > to`.
    pub fn cut(&self, from: f64, to: f64) -> Bezier {
        if from <= to {
            Bezier {
                curve: self.curve.split_range(from..to),
            }
        } else {
            self.cut(to, from).reversed()
        }
    }

    pub fn reversed(&self) -> Bezier {
        Bezier::new(self.to_pt(), self.ctrl2(), self.ctrl1(), self.from_pt())
    }

    /// An approximate parallel curve. Positive distances shift to the right of the direction of
    /// travel.
    pub fn shift(&self, dist: Distance) -> Bezier {
        let start_normal = self.tangent(0.0).rotate_degs(-90.0);
        let end_normal = self.tangent(1.0).rotate_degs(-90.0);
        Bezier::new(
            self.from_pt().project_away(dist, start_normal),
            self.ctrl1().project_away(dist, start_normal),
            self.ctrl2().project_away(dist, end_normal),
            self.to_pt().project_away(dist, end_normal),
        )
    }

    pub fn is_degenerate(&self) -> bool {
        self.from_pt() == self.to_pt()
            && self.ctrl1() == self.from_pt()
            && self.ctrl2() == self.from_pt()
    }

    /// Parametric positions (along self, along other) of every crossing.
    pub fn intersections_with_curve(&self, other: &Bezier) -> Vec<(f64, f64)> {
        if self.is_degenerate() || other.is_degenerate() {
            return Vec::new();
        }
        dedupe(
            self.curve
                .cubic_intersections_t(&other.curve)
                .iter()
                .copied()
                .collect(),
        )
    }

    /// Parametric positions (along self, along the line) of every crossing.
    pub fn intersections_with_line(&self, line: &Line) -> Vec<(f64, f64)> {
        if self.is_degenerate() {
            return Vec::new();
        }
        let segment = LineSegment {
            from: line.pt1().into(),
            to: line.pt2().into(),
        };
        dedupe(
            self.curve
                .line_segment_intersections_t(&segment)
                .iter()
                .copied()
                .collect(),
        )
    }
}

// Curves touching at a shared endpoint sometimes report the same crossing twice.
fn dedupe(mut hits: Vec<(f64, f64)>) -> Vec<(f64, f64)> {
    hits.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
    hits.dedup_by(|a, b| (a.0 - b.0).abs() < EPSILON_T && (a.1 - b.1).abs() < EPSILON_T);
    hits
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cut_and_reverse() {
        let b = Bezier::new(
            Pt2D::new(0.0, 0.0),
            Pt2D::new(0.0, 10.0),
            Pt2D::new(10.0, 10.0),
            Pt2D::new(10.0, 0.0),
        );
        let half = b.cut(0.0, 0.5);
        assert!(half.to_pt().approx_eq(b.position(0.5), Distance::meters(0.001)));

        let backwards = b.cut(0.5, 0.0);
        assert!(backwards.from_pt().approx_eq(b.position(0.5), Distance::meters(0.001)));
        assert!(backwards.to_pt().approx_eq(b.from_pt(), Distance::meters(0.001)));
    }

    #[test]
    fn straight_connector_crosses_line_once() {
        let b = Bezier::smooth_connector(
            Pt2D::new(0.0, 0.0),
            Angle::degrees(0.0),
            Pt2D::new(20.0, 0.0),
            Angle::degrees(180.0),
        );
        let line = Line::must_new(Pt2D::new(10.0, -5.0), Pt2D::new(10.0, 5.0));
        let hits = b.intersections_with_line(&line);
        assert_eq!(hits.len(), 1);
        assert!((hits[0].0 - 0.5).abs() < 1e-3);
        assert!((hits[0].1 - 0.5).abs() < 1e-3);
        assert!((b.length().inner_meters() - 20.0).abs() < 0.01);
    }
}
