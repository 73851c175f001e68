use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Angle, Distance, Pt2D, EPSILON_DIST};

/// A line segment.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Line(Pt2D, Pt2D);

impl Line {
    /// Creates a line segment between two points, which must not be the same.
    pub fn new(pt1: Pt2D, pt2: Pt2D) -> Option<Line> {
        if pt1.raw_dist_to(pt2) < EPSILON_DIST.inner_meters() {
            return None;
        }
        Some(Line(pt1, pt2))
    }

    /// Equivalent to `Line::new(pt1, pt2).unwrap()`. Use this to effectively document an assertion
    /// at the call-site.
    pub fn must_new(pt1: Pt2D, pt2: Pt2D) -> Line {
        Line::new(pt1, pt2).unwrap_or_else(|| panic!("Line from {} to {} too small", pt1, pt2))
    }

    pub fn pt1(&self) -> Pt2D {
        self.0
    }

    pub fn pt2(&self) -> Pt2D {
        self.1
    }

    pub fn length(&self) -> Distance {
        self.pt1().dist_to(self.pt2())
    }

    pub fn angle(&self) -> Angle {
        self.pt1().angle_to(self.pt2())
    }

    pub fn reversed(&self) -> Line {
        Line(self.pt2(), self.pt1())
    }

    /// Unbounded: `pct` outside [0, 1] extends the line.
    pub fn percent_along(&self, pct: f64) -> Pt2D {
        self.pt1().lerp(self.pt2(), pct)
    }

    pub fn middle(&self) -> Pt2D {
        self.percent_along(0.5)
    }

    /// Returns the sub-segment between two percentages. Reverses if `from > to`.
    pub fn slice_pct(&self, from: f64, to: f64) -> Option<Line> {
        Line::new(self.percent_along(from), self.percent_along(to))
    }

    /// Shifts the segment perpendicularly. Positive widths shift to the right of the direction of
    /// travel.
    pub fn shift_either_direction(&self, width: Distance) -> Line {
        let angle = self.angle().rotate_degs(-90.0);
        Line(
            self.pt1().project_away(width, angle),
            self.pt2().project_away(width, angle),
        )
    }

    /// Where do the two infinite lines through these segments cross? Returns the parametric
    /// position along each, or None if they're parallel.
    pub fn infinite_intersection_t(&self, other: &Line) -> Option<(f64, f64)> {
        let (x1, y1) = (self.pt1().x(), self.pt1().y());
        let (x2, y2) = (self.pt2().x(), self.pt2().y());
        let (x3, y3) = (other.pt1().x(), other.pt1().y());
        let (x4, y4) = (other.pt2().x(), other.pt2().y());

        let denom = (x1 - x2) * (y3 - y4) - (y1 - y2) * (x3 - x4);
        if denom.abs() < 1e-12 {
            return None;
        }
        let t = ((x1 - x3) * (y3 - y4) - (y1 - y3) * (x3 - x4)) / denom;
        let u = -((x1 - x2) * (y1 - y3) - (y1 - y2) * (x1 - x3)) / denom;
        Some((t, u))
    }

    /// Where do the two segments cross? Returns the parametric position along each. Touching at
    /// an endpoint counts.
    pub fn intersection_t(&self, other: &Line) -> Option<(f64, f64)> {
        let (t, u) = self.infinite_intersection_t(other)?;
        if (0.0..=1.0).contains(&t) && (0.0..=1.0).contains(&u) {
            Some((t, u))
        } else {
            None
        }
    }

    pub fn intersection(&self, other: &Line) -> Option<Pt2D> {
        let (t, _) = self.intersection_t(other)?;
        Some(self.percent_along(t))
    }
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Line({} to {})", self.pt1(), self.pt2())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crossing_segments() {
        let l1 = Line::must_new(Pt2D::new(0.0, 0.0), Pt2D::new(10.0, 0.0));
        let l2 = Line::must_new(Pt2D::new(2.5, -5.0), Pt2D::new(2.5, 5.0));
        let (t, u) = l1.intersection_t(&l2).unwrap();
        assert!((t - 0.25).abs() < 1e-9);
        assert!((u - 0.5).abs() < 1e-9);

        let (u2, t2) = l2.intersection_t(&l1).unwrap();
        assert!((t - t2).abs() < 1e-9 && (u - u2).abs() < 1e-9);
    }

    #[test]
    fn parallel_and_disjoint() {
        let l1 = Line::must_new(Pt2D::new(0.0, 0.0), Pt2D::new(10.0, 0.0));
        let l2 = Line::must_new(Pt2D::new(0.0, 1.0), Pt2D::new(10.0, 1.0));
        assert!(l1.intersection_t(&l2).is_none());

        let l3 = Line::must_new(Pt2D::new(20.0, -1.0), Pt2D::new(20.0, 1.0));
        assert!(l1.intersection_t(&l3).is_none());
        assert!(l1.infinite_intersection_t(&l3).is_some());
    }

    #[test]
    fn shift_goes_right() {
        let l = Line::must_new(Pt2D::new(0.0, 0.0), Pt2D::new(10.0, 0.0));
        let shifted = l.shift_either_direction(Distance::meters(2.0));
        assert!(shifted.pt1().approx_eq(Pt2D::new(0.0, -2.0), EPSILON_DIST));
    }

    #[test]
    fn random_intersections_agree() {
        use rand::{Rng, SeedableRng};

        fn random_line(rng: &mut rand_xorshift::XorShiftRng) -> Line {
            loop {
                let pt1 = Pt2D::new(rng.gen_range(-50.0..50.0), rng.gen_range(-50.0..50.0));
                let pt2 = Pt2D::new(rng.gen_range(-50.0..50.0), rng.gen_range(-50.0..50.0));
                if let Some(l) = Line::new(pt1, pt2) {
                    return l;
                }
            }
        }

        let mut rng = rand_xorshift::XorShiftRng::seed_from_u64(42);
        for _ in 0..1000 {
            let l1 = random_line(&mut rng);
            let l2 = random_line(&mut rng);
            if let Some((t, u)) = l1.intersection_t(&l2) {
                let hit1 = l1.percent_along(t);
                let hit2 = l2.percent_along(u);
                assert!(hit1.approx_eq(hit2, Distance::meters(0.01)), "{} and {}", l1, l2);
                if let Some((u2, t2)) = l2.intersection_t(&l1) {
                    assert!((t - t2).abs() < 1e-6 && (u - u2).abs() < 1e-6);
                }
            }
        }
    }
}
