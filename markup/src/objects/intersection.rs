use std::fmt;

use geom::{Pt2D, Trajectory, EPSILON_T};

use crate::objects::line::LineID;

/// An unordered pair of lines.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub struct LinePair {
    first: LineID,
    second: LineID,
}

impl LinePair {
    pub fn new(a: LineID, b: LineID) -> LinePair {
        if a <= b {
            LinePair {
                first: a,
                second: b,
            }
        } else {
            LinePair {
                first: b,
                second: a,
            }
        }
    }

    pub fn first(self) -> LineID {
        self.first
    }

    pub fn second(self) -> LineID {
        self.second
    }

    pub fn contains(self, line: LineID) -> bool {
        self.first == line || self.second == line
    }

    pub fn other(self, line: LineID) -> Option<LineID> {
        if self.first == line {
            Some(self.second)
        } else if self.second == line {
            Some(self.first)
        } else {
            None
        }
    }

    /// Do the two lines share an endpoint?
    pub fn shares_point(self) -> bool {
        self.first.contains(self.second.first()) || self.first.contains(self.second.second())
    }
}

impl fmt::Display for LinePair {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "({} x {})", self.first, self.second)
    }
}

/// Where two lines cross, if they do.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LineIntersection {
    pub pair: LinePair,
    /// Parametric positions along the first and second line of the pair
    hit: Option<(f64, f64)>,
}

impl LineIntersection {
    /// `first` and `second` must be the trajectories of `pair.first()` and `pair.second()`.
    /// Lines that share an endpoint don't count as crossing there.
    pub fn calculate(pair: LinePair, first: &Trajectory, second: &Trajectory) -> LineIntersection {
        let shares_point = pair.shares_point();
        let hit = first
            .intersections(second)
            .into_iter()
            .filter(|(t1, t2)| !shares_point || (interior(*t1) && interior(*t2)))
            .min_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
        LineIntersection { pair, hit }
    }

    pub fn not_intersect(pair: LinePair) -> LineIntersection {
        LineIntersection { pair, hit: None }
    }

    pub fn is_intersect(&self) -> bool {
        self.hit.is_some()
    }

    /// The parametric position of the crossing along one of the two lines.
    pub fn t_for(&self, line: LineID) -> Option<f64> {
        let (t1, t2) = self.hit?;
        if line == self.pair.first() {
            Some(t1)
        } else if line == self.pair.second() {
            Some(t2)
        } else {
            None
        }
    }

    /// Where the lines cross, given the first line's trajectory.
    pub fn position(&self, first: &Trajectory) -> Option<Pt2D> {
        self.hit.map(|(t, _)| first.position(t))
    }
}

fn interior(t: f64) -> bool {
    t > EPSILON_T && t < 1.0 - EPSILON_T
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objects::line::PointPair;
    use crate::objects::point::PointID;
    use crate::SegmentID;

    fn line(a: (u16, u8), b: (u16, u8)) -> LineID {
        PointPair::new(
            PointID::new(SegmentID(a.0), a.1),
            PointID::new(SegmentID(b.0), b.1),
        )
    }

    #[test]
    fn order_independent() {
        let l1 = line((1, 1), (3, 1));
        let l2 = line((2, 1), (4, 1));
        assert_eq!(LinePair::new(l1, l2), LinePair::new(l2, l1));

        let pair = LinePair::new(l1, l2);
        let horizontal = Trajectory::straight(Pt2D::new(-5.0, 0.0), Pt2D::new(5.0, 0.0)).unwrap();
        let vertical = Trajectory::straight(Pt2D::new(1.0, -5.0), Pt2D::new(1.0, 5.0)).unwrap();
        let hit = LineIntersection::calculate(pair, &horizontal, &vertical);
        assert!(hit.is_intersect());
        assert!((hit.t_for(pair.first()).unwrap() - 0.6).abs() < 1e-9);
        assert!((hit.t_for(pair.second()).unwrap() - 0.5).abs() < 1e-9);
        assert!(hit.t_for(line((1, 2), (2, 2))).is_none());
    }

    #[test]
    fn shared_endpoint_doesnt_count() {
        let l1 = line((1, 1), (3, 1));
        let l2 = line((1, 1), (2, 1));
        let pair = LinePair::new(l1, l2);
        assert!(pair.shares_point());
        let a = Trajectory::straight(Pt2D::new(0.0, 0.0), Pt2D::new(5.0, 0.0)).unwrap();
        let b = Trajectory::straight(Pt2D::new(0.0, 0.0), Pt2D::new(0.0, 5.0)).unwrap();
        assert!(!LineIntersection::calculate(pair, &a, &b).is_intersect());
    }
}
