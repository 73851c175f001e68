use crate::{Angle, Bezier, Distance, Line, Pt2D, EPSILON_DIST};

// How many samples to take along curves when measuring winding or arc length.
const CURVE_SAMPLES: usize = 16;

/// A directed path that markup is drawn along: either a straight segment or a cubic curve. All
/// parametric positions `t` are in [0, 1].
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Trajectory {
    Straight(Line),
    Curve(Bezier),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Winding {
    Clockwise,
    CounterClockwise,
}

impl Trajectory {
    /// None if the two points are the same.
    pub fn straight(from: Pt2D, to: Pt2D) -> Option<Trajectory> {
        Line::new(from, to).map(Trajectory::Straight)
    }

    pub fn start_pt(&self) -> Pt2D {
        match self {
            Trajectory::Straight(l) => l.pt1(),
            Trajectory::Curve(b) => b.from_pt(),
        }
    }

    pub fn end_pt(&self) -> Pt2D {
        match self {
            Trajectory::Straight(l) => l.pt2(),
            Trajectory::Curve(b) => b.to_pt(),
        }
    }

    pub fn position(&self, t: f64) -> Pt2D {
        match self {
            Trajectory::Straight(l) => l.percent_along(t),
            Trajectory::Curve(b) => b.position(t),
        }
    }

    /// The direction of travel at `t`.
    pub fn tangent(&self, t: f64) -> Angle {
        match self {
            Trajectory::Straight(l) => l.angle(),
            Trajectory::Curve(b) => b.tangent(t),
        }
    }

    pub fn start_dir(&self) -> Angle {
        self.tangent(0.0)
    }

    pub fn end_dir(&self) -> Angle {
        self.tangent(1.0)
    }

    pub fn length(&self) -> Distance {
        match self {
            Trajectory::Straight(l) => l.length(),
            Trajectory::Curve(b) => b.length(),
        }
    }

    /// The piece between two parametric positions, reversed if `from > to`. None if the piece
    /// would be too short to have a direction.
    pub fn cut(&self, from: f64, to: f64) -> Option<Trajectory> {
        let result = match self {
            Trajectory::Straight(l) => Trajectory::Straight(l.slice_pct(from, to)?),
            Trajectory::Curve(b) => Trajectory::Curve(b.cut(from, to)),
        };
        if result.start_pt().approx_eq(result.end_pt(), EPSILON_DIST)
            && result.length() < EPSILON_DIST
        {
            return None;
        }
        Some(result)
    }

    pub fn reversed(&self) -> Trajectory {
        match self {
            Trajectory::Straight(l) => Trajectory::Straight(l.reversed()),
            Trajectory::Curve(b) => Trajectory::Curve(b.reversed()),
        }
    }

    /// Positive distances shift to the right of the direction of travel.
    pub fn shift(&self, dist: Distance) -> Trajectory {
        match self {
            Trajectory::Straight(l) => Trajectory::Straight(l.shift_either_direction(dist)),
            Trajectory::Curve(b) => Trajectory::Curve(b.shift(dist)),
        }
    }

    /// The straight chord from start to end, if the endpoints differ.
    pub fn chord(&self) -> Option<Line> {
        Line::new(self.start_pt(), self.end_pt())
    }

    /// Parametric positions (along self, along other) of every crossing.
    pub fn intersections(&self, other: &Trajectory) -> Vec<(f64, f64)> {
        match (self, other) {
            (Trajectory::Straight(l1), Trajectory::Straight(l2)) => {
                l1.intersection_t(l2).into_iter().collect()
            }
            (Trajectory::Curve(b), Trajectory::Straight(l)) => b.intersections_with_line(l),
            (Trajectory::Straight(l), Trajectory::Curve(b)) => b
                .intersections_with_line(l)
                .into_iter()
                .map(|(t_curve, t_line)| (t_line, t_curve))
                .collect(),
            (Trajectory::Curve(b1), Trajectory::Curve(b2)) => b1.intersections_with_curve(b2),
        }
    }

    /// The first crossing along self, if any.
    pub fn first_intersection(&self, other: &Trajectory) -> Option<(f64, f64)> {
        self.intersections(other)
            .into_iter()
            .min_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal))
    }

    /// The parametric position that's `dist` along the trajectory, clamped to [0, 1].
    pub fn t_at_distance(&self, dist: Distance) -> f64 {
        let total = self.length();
        if total == Distance::ZERO {
            return 0.0;
        }
        match self {
            Trajectory::Straight(_) => (dist / total).clamp(0.0, 1.0),
            Trajectory::Curve(_) => {
                let target = dist.inner_meters();
                if target <= 0.0 {
                    return 0.0;
                }
                let mut so_far = 0.0;
                let mut prev = self.start_pt();
                for step in 1..=CURVE_SAMPLES * 4 {
                    let t = step as f64 / (CURVE_SAMPLES * 4) as f64;
                    let pt = self.position(t);
                    let piece = prev.raw_dist_to(pt);
                    if so_far + piece >= target && piece > 0.0 {
                        let prev_t = (step - 1) as f64 / (CURVE_SAMPLES * 4) as f64;
                        let pct = (target - so_far) / piece;
                        return prev_t + pct * (t - prev_t);
                    }
                    so_far += piece;
                    prev = pt;
                }
                1.0
            }
        }
    }

    /// Splits the trajectory into pieces that are each nearly straight. A piece is split in half
    /// while its direction changes by more than `min_angle_degs` and it's longer than
    /// `min_length`, or while it's longer than `max_length`.
    pub fn subdivide(
        &self,
        min_angle_degs: f64,
        min_length: Distance,
        max_length: Distance,
    ) -> Vec<Trajectory> {
        let mut result = Vec::new();
        self.subdivide_into(min_angle_degs, min_length, max_length, 0, &mut result);
        result
    }

    fn subdivide_into(
        &self,
        min_angle_degs: f64,
        min_length: Distance,
        max_length: Distance,
        depth: usize,
        result: &mut Vec<Trajectory>,
    ) {
        let length = self.length();
        let bends = !self.start_dir().approx_eq(self.end_dir(), min_angle_degs);
        // Deep recursion only happens with pathological input; stop splitting regardless.
        if depth < 16 && ((bends && length > min_length) || length > max_length) {
            if let (Some(first), Some(second)) = (self.cut(0.0, 0.5), self.cut(0.5, 1.0)) {
                first.subdivide_into(min_angle_degs, min_length, max_length, depth + 1, result);
                second.subdivide_into(min_angle_degs, min_length, max_length, depth + 1, result);
                return;
            }
        }
        result.push(*self);
    }

    /// Points along the trajectory, including both endpoints.
    pub fn sample_points(&self) -> Vec<Pt2D> {
        match self {
            Trajectory::Straight(l) => vec![l.pt1(), l.pt2()],
            Trajectory::Curve(b) => (0..=CURVE_SAMPLES)
                .map(|i| b.position(i as f64 / CURVE_SAMPLES as f64))
                .collect(),
        }
    }
}

impl Winding {
    /// The winding of a closed loop of trajectories, each one starting where the previous ended.
    pub fn of(trajectories: &[Trajectory]) -> Winding {
        let mut pts = Vec::new();
        for traj in trajectories {
            let samples = traj.sample_points();
            // The end of each piece is the start of the next
            pts.extend(samples.iter().take(samples.len() - 1));
        }
        Winding::of_points(&pts)
    }

    pub fn of_points(pts: &[Pt2D]) -> Winding {
        if Pt2D::signed_area(pts) > 0.0 {
            Winding::CounterClockwise
        } else {
            Winding::Clockwise
        }
    }
}
