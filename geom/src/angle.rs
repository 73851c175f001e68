use std::fmt;

use serde::{Deserialize, Serialize};

/// An angle, stored in radians.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Angle(f64);

impl Angle {
    pub const ZERO: Angle = Angle(0.0);

    pub fn new_rads(rads: f64) -> Angle {
        Angle(rads)
    }

    pub fn degrees(degs: f64) -> Angle {
        Angle::new_rads(degs.to_radians())
    }

    /// The direction of a vector, if it's not degenerate.
    pub fn from_vector(dx: f64, dy: f64) -> Option<Angle> {
        if dx.abs() < f64::EPSILON && dy.abs() < f64::EPSILON {
            return None;
        }
        Some(Angle(dy.atan2(dx)))
    }

    pub fn opposite(self) -> Angle {
        Angle(self.0 + std::f64::consts::PI)
    }

    pub fn rotate_degs(self, degrees: f64) -> Angle {
        Angle(self.0 + degrees.to_radians())
    }

    /// Returns [0, 2pi)
    pub fn normalized_radians(self) -> f64 {
        let x = self.0.rem_euclid(2.0 * std::f64::consts::PI);
        if x >= 2.0 * std::f64::consts::PI {
            0.0
        } else {
            x
        }
    }

    /// Returns [0, 360)
    pub fn normalized_degrees(self) -> f64 {
        self.normalized_radians().to_degrees()
    }

    /// (cos, sin)
    pub fn unit_vector(self) -> (f64, f64) {
        let (sin, cos) = self.0.sin_cos();
        (cos, sin)
    }

    /// The signed rotation in degrees, within (-180, 180], that takes this angle to `other`.
    /// Positive is counter-clockwise.
    pub fn shortest_rotation_towards(self, other: Angle) -> f64 {
        let mut delta = other.normalized_degrees() - self.normalized_degrees();
        if delta > 180.0 {
            delta -= 360.0;
        } else if delta <= -180.0 {
            delta += 360.0;
        }
        delta
    }

    pub fn approx_eq(self, other: Angle, within_degrees: f64) -> bool {
        self.shortest_rotation_towards(other).abs() < within_degrees
    }

    /// The cosine of the angle between two directions.
    pub fn dot(self, other: Angle) -> f64 {
        let (ax, ay) = self.unit_vector();
        let (bx, by) = other.unit_vector();
        ax * bx + ay * by
    }
}

impl fmt::Display for Angle {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Angle({} degrees)", self.normalized_degrees())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shortest_rotation() {
        for (from, to, expected) in [
            (0.0, 90.0, 90.0),
            (90.0, 0.0, -90.0),
            (350.0, 10.0, 20.0),
            (10.0, 350.0, -20.0),
            (0.0, 180.0, 180.0),
        ] {
            let actual = Angle::degrees(from).shortest_rotation_towards(Angle::degrees(to));
            assert!(
                (actual - expected).abs() < 1e-9,
                "{} -> {} gave {}, expected {}",
                from,
                to,
                actual,
                expected
            );
        }
    }
}
