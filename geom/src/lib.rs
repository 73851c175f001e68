//! Planar geometry for intersection markup: points, angles, distances, straight and curved
//! trajectories, and polygon tessellation.

#[macro_use]
extern crate anyhow;

mod angle;
mod bezier;
mod distance;
mod line;
mod pt;
mod tessellation;
mod trajectory;

pub use crate::angle::Angle;
pub use crate::bezier::Bezier;
pub use crate::distance::Distance;
pub use crate::line::Line;
pub use crate::pt::Pt2D;
pub use crate::tessellation::Tessellation;
pub use crate::trajectory::{Trajectory, Winding};

// About 0.4 inches... which is quite tiny on the scale of things. :)
pub const EPSILON_DIST: Distance = Distance::const_meters(0.01);

/// Parametric positions this close to each other are treated as the same.
pub const EPSILON_T: f64 = 1e-6;

/// Reduce the precision of an f64. This helps ensure serialization is idempotent (everything is
/// exactly the same before and after saving/loading). Ideally we'd use some kind of proper
/// fixed-precision type instead of f64.
pub fn trim_f64(x: f64) -> f64 {
    (x * 10_000.0).round() / 10_000.0
}

/// Linear interpolation between two scalars.
pub(crate) fn lerp(a: f64, b: f64, pct: f64) -> f64 {
    a + (b - a) * pct
}
