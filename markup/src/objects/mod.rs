mod crosswalk;
mod enter;
mod filler;
mod intersection;
mod line;
mod point;

pub use self::crosswalk::Crosswalk;
pub use self::enter::Enter;
pub use self::filler::{Filler, FillerID};
pub use self::intersection::{LineIntersection, LinePair};
pub use self::line::{
    alignment_at, line_trajectory, LineID, LineKind, LineRule, LineType, MarkupLine, PointPair,
    RuleEdge,
};
pub use self::point::{Alignment, MarkupPoint, PointID};
