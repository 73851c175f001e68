use std::fmt;

use geom::{Bezier, Trajectory};

use crate::objects::point::{Alignment, MarkupPoint, PointID};
use crate::style::{LineStyle, StopLineStyle};

/// An unordered pair of points. The smaller point always comes first, so `(a, b)` and `(b, a)`
/// are the same pair.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub struct PointPair {
    first: PointID,
    second: PointID,
}

/// Lines are identified by the points they connect.
pub type LineID = PointPair;

impl PointPair {
    pub fn new(a: PointID, b: PointID) -> PointPair {
        if a <= b {
            PointPair {
                first: a,
                second: b,
            }
        } else {
            PointPair {
                first: b,
                second: a,
            }
        }
    }

    pub fn first(self) -> PointID {
        self.first
    }

    pub fn second(self) -> PointID {
        self.second
    }

    pub fn contains(self, point: PointID) -> bool {
        self.first == point || self.second == point
    }

    pub fn other(self, point: PointID) -> Option<PointID> {
        if self.first == point {
            Some(self.second)
        } else if self.second == point {
            Some(self.first)
        } else {
            None
        }
    }

    /// Both points on the same enter
    pub fn is_same_enter(self) -> bool {
        self.first.enter == self.second.enter
    }

    pub fn encode_u64(self) -> u64 {
        ((self.first.encode_u32() as u64) << 32) | self.second.encode_u32() as u64
    }

    pub fn decode_u64(x: u64) -> PointPair {
        PointPair::new(
            PointID::decode_u32((x >> 32) as u32),
            PointID::decode_u32((x & 0xffff_ffff) as u32),
        )
    }
}

impl fmt::Display for PointPair {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Line {}:{}-{}:{}",
            self.first.enter.0, self.first.num, self.second.enter.0, self.second.num
        )
    }
}

/// One end of a rule's span along a line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RuleEdge {
    /// One of the line's own endpoints
    LineEnd(PointID),
    /// Where another line crosses this one
    Intersection(LineID),
}

impl RuleEdge {
    pub fn references_line(self, line: LineID) -> bool {
        self == RuleEdge::Intersection(line)
    }
}

/// A styled span of a regular line.
#[derive(Clone, Debug, PartialEq)]
pub struct LineRule {
    pub from: RuleEdge,
    pub to: RuleEdge,
    pub style: LineStyle,
}

impl LineRule {
    /// A rule covering the whole line.
    pub fn whole(line: LineID, style: LineStyle) -> LineRule {
        LineRule {
            from: RuleEdge::LineEnd(line.first()),
            to: RuleEdge::LineEnd(line.second()),
            style,
        }
    }

    pub fn references_line(&self, line: LineID) -> bool {
        self.from.references_line(line) || self.to.references_line(line)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LineType {
    Regular,
    Stop,
    Crosswalk,
}

impl LineType {
    pub fn to_u8(self) -> u8 {
        match self {
            LineType::Regular => 0,
            LineType::Stop => 1,
            LineType::Crosswalk => 2,
        }
    }

    pub fn from_u8(x: u8) -> Option<LineType> {
        match x {
            0 => Some(LineType::Regular),
            1 => Some(LineType::Stop),
            2 => Some(LineType::Crosswalk),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum LineKind {
    /// Between points on different enters. Has any number of styled spans.
    Regular { rules: Vec<LineRule> },
    /// Between points on the same enter
    Stop { style: StopLineStyle },
    /// Between points on the same enter; styled by its crosswalk
    Crosswalk,
}

impl LineKind {
    pub fn line_type(&self) -> LineType {
        match self {
            LineKind::Regular { .. } => LineType::Regular,
            LineKind::Stop { .. } => LineType::Stop,
            LineKind::Crosswalk => LineType::Crosswalk,
        }
    }
}

#[derive(Debug)]
pub struct MarkupLine {
    pub id: LineID,
    /// Which half of a split point the line attaches to, at its first point. The second point
    /// uses the inverse.
    alignment: Alignment,
    pub kind: LineKind,
    trajectory: Trajectory,
}

impl MarkupLine {
    pub(crate) fn new(
        id: LineID,
        alignment: Alignment,
        kind: LineKind,
        trajectory: Trajectory,
    ) -> MarkupLine {
        MarkupLine {
            id,
            alignment,
            kind,
            trajectory,
        }
    }

    pub fn start(&self) -> PointID {
        self.id.first()
    }

    pub fn end(&self) -> PointID {
        self.id.second()
    }

    pub fn alignment(&self) -> Alignment {
        self.alignment
    }

    /// The alignment this line uses at one of its points.
    pub fn alignment_at(&self, point: PointID) -> Alignment {
        alignment_at(self.id, self.alignment, point)
    }

    pub fn trajectory(&self) -> &Trajectory {
        &self.trajectory
    }

    pub(crate) fn set_trajectory(&mut self, trajectory: Trajectory) {
        self.trajectory = trajectory;
    }

    pub fn line_type(&self) -> LineType {
        self.kind.line_type()
    }

    pub fn is_regular(&self) -> bool {
        self.line_type() == LineType::Regular
    }

    pub fn rules(&self) -> &[LineRule] {
        match self.kind {
            LineKind::Regular { ref rules } => rules.as_slice(),
            _ => &[],
        }
    }

    pub(crate) fn add_rule(&mut self, rule: LineRule) -> bool {
        if let LineKind::Regular { ref mut rules } = self.kind {
            rules.push(rule);
            true
        } else {
            false
        }
    }

    /// Drops every rule that starts or ends where `other` crosses. Returns how many were dropped.
    pub(crate) fn remove_rules_with(&mut self, other: LineID) -> usize {
        if let LineKind::Regular { ref mut rules } = self.kind {
            let before = rules.len();
            rules.retain(|r| !r.references_line(other));
            before - rules.len()
        } else {
            0
        }
    }

    pub fn rules_depending_on(&self, other: LineID) -> usize {
        self.rules()
            .iter()
            .filter(|r| r.references_line(other))
            .count()
    }
}

/// Converts an alignment at the line's first point into the one at `point`.
pub fn alignment_at(line: LineID, alignment_at_first: Alignment, point: PointID) -> Alignment {
    if point == line.first() {
        alignment_at_first
    } else {
        alignment_at_first.invert()
    }
}

/// The path a line between two points takes. Lines along one enter are straight; others curve
/// smoothly from one road into the other.
pub fn line_trajectory(
    first: &MarkupPoint,
    second: &MarkupPoint,
    alignment: Alignment,
) -> Option<Trajectory> {
    let from = first.position_at(alignment);
    let to = second.position_at(alignment.invert());
    if first.id.enter == second.id.enter {
        return Trajectory::straight(from, to);
    }
    if from.approx_eq(to, geom::EPSILON_DIST) {
        return None;
    }
    Some(Trajectory::Curve(Bezier::smooth_connector(
        from,
        first.direction(),
        to,
        second.direction(),
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SegmentID;

    #[test]
    fn pairs_are_unordered() {
        let a = PointID::new(SegmentID(3), 1);
        let b = PointID::new(SegmentID(1), 4);
        assert_eq!(PointPair::new(a, b), PointPair::new(b, a));
        assert_eq!(PointPair::new(a, b).first(), b);
        assert_eq!(PointPair::new(a, b).other(a), Some(b));
        assert!(!PointPair::new(a, b).is_same_enter());

        let pair = PointPair::new(a, b);
        assert_eq!(PointPair::decode_u64(pair.encode_u64()), pair);
    }

    #[test]
    fn alignment_flips_at_the_far_end() {
        let a = PointID::new(SegmentID(1), 1);
        let b = PointID::new(SegmentID(2), 1);
        let line = PointPair::new(a, b);
        assert_eq!(alignment_at(line, Alignment::Left, a), Alignment::Left);
        assert_eq!(alignment_at(line, Alignment::Left, b), Alignment::Right);
    }
}
