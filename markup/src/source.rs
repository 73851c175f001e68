//! Where the points on an enter come from. Each point is computed by a source; the host's lanes
//! produce most of them.

use std::fmt;

use anyhow::Result;
use enumset::EnumSet;

use geom::{Angle, Distance, Pt2D};

use crate::{DriveLane, NetworkType};

/// Where a point sits relative to the lanes around it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LocationType {
    /// The left edge of the leftmost lane in a group
    LeftEdge,
    /// The right edge of the rightmost lane in a group
    RightEdge,
    /// Between two lanes, or in the middle of nowhere
    Between,
}

/// The geometry of one enter's cut edge.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnterFrame {
    /// Where the segment's center line crosses the cut edge
    pub position: Pt2D,
    /// Pointing away from the node, along the road
    pub normal: Angle,
    /// Along the cut edge, from left to right
    pub corner: Angle,
    /// How much a distance across the road stretches when measured along a skewed cut edge.
    /// 1 for square ends, smaller for skewed ones.
    pub transform_coef: f64,
}

impl EnterFrame {
    /// The point `offset` along the cut edge from the segment's center. Offsets are measured
    /// across the road, so skewed edges stretch them.
    pub fn position_at(&self, offset: Distance) -> Pt2D {
        self.position
            .project_away(offset / self.transform_coef, self.corner)
    }

    /// Pointing into the node
    pub fn inward(&self) -> Angle {
        self.normal.opposite()
    }
}

/// Produces the position of a point on an enter.
pub trait PointSource: fmt::Debug {
    fn location(&self) -> LocationType;
    fn networks(&self) -> EnumSet<NetworkType>;
    /// The point's position and the direction markup lines leave it in. `offset` shifts the
    /// point along the cut edge; positive is to the right.
    fn position_and_direction(&self, frame: &EnterFrame, offset: Distance)
        -> Result<(Pt2D, Angle)>;
}

/// A point defined by up to two neighboring lanes.
#[derive(Clone, Debug, PartialEq)]
pub struct LanePairSource {
    pub left: Option<DriveLane>,
    pub right: Option<DriveLane>,
    pub location: LocationType,
}

impl LanePairSource {
    /// Every point that lies between `left` and `right`. Gaps that are at least as wide as the
    /// lanes around them get two points, one at each edge.
    pub fn between(left: Option<&DriveLane>, right: Option<&DriveLane>) -> Vec<LanePairSource> {
        let source = |location| LanePairSource {
            left: left.cloned(),
            right: right.cloned(),
            location,
        };
        match (left, right) {
            (None, None) => Vec::new(),
            (None, Some(_)) => vec![source(LocationType::LeftEdge)],
            (Some(_), None) => vec![source(LocationType::RightEdge)],
            (Some(l), Some(r)) => {
                let gap = (r.left_edge() - l.right_edge()).abs();
                let mean_half_width = (l.half_width + r.half_width) / 2.0;
                if gap >= mean_half_width {
                    vec![
                        source(LocationType::RightEdge),
                        source(LocationType::LeftEdge),
                    ]
                } else {
                    vec![source(LocationType::Between)]
                }
            }
        }
    }

    /// How far across the road this point is, before any offset.
    fn lateral(&self) -> Result<Distance> {
        match (self.location, &self.left, &self.right) {
            (LocationType::Between, Some(l), Some(r)) => {
                if l.id == r.id {
                    Ok(l.position)
                } else {
                    Ok((l.right_edge() + r.left_edge()) / 2.0)
                }
            }
            (LocationType::LeftEdge, _, Some(r)) => Ok(r.left_edge()),
            (LocationType::RightEdge, Some(l), _) => Ok(l.right_edge()),
            (location, l, r) => bail!(
                "a {:?} point needs different lanes than {:?} and {:?}",
                location,
                l.as_ref().map(|l| l.id),
                r.as_ref().map(|r| r.id)
            ),
        }
    }
}

impl PointSource for LanePairSource {
    fn location(&self) -> LocationType {
        self.location
    }

    fn networks(&self) -> EnumSet<NetworkType> {
        let mut result = EnumSet::new();
        for lane in self.left.iter().chain(self.right.iter()) {
            result.insert(lane.network);
        }
        result
    }

    fn position_and_direction(
        &self,
        frame: &EnterFrame,
        offset: Distance,
    ) -> Result<(Pt2D, Angle)> {
        let lateral = self.lateral()?;
        Ok((frame.position_at(lateral + offset), frame.inward()))
    }
}

/// A point at a fixed distance along the cut edge, for segments without any lanes.
#[derive(Clone, Debug, PartialEq)]
pub struct PathOffsetSource {
    pub position: Distance,
}

impl PointSource for PathOffsetSource {
    fn location(&self) -> LocationType {
        if self.position < Distance::ZERO {
            LocationType::LeftEdge
        } else if self.position > Distance::ZERO {
            LocationType::RightEdge
        } else {
            LocationType::Between
        }
    }

    fn networks(&self) -> EnumSet<NetworkType> {
        EnumSet::only(NetworkType::Path)
    }

    fn position_and_direction(
        &self,
        frame: &EnterFrame,
        offset: Distance,
    ) -> Result<(Pt2D, Angle)> {
        Ok((frame.position_at(self.position + offset), frame.inward()))
    }
}

/// The sources for every point on a segment end, ordered from left to right.
pub fn sources_for(lanes: &[DriveLane], half_width: Distance) -> Vec<Box<dyn PointSource>> {
    if lanes.is_empty() {
        return vec![
            Box::new(PathOffsetSource {
                position: -half_width,
            }),
            Box::new(PathOffsetSource {
                position: half_width,
            }),
        ];
    }

    let mut result: Vec<Box<dyn PointSource>> = Vec::new();
    for idx in 0..=lanes.len() {
        let left = if idx == 0 { None } else { lanes.get(idx - 1) };
        for source in LanePairSource::between(left, lanes.get(idx)) {
            result.push(Box::new(source));
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LaneID;

    fn lane(id: u32, position: f64, half_width: f64) -> DriveLane {
        DriveLane {
            id: LaneID(id),
            position: Distance::meters(position),
            half_width: Distance::meters(half_width),
            network: NetworkType::Road,
        }
    }

    fn frame() -> EnterFrame {
        EnterFrame {
            position: Pt2D::new(10.0, 0.0),
            normal: Angle::degrees(0.0),
            corner: Angle::degrees(90.0),
            transform_coef: 1.0,
        }
    }

    #[test]
    fn contiguous_lanes() {
        let lanes = vec![lane(0, -1.5, 1.5), lane(1, 1.5, 1.5)];
        let sources = sources_for(&lanes, Distance::meters(3.0));
        let locations: Vec<LocationType> = sources.iter().map(|s| s.location()).collect();
        assert_eq!(
            locations,
            vec![
                LocationType::LeftEdge,
                LocationType::Between,
                LocationType::RightEdge
            ]
        );

        let ys: Vec<f64> = sources
            .iter()
            .map(|s| {
                s.position_and_direction(&frame(), Distance::ZERO)
                    .unwrap()
                    .0
                    .y()
            })
            .collect();
        for (actual, expected) in ys.into_iter().zip(vec![-3.0, 0.0, 3.0]) {
            assert!((actual - expected).abs() < 1e-9);
        }
    }

    #[test]
    fn wide_median_gets_two_points() {
        let lanes = vec![lane(0, -4.0, 1.5), lane(1, 4.0, 1.5)];
        let sources = sources_for(&lanes, Distance::meters(5.5));
        // Left edge, both sides of the median, right edge
        assert_eq!(sources.len(), 4);
        assert_eq!(sources[1].location(), LocationType::RightEdge);
        assert_eq!(sources[2].location(), LocationType::LeftEdge);
    }

    #[test]
    fn offset_and_direction() {
        let source = LanePairSource {
            left: None,
            right: Some(lane(0, 0.0, 1.5)),
            location: LocationType::LeftEdge,
        };
        let (pt, dir) = source
            .position_and_direction(&frame(), Distance::meters(0.5))
            .unwrap();
        assert!(pt.approx_eq(Pt2D::new(10.0, -1.0), geom::EPSILON_DIST));
        assert!(dir.approx_eq(Angle::degrees(180.0), 0.01));

        let broken = LanePairSource {
            left: None,
            right: None,
            location: LocationType::Between,
        };
        assert!(broken
            .position_and_direction(&frame(), Distance::ZERO)
            .is_err());
    }

    #[test]
    fn no_lanes() {
        let sources = sources_for(&[], Distance::meters(2.0));
        assert_eq!(sources.len(), 2);
        assert_eq!(sources[0].networks(), EnumSet::only(NetworkType::Path));
    }
}
