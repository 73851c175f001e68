//! The road network that markup is attached to. Markup never owns this data; it only reads it
//! through `HostNetwork` whenever it needs to refresh.

use std::collections::BTreeMap;
use std::fmt;

use anyhow::{Context, Result};
use enumset::{EnumSet, EnumSetType};
use serde::{Deserialize, Serialize};

use abstutil::{contains_duplicates, deserialize_btreemap, serialize_btreemap};
use geom::{Angle, Distance, Pt2D};

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeID(pub u16);

impl fmt::Display for NodeID {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Node #{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SegmentID(pub u16);

impl fmt::Display for SegmentID {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Segment #{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LaneID(pub u32);

impl fmt::Display for LaneID {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Lane #{}", self.0)
    }
}

/// What kind of traffic a lane carries.
#[derive(Debug, Serialize, Deserialize, PartialOrd, Ord, EnumSetType)]
pub enum NetworkType {
    Road,
    Track,
    Taxiway,
    Path,
}

/// A lane as seen from the node's cut edge.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DriveLane {
    pub id: LaneID,
    /// The lane's center, measured perpendicular to the road from the segment's center line.
    /// Negative values are on the left side of the cut edge, looking into the node.
    pub position: Distance,
    pub half_width: Distance,
    pub network: NetworkType,
}

impl DriveLane {
    pub fn left_edge(&self) -> Distance {
        self.position - self.half_width
    }

    pub fn right_edge(&self) -> Distance {
        self.position + self.half_width
    }
}

/// Where one segment meets a node.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SegmentEnd {
    /// Where the segment's center line crosses the cut edge
    pub position: Pt2D,
    /// Pointing away from the node, along the road
    pub direction: Angle,
    /// The direction of the cut edge, from its left end to its right end looking into the node.
    /// For a square end, this is `direction` rotated by 90 degrees.
    pub corner: Angle,
    pub half_width: Distance,
    /// Ordered from left to right
    pub lanes: Vec<DriveLane>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NodeInfo {
    pub position: Pt2D,
    pub height: Distance,
    pub segments: Vec<SegmentID>,
}

/// Read access to the host's road network.
pub trait HostNetwork {
    /// None if the node doesn't exist (anymore).
    fn node(&self, id: NodeID) -> Option<NodeInfo>;
    fn segment_end(&self, segment: SegmentID, node: NodeID) -> Option<SegmentEnd>;
}

/// A road network held in memory. Used by tools and tests, and loadable from JSON.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct StaticNetwork {
    #[serde(
        serialize_with = "serialize_btreemap",
        deserialize_with = "deserialize_btreemap"
    )]
    pub nodes: BTreeMap<NodeID, NodeInfo>,
    #[serde(
        serialize_with = "serialize_btreemap",
        deserialize_with = "deserialize_btreemap"
    )]
    pub ends: BTreeMap<(SegmentID, NodeID), SegmentEnd>,
}

impl HostNetwork for StaticNetwork {
    fn node(&self, id: NodeID) -> Option<NodeInfo> {
        self.nodes.get(&id).cloned()
    }

    fn segment_end(&self, segment: SegmentID, node: NodeID) -> Option<SegmentEnd> {
        self.ends.get(&(segment, node)).cloned()
    }
}

/// Lanes in the generated networks are this wide.
const LANE_WIDTH: f64 = 3.0;
/// Generated segments end this far from the node's center.
const ARM_LENGTH: f64 = 10.0;

impl StaticNetwork {
    pub fn new() -> StaticNetwork {
        StaticNetwork::default()
    }

    pub fn load(path: &str) -> Result<StaticNetwork> {
        let raw = fs_err::read_to_string(path)?;
        let network: StaticNetwork =
            serde_json::from_str(&raw).with_context(|| format!("parsing {}", path))?;
        for (id, info) in &network.nodes {
            if contains_duplicates(&info.segments) {
                bail!("{} lists some segment twice", id);
            }
            for segment in &info.segments {
                if !network.ends.contains_key(&(*segment, *id)) {
                    bail!("{} has no end at {}", segment, id);
                }
            }
        }
        Ok(network)
    }

    pub fn add_node(&mut self, id: NodeID, position: Pt2D, height: Distance) {
        self.nodes.insert(
            id,
            NodeInfo {
                position,
                height,
                segments: Vec::new(),
            },
        );
    }

    pub fn remove_node(&mut self, id: NodeID) {
        self.nodes.remove(&id);
        self.ends.retain(|(_, node), _| *node != id);
    }

    /// Connects a segment to a node. Replaces the previous end, if the segment was already there.
    pub fn attach(&mut self, node: NodeID, segment: SegmentID, end: SegmentEnd) -> Result<()> {
        let info = self
            .nodes
            .get_mut(&node)
            .ok_or_else(|| anyhow!("can't attach {} to missing {}", segment, node))?;
        if !info.segments.contains(&segment) {
            info.segments.push(segment);
        }
        self.ends.insert((segment, node), end);
        Ok(())
    }

    pub fn detach(&mut self, node: NodeID, segment: SegmentID) {
        if let Some(info) = self.nodes.get_mut(&node) {
            info.segments.retain(|s| *s != segment);
        }
        self.ends.remove(&(segment, node));
    }

    /// A square segment end, `distance` away from `center` in `direction`, carrying
    /// `lanes_per_side` lanes in each direction.
    pub fn square_end(
        center: Pt2D,
        direction: Angle,
        distance: Distance,
        lanes_per_side: usize,
        first_lane: u32,
    ) -> SegmentEnd {
        let total = 2 * lanes_per_side;
        let half_width = Distance::meters(LANE_WIDTH * total as f64 / 2.0);
        let lanes = (0..total)
            .map(|idx| DriveLane {
                id: LaneID(first_lane + idx as u32),
                position: Distance::meters(LANE_WIDTH * (idx as f64 + 0.5)) - half_width,
                half_width: Distance::meters(LANE_WIDTH / 2.0),
                network: NetworkType::Road,
            })
            .collect();
        SegmentEnd {
            position: center.project_away(distance, direction),
            direction,
            corner: direction.rotate_degs(90.0),
            half_width,
            lanes,
        }
    }

    /// One node at the origin, with `arms` segments spread evenly around it. Segment `i + 1`
    /// leaves in the direction `i * 360 / arms` degrees.
    pub fn crossing(node: NodeID, arms: usize, lanes_per_side: usize) -> StaticNetwork {
        let mut network = StaticNetwork::new();
        network.add_node(node, Pt2D::zero(), Distance::ZERO);
        for idx in 0..arms {
            let direction = Angle::degrees(360.0 * idx as f64 / arms as f64);
            let end = StaticNetwork::square_end(
                Pt2D::zero(),
                direction,
                Distance::meters(ARM_LENGTH),
                lanes_per_side,
                (idx * 2 * lanes_per_side) as u32,
            );
            // The node was just added
            network.ends.insert((SegmentID(idx as u16 + 1), node), end);
            if let Some(info) = network.nodes.get_mut(&node) {
                info.segments.push(SegmentID(idx as u16 + 1));
            }
        }
        network
    }

    /// All the kinds of traffic that pass through a node.
    pub fn networks_at(&self, node: NodeID) -> EnumSet<NetworkType> {
        let mut result = EnumSet::new();
        for ((_, n), end) in &self.ends {
            if *n == node {
                for lane in &end.lanes {
                    result.insert(lane.network);
                }
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crossing_layout() {
        let network = StaticNetwork::crossing(NodeID(1), 4, 2);
        let node = network.node(NodeID(1)).unwrap();
        assert_eq!(node.segments.len(), 4);

        let east = network.segment_end(SegmentID(1), NodeID(1)).unwrap();
        assert!(east.position.approx_eq(Pt2D::new(10.0, 0.0), geom::EPSILON_DIST));
        assert_eq!(east.lanes.len(), 4);
        assert_eq!(east.half_width, Distance::meters(6.0));
        assert_eq!(east.lanes[0].left_edge(), Distance::meters(-6.0));
        assert_eq!(east.lanes[3].right_edge(), Distance::meters(6.0));
        assert_eq!(
            network.networks_at(NodeID(1)),
            EnumSet::only(NetworkType::Road)
        );
    }

    #[test]
    fn detach_and_json() {
        let mut network = StaticNetwork::crossing(NodeID(1), 3, 1);
        network.detach(NodeID(1), SegmentID(2));
        assert_eq!(
            network.node(NodeID(1)).unwrap().segments,
            vec![SegmentID(1), SegmentID(3)]
        );
        assert!(network.segment_end(SegmentID(2), NodeID(1)).is_none());

        let json = serde_json::to_string(&network).unwrap();
        let copy: StaticNetwork = serde_json::from_str(&json).unwrap();
        assert_eq!(copy.nodes, network.nodes);
        assert_eq!(copy.ends, network.ends);
    }
}
