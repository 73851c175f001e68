//! Road markings painted inside intersections: the points where lanes meet a node, lines between
//! them, fillers and crosswalks built from those lines, and the render data for all of it.

#[macro_use]
extern crate anyhow;
#[macro_use]
extern crate log;

mod config;
pub mod contour;
mod host;
mod manager;
mod markup;
pub mod objects;
pub mod perma;
pub mod render;
pub mod source;
pub mod style;

pub use crate::config::MarkupConfig;
pub use crate::contour::{ContourLine, FillerContour, FillerVertex};
pub use crate::host::{
    DriveLane, HostNetwork, LaneID, NetworkType, NodeID, NodeInfo, SegmentEnd, SegmentID,
    StaticNetwork,
};
pub use crate::manager::MarkupManager;
pub use crate::markup::{ConnectionStyle, Dependences, Markup, MarkupBackup};
pub use crate::objects::{
    Alignment, FillerID, LineID, LineIntersection, LinePair, LineRule, LineType, PointID,
    PointPair, RuleEdge,
};
pub use crate::perma::ObjectsMap;
pub use crate::render::RenderBatch;
