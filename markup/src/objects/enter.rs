use anyhow::Result;

use geom::{Angle, Distance, Pt2D};

use crate::objects::point::{MarkupPoint, PointID};
use crate::source::{sources_for, EnterFrame, PointSource};
use crate::{HostNetwork, MarkupConfig, NodeID, SegmentEnd, SegmentID};

/// Skewed cut edges stretch distances by 1 / coef; don't let that explode.
const MIN_TRANSFORM_COEF: f64 = 0.1;

/// Where one segment meets the node, with its attachment points ordered from left to right.
#[derive(Debug)]
pub struct Enter {
    pub id: SegmentID,
    frame: EnterFrame,
    half_width: Distance,
    points: Vec<MarkupPoint>,
}

impl Enter {
    pub(crate) fn new(
        node: NodeID,
        id: SegmentID,
        host: &dyn HostNetwork,
        config: &MarkupConfig,
    ) -> Result<Enter> {
        let end = segment_end(node, id, host)?;
        let frame = frame_for(&end);
        let points = build_points(id, sources_for(&end.lanes, end.half_width), frame, config)?;
        Ok(Enter {
            id,
            frame,
            half_width: end.half_width,
            points,
        })
    }

    /// Refreshes the geometry from the host. If the number of points stays the same, the existing
    /// points keep their adjustments. Otherwise they're all rebuilt, and this returns true.
    pub(crate) fn update(
        &mut self,
        node: NodeID,
        host: &dyn HostNetwork,
        config: &MarkupConfig,
    ) -> Result<bool> {
        let end = segment_end(node, self.id, host)?;
        let frame = frame_for(&end);
        let sources = sources_for(&end.lanes, end.half_width);

        if sources.len() == self.points.len() {
            self.half_width = end.half_width;
            self.frame = frame;
            for (point, source) in self.points.iter_mut().zip(sources) {
                point.replace_source(source, frame)?;
            }
            return Ok(false);
        }

        warn!(
            "{} now has {} points instead of {}",
            self.id,
            sources.len(),
            self.points.len()
        );
        self.points = build_points(self.id, sources, frame, config)?;
        self.half_width = end.half_width;
        self.frame = frame;
        Ok(true)
    }

    pub fn frame(&self) -> &EnterFrame {
        &self.frame
    }

    pub fn position(&self) -> Pt2D {
        self.frame.position
    }

    /// Pointing away from the node
    pub fn normal_dir(&self) -> Angle {
        self.frame.normal
    }

    pub fn corner_dir(&self) -> Angle {
        self.frame.corner
    }

    /// Enters are ordered around the node by this.
    pub fn absolute_angle(&self) -> f64 {
        self.frame.normal.normalized_radians()
    }

    pub fn half_width(&self) -> Distance {
        self.half_width
    }

    /// The left end of the cut edge
    pub fn left_side(&self) -> Pt2D {
        self.frame.position_at(-self.half_width)
    }

    pub fn right_side(&self) -> Pt2D {
        self.frame.position_at(self.half_width)
    }

    pub fn points(&self) -> &Vec<MarkupPoint> {
        &self.points
    }

    pub fn point_count(&self) -> usize {
        self.points.len()
    }

    pub fn get_point(&self, num: u8) -> Option<&MarkupPoint> {
        if num == 0 {
            return None;
        }
        self.points.get(num as usize - 1)
    }

    pub(crate) fn get_point_mut(&mut self, num: u8) -> Option<&mut MarkupPoint> {
        if num == 0 {
            return None;
        }
        self.points.get_mut(num as usize - 1)
    }

    pub(crate) fn reset_points(&mut self) -> Result<()> {
        for point in &mut self.points {
            point.reset()?;
        }
        Ok(())
    }
}

fn segment_end(node: NodeID, id: SegmentID, host: &dyn HostNetwork) -> Result<SegmentEnd> {
    host.segment_end(id, node)
        .ok_or_else(|| anyhow!("{} doesn't touch {}", id, node))
}

fn frame_for(end: &SegmentEnd) -> EnterFrame {
    let skew = (end.corner.normalized_radians() - end.direction.normalized_radians()).sin();
    EnterFrame {
        position: end.position,
        normal: end.direction,
        corner: end.corner,
        transform_coef: skew.abs().max(MIN_TRANSFORM_COEF),
    }
}

/// Points are numbered from 1, and the number has to fit in a u8.
fn build_points(
    id: SegmentID,
    sources: Vec<Box<dyn PointSource>>,
    frame: EnterFrame,
    config: &MarkupConfig,
) -> Result<Vec<MarkupPoint>> {
    if sources.len() > u8::MAX as usize {
        bail!("{} has {} points, too many to number", id, sources.len());
    }
    let mut points = Vec::new();
    for (num, source) in (1..=u8::MAX).zip(sources) {
        points.push(MarkupPoint::new(
            PointID::new(id, num),
            source,
            frame,
            config.default_split_offset,
        )?);
    }
    Ok(points)
}
