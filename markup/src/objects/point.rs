use std::fmt;

use anyhow::Result;
use enumset::EnumSet;

use geom::{Angle, Distance, Pt2D};

use crate::source::{EnterFrame, LocationType, PointSource};
use crate::{NetworkType, SegmentID};

/// A point is identified by its enter and its 1-based number along that enter, counted from the
/// left.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub struct PointID {
    pub enter: SegmentID,
    pub num: u8,
}

impl PointID {
    pub fn new(enter: SegmentID, num: u8) -> PointID {
        PointID { enter, num }
    }

    /// A stable integer encoding, used when saving.
    pub fn encode_u32(self) -> u32 {
        ((self.enter.0 as u32) << 8) | self.num as u32
    }

    pub fn decode_u32(x: u32) -> PointID {
        PointID {
            enter: SegmentID((x >> 8) as u16),
            num: (x & 0xff) as u8,
        }
    }
}

impl fmt::Display for PointID {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Point {}:{}", self.enter.0, self.num)
    }
}

/// Which half of a split point something uses. Unsplit points only have a center.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub enum Alignment {
    Left,
    Centre,
    Right,
}

impl Alignment {
    pub fn invert(self) -> Alignment {
        match self {
            Alignment::Left => Alignment::Right,
            Alignment::Centre => Alignment::Centre,
            Alignment::Right => Alignment::Left,
        }
    }

    pub fn to_u8(self) -> u8 {
        match self {
            Alignment::Left => 0,
            Alignment::Centre => 1,
            Alignment::Right => 2,
        }
    }

    pub fn from_u8(x: u8) -> Result<Alignment> {
        match x {
            0 => Ok(Alignment::Left),
            1 => Ok(Alignment::Centre),
            2 => Ok(Alignment::Right),
            _ => bail!("unknown alignment {}", x),
        }
    }
}

/// An attachment location on an enter.
#[derive(Debug)]
pub struct MarkupPoint {
    pub id: PointID,
    source: Box<dyn PointSource>,
    /// User adjustment along the cut edge
    offset: Distance,
    split: bool,
    split_offset: Distance,

    frame: EnterFrame,
    position: Pt2D,
    direction: Angle,
}

impl MarkupPoint {
    pub(crate) fn new(
        id: PointID,
        source: Box<dyn PointSource>,
        frame: EnterFrame,
        split_offset: Distance,
    ) -> Result<MarkupPoint> {
        let (position, direction) = source.position_and_direction(&frame, Distance::ZERO)?;
        Ok(MarkupPoint {
            id,
            source,
            offset: Distance::ZERO,
            split: false,
            split_offset,
            frame,
            position,
            direction,
        })
    }

    /// Recomputes the position from the current source, offset and enter geometry.
    pub(crate) fn update(&mut self, frame: EnterFrame) -> Result<()> {
        let (position, direction) = self.source.position_and_direction(&frame, self.offset)?;
        self.frame = frame;
        self.position = position;
        self.direction = direction;
        Ok(())
    }

    /// Swaps in a new source, keeping the user's adjustments.
    pub(crate) fn replace_source(
        &mut self,
        source: Box<dyn PointSource>,
        frame: EnterFrame,
    ) -> Result<()> {
        self.source = source;
        self.update(frame)
    }

    pub(crate) fn set_offset(&mut self, offset: Distance) -> Result<()> {
        self.offset = offset;
        self.update(self.frame)
    }

    pub(crate) fn set_split(&mut self, split: bool, split_offset: Distance) {
        self.split = split;
        self.split_offset = split_offset;
    }

    pub(crate) fn reset(&mut self) -> Result<()> {
        self.split = false;
        self.set_offset(Distance::ZERO)
    }

    pub fn position(&self) -> Pt2D {
        self.position
    }

    /// Pointing into the node
    pub fn direction(&self) -> Angle {
        self.direction
    }

    pub fn offset(&self) -> Distance {
        self.offset
    }

    pub fn is_split(&self) -> bool {
        self.split
    }

    pub fn split_offset(&self) -> Distance {
        self.split_offset
    }

    pub fn location(&self) -> LocationType {
        self.source.location()
    }

    pub fn networks(&self) -> EnumSet<NetworkType> {
        self.source.networks()
    }

    /// Where something using one half of this point attaches. Left and right are along the cut
    /// edge, looking into the node.
    pub fn position_at(&self, alignment: Alignment) -> Pt2D {
        if !self.split {
            return self.position;
        }
        match alignment {
            Alignment::Centre => self.position,
            Alignment::Left => self
                .position
                .project_away(-self.split_offset / self.frame.transform_coef, self.frame.corner),
            Alignment::Right => self
                .position
                .project_away(self.split_offset / self.frame.transform_coef, self.frame.corner),
        }
    }

    /// Unsplit points only have a center, no matter what's asked for.
    pub fn effective_alignment(&self, alignment: Alignment) -> Alignment {
        if self.split {
            alignment
        } else {
            Alignment::Centre
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encoding() {
        let id = PointID::new(SegmentID(513), 7);
        assert_eq!(PointID::decode_u32(id.encode_u32()), id);
        assert!(PointID::new(SegmentID(1), 9) < PointID::new(SegmentID(2), 1));
    }

    #[test]
    fn alignments() {
        for a in [Alignment::Left, Alignment::Centre, Alignment::Right] {
            assert_eq!(a.invert().invert(), a);
            assert_eq!(Alignment::from_u8(a.to_u8()).unwrap(), a);
        }
        assert!(Alignment::from_u8(5).is_err());
    }
}
