use std::fmt;

use crate::contour::FillerContour;
use crate::objects::line::LineID;
use crate::objects::point::PointID;
use crate::render::RenderData;
use crate::style::FillerStyle;

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub struct FillerID(pub usize);

impl fmt::Display for FillerID {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Filler #{}", self.0)
    }
}

/// A closed region, painted or raised.
#[derive(Debug)]
pub struct Filler {
    pub id: FillerID,
    pub contour: FillerContour,
    pub style: FillerStyle,
    pub(crate) render: Option<RenderData>,
}

impl Filler {
    pub(crate) fn new(id: FillerID, contour: FillerContour, style: FillerStyle) -> Filler {
        Filler {
            id,
            contour,
            style,
            render: None,
        }
    }

    pub fn contains_line(&self, line: LineID) -> bool {
        self.contour.contains_line(line)
    }

    pub fn contains_point(&self, point: PointID) -> bool {
        self.contour.contains_point(point)
    }
}
