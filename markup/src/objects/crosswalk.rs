use crate::objects::line::LineID;
use crate::objects::point::PointID;
use crate::render::Dash;
use crate::style::CrosswalkStyle;

/// A pedestrian crossing along one enter, optionally clipped by two border lines.
#[derive(Debug)]
pub struct Crosswalk {
    /// The crosswalk line, between two points on the same enter
    pub line: LineID,
    pub style: CrosswalkStyle,
    left_border: Option<LineID>,
    right_border: Option<LineID>,
    pub(crate) dashes: Option<Vec<Dash>>,
}

impl Crosswalk {
    pub(crate) fn new(line: LineID, style: CrosswalkStyle) -> Crosswalk {
        Crosswalk {
            line,
            style,
            left_border: None,
            right_border: None,
            dashes: None,
        }
    }

    pub fn left_border(&self) -> Option<LineID> {
        self.left_border
    }

    pub fn right_border(&self) -> Option<LineID> {
        self.right_border
    }

    pub(crate) fn set_borders(&mut self, left: Option<LineID>, right: Option<LineID>) {
        self.left_border = left;
        self.right_border = right;
        self.dashes = None;
    }

    pub fn contains_point(&self, point: PointID) -> bool {
        self.line.contains(point)
    }

    pub fn is_border(&self, line: LineID) -> bool {
        self.left_border == Some(line) || self.right_border == Some(line)
    }

    pub(crate) fn remove_border(&mut self, line: LineID) {
        if self.left_border == Some(line) {
            self.left_border = None;
        }
        if self.right_border == Some(line) {
            self.right_border = None;
        }
        self.dashes = None;
    }
}
