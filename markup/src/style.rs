//! How markup looks. Each family of objects has its own closed set of styles.

use std::fmt;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use geom::{Angle, Distance};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const WHITE: Color = Color::rgba(255, 255, 255, 255);
    pub const YELLOW: Color = Color::rgba(255, 204, 0, 255);

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Color {
        Color { r, g, b, a }
    }

    pub fn to_hex(self) -> String {
        format!("{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
    }

    pub fn from_hex(raw: &str) -> Result<Color> {
        if raw.len() != 8 || !raw.is_ascii() {
            bail!("bad color {}", raw);
        }
        let channel = |idx: usize| {
            u8::from_str_radix(&raw[idx..idx + 2], 16).map_err(|_| anyhow!("bad color {}", raw))
        };
        Ok(Color::rgba(channel(0)?, channel(2)?, channel(4)?, channel(6)?))
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "#{}", self.to_hex())
    }
}

/// How one rule of a regular line is painted.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LineStyle {
    Solid {
        color: Color,
        width: Distance,
    },
    Dashed {
        color: Color,
        width: Distance,
        dash_length: Distance,
        space_length: Distance,
    },
    /// Two solid lines, each `offset` away from the trajectory
    DoubleSolid {
        color: Color,
        width: Distance,
        offset: Distance,
    },
    DoubleDashed {
        color: Color,
        width: Distance,
        dash_length: Distance,
        space_length: Distance,
        offset: Distance,
    },
}

impl LineStyle {
    pub fn default_solid() -> LineStyle {
        LineStyle::Solid {
            color: Color::WHITE,
            width: Distance::meters(0.15),
        }
    }

    pub fn default_dashed() -> LineStyle {
        LineStyle::Dashed {
            color: Color::WHITE,
            width: Distance::meters(0.15),
            dash_length: Distance::meters(1.5),
            space_length: Distance::meters(1.5),
        }
    }

    pub fn color(&self) -> Color {
        match self {
            LineStyle::Solid { color, .. }
            | LineStyle::Dashed { color, .. }
            | LineStyle::DoubleSolid { color, .. }
            | LineStyle::DoubleDashed { color, .. } => *color,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum StopLineStyle {
    Solid {
        color: Color,
        width: Distance,
    },
    Dashed {
        color: Color,
        width: Distance,
        dash_length: Distance,
        space_length: Distance,
    },
}

impl StopLineStyle {
    pub fn default_solid() -> StopLineStyle {
        StopLineStyle::Solid {
            color: Color::WHITE,
            width: Distance::meters(0.3),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CrosswalkStyle {
    /// The road already has a crosswalk; only reserve the space.
    Existent { width: Distance },
    Zebra {
        color: Color,
        /// How deep the band is, into the node
        width: Distance,
        offset_before: Distance,
        dash_length: Distance,
        space_length: Distance,
    },
    DoubleSolid {
        color: Color,
        width: Distance,
        offset_before: Distance,
        line_width: Distance,
    },
}

impl CrosswalkStyle {
    pub fn default_zebra() -> CrosswalkStyle {
        CrosswalkStyle::Zebra {
            color: Color::WHITE,
            width: Distance::meters(2.0),
            offset_before: Distance::meters(0.3),
            dash_length: Distance::meters(0.4),
            space_length: Distance::meters(0.6),
        }
    }

    /// How far into the node the crosswalk reaches.
    pub fn total_width(&self) -> Distance {
        match self {
            CrosswalkStyle::Existent { width } => *width,
            CrosswalkStyle::Zebra {
                width,
                offset_before,
                ..
            }
            | CrosswalkStyle::DoubleSolid {
                width,
                offset_before,
                ..
            } => *width + *offset_before,
        }
    }
}

/// The settings shared by every raised filler.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Filler3D {
    pub elevation: Distance,
    pub corner_radius: Distance,
    /// Used for corners next to an enter
    pub median_corner_radius: Distance,
}

impl Default for Filler3D {
    fn default() -> Filler3D {
        Filler3D {
            elevation: Distance::meters(0.3),
            corner_radius: Distance::meters(0.5),
            median_corner_radius: Distance::meters(0.5),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MaterialType {
    Pavement,
    Grass,
    Gravel,
    Ruined,
    Cliff,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FillerStyle {
    /// Parallel stripes at `angle`, `step` apart
    Stripe {
        color: Color,
        width: Distance,
        step: Distance,
        angle: Angle,
    },
    /// Two sets of stripes, perpendicular to each other
    Grid {
        color: Color,
        width: Distance,
        step: Distance,
        angle: Angle,
    },
    Solid {
        color: Color,
    },
    Raised {
        material: MaterialType,
        settings: Filler3D,
    },
}

impl FillerStyle {
    pub fn default_stripe() -> FillerStyle {
        FillerStyle::Stripe {
            color: Color::WHITE,
            width: Distance::meters(0.15),
            step: Distance::meters(1.0),
            angle: Angle::degrees(45.0),
        }
    }

    pub fn raised(material: MaterialType) -> FillerStyle {
        FillerStyle::Raised {
            material,
            settings: Filler3D::default(),
        }
    }

    pub fn is_raised(&self) -> bool {
        matches!(self, FillerStyle::Raised { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_colors() {
        assert_eq!(Color::YELLOW.to_hex(), "ffcc00ff");
        assert_eq!(Color::from_hex("ffcc00ff").unwrap(), Color::YELLOW);
        assert!(Color::from_hex("fff").is_err());
        assert!(Color::from_hex("gg0000ff").is_err());
    }
}
