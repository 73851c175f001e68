use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use geom::Distance;

/// Tunable constants for building render data. Everything has a default, so a JSON file only
/// needs to mention what it changes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkupConfig {
    /// Dashes shorter than this aren't drawn.
    pub min_dash_length: Distance,
    /// Solid lines are split into straight quads wherever they bend more than this many
    /// degrees...
    pub solid_min_angle: f64,
    /// ... unless the piece is already this short.
    pub solid_min_length: Distance,
    pub solid_max_length: Distance,
    /// The same, for the outline of 3D fillers.
    pub filler_min_angle: f64,
    pub filler_min_length: Distance,
    pub filler_max_length: Distance,
    /// How far the two halves of a split point sit from its center.
    pub default_split_offset: Distance,
    /// A render batch never has more vertices than this. Indices are 16 bits, so this can't
    /// exceed 65536.
    pub max_batch_vertices: usize,
}

impl Default for MarkupConfig {
    fn default() -> MarkupConfig {
        MarkupConfig {
            min_dash_length: Distance::const_meters(0.1),
            solid_min_angle: 3.0,
            solid_min_length: Distance::const_meters(1.0),
            solid_max_length: Distance::const_meters(20.0),
            filler_min_angle: 5.0,
            filler_min_length: Distance::const_meters(1.0),
            filler_max_length: Distance::const_meters(10.0),
            default_split_offset: Distance::const_meters(0.5),
            max_batch_vertices: 16_384,
        }
    }
}

impl MarkupConfig {
    pub fn load(path: &str) -> Result<MarkupConfig> {
        let raw = fs_err::read_to_string(path)?;
        let config: MarkupConfig =
            serde_json::from_str(&raw).with_context(|| format!("parsing {}", path))?;
        if config.max_batch_vertices < 4 || config.max_batch_vertices > 65_536 {
            bail!(
                "max_batch_vertices must be in [4, 65536], not {}",
                config.max_batch_vertices
            );
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json() {
        let config: MarkupConfig = serde_json::from_str(r#"{"max_batch_vertices": 400}"#).unwrap();
        assert_eq!(config.max_batch_vertices, 400);
        assert_eq!(config.min_dash_length, MarkupConfig::default().min_dash_length);
    }
}
