//! Turning markup into triangles. Lines and flat fillers become painted quads; raised fillers
//! become meshes. Everything ends up merged into batches.

mod batch;
mod dashes;
mod mesh;

use geom::{Angle, Distance, Line, Pt2D};

use crate::style::{Color, MaterialType};

pub use self::batch::{BatchKind, RenderBatch};
pub use self::dashes::{crosswalk_dashes, dashed, filler_stripes, line_dashes, solid};
pub use self::mesh::{
    enter_corner_radius, filler_render, flat_mesh, raised_meshes, repair_self_intersections,
    round_corners,
};

/// A painted quad along a straight segment.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Dash {
    line: Line,
    pub width: Distance,
    pub color: Color,
}

impl Dash {
    /// None if the dash would be too short to have a direction.
    pub fn new(start: Pt2D, end: Pt2D, width: Distance, color: Color) -> Option<Dash> {
        Some(Dash {
            line: Line::new(start, end)?,
            width,
            color,
        })
    }

    pub fn line(&self) -> &Line {
        &self.line
    }

    pub fn length(&self) -> Distance {
        self.line.length()
    }

    pub fn angle(&self) -> Angle {
        self.line.angle()
    }

    pub fn middle(&self) -> Pt2D {
        self.line.middle()
    }

    /// The quad's corners, clockwise.
    pub fn corners(&self) -> [Pt2D; 4] {
        let left = self.line.shift_either_direction(-self.width / 2.0);
        let right = self.line.shift_either_direction(self.width / 2.0);
        [left.pt1(), left.pt2(), right.pt2(), right.pt1()]
    }
}

/// Triangles ready to be batched. Vertices are `[x, y, height]`.
#[derive(Clone, Debug, PartialEq)]
pub struct Mesh {
    pub kind: BatchKind,
    pub vertices: Vec<[f32; 3]>,
    pub indices: Vec<u16>,
}

impl Mesh {
    pub fn from_dash(dash: &Dash, height: Distance) -> Mesh {
        let z = height.inner_meters() as f32;
        Mesh {
            kind: BatchKind::Paint(dash.color),
            vertices: dash
                .corners()
                .iter()
                .map(|pt| [pt.x() as f32, pt.y() as f32, z])
                .collect(),
            indices: vec![0, 1, 2, 0, 2, 3],
        }
    }

    pub fn surface(material: MaterialType) -> Mesh {
        Mesh {
            kind: BatchKind::Surface(material),
            vertices: Vec::new(),
            indices: Vec::new(),
        }
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// Everything a filler draws, cached until the filler changes.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RenderData {
    pub dashes: Vec<Dash>,
    pub meshes: Vec<Mesh>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dash_quad() {
        let dash = Dash::new(
            Pt2D::new(0.0, 0.0),
            Pt2D::new(10.0, 0.0),
            Distance::meters(2.0),
            Color::WHITE,
        )
        .unwrap();
        let corners = dash.corners();
        assert!(corners[0].approx_eq(Pt2D::new(0.0, 1.0), geom::EPSILON_DIST));
        assert!(corners[2].approx_eq(Pt2D::new(10.0, -1.0), geom::EPSILON_DIST));
        assert_eq!(
            geom::Winding::of_points(&corners),
            geom::Winding::Clockwise
        );

        let mesh = Mesh::from_dash(&dash, Distance::meters(1.0));
        assert_eq!(mesh.triangle_count(), 2);
        assert_eq!(mesh.vertices[0][2], 1.0);

        assert!(Dash::new(Pt2D::zero(), Pt2D::zero(), Distance::meters(1.0), Color::WHITE).is_none());
    }
}
