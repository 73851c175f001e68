use anyhow::Result;

use crate::{Pt2D, Winding};

// Deliberately not serializable
/// A tessellated polygon, ready for rendering.
#[derive(Clone, Debug)]
pub struct Tessellation {
    /// These are the polygon's points in their original order.
    points: Vec<Pt2D>,
    /// Groups of three indices make up the triangles
    indices: Vec<u16>,
}

impl Tessellation {
    /// The `points` are a simple polygon without a repeated last point. They may contain
    /// collinear runs; that's fine.
    pub fn from_ring(points: Vec<Pt2D>) -> Result<Self> {
        if points.len() < 3 {
            bail!("Can't triangulate {} points", points.len());
        }

        let mut vertices = Vec::new();
        for pt in &points {
            vertices.push(pt.x());
            vertices.push(pt.y());
        }
        let indices = downsize(
            earcutr::earcut(&vertices, &Vec::new(), 2)
                .map_err(|err| anyhow!("earcut failed: {:?}", err))?,
        )?;
        if indices.is_empty() {
            bail!("Triangulating {} points produced nothing", points.len());
        }

        Ok(Self { points, indices })
    }

    /// Makes every triangle wind the same way.
    pub fn with_winding(mut self, winding: Winding) -> Self {
        for tri in self.indices.chunks_exact_mut(3) {
            let pts = [
                self.points[tri[0] as usize],
                self.points[tri[1] as usize],
                self.points[tri[2] as usize],
            ];
            if Winding::of_points(&pts) != winding {
                tri.swap(1, 2);
            }
        }
        self
    }

    pub fn points(&self) -> &Vec<Pt2D> {
        &self.points
    }

    pub fn indices(&self) -> &Vec<u16> {
        &self.indices
    }

    /// Returns (points, indices) for rendering
    pub fn consume(self) -> (Vec<Pt2D>, Vec<u16>) {
        (self.points, self.indices)
    }
}

pub fn downsize(input: Vec<usize>) -> Result<Vec<u16>> {
    let mut output = Vec::new();
    for x in input {
        if let Ok(x) = u16::try_from(x) {
            output.push(x);
        } else {
            bail!("{} can't fit in u16, some polygon is too huge", x);
        }
    }
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn concave_polygon_winds_clockwise() {
        // An L shape
        let pts = vec![
            Pt2D::new(0.0, 0.0),
            Pt2D::new(10.0, 0.0),
            Pt2D::new(10.0, 4.0),
            Pt2D::new(4.0, 4.0),
            Pt2D::new(4.0, 10.0),
            Pt2D::new(0.0, 10.0),
        ];
        let tess = Tessellation::from_ring(pts)
            .unwrap()
            .with_winding(Winding::Clockwise);
        assert_eq!(tess.indices().len(), 12);
        for tri in tess.indices().chunks_exact(3) {
            let pts: Vec<Pt2D> = tri.iter().map(|i| tess.points()[*i as usize]).collect();
            assert_eq!(Winding::of_points(&pts), Winding::Clockwise);
        }
    }

    #[test]
    fn too_few_points() {
        assert!(Tessellation::from_ring(vec![Pt2D::new(0.0, 0.0), Pt2D::new(1.0, 0.0)]).is_err());
    }
}
