use std::collections::BTreeMap;

use serde::Serialize;

use crate::render::Mesh;
use crate::style::{Color, MaterialType};

/// What a batch is drawn with: one paint color, or one surface material.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum BatchKind {
    Paint(Color),
    Surface(MaterialType),
}

/// Many meshes of the same kind, merged into one vertex/index buffer.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RenderBatch {
    pub kind: BatchKind,
    pub vertices: Vec<[f32; 3]>,
    pub indices: Vec<u16>,
}

impl RenderBatch {
    fn new(kind: BatchKind) -> RenderBatch {
        RenderBatch {
            kind,
            vertices: Vec::new(),
            indices: Vec::new(),
        }
    }

    /// Groups meshes by kind, starting a new batch whenever one would exceed `max_vertices`.
    pub fn build<'a, I: IntoIterator<Item = &'a Mesh>>(
        meshes: I,
        max_vertices: usize,
    ) -> Vec<RenderBatch> {
        let max_vertices = max_vertices.min(u16::MAX as usize + 1);
        let mut by_kind: BTreeMap<BatchKind, Vec<&Mesh>> = BTreeMap::new();
        for mesh in meshes {
            by_kind.entry(mesh.kind).or_insert_with(Vec::new).push(mesh);
        }

        let mut result = Vec::new();
        for (kind, meshes) in by_kind {
            let mut current = RenderBatch::new(kind);
            for mesh in meshes {
                if mesh.vertices.len() > max_vertices {
                    warn!(
                        "Skipping a {:?} mesh with {} vertices; batches hold at most {}",
                        kind,
                        mesh.vertices.len(),
                        max_vertices
                    );
                    continue;
                }
                if current.vertices.len() + mesh.vertices.len() > max_vertices {
                    result.push(std::mem::replace(&mut current, RenderBatch::new(kind)));
                }
                let base = current.vertices.len() as u16;
                current.vertices.extend(mesh.vertices.iter().copied());
                current
                    .indices
                    .extend(mesh.indices.iter().map(|idx| base + *idx));
            }
            if !current.vertices.is_empty() {
                result.push(current);
            }
        }
        result
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad(kind: BatchKind) -> Mesh {
        Mesh {
            kind,
            vertices: vec![[0.0; 3]; 4],
            indices: vec![0, 1, 2, 0, 2, 3],
        }
    }

    #[test]
    fn split_by_kind_and_size() {
        let white = BatchKind::Paint(Color::WHITE);
        let grass = BatchKind::Surface(MaterialType::Grass);
        let meshes = vec![quad(white), quad(grass), quad(white), quad(white)];
        let batches = RenderBatch::build(&meshes, 8);

        let white_batches: Vec<&RenderBatch> = batches.iter().filter(|b| b.kind == white).collect();
        assert_eq!(white_batches.len(), 2);
        assert_eq!(white_batches[0].vertices.len(), 8);
        assert_eq!(white_batches[0].indices[6..], [4, 5, 6, 4, 6, 7]);
        assert_eq!(white_batches[1].vertices.len(), 4);
        assert_eq!(
            batches.iter().filter(|b| b.kind == grass).count(),
            1
        );
        for batch in &batches {
            assert!(batch.indices.iter().all(|i| (*i as usize) < batch.vertices.len()));
        }
    }
}
