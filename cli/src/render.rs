use std::collections::BTreeMap;

use anyhow::Result;

use abstutil::{prettyprint_usize, Counter};
use markup::render::BatchKind;
use markup::{MarkupConfig, NodeID, RenderBatch};

pub fn run(
    network: String,
    markup: String,
    config: Option<String>,
    output: Option<String>,
) -> Result<()> {
    let config = match config {
        Some(path) => MarkupConfig::load(&path)?,
        None => MarkupConfig::default(),
    };
    let (_, mut manager) = crate::load(&network, &markup, config)?;

    let mut triangles: Counter<BatchKind> = Counter::new();
    let mut all: BTreeMap<NodeID, Vec<RenderBatch>> = BTreeMap::new();
    for node in manager.markups_mut() {
        let id = node.id;
        let batches = node.render_batches();
        for batch in batches {
            triangles.add(batch.kind, batch.triangle_count());
        }
        println!(
            "{}: {} batches, {} vertices",
            id,
            batches.len(),
            prettyprint_usize(batches.iter().map(|b| b.vertices.len()).sum())
        );
        if output.is_some() {
            all.insert(id, batches.clone());
        }
    }

    let total = triangles.sum();
    for (kind, count) in triangles.consume() {
        println!("{:?}: {} triangles", kind, prettyprint_usize(count));
    }
    println!("{} triangles total", prettyprint_usize(total));

    if let Some(path) = output {
        // Node IDs aren't strings, so write a list of pairs
        let pairs: Vec<(NodeID, Vec<RenderBatch>)> = all.into_iter().collect();
        fs_err::write(&path, serde_json::to_string(&pairs)?)?;
        info!("Wrote {}", path);
    }
    Ok(())
}
