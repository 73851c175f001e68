//! Tools for working with saved intersection markup outside of a host application: inspecting,
//! rendering and re-saving it against a road network stored as JSON.

#[macro_use]
extern crate anyhow;
#[macro_use]
extern crate log;

mod render;

use anyhow::Result;
use structopt::StructOpt;

use abstutil::prettyprint_usize;
use markup::perma::{parse_xml, write_xml};
use markup::{LineType, MarkupConfig, MarkupManager, NodeID, ObjectsMap, StaticNetwork};

#[derive(StructOpt)]
#[structopt(name = "markup_cli", about = "Inspect and convert intersection markup")]
enum Command {
    /// Writes a road network with one node and evenly spaced segments, to try things out
    GenerateCrossing {
        /// How many segments meet at the node
        #[structopt(long, default_value = "4")]
        arms: usize,
        /// Lanes in each direction, on every segment
        #[structopt(long, default_value = "2")]
        lanes_per_side: usize,
        /// The JSON file to write
        #[structopt(long)]
        output: String,
    },
    /// Summarizes every node's markup in a saved file
    Describe {
        /// The path to a JSON road network
        #[structopt(long)]
        network: String,
        /// The path to saved markup XML
        #[structopt(long)]
        markup: String,
    },
    /// Builds render batches for every node and prints their sizes
    Render {
        /// The path to a JSON road network
        #[structopt(long)]
        network: String,
        /// The path to saved markup XML
        #[structopt(long)]
        markup: String,
        /// Optional JSON overriding some render settings
        #[structopt(long)]
        config: Option<String>,
        /// Also write the batches as JSON here
        #[structopt(long)]
        output: Option<String>,
    },
    /// Loads markup and saves it again. Anything that no longer fits the network is dropped.
    Roundtrip {
        /// The path to a JSON road network
        #[structopt(long)]
        network: String,
        /// The path to saved markup XML
        #[structopt(long)]
        markup: String,
        /// The XML file to write
        #[structopt(long)]
        output: String,
    },
}

fn main() -> Result<()> {
    abstutil::logger::setup();

    match Command::from_args() {
        Command::GenerateCrossing {
            arms,
            lanes_per_side,
            output,
        } => generate_crossing(arms, lanes_per_side, output)?,
        Command::Describe { network, markup } => describe(network, markup)?,
        Command::Render {
            network,
            markup,
            config,
            output,
        } => render::run(network, markup, config, output)?,
        Command::Roundtrip {
            network,
            markup,
            output,
        } => roundtrip(network, markup, output)?,
    }
    Ok(())
}

fn generate_crossing(arms: usize, lanes_per_side: usize, output: String) -> Result<()> {
    if arms == 0 {
        bail!("a crossing needs at least one segment");
    }
    let network = StaticNetwork::crossing(NodeID(1), arms, lanes_per_side);
    fs_err::write(&output, serde_json::to_string_pretty(&network)?)?;
    info!("Wrote {}", output);
    Ok(())
}

/// Loads a network and the markup saved for it.
pub fn load(
    network: &str,
    markup: &str,
    config: MarkupConfig,
) -> Result<(StaticNetwork, MarkupManager)> {
    let network = StaticNetwork::load(network)?;
    let root = parse_xml(&fs_err::read_to_string(markup)?)?;
    let mut manager = MarkupManager::new(config);
    let loaded = manager.load_xml(&root, &network, &ObjectsMap::new());
    info!("Loaded markup for {} nodes", prettyprint_usize(loaded));
    if let Some(notice) = manager.load_error_notice() {
        warn!("{}", notice);
    }
    Ok((network, manager))
}

fn describe(network: String, markup: String) -> Result<()> {
    let (_, manager) = load(&network, &markup, MarkupConfig::default())?;
    for node in manager.markups() {
        let counts = node.line_counts();
        println!(
            "{}: {} enters, {} lines ({} regular, {} stop, {} crosswalk), {} fillers, {} \
             crossings",
            node.id,
            node.enters().len(),
            prettyprint_usize(counts.sum()),
            prettyprint_usize(counts.get(LineType::Regular)),
            prettyprint_usize(counts.get(LineType::Stop)),
            prettyprint_usize(counts.get(LineType::Crosswalk)),
            prettyprint_usize(node.fillers().count()),
            prettyprint_usize(node.intersects().len()),
        );
        for enter in node.enters() {
            let dependences = node.get_enter_dependences(enter.id);
            if dependences.exist() {
                println!("  {}: {}", enter.id, dependences.describe());
            }
        }
    }
    Ok(())
}

fn roundtrip(network: String, markup: String, output: String) -> Result<()> {
    let (_, manager) = load(&network, &markup, MarkupConfig::default())?;
    fs_err::write(&output, write_xml(&manager.to_xml())?)?;
    info!("Wrote {}", output);
    Ok(())
}
