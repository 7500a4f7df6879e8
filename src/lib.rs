//! Netlist-to-schematic renderer (n2s). Reads a flattened yosys JSON
//! netlist, rebuilds the circuit's structure (constants, bus splits and
//! joins, nets), lays it out, and draws an SVG schematic.
//!
//! ```no_run
//! use std::{fs::File, io::BufReader};
//!
//! use netschem::{layout::LayeredEngine, netlist::Netlist, render_flow, skin::Skin};
//!
//! let file = File::open("counter.json").unwrap();
//! let netlist: Netlist = serde_json::from_reader(BufReader::new(file)).unwrap();
//! let svg = render_flow(&netlist, None, &Skin::default(), &LayeredEngine).unwrap();
//! println!("{}", svg);
//! ```

use clap::Parser;
use log::debug;

use crate::{
	circuit::Circuit,
	layout::LayoutEngine,
	layout_graph::{build_layout_graph, LayoutGraph},
	netlist::Netlist,
	skin::Skin,
};

pub mod circuit;
pub mod decompose;
pub mod fold;
pub mod layout;
pub mod layout_graph;
pub mod netlist;
pub mod post_process;
pub mod skin;
pub mod svg;

mod util;

#[cfg(test)]
mod tests;

#[derive(Debug)]
pub enum Error {
	SerializationError(serde_json::Error),
	IOError(std::io::Error),
	NoSuchModule(String),
	EmptyNetlist,
	LayoutError(String),
}

impl From<serde_json::Error> for Error {
	fn from(value: serde_json::Error) -> Self {
		Self::SerializationError(value)
	}
}

impl From<std::io::Error> for Error {
	fn from(value: std::io::Error) -> Self {
		Self::IOError(value)
	}
}

pub type Result<T> = std::result::Result<T, Error>;

/// Netlist to schematic SVG renderer (n2s)
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
	/// Input flattened yosys netlist, .json.
	#[arg(short, long)]
	pub input_file: std::path::PathBuf,

	/// Output file. Defaults to stdout.
	#[arg(short, long)]
	pub output_file: Option<std::path::PathBuf>,

	/// Module to render. Defaults to the module tagged `top`, or the first.
	#[arg(short, long)]
	pub module: Option<String>,

	/// Dump the pre-layout graph as JSON instead of rendering.
	#[arg(long)]
	pub dump_graph: bool,
}

/// Run the structural stages on one module of a netlist and return the
/// pre-layout graph.
pub fn graph_flow(netlist: &Netlist, module: Option<&str>, skin: &Skin) -> Result<LayoutGraph> {
	let (name, module) = netlist.select_module(module)?;
	debug!("rendering module {}", name);
	let mut circuit = Circuit::build_from(name, module, skin);
	if skin.constants {
		let max_id = fold::fold_constants(&mut circuit);
		debug!("constants folded, max signal id {}", max_id);
	}
	if skin.splits_and_joins {
		decompose::add_splits_joins(&mut circuit);
	}
	circuit.create_wires(skin);
	debug!(
		"{} cells on {} wires",
		circuit.cells().len(),
		circuit.wires().len()
	);
	Ok(build_layout_graph(&circuit, skin))
}

/// The whole pipeline: structure, layout, dummy cleanup, SVG.
pub fn render_flow(
	netlist: &Netlist,
	module: Option<&str>,
	skin: &Skin,
	engine: &dyn LayoutEngine,
) -> Result<String> {
	let graph = graph_flow(netlist, module, skin)?;
	let mut graph = engine.layout(graph, &skin.layout_options)?;
	post_process::remove_dummy_edges(&mut graph);
	Ok(svg::render_svg(&graph, skin))
}
