use std::{fs::File, io::BufReader};

use clap::Parser;
use netschem::{graph_flow, layout::LayeredEngine, netlist::Netlist, render_flow, skin::Skin, Args};

fn main() {
	env_logger::init();
	let args = Args::parse();
	let file = File::open(args.input_file).unwrap();
	let reader = BufReader::new(file);
	let netlist: Netlist = serde_json::from_reader(reader).unwrap();
	let skin = Skin::default();
	let output = if args.dump_graph {
		let graph = graph_flow(&netlist, args.module.as_deref(), &skin).unwrap();
		serde_json::to_string_pretty(&graph).unwrap()
	} else {
		render_flow(&netlist, args.module.as_deref(), &skin, &LayeredEngine).unwrap()
	};
	match args.output_file {
		Some(path) => std::fs::write(path, output).unwrap(),
		None => println!("{}", output),
	}
}
