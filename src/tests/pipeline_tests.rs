//! End-to-end runs of the pipeline on small handwritten netlists.

use crate::{
	graph_flow,
	layout::{LayeredEngine, LayoutEngine},
	netlist::Netlist,
	post_process::remove_dummy_edges,
	render_flow,
	skin::Skin,
	Error,
};

fn parse(json: &str) -> Netlist {
	serde_json::from_str(json).unwrap()
}

#[test]
fn bus_taps_show_up_as_a_split_node() {
	let netlist = parse(
		r#"{
		"modules": {
			"taps": {
				"ports": {
					"bus": { "direction": "input", "bits": [10, 11, 12, 13] },
					"mid": { "direction": "output", "bits": [11, 12] },
					"top": { "direction": "output", "bits": [13] }
				},
				"cells": {}
			}
		}
	}"#,
	);
	let skin = Skin::default();
	let graph = graph_flow(&netlist, None, &skin).unwrap();

	let split = graph
		.children
		.iter()
		.find(|n| n.id == "$split$,10,11,12,13,")
		.expect("expected the bus to be split");
	assert_eq!(split.kind, "$_split_");
	assert!(split.ports.iter().any(|p| p.id.ends_with(".1:2")));
	assert!(split.ports.iter().any(|p| p.id.ends_with(".3")));
	assert!(!graph.children.iter().any(|n| n.kind == "$_join_"));
}

#[test]
fn folded_constants_become_source_nodes() {
	let netlist = parse(
		r#"{
		"modules": {
			"c": {
				"ports": {
					"o": { "direction": "output", "bits": ["1", "0"] }
				},
				"cells": {}
			}
		}
	}"#,
	);
	let skin = Skin::default();
	let graph = graph_flow(&netlist, None, &skin).unwrap();

	// bits encountered 1 then 0, named reversed: "01"
	let constant = graph
		.children
		.iter()
		.find(|n| n.kind == "$_constant_")
		.expect("expected a constant source");
	assert_eq!(constant.id, "01");
	assert_eq!(constant.labels.len(), 1);
	assert_eq!(constant.labels[0].text, "01");
}

#[test]
fn dummies_vanish_after_post_processing() {
	// two unconnected output ports read the same undriven net, which forces
	// a dummy source into the graph
	let netlist = parse(
		r#"{
		"modules": {
			"d": {
				"ports": {
					"o1": { "direction": "output", "bits": [5] },
					"o2": { "direction": "output", "bits": [5] }
				},
				"cells": {}
			}
		}
	}"#,
	);
	let skin = Skin::default();
	let graph = graph_flow(&netlist, None, &skin).unwrap();
	assert!(graph.children.iter().any(|n| n.is_dummy()));

	let mut graph = LayeredEngine.layout(graph, &skin.layout_options).unwrap();
	remove_dummy_edges(&mut graph);

	assert!(!graph.children.iter().any(|n| n.is_dummy()));
	for edge in &graph.edges {
		for endpoint in [&edge.source, &edge.target] {
			if let Some(node) = endpoint {
				assert!(!node.starts_with("$d_"));
			}
		}
	}
}

#[test]
fn module_selection_prefers_the_top_attribute() {
	let netlist = parse(
		r#"{
		"modules": {
			"aaa": { "ports": {}, "cells": {} },
			"real": {
				"attributes": { "top": 1 },
				"ports": {
					"i": { "direction": "input", "bits": [2] },
					"o": { "direction": "output", "bits": [2] }
				},
				"cells": {}
			}
		}
	}"#,
	);
	let skin = Skin::default();
	let graph = graph_flow(&netlist, None, &skin).unwrap();
	assert_eq!(graph.id, "real");

	let missing = graph_flow(&netlist, Some("nope"), &skin);
	assert!(matches!(missing, Err(Error::NoSuchModule(_))));
}

#[test]
fn full_render_produces_an_svg_document() {
	let netlist = parse(
		r#"{
		"modules": {
			"mux2": {
				"ports": {
					"a": { "direction": "input", "bits": [2] },
					"b": { "direction": "input", "bits": [3] },
					"s": { "direction": "input", "bits": [4] },
					"y": { "direction": "output", "bits": [5] }
				},
				"cells": {
					"m": {
						"type": "$mux",
						"port_directions": {
							"A": "input", "B": "input", "S": "input", "Y": "output"
						},
						"connections": { "A": [2], "B": [3], "S": [4], "Y": [5] }
					}
				}
			}
		}
	}"#,
	);
	let skin = Skin::default();
	let svg = render_flow(&netlist, None, &skin, &LayeredEngine).unwrap();

	assert!(svg.starts_with("<svg"));
	assert!(svg.ends_with("</svg>\n"));
	// four port markers and the mux
	assert_eq!(svg.matches("<rect").count(), 5);
	assert!(svg.contains(">m</text>"));
}
