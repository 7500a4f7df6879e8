//! The abstract graph handed to the layout engine: sized nodes with
//! positioned ports, and edges derived from wires. Nets without a natural
//! point-to-point pairing (pure fan-out or pure fan-in) get a zero-size
//! synthetic dummy node so the engine has something to route to; the
//! post-layout pass collapses those again.

use itertools::Itertools;
use serde::Serialize;

use crate::{
	circuit::{Cell, Circuit, PortRef, Wire},
	netlist::signature_width,
	skin::{ShapeKind, Skin, SymbolTemplate},
};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
	pub x: f64,
	pub y: f64,
}

impl Point {
	pub fn new(x: f64, y: f64) -> Self {
		Point { x, y }
	}

	pub fn distance_to(self, other: Point) -> f64 {
		((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
	}
}

#[derive(Debug, Clone, Serialize)]
pub struct Label {
	pub text: String,
	pub x: f64,
	pub y: f64,
	pub width: f64,
	pub height: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct LayoutPort {
	pub id: String,
	pub x: f64,
	pub y: f64,
	pub width: f64,
	pub height: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct LayoutNode {
	pub id: String,
	/// Cell type of the originating cell, used by the renderer to pick a
	/// symbol. Dummies carry `$_dummy_`.
	pub kind: String,
	pub width: f64,
	pub height: f64,
	pub x: f64,
	pub y: f64,
	pub ports: Vec<LayoutPort>,
	pub labels: Vec<Label>,
}

impl LayoutNode {
	pub fn is_dummy(&self) -> bool {
		self.id.starts_with("$d_")
	}
}

/// One routed run of an edge: start, optional orthogonal bends, end.
#[derive(Debug, Clone, Serialize)]
pub struct EdgeSection {
	pub start: Point,
	pub bends: Vec<Point>,
	pub end: Point,
}

#[derive(Debug, Clone, Serialize)]
pub struct LayoutEdge {
	pub id: String,
	/// Node/port references. `None` after post-processing severs a dummy end;
	/// the geometry in `sections` is self-contained by then.
	pub source: Option<String>,
	pub source_port: Option<String>,
	pub target: Option<String>,
	pub target_port: Option<String>,
	/// Signature of the originating wire, so net width and name are
	/// recoverable after layout.
	pub net: String,
	pub labels: Vec<Label>,
	pub sections: Vec<EdgeSection>,
	pub junction_points: Vec<Point>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LayoutGraph {
	pub id: String,
	pub children: Vec<LayoutNode>,
	pub edges: Vec<LayoutEdge>,
}

/// Vertical pin pitch used when a template doesn't place a pin explicitly.
const PIN_PITCH: f64 = 10.0;

pub fn build_layout_graph(circuit: &Circuit, skin: &Skin) -> LayoutGraph {
	let children = circuit
		.cells()
		.iter()
		.map(|cell| build_node(cell, skin))
		.collect_vec();
	let mut builder = GraphBuilder {
		circuit,
		children,
		edges: vec![],
		dummy_num: 0,
		edge_index: 0,
	};
	for wire in circuit.wires() {
		builder.route_wire(wire);
	}
	LayoutGraph {
		id: circuit.name.clone(),
		children: builder.children,
		edges: builder.edges,
	}
}

fn build_node(cell: &Cell, skin: &Skin) -> LayoutNode {
	let template = skin.find_template(&cell.cell_type);
	let rows = cell.input_ports.len().max(cell.output_ports.len()).max(1);
	let height = template.height.max(PIN_PITCH * (rows as f64 + 1.0));
	let mut ports = vec![];
	for (i, port) in cell.input_ports.iter().enumerate() {
		let (x, y) = pin_position(template, &port.key, true, i);
		ports.push(LayoutPort {
			id: format!("{}.{}", cell.key, port.key),
			x,
			y,
			width: 0.0,
			height: 0.0,
		});
	}
	for (i, port) in cell.output_ports.iter().enumerate() {
		let (x, y) = pin_position(template, &port.key, false, i);
		ports.push(LayoutPort {
			id: format!("{}.{}", cell.key, port.key),
			x,
			y,
			width: 0.0,
			height: 0.0,
		});
	}
	let show_name = !cell.key.starts_with('$') || template.shape == ShapeKind::Constant;
	let labels = if show_name {
		vec![Label {
			text: cell.key.clone(),
			x: template.width / 2.0,
			y: height / 2.0,
			width: 6.0 * cell.key.len() as f64,
			height: 10.0,
		}]
	} else {
		vec![]
	};
	LayoutNode {
		id: cell.key.clone(),
		kind: cell.cell_type.clone(),
		width: template.width,
		height,
		x: 0.0,
		y: 0.0,
		ports,
		labels,
	}
}

fn pin_position(template: &SymbolTemplate, key: &str, is_input: bool, index: usize) -> (f64, f64) {
	let defs = if is_input {
		&template.inputs
	} else {
		&template.outputs
	};
	if let Some(def) = defs.iter().find(|d| d.name == key) {
		return (def.x, def.y);
	}
	// unplaced pins stack down the side
	let x = if is_input { 0.0 } else { template.width };
	(x, PIN_PITCH * (index as f64 + 1.0))
}

struct GraphBuilder<'a> {
	circuit: &'a Circuit,
	children: Vec<LayoutNode>,
	edges: Vec<LayoutEdge>,
	dummy_num: usize,
	edge_index: usize,
}

impl GraphBuilder<'_> {
	/// Pick a routing strategy for one wire by port cardinality.
	fn route_wire(&mut self, wire: &Wire) {
		let num_wires = signature_width(&wire.signature);
		if !wire.drivers.is_empty() && !wire.riders.is_empty() && wire.laterals.is_empty() {
			self.route(&wire.drivers, &wire.riders, num_wires, &wire.signature);
		} else if wire.drivers.len() + wire.riders.len() > 0 && !wire.laterals.is_empty() {
			self.route(&wire.drivers, &wire.laterals, num_wires, &wire.signature);
			self.route(&wire.laterals, &wire.riders, num_wires, &wire.signature);
		} else if wire.riders.is_empty() && wire.drivers.len() > 1 {
			// fan-out with no consumer: gather the drivers on a dummy
			let dummy = self.add_dummy();
			for driver in wire.drivers.clone() {
				let source = self.port_key(driver);
				let target = (dummy.clone(), format!("{}.p", dummy));
				self.push_edge(source, target, &wire.signature, 0);
			}
		} else if wire.drivers.is_empty() && wire.riders.len() > 1 {
			// fan-in with no producer: same thing, opposite direction
			let dummy = self.add_dummy();
			for rider in wire.riders.clone() {
				let source = (dummy.clone(), format!("{}.p", dummy));
				let target = self.port_key(rider);
				self.push_edge(source, target, &wire.signature, 0);
			}
		} else if wire.laterals.len() > 1 {
			// chain of bidirectional pins: star on the first lateral
			let anchor = self.port_key(wire.laterals[0]);
			for lateral in wire.laterals[1..].to_vec() {
				let target = self.port_key(lateral);
				self.push_edge(anchor.clone(), target, &wire.signature, 0);
			}
		}
	}

	/// Connect every source port to every target port directly.
	fn route(&mut self, sources: &[PortRef], targets: &[PortRef], num_wires: usize, net: &str) {
		for source in sources {
			for target in targets {
				let s = self.port_key(*source);
				let t = self.port_key(*target);
				self.push_edge(s, t, net, num_wires);
			}
		}
	}

	fn push_edge(
		&mut self,
		source: (String, String),
		target: (String, String),
		net: &str,
		num_wires: usize,
	) {
		let labels = if num_wires > 1 {
			let text = num_wires.to_string();
			vec![Label {
				width: 4.0 * text.len() as f64,
				height: 6.0,
				x: 0.0,
				y: 0.0,
				text,
			}]
		} else {
			vec![]
		};
		let id = format!("e{}", self.edge_index);
		self.edge_index += 1;
		self.edges.push(LayoutEdge {
			id,
			source: Some(source.0),
			source_port: Some(source.1),
			target: Some(target.0),
			target_port: Some(target.1),
			net: net.to_owned(),
			labels,
			sections: vec![],
			junction_points: vec![],
		});
	}

	fn port_key(&self, pr: PortRef) -> (String, String) {
		let cell = self.circuit.cell(pr.cell);
		let port = self.circuit.port(pr);
		(cell.key.clone(), format!("{}.{}", cell.key, port.key))
	}

	fn add_dummy(&mut self) -> String {
		let id = format!("$d_{}", self.dummy_num);
		self.dummy_num += 1;
		self.children.push(LayoutNode {
			id: id.clone(),
			kind: "$_dummy_".to_owned(),
			width: 0.0,
			height: 0.0,
			x: 0.0,
			y: 0.0,
			ports: vec![LayoutPort {
				id: format!("{}.p", id),
				x: 0.0,
				y: 0.0,
				width: 0.0,
				height: 0.0,
			}],
			labels: vec![],
		});
		id
	}
}
