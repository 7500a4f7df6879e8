//! The circuit entity model: cells, their ports, and the wires (nets) that
//! group ports by bit-vector signature. Cells and wires live in owning
//! vectors on [`Circuit`]; everything else points at them by id, so there are
//! no reference cycles to fight.

use std::collections::BTreeMap;

use crate::{
	netlist::{signature, Bit, Direction, Module, ModuleCell},
	skin::{Skin, SymbolTemplate},
	util::{hash_map, hash_set, HashM, HashS},
};

/// Index into [`Circuit::cells`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CellId(pub usize);

impl From<CellId> for usize {
	fn from(v: CellId) -> Self {
		v.0
	}
}

/// Index into [`Circuit::wires`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WireId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PortSide {
	Input,
	Output,
}

/// Stable handle to one port of one cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PortRef {
	pub cell: CellId,
	pub side: PortSide,
	pub index: usize,
}

#[derive(Debug, Clone)]
pub struct Port {
	pub key: String,
	pub bits: Vec<Bit>,
	/// Assigned once [`Circuit::create_wires`] runs.
	pub wire: Option<WireId>,
}

impl Port {
	pub fn new(key: impl Into<String>, bits: Vec<Bit>) -> Self {
		Port {
			key: key.into(),
			bits,
			wire: None,
		}
	}

	pub fn signature(&self) -> String {
		signature(&self.bits)
	}
}

#[derive(Debug, Clone)]
pub struct Cell {
	pub id: CellId,
	pub key: String,
	pub cell_type: String,
	pub input_ports: Vec<Port>,
	pub output_ports: Vec<Port>,
	pub attributes: BTreeMap<String, serde_json::Value>,
}

/// All ports sharing one bit-vector signature, split by role.
#[derive(Debug, Clone)]
pub struct Wire {
	pub id: WireId,
	pub signature: String,
	pub drivers: Vec<PortRef>,
	pub riders: Vec<PortRef>,
	pub laterals: Vec<PortRef>,
}

#[derive(Debug)]
pub struct Circuit {
	pub name: String,
	pub(crate) cells: Vec<Cell>,
	pub(crate) wires: Vec<Wire>,
}

impl Circuit {
	pub fn new(name: &str) -> Self {
		Circuit {
			name: name.to_owned(),
			cells: vec![],
			wires: vec![],
		}
	}

	/// Flatten one module: one cell per external port, one cell per netlist
	/// cell. Pin sides come from the netlist's `port_directions`, falling
	/// back to the skin template, falling back to the usual yosys pin names.
	pub fn build_from(name: &str, module: &Module, skin: &Skin) -> Self {
		let mut circuit = Circuit::new(name);
		for (port_name, port) in &module.ports {
			match port.direction {
				Direction::Input => {
					circuit.add_cell(
						port_name,
						"$_inputExt_",
						vec![],
						vec![Port::new("Y", port.bits.clone())],
						BTreeMap::new(),
					);
				}
				Direction::Output | Direction::Inout => {
					circuit.add_cell(
						port_name,
						"$_outputExt_",
						vec![Port::new("A", port.bits.clone())],
						vec![],
						BTreeMap::new(),
					);
				}
			}
		}
		for (cell_name, cell) in &module.cells {
			let template = skin.find_template(&cell.cell_type);
			let mut input_ports = vec![];
			let mut output_ports = vec![];
			for (pin, bits) in &cell.connections {
				let port = Port::new(pin.clone(), bits.clone());
				match pin_side(cell, template, pin) {
					PortSide::Input => input_ports.push(port),
					PortSide::Output => output_ports.push(port),
				}
			}
			circuit.add_cell(
				cell_name,
				&cell.cell_type,
				input_ports,
				output_ports,
				cell.attributes.clone(),
			);
		}
		circuit
	}

	pub fn add_cell(
		&mut self,
		key: &str,
		cell_type: &str,
		input_ports: Vec<Port>,
		output_ports: Vec<Port>,
		attributes: BTreeMap<String, serde_json::Value>,
	) -> CellId {
		let id = CellId(self.cells.len());
		self.cells.push(Cell {
			id,
			key: key.to_owned(),
			cell_type: cell_type.to_owned(),
			input_ports,
			output_ports,
			attributes,
		});
		id
	}

	pub fn cell(&self, id: CellId) -> &Cell {
		&self.cells[id.0]
	}

	pub fn cells(&self) -> &[Cell] {
		&self.cells
	}

	pub fn wires(&self) -> &[Wire] {
		&self.wires
	}

	pub fn port(&self, pr: PortRef) -> &Port {
		let cell = &self.cells[pr.cell.0];
		match pr.side {
			PortSide::Input => &cell.input_ports[pr.index],
			PortSide::Output => &cell.output_ports[pr.index],
		}
	}

	fn port_mut(&mut self, pr: PortRef) -> &mut Port {
		let cell = &mut self.cells[pr.cell.0];
		match pr.side {
			PortSide::Input => &mut cell.input_ports[pr.index],
			PortSide::Output => &mut cell.output_ports[pr.index],
		}
	}

	/// Highest signal id used anywhere in the circuit. Constant folding mints
	/// fresh ids counting up from here.
	pub fn max_signal_id(&self) -> u64 {
		let mut max_id = 0;
		for cell in &self.cells {
			for port in cell.input_ports.iter().chain(&cell.output_ports) {
				for bit in &port.bits {
					if let Bit::Id(id) = bit {
						max_id = max_id.max(*id);
					}
				}
			}
		}
		max_id
	}

	/// Group every port in the circuit by bit-vector signature into one wire
	/// per distinct signature, classifying each port as driver, rider or
	/// lateral via the skin. Every grouped port gets its wire back-reference
	/// assigned. Wires keep first-seen order so output is deterministic.
	pub fn create_wires(&mut self, skin: &Skin) {
		let mut drivers_by_name: HashM<String, Vec<PortRef>> = hash_map();
		let mut riders_by_name: HashM<String, Vec<PortRef>> = hash_map();
		let mut laterals_by_name: HashM<String, Vec<PortRef>> = hash_map();
		let mut net_order: Vec<String> = vec![];
		let mut seen: HashS<String> = hash_set();
		for cell in &self.cells {
			for (index, port) in cell.input_ports.iter().enumerate() {
				let sig = port.signature();
				if seen.insert(sig.clone()) {
					net_order.push(sig.clone());
				}
				let group = if skin.is_lateral(&cell.cell_type, &port.key) {
					&mut laterals_by_name
				} else {
					&mut riders_by_name
				};
				group.entry(sig).or_default().push(PortRef {
					cell: cell.id,
					side: PortSide::Input,
					index,
				});
			}
			for (index, port) in cell.output_ports.iter().enumerate() {
				let sig = port.signature();
				if seen.insert(sig.clone()) {
					net_order.push(sig.clone());
				}
				let group = if skin.is_lateral(&cell.cell_type, &port.key) {
					&mut laterals_by_name
				} else {
					&mut drivers_by_name
				};
				group.entry(sig).or_default().push(PortRef {
					cell: cell.id,
					side: PortSide::Output,
					index,
				});
			}
		}
		self.wires.clear();
		for sig in net_order {
			let id = WireId(self.wires.len());
			let wire = Wire {
				id,
				drivers: drivers_by_name.remove(&sig).unwrap_or_default(),
				riders: riders_by_name.remove(&sig).unwrap_or_default(),
				laterals: laterals_by_name.remove(&sig).unwrap_or_default(),
				signature: sig,
			};
			for pr in wire
				.drivers
				.iter()
				.chain(&wire.riders)
				.chain(&wire.laterals)
				.copied()
				.collect::<Vec<_>>()
			{
				self.port_mut(pr).wire = Some(id);
			}
			self.wires.push(wire);
		}
	}
}

fn pin_side(cell: &ModuleCell, template: &SymbolTemplate, pin: &str) -> PortSide {
	if let Some(dir) = cell.port_directions.get(pin) {
		return match dir {
			Direction::Output => PortSide::Output,
			_ => PortSide::Input,
		};
	}
	if template.outputs.iter().any(|d| d.name == pin) {
		return PortSide::Output;
	}
	if template.inputs.iter().any(|d| d.name == pin) {
		return PortSide::Input;
	}
	match pin {
		"Y" | "Q" | "OUT" => PortSide::Output,
		_ => PortSide::Input,
	}
}
