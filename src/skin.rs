//! The symbol-template collaborator. A [`Skin`] says what a cell type looks
//! like (shape, size, pin placement), which of its pins are laterals, and
//! carries the configuration flags that gate the optional pipeline stages.
//!
//! There is deliberately no global "active skin". The skin is an immutable
//! value threaded as a parameter through every stage, so concurrent renders
//! with different skins can't interfere.

use serde::{Deserialize, Serialize};

use crate::util::{hash_map, HashM};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
	/// A fixed symbol, e.g. a logic gate.
	Ordinary,
	/// Fallback box for cell types the skin doesn't know.
	Generic,
	Split,
	Join,
	Constant,
	/// Module input marker.
	InputExt,
	/// Module output marker.
	OutputExt,
}

/// A named pin with its offset relative to the symbol's top-left corner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PinDef {
	pub name: String,
	pub x: f64,
	pub y: f64,
}

impl PinDef {
	fn new(name: &str, x: f64, y: f64) -> Self {
		PinDef {
			name: name.to_owned(),
			x,
			y,
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymbolTemplate {
	pub shape: ShapeKind,
	pub width: f64,
	pub height: f64,
	pub inputs: Vec<PinDef>,
	pub outputs: Vec<PinDef>,
	/// Pin names that ride a net sideways instead of driving or reading it,
	/// e.g. a flip-flop clock. These names also appear in `inputs`/`outputs`
	/// so they keep a position on the symbol.
	pub laterals: Vec<String>,
}

/// Option bag handed to the layout engine. The skin owns it because pin
/// pitch and symbol sizes only make sense together with the spacing they
/// were drawn for.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutOptions {
	pub layer_spacing: f64,
	pub node_spacing: f64,
}

impl Default for LayoutOptions {
	fn default() -> Self {
		LayoutOptions {
			layer_spacing: 40.0,
			node_spacing: 15.0,
		}
	}
}

#[derive(Debug, Clone)]
pub struct Skin {
	templates: HashM<String, SymbolTemplate>,
	generic: SymbolTemplate,
	/// Run the constant folding stage.
	pub constants: bool,
	/// Run the bus split/join inference stage.
	pub splits_and_joins: bool,
	/// Treat every pin of a generic-shaped cell as lateral.
	pub generics_laterals: bool,
	pub layout_options: LayoutOptions,
}

impl Skin {
	/// Template for a cell type. A `-bus` tag picks the same base symbol as
	/// its scalar variant; unknown types get the generic box.
	pub fn find_template(&self, cell_type: &str) -> &SymbolTemplate {
		let base = cell_type.strip_suffix("-bus").unwrap_or(cell_type);
		self.templates.get(base).unwrap_or(&self.generic)
	}

	/// Is this pin a lateral on this cell type?
	pub fn is_lateral(&self, cell_type: &str, pin: &str) -> bool {
		let template = self.find_template(cell_type);
		if template.laterals.iter().any(|name| name == pin) {
			return true;
		}
		template.shape == ShapeKind::Generic && self.generics_laterals
	}
}

fn two_input_gate() -> SymbolTemplate {
	SymbolTemplate {
		shape: ShapeKind::Ordinary,
		width: 30.0,
		height: 25.0,
		inputs: vec![PinDef::new("A", 0.0, 5.0), PinDef::new("B", 0.0, 20.0)],
		outputs: vec![PinDef::new("Y", 30.0, 12.5)],
		laterals: vec![],
	}
}

fn one_input_gate() -> SymbolTemplate {
	SymbolTemplate {
		shape: ShapeKind::Ordinary,
		width: 30.0,
		height: 20.0,
		inputs: vec![PinDef::new("A", 0.0, 10.0)],
		outputs: vec![PinDef::new("Y", 30.0, 10.0)],
		laterals: vec![],
	}
}

impl Default for Skin {
	fn default() -> Self {
		let mut templates: HashM<String, SymbolTemplate> = hash_map();
		for gate in [
			"$and", "$or", "$xor", "$nand", "$nor", "$xnor", "$add", "$sub", "$eq",
		] {
			templates.insert(gate.to_owned(), two_input_gate());
		}
		for gate in ["$not", "$logic_not", "$buf"] {
			templates.insert(gate.to_owned(), one_input_gate());
		}
		templates.insert(
			"$mux".to_owned(),
			SymbolTemplate {
				shape: ShapeKind::Ordinary,
				width: 30.0,
				height: 30.0,
				inputs: vec![
					PinDef::new("A", 0.0, 5.0),
					PinDef::new("B", 0.0, 25.0),
					PinDef::new("S", 15.0, 30.0),
				],
				outputs: vec![PinDef::new("Y", 30.0, 15.0)],
				laterals: vec![],
			},
		);
		templates.insert(
			"$dff".to_owned(),
			SymbolTemplate {
				shape: ShapeKind::Ordinary,
				width: 30.0,
				height: 30.0,
				inputs: vec![PinDef::new("D", 0.0, 10.0), PinDef::new("CLK", 15.0, 30.0)],
				outputs: vec![PinDef::new("Q", 30.0, 10.0)],
				laterals: vec!["CLK".to_owned()],
			},
		);
		templates.insert(
			"$adff".to_owned(),
			SymbolTemplate {
				shape: ShapeKind::Ordinary,
				width: 30.0,
				height: 35.0,
				inputs: vec![
					PinDef::new("D", 0.0, 10.0),
					PinDef::new("CLK", 10.0, 35.0),
					PinDef::new("ARST", 20.0, 35.0),
				],
				outputs: vec![PinDef::new("Q", 30.0, 10.0)],
				laterals: vec!["CLK".to_owned(), "ARST".to_owned()],
			},
		);
		templates.insert(
			"$_constant_".to_owned(),
			SymbolTemplate {
				shape: ShapeKind::Constant,
				width: 25.0,
				height: 15.0,
				inputs: vec![],
				outputs: vec![PinDef::new("Y", 25.0, 7.5)],
				laterals: vec![],
			},
		);
		templates.insert(
			"$_split_".to_owned(),
			SymbolTemplate {
				shape: ShapeKind::Split,
				width: 20.0,
				height: 20.0,
				inputs: vec![PinDef::new("A", 0.0, 10.0)],
				outputs: vec![],
				laterals: vec![],
			},
		);
		templates.insert(
			"$_join_".to_owned(),
			SymbolTemplate {
				shape: ShapeKind::Join,
				width: 20.0,
				height: 20.0,
				inputs: vec![],
				outputs: vec![PinDef::new("Y", 20.0, 10.0)],
				laterals: vec![],
			},
		);
		templates.insert(
			"$_inputExt_".to_owned(),
			SymbolTemplate {
				shape: ShapeKind::InputExt,
				width: 25.0,
				height: 15.0,
				inputs: vec![],
				outputs: vec![PinDef::new("Y", 25.0, 7.5)],
				laterals: vec![],
			},
		);
		templates.insert(
			"$_outputExt_".to_owned(),
			SymbolTemplate {
				shape: ShapeKind::OutputExt,
				width: 25.0,
				height: 15.0,
				inputs: vec![PinDef::new("A", 0.0, 7.5)],
				outputs: vec![],
				laterals: vec![],
			},
		);
		let generic = SymbolTemplate {
			shape: ShapeKind::Generic,
			width: 40.0,
			height: 30.0,
			inputs: vec![],
			outputs: vec![],
			laterals: vec![],
		};
		Skin {
			templates,
			generic,
			constants: true,
			splits_and_joins: true,
			generics_laterals: false,
			layout_options: LayoutOptions::default(),
		}
	}
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn bus_tag_strips_to_base_symbol() {
		let skin = Skin::default();
		assert_eq!(skin.find_template("$and-bus").shape, ShapeKind::Ordinary);
		assert_eq!(skin.find_template("$and").width, 30.0);
	}

	#[test]
	fn unknown_type_falls_back_to_generic() {
		let skin = Skin::default();
		assert_eq!(skin.find_template("$frobnicate").shape, ShapeKind::Generic);
	}

	#[test]
	fn dff_clock_is_lateral() {
		let skin = Skin::default();
		assert!(skin.is_lateral("$dff", "CLK"));
		assert!(!skin.is_lateral("$dff", "D"));
		assert!(!skin.is_lateral("$and", "A"));
	}

	#[test]
	fn generics_laterals_flag_makes_every_generic_pin_lateral() {
		let mut skin = Skin::default();
		assert!(!skin.is_lateral("$frobnicate", "P1"));
		skin.generics_laterals = true;
		assert!(skin.is_lateral("$frobnicate", "P1"));
		// ordinary symbols are unaffected
		assert!(!skin.is_lateral("$and", "A"));
	}
}
