//! Input side of the pipeline: the flattened netlist as produced by
//! `yosys -o design.json`, deserialized as-is. Nothing here is validated
//! beyond what serde needs to build the structures; garbage in, garbage out.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::{Error, Result};

/// Direction of a module port or a cell pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
	Input,
	Output,
	Inout,
}

/// One element of a connection bit-vector. Either a module-wide unique signal
/// id or a literal constant bit. Yosys emits the literals as one-character
/// strings, so `"x"` and `"z"` also land here and survive untouched until a
/// later stage cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(untagged)]
pub enum Bit {
	Id(u64),
	Literal(char),
}

impl std::fmt::Display for Bit {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Bit::Id(id) => write!(f, "{}", id),
			Bit::Literal(c) => write!(f, "{}", c),
		}
	}
}

#[derive(Debug, Clone, Deserialize)]
pub struct Netlist {
	#[serde(default)]
	pub creator: Option<String>,
	pub modules: BTreeMap<String, Module>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Module {
	#[serde(default)]
	pub ports: BTreeMap<String, ModulePort>,
	#[serde(default)]
	pub cells: BTreeMap<String, ModuleCell>,
	#[serde(default)]
	pub attributes: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModulePort {
	pub direction: Direction,
	pub bits: Vec<Bit>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModuleCell {
	#[serde(rename = "type")]
	pub cell_type: String,
	#[serde(default)]
	pub port_directions: BTreeMap<String, Direction>,
	#[serde(default)]
	pub connections: BTreeMap<String, Vec<Bit>>,
	#[serde(default)]
	pub parameters: BTreeMap<String, serde_json::Value>,
	#[serde(default)]
	pub attributes: BTreeMap<String, serde_json::Value>,
	#[serde(default)]
	pub hide_name: Option<u8>,
}

impl Netlist {
	/// Pick the module to draw: an explicit name, otherwise the module tagged
	/// with a `top` attribute, otherwise the first module in the file.
	pub fn select_module(&self, name: Option<&str>) -> Result<(&str, &Module)> {
		if let Some(name) = name {
			return self
				.modules
				.get_key_value(name)
				.map(|(k, v)| (k.as_str(), v))
				.ok_or_else(|| Error::NoSuchModule(name.to_owned()));
		}
		for (name, module) in &self.modules {
			if module.attributes.contains_key("top") {
				return Ok((name.as_str(), module));
			}
		}
		self.modules
			.iter()
			.next()
			.map(|(k, v)| (k.as_str(), v))
			.ok_or(Error::EmptyNetlist)
	}
}

/// Canonical string form of a bit-vector: elements joined with commas and
/// bracketed with a leading and a trailing comma, `[5,6,7]` -> `",5,6,7,"`.
/// The bracketing makes "is A a contiguous sub-range of B" a plain substring
/// test, which the bus decomposition leans on heavily.
pub fn signature(bits: &[Bit]) -> String {
	let mut sig = String::from(",");
	for bit in bits {
		match bit {
			Bit::Id(id) => sig.push_str(&id.to_string()),
			Bit::Literal(c) => sig.push(*c),
		}
		sig.push(',');
	}
	sig
}

/// Inverse of [`signature`]. Panics on tokens that are neither a decimal
/// signal id nor a single literal character; such signatures never come out
/// of [`signature`] in the first place.
pub fn parse_signature(sig: &str) -> Vec<Bit> {
	sig.trim_matches(',')
		.split(',')
		.filter(|tok| !tok.is_empty())
		.map(|tok| {
			if let Ok(id) = tok.parse::<u64>() {
				return Bit::Id(id);
			}
			let mut chars = tok.chars();
			match (chars.next(), chars.next()) {
				(Some(c), None) => Bit::Literal(c),
				_ => panic!("malformed signature token {:?} in {:?}", tok, sig),
			}
		})
		.collect()
}

/// Number of bits a signature spans.
pub fn signature_width(sig: &str) -> usize {
	sig.split(',').count().saturating_sub(2)
}
