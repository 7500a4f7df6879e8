//! Constant folding. Literal `0`/`1` bits inside input port vectors are
//! replaced by fresh signal ids driven by synthesized `$_constant_` cells, so
//! that after this pass every bit position resolves to a signal id (the
//! remaining `x`/`z` literals excepted). Identical literal patterns share one
//! constant cell.

use log::debug;

use crate::{
	circuit::{Circuit, Port},
	netlist::Bit,
	util::{hash_map, HashM},
};

/// Scan every input port left to right and fold maximal runs of literal
/// `0`/`1` bits. Returns the running maximum signal id, so ids stay unique
/// across later passes. Never fails; bits that are neither ids nor foldable
/// literals are left alone.
pub fn fold_constants(circuit: &mut Circuit) -> u64 {
	let mut max_id = circuit.max_signal_id();
	let mut signals_by_name: HashM<String, Vec<u64>> = hash_map();
	let cell_count = circuit.cells.len();
	for ci in 0..cell_count {
		let port_count = circuit.cells[ci].input_ports.len();
		for pi in 0..port_count {
			let mut name = String::new();
			let mut ids: Vec<u64> = vec![];
			let bit_count = circuit.cells[ci].input_ports[pi].bits.len();
			for bi in 0..bit_count {
				match circuit.cells[ci].input_ports[pi].bits[bi] {
					Bit::Literal(c) if c == '0' || c == '1' => {
						max_id += 1;
						name.push(c);
						ids.push(max_id);
						circuit.cells[ci].input_ports[pi].bits[bi] = Bit::Id(max_id);
					}
					_ => {
						if !ids.is_empty() {
							assign_constant(circuit, &mut signals_by_name, &name, &ids, ci, pi, bi);
							name.clear();
							ids.clear();
						}
					}
				}
			}
			if !ids.is_empty() {
				assign_constant(
					circuit,
					&mut signals_by_name,
					&name,
					&ids,
					ci,
					pi,
					bit_count,
				);
			}
		}
	}
	debug!(
		"constant folding produced {} source cells, max signal id {}",
		signals_by_name.len(),
		max_id
	);
	max_id
}

/// A literal run just ended at bit index `end` (exclusive). Either reuse the
/// ids of a previously seen identical pattern, overwriting the freshly minted
/// ones in place, or register a new `$_constant_` cell under the pattern's
/// name. The name is the run's literals in encountered order, reversed, so it
/// reads MSB-first on the symbol.
fn assign_constant(
	circuit: &mut Circuit,
	signals_by_name: &mut HashM<String, Vec<u64>>,
	name: &str,
	ids: &[u64],
	cell: usize,
	port: usize,
	end: usize,
) {
	let const_name: String = name.chars().rev().collect();
	if let Some(prev) = signals_by_name.get(&const_name) {
		for (i, prev_id) in prev.iter().enumerate() {
			circuit.cells[cell].input_ports[port].bits[end - ids.len() + i] = Bit::Id(*prev_id);
		}
	} else {
		let output = Port::new("Y", ids.iter().map(|id| Bit::Id(*id)).collect());
		circuit.add_cell(
			&const_name,
			"$_constant_",
			vec![],
			vec![output],
			Default::default(),
		);
		signals_by_name.insert(const_name, ids.to_vec());
	}
}

#[cfg(test)]
mod test {
	use std::collections::BTreeMap;

	use super::*;

	fn lit(c: char) -> Bit {
		Bit::Literal(c)
	}

	fn rider(circuit: &mut Circuit, key: &str, bits: Vec<Bit>) {
		circuit.add_cell(
			key,
			"$_outputExt_",
			vec![Port::new("A", bits)],
			vec![],
			BTreeMap::new(),
		);
	}

	fn constant_cells(circuit: &Circuit) -> Vec<&crate::circuit::Cell> {
		circuit
			.cells()
			.iter()
			.filter(|c| c.cell_type == "$_constant_")
			.collect()
	}

	#[test]
	fn identical_runs_share_one_cell() {
		let mut circuit = Circuit::new("t");
		rider(&mut circuit, "p1", vec![lit('1'), lit('0'), lit('1')]);
		rider(&mut circuit, "p2", vec![lit('1'), lit('0'), lit('1')]);
		fold_constants(&mut circuit);

		assert_eq!(constant_cells(&circuit).len(), 1);
		let p1 = &circuit.cells()[0].input_ports[0].bits;
		let p2 = &circuit.cells()[1].input_ports[0].bits;
		assert_eq!(p1, p2);
		// all literals gone
		assert!(p1.iter().all(|b| matches!(b, Bit::Id(_))));
	}

	#[test]
	fn different_patterns_get_different_cells() {
		let mut circuit = Circuit::new("t");
		rider(&mut circuit, "p1", vec![lit('1'), lit('0'), lit('1')]);
		rider(&mut circuit, "p2", vec![lit('0'), lit('1'), lit('1')]);
		fold_constants(&mut circuit);

		let cells = constant_cells(&circuit);
		assert_eq!(cells.len(), 2);
		// names are the runs reversed
		let names: Vec<&str> = cells.iter().map(|c| c.key.as_str()).collect();
		assert!(names.contains(&"101"));
		assert!(names.contains(&"110"));
		assert_ne!(
			circuit.cells()[0].input_ports[0].bits,
			circuit.cells()[1].input_ports[0].bits
		);
	}

	#[test]
	fn x_breaks_a_run_and_survives() {
		let mut circuit = Circuit::new("t");
		rider(&mut circuit, "p1", vec![lit('1'), lit('x'), lit('1')]);
		fold_constants(&mut circuit);

		// the two single-bit runs share the same "1" cell
		assert_eq!(constant_cells(&circuit).len(), 1);
		let bits = &circuit.cells()[0].input_ports[0].bits;
		assert_eq!(bits[0], bits[2]);
		assert_eq!(bits[1], lit('x'));
	}

	#[test]
	fn fresh_ids_count_up_from_the_global_max() {
		let mut circuit = Circuit::new("t");
		circuit.add_cell(
			"drv",
			"$and",
			vec![],
			vec![Port::new("Y", vec![Bit::Id(41)])],
			BTreeMap::new(),
		);
		rider(&mut circuit, "p1", vec![lit('1'), lit('1')]);
		let max_id = fold_constants(&mut circuit);

		assert_eq!(max_id, 43);
		assert_eq!(
			circuit.cells()[1].input_ports[0].bits,
			vec![Bit::Id(42), Bit::Id(43)]
		);
	}

	#[test]
	fn dedup_does_not_leak_wasted_ids_backwards() {
		// the second identical run still advances the counter, but its
		// port ends up wired to the first run's ids
		let mut circuit = Circuit::new("t");
		rider(&mut circuit, "p1", vec![lit('1')]);
		rider(&mut circuit, "p2", vec![lit('1')]);
		let max_id = fold_constants(&mut circuit);
		assert_eq!(max_id, 2);
		assert_eq!(circuit.cells()[0].input_ports[0].bits, vec![Bit::Id(1)]);
		assert_eq!(circuit.cells()[1].input_ports[0].bits, vec![Bit::Id(1)]);
	}
}
