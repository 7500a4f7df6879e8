//! Bus split/join inference. After constant folding, every cell input must be
//! wirable from some existing signal. Where an input only matches a sub-range
//! of a driven bus, a `$_split_` cell is synthesized to extract it; where an
//! input concatenates several pieces, a `$_join_` cell is synthesized to glue
//! them. The search works directly on the comma-bracketed signature strings:
//! sub-range containment is substring containment, and bit indices are
//! recovered by counting commas.

use std::collections::BTreeMap;

use log::warn;

use crate::{
	circuit::{Circuit, Port},
	netlist::{parse_signature, Bit},
};

type SplitJoin = BTreeMap<String, Vec<String>>;

/// Infer the splits and joins needed by every cell input signature and append
/// the corresponding synthetic cells to the circuit.
pub fn add_splits_joins(circuit: &mut Circuit) {
	let mut producers: Vec<String> = vec![];
	let mut consumers: Vec<String> = vec![];
	for cell in circuit.cells() {
		for port in &cell.input_ports {
			consumers.push(port.signature());
		}
		for port in &cell.output_ports {
			producers.push(port.signature());
		}
	}

	let mut splits: SplitJoin = BTreeMap::new();
	let mut joins: SplitJoin = BTreeMap::new();
	// `available` grows as sub-ranges become extractable; `pending` shrinks as
	// targets resolve, so a target never matches itself.
	let mut available = producers;
	let mut pending = consumers.clone();
	for target in &consumers {
		gather(
			&mut available,
			&mut pending,
			target,
			0,
			target.len(),
			&mut splits,
			&mut joins,
		);
	}

	for (target, sources) in &joins {
		let signals = parse_signature(target);
		let inputs = sources
			.iter()
			.map(|name| Port::new(name.clone(), get_bits(&signals, name)))
			.collect();
		let output = Port::new("Y", signals);
		circuit.add_cell(
			&format!("$join${}", target),
			"$_join_",
			inputs,
			vec![output],
			Default::default(),
		);
	}
	for (source, targets) in &splits {
		let signals = parse_signature(source);
		let outputs = targets
			.iter()
			.map(|name| Port::new(name.clone(), get_bits(&signals, name)))
			.collect();
		let input = Port::new("A", signals);
		circuit.add_cell(
			&format!("$split${}", source),
			"$_split_",
			vec![input],
			outputs,
			Default::default(),
		);
	}
}

/// Resolve the window `[start, end)` of `target` against the signatures at
/// hand. Greedy longest right-anchored match, with a fixed precedence:
/// exact available match, then sub-range of an available signature (a split),
/// then sub-range of another pending target (resolved recursively), then
/// shrink the window to the previous comma boundary. A window that shrinks
/// away without matching is left unresolved, silently; the original tool
/// behaves the same way and downstream stages tolerate the gap.
fn gather(
	available: &mut Vec<String>,
	pending: &mut Vec<String>,
	target: &str,
	start: usize,
	end: usize,
	splits: &mut SplitJoin,
	joins: &mut SplitJoin,
) {
	// the target is being resolved, not offered
	if let Some(pos) = pending.iter().position(|p| p == target) {
		pending.remove(pos);
	}
	if start >= target.len() || end - start < 2 {
		return;
	}
	let query = &target[start..end];

	if available.iter().any(|a| a == query) {
		if query != target {
			push_range(joins, target, indices_string(target, query, start));
		}
		gather(available, pending, target, end - 1, target.len(), splits, joins);
		return;
	}
	if let Some(idx) = available.iter().position(|a| a.contains(query)) {
		if query != target {
			push_range(joins, target, indices_string(target, query, start));
		}
		let source = available[idx].clone();
		push_range(splits, &source, indices_string(&source, query, 0));
		available.push(query.to_owned());
		gather(available, pending, target, end - 1, target.len(), splits, joins);
		return;
	}
	if pending.iter().any(|p| p.contains(query)) {
		if query != target {
			push_range(joins, target, indices_string(target, query, start));
		}
		let query = query.to_owned();
		// resolve the piece as its own target, against nothing but the
		// available signatures
		gather(available, &mut vec![], &query, 0, query.len(), splits, joins);
		available.push(query);
		return;
	}
	// shrink the window to just past the last comma strictly before `end`
	match query[..query.len() - 1].rfind(',') {
		Some(pos) => gather(available, pending, target, start, start + pos + 1, splits, joins),
		None => warn!("no decomposition found for {:?} within {:?}", query, target),
	}
}

fn push_range(dict: &mut SplitJoin, key: &str, range: String) {
	let entry = dict.entry(key.to_owned()).or_default();
	if !entry.contains(&range) {
		entry.push(range);
	}
}

/// Bit-index range of `query` inside `bitstring`, as `"idx"` or
/// `"start:end"` (inclusive). Indices are comma counts before the match.
fn indices_string(bitstring: &str, query: &str, start: usize) -> String {
	let split_start = bitstring.find(query).unwrap_or(0).max(start);
	let start_index = bitstring[..split_start].matches(',').count();
	let end_index = start_index + query.matches(',').count().saturating_sub(2);
	if start_index == end_index {
		start_index.to_string()
	} else {
		format!("{}:{}", start_index, end_index)
	}
}

/// Slice a parent's bit list by a recorded range string.
fn get_bits(signals: &[Bit], indices: &str) -> Vec<Bit> {
	match indices.split_once(':') {
		Some((s, e)) => {
			let s: usize = s.parse().expect("malformed range in split/join record");
			let e: usize = e.parse().expect("malformed range in split/join record");
			signals[s..=e].to_vec()
		}
		None => {
			let i: usize = indices.parse().expect("malformed index in split/join record");
			vec![signals[i]]
		}
	}
}

#[cfg(test)]
mod test {
	use std::collections::BTreeMap;

	use super::*;
	use crate::circuit::Cell;

	fn ids(ids: &[u64]) -> Vec<Bit> {
		ids.iter().map(|i| Bit::Id(*i)).collect()
	}

	fn driver(circuit: &mut Circuit, key: &str, bits: Vec<Bit>) {
		circuit.add_cell(
			key,
			"$_inputExt_",
			vec![],
			vec![Port::new("Y", bits)],
			BTreeMap::new(),
		);
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

	fn cells_of_type<'a>(circuit: &'a Circuit, t: &str) -> Vec<&'a Cell> {
		circuit
			.cells()
			.iter()
			.filter(|c| c.cell_type == t)
			.collect()
	}

	#[test]
	fn bus_taps_make_one_split_and_no_joins() {
		// a 4-bit bus read as [11,12] and [13]
		let mut circuit = Circuit::new("t");
		driver(&mut circuit, "bus", ids(&[10, 11, 12, 13]));
		rider(&mut circuit, "mid", ids(&[11, 12]));
		rider(&mut circuit, "top", ids(&[13]));
		add_splits_joins(&mut circuit);

		assert!(cells_of_type(&circuit, "$_join_").is_empty());
		let splits = cells_of_type(&circuit, "$_split_");
		assert_eq!(splits.len(), 1);
		let split = splits[0];
		assert_eq!(split.key, "$split$,10,11,12,13,");
		assert_eq!(split.input_ports[0].bits, ids(&[10, 11, 12, 13]));
		let mut ranges: Vec<&str> =
			split.output_ports.iter().map(|p| p.key.as_str()).collect();
		ranges.sort();
		assert_eq!(ranges, vec!["1:2", "3"]);
		let mid = split
			.output_ports
			.iter()
			.find(|p| p.key == "1:2")
			.unwrap();
		assert_eq!(mid.bits, ids(&[11, 12]));
		let top = split.output_ports.iter().find(|p| p.key == "3").unwrap();
		assert_eq!(top.bits, ids(&[13]));
	}

	#[test]
	fn split_ranges_are_disjoint_and_verbatim() {
		let mut circuit = Circuit::new("t");
		driver(&mut circuit, "bus", ids(&[20, 21, 22, 23, 24, 25]));
		rider(&mut circuit, "a", ids(&[20, 21]));
		rider(&mut circuit, "b", ids(&[22, 23, 24]));
		rider(&mut circuit, "c", ids(&[25]));
		add_splits_joins(&mut circuit);

		let splits = cells_of_type(&circuit, "$_split_");
		assert_eq!(splits.len(), 1);
		let mut covered = vec![false; 6];
		for port in &splits[0].output_ports {
			for bit in &port.bits {
				let Bit::Id(id) = bit else { panic!() };
				let idx = (*id - 20) as usize;
				assert!(!covered[idx], "range overlap at bit {}", idx);
				covered[idx] = true;
			}
		}
		assert!(covered.iter().all(|c| *c));
	}

	#[test]
	fn concatenated_inputs_make_a_join() {
		// [1,2] and [3] both driven, one consumer reads [1,2,3]
		let mut circuit = Circuit::new("t");
		driver(&mut circuit, "lo", ids(&[1, 2]));
		driver(&mut circuit, "hi", ids(&[3]));
		rider(&mut circuit, "all", ids(&[1, 2, 3]));
		add_splits_joins(&mut circuit);

		assert!(cells_of_type(&circuit, "$_split_").is_empty());
		let joins = cells_of_type(&circuit, "$_join_");
		assert_eq!(joins.len(), 1);
		let join = joins[0];
		assert_eq!(join.key, "$join$,1,2,3,");
		assert_eq!(join.output_ports[0].bits, ids(&[1, 2, 3]));
		let mut ranges: Vec<&str> = join.input_ports.iter().map(|p| p.key.as_str()).collect();
		ranges.sort();
		assert_eq!(ranges, vec!["0:1", "2"]);
	}

	#[test]
	fn exact_match_needs_no_cells() {
		let mut circuit = Circuit::new("t");
		driver(&mut circuit, "a", ids(&[1, 2]));
		rider(&mut circuit, "b", ids(&[1, 2]));
		add_splits_joins(&mut circuit);
		assert!(cells_of_type(&circuit, "$_split_").is_empty());
		assert!(cells_of_type(&circuit, "$_join_").is_empty());
	}

	#[test]
	fn unresolvable_target_is_left_alone_silently() {
		// nothing drives anything that could produce [99]; the search just
		// gives up without an error or any synthetic cells
		let mut circuit = Circuit::new("t");
		driver(&mut circuit, "a", ids(&[1, 2]));
		rider(&mut circuit, "b", ids(&[99]));
		let before = circuit.cells().len();
		add_splits_joins(&mut circuit);
		assert_eq!(circuit.cells().len(), before);
	}

	#[test]
	fn split_then_join_for_a_shuffled_consumer() {
		// consumer [5,6,9] needs [5,6] split out of the bus and joined with [9]
		let mut circuit = Circuit::new("t");
		driver(&mut circuit, "bus", ids(&[5, 6, 7]));
		driver(&mut circuit, "bit", ids(&[9]));
		rider(&mut circuit, "mix", ids(&[5, 6, 9]));
		add_splits_joins(&mut circuit);

		let joins = cells_of_type(&circuit, "$_join_");
		assert_eq!(joins.len(), 1);
		assert_eq!(joins[0].output_ports[0].bits, ids(&[5, 6, 9]));
		let splits = cells_of_type(&circuit, "$_split_");
		assert_eq!(splits.len(), 1);
		assert_eq!(splits[0].input_ports[0].bits, ids(&[5, 6, 7]));
		assert_eq!(splits[0].output_ports.len(), 1);
		assert_eq!(splits[0].output_ports[0].bits, ids(&[5, 6]));
	}
}
