//! Post-layout cleanup of dummy nodes. The graph builder inserts zero-size
//! `$d_N` nodes so that pure fan-out and fan-in nets are routable; once the
//! engine has produced geometry, the edges touching each dummy are fused at a
//! shared merge point and the dummy disappears from the graph.

use log::warn;

use crate::layout_graph::{LayoutEdge, LayoutGraph, Point};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
	Up,
	Down,
	Left,
	Right,
}

/// Axis direction from `start` to `end` in the y-down coordinate system.
/// Panics on a zero-length or diagonal pair; routed geometry is orthogonal,
/// so hitting either means the engine misbehaved.
pub fn which_dir(start: Point, end: Point) -> Direction {
	if end == start {
		panic!("start and end are the same");
	}
	if end.x != start.x && end.y != start.y {
		panic!("start and end arent on same line");
	}
	if end.x > start.x {
		return Direction::Right;
	}
	if end.x < start.x {
		return Direction::Left;
	}
	if end.y > start.y {
		return Direction::Down;
	}
	Direction::Up
}

/// Fuse the edges around every dummy node and drop the node. For each dummy,
/// the merge point is the routed point closest to the dummy's location; every
/// touching edge is re-terminated there, its dummy-side node/port references
/// severed, and the leftover junction dot removed when fewer than three
/// directions actually meet. Dummies whose edges carry no geometry are left
/// in place.
pub fn remove_dummy_edges(graph: &mut LayoutGraph) {
	let mut skipped: Vec<String> = vec![];
	for dummy_num in 0..10_000 {
		let dummy = format!("$d_{}", dummy_num);
		let touching: Vec<usize> = graph
			.edges
			.iter()
			.enumerate()
			.filter(|(_, e)| {
				e.source.as_deref() == Some(dummy.as_str())
					|| e.target.as_deref() == Some(dummy.as_str())
			})
			.map(|(i, _)| i)
			.collect();
		if touching.is_empty() {
			break;
		}

		let Some(dummy_loc) = dummy_location(&graph.edges[touching[0]], &dummy) else {
			warn!("dummy {} has no routed geometry, leaving it in place", dummy);
			skipped.push(dummy);
			continue;
		};

		// candidate merge point per edge: its bend nearest the dummy, or the
		// far endpoint when the run is bend-free
		let mut candidates: Vec<Point> = vec![];
		for &i in &touching {
			let edge = &graph.edges[i];
			let is_source = edge.source.as_deref() == Some(dummy.as_str());
			let section = &edge.sections[0];
			let candidate = section
				.bends
				.iter()
				.copied()
				.min_by(|a, b| {
					a.distance_to(dummy_loc)
						.partial_cmp(&b.distance_to(dummy_loc))
						.unwrap()
				})
				.unwrap_or(if is_source { section.end } else { section.start });
			candidates.push(candidate);
		}
		let Some(merge) = candidates
			.iter()
			.copied()
			.min_by(|a, b| {
				a.distance_to(dummy_loc)
					.partial_cmp(&b.distance_to(dummy_loc))
					.unwrap()
			})
		else {
			skipped.push(dummy);
			continue;
		};

		// re-terminate every edge at the merge point and record where each
		// one continues
		let mut directions: Vec<Direction> = vec![];
		for &i in &touching {
			let edge = &mut graph.edges[i];
			let is_source = edge.source.as_deref() == Some(dummy.as_str());
			let section = &mut edge.sections[0];
			if is_source {
				section.start = merge;
				if section.bends.first() == Some(&merge) {
					section.bends.remove(0);
				}
				edge.source = None;
				edge.source_port = None;
				let next = section.bends.first().copied().unwrap_or(section.end);
				let dir = which_dir(merge, next);
				if !directions.contains(&dir) {
					directions.push(dir);
				}
			} else {
				section.end = merge;
				if section.bends.last() == Some(&merge) {
					section.bends.pop();
				}
				edge.target = None;
				edge.target_port = None;
				let next = section.bends.last().copied().unwrap_or(section.start);
				let dir = which_dir(merge, next);
				if !directions.contains(&dir) {
					directions.push(dir);
				}
			}
		}

		// two edges fused end to end are one straight wire; only a real
		// three-way meet keeps its junction dot
		if directions.len() < 3 {
			for &i in &touching {
				graph.edges[i].junction_points.retain(|p| *p != merge);
			}
		}
	}
	graph
		.children
		.retain(|n| !n.is_dummy() || skipped.contains(&n.id));
}

fn dummy_location(edge: &LayoutEdge, dummy: &str) -> Option<Point> {
	let section = edge.sections.first()?;
	if edge.source.as_deref() == Some(dummy) {
		Some(section.start)
	} else {
		Some(section.end)
	}
}
