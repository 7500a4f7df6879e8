//! Node placement and edge routing. The pipeline only depends on the
//! [`LayoutEngine`] trait; [`LayeredEngine`] is the built-in implementation,
//! a plain left-to-right layered placement with orthogonal edge routing.
//! Every routed section is axis-aligned, which the post-layout dummy pass
//! relies on.

use crate::{
	layout_graph::{EdgeSection, LayoutGraph, LayoutNode, Point},
	skin::LayoutOptions,
	util::{hash_map, HashM},
	Error, Result,
};

pub trait LayoutEngine {
	/// Assign positions to every node and geometry to every edge. Fails if an
	/// edge references a node or port that doesn't exist in the graph.
	fn layout(&self, graph: LayoutGraph, options: &LayoutOptions) -> Result<LayoutGraph>;
}

/// Longest-path layering, stacked placement within each layer, and a shared
/// vertical trunk per fan-out group.
pub struct LayeredEngine;

/// Resolved edge endpoint: node index plus the port's offset on it.
#[derive(Clone, Copy)]
struct Endpoint {
	node: usize,
	dx: f64,
	dy: f64,
}

impl LayoutEngine for LayeredEngine {
	fn layout(&self, mut graph: LayoutGraph, options: &LayoutOptions) -> Result<LayoutGraph> {
		let node_index: HashM<String, usize> = graph
			.children
			.iter()
			.enumerate()
			.map(|(i, n)| (n.id.clone(), i))
			.collect();
		let mut endpoints = Vec::with_capacity(graph.edges.len());
		for edge in &graph.edges {
			let s = resolve(
				&graph.children,
				&node_index,
				edge.source.as_deref(),
				edge.source_port.as_deref(),
			)?;
			let t = resolve(
				&graph.children,
				&node_index,
				edge.target.as_deref(),
				edge.target_port.as_deref(),
			)?;
			endpoints.push((s, t));
		}

		// longest-path layering; the pass count bound keeps cycles finite
		let n = graph.children.len();
		let mut layer = vec![0usize; n];
		for _ in 0..n {
			for (s, t) in &endpoints {
				if layer[t.node] < layer[s.node] + 1 && layer[s.node] + 1 <= n {
					layer[t.node] = layer[s.node] + 1;
				}
			}
		}

		let max_layer = layer.iter().copied().max().unwrap_or(0);
		let mut layer_width = vec![0.0f64; max_layer + 1];
		for (i, node) in graph.children.iter().enumerate() {
			layer_width[layer[i]] = layer_width[layer[i]].max(node.width);
		}
		let mut layer_x = vec![0.0f64; max_layer + 1];
		let mut x = 10.0;
		for l in 0..=max_layer {
			layer_x[l] = x;
			x += layer_width[l] + options.layer_spacing;
		}
		let mut layer_y = vec![10.0f64; max_layer + 1];
		for (i, node) in graph.children.iter_mut().enumerate() {
			let l = layer[i];
			node.x = layer_x[l];
			node.y = layer_y[l];
			layer_y[l] += node.height + options.node_spacing;
		}

		// edges fanning out of one port share a vertical trunk, placed halfway
		// to the nearest target
		let mut group_min_tx: HashM<String, f64> = hash_map();
		let mut group_count: HashM<String, usize> = hash_map();
		for (edge, (_, t)) in graph.edges.iter().zip(&endpoints) {
			let key = edge.source_port.clone().unwrap_or_default();
			let tx = graph.children[t.node].x + t.dx;
			let entry = group_min_tx.entry(key.clone()).or_insert(f64::INFINITY);
			*entry = entry.min(tx);
			*group_count.entry(key).or_insert(0) += 1;
		}

		for (edge, (s, t)) in graph.edges.iter_mut().zip(&endpoints) {
			let sx = graph.children[s.node].x + s.dx;
			let sy = graph.children[s.node].y + s.dy;
			let tx = graph.children[t.node].x + t.dx;
			let ty = graph.children[t.node].y + t.dy;
			let key = edge.source_port.as_deref().unwrap_or_default();
			let min_tx = group_min_tx[key];
			let trunk_x = if min_tx > sx {
				sx + (min_tx - sx) / 2.0
			} else {
				(sx + tx) / 2.0
			};
			let touches_dummy =
				graph.children[s.node].is_dummy() || graph.children[t.node].is_dummy();
			let mut bends = vec![];
			if sx != tx && sy != ty {
				bends.push(Point::new(trunk_x, sy));
				bends.push(Point::new(trunk_x, ty));
			} else if sy == ty && sx != tx && touches_dummy {
				// a straight run into a dummy still needs a point the
				// post-layout pass can merge the group onto
				bends.push(Point::new(trunk_x, sy));
			}
			let horizontal = sy == ty && sx != tx;
			if group_count[key] > 1 && (!bends.is_empty() || horizontal) {
				edge.junction_points.push(Point::new(trunk_x, sy));
			}
			for label in &mut edge.labels {
				label.x = sx + 3.0;
				label.y = sy - 3.0;
			}
			edge.sections = vec![EdgeSection {
				start: Point::new(sx, sy),
				bends,
				end: Point::new(tx, ty),
			}];
		}
		Ok(graph)
	}
}

fn resolve(
	children: &[LayoutNode],
	index: &HashM<String, usize>,
	node: Option<&str>,
	port: Option<&str>,
) -> Result<Endpoint> {
	let node = node.ok_or_else(|| Error::LayoutError("edge endpoint missing a node".to_owned()))?;
	let &ni = index
		.get(node)
		.ok_or_else(|| Error::LayoutError(format!("edge references unknown node {:?}", node)))?;
	let port =
		port.ok_or_else(|| Error::LayoutError(format!("edge into {:?} missing a port", node)))?;
	let p = children[ni]
		.ports
		.iter()
		.find(|p| p.id == port)
		.ok_or_else(|| {
			Error::LayoutError(format!("edge references unknown port {:?} on {:?}", port, node))
		})?;
	Ok(Endpoint {
		node: ni,
		dx: p.x,
		dy: p.y,
	})
}
