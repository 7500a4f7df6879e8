//! SVG output. Takes the laid-out graph and emits a standalone document:
//! one rect per node tinted by symbol shape, one polyline per routed edge
//! section, junction dots, and text for node and net-width labels.

use std::fmt::Write;

use crate::{
	layout_graph::{LayoutGraph, LayoutNode},
	netlist::signature_width,
	skin::{ShapeKind, Skin},
};

const MARGIN: f64 = 20.0;

pub fn render_svg(graph: &LayoutGraph, skin: &Skin) -> String {
	let (width, height) = extents(graph);
	let mut out = String::new();
	let _ = writeln!(
		out,
		r#"<svg xmlns="http://www.w3.org/2000/svg" width="{}" height="{}" viewBox="0 0 {} {}" font-family="monospace" font-size="8">"#,
		width, height, width, height
	);
	for node in &graph.children {
		if node.is_dummy() {
			continue;
		}
		render_node(&mut out, node, skin);
	}
	for edge in &graph.edges {
		let stroke_width = if signature_width(&edge.net) > 1 { 2 } else { 1 };
		for section in &edge.sections {
			let mut points = String::new();
			let _ = write!(points, "{},{}", section.start.x, section.start.y);
			for bend in &section.bends {
				let _ = write!(points, " {},{}", bend.x, bend.y);
			}
			let _ = write!(points, " {},{}", section.end.x, section.end.y);
			let _ = writeln!(
				out,
				r##"<polyline points="{}" fill="none" stroke="#000000" stroke-width="{}"><title>{}</title></polyline>"##,
				points,
				stroke_width,
				xml_escape(&edge.net)
			);
		}
		for label in &edge.labels {
			let _ = writeln!(
				out,
				r#"<text x="{}" y="{}" font-size="{}">{}</text>"#,
				label.x,
				label.y,
				label.height,
				xml_escape(&label.text)
			);
		}
		for junction in &edge.junction_points {
			let _ = writeln!(
				out,
				r##"<circle cx="{}" cy="{}" r="2" fill="#000000"/>"##,
				junction.x, junction.y
			);
		}
	}
	out.push_str("</svg>\n");
	out
}

fn render_node(out: &mut String, node: &LayoutNode, skin: &Skin) {
	let fill = match skin.find_template(&node.kind).shape {
		ShapeKind::Constant => "#f8f8e8",
		ShapeKind::Split | ShapeKind::Join => "#e8e8f8",
		ShapeKind::InputExt | ShapeKind::OutputExt => "#e8f8e8",
		_ => "#ffffff",
	};
	let _ = writeln!(
		out,
		r##"<rect x="{}" y="{}" width="{}" height="{}" fill="{}" stroke="#000000"><title>{}</title></rect>"##,
		node.x,
		node.y,
		node.width,
		node.height,
		fill,
		xml_escape(&node.id)
	);
	for label in &node.labels {
		let _ = writeln!(
			out,
			r#"<text x="{}" y="{}" text-anchor="middle" dominant-baseline="middle">{}</text>"#,
			node.x + label.x,
			node.y + label.y,
			xml_escape(&label.text)
		);
	}
}

fn extents(graph: &LayoutGraph) -> (f64, f64) {
	let mut width = 0.0f64;
	let mut height = 0.0f64;
	for node in &graph.children {
		width = width.max(node.x + node.width);
		height = height.max(node.y + node.height);
	}
	for edge in &graph.edges {
		for section in &edge.sections {
			for point in [section.start, section.end]
				.iter()
				.chain(section.bends.iter())
			{
				width = width.max(point.x);
				height = height.max(point.y);
			}
		}
	}
	(width + MARGIN, height + MARGIN)
}

fn xml_escape(text: &str) -> String {
	let mut out = String::with_capacity(text.len());
	for c in text.chars() {
		match c {
			'&' => out.push_str("&amp;"),
			'<' => out.push_str("&lt;"),
			'>' => out.push_str("&gt;"),
			'"' => out.push_str("&quot;"),
			_ => out.push(c),
		}
	}
	out
}

#[cfg(test)]
mod test {
	use std::collections::BTreeMap;

	use super::*;
	use crate::{
		circuit::{Circuit, Port},
		layout::{LayeredEngine, LayoutEngine},
		layout_graph::build_layout_graph,
		netlist::Bit,
	};

	fn ids(ids: &[u64]) -> Vec<Bit> {
		ids.iter().map(|i| Bit::Id(*i)).collect()
	}

	#[test]
	fn renders_nodes_edges_and_labels() {
		let skin = Skin::default();
		let mut circuit = Circuit::new("t");
		circuit.add_cell(
			"in",
			"$_inputExt_",
			vec![],
			vec![Port::new("Y", ids(&[1, 2]))],
			BTreeMap::new(),
		);
		circuit.add_cell(
			"out",
			"$_outputExt_",
			vec![Port::new("A", ids(&[1, 2]))],
			vec![],
			BTreeMap::new(),
		);
		circuit.create_wires(&skin);
		let graph = build_layout_graph(&circuit, &skin);
		let graph = LayeredEngine.layout(graph, &skin.layout_options).unwrap();
		let svg = render_svg(&graph, &skin);

		assert!(svg.starts_with("<svg"));
		assert!(svg.ends_with("</svg>\n"));
		assert_eq!(svg.matches("<rect").count(), 2);
		assert!(svg.contains("<polyline"));
		// the 2-bit net draws thick and carries a width label
		assert!(svg.contains(r#"stroke-width="2""#));
		assert!(svg.contains(">2</text>"));
		assert!(svg.contains(">in</text>"));
	}

	#[test]
	fn escapes_markup_in_names() {
		assert_eq!(xml_escape("a<b>&\"c\""), "a&lt;b&gt;&amp;&quot;c&quot;");
	}
}
