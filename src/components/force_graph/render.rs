use std::f64::consts::PI;

use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

use super::state::{ForceGraphState, NodeInfo};
use crate::engine::camera::ease_out_cubic;

const BACKGROUND: &str = "#1a1a2e";
const MINIMAP_WIDTH: f64 = 160.0;
const MINIMAP_HEIGHT: f64 = 120.0;
const MINIMAP_MARGIN: f64 = 12.0;

pub fn render(state: &ForceGraphState, ctx: &CanvasRenderingContext2d) {
	ctx.set_fill_style_str(BACKGROUND);
	ctx.fill_rect(0.0, 0.0, state.width, state.height);
	ctx.save();
	let _ = ctx.translate(state.transform.x, state.transform.y);
	let _ = ctx.scale(state.transform.k, state.transform.k);
	draw_edges(state, ctx);
	draw_nodes(state, ctx);
	ctx.restore();
	if state.show_minimap {
		draw_minimap(state, ctx);
	}
}

fn draw_edges(state: &ForceGraphState, ctx: &CanvasRenderingContext2d) {
	let k = state.transform.k;
	let (dash, gap) = (8.0 / k, 4.0 / k);
	let dash_offset = -(state.flow_time * 30.0) % (dash + gap);
	let t = ease_out_cubic(state.hover.highlight_t);

	state.graph.visit_edges(|n1, n2, edge| {
		let link = &edge.user_data;
		let (x1, y1, x2, y2) = (n1.x() as f64, n1.y() as f64, n2.x() as f64, n2.y() as f64);
		let (dx, dy) = (x2 - x1, y2 - y1);
		let dist = (dx * dx + dy * dy).sqrt();
		if dist < 0.001 {
			return;
		}

		// hover fades unrelated edges on top of the encoded opacity
		let hovered = state.is_hover_highlighted(n1.index()) && state.is_hover_highlighted(n2.index());
		let alpha = if !state.has_hover() || hovered {
			link.opacity
		} else {
			link.opacity * (1.0 - 0.7 * t)
		};

		ctx.set_global_alpha(alpha);
		ctx.set_stroke_style_str(link.color);
		ctx.set_line_width(link.width / k);
		if link.highlighted {
			let _ = ctx.set_line_dash(&js_sys::Array::of2(
				&JsValue::from_f64(dash),
				&JsValue::from_f64(gap),
			));
			ctx.set_line_dash_offset(dash_offset);
		} else {
			let _ = ctx.set_line_dash(&js_sys::Array::new());
		}

		let (ux, uy) = (dx / dist, dy / dist);
		let (r1, r2) = (n1.data.user_data.radius, n2.data.user_data.radius);
		ctx.begin_path();
		ctx.move_to(x1 + ux * r1, y1 + uy * r1);
		ctx.line_to(x2 - ux * r2, y2 - uy * r2);
		ctx.stroke();
	});
	let _ = ctx.set_line_dash(&js_sys::Array::new());
	ctx.set_global_alpha(1.0);
}

fn draw_label(ctx: &CanvasRenderingContext2d, info: &NodeInfo, x: f64, y: f64, radius: f64, k: f64, alpha: f64) {
	ctx.set_fill_style_str(&format!("rgba(255, 255, 255, {})", alpha));
	ctx.set_font(&format!("{}px sans-serif", 10.0 / k.max(0.5)));
	let _ = ctx.fill_text(&info.label, x + radius + 3.0, y + 3.0);
}

fn draw_nodes(state: &ForceGraphState, ctx: &CanvasRenderingContext2d) {
	let (t, k) = (ease_out_cubic(state.hover.highlight_t), state.transform.k);
	let hovering = state.has_hover();

	// dimmed and non-hovered nodes first so the rest paints over them
	state.graph.visit_nodes(|node| {
		let idx = node.index();
		let info = &node.data.user_data;
		if hovering && state.is_hover_highlighted(idx) {
			return;
		}
		let (x, y) = (node.x() as f64, node.y() as f64);
		let fade = if hovering { 1.0 - 0.7 * t } else { 1.0 };
		let alpha = info.opacity * fade;

		ctx.set_global_alpha(alpha);
		ctx.begin_path();
		let _ = ctx.arc(x, y, info.radius, 0.0, 2.0 * PI);
		ctx.set_fill_style_str(info.color);
		ctx.fill();
		ctx.set_global_alpha(1.0);

		draw_markers(ctx, info, x, y, k, alpha);
		if info.highlighted || (!info.dimmed && info.radius >= 9.0) {
			draw_label(ctx, info, x, y, info.radius, k, alpha * 0.8);
		}
	});

	if !hovering {
		return;
	}

	state.graph.visit_nodes(|node| {
		let idx = node.index();
		if !state.is_hover_highlighted(idx) {
			return;
		}
		let info = &node.data.user_data;
		let (x, y) = (node.x() as f64, node.y() as f64);
		let is_hovered = state.is_hovered(idx);
		let base = info.radius;

		let (radius, glow_radius) = if is_hovered {
			(base * (1.0 + 0.35 * t), base * (1.8 + 1.2 * t))
		} else {
			(base * (1.0 + 0.2 * t), base * (1.4 + 0.6 * t))
		};

		if t > 0.01 {
			if let Ok(gradient) = ctx.create_radial_gradient(x, y, radius * 0.3, x, y, glow_radius) {
				let alpha = if is_hovered { 0.35 * t } else { 0.2 * t };
				let _ = gradient.add_color_stop(0.0, &format!("rgba(255, 255, 255, {})", alpha));
				let _ = gradient.add_color_stop(0.6, &format!("rgba(200, 220, 255, {})", alpha * 0.3));
				let _ = gradient.add_color_stop(1.0, "rgba(255, 255, 255, 0)");
				ctx.begin_path();
				let _ = ctx.arc(x, y, glow_radius, 0.0, 2.0 * PI);
				#[allow(deprecated)]
				ctx.set_fill_style(&gradient);
				ctx.fill();
			}
		}

		ctx.set_global_alpha(info.opacity.max(0.6));
		ctx.begin_path();
		let _ = ctx.arc(x, y, radius, 0.0, 2.0 * PI);
		ctx.set_fill_style_str(info.color);
		ctx.fill();
		ctx.set_global_alpha(1.0);

		if is_hovered && t > 0.01 {
			ctx.begin_path();
			let _ = ctx.arc(x, y, radius + 2.0 / k, 0.0, 2.0 * PI);
			ctx.set_stroke_style_str(&format!("rgba(255, 255, 255, {})", 0.7 * t));
			ctx.set_line_width(1.5 / k);
			ctx.stroke();
		}

		draw_markers(ctx, info, x, y, k, 1.0);
		draw_label(ctx, info, x, y, radius, k, 1.0);
	});
}

/// Pin ring and the dashed outline of a slice preview.
fn draw_markers(ctx: &CanvasRenderingContext2d, info: &NodeInfo, x: f64, y: f64, k: f64, alpha: f64) {
	if info.preview_sliced {
		let _ = ctx.set_line_dash(&js_sys::Array::of2(
			&JsValue::from_f64(3.0 / k),
			&JsValue::from_f64(2.0 / k),
		));
		ctx.begin_path();
		let _ = ctx.arc(x, y, info.radius + 3.0 / k, 0.0, 2.0 * PI);
		ctx.set_stroke_style_str(&format!("rgba(239, 68, 68, {})", alpha.max(0.6)));
		ctx.set_line_width(1.5 / k);
		ctx.stroke();
		let _ = ctx.set_line_dash(&js_sys::Array::new());
	}
	if info.pinned {
		ctx.begin_path();
		let _ = ctx.arc(x, y, info.radius * 0.35, 0.0, 2.0 * PI);
		ctx.set_fill_style_str(&format!("rgba(255, 255, 255, {})", alpha));
		ctx.fill();
	}
}

fn draw_minimap(state: &ForceGraphState, ctx: &CanvasRenderingContext2d) {
	let Some((min_x, min_y, max_x, max_y)) = state.bounds() else {
		return;
	};
	let (left, top) = (
		state.width - MINIMAP_WIDTH - MINIMAP_MARGIN,
		state.height - MINIMAP_HEIGHT - MINIMAP_MARGIN,
	);
	let span = (max_x - min_x).max(max_y - min_y).max(1.0);
	let scale = (MINIMAP_WIDTH.min(MINIMAP_HEIGHT) - 8.0) / span;
	let (ox, oy) = (
		left + (MINIMAP_WIDTH - (max_x - min_x) * scale) / 2.0,
		top + (MINIMAP_HEIGHT - (max_y - min_y) * scale) / 2.0,
	);
	let project = |x: f64, y: f64| (ox + (x - min_x) * scale, oy + (y - min_y) * scale);

	ctx.set_fill_style_str("rgba(15, 15, 30, 0.85)");
	ctx.fill_rect(left, top, MINIMAP_WIDTH, MINIMAP_HEIGHT);
	ctx.set_stroke_style_str("rgba(255, 255, 255, 0.2)");
	ctx.set_line_width(1.0);
	ctx.stroke_rect(left, top, MINIMAP_WIDTH, MINIMAP_HEIGHT);

	state.graph.visit_nodes(|node| {
		let info = &node.data.user_data;
		let (x, y) = project(node.x() as f64, node.y() as f64);
		ctx.set_global_alpha(info.opacity);
		ctx.begin_path();
		let _ = ctx.arc(x, y, info.minimap_radius, 0.0, 2.0 * PI);
		ctx.set_fill_style_str(info.color);
		ctx.fill();
	});
	ctx.set_global_alpha(1.0);

	// visible region
	let (vx0, vy0) = state.screen_to_graph(0.0, 0.0);
	let (vx1, vy1) = state.screen_to_graph(state.width, state.height);
	let (px0, py0) = project(vx0, vy0);
	let (px1, py1) = project(vx1, vy1);
	ctx.save();
	ctx.begin_path();
	ctx.rect(left, top, MINIMAP_WIDTH, MINIMAP_HEIGHT);
	ctx.clip();
	ctx.set_stroke_style_str("rgba(255, 215, 0, 0.8)");
	ctx.stroke_rect(px0, py0, px1 - px0, py1 - py0);
	ctx.restore();
}
