use log::error;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use crate::board::BoardState;
use crate::interaction::{Interaction, PreviewLine};
use crate::state::{ConnectionId, Point, Rect, Size};

const EDGE_COLOR: &str = "#92ff68";
const EDGE_SELECTED: &str = "#22aaff";
const EDGE_WIDTH: f64 = 3.0;
const PREVIEW_COLOR: &str = "#00ff00";
const PREVIEW_WIDTH: f64 = 2.0;
const PREVIEW_DASH: f64 = 5.0;

pub const ARROW_LENGTH: f64 = 15.0;
pub const ARROW_SPREAD: f64 = std::f64::consts::PI / 6.0;
/// Samples per curve when hit-testing.
const HIT_SEGMENTS: usize = 24;

/// One connection, resolved to canvas-local coordinates.
#[derive(Clone, Debug, PartialEq)]
pub struct EdgePath {
    pub id: ConnectionId,
    pub start: Point,
    pub cp1: Point,
    pub cp2: Point,
    pub end: Point,
    pub arrow: [Point; 3],
    pub selected: bool,
}

impl EdgePath {
    pub fn point_at(&self, t: f64) -> Point {
        let u = 1.0 - t;
        let (a, b, c, d) = (u * u * u, 3.0 * u * u * t, 3.0 * u * t * t, t * t * t);
        Point::new(
            a * self.start.x + b * self.cp1.x + c * self.cp2.x + d * self.end.x,
            a * self.start.y + b * self.cp1.y + c * self.cp2.y + d * self.end.y,
        )
    }
}

/// Everything one repaint needs. Built from board state alone.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RenderFrame {
    pub size: Size,
    pub edges: Vec<EdgePath>,
    pub preview: Option<PreviewLine>,
}

/// Source right-edge midpoint and target left-edge midpoint.
pub fn anchors(source: &Rect, target: &Rect) -> (Point, Point) {
    (source.mid_right(), target.mid_left())
}

/// Horizontal control points a third of the way in from each anchor.
pub fn control_points(start: Point, end: Point) -> (Point, Point) {
    let third = (end.x - start.x) / 3.0;
    (Point::new(start.x + third, start.y), Point::new(end.x - third, end.y))
}

/// Triangle `[tip, left, right]` pointing from `from` towards `tip`.
pub fn arrowhead(from: Point, tip: Point) -> [Point; 3] {
    let angle = (tip.y - from.y).atan2(tip.x - from.x);
    let leg = |a: f64| Point::new(tip.x - ARROW_LENGTH * a.cos(), tip.y - ARROW_LENGTH * a.sin());
    [tip, leg(angle - ARROW_SPREAD), leg(angle + ARROW_SPREAD)]
}

/// Projects visible connections and the pending preview into canvas space.
/// `canvas` is the canvas rect in the same screen space the viewport maps to.
pub fn build_frame(board: &BoardState, interaction: &Interaction, canvas: Rect) -> RenderFrame {
    let size = board.registry.node_size();
    let rect_of = |name: &str| {
        let pos = interaction.display_position(board, name)?;
        let screen = board.viewport.project(&Rect::from_origin(pos, Size::new(size, size)));
        Some(screen.translate(-canvas.x, -canvas.y))
    };
    let bounds = Rect::new(0.0, 0.0, canvas.width, canvas.height);
    let selected = interaction.selected_connection();

    let mut edges = Vec::new();
    board.connections.for_each_visible(&bounds, rect_of, |conn, source, target| {
        let (start, end) = anchors(&source, &target);
        let (cp1, cp2) = control_points(start, end);
        edges.push(EdgePath {
            id: conn.id,
            start,
            cp1,
            cp2,
            end,
            arrow: arrowhead(cp2, end),
            selected: selected == Some(conn.id),
        });
    });

    let preview = interaction.preview().map(|line| PreviewLine {
        start: line.start.offset(-canvas.x, -canvas.y),
        end: line.end.offset(-canvas.x, -canvas.y),
    });

    RenderFrame {
        size: Size::new(canvas.width, canvas.height),
        edges,
        preview,
    }
}

fn distance_to_segment(p: Point, a: Point, b: Point) -> f64 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let len_sq = dx * dx + dy * dy;
    let t = if len_sq == 0.0 {
        0.0
    } else {
        (((p.x - a.x) * dx + (p.y - a.y) * dy) / len_sq).clamp(0.0, 1.0)
    };
    ((p.x - (a.x + t * dx)).powi(2) + (p.y - (a.y + t * dy)).powi(2)).sqrt()
}

/// Nearest connection within `tolerance` of a canvas-local point.
pub fn connection_at(frame: &RenderFrame, point: Point, tolerance: f64) -> Option<ConnectionId> {
    frame
        .edges
        .iter()
        .filter_map(|edge| {
            let mut prev = edge.start;
            let mut best = f64::INFINITY;
            for i in 1..=HIT_SEGMENTS {
                let next = edge.point_at(i as f64 / HIT_SEGMENTS as f64);
                best = best.min(distance_to_segment(point, prev, next));
                prev = next;
            }
            (best <= tolerance).then_some((edge.id, best))
        })
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(id, _)| id)
}

pub fn render_frame(ctx: &CanvasRenderingContext2d, frame: &RenderFrame) {
    ctx.clear_rect(0.0, 0.0, frame.size.width, frame.size.height);

    for edge in &frame.edges {
        draw_edge(ctx, edge);
    }

    if let Some(line) = frame.preview {
        draw_preview(ctx, &line);
    }
}

fn draw_edge(ctx: &CanvasRenderingContext2d, edge: &EdgePath) {
    let color = if edge.selected { EDGE_SELECTED } else { EDGE_COLOR };
    ctx.set_stroke_style_str(color);
    ctx.set_line_width(EDGE_WIDTH);
    ctx.begin_path();
    ctx.move_to(edge.start.x, edge.start.y);
    ctx.bezier_curve_to(edge.cp1.x, edge.cp1.y, edge.cp2.x, edge.cp2.y, edge.end.x, edge.end.y);
    ctx.stroke();

    let [tip, left, right] = edge.arrow;
    ctx.set_fill_style_str(color);
    ctx.begin_path();
    ctx.move_to(tip.x, tip.y);
    ctx.line_to(left.x, left.y);
    ctx.line_to(right.x, right.y);
    ctx.close_path();
    ctx.fill();
}

fn set_dash(ctx: &CanvasRenderingContext2d, segments: &[f64]) {
    let dash: js_sys::Array = segments.iter().map(|s| JsValue::from_f64(*s)).collect();
    if let Err(e) = ctx.set_line_dash(&dash) {
        error!("set_line_dash failed: {:?}", e);
    }
}

fn draw_preview(ctx: &CanvasRenderingContext2d, line: &PreviewLine) {
    set_dash(ctx, &[PREVIEW_DASH, PREVIEW_DASH]);
    ctx.set_stroke_style_str(PREVIEW_COLOR);
    ctx.set_line_width(PREVIEW_WIDTH);
    ctx.begin_path();
    ctx.move_to(line.start.x, line.start.y);
    ctx.line_to(line.end.x, line.end.y);
    ctx.stroke();
    set_dash(ctx, &[]);
}

pub fn get_canvas_context(canvas: &HtmlCanvasElement) -> Result<CanvasRenderingContext2d, JsValue> {
    Ok(canvas
        .get_context("2d")?
        .ok_or_else(|| JsValue::from_str("canvas has no 2d context"))?
        .dyn_into::<CanvasRenderingContext2d>()?)
}
