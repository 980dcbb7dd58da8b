use eframe::egui::{
    self, Align2, Color32, FontId, Painter, Pos2, Rect, Sense, Stroke, StrokeKind, Ui, vec2,
};

use crate::model::{EdgeKind, NodeKind};

use super::super::highlight::{HighlightStyle, PathRole};
use super::viewport::{circle_visible, hovered_index, segment_visible};
use super::{RenderNode, RenderedView, Viewport};

const DIRECT_COLOR: Color32 = Color32::from_rgb(255, 199, 72);
const HIERARCHICAL_COLOR: Color32 = Color32::from_rgb(241, 146, 94);
const SECONDARY_COLOR: Color32 = Color32::from_rgb(103, 196, 255);
const PATH_COLOR: Color32 = Color32::from_rgb(206, 128, 255);
const SELECTED_COLOR: Color32 = Color32::from_rgb(245, 206, 93);

/// What happened on the canvas this frame.
#[derive(Debug, Default)]
pub(in crate::app) struct PaintOutcome {
    /// `Some(None)` is a click on empty canvas.
    pub clicked: Option<Option<usize>>,
    pub interacting: bool,
}

fn blend_color(base: Color32, overlay: Color32, amount: f32) -> Color32 {
    let amount = amount.clamp(0.0, 1.0);
    let inverse = 1.0 - amount;
    let mix = |a: u8, b: u8| ((a as f32 * inverse) + (b as f32 * amount)) as u8;

    Color32::from_rgba_unmultiplied(
        mix(base.r(), overlay.r()),
        mix(base.g(), overlay.g()),
        mix(base.b(), overlay.b()),
        mix(base.a(), overlay.a()),
    )
}

fn dim_color(color: Color32, factor: f32) -> Color32 {
    let factor = factor.clamp(0.0, 1.0);
    Color32::from_rgba_unmultiplied(
        (color.r() as f32 * factor) as u8,
        (color.g() as f32 * factor) as u8,
        (color.b() as f32 * factor) as u8,
        (color.a() as f32 * (0.45 + (factor * 0.55))) as u8,
    )
}

fn kind_color(node: &RenderNode) -> Color32 {
    if node.is_external() {
        return Color32::from_gray(110);
    }
    match &node.kind {
        NodeKind::Root => Color32::from_gray(150),
        NodeKind::Class(_) => Color32::from_rgb(86, 140, 214),
        NodeKind::Method(_) => Color32::from_rgb(96, 178, 132),
        NodeKind::Function(_) => Color32::from_rgb(72, 170, 170),
        NodeKind::Call(_) => Color32::from_rgb(214, 132, 86),
        NodeKind::Syntax(_) => Color32::from_rgb(140, 128, 188),
    }
}

fn node_fill(node: &RenderNode) -> Color32 {
    let base = kind_color(node);
    let mark = node.mark;
    let tiered = match mark.tier {
        Some(HighlightStyle::Direct) => blend_color(base, DIRECT_COLOR, 0.85),
        Some(HighlightStyle::Hierarchical) => blend_color(base, HIERARCHICAL_COLOR, 0.55),
        Some(HighlightStyle::Secondary) | None if mark.secondary => {
            blend_color(base, SECONDARY_COLOR, 0.7)
        }
        Some(HighlightStyle::Secondary) | None => match mark.path_role {
            Some(PathRole::Endpoint) => blend_color(base, PATH_COLOR, 0.8),
            Some(PathRole::Intermediate) => blend_color(base, PATH_COLOR, 0.45),
            None => base,
        },
    };

    if mark.dimmed {
        dim_color(tiered, 0.4)
    } else {
        tiered
    }
}

fn edge_stroke(view: &RenderedView, index: usize, zoom_sqrt: f32) -> Stroke {
    let mark = view.edges[index].mark;
    if mark.on_path {
        Stroke::new((3.0 * zoom_sqrt).clamp(1.6, 5.4), PATH_COLOR)
    } else if mark.emphasized {
        Stroke::new(
            (1.8 * zoom_sqrt).clamp(1.0, 3.6),
            Color32::from_rgba_unmultiplied(214, 196, 150, 210),
        )
    } else if mark.dimmed {
        Stroke::new(
            (0.8 * zoom_sqrt).clamp(0.45, 2.0),
            Color32::from_rgba_unmultiplied(80, 90, 104, 110),
        )
    } else {
        Stroke::new(
            (1.2 * zoom_sqrt).clamp(0.6, 3.4),
            Color32::from_rgba_unmultiplied(120, 120, 120, 200),
        )
    }
}

fn draw_background(painter: &Painter, rect: Rect, viewport: &Viewport) {
    painter.rect_filled(rect, 0.0, Color32::from_rgb(19, 23, 29));

    let step = (56.0 * viewport.zoom.clamp(0.6, 1.8)).max(20.0);
    let origin = rect.center() + viewport.pan;
    let stroke = Stroke::new(1.0, Color32::from_rgba_unmultiplied(60, 70, 80, 70));

    let mut x = origin.x.rem_euclid(step);
    while x < rect.right() {
        painter.line_segment([Pos2::new(x, rect.top()), Pos2::new(x, rect.bottom())], stroke);
        x += step;
    }

    let mut y = origin.y.rem_euclid(step);
    while y < rect.bottom() {
        painter.line_segment([Pos2::new(rect.left(), y), Pos2::new(rect.right(), y)], stroke);
        y += step;
    }
}

fn draw_node(painter: &Painter, node: &RenderNode, position: Pos2, radius: f32, selected: bool) {
    let fill = node_fill(node);
    let outline = Stroke::new(
        if node.mark.tier == Some(HighlightStyle::Direct) { 2.2 } else { 1.0 },
        Color32::from_rgba_unmultiplied(15, 15, 15, 190),
    );

    if matches!(node.kind, NodeKind::Class(_)) {
        let shape = Rect::from_center_size(position, vec2(radius * 2.6, radius * 1.6));
        painter.rect_filled(shape, 3.0, fill);
        painter.rect_stroke(shape, 3.0, outline, StrokeKind::Middle);
        if node.mark.secondary {
            painter.rect_stroke(
                shape.expand(3.0),
                4.0,
                Stroke::new(2.0, SECONDARY_COLOR),
                StrokeKind::Outside,
            );
        }
        if selected {
            painter.rect_stroke(
                shape.expand(6.0),
                5.0,
                Stroke::new(1.6, SELECTED_COLOR),
                StrokeKind::Outside,
            );
        }
    } else {
        painter.circle_filled(position, radius, fill);
        painter.circle_stroke(position, radius, outline);
        if node.mark.secondary {
            painter.circle_stroke(position, radius + 3.0, Stroke::new(2.0, SECONDARY_COLOR));
        }
        if selected {
            painter.circle_stroke(position, radius + 6.0, Stroke::new(1.6, SELECTED_COLOR));
        }
    }

    if node.mark.path_role == Some(PathRole::Endpoint) {
        painter.circle_stroke(position, radius + 9.0, Stroke::new(1.4, PATH_COLOR));
    }
}

fn handle_node_drag(
    view: &mut RenderedView,
    viewport: &mut Viewport,
    rect: Rect,
    response: &egui::Response,
    hovered: Option<usize>,
) {
    let Some(simulation) = view.simulation.as_mut() else {
        viewport.dragging = None;
        return;
    };

    if response.drag_started_by(egui::PointerButton::Primary) {
        viewport.dragging = hovered;
    }

    let Some(index) = viewport.dragging else {
        return;
    };

    if response.drag_stopped() {
        simulation.release(index);
        viewport.dragging = None;
        return;
    }

    if let Some(pointer) = response.interact_pointer_pos() {
        let world = viewport.screen_to_world(rect, pointer);
        simulation.pin(index, world);
        if let Some(node) = view.nodes.get_mut(index) {
            node.world_pos = world;
        }
    }
}

/// Draws `view` into the remaining space of `ui` and handles canvas input.
pub(in crate::app) fn paint_view(
    ui: &mut Ui,
    view: &mut RenderedView,
    viewport: &mut Viewport,
    selected: Option<usize>,
) -> PaintOutcome {
    let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
    let painter = ui.painter_at(rect);
    draw_background(&painter, rect, viewport);

    if view.is_empty() {
        painter.text(
            rect.center(),
            Align2::CENTER_CENTER,
            format!("No {} data loaded", view.view.label()),
            FontId::proportional(16.0),
            Color32::from_gray(170),
        );
        return PaintOutcome::default();
    }

    viewport.handle_zoom(ui, rect, &response);

    let pointer = ui.input(|input| input.pointer.hover_pos());
    let zoom_scale = viewport.zoom.powf(0.5);
    let mut screen_positions = Vec::with_capacity(view.nodes.len());
    let mut screen_radii = Vec::with_capacity(view.nodes.len());
    for node in &view.nodes {
        screen_positions.push(viewport.world_to_screen(rect, node.world_pos));
        screen_radii.push((node.radius * zoom_scale).clamp(2.5, 46.0));
    }
    let visible = (0..view.nodes.len())
        .filter(|&index| circle_visible(rect, screen_positions[index], screen_radii[index]))
        .collect::<Vec<_>>();
    let hovered = hovered_index(pointer, &visible, &screen_positions, &screen_radii);

    handle_node_drag(view, viewport, rect, &response, hovered);
    viewport.handle_pan(&response);

    if hovered.is_some() || viewport.dragging.is_some() {
        ui.output_mut(|output| output.cursor_icon = egui::CursorIcon::PointingHand);
    }

    let zoom_sqrt = viewport.zoom.sqrt();
    for (index, edge) in view.edges.iter().enumerate() {
        let (Some(&start), Some(&end)) = (screen_positions.get(edge.from), screen_positions.get(edge.to))
        else {
            continue;
        };
        if !segment_visible(rect, start, end, 2.5) {
            continue;
        }

        let stroke = edge_stroke(view, index, zoom_sqrt);
        let delta = end - start;
        if edge.kind == EdgeKind::Call && delta.length() > screen_radii[edge.to] + 4.0 {
            let tip = end - delta.normalized() * (screen_radii[edge.to] + 2.0);
            painter.arrow(start, tip - start, stroke);
        } else {
            painter.line_segment([start, end], stroke);
        }
    }

    let mut visible_mask = vec![false; view.nodes.len()];
    for &index in &visible {
        visible_mask[index] = true;
    }

    for &index in view.draw_order() {
        if !visible_mask[index] {
            continue;
        }
        let node = &view.nodes[index];
        let position = screen_positions[index];
        let radius = screen_radii[index];
        draw_node(&painter, node, position, radius, selected == Some(index));

        let should_label = node.mark.is_raised()
            || hovered == Some(index)
            || selected == Some(index)
            || radius > 14.0
            || viewport.zoom > 1.2;
        if should_label && !node.mark.dimmed {
            painter.text(
                position + vec2(radius + 5.0, 0.0),
                Align2::LEFT_CENTER,
                node.label.as_str(),
                FontId::proportional(12.0),
                Color32::from_gray(238),
            );
        }
    }

    if let Some(index) = hovered {
        let node = &view.nodes[index];
        let span = node
            .source_ref
            .as_ref()
            .map(|source| source.span_label())
            .unwrap_or_else(|| "no source".to_owned());
        painter.text(
            rect.left_top() + vec2(10.0, 10.0),
            Align2::LEFT_TOP,
            format!("{}  |  {}  |  {span}", node.label, node.kind.label()),
            FontId::proportional(13.0),
            Color32::from_gray(240),
        );
    }

    let clicked = response
        .clicked_by(egui::PointerButton::Primary)
        .then_some(hovered);

    PaintOutcome {
        clicked,
        interacting: response.dragged() || viewport.dragging.is_some(),
    }
}
