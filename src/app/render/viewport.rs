use eframe::egui::{self, Pos2, Rect, Ui, Vec2};

/// Pan, zoom and node-drag state of the graph canvas.
#[derive(Clone, Debug)]
pub(in crate::app) struct Viewport {
    pub pan: Vec2,
    pub zoom: f32,
    pub(super) dragging: Option<usize>,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            pan: Vec2::ZERO,
            zoom: 1.0,
            dragging: None,
        }
    }
}

impl Viewport {
    /// Zoom that fits a `size` canvas into `rect`, never above 1.
    pub fn fit(&mut self, rect: Rect, size: Vec2) {
        let scale_x = rect.width() / size.x.max(1.0);
        let scale_y = rect.height() / size.y.max(1.0);
        self.zoom = scale_x.min(scale_y).clamp(0.05, 1.0);
        self.pan = Vec2::ZERO;
        self.dragging = None;
    }

    pub fn world_to_screen(&self, rect: Rect, world: Vec2) -> Pos2 {
        rect.center() + self.pan + world * self.zoom
    }

    pub fn screen_to_world(&self, rect: Rect, screen: Pos2) -> Vec2 {
        (screen - rect.center() - self.pan) / self.zoom
    }

    pub(super) fn handle_zoom(&mut self, ui: &Ui, rect: Rect, response: &egui::Response) {
        if !response.hovered() {
            return;
        }

        let scroll = ui.input(|input| input.raw_scroll_delta.y);
        if scroll.abs() <= f32::EPSILON {
            return;
        }

        let pointer = ui
            .input(|input| input.pointer.hover_pos())
            .unwrap_or_else(|| rect.center());
        let world_before = self.screen_to_world(rect, pointer);

        let zoom_factor = (1.0 + (scroll * 0.0018)).clamp(0.85, 1.15);
        self.zoom = (self.zoom * zoom_factor).clamp(0.05, 6.0);
        self.pan = pointer - rect.center() - (world_before * self.zoom);
    }

    /// Secondary or middle drag pans. Primary drag pans too unless it grabbed a node.
    pub(super) fn handle_pan(&mut self, response: &egui::Response) {
        let background_drag =
            self.dragging.is_none() && response.dragged_by(egui::PointerButton::Primary);
        if background_drag
            || response.dragged_by(egui::PointerButton::Secondary)
            || response.dragged_by(egui::PointerButton::Middle)
        {
            self.pan += response.drag_delta();
        }
    }
}

pub(super) fn circle_visible(rect: Rect, position: Pos2, radius: f32) -> bool {
    !(position.x + radius < rect.left()
        || position.x - radius > rect.right()
        || position.y + radius < rect.top()
        || position.y - radius > rect.bottom())
}

/// Conservative: a segment whose bounding box touches `rect` counts as visible.
pub(super) fn segment_visible(rect: Rect, start: Pos2, end: Pos2, padding: f32) -> bool {
    let bounds = Rect::from_two_pos(start, end).expand(padding);
    bounds.intersects(rect)
}

pub(super) fn hovered_index(
    pointer: Option<Pos2>,
    visible: &[usize],
    screen_positions: &[Pos2],
    screen_radii: &[f32],
) -> Option<usize> {
    let pointer = pointer?;
    visible
        .iter()
        .filter_map(|&index| {
            let distance = screen_positions[index].distance(pointer);
            (distance <= screen_radii[index]).then_some((index, distance))
        })
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(index, _)| index)
}
