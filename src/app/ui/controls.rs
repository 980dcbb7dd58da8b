use eframe::egui::{self, Key, Response, Ui};

use super::super::{ViewKind, ViewModel};

const SLIDER_KEY_BASE_RATE: f32 = 10.0;
const SLIDER_KEY_ACCEL_PER_SEC: f32 = 9.0;
const SLIDER_KEY_ACCEL_MAX: f32 = 40.0;

#[derive(Clone, Copy, Default)]
struct SliderKeyHoldState {
    positive_secs: f32,
    negative_secs: f32,
}

fn slider_key_accel_multiplier(hold_secs: f32) -> f32 {
    let ramp = hold_secs * SLIDER_KEY_ACCEL_PER_SEC;
    (1.0 + ramp + ramp * ramp * 0.15).min(SLIDER_KEY_ACCEL_MAX)
}

/// Holding an arrow key on a focused slider speeds up the longer it is held.
fn apply_slider_arrow_acceleration(ui: &Ui, response: &Response, value: &mut f32, min: f32, max: f32) -> bool {
    let state_id = response.id.with("arrow_key_hold_state");
    if !response.has_focus() {
        ui.ctx()
            .data_mut(|data| data.insert_temp(state_id, SliderKeyHoldState::default()));
        return false;
    }

    let mut hold_state = ui.ctx().data(|data| {
        data.get_temp::<SliderKeyHoldState>(state_id)
            .unwrap_or_default()
    });
    let (delta_time, increase_down, decrease_down) = ui.input(|input| {
        (
            input.stable_dt.min(0.1),
            input.key_down(Key::ArrowRight) || input.key_down(Key::ArrowUp),
            input.key_down(Key::ArrowLeft) || input.key_down(Key::ArrowDown),
        )
    });

    hold_state.positive_secs = if increase_down { hold_state.positive_secs + delta_time } else { 0.0 };
    hold_state.negative_secs = if decrease_down { hold_state.negative_secs + delta_time } else { 0.0 };
    ui.ctx()
        .data_mut(|data| data.insert_temp(state_id, hold_state));

    let direction = (increase_down as i8) - (decrease_down as i8);
    if direction == 0 {
        return false;
    }

    let hold_secs = if direction > 0 {
        hold_state.positive_secs
    } else {
        hold_state.negative_secs
    };
    let step = ((max - min) / 200.0).max(0.0005);
    let delta = direction as f32 * step * SLIDER_KEY_BASE_RATE * slider_key_accel_multiplier(hold_secs) * delta_time;

    let old_value = *value;
    *value = (*value + delta).clamp(min, max);
    ui.ctx().request_repaint();
    (*value - old_value).abs() > f32::EPSILON
}

fn tuned_slider(ui: &mut Ui, value: &mut f32, min: f32, max: f32, text: &str, hint: &str) -> bool {
    let slider = ui
        .add(
            egui::Slider::new(&mut *value, min..=max)
                .text(text)
                .clamping(egui::SliderClamping::Always),
        )
        .on_hover_text(hint);
    if slider.hovered() {
        slider.request_focus();
    }
    let dragged = slider.changed();
    dragged | apply_slider_arrow_acceleration(ui, &slider, value, min, max)
}

impl ViewModel {
    pub(in crate::app) fn draw_controls(&mut self, ui: &mut Ui) {
        ui.heading("Graph Controls");
        ui.separator();

        let mut physics_changed = false;
        ui.collapsing("Physics tuning", |ui| {
            let physics = &mut self.config.physics;
            physics_changed |= tuned_slider(
                ui,
                &mut physics.intensity,
                0.2,
                2.5,
                "Intensity",
                "Overall strength applied to all physics forces.",
            );
            physics_changed |= tuned_slider(
                ui,
                &mut physics.repulsion_scale,
                0.25,
                2.6,
                "Repulsion",
                "How strongly functions push away from each other.",
            );
            physics_changed |= tuned_slider(
                ui,
                &mut physics.spring_scale,
                0.2,
                2.2,
                "Call spring",
                "How strongly caller and callee pull toward their preferred distance.",
            );
            physics_changed |= tuned_slider(
                ui,
                &mut physics.collision_scale,
                0.2,
                2.0,
                "Collision",
                "Extra separation force to prevent overlap between nearby nodes.",
            );
            physics_changed |= tuned_slider(
                ui,
                &mut physics.velocity_damping,
                0.78,
                0.97,
                "Velocity damping",
                "How quickly node movement slows each frame.",
            );

            if ui
                .button("Reheat")
                .on_hover_text("Restart the force layout from its current positions.")
                .clicked()
                && let Some(simulation) = self
                    .session
                    .rendered_mut()
                    .and_then(|view| view.simulation_mut())
            {
                simulation.reheat(1.0);
            }
            if let Some(simulation) = self.session.rendered().and_then(|view| view.simulation()) {
                let state = if simulation.is_running() { "running" } else { "settled" };
                ui.small(format!(
                    "Layout {state}: alpha {:.3}, {} ticks",
                    simulation.alpha(),
                    simulation.ticks()
                ));
            }
        });
        if physics_changed {
            self.apply_config();
        }

        let mut relayout = false;
        ui.collapsing("Tree spacing", |ui| {
            let tree = &mut self.config.tree;
            relayout |= tuned_slider(
                ui,
                &mut tree.per_node_px,
                16.0,
                120.0,
                "Pixels per node",
                "Minimum horizontal room each node gets; the canvas grows with the tree.",
            );
            relayout |= tuned_slider(
                ui,
                &mut tree.level_height,
                48.0,
                240.0,
                "Level height",
                "Vertical distance between tree depths.",
            );
        });
        if relayout && self.session.view_kind() != ViewKind::CallGraph {
            self.apply_config();
            self.session.notify_data_update();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acceleration_ramps_up_and_caps() {
        assert_eq!(slider_key_accel_multiplier(0.0), 1.0);
        assert!(slider_key_accel_multiplier(0.5) > slider_key_accel_multiplier(0.1));
        assert_eq!(slider_key_accel_multiplier(60.0), SLIDER_KEY_ACCEL_MAX);
    }
}
