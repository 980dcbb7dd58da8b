mod forces;
mod quadtree;

use eframe::egui::{Vec2, vec2};

use crate::config::PhysicsConfig;
use crate::util::stable_pair;

use forces::{Collision, Repulsion};
use quadtree::Cell;

const DRAG_ALPHA_TARGET: f32 = 0.3;
const SPRING_DAMPING: f32 = 0.22;
const COLLISION_PADDING: f32 = 18.0;

#[derive(Clone, Debug)]
pub(in crate::app) struct Body {
    pub position: Vec2,
    pub velocity: Vec2,
    pub radius: f32,
    pub pinned: Option<Vec2>,
}

#[derive(Default)]
struct Scratch {
    forces: Vec<Vec2>,
    positions: Vec<Vec2>,
    radii: Vec<f32>,
}

/// Long-lived force simulation for the call graph.
///
/// `alpha` is the remaining energy. It decays toward `alpha_target` every tick and
/// the simulation stops integrating once it falls under `alpha_min`; nothing ever
/// stops it explicitly.
pub(in crate::app) struct Simulation {
    bodies: Vec<Body>,
    links: Vec<(usize, usize)>,
    config: PhysicsConfig,
    alpha: f32,
    alpha_target: f32,
    ticks: u64,
    scratch: Scratch,
}

impl Simulation {
    pub fn new(ids: &[&str], radii: &[f32], links: Vec<(usize, usize)>, config: PhysicsConfig) -> Self {
        let golden_angle = std::f32::consts::PI * (3.0 - 5.0_f32.sqrt());
        let bodies = ids
            .iter()
            .enumerate()
            .map(|(index, id)| {
                let (jx, jy) = stable_pair(id);
                let angle = index as f32 * golden_angle;
                let spread = 36.0 * (0.5 + index as f32).sqrt();
                Body {
                    position: vec2(angle.cos(), angle.sin()) * spread + vec2(jx, jy) * 6.0,
                    velocity: Vec2::ZERO,
                    radius: radii.get(index).copied().unwrap_or(10.0),
                    pinned: None,
                }
            })
            .collect::<Vec<_>>();

        let count = bodies.len();
        let links = links
            .into_iter()
            .filter(|&(from, to)| from < count && to < count && from != to)
            .collect();

        Self {
            bodies,
            links,
            config,
            alpha: 1.0,
            alpha_target: 0.0,
            ticks: 0,
            scratch: Scratch::default(),
        }
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn is_running(&self) -> bool {
        self.alpha >= self.config.alpha_min || self.alpha_target > 0.0
    }

    pub fn is_settled(&self, threshold: f32) -> bool {
        self.alpha < threshold && self.alpha_target <= 0.0
    }

    /// Raises alpha to `amount` only when the simulation has cooled below `threshold`.
    /// Returns whether it was reheated.
    pub fn nudge(&mut self, threshold: f32, amount: f32) -> bool {
        if !self.is_settled(threshold) || self.alpha >= amount {
            return false;
        }
        self.alpha = amount;
        true
    }

    /// Unconditional restart, for when the user asks for it.
    pub fn reheat(&mut self, alpha: f32) {
        self.alpha = self.alpha.max(alpha);
    }

    pub fn set_config(&mut self, config: PhysicsConfig) {
        self.config = config;
    }

    pub fn position(&self, index: usize) -> Option<Vec2> {
        self.bodies.get(index).map(|body| body.position)
    }

    pub fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    pub fn pin(&mut self, index: usize, position: Vec2) {
        let Some(body) = self.bodies.get_mut(index) else {
            return;
        };
        body.pinned = Some(position);
        body.position = position;
        body.velocity = Vec2::ZERO;
        self.alpha_target = DRAG_ALPHA_TARGET;
        self.alpha = self.alpha.max(DRAG_ALPHA_TARGET);
    }

    pub fn release(&mut self, index: usize) {
        if let Some(body) = self.bodies.get_mut(index) {
            body.pinned = None;
        }
        if self.bodies.iter().all(|body| body.pinned.is_none()) {
            self.alpha_target = 0.0;
        }
    }

    /// Advances one frame. Returns whether anything moved.
    pub fn tick(&mut self, delta_seconds: f32) -> bool {
        if !self.is_running() {
            return false;
        }

        let moved = self.integrate(delta_seconds);
        self.alpha += (self.alpha_target - self.alpha) * self.config.alpha_decay.clamp(0.0, 1.0);
        self.ticks += 1;
        moved
    }

    fn integrate(&mut self, delta_seconds: f32) -> bool {
        let count = self.bodies.len();
        if count == 0 {
            return false;
        }

        let config = self.config;
        let intensity = config.intensity.clamp(0.2, 2.5);
        let repulsion = Repulsion {
            strength: 52_000.0 * intensity * config.repulsion_scale.clamp(0.25, 2.6),
            softening: 620.0,
        };
        let spring_strength = 0.02 * intensity * config.spring_scale.clamp(0.2, 2.2);
        let collision_strength = 1.6 * intensity * config.collision_scale.clamp(0.2, 2.0);
        let center_pull = 0.004 * intensity;
        let damping = config.velocity_damping.clamp(0.5, 0.98);
        let time_step = (delta_seconds * 60.0).clamp(0.25, 3.0);

        let scratch = &mut self.scratch;
        scratch.forces.clear();
        scratch.forces.resize(count, Vec2::ZERO);
        scratch.positions.clear();
        scratch.positions.extend(self.bodies.iter().map(|body| body.position));
        scratch.radii.clear();
        scratch.radii.extend(self.bodies.iter().map(|body| body.radius));
        let max_radius = scratch.radii.iter().copied().fold(0.0_f32, f32::max);

        if let Some(tree) = Cell::build(&scratch.positions) {
            for (index, force) in scratch.forces.iter_mut().enumerate() {
                repulsion.accumulate(&tree, index, &scratch.positions, force);
            }

            let reach = max_radius * 2.0 + COLLISION_PADDING;
            let collision = Collision {
                positions: &scratch.positions,
                radii: &scratch.radii,
                strength: collision_strength,
                padding: COLLISION_PADDING,
                reach_sq: reach * reach,
            };
            collision.accumulate(&tree, &tree, true, &mut scratch.forces);
        }

        for &(from, to) in &self.links {
            let delta = self.bodies[from].position - self.bodies[to].position;
            let distance = delta.length();
            if distance <= 0.0001 {
                continue;
            }
            let direction = delta / distance;
            let preferred = 90.0 + (self.bodies[from].radius + self.bodies[to].radius) * 2.0;
            let relative = (self.bodies[from].velocity - self.bodies[to].velocity).dot(direction);
            let correction =
                direction * ((distance - preferred) * spring_strength + relative * SPRING_DAMPING);
            scratch.forces[from] -= correction;
            scratch.forces[to] += correction;
        }

        let max_speed = 12.0 + intensity * 14.0;
        let mut moved = false;
        for (body, force) in self.bodies.iter_mut().zip(&scratch.forces) {
            if let Some(pinned) = body.pinned {
                body.position = pinned;
                body.velocity = Vec2::ZERO;
                continue;
            }

            let force = *force - body.position * center_pull;
            let mut velocity =
                (body.velocity + force * (0.055 * self.alpha * time_step)) * damping.powf(time_step);
            let speed = velocity.length();
            if speed > max_speed {
                velocity *= max_speed / speed;
            }

            body.velocity = velocity;
            body.position += velocity * time_step;
            moved |= velocity.length_sq() > 0.000_001;
        }

        moved
    }
}
