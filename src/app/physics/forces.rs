use eframe::egui::{Vec2, vec2};

use super::quadtree::Cell;

const BARNES_HUT_THETA: f32 = 0.75;

/// Deterministic direction for bodies sitting on the same spot.
fn tie_break(a: usize, b: usize) -> Vec2 {
    let angle = ((a as f32) * 0.618_034 + (b as f32) * 0.414_214) * std::f32::consts::TAU;
    vec2(angle.cos(), angle.sin())
}

fn direction_and_distance(delta: Vec2, a: usize, b: usize) -> (Vec2, f32) {
    let distance = delta.length();
    if distance > 0.0001 {
        (delta / distance, distance)
    } else {
        (tie_break(a, b), 0.0)
    }
}

pub(super) struct Repulsion {
    pub(super) strength: f32,
    pub(super) softening: f32,
}

impl Repulsion {
    pub(super) fn accumulate(&self, cell: &Cell, index: usize, positions: &[Vec2], force: &mut Vec2) {
        if cell.mass <= 0.0 {
            return;
        }

        let point = positions[index];
        if cell.is_leaf() {
            for &other in &cell.bodies {
                if other == index {
                    continue;
                }
                let delta = point - positions[other];
                let (direction, _) = direction_and_distance(delta, index, other);
                *force += direction * (self.strength / (delta.length_sq() + self.softening));
            }
            return;
        }

        let delta = point - cell.center_of_mass;
        let distance_sq = delta.length_sq().max(0.0001);
        let distance = distance_sq.sqrt();
        let far_enough = !cell.bounds.contains(point)
            && (cell.bounds.half * 2.0) / distance < BARNES_HUT_THETA
            && cell.mass > 1.0;

        if far_enough {
            *force += (delta / distance) * (self.strength * cell.mass / (distance_sq + self.softening));
            return;
        }

        for child in cell.children() {
            self.accumulate(child, index, positions, force);
        }
    }
}

pub(super) struct Collision<'a> {
    pub(super) positions: &'a [Vec2],
    pub(super) radii: &'a [f32],
    pub(super) strength: f32,
    pub(super) padding: f32,
    pub(super) reach_sq: f32,
}

impl Collision<'_> {
    fn push_apart(&self, from: usize, to: usize, forces: &mut [Vec2]) {
        let (direction, distance) =
            direction_and_distance(self.positions[from] - self.positions[to], from, to);
        let min_distance = self.radii[from] + self.radii[to] + self.padding;
        if distance < min_distance {
            let push = direction * ((min_distance - distance) * self.strength);
            forces[from] += push;
            forces[to] -= push;
        }
    }

    pub(super) fn accumulate(&self, a: &Cell, b: &Cell, same: bool, forces: &mut [Vec2]) {
        if a.bounds.gap_sq(b.bounds) > self.reach_sq {
            return;
        }

        match (a.is_leaf(), b.is_leaf()) {
            (true, true) if same => {
                for (offset, &from) in a.bodies.iter().enumerate() {
                    for &to in &a.bodies[offset + 1..] {
                        self.push_apart(from, to, forces);
                    }
                }
            }
            (true, true) => {
                for &from in &a.bodies {
                    for &to in &b.bodies {
                        self.push_apart(from, to, forces);
                    }
                }
            }
            _ if same => {
                let children = a.children().collect::<Vec<_>>();
                for (offset, first) in children.iter().enumerate() {
                    self.accumulate(first, first, true, forces);
                    for second in &children[offset + 1..] {
                        self.accumulate(first, second, false, forces);
                    }
                }
            }
            (a_leaf, b_leaf) => {
                let split_a = !a_leaf && (b_leaf || a.bounds.half >= b.bounds.half);
                if split_a {
                    for child in a.children() {
                        self.accumulate(child, b, false, forces);
                    }
                } else {
                    for child in b.children() {
                        self.accumulate(a, child, false, forces);
                    }
                }
            }
        }
    }
}
