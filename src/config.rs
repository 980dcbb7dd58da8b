use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    pub intensity: f32,
    pub repulsion_scale: f32,
    pub spring_scale: f32,
    pub collision_scale: f32,
    pub velocity_damping: f32,
    pub alpha_min: f32,
    pub alpha_decay: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            intensity: 1.0,
            repulsion_scale: 1.4,
            spring_scale: 0.8,
            collision_scale: 1.0,
            velocity_damping: 0.88,
            alpha_min: 0.001,
            alpha_decay: 0.0228,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeConfig {
    /// Minimum horizontal pixels reserved per rendered node.
    pub per_node_px: f32,
    pub level_height: f32,
    pub min_width: f32,
    pub min_height: f32,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            per_node_px: 42.0,
            level_height: 120.0,
            min_width: 960.0,
            min_height: 560.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HighlightConfig {
    pub secondary_timeout_secs: f64,
    pub toast_secs: f64,
    /// Below this alpha the force simulation counts as settled.
    pub settled_alpha: f32,
    pub reheat_alpha: f32,
}

impl Default for HighlightConfig {
    fn default() -> Self {
        Self {
            secondary_timeout_secs: 1.5,
            toast_secs: 2.5,
            settled_alpha: 0.05,
            reheat_alpha: 0.1,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VizConfig {
    pub physics: PhysicsConfig,
    pub tree: TreeConfig,
    pub highlight: HighlightConfig,
}

impl VizConfig {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("invalid config JSON in {}", path.display()))
    }
}
