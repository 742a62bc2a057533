//! Tunable constants for the particle fields.
//!
//! Every section defaults to the values the fields were designed around, so
//! a config file only needs to name what it changes:
//!
//! ```json
//! { "text": { "friction": 0.95 }, "image": { "grid_size": 32 } }
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::ConfigError;

/// Complete configuration for a [`Simulation`](crate::Simulation).
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub text: TextFieldConfig,
    pub image: ImageFieldConfig,
    pub input: InputConfig,
    pub window: WindowConfig,
}

impl Config {
    /// Save the configuration to a JSON file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Load a configuration from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path)?;
        let config = serde_json::from_str(&json)?;
        Ok(config)
    }
}

/// Layout and force constants for the letter field.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TextFieldConfig {
    /// Width of one letter slot in pixels.
    pub letter_width: f32,
    /// Horizontal gap between letter slots in pixels.
    pub letter_gap: f32,
    /// Pointer repulsion radius in pixels.
    pub mouse_radius: f32,
    /// Repulsion gain applied to `(mouse_radius - distance)`.
    pub repel_strength: f32,
    /// Base spring strength toward the slot target.
    pub center_force: f32,
    /// Distance at which the spring pulls twice as hard as `center_force`.
    pub pull_distance: f32,
    /// Below this distance to target the extra damping kicks in.
    pub damping_distance: f32,
    /// Extra velocity multiplier applied near the target.
    pub near_damping: f32,
    /// Velocity multiplier applied every frame.
    pub friction: f32,
    /// Width of the initial velocity interval, centered on zero.
    pub initial_velocity_range: f32,
    /// Longest word the field accepts; extra characters are dropped.
    pub max_word_len: usize,
    /// Fixed RNG seed for reproducible initial velocities.
    pub seed: Option<u64>,
}

impl Default for TextFieldConfig {
    fn default() -> Self {
        Self {
            letter_width: 40.0,
            letter_gap: 4.0,
            mouse_radius: 40.0,
            repel_strength: 0.1,
            center_force: 0.03,
            pull_distance: 100.0,
            damping_distance: 5.0,
            near_damping: 0.8,
            friction: 0.97,
            initial_velocity_range: 4.0,
            max_word_len: 20,
            seed: None,
        }
    }
}

/// Sampling and force constants for the image field.
///
/// Distances are in percent of the container, not pixels.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ImageFieldConfig {
    /// Cells per side of the sampled grid.
    pub grid_size: u32,
    /// Pointer repulsion radius.
    pub force_radius: f32,
    /// Peak repulsion at the pointer.
    pub mouse_force: f32,
    /// Multiplier on `mouse_force` while a touch/press is active.
    pub touch_multiplier: f32,
    /// Spring gain toward the rest position.
    pub spring_strength: f32,
    /// Velocity multiplier applied every frame.
    pub damping: f32,
    /// Per-axis speed under which a particle counts as settled.
    pub rest_velocity: f32,
}

impl Default for ImageFieldConfig {
    fn default() -> Self {
        Self {
            grid_size: 50,
            force_radius: 100.0,
            mouse_force: 2.0,
            touch_multiplier: 1.5,
            spring_strength: 0.1,
            damping: 0.8,
            rest_velocity: 0.01,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct InputConfig {
    /// Pointer nudge per arrow key press, in pixels.
    pub keyboard_step: f32,
    /// Quiet period before a window resize rewrites letter targets.
    pub resize_debounce_ms: u64,
    /// Downward drag, in pixels, that triggers a reseed on release.
    pub pull_threshold: f32,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            keyboard_step: 20.0,
            resize_debounce_ms: 100,
            pull_threshold: 100.0,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    /// Clear color behind the particles.
    pub background: [u8; 3],
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "glyphdust".into(),
            width: 1280,
            height: 720,
            background: [17, 24, 39],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: Config =
            serde_json::from_str(r#"{ "text": { "friction": 0.5 }, "image": { "grid_size": 10 } }"#)
                .unwrap();
        assert_eq!(config.text.friction, 0.5);
        assert_eq!(config.text.letter_width, 40.0);
        assert_eq!(config.image.grid_size, 10);
        assert_eq!(config.image.damping, 0.8);
        assert_eq!(config.input, InputConfig::default());
    }

    #[test]
    fn test_save_then_load() {
        let path = std::env::temp_dir().join(format!("glyphdust-config-{}.json", std::process::id()));
        let mut config = Config::default();
        config.text.seed = Some(7);
        config.window.title = "portfolio".into();
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        let _ = std::fs::remove_file(&path);
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = Config::load("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
