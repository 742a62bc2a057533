//! The image particle field.
//!
//! An uploaded image is sampled into a square grid of averaged colors (see
//! [`sampler`](crate::sampler)); every cell becomes a dot that springs back
//! to its rest position after the pointer pushes it away.
//!
//! Coordinates are percent (0-100) of the container, so the layout survives
//! resizes without any recomputation and nothing is clamped to the edges.
//!
//! Unlike the letter field, the pointer only pushes while it is actively
//! interacting (hovering in motion, pressing, or toggled from the keyboard),
//! presses push harder, and the spring is a plain linear one.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::config::ImageFieldConfig;
use crate::input::InputContext;

/// An averaged cell color.
///
/// Displays and serializes as the CSS-style string `rgb(r,g,b)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct CellColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl CellColor {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn to_array(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }
}

impl fmt::Display for CellColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgb({},{},{})", self.r, self.g, self.b)
    }
}

/// Returned when a string is not of the form `rgb(r,g,b)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseColorError(String);

impl fmt::Display for ParseColorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid color {:?}, expected rgb(r,g,b)", self.0)
    }
}

impl std::error::Error for ParseColorError {}

impl FromStr for CellColor {
    type Err = ParseColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseColorError(s.to_string());
        let inner = s
            .trim()
            .strip_prefix("rgb(")
            .and_then(|rest| rest.strip_suffix(')'))
            .ok_or_else(err)?;

        let mut channels = inner.split(',').map(|c| c.trim().parse::<u8>());
        let (Some(Ok(r)), Some(Ok(g)), Some(Ok(b)), None) =
            (channels.next(), channels.next(), channels.next(), channels.next())
        else {
            return Err(err());
        };
        Ok(Self { r, g, b })
    }
}

impl From<CellColor> for String {
    fn from(color: CellColor) -> Self {
        color.to_string()
    }
}

impl TryFrom<String> for CellColor {
    type Error = ParseColorError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// One grid cell of the sampled image.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageParticle {
    pub position: Vec2,
    pub velocity: Vec2,
    /// Rest position. Fixed for the particle's lifetime.
    origin: Vec2,
    color: CellColor,
}

impl ImageParticle {
    /// A particle at rest on its origin.
    pub fn at_rest(origin: Vec2, color: CellColor) -> Self {
        Self {
            position: origin,
            velocity: Vec2::ZERO,
            origin,
            color,
        }
    }

    pub fn new(position: Vec2, velocity: Vec2, origin: Vec2, color: CellColor) -> Self {
        Self {
            position,
            velocity,
            origin,
            color,
        }
    }

    #[inline]
    pub fn origin(&self) -> Vec2 {
        self.origin
    }

    #[inline]
    pub fn color(&self) -> CellColor {
        self.color
    }
}

/// Color-sampled dots for the most recently loaded image.
pub struct ImageField {
    config: ImageFieldConfig,
    grid_size: u32,
    particles: Vec<ImageParticle>,
    revision: u64,
}

impl ImageField {
    pub fn new(config: ImageFieldConfig) -> Self {
        Self {
            grid_size: config.grid_size,
            config,
            particles: Vec::new(),
            revision: 0,
        }
    }

    /// Replace every particle with a freshly sampled grid.
    pub fn load(&mut self, grid_size: u32, particles: Vec<ImageParticle>) {
        self.grid_size = grid_size;
        self.particles = particles;
        self.revision += 1;
    }

    /// Drop all particles, e.g. when a new upload starts.
    pub fn clear(&mut self) {
        if !self.particles.is_empty() {
            self.particles.clear();
            self.revision += 1;
        }
    }

    /// Whether a frame would be a no-op: the pointer is not interacting and
    /// every particle is below the rest velocity on both axes.
    pub fn is_idle(&self, ctx: &InputContext) -> bool {
        let rest = self.config.rest_velocity;
        !ctx.pointer.active
            && self
                .particles
                .iter()
                .all(|p| p.velocity.x.abs() <= rest && p.velocity.y.abs() <= rest)
    }

    /// Advance every particle by one frame.
    ///
    /// Returns `false` without touching anything when the field is idle.
    pub fn step(&mut self, ctx: &InputContext) -> bool {
        if self.particles.is_empty() || self.is_idle(ctx) {
            return false;
        }

        let cfg = &self.config;
        let pointer = ctx.pointer;
        let force_scale = if pointer.touch {
            cfg.mouse_force * cfg.touch_multiplier
        } else {
            cfg.mouse_force
        };

        for particle in &mut self.particles {
            let mut vel = particle.velocity;

            if pointer.active {
                let toward_pointer = pointer.position - particle.position;
                let distance = toward_pointer.length();
                if distance > 0.0 && distance < cfg.force_radius {
                    let force = (1.0 - distance / cfg.force_radius) * force_scale;
                    vel -= toward_pointer / distance * force;
                }
            }

            vel += (particle.origin - particle.position) * cfg.spring_strength;
            vel *= cfg.damping;

            particle.position += vel;
            particle.velocity = vel;
        }

        self.revision += 1;
        true
    }

    #[inline]
    pub fn particles(&self) -> &[ImageParticle] {
        &self.particles
    }

    /// Cells per side of the loaded grid.
    pub fn grid_size(&self) -> u32 {
        self.grid_size
    }

    pub fn config(&self) -> &ImageFieldConfig {
        &self.config
    }

    /// Bumped whenever the particle set or any particle's state changes.
    #[inline]
    pub fn revision(&self) -> u64 {
        self.revision
    }
}
