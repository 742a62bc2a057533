//! The letter particle field.
//!
//! Each character of the current word (spaces included) is one particle with
//! a spring target in a centered row of letter slots. Every frame a particle
//! goes through the same fixed sequence:
//!
//! 1. While the input has focus, the frame's target y is the container's
//!    vertical center. The stored target is left alone.
//! 2. Integrate: `p += v`.
//! 3. Reflect off the container edges: clamp the position and point the
//!    velocity back inside.
//! 4. Pointer repulsion inside `mouse_radius`, proportional to how deep the
//!    pointer is inside the radius.
//! 5. Spring toward the target, scaled up with distance
//!    (`center_force * (1 + d / pull_distance)`).
//! 6. Extra damping within `damping_distance` of the target.
//! 7. Friction.
//!
//! Positions and velocities are in container pixels.

use glam::Vec2;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::config::TextFieldConfig;
use crate::input::InputContext;
use crate::layout::WordLayout;

/// One letter of the word.
#[derive(Debug, Clone, PartialEq)]
pub struct TextParticle {
    pub position: Vec2,
    pub velocity: Vec2,
    /// Rest slot for this letter.
    pub target: Vec2,
    letter: char,
}

impl TextParticle {
    pub fn new(letter: char, position: Vec2, velocity: Vec2, target: Vec2) -> Self {
        Self {
            position,
            velocity,
            target,
            letter,
        }
    }

    /// The character this particle displays. Fixed for its lifetime.
    #[inline]
    pub fn letter(&self) -> char {
        self.letter
    }
}

/// Letter particles for the current word.
pub struct TextField {
    config: TextFieldConfig,
    layout: WordLayout,
    /// Live container size, used for edge reflection and the focus override.
    container: Vec2,
    word: String,
    particles: Vec<TextParticle>,
    rng: SmallRng,
    revision: u64,
}

impl TextField {
    pub fn new(config: TextFieldConfig, container: Vec2) -> Self {
        let rng = match config.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        };
        Self {
            layout: WordLayout::from(&config),
            config,
            container,
            word: String::new(),
            particles: Vec::new(),
            rng,
            revision: 0,
        }
    }

    /// Replace the word, creating a fresh particle per character.
    ///
    /// All particles start at the container center with a random velocity;
    /// nothing carries over from the previous word. Characters beyond
    /// `max_word_len` are dropped.
    pub fn set_word(&mut self, word: &str) {
        self.word = word.chars().take(self.config.max_word_len).collect();
        self.reseed();
    }

    /// Rebuild the particles for the current word from scratch.
    pub fn reseed(&mut self) {
        let len = self.word.chars().count();
        let center = self.container / 2.0;
        let half_range = self.config.initial_velocity_range / 2.0;

        let mut particles = Vec::with_capacity(len);
        for (index, letter) in self.word.chars().enumerate() {
            let velocity = if half_range > 0.0 {
                Vec2::new(
                    self.rng.gen_range(-half_range..half_range),
                    self.rng.gen_range(-half_range..half_range),
                )
            } else {
                Vec2::ZERO
            };
            let target = self.layout.slot(index, len, self.container);
            particles.push(TextParticle::new(letter, center, velocity, target));
        }

        log::info!("text field seeded with {:?} ({} particles)", self.word, len);
        self.particles = particles;
        self.revision += 1;
    }

    /// Track the container's live size without moving any targets.
    ///
    /// Hosts call this on every resize event and [`relayout`](Self::relayout)
    /// once the resize has settled.
    pub fn set_container(&mut self, container: Vec2) {
        self.container = container;
    }

    /// Rewrite every target for the current container size.
    ///
    /// Positions and velocities are kept, so letters glide to their new
    /// slots instead of jumping.
    pub fn relayout(&mut self) {
        let len = self.particles.len();
        for (index, particle) in self.particles.iter_mut().enumerate() {
            particle.target = self.layout.slot(index, len, self.container);
        }
        self.revision += 1;
    }

    /// [`set_container`](Self::set_container) followed by [`relayout`](Self::relayout).
    pub fn resize(&mut self, container: Vec2) {
        self.set_container(container);
        self.relayout();
    }

    /// Advance every particle by one frame.
    ///
    /// Returns `true` if any position or velocity changed. An unchanged frame
    /// leaves [`revision`](Self::revision) alone so renderers can skip it.
    pub fn step(&mut self, ctx: &InputContext, focused: bool) -> bool {
        let cfg = &self.config;
        let bounds = self.container;
        let pointer = ctx.pointer.position;
        let mut changed = false;

        for particle in &mut self.particles {
            let mut pos = particle.position;
            let mut vel = particle.velocity;
            let mut target = particle.target;

            if focused {
                target.y = bounds.y / 2.0;
            }

            pos += vel;

            if pos.x <= 0.0 {
                pos.x = 0.0;
                vel.x = vel.x.abs();
            } else if pos.x >= bounds.x {
                pos.x = bounds.x;
                vel.x = -vel.x.abs();
            }
            if pos.y <= 0.0 {
                pos.y = 0.0;
                vel.y = vel.y.abs();
            } else if pos.y >= bounds.y {
                pos.y = bounds.y;
                vel.y = -vel.y.abs();
            }

            let away = pos - pointer;
            let distance = away.length();
            if distance < cfg.mouse_radius {
                let angle = away.y.atan2(away.x);
                let force = (cfg.mouse_radius - distance) * cfg.repel_strength;
                vel += Vec2::new(angle.cos(), angle.sin()) * force;
            }

            let to_target = target - pos;
            let target_distance = to_target.length();
            if target_distance != 0.0 {
                let scaled = cfg.center_force * (1.0 + target_distance / cfg.pull_distance);
                vel += to_target / target_distance * scaled;
            }

            if target_distance < cfg.damping_distance {
                vel *= cfg.near_damping;
            }

            vel *= cfg.friction;

            if pos != particle.position || vel != particle.velocity {
                changed = true;
            }
            particle.position = pos;
            particle.velocity = vel;
        }

        if changed {
            self.revision += 1;
        }
        changed
    }

    #[inline]
    pub fn particles(&self) -> &[TextParticle] {
        &self.particles
    }

    pub fn word(&self) -> &str {
        &self.word
    }

    pub fn container(&self) -> Vec2 {
        self.container
    }

    pub fn config(&self) -> &TextFieldConfig {
        &self.config
    }

    /// Bumped whenever the particle set or any particle's state changes.
    #[inline]
    pub fn revision(&self) -> u64 {
        self.revision
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(word: &str) -> TextField {
        let config = TextFieldConfig {
            seed: Some(42),
            ..Default::default()
        };
        let mut field = TextField::new(config, Vec2::new(1000.0, 1000.0));
        field.set_word(word);
        field
    }

    fn far_pointer() -> InputContext {
        InputContext::at(Vec2::new(-10_000.0, -10_000.0))
    }

    #[test]
    fn test_particles_start_at_center() {
        let field = field("HELLO");
        assert_eq!(field.particles().len(), 5);
        for p in field.particles() {
            assert_eq!(p.position, Vec2::new(500.0, 500.0));
            assert!(p.velocity.x.abs() <= 2.0 && p.velocity.y.abs() <= 2.0);
        }
    }

    #[test]
    fn test_word_is_truncated() {
        let field = field("ABCDEFGHIJKLMNOPQRSTUVWXYZ");
        assert_eq!(field.particles().len(), 20);
        assert_eq!(field.word(), "ABCDEFGHIJKLMNOPQRST");
    }

    #[test]
    fn test_empty_word_steps_without_change() {
        let mut field = field("");
        let rev = field.revision();
        assert!(!field.step(&far_pointer(), false));
        assert_eq!(field.revision(), rev);
    }

    #[test]
    fn test_left_wall_reflects() {
        let mut field = field("A");
        field.particles[0].position = Vec2::new(1.0, 500.0);
        field.particles[0].velocity = Vec2::new(-5.0, 0.0);
        field.step(&far_pointer(), false);

        let p = &field.particles()[0];
        assert_eq!(p.position.x, 0.0);
        assert!(p.velocity.x > 0.0);
    }

    #[test]
    fn test_bottom_wall_reflects() {
        let mut field = field("A");
        field.particles[0].position = Vec2::new(500.0, 998.0);
        field.particles[0].velocity = Vec2::new(0.0, 10.0);
        field.step(&far_pointer(), false);

        let p = &field.particles()[0];
        assert_eq!(p.position.y, 1000.0);
        assert!(p.velocity.y < 0.0);
    }

    #[test]
    fn test_particle_on_target_stays_finite() {
        let mut field = field("A");
        let target = field.particles[0].target;
        field.particles[0].position = target;
        field.particles[0].velocity = Vec2::ZERO;

        assert!(!field.step(&far_pointer(), false));
        let p = &field.particles()[0];
        assert!(p.position.is_finite());
        assert!(p.velocity.is_finite());
        assert_eq!(p.position, target);
    }

    #[test]
    fn test_pointer_repels() {
        let mut field = field("A");
        let target = field.particles[0].target;
        field.particles[0].position = target;
        field.particles[0].velocity = Vec2::ZERO;

        let pointer = target - Vec2::new(10.0, 0.0);
        field.step(&InputContext::at(pointer), false);

        let v = field.particles()[0].velocity;
        assert!(v.x > 0.0);
        assert!(v.y.abs() < 1e-5);
    }

    #[test]
    fn test_far_particles_pull_harder() {
        let mut field = field("AB");
        let targets: Vec<Vec2> = field.particles().iter().map(|p| p.target).collect();
        field.particles[0].position = targets[0] + Vec2::new(0.0, 20.0);
        field.particles[1].position = targets[1] + Vec2::new(0.0, 300.0);
        for p in &mut field.particles {
            p.velocity = Vec2::ZERO;
        }

        field.step(&far_pointer(), false);
        let near = field.particles()[0].velocity.length();
        let far = field.particles()[1].velocity.length();
        assert!(far > near);
    }

    #[test]
    fn test_relayout_keeps_motion() {
        let mut field = field("TEST");
        field.step(&far_pointer(), false);
        let before = field.particles().to_vec();

        field.resize(Vec2::new(600.0, 400.0));
        for (old, new) in before.iter().zip(field.particles()) {
            assert_eq!(old.position, new.position);
            assert_eq!(old.velocity, new.velocity);
            assert_eq!(new.target.y, 200.0);
        }
        assert!((field.particles()[0].target.x - (600.0 - 172.0) / 2.0).abs() < 1e-4);
    }
}
