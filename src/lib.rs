//! # glyphdust
//!
//! Interactive particle fields for a 2D canvas.
//!
//! Two fields share one pointer:
//!
//! - The **letter field** ([`TextField`]) turns every character of a word
//!   into a tile that springs toward its slot in a centered row, bounces off
//!   the container edges, and flees the pointer.
//! - The **image field** ([`ImageField`]) samples an uploaded image into a
//!   square grid of averaged colors. Each cell is a dot that the pointer
//!   pushes away and a spring pulls home.
//!
//! ## Quick Start
//!
//! ```ignore
//! use glyphdust::prelude::*;
//!
//! fn main() -> Result<(), SimulationError> {
//!     env_logger::init();
//!     Simulation::new()
//!         .with_word("HELLO WORLD")
//!         .run()
//! }
//! ```
//!
//! Press Enter to edit the word, Tab to switch fields, and drop an image file
//! on the window to load it into the image field.
//!
//! ## Headless use
//!
//! The fields have no window dependency. Drive them with an
//! [`InputContext`] once per frame:
//!
//! ```
//! use glyphdust::prelude::*;
//!
//! let mut field = TextField::new(TextFieldConfig::default(), Vec2::new(800.0, 600.0));
//! field.set_word("HI");
//! let ctx = InputContext::at(Vec2::new(-1000.0, -1000.0));
//! for _ in 0..10 {
//!     field.step(&ctx, false);
//! }
//! assert_eq!(field.particles().len(), 2);
//! ```
//!
//! ## Image sampling
//!
//! [`sample_grid`] is a pure function over an RGBA buffer;
//! [`SamplerWorker`] runs it on a background thread and drops answers from
//! superseded uploads.
//!
//! ## Logging
//!
//! The crate logs through the [`log`] facade. Install any logger
//! (`env_logger` in the demos) to see reseeds, loaded grids and surface
//! errors.

pub mod config;
pub mod error;
mod gpu;
pub mod image_field;
pub mod input;
pub mod layout;
pub mod render;
pub mod sampler;
mod simulation;
pub mod text_field;
pub mod time;
pub mod visibility;

pub use config::{Config, ImageFieldConfig, InputConfig, TextFieldConfig, WindowConfig};
pub use error::{ConfigError, GpuError, ImageLoadError, SimulationError};
pub use glam::Vec2;
pub use image_field::{CellColor, ImageField, ImageParticle};
pub use input::{InputContext, KeyCode, PointerSpace, PointerState, PointerTracker, PullGesture};
pub use layout::{Rect, WordLayout};
pub use sampler::{decode_image, load_image, sample_grid, CellRecord, GridRequest, SamplerWorker};
pub use simulation::{FieldMode, Simulation, WordInput};
pub use text_field::{TextField, TextParticle};
pub use time::{Debounce, FrameLoop};
pub use visibility::VisibilityGate;

/// Convenient re-exports for common usage.
///
/// ```
/// use glyphdust::prelude::*;
/// ```
pub mod prelude {
    pub use crate::config::{Config, ImageFieldConfig, InputConfig, TextFieldConfig};
    pub use crate::error::SimulationError;
    pub use crate::image_field::{CellColor, ImageField, ImageParticle};
    pub use crate::input::{InputContext, PointerState};
    pub use crate::sampler::{sample_grid, GridRequest, SamplerWorker};
    pub use crate::simulation::Simulation;
    pub use crate::text_field::TextField;
    pub use glam::Vec2;
}
