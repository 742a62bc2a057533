//! # Image Field Demo
//!
//! Samples an image into a grid of colored dots. Move the cursor over the
//! grid to push dots away; they spring back when it leaves. Press Enter or
//! Space to toggle the push without a mouse.
//!
//! Drop another image on the window to replace the grid.
//!
//! Run with: `cargo run --example portrait -- path/to/image.png [GRID_SIZE]`

use glyphdust::prelude::*;

fn main() -> Result<(), SimulationError> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let Some(path) = args.next() else {
        eprintln!("usage: portrait <image> [grid_size]");
        std::process::exit(2);
    };

    let mut config = Config::default();
    if let Some(grid_size) = args.next().and_then(|s| s.parse().ok()) {
        config.image.grid_size = grid_size;
    }

    Simulation::new().with_config(config).with_image(path).run()
}
