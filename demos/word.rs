//! # Letter Field Demo
//!
//! A word made of letter tiles that spring into a centered row and scatter
//! away from the cursor.
//!
//! - **Enter** starts editing the word, **Escape** stops
//! - **Arrow keys** nudge the repulsion point without a mouse
//! - **Tab** switches to the image field; drop an image file on the window
//! - On touch screens, pull down and release to scatter the letters again
//!
//! Run with: `cargo run --example word -- [WORD] [CONFIG.json]`

use glyphdust::prelude::*;

fn main() -> Result<(), SimulationError> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let word = args.next().unwrap_or_else(|| "HELLO WORLD".to_string());

    let config = match args.next() {
        Some(path) => Config::load(&path).unwrap_or_else(|e| {
            log::warn!("ignoring config {}: {}", path, e);
            Config::default()
        }),
        None => Config::default(),
    };

    Simulation::new().with_config(config).with_word(word).run()
}
