//! # Headless Streaming Demo
//!
//! Walks a viewer across a procedurally generated world, making random block
//! edits along the way, and logs streaming statistics.
//!
//! ## Usage
//!
//! ```bash
//! RUST_LOG=info cargo run --release -- [world.json]
//! ```

use std::{thread, time::Duration};

use cgmath::Point3;
use log::{error, info};
use voxel_streamer::{
    engine_state::{
        config::WorldConfig,
        voxels::block::{AIR, GLASS},
        EngineError, EngineState,
    },
    init_logger,
};

const WALK_STEPS: u32 = 240;
const STEP_LENGTH: f32 = 2.0;
const EDITS_PER_STEP: u32 = 4;

fn run(config: &WorldConfig) -> Result<(), EngineError> {
    let mut engine = EngineState::headless(config)?;
    let width = config.dimensions.width as f32;
    let mut viewer = Point3::new(width / 2.0, 80.0, width / 2.0);

    for step in 0..WALK_STEPS {
        viewer.x += STEP_LENGTH;
        viewer.z += STEP_LENGTH * 0.5;
        engine.tick(viewer)?;

        for _ in 0..EDITS_PER_STEP {
            let x = viewer.x as i32 + fastrand::i32(-16..16);
            let z = viewer.z as i32 + fastrand::i32(-16..16);
            let y = fastrand::i32(40..90);
            let block = if fastrand::bool() { GLASS } else { AIR };
            engine.place_or_remove_block(x, y, z, block);
        }

        if step % 30 == 0 {
            let (streamer, arenas) = engine.stats();
            info!(
                "step {step}: {} loaded, {} ready, {} compact, {} jobs, {} drawn, {} KiB in arenas ({} KiB leaked)",
                streamer.loaded,
                streamer.ready,
                streamer.compact,
                streamer.pending_jobs,
                engine.render_list().len(),
                arenas.analytics.allocated_memory / 1024,
                arenas.leaked_bytes / 1024
            );
        }
        thread::sleep(Duration::from_millis(16));
    }

    while !engine.streamer.is_settled() {
        engine.tick(viewer)?;
        thread::sleep(Duration::from_millis(16));
    }
    let (streamer, arenas) = engine.stats();
    info!(
        "Settled with {} chunks, {} arena writes, {} growths",
        streamer.loaded, arenas.analytics.times_written, arenas.analytics.times_grown
    );
    Ok(())
}

fn main() {
    init_logger();

    let config = match std::env::args().nth(1) {
        Some(path) => match WorldConfig::load(&path) {
            Ok(config) => config,
            Err(err) => {
                error!("Could not load {path}: {err}");
                std::process::exit(1);
            }
        },
        None => WorldConfig {
            render_distance: 6,
            ..Default::default()
        },
    };

    if let Err(err) = run(&config) {
        error!("Streaming failed: {err}");
        std::process::exit(1);
    }
}
