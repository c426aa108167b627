//! Headless fly-through - streams terrain along a straight-ish flight path
//! and reports what the chunk manager did.
//!
//! Usage: cargo run --release --bin fly_through -- [OPTIONS]
//!
//! Options:
//!   --config <PATH>       World config JSON (default: built-in defaults)
//!   --save-config <PATH>  Write the effective config to PATH and exit
//!   --ticks <N>           Ticks to simulate (default: 2000)
//!   --speed <UNITS>       Distance flown per tick (default: 25.0)
//!   --altitude <UNITS>    Viewpoint height (default: 500.0)
//!   --quota <N>           Override the per-tick build step quota
//!   --report <N>          Log stats every N ticks (default: 250)

use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Instant;

use terrastream::core::types::Vec3;

use terrastream::config::WorldConfig;
use terrastream::streaming::{ChunkId, ChunkManager, ChunkMesh, TerrainRenderer};

/// Tracks what would be on screen
#[derive(Default)]
struct CountingRenderer {
    uploads: usize,
    vertices: usize,
    visible: HashSet<ChunkId>,
}

impl TerrainRenderer for CountingRenderer {
    fn upload_chunk(&mut self, _id: ChunkId, mesh: &ChunkMesh<'_>) {
        self.uploads += 1;
        self.vertices += mesh.vertex_count();
    }

    fn set_visible(&mut self, id: ChunkId, visible: bool) {
        if visible {
            self.visible.insert(id);
        } else {
            self.visible.remove(&id);
        }
    }
}

fn main() {
    terrastream::core::logging::init();

    let args: Vec<String> = std::env::args().collect();
    let config_path = parse_str_arg(&args, "--config").map(PathBuf::from);
    let save_path = parse_str_arg(&args, "--save-config").map(PathBuf::from);
    let ticks = parse_u32_arg(&args, "--ticks").unwrap_or(2000);
    let speed = parse_f32_arg(&args, "--speed").unwrap_or(25.0);
    let altitude = parse_f32_arg(&args, "--altitude").unwrap_or(500.0);
    let quota = parse_usize_arg(&args, "--quota");
    let report_every = parse_u32_arg(&args, "--report").unwrap_or(250).max(1);

    let mut config = match &config_path {
        Some(path) => match WorldConfig::load(path) {
            Ok(config) => config,
            Err(e) => {
                log::error!("Failed to load {}: {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => WorldConfig::default(),
    };
    if let Some(quota) = quota {
        config.streaming.step_quota = quota;
    }

    if let Some(path) = save_path {
        match config.save(&path) {
            Ok(()) => println!("Wrote config to {}", path.display()),
            Err(e) => {
                log::error!("Failed to save {}: {}", path.display(), e);
                std::process::exit(1);
            }
        }
        return;
    }

    println!("=== Terrain Fly-Through ===");
    println!("Ticks:    {}", ticks);
    println!("Speed:    {} / tick", speed);
    println!("Strategy: {:?}", config.streaming.strategy);
    println!("Cell:     {} (resolution {})", config.streaming.min_cell_size, config.streaming.resolution);
    println!("Quota:    {} steps / tick", config.streaming.step_quota);
    println!();

    let mut manager = match ChunkManager::new(config) {
        Ok(manager) => manager,
        Err(e) => {
            log::error!("Failed to create chunk manager: {}", e);
            std::process::exit(1);
        }
    };
    let mut renderer = CountingRenderer::default();

    let start = Instant::now();
    let mut busy_ticks = 0u32;
    for tick in 0..ticks {
        let t = tick as f32;
        // Fly along +x, weaving gently in z
        let viewpoint = Vec3::new(t * speed, altitude, (t * 0.01).sin() * 2000.0);
        let report = manager.update(viewpoint, &mut renderer);

        if manager.is_busy() {
            busy_ticks += 1;
        }
        if let Some(diff) = report.diff.filter(|d| !d.is_unchanged()) {
            log::debug!(
                "tick {}: +{} -{} ={}",
                tick,
                diff.added.len(),
                diff.removed.len(),
                diff.kept.len()
            );
        }
        if (tick + 1) % report_every == 0 {
            let stats = manager.stats();
            log::info!(
                "tick {}: {} chunks, {} visible, {} builds, pool {} created / {} reused / {} free",
                tick + 1,
                stats.chunks,
                renderer.visible.len(),
                stats.builds,
                stats.pool_created,
                stats.pool_reused,
                stats.pool_free
            );
        }
    }
    let elapsed = start.elapsed();

    let stats = manager.stats();
    println!();
    println!("=== Summary ===");
    println!("Elapsed:         {:.2?} ({:.3} ms / tick)", elapsed, elapsed.as_secs_f64() * 1000.0 / ticks.max(1) as f64);
    println!("Reconciliations: {}", stats.reconciliations);
    println!("Busy ticks:      {}", busy_ticks);
    println!("Builds:          {} ({} steps)", stats.builds, stats.build_steps);
    println!("Swaps:           {}", stats.swaps);
    println!("Uploads:         {} ({} vertices)", renderer.uploads, renderer.vertices);
    println!("Chunks held:     {} ({} visible)", stats.chunks, renderer.visible.len());
    println!("Pool:            {} created, {} reused, {} free", stats.pool_created, stats.pool_reused, stats.pool_free);
}

fn parse_f32_arg(args: &[String], flag: &str) -> Option<f32> {
    args.iter().position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .and_then(|s| s.parse().ok())
}

fn parse_u32_arg(args: &[String], flag: &str) -> Option<u32> {
    args.iter().position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .and_then(|s| s.parse().ok())
}

fn parse_usize_arg(args: &[String], flag: &str) -> Option<usize> {
    args.iter().position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .and_then(|s| s.parse().ok())
}

fn parse_str_arg(args: &[String], flag: &str) -> Option<String> {
    args.iter().position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .cloned()
}
