//! Quadsim - headless broad-phase simulation driver

mod svg;

use std::path::PathBuf;

use anyhow::Context;
use quadtree::{Bounds, Config, World};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::svg::SvgPainter;

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Quadsim v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("quadsim.toml"));
    let config = Config::load(&path).with_context(|| format!("loading {}", path.display()))?;
    info!("Loaded configuration");
    info!("  World: {}x{}", config.world.width, config.world.height);
    info!("  Node capacity: {}, min extent: {}", config.tree.capacity, config.tree.min_extent);
    info!("  Bodies: {}, steps: {}", config.sim.bodies, config.sim.steps);

    let mut world = World::from_config(&config)?;
    let mut rng = StdRng::seed_from_u64(config.sim.seed);
    world.spawn_random(&mut rng, config.sim.bodies, config.sim.min_radius, config.sim.max_radius);
    info!("Initial overlapping pairs: {}", world.overlapping_pairs_brute_force());

    let mut candidate_pairs = 0usize;
    for step in 0..config.sim.steps {
        let stats = world.step()?;
        candidate_pairs += stats.candidate_pairs;
        if step % 10 == 0 || step + 1 == config.sim.steps {
            info!(
                step,
                nodes = stats.nodes,
                leaves = stats.leaves,
                depth = stats.depth,
                pairs = stats.candidate_pairs,
                contacts = stats.contacts,
                "step"
            );
        }
    }

    let n = world.len();
    let all_pairs = n * n.saturating_sub(1) / 2;
    if config.sim.steps > 0 {
        info!(
            "Candidate pairs per step: {:.1} (all pairs: {})",
            candidate_pairs as f64 / f64::from(config.sim.steps),
            all_pairs
        );
    }
    info!("Remaining overlapping pairs: {}", world.overlapping_pairs_brute_force());

    let index = world.build_index()?;
    let center = world.border.center();
    let probe = Bounds::from_center(center.x, center.y, world.border.min_side() / 8.0);
    info!("Bodies near center: {}", index.query_range(&probe).len());

    if !config.sim.svg_output.is_empty() {
        let mut painter = SvgPainter::new(world.border);
        index.trace_debug(&mut painter, None);
        for body in world.bodies() {
            painter.draw_body(body);
        }
        std::fs::write(&config.sim.svg_output, painter.finish())
            .with_context(|| format!("writing {}", config.sim.svg_output))?;
        info!("Wrote tree trace to {}", config.sim.svg_output);
    }

    Ok(())
}
