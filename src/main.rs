//! DrishtiNav - simulated mapping and navigation run
//!
//! Walks a synthetic route once to record its landmarks, then walks it again
//! while the navigation loop localizes the walker, plans the route and speaks
//! directions through the log.

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{info, warn};

use drishti_nav::capabilities::{LogVoice, ObstacleSource};
use drishti_nav::config::DrishtiConfig;
use drishti_nav::error::Result;
use drishti_nav::guide::{Capabilities, Guide};
use drishti_nav::shared::Mode;
use drishti_nav::sim::{PackedDescriptorExtractor, SimulatedWalk};
use drishti_nav::store::{LandmarkStore, MemoryStore};

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(
                "drishti_nav=info"
                    .parse()
                    .map_err(|e| drishti_nav::DrishtiError::Config(format!("{}", e)))?,
            ),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();
    let config = if let Some(path) = args.get(1) {
        info!("Loading configuration from {}", path);
        DrishtiConfig::load(Path::new(path))?
    } else if Path::new("drishti.toml").exists() {
        info!("Loading configuration from drishti.toml");
        DrishtiConfig::load(Path::new("drishti.toml"))?
    } else {
        info!("Using default configuration");
        DrishtiConfig::default()
    };

    info!("DrishtiNav v{}", env!("CARGO_PKG_VERSION"));

    let store = match &config.store.path {
        Some(path) => MemoryStore::open(path)?,
        None => MemoryStore::new(),
    }
    .with_step_distance(config.navigation.step_distance);
    let store = Arc::new(store);

    let walk = Arc::new(SimulatedWalk::new(&config.simulation));
    let location = config.simulation.location.clone();
    info!(
        "Simulated route {}: {} landmarks, {} descriptors each",
        location,
        walk.landmarks(),
        config.simulation.descriptors_per_frame
    );

    let guide = Guide::new(
        config.clone(),
        Capabilities {
            store: store.clone(),
            camera: walk.clone(),
            extractor: Arc::new(PackedDescriptorExtractor),
            obstacles: Arc::new(ObstacleSource::unavailable(&config.obstacles)),
            voice: Arc::new(LogVoice),
        },
    );

    let check_interval = Duration::from_millis(500);
    let timeout = Duration::from_secs_f32(config.simulation.timeout_secs.max(0.0));

    // Mapping pass, skipped when the store already knows the route
    if store.list_locations()?.contains(&location) {
        info!("Location {} already mapped, skipping mapping", location);
    } else {
        guide.start_mapping(&location)?;
        let started = Instant::now();
        while !walk.is_finished() && started.elapsed() < timeout {
            std::thread::sleep(check_interval);
            info!(
                "Mapping: {} landmarks stored",
                guide.status().mapping_frames
            );
        }
        // Let the last capture land
        std::thread::sleep(config.mapping.capture_interval());
        let response = guide.stop_mapping()?;
        info!("{}", response.message());
    }

    // Navigation pass from the start of the route
    walk.reset();
    let response = guide.start_navigation(&location)?;
    info!("{}", response.message());

    let started = Instant::now();
    loop {
        std::thread::sleep(check_interval);

        let status = guide.status();
        if status.mode == Mode::Idle {
            info!("Trip finished: {}", status.navigation_instruction);
            break;
        }

        info!(
            "Position {:?}, step {}/{}, confidence {:.1} (smoothed {:.1}), {} obstacles",
            status.current_position,
            status.step_index,
            status.path_length,
            status.confidence,
            status.smoothed_confidence,
            status.obstacles.len()
        );

        if started.elapsed() >= timeout {
            warn!("Trip did not finish within {:?}, stopping", timeout);
            if let Err(e) = guide.stop_navigation() {
                warn!("Failed to stop navigation: {}", e);
            }
            break;
        }
    }

    guide.shutdown();
    info!("DrishtiNav finished");
    Ok(())
}
