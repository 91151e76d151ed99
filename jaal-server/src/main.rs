//! Jaal server - pose estimation over TCP
//!
//! Loads an occupancy map (and optional priors), builds the configured
//! estimator and serves `init` / `update` / `estimate` requests as
//! newline-delimited JSON. Every connection drives the same estimator.

mod config;
mod error;
mod protocol;
mod session;

use std::net::TcpListener;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use clap::Parser;
use parking_lot::Mutex;

use crate::config::{Algorithm, ServerConfig};
use crate::error::{Result, ServerError};
use crate::session::{Session, SharedEstimator};
use jaal_pose::{Estimator, NbpEstimator, OccupancyMap, ParticleFilter, Priors};

/// Command-line arguments. Flags override the config file.
#[derive(Parser, Debug)]
#[command(name = "jaal-server", version, about = "Spider pose estimation over TCP")]
struct Args {
    /// Configuration file
    #[arg(short, long, default_value = "jaal.toml")]
    config: PathBuf,

    /// Bind address (e.g. 0.0.0.0:8080)
    #[arg(short, long)]
    bind: Option<String>,

    /// Occupancy map file
    #[arg(short, long)]
    map: Option<PathBuf>,

    /// Annotated priors JSON
    #[arg(short, long)]
    priors: Option<PathBuf>,

    /// Estimation strategy
    #[arg(short, long, value_enum)]
    algorithm: Option<Algorithm>,
}

fn apply_overrides(mut config: ServerConfig, args: &Args) -> ServerConfig {
    if let Some(bind) = &args.bind {
        config.server.bind_address = bind.clone();
    }
    if let Some(map) = &args.map {
        config.server.map_path = Some(map.clone());
    }
    if let Some(priors) = &args.priors {
        config.server.priors_path = Some(priors.clone());
    }
    if let Some(algorithm) = args.algorithm {
        config.server.algorithm = algorithm;
    }
    config
}

fn load_priors(config: &ServerConfig) -> Priors {
    let Some(path) = &config.server.priors_path else {
        return Priors::default();
    };
    match jaal_pose::io::load_priors(path) {
        Ok(priors) => priors,
        Err(e) => {
            log::warn!("Ignoring priors {}: {}", path.display(), e);
            Priors::default()
        }
    }
}

fn build_estimator(config: &ServerConfig) -> Box<dyn Estimator> {
    let map = Arc::new(match &config.server.map_path {
        Some(path) => OccupancyMap::load_or_empty(path),
        None => {
            log::warn!("No map configured, using empty map");
            OccupancyMap::empty()
        }
    });
    let priors = load_priors(config);
    let est = &config.estimator;

    match config.server.algorithm {
        Algorithm::Pf => Box::new(ParticleFilter::new(est.filter.clone(), map).with_priors(priors)),
        Algorithm::Nbp => {
            Box::new(NbpEstimator::new(est.nbp.clone(), est.potential, map).with_priors(priors))
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = apply_overrides(ServerConfig::load_or_default(&args.config)?, &args);

    let estimator: SharedEstimator = Arc::new(Mutex::new(build_estimator(&config)));
    log::info!("Serving estimator: {}", estimator.lock().name());

    let running = Arc::new(AtomicBool::new(true));
    let r = Arc::clone(&running);
    ctrlc::set_handler(move || {
        log::info!("Received shutdown signal");
        r.store(false, Ordering::Relaxed);
    })
    .map_err(|e| ServerError::Config(format!("Error setting Ctrl-C handler: {}", e)))?;

    let bind_addr = &config.server.bind_address;
    let listener = TcpListener::bind(bind_addr)?;
    listener.set_nonblocking(true)?;
    log::info!("Listening on {}. Press Ctrl-C to stop.", bind_addr);

    while running.load(Ordering::Relaxed) {
        match listener.accept() {
            Ok((stream, addr)) => {
                log::info!("Client connected: {}", addr);
                if let Err(e) = stream.set_nonblocking(false) {
                    log::error!("Failed to set socket to blocking mode: {}", e);
                    continue;
                }
                let session = Session::new(
                    Arc::clone(&estimator),
                    &config.server,
                    Arc::clone(&running),
                );
                let spawned = thread::Builder::new()
                    .name(format!("session-{}", addr))
                    .spawn(move || {
                        if let Err(e) = session.run(stream) {
                            log::error!("Session {} error: {}", addr, e);
                        }
                        log::info!("Client disconnected: {}", addr);
                    });
                if let Err(e) = spawned {
                    log::error!("Failed to spawn session thread: {}", e);
                }
            }
            Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                thread::sleep(Duration::from_millis(10));
            }
            Err(e) => log::error!("Accept error: {}", e),
        }
    }

    log::info!("Jaal server stopped");
    Ok(())
}
