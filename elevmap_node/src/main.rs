//! Elevation mapping node: a thin runnable binary that loads a TOML
//! config, builds a `MapEngine`, and runs an integrate/propagate/fuse
//! loop against an in-process channel-based `PointCloudSource`.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use nalgebra::{DMatrix, Vector2};
use rand::Rng;
use tracing::{debug, info};
use tracing_subscriber::FmtSubscriber;

use elevmap_core::{MapEngine, PointSample};
use elevmap_env::{point_cloud_channel, ConfigSource, PointCloudSource, TomlFileConfig};

#[derive(Parser, Debug)]
#[command(name = "elevmap-node", about = "Run the elevation mapping engine against a live config")]
struct Args {
    /// Path to the TOML config file (grid geometry + EngineParams).
    #[arg(long, default_value = "elevmap.toml")]
    config: PathBuf,

    /// How often to run a full fusion, in scan cycles.
    #[arg(long, default_value_t = 5)]
    fuse_every: u32,

    /// Run a fixed number of synthetic scans then exit, instead of running
    /// until a shutdown signal.
    #[arg(long)]
    demo: bool,

    /// Number of scans to run before exiting, when `--demo` is set.
    #[arg(long, default_value_t = 50)]
    demo_scans: u32,
}

#[tokio::main]
async fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("failed to set tracing subscriber");

    let args = Args::parse();
    let config = TomlFileConfig::new(&args.config)
        .load()
        .with_context(|| format!("loading config from {}", args.config.display()))?;

    let engine = Arc::new(MapEngine::new(
        config.grid_size(),
        config.resolution,
        Vector2::new(config.center_x, config.center_y),
    ));
    engine.set_parameters(config.params());
    info!(grid = ?config.grid_size(), resolution = config.resolution, "engine initialized");

    let (sender, source) = point_cloud_channel(8);

    // In production this task is replaced by a bridge to the real sensor
    // transport; here it feeds a trivial synthetic cloud so the node is
    // runnable standalone. See `elevmap_sim` for a full deterministic
    // generator.
    let demo = args.demo;
    let demo_scans = args.demo_scans;
    tokio::spawn(async move {
        let mut rng = rand::thread_rng();
        let mut scans_sent: u32 = 0;
        loop {
            if demo && scans_sent >= demo_scans {
                break;
            }
            let t = std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_nanos() as u64;
            let points: Vec<PointSample> = (0..20)
                .map(|_| PointSample {
                    x: rng.gen_range(-1.0..1.0),
                    y: rng.gen_range(-1.0..1.0),
                    z: rng.gen_range(-0.1..0.1),
                    rgb: 0x808080,
                })
                .collect();
            let variances = vec![0.01f32; points.len()];
            if sender
                .send(elevmap_env::PointCloudBatch { points, variances, timestamp_ns: t })
                .await
                .is_err()
            {
                break;
            }
            scans_sent += 1;
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        // Dropping `sender` here closes the channel; in demo mode this is
        // how the main loop learns there is no more work and exits.
    });

    let grid_size = config.grid_size();
    let mut cycle: u32 = 0;
    loop {
        tokio::select! {
            batch = source.next_batch() => {
                let batch = match batch {
                    Ok(b) => b,
                    Err(_) => {
                        info!("point cloud source closed, shutting down");
                        break;
                    }
                };
                let report = engine
                    .integrate(&batch.points, &batch.variances, batch.timestamp_ns)
                    .expect("channel source always emits parallel points/variances");
                debug!(?report, "integrated scan");

                let zero = DMatrix::from_element(grid_size.0, grid_size.1, 0.0f32);
                engine
                    .propagate(&zero, &zero, &zero, batch.timestamp_ns)
                    .expect("zero deltas always match grid shape");

                cycle += 1;
                if cycle % args.fuse_every == 0 {
                    let report = engine.fuse_all();
                    debug!(?report, "fused map");
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("shutdown requested");
                break;
            }
        }
    }

    Ok(())
}
