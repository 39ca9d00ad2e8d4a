//! Frame driver: discover a device, then tick and dispatch at a fixed rate, logging every
//! change.
//!
//! `RUST_LOG=wheelpoll=debug cargo run --example poll -- --frames 600`

use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use wheelpoll::filtered_listener::FilteredListener;
use wheelpoll::logger::Logger;
use wheelpoll::{create_input_device, AdapterConfig, Device, EventFilter, InputEventBus};

#[derive(Parser, Debug)]
#[command(about = "Poll the preferred wheel/controller and log input changes")]
struct Args {
    /// TOML config file (defaults are used when omitted).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Frames per second.
    #[arg(long, default_value_t = 60)]
    rate_hz: u32,

    /// Stop after this many frames.
    #[arg(long)]
    frames: Option<u64>,

    /// Only log an axis once it moved this far (normalized units) since it was last logged.
    #[arg(long)]
    min_axis_delta: Option<f32>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => AdapterConfig::load(path)?,
        None => AdapterConfig::default(),
    };

    let mut bus = InputEventBus::new();
    match args.min_axis_delta {
        Some(delta) => bus.add_listener(
            FilteredListener::axis_threshold(delta, Logger::new()),
            EventFilter::All,
        ),
        None => bus.add_listener(Logger::new(), EventFilter::All),
    };

    let Some(mut device) = create_input_device(config, Box::new(bus)) else {
        return Err("HID backend unavailable".into());
    };
    if !device.is_ready() {
        warn!("no usable device; nothing to poll");
        return Ok(());
    }
    info!(device = ?Device::name(&device), "polling");

    let frame = Duration::from_secs_f64(1.0 / f64::from(args.rate_hz.max(1)));
    let mut frames = 0u64;
    loop {
        device.tick(frame.as_secs_f32());
        device.send_controller_events();
        frames += 1;
        if args.frames.is_some_and(|max| frames >= max) {
            break;
        }
        std::thread::sleep(frame);
    }
    Ok(())
}
