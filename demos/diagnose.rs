//! List controller-class HID devices and show which one the adapter would pick.

use clap::Parser;
use std::path::PathBuf;
use wheelpoll::backends::hid::HidBackend;
use wheelpoll::AdapterConfig;

#[derive(Parser, Debug)]
#[command(about = "List candidate devices and the selection outcome")]
struct Args {
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print descriptors as JSON.
    #[arg(long)]
    json: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();
    let config = match &args.config {
        Some(path) => AdapterConfig::load(path)?,
        None => AdapterConfig::default(),
    };

    let backend = HidBackend::new(config.hid.clone())?;
    let devices = backend.descriptors();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&devices)?);
        return Ok(());
    }

    println!("{} candidate device(s), vendor token {:?}", devices.len(), config.vendor_token);
    for d in &devices {
        let mark = if d.matches_vendor(&config.vendor_token) { "*" } else { " " };
        println!("{mark} {d}");
    }

    let preferred = devices.iter().find(|d| d.matches_vendor(&config.vendor_token));
    match preferred.or_else(|| devices.first()) {
        Some(d) => println!("first choice: {}", d.product_name),
        None => println!("no candidates"),
    }
    Ok(())
}
