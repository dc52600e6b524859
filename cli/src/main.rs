use cli::selftest;
use poumsdev::{DeviceRegistry, DriverConfig};
use std::path::Path;
use tracing::info;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => DriverConfig::from_path(path)?,
        None => DriverConfig::default(),
    };
    let device = config.device_path(0);
    let registry = DeviceRegistry::new(config)?;

    let report = selftest::run(&registry, &device, Path::new("copy.txt"))?;

    println!("{}", String::from_utf8_lossy(&report.after_append));
    eprintln!("{}", report.stats);
    println!("{}", String::from_utf8_lossy(&report.copied));

    registry.teardown();
    info!("selftest completed");
    Ok(())
}
