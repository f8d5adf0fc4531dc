use anyhow::Result;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod app;
mod source;
mod stats;

fn main() -> Result<()> {
    // Logging
    // RUST_LOG=debug also reports every dropped frame and its reason
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .with_thread_ids(false)
        .init();

    info!("CCTV Viewer v{}", env!("CARGO_PKG_VERSION"));

    match app::run() {
        Ok(stats) => {
            info!("CCTV Viewer exited cleanly ({})", stats);
            Ok(())
        }
        Err(e) => {
            error!("Fatal error: {:#}", e);
            Err(e)
        }
    }
}
