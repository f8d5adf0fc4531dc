use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use cctv_core::DisplayConfig;
use cctv_renderer::{Backend, Surface};
use tracing::{debug, info, warn};

use crate::source::FrameSource;
use crate::stats::PlaybackStats;

/// Environment variable naming the frame source when no argument is given.
pub const SOURCE_ENV: &str = "CCTV_SOURCE";

const REPORT_INTERVAL: Duration = Duration::from_secs(5);

/// Main viewer entry.
///
/// # Flow
/// 1. Load `DisplayConfig` (`CCTV_CONFIG` file + `CCTV_FORMAT`/`CCTV_WIDTH`/`CCTV_HEIGHT`)
/// 2. Open the frame source (first argument or `CCTV_SOURCE`)
/// 3. Create the display surface
/// 4. Poll close → next frame → render, paced to `target_fps`
/// 5. Destroy the surface
pub fn run() -> Result<PlaybackStats> {
    let config = DisplayConfig::from_env().context("loading display config")?;

    let path = std::env::args_os()
        .nth(1)
        .or_else(|| std::env::var_os(SOURCE_ENV))
        .map(PathBuf::from)
        .with_context(|| format!("no frame source: pass a file path or set {SOURCE_ENV}"))?;
    let mut source = FrameSource::open(&path, &config)
        .with_context(|| format!("opening frame source {}", path.display()))?;

    #[cfg(feature = "window")]
    let backend = cctv_renderer::WindowBackend::new();
    #[cfg(not(feature = "window"))]
    let backend = {
        warn!("Built without the `window` feature — rendering offscreen");
        cctv_renderer::HeadlessBackend::new()
    };

    play(backend, &config, &mut source)
}

/// Plays `source` onto a new surface until it runs dry or a close is requested.
pub fn play<B: Backend>(
    backend: B,
    config: &DisplayConfig,
    source: &mut FrameSource,
) -> Result<PlaybackStats> {
    let mut surface =
        Surface::from_config(backend, config).context("creating display surface")?;
    let interval = config.frame_interval();
    let mut stats = PlaybackStats::default();
    let mut last_report = Instant::now();

    loop {
        if surface.close_requested() {
            info!("Close requested — stopping playback");
            break;
        }

        let started = Instant::now();
        let frame = match source.next_frame().context("reading frame")? {
            Some(frame) => frame,
            // Rewinding an empty source would spin forever.
            None if config.loop_playback && source.since_rewind() > 0 => {
                source.rewind().context("rewinding frame source")?;
                continue;
            }
            None => {
                info!("End of frame source");
                break;
            }
        };

        if surface.render(&frame.as_frame()) {
            stats.tick_frame(frame.bytes_used);
        } else {
            stats.drop_frame();
            warn!(
                "Dropped frame #{} at {:.3}s ({} bytes)",
                frame.sequence,
                frame.timestamp_us as f64 / 1_000_000.0,
                frame.bytes_used
            );
        }

        if last_report.elapsed() >= REPORT_INTERVAL {
            info!("Playback: {}", stats);
            last_report = Instant::now();
        }

        if let Some(remaining) = interval.checked_sub(started.elapsed()) {
            std::thread::sleep(remaining);
        }
    }

    surface.destroy();
    debug!("Surface released after {} frame(s)", stats.total());
    Ok(stats)
}
