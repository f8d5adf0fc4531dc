use std::collections::VecDeque;
use std::time::{Duration, Instant};

const WINDOW: Duration = Duration::from_secs(1);

/// Playback counters plus a rolling one-second FPS window.
#[derive(Debug, Default)]
pub struct PlaybackStats {
    pub rendered: u64,
    pub dropped: u64,
    pub bytes: u64,
    pub fps: f64,
    last_frame_times: VecDeque<Instant>,
}

impl PlaybackStats {
    /// Call once per presented frame.
    pub fn tick_frame(&mut self, byte_count: usize) {
        self.tick_frame_at(Instant::now(), byte_count);
    }

    fn tick_frame_at(&mut self, now: Instant, byte_count: usize) {
        self.rendered += 1;
        self.bytes += byte_count as u64;
        self.last_frame_times.push_back(now);

        // Evict entries older than the window
        while self
            .last_frame_times
            .front()
            .map_or(false, |t| now.duration_since(*t) > WINDOW)
        {
            self.last_frame_times.pop_front();
        }
        self.fps = self.last_frame_times.len() as f64;
    }

    pub fn drop_frame(&mut self) {
        self.dropped += 1;
    }

    pub fn total(&self) -> u64 {
        self.rendered + self.dropped
    }
}

impl std::fmt::Display for PlaybackStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} rendered, {} dropped, {:.0} fps, {:.1} MiB",
            self.rendered,
            self.dropped,
            self.fps,
            self.bytes as f64 / (1024.0 * 1024.0)
        )
    }
}
