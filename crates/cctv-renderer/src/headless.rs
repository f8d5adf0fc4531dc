//! Offscreen backend.
//!
//! Behaves like a native display library as far as the surface can tell
//! (handles, device limits, close requests) but keeps its framebuffer in
//! memory. A [`HeadlessProbe`] cloned from the backend stays valid after the
//! backend has moved into a surface and exposes what was presented and how
//! many handles are alive.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use cctv_core::DecoderError;
use cctv_decoder::JpegDecoder;
use tracing::debug;

use crate::backend::{Backend, BackendError, TextureAccess, TextureFormat};
use crate::texture::SoftTexture;

/// Largest window or texture side accepted, like a GPU's max texture size.
pub const MAX_DIMENSION: u32 = 16_384;

/// Step at which the next acquisition is forced to fail (once).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailPoint {
    VideoInit,
    Decoder,
    Window,
    Canvas,
    Texture,
}

// ── Shared state ──────────────────────────────────────────────────────────────

#[derive(Default)]
struct HeadlessState {
    video_initialized: bool,
    video_inits: u32,
    video_quits: u32,
    decoder_inits: u32,
    live_windows: usize,
    live_canvases: usize,
    live_textures: usize,
    textures_created: u64,
    presents: u64,
    quit_pending: bool,
    fail_at: Option<FailPoint>,
    window_title: Option<String>,
    framebuffer: Vec<u32>,
    framebuffer_size: (u32, u32),
}

impl HeadlessState {
    fn check(&mut self, point: FailPoint) -> Result<(), BackendError> {
        if self.fail_at == Some(point) {
            self.fail_at = None;
            return Err(BackendError::new(format!("injected failure at {point:?}")));
        }
        Ok(())
    }
}

type SharedState = Arc<Mutex<HeadlessState>>;

fn lock(state: &SharedState) -> MutexGuard<'_, HeadlessState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

fn check_dimensions(what: &str, width: u32, height: u32) -> Result<(), BackendError> {
    if width == 0 || height == 0 || width > MAX_DIMENSION || height > MAX_DIMENSION {
        return Err(BackendError::new(format!(
            "{what} {width}x{height} outside 1..={MAX_DIMENSION}"
        )));
    }
    Ok(())
}

// ── Handles ───────────────────────────────────────────────────────────────────

pub struct HeadlessWindow {
    width: u32,
    height: u32,
}

pub struct HeadlessCanvas {
    width: u32,
    height: u32,
    pixels: Vec<u32>,
}

// ── HeadlessBackend ───────────────────────────────────────────────────────────

pub struct HeadlessBackend {
    state: SharedState,
}

impl HeadlessBackend {
    pub fn new() -> Self {
        Self { state: Arc::new(Mutex::new(HeadlessState::default())) }
    }

    pub fn probe(&self) -> HeadlessProbe {
        HeadlessProbe { state: Arc::clone(&self.state) }
    }
}

impl Default for HeadlessBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl Backend for HeadlessBackend {
    type Window = HeadlessWindow;
    type Canvas = HeadlessCanvas;
    type Texture = SoftTexture;

    fn init_video(&mut self) -> Result<(), BackendError> {
        let mut s = lock(&self.state);
        s.check(FailPoint::VideoInit)?;
        s.video_initialized = true;
        s.video_inits += 1;
        Ok(())
    }

    fn quit_video(&mut self) {
        let mut s = lock(&self.state);
        s.video_initialized = false;
        s.video_quits += 1;
    }

    fn init_decoder(&mut self) -> Result<JpegDecoder, DecoderError> {
        let mut s = lock(&self.state);
        if s.check(FailPoint::Decoder).is_err() {
            return Err(DecoderError::CodecUnavailable { codec: "jpeg" });
        }
        let decoder = JpegDecoder::new()?;
        s.decoder_inits += 1;
        Ok(decoder)
    }

    fn create_window(
        &mut self,
        title: &str,
        width: i32,
        height: i32,
    ) -> Result<HeadlessWindow, BackendError> {
        let mut s = lock(&self.state);
        if !s.video_initialized {
            return Err(BackendError::new("video subsystem not initialized"));
        }
        s.check(FailPoint::Window)?;
        let (width, height) = match (u32::try_from(width), u32::try_from(height)) {
            (Ok(w), Ok(h)) => (w, h),
            _ => return Err(BackendError::new(format!("negative window size {width}x{height}"))),
        };
        check_dimensions("window", width, height)?;

        s.live_windows += 1;
        s.window_title = Some(title.to_owned());
        debug!("Headless window '{}' {}x{}", title, width, height);
        Ok(HeadlessWindow { width, height })
    }

    fn destroy_window(&mut self, _window: HeadlessWindow) {
        lock(&self.state).live_windows -= 1;
    }

    fn create_canvas(&mut self, window: &HeadlessWindow) -> Result<HeadlessCanvas, BackendError> {
        let mut s = lock(&self.state);
        s.check(FailPoint::Canvas)?;
        s.live_canvases += 1;
        Ok(HeadlessCanvas {
            width: window.width,
            height: window.height,
            pixels: vec![0; window.width as usize * window.height as usize],
        })
    }

    fn destroy_canvas(&mut self, _canvas: HeadlessCanvas) {
        lock(&self.state).live_canvases -= 1;
    }

    fn create_texture(
        &mut self,
        _canvas: &HeadlessCanvas,
        format: TextureFormat,
        access: TextureAccess,
        width: u32,
        height: u32,
    ) -> Result<SoftTexture, BackendError> {
        let mut s = lock(&self.state);
        s.check(FailPoint::Texture)?;
        check_dimensions("texture", width, height)?;
        s.live_textures += 1;
        s.textures_created += 1;
        debug!("Headless {:?} texture {:?} {}x{}", access, format, width, height);
        Ok(SoftTexture::new(format, width, height))
    }

    fn update_texture(
        &mut self,
        texture: &mut SoftTexture,
        pixels: &[u8],
        pitch: usize,
    ) -> Result<(), BackendError> {
        texture
            .update(pixels, pitch)
            .map_err(|e| BackendError::new(e.to_string()))
    }

    fn destroy_texture(&mut self, _texture: SoftTexture) {
        lock(&self.state).live_textures -= 1;
    }

    fn present(&mut self, canvas: &mut HeadlessCanvas, texture: &SoftTexture) {
        canvas.pixels.fill(0);
        texture.blit(&mut canvas.pixels, canvas.width, canvas.height);

        let mut s = lock(&self.state);
        s.presents += 1;
        s.framebuffer.clone_from(&canvas.pixels);
        s.framebuffer_size = (canvas.width, canvas.height);
    }

    fn poll_quit(&mut self) -> bool {
        std::mem::take(&mut lock(&self.state).quit_pending)
    }
}

// ── HeadlessProbe ─────────────────────────────────────────────────────────────

/// Inspection and control handle for a [`HeadlessBackend`].
#[derive(Clone)]
pub struct HeadlessProbe {
    state: SharedState,
}

impl HeadlessProbe {
    /// Simulates the user closing the window.
    pub fn post_quit(&self) {
        lock(&self.state).quit_pending = true;
    }

    /// Makes the next acquisition at `point` fail.
    pub fn fail_next(&self, point: FailPoint) {
        lock(&self.state).fail_at = Some(point);
    }

    pub fn video_initialized(&self) -> bool {
        lock(&self.state).video_initialized
    }

    pub fn video_inits(&self) -> u32 {
        lock(&self.state).video_inits
    }

    pub fn video_quits(&self) -> u32 {
        lock(&self.state).video_quits
    }

    pub fn decoder_inits(&self) -> u32 {
        lock(&self.state).decoder_inits
    }

    pub fn live_windows(&self) -> usize {
        lock(&self.state).live_windows
    }

    pub fn live_canvases(&self) -> usize {
        lock(&self.state).live_canvases
    }

    pub fn live_textures(&self) -> usize {
        lock(&self.state).live_textures
    }

    pub fn textures_created(&self) -> u64 {
        lock(&self.state).textures_created
    }

    pub fn presents(&self) -> u64 {
        lock(&self.state).presents
    }

    pub fn window_title(&self) -> Option<String> {
        lock(&self.state).window_title.clone()
    }

    /// Copy of the last presented frame.
    pub fn framebuffer(&self) -> Vec<u32> {
        lock(&self.state).framebuffer.clone()
    }

    pub fn framebuffer_size(&self) -> (u32, u32) {
        lock(&self.state).framebuffer_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_requires_video() {
        let mut backend = HeadlessBackend::new();
        assert!(backend.create_window("t", 4, 4).is_err());
        backend.init_video().unwrap();
        let window = backend.create_window("t", 4, 4).unwrap();
        assert_eq!(backend.probe().live_windows(), 1);
        backend.destroy_window(window);
        assert_eq!(backend.probe().live_windows(), 0);
    }

    #[test]
    fn rejects_negative_and_oversized_windows() {
        let mut backend = HeadlessBackend::new();
        backend.init_video().unwrap();
        assert!(backend.create_window("t", -1, 4).is_err());
        assert!(backend.create_window("t", 4, MAX_DIMENSION as i32 + 1).is_err());
        assert_eq!(backend.probe().live_windows(), 0);
    }

    #[test]
    fn injected_failure_fires_once() {
        let mut backend = HeadlessBackend::new();
        let probe = backend.probe();
        probe.fail_next(FailPoint::VideoInit);
        assert!(backend.init_video().is_err());
        assert!(backend.init_video().is_ok());
        assert_eq!(probe.video_inits(), 1);
    }

    #[test]
    fn decoder_failure_fires_once() {
        let mut backend = HeadlessBackend::new();
        let probe = backend.probe();
        probe.fail_next(FailPoint::Decoder);
        assert!(matches!(
            backend.init_decoder(),
            Err(DecoderError::CodecUnavailable { codec: "jpeg" })
        ));
        assert!(backend.init_decoder().is_ok());
        assert_eq!(probe.decoder_inits(), 1);
    }

    #[test]
    fn present_copies_texture_into_framebuffer() {
        let mut backend = HeadlessBackend::new();
        let probe = backend.probe();
        backend.init_video().unwrap();
        let window = backend.create_window("t", 2, 1).unwrap();
        let mut canvas = backend.create_canvas(&window).unwrap();
        let mut texture = backend
            .create_texture(&canvas, TextureFormat::Rgb24, TextureAccess::Static, 1, 1)
            .unwrap();
        backend.update_texture(&mut texture, &[0, 255, 0], 3).unwrap();
        backend.present(&mut canvas, &texture);

        assert_eq!(probe.framebuffer(), vec![0x0000_ff00; 2]);
        assert_eq!(probe.presents(), 1);
        backend.destroy_texture(texture);
        backend.destroy_canvas(canvas);
        backend.destroy_window(window);
        assert_eq!(probe.live_textures() + probe.live_canvases() + probe.live_windows(), 0);
    }

    #[test]
    fn quit_is_consumed_by_poll() {
        let mut backend = HeadlessBackend::new();
        let probe = backend.probe();
        assert!(!backend.poll_quit());
        probe.post_quit();
        assert!(backend.poll_quit());
        assert!(!backend.poll_quit());
    }
}
