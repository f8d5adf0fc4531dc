//! Display surface lifecycle.
//!
//! A [`Surface`] owns every native resource behind one window:
//!
//! ```text
//! init_video → [JpegDecoder (mjpeg)] → window → canvas → [streaming YUY2 texture (yuyv)]
//! ```
//!
//! Teardown runs the same chain backwards and skips whatever was never
//! acquired, so one `destroy` serves both the rollback of a failed `create`
//! and normal shutdown.

use cctv_core::{DisplayConfig, FrameFormat, Resolution, DEFAULT_TITLE};
use cctv_decoder::JpegDecoder;
use tracing::{debug, info, warn};

use crate::backend::{Backend, TextureAccess, TextureFormat};
use crate::DisplayError;

// ── SurfaceState ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceState {
    /// Resources are being acquired.
    Uninitialized,
    /// Fully constructed; frames can be rendered.
    Active,
    /// Every resource has been released.
    Destroyed,
}

// ── Surface ───────────────────────────────────────────────────────────────────

/// One window plus its render target and, for YUYV, a persistent streaming
/// texture sized to the configured resolution.
///
/// Invariants once `Active`: `window` and `canvas` are set; `texture` is set
/// iff the format is YUYV; `decoder` is set iff the format is MJPEG.
pub struct Surface<B: Backend> {
    pub(crate) backend: B,
    pub(crate) state: SurfaceState,
    pub(crate) format: FrameFormat,
    pub(crate) resolution: Resolution,
    video: bool,
    pub(crate) decoder: Option<JpegDecoder>,
    window: Option<B::Window>,
    pub(crate) canvas: Option<B::Canvas>,
    pub(crate) texture: Option<B::Texture>,
    pub(crate) frames_presented: u64,
}

impl<B: Backend> Surface<B> {
    /// Opens a surface titled [`DEFAULT_TITLE`].
    pub fn create(
        backend: B,
        width: u32,
        height: u32,
        format: FrameFormat,
    ) -> Result<Self, DisplayError> {
        Self::open(backend, DEFAULT_TITLE, Resolution::new(width, height), format)
    }

    pub fn from_config(backend: B, config: &DisplayConfig) -> Result<Self, DisplayError> {
        Self::open(backend, &config.title, config.resolution, config.format)
    }

    fn open(
        backend: B,
        title: &str,
        resolution: Resolution,
        format: FrameFormat,
    ) -> Result<Self, DisplayError> {
        // The windowing API takes signed ints; reject before touching anything.
        if resolution.validate_for_window().is_err() {
            return Err(DisplayError::InvalidGeometry {
                width: resolution.width,
                height: resolution.height,
            });
        }

        let mut surface = Self {
            backend,
            state: SurfaceState::Uninitialized,
            format,
            resolution,
            video: false,
            decoder: None,
            window: None,
            canvas: None,
            texture: None,
            frames_presented: 0,
        };

        match surface.acquire(title) {
            Ok(()) => {
                surface.state = SurfaceState::Active;
                info!("Surface ready: '{}' {} {}", title, resolution, format);
                Ok(surface)
            }
            Err(e) => {
                warn!("Surface creation failed: {} — rolling back", e);
                surface.destroy();
                Err(e)
            }
        }
    }

    fn acquire(&mut self, title: &str) -> Result<(), DisplayError> {
        let width = i32::try_from(self.resolution.width).map_err(|_| self.invalid_geometry())?;
        let height = i32::try_from(self.resolution.height).map_err(|_| self.invalid_geometry())?;

        self.backend.init_video().map_err(DisplayError::VideoInit)?;
        self.video = true;

        if self.format.is_compressed() {
            self.decoder = Some(self.backend.init_decoder()?);
        }

        let window = self
            .backend
            .create_window(title, width, height)
            .map_err(DisplayError::WindowCreation)?;
        let window = self.window.insert(window);

        let canvas = self
            .backend
            .create_canvas(window)
            .map_err(DisplayError::CanvasCreation)?;
        let canvas = self.canvas.insert(canvas);

        match self.format {
            FrameFormat::Yuyv => {
                let texture = self
                    .backend
                    .create_texture(
                        canvas,
                        TextureFormat::Yuy2,
                        TextureAccess::Streaming,
                        self.resolution.width,
                        self.resolution.height,
                    )
                    .map_err(DisplayError::TextureCreation)?;
                self.texture = Some(texture);
            }
            // Each compressed frame brings its own one-shot texture.
            FrameFormat::Mjpeg => {}
        }
        Ok(())
    }

    fn invalid_geometry(&self) -> DisplayError {
        DisplayError::InvalidGeometry {
            width: self.resolution.width,
            height: self.resolution.height,
        }
    }

    /// Releases texture, canvas, window, decoder and finally the video
    /// subsystem, skipping anything that is not held. Safe to call repeatedly
    /// and on a half-built surface.
    pub fn destroy(&mut self) {
        if self.state == SurfaceState::Destroyed {
            return;
        }

        if let Some(texture) = self.texture.take() {
            self.backend.destroy_texture(texture);
        }
        if let Some(canvas) = self.canvas.take() {
            self.backend.destroy_canvas(canvas);
        }
        if let Some(window) = self.window.take() {
            self.backend.destroy_window(window);
        }
        // Dropping the decoder shuts the image subsystem down.
        self.decoder = None;
        if std::mem::take(&mut self.video) {
            self.backend.quit_video();
        }

        debug!(
            "Surface destroyed ({} frame(s) presented)",
            self.frames_presented
        );
        self.state = SurfaceState::Destroyed;
    }

    /// Polls for an external close request (e.g. the window's close button).
    /// Reports each request once. Always `false` once destroyed.
    pub fn close_requested(&mut self) -> bool {
        self.video && self.backend.poll_quit()
    }

    pub fn state(&self) -> SurfaceState {
        self.state
    }

    pub fn format(&self) -> FrameFormat {
        self.format
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    pub fn frames_presented(&self) -> u64 {
        self.frames_presented
    }
}

impl<B: Backend> Drop for Surface<B> {
    fn drop(&mut self) {
        self.destroy();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cctv_core::DecoderError;

    use crate::headless::{FailPoint, HeadlessBackend, HeadlessProbe};

    fn headless() -> (HeadlessBackend, HeadlessProbe) {
        let backend = HeadlessBackend::new();
        let probe = backend.probe();
        (backend, probe)
    }

    fn assert_nothing_held(probe: &HeadlessProbe) {
        assert_eq!(probe.live_textures(), 0);
        assert_eq!(probe.live_canvases(), 0);
        assert_eq!(probe.live_windows(), 0);
        assert!(!probe.video_initialized());
    }

    #[test]
    fn rejects_bad_geometry_without_touching_backend() {
        let limit = i32::MAX as u32;
        for (w, h) in [(0, 480), (640, 0), (0, 0), (limit + 1, 480), (640, u32::MAX)] {
            let (backend, probe) = headless();
            let err = Surface::create(backend, w, h, FrameFormat::Yuyv)
                .err()
                .expect("geometry must be rejected");
            assert!(matches!(err, DisplayError::InvalidGeometry { .. }), "{w}x{h}: {err}");
            assert_eq!(probe.video_inits(), 0);
            assert_nothing_held(&probe);
        }
    }

    #[test]
    fn yuyv_surface_holds_streaming_texture() {
        let (backend, probe) = headless();
        let surface = Surface::create(backend, 64, 48, FrameFormat::Yuyv).unwrap();
        assert_eq!(surface.state(), SurfaceState::Active);
        assert!(surface.texture.is_some());
        assert!(surface.decoder.is_none());
        assert_eq!(probe.live_windows(), 1);
        assert_eq!(probe.live_canvases(), 1);
        assert_eq!(probe.live_textures(), 1);
        assert!(probe.video_initialized());
    }

    #[test]
    fn mjpeg_surface_has_decoder_and_no_texture() {
        let (backend, probe) = headless();
        let surface = Surface::create(backend, 64, 48, FrameFormat::Mjpeg).unwrap();
        assert!(surface.texture.is_none());
        assert!(surface.decoder.is_some());
        assert_eq!(probe.live_textures(), 0);
        assert_eq!(probe.live_windows(), 1);
    }

    #[test]
    fn destroy_is_idempotent() {
        for format in FrameFormat::ALL {
            let (backend, probe) = headless();
            let mut surface = Surface::create(backend, 32, 32, format).unwrap();
            surface.destroy();
            assert_eq!(surface.state(), SurfaceState::Destroyed);
            assert_nothing_held(&probe);

            surface.destroy();
            drop(surface);
            assert_nothing_held(&probe);
            assert_eq!(probe.video_quits(), 1);
        }
    }

    #[test]
    fn drop_releases_everything() {
        let (backend, probe) = headless();
        {
            let _surface = Surface::create(backend, 32, 32, FrameFormat::Yuyv).unwrap();
            assert_eq!(probe.live_textures(), 1);
        }
        assert_nothing_held(&probe);
    }

    #[test]
    fn every_failure_point_rolls_back() {
        let cases = [
            (FailPoint::VideoInit, FrameFormat::Yuyv),
            (FailPoint::Decoder, FrameFormat::Mjpeg),
            (FailPoint::Window, FrameFormat::Yuyv),
            (FailPoint::Canvas, FrameFormat::Mjpeg),
            (FailPoint::Canvas, FrameFormat::Yuyv),
            (FailPoint::Texture, FrameFormat::Yuyv),
        ];
        for (point, format) in cases {
            let (backend, probe) = headless();
            probe.fail_next(point);
            let err = Surface::create(backend, 32, 32, format)
                .err()
                .expect("injected failure must surface");
            match point {
                FailPoint::VideoInit => assert!(matches!(err, DisplayError::VideoInit(_))),
                FailPoint::Decoder => assert!(matches!(err, DisplayError::DecoderInit(_))),
                FailPoint::Window => assert!(matches!(err, DisplayError::WindowCreation(_))),
                FailPoint::Canvas => assert!(matches!(err, DisplayError::CanvasCreation(_))),
                FailPoint::Texture => assert!(matches!(err, DisplayError::TextureCreation(_))),
            }
            assert_nothing_held(&probe);
            let expected_quits = if point == FailPoint::VideoInit { 0 } else { 1 };
            assert_eq!(probe.video_quits(), expected_quits, "{point:?}");
        }
    }

    #[test]
    fn decoder_failure_leaves_no_window() {
        let (backend, probe) = headless();
        probe.fail_next(FailPoint::Decoder);
        let err = Surface::create(backend, 32, 32, FrameFormat::Mjpeg).err().unwrap();
        assert!(matches!(
            err,
            DisplayError::DecoderInit(DecoderError::CodecUnavailable { .. })
        ));
        assert_eq!(probe.decoder_inits(), 0);
        assert_eq!(probe.video_inits(), 1);
        assert_eq!(probe.video_quits(), 1);
        assert_eq!(probe.window_title(), None);
        assert_nothing_held(&probe);
    }

    #[test]
    fn yuyv_surface_skips_decoder() {
        let (backend, probe) = headless();
        probe.fail_next(FailPoint::Decoder);
        let _surface = Surface::create(backend, 32, 32, FrameFormat::Yuyv).unwrap();
        assert_eq!(probe.decoder_inits(), 0);
    }

    #[test]
    fn window_refused_over_device_limit() {
        let (backend, probe) = headless();
        let err = Surface::create(backend, 32, 20_000, FrameFormat::Yuyv).err().unwrap();
        assert!(matches!(err, DisplayError::WindowCreation(_)));
        assert_nothing_held(&probe);
    }

    #[test]
    fn close_request_reported_once() {
        let (backend, probe) = headless();
        let mut surface = Surface::create(backend, 32, 32, FrameFormat::Yuyv).unwrap();
        assert!(!surface.close_requested());

        probe.post_quit();
        assert!(surface.close_requested());
        assert!(!surface.close_requested());

        probe.post_quit();
        surface.destroy();
        assert!(!surface.close_requested());
    }

    #[test]
    fn create_uses_default_config_title() {
        let (backend, probe) = headless();
        let _surface = Surface::create(backend, 32, 32, FrameFormat::Yuyv).unwrap();
        assert_eq!(probe.window_title(), Some(DisplayConfig::default().title));
    }

    #[test]
    fn from_config_uses_title_and_geometry() {
        let (backend, probe) = headless();
        let config = DisplayConfig {
            resolution: Resolution::new(80, 60),
            format: FrameFormat::Mjpeg,
            title: "Garage".into(),
            ..Default::default()
        };
        let surface = Surface::from_config(backend, &config).unwrap();
        assert_eq!(surface.resolution(), Resolution::new(80, 60));
        assert_eq!(surface.format(), FrameFormat::Mjpeg);
        assert_eq!(probe.window_title().as_deref(), Some("Garage"));
    }
}
