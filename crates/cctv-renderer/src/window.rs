//! On-screen backend: a winit window presented through softbuffer.
//!
//! Events are pumped without blocking from [`Backend::poll_quit`], so the
//! caller keeps driving the loop itself.

use std::num::NonZeroU32;
use std::rc::Rc;
use std::time::Duration;

use tracing::{debug, info, warn};
use winit::dpi::{PhysicalPosition, PhysicalSize};
use winit::event::{Event, WindowEvent};
use winit::event_loop::EventLoop;
use winit::platform::pump_events::EventLoopExtPumpEvents;
use winit::window::{Window, WindowBuilder};

use crate::backend::{Backend, BackendError, TextureAccess, TextureFormat};
use crate::texture::SoftTexture;

// ── Canvas ────────────────────────────────────────────────────────────────────

pub struct WindowCanvas {
    // Declared before `_context` so the surface is released first.
    surface: softbuffer::Surface<Rc<Window>, Rc<Window>>,
    _context: softbuffer::Context<Rc<Window>>,
    width: u32,
    height: u32,
}

// ── WindowBackend ─────────────────────────────────────────────────────────────

/// winit allows one event loop per process; after `quit_video` a new
/// `init_video` fails.
pub struct WindowBackend {
    event_loop: Option<EventLoop<()>>,
}

impl WindowBackend {
    pub fn new() -> Self {
        Self { event_loop: None }
    }
}

impl Default for WindowBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn backend_error(context: &str, e: impl std::fmt::Display) -> BackendError {
    BackendError::new(format!("{context}: {e}"))
}

/// Top-left corner that centres `window` on a monitor at `origin` of size `monitor`.
pub fn centered_position(
    origin: PhysicalPosition<i32>,
    monitor: PhysicalSize<u32>,
    window: PhysicalSize<u32>,
) -> PhysicalPosition<i32> {
    let offset = |outer: u32, inner: u32| (outer as i64 - inner as i64) / 2;
    let x = origin.x as i64 + offset(monitor.width, window.width);
    let y = origin.y as i64 + offset(monitor.height, window.height);
    PhysicalPosition::new(
        x.clamp(i32::MIN as i64, i32::MAX as i64) as i32,
        y.clamp(i32::MIN as i64, i32::MAX as i64) as i32,
    )
}

impl Backend for WindowBackend {
    type Window = Rc<Window>;
    type Canvas = WindowCanvas;
    type Texture = SoftTexture;

    fn init_video(&mut self) -> Result<(), BackendError> {
        let event_loop = EventLoop::new().map_err(|e| backend_error("event loop", e))?;
        self.event_loop = Some(event_loop);
        Ok(())
    }

    fn quit_video(&mut self) {
        self.event_loop = None;
        debug!("Window event loop released");
    }

    fn create_window(
        &mut self,
        title: &str,
        width: i32,
        height: i32,
    ) -> Result<Rc<Window>, BackendError> {
        let event_loop = self
            .event_loop
            .as_ref()
            .ok_or_else(|| BackendError::new("video subsystem not initialized"))?;
        let size = match (u32::try_from(width), u32::try_from(height)) {
            (Ok(w), Ok(h)) => PhysicalSize::new(w, h),
            _ => return Err(BackendError::new(format!("negative window size {width}x{height}"))),
        };

        let mut builder = WindowBuilder::new()
            .with_title(title)
            .with_inner_size(size)
            .with_resizable(false)
            .with_visible(true);
        if let Some(monitor) = event_loop.primary_monitor() {
            builder = builder.with_position(centered_position(monitor.position(), monitor.size(), size));
        }

        let window = builder.build(event_loop).map_err(|e| backend_error("window", e))?;
        info!("Window '{}' opened at {}x{}", title, size.width, size.height);
        Ok(Rc::new(window))
    }

    fn destroy_window(&mut self, window: Rc<Window>) {
        // Last reference; the canvas has already let go of its clones.
        drop(window);
    }

    fn create_canvas(&mut self, window: &Rc<Window>) -> Result<WindowCanvas, BackendError> {
        let context = softbuffer::Context::new(Rc::clone(window))
            .map_err(|e| backend_error("softbuffer context", e))?;
        let mut surface = softbuffer::Surface::new(&context, Rc::clone(window))
            .map_err(|e| backend_error("softbuffer surface", e))?;

        let size = window.inner_size();
        let (Some(w), Some(h)) = (NonZeroU32::new(size.width), NonZeroU32::new(size.height)) else {
            return Err(BackendError::new("window has zero inner size"));
        };
        surface.resize(w, h).map_err(|e| backend_error("softbuffer resize", e))?;

        Ok(WindowCanvas {
            surface,
            _context: context,
            width: size.width,
            height: size.height,
        })
    }

    fn destroy_canvas(&mut self, canvas: WindowCanvas) {
        drop(canvas);
    }

    fn create_texture(
        &mut self,
        _canvas: &WindowCanvas,
        format: TextureFormat,
        access: TextureAccess,
        width: u32,
        height: u32,
    ) -> Result<SoftTexture, BackendError> {
        if width == 0 || height == 0 {
            return Err(BackendError::new(format!("empty texture {width}x{height}")));
        }
        debug!("{:?} {:?} texture {}x{}", access, format, width, height);
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
            .map_err(|e| backend_error("texture upload", e))
    }

    fn destroy_texture(&mut self, texture: SoftTexture) {
        drop(texture);
    }

    fn present(&mut self, canvas: &mut WindowCanvas, texture: &SoftTexture) {
        let (width, height) = (canvas.width, canvas.height);
        let mut buffer = match canvas.surface.buffer_mut() {
            Ok(buffer) => buffer,
            Err(e) => {
                warn!("Present skipped, no back buffer: {}", e);
                return;
            }
        };
        buffer.fill(0);
        texture.blit(&mut buffer, width, height);
        if let Err(e) = buffer.present() {
            warn!("Present failed: {}", e);
        }
    }

    fn poll_quit(&mut self) -> bool {
        let Some(event_loop) = self.event_loop.as_mut() else {
            return false;
        };

        let mut close = false;
        event_loop.pump_events(Some(Duration::ZERO), |event, _target| {
            if let Event::WindowEvent { event: WindowEvent::CloseRequested, .. } = event {
                close = true;
            }
        });
        close
    }
}
