//! Per-frame presentation.
//!
//! The format fixed at surface creation picks the path:
//! - YUYV: size check → upload into the streaming texture → present
//! - MJPEG: decode → one-shot RGB24 texture → present → release

use cctv_core::{Frame, FrameFormat};
use tracing::debug;

use crate::backend::{Backend, TextureAccess, TextureFormat};
use crate::surface::{Surface, SurfaceState};
use crate::RenderError;

impl<B: Backend> Surface<B> {
    /// Renders one frame; `false` means the frame was dropped and the
    /// caller should carry on with the next one.
    pub fn render(&mut self, frame: &Frame<'_>) -> bool {
        match self.try_render(frame) {
            Ok(()) => true,
            Err(e) => {
                debug!("Frame dropped: {}", e);
                false
            }
        }
    }

    /// Like [`render`](Self::render) but reports why a frame was dropped.
    pub fn try_render(&mut self, frame: &Frame<'_>) -> Result<(), RenderError> {
        if self.state != SurfaceState::Active {
            return Err(RenderError::NotActive);
        }
        if frame.data.is_empty() || frame.bytes_used == 0 {
            return Err(RenderError::EmptyFrame);
        }
        let payload = frame.payload().ok_or(RenderError::UsedLengthOutOfBounds {
            bytes_used: frame.bytes_used,
            capacity: frame.data.len(),
        })?;

        match self.format {
            FrameFormat::Yuyv => self.render_yuyv(frame, payload)?,
            FrameFormat::Mjpeg => self.render_jpeg(payload)?,
        }
        self.frames_presented += 1;
        Ok(())
    }

    fn render_yuyv(&mut self, frame: &Frame<'_>, payload: &[u8]) -> Result<(), RenderError> {
        // The upload reads width * height * bpp bytes no matter how many are
        // valid, so the frame must cover its own declared geometry.
        let bytes_per_pixel = TextureFormat::Yuy2.bytes_per_pixel();
        let required = frame
            .resolution()
            .total_pixels()
            .saturating_mul(bytes_per_pixel as u64);
        if required > payload.len() as u64 {
            return Err(RenderError::ShortFrame { required, bytes_used: payload.len() });
        }

        // The streaming texture is sized to the surface, not the frame.
        if frame.resolution() != self.resolution {
            return Err(RenderError::GeometryMismatch {
                frame: frame.resolution(),
                surface: self.resolution,
            });
        }

        let (Some(texture), Some(canvas)) = (self.texture.as_mut(), self.canvas.as_mut()) else {
            return Err(RenderError::NotActive);
        };

        let pitch = frame.width as usize * bytes_per_pixel;
        self.backend
            .update_texture(texture, &payload[..required as usize], pitch)
            .map_err(RenderError::Upload)?;
        self.backend.present(canvas, texture);
        Ok(())
    }

    fn render_jpeg(&mut self, payload: &[u8]) -> Result<(), RenderError> {
        let (Some(decoder), Some(canvas)) = (self.decoder.as_mut(), self.canvas.as_mut()) else {
            return Err(RenderError::NotActive);
        };

        // Decoded dimensions may differ from the surface; the copy stretches.
        let image = decoder.decode(payload)?;

        let mut texture = self
            .backend
            .create_texture(
                canvas,
                TextureFormat::Rgb24,
                TextureAccess::Static,
                image.width,
                image.height,
            )
            .map_err(RenderError::TextureCreation)?;

        let uploaded = self
            .backend
            .update_texture(&mut texture, &image.pixels, image.pitch())
            .map_err(RenderError::Upload);
        if uploaded.is_ok() {
            self.backend.present(canvas, &texture);
        }
        self.backend.destroy_texture(texture);
        uploaded
    }
}
