use cctv_core::DecoderError;
use cctv_decoder::JpegDecoder;
use thiserror::Error;

// MARK: - Backend trait

/// Native display library seam used by [`Surface`](crate::Surface).
///
/// Handles are plain owned values; releasing one means moving it into the
/// matching `destroy_*` call, so a handle cannot be released twice.
///
/// Implementations:
/// - [`HeadlessBackend`](crate::HeadlessBackend): offscreen, inspectable through a probe
/// - `WindowBackend`: winit window presented through softbuffer (feature `window`)
pub trait Backend {
    type Window;
    /// Render target bound to a window.
    type Canvas;
    type Texture;

    /// Brings up the windowing subsystem.
    fn init_video(&mut self) -> Result<(), BackendError>;

    /// Shuts the windowing subsystem down. Only called after a successful `init_video`.
    fn quit_video(&mut self);

    /// Starts the still-image decoding subsystem that compressed surfaces
    /// need. Dropping the decoder shuts it down again.
    fn init_decoder(&mut self) -> Result<JpegDecoder, DecoderError> {
        JpegDecoder::new()
    }

    /// Opens a visible window of the given size, centred on screen.
    fn create_window(
        &mut self,
        title: &str,
        width: i32,
        height: i32,
    ) -> Result<Self::Window, BackendError>;

    fn destroy_window(&mut self, window: Self::Window);

    fn create_canvas(&mut self, window: &Self::Window) -> Result<Self::Canvas, BackendError>;

    fn destroy_canvas(&mut self, canvas: Self::Canvas);

    fn create_texture(
        &mut self,
        canvas: &Self::Canvas,
        format: TextureFormat,
        access: TextureAccess,
        width: u32,
        height: u32,
    ) -> Result<Self::Texture, BackendError>;

    /// Replaces the texture contents with `pixels`, rows `pitch` bytes apart.
    fn update_texture(
        &mut self,
        texture: &mut Self::Texture,
        pixels: &[u8],
        pitch: usize,
    ) -> Result<(), BackendError>;

    fn destroy_texture(&mut self, texture: Self::Texture);

    /// Clears the canvas, copies the whole texture stretched over it and presents.
    fn present(&mut self, canvas: &mut Self::Canvas, texture: &Self::Texture);

    /// Returns `true` once for each pending external close request. Never blocks.
    fn poll_quit(&mut self) -> bool;
}

// MARK: - Texture description

/// Source pixel layout a texture accepts on upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureFormat {
    /// Packed YUV 4:2:2, `Y0 U Y1 V`.
    Yuy2,
    /// Packed 8-bit RGB.
    Rgb24,
}

impl TextureFormat {
    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            Self::Yuy2 => 2,
            Self::Rgb24 => 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureAccess {
    /// Rewritten in place every frame.
    Streaming,
    /// Filled once, then only drawn.
    Static,
}

// MARK: - BackendError

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct BackendError(pub String);

impl BackendError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }
}
