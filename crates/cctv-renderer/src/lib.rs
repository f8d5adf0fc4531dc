use cctv_core::{DecoderError, Resolution};
use thiserror::Error;

pub mod backend;
pub mod headless;
mod render;
pub mod surface;
pub mod texture;
#[cfg(feature = "window")]
pub mod window;

pub use backend::{Backend, BackendError, TextureAccess, TextureFormat};
pub use headless::{FailPoint, HeadlessBackend, HeadlessProbe};
pub use cctv_core::DEFAULT_TITLE;
pub use surface::{Surface, SurfaceState};
pub use texture::SoftTexture;
#[cfg(feature = "window")]
pub use window::WindowBackend;

// MARK: - DisplayError

/// Why a surface could not be created. Every resource acquired before the
/// failing step has already been released when this is returned.
#[derive(Error, Debug)]
pub enum DisplayError {
    #[error("Invalid surface geometry {width}x{height} (each side must be 1..=i32::MAX)")]
    InvalidGeometry { width: u32, height: u32 },

    #[error("Failed to initialize video subsystem: {0}")]
    VideoInit(BackendError),

    #[error("Failed to initialize image decoder: {0}")]
    DecoderInit(#[from] DecoderError),

    #[error("Failed to create window: {0}")]
    WindowCreation(BackendError),

    #[error("Failed to create render target: {0}")]
    CanvasCreation(BackendError),

    #[error("Failed to create streaming texture: {0}")]
    TextureCreation(BackendError),
}

// MARK: - RenderError

/// Why a frame was dropped. The surface stays usable after any of these.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Surface is not active")]
    NotActive,

    #[error("Frame carries no data")]
    EmptyFrame,

    #[error("Frame claims {bytes_used} used bytes but its buffer holds {capacity}")]
    UsedLengthOutOfBounds { bytes_used: usize, capacity: usize },

    #[error("Frame too short: {required} bytes required, {bytes_used} used")]
    ShortFrame { required: u64, bytes_used: usize },

    #[error("Frame is {frame} but the streaming texture is {surface}")]
    GeometryMismatch { frame: Resolution, surface: Resolution },

    #[error("Failed to decode frame: {0}")]
    Decode(#[from] DecoderError),

    #[error("Failed to create frame texture: {0}")]
    TextureCreation(BackendError),

    #[error("Texture upload failed: {0}")]
    Upload(BackendError),
}
