//! cctv-decoder
//!
//! Still-image decoding for the compressed frame path plus the CPU pixel
//! converters used when uploading frames into presentation textures.
//!
//! # Compressed path
//! ```text
//! &[u8] (bytes_used) → Cursor → JPEG decode → RGB24 DecodedImage → one-shot texture
//! ```
//!
//! # Raw path
//! ```text
//! &[u8] YUYV 4:2:2 → convert::yuyv_to_xrgb → streaming texture
//! ```

pub mod convert;
pub mod jpeg;

pub use convert::ConvertError;
pub use jpeg::{DecodedImage, JpegDecoder};
