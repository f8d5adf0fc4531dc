use std::str::FromStr;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::errors::CctvError;

// MARK: - Resolution

/// Pixel geometry of a surface or frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub const VGA: Self = Self { width: 640, height: 480 };
    pub const HD: Self = Self { width: 1280, height: 720 };

    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn total_pixels(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Checks that the geometry can be handed to a windowing API that only
    /// accepts signed `int` sizes: both sides non-zero and `<= i32::MAX`.
    pub fn validate_for_window(&self) -> Result<(), CctvError> {
        let limit = i32::MAX as u32;
        if self.width == 0 || self.height == 0 || self.width > limit || self.height > limit {
            return Err(CctvError::ConfigurationInvalid {
                reason: format!("resolution {self} outside 1..={limit}"),
            });
        }
        Ok(())
    }
}

impl std::fmt::Display for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

// MARK: - FrameFormat

/// Frame encodings the display understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrameFormat {
    /// Packed YUV 4:2:2 (`Y0 U Y1 V`), two bytes per pixel.
    Yuyv,
    /// One baseline JPEG still image per frame.
    Mjpeg,
}

impl FrameFormat {
    pub const ALL: [FrameFormat; 2] = [FrameFormat::Yuyv, FrameFormat::Mjpeg];

    /// Bytes per pixel for packed layouts, `None` for compressed ones.
    pub const fn bytes_per_pixel(self) -> Option<usize> {
        match self {
            Self::Yuyv => Some(2),
            Self::Mjpeg => None,
        }
    }

    pub const fn is_compressed(self) -> bool {
        matches!(self, Self::Mjpeg)
    }

    /// V4L2 fourcc code (`v4l2_fourcc(a, b, c, d)`).
    pub const fn fourcc(self) -> u32 {
        let code = match self {
            Self::Yuyv => *b"YUYV",
            Self::Mjpeg => *b"MJPG",
        };
        u32::from_le_bytes(code)
    }

    pub fn from_fourcc(code: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|format| format.fourcc() == code)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Yuyv => "yuyv",
            Self::Mjpeg => "mjpeg",
        }
    }
}

impl std::fmt::Display for FrameFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FrameFormat {
    type Err = CctvError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "yuyv" | "yuy2" => Ok(Self::Yuyv),
            "mjpeg" | "mjpg" | "jpeg" | "jpg" => Ok(Self::Mjpeg),
            other => Err(CctvError::ConfigurationInvalid {
                reason: format!("unsupported frame format '{other}'"),
            }),
        }
    }
}

// MARK: - Frame

/// Borrowed frame description handed over by the capture side for the
/// duration of a single render call.
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    /// Whole capture buffer; may be larger than the populated part.
    pub data: &'a [u8],
    /// Number of leading bytes of `data` that are valid.
    pub bytes_used: usize,
    pub width: u32,
    pub height: u32,
}

impl<'a> Frame<'a> {
    /// Frame whose whole buffer is populated.
    pub fn new(data: &'a [u8], width: u32, height: u32) -> Self {
        Self { data, bytes_used: data.len(), width, height }
    }

    /// The populated prefix of the buffer, or `None` if nothing is populated
    /// or `bytes_used` claims more than the buffer holds.
    pub fn payload(&self) -> Option<&'a [u8]> {
        if self.bytes_used == 0 {
            return None;
        }
        self.data.get(..self.bytes_used)
    }

    pub fn resolution(&self) -> Resolution {
        Resolution::new(self.width, self.height)
    }
}

// MARK: - CapturedFrame

/// Owned frame as produced by a frame source.
#[derive(Debug, Clone)]
pub struct CapturedFrame {
    pub data: Bytes,
    pub bytes_used: usize,
    pub width: u32,
    pub height: u32,
    pub sequence: u64,
    pub timestamp_us: u64,
}

impl CapturedFrame {
    pub fn as_frame(&self) -> Frame<'_> {
        Frame {
            data: &self.data,
            bytes_used: self.bytes_used,
            width: self.width,
            height: self.height,
        }
    }
}
