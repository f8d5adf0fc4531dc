//! File-backed frame source standing in for a live capture device.
//!
//! - YUYV: a raw dump of back-to-back `width * height * 2` byte frames. A
//!   short trailing chunk is still delivered so the renderer can refuse it.
//! - MJPEG: concatenated JPEG images (as written by `ffmpeg -f mjpeg` or a
//!   V4L2 MJPG dump), split on SOI / EOI markers.

use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;
use std::time::Instant;

use bytes::Bytes;
use cctv_core::{CapturedFrame, CctvError, DisplayConfig, Resolution};
use tracing::{debug, info};

const SOI: [u8; 2] = [0xff, 0xd8];
const EOI: [u8; 2] = [0xff, 0xd9];

enum SourceKind {
    Raw { reader: BufReader<File>, frame_len: usize },
    Mjpeg { data: Bytes, offset: usize },
}

pub struct FrameSource {
    kind: SourceKind,
    resolution: Resolution,
    sequence: u64,
    since_rewind: u64,
    started: Instant,
}

impl FrameSource {
    pub fn open(path: &Path, config: &DisplayConfig) -> Result<Self, CctvError> {
        let resolution = config.resolution;
        let kind = match config.format.bytes_per_pixel() {
            Some(bytes_per_pixel) => {
                let frame_len = resolution
                    .total_pixels()
                    .checked_mul(bytes_per_pixel as u64)
                    .and_then(|len| usize::try_from(len).ok())
                    .ok_or_else(|| CctvError::ConfigurationInvalid {
                        reason: format!("{resolution} {} frame size overflows", config.format),
                    })?;
                SourceKind::Raw { reader: BufReader::new(File::open(path)?), frame_len }
            }
            None => {
                let data = Bytes::from(std::fs::read(path)?);
                SourceKind::Mjpeg { data, offset: 0 }
            }
        };
        info!("Frame source: {} ({} {})", path.display(), config.format, resolution);

        Ok(Self {
            kind,
            resolution,
            sequence: 0,
            since_rewind: 0,
            started: Instant::now(),
        })
    }

    /// Next frame, or `None` at the end of the source.
    pub fn next_frame(&mut self) -> Result<Option<CapturedFrame>, CctvError> {
        let data = match &mut self.kind {
            SourceKind::Raw { reader, frame_len } => {
                let mut buf = Vec::with_capacity(*frame_len);
                reader.by_ref().take(*frame_len as u64).read_to_end(&mut buf)?;
                if buf.is_empty() {
                    return Ok(None);
                }
                Bytes::from(buf)
            }
            SourceKind::Mjpeg { data, offset } => match next_jpeg(data, *offset) {
                Some((start, end)) => {
                    *offset = end;
                    data.slice(start..end)
                }
                None => return Ok(None),
            },
        };

        self.sequence += 1;
        self.since_rewind += 1;
        Ok(Some(CapturedFrame {
            bytes_used: data.len(),
            data,
            width: self.resolution.width,
            height: self.resolution.height,
            sequence: self.sequence,
            timestamp_us: self.started.elapsed().as_micros() as u64,
        }))
    }

    pub fn rewind(&mut self) -> Result<(), CctvError> {
        match &mut self.kind {
            SourceKind::Raw { reader, .. } => {
                reader.seek(SeekFrom::Start(0))?;
            }
            SourceKind::Mjpeg { offset, .. } => *offset = 0,
        }
        debug!("Frame source rewound after {} frame(s)", self.since_rewind);
        self.since_rewind = 0;
        Ok(())
    }

    /// Frames delivered since open or the last rewind.
    pub fn since_rewind(&self) -> u64 {
        self.since_rewind
    }
}

/// Byte range of the next JPEG image at or after `from`. An image missing
/// its EOI runs to the end of the data.
///
/// Ends at the first EOI, so a frame embedding a JPEG thumbnail (EXIF APP1)
/// is cut short at the thumbnail's EOI.
fn next_jpeg(data: &[u8], from: usize) -> Option<(usize, usize)> {
    let start = from + find(data.get(from..)?, SOI)?;
    let body = start + SOI.len();
    let end = match find(&data[body..], EOI) {
        Some(pos) => body + pos + EOI.len(),
        None => data.len(),
    };
    Some((start, end))
}

fn find(haystack: &[u8], marker: [u8; 2]) -> Option<usize> {
    haystack.windows(2).position(|w| w == marker.as_slice())
}
