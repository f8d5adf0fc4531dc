use std::io::Cursor;

use cctv_core::DecoderError;
use image::ImageFormat;
use tracing::{debug, info};

// ── DecodedImage ──────────────────────────────────────────────────────────────

/// One decoded still image, packed RGB24. Lives for a single render call.
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl DecodedImage {
    pub const BYTES_PER_PIXEL: usize = 3;

    pub fn pitch(&self) -> usize {
        self.width as usize * Self::BYTES_PER_PIXEL
    }
}

impl std::fmt::Debug for DecodedImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecodedImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.pixels.len())
            .finish()
    }
}

// ── JpegDecoder ───────────────────────────────────────────────────────────────

/// The still-image decoding subsystem for the compressed frame path.
///
/// Creating one is the subsystem start-up; dropping it is the shutdown.
pub struct JpegDecoder {
    frames_decoded: u64,
    failures: u64,
}

impl JpegDecoder {
    pub fn new() -> Result<Self, DecoderError> {
        if !ImageFormat::Jpeg.reading_enabled() {
            return Err(DecoderError::CodecUnavailable { codec: "jpeg" });
        }
        info!("JPEG decoder initialised");
        Ok(Self { frames_decoded: 0, failures: 0 })
    }

    /// Decodes one JPEG image read from an in-memory stream over `data`.
    pub fn decode(&mut self, data: &[u8]) -> Result<DecodedImage, DecoderError> {
        if data.is_empty() {
            return Err(DecoderError::EmptyInput);
        }

        let image = image::load(Cursor::new(data), ImageFormat::Jpeg).map_err(|e| {
            self.failures += 1;
            DecoderError::DecodeFailed { reason: e.to_string() }
        })?;

        let rgb = image.into_rgb8();
        let (width, height) = rgb.dimensions();
        self.frames_decoded += 1;
        debug!("Decoded JPEG {}x{} from {} bytes", width, height, data.len());

        Ok(DecodedImage { width, height, pixels: rgb.into_raw() })
    }

    pub fn frames_decoded(&self) -> u64 {
        self.frames_decoded
    }

    pub fn failures(&self) -> u64 {
        self.failures
    }
}

impl Drop for JpegDecoder {
    fn drop(&mut self) {
        info!(
            "JPEG decoder shut down ({} decoded, {} rejected)",
            self.frames_decoded, self.failures
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, RgbImage};

    fn encode_jpeg(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_fn(width, height, |x, _| {
            if x < width / 2 { image::Rgb([255, 255, 255]) } else { image::Rgb([0, 0, 0]) }
        });
        let mut out = Vec::new();
        DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut out), ImageFormat::Jpeg)
            .expect("encode fixture");
        out
    }

    #[test]
    fn decodes_well_formed_jpeg() {
        let mut decoder = JpegDecoder::new().expect("jpeg support compiled in");
        let image = decoder.decode(&encode_jpeg(16, 8)).expect("valid jpeg");
        assert_eq!((image.width, image.height), (16, 8));
        assert_eq!(image.pitch(), 48);
        assert_eq!(image.pixels.len(), 16 * 8 * 3);
        // Left half white, right half black (with some compression slack).
        assert!(image.pixels[0] > 200);
        assert!(image.pixels[image.pitch() - 1] < 60);
        assert_eq!(decoder.frames_decoded(), 1);
    }

    #[test]
    fn rejects_truncated_jpeg() {
        let mut decoder = JpegDecoder::new().unwrap();
        let data = encode_jpeg(16, 16);
        let err = decoder.decode(&data[..20]).unwrap_err();
        assert!(matches!(err, DecoderError::DecodeFailed { .. }));
        assert_eq!(decoder.failures(), 1);
    }

    #[test]
    fn rejects_garbage_and_empty_input() {
        let mut decoder = JpegDecoder::new().unwrap();
        assert!(matches!(
            decoder.decode(&[0x42; 64]),
            Err(DecoderError::DecodeFailed { .. })
        ));
        assert!(matches!(decoder.decode(&[]), Err(DecoderError::EmptyInput)));
        assert_eq!(decoder.frames_decoded(), 0);
    }
}
