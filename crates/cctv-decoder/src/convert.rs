//! CPU pixel conversion into the XRGB8888 layout (`0x00RRGGBB`) used by the
//! presentation textures.
//!
//! Every converter takes an explicit source pitch and refuses, rather than
//! panics on, a source or destination that is too small for the geometry.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConvertError {
    #[error("Pitch {pitch} is shorter than a {row_bytes}-byte row")]
    PitchTooSmall { pitch: usize, row_bytes: usize },

    #[error("Source holds {actual} bytes, {required} required")]
    SourceTooShort { required: usize, actual: usize },

    #[error("Destination holds {actual} pixels, {required} required")]
    DestinationTooSmall { required: usize, actual: usize },

    #[error("Geometry {width}x{height} overflows the address space")]
    Overflow { width: u32, height: u32 },
}

/// Packs one BT.601 limited-range YUV sample into XRGB8888.
#[inline]
pub fn yuv_to_xrgb(y: u8, u: u8, v: u8) -> u32 {
    let c = y as i32 - 16;
    let d = u as i32 - 128;
    let e = v as i32 - 128;

    let r = clamp((298 * c + 409 * e + 128) >> 8);
    let g = clamp((298 * c - 100 * d - 208 * e + 128) >> 8);
    let b = clamp((298 * c + 516 * d + 128) >> 8);

    (r << 16) | (g << 8) | b
}

#[inline]
fn clamp(value: i32) -> u32 {
    value.clamp(0, 255) as u32
}

/// Converts packed YUYV 4:2:2 (`Y0 U Y1 V`) into XRGB8888.
///
/// For odd widths the trailing pixel carries only `Y U`; V is taken as neutral.
pub fn yuyv_to_xrgb(
    src: &[u8],
    width: u32,
    height: u32,
    pitch: usize,
    dst: &mut [u32],
) -> Result<(), ConvertError> {
    if width == 0 || height == 0 {
        return Ok(());
    }
    let row_bytes = check_geometry(src, width, height, 2, pitch, dst)?;
    let width = width as usize;

    for (y, out) in dst.chunks_exact_mut(width).take(height as usize).enumerate() {
        let line = &src[y * pitch..y * pitch + row_bytes];
        for (pair, px) in line.chunks(4).zip(out.chunks_mut(2)) {
            let u = pair[1];
            let v = pair.get(3).copied().unwrap_or(128);
            px[0] = yuv_to_xrgb(pair[0], u, v);
            if let Some(second) = px.get_mut(1) {
                *second = yuv_to_xrgb(pair[2], u, v);
            }
        }
    }
    Ok(())
}

/// Converts packed RGB24 into XRGB8888.
pub fn rgb24_to_xrgb(
    src: &[u8],
    width: u32,
    height: u32,
    pitch: usize,
    dst: &mut [u32],
) -> Result<(), ConvertError> {
    if width == 0 || height == 0 {
        return Ok(());
    }
    let row_bytes = check_geometry(src, width, height, 3, pitch, dst)?;
    let width = width as usize;

    for (y, out) in dst.chunks_exact_mut(width).take(height as usize).enumerate() {
        let line = &src[y * pitch..y * pitch + row_bytes];
        for (rgb, px) in line.chunks_exact(3).zip(out.iter_mut()) {
            *px = (rgb[0] as u32) << 16 | (rgb[1] as u32) << 8 | rgb[2] as u32;
        }
    }
    Ok(())
}

/// Minimum source length for `height` rows of `row_bytes` spaced `pitch` apart.
pub fn required_source_len(row_bytes: usize, pitch: usize, height: u32) -> Option<usize> {
    match height {
        0 => Some(0),
        h => pitch.checked_mul(h as usize - 1)?.checked_add(row_bytes),
    }
}

fn check_geometry(
    src: &[u8],
    width: u32,
    height: u32,
    bytes_per_pixel: usize,
    pitch: usize,
    dst: &[u32],
) -> Result<usize, ConvertError> {
    let overflow = ConvertError::Overflow { width, height };
    let row_bytes = (width as usize).checked_mul(bytes_per_pixel).ok_or(overflow.clone())?;
    if pitch < row_bytes {
        return Err(ConvertError::PitchTooSmall { pitch, row_bytes });
    }

    let required = required_source_len(row_bytes, pitch, height).ok_or(overflow.clone())?;
    if src.len() < required {
        return Err(ConvertError::SourceTooShort { required, actual: src.len() });
    }

    let pixels = (width as usize).checked_mul(height as usize).ok_or(overflow)?;
    if dst.len() < pixels {
        return Err(ConvertError::DestinationTooSmall { required: pixels, actual: dst.len() });
    }
    Ok(row_bytes)
}
