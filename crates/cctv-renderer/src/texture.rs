use cctv_decoder::{convert, ConvertError};

use crate::backend::TextureFormat;

/// CPU-side texture holding XRGB8888 pixels.
///
/// Uploads convert from the texture's [`TextureFormat`]; drawing copies the
/// whole texture stretched (nearest neighbour) over a target buffer.
pub struct SoftTexture {
    format: TextureFormat,
    width: u32,
    height: u32,
    pixels: Vec<u32>,
    uploads: u64,
}

impl SoftTexture {
    pub fn new(format: TextureFormat, width: u32, height: u32) -> Self {
        Self {
            format,
            width,
            height,
            pixels: vec![0; width as usize * height as usize],
            uploads: 0,
        }
    }

    /// Overwrites the whole texture from `src`, rows `pitch` bytes apart.
    pub fn update(&mut self, src: &[u8], pitch: usize) -> Result<(), ConvertError> {
        match self.format {
            TextureFormat::Yuy2 => {
                convert::yuyv_to_xrgb(src, self.width, self.height, pitch, &mut self.pixels)?
            }
            TextureFormat::Rgb24 => {
                convert::rgb24_to_xrgb(src, self.width, self.height, pitch, &mut self.pixels)?
            }
        }
        self.uploads += 1;
        Ok(())
    }

    /// Copies the texture over the whole of `dst` (`dst_width` x `dst_height`).
    pub fn blit(&self, dst: &mut [u32], dst_width: u32, dst_height: u32) {
        if self.width == 0 || self.height == 0 || dst_width == 0 || dst_height == 0 {
            return;
        }
        let (sw, sh) = (self.width as u64, self.height as u64);
        let (dw, dh) = (dst_width as u64, dst_height as u64);

        let columns: Vec<usize> = (0..dw).map(|dx| (dx * sw / dw) as usize).collect();
        for (dy, row) in dst.chunks_exact_mut(dw as usize).take(dh as usize).enumerate() {
            let sy = (dy as u64 * sh / dh) as usize;
            let src_row = &self.pixels[sy * sw as usize..(sy + 1) * sw as usize];
            for (px, &sx) in row.iter_mut().zip(&columns) {
                *px = src_row[sx];
            }
        }
    }

    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    pub fn uploads(&self) -> u64 {
        self.uploads
    }
}
