use std::{io::Cursor, sync::Arc};

use anyhow::Context;

use crate::foundation::{
    core::{Canvas, FrameRGBA, premultiply_rgba8_in_place},
    error::{TryOnError, TryOnResult},
};

#[derive(Clone, Debug, PartialEq, Eq)]
/// Decoded raster image in premultiplied RGBA8 form.
pub struct PreparedImage {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Pixel bytes in row-major premultiplied RGBA8.
    pub rgba8_premul: Arc<Vec<u8>>,
}

impl PreparedImage {
    pub fn canvas(&self) -> Canvas {
        Canvas {
            width: self.width,
            height: self.height,
        }
    }

    /// Copy into a standalone surface, e.g. to start a composite from a base image.
    pub fn to_frame(&self) -> FrameRGBA {
        FrameRGBA {
            width: self.width,
            height: self.height,
            data: self.rgba8_premul.as_ref().clone(),
            premultiplied: true,
        }
    }
}

/// Decode encoded image bytes and convert to premultiplied RGBA8.
pub fn decode_image(bytes: &[u8]) -> TryOnResult<PreparedImage> {
    if bytes.is_empty() {
        return Err(TryOnError::validation("image bytes are empty"));
    }
    let dyn_img = image::load_from_memory(bytes).context("decode image from memory")?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();
    if width == 0 || height == 0 {
        return Err(TryOnError::validation("decoded image has zero size"));
    }

    let mut rgba8_premul = rgba.into_raw();
    premultiply_rgba8_in_place(&mut rgba8_premul);

    Ok(PreparedImage {
        width,
        height,
        rgba8_premul: Arc::new(rgba8_premul),
    })
}

/// Encode a surface as PNG (straight alpha, RGBA8).
pub fn encode_png(frame: &FrameRGBA) -> TryOnResult<Vec<u8>> {
    let expected = frame
        .canvas()
        .byte_len()
        .map_err(|e| TryOnError::encode(e.to_string()))?;
    if frame.data.len() != expected {
        return Err(TryOnError::encode(format!(
            "surface has {} bytes, expected {expected}",
            frame.data.len()
        )));
    }

    let straight = frame.to_straight_rgba8();
    let img = image::RgbaImage::from_raw(frame.width, frame.height, straight)
        .ok_or_else(|| TryOnError::encode("surface does not match its dimensions"))?;

    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .map_err(|e| TryOnError::encode(format!("png encode failed: {e}")))?;
    Ok(buf)
}

/// Guess the container format from its magic bytes.
pub fn sniff_format(bytes: &[u8]) -> Option<image::ImageFormat> {
    image::guess_format(bytes).ok()
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;
