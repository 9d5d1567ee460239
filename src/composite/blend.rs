use rayon::prelude::*;

use crate::foundation::{
    core::FrameRGBA,
    error::{TryOnError, TryOnResult},
};

pub type PremulRgba8 = [u8; 4];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
/// Separable blend mode used when drawing a layer onto a surface.
pub enum BlendMode {
    /// Source over destination.
    Normal,
    /// Darkens: fabric texture picks up the shading of the photo underneath.
    Multiply,
    /// Lightens: inverse of multiply.
    Screen,
}

pub fn over(dst: PremulRgba8, src: PremulRgba8, opacity: f32) -> PremulRgba8 {
    blend(dst, src, BlendMode::Normal, opacity)
}

/// Blend one premultiplied pixel onto another.
///
/// `opacity` scales the source before blending; an opacity of 0 or a fully transparent
/// source leaves `dst` untouched.
pub fn blend(dst: PremulRgba8, src: PremulRgba8, mode: BlendMode, opacity: f32) -> PremulRgba8 {
    let opacity = opacity.clamp(0.0, 1.0);
    if opacity <= 0.0 || src[3] == 0 {
        return dst;
    }

    let op = ((opacity * 255.0).round() as i32).clamp(0, 255) as u16;
    let sa = mul_div255(u16::from(src[3]), op);
    if sa == 0 {
        return dst;
    }

    let inv_sa = 255u16 - u16::from(sa);
    let inv_da = 255u16 - u16::from(dst[3]);

    let mut out = [0u8; 4];
    out[3] = add_sat_u8(sa, mul_div255(u16::from(dst[3]), inv_sa));

    for i in 0..3 {
        let sc = mul_div255(u16::from(src[i]), op);
        let dc = dst[i];
        out[i] = match mode {
            BlendMode::Normal => add_sat_u8(sc, mul_div255(u16::from(dc), inv_sa)),
            BlendMode::Multiply => {
                let both = u16::from(mul_div255(u16::from(sc), u16::from(dc)));
                let src_only = u16::from(mul_div255(u16::from(sc), inv_da));
                let dst_only = u16::from(mul_div255(u16::from(dc), inv_sa));
                (both + src_only + dst_only).min(255) as u8
            }
            BlendMode::Screen => {
                let sum = u16::from(sc) + u16::from(dc);
                let prod = u16::from(mul_div255(u16::from(sc), u16::from(dc)));
                sum.saturating_sub(prod).min(255) as u8
            }
        };
    }
    out
}

/// A premultiplied RGBA8 buffer positioned on a surface. The position may be negative or
/// extend past the surface edge; only the overlapping part is drawn.
#[derive(Clone, Copy, Debug)]
pub struct Layer<'a> {
    pub width: u32,
    pub height: u32,
    pub rgba8_premul: &'a [u8],
    pub x: i64,
    pub y: i64,
}

/// Blend `layer` onto `dst` row by row. Rows are independent, so the result is identical
/// regardless of how rayon splits the work.
pub fn blend_layer_in_place(
    dst: &mut FrameRGBA,
    layer: Layer<'_>,
    mode: BlendMode,
    opacity: f32,
) -> TryOnResult<()> {
    let layer_len = (layer.width as usize)
        .checked_mul(layer.height as usize)
        .and_then(|v| v.checked_mul(4))
        .ok_or_else(|| TryOnError::validation("layer buffer size overflow"))?;
    if layer.rgba8_premul.len() != layer_len {
        return Err(TryOnError::validation(
            "blend_layer_in_place expects layer matching width*height*4",
        ));
    }
    let dst_len = dst.canvas().byte_len()?;
    if dst.data.len() != dst_len {
        return Err(TryOnError::validation(
            "blend_layer_in_place expects surface matching width*height*4",
        ));
    }

    let (dw, dh) = (i64::from(dst.width), i64::from(dst.height));
    let x0 = layer.x.max(0);
    let y0 = layer.y.max(0);
    let x1 = (layer.x + i64::from(layer.width)).min(dw);
    let y1 = (layer.y + i64::from(layer.height)).min(dh);
    if x0 >= x1 || y0 >= y1 || opacity <= 0.0 {
        return Ok(());
    }

    let stride = dst.width as usize * 4;
    let layer_stride = layer.width as usize * 4;
    let span = (x1 - x0) as usize;
    let src_x = (x0 - layer.x) as usize;
    let rows = &mut dst.data[(y0 as usize) * stride..(y1 as usize) * stride];

    rows.par_chunks_mut(stride)
        .enumerate()
        .for_each(|(i, row)| {
            let src_y = (y0 - layer.y) as usize + i;
            let src_row = &layer.rgba8_premul[src_y * layer_stride..(src_y + 1) * layer_stride];
            let src_px = &src_row[src_x * 4..(src_x + span) * 4];
            let dst_px = &mut row[(x0 as usize) * 4..(x0 as usize + span) * 4];
            for (d, s) in dst_px.chunks_exact_mut(4).zip(src_px.chunks_exact(4)) {
                let out = blend([d[0], d[1], d[2], d[3]], [s[0], s[1], s[2], s[3]], mode, opacity);
                d.copy_from_slice(&out);
            }
        });

    Ok(())
}

pub(crate) fn mul_div255(x: u16, y: u16) -> u8 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u8
}

fn add_sat_u8(a: u8, b: u8) -> u8 {
    a.saturating_add(b)
}

#[cfg(test)]
#[path = "../../tests/unit/composite/blend.rs"]
mod tests;
