use crate::{
    composite::blend::mul_div255,
    foundation::error::{TryOnError, TryOnResult},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
/// Soft shadow drawn under the overlay, offset from it and blurred.
pub struct DropShadow {
    pub offset_x: i32,
    pub offset_y: i32,
    pub blur_radius: u32,
    /// Straight (non-premultiplied) RGBA; alpha sets the shadow strength.
    pub color: [u8; 4],
}

impl Default for DropShadow {
    fn default() -> Self {
        Self {
            offset_x: 0,
            offset_y: 6,
            blur_radius: 8,
            color: [0, 0, 0, 89],
        }
    }
}

/// Shadow pixels plus where they sit relative to the overlay's top-left corner.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShadowLayer {
    pub width: u32,
    pub height: u32,
    pub rgba8_premul: Vec<u8>,
    pub dx: i64,
    pub dy: i64,
}

/// Build the blurred silhouette of an overlay. The layer is padded by the blur radius on
/// each side so the falloff is not cut at the overlay edge.
pub fn build_shadow(
    overlay_premul: &[u8],
    width: u32,
    height: u32,
    shadow: &DropShadow,
) -> TryOnResult<ShadowLayer> {
    let expected = (width as usize)
        .checked_mul(height as usize)
        .and_then(|v| v.checked_mul(4))
        .ok_or_else(|| TryOnError::validation("shadow buffer size overflow"))?;
    if overlay_premul.len() != expected {
        return Err(TryOnError::validation(
            "build_shadow expects overlay matching width*height*4",
        ));
    }

    let pad = shadow.blur_radius;
    let pw = width
        .checked_add(pad * 2)
        .ok_or_else(|| TryOnError::validation("shadow width overflow"))?;
    let ph = height
        .checked_add(pad * 2)
        .ok_or_else(|| TryOnError::validation("shadow height overflow"))?;

    let [cr, cg, cb, ca] = shadow.color;
    let mut mask = vec![0u8; pw as usize * ph as usize * 4];
    for y in 0..height as usize {
        for x in 0..width as usize {
            let sa = overlay_premul[(y * width as usize + x) * 4 + 3];
            if sa == 0 {
                continue;
            }
            let a = mul_div255(u16::from(sa), u16::from(ca));
            let idx = ((y + pad as usize) * pw as usize + (x + pad as usize)) * 4;
            mask[idx] = mul_div255(u16::from(cr), u16::from(a));
            mask[idx + 1] = mul_div255(u16::from(cg), u16::from(a));
            mask[idx + 2] = mul_div255(u16::from(cb), u16::from(a));
            mask[idx + 3] = a;
        }
    }

    let sigma = (shadow.blur_radius as f32 / 2.0).max(0.5);
    let rgba8_premul = blur_rgba8_premul(&mask, pw, ph, shadow.blur_radius, sigma)?;

    Ok(ShadowLayer {
        width: pw,
        height: ph,
        rgba8_premul,
        dx: i64::from(shadow.offset_x) - i64::from(pad),
        dy: i64::from(shadow.offset_y) - i64::from(pad),
    })
}

/// Separable gaussian blur over premultiplied RGBA8 with clamped edges.
pub fn blur_rgba8_premul(
    src: &[u8],
    width: u32,
    height: u32,
    radius: u32,
    sigma: f32,
) -> TryOnResult<Vec<u8>> {
    let expected_len = (width as usize)
        .checked_mul(height as usize)
        .and_then(|v| v.checked_mul(4))
        .ok_or_else(|| TryOnError::validation("blur buffer size overflow"))?;
    if src.len() != expected_len {
        return Err(TryOnError::validation(
            "blur_rgba8_premul expects src matching width*height*4",
        ));
    }
    if radius == 0 || width == 0 || height == 0 {
        return Ok(src.to_vec());
    }

    let kernel = gaussian_kernel_q16(radius, sigma)?;
    let mut tmp = vec![0u8; expected_len];
    let mut out = vec![0u8; expected_len];

    horizontal_pass(src, &mut tmp, width, height, &kernel);
    vertical_pass(&tmp, &mut out, width, height, &kernel);
    Ok(out)
}

fn gaussian_kernel_q16(radius: u32, sigma: f32) -> TryOnResult<Vec<u32>> {
    if !sigma.is_finite() || sigma <= 0.0 {
        return Err(TryOnError::validation("blur sigma must be > 0"));
    }

    let r = radius as i32;
    let sigma = f64::from(sigma);
    let denom = 2.0 * sigma * sigma;
    let weights_f: Vec<f64> = (-r..=r)
        .map(|i| {
            let x = f64::from(i);
            (-x * x / denom).exp()
        })
        .collect();
    let sum: f64 = weights_f.iter().sum();
    if sum <= 0.0 {
        return Err(TryOnError::validation("gaussian kernel sum is zero"));
    }

    let mut weights: Vec<u32> = weights_f
        .iter()
        .map(|wf| ((wf / sum) * 65536.0).round().clamp(0.0, 65536.0) as u32)
        .collect();

    // Quantization drift goes into the center tap so the kernel sums to exactly 1.0.
    let acc: i64 = weights.iter().map(|&w| i64::from(w)).sum();
    let delta = 65536 - acc;
    if delta != 0 {
        let mid = weights.len() / 2;
        weights[mid] = (i64::from(weights[mid]) + delta).clamp(0, 65536) as u32;
    }

    Ok(weights)
}

fn horizontal_pass(src: &[u8], dst: &mut [u8], width: u32, height: u32, k: &[u32]) {
    let radius = (k.len() / 2) as i32;
    let w = width as i32;
    for y in 0..height as i32 {
        for x in 0..w {
            let mut acc = [0u64; 4];
            for (ki, &kw) in k.iter().enumerate() {
                let sx = (x + ki as i32 - radius).clamp(0, w - 1);
                let idx = ((y * w + sx) as usize) * 4;
                for c in 0..4 {
                    acc[c] += u64::from(kw) * u64::from(src[idx + c]);
                }
            }
            let out_idx = ((y * w + x) as usize) * 4;
            for c in 0..4 {
                dst[out_idx + c] = q16_to_u8(acc[c]);
            }
        }
    }
}

fn vertical_pass(src: &[u8], dst: &mut [u8], width: u32, height: u32, k: &[u32]) {
    let radius = (k.len() / 2) as i32;
    let w = width as i32;
    let h = height as i32;
    for y in 0..h {
        for x in 0..w {
            let mut acc = [0u64; 4];
            for (ki, &kw) in k.iter().enumerate() {
                let sy = (y + ki as i32 - radius).clamp(0, h - 1);
                let idx = ((sy * w + x) as usize) * 4;
                for c in 0..4 {
                    acc[c] += u64::from(kw) * u64::from(src[idx + c]);
                }
            }
            let out_idx = ((y * w + x) as usize) * 4;
            for c in 0..4 {
                dst[out_idx + c] = q16_to_u8(acc[c]);
            }
        }
    }
}

fn q16_to_u8(v: u64) -> u8 {
    ((v + (1 << 15)) >> 16).min(255) as u8
}

#[cfg(test)]
#[path = "../../tests/unit/composite/shadow.rs"]
mod tests;
