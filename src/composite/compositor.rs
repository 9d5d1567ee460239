use std::sync::Arc;

use crate::{
    assets::{
        decode::{PreparedImage, decode_image, encode_png},
        source::{DefaultImageLoader, ImageLoader, ImageSource},
    },
    composite::{
        blend::{BlendMode, Layer, blend_layer_in_place},
        layout::{PixelRect, Placement, PlacementParams, compute_placement},
        shadow::{DropShadow, ShadowLayer, build_shadow},
    },
    foundation::{
        core::{Canvas, FrameRGBA},
        error::{TryOnError, TryOnResult},
    },
};

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
/// One draw of the scaled overlay onto the surface.
pub struct BlendPass {
    pub mode: BlendMode,
    pub opacity: f32,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
/// How the overlay is merged with the base: an optional shadow, then the passes in order.
pub struct CompositeStyle {
    pub shadow: Option<DropShadow>,
    pub passes: Vec<BlendPass>,
}

impl Default for CompositeStyle {
    fn default() -> Self {
        Self {
            shadow: Some(DropShadow::default()),
            passes: vec![
                BlendPass {
                    mode: BlendMode::Normal,
                    opacity: 0.9,
                },
                BlendPass {
                    mode: BlendMode::Multiply,
                    opacity: 0.25,
                },
            ],
        }
    }
}

impl CompositeStyle {
    /// A single normal pass at the given opacity, no shadow.
    pub fn flat(opacity: f32) -> Self {
        Self {
            shadow: None,
            passes: vec![BlendPass {
                mode: BlendMode::Normal,
                opacity,
            }],
        }
    }

    pub fn validate(&self) -> TryOnResult<()> {
        if self.passes.is_empty() {
            return Err(TryOnError::validation(
                "composite style needs at least one blend pass",
            ));
        }
        for (i, pass) in self.passes.iter().enumerate() {
            if !pass.opacity.is_finite() || !(0.0..=1.0).contains(&pass.opacity) {
                return Err(TryOnError::validation(format!(
                    "blend pass {i} opacity must be in [0, 1], got {}",
                    pass.opacity
                )));
            }
        }
        if let Some(shadow) = &self.shadow
            && shadow.blur_radius > 256
        {
            return Err(TryOnError::validation(
                "shadow blur_radius must be <= 256",
            ));
        }
        Ok(())
    }
}

/// Upper bound on resampled overlay pixels held for one frame.
pub const MAX_SCALED_PIXELS: u64 = 64 * 1024 * 1024;

/// Overlay pixels scaled for one particular base size, ready to draw.
///
/// Only the part of the placement that can reach the surface is resampled: `window` is that
/// part, in base coordinates, and `scaled` holds exactly its pixels. A placement lying
/// wholly off the surface has no window and draws nothing.
#[derive(Clone, Debug)]
pub struct PreparedOverlay {
    pub base: Canvas,
    pub placement: Placement,
    pub pixel_rect: PixelRect,
    pub window: Option<PixelRect>,
    pub scaled: Arc<Vec<u8>>,
    pub shadow: Option<Arc<ShadowLayer>>,
}

/// Compute the placement for `base` and resample the overlay (and its shadow) to it.
pub fn prepare_overlay(
    base: Canvas,
    overlay: &PreparedImage,
    params: &PlacementParams,
    style: &CompositeStyle,
) -> TryOnResult<PreparedOverlay> {
    let placement = compute_placement(base, overlay.canvas(), params);
    let pixel_rect = placement.pixel_rect();

    // Shadow pixels come from overlay pixels up to offset + blur away from the surface.
    let (pad_x, pad_y) = style.shadow.as_ref().map_or((0, 0), |s| {
        (
            s.blur_radius.saturating_add(s.offset_x.unsigned_abs()),
            s.blur_radius.saturating_add(s.offset_y.unsigned_abs()),
        )
    });
    let window = pixel_rect.intersect(&PixelRect::around(base, pad_x, pad_y));

    let Some(win) = window else {
        tracing::debug!(?pixel_rect, "overlay placed off the surface");
        return Ok(PreparedOverlay {
            base,
            placement,
            pixel_rect,
            window: None,
            scaled: Arc::new(Vec::new()),
            shadow: None,
        });
    };
    if u64::from(win.width) * u64::from(win.height) > MAX_SCALED_PIXELS {
        return Err(TryOnError::overlay_load(format!(
            "overlay would cover {}x{} pixels",
            win.width, win.height
        )));
    }

    let scaled = scale_window(overlay, pixel_rect, win)?;
    let shadow = match &style.shadow {
        Some(s) => Some(Arc::new(build_shadow(&scaled, win.width, win.height, s)?)),
        None => None,
    };

    Ok(PreparedOverlay {
        base,
        placement,
        pixel_rect,
        window,
        scaled: Arc::new(scaled),
        shadow,
    })
}

/// Draw a prepared overlay onto `surface`: shadow first, then each blend pass.
pub fn draw_overlay(
    surface: &mut FrameRGBA,
    prepared: &PreparedOverlay,
    style: &CompositeStyle,
) -> TryOnResult<()> {
    if surface.canvas() != prepared.base {
        return Err(TryOnError::validation(format!(
            "overlay prepared for {}x{} but surface is {}x{}",
            prepared.base.width, prepared.base.height, surface.width, surface.height
        )));
    }

    let Some(r) = prepared.window else {
        return Ok(());
    };
    if let Some(shadow) = &prepared.shadow {
        blend_layer_in_place(
            surface,
            Layer {
                width: shadow.width,
                height: shadow.height,
                rgba8_premul: shadow.rgba8_premul.as_slice(),
                x: r.x + shadow.dx,
                y: r.y + shadow.dy,
            },
            BlendMode::Normal,
            1.0,
        )?;
    }

    let layer = Layer {
        width: r.width,
        height: r.height,
        rgba8_premul: prepared.scaled.as_slice(),
        x: r.x,
        y: r.y,
    };
    for pass in &style.passes {
        blend_layer_in_place(surface, layer, pass.mode, pass.opacity)?;
    }
    Ok(())
}

/// Base drawn at origin at full size, overlay on top at its computed placement.
pub fn composite_frame(
    base: &PreparedImage,
    overlay: &PreparedImage,
    params: &PlacementParams,
    style: &CompositeStyle,
) -> TryOnResult<(FrameRGBA, Placement)> {
    let mut surface = base.to_frame();
    let prepared = prepare_overlay(surface.canvas(), overlay, params, style)?;
    draw_overlay(&mut surface, &prepared, style)?;
    Ok((surface, prepared.placement))
}

/// Resample the `win` part of `img` stretched over `full`.
///
/// When the window is the whole placement this is a plain resize. Otherwise only the source
/// span feeding the window is resized, at the same scale, and the window cut out of it.
fn scale_window(img: &PreparedImage, full: PixelRect, win: PixelRect) -> TryOnResult<Vec<u8>> {
    if win == full {
        return scale_premul(img, full.width, full.height);
    }
    let span_x = AxisSpan::new(img.width, full.width, win.x - full.x, win.width);
    let span_y = AxisSpan::new(img.height, full.height, win.y - full.y, win.height);
    if u64::from(span_x.dst_len) * u64::from(span_y.dst_len) > MAX_SCALED_PIXELS {
        return Err(TryOnError::overlay_load(format!(
            "overlay resample span {}x{} is too large",
            span_x.dst_len, span_y.dst_len
        )));
    }

    let view = image::ImageBuffer::<image::Rgba<u8>, Vec<u8>>::from_raw(
        img.width,
        img.height,
        img.rgba8_premul.to_vec(),
    )
    .ok_or_else(|| TryOnError::validation("overlay buffer does not match its dimensions"))?;
    let crop = image::imageops::crop_imm(
        &view,
        span_x.src_start,
        span_y.src_start,
        span_x.src_len,
        span_y.src_len,
    )
    .to_image();
    let resized = image::imageops::resize(
        &crop,
        span_x.dst_len,
        span_y.dst_len,
        image::imageops::FilterType::Triangle,
    );

    let (ww, wh) = (win.width as usize, win.height as usize);
    let mut out = vec![0u8; ww * wh * 4];
    for row in 0..wh {
        let Some(sy) = span_y.local(row) else {
            continue;
        };
        for col in 0..ww {
            let Some(sx) = span_x.local(col) else {
                continue;
            };
            let idx = (row * ww + col) * 4;
            out[idx..idx + 4].copy_from_slice(&resized.get_pixel(sx, sy).0);
        }
    }
    Ok(out)
}

/// Source pixels feeding one axis of a window, and where their resized copy lands.
#[derive(Clone, Copy, Debug)]
struct AxisSpan {
    src_start: u32,
    src_len: u32,
    /// Offset of the resized span from the window start, in destination pixels.
    lead: i64,
    dst_len: u32,
}

impl AxisSpan {
    /// `src` source pixels stretched over `dst`; the window covers `len` pixels from `offset`.
    fn new(src: u32, dst: u32, offset: i64, len: u32) -> Self {
        let scale = f64::from(src) / f64::from(dst);
        let v0 = offset as f64;
        let v1 = v0 + f64::from(len);
        let c0 = ((v0 * scale).floor().max(0.0) as u32).min(src.saturating_sub(1));
        let c1 = ((v1 * scale).ceil() as u32).clamp(c0 + 1, src);
        let inv = f64::from(dst) / f64::from(src);
        let e0 = (f64::from(c0) * inv).round() as i64;
        let e1 = (f64::from(c1) * inv).round() as i64;
        Self {
            src_start: c0,
            src_len: c1 - c0,
            lead: e0 - offset,
            dst_len: u32::try_from((e1 - e0).max(1)).unwrap_or(u32::MAX),
        }
    }

    /// Index into the resized span for window pixel `i`, if it has one.
    fn local(&self, i: usize) -> Option<u32> {
        let v = i as i64 - self.lead;
        (0..i64::from(self.dst_len))
            .contains(&v)
            .then(|| v as u32)
    }
}

fn scale_premul(img: &PreparedImage, width: u32, height: u32) -> TryOnResult<Vec<u8>> {
    if img.width == width && img.height == height {
        return Ok(img.rgba8_premul.as_ref().clone());
    }
    let view = image::ImageBuffer::<image::Rgba<u8>, &[u8]>::from_raw(
        img.width,
        img.height,
        img.rgba8_premul.as_slice(),
    )
    .ok_or_else(|| TryOnError::validation("overlay buffer does not match its dimensions"))?;
    let scaled = image::imageops::resize(&view, width, height, image::imageops::FilterType::Triangle);
    Ok(scaled.into_raw())
}

/// Output of one static try-on.
#[derive(Clone, Debug)]
pub struct CompositeResult {
    /// Composited surface, same size as the base image.
    pub frame: FrameRGBA,
    pub placement: Placement,
    /// Lossless encoding of `frame`, for preview and download.
    pub png: Vec<u8>,
}

/// Composites one person photo with one clothing image.
///
/// Every call starts from scratch: the previous result is dropped before any input is
/// checked, so a failed call never leaves a stale preview behind.
pub struct StaticCompositor {
    params: PlacementParams,
    style: CompositeStyle,
    loader: Arc<dyn ImageLoader>,
    output: Option<CompositeResult>,
}

impl std::fmt::Debug for StaticCompositor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticCompositor")
            .field("params", &self.params)
            .field("style", &self.style)
            .field("has_output", &self.output.is_some())
            .finish()
    }
}

impl StaticCompositor {
    pub fn new(params: PlacementParams, style: CompositeStyle) -> TryOnResult<Self> {
        params.validate()?;
        style.validate()?;
        Ok(Self {
            params,
            style,
            loader: Arc::new(DefaultImageLoader::new()),
            output: None,
        })
    }

    pub fn with_loader(mut self, loader: Arc<dyn ImageLoader>) -> Self {
        self.loader = loader;
        self
    }

    pub fn params(&self) -> &PlacementParams {
        &self.params
    }

    pub fn style(&self) -> &CompositeStyle {
        &self.style
    }

    pub fn output(&self) -> Option<&CompositeResult> {
        self.output.as_ref()
    }

    pub fn clear(&mut self) {
        self.output = None;
    }

    #[tracing::instrument(skip_all)]
    pub fn compose(
        &mut self,
        base: Option<&ImageSource>,
        overlay: Option<&ImageSource>,
    ) -> TryOnResult<&CompositeResult> {
        self.output = None;

        let (base, overlay) = match (base, overlay) {
            (Some(b), Some(o)) => (b, o),
            (None, None) => {
                return Err(TryOnError::missing_input(
                    "both person and clothing images are required",
                ));
            }
            (None, Some(_)) => return Err(TryOnError::missing_input("person image is required")),
            (Some(_), None) => {
                return Err(TryOnError::missing_input("clothing image is required"));
            }
        };

        // The surface is sized from the decoded base before the overlay is even fetched.
        let base_img = self
            .loader
            .load(base)
            .and_then(|bytes| decode_image(&bytes))
            .map_err(TryOnError::into_base_load)?;
        let mut surface = base_img.to_frame();
        tracing::debug!(
            width = surface.width,
            height = surface.height,
            base = %base.describe(),
            "base decoded"
        );

        let overlay_img = self
            .loader
            .load(overlay)
            .and_then(|bytes| decode_image(&bytes))
            .map_err(TryOnError::into_overlay_load)?;

        let prepared = prepare_overlay(surface.canvas(), &overlay_img, &self.params, &self.style)?;
        draw_overlay(&mut surface, &prepared, &self.style)?;
        let png = encode_png(&surface)?;

        tracing::info!(
            x = prepared.pixel_rect.x,
            y = prepared.pixel_rect.y,
            w = prepared.pixel_rect.width,
            h = prepared.pixel_rect.height,
            png_bytes = png.len(),
            "composite ready"
        );

        Ok(&*self.output.insert(CompositeResult {
            frame: surface,
            placement: prepared.placement,
            png,
        }))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/composite/compositor.rs"]
mod tests;
