use crate::foundation::{
    core::{Canvas, Rect},
    error::{TryOnError, TryOnResult},
};

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
/// Where the overlay goes, as fractions of the base image.
pub struct PlacementParams {
    /// Overlay width as a fraction of base width.
    pub width_ratio: f64,
    /// Top edge of the overlay as a fraction of base height.
    pub vertical_offset_ratio: f64,
}

impl Default for PlacementParams {
    fn default() -> Self {
        Self {
            width_ratio: 0.55,
            vertical_offset_ratio: 0.22,
        }
    }
}

impl PlacementParams {
    pub fn validate(&self) -> TryOnResult<()> {
        if !self.width_ratio.is_finite() || self.width_ratio <= 0.0 || self.width_ratio > 4.0 {
            return Err(TryOnError::validation(format!(
                "width_ratio must be in (0, 4], got {}",
                self.width_ratio
            )));
        }
        if !self.vertical_offset_ratio.is_finite()
            || !(0.0..1.0).contains(&self.vertical_offset_ratio)
        {
            return Err(TryOnError::validation(format!(
                "vertical_offset_ratio must be in [0, 1), got {}",
                self.vertical_offset_ratio
            )));
        }
        Ok(())
    }
}

/// Overlay rectangle in base-image coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Placement {
    pub rect: Rect,
}

/// Integer rectangle actually rasterized. Width and height are at least one pixel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PixelRect {
    pub x: i64,
    pub y: i64,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    /// Right edge, exclusive.
    pub fn x1(&self) -> i64 {
        self.x + i64::from(self.width)
    }

    /// Bottom edge, exclusive.
    pub fn y1(&self) -> i64 {
        self.y + i64::from(self.height)
    }

    /// Overlap of two rectangles, `None` when they do not touch.
    pub fn intersect(&self, other: &PixelRect) -> Option<PixelRect> {
        let x0 = self.x.max(other.x);
        let y0 = self.y.max(other.y);
        let x1 = self.x1().min(other.x1());
        let y1 = self.y1().min(other.y1());
        if x1 <= x0 || y1 <= y0 {
            return None;
        }
        Some(PixelRect {
            x: x0,
            y: y0,
            width: u32::try_from(x1 - x0).ok()?,
            height: u32::try_from(y1 - y0).ok()?,
        })
    }

    /// `canvas` grown by `pad_x`/`pad_y` on every side.
    pub fn around(canvas: Canvas, pad_x: u32, pad_y: u32) -> PixelRect {
        PixelRect {
            x: -i64::from(pad_x),
            y: -i64::from(pad_y),
            width: canvas.width.saturating_add(pad_x.saturating_mul(2)),
            height: canvas.height.saturating_add(pad_y.saturating_mul(2)),
        }
    }
}

impl Placement {
    pub fn x(&self) -> f64 {
        self.rect.x0
    }

    pub fn y(&self) -> f64 {
        self.rect.y0
    }

    pub fn width(&self) -> f64 {
        self.rect.width()
    }

    pub fn height(&self) -> f64 {
        self.rect.height()
    }

    pub fn pixel_rect(&self) -> PixelRect {
        let to_extent = |v: f64| v.round().clamp(1.0, f64::from(u32::MAX)) as u32;
        PixelRect {
            x: self.x().round() as i64,
            y: self.y().round() as i64,
            width: to_extent(self.width()),
            height: to_extent(self.height()),
        }
    }
}

/// Centered, aspect-preserving placement of `overlay` on `base`.
///
/// Always derived from the `base` passed in; callers must not reuse a result for a base of
/// a different size.
pub fn compute_placement(base: Canvas, overlay: Canvas, params: &PlacementParams) -> Placement {
    let base_w = f64::from(base.width);
    let base_h = f64::from(base.height);
    let width = base_w * params.width_ratio;
    let height = width * (f64::from(overlay.height) / f64::from(overlay.width.max(1)));
    let x = (base_w - width) / 2.0;
    let y = base_h * params.vertical_offset_ratio;

    Placement {
        rect: Rect::new(x, y, x + width, y + height),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/composite/layout.rs"]
mod tests;
