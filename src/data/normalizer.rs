// ============================================================
// Layer 4 — Image Normalizer
// ============================================================
// Turns the strokes on the canvas into the small grayscale grid
// the classifier was trained on.
//
//   strokes
//      │  tight ink bounds, + padding, clipped to the canvas
//      ▼
//   square white canvas (side = longer edge of the region),
//   ink stamped black, content centred
//      │  triangle (bilinear) downscale
//      ▼
//   target-size bitmap, optionally inverted
//
// The square step keeps the digit's aspect ratio: a "1" stays
// thin instead of being stretched into a block.
//
// Reference: image crate documentation (imageops::resize)

use image::{imageops, imageops::FilterType, GrayImage, Luma};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::bitmap::{BitmapShape, NormalizedBitmap};
use crate::domain::drawing::{Drawing, Point, Rect, Stroke};

const WHITE: u8 = 255;

/// Upper bound on the intermediate square's side in pixels.
pub const MAX_SQUARE_SIDE: u32 = 4096;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizationError {
    #[error("the drawing has no ink inside the canvas")]
    EmptyDrawing,

    #[error("could not render the drawing: {0}")]
    RenderFailure(String),
}

/// Tunables for the rasterizer. Part of the app config.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizerSettings {
    /// Margin added around the ink bounds, in canvas pixels.
    pub padding: f32,

    /// Flip ink-on-white into light-on-dark. MNIST-style models
    /// expect the inverted polarity.
    pub invert: bool,
}

impl Default for NormalizerSettings {
    fn default() -> Self {
        Self { padding: 10.0, invert: true }
    }
}

/// Stateless rasterizer; cheap to clone into worker threads.
#[derive(Debug, Clone, Default)]
pub struct ImageNormalizer {
    settings: NormalizerSettings,
}

impl ImageNormalizer {
    pub fn new(settings: NormalizerSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> NormalizerSettings {
        self.settings
    }

    /// Rasterize `drawing` into a `target`-sized bitmap.
    pub fn normalize(
        &self,
        drawing: &Drawing,
        target:  BitmapShape,
    ) -> Result<NormalizedBitmap, NormalizationError> {
        if target.is_empty() {
            return Err(NormalizationError::RenderFailure(format!(
                "target shape {target} has no pixels"
            )));
        }

        let ink    = drawing.bounds().ok_or(NormalizationError::EmptyDrawing)?;
        let region = ink
            .inflate(self.settings.padding.max(0.0))
            .intersection(&drawing.canvas());
        if region.is_empty() {
            return Err(NormalizationError::EmptyDrawing);
        }

        let square = render_square(drawing, &region)?;
        // ink within `padding` of the canvas edge widens the region but stamps nothing
        if square.pixels().all(|p| p.0[0] == WHITE) {
            return Err(NormalizationError::EmptyDrawing);
        }

        let resized = imageops::resize(
            &square,
            target.width as u32,
            target.height as u32,
            FilterType::Triangle,
        );

        let mut pixels = resized.into_raw();
        if self.settings.invert {
            for p in pixels.iter_mut() {
                *p = WHITE - *p;
            }
        }

        let bitmap = NormalizedBitmap::from_pixels(target, pixels).ok_or_else(|| {
            NormalizationError::RenderFailure(format!("resampled buffer does not match {target}"))
        })?;

        tracing::debug!(
            "Normalized {} strokes from region {:.0}x{:.0} into {} (mean={:.1})",
            drawing.strokes().len(),
            region.width(),
            region.height(),
            target,
            bitmap.mean(),
        );
        Ok(bitmap)
    }
}

/// Render the strokes inside `region` black-on-white into a square
/// canvas with the region centred.
fn render_square(drawing: &Drawing, region: &Rect) -> Result<GrayImage, NormalizationError> {
    let side = region.width().max(region.height()).ceil().max(1.0) as u32;
    if side > MAX_SQUARE_SIDE {
        return Err(NormalizationError::RenderFailure(format!(
            "square side {side}px exceeds {MAX_SQUARE_SIDE}px"
        )));
    }

    let mut canvas = GrayImage::from_pixel(side, side, Luma([WHITE]));

    // canvas coordinate = square pixel coordinate - offset
    let placement = Placement {
        offset_x: (side as f32 - region.width()) / 2.0 - region.min_x,
        offset_y: (side as f32 - region.height()) / 2.0 - region.min_y,
        clip:     *region,
    };

    for stroke in drawing.strokes() {
        stamp_stroke(&mut canvas, stroke, &placement);
    }
    Ok(canvas)
}

struct Placement {
    offset_x: f32,
    offset_y: f32,
    clip:     Rect,
}

/// Stamp every segment of a stroke as a round-capped thick line
/// with a one-pixel anti-aliased edge.
fn stamp_stroke(canvas: &mut GrayImage, stroke: &Stroke, at: &Placement) {
    let points = stroke.points();
    match points {
        [] => {}
        [only] => stamp_segment(canvas, stroke, only, only, at),
        _ => {
            for pair in points.windows(2) {
                stamp_segment(canvas, stroke, &pair[0], &pair[1], at);
            }
        }
    }
}

fn stamp_segment(canvas: &mut GrayImage, stroke: &Stroke, a: &Point, b: &Point, at: &Placement) {
    let (ra, rb) = (stroke.radius_at(a), stroke.radius_at(b));
    let reach    = ra.max(rb) + 1.0;

    let (w, h) = canvas.dimensions();
    let x0 = ((a.x.min(b.x) - reach + at.offset_x).floor().max(0.0)) as u32;
    let y0 = ((a.y.min(b.y) - reach + at.offset_y).floor().max(0.0)) as u32;
    let x1 = ((a.x.max(b.x) + reach + at.offset_x).ceil().max(0.0) as u32).min(w);
    let y1 = ((a.y.max(b.y) + reach + at.offset_y).ceil().max(0.0) as u32).min(h);

    let (dx, dy) = (b.x - a.x, b.y - a.y);
    let len_sq   = dx * dx + dy * dy;

    for py in y0..y1 {
        for px in x0..x1 {
            // pixel centre, back in canvas coordinates
            let cx = px as f32 + 0.5 - at.offset_x;
            let cy = py as f32 + 0.5 - at.offset_y;
            if cx < at.clip.min_x || cx > at.clip.max_x || cy < at.clip.min_y || cy > at.clip.max_y {
                continue;
            }

            let t = if len_sq > 0.0 {
                (((cx - a.x) * dx + (cy - a.y) * dy) / len_sq).clamp(0.0, 1.0)
            } else {
                0.0
            };
            let (nx, ny) = (a.x + t * dx, a.y + t * dy);
            let dist     = ((cx - nx).powi(2) + (cy - ny).powi(2)).sqrt();
            let radius   = ra + (rb - ra) * t;

            let coverage = (radius + 0.5 - dist).clamp(0.0, 1.0);
            if coverage <= 0.0 {
                continue;
            }
            let ink   = WHITE - (coverage * WHITE as f32).round() as u8;
            let pixel = canvas.get_pixel_mut(px, py);
            pixel.0[0] = pixel.0[0].min(ink);
        }
    }
}
