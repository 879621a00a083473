// ============================================================
// Layer 3 — Drawing Domain Types
// ============================================================
// A Drawing is what the child has written on the canvas for
// the current attempt: a list of committed strokes plus the
// bounds of the capture surface they were drawn on.
//
// Coordinates are canvas pixels with the origin at the top-left
// corner, the same convention the rasterizer uses.

use serde::{Deserialize, Serialize};

/// Default canvas side in pixels (the writing box on screen).
pub const DEFAULT_CANVAS_SIDE: f32 = 200.0;

/// Default ink width in pixels (a marker sized for a finger).
pub const DEFAULT_STROKE_WIDTH: f32 = 30.0;

/// One sampled touch position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,

    /// Touch pressure in [0, 1]; scales the ink width.
    #[serde(default = "full_pressure")]
    pub pressure: f32,
}

fn full_pressure() -> f32 {
    1.0
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y, pressure: 1.0 }
    }

    pub fn with_pressure(x: f32, y: f32, pressure: f32) -> Self {
        Self { x, y, pressure: pressure.clamp(0.0, 1.0) }
    }
}

/// Axis-aligned rectangle in canvas pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
}

impl Rect {
    pub fn new(min_x: f32, min_y: f32, max_x: f32, max_y: f32) -> Self {
        Self { min_x, min_y, max_x, max_y }
    }

    /// Rectangle anchored at the origin with the given size.
    pub fn from_size(width: f32, height: f32) -> Self {
        Self::new(0.0, 0.0, width, height)
    }

    pub fn width(&self) -> f32 {
        (self.max_x - self.min_x).max(0.0)
    }

    pub fn height(&self) -> f32 {
        (self.max_y - self.min_y).max(0.0)
    }

    pub fn is_empty(&self) -> bool {
        self.width() <= 0.0 || self.height() <= 0.0
    }

    /// Grow (or shrink, for negative values) on every side.
    pub fn inflate(&self, by: f32) -> Self {
        Self::new(self.min_x - by, self.min_y - by, self.max_x + by, self.max_y + by)
    }

    /// Overlap of two rectangles; empty if they don't touch.
    pub fn intersection(&self, other: &Rect) -> Rect {
        Rect::new(
            self.min_x.max(other.min_x),
            self.min_y.max(other.min_y),
            self.max_x.min(other.max_x),
            self.max_y.min(other.max_y),
        )
    }

    /// Smallest rectangle containing both.
    pub fn union(&self, other: &Rect) -> Rect {
        Rect::new(
            self.min_x.min(other.min_x),
            self.min_y.min(other.min_y),
            self.max_x.max(other.max_x),
            self.max_y.max(other.max_y),
        )
    }
}

/// One continuous touch-drag path. Immutable once committed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    points: Vec<Point>,

    /// Ink diameter at full pressure, in canvas pixels.
    #[serde(default = "default_width")]
    width: f32,
}

fn default_width() -> f32 {
    DEFAULT_STROKE_WIDTH
}

impl Stroke {
    pub fn new(points: Vec<Point>, width: f32) -> Self {
        Self { points, width: width.max(0.0) }
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    /// Ink radius at a given point.
    pub fn radius_at(&self, point: &Point) -> f32 {
        self.width * point.pressure * 0.5
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Bounds of the inked area, including the ink radius.
    /// None for a stroke with no points.
    pub fn bounds(&self) -> Option<Rect> {
        self.points
            .iter()
            .map(|p| {
                let r = self.radius_at(p);
                Rect::new(p.x - r, p.y - r, p.x + r, p.y + r)
            })
            .reduce(|acc, r| acc.union(&r))
    }
}

/// Everything written for the current answer attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct Drawing {
    /// The capture surface the strokes were drawn on.
    canvas: Rect,
    strokes: Vec<Stroke>,
}

impl Default for Drawing {
    fn default() -> Self {
        Self::new(Rect::from_size(DEFAULT_CANVAS_SIDE, DEFAULT_CANVAS_SIDE))
    }
}

impl Drawing {
    pub fn new(canvas: Rect) -> Self {
        Self { canvas, strokes: Vec::new() }
    }

    pub fn with_strokes(canvas: Rect, strokes: Vec<Stroke>) -> Self {
        let mut drawing = Self::new(canvas);
        for s in strokes {
            drawing.commit(s);
        }
        drawing
    }

    /// Add a finished stroke. Strokes without points carry no ink
    /// and are dropped.
    pub fn commit(&mut self, stroke: Stroke) {
        if !stroke.is_empty() {
            self.strokes.push(stroke);
        }
    }

    pub fn clear(&mut self) {
        self.strokes.clear();
    }

    pub fn canvas(&self) -> Rect {
        self.canvas
    }

    pub fn strokes(&self) -> &[Stroke] {
        &self.strokes
    }

    pub fn is_empty(&self) -> bool {
        self.strokes.is_empty()
    }

    /// Tight bounds of all ink, or None when nothing is drawn.
    pub fn bounds(&self) -> Option<Rect> {
        self.strokes
            .iter()
            .filter_map(Stroke::bounds)
            .reduce(|acc, r| acc.union(&r))
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_drawing_has_no_bounds() {
        let d = Drawing::default();
        assert!(d.is_empty());
        assert!(d.bounds().is_none());
    }

    #[test]
    fn test_bounds_include_ink_radius() {
        let mut d = Drawing::default();
        d.commit(Stroke::new(vec![Point::new(50.0, 60.0), Point::new(70.0, 90.0)], 10.0));
        let b = d.bounds().unwrap();
        assert_eq!(b, Rect::new(45.0, 55.0, 75.0, 95.0));
    }

    #[test]
    fn test_pointless_strokes_are_dropped() {
        let mut d = Drawing::default();
        d.commit(Stroke::new(Vec::new(), 10.0));
        assert!(d.is_empty());
    }

    #[test]
    fn test_intersection_of_disjoint_rects_is_empty() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(20.0, 20.0, 30.0, 30.0);
        assert!(a.intersection(&b).is_empty());
    }

    #[test]
    fn test_stroke_json_defaults() {
        let json   = r#"{"points": [{"x": 10, "y": 20}]}"#;
        let stroke: Stroke = serde_json::from_str(json).unwrap();
        assert_eq!(stroke.width(), DEFAULT_STROKE_WIDTH);
        assert_eq!(stroke.points()[0].pressure, 1.0);
    }
}
