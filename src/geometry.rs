//! Pure rectangle and range math shared by the editors.
//!
//! Everything here is total: no state, no errors. Coordinates live in one
//! of two spaces, *natural* (original media pixels) and *display*
//! (rendered preview pixels), and the scaling functions map between them.

/// Axis-aligned rectangle, f64 so pointer math stays exact until commit.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RectF {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl RectF {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }
}

/// Width/height pair for a coordinate space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SizeF {
    pub width: f64,
    pub height: f64,
}

impl SizeF {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// True when either dimension is unusable for geometry.
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

/// Clamp `rect` into `bounds`, honoring a minimum size per axis.
///
/// Size is resolved before position: an over-sized request shrinks first
/// and is then repositioned, so the width and position clamps cannot
/// oscillate. Empty bounds collapse to a minimum rect at the origin.
pub fn clamp_rect(rect: RectF, bounds: SizeF, min_size: f64) -> RectF {
    if bounds.is_empty() {
        return RectF::new(0.0, 0.0, min_size, min_size);
    }
    let width = rect.width.max(min_size).min(bounds.width);
    let height = rect.height.max(min_size).min(bounds.height);
    let x = rect.x.min(bounds.width - width).max(0.0);
    let y = rect.y.min(bounds.height - height).max(0.0);
    RectF::new(x, y, width, height)
}

/// Map a display-space rect into natural space. A zero display dimension
/// yields the input unchanged (never divides by zero).
pub fn display_to_natural(rect: RectF, display: SizeF, natural: SizeF) -> RectF {
    if display.is_empty() {
        return rect;
    }
    let sx = natural.width / display.width;
    let sy = natural.height / display.height;
    RectF::new(rect.x * sx, rect.y * sy, rect.width * sx, rect.height * sy)
}

/// Map a natural-space rect into display space. Inverse of
/// [`display_to_natural`]; a zero natural dimension yields the input
/// unchanged.
pub fn natural_to_display(rect: RectF, display: SizeF, natural: SizeF) -> RectF {
    if natural.is_empty() {
        return rect;
    }
    let sx = display.width / natural.width;
    let sy = display.height / natural.height;
    RectF::new(rect.x * sx, rect.y * sy, rect.width * sx, rect.height * sy)
}

/// Scale a pointer delta from display space into natural space.
pub fn scale_delta(dx: f64, dy: f64, display: SizeF, natural: SizeF) -> (f64, f64) {
    if display.is_empty() {
        return (dx, dy);
    }
    (dx * natural.width / display.width, dy * natural.height / display.height)
}

/// Solve the dependent dimension of an aspect-locked rectangle.
///
/// `fixed / ratio` rounded to an integer and clamped to `[1, max_other]`.
/// Callers orient `ratio` so this is always a division: width → height
/// passes the ratio as-is, height → width passes its reciprocal.
pub fn solve_aspect_ratio(fixed: f64, ratio: f64, max_other: f64) -> u32 {
    if ratio <= 0.0 || !ratio.is_finite() {
        return 1;
    }
    let other = (fixed / ratio).round();
    other.clamp(1.0, max_other.max(1.0)) as u32
}
