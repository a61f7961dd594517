//! Crop region editor: an interactive rectangle over the video frame.
//!
//! The rectangle lives in *natural* pixels; pointer input arrives in
//! *display* pixels and is scaled through the geometry helpers. A pointer
//! gesture (drag or resize) is tracked as its own small session state
//! machine, independent of the network-driven pipeline stages, so the
//! hosting layer can feed it raw pointer deltas and stay responsive.
//!
//! Numeric field edits are validated softly: a violation produces a
//! field-level issue and withholds emission, but never blocks other
//! fields from updating. Submit-time validation is the hard gate.

use crate::constants::{DEFAULT_VISUAL_CROP_FRACTION, MIN_CROP_DIMENSION};
use crate::geometry::{clamp_rect, natural_to_display, scale_delta, solve_aspect_ratio, RectF, SizeF};
use crate::state::CropRegion;

/// Which edge(s) of the rectangle a resize grabs. Compound handles adjust
/// both axes they name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeHandle {
    N,
    S,
    E,
    W,
    Ne,
    Nw,
    Se,
    Sw,
}

impl ResizeHandle {
    fn grabs_north(self) -> bool {
        matches!(self, ResizeHandle::N | ResizeHandle::Ne | ResizeHandle::Nw)
    }

    fn grabs_south(self) -> bool {
        matches!(self, ResizeHandle::S | ResizeHandle::Se | ResizeHandle::Sw)
    }

    fn grabs_east(self) -> bool {
        matches!(self, ResizeHandle::E | ResizeHandle::Ne | ResizeHandle::Se)
    }

    fn grabs_west(self) -> bool {
        matches!(self, ResizeHandle::W | ResizeHandle::Nw | ResizeHandle::Sw)
    }
}

/// The kind of pointer gesture in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionKind {
    /// Translate the rectangle; size unchanged.
    Drag,
    /// Move the named edge(s); the opposite edge stays fixed.
    Resize(ResizeHandle),
}

/// Aspect-ratio behavior for numeric width/height edits.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AspectRatioMode {
    /// No coupling between the axes.
    Custom,
    /// Snap the region to the full natural frame.
    Original,
    /// Width/height ratio to maintain; editing one axis recomputes the
    /// other ("last edited axis wins").
    Fixed(f64),
}

/// Selectable ratio table, passed to hosts as plain data.
pub const ASPECT_RATIO_CHOICES: &[(&str, AspectRatioMode)] = &[
    ("Custom", AspectRatioMode::Custom),
    ("Original Video", AspectRatioMode::Original),
    ("16:9 (Widescreen)", AspectRatioMode::Fixed(16.0 / 9.0)),
    ("4:3 (Standard TV)", AspectRatioMode::Fixed(4.0 / 3.0)),
    ("1:1 (Square)", AspectRatioMode::Fixed(1.0)),
    ("3:2 (Photography)", AspectRatioMode::Fixed(3.0 / 2.0)),
    ("2:3 (Portrait)", AspectRatioMode::Fixed(2.0 / 3.0)),
    ("9:16 (Tall Portrait)", AspectRatioMode::Fixed(9.0 / 16.0)),
];

/// A numeric crop field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CropField {
    X,
    Y,
    Width,
    Height,
}

impl CropField {
    pub fn label(self) -> &'static str {
        match self {
            CropField::X => "X",
            CropField::Y => "Y",
            CropField::Width => "Width",
            CropField::Height => "Height",
        }
    }
}

/// Soft, field-scoped validation message. Shown inline; never an error.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldIssue {
    pub field: CropField,
    pub message: String,
}

/// Which axis the user touched last; the other one is the recompute
/// target under an aspect lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EditedAxis {
    Width,
    Height,
}

/// One pointer gesture, begin to end.
#[derive(Debug, Clone, PartialEq)]
struct InteractionSession {
    kind: InteractionKind,
    anchor: (f64, f64),
    initial: RectF,
}

/// Stateful crop rectangle editor. See the module docs for the model.
#[derive(Debug, Clone, PartialEq)]
pub struct CropRegionEditor {
    natural_width: u32,
    natural_height: u32,
    display: SizeF,
    region: Option<RectF>,
    aspect: AspectRatioMode,
    last_edited: Option<EditedAxis>,
    session: Option<InteractionSession>,
    issues: Vec<FieldIssue>,
}

impl Default for CropRegionEditor {
    fn default() -> Self {
        Self::new()
    }
}

impl CropRegionEditor {
    pub fn new() -> Self {
        Self {
            natural_width: 0,
            natural_height: 0,
            display: SizeF::default(),
            region: None,
            aspect: AspectRatioMode::Custom,
            last_edited: None,
            session: None,
            issues: Vec::new(),
        }
    }

    /// Adopt a new media frame. Clears the region (no crop), the aspect
    /// mode, any active gesture, and all issues.
    pub fn reset_for_media(&mut self, natural_width: u32, natural_height: u32) {
        self.natural_width = natural_width;
        self.natural_height = natural_height;
        self.region = None;
        self.aspect = AspectRatioMode::Custom;
        self.last_edited = None;
        self.session = None;
        self.issues.clear();
    }

    /// Record the rendered preview size; changes on every host resize.
    pub fn set_display_size(&mut self, width: f64, height: f64) {
        self.display = SizeF::new(width, height);
    }

    pub fn natural_size(&self) -> (u32, u32) {
        (self.natural_width, self.natural_height)
    }

    pub fn aspect_ratio(&self) -> AspectRatioMode {
        self.aspect
    }

    pub fn issues(&self) -> &[FieldIssue] {
        &self.issues
    }

    pub fn issue_for(&self, field: CropField) -> Option<&FieldIssue> {
        self.issues.iter().find(|issue| issue.field == field)
    }

    pub fn interaction_active(&self) -> bool {
        self.session.is_some()
    }

    fn natural(&self) -> SizeF {
        SizeF::new(self.natural_width as f64, self.natural_height as f64)
    }

    /// The rect edits operate on: the current region, or the full frame
    /// when no crop is set.
    fn working_rect(&self) -> RectF {
        self.region.unwrap_or_else(|| {
            RectF::new(0.0, 0.0, self.natural_width as f64, self.natural_height as f64)
        })
    }

    /// The committed crop, for mirroring into the conversion config.
    /// `None` means no crop: either nothing is set or the region covers
    /// the full frame at the origin.
    pub fn crop_region(&self) -> Option<CropRegion> {
        let rect = self.region?;
        // Round first, then clamp the integers: rounding a rect that
        // barely fits can otherwise land one pixel past the frame edge.
        let crop = CropRegion::from_rect(rect).clamped_to(self.natural_width, self.natural_height);
        if crop.covers_frame(self.natural_width, self.natural_height) {
            None
        } else {
            Some(crop)
        }
    }

    /// The current selection mapped into display space, for drawing the
    /// overlay rectangle over the preview.
    pub fn display_rect(&self) -> Option<RectF> {
        Some(natural_to_display(self.region?, self.display, self.natural()))
    }

    /// Seed a centered default selection (75% of the frame) when opening
    /// the visual cropper over an uncropped frame. No-op otherwise.
    pub fn seed_default_selection(&mut self) -> bool {
        if self.natural().is_empty() {
            return false;
        }
        if self.crop_region().is_some() || self.aspect != AspectRatioMode::Custom {
            return false;
        }
        let natural = self.natural();
        let width = natural.width * DEFAULT_VISUAL_CROP_FRACTION;
        let height = natural.height * DEFAULT_VISUAL_CROP_FRACTION;
        let rect = RectF::new(
            (natural.width - width) / 2.0,
            (natural.height - height) / 2.0,
            width,
            height,
        );
        self.region = Some(clamp_rect(rect, natural, MIN_CROP_DIMENSION));
        true
    }

    // =========================================================================
    // Numeric field edits
    // =========================================================================

    /// Apply a typed field value. The value is always recorded; issues
    /// are recomputed and emission (a clean `crop_region()`) only happens
    /// when no issue is present. Returns whether the edit is clean.
    pub fn set_field(&mut self, field: CropField, value: f64) -> bool {
        if self.natural().is_empty() || !value.is_finite() {
            return false;
        }
        let mut rect = self.working_rect();
        match field {
            CropField::X => rect.x = value,
            CropField::Y => rect.y = value,
            CropField::Width => {
                rect.width = value;
                self.last_edited = Some(EditedAxis::Width);
            }
            CropField::Height => {
                rect.height = value;
                self.last_edited = Some(EditedAxis::Height);
            }
        }
        self.apply_aspect_lock(&mut rect, field, value);
        self.issues = self.validate_rect(rect);
        self.region = Some(rect);
        self.issues.is_empty()
    }

    /// Under a fixed ratio, recompute the axis that was NOT just edited.
    /// The last-edited tag (not execution order) decides the direction,
    /// so width→height and height→width can never feed back into each
    /// other.
    fn apply_aspect_lock(&mut self, rect: &mut RectF, field: CropField, value: f64) {
        let AspectRatioMode::Fixed(ratio) = self.aspect else {
            return;
        };
        if ratio <= 0.0 || value < MIN_CROP_DIMENSION {
            return;
        }
        let natural = self.natural();
        match (field, self.last_edited) {
            (CropField::Width, Some(EditedAxis::Width)) => {
                let max_height = natural.height - rect.y.max(0.0);
                let height = solve_aspect_ratio(rect.width, ratio, max_height) as f64;
                rect.height = height.max(MIN_CROP_DIMENSION);
            }
            (CropField::Height, Some(EditedAxis::Height)) => {
                let max_width = natural.width - rect.x.max(0.0);
                let width = solve_aspect_ratio(rect.height, 1.0 / ratio, max_width) as f64;
                rect.width = width.max(MIN_CROP_DIMENSION);
            }
            _ => {}
        }
    }

    fn validate_rect(&self, rect: RectF) -> Vec<FieldIssue> {
        let natural = self.natural();
        let mut issues = Vec::new();

        let mut width_ok = true;
        if rect.width <= 0.0 {
            width_ok = false;
            issues.push(FieldIssue {
                field: CropField::Width,
                message: "Width must be a positive number.".to_string(),
            });
        } else if rect.width < MIN_CROP_DIMENSION {
            width_ok = false;
            issues.push(FieldIssue {
                field: CropField::Width,
                message: format!("Width must be at least {}px.", MIN_CROP_DIMENSION as u32),
            });
        } else if rect.width > natural.width {
            width_ok = false;
            issues.push(FieldIssue {
                field: CropField::Width,
                message: format!("Width cannot exceed video width ({}px).", self.natural_width),
            });
        }

        let mut height_ok = true;
        if rect.height <= 0.0 {
            height_ok = false;
            issues.push(FieldIssue {
                field: CropField::Height,
                message: "Height must be a positive number.".to_string(),
            });
        } else if rect.height < MIN_CROP_DIMENSION {
            height_ok = false;
            issues.push(FieldIssue {
                field: CropField::Height,
                message: format!("Height must be at least {}px.", MIN_CROP_DIMENSION as u32),
            });
        } else if rect.height > natural.height {
            height_ok = false;
            issues.push(FieldIssue {
                field: CropField::Height,
                message: format!("Height cannot exceed video height ({}px).", self.natural_height),
            });
        }

        if rect.x < 0.0 {
            issues.push(FieldIssue {
                field: CropField::X,
                message: "X offset must be a non-negative number.".to_string(),
            });
        } else if width_ok && rect.x + rect.width > natural.width + 0.5 {
            issues.push(FieldIssue {
                field: CropField::X,
                message: format!("X + Width exceeds video width ({}px).", self.natural_width),
            });
        }

        if rect.y < 0.0 {
            issues.push(FieldIssue {
                field: CropField::Y,
                message: "Y offset must be a non-negative number.".to_string(),
            });
        } else if height_ok && rect.y + rect.height > natural.height + 0.5 {
            issues.push(FieldIssue {
                field: CropField::Y,
                message: format!("Y + Height exceeds video height ({}px).", self.natural_height),
            });
        }

        issues
    }

    // =========================================================================
    // Aspect ratio
    // =========================================================================

    /// Switch the aspect mode. `Original` snaps the region to the full
    /// frame; a fixed ratio fits the largest centered rect of that ratio
    /// inside the frame; `Custom` just stops recomputation.
    pub fn set_aspect_ratio(&mut self, mode: AspectRatioMode) -> bool {
        self.aspect = mode;
        self.last_edited = None;
        let natural = self.natural();
        if natural.is_empty() {
            return false;
        }
        match mode {
            AspectRatioMode::Custom => false,
            AspectRatioMode::Original => {
                self.region = Some(RectF::new(0.0, 0.0, natural.width, natural.height));
                self.issues.clear();
                true
            }
            AspectRatioMode::Fixed(ratio) => {
                if ratio <= 0.0 || !ratio.is_finite() {
                    return false;
                }
                self.region = Some(fit_ratio_rect(natural, ratio));
                self.issues.clear();
                true
            }
        }
    }

    // =========================================================================
    // Pointer interaction
    // =========================================================================

    /// Start a gesture at `pointer` (display coordinates). Rejected while
    /// another gesture is active, and while the frame or preview size is
    /// still unknown.
    pub fn begin_interaction(&mut self, kind: InteractionKind, pointer: (f64, f64)) -> bool {
        if self.session.is_some() {
            tracing::warn!("crop interaction already active; ignoring begin");
            return false;
        }
        if self.natural().is_empty() || self.display.is_empty() {
            return false;
        }
        self.session = Some(InteractionSession {
            kind,
            anchor: pointer,
            initial: self.working_rect(),
        });
        true
    }

    /// Feed a pointer move into the active gesture. The delta is taken
    /// against the gesture's anchor and initial rect, not the previous
    /// move, so jittery event streams stay stable.
    pub fn update_interaction(&mut self, pointer: (f64, f64)) -> bool {
        let Some(session) = self.session.clone() else {
            return false;
        };
        let (dx, dy) = scale_delta(
            pointer.0 - session.anchor.0,
            pointer.1 - session.anchor.1,
            self.display,
            self.natural(),
        );
        let rect = match session.kind {
            InteractionKind::Drag => {
                let initial = session.initial;
                RectF::new(initial.x + dx, initial.y + dy, initial.width, initial.height)
            }
            InteractionKind::Resize(handle) => resize_rect(session.initial, handle, dx, dy),
        };
        self.region = Some(clamp_rect(rect, self.natural(), MIN_CROP_DIMENSION));
        self.issues.clear();
        true
    }

    /// Finish the active gesture; the last committed rect stands.
    pub fn end_interaction(&mut self) -> bool {
        if self.session.take().is_none() {
            return false;
        }
        if let Some(rect) = self.region {
            self.region = Some(clamp_rect(rect, self.natural(), MIN_CROP_DIMENSION));
        }
        true
    }
}

/// Edge-based resize: far edges (e, s) change size in place, near edges
/// (w, n) move the origin by the inverse of the size delta so the
/// opposite edge stays fixed. Minimum size pins the moving edge.
fn resize_rect(initial: RectF, handle: ResizeHandle, dx: f64, dy: f64) -> RectF {
    let mut x = initial.x;
    let mut y = initial.y;
    let mut width = initial.width;
    let mut height = initial.height;

    if handle.grabs_east() {
        width = initial.width + dx;
    }
    if handle.grabs_west() {
        width = initial.width - dx;
        x = initial.x + dx;
    }
    if handle.grabs_south() {
        height = initial.height + dy;
    }
    if handle.grabs_north() {
        height = initial.height - dy;
        y = initial.y + dy;
    }

    if width < MIN_CROP_DIMENSION {
        if handle.grabs_west() {
            x = initial.x + initial.width - MIN_CROP_DIMENSION;
        }
        width = MIN_CROP_DIMENSION;
    }
    if height < MIN_CROP_DIMENSION {
        if handle.grabs_north() {
            y = initial.y + initial.height - MIN_CROP_DIMENSION;
        }
        height = MIN_CROP_DIMENSION;
    }

    RectF::new(x, y, width, height)
}

/// Largest centered rect of `ratio` (width / height) inside `natural`,
/// with rounding and minimum-size adjustments.
fn fit_ratio_rect(natural: SizeF, ratio: f64) -> RectF {
    let (mut width, mut height);
    if natural.width / natural.height > ratio {
        height = natural.height;
        width = (height * ratio).round();
    } else {
        width = natural.width;
        height = (width / ratio).round();
    }

    if width < MIN_CROP_DIMENSION {
        width = MIN_CROP_DIMENSION;
        height = (width / ratio).round();
    }
    if height < MIN_CROP_DIMENSION {
        height = MIN_CROP_DIMENSION;
        width = (height * ratio).round();
    }
    if width > natural.width {
        let scale = natural.width / width;
        width = natural.width;
        height = (height * scale).round();
    }
    if height > natural.height {
        let scale = natural.height / height;
        height = natural.height;
        width = (width * scale).round();
    }
    width = width.max(MIN_CROP_DIMENSION).min(natural.width);
    height = height.max(MIN_CROP_DIMENSION).min(natural.height);

    let x = ((natural.width - width) / 2.0).round().max(0.0);
    let y = ((natural.height - height) / 2.0).round().max(0.0);
    RectF::new(x, y, width, height)
}
