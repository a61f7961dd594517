//! Trim range editor: a dual-handle selector over the clip duration.
//!
//! Scene marks from analysis are carried as cosmetic snap hints only;
//! they never constrain the range.

use crate::state::TrimRange;

/// Maintains `{start, end}` against the media duration, re-clamping from
/// committed values on every mutation so rapid out-of-order calls can
/// never produce `start > end`.
#[derive(Debug, Clone, PartialEq)]
pub struct TrimRangeEditor {
    duration: f64,
    range: TrimRange,
    scene_marks: Vec<f64>,
}

impl Default for TrimRangeEditor {
    fn default() -> Self {
        Self::new()
    }
}

impl TrimRangeEditor {
    pub fn new() -> Self {
        Self {
            duration: 0.0,
            range: TrimRange::new(0.0, 0.0),
            scene_marks: Vec::new(),
        }
    }

    /// False while no usable duration is known; all mutations are
    /// rejected in that state.
    pub fn available(&self) -> bool {
        self.duration > 0.0
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn range(&self) -> TrimRange {
        self.range
    }

    /// Adopt a new media duration. Resets the range to `[0, duration]`
    /// unless `initial` is supplied and consistent with it. Fires only
    /// when the duration actually changes; returns whether it did.
    pub fn set_duration(&mut self, duration: f64, initial: Option<TrimRange>) -> bool {
        if duration == self.duration {
            return false;
        }
        self.duration = duration;
        self.scene_marks.clear();
        if duration <= 0.0 {
            self.range = TrimRange::new(0.0, 0.0);
            return true;
        }
        self.range = match initial {
            Some(range) if range.is_valid_for(duration) => range,
            _ => TrimRange::full(duration),
        };
        true
    }

    /// Adopt scene marks (seconds). Stored sorted; marks outside the clip
    /// are dropped.
    pub fn set_scene_marks(&mut self, marks: Vec<f64>) {
        let mut marks: Vec<f64> = marks
            .into_iter()
            .filter(|mark| mark.is_finite() && *mark >= 0.0 && *mark <= self.duration)
            .collect();
        marks.sort_by(|a, b| a.total_cmp(b));
        self.scene_marks = marks;
    }

    pub fn scene_marks(&self) -> &[f64] {
        &self.scene_marks
    }

    /// Nearest scene mark within `tolerance` seconds of `value`, for the
    /// host to offer as a snap target. Purely advisory.
    pub fn snap_hint(&self, value: f64, tolerance: f64) -> Option<f64> {
        self.scene_marks
            .iter()
            .copied()
            .map(|mark| (mark, (mark - value).abs()))
            .filter(|(_, distance)| *distance <= tolerance)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(mark, _)| mark)
    }

    /// Set the start handle, clamped to `[0, end]`. Returns the committed
    /// range, or `None` when the editor is unavailable.
    pub fn set_start(&mut self, value: f64) -> Option<TrimRange> {
        if !self.available() || value.is_nan() {
            return None;
        }
        self.range.start = value.clamp(0.0, self.range.end);
        Some(self.range)
    }

    /// Set the end handle, clamped to `[start, duration]`.
    pub fn set_end(&mut self, value: f64) -> Option<TrimRange> {
        if !self.available() || value.is_nan() {
            return None;
        }
        self.range.end = value.clamp(self.range.start, self.duration);
        Some(self.range)
    }
}
