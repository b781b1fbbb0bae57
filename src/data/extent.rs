//! Scan size tracking and the square-dimension policy for loaded scans.

use crate::config::ScanPolicy;

/// Square size of the scan in progress, in scanner units.
///
/// While a scan runs, a coordinate beyond the current size grows both axes
/// together, rounded up to a multiple of `step` and clamped to
/// `step..=max`. The initial size is only what is drawn before data
/// arrives; the end corner of a finished scan sets the final size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanExtent {
    size: i32,
    initial: i32,
    step: i32,
    max: i32,
    /// Largest in-range coordinate seen since the last reset.
    furthest: i32,
}

impl ScanExtent {
    pub fn new(policy: &ScanPolicy) -> Self {
        let step = policy.extent_step.max(1);
        let max = policy.max_extent.max(step);
        let initial = policy.initial_extent.clamp(step, max);
        Self {
            size: initial,
            initial,
            step,
            max,
            furthest: 0,
        }
    }

    pub fn size(&self) -> i32 {
        self.size
    }

    pub fn reset(&mut self) {
        self.size = self.initial;
        self.furthest = 0;
    }

    /// Grow to cover `(x, y)`. Coordinates outside `0..=max` are noise and ignored.
    pub fn observe(&mut self, x: i32, y: i32) {
        for v in [x, y] {
            if !(0..=self.max).contains(&v) {
                continue;
            }
            self.furthest = self.furthest.max(v);
            if v > self.size {
                let rounded = (v + self.step - 1) / self.step * self.step;
                self.size = rounded.clamp(self.step, self.max);
            }
        }
    }

    /// Whether a diagonal point at `corner` can be the far corner of the scan.
    ///
    /// The corner lies in `step..=max` and no earlier coordinate went past
    /// it by more than `tolerance`, so diagonal points crossed mid-scan
    /// do not qualify.
    pub fn is_far_corner(&self, corner: i32, tolerance: i32) -> bool {
        (self.step..=self.max).contains(&corner) && corner >= self.furthest - tolerance
    }

    /// Fix the size to the end corner of a finished scan.
    pub fn settle(&mut self, corner: i32) {
        self.size = corner.clamp(self.step, self.max);
    }
}

/// Side length assumed for a loaded scan whose X and Y extents disagree.
///
/// Close extents (within `threshold`) are rounding noise and averaged;
/// anything further apart takes the larger so no data is cut off.
pub fn assumed_square_dimension(x_extent: u32, y_extent: u32, threshold: u32) -> u32 {
    if x_extent.abs_diff(y_extent) <= threshold {
        ((u64::from(x_extent) + u64::from(y_extent)) / 2) as u32
    } else {
        x_extent.max(y_extent)
    }
}
