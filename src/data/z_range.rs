//! Colour/height range of the heat map.

/// Z range used to normalise colours and the 3D height axis.
///
/// Unlocked, the range starts at the default and only widens to cover new
/// data. Locked, it stays at the operator's values.
#[derive(Debug, Clone, PartialEq)]
pub struct ZRange {
    default: (f64, f64),
    current: (f64, f64),
    locked: Option<(f64, f64)>,
}

impl ZRange {
    pub fn new(default: [f64; 2]) -> Self {
        let default = ordered(default[0], default[1]);
        Self {
            default,
            current: default,
            locked: None,
        }
    }

    /// Range to draw with.
    pub fn bounds(&self) -> (f64, f64) {
        self.locked.unwrap_or(self.current)
    }

    /// Widen the unlocked range to include `(lo, hi)`.
    pub fn include(&mut self, lo: f64, hi: f64) {
        if !lo.is_finite() || !hi.is_finite() {
            return;
        }
        self.current = (self.current.0.min(lo), self.current.1.max(hi));
    }

    /// Replace the unlocked range with the data range of a loaded file.
    pub fn fit(&mut self, lo: f64, hi: f64) {
        if lo.is_finite() && hi.is_finite() {
            self.current = ordered(lo, hi);
        }
    }

    /// Back to the default; the lock, if any, is kept.
    pub fn reset(&mut self) {
        self.current = self.default;
    }

    pub fn lock(&mut self, lo: f64, hi: f64) {
        self.locked = Some(ordered(lo, hi));
    }

    pub fn unlock(&mut self) {
        self.locked = None;
    }

    pub fn is_locked(&self) -> bool {
        self.locked.is_some()
    }

    /// Position of `z` inside the range, clamped to `0..=1`.
    ///
    /// A zero-width range is not scaled; every value maps to the middle.
    pub fn normalize(&self, z: f64) -> f64 {
        let (lo, hi) = self.bounds();
        let span = hi - lo;
        if span <= 0.0 || !span.is_finite() {
            return 0.5;
        }
        ((z - lo) / span).clamp(0.0, 1.0)
    }
}

fn ordered(a: f64, b: f64) -> (f64, f64) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}
