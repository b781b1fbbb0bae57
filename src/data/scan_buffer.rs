use crate::data::sample::Sample;

/// Default `|x - y|` tolerance for [`ScanBuffer::detect_end`].
pub const DEFAULT_END_TOLERANCE: i32 = 1;

/// Samples of the scan in progress, in arrival order.
#[derive(Debug, Clone)]
pub struct ScanBuffer {
    samples: Vec<Sample>,
    end_tolerance: i32,
}

impl Default for ScanBuffer {
    fn default() -> Self {
        Self::with_tolerance(DEFAULT_END_TOLERANCE)
    }
}

impl ScanBuffer {
    pub fn with_tolerance(end_tolerance: i32) -> Self {
        Self {
            samples: Vec::new(),
            end_tolerance: end_tolerance.max(0),
        }
    }

    pub fn append(&mut self, sample: Sample) {
        self.samples.push(sample);
    }

    pub fn reset(&mut self) {
        self.samples.clear();
    }

    /// True when `(x, y)` looks like the end-of-scan corner.
    ///
    /// The scanner reports the far corner `(n, n)`, sometimes off by one
    /// after rounding, so exact equality is not required.
    pub fn detect_end(&self, x: i32, y: i32) -> bool {
        (i64::from(x) - i64::from(y)).abs() <= i64::from(self.end_tolerance)
    }

    pub fn end_tolerance(&self) -> i32 {
        self.end_tolerance
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    /// Copy of the samples, handed to persistence when a scan finishes.
    pub fn snapshot(&self) -> Vec<Sample> {
        self.samples.clone()
    }
}

pub(crate) fn z_bounds(samples: &[Sample]) -> Option<(f64, f64)> {
    let first = samples.first()?.z;
    Some(
        samples
            .iter()
            .fold((first, first), |(lo, hi), s| (lo.min(s.z), hi.max(s.z))),
    )
}
