//! Samples and the serial line format that carries them.

use serde::{Deserialize, Serialize};

/// One scanner reading. `x`/`y` are grid positions, `z` the sensor output.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub x: i32,
    pub y: i32,
    pub z: f64,
}

impl Sample {
    pub const fn new(x: i32, y: i32, z: f64) -> Self {
        Self { x, y, z }
    }

    /// The `(0,0)` coordinate that opens a new scan.
    pub fn is_start_marker(&self) -> bool {
        self.x == 0 && self.y == 0
    }
}

/// A parsed `x,y,z[,name]` line.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanLine {
    pub sample: Sample,
    /// Scan name sent by the scanner in an optional fourth column.
    pub name: Option<String>,
}

impl ScanLine {
    /// Parse one line of serial text.
    ///
    /// Returns `None` for anything that is not at least three finite numbers.
    /// Coordinates arrive as floats and are rounded to the nearest integer.
    pub fn parse(line: &str) -> Option<Self> {
        let mut parts = line.trim().split(',').map(str::trim);
        let x = parse_finite(parts.next()?)?;
        let y = parse_finite(parts.next()?)?;
        let z = parse_finite(parts.next()?)?;
        let name = parts
            .next()
            .map(str::to_string)
            .filter(|s| !s.is_empty());
        Some(Self {
            sample: Sample::new(round_coord(x)?, round_coord(y)?, z),
            name,
        })
    }
}

fn parse_finite(s: &str) -> Option<f64> {
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn round_coord(v: f64) -> Option<i32> {
    let r = v.round();
    if r < i32::MIN as f64 || r > i32::MAX as f64 {
        return None;
    }
    Some(r as i32)
}
