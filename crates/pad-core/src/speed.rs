use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpeedTier {
    Low,
    Medium,
    High,
}

impl SpeedTier {
    /// Tier from the two tier buttons of an axis group. High wins when both
    /// are held.
    pub fn select(medium: bool, high: bool) -> Self {
        if high {
            SpeedTier::High
        } else if medium {
            SpeedTier::Medium
        } else {
            SpeedTier::Low
        }
    }
}

/// Command speed for a normalized axis magnitude under the given ceiling.
///
/// The result is `round(ceiling * |magnitude|)`, never negative and never
/// above `ceiling`.
pub fn speed(magnitude: f64, ceiling: i32) -> i32 {
    let ceiling = ceiling.max(0);
    let m = magnitude.abs();
    if m.is_nan() {
        return 0;
    }
    (f64::from(ceiling) * m.min(1.0)).round() as i32
}
