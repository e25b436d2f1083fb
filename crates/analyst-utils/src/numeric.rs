//! Numeric helpers

/// Round to two decimal places, the precision used for every price and
/// indicator value leaving the workspace.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
