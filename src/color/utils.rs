//! Circular hue helpers

/// Wrap a hue angle into `[0, 360)`
pub fn wrap_hue(h: f64) -> f64 {
    let h = h.rem_euclid(360.0);

    // rem_euclid rounds tiny negative angles up to exactly 360
    if h >= 360.0 {
        0.0
    } else {
        h
    }
}

/// Signed hue difference from `from` to `to` along the shorter arc
///
/// The result lies in `(-180, 180]`.
pub fn hue_delta(from: f64, to: f64) -> f64 {
    let d = wrap_hue(to - from);

    if d > 180.0 {
        d - 360.0
    } else {
        d
    }
}

/// Clamp `x` to `[0, 1]`
pub fn clamp01(x: f64) -> f64 {
    x.clamp(0.0, 1.0)
}
