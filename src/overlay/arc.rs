//! Forward arcs on a circular domain

/// A circular domain of `size` discrete positions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ring {
    size: u32,
}

impl Ring {
    /// Minutes of a day
    pub const DAY: Ring = Ring { size: 24 * 60 };

    /// # Panics
    ///
    /// Panics if `size` is zero.
    pub fn new(size: u32) -> Self {
        assert!(size > 0, "a ring needs at least one position");
        Self { size }
    }

    /// Number of positions
    pub fn size(&self) -> u32 {
        self.size
    }

    /// Distance travelled going forward from `a` to `b`, in `[0, size)`
    pub fn forward(&self, a: u32, b: u32) -> u32 {
        (b % self.size + self.size - a % self.size) % self.size
    }

    /// Whether `x` lies on the forward arc `[a -> b]`, bounds included
    pub fn contains(&self, a: u32, b: u32, x: u32) -> bool {
        self.forward(a, x) <= self.forward(a, b)
    }

    /// Position of `x` along the arc `[a -> b]`, as a fraction
    ///
    /// A degenerate arc (`a == b`) is an instant switch and yields `1.0`.
    pub fn fraction(&self, a: u32, b: u32, x: u32) -> f64 {
        let total = self.forward(a, b);

        if total == 0 {
            1.0
        } else {
            f64::from(self.forward(a, x)) / f64::from(total)
        }
    }
}

/// Fade window markers placed on a ring
///
/// The markers split the ring into four consecutive arcs: fading in, fully
/// on, fading out and fully off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub struct Window {
    pub fade_in_start: u32,
    pub fade_in_end: u32,
    pub fade_out_start: u32,
    pub fade_out_end: u32,
}

impl Window {
    /// Mix weight in `[0, 1]` at position `n`
    pub fn mix(&self, ring: Ring, n: u32) -> f64 {
        if ring.contains(self.fade_in_start, self.fade_in_end, n) {
            ring.fraction(self.fade_in_start, self.fade_in_end, n)
        } else if ring.contains(self.fade_in_end, self.fade_out_start, n) {
            1.0
        } else if ring.contains(self.fade_out_start, self.fade_out_end, n) {
            1.0 - ring.fraction(self.fade_out_start, self.fade_out_end, n)
        } else {
            0.0
        }
    }
}
