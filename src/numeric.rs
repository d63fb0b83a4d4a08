/// Arithmetic used by the stack machine, optionally in a fixed-point domain.
///
/// With a scale `s`, operands are mapped to `round(v * s)` before the
/// operation and the result is divided by `s` afterwards, which keeps sums
/// like `0.1 + 0.2` on the decimal grid.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Arithmetic {
    scale: Option<f64>,
}

impl Arithmetic {
    pub(crate) fn new(scale: Option<u32>) -> Self {
        Self {
            scale: scale.map(f64::from),
        }
    }

    fn to_fixed(s: f64, v: f64) -> f64 {
        round_half_up(v * s)
    }

    pub(crate) fn add(self, a: f64, b: f64) -> f64 {
        match self.scale {
            Some(s) => (Self::to_fixed(s, a) + Self::to_fixed(s, b)) / s,
            None => a + b,
        }
    }

    pub(crate) fn sub(self, a: f64, b: f64) -> f64 {
        match self.scale {
            Some(s) => (Self::to_fixed(s, a) - Self::to_fixed(s, b)) / s,
            None => a - b,
        }
    }

    pub(crate) fn mul(self, a: f64, b: f64) -> f64 {
        match self.scale {
            Some(s) => round_half_up(Self::to_fixed(s, a) * Self::to_fixed(s, b) / s) / s,
            None => a * b,
        }
    }

    /// Caller handles a zero divisor.
    pub(crate) fn div(self, a: f64, b: f64) -> f64 {
        match self.scale {
            Some(s) => round_half_up(Self::to_fixed(s, a) * s / Self::to_fixed(s, b)) / s,
            None => a / b,
        }
    }

    /// Round to `decimals` places, halves upward, then snap to the scale grid.
    pub(crate) fn round(self, v: f64, decimals: i32) -> f64 {
        let factor = 10_f64.powi(decimals);
        let rounded = round_half_up(v * factor) / factor;
        match self.scale {
            Some(s) => Self::to_fixed(s, rounded) / s,
            None => rounded,
        }
    }
}

/// Nearest integer, ties toward positive infinity: `2.5 -> 3`, `-2.5 -> -2`.
pub(crate) fn round_half_up(v: f64) -> f64 {
    let floor = v.floor();
    if v - floor >= 0.5 {
        floor + 1.0
    } else {
        floor
    }
}
