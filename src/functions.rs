use std::f64::consts::PI;

use crate::numeric::Arithmetic;

/// The fixed built-in function library.
///
/// Boolean functions return 1 or 0. Domain errors (`sqrt(-1)`, `if` without
/// branches, `min()` with no arguments) come back as non-finite values, which
/// the evaluator reports as `invalid_result`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Builtin {
    Min,
    Max,
    Round,
    Abs,
    Ceil,
    Floor,
    CeilingMultiple,
    FloorMultiple,
    If,
    And,
    Or,
    Not,
    Present,
    Empty,
    Sum,
    Avg,
    IfNull,
    IfError,
    Coalesce,
    SafeDiv,
    Percentage,
    Ratio,
    Gt,
    Gte,
    Lt,
    Lte,
    Eq,
    Neq,
    Sqrt,
    Mod,
    Sign,
    Int,
    Trunc,
    RoundUp,
    RoundDown,
    Power,
    Exp,
    Ln,
    Log,
    Log10,
    Pi,
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,
    Atan2,
    Radians,
    Degrees,
    Count,
}

impl Builtin {
    /// Look up a lower-cased function name, including the French aliases.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        let builtin = match name {
            "min" => Builtin::Min,
            "max" => Builtin::Max,
            "round" | "arrondi" => Builtin::Round,
            "abs" => Builtin::Abs,
            "ceil" => Builtin::Ceil,
            "ceiling" | "plafond" => Builtin::CeilingMultiple,
            "floor" => Builtin::Floor,
            "plancher" => Builtin::FloorMultiple,
            "if" | "si" => Builtin::If,
            "and" | "et" => Builtin::And,
            "or" | "ou" => Builtin::Or,
            "not" | "non" => Builtin::Not,
            "present" => Builtin::Present,
            "empty" => Builtin::Empty,
            "sum" | "somme" => Builtin::Sum,
            "avg" | "average" | "moyenne" => Builtin::Avg,
            "ifnull" => Builtin::IfNull,
            "iferror" | "sierreur" => Builtin::IfError,
            "coalesce" => Builtin::Coalesce,
            "safediv" => Builtin::SafeDiv,
            "percentage" => Builtin::Percentage,
            "ratio" => Builtin::Ratio,
            "gt" => Builtin::Gt,
            "gte" => Builtin::Gte,
            "lt" => Builtin::Lt,
            "lte" => Builtin::Lte,
            "eq" => Builtin::Eq,
            "neq" => Builtin::Neq,
            "sqrt" | "racine" => Builtin::Sqrt,
            "mod" => Builtin::Mod,
            "sign" | "signe" => Builtin::Sign,
            "int" | "ent" => Builtin::Int,
            "trunc" | "tronque" => Builtin::Trunc,
            "roundup" => Builtin::RoundUp,
            "rounddown" => Builtin::RoundDown,
            "power" | "puissance" => Builtin::Power,
            "exp" => Builtin::Exp,
            "ln" => Builtin::Ln,
            "log" => Builtin::Log,
            "log10" => Builtin::Log10,
            "pi" => Builtin::Pi,
            "sin" | "sinus" => Builtin::Sin,
            "cos" | "cosinus" => Builtin::Cos,
            "tan" | "tangente" => Builtin::Tan,
            "asin" | "arcsin" => Builtin::Asin,
            "acos" | "arccos" => Builtin::Acos,
            "atan" | "arctan" => Builtin::Atan,
            "atan2" => Builtin::Atan2,
            "radians" | "rad" => Builtin::Radians,
            "degrees" | "degres" => Builtin::Degrees,
            "count" | "nb" => Builtin::Count,
            _ => return None,
        };
        Some(builtin)
    }

    /// Apply the function to its arguments, in call order.
    pub(crate) fn apply(self, args: &[f64], arith: Arithmetic) -> f64 {
        let arg = |i: usize, default: f64| args.get(i).copied().unwrap_or(default);
        let x = arg(0, 0.0);
        let y = arg(1, 0.0);

        match self {
            Builtin::Min => args.iter().copied().fold(f64::INFINITY, f64::min),
            Builtin::Max => args.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            Builtin::Round => arith.round(x, decimals(y, 0)),
            Builtin::Abs => x.abs(),
            Builtin::Ceil => x.ceil(),
            Builtin::Floor | Builtin::Int => x.floor(),
            Builtin::CeilingMultiple => to_multiple(x, arg(1, 1.0), f64::ceil),
            Builtin::FloorMultiple => to_multiple(x, arg(1, 1.0), f64::floor),
            Builtin::If => {
                if args.len() < 2 {
                    f64::NAN
                } else if x != 0.0 {
                    y
                } else {
                    arg(2, 0.0)
                }
            }
            Builtin::And => truth(args.iter().all(|&v| v != 0.0)),
            Builtin::Or => truth(args.iter().any(|&v| v != 0.0)),
            Builtin::Not | Builtin::Empty => truth(x == 0.0),
            Builtin::Present => truth(x != 0.0),
            Builtin::Sum => args.iter().sum(),
            Builtin::Avg => {
                if args.is_empty() {
                    0.0
                } else {
                    args.iter().sum::<f64>() / args.len() as f64
                }
            }
            Builtin::IfNull => {
                if x != 0.0 {
                    x
                } else {
                    y
                }
            }
            // The evaluator also falls back when the primary carried an error.
            Builtin::IfError => {
                if x.is_finite() {
                    x
                } else {
                    y
                }
            }
            Builtin::Coalesce => args.iter().copied().find(|&v| v != 0.0).unwrap_or(0.0),
            Builtin::SafeDiv => {
                if y == 0.0 {
                    arg(2, 0.0)
                } else {
                    x / y
                }
            }
            Builtin::Percentage => {
                if y == 0.0 {
                    0.0
                } else {
                    x / y * 100.0
                }
            }
            Builtin::Ratio => {
                if y == 0.0 {
                    0.0
                } else {
                    x / y
                }
            }
            Builtin::Gt => truth(x > y),
            Builtin::Gte => truth(x >= y),
            Builtin::Lt => truth(x < y),
            Builtin::Lte => truth(x <= y),
            Builtin::Eq => truth(x == y),
            Builtin::Neq => truth(x != y),
            Builtin::Sqrt => x.sqrt(),
            Builtin::Mod => {
                let divisor = arg(1, 1.0);
                if divisor == 0.0 {
                    0.0
                } else {
                    x % divisor
                }
            }
            Builtin::Sign => {
                if x == 0.0 {
                    0.0
                } else {
                    x.signum()
                }
            }
            Builtin::Trunc => scaled(x, y, f64::trunc),
            Builtin::RoundUp => scaled(x, y, f64::ceil),
            Builtin::RoundDown => scaled(x, y, f64::floor),
            Builtin::Power => x.powf(arg(1, 1.0)),
            Builtin::Exp => x.exp(),
            Builtin::Ln => positive_or_zero(x, f64::ln),
            Builtin::Log => {
                let base = arg(1, 10.0);
                positive_or_zero(x, |v| v.ln() / base.ln())
            }
            Builtin::Log10 => positive_or_zero(x, f64::log10),
            Builtin::Pi => PI * arg(0, 1.0),
            Builtin::Sin => x.sin(),
            Builtin::Cos => x.cos(),
            Builtin::Tan => x.tan(),
            Builtin::Asin => x.asin(),
            Builtin::Acos => x.acos(),
            Builtin::Atan => x.atan(),
            Builtin::Atan2 => y.atan2(x),
            Builtin::Radians => x.to_radians(),
            Builtin::Degrees => x.to_degrees(),
            Builtin::Count => args.len() as f64,
        }
    }
}

fn truth(b: bool) -> f64 {
    if b {
        1.0
    } else {
        0.0
    }
}

/// `round` accepts 0 to 12 decimals; the other rounding helpers also accept
/// negative places (tens, hundreds).
fn decimals(v: f64, min: i32) -> i32 {
    v.floor().clamp(f64::from(min), 12.0) as i32
}

fn scaled(v: f64, places: f64, op: fn(f64) -> f64) -> f64 {
    let factor = 10_f64.powi(decimals(places, -12));
    op(v * factor) / factor
}

/// Round `v` to a multiple of `multiple`; a zero multiple leaves `v` unchanged.
fn to_multiple(v: f64, multiple: f64, op: fn(f64) -> f64) -> f64 {
    if multiple == 0.0 {
        v
    } else {
        op(v / multiple) * multiple
    }
}

fn positive_or_zero(v: f64, op: impl Fn(f64) -> f64) -> f64 {
    if v <= 0.0 {
        0.0
    } else {
        op(v)
    }
}
