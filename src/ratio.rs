use serde::{Serialize, Serializer};

/// Wire spelling of the unbounded sentinel. JSON has no infinity literal.
pub const UNBOUNDED_LABEL: &str = "Infinity";

/// Assist-to-turnover ratio as reported by career summaries.
///
/// A player with assists and no turnovers has an unbounded ratio, which is kept
/// distinct from any finite value so it can be rendered as such.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AssistTurnoverRatio {
    Finite(f64),
    Unbounded,
}

impl AssistTurnoverRatio {
    pub fn from_counts(assists: u32, turnovers: u32) -> Self {
        if turnovers > 0 {
            AssistTurnoverRatio::Finite(round_to(assists as f64 / turnovers as f64, 2))
        } else if assists > 0 {
            AssistTurnoverRatio::Unbounded
        } else {
            AssistTurnoverRatio::Finite(0.0)
        }
    }

    pub fn is_unbounded(self) -> bool {
        matches!(self, AssistTurnoverRatio::Unbounded)
    }

    pub fn as_f64(self) -> f64 {
        match self {
            AssistTurnoverRatio::Finite(v) => v,
            AssistTurnoverRatio::Unbounded => f64::INFINITY,
        }
    }
}

impl Serialize for AssistTurnoverRatio {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            AssistTurnoverRatio::Finite(v) => serializer.serialize_f64(*v),
            AssistTurnoverRatio::Unbounded => serializer.serialize_str(UNBOUNDED_LABEL),
        }
    }
}

/// `numerator / denominator * 100`, or 0 when the denominator is zero.
pub fn percentage(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        numerator / denominator * 100.0
    } else {
        0.0
    }
}

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
