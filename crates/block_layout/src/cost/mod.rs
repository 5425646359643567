//! Cost Model
//!
//! Translates layout geometry into a scalar figure of merit. The solver only
//! ever adds costs up and compares them, so a policy needs three pieces:
//!
//! 1. **Span cost**: charged for each run of columns written on a line
//! 2. **Break cost**: charged for each line break a block introduces
//! 3. **Preference**: how to order two layouts of equal cost
//!
//! # Default Policy
//!
//! [`CostModel`] charges `overflow_weight * overflow^2` per line. The squared
//! term is charged span by span as `o(to)^2 - o(from)^2`, which telescopes,
//! so the spans on one line always sum to the penalty of the whole line no
//! matter how the line was assembled.
//!
//! With the defaults (`overflow_weight = 100`, `line_surcharge = 2`) one
//! column of overflow outweighs fifty line breaks.


use std::cmp::Ordering;
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign};

use crate::error::ConfigError;
use crate::layout::Layout;

/// Scalar cost of a layout. Lower is better.
///
/// Totally ordered (via [`f64::total_cmp`]) so layouts can be compared
/// deterministically.
#[derive(Clone, Copy, Debug, Default)]
pub struct Cost(f64);

impl Cost {
    /// No cost at all.
    pub const ZERO: Cost = Cost(0.0);

    /// Wrap a raw value.
    #[inline]
    pub const fn new(value: f64) -> Self {
        Cost(value)
    }

    /// Get the raw value.
    #[inline]
    pub const fn value(self) -> f64 {
        self.0
    }
}

impl PartialEq for Cost {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Cost {}

impl PartialOrd for Cost {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Cost {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl Add for Cost {
    type Output = Cost;

    #[inline]
    fn add(self, rhs: Cost) -> Cost {
        Cost(self.0 + rhs.0)
    }
}

impl AddAssign for Cost {
    #[inline]
    fn add_assign(&mut self, rhs: Cost) {
        self.0 += rhs.0;
    }
}

impl Sum for Cost {
    fn sum<I: Iterator<Item = Cost>>(iter: I) -> Cost {
        iter.fold(Cost::ZERO, Add::add)
    }
}

impl fmt::Display for Cost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How to order two layouts whose costs are equal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TieBreak {
    /// Prefer the layout with fewer lines, then the earlier option (default).
    #[default]
    FewerLines,

    /// Prefer the earlier option.
    FirstOption,
}

impl TieBreak {
    /// Order `a` before `b` if `a` is the better layout.
    ///
    /// `Ordering::Equal` means neither wins; callers keep the earlier one.
    pub fn order(self, a: &Layout, b: &Layout) -> Ordering {
        let by_cost = a.cost.cmp(&b.cost);
        match self {
            TieBreak::FewerLines => by_cost.then(a.height.cmp(&b.height)),
            TieBreak::FirstOption => by_cost,
        }
    }
}

/// Policy turning layout geometry into cost.
///
/// Implementations must be deterministic and free of side effects: the
/// solver memoizes on the assumption that equal inputs give equal costs.
pub trait CostPolicy {
    /// Cost of writing columns `from..to` on a line laid out against `margin`.
    fn span(&self, from: usize, to: usize, margin: usize) -> Cost;

    /// Cost of a line break whose new line starts at `next_column`.
    fn line_break(&self, break_mult: f64, next_column: usize) -> Cost;

    /// Cost of a break inside a wrap, with `remaining` children still to
    /// place after it.
    fn wrap_break(&self, break_mult: f64, next_column: usize, _remaining: usize) -> Cost {
        self.line_break(break_mult, next_column)
    }

    /// How to order layouts of equal cost.
    fn tie_break(&self) -> TieBreak {
        TieBreak::FewerLines
    }

    /// Reject unusable configurations before solving.
    fn validate(&self) -> Result<(), ConfigError> {
        Ok(())
    }
}

/// Default overflow weight.
pub const DEFAULT_OVERFLOW_WEIGHT: f64 = 100.0;

/// Default cost of one line break.
pub const DEFAULT_LINE_SURCHARGE: f64 = 2.0;

/// Default per-child cost of breaking a wrap early.
pub const DEFAULT_LATE_PACK_COST: f64 = 1e-3;

/// Weighted cost configuration.
///
/// Each weight can be overridden with a `with_*` builder; all weights must
/// be finite and non-negative.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CostModel {
    /// Multiplier of the squared overflow of each line.
    pub overflow_weight: f64,

    /// Cost of each line break.
    pub line_surcharge: f64,

    /// Cost per remaining child of a wrap break, favoring full early lines.
    pub late_pack_cost: f64,

    /// Column past which `soft_margin_weight` starts to apply.
    pub soft_margin: usize,

    /// Linear cost per column beyond `soft_margin`.
    pub soft_margin_weight: f64,

    /// Cost per column of indentation at the start of each broken line.
    pub indent_weight: f64,

    /// Ordering of equal-cost layouts.
    pub tie_break: TieBreak,
}

impl Default for CostModel {
    fn default() -> Self {
        Self {
            overflow_weight: DEFAULT_OVERFLOW_WEIGHT,
            line_surcharge: DEFAULT_LINE_SURCHARGE,
            late_pack_cost: DEFAULT_LATE_PACK_COST,
            soft_margin: 0,
            soft_margin_weight: 0.0,
            indent_weight: 0.0,
            tie_break: TieBreak::FewerLines,
        }
    }
}

impl CostModel {
    /// Create a model with the given overflow weight.
    #[must_use]
    pub fn with_overflow_weight(self, overflow_weight: f64) -> Self {
        Self {
            overflow_weight,
            ..self
        }
    }

    /// Create a model with the given line surcharge.
    #[must_use]
    pub fn with_line_surcharge(self, line_surcharge: f64) -> Self {
        Self {
            line_surcharge,
            ..self
        }
    }

    /// Create a model with the given late-pack cost.
    #[must_use]
    pub fn with_late_pack_cost(self, late_pack_cost: f64) -> Self {
        Self {
            late_pack_cost,
            ..self
        }
    }

    /// Create a model charging `weight` per column beyond `soft_margin`.
    #[must_use]
    pub fn with_soft_margin(self, soft_margin: usize, weight: f64) -> Self {
        Self {
            soft_margin,
            soft_margin_weight: weight,
            ..self
        }
    }

    /// Create a model charging `indent_weight` per column of indentation.
    #[must_use]
    pub fn with_indent_weight(self, indent_weight: f64) -> Self {
        Self {
            indent_weight,
            ..self
        }
    }

    /// Create a model with the given tie-break policy.
    #[must_use]
    pub fn with_tie_break(self, tie_break: TieBreak) -> Self {
        Self { tie_break, ..self }
    }

    /// Penalty of a single line overflowing the margin by `amount` columns.
    pub fn overflow_cost(&self, amount: usize) -> Cost {
        let amount = columns(amount);
        Cost(self.overflow_weight * amount * amount)
    }
}

impl CostPolicy for CostModel {
    fn span(&self, from: usize, to: usize, margin: usize) -> Cost {
        let over_from = columns(from.saturating_sub(margin));
        let over_to = columns(to.saturating_sub(margin));
        let overflow = self.overflow_weight * (over_to * over_to - over_from * over_from);

        let soft = if self.soft_margin_weight > 0.0 {
            let soft_from = columns(from.saturating_sub(self.soft_margin));
            let soft_to = columns(to.saturating_sub(self.soft_margin));
            self.soft_margin_weight * (soft_to - soft_from)
        } else {
            0.0
        };

        Cost(overflow + soft)
    }

    fn line_break(&self, break_mult: f64, next_column: usize) -> Cost {
        Cost(self.line_surcharge * break_mult + self.indent_weight * columns(next_column))
    }

    fn wrap_break(&self, break_mult: f64, next_column: usize, remaining: usize) -> Cost {
        self.line_break(break_mult, next_column) + Cost(self.late_pack_cost * columns(remaining))
    }

    fn tie_break(&self) -> TieBreak {
        self.tie_break
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let weights = [
            ("overflow_weight", self.overflow_weight),
            ("line_surcharge", self.line_surcharge),
            ("late_pack_cost", self.late_pack_cost),
            ("soft_margin_weight", self.soft_margin_weight),
            ("indent_weight", self.indent_weight),
        ];
        for (name, value) in weights {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidWeight { name, value });
            }
        }
        Ok(())
    }
}

/// Column count as a float for weighting.
#[inline]
#[expect(
    clippy::cast_precision_loss,
    reason = "column counts stay far below 2^52"
)]
fn columns(n: usize) -> f64 {
    n as f64
}
