//! Operation variants
//!
//! A reduction operation is a pairing of a combining function and a width rule.
//! Stages and trees hold it as a shared [`Combiner`] so new variants can be
//! plugged in without touching the composition code.

use crate::error::TreeError;
use redtree_ir::bits::{from_signed, sign_extend};
use redtree_ir::{BinaryOp, Expression};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Widest operand `Operation::evaluate` distinguishes
pub const EVAL_WIDTH: usize = 64;

/// Pairwise combining strategy shared by every stage of a tree
pub trait Combiner: fmt::Debug + Send + Sync {
    /// Name used for generated module names
    fn name(&self) -> &str;

    /// Structural expression combining two `input_width`-bit signed operands
    fn combine(&self, a: Expression, b: Expression) -> Expression;

    /// Output width of a stage whose inputs are `input_width` bits, or `None`
    /// when that width is not representable
    fn grow(&self, input_width: usize) -> Option<usize>;
}

/// Built-in reduction operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Operation {
    AddUnsigned,
    AddSigned,
    MaxUnsigned,
    MaxSigned,
    MinUnsigned,
    MinSigned,
}

impl Operation {
    pub const ALL: [Operation; 6] = [
        Operation::AddUnsigned,
        Operation::AddSigned,
        Operation::MaxUnsigned,
        Operation::MaxSigned,
        Operation::MinUnsigned,
        Operation::MinSigned,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Operation::AddUnsigned => "add-unsigned",
            Operation::AddSigned => "add-signed",
            Operation::MaxUnsigned => "max-unsigned",
            Operation::MaxSigned => "max-signed",
            Operation::MinUnsigned => "min-unsigned",
            Operation::MinSigned => "min-signed",
        }
    }

    /// Whether operands are compared or summed as two's complement
    pub fn is_signed(self) -> bool {
        matches!(
            self,
            Operation::AddSigned | Operation::MaxSigned | Operation::MinSigned
        )
    }

    /// Whether the operation widens its result by one bit
    pub fn grows(self) -> bool {
        matches!(self, Operation::AddUnsigned | Operation::AddSigned)
    }

    /// Width rule: add grows by one bit, max/min preserve the width
    pub fn output_width(self, input_width: usize) -> Option<usize> {
        if self.grows() {
            input_width.checked_add(1)
        } else {
            Some(input_width)
        }
    }

    /// Behavioral model of one combining step.
    ///
    /// `a` and `b` are signed `input_width`-bit values; the result is the signed
    /// value read back from the `output_width`-bit stage output. Unsigned
    /// variants reinterpret the operand bit patterns, so the result keeps the
    /// hardware's bit pattern rather than its unsigned magnitude.
    ///
    /// Operands are `i64`, so widths above [`EVAL_WIDTH`] evaluate as
    /// [`EVAL_WIDTH`]; the result is exact while the output fits in 64 bits.
    pub fn evaluate(self, a: i64, b: i64, input_width: usize) -> i64 {
        let input_width = input_width.min(EVAL_WIDTH);
        let ua = from_signed(a as i128, input_width);
        let ub = from_signed(b as i128, input_width);
        let (sa, sb) = (a as i128, b as i128);

        let result = match self {
            Operation::AddUnsigned => sign_extend(ua + ub, input_width + 1),
            Operation::AddSigned => sa + sb,
            Operation::MaxUnsigned => {
                if ua > ub {
                    sa
                } else {
                    sb
                }
            }
            Operation::MaxSigned => sa.max(sb),
            Operation::MinUnsigned => {
                if ua < ub {
                    sa
                } else {
                    sb
                }
            }
            Operation::MinSigned => sa.min(sb),
        };
        result as i64
    }
}

impl Combiner for Operation {
    fn name(&self) -> &str {
        Operation::name(*self)
    }

    fn combine(&self, a: Expression, b: Expression) -> Expression {
        let cast = |e: Expression| {
            if self.is_signed() {
                e.as_signed()
            } else {
                e.as_unsigned()
            }
        };

        match self {
            Operation::AddUnsigned | Operation::AddSigned => {
                Expression::binary(BinaryOp::Add, cast(a), cast(b))
            }
            Operation::MaxUnsigned | Operation::MaxSigned => {
                let cond = Expression::binary(BinaryOp::Greater, cast(a.clone()), cast(b.clone()));
                Expression::mux(cond, a, b)
            }
            Operation::MinUnsigned | Operation::MinSigned => {
                let cond = Expression::binary(BinaryOp::Less, cast(a.clone()), cast(b.clone()));
                Expression::mux(cond, a, b)
            }
        }
    }

    fn grow(&self, input_width: usize) -> Option<usize> {
        self.output_width(input_width)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Operation {
    type Err = TreeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Operation::ALL
            .iter()
            .copied()
            .find(|op| op.name() == s)
            .ok_or_else(|| TreeError::UnknownOperation(s.to_string()))
    }
}
