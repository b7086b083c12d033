//! Expression evaluation
//!
//! Evaluates flattened expressions with the same sizing rules the IR uses for
//! width inference, so a simulated value always has the width a backend would
//! give it.

use crate::flatten::{FlatExpr, FlatSignal};
use redtree_ir::bits::{resize, sign_extend, truncate};
use redtree_ir::{BinaryOp, CastKind};

/// A sized bit pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Bits {
    pub bits: u128,
    pub width: usize,
    pub signed: bool,
}

impl Bits {
    /// Resize to `width` according to this value's own signedness
    pub fn to_width(self, width: usize) -> u128 {
        resize(self.bits, self.width, width, self.signed)
    }
}

pub(crate) fn eval(expr: &FlatExpr, signals: &[FlatSignal], values: &[u128]) -> Bits {
    match expr {
        FlatExpr::Literal { bits, width } => Bits {
            bits: *bits,
            width: *width,
            signed: false,
        },
        FlatExpr::Ref(slot) => {
            let signal = &signals[*slot];
            Bits {
                bits: values[*slot],
                width: signal.width,
                signed: signal.signed,
            }
        }
        FlatExpr::Binary { op, left, right } => {
            let l = eval(left, signals, values);
            let r = eval(right, signals, values);
            match op {
                BinaryOp::Add => {
                    let width = l.width.max(r.width) + 1;
                    Bits {
                        bits: truncate(l.to_width(width).wrapping_add(r.to_width(width)), width),
                        width,
                        signed: l.signed || r.signed,
                    }
                }
                BinaryOp::Less | BinaryOp::Greater => {
                    let ordering = compare(l, r);
                    let hit = match op {
                        BinaryOp::Less => ordering.is_lt(),
                        _ => ordering.is_gt(),
                    };
                    Bits {
                        bits: u128::from(hit),
                        width: 1,
                        signed: false,
                    }
                }
            }
        }
        FlatExpr::Mux {
            cond,
            then_expr,
            else_expr,
        } => {
            let c = eval(cond, signals, values);
            let t = eval(then_expr, signals, values);
            let e = eval(else_expr, signals, values);
            let width = t.width.max(e.width);
            let chosen = if c.bits != 0 { t } else { e };
            Bits {
                bits: chosen.to_width(width),
                width,
                signed: t.signed && e.signed,
            }
        }
        FlatExpr::Cast { kind, operand } => {
            let v = eval(operand, signals, values);
            Bits {
                signed: *kind == CastKind::AsSigned,
                ..v
            }
        }
    }
}

fn compare(l: Bits, r: Bits) -> std::cmp::Ordering {
    if l.signed && r.signed {
        sign_extend(l.bits, l.width).cmp(&sign_extend(r.bits, r.width))
    } else {
        let width = l.width.max(r.width);
        l.to_width(width).cmp(&r.to_width(width))
    }
}
