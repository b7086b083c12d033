//! Type Width Calculation Utilities
//!
//! Single source of truth for the bit width and signedness of IR types and
//! expressions. Elaboration, validation and simulation all size values through
//! this module.
//!
//! Expression rules:
//! - `Add` is one bit wider than its wider operand, signed if either operand is
//! - `Less`/`Greater` produce a single unsigned bit
//! - `Conditional` is as wide as its wider arm, signed only if both arms are
//! - casts keep the width and change only the signedness

use crate::ir::{BinaryOp, CastKind, DataType, Expression, Module, Value};
use crate::validation::ValidationError;

/// Bit width of a data type
pub fn get_type_width(data_type: &DataType) -> usize {
    match data_type {
        DataType::Bit(width) | DataType::Int(width) => *width,
    }
}

/// Build a data type from a width and signedness
pub fn data_type(width: usize, signed: bool) -> DataType {
    if signed {
        DataType::Int(width)
    } else {
        DataType::Bit(width)
    }
}

/// Infer the type of an expression evaluated inside `module`
pub fn expression_type(module: &Module, expr: &Expression) -> Result<DataType, ValidationError> {
    match expr {
        Expression::Literal(Value::BitVector { width, .. }) => Ok(DataType::Bit(*width)),
        Expression::Ref(lvalue) => {
            module
                .lvalue_type(lvalue)
                .ok_or_else(|| ValidationError::UnknownReference {
                    module_name: module.name.clone(),
                    reference: format!("{:?}", lvalue),
                })
        }
        Expression::Binary { op, left, right } => {
            let l = expression_type(module, left)?;
            let r = expression_type(module, right)?;
            Ok(match op {
                BinaryOp::Add => data_type(
                    get_type_width(&l).max(get_type_width(&r)) + 1,
                    l.is_signed() || r.is_signed(),
                ),
                BinaryOp::Less | BinaryOp::Greater => DataType::Bit(1),
            })
        }
        Expression::Conditional {
            cond,
            then_expr,
            else_expr,
        } => {
            expression_type(module, cond)?;
            let t = expression_type(module, then_expr)?;
            let e = expression_type(module, else_expr)?;
            Ok(data_type(
                get_type_width(&t).max(get_type_width(&e)),
                t.is_signed() && e.is_signed(),
            ))
        }
        Expression::Cast { kind, operand } => {
            let width = get_type_width(&expression_type(module, operand)?);
            Ok(data_type(width, *kind == CastKind::AsSigned))
        }
    }
}

/// Bit width of an expression evaluated inside `module`
pub fn expression_width(module: &Module, expr: &Expression) -> Result<usize, ValidationError> {
    expression_type(module, expr).map(|t| get_type_width(&t))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{ModuleId, PortDirection};

    fn module_with_operands() -> (Module, Expression, Expression) {
        let mut m = Module::new(ModuleId(0), "m".to_string());
        let a = m.add_port("a".to_string(), PortDirection::Input, DataType::Int(4));
        let b = m.add_port("b".to_string(), PortDirection::Input, DataType::Int(6));
        (m, Expression::port(a), Expression::port(b))
    }

    #[test]
    fn test_add_grows_over_wider_operand() {
        let (m, a, b) = module_with_operands();
        let sum = Expression::binary(BinaryOp::Add, a, b);
        assert_eq!(expression_type(&m, &sum).unwrap(), DataType::Int(7));
    }

    #[test]
    fn test_unsigned_add_of_casts() {
        let (m, a, _) = module_with_operands();
        let sum = Expression::binary(BinaryOp::Add, a.clone().as_unsigned(), a.as_unsigned());
        assert_eq!(expression_type(&m, &sum).unwrap(), DataType::Bit(5));
    }

    #[test]
    fn test_comparison_is_one_bit() {
        let (m, a, b) = module_with_operands();
        let cmp = Expression::binary(BinaryOp::Greater, a, b);
        assert_eq!(expression_width(&m, &cmp).unwrap(), 1);
    }

    #[test]
    fn test_mux_keeps_operand_type() {
        let (m, a, _) = module_with_operands();
        let cond = Expression::binary(BinaryOp::Less, a.clone(), a.clone());
        let mux = Expression::mux(cond, a.clone(), a);
        assert_eq!(expression_type(&m, &mux).unwrap(), DataType::Int(4));
    }

    #[test]
    fn test_unknown_reference() {
        let (m, _, _) = module_with_operands();
        let dangling = Expression::port(crate::ir::PortId(9));
        assert!(matches!(
            expression_type(&m, &dangling),
            Err(ValidationError::UnknownReference { .. })
        ));
    }
}
