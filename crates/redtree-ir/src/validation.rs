//! Structural Invariant Validation
//!
//! Checks that a generated design is well-formed before it is handed to a
//! backend:
//! 1. Every reference resolves to a port or signal of the enclosing module
//! 2. Nothing drives a module input from inside the module
//! 3. Assignments never truncate; conditions are a single bit
//! 4. Every instance connects each child port exactly once, with equal widths,
//!    and child outputs land on assignable parent references

use crate::ir::{Block, Design, Expression, LValue, Module, PortDirection, Statement};
use crate::type_width::{expression_width, get_type_width};
use thiserror::Error;

/// Validation error types
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Module {module_id} referenced by '{context}' does not exist")]
    UnknownModule { module_id: u32, context: String },

    #[error("Unresolved reference {reference} in module '{module_name}'")]
    UnknownReference {
        module_name: String,
        reference: String,
    },

    #[error("Input port '{port_name}' of module '{module_name}' is driven internally")]
    AssignToInput {
        module_name: String,
        port_name: String,
    },

    #[error(
        "Width mismatch in module '{module_name}' at '{target}': expected {expected} bits, got {actual}"
    )]
    WidthMismatch {
        module_name: String,
        target: String,
        expected: usize,
        actual: usize,
    },

    #[error("Instance '{instance}' in module '{module_name}' connects unknown port '{port_name}'")]
    UnknownPort {
        module_name: String,
        instance: String,
        port_name: String,
    },

    #[error("Port '{port_name}' of instance '{instance}' in module '{module_name}' is unconnected")]
    UnconnectedPort {
        module_name: String,
        instance: String,
        port_name: String,
    },

    #[error(
        "Output '{port_name}' of instance '{instance}' in module '{module_name}' must connect to a port or signal"
    )]
    OutputNotAssignable {
        module_name: String,
        instance: String,
        port_name: String,
    },
}

/// Validate that all structural invariants are satisfied
pub fn validate_design(design: &Design) -> Result<(), ValidationError> {
    if design.top_module().is_none() {
        return Err(ValidationError::UnknownModule {
            module_id: design.top.0,
            context: design.name.clone(),
        });
    }

    for module in &design.modules {
        validate_module(design, module)?;
    }

    Ok(())
}

fn validate_module(design: &Design, module: &Module) -> Result<(), ValidationError> {
    for assign in &module.assignments {
        check_assignment(module, &assign.lhs, &assign.rhs)?;
    }

    for process in &module.processes {
        check_block(module, &process.body)?;
    }

    for instance in &module.instances {
        let child = design
            .module(instance.module)
            .ok_or_else(|| ValidationError::UnknownModule {
                module_id: instance.module.0,
                context: format!("{}.{}", module.name, instance.name),
            })?;

        for port_name in instance.connections.keys() {
            if child.port_by_name(port_name).is_none() {
                return Err(ValidationError::UnknownPort {
                    module_name: module.name.clone(),
                    instance: instance.name.clone(),
                    port_name: port_name.clone(),
                });
            }
        }

        for port in &child.ports {
            let expr = instance.connections.get(&port.name).ok_or_else(|| {
                ValidationError::UnconnectedPort {
                    module_name: module.name.clone(),
                    instance: instance.name.clone(),
                    port_name: port.name.clone(),
                }
            })?;

            if port.direction == PortDirection::Output {
                let lvalue = match expr {
                    Expression::Ref(lvalue) => lvalue,
                    _ => {
                        return Err(ValidationError::OutputNotAssignable {
                            module_name: module.name.clone(),
                            instance: instance.name.clone(),
                            port_name: port.name.clone(),
                        })
                    }
                };
                check_driven(module, lvalue)?;
            }

            let expected = get_type_width(&port.port_type);
            let actual = expression_width(module, expr)?;
            if expected != actual {
                return Err(ValidationError::WidthMismatch {
                    module_name: module.name.clone(),
                    target: format!("{}.{}", instance.name, port.name),
                    expected,
                    actual,
                });
            }
        }
    }

    Ok(())
}

fn check_block(module: &Module, block: &Block) -> Result<(), ValidationError> {
    for statement in &block.statements {
        match statement {
            Statement::Assignment(assign) => check_assignment(module, &assign.lhs, &assign.rhs)?,
            Statement::If(if_stmt) => {
                let actual = expression_width(module, &if_stmt.condition)?;
                if actual != 1 {
                    return Err(ValidationError::WidthMismatch {
                        module_name: module.name.clone(),
                        target: "if condition".to_string(),
                        expected: 1,
                        actual,
                    });
                }
                check_block(module, &if_stmt.then_block)?;
                if let Some(else_block) = &if_stmt.else_block {
                    check_block(module, else_block)?;
                }
            }
        }
    }
    Ok(())
}

fn check_assignment(module: &Module, lhs: &LValue, rhs: &Expression) -> Result<(), ValidationError> {
    let target = check_driven(module, lhs)?;
    let expected = get_type_width(&target);
    let actual = expression_width(module, rhs)?;
    if actual > expected {
        return Err(ValidationError::WidthMismatch {
            module_name: module.name.clone(),
            target: module.lvalue_name(lhs).unwrap_or("?").to_string(),
            expected,
            actual,
        });
    }
    Ok(())
}

/// Resolve an lvalue that is about to be driven, rejecting module inputs
fn check_driven(module: &Module, lhs: &LValue) -> Result<crate::ir::DataType, ValidationError> {
    if let LValue::Port(id) = lhs {
        if let Some(port) = module.port(*id) {
            if port.direction == PortDirection::Input {
                return Err(ValidationError::AssignToInput {
                    module_name: module.name.clone(),
                    port_name: port.name.clone(),
                });
            }
        }
    }
    module
        .lvalue_type(lhs)
        .ok_or_else(|| ValidationError::UnknownReference {
            module_name: module.name.clone(),
            reference: format!("{:?}", lhs),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{ContinuousAssign, DataType, ModuleId, ModuleInstance};
    use indexmap::IndexMap;

    fn passthrough(id: u32, width: usize) -> Module {
        let mut m = Module::new(ModuleId(id), format!("pass{}", width));
        let a = m.add_port("a".to_string(), PortDirection::Input, DataType::Int(width));
        let y = m.add_port("y".to_string(), PortDirection::Output, DataType::Int(width));
        m.assignments.push(ContinuousAssign {
            lhs: LValue::Port(y),
            rhs: Expression::port(a),
        });
        m
    }

    fn wrapper(child_width: usize, parent_width: usize) -> Design {
        let mut top = Module::new(ModuleId(0), "top".to_string());
        let a = top.add_port("a".to_string(), PortDirection::Input, DataType::Int(parent_width));
        let y = top.add_port("y".to_string(), PortDirection::Output, DataType::Int(parent_width));
        let mut connections = IndexMap::new();
        connections.insert("a".to_string(), Expression::port(a));
        connections.insert("y".to_string(), Expression::port(y));
        top.instances.push(ModuleInstance {
            name: "u0".to_string(),
            module: ModuleId(1),
            connections,
        });

        let mut design = Design::new("wrapper".to_string(), ModuleId(0));
        design.add_module(top);
        design.add_module(passthrough(1, child_width));
        design
    }

    #[test]
    fn test_valid_hierarchy() {
        assert_eq!(validate_design(&wrapper(8, 8)), Ok(()));
    }

    #[test]
    fn test_connection_width_mismatch() {
        let err = validate_design(&wrapper(8, 9)).unwrap_err();
        assert!(matches!(err, ValidationError::WidthMismatch { expected: 8, actual: 9, .. }));
    }

    #[test]
    fn test_unconnected_port() {
        let mut design = wrapper(4, 4);
        design.modules[0].instances[0].connections.shift_remove("y");
        assert!(matches!(
            validate_design(&design),
            Err(ValidationError::UnconnectedPort { .. })
        ));
    }

    #[test]
    fn test_output_to_literal_rejected() {
        let mut design = wrapper(4, 4);
        design.modules[0].instances[0].connections.insert(
            "y".to_string(),
            Expression::Literal(crate::ir::Value::BitVector { width: 4, value: 0 }),
        );
        assert!(matches!(
            validate_design(&design),
            Err(ValidationError::OutputNotAssignable { .. })
        ));
    }

    #[test]
    fn test_driving_an_input_rejected() {
        let mut m = passthrough(0, 4);
        let a = m.port_by_name("a").unwrap().id;
        let y = m.port_by_name("y").unwrap().id;
        m.assignments.push(ContinuousAssign {
            lhs: LValue::Port(a),
            rhs: Expression::port(y),
        });
        let mut design = Design::new("bad".to_string(), ModuleId(0));
        design.add_module(m);
        assert!(matches!(
            validate_design(&design),
            Err(ValidationError::AssignToInput { .. })
        ));
    }

    #[test]
    fn test_missing_top() {
        let design = Design::new("empty".to_string(), ModuleId(3));
        assert!(matches!(
            validate_design(&design),
            Err(ValidationError::UnknownModule { module_id: 3, .. })
        ));
    }
}
