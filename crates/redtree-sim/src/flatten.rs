//! Hierarchy flattening
//!
//! Every port and signal of every instance becomes one slot addressed by its
//! hierarchical path (`S0.sum_r_1`). Instance connections turn into
//! continuous assignments between parent and child slots.

use crate::simulator::{SimulationError, SimulationResult};
use indexmap::IndexMap;
use redtree_ir::{
    BinaryOp, Block, CastKind, DataType, Design, Expression, LValue, Module, ModuleId,
    PortDirection, Statement, Value,
};
use std::collections::HashMap;

/// Widest signal the simulator models
pub const MAX_WIDTH: usize = 64;

#[derive(Debug, Clone)]
pub(crate) struct FlatSignal {
    pub path: String,
    pub width: usize,
    pub signed: bool,
    pub reset: u128,
}

#[derive(Debug, Clone)]
pub(crate) enum FlatExpr {
    Literal { bits: u128, width: usize },
    Ref(usize),
    Binary {
        op: BinaryOp,
        left: Box<FlatExpr>,
        right: Box<FlatExpr>,
    },
    Mux {
        cond: Box<FlatExpr>,
        then_expr: Box<FlatExpr>,
        else_expr: Box<FlatExpr>,
    },
    Cast {
        kind: CastKind,
        operand: Box<FlatExpr>,
    },
}

#[derive(Debug, Clone)]
pub(crate) enum FlatStatement {
    Assign { target: usize, rhs: FlatExpr },
    If {
        cond: FlatExpr,
        then_block: Vec<FlatStatement>,
        else_block: Vec<FlatStatement>,
    },
}

#[derive(Debug, Clone, Default)]
pub(crate) struct FlatDesign {
    pub signals: Vec<FlatSignal>,
    pub index: IndexMap<String, usize>,
    /// Continuous assignments in elaboration order
    pub comb: Vec<(usize, FlatExpr)>,
    /// Clocked statements of every process
    pub seq: Vec<FlatStatement>,
    pub top_inputs: IndexMap<String, usize>,
    pub top_outputs: IndexMap<String, usize>,
}

impl FlatDesign {
    pub fn build(design: &Design) -> SimulationResult<Self> {
        let top = design.top_module().ok_or_else(|| {
            SimulationError::InvalidDesign(format!("top module {} is missing", design.top.0))
        })?;

        let mut flat = FlatDesign::default();
        let mut stack = Vec::new();
        let slots = flat.flatten_module(design, top, "", &mut stack)?;

        for port in &top.ports {
            let slot = slots[&LValue::Port(port.id)];
            match port.direction {
                PortDirection::Input => flat.top_inputs.insert(port.name.clone(), slot),
                PortDirection::Output => flat.top_outputs.insert(port.name.clone(), slot),
            };
        }

        Ok(flat)
    }

    fn flatten_module(
        &mut self,
        design: &Design,
        module: &Module,
        prefix: &str,
        stack: &mut Vec<ModuleId>,
    ) -> SimulationResult<HashMap<LValue, usize>> {
        if stack.contains(&module.id) {
            return Err(SimulationError::InvalidDesign(format!(
                "module '{}' instantiates itself",
                module.name
            )));
        }
        stack.push(module.id);

        let mut slots = HashMap::new();
        for port in &module.ports {
            let slot = self.alloc(format!("{}{}", prefix, port.name), &port.port_type, None)?;
            slots.insert(LValue::Port(port.id), slot);
        }
        for signal in &module.signals {
            let slot = self.alloc(
                format!("{}{}", prefix, signal.name),
                &signal.signal_type,
                signal.initial.as_ref(),
            )?;
            slots.insert(LValue::Signal(signal.id), slot);
        }

        for assign in &module.assignments {
            let target = resolve(module, &slots, &assign.lhs)?;
            let rhs = lower(module, &slots, &assign.rhs)?;
            self.comb.push((target, rhs));
        }

        for process in &module.processes {
            let body = lower_block(module, &slots, &process.body)?;
            self.seq.extend(body);
        }

        for instance in &module.instances {
            let child = design.module(instance.module).ok_or_else(|| {
                SimulationError::InvalidDesign(format!(
                    "instance '{}' refers to missing module {}",
                    instance.name, instance.module.0
                ))
            })?;
            let child_prefix = format!("{}{}.", prefix, instance.name);
            let child_slots = self.flatten_module(design, child, &child_prefix, stack)?;

            for (port_name, expr) in &instance.connections {
                let port = child.port_by_name(port_name).ok_or_else(|| {
                    SimulationError::InvalidDesign(format!(
                        "instance '{}' has no port '{}'",
                        instance.name, port_name
                    ))
                })?;
                let child_slot = child_slots[&LValue::Port(port.id)];
                match port.direction {
                    PortDirection::Input => {
                        let rhs = lower(module, &slots, expr)?;
                        self.comb.push((child_slot, rhs));
                    }
                    PortDirection::Output => {
                        let lvalue = match expr {
                            Expression::Ref(lvalue) => lvalue,
                            _ => {
                                return Err(SimulationError::InvalidDesign(format!(
                                    "output '{}' of '{}' is not connected to a signal",
                                    port_name, instance.name
                                )))
                            }
                        };
                        let target = resolve(module, &slots, lvalue)?;
                        self.comb.push((target, FlatExpr::Ref(child_slot)));
                    }
                }
            }
        }

        stack.pop();
        Ok(slots)
    }

    fn alloc(
        &mut self,
        path: String,
        data_type: &DataType,
        initial: Option<&Value>,
    ) -> SimulationResult<usize> {
        let width = redtree_ir::get_type_width(data_type);
        if width == 0 || width > MAX_WIDTH {
            return Err(SimulationError::UnsupportedWidth {
                signal: path,
                width,
            });
        }
        let reset = match initial {
            Some(Value::BitVector { value, .. }) => redtree_ir::bits::truncate(*value as u128, width),
            None => 0,
        };

        let slot = self.signals.len();
        self.index.insert(path.clone(), slot);
        self.signals.push(FlatSignal {
            path,
            width,
            signed: data_type.is_signed(),
            reset,
        });
        Ok(slot)
    }
}

fn resolve(
    module: &Module,
    slots: &HashMap<LValue, usize>,
    lvalue: &LValue,
) -> SimulationResult<usize> {
    slots.get(lvalue).copied().ok_or_else(|| {
        SimulationError::InvalidDesign(format!(
            "unresolved reference {:?} in module '{}'",
            lvalue, module.name
        ))
    })
}

fn lower(
    module: &Module,
    slots: &HashMap<LValue, usize>,
    expr: &Expression,
) -> SimulationResult<FlatExpr> {
    Ok(match expr {
        Expression::Literal(Value::BitVector { width, value }) => FlatExpr::Literal {
            bits: redtree_ir::bits::truncate(*value as u128, *width),
            width: *width,
        },
        Expression::Ref(lvalue) => FlatExpr::Ref(resolve(module, slots, lvalue)?),
        Expression::Binary { op, left, right } => FlatExpr::Binary {
            op: *op,
            left: Box::new(lower(module, slots, left)?),
            right: Box::new(lower(module, slots, right)?),
        },
        Expression::Conditional {
            cond,
            then_expr,
            else_expr,
        } => FlatExpr::Mux {
            cond: Box::new(lower(module, slots, cond)?),
            then_expr: Box::new(lower(module, slots, then_expr)?),
            else_expr: Box::new(lower(module, slots, else_expr)?),
        },
        Expression::Cast { kind, operand } => FlatExpr::Cast {
            kind: *kind,
            operand: Box::new(lower(module, slots, operand)?),
        },
    })
}

fn lower_block(
    module: &Module,
    slots: &HashMap<LValue, usize>,
    block: &Block,
) -> SimulationResult<Vec<FlatStatement>> {
    block
        .statements
        .iter()
        .map(|statement| {
            Ok(match statement {
                Statement::Assignment(assign) => FlatStatement::Assign {
                    target: resolve(module, slots, &assign.lhs)?,
                    rhs: lower(module, slots, &assign.rhs)?,
                },
                Statement::If(if_stmt) => FlatStatement::If {
                    cond: lower(module, slots, &if_stmt.condition)?,
                    then_block: lower_block(module, slots, &if_stmt.then_block)?,
                    else_block: match &if_stmt.else_block {
                        Some(block) => lower_block(module, slots, block)?,
                        None => Vec::new(),
                    },
                },
            })
        })
        .collect()
}
