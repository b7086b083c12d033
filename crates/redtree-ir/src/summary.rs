//! Text summary of a design
//!
//! A stable, line-oriented listing of the hierarchy, ports, signals and
//! register placement. Backends use it for naming and signal tracing; the test
//! suite compares it against golden files.

use crate::ir::{Block, DataType, Design, LValue, Module, PortDirection, Statement};
use std::collections::HashSet;
use std::fmt::Write;

/// Render `design` as text
pub fn render_summary(design: &Design) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "design {}", design.name);
    let _ = writeln!(out, "  latency: {}", design.latency);

    for module in &design.modules {
        render_module(&mut out, design, module);
    }

    out
}

fn render_module(out: &mut String, design: &Design, module: &Module) {
    let is_top = module.id == design.top;
    let registers = registered_lvalues(module);

    if is_top {
        let _ = writeln!(out, "module {} (top)", module.name);
    } else {
        let _ = writeln!(out, "module {}", module.name);
    }

    for port in &module.ports {
        let dir = match port.direction {
            PortDirection::Input => "in",
            PortDirection::Output => "out",
        };
        let reg = if registers.contains(&LValue::Port(port.id)) {
            " (reg)"
        } else {
            ""
        };
        let _ = writeln!(
            out,
            "  {} {}: {}{}",
            dir,
            port.name,
            type_name(&port.port_type),
            reg
        );
    }

    for signal in &module.signals {
        let kind = if registers.contains(&LValue::Signal(signal.id)) {
            "reg"
        } else {
            "wire"
        };
        let _ = writeln!(
            out,
            "  {} {}: {}",
            kind,
            signal.name,
            type_name(&signal.signal_type)
        );
    }

    for instance in &module.instances {
        let child = design
            .module(instance.module)
            .map(|m| m.name.as_str())
            .unwrap_or("?");
        let _ = writeln!(out, "  inst {}: {}", instance.name, child);
    }
}

/// HDL-style type name, e.g. `int[8]`
pub fn type_name(data_type: &DataType) -> String {
    match data_type {
        DataType::Bit(w) => format!("bit[{}]", w),
        DataType::Int(w) => format!("int[{}]", w),
    }
}

/// Every lvalue assigned inside a clocked process
pub fn registered_lvalues(module: &Module) -> HashSet<LValue> {
    let mut regs = HashSet::new();
    for process in &module.processes {
        collect_targets(&process.body, &mut regs);
    }
    regs
}

fn collect_targets(block: &Block, regs: &mut HashSet<LValue>) {
    for statement in &block.statements {
        match statement {
            Statement::Assignment(assign) => {
                regs.insert(assign.lhs);
            }
            Statement::If(if_stmt) => {
                collect_targets(&if_stmt.then_block, regs);
                if let Some(else_block) = &if_stmt.else_block {
                    collect_targets(else_block, regs);
                }
            }
        }
    }
}
