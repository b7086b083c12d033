//! Reduction stage
//!
//! One level of the tree: `num_inputs` signed values in, `num_inputs / 2`
//! signed values out, adjacent pairs `(2k, 2k + 1)` combined through an
//! always-present combining register. Input capture and output registers are
//! optional and every register is gated by the clock enable.

use crate::error::{Result, TreeError};
use crate::operation::Combiner;
use crate::port::{input_name, output_name, PortDescriptor, CLOCK_ENABLE};
use redtree_ir::{
    Assignment, Block, ContinuousAssign, DataType, Expression, IfStatement, LValue, Module,
    ModuleId, PortDirection, Process, ProcessId, ProcessKind, Statement,
};
use std::sync::Arc;
use tracing::debug;

/// A single pipelined reduction level with fixed geometry
#[derive(Debug, Clone)]
pub struct Stage {
    name: String,
    combiner: Arc<dyn Combiner>,
    input_width: usize,
    output_width: usize,
    num_inputs: usize,
    reg_in: bool,
    reg_out: bool,
}

impl Stage {
    /// Build a stage.
    ///
    /// Fails with `InvalidGeometry` when `num_inputs` is odd or zero, when
    /// `input_width` is zero, or when the combiner's width rule overflows or
    /// yields zero.
    pub fn new(
        name: impl Into<String>,
        combiner: Arc<dyn Combiner>,
        input_width: usize,
        num_inputs: usize,
        reg_in: bool,
        reg_out: bool,
    ) -> Result<Self> {
        let name = name.into();

        if num_inputs < 2 || num_inputs % 2 != 0 {
            return Err(TreeError::InvalidGeometry(format!(
                "stage '{}' needs an even number of inputs (at least 2), got {}",
                name, num_inputs
            )));
        }
        if input_width == 0 {
            return Err(TreeError::InvalidGeometry(format!(
                "stage '{}' has zero-width inputs",
                name
            )));
        }

        let output_width = combiner.grow(input_width).ok_or_else(|| {
            TreeError::InvalidGeometry(format!(
                "operation '{}' cannot widen {}-bit inputs",
                combiner.name(),
                input_width
            ))
        })?;
        if output_width == 0 {
            return Err(TreeError::InvalidGeometry(format!(
                "operation '{}' maps width {} to zero",
                combiner.name(),
                input_width
            )));
        }

        debug!(
            stage = %name,
            operation = combiner.name(),
            num_inputs,
            input_width,
            output_width,
            reg_in,
            reg_out,
            "built stage"
        );

        Ok(Self {
            name,
            combiner,
            input_width,
            output_width,
            num_inputs,
            reg_in,
            reg_out,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn combiner(&self) -> &Arc<dyn Combiner> {
        &self.combiner
    }

    pub fn input_width(&self) -> usize {
        self.input_width
    }

    pub fn output_width(&self) -> usize {
        self.output_width
    }

    pub fn num_inputs(&self) -> usize {
        self.num_inputs
    }

    pub fn num_outputs(&self) -> usize {
        self.num_inputs / 2
    }

    pub fn reg_in(&self) -> bool {
        self.reg_in
    }

    pub fn reg_out(&self) -> bool {
        self.reg_out
    }

    /// Cycles from input to output: optional capture, combining register,
    /// optional output register
    pub fn latency(&self) -> usize {
        usize::from(self.reg_in) + 1 + usize::from(self.reg_out)
    }

    pub fn clock_enable(&self) -> PortDescriptor {
        PortDescriptor::clock_enable()
    }

    pub fn inputs(&self) -> Vec<PortDescriptor> {
        (0..self.num_inputs)
            .map(|i| PortDescriptor::input(input_name(i), DataType::Int(self.input_width)))
            .collect()
    }

    pub fn outputs(&self) -> Vec<PortDescriptor> {
        (0..self.num_outputs())
            .map(|k| PortDescriptor::output(output_name(k), DataType::Int(self.output_width)))
            .collect()
    }

    /// Clock enable, then inputs, then outputs
    pub fn ports(&self) -> Vec<PortDescriptor> {
        let mut ports = vec![self.clock_enable()];
        ports.extend(self.inputs());
        ports.extend(self.outputs());
        ports
    }

    /// Emit the stage as an IR module
    pub fn elaborate(&self, id: ModuleId) -> Module {
        let mut module = Module::new(id, self.name.clone());

        let clken = module.add_port(
            CLOCK_ENABLE.to_string(),
            PortDirection::Input,
            DataType::Bit(1),
        );
        let inputs: Vec<_> = self
            .inputs()
            .into_iter()
            .map(|p| module.add_port(p.name, p.direction, p.data_type))
            .collect();
        let outputs: Vec<_> = self
            .outputs()
            .into_iter()
            .map(|p| module.add_port(p.name, p.direction, p.data_type))
            .collect();

        let input_r: Vec<_> = (0..self.num_inputs)
            .map(|i| module.add_signal(format!("input_r_{}", i), DataType::Int(self.input_width)))
            .collect();
        let sum_r: Vec<_> = (0..self.num_outputs())
            .map(|k| module.add_signal(format!("sum_r_{}", k), DataType::Int(self.output_width)))
            .collect();

        let mut gated = Vec::new();

        for (&captured, &input) in input_r.iter().zip(&inputs) {
            let lhs = LValue::Signal(captured);
            let rhs = Expression::port(input);
            if self.reg_in {
                gated.push(Statement::Assignment(Assignment { lhs, rhs }));
            } else {
                module.assignments.push(ContinuousAssign { lhs, rhs });
            }
        }

        for (k, &sum) in sum_r.iter().enumerate() {
            let a = Expression::signal(input_r[2 * k]);
            let b = Expression::signal(input_r[2 * k + 1]);
            gated.push(Statement::Assignment(Assignment {
                lhs: LValue::Signal(sum),
                rhs: self.combiner.combine(a, b),
            }));
        }

        for (&output, &sum) in outputs.iter().zip(&sum_r) {
            let lhs = LValue::Port(output);
            let rhs = Expression::signal(sum);
            if self.reg_out {
                gated.push(Statement::Assignment(Assignment { lhs, rhs }));
            } else {
                module.assignments.push(ContinuousAssign { lhs, rhs });
            }
        }

        module.processes.push(Process {
            id: ProcessId(0),
            kind: ProcessKind::Sequential,
            body: Block {
                statements: vec![Statement::If(IfStatement {
                    condition: Expression::port(clken),
                    then_block: Block { statements: gated },
                    else_block: None,
                })],
            },
        });

        module
    }
}
