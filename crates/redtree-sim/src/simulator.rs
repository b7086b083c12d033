//! Cycle-level simulator
//!
//! Each `step` models one rising edge of the implicit `sync` clock:
//! combinational logic settles, every clocked assignment samples the settled
//! values, all registers commit together, and logic settles again.

use crate::eval::eval;
use crate::flatten::{FlatDesign, FlatStatement, MAX_WIDTH};
use redtree_ir::bits::{from_signed, sign_extend};
use redtree_ir::{validate_design, Design, ValidationError};
use thiserror::Error;
use tracing::trace;

/// Errors that can occur during simulation
#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("Invalid design: {0}")]
    InvalidDesign(String),
    #[error("Design failed validation: {0}")]
    Validation(#[from] ValidationError),
    #[error("Signal '{signal}' is {width} bits wide; widths 1..={max} are supported", max = MAX_WIDTH)]
    UnsupportedWidth { signal: String, width: usize },
    #[error("Unknown signal: {0}")]
    UnknownSignal(String),
    #[error("'{0}' is not a top-level input")]
    NotAnInput(String),
    #[error("'{0}' is not a top-level output")]
    NotAnOutput(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Combinational logic did not settle after {0} passes")]
    CombinationalLoop(usize),
}

/// Result type for simulation operations
pub type SimulationResult<T> = Result<T, SimulationError>;

/// Simulator for a single elaborated design
#[derive(Debug, Clone)]
pub struct Simulator {
    name: String,
    flat: FlatDesign,
    values: Vec<u128>,
    cycle: u64,
}

impl Simulator {
    /// Validate and flatten `design`, starting from reset values
    pub fn new(design: &Design) -> SimulationResult<Self> {
        validate_design(design)?;
        let flat = FlatDesign::build(design)?;
        let values = flat.signals.iter().map(|s| s.reset).collect();

        let mut sim = Self {
            name: design.name.clone(),
            flat,
            values,
            cycle: 0,
        };
        sim.settle()?;
        Ok(sim)
    }

    /// Number of clock edges simulated since construction or reset
    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    pub fn input_names(&self) -> impl Iterator<Item = &str> {
        self.flat.top_inputs.keys().map(String::as_str)
    }

    pub fn output_names(&self) -> impl Iterator<Item = &str> {
        self.flat.top_outputs.keys().map(String::as_str)
    }

    /// Drive a top-level input. The value must fit the port's type.
    pub fn set_input(&mut self, name: &str, value: i64) -> SimulationResult<()> {
        let slot = *self
            .flat
            .top_inputs
            .get(name)
            .ok_or_else(|| self.missing(name, SimulationError::NotAnInput(name.to_string())))?;
        let signal = &self.flat.signals[slot];

        let (min, max) = if signal.signed {
            (-(1i128 << (signal.width - 1)), (1i128 << (signal.width - 1)) - 1)
        } else {
            (0, (1i128 << signal.width) - 1)
        };
        let value = i128::from(value);
        if value < min || value > max {
            return Err(SimulationError::InvalidInput(format!(
                "{} does not fit '{}' ({} bits, {})",
                value,
                name,
                signal.width,
                if signal.signed { "signed" } else { "unsigned" }
            )));
        }

        self.values[slot] = from_signed(value, signal.width);
        self.settle()
    }

    /// Read a top-level output
    pub fn get_output(&self, name: &str) -> SimulationResult<i64> {
        let slot = *self
            .flat
            .top_outputs
            .get(name)
            .ok_or_else(|| self.missing(name, SimulationError::NotAnOutput(name.to_string())))?;
        Ok(self.read(slot))
    }

    /// Read any signal by hierarchical path, e.g. `S0.output_1`
    pub fn peek(&self, path: &str) -> SimulationResult<i64> {
        let slot = *self
            .flat
            .index
            .get(path)
            .ok_or_else(|| SimulationError::UnknownSignal(path.to_string()))?;
        Ok(self.read(slot))
    }

    /// Advance one clock edge
    pub fn step(&mut self) -> SimulationResult<()> {
        self.settle()?;

        let mut pending = Vec::new();
        for statement in &self.flat.seq {
            self.collect(statement, &mut pending);
        }
        for (slot, bits) in pending {
            self.values[slot] = bits;
        }

        self.settle()?;
        self.cycle += 1;
        trace!(design = %self.name, cycle = self.cycle, "clock edge");
        Ok(())
    }

    /// Advance `cycles` clock edges
    pub fn run(&mut self, cycles: u64) -> SimulationResult<()> {
        for _ in 0..cycles {
            self.step()?;
        }
        Ok(())
    }

    /// Return every signal to its reset value, keeping nothing from inputs
    pub fn reset(&mut self) -> SimulationResult<()> {
        for (value, signal) in self.values.iter_mut().zip(&self.flat.signals) {
            *value = signal.reset;
        }
        self.cycle = 0;
        self.settle()
    }

    fn read(&self, slot: usize) -> i64 {
        let signal = &self.flat.signals[slot];
        let bits = self.values[slot];
        if signal.signed {
            sign_extend(bits, signal.width) as i64
        } else {
            bits as i64
        }
    }

    fn missing(&self, name: &str, err: SimulationError) -> SimulationError {
        if self.flat.index.contains_key(name) {
            err
        } else {
            SimulationError::UnknownSignal(name.to_string())
        }
    }

    /// Re-evaluate continuous assignments until nothing changes
    fn settle(&mut self) -> SimulationResult<()> {
        let limit = self.flat.comb.len() + 1;
        for _ in 0..limit {
            let mut changed = false;
            for (target, expr) in &self.flat.comb {
                let signal = &self.flat.signals[*target];
                let bits = eval(expr, &self.flat.signals, &self.values).to_width(signal.width);
                if self.values[*target] != bits {
                    self.values[*target] = bits;
                    changed = true;
                }
            }
            if !changed {
                return Ok(());
            }
        }
        Err(SimulationError::CombinationalLoop(limit))
    }

    fn collect(&self, statement: &FlatStatement, pending: &mut Vec<(usize, u128)>) {
        match statement {
            FlatStatement::Assign { target, rhs } => {
                let width = self.flat.signals[*target].width;
                let bits = eval(rhs, &self.flat.signals, &self.values).to_width(width);
                pending.push((*target, bits));
            }
            FlatStatement::If {
                cond,
                then_block,
                else_block,
            } => {
                let taken = eval(cond, &self.flat.signals, &self.values).bits != 0;
                let block = if taken { then_block } else { else_block };
                for inner in block {
                    self.collect(inner, pending);
                }
            }
        }
    }
}
