//! Tree test harness
//!
//! Wraps a [`Tree`], its elaborated design and a [`Simulator`] so tests can
//! present input vectors, gate the clock enable and watch the output.

use anyhow::{ensure, Context, Result};
use redtree_gen::{input_name, Tree, CLOCK_ENABLE, TREE_OUTPUT};
use redtree_ir::Design;
use redtree_sim::Simulator;
use tracing::debug;

pub struct TreeHarness {
    tree: Tree,
    design: Design,
    sim: Simulator,
}

impl TreeHarness {
    /// Elaborate and load `tree` with the clock enable asserted
    pub fn new(tree: Tree) -> Result<Self> {
        let design = tree
            .elaborate()
            .with_context(|| format!("failed to elaborate {}", tree.name()))?;
        let mut sim = Simulator::new(&design)
            .with_context(|| format!("failed to load {} into the simulator", design.name))?;
        sim.set_input(CLOCK_ENABLE, 1)?;
        debug!(design = %design.name, latency = tree.latency(), "harness ready");
        Ok(Self { tree, design, sim })
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn design(&self) -> &Design {
        &self.design
    }

    pub fn sim(&self) -> &Simulator {
        &self.sim
    }

    pub fn cycle(&self) -> u64 {
        self.sim.cycle()
    }

    /// Drive every tree input at once
    pub fn present(&mut self, inputs: &[i64]) -> Result<()> {
        ensure!(
            inputs.len() == self.tree.num_inputs(),
            "{} expects {} inputs, got {}",
            self.tree.name(),
            self.tree.num_inputs(),
            inputs.len()
        );
        for (i, value) in inputs.iter().enumerate() {
            self.sim
                .set_input(&input_name(i), *value)
                .with_context(|| format!("failed to drive {}", input_name(i)))?;
        }
        Ok(())
    }

    pub fn set_clock_enable(&mut self, enabled: bool) -> Result<()> {
        self.sim.set_input(CLOCK_ENABLE, i64::from(enabled))?;
        Ok(())
    }

    /// Advance one clock edge
    pub fn tick(&mut self) -> Result<()> {
        self.sim.step()?;
        Ok(())
    }

    pub fn ticks(&mut self, cycles: u64) -> Result<()> {
        self.sim.run(cycles)?;
        Ok(())
    }

    pub fn output(&self) -> Result<i64> {
        Ok(self.sim.get_output(TREE_OUTPUT)?)
    }

    /// Read an internal signal by hierarchical path
    pub fn peek(&self, path: &str) -> Result<i64> {
        Ok(self.sim.peek(path)?)
    }

    /// Present `inputs`, clock for exactly the tree latency and return the output
    pub fn run_to_latency(&mut self, inputs: &[i64]) -> Result<i64> {
        self.present(inputs)?;
        self.ticks(self.tree.latency() as u64)?;
        self.output()
    }
}

/// Install a test subscriber honoring `RUST_LOG`; safe to call repeatedly
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
