//! Reduction tree
//!
//! Chains `N` stages so that `2^N` inputs collapse to one output. Stage `i`
//! has fan-in `2^(N-i)` and takes its input width from the previous stage's
//! output width. All stages share one combiner and one clock enable.

use crate::config::TreeConfig;
use crate::error::{Result, TreeError};
use crate::operation::{Combiner, Operation};
use crate::port::{input_name, output_name, PortDescriptor, CLOCK_ENABLE};
use crate::stage::Stage;
use indexmap::IndexMap;
use redtree_ir::{
    validate_design, DataType, Design, Expression, Module, ModuleId, ModuleInstance,
    PortDirection,
};
use std::sync::Arc;
use tracing::info;

/// Name of the tree's scalar output port
pub const TREE_OUTPUT: &str = "output";

/// A pipelined reduction tree with fixed geometry
#[derive(Debug, Clone)]
pub struct Tree {
    name: String,
    combiner: Arc<dyn Combiner>,
    input_width: usize,
    stages: Vec<Stage>,
}

/// Builder for [`Tree`]
#[derive(Debug, Clone)]
pub struct TreeBuilder {
    name: Option<String>,
    combiner: Arc<dyn Combiner>,
    input_width: usize,
    num_stages: usize,
    input_count: Option<usize>,
    reg_in: bool,
    reg_out: bool,
}

impl TreeBuilder {
    fn new(combiner: Arc<dyn Combiner>) -> Self {
        Self {
            name: None,
            combiner,
            input_width: 0,
            num_stages: 0,
            input_count: None,
            reg_in: false,
            reg_out: false,
        }
    }

    /// Top-level module name (defaults to `<operation>_tree`)
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn input_width(mut self, width: usize) -> Self {
        self.input_width = width;
        self
    }

    pub fn num_stages(mut self, num_stages: usize) -> Self {
        self.num_stages = num_stages;
        self
    }

    /// Declared number of inputs; must equal `2^num_stages`
    pub fn input_count(mut self, count: usize) -> Self {
        self.input_count = Some(count);
        self
    }

    pub fn reg_in(mut self, reg_in: bool) -> Self {
        self.reg_in = reg_in;
        self
    }

    pub fn reg_out(mut self, reg_out: bool) -> Self {
        self.reg_out = reg_out;
        self
    }

    /// Validate the geometry, then build every stage bottom-up
    pub fn build(self) -> Result<Tree> {
        if self.num_stages == 0 {
            return Err(TreeError::InvalidGeometry(
                "a tree needs at least one stage".to_string(),
            ));
        }

        let num_inputs = u32::try_from(self.num_stages)
            .ok()
            .and_then(|n| 2usize.checked_pow(n))
            .ok_or_else(|| {
                TreeError::InvalidGeometry(format!(
                    "{} stages exceed the addressable input count",
                    self.num_stages
                ))
            })?;

        if let Some(count) = self.input_count {
            if count != num_inputs {
                return Err(TreeError::InvalidGeometry(format!(
                    "{} stages consume {} inputs, but {} were declared",
                    self.num_stages, num_inputs, count
                )));
            }
        }

        if self.input_width == 0 {
            return Err(TreeError::InvalidGeometry(
                "input width must be positive".to_string(),
            ));
        }

        let name = self
            .name
            .unwrap_or_else(|| format!("{}_tree", self.combiner.name().replace('-', "_")));

        let mut stages: Vec<Stage> = Vec::with_capacity(self.num_stages);
        for i in 0..self.num_stages {
            let stage_input_width = stages
                .last()
                .map(|s| s.output_width())
                .unwrap_or(self.input_width);
            let stage = Stage::new(
                format!("{}_stage{}", name, i),
                Arc::clone(&self.combiner),
                stage_input_width,
                num_inputs >> i,
                self.reg_in,
                self.reg_out,
            )?;
            stages.push(stage);
        }

        Ok(Tree {
            name,
            combiner: self.combiner,
            input_width: self.input_width,
            stages,
        })
    }
}

impl Tree {
    /// Start building a tree for a built-in operation
    pub fn builder(operation: Operation) -> TreeBuilder {
        TreeBuilder::new(Arc::new(operation))
    }

    /// Start building a tree around any combiner
    pub fn builder_with(combiner: Arc<dyn Combiner>) -> TreeBuilder {
        TreeBuilder::new(combiner)
    }

    pub fn new(
        operation: Operation,
        input_width: usize,
        num_stages: usize,
        reg_in: bool,
        reg_out: bool,
    ) -> Result<Self> {
        Self::builder(operation)
            .input_width(input_width)
            .num_stages(num_stages)
            .reg_in(reg_in)
            .reg_out(reg_out)
            .build()
    }

    /// Build from a parsed configuration, resolving the operation by name
    pub fn from_config(config: &TreeConfig) -> Result<Self> {
        let mut builder = Self::builder(config.operation()?)
            .input_width(config.input_width)
            .num_stages(config.num_stages)
            .reg_in(config.reg_in)
            .reg_out(config.reg_out);
        if let Some(name) = &config.name {
            builder = builder.name(name.clone());
        }
        if let Some(count) = config.input_count {
            builder = builder.input_count(count);
        }
        builder.build()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn combiner(&self) -> &Arc<dyn Combiner> {
        &self.combiner
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn num_stages(&self) -> usize {
        self.stages.len()
    }

    pub fn num_inputs(&self) -> usize {
        self.stages[0].num_inputs()
    }

    pub fn input_width(&self) -> usize {
        self.input_width
    }

    /// Width after `N` applications of the width rule
    pub fn output_width(&self) -> usize {
        self.stages[self.stages.len() - 1].output_width()
    }

    /// `(input_width, output_width)` of each stage
    pub fn stage_widths(&self) -> Vec<(usize, usize)> {
        self.stages
            .iter()
            .map(|s| (s.input_width(), s.output_width()))
            .collect()
    }

    /// Sum of the stage latencies
    pub fn latency(&self) -> usize {
        self.stages.iter().map(Stage::latency).sum()
    }

    pub fn clock_enable(&self) -> PortDescriptor {
        PortDescriptor::clock_enable()
    }

    pub fn inputs(&self) -> Vec<PortDescriptor> {
        (0..self.num_inputs())
            .map(|i| PortDescriptor::input(input_name(i), DataType::Int(self.input_width)))
            .collect()
    }

    pub fn output(&self) -> PortDescriptor {
        PortDescriptor::output(TREE_OUTPUT, DataType::Int(self.output_width()))
    }

    /// Clock enable, then inputs, then the output
    pub fn ports(&self) -> Vec<PortDescriptor> {
        let mut ports = vec![self.clock_enable()];
        ports.extend(self.inputs());
        ports.push(self.output());
        ports
    }

    /// Emit the tree and its stages as a validated design.
    ///
    /// The top module is `ModuleId(0)`; stage `i` is `ModuleId(i + 1)`,
    /// instantiated as `S{i}`.
    pub fn elaborate(&self) -> Result<Design> {
        let top_id = ModuleId(0);
        let mut top = Module::new(top_id, self.name.clone());

        let clken = top.add_port(
            CLOCK_ENABLE.to_string(),
            PortDirection::Input,
            DataType::Bit(1),
        );
        let mut feed: Vec<Expression> = self
            .inputs()
            .into_iter()
            .map(|p| Expression::port(top.add_port(p.name, p.direction, p.data_type)))
            .collect();
        let output = top.add_port(
            TREE_OUTPUT.to_string(),
            PortDirection::Output,
            DataType::Int(self.output_width()),
        );

        let mut stage_modules = Vec::with_capacity(self.stages.len());
        let last = self.stages.len() - 1;

        for (i, stage) in self.stages.iter().enumerate() {
            let module_id = ModuleId(i as u32 + 1);

            let mut connections = IndexMap::new();
            connections.insert(CLOCK_ENABLE.to_string(), Expression::port(clken));
            for (j, upstream) in feed.iter().enumerate() {
                connections.insert(input_name(j), upstream.clone());
            }

            let mut next = Vec::with_capacity(stage.num_outputs());
            for k in 0..stage.num_outputs() {
                let target = if i == last {
                    Expression::port(output)
                } else {
                    Expression::signal(top.add_signal(
                        format!("s{}_{}", i, output_name(k)),
                        DataType::Int(stage.output_width()),
                    ))
                };
                connections.insert(output_name(k), target.clone());
                next.push(target);
            }

            top.instances.push(ModuleInstance {
                name: format!("S{}", i),
                module: module_id,
                connections,
            });
            stage_modules.push(stage.elaborate(module_id));
            feed = next;
        }

        let mut design = Design::new(self.name.clone(), top_id);
        design.latency = self.latency();
        design.add_module(top);
        for module in stage_modules {
            design.add_module(module);
        }

        validate_design(&design)?;

        info!(
            design = %design.name,
            operation = self.combiner.name(),
            stages = self.stages.len(),
            input_width = self.input_width,
            output_width = self.output_width(),
            latency = design.latency,
            "elaborated reduction tree"
        );

        Ok(design)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_stages_rejected() {
        let err = Tree::new(Operation::AddSigned, 8, 0, false, false).unwrap_err();
        assert!(matches!(err, TreeError::InvalidGeometry(_)));
    }

    #[test]
    fn test_input_count_must_be_power_of_two() {
        let err = Tree::builder(Operation::AddSigned)
            .input_width(8)
            .num_stages(2)
            .input_count(5)
            .build()
            .unwrap_err();
        assert!(matches!(err, TreeError::InvalidGeometry(_)));
    }

    #[test]
    fn test_matching_input_count_accepted() {
        let tree = Tree::builder(Operation::AddSigned)
            .input_width(8)
            .num_stages(3)
            .input_count(8)
            .build()
            .unwrap();
        assert_eq!(tree.num_inputs(), 8);
    }

    #[test]
    fn test_huge_stage_count_rejected() {
        let err = Tree::new(Operation::MaxSigned, 8, 200, false, false).unwrap_err();
        assert!(matches!(err, TreeError::InvalidGeometry(_)));
    }

    #[test]
    fn test_width_overflow_rejected() {
        let err = Tree::new(Operation::AddSigned, usize::MAX, 1, false, false).unwrap_err();
        assert!(matches!(err, TreeError::InvalidGeometry(_)));

        // the first stage fits, the second would overflow
        let err = Tree::new(Operation::AddUnsigned, usize::MAX - 1, 2, false, false).unwrap_err();
        assert!(matches!(err, TreeError::InvalidGeometry(_)));
    }

    #[test]
    fn test_stages_share_one_combiner() {
        let tree = Tree::new(Operation::MaxUnsigned, 8, 3, false, false).unwrap();
        assert_eq!(tree.combiner().name(), "max-unsigned");
        for stage in tree.stages() {
            assert!(Arc::ptr_eq(stage.combiner(), tree.combiner()));
        }
    }

    #[test]
    fn test_tree_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Tree>();
        assert_send_sync::<Stage>();
        assert_send_sync::<TreeBuilder>();

        let tree = Arc::new(Tree::new(Operation::AddSigned, 8, 2, true, true).unwrap());
        let shared = Arc::clone(&tree);
        let latency = std::thread::spawn(move || shared.latency()).join().unwrap();
        assert_eq!(latency, tree.latency());
    }

    #[test]
    fn test_design_json_round_trip() {
        let design = Tree::new(Operation::AddUnsigned, 4, 2, true, false)
            .unwrap()
            .elaborate()
            .unwrap();
        let json = design.to_json().unwrap();
        assert!(json.contains("add_unsigned_tree_stage1"));
        assert_eq!(Design::from_json(&json).unwrap(), design);
    }

    #[test]
    fn test_stage_geometry_chain() {
        let tree = Tree::new(Operation::AddUnsigned, 4, 3, false, true).unwrap();
        assert_eq!(tree.stage_widths(), vec![(4, 5), (5, 6), (6, 7)]);
        let fan_in: Vec<_> = tree.stages().iter().map(Stage::num_inputs).collect();
        assert_eq!(fan_in, vec![8, 4, 2]);
        assert_eq!(tree.stages()[2].num_outputs(), 1);
        assert_eq!(tree.output_width(), 7);
        assert_eq!(tree.latency(), 6);
    }

    #[test]
    fn test_default_name() {
        let tree = Tree::new(Operation::MinUnsigned, 8, 1, false, false).unwrap();
        assert_eq!(tree.name(), "min_unsigned_tree");
        assert_eq!(tree.stages()[0].name(), "min_unsigned_tree_stage0");
    }

    #[test]
    fn test_ports() {
        let tree = Tree::new(Operation::AddSigned, 8, 2, false, false).unwrap();
        let ports = tree.ports();
        assert_eq!(ports.len(), 1 + 4 + 1);
        assert_eq!(ports[0], PortDescriptor::clock_enable());
        assert_eq!(ports[4].name, "input_3");
        assert_eq!(ports[5], PortDescriptor::output("output", DataType::Int(10)));
    }

    #[test]
    fn test_elaborate_wires_stages() {
        let tree = Tree::new(Operation::AddSigned, 8, 2, true, false).unwrap();
        let design = tree.elaborate().unwrap();
        assert_eq!(design.modules.len(), 3);
        assert_eq!(design.latency, 4);

        let top = design.top_module().unwrap();
        assert_eq!(top.instances.len(), 2);
        assert_eq!(top.signals.len(), 2);
        assert_eq!(top.signals[1].name, "s0_output_1");

        let s1 = &top.instances[1];
        assert_eq!(s1.name, "S1");
        assert_eq!(
            s1.connections.get("input_1"),
            Some(&Expression::signal(top.signals[1].id))
        );
        let output = top.port_by_name(TREE_OUTPUT).unwrap().id;
        assert_eq!(s1.connections.get("output_0"), Some(&Expression::port(output)));
    }

    #[derive(Debug)]
    struct Truncating;

    impl Combiner for Truncating {
        fn name(&self) -> &str {
            "truncating"
        }

        fn combine(&self, a: Expression, b: Expression) -> Expression {
            Expression::binary(redtree_ir::BinaryOp::Add, a, b)
        }

        fn grow(&self, input_width: usize) -> Option<usize> {
            Some(input_width)
        }
    }

    #[test]
    fn test_inconsistent_combiner_fails_validation() {
        let tree = Tree::builder_with(Arc::new(Truncating))
            .input_width(8)
            .num_stages(1)
            .build()
            .unwrap();
        assert!(matches!(tree.elaborate(), Err(TreeError::Validation(_))));
    }
}
