//! Simulator behavior on single stages and small trees

use redtree_gen::{Operation, Stage, Tree};
use redtree_ir::{Design, ModuleId};
use redtree_sim::{SimulationError, Simulator};
use std::sync::Arc;

fn stage_design(op: Operation, width: usize, reg_in: bool, reg_out: bool) -> Design {
    let stage = Stage::new("stage", Arc::new(op), width, 4, reg_in, reg_out).unwrap();
    let mut design = Design::new("stage".to_string(), ModuleId(0));
    design.latency = stage.latency();
    design.add_module(stage.elaborate(ModuleId(0)));
    design
}

#[test]
fn test_stage_combines_adjacent_pairs() {
    let mut sim = Simulator::new(&stage_design(Operation::AddSigned, 8, false, false)).unwrap();
    sim.set_input("clken", 1).unwrap();
    for (i, v) in [10, -3, 7, 7].iter().enumerate() {
        sim.set_input(&format!("input_{}", i), *v).unwrap();
    }

    assert_eq!(sim.get_output("output_0").unwrap(), 0);
    sim.step().unwrap();
    assert_eq!(sim.get_output("output_0").unwrap(), 7);
    assert_eq!(sim.get_output("output_1").unwrap(), 14);
}

#[test]
fn test_registered_stage_takes_three_cycles() {
    let mut sim = Simulator::new(&stage_design(Operation::MinSigned, 8, true, true)).unwrap();
    sim.set_input("clken", 1).unwrap();
    for (i, v) in [-1, 5, 100, -100].iter().enumerate() {
        sim.set_input(&format!("input_{}", i), *v).unwrap();
    }

    sim.run(2).unwrap();
    assert_eq!(sim.peek("sum_r_0").unwrap(), -1);
    assert_eq!(sim.get_output("output_0").unwrap(), 0);

    sim.step().unwrap();
    assert_eq!(sim.get_output("output_0").unwrap(), -1);
    assert_eq!(sim.get_output("output_1").unwrap(), -100);
    assert_eq!(sim.cycle(), 3);
}

#[test]
fn test_clock_enable_low_holds_registers() {
    let mut sim = Simulator::new(&stage_design(Operation::MaxUnsigned, 8, true, false)).unwrap();
    sim.set_input("clken", 1).unwrap();
    sim.set_input("input_0", 1).unwrap();
    sim.set_input("input_1", 2).unwrap();
    sim.run(2).unwrap();
    assert_eq!(sim.get_output("output_0").unwrap(), 2);

    sim.set_input("clken", 0).unwrap();
    sim.set_input("input_0", 50).unwrap();
    sim.run(3).unwrap();
    assert_eq!(sim.peek("input_r_0").unwrap(), 1);
    assert_eq!(sim.get_output("output_0").unwrap(), 2);
}

#[test]
fn test_hierarchical_peek() {
    let tree = Tree::new(Operation::AddUnsigned, 4, 2, false, false).unwrap();
    let mut sim = Simulator::new(&tree.elaborate().unwrap()).unwrap();
    sim.set_input("clken", 1).unwrap();
    for (i, v) in [1, 2, 3, 4].iter().enumerate() {
        sim.set_input(&format!("input_{}", i), *v).unwrap();
    }
    sim.step().unwrap();
    assert_eq!(sim.peek("S0.output_0").unwrap(), 3);
    assert_eq!(sim.peek("S0.output_1").unwrap(), 7);
    assert_eq!(sim.peek("s0_output_1").unwrap(), 7);
    assert_eq!(sim.peek("S1.input_1").unwrap(), 7);
}

#[test]
fn test_input_errors() {
    let tree = Tree::new(Operation::AddSigned, 4, 1, false, false).unwrap();
    let mut sim = Simulator::new(&tree.elaborate().unwrap()).unwrap();

    assert!(matches!(
        sim.set_input("input_0", 8),
        Err(SimulationError::InvalidInput(_))
    ));
    assert!(sim.set_input("input_0", -8).is_ok());
    assert!(matches!(
        sim.set_input("clken", 2),
        Err(SimulationError::InvalidInput(_))
    ));
    assert!(matches!(
        sim.set_input("output", 0),
        Err(SimulationError::NotAnInput(_))
    ));
    assert!(matches!(
        sim.set_input("bogus", 0),
        Err(SimulationError::UnknownSignal(_))
    ));
    assert!(matches!(
        sim.get_output("input_0"),
        Err(SimulationError::NotAnOutput(_))
    ));
    assert!(matches!(sim.peek("S7.x"), Err(SimulationError::UnknownSignal(_))));
}

#[test]
fn test_reset_clears_state() {
    let tree = Tree::new(Operation::MaxSigned, 8, 1, false, false).unwrap();
    let mut sim = Simulator::new(&tree.elaborate().unwrap()).unwrap();
    sim.set_input("clken", 1).unwrap();
    sim.set_input("input_0", 9).unwrap();
    sim.step().unwrap();
    assert_eq!(sim.get_output("output").unwrap(), 9);

    sim.reset().unwrap();
    assert_eq!(sim.cycle(), 0);
    assert_eq!(sim.get_output("output").unwrap(), 0);
    assert_eq!(sim.peek("input_0").unwrap(), 0);
}

#[test]
fn test_wide_design_rejected() {
    let tree = Tree::new(Operation::AddSigned, 64, 1, false, false).unwrap();
    let design = tree.elaborate().unwrap();
    assert!(matches!(
        Simulator::new(&design),
        Err(SimulationError::UnsupportedWidth { width: 65, .. })
    ));
}

#[test]
fn test_port_listing() {
    let tree = Tree::new(Operation::MinSigned, 8, 1, false, false).unwrap();
    let sim = Simulator::new(&tree.elaborate().unwrap()).unwrap();
    let inputs: Vec<_> = sim.input_names().collect();
    assert_eq!(inputs, vec!["clken", "input_0", "input_1"]);
    let outputs: Vec<_> = sim.output_names().collect();
    assert_eq!(outputs, vec!["output"]);
}
