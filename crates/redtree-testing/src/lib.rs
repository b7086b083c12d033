//! redtree Testing Framework
//!
//! This crate provides:
//! - A harness that elaborates a tree and drives it cycle by cycle
//! - A bit-exact behavioral model of the reduction
//! - Golden file comparison

pub mod golden;
pub mod harness;
pub mod reference;

pub use golden::GoldenTest;
pub use harness::{init_tracing, TreeHarness};
pub use reference::{reduce_levels, reference_reduce};
