//! redtree generator - pipelined binary-tree reduction networks
//!
//! This crate handles:
//! - Operation variants (combining function + width rule)
//! - The reusable reduction stage primitive
//! - Chaining stages into a tree with consistent widths and latency
//! - Elaboration to the structural IR
//! - TOML tree configuration

pub mod config;
pub mod error;
pub mod operation;
pub mod port;
pub mod stage;
pub mod tree;

pub use config::TreeConfig;
pub use error::{Result, TreeError};
pub use operation::{Combiner, Operation, EVAL_WIDTH};
pub use port::{input_name, output_name, PortDescriptor, CLOCK_ENABLE};
pub use stage::Stage;
pub use tree::{Tree, TreeBuilder, TREE_OUTPUT};
