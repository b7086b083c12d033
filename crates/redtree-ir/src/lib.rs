//! redtree IR - structural description of generated hardware
//!
//! This crate handles:
//! - Module hierarchy, ports, signals and register placement
//! - Width inference for expressions
//! - Structural validation
//! - Serialization and text summaries for backends

pub mod bits;
pub mod ir;
pub mod summary;
pub mod type_width;
pub mod validation;

pub use ir::{
    Assignment, BinaryOp, Block, CastKind, ContinuousAssign, DataType, Design, Expression,
    IfStatement, LValue, Module, ModuleId, ModuleInstance, Port, PortDirection, PortId, Process,
    ProcessId, ProcessKind, Signal, SignalId, Statement, Value,
};
pub use summary::{registered_lvalues, render_summary, type_name};
pub use type_width::{data_type, expression_type, expression_width, get_type_width};
pub use validation::{validate_design, ValidationError};
