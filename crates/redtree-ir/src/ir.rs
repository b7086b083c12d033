//! Structural IR
//!
//! This represents generated hardware at a level suitable for:
//! - Handing to a synthesis or netlist backend
//! - Structural validation
//! - Cycle-level simulation
//!
//! All sequential logic lives in the design's single implicit `sync` clock domain.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A complete generated design
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Design {
    /// Design name
    pub name: String,
    /// Top-level module
    pub top: ModuleId,
    /// All modules, top included
    pub modules: Vec<Module>,
    /// Pipeline latency of the top module in clock cycles
    pub latency: usize,
}

/// A hardware module
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Module {
    /// Module identifier
    pub id: ModuleId,
    /// Module name
    pub name: String,
    /// Input/output ports, in declaration order
    pub ports: Vec<Port>,
    /// Internal signals
    pub signals: Vec<Signal>,
    /// Clocked processes
    pub processes: Vec<Process>,
    /// Continuous assignments
    pub assignments: Vec<ContinuousAssign>,
    /// Submodule instances
    pub instances: Vec<ModuleInstance>,
}

/// Module identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModuleId(pub u32);

/// Port of a module
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Port {
    /// Port identifier
    pub id: PortId,
    /// Port name
    pub name: String,
    /// Port direction
    pub direction: PortDirection,
    /// Port type
    pub port_type: DataType,
}

/// Port identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PortId(pub u32);

/// Port direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PortDirection {
    Input,
    Output,
}

/// Internal signal in a module
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    /// Signal identifier
    pub id: SignalId,
    /// Signal name
    pub name: String,
    /// Signal type
    pub signal_type: DataType,
    /// Reset value (zero when absent)
    pub initial: Option<Value>,
}

/// Signal identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SignalId(pub u32);

/// Data types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    /// Unsigned bit vector
    Bit(usize),
    /// Signed two's-complement integer
    Int(usize),
}

impl DataType {
    pub fn is_signed(&self) -> bool {
        matches!(self, DataType::Int(_))
    }
}

/// Clocked process
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Process {
    /// Process identifier
    pub id: ProcessId,
    /// Process kind
    pub kind: ProcessKind,
    /// Process body
    pub body: Block,
}

/// Process identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProcessId(pub u32);

/// Kind of process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProcessKind {
    /// Updated on the rising edge of the `sync` clock (always_ff)
    Sequential,
}

/// Block of statements
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub statements: Vec<Statement>,
}

/// Statement in a process
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Statement {
    /// Non-blocking assignment
    Assignment(Assignment),
    /// Conditional statement
    If(IfStatement),
}

/// Assignment in a process
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    /// Left-hand side
    pub lhs: LValue,
    /// Right-hand side expression
    pub rhs: Expression,
}

/// If statement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IfStatement {
    /// Condition
    pub condition: Expression,
    /// Then branch
    pub then_block: Block,
    /// Else branch (optional)
    pub else_block: Option<Block>,
}

/// Left-hand value (assignable)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LValue {
    /// Port reference
    Port(PortId),
    /// Signal reference
    Signal(SignalId),
}

/// Expression (right-hand side)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expression {
    /// Literal value
    Literal(Value),
    /// LValue reference
    Ref(LValue),
    /// Binary operation
    Binary {
        op: BinaryOp,
        left: Box<Expression>,
        right: Box<Expression>,
    },
    /// Two-way multiplexer
    Conditional {
        cond: Box<Expression>,
        then_expr: Box<Expression>,
        else_expr: Box<Expression>,
    },
    /// Reinterpretation of the operand's bit pattern
    Cast {
        kind: CastKind,
        operand: Box<Expression>,
    },
}

impl Expression {
    pub fn port(id: PortId) -> Self {
        Expression::Ref(LValue::Port(id))
    }

    pub fn signal(id: SignalId) -> Self {
        Expression::Ref(LValue::Signal(id))
    }

    pub fn binary(op: BinaryOp, left: Expression, right: Expression) -> Self {
        Expression::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn mux(cond: Expression, then_expr: Expression, else_expr: Expression) -> Self {
        Expression::Conditional {
            cond: Box::new(cond),
            then_expr: Box::new(then_expr),
            else_expr: Box::new(else_expr),
        }
    }

    pub fn as_unsigned(self) -> Self {
        Expression::Cast {
            kind: CastKind::AsUnsigned,
            operand: Box::new(self),
        }
    }

    pub fn as_signed(self) -> Self {
        Expression::Cast {
            kind: CastKind::AsSigned,
            operand: Box::new(self),
        }
    }
}

/// Literal value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Value {
    /// Sized bit pattern
    BitVector { width: usize, value: u64 },
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    Add,
    Less,
    Greater,
}

/// Bit-pattern reinterpretation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CastKind {
    AsSigned,
    AsUnsigned,
}

/// Continuous assignment (outside processes)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContinuousAssign {
    /// Left-hand side
    pub lhs: LValue,
    /// Right-hand side
    pub rhs: Expression,
}

/// Module instance (hierarchy)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleInstance {
    /// Instance name
    pub name: String,
    /// Module to instantiate
    pub module: ModuleId,
    /// Child port name -> parent-scope expression. Output ports must map to a `Ref`.
    pub connections: IndexMap<String, Expression>,
}

impl Design {
    /// Create an empty design whose top module is `top`
    pub fn new(name: String, top: ModuleId) -> Self {
        Self {
            name,
            top,
            modules: Vec::new(),
            latency: 0,
        }
    }

    /// Add a module to the design
    pub fn add_module(&mut self, module: Module) {
        self.modules.push(module);
    }

    pub fn module(&self, id: ModuleId) -> Option<&Module> {
        self.modules.iter().find(|m| m.id == id)
    }

    pub fn top_module(&self) -> Option<&Module> {
        self.module(self.top)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(s: &str) -> serde_json::Result<Self> {
        serde_json::from_str(s)
    }
}

impl Module {
    /// Create a new module
    pub fn new(id: ModuleId, name: String) -> Self {
        Self {
            id,
            name,
            ports: Vec::new(),
            signals: Vec::new(),
            processes: Vec::new(),
            assignments: Vec::new(),
            instances: Vec::new(),
        }
    }

    /// Declare a port, returning its id
    pub fn add_port(&mut self, name: String, direction: PortDirection, port_type: DataType) -> PortId {
        let id = PortId(self.ports.len() as u32);
        self.ports.push(Port {
            id,
            name,
            direction,
            port_type,
        });
        id
    }

    /// Declare an internal signal with a zero reset value, returning its id
    pub fn add_signal(&mut self, name: String, signal_type: DataType) -> SignalId {
        let id = SignalId(self.signals.len() as u32);
        self.signals.push(Signal {
            id,
            name,
            signal_type,
            initial: None,
        });
        id
    }

    pub fn port(&self, id: PortId) -> Option<&Port> {
        self.ports.iter().find(|p| p.id == id)
    }

    pub fn port_by_name(&self, name: &str) -> Option<&Port> {
        self.ports.iter().find(|p| p.name == name)
    }

    pub fn signal(&self, id: SignalId) -> Option<&Signal> {
        self.signals.iter().find(|s| s.id == id)
    }

    pub fn inputs(&self) -> impl Iterator<Item = &Port> {
        self.ports
            .iter()
            .filter(|p| p.direction == PortDirection::Input)
    }

    pub fn outputs(&self) -> impl Iterator<Item = &Port> {
        self.ports
            .iter()
            .filter(|p| p.direction == PortDirection::Output)
    }

    /// Name of the port or signal an lvalue refers to
    pub fn lvalue_name(&self, lvalue: &LValue) -> Option<&str> {
        match lvalue {
            LValue::Port(id) => self.port(*id).map(|p| p.name.as_str()),
            LValue::Signal(id) => self.signal(*id).map(|s| s.name.as_str()),
        }
    }

    /// Type of the port or signal an lvalue refers to
    pub fn lvalue_type(&self, lvalue: &LValue) -> Option<DataType> {
        match lvalue {
            LValue::Port(id) => self.port(*id).map(|p| p.port_type),
            LValue::Signal(id) => self.signal(*id).map(|s| s.signal_type),
        }
    }
}
