//! Named port descriptors
//!
//! Stages and trees expose their interface as ordered lists of descriptors so
//! a backend can enumerate, name and trace every signal.

use redtree_ir::{get_type_width, DataType, PortDirection};
use serde::{Deserialize, Serialize};

/// Name of the clock-enable port on every stage and tree
pub const CLOCK_ENABLE: &str = "clken";

/// One port of a stage or tree
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PortDescriptor {
    pub name: String,
    pub direction: PortDirection,
    pub data_type: DataType,
}

impl PortDescriptor {
    pub fn input(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            direction: PortDirection::Input,
            data_type,
        }
    }

    pub fn output(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            direction: PortDirection::Output,
            data_type,
        }
    }

    pub fn clock_enable() -> Self {
        Self::input(CLOCK_ENABLE, DataType::Bit(1))
    }

    pub fn width(&self) -> usize {
        get_type_width(&self.data_type)
    }

    pub fn is_signed(&self) -> bool {
        self.data_type.is_signed()
    }
}

/// Name of the `index`th data input
pub fn input_name(index: usize) -> String {
    format!("input_{}", index)
}

/// Name of the `index`th stage output
pub fn output_name(index: usize) -> String {
    format!("output_{}", index)
}
