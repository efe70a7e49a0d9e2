//! Graph Intermediate Representation (IR) for model export
//!
//! This module defines the operation/value graph that model-level passes run
//! over right before the graph is finalized into a serialized model. The IR is
//! designed to be:
//! - Explicit (every value has exactly one definition)
//! - Ordered (blocks and instructions keep their program order)
//! - Cheap to clone and rewire (instructions live in a per-function arena)
//! - Serializable, so tools can load and save functions as JSON

pub mod types;
pub mod instructions;
pub mod blocks;
pub mod functions;
pub mod modules;
pub mod builder;
pub mod dump;
pub mod optimization;
pub mod dominance;
pub mod validation;
pub mod stateful;
pub mod split_merged_operands;

pub use types::*;
pub use instructions::*;
pub use blocks::*;
pub use functions::*;
pub use modules::*;
pub use builder::*;

use serde::{Deserialize, Serialize};
use std::fmt;

/// IR version for compatibility checking
pub const IR_VERSION: u32 = 1;

/// Unique identifier for IR values (instruction results and parameters)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IrId(u32);

impl IrId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn invalid() -> Self {
        Self(u32::MAX)
    }

    pub fn is_valid(&self) -> bool {
        self.0 != u32::MAX
    }

    pub fn as_u32(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for IrId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}", self.0)
    }
}

/// Identifier of an instruction inside its function's arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IrInstId(pub u32);

impl IrInstId {
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for IrInstId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "op{}", self.0)
    }
}

/// Source location information for debugging
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct IrSourceLocation {
    pub file_id: u32,
    pub line: u32,
    pub column: u32,
}

impl IrSourceLocation {
    pub fn new(file_id: u32, line: u32, column: u32) -> Self {
        Self {
            file_id,
            line,
            column,
        }
    }

    pub fn unknown() -> Self {
        Self {
            file_id: 0,
            line: 0,
            column: 0,
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.line == 0 && self.column == 0
    }
}

impl fmt::Display for IrSourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_unknown() {
            write!(f, "<unknown>")
        } else {
            write!(f, "{}:{}:{}", self.file_id, self.line, self.column)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ir_id() {
        let id = IrId::new(42);
        assert_eq!(format!("{}", id), "$42");
        assert!(id.is_valid());

        let invalid = IrId::invalid();
        assert!(!invalid.is_valid());
    }

    #[test]
    fn test_source_location_display() {
        assert_eq!(IrSourceLocation::unknown().to_string(), "<unknown>");
        assert_eq!(IrSourceLocation::new(2, 14, 3).to_string(), "2:14:3");
        assert_eq!(IrInstId(7).to_string(), "op7");
    }
}
