//! IR Instructions
//!
//! Defines the operation set for the graph IR. Unlike a register machine,
//! an instruction here is a graph node: an opcode, an ordered operand list,
//! typed results and a bag of named attributes. Operand positions matter:
//! stateful operations are described by the indices of their state operands.

use super::{IrId, IrInstId, IrSourceLocation, IrType, IrValue, QuantParams};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// IR instruction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IrInstruction {
    /// Arena identifier within the owning function
    pub id: IrInstId,

    /// Operation kind
    pub opcode: IrOpcode,

    /// Ordered operand values
    pub operands: Vec<IrId>,

    /// Values produced by this instruction
    pub results: Vec<IrResult>,

    /// Named attributes (activation functions, clipping, etc.)
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub attributes: IndexMap<String, IrAttribute>,

    /// Source location for diagnostics
    #[serde(default)]
    pub source_location: IrSourceLocation,
}

/// A value produced by an instruction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IrResult {
    pub id: IrId,
    pub ty: IrType,
}

/// Instruction attribute
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum IrAttribute {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Ints(Vec<i64>),
}

impl fmt::Display for IrAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IrAttribute::Bool(v) => write!(f, "{}", v),
            IrAttribute::Int(v) => write!(f, "{}", v),
            IrAttribute::Float(v) => write!(f, "{:?}", v),
            IrAttribute::String(v) => write!(f, "\"{}\"", v),
            IrAttribute::Ints(v) => write!(f, "{:?}", v),
        }
    }
}

/// Operation kinds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum IrOpcode {
    // === Constants ===
    /// Constant tensor or scalar
    Const { value: IrValue },

    /// Quantized constant; raw storage values plus their parameters
    QConst { value: IrValue, params: QuantParams },

    // === Quantization ===
    /// Quantized (or half precision) tensor to its expressed type
    Dequantize,

    /// Float tensor to quantized storage
    Quantize { params: QuantParams },

    // === Arithmetic ===
    BinOp(BinaryOp),
    UnOp(UnaryOp),
    FullyConnected,

    // === Recurrent / stateful operations ===
    Lstm,
    UnidirectionalSequenceLstm,
    BidirectionalSequenceLstm,
    UnidirectionalSequenceRnn,
    Svdf,

    /// Any operation the IR has no dedicated variant for
    Custom { name: String },
}

/// Binary element-wise operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Maximum,
    Minimum,
}

/// Unary element-wise operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    Neg,
    Abs,
    Relu,
    Tanh,
    Logistic,
}

impl IrOpcode {
    /// Stable dotted name used by the dump and by policy tables
    pub fn name(&self) -> &str {
        match self {
            IrOpcode::Const { .. } => "tfl.pseudo_const",
            IrOpcode::QConst { .. } => "tfl.pseudo_qconst",
            IrOpcode::Dequantize => "tfl.dequantize",
            IrOpcode::Quantize { .. } => "tfl.quantize",
            IrOpcode::BinOp(op) => match op {
                BinaryOp::Add => "tfl.add",
                BinaryOp::Sub => "tfl.sub",
                BinaryOp::Mul => "tfl.mul",
                BinaryOp::Div => "tfl.div",
                BinaryOp::Maximum => "tfl.maximum",
                BinaryOp::Minimum => "tfl.minimum",
            },
            IrOpcode::UnOp(op) => match op {
                UnaryOp::Neg => "tfl.neg",
                UnaryOp::Abs => "tfl.abs",
                UnaryOp::Relu => "tfl.relu",
                UnaryOp::Tanh => "tfl.tanh",
                UnaryOp::Logistic => "tfl.logistic",
            },
            IrOpcode::FullyConnected => "tfl.fully_connected",
            IrOpcode::Lstm => "tfl.lstm",
            IrOpcode::UnidirectionalSequenceLstm => "tfl.unidirectional_sequence_lstm",
            IrOpcode::BidirectionalSequenceLstm => "tfl.bidirectional_sequence_lstm",
            IrOpcode::UnidirectionalSequenceRnn => "tfl.unidirectional_sequence_rnn",
            IrOpcode::Svdf => "tfl.svdf",
            IrOpcode::Custom { name } => name,
        }
    }
}

impl fmt::Display for IrOpcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl IrInstruction {
    /// Create an instruction; the id is assigned when it is added to a function
    pub fn new(opcode: IrOpcode, operands: Vec<IrId>, results: Vec<IrResult>) -> Self {
        Self {
            id: IrInstId(u32::MAX),
            opcode,
            operands,
            results,
            attributes: IndexMap::new(),
            source_location: IrSourceLocation::unknown(),
        }
    }

    /// Attach an attribute (builder style)
    pub fn with_attribute(mut self, name: impl Into<String>, value: IrAttribute) -> Self {
        self.attributes.insert(name.into(), value);
        self
    }

    /// Get the first result if this instruction produces a value
    pub fn dest(&self) -> Option<IrId> {
        self.results.first().map(|r| r.id)
    }

    /// Position of `value` among this instruction's results
    pub fn result_index(&self, value: IrId) -> Option<usize> {
        self.results.iter().position(|r| r.id == value)
    }

    /// Get all values used by this instruction
    pub fn uses(&self) -> &[IrId] {
        &self.operands
    }

    /// Literal payload if this instruction is a constant (plain or quantized)
    pub fn constant_value(&self) -> Option<&IrValue> {
        match &self.opcode {
            IrOpcode::Const { value } | IrOpcode::QConst { value, .. } => Some(value),
            _ => None,
        }
    }

    /// Check if this instruction materializes a compile-time constant
    pub fn is_constant(&self) -> bool {
        self.constant_value().is_some()
    }

    /// Check if this is a dequantize with its single input operand
    pub fn is_dequantize(&self) -> bool {
        matches!(self.opcode, IrOpcode::Dequantize) && self.operands.len() == 1
    }

    /// Check if this instruction has side effects
    pub fn has_side_effects(&self) -> bool {
        matches!(
            self.opcode,
            IrOpcode::Lstm
                | IrOpcode::UnidirectionalSequenceLstm
                | IrOpcode::BidirectionalSequenceLstm
                | IrOpcode::UnidirectionalSequenceRnn
                | IrOpcode::Svdf
                | IrOpcode::Custom { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn f32_tensor(shape: Vec<i64>) -> IrType {
        IrType::tensor(IrType::F32, shape)
    }

    #[test]
    fn test_instruction_properties() {
        let add = IrInstruction::new(
            IrOpcode::BinOp(BinaryOp::Add),
            vec![IrId::new(2), IrId::new(3)],
            vec![IrResult {
                id: IrId::new(1),
                ty: f32_tensor(vec![4]),
            }],
        );

        assert_eq!(add.dest(), Some(IrId::new(1)));
        assert_eq!(add.uses(), &[IrId::new(2), IrId::new(3)]);
        assert!(!add.is_constant());
        assert!(!add.is_dequantize());
        assert!(!add.has_side_effects());
        assert_eq!(add.opcode.name(), "tfl.add");
    }

    #[test]
    fn test_constant_matching() {
        let value = IrValue::dense_f32(vec![2], &[0.0, 0.0]);
        let cst = IrInstruction::new(
            IrOpcode::Const {
                value: value.clone(),
            },
            vec![],
            vec![IrResult {
                id: IrId::new(0),
                ty: f32_tensor(vec![2]),
            }],
        );
        assert_eq!(cst.constant_value(), Some(&value));

        let qcst = IrInstruction::new(
            IrOpcode::QConst {
                value: IrValue::dense_i8(vec![2], &[1, 2]),
                params: QuantParams::PerTensor {
                    scale: 0.25,
                    zero_point: 0,
                },
            },
            vec![],
            vec![],
        );
        assert!(qcst.is_constant());
    }

    #[test]
    fn test_dequantize_requires_single_input() {
        let dq = IrInstruction::new(IrOpcode::Dequantize, vec![IrId::new(0)], vec![]);
        assert!(dq.is_dequantize());

        let malformed = IrInstruction::new(IrOpcode::Dequantize, vec![], vec![]);
        assert!(!malformed.is_dequantize());
    }

    #[test]
    fn test_custom_opcode_name() {
        let op = IrOpcode::Custom {
            name: "custom.state_update".to_string(),
        };
        assert_eq!(op.name(), "custom.state_update");
        assert_eq!(op.to_string(), "custom.state_update");
    }
}
