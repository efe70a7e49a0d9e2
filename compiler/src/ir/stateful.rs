//! Stateful operand classification
//!
//! Some operations treat certain operand positions as mutable state cells
//! rather than pure inputs (the activation and cell state of an LSTM, the
//! activation history of an SVDF). Exporters give every such slot its own
//! variable tensor, so two slots must never share one value.
//!
//! Which positions are stateful is a policy decision, kept behind the
//! [`StatefulOperandPolicy`] trait so the catalogue can change without
//! touching the passes that consume it.

use super::{IrInstruction, IrOpcode};
use smallvec::SmallVec;
use std::collections::BTreeMap;

/// Operand indices of one instruction that hold state
pub type StatefulSlots = SmallVec<[usize; 4]>;

/// Decides which operands of an instruction are stateful
pub trait StatefulOperandPolicy: Send + Sync {
    /// Ordered stateful operand indices; empty if the instruction has none
    fn stateful_operands(&self, inst: &IrInstruction) -> StatefulSlots;
}

impl<F> StatefulOperandPolicy for F
where
    F: Fn(&IrInstruction) -> StatefulSlots + Send + Sync,
{
    fn stateful_operands(&self, inst: &IrInstruction) -> StatefulSlots {
        self(inst)
    }
}

/// Stateful operands of the builtin recurrent operations
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinStatefulPolicy;

impl BuiltinStatefulPolicy {
    /// Stateful operand indices for an opcode
    pub fn slots_for(opcode: &IrOpcode) -> &'static [usize] {
        match opcode {
            // input_activation_state, input_cell_state
            IrOpcode::Lstm | IrOpcode::UnidirectionalSequenceLstm => &[18, 19],
            // fw activation/cell state, bw activation/cell state
            IrOpcode::BidirectionalSequenceLstm => &[35, 36, 37, 38],
            // hidden_state
            IrOpcode::UnidirectionalSequenceRnn => &[4],
            // activation_state
            IrOpcode::Svdf => &[4],
            _ => &[],
        }
    }

    /// The builtin catalogue as (opcode name, indices) pairs
    pub fn catalogue() -> Vec<(&'static str, &'static [usize])> {
        BUILTIN_STATEFUL_OPCODES
            .iter()
            .map(|op| (op.name(), Self::slots_for(op)))
            .collect()
    }
}

static BUILTIN_STATEFUL_OPCODES: [IrOpcode; 5] = [
    IrOpcode::Lstm,
    IrOpcode::UnidirectionalSequenceLstm,
    IrOpcode::BidirectionalSequenceLstm,
    IrOpcode::UnidirectionalSequenceRnn,
    IrOpcode::Svdf,
];

impl StatefulOperandPolicy for BuiltinStatefulPolicy {
    fn stateful_operands(&self, inst: &IrInstruction) -> StatefulSlots {
        SmallVec::from_slice(Self::slots_for(&inst.opcode))
    }
}

/// Policy keyed by opcode name, optionally layered over the builtin catalogue.
/// Table entries take precedence over builtin ones.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatefulPolicyTable {
    include_builtin: bool,
    entries: BTreeMap<String, Vec<usize>>,
}

impl StatefulPolicyTable {
    /// Empty table; with `include_builtin` unknown opcodes fall back to the
    /// builtin catalogue
    pub fn new(include_builtin: bool) -> Self {
        Self {
            include_builtin,
            entries: BTreeMap::new(),
        }
    }

    /// Register (or override) the stateful indices of an opcode name.
    /// Repeated indices are dropped and the configured order is kept: when two
    /// listed slots share a value, the first one listed keeps it.
    pub fn insert(&mut self, opcode: impl Into<String>, indices: Vec<usize>) {
        let mut slots: Vec<usize> = Vec::with_capacity(indices.len());
        for index in indices {
            if !slots.contains(&index) {
                slots.push(index);
            }
        }
        self.entries.insert(opcode.into(), slots);
    }

    /// Whether unknown opcodes fall back to the builtin catalogue
    pub fn includes_builtin(&self) -> bool {
        self.include_builtin
    }

    /// Effective table sorted by opcode name, as (name, indices)
    pub fn effective_entries(&self) -> Vec<(String, Vec<usize>)> {
        let mut merged: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        if self.include_builtin {
            for (name, slots) in BuiltinStatefulPolicy::catalogue() {
                merged.insert(name.to_string(), slots.to_vec());
            }
        }
        for (name, slots) in &self.entries {
            merged.insert(name.clone(), slots.clone());
        }
        merged.into_iter().collect()
    }
}

impl StatefulOperandPolicy for StatefulPolicyTable {
    fn stateful_operands(&self, inst: &IrInstruction) -> StatefulSlots {
        if let Some(slots) = self.entries.get(inst.opcode.name()) {
            return SmallVec::from_slice(slots);
        }
        if self.include_builtin {
            return BuiltinStatefulPolicy.stateful_operands(inst);
        }
        SmallVec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{BinaryOp, IrId};

    fn inst(opcode: IrOpcode) -> IrInstruction {
        IrInstruction::new(opcode, vec![IrId::new(0); 40], vec![])
    }

    #[test]
    fn test_builtin_catalogue() {
        let policy = BuiltinStatefulPolicy;
        assert_eq!(
            policy.stateful_operands(&inst(IrOpcode::UnidirectionalSequenceLstm)).as_slice(),
            &[18, 19]
        );
        assert_eq!(
            policy.stateful_operands(&inst(IrOpcode::Svdf)).as_slice(),
            &[4]
        );
        assert_eq!(
            policy
                .stateful_operands(&inst(IrOpcode::BidirectionalSequenceLstm))
                .len(),
            4
        );
        assert!(policy
            .stateful_operands(&inst(IrOpcode::BinOp(BinaryOp::Add)))
            .is_empty());
    }

    #[test]
    fn test_table_overrides_builtin() {
        let mut table = StatefulPolicyTable::new(true);
        table.insert("tfl.svdf", vec![4, 3, 4]);
        table.insert("custom.state_update", vec![0]);

        assert_eq!(table.stateful_operands(&inst(IrOpcode::Svdf)).as_slice(), &[4, 3]);
        assert_eq!(
            table
                .stateful_operands(&inst(IrOpcode::Custom {
                    name: "custom.state_update".to_string()
                }))
                .as_slice(),
            &[0]
        );
        assert_eq!(
            table.stateful_operands(&inst(IrOpcode::Lstm)).as_slice(),
            &[18, 19]
        );
    }

    #[test]
    fn test_table_without_builtin() {
        let table = StatefulPolicyTable::new(false);
        assert!(table.stateful_operands(&inst(IrOpcode::Lstm)).is_empty());
        assert!(table.effective_entries().is_empty());
    }

    #[test]
    fn test_closure_policy() {
        let policy = |inst: &IrInstruction| -> StatefulSlots {
            if inst.opcode.name() == "custom.cell" {
                SmallVec::from_slice(&[1])
            } else {
                SmallVec::new()
            }
        };
        let cell = inst(IrOpcode::Custom {
            name: "custom.cell".to_string(),
        });
        assert_eq!(policy.stateful_operands(&cell).as_slice(), &[1]);
    }

    #[test]
    fn test_effective_entries_merge() {
        let mut table = StatefulPolicyTable::new(true);
        table.insert("tfl.lstm", vec![19]);
        let entries = table.effective_entries();

        let lstm = entries.iter().find(|(name, _)| name == "tfl.lstm").unwrap();
        assert_eq!(lstm.1, vec![19]);
        assert_eq!(entries.len(), 5);
    }
}
