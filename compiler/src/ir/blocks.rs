//! IR Basic Blocks
//!
//! This module defines basic blocks for the graph IR. A block owns the program
//! order of its instructions (by arena id), may take block parameters, and ends
//! in a terminator. Blocks are kept in layout order in the control flow graph.

use super::{IrId, IrInstId, IrSourceLocation, IrType};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A basic block in the IR
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IrBasicBlock {
    /// Unique identifier for this block
    pub id: IrBlockId,

    /// Human-readable label (for debugging)
    #[serde(default)]
    pub label: Option<String>,

    /// Block parameters (values with no defining instruction)
    #[serde(default)]
    pub params: Vec<IrBlockParam>,

    /// Instructions in this block, in program order
    pub instructions: Vec<IrInstId>,

    /// Terminator (branch, return, etc.)
    pub terminator: IrTerminator,

    /// Source location for debugging
    #[serde(default)]
    pub source_location: IrSourceLocation,
}

/// Unique identifier for basic blocks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IrBlockId(pub u32);

impl IrBlockId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn entry() -> Self {
        Self(0)
    }

    pub fn is_entry(&self) -> bool {
        self.0 == 0
    }

    pub fn as_u32(&self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for IrBlockId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "bb{}", self.0)
    }
}

/// Block parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IrBlockParam {
    pub id: IrId,
    pub ty: IrType,
}

/// Terminator instructions that end a basic block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum IrTerminator {
    /// Unconditional branch, passing block arguments
    Branch { target: IrBlockId, args: Vec<IrId> },

    /// Conditional branch based on a boolean value
    CondBranch {
        condition: IrId,
        true_target: IrBlockId,
        false_target: IrBlockId,
    },

    /// Return from function
    Return { values: Vec<IrId> },

    /// Not yet terminated
    Unreachable,
}

impl IrTerminator {
    /// Values read by the terminator
    pub fn uses(&self) -> Vec<IrId> {
        match self {
            IrTerminator::Branch { args, .. } => args.clone(),
            IrTerminator::CondBranch { condition, .. } => vec![*condition],
            IrTerminator::Return { values } => values.clone(),
            IrTerminator::Unreachable => Vec::new(),
        }
    }
}

impl IrBasicBlock {
    /// Create a new basic block
    pub fn new(id: IrBlockId) -> Self {
        Self {
            id,
            label: None,
            params: Vec::new(),
            instructions: Vec::new(),
            terminator: IrTerminator::Unreachable,
            source_location: IrSourceLocation::unknown(),
        }
    }

    /// Append an instruction to this block
    pub fn add_instruction(&mut self, inst: IrInstId) {
        self.instructions.push(inst);
    }

    /// Set the terminator for this block
    pub fn set_terminator(&mut self, term: IrTerminator) {
        self.terminator = term;
    }

    /// Position of an instruction within this block
    pub fn position_of(&self, inst: IrInstId) -> Option<usize> {
        self.instructions.iter().position(|&id| id == inst)
    }

    /// Get all successor blocks based on the terminator
    pub fn successors(&self) -> Vec<IrBlockId> {
        match &self.terminator {
            IrTerminator::Branch { target, .. } => vec![*target],
            IrTerminator::CondBranch {
                true_target,
                false_target,
                ..
            } => vec![*true_target, *false_target],
            IrTerminator::Return { .. } | IrTerminator::Unreachable => Vec::new(),
        }
    }

    /// Check if this block is terminated properly
    pub fn is_terminated(&self) -> bool {
        !matches!(self.terminator, IrTerminator::Unreachable)
    }
}

/// Control flow graph; blocks are stored in layout order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IrControlFlowGraph {
    /// All basic blocks in the function, in layout order
    pub blocks: IndexMap<IrBlockId, IrBasicBlock>,

    /// Entry block ID
    pub entry_block: IrBlockId,

    /// Next available block ID
    pub next_block_id: u32,
}

impl Default for IrControlFlowGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl IrControlFlowGraph {
    /// Create a new CFG with an entry block
    pub fn new() -> Self {
        let mut blocks = IndexMap::new();
        let entry_block = IrBlockId::entry();
        blocks.insert(entry_block, IrBasicBlock::new(entry_block));

        Self {
            blocks,
            entry_block,
            next_block_id: 1,
        }
    }

    /// Create a new basic block at the end of the layout
    pub fn create_block(&mut self) -> IrBlockId {
        let id = IrBlockId::new(self.next_block_id);
        self.next_block_id += 1;
        self.blocks.insert(id, IrBasicBlock::new(id));
        id
    }

    /// Get a block by ID
    pub fn get_block(&self, id: IrBlockId) -> Option<&IrBasicBlock> {
        self.blocks.get(&id)
    }

    /// Get a mutable block by ID
    pub fn get_block_mut(&mut self, id: IrBlockId) -> Option<&mut IrBasicBlock> {
        self.blocks.get_mut(&id)
    }

    /// Block ids in layout order
    pub fn block_order(&self) -> Vec<IrBlockId> {
        self.blocks.keys().copied().collect()
    }

    /// Verify CFG integrity
    pub fn verify(&self) -> Result<(), String> {
        if !self.blocks.contains_key(&self.entry_block) {
            return Err("Entry block not found".to_string());
        }

        for (id, block) in &self.blocks {
            if !block.is_terminated() {
                return Err(format!("Block {} is not properly terminated", id));
            }

            for succ in block.successors() {
                if !self.blocks.contains_key(&succ) {
                    return Err(format!(
                        "Block {} references non-existent successor {}",
                        id, succ
                    ));
                }
            }

            if let IrTerminator::Branch { target, args } = &block.terminator {
                if let Some(target_block) = self.blocks.get(target) {
                    if target_block.params.len() != args.len() {
                        return Err(format!(
                            "Branch from {} passes {} arguments to {} which takes {}",
                            id,
                            args.len(),
                            target,
                            target_block.params.len()
                        ));
                    }
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_block_creation() {
        let mut block = IrBasicBlock::new(IrBlockId::new(1));
        assert_eq!(block.id.0, 1);
        assert!(block.instructions.is_empty());
        assert!(!block.is_terminated());

        block.set_terminator(IrTerminator::Return { values: vec![] });
        assert!(block.is_terminated());
    }

    #[test]
    fn test_cfg_keeps_layout_order() {
        let mut cfg = IrControlFlowGraph::new();
        let bb1 = cfg.create_block();
        let bb2 = cfg.create_block();

        assert_eq!(cfg.block_order(), vec![IrBlockId::entry(), bb1, bb2]);
    }

    #[test]
    fn test_verify_branch_arity() {
        let mut cfg = IrControlFlowGraph::new();
        let bb1 = cfg.create_block();
        cfg.get_block_mut(bb1).unwrap().params.push(IrBlockParam {
            id: IrId::new(0),
            ty: IrType::F32,
        });
        cfg.get_block_mut(bb1)
            .unwrap()
            .set_terminator(IrTerminator::Return { values: vec![] });
        cfg.get_block_mut(IrBlockId::entry())
            .unwrap()
            .set_terminator(IrTerminator::Branch {
                target: bb1,
                args: vec![],
            });

        let err = cfg.verify().unwrap_err();
        assert!(err.contains("passes 0 arguments"), "{}", err);
    }
}
