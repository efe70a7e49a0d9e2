//! IR Functions
//!
//! This module defines function representation in the graph IR: the signature,
//! the instruction arena and the control flow graph that places arena entries
//! in program order. It also provides the editing primitives passes rely on:
//! cloning an instruction, inserting it before another, and replacing a single
//! operand.

use super::{
    IrBlockId, IrControlFlowGraph, IrId, IrInstId, IrInstruction, IrResult, IrSourceLocation,
    IrType,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// IR function representation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IrFunction {
    /// Unique identifier for this function
    pub id: IrFunctionId,

    /// Function name
    pub name: String,

    /// Function signature
    pub signature: IrFunctionSignature,

    /// Control flow graph (function body)
    pub cfg: IrControlFlowGraph,

    /// Instruction arena, indexed by `IrInstId`. Entries not referenced by
    /// any block are detached and ignored by passes.
    pub instructions: Vec<IrInstruction>,

    /// Source location for debugging
    #[serde(default)]
    pub source_location: IrSourceLocation,

    /// Next available value ID
    #[serde(default)]
    pub next_reg_id: u32,
}

/// Unique identifier for functions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IrFunctionId(pub u32);

impl std::fmt::Display for IrFunctionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "fn{}", self.0)
    }
}

/// Function signature
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IrFunctionSignature {
    /// Parameter types and names
    pub parameters: Vec<IrParameter>,

    /// Result types
    pub return_types: Vec<IrType>,
}

/// Function parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IrParameter {
    /// Parameter name
    pub name: String,

    /// Parameter type
    pub ty: IrType,

    /// Value assigned to this parameter
    pub reg: IrId,
}

/// Where a value comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IrValueDef {
    /// Function parameter at the given position
    Parameter { index: usize },

    /// Block parameter
    BlockParam { block: IrBlockId, index: usize },

    /// Result `result` of instruction `inst`
    Instruction { inst: IrInstId, result: usize },
}

impl IrValueDef {
    /// Defining instruction, if the value is an instruction result
    pub fn instruction(&self) -> Option<IrInstId> {
        match self {
            IrValueDef::Instruction { inst, .. } => Some(*inst),
            _ => None,
        }
    }
}

impl IrFunction {
    /// Create a new function; parameter registers are allocated here
    pub fn new(id: IrFunctionId, name: String, signature: IrFunctionSignature) -> Self {
        let mut function = Self {
            id,
            name,
            signature,
            cfg: IrControlFlowGraph::new(),
            instructions: Vec::new(),
            source_location: IrSourceLocation::unknown(),
            next_reg_id: 0,
        };

        for i in 0..function.signature.parameters.len() {
            let reg = function.alloc_reg();
            function.signature.parameters[i].reg = reg;
        }

        function
    }

    /// Allocate a new value id
    pub fn alloc_reg(&mut self) -> IrId {
        let id = IrId::new(self.next_reg_id);
        self.next_reg_id += 1;
        id
    }

    /// Move the value counter past every value already defined. Needed after
    /// loading a function whose counter was not serialized.
    pub fn recompute_next_reg_id(&mut self) {
        let max = self
            .def_index()
            .keys()
            .map(|id| id.as_u32())
            .filter(|&id| id != u32::MAX)
            .max();
        if let Some(max) = max {
            self.next_reg_id = self.next_reg_id.max(max + 1);
        }
    }

    /// Get the entry block
    pub fn entry_block(&self) -> IrBlockId {
        self.cfg.entry_block
    }

    /// Get parameter register by index
    pub fn get_param_reg(&self, index: usize) -> Option<IrId> {
        self.signature.parameters.get(index).map(|p| p.reg)
    }

    /// Look up an instruction in the arena
    pub fn instruction(&self, id: IrInstId) -> Option<&IrInstruction> {
        self.instructions.get(id.index())
    }

    /// Look up an instruction in the arena mutably
    pub fn instruction_mut(&mut self, id: IrInstId) -> Option<&mut IrInstruction> {
        self.instructions.get_mut(id.index())
    }

    /// Add an instruction to the arena without placing it in a block
    pub fn add_instruction(&mut self, mut inst: IrInstruction) -> IrInstId {
        let id = IrInstId(self.instructions.len() as u32);
        inst.id = id;
        self.instructions.push(inst);
        id
    }

    /// Add an instruction to the arena and append it to `block`
    pub fn append_instruction(&mut self, block: IrBlockId, inst: IrInstruction) -> Option<IrInstId> {
        if !self.cfg.blocks.contains_key(&block) {
            return None;
        }
        let id = self.add_instruction(inst);
        self.cfg.get_block_mut(block)?.add_instruction(id);
        Some(id)
    }

    /// Clone an instruction into a new, unplaced arena entry.
    ///
    /// Opcode, operands, attributes, result types and source location are
    /// copied verbatim; every result gets a fresh value id.
    pub fn clone_instruction(&mut self, src: IrInstId) -> Option<IrInstId> {
        let mut clone = self.instruction(src)?.clone();
        let results = clone
            .results
            .iter()
            .map(|r| IrResult {
                id: self.alloc_reg(),
                ty: r.ty.clone(),
            })
            .collect();
        clone.results = results;
        Some(self.add_instruction(clone))
    }

    /// Place `inst` at `position` in `block`, before whatever is there now
    pub fn insert_before(
        &mut self,
        block: IrBlockId,
        position: usize,
        inst: IrInstId,
    ) -> Result<(), String> {
        if self.instruction(inst).is_none() {
            return Err(format!("Instruction {} does not exist", inst));
        }
        let bb = self
            .cfg
            .get_block_mut(block)
            .ok_or_else(|| format!("Block {} does not exist", block))?;
        if position > bb.instructions.len() {
            return Err(format!(
                "Insertion point {} is past the end of {} ({} instructions)",
                position,
                block,
                bb.instructions.len()
            ));
        }
        bb.instructions.insert(position, inst);
        Ok(())
    }

    /// Replace operand `index` of `inst` with `value`, returning the old value
    pub fn set_operand(&mut self, inst: IrInstId, index: usize, value: IrId) -> Option<IrId> {
        let slot = self.instruction_mut(inst)?.operands.get_mut(index)?;
        Some(std::mem::replace(slot, value))
    }

    /// Map every value to its definition. Only placed instructions count.
    pub fn def_index(&self) -> HashMap<IrId, IrValueDef> {
        let mut defs = HashMap::new();

        for (index, param) in self.signature.parameters.iter().enumerate() {
            defs.insert(param.reg, IrValueDef::Parameter { index });
        }

        for (block_id, block) in &self.cfg.blocks {
            for (index, param) in block.params.iter().enumerate() {
                defs.insert(
                    param.id,
                    IrValueDef::BlockParam {
                        block: *block_id,
                        index,
                    },
                );
            }
            for &inst_id in &block.instructions {
                if let Some(inst) = self.instruction(inst_id) {
                    for (result, r) in inst.results.iter().enumerate() {
                        defs.insert(
                            r.id,
                            IrValueDef::Instruction {
                                inst: inst_id,
                                result,
                            },
                        );
                    }
                }
            }
        }

        defs
    }

    /// Find the placed instruction defining `value`
    pub fn defining_instruction(&self, value: IrId) -> Option<IrInstId> {
        self.cfg
            .blocks
            .values()
            .flat_map(|block| block.instructions.iter().copied())
            .find(|&id| {
                self.instruction(id)
                    .map_or(false, |inst| inst.result_index(value).is_some())
            })
    }

    /// Placed instructions in program order, with their block
    pub fn placed_instructions(&self) -> impl Iterator<Item = (IrBlockId, &IrInstruction)> + '_ {
        self.cfg.blocks.iter().flat_map(move |(block_id, block)| {
            block
                .instructions
                .iter()
                .filter_map(move |&id| self.instruction(id).map(|inst| (*block_id, inst)))
        })
    }

    /// Verify function integrity
    pub fn verify(&self) -> Result<(), String> {
        if self.cfg.blocks.is_empty() {
            return Ok(());
        }

        self.cfg.verify()?;

        if let Some(entry) = self.cfg.get_block(self.cfg.entry_block) {
            if !entry.params.is_empty() {
                return Err("Entry block cannot have block parameters".to_string());
            }
        }

        for (index, inst) in self.instructions.iter().enumerate() {
            if inst.id.index() != index {
                return Err(format!(
                    "Instruction at arena slot {} carries id {}",
                    index, inst.id
                ));
            }
        }

        Ok(())
    }
}

/// Function statistics
#[derive(Debug, Default, PartialEq, Eq)]
pub struct FunctionStats {
    /// Number of basic blocks
    pub block_count: usize,

    /// Number of placed instructions
    pub instruction_count: usize,

    /// Number of placed constants (plain and quantized)
    pub constant_count: usize,

    /// Number of placed dequantize instructions
    pub dequantize_count: usize,
}

impl IrFunction {
    /// Compute statistics for this function
    pub fn compute_stats(&self) -> FunctionStats {
        let mut stats = FunctionStats {
            block_count: self.cfg.blocks.len(),
            ..Default::default()
        };

        for (_, inst) in self.placed_instructions() {
            stats.instruction_count += 1;
            if inst.is_constant() {
                stats.constant_count += 1;
            }
            if inst.is_dequantize() {
                stats.dequantize_count += 1;
            }
        }

        stats
    }
}
