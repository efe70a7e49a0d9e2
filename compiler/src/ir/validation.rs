//! IR Validation
//!
//! Structural checks run after passes: every placed instruction exists and is
//! placed once, every value has one definition that dominates its uses, and
//! every branch lands on a real block. A separate check
//! verifies that no value is bound to two stateful operands.

use super::dominance::DominatorTree;
use super::stateful::StatefulOperandPolicy;
use super::{IrBlockId, IrFunction, IrId, IrInstId, IrModule, IrTerminator};
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Validation context for one function
struct ValidationContext {
    /// Function being validated
    function: String,

    /// Block being validated
    current_block: Option<IrBlockId>,

    /// Errors found during validation
    errors: Vec<ValidationError>,

    /// Where each value is defined
    defs: HashMap<IrId, DefSite>,
}

/// Definition point of a value. Function parameters have no block; block
/// parameters sit at position 0 and instruction `i` at position `i + 1`.
#[derive(Debug, Clone, Copy)]
struct DefSite {
    block: Option<IrBlockId>,
    position: usize,
}

/// Validation error
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub kind: ValidationErrorKind,
    pub function: String,
    pub block: Option<IrBlockId>,
    pub instruction: Option<IrInstId>,
}

/// Types of validation errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// Value used before its definition
    UseBeforeDefine { value: IrId },

    /// Value defined more than once
    MultipleDefinitions { value: IrId },

    /// Block refers to an instruction the arena does not hold
    MissingInstruction { inst: IrInstId },

    /// Instruction placed more than once
    DuplicatePlacement { inst: IrInstId },

    /// Block without terminator
    MissingTerminator { block: IrBlockId },

    /// Invalid control flow
    InvalidControlFlow {
        from: IrBlockId,
        to: IrBlockId,
        reason: String,
    },

    /// One value bound to two stateful operands
    SharedStatefulOperand {
        value: IrId,
        first: (IrInstId, usize),
        second: (IrInstId, usize),
    },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.function)?;
        if let Some(block) = self.block {
            write!(f, " {}", block)?;
        }
        if let Some(inst) = self.instruction {
            write!(f, " {}", inst)?;
        }
        write!(f, ": ")?;
        match &self.kind {
            ValidationErrorKind::UseBeforeDefine { value } => {
                write!(f, "{} used before definition", value)
            }
            ValidationErrorKind::MultipleDefinitions { value } => {
                write!(f, "{} defined more than once", value)
            }
            ValidationErrorKind::MissingInstruction { inst } => {
                write!(f, "{} is not in the instruction arena", inst)
            }
            ValidationErrorKind::DuplicatePlacement { inst } => {
                write!(f, "{} placed more than once", inst)
            }
            ValidationErrorKind::MissingTerminator { block } => {
                write!(f, "{} has no terminator", block)
            }
            ValidationErrorKind::InvalidControlFlow { from, to, reason } => {
                write!(f, "invalid edge {} -> {}: {}", from, to, reason)
            }
            ValidationErrorKind::SharedStatefulOperand {
                value,
                first,
                second,
            } => write!(
                f,
                "{} bound to stateful operand #{} of {} and #{} of {}",
                value, first.1, first.0, second.1, second.0
            ),
        }
    }
}

impl std::error::Error for ValidationError {}

impl ValidationContext {
    fn new(function: &IrFunction) -> Self {
        Self {
            function: function.name.clone(),
            current_block: None,
            errors: Vec::new(),
            defs: HashMap::new(),
        }
    }

    fn add_error(&mut self, kind: ValidationErrorKind, instruction: Option<IrInstId>) {
        self.errors.push(ValidationError {
            kind,
            function: self.function.clone(),
            block: self.current_block,
            instruction,
        });
    }

    fn define(&mut self, value: IrId, site: DefSite, instruction: Option<IrInstId>) {
        if self.defs.insert(value, site).is_some() {
            self.add_error(ValidationErrorKind::MultipleDefinitions { value }, instruction);
        }
    }

    /// A use at `position` of the current block must be dominated by the
    /// definition. Uses in unreachable blocks only need a definition to exist.
    fn use_value(
        &mut self,
        value: IrId,
        position: usize,
        dominators: &DominatorTree,
        instruction: Option<IrInstId>,
    ) {
        let block = match self.current_block {
            Some(block) => block,
            None => return,
        };
        let visible = match self.defs.get(&value) {
            None => false,
            Some(DefSite { block: None, .. }) => true,
            Some(_) if !dominators.is_reachable(block) => true,
            Some(&DefSite {
                block: Some(def_block),
                position: def_position,
            }) => {
                if def_block == block {
                    def_position < position
                } else {
                    dominators.dominates(def_block, block)
                }
            }
        };
        if !visible {
            self.add_error(ValidationErrorKind::UseBeforeDefine { value }, instruction);
        }
    }

    fn finish(self) -> Result<(), Vec<ValidationError>> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self.errors)
        }
    }
}

/// Validate every function of a module
pub fn validate_module(module: &IrModule) -> Result<(), Vec<ValidationError>> {
    let errors: Vec<ValidationError> = module
        .functions
        .values()
        .filter_map(|function| validate_function(function).err())
        .flatten()
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validate the structure of one function
pub fn validate_function(function: &IrFunction) -> Result<(), Vec<ValidationError>> {
    let mut ctx = ValidationContext::new(function);

    validate_cfg_structure(&mut ctx, function);

    for param in &function.signature.parameters {
        ctx.define(
            param.reg,
            DefSite {
                block: None,
                position: 0,
            },
            None,
        );
    }

    // Definitions first, so uses can be checked against blocks laid out later
    let mut placed: HashSet<IrInstId> = HashSet::new();
    let mut uses: Vec<(IrBlockId, usize, IrInstId, &[IrId])> = Vec::new();
    for (block_id, block) in &function.cfg.blocks {
        ctx.current_block = Some(*block_id);
        let block_site = DefSite {
            block: Some(*block_id),
            position: 0,
        };

        for param in &block.params {
            ctx.define(param.id, block_site, None);
        }

        for (i, &inst_id) in block.instructions.iter().enumerate() {
            if !placed.insert(inst_id) {
                ctx.add_error(
                    ValidationErrorKind::DuplicatePlacement { inst: inst_id },
                    Some(inst_id),
                );
                continue;
            }
            let inst = match function.instruction(inst_id) {
                Some(inst) => inst,
                None => {
                    ctx.add_error(
                        ValidationErrorKind::MissingInstruction { inst: inst_id },
                        Some(inst_id),
                    );
                    continue;
                }
            };

            let site = DefSite {
                block: Some(*block_id),
                position: i + 1,
            };
            for result in &inst.results {
                ctx.define(result.id, site, Some(inst_id));
            }
            uses.push((*block_id, i + 1, inst_id, inst.operands.as_slice()));
        }
    }

    let dominators = DominatorTree::compute(function);
    for (block_id, position, inst_id, operands) in uses {
        ctx.current_block = Some(block_id);
        for &operand in operands {
            ctx.use_value(operand, position, &dominators, Some(inst_id));
        }
    }
    for (block_id, block) in &function.cfg.blocks {
        ctx.current_block = Some(*block_id);
        let end = block.instructions.len() + 1;
        for value in block.terminator.uses() {
            ctx.use_value(value, end, &dominators, None);
        }
    }

    ctx.finish()
}

/// Check terminators and branch targets
fn validate_cfg_structure(ctx: &mut ValidationContext, function: &IrFunction) {
    for (block_id, block) in &function.cfg.blocks {
        ctx.current_block = Some(*block_id);

        if !block.is_terminated() {
            ctx.add_error(
                ValidationErrorKind::MissingTerminator { block: *block_id },
                None,
            );
            continue;
        }

        let edges: Vec<(IrBlockId, usize)> = match &block.terminator {
            IrTerminator::Branch { target, args } => vec![(*target, args.len())],
            IrTerminator::CondBranch {
                true_target,
                false_target,
                ..
            } => vec![(*true_target, 0), (*false_target, 0)],
            IrTerminator::Return { .. } | IrTerminator::Unreachable => Vec::new(),
        };

        for (target, arg_count) in edges {
            match function.cfg.get_block(target) {
                None => ctx.add_error(
                    ValidationErrorKind::InvalidControlFlow {
                        from: *block_id,
                        to: target,
                        reason: "target block does not exist".to_string(),
                    },
                    None,
                ),
                Some(succ) if succ.params.len() != arg_count => ctx.add_error(
                    ValidationErrorKind::InvalidControlFlow {
                        from: *block_id,
                        to: target,
                        reason: format!(
                            "passes {} arguments to {} parameters",
                            arg_count,
                            succ.params.len()
                        ),
                    },
                    None,
                ),
                Some(_) => {}
            }
        }
    }
    ctx.current_block = None;
}

/// Check that no value is bound to more than one stateful operand
pub fn validate_stateful_operands(
    function: &IrFunction,
    policy: &dyn StatefulOperandPolicy,
) -> Result<(), Vec<ValidationError>> {
    let mut ctx = ValidationContext::new(function);
    let mut owners: HashMap<IrId, (IrInstId, usize)> = HashMap::new();

    for (block_id, inst) in function.placed_instructions() {
        ctx.current_block = Some(block_id);
        for index in policy.stateful_operands(inst) {
            let value = match inst.operands.get(index) {
                Some(&value) => value,
                None => continue,
            };
            match owners.get(&value) {
                Some(&first) => ctx.add_error(
                    ValidationErrorKind::SharedStatefulOperand {
                        value,
                        first,
                        second: (inst.id, index),
                    },
                    Some(inst.id),
                ),
                None => {
                    owners.insert(value, (inst.id, index));
                }
            }
        }
    }

    ctx.finish()
}
