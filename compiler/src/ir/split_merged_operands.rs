//! Split merged stateful operands
//!
//! Upstream value numbering happily merges identical constants, so two state
//! inputs of a recurrent operation (say the zero-initialized activation and
//! cell state of an LSTM) can end up reading the same value. Serialized
//! models back every stateful operand with its own mutable tensor, so that
//! sharing has to be undone before export.
//!
//! This pass walks each function in program order and remembers every value
//! already bound to a stateful operand. The first binding is kept. Every later
//! binding of the same value gets a private copy of the value's producer chain,
//! inserted right before the consuming operation. Only two chains can be
//! copied:
//!
//! ```text
//! %c = tfl.pseudo_const ...            (constant)
//! %q = tfl.pseudo_qconst ...           (quantized constant)
//! %d = tfl.dequantize %q               (dequantize of a constant)
//! ```
//!
//! Anything else in a colliding stateful slot is an error.

use super::optimization::{OptimizationPass, OptimizationResult, PassError};
use super::stateful::StatefulOperandPolicy;
use super::{IrBlockId, IrFunction, IrId, IrInstId, IrModule, IrSourceLocation, IrValueDef};
use crate::error_codes;
use fxhash::FxHashSet;
use log::{debug, error, info, trace};
use rayon::prelude::*;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Values already bound to a stateful operand during one function walk
#[derive(Debug, Default)]
pub struct SeenValues {
    values: FxHashSet<IrId>,
}

impl SeenValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `value`; returns `false` if it was already recorded
    pub fn mark(&mut self, value: IrId) -> bool {
        self.values.insert(value)
    }

    pub fn contains(&self, value: IrId) -> bool {
        self.values.contains(&value)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// A producer chain the pass knows how to copy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProducerChain {
    /// The value is result `result` of a constant
    Constant { constant: IrInstId, result: usize },

    /// The value is result `result` of a dequantize whose input is result
    /// `constant_result` of a constant
    DequantizedConstant {
        dequantize: IrInstId,
        result: usize,
        constant: IrInstId,
        constant_result: usize,
    },
}

/// Why a value's producer could not be copied
#[derive(Debug, Clone, PartialEq, Eq)]
enum ChainMismatch {
    NoProducer,
    Unclonable { producer: IrInstId, opcode: String },
}

impl ProducerChain {
    /// Match the producer of `value` against the copyable shapes.
    /// Nothing is modified; a mismatch leaves the function untouched.
    fn match_value(
        function: &IrFunction,
        defs: &HashMap<IrId, IrValueDef>,
        value: IrId,
    ) -> Result<Self, ChainMismatch> {
        let (producer, result) = match defs.get(&value) {
            Some(IrValueDef::Instruction { inst, result }) => (*inst, *result),
            _ => return Err(ChainMismatch::NoProducer),
        };
        let inst = function
            .instruction(producer)
            .ok_or(ChainMismatch::NoProducer)?;

        if inst.is_constant() {
            return Ok(ProducerChain::Constant {
                constant: producer,
                result,
            });
        }

        let unclonable = || ChainMismatch::Unclonable {
            producer,
            opcode: inst.opcode.name().to_string(),
        };

        if !inst.is_dequantize() {
            return Err(unclonable());
        }

        match defs.get(&inst.operands[0]) {
            Some(IrValueDef::Instruction {
                inst: constant,
                result: constant_result,
            }) if function
                .instruction(*constant)
                .map_or(false, |c| c.is_constant()) =>
            {
                Ok(ProducerChain::DequantizedConstant {
                    dequantize: producer,
                    result,
                    constant: *constant,
                    constant_result: *constant_result,
                })
            }
            _ => Err(unclonable()),
        }
    }

    /// Number of instructions a copy of this chain inserts
    pub fn instruction_count(&self) -> usize {
        match self {
            ProducerChain::Constant { .. } => 1,
            ProducerChain::DequantizedConstant { .. } => 2,
        }
    }
}

/// Kind of failure while splitting a function
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SplitErrorKind {
    /// A colliding stateful operand has no defining operation
    MissingProducer,

    /// A colliding stateful operand is produced by something other than a
    /// constant or a dequantized constant
    UnclonableProducer { producer: String },

    /// The policy named an operand index the operation does not have
    OperandOutOfRange { operand_count: usize },

    /// A matched producer chain could not be copied into place
    RewriteFailed { reason: String },
}

impl SplitErrorKind {
    /// Registered error code for this failure
    pub fn code(&self) -> u16 {
        match self {
            SplitErrorKind::MissingProducer => error_codes::SPLIT_MISSING_PRODUCER,
            SplitErrorKind::UnclonableProducer { .. } => error_codes::SPLIT_UNCLONABLE_PRODUCER,
            SplitErrorKind::OperandOutOfRange { .. } => error_codes::SPLIT_OPERAND_OUT_OF_RANGE,
            SplitErrorKind::RewriteFailed { .. } => error_codes::SPLIT_REWRITE_FAILED,
        }
    }
}

/// Failure to split one stateful operand. Aborts the whole function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitError {
    pub kind: SplitErrorKind,
    /// Function being split
    pub function: String,
    /// Operation owning the stateful operand
    pub instruction: IrInstId,
    pub opcode: String,
    pub operand_index: usize,
    /// Value in the operand, if the operand exists
    pub value: Option<IrId>,
    pub location: IrSourceLocation,
}

impl SplitError {
    pub fn code(&self) -> u16 {
        self.kind.code()
    }

    /// Help text from the error code registry
    pub fn help(&self) -> Option<&'static str> {
        error_codes::get_error_code(self.code()).and_then(|c| c.help)
    }
}

impl fmt::Display for SplitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: stateful operand #{} of {} ({}) in @{}",
            error_codes::format_error_code(self.code()),
            self.operand_index,
            self.opcode,
            self.instruction,
            self.function
        )?;
        if !self.location.is_unknown() {
            write!(f, " at {}", self.location)?;
        }
        match &self.kind {
            SplitErrorKind::MissingProducer => write!(
                f,
                ": {} is shared with an earlier stateful operand but has no defining operation",
                self.value.unwrap_or_else(IrId::invalid)
            ),
            SplitErrorKind::UnclonableProducer { producer } => write!(
                f,
                ": {} is shared with an earlier stateful operand and its producer {} cannot be cloned",
                self.value.unwrap_or_else(IrId::invalid),
                producer
            ),
            SplitErrorKind::OperandOutOfRange { operand_count } => write!(
                f,
                ": operation only has {} operands",
                operand_count
            ),
            SplitErrorKind::RewriteFailed { reason } => write!(
                f,
                ": could not rewire {}: {}",
                self.value.unwrap_or_else(IrId::invalid),
                reason
            ),
        }
    }
}

impl std::error::Error for SplitError {}

/// Counters for one or more split runs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SplitStats {
    /// Stateful operands inspected
    pub stateful_operands: usize,
    /// Constants cloned on their own
    pub constants_cloned: usize,
    /// Dequantize-of-constant pairs cloned
    pub dequantize_pairs_cloned: usize,
}

impl SplitStats {
    /// Instructions inserted by the run
    pub fn instructions_inserted(&self) -> usize {
        self.constants_cloned + 2 * self.dequantize_pairs_cloned
    }

    /// Whether the run changed the function
    pub fn modified(&self) -> bool {
        self.constants_cloned > 0 || self.dequantize_pairs_cloned > 0
    }

    pub fn merge(&mut self, other: SplitStats) {
        self.stateful_operands += other.stateful_operands;
        self.constants_cloned += other.constants_cloned;
        self.dequantize_pairs_cloned += other.dequantize_pairs_cloned;
    }

    fn into_result(self) -> OptimizationResult {
        let mut result = if self.modified() {
            OptimizationResult::changed()
        } else {
            OptimizationResult::unchanged()
        };
        result.instructions_inserted = self.instructions_inserted();
        result.add_stat("stateful_operands", self.stateful_operands);
        result.add_stat("constants_cloned", self.constants_cloned);
        result.add_stat("dequantize_pairs_cloned", self.dequantize_pairs_cloned);
        result
    }
}

/// Insertion point of a colliding operand
struct Site {
    block: IrBlockId,
    position: usize,
    inst: IrInstId,
    index: usize,
}

/// Copy `chain` right before the operation at `site` and rewire the operand.
/// Returns the value the operand now reads.
fn clone_chain(
    function: &mut IrFunction,
    defs: &mut HashMap<IrId, IrValueDef>,
    site: &Site,
    chain: ProducerChain,
) -> Result<IrId, String> {
    let (inst, result) = match chain {
        ProducerChain::Constant { constant, result } => {
            let clone = function
                .clone_instruction(constant)
                .ok_or_else(|| format!("constant {} vanished", constant))?;
            function.insert_before(site.block, site.position, clone)?;
            (clone, result)
        }
        ProducerChain::DequantizedConstant {
            dequantize,
            result,
            constant,
            constant_result,
        } => {
            let constant_clone = function
                .clone_instruction(constant)
                .ok_or_else(|| format!("constant {} vanished", constant))?;
            let dequantize_clone = function
                .clone_instruction(dequantize)
                .ok_or_else(|| format!("dequantize {} vanished", dequantize))?;
            function.insert_before(site.block, site.position, constant_clone)?;
            function.insert_before(site.block, site.position + 1, dequantize_clone)?;

            let input = function
                .instruction(constant_clone)
                .and_then(|c| c.results.get(constant_result))
                .map(|r| r.id)
                .ok_or_else(|| format!("{} has no result #{}", constant_clone, constant_result))?;
            function.set_operand(dequantize_clone, 0, input);
            record_results(function, defs, constant_clone);
            (dequantize_clone, result)
        }
    };

    record_results(function, defs, inst);
    let value = function
        .instruction(inst)
        .and_then(|c| c.results.get(result))
        .map(|r| r.id)
        .ok_or_else(|| format!("{} has no result #{}", inst, result))?;
    function
        .set_operand(site.inst, site.index, value)
        .ok_or_else(|| format!("{} has no operand #{}", site.inst, site.index))?;
    Ok(value)
}

fn record_results(function: &IrFunction, defs: &mut HashMap<IrId, IrValueDef>, inst: IrInstId) {
    if let Some(i) = function.instruction(inst) {
        for (result, r) in i.results.iter().enumerate() {
            defs.insert(r.id, IrValueDef::Instruction { inst, result });
        }
    }
}

/// Give every stateful operand of `function` a value no earlier stateful
/// operand reads.
///
/// Blocks are visited in layout order and operations in program order. On
/// failure the function keeps the rewrites made before the failing operand.
pub fn split_merged_operands(
    function: &mut IrFunction,
    policy: &dyn StatefulOperandPolicy,
) -> Result<SplitStats, SplitError> {
    let mut seen = SeenValues::new();
    let mut stats = SplitStats::default();
    let mut defs = function.def_index();
    let function_name = function.name.clone();

    for block in function.cfg.block_order() {
        let mut position = 0;
        loop {
            let inst_id = match function
                .cfg
                .get_block(block)
                .and_then(|b| b.instructions.get(position))
            {
                Some(&id) => id,
                None => break,
            };
            let inst = match function.instruction(inst_id) {
                Some(inst) => inst,
                None => {
                    position += 1;
                    continue;
                }
            };

            let slots = policy.stateful_operands(inst);
            let operands = inst.operands.clone();
            let opcode = inst.opcode.name().to_string();
            let location = inst.source_location;

            for index in slots {
                stats.stateful_operands += 1;
                let fail = |kind, value| SplitError {
                    kind,
                    function: function_name.clone(),
                    instruction: inst_id,
                    opcode: opcode.clone(),
                    operand_index: index,
                    value,
                    location,
                };

                let value = match operands.get(index) {
                    Some(&value) => value,
                    None => {
                        return Err(fail(
                            SplitErrorKind::OperandOutOfRange {
                                operand_count: operands.len(),
                            },
                            None,
                        ))
                    }
                };

                trace!("{} {} operand #{} reads {}", opcode, inst_id, index, value);
                if seen.mark(value) {
                    continue;
                }

                let chain = match ProducerChain::match_value(function, &defs, value) {
                    Ok(chain) => chain,
                    Err(ChainMismatch::NoProducer) => {
                        return Err(fail(SplitErrorKind::MissingProducer, Some(value)))
                    }
                    Err(ChainMismatch::Unclonable { producer, opcode }) => {
                        debug!("{} is produced by {} ({})", value, opcode, producer);
                        return Err(fail(
                            SplitErrorKind::UnclonableProducer { producer: opcode },
                            Some(value),
                        ));
                    }
                };

                let site = Site {
                    block,
                    position,
                    inst: inst_id,
                    index,
                };
                let clone = clone_chain(function, &mut defs, &site, chain).map_err(|reason| {
                    error!("failed to rewrite {} in @{}: {}", inst_id, function_name, reason);
                    fail(SplitErrorKind::RewriteFailed { reason }, Some(value))
                })?;
                position += chain.instruction_count();

                match chain {
                    ProducerChain::Constant { .. } => stats.constants_cloned += 1,
                    ProducerChain::DequantizedConstant { .. } => stats.dequantize_pairs_cloned += 1,
                }
                debug!(
                    "@{}: {} operand #{} now reads cloned {} instead of {}",
                    function_name, inst_id, index, clone, value
                );
            }

            position += 1;
        }
    }

    Ok(stats)
}

/// Pass wrapper around [`split_merged_operands`]
#[derive(Clone)]
pub struct SplitMergedOperandsPass {
    policy: Arc<dyn StatefulOperandPolicy>,
    parallel: bool,
    stats: SplitStats,
}

impl SplitMergedOperandsPass {
    pub const NAME: &'static str = "split-merged-operands";

    pub fn new(policy: Arc<dyn StatefulOperandPolicy>) -> Self {
        Self {
            policy,
            parallel: false,
            stats: SplitStats::default(),
        }
    }

    /// Split module functions concurrently
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Stats accumulated over every run of this pass object
    pub fn stats(&self) -> SplitStats {
        self.stats
    }

    /// Split one function
    pub fn run(&mut self, function: &mut IrFunction) -> Result<SplitStats, SplitError> {
        let result = split_merged_operands(function, self.policy.as_ref());
        match &result {
            Ok(stats) => self.stats.merge(*stats),
            Err(e) => error!("{}", e),
        }
        result
    }

    fn failed(error: SplitError) -> PassError {
        PassError::Failed {
            pass: Self::NAME,
            function: error.function.clone(),
            error,
        }
    }
}

impl fmt::Debug for SplitMergedOperandsPass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SplitMergedOperandsPass")
            .field("parallel", &self.parallel)
            .field("stats", &self.stats)
            .finish()
    }
}

impl OptimizationPass for SplitMergedOperandsPass {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn run_on_module(&mut self, module: &mut IrModule) -> Result<OptimizationResult, PassError> {
        let mut total = SplitStats::default();

        if self.parallel {
            let policy = self.policy.as_ref();
            let results: Vec<Result<SplitStats, SplitError>> = module
                .functions
                .par_values_mut()
                .map(|function| split_merged_operands(function, policy))
                .collect();
            for result in results {
                match result {
                    Ok(stats) => total.merge(stats),
                    Err(e) => {
                        error!("{}", e);
                        return Err(Self::failed(e));
                    }
                }
            }
            self.stats.merge(total);
        } else {
            for function in module.functions.values_mut() {
                total.merge(self.run(function).map_err(Self::failed)?);
            }
        }

        info!(
            "{}: {} stateful operands in {} functions, {} constants and {} dequantize pairs cloned",
            module.name,
            total.stateful_operands,
            module.functions.len(),
            total.constants_cloned,
            total.dequantize_pairs_cloned
        );
        Ok(total.into_result())
    }

    fn run_on_function(&mut self, function: &mut IrFunction) -> Result<OptimizationResult, PassError> {
        self.run(function)
            .map(SplitStats::into_result)
            .map_err(Self::failed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::stateful::{BuiltinStatefulPolicy, StatefulSlots};
    use crate::ir::{
        FunctionSignatureBuilder, IrBuilder, IrInstruction, IrOpcode, IrType, IrValue, UnaryOp,
    };
    use smallvec::smallvec;

    fn cell_policy(inst: &IrInstruction) -> StatefulSlots {
        match &inst.opcode {
            IrOpcode::Custom { name } if name == "test.cell" => smallvec![0, 1],
            _ => StatefulSlots::new(),
        }
    }

    fn cell() -> IrOpcode {
        IrOpcode::Custom {
            name: "test.cell".to_string(),
        }
    }

    fn start(builder: &mut IrBuilder) {
        builder.start_function(
            "main".to_string(),
            FunctionSignatureBuilder::new()
                .param("x".to_string(), IrType::tensor(IrType::F32, vec![4]))
                .build(),
        );
    }

    #[test]
    fn test_seen_values_mark() {
        let mut seen = SeenValues::new();
        assert!(seen.is_empty());
        assert!(seen.mark(IrId::new(3)));
        assert!(!seen.mark(IrId::new(3)));
        assert!(seen.mark(IrId::new(4)));
        assert!(seen.contains(IrId::new(3)));
        assert_eq!(seen.len(), 2);
    }

    #[test]
    fn test_shared_constant_is_cloned() {
        let mut builder = IrBuilder::new("m".to_string());
        start(&mut builder);
        let zeros = builder.build_zeros(vec![4]).unwrap();
        let (op, _) = builder
            .build_stateful(cell(), vec![zeros, zeros], IrType::tensor(IrType::F32, vec![4]))
            .unwrap();
        builder.build_return(vec![]).unwrap();
        let mut module = builder.finish();
        let function = module.functions.values_mut().next().unwrap();

        let stats = split_merged_operands(function, &cell_policy).unwrap();
        assert_eq!(stats.stateful_operands, 2);
        assert_eq!(stats.constants_cloned, 1);

        let operands = &function.instruction(op).unwrap().operands;
        assert_eq!(operands[0], zeros);
        assert_ne!(operands[1], zeros);

        let entry = function.cfg.get_block(IrBlockId::entry()).unwrap();
        assert_eq!(entry.instructions.len(), 3);
        assert_eq!(entry.position_of(op), Some(2));
    }

    #[test]
    fn test_parameter_collision_is_missing_producer() {
        let mut builder = IrBuilder::new("m".to_string());
        start(&mut builder);
        let x = builder.param(0).unwrap();
        builder
            .build_stateful(cell(), vec![x, x], IrType::tensor(IrType::F32, vec![4]))
            .unwrap();
        builder.build_return(vec![]).unwrap();
        let mut module = builder.finish();
        let function = module.functions.values_mut().next().unwrap();

        let err = split_merged_operands(function, &cell_policy).unwrap_err();
        assert_eq!(err.kind, SplitErrorKind::MissingProducer);
        assert_eq!(err.operand_index, 1);
        assert_eq!(err.value, Some(x));
        assert!(err.to_string().starts_with("E5601"));
    }

    #[test]
    fn test_unclonable_producer_leaves_function_untouched() {
        let mut builder = IrBuilder::new("m".to_string());
        start(&mut builder);
        let x = builder.param(0).unwrap();
        let relu = builder.build_unop(UnaryOp::Relu, x).unwrap();
        builder
            .build_stateful(cell(), vec![relu, relu], IrType::tensor(IrType::F32, vec![4]))
            .unwrap();
        builder.build_return(vec![]).unwrap();
        let mut module = builder.finish();
        let function = module.functions.values_mut().next().unwrap();
        let before = function.clone();

        let err = split_merged_operands(function, &cell_policy).unwrap_err();
        assert_eq!(
            err.kind,
            SplitErrorKind::UnclonableProducer {
                producer: "tfl.relu".to_string()
            }
        );
        assert_eq!(*function, before);
    }

    #[test]
    fn test_operand_out_of_range() {
        let mut builder = IrBuilder::new("m".to_string());
        start(&mut builder);
        let zeros = builder.build_zeros(vec![4]).unwrap();
        builder
            .build_stateful(IrOpcode::Svdf, vec![zeros], IrType::tensor(IrType::F32, vec![4]))
            .unwrap();
        builder.build_return(vec![]).unwrap();
        let mut module = builder.finish();
        let function = module.functions.values_mut().next().unwrap();

        let err = split_merged_operands(function, &BuiltinStatefulPolicy).unwrap_err();
        assert_eq!(
            err.kind,
            SplitErrorKind::OperandOutOfRange { operand_count: 1 }
        );
        assert_eq!(err.value, None);
        assert_eq!(err.code(), error_codes::SPLIT_OPERAND_OUT_OF_RANGE);
    }

    #[test]
    fn test_dequantized_constant_chain_matches() {
        let mut builder = IrBuilder::new("m".to_string());
        start(&mut builder);
        let q_ty = IrType::tensor(IrType::quantized(IrType::I8, IrType::F32, 0.5, 0), vec![4]);
        let q = builder
            .build_qconst(
                IrValue::dense_i8(vec![4], &[1, 2, 3, 4]),
                crate::ir::QuantParams::PerTensor {
                    scale: 0.5,
                    zero_point: 0,
                },
                q_ty,
            )
            .unwrap();
        let d = builder
            .build_dequantize(q, IrType::tensor(IrType::F32, vec![4]))
            .unwrap();
        builder.build_return(vec![]).unwrap();
        let mut module = builder.finish();
        let function = module.functions.values_mut().next().unwrap();
        let defs = function.def_index();

        let chain = ProducerChain::match_value(function, &defs, d).unwrap();
        assert!(matches!(chain, ProducerChain::DequantizedConstant { .. }));
        assert_eq!(chain.instruction_count(), 2);
        assert!(matches!(
            ProducerChain::match_value(function, &defs, q),
            Ok(ProducerChain::Constant { result: 0, .. })
        ));
    }

    #[test]
    fn test_pass_reports_stats() {
        let mut builder = IrBuilder::new("m".to_string());
        start(&mut builder);
        let zeros = builder.build_zeros(vec![4]).unwrap();
        builder
            .build_stateful(cell(), vec![zeros, zeros], IrType::tensor(IrType::F32, vec![4]))
            .unwrap();
        builder.build_return(vec![]).unwrap();
        let mut module = builder.finish();

        let mut pass = SplitMergedOperandsPass::new(Arc::new(cell_policy));
        let result = pass.run_on_module(&mut module).unwrap();
        assert!(result.modified);
        assert_eq!(result.instructions_inserted, 1);
        assert_eq!(result.stat("constants_cloned"), 1);

        let again = pass.run_on_module(&mut module).unwrap();
        assert!(!again.modified);
        assert_eq!(pass.stats().constants_cloned, 1);
        assert_eq!(pass.stats().stateful_operands, 4);
    }

    #[test]
    fn test_vanished_producer_is_a_rewrite_failure() {
        let mut builder = IrBuilder::new("m".to_string());
        start(&mut builder);
        let zeros = builder.build_zeros(vec![4]).unwrap();
        let (op, _) = builder
            .build_stateful(cell(), vec![zeros, zeros], IrType::tensor(IrType::F32, vec![4]))
            .unwrap();
        builder.build_return(vec![]).unwrap();
        let mut module = builder.finish();
        let function = module.functions.values_mut().next().unwrap();
        let mut defs = function.def_index();

        let site = Site {
            block: IrBlockId::entry(),
            position: 1,
            inst: op,
            index: 1,
        };
        let chain = ProducerChain::Constant {
            constant: IrInstId(999),
            result: 0,
        };
        let reason = clone_chain(function, &mut defs, &site, chain).unwrap_err();
        assert!(reason.contains("op999"));

        let error = SplitError {
            kind: SplitErrorKind::RewriteFailed { reason },
            function: "main".to_string(),
            instruction: op,
            opcode: "test.cell".to_string(),
            operand_index: 1,
            value: Some(zeros),
            location: IrSourceLocation::unknown(),
        };
        assert_eq!(error.code(), error_codes::SPLIT_REWRITE_FAILED);
        assert!(error.to_string().starts_with("E9002: stateful operand #1"));
        assert!(error.help().is_some());
    }
}
