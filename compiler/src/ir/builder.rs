//! IR Builder
//!
//! This module provides a builder interface for constructing graph IR in a
//! convenient way. The builder maintains the current function and block and
//! provides helpers for the operations model graphs are made of.

use tracing::debug;

use super::{
    BinaryOp, IrAttribute, IrBlockId, IrBlockParam, IrFunction, IrFunctionId,
    IrFunctionSignature, IrId, IrInstId, IrInstruction, IrModule, IrOpcode, IrParameter,
    IrResult, IrSourceLocation, IrTerminator, IrType, IrValue, QuantParams, UnaryOp,
};

/// IR builder for constructing IR modules
pub struct IrBuilder {
    /// The module being built
    pub module: IrModule,

    /// Current function being built
    pub(crate) current_function: Option<IrFunctionId>,

    /// Current basic block being built
    pub(crate) current_block: Option<IrBlockId>,

    /// Source location context
    current_source_location: IrSourceLocation,
}

impl IrBuilder {
    /// Create a new IR builder
    pub fn new(module_name: String) -> Self {
        Self {
            module: IrModule::new(module_name),
            current_function: None,
            current_block: None,
            current_source_location: IrSourceLocation::unknown(),
        }
    }

    /// Set the current source location for debugging
    pub fn set_source_location(&mut self, loc: IrSourceLocation) {
        self.current_source_location = loc;
    }

    // === Module Building ===

    /// Start building a new function
    pub fn start_function(&mut self, name: String, signature: IrFunctionSignature) -> IrFunctionId {
        let id = self.module.alloc_function_id();
        let function = IrFunction::new(id, name, signature);
        self.current_function = Some(id);
        self.current_block = Some(function.entry_block());
        self.module.add_function(function);
        id
    }

    /// Finish building the current function
    pub fn finish_function(&mut self) {
        self.current_function = None;
        self.current_block = None;
    }

    /// Get the current function
    pub fn current_function(&self) -> Option<&IrFunction> {
        self.current_function
            .and_then(|id| self.module.functions.get(&id))
    }

    /// Get the current function mutably
    pub fn current_function_mut(&mut self) -> Option<&mut IrFunction> {
        self.current_function
            .and_then(move |id| self.module.functions.get_mut(&id))
    }

    /// Consume the builder and return the module
    pub fn finish(self) -> IrModule {
        self.module
    }

    // === Block Building ===

    /// Create a new basic block taking parameters of the given types.
    /// Returns the block and its parameter values.
    pub fn create_block(&mut self, param_types: Vec<IrType>) -> Option<(IrBlockId, Vec<IrId>)> {
        let func = self.current_function_mut()?;
        let block_id = func.cfg.create_block();
        let params: Vec<IrBlockParam> = param_types
            .into_iter()
            .map(|ty| IrBlockParam {
                id: func.alloc_reg(),
                ty,
            })
            .collect();
        let ids = params.iter().map(|p| p.id).collect();
        func.cfg.get_block_mut(block_id)?.params = params;
        Some((block_id, ids))
    }

    /// Switch to building in a different block
    pub fn switch_to_block(&mut self, block: IrBlockId) {
        self.current_block = Some(block);
    }

    /// Get the current block
    pub fn current_block(&self) -> Option<IrBlockId> {
        self.current_block
    }

    /// Get the parameter value of the current function by index
    pub fn param(&self, index: usize) -> Option<IrId> {
        self.current_function()?.get_param_reg(index)
    }

    // === Instruction Building ===

    /// Build an arbitrary operation and return its instruction id and results
    pub fn build_op_with_id(
        &mut self,
        opcode: IrOpcode,
        operands: Vec<IrId>,
        result_types: Vec<IrType>,
        attributes: Vec<(&str, IrAttribute)>,
    ) -> Option<(IrInstId, Vec<IrId>)> {
        let block_id = self.current_block?;
        let loc = self.current_source_location;
        let func = self.current_function_mut()?;

        let results: Vec<IrResult> = result_types
            .into_iter()
            .map(|ty| IrResult {
                id: func.alloc_reg(),
                ty,
            })
            .collect();
        let ids: Vec<IrId> = results.iter().map(|r| r.id).collect();

        let mut inst = IrInstruction::new(opcode, operands, results);
        inst.source_location = loc;
        for (name, value) in attributes {
            inst.attributes.insert(name.to_string(), value);
        }

        debug!("build {} in {} -> {:?}", inst.opcode, block_id, ids);
        let inst_id = func.append_instruction(block_id, inst)?;
        Some((inst_id, ids))
    }

    /// Build an arbitrary operation and return its results
    pub fn build_op(
        &mut self,
        opcode: IrOpcode,
        operands: Vec<IrId>,
        result_types: Vec<IrType>,
    ) -> Option<Vec<IrId>> {
        self.build_op_with_id(opcode, operands, result_types, Vec::new())
            .map(|(_, ids)| ids)
    }

    /// Build an operation with a single result
    fn build_single(&mut self, opcode: IrOpcode, operands: Vec<IrId>, ty: IrType) -> Option<IrId> {
        self.build_op(opcode, operands, vec![ty])?.into_iter().next()
    }

    /// Build a constant instruction
    pub fn build_const(&mut self, value: IrValue, ty: IrType) -> Option<IrId> {
        self.build_single(IrOpcode::Const { value }, vec![], ty)
    }

    /// Build a quantized constant
    pub fn build_qconst(&mut self, value: IrValue, params: QuantParams, ty: IrType) -> Option<IrId> {
        self.build_single(IrOpcode::QConst { value, params }, vec![], ty)
    }

    /// Build a zero-filled f32 tensor constant
    pub fn build_zeros(&mut self, shape: Vec<i64>) -> Option<IrId> {
        let ty = IrType::tensor(IrType::F32, shape.clone());
        self.build_const(IrValue::splat(shape, IrValue::F32(0.0)), ty)
    }

    /// Build a dequantize of `input` producing `ty`
    pub fn build_dequantize(&mut self, input: IrId, ty: IrType) -> Option<IrId> {
        self.build_single(IrOpcode::Dequantize, vec![input], ty)
    }

    /// Build a quantize of `input`
    pub fn build_quantize(&mut self, input: IrId, params: QuantParams, ty: IrType) -> Option<IrId> {
        self.build_single(IrOpcode::Quantize { params }, vec![input], ty)
    }

    /// Build a binary element-wise operation; the result takes the left type
    pub fn build_binop(&mut self, op: BinaryOp, left: IrId, right: IrId) -> Option<IrId> {
        let ty = self.value_type(left)?;
        self.build_single(IrOpcode::BinOp(op), vec![left, right], ty)
    }

    /// Build a unary element-wise operation
    pub fn build_unop(&mut self, op: UnaryOp, operand: IrId) -> Option<IrId> {
        let ty = self.value_type(operand)?;
        self.build_single(IrOpcode::UnOp(op), vec![operand], ty)
    }

    /// Build a stateful or otherwise opaque operation with one result
    pub fn build_stateful(
        &mut self,
        opcode: IrOpcode,
        operands: Vec<IrId>,
        ty: IrType,
    ) -> Option<(IrInstId, IrId)> {
        let (inst, ids) = self.build_op_with_id(opcode, operands, vec![ty], Vec::new())?;
        Some((inst, *ids.first()?))
    }

    /// Type of a value visible in the current function
    pub fn value_type(&self, value: IrId) -> Option<IrType> {
        let func = self.current_function()?;
        if let Some(param) = func.signature.parameters.iter().find(|p| p.reg == value) {
            return Some(param.ty.clone());
        }
        for block in func.cfg.blocks.values() {
            if let Some(param) = block.params.iter().find(|p| p.id == value) {
                return Some(param.ty.clone());
            }
        }
        func.instructions
            .iter()
            .flat_map(|inst| inst.results.iter())
            .find(|r| r.id == value)
            .map(|r| r.ty.clone())
    }

    // === Terminators ===

    fn set_terminator(&mut self, term: IrTerminator) -> Option<()> {
        let block_id = self.current_block?;
        self.current_function_mut()?
            .cfg
            .get_block_mut(block_id)
            .map(|b| b.set_terminator(term))
    }

    /// Build an unconditional branch
    pub fn build_branch(&mut self, target: IrBlockId, args: Vec<IrId>) -> Option<()> {
        self.set_terminator(IrTerminator::Branch { target, args })
    }

    /// Build a conditional branch
    pub fn build_cond_branch(
        &mut self,
        condition: IrId,
        true_target: IrBlockId,
        false_target: IrBlockId,
    ) -> Option<()> {
        self.set_terminator(IrTerminator::CondBranch {
            condition,
            true_target,
            false_target,
        })
    }

    /// Build a return
    pub fn build_return(&mut self, values: Vec<IrId>) -> Option<()> {
        self.set_terminator(IrTerminator::Return { values })
    }
}

/// Helper to build function signatures
pub struct FunctionSignatureBuilder {
    parameters: Vec<IrParameter>,
    return_types: Vec<IrType>,
}

impl Default for FunctionSignatureBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl FunctionSignatureBuilder {
    pub fn new() -> Self {
        Self {
            parameters: Vec::new(),
            return_types: Vec::new(),
        }
    }

    pub fn param(mut self, name: String, ty: IrType) -> Self {
        self.parameters.push(IrParameter {
            name,
            ty,
            reg: IrId::new(0), // Assigned by IrFunction::new
        });
        self
    }

    pub fn returns(mut self, ty: IrType) -> Self {
        self.return_types.push(ty);
        self
    }

    pub fn build(self) -> IrFunctionSignature {
        IrFunctionSignature {
            parameters: self.parameters,
            return_types: self.return_types,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_function_building() {
        let mut builder = IrBuilder::new("test".to_string());

        let sig = FunctionSignatureBuilder::new()
            .param("x".to_string(), IrType::tensor(IrType::F32, vec![4]))
            .returns(IrType::tensor(IrType::F32, vec![4]))
            .build();

        let func_id = builder.start_function("scale".to_string(), sig);
        let x = builder.param(0).unwrap();
        let two = builder
            .build_const(
                IrValue::splat(vec![4], IrValue::F32(2.0)),
                IrType::tensor(IrType::F32, vec![4]),
            )
            .unwrap();
        let result = builder.build_binop(BinaryOp::Mul, x, two).unwrap();
        builder.build_return(vec![result]).unwrap();
        builder.finish_function();

        let func = &builder.module.functions[&func_id];
        assert_eq!(func.name, "scale");
        let entry = func.cfg.get_block(func.entry_block()).unwrap();
        assert_eq!(entry.instructions.len(), 2);
        assert!(matches!(entry.terminator, IrTerminator::Return { .. }));
        assert!(func.verify().is_ok());
    }

    #[test]
    fn test_block_params_and_branches() {
        let mut builder = IrBuilder::new("test".to_string());
        builder.start_function("loop".to_string(), IrFunctionSignature::default());

        let zeros = builder.build_zeros(vec![1, 8]).unwrap();
        let (body, params) = builder
            .create_block(vec![IrType::tensor(IrType::F32, vec![1, 8])])
            .unwrap();
        builder.build_branch(body, vec![zeros]).unwrap();

        builder.switch_to_block(body);
        assert_eq!(
            builder.value_type(params[0]),
            Some(IrType::tensor(IrType::F32, vec![1, 8]))
        );
        builder.build_return(vec![params[0]]).unwrap();

        let func = builder.current_function().unwrap();
        assert!(func.verify().is_ok());
        assert_eq!(func.cfg.blocks.len(), 2);
    }

    #[test]
    fn test_source_location_is_recorded() {
        let mut builder = IrBuilder::new("test".to_string());
        builder.start_function("f".to_string(), IrFunctionSignature::default());
        builder.set_source_location(IrSourceLocation::new(1, 10, 5));
        let (inst, _) = builder
            .build_op_with_id(
                IrOpcode::Custom {
                    name: "custom.noop".to_string(),
                },
                vec![],
                vec![IrType::None],
                vec![("tag", IrAttribute::String("x".to_string()))],
            )
            .unwrap();

        let func = builder.current_function().unwrap();
        let inst = func.instruction(inst).unwrap();
        assert_eq!(inst.source_location, IrSourceLocation::new(1, 10, 5));
        assert_eq!(
            inst.attributes.get("tag"),
            Some(&IrAttribute::String("x".to_string()))
        );
    }
}
