//! IR Dump Utility
//!
//! Pretty-prints the graph IR in an MLIR-like textual form. Useful for
//! inspecting what a pass inserted and which operands it rewired.

use super::{IrBasicBlock, IrFunction, IrInstruction, IrModule, IrOpcode, IrTerminator};
use std::fmt::Write;

/// Dump an entire module to a string.
pub fn dump_module(module: &IrModule) -> String {
    let mut out = String::new();
    writeln!(out, "; Module: {}", module.name).unwrap();
    writeln!(out, "; Functions: {}", module.functions.len()).unwrap();
    writeln!(out).unwrap();

    for func in module.functions.values() {
        writeln!(out, "{}", dump_function(func)).unwrap();
    }

    out
}

/// Dump a single function to a string.
pub fn dump_function(func: &IrFunction) -> String {
    let mut out = String::new();

    let params: Vec<String> = func
        .signature
        .parameters
        .iter()
        .map(|p| format!("{}: {}", p.reg, p.ty))
        .collect();
    let returns: Vec<String> = func
        .signature
        .return_types
        .iter()
        .map(|ty| ty.to_string())
        .collect();

    writeln!(
        out,
        "fn @{}({}) -> ({}) {{",
        func.name,
        params.join(", "),
        returns.join(", ")
    )
    .unwrap();

    for block in func.cfg.blocks.values() {
        write!(out, "{}", dump_block(func, block)).unwrap();
    }

    writeln!(out, "}}").unwrap();
    out
}

/// Dump a basic block to a string.
pub fn dump_block(func: &IrFunction, block: &IrBasicBlock) -> String {
    let mut out = String::new();

    if block.params.is_empty() {
        write!(out, "{}", block.id).unwrap();
    } else {
        let params: Vec<String> = block
            .params
            .iter()
            .map(|p| format!("{}: {}", p.id, p.ty))
            .collect();
        write!(out, "{}({})", block.id, params.join(", ")).unwrap();
    }
    match &block.label {
        Some(label) => writeln!(out, ":  ; {}", label).unwrap(),
        None => writeln!(out, ":").unwrap(),
    }

    for &inst_id in &block.instructions {
        match func.instruction(inst_id) {
            Some(inst) => writeln!(out, "    {}", dump_instruction(inst)).unwrap(),
            None => writeln!(out, "    ; missing {}", inst_id).unwrap(),
        }
    }

    writeln!(out, "    {}", dump_terminator(&block.terminator)).unwrap();
    out
}

/// Dump an instruction to a string.
pub fn dump_instruction(inst: &IrInstruction) -> String {
    let mut out = String::new();

    if !inst.results.is_empty() {
        let dests: Vec<String> = inst.results.iter().map(|r| r.id.to_string()).collect();
        write!(out, "{} = ", dests.join(", ")).unwrap();
    }

    write!(out, "{}", inst.opcode.name()).unwrap();
    match &inst.opcode {
        IrOpcode::Const { value } => write!(out, " {}", value).unwrap(),
        IrOpcode::QConst { value, params } => write!(out, " {} {}", value, params).unwrap(),
        IrOpcode::Quantize { params } => write!(out, " {}", params).unwrap(),
        _ => {}
    }

    if !inst.operands.is_empty() {
        let operands: Vec<String> = inst.operands.iter().map(|v| v.to_string()).collect();
        write!(out, "({})", operands.join(", ")).unwrap();
    }

    if !inst.attributes.is_empty() {
        let attrs: Vec<String> = inst
            .attributes
            .iter()
            .map(|(name, value)| format!("{} = {}", name, value))
            .collect();
        write!(out, " {{{}}}", attrs.join(", ")).unwrap();
    }

    let types: Vec<String> = inst.results.iter().map(|r| r.ty.to_string()).collect();
    if !types.is_empty() {
        write!(out, " : {}", types.join(", ")).unwrap();
    }

    out
}

/// Dump a terminator to a string.
pub fn dump_terminator(term: &IrTerminator) -> String {
    match term {
        IrTerminator::Branch { target, args } => {
            if args.is_empty() {
                format!("br {}", target)
            } else {
                let args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
                format!("br {}({})", target, args.join(", "))
            }
        }
        IrTerminator::CondBranch {
            condition,
            true_target,
            false_target,
        } => format!("br_if {}, {}, {}", condition, true_target, false_target),
        IrTerminator::Return { values } => {
            if values.is_empty() {
                "return".to_string()
            } else {
                let values: Vec<String> = values.iter().map(|v| v.to_string()).collect();
                format!("return {}", values.join(", "))
            }
        }
        IrTerminator::Unreachable => "unreachable".to_string(),
    }
}
