//! Dominator tree over the block graph of one function
//!
//! Computed with the iterative algorithm of Cooper, Harvey and Kennedy over
//! reverse postorder from the entry block. Blocks the entry cannot reach are
//! absent from the tree.

use super::{IrBlockId, IrControlFlowGraph, IrFunction};
use std::collections::{HashMap, HashSet};

/// Dominator tree for a function's control flow graph.
///
/// A block D dominates block B if every path from the entry to B goes through D.
#[derive(Debug, Clone)]
pub struct DominatorTree {
    /// Immediate dominator of every reachable block except the entry
    idom: HashMap<IrBlockId, IrBlockId>,

    /// Blocks reachable from the entry, in reverse postorder
    rpo: Vec<IrBlockId>,

    entry: IrBlockId,
}

impl DominatorTree {
    pub fn compute(function: &IrFunction) -> Self {
        let cfg = &function.cfg;
        let entry = cfg.entry_block;

        let rpo = reverse_postorder(cfg, entry);
        let rpo_index: HashMap<IrBlockId, usize> =
            rpo.iter().enumerate().map(|(i, &b)| (b, i)).collect();

        let mut predecessors: HashMap<IrBlockId, Vec<IrBlockId>> = HashMap::new();
        for &block in &rpo {
            if let Some(b) = cfg.get_block(block) {
                for succ in b.successors() {
                    predecessors.entry(succ).or_default().push(block);
                }
            }
        }

        let mut idom: HashMap<IrBlockId, IrBlockId> = HashMap::new();
        idom.insert(entry, entry);

        let mut changed = true;
        while changed {
            changed = false;

            for &block in rpo.iter().skip(1) {
                let mut new_idom: Option<IrBlockId> = None;
                for &pred in predecessors.get(&block).map(Vec::as_slice).unwrap_or(&[]) {
                    if !idom.contains_key(&pred) {
                        continue;
                    }
                    new_idom = Some(match new_idom {
                        None => pred,
                        Some(current) => intersect(current, pred, &idom, &rpo_index),
                    });
                }

                if let Some(new_idom) = new_idom {
                    if idom.get(&block) != Some(&new_idom) {
                        idom.insert(block, new_idom);
                        changed = true;
                    }
                }
            }
        }

        idom.remove(&entry);
        Self { idom, rpo, entry }
    }

    /// Immediate dominator (None for the entry and unreachable blocks)
    pub fn idom(&self, block: IrBlockId) -> Option<IrBlockId> {
        self.idom.get(&block).copied()
    }

    pub fn is_reachable(&self, block: IrBlockId) -> bool {
        block == self.entry || self.idom.contains_key(&block)
    }

    /// Reachable blocks in reverse postorder
    pub fn reverse_postorder(&self) -> &[IrBlockId] {
        &self.rpo
    }

    /// Check if block `a` dominates block `b`.
    pub fn dominates(&self, a: IrBlockId, b: IrBlockId) -> bool {
        if a == b {
            return true;
        }
        if !self.is_reachable(b) {
            return false;
        }

        let mut current = b;
        while let Some(&dom) = self.idom.get(&current) {
            if dom == a {
                return true;
            }
            current = dom;
        }
        false
    }
}

fn reverse_postorder(cfg: &IrControlFlowGraph, entry: IrBlockId) -> Vec<IrBlockId> {
    let mut visited = HashSet::new();
    let mut postorder = Vec::new();

    // Explicit stack of (block, successors still to visit)
    let mut stack: Vec<(IrBlockId, Vec<IrBlockId>)> = Vec::new();
    if let Some(b) = cfg.get_block(entry) {
        visited.insert(entry);
        stack.push((entry, b.successors()));
    }

    while let Some((block, pending)) = stack.last_mut() {
        match pending.pop() {
            Some(succ) => {
                if let Some(b) = cfg.get_block(succ) {
                    if visited.insert(succ) {
                        stack.push((succ, b.successors()));
                    }
                }
            }
            None => {
                postorder.push(*block);
                stack.pop();
            }
        }
    }

    postorder.reverse();
    postorder
}

fn intersect(
    mut b1: IrBlockId,
    mut b2: IrBlockId,
    idom: &HashMap<IrBlockId, IrBlockId>,
    rpo_index: &HashMap<IrBlockId, usize>,
) -> IrBlockId {
    let index = |b: IrBlockId| rpo_index.get(&b).copied().unwrap_or(usize::MAX);

    while b1 != b2 {
        while index(b1) > index(b2) {
            match idom.get(&b1) {
                Some(&dom) => b1 = dom,
                None => return b2,
            }
        }
        while index(b2) > index(b1) {
            match idom.get(&b2) {
                Some(&dom) => b2 = dom,
                None => return b1,
            }
        }
    }
    b1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{IrFunctionId, IrFunctionSignature, IrTerminator};

    /// entry -> bb2 -> bb1, with bb1 laid out before bb2, plus an orphan bb3
    fn out_of_layout_function() -> IrFunction {
        let mut function = IrFunction::new(
            IrFunctionId(0),
            "f".to_string(),
            IrFunctionSignature::default(),
        );
        let bb1 = function.cfg.create_block();
        let bb2 = function.cfg.create_block();
        let bb3 = function.cfg.create_block();
        let entry = function.cfg.entry_block;

        function.cfg.get_block_mut(entry).unwrap().set_terminator(IrTerminator::Branch {
            target: bb2,
            args: vec![],
        });
        function.cfg.get_block_mut(bb2).unwrap().set_terminator(IrTerminator::Branch {
            target: bb1,
            args: vec![],
        });
        for block in [bb1, bb3] {
            function
                .cfg
                .get_block_mut(block)
                .unwrap()
                .set_terminator(IrTerminator::Return { values: vec![] });
        }
        function
    }

    #[test]
    fn test_dominance_follows_edges_not_layout() {
        let function = out_of_layout_function();
        let tree = DominatorTree::compute(&function);
        let (entry, bb1, bb2, bb3) = (
            IrBlockId::entry(),
            IrBlockId::new(1),
            IrBlockId::new(2),
            IrBlockId::new(3),
        );

        assert_eq!(tree.reverse_postorder(), &[entry, bb2, bb1]);
        assert_eq!(tree.idom(bb1), Some(bb2));
        assert_eq!(tree.idom(bb2), Some(entry));
        assert!(tree.dominates(bb2, bb1));
        assert!(!tree.dominates(bb1, bb2));
        assert!(tree.dominates(entry, bb1));

        assert!(!tree.is_reachable(bb3));
        assert!(!tree.dominates(entry, bb3));
    }

    #[test]
    fn test_diamond_join_is_dominated_by_entry_only() {
        let mut function = out_of_layout_function();
        let entry = IrBlockId::entry();
        let (bb1, bb2, bb3) = (IrBlockId::new(1), IrBlockId::new(2), IrBlockId::new(3));
        let cond = function.alloc_reg();
        function.cfg.get_block_mut(entry).unwrap().set_terminator(IrTerminator::CondBranch {
            condition: cond,
            true_target: bb2,
            false_target: bb3,
        });
        function.cfg.get_block_mut(bb3).unwrap().set_terminator(IrTerminator::Branch {
            target: bb1,
            args: vec![],
        });

        let tree = DominatorTree::compute(&function);
        assert_eq!(tree.idom(bb1), Some(entry));
        assert!(!tree.dominates(bb2, bb1));
        assert!(!tree.dominates(bb3, bb1));
    }
}
