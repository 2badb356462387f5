//! Instruction, block and function statistics.

use std::collections::HashSet;

use crate::analysis::normalize::{ControlTransfer, Listing};
use crate::model::StaticAnalysisMetrics;

const MEMORY_MARKERS: [&str; 6] = ["mov", "lea", "push", "pop", "[", "]"];
const REGISTER_MARKERS: [&str; 6] = ["r", "e", "ax", "bx", "cx", "dx"];
const MAX_NESTING_DEPTH: u64 = 10;
const INDIRECT_JUMPS_PER_NESTING_LEVEL: u64 = 5;

/// Compute static metrics for a listing. `file_size` is the binary's size on disk.
pub fn extract(listing: &Listing, file_size: u64) -> StaticAnalysisMetrics {
    let mut control_edges = 0u64;
    let mut conditional = 0u64;
    let mut unconditional = 0u64;
    let mut indirect = 0u64;
    let mut mem_ops = 0u64;
    let mut reg_ops = 0u64;
    let mut opcodes = HashSet::new();

    for insn in listing.instructions() {
        opcodes.insert(insn.mnemonic.as_str());
        match insn.control_transfer() {
            ControlTransfer::Conditional => {
                conditional += 1;
                control_edges += 2;
            }
            ControlTransfer::Unconditional => {
                unconditional += 1;
                control_edges += 1;
            }
            ControlTransfer::None => {
                let indirect_syntax = insn.raw.contains('*') || insn.raw.contains("QWORD PTR");
                if indirect_syntax
                    && (insn.mnemonic.contains("jmp") || insn.mnemonic.contains("call"))
                {
                    indirect += 1;
                }
            }
        }
        if MEMORY_MARKERS.iter().any(|m| insn.raw.contains(m)) {
            mem_ops += 1;
        }
        if REGISTER_MARKERS.iter().any(|m| insn.mnemonic.contains(m)) {
            reg_ops += 1;
        }
    }

    let num_instructions = listing.instructions().len() as u64;
    let num_blocks = listing.blocks().len() as u64;
    let num_functions = listing.functions().len() as u64;
    let unique_opcodes = opcodes.len() as u64;

    let cyclomatic = if num_blocks > 0 {
        control_edges as f64 - num_blocks as f64 + 2.0 * num_functions as f64
    } else {
        1.0
    };

    StaticAnalysisMetrics {
        file_size,
        num_instructions,
        num_basic_blocks: num_blocks,
        num_functions,
        unique_opcodes,
        cyclomatic_complexity: cyclomatic,
        instruction_diversity: ratio(unique_opcodes, num_instructions),
        avg_basic_block_size: ratio(num_instructions, num_blocks),
        max_basic_block_size: listing.blocks().iter().map(|b| b.len() as u64).max().unwrap_or(0),
        num_control_flow_edges: control_edges,
        num_indirect_jumps: indirect,
        num_conditional_branches: conditional,
        num_unconditional_jumps: unconditional,
        max_nesting_depth: nesting_depth(indirect),
        num_memory_operations: mem_ops,
        num_register_operations: reg_ops,
        register_pressure: ratio(reg_ops, num_instructions),
        stack_complexity: ratio(mem_ops, num_instructions),
    }
}

fn nesting_depth(indirect_jumps: u64) -> u64 {
    (indirect_jumps / INDIRECT_JUMPS_PER_NESTING_LEVEL).clamp(1, MAX_NESTING_DEPTH)
}

fn ratio(num: u64, den: u64) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nesting_depth_is_floored_and_capped() {
        assert_eq!(nesting_depth(0), 1);
        assert_eq!(nesting_depth(3), 1);
        assert_eq!(nesting_depth(12), 2);
        assert_eq!(nesting_depth(500), 10);
    }
}
