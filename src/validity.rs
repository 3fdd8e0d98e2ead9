//! Per-instruction validity classification.
//!
//! These rules decide whether a decoded word is plausibly real code in an
//! N64 ROM. They are a heuristic filter, not a disassembler: each rule is
//! an independent rejection and the set stays a flat disjunction so new
//! compiler patterns can be added without reordering consequences.

use crate::isa::cpu::{CpuInstruction, CpuOpcode};
use crate::isa::registers::gpr;
use crate::isa::rsp::{RspInstruction, RspOpcode};

/// COP0 register indices that are reserved on the VR4300.
///
/// No real code touches these; an `mtc0`/`mfc0` naming one is data.
fn invalid_cop0_register(reg: u32) -> bool {
    reg == 7 || (21..=25).contains(&reg) || reg == 31
}

/// COP0 register indices above the RSP's SP/DP command space.
fn invalid_rsp_cop0_register(reg: u32) -> bool {
    reg > 15
}

/// Opcodes that are architecturally valid but never appear in N64 games.
fn is_unused_n64_instruction(id: CpuOpcode) -> bool {
    matches!(
        id,
        CpuOpcode::Ll | CpuOpcode::Sc | CpuOpcode::Lld | CpuOpcode::Scd | CpuOpcode::Syscall
    )
}

/// Check whether a decoded CPU instruction is plausibly real N64 code.
pub fn is_valid_cpu(instr: &CpuInstruction) -> bool {
    let id = instr.id();

    // Unknown opcodes and malformed encodings.
    if !instr.is_well_formed() {
        return false;
    }

    // Loads or stores with an offset from $zero.
    //
    // Loads *to* $zero are deliberately not rejected here: some compilers
    // emit them for volatile dereferences. The prologue analysis applies
    // the stricter start-of-region check.
    if (instr.does_load() || instr.does_store()) && instr.rs() == gpr::ZERO {
        return false;
    }

    // mtc0 or mfc0 naming a reserved COP0 register.
    if matches!(id, CpuOpcode::Mtc0 | CpuOpcode::Mfc0) && invalid_cop0_register(instr.cop0_rd()) {
        return false;
    }

    // Valid instructions that wouldn't be in an N64 game.
    if is_unused_n64_instruction(id) {
        return false;
    }

    // cache with out-of-range operation or type fields.
    if id == CpuOpcode::Cache {
        let cache_param = instr.cache_op();
        let cache_op = cache_param >> 2;
        let cache_type = cache_param & 0x3;

        // Only cache operations 0-6 and cache types 0-1 exist.
        if cache_op > 6 || cache_type > 1 {
            return false;
        }
    }

    // COP2 loads/stores; the N64 CPU has no COP2.
    if matches!(
        id,
        CpuOpcode::Lwc2 | CpuOpcode::Ldc2 | CpuOpcode::Swc2 | CpuOpcode::Sdc2
    ) {
        return false;
    }

    // Conditional traps.
    if instr.is_trap() {
        return false;
    }

    // ctc0 and cfc0 don't exist on the N64 CPU.
    if matches!(id, CpuOpcode::Ctc0 | CpuOpcode::Cfc0) {
        return false;
    }

    // pref is MIPS IV.
    if id == CpuOpcode::Pref {
        return false;
    }

    true
}

/// Check whether a decoded RSP instruction is plausibly real microcode.
pub fn is_valid_rsp(instr: &RspInstruction) -> bool {
    let id = instr.id();

    // Unknown opcodes and malformed encodings.
    if !instr.is_well_formed() {
        return false;
    }

    // Writes to $zero. Microcode is hand-written; the compiler volatile
    // idiom that keeps this legal on the CPU side never shows up here.
    if instr.modifies_rd() && instr.rd() == gpr::ZERO {
        return false;
    }
    if instr.modifies_rt() && instr.rt() == gpr::ZERO {
        return false;
    }

    // mtc0 or mfc0 past the SP/DP command registers.
    if matches!(id, RspOpcode::Mtc0 | RspOpcode::Mfc0)
        && invalid_rsp_cop0_register(instr.cop0_rd())
    {
        return false;
    }

    // Encodings the RSP doesn't have.
    if matches!(
        id,
        RspOpcode::Lwc1 | RspOpcode::Swc1 | RspOpcode::Ctc0 | RspOpcode::Cfc0 | RspOpcode::Cache
    ) {
        return false;
    }

    true
}
