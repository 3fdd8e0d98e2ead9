//! Uninitialized-register prologue analysis.
//!
//! A region grown backwards from a `jr $ra` can pick up data words that
//! happen to decode as plausible instructions. Real functions start from a
//! known machine state: the ABI guarantees `$sp`, `$ra`, and the argument
//! registers hold values, and nothing else does. An "instruction" that
//! sources anything outside that set is junk, and the region start can be
//! advanced past it.
//!
//! The register state is fixed for the whole scan; no instruction ever
//! marks a register initialized. The scan just counts how many leading
//! words fail the start-of-function test.

use crate::isa::cpu::{self, CpuInstruction, CpuOpcode};
use crate::isa::registers::{fpr, gpr};
use crate::isa::OperandSlot;
use crate::rom::RomImage;
use crate::types::{RomRegion, ScanOptions, INSTRUCTION_SIZE};

/// Initialized-register flags for one analysis pass.
///
/// Two fixed arrays, indexed by register number; register indices are
/// 5-bit fields so no map is ever needed.
#[derive(Debug, Clone)]
pub struct RegisterState {
    gpr_initialized: [bool; 32],
    fpr_initialized: [bool; 32],
}

impl RegisterState {
    /// Build the ABI entry state.
    ///
    /// With `weak_register_check` set, `$v0` and `$fv0` also count as
    /// initialized: gcc reuses the return registers for the first read of
    /// an uninitialized local, and rejecting that pattern would chop the
    /// start off real gcc functions.
    pub fn at_function_entry(weak_register_check: bool) -> Self {
        let mut gpr_initialized = [false; 32];
        let mut fpr_initialized = [false; 32];

        // $zero is always its own value.
        gpr_initialized[gpr::ZERO as usize] = true;

        // The stack pointer and return address are live at entry.
        gpr_initialized[gpr::SP as usize] = true;
        gpr_initialized[gpr::RA as usize] = true;

        // Argument registers.
        gpr_initialized[gpr::A0 as usize] = true;
        gpr_initialized[gpr::A1 as usize] = true;
        gpr_initialized[gpr::A2 as usize] = true;
        gpr_initialized[gpr::A3 as usize] = true;

        // Float argument registers, both halves.
        fpr_initialized[fpr::FA0 as usize] = true;
        fpr_initialized[fpr::FA0F as usize] = true;
        fpr_initialized[fpr::FA1 as usize] = true;
        fpr_initialized[fpr::FA1F as usize] = true;

        if weak_register_check {
            gpr_initialized[gpr::V0 as usize] = true;
            fpr_initialized[fpr::FV0 as usize] = true;
            fpr_initialized[fpr::FV0F as usize] = true;
        }

        Self {
            gpr_initialized,
            fpr_initialized,
        }
    }

    fn gpr(&self, reg: u32) -> bool {
        self.gpr_initialized[reg as usize]
    }

    fn fpr(&self, reg: u32) -> bool {
        self.fpr_initialized[reg as usize]
    }
}

/// Whether the instruction reads the given operand slot.
///
/// The table encodes MIPS semantics and does not vary per caller: `rs` is
/// always an input when present; `rd` and `rt` are inputs unless the
/// instruction writes them; `ft` is an input except on the COP1 loads;
/// `fs` is an input except on moves into the FPU; `fd` is never an input.
fn operand_is_input(instr: &CpuInstruction, slot: OperandSlot) -> bool {
    if !instr.uses_slot(slot) {
        return false;
    }
    match slot {
        OperandSlot::Rs => true,
        OperandSlot::Rd => !instr.modifies_rd(),
        OperandSlot::Rt => !instr.modifies_rt(),
        OperandSlot::Fd => false,
        OperandSlot::Ft => !matches!(instr.id(), CpuOpcode::Lwc1 | CpuOpcode::Ldc1),
        OperandSlot::Fs => !matches!(instr.id(), CpuOpcode::Mtc1 | CpuOpcode::Dmtc1),
    }
}

/// Whether the instruction writes to `$zero` through `rd` or `rt`.
fn has_zero_output(instr: &CpuInstruction) -> bool {
    if instr.modifies_rd() && instr.rd() == gpr::ZERO {
        return true;
    }
    if instr.modifies_rt() && instr.rt() == gpr::ZERO {
        return true;
    }
    false
}

/// Whether the instruction sources a register outside the initialized set.
fn references_uninitialized(instr: &CpuInstruction, state: &RegisterState) -> bool {
    if operand_is_input(instr, OperandSlot::Rs) && !state.gpr(instr.rs()) {
        return true;
    }
    if operand_is_input(instr, OperandSlot::Rd) && !state.gpr(instr.rd()) {
        return true;
    }
    if operand_is_input(instr, OperandSlot::Rt) && !state.gpr(instr.rt()) {
        return true;
    }
    if operand_is_input(instr, OperandSlot::Fs) && !state.fpr(instr.fs()) {
        return true;
    }
    if operand_is_input(instr, OperandSlot::Ft) && !state.fpr(instr.ft()) {
        return true;
    }
    if operand_is_input(instr, OperandSlot::Fd) && !state.fpr(instr.fd()) {
        return true;
    }
    false
}

/// Whether this instruction is (probably) junk at the start of a region.
pub fn is_invalid_start_instruction(instr: &CpuInstruction, state: &RegisterState) -> bool {
    let id = instr.id();

    // Functions rarely open with a nop; the odd one that does loses a
    // single word and nothing else.
    if id == CpuOpcode::Nop {
        return true;
    }

    // Must be a plausible instruction at all.
    if !crate::validity::is_valid_cpu(instr) {
        return true;
    }

    // Real code doesn't write to $zero.
    if has_zero_output(instr) {
        return true;
    }

    // Real code doesn't open by reading a register nothing has set.
    if references_uninitialized(instr, state) {
        return true;
    }

    // An unconditional branch can't be a first instruction.
    if matches!(id, CpuOpcode::B | CpuOpcode::J) {
        return true;
    }

    // A linking jump would clobber $ra before it was saved.
    if matches!(id, CpuOpcode::Jal | CpuOpcode::Jalr) {
        return true;
    }

    // Jumping to $zero is a crash, not code.
    if id == CpuOpcode::Jr && instr.rs() == gpr::ZERO {
        return true;
    }

    // A shift of $zero by a non-zero amount computes zero the hard way.
    if matches!(
        id,
        CpuOpcode::Sll
            | CpuOpcode::Srl
            | CpuOpcode::Sra
            | CpuOpcode::Dsll
            | CpuOpcode::Dsll32
            | CpuOpcode::Dsrl
            | CpuOpcode::Dsrl32
            | CpuOpcode::Dsra
            | CpuOpcode::Dsra32
    ) && instr.rt() == gpr::ZERO
        && instr.sa() != 0
    {
        return true;
    }

    // HI/LO have no value worth staging this early.
    if matches!(id, CpuOpcode::Mthi | CpuOpcode::Mtlo) {
        return true;
    }

    // The COP1 condition flag can't have been set yet.
    if matches!(
        id,
        CpuOpcode::Bc1t | CpuOpcode::Bc1f | CpuOpcode::Bc1tl | CpuOpcode::Bc1fl
    ) {
        return true;
    }

    // Compilers emit addu/subu; the trapping forms flag fabricated data.
    if matches!(id, CpuOpcode::Add | CpuOpcode::Sub) {
        return true;
    }

    false
}

/// Count the consecutive junk instructions at the start of a region.
///
/// The scan is capped at the region's instruction count so a pathological
/// region can't walk past its own end.
pub fn count_invalid_start_instructions(
    region: &RomRegion,
    rom: &RomImage,
    options: &ScanOptions,
) -> usize {
    let state = RegisterState::at_function_entry(options.weak_register_check);
    let max_instrs = (region.rom_end() - region.rom_start()) / INSTRUCTION_SIZE;

    let mut count = 0;
    while count < max_instrs {
        let word = rom.read_word(region.rom_start() + count * INSTRUCTION_SIZE);
        let instr = cpu::decode(word);

        if !is_invalid_start_instruction(&instr, &state) {
            break;
        }
        count += 1;
    }

    count
}

#[cfg(test)]
mod tests {
    use super::*;

    fn region_over(words: &[u32]) -> (RomRegion, RomImage) {
        let mut bytes = vec![0u8; 0x1000];
        for word in words {
            bytes.extend_from_slice(&word.to_le_bytes());
        }
        let end = bytes.len();
        (
            RomRegion::new(0x1000, end),
            RomImage::from_le_bytes(bytes),
        )
    }

    fn count(words: &[u32]) -> usize {
        let (region, rom) = region_over(words);
        count_invalid_start_instructions(&region, &rom, &ScanOptions::new())
    }

    fn invalid_start(word: u32) -> bool {
        let state = RegisterState::at_function_entry(true);
        is_invalid_start_instruction(&cpu::decode(word), &state)
    }

    #[test]
    fn test_ordinary_prologue_counts_zero() {
        assert_eq!(
            count(&[
                0x27BD_FFE8, // addiu $sp, $sp, -0x18
                0xAFBF_0014, // sw $ra, 0x14($sp)
            ]),
            0
        );
    }

    #[test]
    fn test_nop_is_invalid_start() {
        assert!(invalid_start(0x0000_0000));
    }

    #[test]
    fn test_trapping_add_then_prologue() {
        // add $v1, $v0, $v0: rejected as a start because compilers emit
        // addu; one word is skipped, the addiu prologue ends the scan
        assert_eq!(
            count(&[
                0x0042_1820, // add $v1, $v0, $v0
                0x27BD_FFE8, // addiu $sp, $sp, -0x18
            ]),
            1
        );
    }

    #[test]
    fn test_uninitialized_source_rejected() {
        // addu $t1, $t0, $a0 reads $t0 before anything set it
        assert!(invalid_start(0x0104_4821));
        // addu $v1, $a0, $a1 reads only argument registers
        assert!(!invalid_start(0x0085_1821));
    }

    #[test]
    fn test_weak_mode_covers_v0() {
        // addu $v1, $v0, $a0
        let word = 0x0044_1821;
        let weak = RegisterState::at_function_entry(true);
        let strict = RegisterState::at_function_entry(false);
        assert!(!is_invalid_start_instruction(&cpu::decode(word), &weak));
        assert!(is_invalid_start_instruction(&cpu::decode(word), &strict));
    }

    #[test]
    fn test_zero_output_rejected() {
        // addu $zero, $a0, $a1
        assert!(invalid_start(0x0085_0021));
        // ori $zero, $a0, 1
        assert!(invalid_start(0x3480_0001));
    }

    #[test]
    fn test_branches_and_links_rejected() {
        assert!(invalid_start(0x1000_0001)); // b +4
        assert!(invalid_start(0x0800_1000)); // j
        assert!(invalid_start(0x0C00_1000)); // jal
        assert!(invalid_start(0x0080_F809)); // jalr $a0
        assert!(invalid_start(0x0000_0008)); // jr $zero
        assert!(!invalid_start(0x03E0_0008)); // jr $ra is a real start (tail-ish)
    }

    #[test]
    fn test_shift_of_zero_rejected() {
        // sll $v0, $zero, 3
        assert!(invalid_start(0x0000_10C0));
        // sll $v0, $a0, 3 is fine
        assert!(!invalid_start(0x0004_10C0));
    }

    #[test]
    fn test_hi_lo_and_cop1_flag_rejected() {
        assert!(invalid_start(0x0080_0011)); // mthi $a0
        assert!(invalid_start(0x0080_0013)); // mtlo $a0
        assert!(invalid_start(0x4501_0001)); // bc1t +4
        assert!(invalid_start(0x4500_0001)); // bc1f +4
    }

    #[test]
    fn test_float_argument_registers_initialized() {
        // mov.s $f0, $f12: fs = $fa0, initialized
        assert!(!invalid_start(0x4600_6006));
        // mov.s $f0, $f20: $f20 is a saved register, not yet live
        assert!(invalid_start(0x4600_A006));
    }

    #[test]
    fn test_scan_caps_at_region_length() {
        // A region of nothing but nops never reads past its own end.
        assert_eq!(count(&[0, 0, 0, 0]), 4);
    }
}
