//! Code-region discovery.
//!
//! Every function a compiler emits ends in `jr $ra` with a delay slot, so
//! those words seed the search. Each seed grows bidirectionally through
//! whatever still classifies as CPU code, gets trimmed back to a
//! well-terminated range, and is then stitched to its neighbor when the
//! bytes between them decode cleanly as CPU code or RSP microcode.
//! Microcode has no `jr $ra` of its own; bridging is what pulls it in.

use crate::analysis::count_invalid_start_instructions;
use crate::isa::{cpu, rsp};
use crate::rom::RomImage;
use crate::types::{
    RomRegion, ScanOptions, INSTRUCTION_SIZE, JR_RA, MICROCODE_CHECK_THRESHOLD, ROM_HEADER_SIZE,
};
use crate::validity::{is_valid_cpu, is_valid_rsp};

/// Collect the offsets of every plausible `jr $ra` past the ROM header.
///
/// A bare match on the return encoding isn't enough: the word after it
/// executes in the delay slot, so it must decode as something (CPU or
/// RSP) for the return to be real.
fn find_return_locations(rom: &RomImage) -> Vec<usize> {
    let mut locations = Vec::with_capacity(1024);

    let mut offset = ROM_HEADER_SIZE;
    while offset + 2 * INSTRUCTION_SIZE <= rom.len() {
        if rom.read_word(offset) == JR_RA {
            let delay = rom.read_word(offset + INSTRUCTION_SIZE);
            if is_valid_cpu(&cpu::decode(delay)) || is_valid_rsp(&rsp::decode(delay)) {
                locations.push(offset);
            }
        }
        offset += INSTRUCTION_SIZE;
    }

    locations
}

/// Walk backwards from `rom_addr` while the words keep classifying as CPU
/// code, bottoming out at the ROM header.
fn find_code_start(rom: &RomImage, mut rom_addr: usize) -> usize {
    while rom_addr > ROM_HEADER_SIZE {
        let prev_addr = rom_addr - INSTRUCTION_SIZE;
        if !is_valid_cpu(&cpu::decode(rom.read_word(prev_addr))) {
            return rom_addr;
        }
        rom_addr = prev_addr;
    }

    rom_addr
}

/// Walk forwards from `rom_addr` while the words keep classifying as CPU
/// code, bottoming out at the image end.
fn find_code_end(rom: &RomImage, mut rom_addr: usize) -> usize {
    while rom_addr < rom.len() {
        if !is_valid_cpu(&cpu::decode(rom.read_word(rom_addr))) {
            return rom_addr;
        }
        rom_addr += INSTRUCTION_SIZE;
    }

    rom_addr
}

/// Whether a word is an unconditional non-linking control transfer
/// (`b`, `j`, or `jr`).
fn is_unconditional_branch(word: u32) -> bool {
    let instr = cpu::decode(word);
    instr.is_unconditional_branch() || instr.id() == cpu::CpuOpcode::Jr
}

/// Trim junk from the start of a region and loose instructions from its
/// end.
///
/// The start advances past prologue-implausible words and leading zeros.
/// The end retreats until the region's last two words are an unconditional
/// branch and its delay slot: anything after that point would fall through
/// into whatever stopped the forward growth.
fn trim_region(region: &mut RomRegion, rom: &RomImage, options: &ScanOptions) {
    let invalid_start_count = count_invalid_start_instructions(region, rom, options);

    let mut start = region.rom_start() + invalid_start_count * INSTRUCTION_SIZE;
    let mut end = region.rom_end();

    // Leading zero words.
    while start < end && rom.read_word(start) == 0 {
        start += INSTRUCTION_SIZE;
    }

    // Scan two instructions back from the end so the branch's delay slot
    // stays inside the region.
    while end > start && !is_unconditional_branch(rom.read_word(end - 2 * INSTRUCTION_SIZE)) {
        end -= INSTRUCTION_SIZE;
    }

    region.set_rom_start(start);
    region.set_rom_end(end);
}

/// Whether `[rom_start, rom_end)` decodes entirely as CPU code.
///
/// Three identical consecutive words that are loads or stores fail the
/// range: that pattern is fabricated data, not code. Repeated arithmetic
/// passes because algebraic duplication is plausible.
fn check_range_cpu(rom_start: usize, rom_end: usize, rom: &RomImage) -> bool {
    let mut prev_word = None;
    let mut identical_count = 0usize;

    let mut offset = rom_start;
    while offset < rom_end {
        let word = rom.read_word(offset);
        if Some(word) == prev_word {
            identical_count += 1;
        } else {
            prev_word = Some(word);
            identical_count = 0;
        }

        let instr = cpu::decode(word);
        if identical_count >= 2 && (instr.does_load() || instr.does_store()) {
            return false;
        }
        if !is_valid_cpu(&instr) {
            return false;
        }
        offset += INSTRUCTION_SIZE;
    }

    true
}

/// Whether `[rom_start, rom_end)` decodes entirely as RSP microcode,
/// under the same repeated-load/store rule as [`check_range_cpu`].
fn check_range_rsp(rom_start: usize, rom_end: usize, rom: &RomImage) -> bool {
    let mut prev_word = None;
    let mut identical_count = 0usize;

    let mut offset = rom_start;
    while offset < rom_end {
        let word = rom.read_word(offset);
        if Some(word) == prev_word {
            identical_count += 1;
        } else {
            prev_word = Some(word);
            identical_count = 0;
        }

        let instr = rsp::decode(word);
        if identical_count >= 2 && (instr.does_load() || instr.does_store()) {
            return false;
        }
        if !is_valid_rsp(&instr) {
            return false;
        }
        offset += INSTRUCTION_SIZE;
    }

    true
}

/// Find all code regions in the image.
///
/// The result is sorted by start offset, non-overlapping, and every
/// region starts at or past the ROM header.
pub fn find_code_regions(rom: &RomImage, options: &ScanOptions) -> Vec<RomRegion> {
    let return_addrs = find_return_locations(rom);
    tracing::debug!(seeds = return_addrs.len(), "found return instructions");

    let mut regions: Vec<RomRegion> = Vec::new();

    let mut i = 0;
    while let Some(&seed) = return_addrs.get(i) {
        let grown_start = find_code_start(rom, seed);
        let grown_end = find_code_end(rom, seed);
        let mut region = RomRegion::new(grown_start, grown_end);

        // Every return inside the grown range belongs to this region.
        while return_addrs.get(i).is_some_and(|&addr| addr < grown_end) {
            i += 1;
        }

        trim_region(&mut region, rom, options);
        if region.is_empty() {
            continue;
        }

        // If the new region is close enough to the previous one, test the
        // gap. CPU evidence is checked first: it is strictly stronger,
        // since it merges without claiming microcode. Only when the CPU
        // check fails does the gap get a chance to be RSP code.
        let mut merged = false;
        if let Some(prev) = regions.last_mut() {
            if region.rom_start() <= prev.rom_end() {
                // Trimming after an RSP extension can leave the next
                // region butted against (or inside) the previous one;
                // an empty gap needs no evidence.
                let new_end = prev.rom_end().max(region.rom_end());
                prev.set_rom_end(new_end);
                merged = true;
            } else if region.rom_start() - prev.rom_end() < MICROCODE_CHECK_THRESHOLD {
                let mut valid_range = check_range_cpu(prev.rom_end(), region.rom_start(), rom);
                if !valid_range {
                    valid_range = check_range_rsp(prev.rom_end(), region.rom_start(), rom);
                    if valid_range {
                        prev.set_has_rsp(true);
                    }
                }
                if valid_range {
                    tracing::debug!(
                        start = prev.rom_start(),
                        end = region.rom_end(),
                        rsp = prev.has_rsp(),
                        "merged adjacent regions"
                    );
                    prev.set_rom_end(region.rom_end());
                    merged = true;
                }
            }
        }
        if !merged {
            regions.push(region);
        }

        // A region flagged as microcode keeps going while the words keep
        // decoding as RSP: the microcode's own end has no `jr $ra` for
        // the seeding pass to find.
        if let Some(current) = regions.last_mut() {
            if current.has_rsp() {
                let mut end = current.rom_end();
                while end < rom.len() && is_valid_rsp(&rsp::decode(rom.read_word(end))) {
                    end += INSTRUCTION_SIZE;
                }
                current.set_rom_end(end);

                // The extension can overrun into junk; trim it back.
                trim_region(current, rom, options);

                let extended_end = current.rom_end();
                while return_addrs.get(i).is_some_and(|&addr| addr < extended_end) {
                    i += 1;
                }
            }
        }
    }

    if options.drop_short_regions {
        regions.retain(|region| region.instruction_count() >= options.min_region_instructions);
    }

    regions
}
