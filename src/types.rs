//! Core types and constants for the region scanner.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Size of one MIPS instruction in bytes.
pub const INSTRUCTION_SIZE: usize = 4;

/// Offset of the first byte that can hold code.
///
/// The first 0x1000 bytes of every cartridge are the header and IPL3 boot
/// block; nothing there is game code.
pub const ROM_HEADER_SIZE: usize = 0x1000;

/// The canonical encoding of `jr $ra`.
pub const JR_RA: u32 = 0x03E0_0008;

/// Maximum gap, in bytes, between two regions that is still worth testing
/// for intervening CPU code or RSP microcode.
pub const MICROCODE_CHECK_THRESHOLD: usize = 0x400 * INSTRUCTION_SIZE;

/// Regions shorter than this many instructions are suspect.
///
/// Dropping them is off by default ([`ScanOptions::drop_short_regions`]);
/// the threshold exists as a tunable.
pub const MIN_REGION_INSTRUCTIONS: usize = 4;

/// Nearest multiple of `divisor` greater than or equal to `val`.
pub fn nearest_multiple_up(val: usize, divisor: usize) -> usize {
    val.div_ceil(divisor) * divisor
}

/// Nearest multiple of `divisor` less than or equal to `val`.
pub fn nearest_multiple_down(val: usize, divisor: usize) -> usize {
    (val / divisor) * divisor
}

/// Byte order of a ROM image on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ByteOrder {
    /// `.z64`: big-endian, the cartridge's native order.
    Big,
    /// Little-endian, the order the scanner works in.
    Little,
    /// `.v64`: 16-bit byteswapped. Detected but not supported.
    ByteSwapped,
}

impl fmt::Display for ByteOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ByteOrder::Big => write!(f, "big"),
            ByteOrder::Little => write!(f, "little"),
            ByteOrder::ByteSwapped => write!(f, "byteswapped"),
        }
    }
}

/// A contiguous byte range of the ROM that holds executable code.
///
/// The interval is half-open, both bounds are word-aligned, and `has_rsp`
/// marks regions whose tail was recognized as RSP microcode rather than
/// CPU code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RomRegion {
    rom_start: usize,
    rom_end: usize,
    has_rsp: bool,
}

impl RomRegion {
    /// Create a region spanning `[rom_start, rom_end)` with no RSP flag.
    pub fn new(rom_start: usize, rom_end: usize) -> Self {
        Self {
            rom_start,
            rom_end,
            has_rsp: false,
        }
    }

    /// First byte of the region.
    pub fn rom_start(&self) -> usize {
        self.rom_start
    }

    /// One past the last byte of the region.
    pub fn rom_end(&self) -> usize {
        self.rom_end
    }

    /// Whether the region contains RSP microcode.
    pub fn has_rsp(&self) -> bool {
        self.has_rsp
    }

    /// Move the start of the region.
    pub fn set_rom_start(&mut self, rom_start: usize) {
        self.rom_start = rom_start;
    }

    /// Move the end of the region.
    pub fn set_rom_end(&mut self, rom_end: usize) {
        self.rom_end = rom_end;
    }

    /// Flag the region as containing RSP microcode.
    pub fn set_has_rsp(&mut self, has_rsp: bool) {
        self.has_rsp = has_rsp;
    }

    /// Length of the region in bytes.
    pub fn len(&self) -> usize {
        self.rom_end - self.rom_start
    }

    /// Whether the region trimmed away to nothing.
    pub fn is_empty(&self) -> bool {
        self.rom_end <= self.rom_start
    }

    /// Number of instructions in the region.
    pub fn instruction_count(&self) -> usize {
        self.len() / INSTRUCTION_SIZE
    }

    /// Start rounded down to a 16-byte boundary, for display.
    pub fn aligned_start(&self) -> usize {
        nearest_multiple_down(self.rom_start, 16)
    }

    /// End rounded up to a 16-byte boundary, for display.
    pub fn aligned_end(&self) -> usize {
        nearest_multiple_up(self.rom_end, 16)
    }
}

/// Tunables for a scan.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Treat `$v0`/`$fv0` as initialized at function entry. Matches gcc's
    /// habit of leaking the return register into uninitialized locals;
    /// turning this off rejects more aggressively.
    pub weak_register_check: bool,
    /// Drop regions shorter than [`MIN_REGION_INSTRUCTIONS`].
    pub drop_short_regions: bool,
    /// Threshold used when `drop_short_regions` is set.
    pub min_region_instructions: usize,
}

impl ScanOptions {
    /// Default scan settings.
    pub fn new() -> Self {
        Self {
            weak_register_check: true,
            drop_short_regions: false,
            min_region_instructions: MIN_REGION_INSTRUCTIONS,
        }
    }

    /// Settings that reject aggressively: strict register tracking and
    /// short-region dropping both on.
    pub fn strict() -> Self {
        Self {
            weak_register_check: false,
            drop_short_regions: true,
            min_region_instructions: MIN_REGION_INSTRUCTIONS,
        }
    }
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self::new()
    }
}

/// Complete result of scanning one ROM.
///
/// This is the structured payload handed to formatters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanReport {
    /// Size of the (padded) image in bytes.
    pub rom_size: usize,
    /// Byte order the file had on disk.
    pub byte_order: ByteOrder,
    /// Discovered code regions, sorted by start offset.
    pub regions: Vec<RomRegion>,
}

impl ScanReport {
    /// Create a report over the given regions.
    pub fn new(rom_size: usize, byte_order: ByteOrder, regions: Vec<RomRegion>) -> Self {
        Self {
            rom_size,
            byte_order,
            regions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rounding_helpers() {
        assert_eq!(nearest_multiple_up(0x1001, 16), 0x1010);
        assert_eq!(nearest_multiple_up(0x1010, 16), 0x1010);
        assert_eq!(nearest_multiple_down(0x100F, 16), 0x1000);
        assert_eq!(nearest_multiple_down(0x1010, 16), 0x1010);
    }

    #[test]
    fn test_region_accessors() {
        let mut region = RomRegion::new(0x1004, 0x102C);
        assert_eq!(region.len(), 0x28);
        assert_eq!(region.instruction_count(), 10);
        assert_eq!(region.aligned_start(), 0x1000);
        assert_eq!(region.aligned_end(), 0x1030);
        assert!(!region.has_rsp());

        region.set_has_rsp(true);
        region.set_rom_end(0x1004);
        assert!(region.has_rsp());
        assert!(region.is_empty());
    }

    #[test]
    fn test_option_presets() {
        let default = ScanOptions::new();
        let strict = ScanOptions::strict();
        assert!(default.weak_register_check);
        assert!(!default.drop_short_regions);
        assert!(!strict.weak_register_check);
        assert!(strict.drop_short_regions);
    }
}
