//! N64 ROM code-region discovery.
//!
//! This library takes the raw bytes of an N64 cartridge image and finds
//! the contiguous byte ranges that contain executable MIPS code, for
//! either the VR4300 CPU or the RSP. It is a static structural recovery
//! tool: no symbols, no relocations, no disassembly output. Each region
//! is a byte range plus a microcode flag.
//!
//! # How it works
//!
//! Returns (`jr $ra`) seed the search. Each seed grows bidirectionally
//! through words that classify as plausible CPU code, gets trimmed back
//! to a well-terminated range (prologue junk and trailing loose
//! instructions removed), and is merged with its neighbor when the bytes
//! between them decode cleanly as CPU code or RSP microcode. Microcode
//! found that way extends forward until the vector instructions run out.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use n64_codescan::analyze_file;
//!
//! fn main() -> Result<(), n64_codescan::ScanError> {
//!     let report = analyze_file("path/to/game.z64")?;
//!     for region in &report.regions {
//!         println!(
//!             "0x{:08X}..0x{:08X} rsp: {}",
//!             region.rom_start(),
//!             region.rom_end(),
//!             region.has_rsp()
//!         );
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Supported images
//!
//! Big-endian (`.z64`) and little-endian dumps load directly; big-endian
//! images are word-swapped on the way in. 16-bit-swapped (`.v64`) dumps
//! are rejected at load time.

#![warn(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::similar_names)]
#![allow(clippy::too_many_lines)]

pub mod analysis;
pub mod error;
pub mod formatter;
pub mod isa;
pub mod regions;
pub mod rom;
pub mod types;
pub mod validity;

pub use error::{Result, ScanError};
pub use formatter::{HumanFormatter, JsonFormatter, ReportFormatter, ShortFormatter};
pub use regions::find_code_regions;
pub use rom::RomImage;
pub use types::{ByteOrder, RomRegion, ScanOptions, ScanReport};

use std::path::Path;

/// Scan a ROM file with default options.
///
/// Reads the file, normalizes its byte order, and runs the region scan.
///
/// # Errors
///
/// Fails if the file cannot be read, is too small to hold code, or has a
/// byte order the scanner does not support. The scan itself cannot fail.
pub fn analyze_file<P: AsRef<Path>>(path: P) -> Result<ScanReport> {
    let rom = RomImage::load(path)?;
    Ok(analyze_rom(&rom, &ScanOptions::new()))
}

/// Scan a loaded ROM image.
///
/// This is the library entry point for hosts that already hold an image
/// in memory; it is total and never fails.
pub fn analyze_rom(rom: &RomImage, options: &ScanOptions) -> ScanReport {
    let regions = find_code_regions(rom, options);
    ScanReport::new(rom.len(), rom.byte_order(), regions)
}

/// Get version information for this library.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!version().is_empty());
    }

    #[test]
    fn test_analyze_rom_reports_image_shape() {
        let rom = RomImage::from_le_bytes(vec![0u8; 0x2000]);
        let report = analyze_rom(&rom, &ScanOptions::new());
        assert_eq!(report.rom_size, 0x2000);
        assert_eq!(report.byte_order, ByteOrder::Little);
        assert!(report.regions.is_empty());
    }
}
