//! Error types for the region scanner.
//!
//! The scan itself is total: once an image is loaded it always produces a
//! region list. Every error here belongs to the host boundary, reading
//! the file and recognizing its byte order.

use thiserror::Error;

/// Primary error type for the scanner.
#[derive(Debug, Error)]
pub enum ScanError {
    /// IO error reading the ROM file.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The file is too small to hold anything past the header.
    #[error("ROM too small: expected at least {expected} bytes, got {actual}")]
    RomTooSmall { expected: usize, actual: usize },

    /// `.v64` dumps swap within 16-bit halves and aren't supported.
    #[error("v64 (byteswapped) roms not supported")]
    ByteSwappedRom,

    /// The first word matches no known N64 byte order.
    #[error("file is not an N64 game: first word 0x{magic:08X}")]
    NotAnN64Rom { magic: u32 },
}

/// Result type alias for scanner operations.
pub type Result<T> = std::result::Result<T, ScanError>;
