//! Output formatters for scan reports.
//!
//! Trait-based formatters render a [`ScanReport`] as human-readable text,
//! JSON, or a compact tab-separated listing.

use crate::types::{RomRegion, ScanReport};
use std::fmt::Write as _;
use std::path::Path;

/// Trait for rendering scan reports.
pub trait ReportFormatter {
    /// Format the report header.
    fn format_header(&self, report: &ScanReport, path: &Path) -> String;

    /// Format a single region line.
    fn format_region(&self, region: &RomRegion) -> Option<String>;

    /// Format the complete report.
    ///
    /// Default implementation concatenates the header and region lines.
    fn format_report(&self, report: &ScanReport, path: &Path) -> String {
        let mut out = self.format_header(report, path);
        for region in &report.regions {
            if let Some(line) = self.format_region(region) {
                out.push_str(&line);
            }
        }
        out
    }
}

/// Human-readable output.
///
/// Region bounds are widened to 16-byte alignment, matching how linkers
/// place segments; `true_ranges` prints the raw word-aligned offsets
/// instead, for diagnosing the scanner itself.
#[derive(Debug, Clone, Default)]
pub struct HumanFormatter {
    /// Print raw region bounds instead of 16-byte-aligned ones.
    pub true_ranges: bool,
    /// Prefix the report with the ROM path and size.
    pub verbose: bool,
}

impl HumanFormatter {
    /// Create a formatter with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a formatter that prints raw region bounds.
    pub fn true_ranges() -> Self {
        Self {
            true_ranges: true,
            verbose: false,
        }
    }
}

impl ReportFormatter for HumanFormatter {
    fn format_header(&self, report: &ScanReport, path: &Path) -> String {
        let mut out = String::new();
        if self.verbose {
            let _ = writeln!(out, "File: {}", path.display());
            let _ = writeln!(out, "  Size:       0x{:08X}", report.rom_size);
            let _ = writeln!(out, "  Byte order: {}", report.byte_order);
        }
        let _ = writeln!(out, "Found {} code regions:", report.regions.len());
        out
    }

    fn format_region(&self, region: &RomRegion) -> Option<String> {
        let (start, end) = if self.true_ranges {
            (region.rom_start(), region.rom_end())
        } else {
            (region.aligned_start(), region.aligned_end())
        };
        Some(format!(
            "  0x{:08X} to 0x{:08X} (0x{:06X}) rsp: {}\n",
            start,
            end,
            end - start,
            region.has_rsp()
        ))
    }
}

/// JSON output via serde.
#[derive(Debug, Clone)]
pub struct JsonFormatter {
    /// Pretty-print the JSON.
    pub pretty: bool,
}

impl Default for JsonFormatter {
    fn default() -> Self {
        Self { pretty: true }
    }
}

impl JsonFormatter {
    /// Create a pretty-printing JSON formatter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a compact JSON formatter.
    pub fn compact() -> Self {
        Self { pretty: false }
    }
}

impl ReportFormatter for JsonFormatter {
    fn format_header(&self, _report: &ScanReport, _path: &Path) -> String {
        String::new() // Handled in format_report
    }

    fn format_region(&self, _region: &RomRegion) -> Option<String> {
        None // Handled in format_report
    }

    fn format_report(&self, report: &ScanReport, path: &Path) -> String {
        #[derive(serde::Serialize)]
        struct JsonOutput<'a> {
            file: String,
            #[serde(flatten)]
            report: &'a ScanReport,
        }

        let output = JsonOutput {
            file: path.display().to_string(),
            report,
        };

        let mut rendered = if self.pretty {
            serde_json::to_string_pretty(&output).unwrap_or_else(|_| "{}".to_string())
        } else {
            serde_json::to_string(&output).unwrap_or_else(|_| "{}".to_string())
        };
        rendered.push('\n');
        rendered
    }
}

/// Compact tab-separated output, one region per line.
#[derive(Debug, Clone, Default)]
pub struct ShortFormatter;

impl ShortFormatter {
    /// Create a new short formatter.
    pub fn new() -> Self {
        Self
    }
}

impl ReportFormatter for ShortFormatter {
    fn format_header(&self, _report: &ScanReport, _path: &Path) -> String {
        String::new()
    }

    fn format_region(&self, region: &RomRegion) -> Option<String> {
        Some(format!(
            "0x{:08X}\t0x{:08X}\t0x{:06X}\t{}\n",
            region.rom_start(),
            region.rom_end(),
            region.len(),
            if region.has_rsp() { "rsp" } else { "cpu" }
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ByteOrder;
    use std::path::PathBuf;

    fn sample_report() -> ScanReport {
        let mut rsp_region = RomRegion::new(0x2000, 0x2444);
        rsp_region.set_has_rsp(true);
        ScanReport::new(
            0x10_0000,
            ByteOrder::Big,
            vec![RomRegion::new(0x1004, 0x101C), rsp_region],
        )
    }

    #[test]
    fn test_human_formatter_aligns_bounds() {
        let output =
            HumanFormatter::new().format_report(&sample_report(), &PathBuf::from("game.z64"));

        assert!(output.starts_with("Found 2 code regions:\n"));
        assert!(output.contains("  0x00001000 to 0x00001020 (0x000020) rsp: false\n"));
        assert!(output.contains("  0x00002000 to 0x00002450 (0x000450) rsp: true\n"));
    }

    #[test]
    fn test_human_formatter_true_ranges() {
        let output = HumanFormatter::true_ranges()
            .format_report(&sample_report(), &PathBuf::from("game.z64"));

        assert!(output.contains("  0x00001004 to 0x0000101C (0x000018) rsp: false\n"));
    }

    #[test]
    fn test_json_formatter() {
        let output =
            JsonFormatter::new().format_report(&sample_report(), &PathBuf::from("game.z64"));

        assert!(output.contains("\"file\": \"game.z64\""));
        assert!(output.contains("\"byte_order\": \"big\""));
        assert!(output.contains("\"rom_start\": 4100"));
    }

    #[test]
    fn test_short_formatter() {
        let output =
            ShortFormatter::new().format_report(&sample_report(), &PathBuf::from("game.z64"));

        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "0x00001004\t0x0000101C\t0x000018\tcpu");
        assert_eq!(lines[1], "0x00002000\t0x00002444\t0x000444\trsp");
    }
}
