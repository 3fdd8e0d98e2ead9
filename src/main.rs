//! n64-codescan CLI
//!
//! Command-line front end for finding executable code regions in N64 ROM
//! images.

use clap::{Parser, ValueEnum};
use n64_codescan::{
    analyze_rom, HumanFormatter, JsonFormatter, ReportFormatter, RomImage, ScanOptions,
    ScanReport, ShortFormatter,
};
use std::path::PathBuf;
use std::process::ExitCode;

/// Find executable MIPS code regions in an N64 ROM image.
///
/// Accepts big-endian (.z64) and little-endian dumps; byteswapped (.v64)
/// dumps are not supported.
#[derive(Parser, Debug)]
#[command(name = "n64-codescan")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// ROM file to analyze
    rom: PathBuf,

    /// Output format
    #[arg(short, long, default_value = "human")]
    format: OutputFormat,

    /// Print raw region bounds instead of 16-byte-aligned ones
    #[arg(short, long)]
    true_ranges: bool,

    /// Drop regions shorter than the minimum instruction count
    #[arg(long)]
    drop_short: bool,

    /// Disable the weak register check ($v0/$fv0 no longer count as
    /// initialized at function entry)
    #[arg(long)]
    strict_registers: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

/// Output format options.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Human-readable region listing
    Human,
    /// JSON output
    Json,
    /// Compact tab-separated output
    Short,
}

fn main() -> ExitCode {
    let args = Args::parse();

    if args.verbose {
        tracing_subscriber::fmt()
            .with_env_filter("n64_codescan=debug")
            .init();
    }

    let rom = match RomImage::load(&args.rom) {
        Ok(rom) => rom,
        Err(e) => {
            eprintln!("Error reading {}: {}", args.rom.display(), e);
            return ExitCode::FAILURE;
        }
    };

    let report = analyze_rom(&rom, &build_options(&args));
    print!("{}", format_output(&report, &args));

    ExitCode::SUCCESS
}

/// Build scan options from CLI args.
fn build_options(args: &Args) -> ScanOptions {
    let mut options = ScanOptions::new();
    options.weak_register_check = !args.strict_registers;
    options.drop_short_regions = args.drop_short;
    options
}

/// Format the report using the selected formatter.
fn format_output(report: &ScanReport, args: &Args) -> String {
    match args.format {
        OutputFormat::Human => {
            let formatter = HumanFormatter {
                true_ranges: args.true_ranges,
                verbose: args.verbose,
            };
            formatter.format_report(report, &args.rom)
        }
        OutputFormat::Json => JsonFormatter::new().format_report(report, &args.rom),
        OutputFormat::Short => ShortFormatter::new().format_report(report, &args.rom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_parsing() {
        let args = Args::try_parse_from(["n64-codescan", "game.z64"]).unwrap();
        assert_eq!(args.rom, PathBuf::from("game.z64"));
        assert!(!args.true_ranges);
    }

    #[test]
    fn test_rom_argument_is_required() {
        assert!(Args::try_parse_from(["n64-codescan"]).is_err());
    }

    #[test]
    fn test_format_options() {
        let args = Args::try_parse_from(["n64-codescan", "-f", "json", "game.z64"]).unwrap();
        assert!(matches!(args.format, OutputFormat::Json));
    }

    #[test]
    fn test_option_flags_map_to_scan_options() {
        let args = Args::try_parse_from([
            "n64-codescan",
            "--strict-registers",
            "--drop-short",
            "game.z64",
        ])
        .unwrap();
        let options = build_options(&args);
        assert!(!options.weak_register_check);
        assert!(options.drop_short_regions);
    }
}
