#![forbid(unsafe_code)]
//! # jp_tense_style CLI
//!
//! Command-line interface for the `jp_tense_style` crate. Analyzes `.txt` and
//! `.pdf` Japanese documents: tense ratio, sentence endings, top words per
//! tense and keyword/tense association.
//!
//! ## Example
//! ```bash
//! cargo run --release -- path/to/report.pdf --keywords 学校,会社 --export-format csv --bom
//! ```
//!
//! See `--help` for all available options.

use clap::{Parser, ValueEnum};
use log::error;
use std::path::{Path, PathBuf};
use std::process;
use jp_tense_style::{
    AnalysisOptions, EndingPolicy, ExportFormat, FallbackRule, LinderaTokenizer, analyze_path,
    print_failed_files,
};

#[derive(Clone, Copy, ValueEnum)]
enum Endings {
    /// Polite and plain copula/verb endings
    Canonical,
    /// Canonical plus する/した/なる, matched within the last 10 characters
    Extended,
}

#[derive(Clone, Copy, ValueEnum)]
enum Fallback {
    /// Fisher's exact test when any expected count is below --min-expected
    ExpectedCount,
    /// Fisher's exact test only when chi-square is undefined
    OnDegenerate,
}

#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    /// File or directory to analyze
    path: String,

    /// Keywords to test for association with tense (comma separated)
    #[arg(long, value_delimiter = ',')]
    keywords: Vec<String>,

    /// Sentence-ending pattern set
    #[arg(long, value_enum, default_value = "canonical")]
    endings: Endings,

    /// Number of words listed per tense
    #[arg(long, default_value_t = 20)]
    top: usize,

    /// Rule for switching from chi-square to Fisher's exact test
    #[arg(long, value_enum, default_value = "expected-count")]
    fallback: Fallback,

    /// Expected-count threshold for --fallback expected-count
    #[arg(long, default_value_t = 5.0)]
    min_expected: f64,

    /// Output format for export (txt, csv, tsv, json)
    #[arg(long, default_value = "csv")]
    export_format: ExportFormat,

    /// Prefix CSV/TSV exports with a UTF-8 byte-order mark (for spreadsheet tools)
    #[arg(long, default_value_t = false)]
    bom: bool,

    /// If set, analyze all files together and output combined results
    #[arg(long, default_value_t = false)]
    combine: bool,

    /// Skip (or, with --combine, abort on) documents not detected as Japanese
    #[arg(long, default_value_t = false)]
    require_japanese: bool,

    /// Directory for exported tables (default: current directory)
    #[arg(long)]
    out_dir: Option<PathBuf>,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let keywords: Vec<String> = cli
        .keywords
        .iter()
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty())
        .collect();

    let opts = AnalysisOptions {
        ending_policy: match cli.endings {
            Endings::Canonical => EndingPolicy::canonical(),
            Endings::Extended => EndingPolicy::extended(),
        },
        keywords,
        top_n: cli.top,
        fallback: match cli.fallback {
            Fallback::ExpectedCount => FallbackRule::ExpectedCount {
                min_expected: cli.min_expected,
            },
            Fallback::OnDegenerate => FallbackRule::OnDegenerate,
        },
        export_format: cli.export_format,
        bom: cli.bom,
        combine: cli.combine,
        require_japanese: cli.require_japanese,
        out_dir: cli.out_dir,
    };

    let tokenizer = match LinderaTokenizer::new() {
        Ok(t) => t,
        Err(e) => {
            error!("Error: {}", e);
            process::exit(1);
        }
    };

    match analyze_path(Path::new(&cli.path), &tokenizer, &opts) {
        Ok(report) => {
            println!("{}", report.summary);
            if !report.failed_files.is_empty() {
                print_failed_files(&report.failed_files);
                process::exit(1);
            }
        }
        Err(e) => {
            error!("Error: {}", e);
            process::exit(1);
        }
    }
}
