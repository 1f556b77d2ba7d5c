//! # jp_tense_style
//!
//! Register analysis for Japanese documents: how much of a text is written in
//! the past tense, which sentence-final forms it uses, which content words
//! dominate each tense, and whether chosen keywords lean towards one tense.
//!
//! The pipeline for one text is
//! [`segment`] → [`classify_all`] → {[`extract_endings`], [`word_frequencies`],
//! [`associate_keywords`]}, composed by [`analyze_text_with`]. [`analyze_path`]
//! adds file loading (`.txt`, `.pdf`) and export.
//!
//! The tokenizer is passed in explicitly; any [`MorphologicalTokenizer`] works,
//! [`LinderaTokenizer`] is the bundled one.
//!
//! ## Example
//! ```
//! use jp_tense_style::{AnalysisOptions, Morpheme, MorphologicalTokenizer, TokenizeError,
//!     analyze_text_with};
//!
//! struct NoWords;
//! impl MorphologicalTokenizer for NoWords {
//!     fn tokenize(&self, _: &str) -> Result<Vec<Morpheme>, TokenizeError> {
//!         Ok(Vec::new())
//!     }
//! }
//!
//! let mut opts = AnalysisOptions::default();
//! opts.keywords = vec!["学校".to_string()];
//! let a = analyze_text_with(
//!     "彼は昨日学校に行きました。明日は晴れるでしょう。私は毎日勉強します。",
//!     &NoWords,
//!     &opts,
//! );
//! assert_eq!(a.sentences.len(), 3);
//! assert_eq!(a.past_count(), 1);
//! assert_eq!(a.ending_frequencies.get("ました"), Some(1));
//! ```

pub mod association;
pub mod ending;
pub mod error;
pub mod export;
pub mod frequency;
pub mod lexical;
pub mod segment;
pub mod stats;
pub mod tense;
pub mod tokenizer;

use std::collections::{HashMap, HashSet};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use rayon::prelude::*;
use walkdir::WalkDir;
use whatlang::Lang;

pub use association::{
    AssociationReport, AssociationResult, FallbackRule, KeywordFailure, TestKind, associate,
    associate_keywords, contingency_table,
};
pub use ending::{EndingPolicy, EndingRecord, ending_frequencies, extract_endings};
pub use error::AnalysisError;
pub use export::{ExportFormat, csv_safe_cell, export_analysis};
pub use frequency::{FrequencyEntry, FrequencyTable};
pub use lexical::{DEFAULT_TOP_N, TenseWordFrequencies, word_frequencies};
pub use segment::segment;
pub use stats::{ChiSquare, ContingencyTable, StatsError, chi_square_2x2, fisher_exact_2x2};
pub use tense::{Sentence, Tense, classify, classify_all, past_marker};
pub use tokenizer::{LinderaTokenizer, Morpheme, MorphologicalTokenizer, TokenizeError};

/// Settings for one analysis run.
#[derive(Debug, Clone)]
pub struct AnalysisOptions {
    pub ending_policy: EndingPolicy,
    /// Keywords for the association test; none means no association table.
    pub keywords: Vec<String>,
    /// Words kept per tense.
    pub top_n: usize,
    pub fallback: FallbackRule,
    pub export_format: ExportFormat,
    /// Prefix CSV/TSV exports with a UTF-8 byte-order mark.
    pub bom: bool,
    /// Analyze all input files as one document.
    pub combine: bool,
    /// Reject input whose detected language is not Japanese.
    pub require_japanese: bool,
    /// Where exports go; the current directory when unset.
    pub out_dir: Option<PathBuf>,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        AnalysisOptions {
            ending_policy: EndingPolicy::canonical(),
            keywords: Vec::new(),
            top_n: DEFAULT_TOP_N,
            fallback: FallbackRule::default(),
            export_format: ExportFormat::Csv,
            bom: false,
            combine: false,
            require_japanese: false,
            out_dir: None,
        }
    }
}

/// Everything derived from one text.
#[derive(Debug, Clone, Default)]
pub struct Analysis {
    pub sentences: Vec<Sentence>,
    pub endings: Vec<EndingRecord>,
    pub ending_frequencies: FrequencyTable,
    pub words: TenseWordFrequencies,
    /// `None` when no keywords were given.
    pub association: Option<AssociationReport>,
}

impl Analysis {
    pub fn past_count(&self) -> usize {
        self.count(Tense::Past)
    }

    pub fn present_future_count(&self) -> usize {
        self.count(Tense::PresentFuture)
    }

    fn count(&self, tense: Tense) -> usize {
        self.sentences.iter().filter(|s| s.tense() == tense).count()
    }

    /// No sentences were found; every table is empty.
    pub fn is_empty(&self) -> bool {
        self.sentences.is_empty()
    }
}

/// Run the whole pipeline on one text.
pub fn analyze_text_with<T: MorphologicalTokenizer + ?Sized>(
    text: &str,
    tokenizer: &T,
    opts: &AnalysisOptions,
) -> Analysis {
    analyze_segments(segment(text), tokenizer, opts)
}

fn analyze_segments<T: MorphologicalTokenizer + ?Sized>(
    segments: Vec<String>,
    tokenizer: &T,
    opts: &AnalysisOptions,
) -> Analysis {
    let sentences = classify_all(segments);
    debug!("{} sentences", sentences.len());
    let endings = extract_endings(&sentences, &opts.ending_policy);
    let ending_frequencies = ending_frequencies(&endings);
    let words = word_frequencies(&sentences, tokenizer, opts.top_n);
    let association = if opts.keywords.is_empty() {
        None
    } else {
        match associate_keywords(opts.keywords.as_slice(), &sentences, opts.fallback) {
            Ok(report) => Some(report),
            Err(e) => {
                warn!("association skipped: {e}");
                None
            }
        }
    };
    Analysis {
        sentences,
        endings,
        ending_frequencies,
        words,
        association,
    }
}

/// Human-readable overview of an analysis, as printed by the CLI.
pub fn summarize(name: &str, analysis: &Analysis, top_n: usize) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "=== {name} ===");
    if analysis.is_empty() {
        let _ = writeln!(out, "No sentences found (no data).");
        return out;
    }
    let total = analysis.sentences.len();
    let share = |n: usize| n as f64 / total as f64 * 100.0;
    let _ = writeln!(
        out,
        "Sentences: {total} ({} {} = {:.2}%, {} {} = {:.2}%)",
        Tense::Past,
        analysis.past_count(),
        share(analysis.past_count()),
        Tense::PresentFuture,
        analysis.present_future_count(),
        share(analysis.present_future_count()),
    );

    let _ = writeln!(out, "\nSentence endings:");
    for e in &analysis.ending_frequencies {
        let _ = writeln!(out, "  {}\t{}", e.item, e.count);
    }

    for tense in [Tense::Past, Tense::PresentFuture] {
        let _ = writeln!(out, "\nTop {top_n} words ({tense}):");
        for e in analysis.words.for_tense(tense) {
            let _ = writeln!(out, "  {}\t{}", e.item, e.count);
        }
    }

    if let Some(report) = &analysis.association {
        let _ = writeln!(out, "\nKeyword association (by p-value):");
        for r in &report.results {
            let _ = writeln!(
                out,
                "  {}\tpast {} ({:.2}%)\tpresent/future {} ({:.2}%)\tp={:.4} [{}]",
                r.keyword,
                r.past_count,
                r.past_percent,
                r.present_future_count,
                r.present_future_percent,
                r.p_value,
                export::test_name(r.test),
            );
        }
        for f in &report.failed {
            let _ = writeln!(out, "  {}\tnot tested: {}", f.keyword, f.reason);
        }
    }
    out
}

/// Result of [`analyze_path`].
#[derive(Debug, Default)]
pub struct AnalysisReport {
    pub summary: String,
    /// One entry per analyzed document (or one `combined` entry).
    pub analyses: Vec<(String, Analysis)>,
    pub outputs: Vec<PathBuf>,
    /// Files that were skipped, with the reason.
    pub failed_files: Vec<(String, String)>,
}

/// Supported input files: `path` itself, or every `.txt`/`.pdf` below it,
/// sorted.
pub fn collect_files(path: &Path) -> Vec<PathBuf> {
    if path.is_file() {
        return vec![path.to_path_buf()];
    }
    let mut files: Vec<PathBuf> = WalkDir::new(path)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| is_supported(p))
        .collect();
    files.sort();
    files
}

fn is_supported(p: &Path) -> bool {
    matches!(
        p.extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref(),
        Some("txt" | "pdf")
    )
}

/// Read a document as text: UTF-8 for `.txt`, extracted text for `.pdf`.
pub fn read_text(path: &Path) -> Result<String, AnalysisError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("txt") => std::fs::read_to_string(path).map_err(|e| AnalysisError::io(path, e)),
        Some("pdf") => pdf_extract::extract_text(path).map_err(|e| AnalysisError::Pdf {
            path: path.to_path_buf(),
            message: e.to_string(),
        }),
        _ => Err(AnalysisError::UnsupportedFile(path.to_path_buf())),
    }
}

/// Check that `text` reads as Japanese.
pub fn check_japanese(text: &str) -> Result<(), String> {
    match whatlang::detect(text) {
        Some(info) if info.lang() == Lang::Jpn => Ok(()),
        Some(info) => Err(format!(
            "detected {} instead of Japanese",
            info.lang().eng_name()
        )),
        None => Err("language could not be detected".to_string()),
    }
}

fn display_name(p: &Path) -> String {
    p.display().to_string()
}

fn file_stem(p: &Path) -> String {
    p.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string())
}

/// Export stems for `files`, distinct within one run.
///
/// A file keeps its bare stem unless another input shares it; then the path
/// below `root` is used (`a/report.txt` becomes `a_report`). A numeric suffix
/// settles whatever still collides.
fn export_stems(root: &Path, files: &[PathBuf]) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    for f in files {
        *seen.entry(file_stem(f)).or_default() += 1;
    }
    let mut taken: HashSet<String> = HashSet::new();
    files
        .iter()
        .map(|f| {
            let stem = file_stem(f);
            let base = if seen.get(&stem).copied().unwrap_or(0) > 1 {
                relative_stem(root, f).unwrap_or(stem)
            } else {
                stem
            };
            let mut name = base.clone();
            let mut n = 2;
            while !taken.insert(name.clone()) {
                name = format!("{base}_{n}");
                n += 1;
            }
            name
        })
        .collect()
}

fn relative_stem(root: &Path, file: &Path) -> Option<String> {
    let rel = file.strip_prefix(root).ok()?;
    let mut parts: Vec<String> = rel
        .parent()
        .map(|p| {
            p.components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect()
        })
        .unwrap_or_default();
    parts.push(file_stem(file));
    Some(parts.join("_"))
}

/// Analyze a file or directory and export the tables.
///
/// Files are read in parallel. In per-file mode an unreadable or rejected
/// file is recorded in [`AnalysisReport::failed_files`] and skipped. In
/// combined mode all documents form one analysis named `combined`, and a
/// language rejection aborts the run. Documents sharing a file stem are
/// exported under their path below `path` (see [`AnalysisReport::analyses`]).
pub fn analyze_path<T: MorphologicalTokenizer + ?Sized>(
    path: &Path,
    tokenizer: &T,
    opts: &AnalysisOptions,
) -> Result<AnalysisReport, AnalysisError> {
    let files = collect_files(path);
    if files.is_empty() {
        return Err(AnalysisError::NoInput(path.to_path_buf()));
    }
    let out_dir = opts.out_dir.clone().unwrap_or_else(|| PathBuf::from("."));

    let loaded: Vec<(PathBuf, Result<String, AnalysisError>)> = files
        .par_iter()
        .map(|f| (f.clone(), read_text(f)))
        .collect();

    let mut report = AnalysisReport::default();
    let mut documents: Vec<(PathBuf, String)> = Vec::new();
    for (file, text) in loaded {
        let text = match text {
            Ok(t) => t,
            Err(e) => {
                warn!("skipping {}: {}", file.display(), e);
                report.failed_files.push((display_name(&file), e.to_string()));
                continue;
            }
        };
        if let Err(reason) = check_japanese(&text) {
            if !opts.require_japanese {
                warn!("{}: {}", file.display(), reason);
            } else if opts.combine {
                return Err(AnalysisError::CombinedAborted(format!(
                    "{}: {}",
                    file.display(),
                    reason
                )));
            } else {
                warn!("skipping {}: {}", file.display(), reason);
                report.failed_files.push((display_name(&file), reason));
                continue;
            }
        }
        documents.push((file, text));
    }

    if opts.combine {
        let segments: Vec<String> = documents.iter().flat_map(|(_, t)| segment(t)).collect();
        info!("combined run over {} documents", documents.len());
        let analysis = analyze_segments(segments, tokenizer, opts);
        finish(&mut report, "combined", analysis, &out_dir, opts)?;
    } else {
        let paths: Vec<PathBuf> = documents.iter().map(|(f, _)| f.clone()).collect();
        let stems = export_stems(path, &paths);
        for ((file, text), stem) in documents.into_iter().zip(stems) {
            info!("analyzing {}", file.display());
            let analysis = analyze_text_with(&text, tokenizer, opts);
            finish(&mut report, &stem, analysis, &out_dir, opts)?;
        }
    }
    Ok(report)
}

fn finish(
    report: &mut AnalysisReport,
    name: &str,
    analysis: Analysis,
    out_dir: &Path,
    opts: &AnalysisOptions,
) -> Result<(), AnalysisError> {
    let written = export_analysis(&analysis, name, out_dir, opts.export_format, opts.bom)?;
    report.summary.push_str(&summarize(name, &analysis, opts.top_n));
    report.summary.push('\n');
    report.outputs.extend(written);
    report.analyses.push((name.to_string(), analysis));
    Ok(())
}

/// Print skipped files to stderr.
pub fn print_failed_files(failed: &[(String, String)]) {
    eprintln!("\nThe following files could not be analyzed:");
    for (file, reason) in failed {
        eprintln!("  {file}: {reason}");
    }
}
