//! Writing analysis tables to disk.
//!
//! One file per table: `<stem>_<YYYYMMDD_HHMMSS>_<table>.<ext>`.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::prelude::*;
use clap::ValueEnum;
use csv::WriterBuilder;
use log::info;
use serde::Serialize;

use crate::Analysis;
use crate::association::TestKind;
use crate::error::AnalysisError;
use crate::frequency::FrequencyTable;

/// UTF-8 byte-order mark; spreadsheet tools need it to read Japanese CSV.
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    Txt,
    Csv,
    Tsv,
    Json,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Txt => "txt",
            ExportFormat::Csv => "csv",
            ExportFormat::Tsv => "tsv",
            ExportFormat::Json => "json",
        }
    }
}

/// Neutralize cells a spreadsheet would read as a formula.
///
/// Cells starting with `=`, `+`, `-` or `@` get a leading `'`. Cells that
/// already start with `'` are left alone.
pub fn csv_safe_cell(cell: String) -> String {
    match cell.chars().next() {
        Some('=' | '+' | '-' | '@') => format!("'{cell}"),
        _ => cell,
    }
}

struct Table<'a, J: Serialize> {
    name: &'static str,
    header: &'static [&'static str],
    rows: Vec<Vec<String>>,
    json: &'a J,
}

fn frequency_rows(table: &FrequencyTable) -> Vec<Vec<String>> {
    table
        .iter()
        .map(|e| vec![e.item.clone(), e.count.to_string()])
        .collect()
}

/// Write every table of `analysis` into `dir`, returning the created paths.
///
/// The association table is only written when keywords were tested.
pub fn export_analysis(
    analysis: &Analysis,
    stem: &str,
    dir: &Path,
    format: ExportFormat,
    bom: bool,
) -> Result<Vec<PathBuf>, AnalysisError> {
    fs::create_dir_all(dir).map_err(|e| AnalysisError::io(dir, e))?;
    let local: DateTime<Local> = Local::now();
    let stamp = local.format("%Y%m%d_%H%M%S").to_string();
    let ext = format.extension();
    let path_for = |table: &str| dir.join(format!("{stem}_{stamp}_{table}.{ext}"));

    let mut written = Vec::new();

    let sentences = Table {
        name: "sentences",
        header: &["sentence", "tense"],
        rows: analysis
            .sentences
            .iter()
            .map(|s| vec![s.text().to_string(), s.tense().label().to_string()])
            .collect(),
        json: &analysis.sentences,
    };
    written.push(write_table(&path_for(sentences.name), format, bom, &sentences)?);

    let endings = Table {
        name: "endings",
        header: &["ending", "count"],
        rows: frequency_rows(&analysis.ending_frequencies),
        json: &analysis.ending_frequencies,
    };
    written.push(write_table(&path_for(endings.name), format, bom, &endings)?);

    let past = Table {
        name: "words_past",
        header: &["word", "count"],
        rows: frequency_rows(&analysis.words.past),
        json: &analysis.words.past,
    };
    written.push(write_table(&path_for(past.name), format, bom, &past)?);

    let present = Table {
        name: "words_present",
        header: &["word", "count"],
        rows: frequency_rows(&analysis.words.present_future),
        json: &analysis.words.present_future,
    };
    written.push(write_table(&path_for(present.name), format, bom, &present)?);

    if let Some(report) = &analysis.association {
        let association = Table {
            name: "association",
            header: &[
                "keyword",
                "past_count",
                "present_future_count",
                "past_percent",
                "present_future_percent",
                "test",
                "p_value",
            ],
            rows: report
                .results
                .iter()
                .map(|r| {
                    vec![
                        r.keyword.clone(),
                        r.past_count.to_string(),
                        r.present_future_count.to_string(),
                        format!("{:.2}", r.past_percent),
                        format!("{:.2}", r.present_future_percent),
                        test_name(r.test).to_string(),
                        format!("{:.4}", r.p_value),
                    ]
                })
                .collect(),
            json: &report.results,
        };
        let path = path_for(association.name);
        written.push(write_table(&path, format, bom, &association)?);
    }

    for p in &written {
        info!("wrote {}", p.display());
    }
    Ok(written)
}

pub(crate) fn test_name(kind: TestKind) -> &'static str {
    match kind {
        TestKind::ChiSquare => "chi_square",
        TestKind::FisherExact => "fisher_exact",
    }
}

fn write_table<J: Serialize>(
    path: &Path,
    format: ExportFormat,
    bom: bool,
    table: &Table<'_, J>,
) -> Result<PathBuf, AnalysisError> {
    let file = File::create(path).map_err(|e| AnalysisError::io(path, e))?;
    let mut out = BufWriter::new(file);
    match format {
        ExportFormat::Json => {
            serde_json::to_writer_pretty(&mut out, table.json)?;
        }
        ExportFormat::Csv | ExportFormat::Tsv => {
            if bom {
                out.write_all(UTF8_BOM).map_err(|e| AnalysisError::io(path, e))?;
            }
            let delimiter = if format == ExportFormat::Tsv { b'\t' } else { b',' };
            let mut wtr = WriterBuilder::new()
                .delimiter(delimiter)
                .from_writer(&mut out);
            wtr.write_record(table.header)?;
            for row in &table.rows {
                wtr.write_record(row.iter().map(|c| csv_safe_cell(c.clone())))?;
            }
            wtr.flush().map_err(|e| AnalysisError::io(path, e))?;
        }
        ExportFormat::Txt => {
            let mut text = table.header.join("\t");
            text.push('\n');
            for row in &table.rows {
                text.push_str(&row.join("\t"));
                text.push('\n');
            }
            out.write_all(text.as_bytes())
                .map_err(|e| AnalysisError::io(path, e))?;
        }
    }
    out.flush().map_err(|e| AnalysisError::io(path, e))?;
    Ok(path.to_path_buf())
}
