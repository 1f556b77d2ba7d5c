//! Integration tests for `jp_tense_style`.
//
// This suite verifies:
// - Library behavior (segmentation, tense, endings, tense word lists, keyword association)
// - File-level runs: per-file and combined mode, export formats, BOM, language checks
// - CLI behavior, run with a per-process working directory (no global CWD change)
//
// Library tests use a small deterministic tokenizer so results do not depend on
// dictionary contents; the CLI runs the bundled Lindera tokenizer.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::prelude::*;
use assert_fs::prelude::*;
use csv::WriterBuilder;
use predicates::prelude::*;
use regex::Regex;
use serde_json::Value as Json;
use tempfile::tempdir;

use jp_tense_style::{
    AnalysisError, AnalysisOptions, EndingPolicy, ExportFormat, FallbackRule, Morpheme,
    MorphologicalTokenizer, Tense, TestKind, TokenizeError, analyze_path, analyze_text_with,
    collect_files, csv_safe_cell,
};

const SAMPLE: &str = "彼は昨日学校に行きました。明日は晴れるでしょう。私は毎日勉強します。";

const STORY: &str = "昨日は友達と公園へ行きました。公園はとても静かでした。\
私たちは長い時間話しました。今日は図書館で本を読みます。\
明日も公園で会うでしょう。週末は雨になります。";

// --------------------- helpers ---------------------

/// Every maximal run of kanji is a noun; everything else is ignored.
struct KanjiNouns;

impl MorphologicalTokenizer for KanjiNouns {
    fn tokenize(&self, text: &str) -> Result<Vec<Morpheme>, TokenizeError> {
        let mut out = Vec::new();
        let mut run = String::new();
        for c in text.chars() {
            if ('\u{4E00}'..='\u{9FA0}').contains(&c) {
                run.push(c);
            } else if !run.is_empty() {
                out.push(Morpheme::new(std::mem::take(&mut run), "名詞"));
            }
        }
        if !run.is_empty() {
            out.push(Morpheme::new(run, "名詞"));
        }
        Ok(out)
    }
}

/// Create a file with content in a temp dir.
fn write_file(dir: &assert_fs::TempDir, name: &str, content: &str) -> PathBuf {
    let f = dir.child(name);
    f.write_str(content).unwrap();
    f.path().to_path_buf()
}

/// Read file to string.
fn read_to_string<P: AsRef<Path>>(p: P) -> String {
    fs::read_to_string(p).unwrap()
}

/// Default analysis options for library calls, exporting into `out`.
fn opts(fmt: ExportFormat, out: &Path) -> AnalysisOptions {
    AnalysisOptions {
        export_format: fmt,
        out_dir: Some(out.to_path_buf()),
        ..AnalysisOptions::default()
    }
}

/// Run CLI successfully with a specific working directory.
fn run_cli_ok_in(dir: &Path, args: &[&str]) -> assert_cmd::assert::Assert {
    let mut cmd = assert_cmd::Command::cargo_bin("jp_tense_style").unwrap();
    cmd.current_dir(dir);
    cmd.args(args).assert().success()
}

/// Run CLI expecting failure with a specific working directory.
fn run_cli_fail_in(dir: &Path, args: &[&str]) -> assert_cmd::assert::Assert {
    let mut cmd = assert_cmd::Command::cargo_bin("jp_tense_style").unwrap();
    cmd.current_dir(dir);
    cmd.args(args).assert().failure()
}

/// All files in `dir` whose name ends with `suffix` (e.g. "_endings.csv").
fn files_with_suffix(dir: &Path, suffix: &str) -> Vec<PathBuf> {
    let mut found: Vec<PathBuf> = fs::read_dir(dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .map(|n| n.ends_with(suffix))
                .unwrap_or(false)
        })
        .collect();
    found.sort();
    found
}

fn find_with_suffix(dir: &Path, suffix: &str) -> PathBuf {
    files_with_suffix(dir, suffix)
        .pop()
        .unwrap_or_else(|| panic!("no file ending with {suffix}"))
}

/// Load a frequency JSON export into a map<item, count>.
fn load_frequency_map(path: &Path) -> HashMap<String, u64> {
    let v: Json = serde_json::from_str(&read_to_string(path)).expect("valid json");
    let mut map = HashMap::new();
    for item in v.as_array().expect("json array") {
        let obj = item.as_object().expect("json object");
        let k = obj.get("item").and_then(|x| x.as_str()).expect("item str");
        let c = obj.get("count").and_then(|x| x.as_u64()).expect("count u64");
        map.insert(k.to_string(), c);
    }
    map
}

/// Parse "label,count" CSV rows after the header.
fn read_count_rows(p: &Path) -> Vec<(String, u32)> {
    let mut rdr = csv::Reader::from_path(p).unwrap();
    rdr.records()
        .map(|r| {
            let r = r.unwrap();
            (r[0].to_string(), r[1].parse().unwrap())
        })
        .collect()
}

// --------------------- library tests ---------------------

#[test]
fn lib_sample_text_tense_and_endings() {
    let td = tempdir().unwrap();
    let a = analyze_text_with(SAMPLE, &KanjiNouns, &opts(ExportFormat::Csv, td.path()));

    assert_eq!(a.sentences.len(), 3);
    assert_eq!(a.sentences[0].tense(), Tense::Past);
    assert_eq!(a.sentences[1].tense(), Tense::PresentFuture);
    assert_eq!(a.sentences[2].tense(), Tense::PresentFuture);

    // membership, not exhaustive equality
    assert_eq!(a.ending_frequencies.get("ました"), Some(1));
    assert_eq!(a.ending_frequencies.get("ます"), Some(1));
    assert_eq!(a.ending_frequencies.total() as usize, a.endings.len());
}

#[test]
fn lib_keyword_association_on_sample() {
    let td = tempdir().unwrap();
    let mut o = opts(ExportFormat::Csv, td.path());
    o.keywords = vec!["学校".into(), "宇宙".into()];
    let a = analyze_text_with(SAMPLE, &KanjiNouns, &o);
    let report = a.association.expect("keywords were given");

    let school = report.results.iter().find(|r| r.keyword == "学校").unwrap();
    assert_eq!(school.past_count, 1);
    assert_eq!(school.present_future_count, 0);
    assert_eq!(school.test, TestKind::FisherExact);
    assert!((0.0..=1.0).contains(&school.p_value));

    let absent = report.results.iter().find(|r| r.keyword == "宇宙").unwrap();
    assert_eq!((absent.table.a, absent.table.c), (0, 0));
    assert_eq!(absent.test, TestKind::FisherExact);
    assert_eq!(absent.p_value, 1.0);

    // most significant first
    assert_eq!(report.results[0].keyword, "学校");
}

#[test]
fn lib_tense_word_lists() {
    let td = tempdir().unwrap();
    let a = analyze_text_with(STORY, &KanjiNouns, &opts(ExportFormat::Csv, td.path()));

    assert_eq!(a.past_count(), 3);
    assert_eq!(a.present_future_count(), 3);
    assert_eq!(a.words.past.get("公園"), Some(2));
    assert_eq!(a.words.present_future.get("公園"), Some(1));
    assert_eq!(a.words.present_future.get("図書館"), Some(1));
    assert_eq!(a.words.past.entries()[0].item, "公園");
    assert!(a.words.past.entries().windows(2).all(|w| w[0].count >= w[1].count));
}

#[test]
fn lib_extended_policy_counts_plain_forms() {
    let td = tempdir().unwrap();
    let text = "毎日走る。昨日は走った。よく勉強した。春になる。";
    let mut o = opts(ExportFormat::Csv, td.path());

    o.ending_policy = EndingPolicy::canonical();
    let canonical = analyze_text_with(text, &KanjiNouns, &o);
    assert!(canonical.ending_frequencies.is_empty());

    o.ending_policy = EndingPolicy::extended();
    let extended = analyze_text_with(text, &KanjiNouns, &o);
    assert_eq!(extended.ending_frequencies.get("した"), Some(1));
    assert_eq!(extended.ending_frequencies.get("なる"), Some(1));
    assert_eq!(extended.ending_frequencies.get("走る"), None);
}

#[test]
fn lib_analyze_path_per_file_and_combined_csv() {
    let td = assert_fs::TempDir::new().unwrap();
    let out = td.child("out");
    let _f1 = write_file(&td, "a.txt", SAMPLE);
    let _f2 = write_file(&td, "b.txt", STORY);

    let mut o = opts(ExportFormat::Csv, out.path());
    o.keywords = vec!["公園".into()];
    let rep = analyze_path(td.path(), &KanjiNouns, &o).expect("analyze_path");
    assert_eq!(rep.analyses.len(), 2);
    assert!(rep.failed_files.is_empty());

    let re = Regex::new(r"^a_\d{8}_\d{6}_endings\.csv$").unwrap();
    let found = fs::read_dir(out.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .any(|e| re.is_match(e.file_name().to_string_lossy().as_ref()));
    assert!(found, "Expected a_*_endings.csv in output dir");
    assert_eq!(files_with_suffix(out.path(), "_association.csv").len(), 2);
    assert_eq!(rep.outputs.len(), 10);

    // combined: one analysis over both documents
    let combined_out = td.child("combined");
    let mut o2 = opts(ExportFormat::Csv, combined_out.path());
    o2.combine = true;
    let rep2 = analyze_path(td.path(), &KanjiNouns, &o2).expect("analyze_path combined");
    assert_eq!(rep2.analyses.len(), 1);
    let (name, combined) = &rep2.analyses[0];
    assert_eq!(name, "combined");
    assert_eq!(combined.sentences.len(), 9);
    let has_combined = fs::read_dir(combined_out.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .any(|e| e.file_name().to_string_lossy().starts_with("combined_"));
    assert!(has_combined, "Expected combined_* outputs");
    // no keywords, no association table
    assert!(files_with_suffix(combined_out.path(), "_association.csv").is_empty());
}

#[test]
fn lib_same_stem_in_subdirectories_keeps_both_exports() {
    let td = assert_fs::TempDir::new().unwrap();
    td.child("a").create_dir_all().unwrap();
    td.child("b").create_dir_all().unwrap();
    let _f1 = write_file(&td, "a/report.txt", SAMPLE);
    let _f2 = write_file(&td, "b/report.txt", STORY);
    let out = td.child("out");

    let rep = analyze_path(td.path(), &KanjiNouns, &opts(ExportFormat::Csv, out.path()))
        .expect("analyze_path");
    let names: Vec<&str> = rep.analyses.iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(names, vec!["a_report", "b_report"]);

    // every reported output is a distinct file on disk
    let mut outputs = rep.outputs.clone();
    outputs.sort();
    outputs.dedup();
    assert_eq!(outputs.len(), 8);
    assert_eq!(fs::read_dir(out.path()).unwrap().count(), 8);

    let endings_for = |prefix: &str| {
        files_with_suffix(out.path(), "_endings.csv")
            .into_iter()
            .find(|p| p.file_name().unwrap().to_string_lossy().starts_with(prefix))
            .unwrap_or_else(|| panic!("no endings export for {prefix}"))
    };
    // SAMPLE ends in ました and ます
    assert_eq!(read_count_rows(&endings_for("a_report_")).len(), 2);
    let b_path = endings_for("b_report_");
    assert_eq!(read_count_rows(&b_path).len(), 4);
}

#[test]
fn lib_exports_are_sorted_by_frequency() {
    let td = assert_fs::TempDir::new().unwrap();
    let text = "猫が来ました。犬が来ました。鳥が来ました。猫が鳴きます。猫は白いです。犬は黒いです。";
    let _f = write_file(&td, "sorted.txt", text);
    let out = td.child("out");
    analyze_path(td.path(), &KanjiNouns, &opts(ExportFormat::Csv, out.path()))
        .expect("analysis runs");

    let endings = read_count_rows(&find_with_suffix(out.path(), "_endings.csv"));
    assert_eq!(
        endings,
        vec![
            ("ました".to_string(), 3),
            ("です".to_string(), 2),
            ("ます".to_string(), 1)
        ]
    );

    let past = read_count_rows(&find_with_suffix(out.path(), "_words_past.csv"));
    // 来 appears in every past sentence; ties keep first-seen order
    let labels: Vec<&str> = past.iter().map(|(l, _)| l.as_str()).collect();
    assert_eq!(labels, vec!["来", "猫", "犬", "鳥"]);
    assert_eq!(past[0].1, 3);
    assert!(past.windows(2).all(|w| w[0].1 >= w[1].1));
}

#[test]
fn lib_json_export_matches_tables() {
    let td = assert_fs::TempDir::new().unwrap();
    let _f = write_file(&td, "story.txt", STORY);
    let out = td.child("out");
    let mut o = opts(ExportFormat::Json, out.path());
    o.keywords = vec!["公園".into()];
    analyze_path(td.path(), &KanjiNouns, &o).expect("analysis runs");

    let endings = load_frequency_map(&find_with_suffix(out.path(), "_endings.json"));
    assert_eq!(endings.get("ました"), Some(&2));
    assert_eq!(endings.get("でした"), Some(&1));
    assert_eq!(endings.get("ます"), Some(&1));
    assert_eq!(endings.get("になります"), Some(&1));

    let past = load_frequency_map(&find_with_suffix(out.path(), "_words_past.json"));
    assert_eq!(past.get("公園"), Some(&2));

    let assoc: Json =
        serde_json::from_str(&read_to_string(find_with_suffix(out.path(), "_association.json")))
            .unwrap();
    let first = &assoc.as_array().unwrap()[0];
    assert_eq!(first["keyword"], "公園");
    assert_eq!(first["past_count"], 2);
    assert_eq!(first["present_future_count"], 1);
    assert_eq!(first["test"], "fisher_exact");
    assert_eq!(first["table"]["a"], 2);

    let sentences: Json =
        serde_json::from_str(&read_to_string(find_with_suffix(out.path(), "_sentences.json")))
            .unwrap();
    assert_eq!(sentences.as_array().unwrap().len(), 6);
    assert_eq!(sentences[0]["tense"], "past");
}

#[test]
fn lib_bom_prefix_only_when_requested() {
    let td = assert_fs::TempDir::new().unwrap();
    let _f = write_file(&td, "bom.txt", SAMPLE);

    let plain = td.child("plain");
    analyze_path(td.path(), &KanjiNouns, &opts(ExportFormat::Csv, plain.path())).unwrap();
    let bytes = fs::read(find_with_suffix(plain.path(), "_endings.csv")).unwrap();
    assert!(bytes.starts_with(b"ending,count"));

    let bom = td.child("bom");
    let mut o = opts(ExportFormat::Csv, bom.path());
    o.bom = true;
    analyze_path(td.path(), &KanjiNouns, &o).unwrap();
    let bytes = fs::read(find_with_suffix(bom.path(), "_endings.csv")).unwrap();
    assert!(bytes.starts_with(b"\xEF\xBB\xBFending,count"));
}

#[test]
fn lib_empty_document_is_no_data() {
    let td = assert_fs::TempDir::new().unwrap();
    let _f = write_file(&td, "empty.txt", "   \n。。\n");
    let out = td.child("out");
    let rep = analyze_path(td.path(), &KanjiNouns, &opts(ExportFormat::Csv, out.path()))
        .expect("empty input is not an error");
    assert!(rep.analyses[0].1.is_empty());
    assert!(rep.summary.contains("no data"));
    let rows = read_count_rows(&find_with_suffix(out.path(), "_endings.csv"));
    assert!(rows.is_empty());
}

#[test]
fn lib_require_japanese_per_file_skips_and_combined_aborts() {
    let td = assert_fs::TempDir::new().unwrap();
    let _jp = write_file(&td, "jp.txt", STORY);
    let _en = write_file(
        &td,
        "en.txt",
        "This is clearly English so language detection should reject it for this run.",
    );
    let out = td.child("out");

    let mut o = opts(ExportFormat::Csv, out.path());
    o.require_japanese = true;
    let rep = analyze_path(td.path(), &KanjiNouns, &o).expect("per-file run continues");
    assert_eq!(rep.analyses.len(), 1);
    assert_eq!(rep.analyses[0].0, "jp");
    assert_eq!(rep.failed_files.len(), 1);
    assert!(rep.failed_files[0].0.ends_with("en.txt"));

    o.combine = true;
    let res = analyze_path(td.path(), &KanjiNouns, &o);
    assert!(matches!(res, Err(AnalysisError::CombinedAborted(_))));

    // without the flag non-Japanese text is only a warning
    o.require_japanese = false;
    assert!(analyze_path(td.path(), &KanjiNouns, &o).is_ok());
}

#[test]
fn lib_fallback_rule_is_configurable() {
    let td = tempdir().unwrap();
    let text = "猫を見た。犬を見た。猫を見る。犬を見る。犬を見る。";
    let mut o = opts(ExportFormat::Csv, td.path());
    o.keywords = vec!["猫".into()];

    o.fallback = FallbackRule::default();
    let a = analyze_text_with(text, &KanjiNouns, &o);
    assert_eq!(a.association.unwrap().results[0].test, TestKind::FisherExact);

    o.fallback = FallbackRule::OnDegenerate;
    let a = analyze_text_with(text, &KanjiNouns, &o);
    let r = &a.association.unwrap().results[0];
    assert_eq!(r.test, TestKind::ChiSquare);
    assert!(r.statistic.is_some());
}

#[test]
fn lib_collect_files_filters_and_sorts() {
    let td = assert_fs::TempDir::new().unwrap();
    write_file(&td, "b.txt", SAMPLE);
    write_file(&td, "a.txt", SAMPLE);
    write_file(&td, "notes.md", SAMPLE);
    td.child("sub").create_dir_all().unwrap();
    write_file(&td, "sub/c.txt", SAMPLE);

    let files = collect_files(td.path());
    let names: Vec<String> = files
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["a.txt", "b.txt", "c.txt"]);

    let missing = td.path().join("missing");
    assert!(matches!(
        analyze_path(&missing, &KanjiNouns, &opts(ExportFormat::Csv, td.path())),
        Err(AnalysisError::NoInput(_))
    ));
}

// --------------------- CLI tests ---------------------

#[test]
fn cli_nonexistent_path_fails() {
    let td = tempdir().unwrap();
    let bad = td.path().join("does_not_exist_here");
    run_cli_fail_in(
        td.path(),
        &[bad.to_string_lossy().as_ref(), "--export-format", "csv"],
    );
}

#[test]
fn cli_basic_run_csv_with_keywords() {
    let td = assert_fs::TempDir::new().unwrap();
    let _f = write_file(&td, "cli.txt", SAMPLE);

    run_cli_ok_in(
        td.path(),
        &[
            td.path().to_string_lossy().as_ref(),
            "--export-format",
            "csv",
            "--keywords",
            "学校,宇宙",
        ],
    )
    .stdout(
        predicate::str::contains("Sentence endings:")
            .and(predicate::str::contains("ました"))
            .and(predicate::str::contains("学校"))
            .and(predicate::str::contains("fisher_exact")),
    );

    let re = Regex::new(r"^cli_\d{8}_\d{6}_endings\.csv$").unwrap();
    let found = fs::read_dir(td.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .any(|e| re.is_match(e.file_name().to_string_lossy().as_ref()));
    assert!(found, "Expected cli_*_endings.csv in temp dir");

    let assoc = find_with_suffix(td.path(), "_association.csv");
    let mut rdr = csv::Reader::from_path(&assoc).unwrap();
    let rows: Vec<csv::StringRecord> = rdr.records().map(|r| r.unwrap()).collect();
    assert_eq!(rows.len(), 2);
    assert_eq!(&rows[0][0], "学校");
    assert_eq!(&rows[0][1], "1");
    assert_eq!(&rows[0][2], "0");
}

#[test]
fn cli_lindera_word_lists() {
    let td = assert_fs::TempDir::new().unwrap();
    let _f = write_file(&td, "words.txt", SAMPLE);

    run_cli_ok_in(
        td.path(),
        &[
            td.path().to_string_lossy().as_ref(),
            "--export-format",
            "json",
        ],
    );

    let past = load_frequency_map(&find_with_suffix(td.path(), "_words_past.json"));
    assert_eq!(past.get("学校"), Some(&1));
    assert_eq!(past.get("行く"), Some(&1));
    let present = load_frequency_map(&find_with_suffix(td.path(), "_words_present.json"));
    assert!(present.contains_key("勉強"));
    assert!(!present.contains_key("学校"));
}

#[test]
fn cli_export_tsv_with_bom() {
    let td = assert_fs::TempDir::new().unwrap();
    let _f = write_file(&td, "fmt.txt", STORY);

    run_cli_ok_in(
        td.path(),
        &[
            td.path().to_string_lossy().as_ref(),
            "--export-format",
            "tsv",
            "--bom",
        ],
    );

    let tsv = find_with_suffix(td.path(), "_endings.tsv");
    let bytes = fs::read(tsv).unwrap();
    assert!(bytes.starts_with(b"\xEF\xBB\xBFending\tcount"));
}

#[test]
fn cli_out_dir_and_extended_endings() {
    let td = assert_fs::TempDir::new().unwrap();
    let _f = write_file(&td, "plain.txt", "毎日勉強する。昨日も勉強した。");
    let out = td.path().join("results");

    run_cli_ok_in(
        td.path(),
        &[
            td.path().join("plain.txt").to_string_lossy().as_ref(),
            "--endings",
            "extended",
            "--export-format",
            "json",
            "--out-dir",
            out.to_string_lossy().as_ref(),
        ],
    );

    let endings = load_frequency_map(&find_with_suffix(&out, "_endings.json"));
    assert_eq!(endings.get("する"), Some(&1));
    assert_eq!(endings.get("した"), Some(&1));
}

#[test]
fn cli_require_japanese_combined_aborts() {
    let td = assert_fs::TempDir::new().unwrap();
    let _jp = write_file(&td, "jp.txt", STORY);
    let _en = write_file(
        &td,
        "en.txt",
        "This is clearly English so language detection should reject it for this run.",
    );

    run_cli_fail_in(
        td.path(),
        &[
            td.path().to_string_lossy().as_ref(),
            "--combine",
            "--require-japanese",
        ],
    )
    .stderr(predicate::str::contains("Combined run aborted"));
}

#[test]
fn cli_require_japanese_per_file_reports_skipped() {
    let td = assert_fs::TempDir::new().unwrap();
    let _jp = write_file(&td, "jp.txt", STORY);
    let _en = write_file(
        &td,
        "en.txt",
        "This is clearly English so language detection should reject it for this run.",
    );

    run_cli_fail_in(
        td.path(),
        &[td.path().to_string_lossy().as_ref(), "--require-japanese"],
    )
    .stderr(predicate::str::contains("en.txt"));

    // the Japanese file was still analyzed
    assert_eq!(files_with_suffix(td.path(), "_endings.csv").len(), 1);
}

// --- Tests to verify sanitizing works ---

#[test]
fn csv_writer_sanitizes_and_quotes_correctly() {
    let mut buf = Vec::new();
    {
        let mut wtr = WriterBuilder::new().from_writer(&mut buf);

        wtr.write_record(["ending", "count"]).unwrap();

        // dangerous: starts with '=' and contains quotes
        let dangerous = r#"=HYPERLINK("http://x")"#.to_string();
        wtr.write_record([csv_safe_cell(dangerous), "1".to_string()])
            .unwrap();
        wtr.write_record([csv_safe_cell("ました".into()), "2".to_string()])
            .unwrap();

        wtr.flush().unwrap();
    } // <- drop(wtr), releases &mut borrow on buf

    let out = String::from_utf8(buf).unwrap();
    assert!(
        out.contains(r#"'=HYPERLINK(""http://x"")"#),
        "leading '=' neutralized and inner quotes doubled"
    );
    assert!(out.contains("\nました,2\n"), "normal cells unchanged");
}

#[test]
fn no_double_prefix_when_cell_already_safe() {
    let already_safe = "'@SAFE".to_string();
    assert_eq!(csv_safe_cell(already_safe.clone()), already_safe);
}
