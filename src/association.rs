//! Keyword × tense association.
//!
//! Each keyword gets its own 2×2 table and its own test. No correction for
//! multiple comparisons is applied across keywords, so with many keywords
//! some small p-values are expected by chance.

use log::{debug, warn};
use serde::Serialize;

use crate::error::AnalysisError;
use crate::stats::{ContingencyTable, StatsError, chi_square_2x2, fisher_exact_2x2, round_to};
use crate::tense::{Sentence, Tense};

/// Threshold for the usual "expected count below 5" rule.
pub const DEFAULT_MIN_EXPECTED: f64 = 5.0;

/// When to use Fisher's exact test instead of chi-square.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FallbackRule {
    /// Fisher whenever an expected cell count is below `min_expected` (or zero).
    ExpectedCount { min_expected: f64 },
    /// Fisher only when chi-square is undefined (an expected count is zero).
    OnDegenerate,
}

impl Default for FallbackRule {
    fn default() -> Self {
        FallbackRule::ExpectedCount {
            min_expected: DEFAULT_MIN_EXPECTED,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TestKind {
    ChiSquare,
    FisherExact,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssociationResult {
    pub keyword: String,
    pub table: ContingencyTable,
    pub past_count: u64,
    pub present_future_count: u64,
    /// Share of past sentences containing the keyword, 0–100.
    pub past_percent: f64,
    /// Share of present/future sentences containing the keyword, 0–100.
    pub present_future_percent: f64,
    pub test: TestKind,
    /// Chi-square statistic; `None` when the exact test was used.
    pub statistic: Option<f64>,
    pub p_value: f64,
}

/// A keyword whose table could not be tested.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeywordFailure {
    pub keyword: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AssociationReport {
    /// Sorted by p-value ascending; ties keep keyword order.
    pub results: Vec<AssociationResult>,
    pub failed: Vec<KeywordFailure>,
}

/// Build the keyword × tense table by literal substring search.
/// # Example
/// ```
/// use jp_tense_style::{classify_all, contingency_table, segment};
/// let s = classify_all(segment("学校に行った。学校で遊ぶ。家に帰った。"));
/// let t = contingency_table("学校", &s);
/// assert_eq!((t.a, t.b, t.c, t.d), (1, 1, 1, 0));
/// ```
pub fn contingency_table(keyword: &str, sentences: &[Sentence]) -> ContingencyTable {
    let mut t = ContingencyTable::new(0, 0, 0, 0);
    for s in sentences {
        let hit = s.text().contains(keyword);
        match (s.tense(), hit) {
            (Tense::Past, true) => t.a += 1,
            (Tense::Past, false) => t.b += 1,
            (Tense::PresentFuture, true) => t.c += 1,
            (Tense::PresentFuture, false) => t.d += 1,
        }
    }
    t
}

fn percent(count: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        round_to(count as f64 / total as f64 * 100.0, 2)
    }
}

/// Pick and run the test for one table.
///
/// Chi-square uses Yates' correction. A degenerate table always falls back to
/// the exact test; the exact test only fails on an empty table.
pub fn test_table(
    table: &ContingencyTable,
    rule: FallbackRule,
) -> Result<(TestKind, Option<f64>, f64), StatsError> {
    let use_exact = match (rule, table.expected()) {
        (_, Err(_)) => true,
        (FallbackRule::ExpectedCount { min_expected }, Ok(e)) => {
            e.iter().any(|&x| x < min_expected)
        }
        (FallbackRule::OnDegenerate, Ok(_)) => false,
    };
    if !use_exact {
        match chi_square_2x2(table, true) {
            Ok(r) => return Ok((TestKind::ChiSquare, Some(r.statistic), r.p_value)),
            Err(e) => debug!("chi-square unavailable ({e}), using exact test"),
        }
    }
    let p = fisher_exact_2x2(table)?;
    Ok((TestKind::FisherExact, None, p))
}

pub fn associate(
    keyword: &str,
    sentences: &[Sentence],
    rule: FallbackRule,
) -> Result<AssociationResult, StatsError> {
    let table = contingency_table(keyword, sentences);
    let (test, statistic, p) = test_table(&table, rule)?;
    Ok(AssociationResult {
        keyword: keyword.to_string(),
        table,
        past_count: table.a,
        present_future_count: table.c,
        past_percent: percent(table.a, table.past_total()),
        present_future_percent: percent(table.c, table.present_future_total()),
        test,
        statistic,
        p_value: round_to(p, 4),
    })
}

/// Test every keyword independently and rank by p-value.
///
/// A keyword whose test cannot be computed is reported in
/// [`AssociationReport::failed`]; the remaining keywords are still tested.
pub fn associate_keywords<S: AsRef<str>>(
    keywords: &[S],
    sentences: &[Sentence],
    rule: FallbackRule,
) -> Result<AssociationReport, AnalysisError> {
    if keywords.is_empty() {
        return Err(AnalysisError::NoKeywords);
    }
    let mut report = AssociationReport::default();
    for keyword in keywords {
        let keyword = keyword.as_ref();
        match associate(keyword, sentences, rule) {
            Ok(r) => report.results.push(r),
            Err(e) => {
                warn!("keyword {keyword:?} not tested: {e}");
                report.failed.push(KeywordFailure {
                    keyword: keyword.to_string(),
                    reason: e.to_string(),
                });
            }
        }
    }
    // stable sort keeps input order among equal p-values
    report
        .results
        .sort_by(|x, y| x.p_value.total_cmp(&y.p_value));
    Ok(report)
}
