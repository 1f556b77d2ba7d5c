//! Significance tests on 2×2 contingency tables.

use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatsError {
    /// A row or column sums to zero, so an expected frequency is zero and the
    /// chi-square statistic is undefined.
    #[error("degenerate table: an expected frequency is zero")]
    DegenerateTable,
    #[error("table has no observations")]
    EmptyTable,
}

/// Counts cross-tabulating keyword presence against tense.
///
/// Rows are tenses (past, present/future), columns keyword present/absent:
/// ```text
///                  keyword   no keyword
/// past               a           b
/// present/future     c           d
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ContingencyTable {
    pub a: u64,
    pub b: u64,
    pub c: u64,
    pub d: u64,
}

impl ContingencyTable {
    pub fn new(a: u64, b: u64, c: u64, d: u64) -> Self {
        ContingencyTable { a, b, c, d }
    }

    pub fn total(&self) -> u64 {
        self.a + self.b + self.c + self.d
    }

    pub fn past_total(&self) -> u64 {
        self.a + self.b
    }

    pub fn present_future_total(&self) -> u64 {
        self.c + self.d
    }

    fn cells(&self) -> [f64; 4] {
        [self.a as f64, self.b as f64, self.c as f64, self.d as f64]
    }

    /// Expected frequencies under independence, in a, b, c, d order.
    pub fn expected(&self) -> Result<[f64; 4], StatsError> {
        let n = self.total();
        if n == 0 {
            return Err(StatsError::DegenerateTable);
        }
        let n = n as f64;
        let rows = [self.past_total() as f64, self.present_future_total() as f64];
        let cols = [(self.a + self.c) as f64, (self.b + self.d) as f64];
        let e = [
            rows[0] * cols[0] / n,
            rows[0] * cols[1] / n,
            rows[1] * cols[0] / n,
            rows[1] * cols[1] / n,
        ];
        if e.iter().any(|&x| x == 0.0) {
            return Err(StatsError::DegenerateTable);
        }
        Ok(e)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChiSquare {
    pub statistic: f64,
    pub p_value: f64,
}

/// Pearson's chi-square test of independence with one degree of freedom.
///
/// With `yates` set, each observed count is moved up to 0.5 towards its
/// expected value before squaring (continuity correction).
pub fn chi_square_2x2(table: &ContingencyTable, yates: bool) -> Result<ChiSquare, StatsError> {
    let expected = table.expected()?;
    let statistic: f64 = table
        .cells()
        .iter()
        .zip(expected.iter())
        .map(|(&o, &e)| {
            let diff = if yates {
                let d = (o - e).abs();
                d - d.min(0.5)
            } else {
                (o - e).abs()
            };
            diff * diff / e
        })
        .sum();
    Ok(ChiSquare {
        statistic,
        p_value: chi2_sf_1df(statistic),
    })
}

/// Two-sided Fisher's exact test.
///
/// Sums the hypergeometric probabilities of all tables with the observed
/// margins that are no more likely than the observed one.
/// # Example
/// ```
/// use jp_tense_style::{ContingencyTable, fisher_exact_2x2};
/// let p = fisher_exact_2x2(&ContingencyTable::new(8, 2, 1, 5)).unwrap();
/// assert!((p - 0.034965).abs() < 1e-6);
/// ```
pub fn fisher_exact_2x2(table: &ContingencyTable) -> Result<f64, StatsError> {
    let n = table.total();
    if n == 0 {
        return Err(StatsError::EmptyTable);
    }
    let row = table.past_total();
    let col = table.a + table.c;
    let lo = (row + col).saturating_sub(n);
    let hi = row.min(col);

    let ln_fact = ln_factorials(n as usize);
    let ln_choose = |k: u64, r: u64| {
        ln_fact[k as usize] - ln_fact[r as usize] - ln_fact[(k - r) as usize]
    };
    let ln_denom = ln_choose(n, row);
    let prob = |x: u64| (ln_choose(col, x) + ln_choose(n - col, row - x) - ln_denom).exp();

    let observed = prob(table.a);
    // relative tolerance for tables whose probability equals the observed one
    let cutoff = observed * (1.0 + 1e-7);
    let p: f64 = (lo..=hi).map(prob).filter(|&q| q <= cutoff).sum();
    Ok(p.min(1.0))
}

/// ln(k!) for k in 0..=n.
fn ln_factorials(n: usize) -> Vec<f64> {
    let mut out = Vec::with_capacity(n + 1);
    let mut acc = 0.0_f64;
    out.push(acc);
    for k in 1..=n {
        acc += (k as f64).ln();
        out.push(acc);
    }
    out
}

/// Survival function of the chi-square distribution with one degree of freedom.
pub fn chi2_sf_1df(x: f64) -> f64 {
    if x <= 0.0 {
        return 1.0;
    }
    erfc((x / 2.0).sqrt()).clamp(0.0, 1.0)
}

/// Complementary error function, Chebyshev approximation with fractional
/// error below 1.2e-7.
fn erfc(x: f64) -> f64 {
    let z = x.abs();
    let t = 1.0 / (1.0 + 0.5 * z);
    let poly = -1.26551223
        + t * (1.00002368
            + t * (0.37409196
                + t * (0.09678418
                    + t * (-0.18628806
                        + t * (0.27886807
                            + t * (-1.13520398
                                + t * (1.48851587 + t * (-0.82215223 + t * 0.17087277))))))));
    let r = t * (-z * z + poly).exp();
    if x >= 0.0 { r } else { 2.0 - r }
}

/// Round to `places` decimal places.
pub fn round_to(x: f64, places: i32) -> f64 {
    let f = 10f64.powi(places);
    (x * f).round() / f
}
