use std::fmt;

use chrono::NaiveDate;

use super::alias::AliasTable;
use super::model::{IndexCatalog, Observation, Series};
use super::time::month_label;

/// Shown wherever a value or series is unavailable.
pub const PLACEHOLDER: &str = "—";

// ---------------------------------------------------------------------------
// Sign split – two-colour bar rendering
// ---------------------------------------------------------------------------

/// A series split into its positive and negative parts.
///
/// At every index `positive[i] + negative[i]` equals the original value.
/// Missing values are missing in both parts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SignSplit {
    pub times: Vec<NaiveDate>,
    pub positive: Vec<Option<f64>>,
    pub negative: Vec<Option<f64>>,
}

pub fn sign_split(series: &Series) -> SignSplit {
    let n = series.len();
    let mut out = SignSplit {
        times: Vec::with_capacity(n),
        positive: Vec::with_capacity(n),
        negative: Vec::with_capacity(n),
    };
    for obs in series.observations() {
        out.times.push(obs.time);
        out.positive.push(obs.value.map(|v| v.max(0.0)));
        out.negative.push(obs.value.map(|v| v.min(0.0)));
    }
    out
}

// ---------------------------------------------------------------------------
// Latest value – summary table
// ---------------------------------------------------------------------------

/// The chronologically last observation that carries a value.
pub fn latest_value(series: &Series) -> Option<Observation> {
    series
        .observations()
        .iter()
        .rev()
        .find(|o| o.value.is_some())
        .copied()
}

/// Latest value formatted for display, or the placeholder.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatestValue(pub Option<Observation>);

impl LatestValue {
    pub fn value_text(&self) -> String {
        match self.0.and_then(|o| o.value) {
            Some(v) => format!("{v:.2}"),
            None => PLACEHOLDER.to_string(),
        }
    }

    pub fn date_text(&self) -> String {
        match self.0 {
            Some(o) => month_label(o.time),
            None => PLACEHOLDER.to_string(),
        }
    }
}

impl fmt::Display for LatestValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(_) => write!(f, "{} ({})", self.value_text(), self.date_text()),
            None => write!(f, "{PLACEHOLDER}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Window – date range selection
// ---------------------------------------------------------------------------

/// Observations with `start <= time <= end`.
pub fn window(series: &Series, start: NaiveDate, end: NaiveDate) -> Series {
    let obs = series.observations();
    let lo = obs.partition_point(|o| o.time < start);
    let hi = obs.partition_point(|o| o.time <= end).max(lo);
    Series::from_unsorted(series.name.clone(), obs[lo..hi].to_vec())
}

// ---------------------------------------------------------------------------
// Summary table rows
// ---------------------------------------------------------------------------

/// One line of the latest-value table.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryRow {
    pub label: String,
    /// Dataset key the label resolved to, `None` when nothing matched.
    pub key: Option<String>,
    pub latest: LatestValue,
}

/// Build summary rows for every display label, then for any loaded series
/// that no label reaches.
pub fn summary_rows(aliases: &AliasTable, catalog: &IndexCatalog) -> Vec<SummaryRow> {
    let mut rows: Vec<SummaryRow> = aliases
        .summary_labels()
        .map(|label| {
            let series = aliases.lookup(label, catalog);
            SummaryRow {
                label: label.to_string(),
                key: series.map(|s| s.name.clone()),
                latest: LatestValue(series.and_then(latest_value)),
            }
        })
        .collect();

    let covered: Vec<String> = rows.iter().filter_map(|r| r.key.clone()).collect();
    for series in catalog.iter() {
        if !covered.contains(&series.name) {
            rows.push(SummaryRow {
                label: series.name.clone(),
                key: Some(series.name.clone()),
                latest: LatestValue(latest_value(series)),
            });
        }
    }
    rows
}
