use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;

// ---------------------------------------------------------------------------
// Observation – one row of an index file
// ---------------------------------------------------------------------------

/// A single timestamped value. `value` is `None` when the source cell was
/// missing or held a missing-value sentinel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    pub time: NaiveDate,
    pub value: Option<f64>,
}

impl Observation {
    pub fn new(time: NaiveDate, value: Option<f64>) -> Self {
        Self { time, value }
    }
}

// ---------------------------------------------------------------------------
// Series – one teleconnection index
// ---------------------------------------------------------------------------

/// A named index time series with strictly increasing timestamps.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub name: String,
    observations: Vec<Observation>,
}

impl Series {
    /// Build a series from rows in file order.
    ///
    /// Rows are sorted by time; when a timestamp repeats the row that came
    /// last in the input is kept. Surrounding whitespace is stripped from the
    /// name, since delimited files cannot carry it.
    pub fn from_unsorted(name: impl Into<String>, mut rows: Vec<Observation>) -> Self {
        let mut name = name.into();
        if name.trim().len() != name.len() {
            name = name.trim().to_string();
        }
        // Stable sort keeps file order among equal timestamps.
        rows.sort_by_key(|o| o.time);
        let mut observations: Vec<Observation> = Vec::with_capacity(rows.len());
        for row in rows {
            match observations.last_mut() {
                Some(prev) if prev.time == row.time => *prev = row,
                _ => observations.push(row),
            }
        }
        Self { name, observations }
    }

    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// First and last timestamp, if any.
    pub fn time_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        Some((self.observations.first()?.time, self.observations.last()?.time))
    }

    /// Number of observations with a present value.
    pub fn present_count(&self) -> usize {
        self.observations.iter().filter(|o| o.value.is_some()).count()
    }
}

// ---------------------------------------------------------------------------
// IndexCatalog – every series loaded from the dataset directory
// ---------------------------------------------------------------------------

/// All loaded series keyed by name, with the file each came from.
#[derive(Debug, Clone, Default)]
pub struct IndexCatalog {
    series: BTreeMap<String, Series>,
    sources: BTreeMap<String, PathBuf>,
}

impl IndexCatalog {
    /// Insert a series, returning the source path of any series it replaced.
    pub fn insert(&mut self, series: Series, source: &Path) -> Option<PathBuf> {
        let name = series.name.clone();
        self.series.insert(name.clone(), series);
        self.sources.insert(name, source.to_path_buf())
    }

    pub fn get(&self, name: &str) -> Option<&Series> {
        self.series.get(name)
    }

    pub fn source_of(&self, name: &str) -> Option<&Path> {
        self.sources.get(name).map(PathBuf::as_path)
    }

    /// Series names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.series.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Series> {
        self.series.values()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.series.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(y: i32, m: u32, v: Option<f64>) -> Observation {
        Observation::new(NaiveDate::from_ymd_opt(y, m, 1).unwrap(), v)
    }

    #[test]
    fn sorts_and_keeps_last_duplicate() {
        let s = Series::from_unsorted(
            "NAO",
            vec![
                obs(2001, 3, Some(0.3)),
                obs(2001, 1, Some(0.1)),
                obs(2001, 2, Some(0.2)),
                obs(2001, 1, Some(-0.1)),
            ],
        );
        let times: Vec<_> = s.observations().iter().map(|o| o.time).collect();
        assert!(times.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(s.len(), 3);
        assert_eq!(s.observations()[0].value, Some(-0.1));
        assert_eq!(
            s.time_range(),
            Some((obs(2001, 1, None).time, obs(2001, 3, None).time))
        );
    }

    #[test]
    fn catalog_tracks_the_latest_source() {
        let mut cat = IndexCatalog::default();
        cat.insert(Series::from_unsorted("NIN34", vec![]), Path::new("a.txt"));
        assert!(cat.get("nin34").is_none());
        assert!(cat.contains("NIN34"));

        let replaced = cat.insert(Series::from_unsorted("NIN34", vec![]), Path::new("b.txt"));
        assert_eq!(replaced, Some(PathBuf::from("a.txt")));
        assert_eq!(cat.source_of("NIN34"), Some(Path::new("b.txt")));
        assert_eq!(cat.len(), 1);
    }

    #[test]
    fn names_are_trimmed() {
        let s = Series::from_unsorted(" Nino 3.4\t", vec![obs(2001, 1, Some(0.4))]);
        assert_eq!(s.name, "Nino 3.4");
    }
}
