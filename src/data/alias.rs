use super::model::{IndexCatalog, Series};

/// Display labels shown in the summary table, paired with the dataset key
/// each one normally resolves to. Several labels may share a key.
const DEFAULT_ALIASES: &[(&str, &str)] = &[
    ("Niño 1+2", "NINO12"),
    ("Nino 1+2", "NINO12"),
    ("NINO1+2", "NINO12"),
    ("Niño 3", "NINO3"),
    ("Nino 3", "NINO3"),
    ("Niño 3.4", "NIN34"),
    ("Nino 3.4", "NIN34"),
    ("NINO3.4", "NIN34"),
    ("NINO34", "NIN34"),
    ("N34", "NIN34"),
    ("Niño 4", "NINO4"),
    ("Nino 4", "NINO4"),
    ("ONI", "ONI"),
    ("SOI", "SOI"),
    ("NAO", "NAO"),
    ("AO", "AO"),
    ("PDO", "PDO"),
    ("AMO", "AMO"),
    ("TNA", "TNA"),
    ("TSA", "TSA"),
    ("MJO", "MJO"),
];

/// Labels listed in the summary table, in display order.
const SUMMARY_LABELS: &[&str] = &[
    "Niño 1+2", "Niño 3", "Niño 3.4", "Niño 4", "ONI", "SOI", "NAO", "AO", "PDO", "AMO", "TNA",
    "TSA", "MJO",
];

/// Maps display labels to canonical series keys.
#[derive(Debug, Clone)]
pub struct AliasTable {
    entries: Vec<(String, String)>,
    summary_labels: Vec<String>,
}

impl Default for AliasTable {
    fn default() -> Self {
        Self {
            entries: DEFAULT_ALIASES
                .iter()
                .map(|(l, k)| (l.to_string(), k.to_string()))
                .collect(),
            summary_labels: SUMMARY_LABELS.iter().map(|l| l.to_string()).collect(),
        }
    }
}

/// Unicode-aware case-insensitive comparison (labels carry `ñ`).
fn eq_ignore_case(a: &str, b: &str) -> bool {
    a.chars()
        .flat_map(char::to_lowercase)
        .eq(b.chars().flat_map(char::to_lowercase))
}

impl AliasTable {
    /// Mapped key for a label, compared case-insensitively.
    pub fn target(&self, label: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(l, _)| eq_ignore_case(l, label))
            .map(|(_, k)| k.as_str())
    }

    /// Labels shown in the summary table.
    pub fn summary_labels(&self) -> impl Iterator<Item = &str> {
        self.summary_labels.iter().map(String::as_str)
    }

    /// Resolve a display label to a dataset key.
    ///
    /// 1. the mapped key, if some dataset key equals it ignoring case
    /// 2. the label itself, if some dataset key equals it ignoring case
    /// 3. otherwise the label unchanged
    pub fn resolve<'a, I>(&self, label: &str, keys: I) -> String
    where
        I: IntoIterator<Item = &'a str>,
    {
        let keys: Vec<&str> = keys.into_iter().collect();
        let find = |wanted: &str| keys.iter().find(|k| eq_ignore_case(k, wanted)).copied();

        self.target(label)
            .and_then(find)
            .or_else(|| find(label))
            .unwrap_or(label)
            .to_string()
    }

    /// Find the series a label refers to. `None` means the caller shows a placeholder.
    pub fn lookup<'c>(&self, label: &str, catalog: &'c IndexCatalog) -> Option<&'c Series> {
        let key = self.resolve(label, catalog.names());
        catalog.get(&key)
    }
}
