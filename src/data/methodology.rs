use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Description shown when an index has no methodology entry.
pub const NOT_AVAILABLE: &str = "Methodology not yet available.";

/// Static reference information about one index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodologyRecord {
    pub description: String,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub citation: Option<String>,
}

/// What the methodology panel displays for the selected index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodologyView<'a> {
    Available(&'a MethodologyRecord),
    NotAvailable,
}

impl MethodologyView<'_> {
    pub fn description(&self) -> &str {
        match self {
            MethodologyView::Available(r) => &r.description,
            MethodologyView::NotAvailable => NOT_AVAILABLE,
        }
    }

    pub fn link(&self) -> Option<&str> {
        match self {
            MethodologyView::Available(r) => r.link.as_deref(),
            MethodologyView::NotAvailable => None,
        }
    }

    pub fn citation(&self) -> Option<&str> {
        match self {
            MethodologyView::Available(r) => r.citation.as_deref(),
            MethodologyView::NotAvailable => None,
        }
    }
}

/// Normalise an index name for methodology lookup: `Niño 3.4` → `NINO34`.
pub fn normalize_index_name(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            'ñ' | 'Ñ' => 'N',
            other => other,
        })
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

/// Methodology records keyed by normalised index name.
#[derive(Debug, Clone, Default)]
pub struct MethodologyCatalog {
    records: BTreeMap<String, MethodologyRecord>,
}

fn record(description: &str, link: &str, citation: &str) -> MethodologyRecord {
    MethodologyRecord {
        description: description.to_string(),
        link: Some(link.to_string()),
        citation: Some(citation.to_string()),
    }
}

impl MethodologyCatalog {
    /// Records shipped with the application.
    pub fn builtin() -> Self {
        let sst = "https://psl.noaa.gov/data/climateindices/list/";
        let ersst = "Huang, B., et al. (2017): Extended Reconstructed Sea Surface Temperature, \
                     Version 5 (ERSSTv5). J. Climate, 30, 8179-8205.";
        let mut catalog = Self::default();
        for (names, rec) in [
            (
                &["NINO12"][..],
                record(
                    "Monthly SST anomaly averaged over the Niño 1+2 region (0-10°S, 90°W-80°W).",
                    sst,
                    ersst,
                ),
            ),
            (
                &["NINO3"][..],
                record(
                    "Monthly SST anomaly averaged over the Niño 3 region (5°N-5°S, 150°W-90°W).",
                    sst,
                    ersst,
                ),
            ),
            (
                &["NIN34", "NINO34"][..],
                record(
                    "Monthly SST anomaly averaged over the Niño 3.4 region (5°N-5°S, 170°W-120°W). \
                     Anomalies are relative to a 30-year base period updated every 5 years.",
                    sst,
                    ersst,
                ),
            ),
            (
                &["NINO4"][..],
                record(
                    "Monthly SST anomaly averaged over the Niño 4 region (5°N-5°S, 160°E-150°W).",
                    sst,
                    ersst,
                ),
            ),
            (
                &["ONI"][..],
                record(
                    "Oceanic Niño Index: 3-month running mean of Niño 3.4 SST anomalies. \
                     El Niño when ≥ +0.5 °C for five consecutive overlapping seasons, La Niña when ≤ -0.5 °C.",
                    "https://origin.cpc.ncep.noaa.gov/products/analysis_monitoring/ensostuff/ONI_v5.php",
                    ersst,
                ),
            ),
            (
                &["NAO"][..],
                record(
                    "North Atlantic Oscillation: leading rotated EOF of monthly 500 hPa height \
                     anomalies over 20°N-90°N, standardised.",
                    "https://www.cpc.ncep.noaa.gov/data/teledoc/nao.shtml",
                    "Barnston, A. G., and R. E. Livezey (1987): Classification, seasonality and \
                     persistence of low-frequency atmospheric circulation patterns. Mon. Wea. Rev., 115, 1083-1126.",
                ),
            ),
            (
                &["AO"][..],
                record(
                    "Arctic Oscillation: projection of daily 1000 hPa height anomalies poleward \
                     of 20°N onto the leading EOF, standardised.",
                    "https://www.cpc.ncep.noaa.gov/products/precip/CWlink/daily_ao_index/ao.shtml",
                    "Thompson, D. W. J., and J. M. Wallace (1998): The Arctic Oscillation signature \
                     in the wintertime geopotential height and temperature fields. GRL, 25, 1297-1300.",
                ),
            ),
            (
                &["PDO"][..],
                record(
                    "Pacific Decadal Oscillation: leading EOF of monthly SST anomalies in the \
                     North Pacific poleward of 20°N.",
                    "https://www.ncei.noaa.gov/access/monitoring/pdo/",
                    "Mantua, N. J., et al. (1997): A Pacific interdecadal climate oscillation with \
                     impacts on salmon production. BAMS, 78, 1069-1079.",
                ),
            ),
            (
                &["AMO"][..],
                record(
                    "Atlantic Multidecadal Oscillation: detrended area-weighted SST anomaly over \
                     the North Atlantic (0-70°N).",
                    "https://psl.noaa.gov/data/timeseries/AMO/",
                    "Enfield, D. B., A. M. Mestas-Nunez, and P. J. Trimble (2001): The Atlantic \
                     multidecadal oscillation and its relation to rainfall and river flows in the \
                     continental U.S. GRL, 28, 2077-2080.",
                ),
            ),
            (
                &["SOI"][..],
                record(
                    "Southern Oscillation Index: standardised difference of sea level pressure \
                     between Tahiti and Darwin.",
                    "https://www.cpc.ncep.noaa.gov/data/indices/",
                    "Ropelewski, C. F., and P. D. Jones (1987): An extension of the Tahiti-Darwin \
                     Southern Oscillation Index. Mon. Wea. Rev., 115, 2161-2165.",
                ),
            ),
            (
                &["TNA"][..],
                record(
                    "Tropical Northern Atlantic index: SST anomaly averaged over 5.5°N-23.5°N, 15°W-57.5°W.",
                    sst,
                    "Enfield, D. B., et al. (1999): How ubiquitous is the dipole relationship in \
                     tropical Atlantic sea surface temperatures? JGR, 104, 7841-7848.",
                ),
            ),
            (
                &["TSA"][..],
                record(
                    "Tropical Southern Atlantic index: SST anomaly averaged over Eq-20°S, 10°E-30°W.",
                    sst,
                    "Enfield, D. B., et al. (1999): How ubiquitous is the dipole relationship in \
                     tropical Atlantic sea surface temperatures? JGR, 104, 7841-7848.",
                ),
            ),
            (
                &["MJO"][..],
                record(
                    "Madden-Julian Oscillation: daily amplitude of the Real-time Multivariate MJO \
                     index (RMM1/RMM2) built from OLR and 850/200 hPa zonal wind.",
                    "http://www.bom.gov.au/climate/mjo/",
                    "Wheeler, M. C., and H. H. Hendon (2004): An all-season real-time multivariate \
                     MJO index. Mon. Wea. Rev., 132, 1917-1932.",
                ),
            ),
        ] {
            for name in names {
                catalog.insert(name, rec.clone());
            }
        }
        catalog
    }

    /// Load records from a JSON object: `{ "NIN34": { "description": ..., ... } }`.
    pub fn load_json(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading methodology file {}", path.display()))?;
        Self::from_json(&text)
            .with_context(|| format!("parsing methodology file {}", path.display()))
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let raw: BTreeMap<String, MethodologyRecord> = serde_json::from_str(text)?;
        let mut catalog = Self::default();
        for (name, rec) in raw {
            catalog.insert(&name, rec);
        }
        Ok(catalog)
    }

    pub fn insert(&mut self, name: &str, record: MethodologyRecord) {
        self.records.insert(normalize_index_name(name), record);
    }

    /// Overlay `other` on top of `self`; entries in `other` win.
    pub fn merge(&mut self, other: MethodologyCatalog) {
        self.records.extend(other.records);
    }

    pub fn lookup(&self, name: &str) -> MethodologyView<'_> {
        match self.records.get(&normalize_index_name(name)) {
            Some(r) => MethodologyView::Available(r),
            None => MethodologyView::NotAvailable,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn normalisation_folds_case_and_punctuation() {
        assert_eq!(normalize_index_name("Niño 3.4"), "NINO34");
        assert_eq!(normalize_index_name("nino1+2"), "NINO12");
        assert_eq!(normalize_index_name(" nao "), "NAO");
    }

    #[test]
    fn builtin_lookup_and_placeholder() {
        let cat = MethodologyCatalog::builtin();
        let view = cat.lookup("nin34");
        assert!(matches!(view, MethodologyView::Available(_)));
        assert!(view.description().contains("Niño 3.4"));
        assert!(view.link().is_some());

        let missing = cat.lookup("QBO");
        assert_eq!(missing, MethodologyView::NotAvailable);
        assert_eq!(missing.description(), NOT_AVAILABLE);
        assert!(missing.link().is_none() && missing.citation().is_none());
    }

    #[test]
    fn file_records_override_builtin() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "Niño 3.4": {{ "description": "Local definition" }},
                 "QBO": {{ "description": "Quasi-biennial oscillation", "link": "https://example.org/qbo" }} }}"#
        )
        .unwrap();

        let mut cat = MethodologyCatalog::builtin();
        let before = cat.len();
        cat.merge(MethodologyCatalog::load_json(file.path()).unwrap());

        assert_eq!(cat.len(), before + 1);
        assert_eq!(cat.lookup("NINO 3.4").description(), "Local definition");
        assert_eq!(cat.lookup("NINO 3.4").citation(), None);
        assert_ne!(cat.lookup("NIN34").description(), "Local definition");
        assert_eq!(cat.lookup("qbo").link(), Some("https://example.org/qbo"));
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(MethodologyCatalog::from_json("[1, 2]").is_err());
        assert!(MethodologyCatalog::load_json(Path::new("/nonexistent/methodology.json")).is_err());
    }
}
