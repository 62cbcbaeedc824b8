use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;

use crate::config::DashboardConfig;
use crate::data::alias::AliasTable;
use crate::data::export::{export_to_path, ExportFormat};
use crate::data::loader::load_directory;
use crate::data::methodology::{MethodologyCatalog, MethodologyView};
use crate::data::model::{IndexCatalog, Series};
use crate::data::transform::{summary_rows, window, SummaryRow};

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// How the selected index is drawn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ChartMode {
    /// Sign-coloured anomaly bars.
    #[default]
    Bars,
    /// Lines, with optional overlays of other indices.
    Lines,
}

/// The full UI state, independent of rendering.
pub struct AppState {
    pub config: DashboardConfig,

    /// Every series loaded from `config.dataset_dir`.
    pub catalog: IndexCatalog,

    /// Files in the dataset directory that failed to load, with the reason.
    pub load_failures: Vec<(PathBuf, String)>,

    /// Index shown in the chart.
    pub selected: Option<String>,

    /// Extra indices drawn in line mode.
    pub overlays: BTreeSet<String>,

    /// Inclusive date window; `None` shows the whole record.
    pub window: Option<(NaiveDate, NaiveDate)>,

    pub chart_mode: ChartMode,

    pub export_format: ExportFormat,

    pub aliases: AliasTable,

    pub methodology: MethodologyCatalog,

    /// Latest-value table (cached, rebuilt on reload).
    pub summary: Vec<SummaryRow>,

    /// Status / warning message shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    /// Build the state from configuration and load the dataset directory.
    pub fn new(config: DashboardConfig) -> Self {
        let mut methodology = MethodologyCatalog::builtin();
        let mut status_message = None;
        if let Some(path) = &config.methodology_file {
            match MethodologyCatalog::load_json(path) {
                Ok(extra) if extra.is_empty() => {
                    log::warn!("{} holds no methodology records", path.display());
                }
                Ok(extra) => {
                    log::info!("Loaded {} methodology records from {}", extra.len(), path.display());
                    methodology.merge(extra);
                }
                Err(e) => {
                    log::error!("Failed to load methodology: {e:#}");
                    status_message = Some(format!("Warning: {e:#}"));
                }
            }
        }

        let mut state = Self {
            export_format: config.export_format,
            config,
            catalog: IndexCatalog::default(),
            load_failures: Vec::new(),
            selected: None,
            overlays: BTreeSet::new(),
            window: None,
            chart_mode: ChartMode::default(),
            aliases: AliasTable::default(),
            methodology,
            summary: Vec::new(),
            status_message,
        };
        state.reload();
        state
    }

    /// Re-read the dataset directory.
    pub fn reload(&mut self) {
        let dir = self.config.dataset_dir.clone();
        match load_directory(&dir, &self.config.load_options()) {
            Ok(load) => {
                self.load_failures = load
                    .failures
                    .into_iter()
                    .map(|(path, e)| (path, e.to_string()))
                    .collect();
                self.status_message = if self.load_failures.is_empty() {
                    None
                } else {
                    Some(format!(
                        "Warning: {} file(s) in {} could not be read",
                        self.load_failures.len(),
                        dir.display()
                    ))
                };
                self.set_catalog(load.catalog);
            }
            Err(e) => {
                if e.is_not_found() {
                    log::warn!("Dataset directory missing: {e}");
                } else {
                    log::error!("Failed to load dataset directory: {e}");
                }
                self.load_failures.clear();
                self.status_message = Some(format!("Warning: {e}"));
                self.set_catalog(IndexCatalog::default());
            }
        }
    }

    /// Point at another dataset directory and reload.
    pub fn set_dataset_dir(&mut self, dir: PathBuf) {
        self.config.dataset_dir = dir;
        self.reload();
    }

    /// Ingest a catalog, keeping the selection and overlays that still exist.
    pub fn set_catalog(&mut self, catalog: IndexCatalog) {
        let keep = self
            .selected
            .as_deref()
            .is_some_and(|name| catalog.contains(name));
        if !keep {
            self.selected = self
                .config
                .default_index
                .as_deref()
                .map(|label| self.aliases.resolve(label, catalog.names()))
                .filter(|key| catalog.contains(key))
                .or_else(|| catalog.names().next().map(str::to_string));
        }
        self.overlays.retain(|name| catalog.contains(name));

        self.summary = summary_rows(&self.aliases, &catalog);
        self.catalog = catalog;
    }

    pub fn select_index(&mut self, name: &str) {
        if self.catalog.contains(name) {
            self.overlays.remove(name);
            self.selected = Some(name.to_string());
        }
    }

    pub fn toggle_overlay(&mut self, name: &str) {
        if !self.overlays.remove(name)
            && self.catalog.contains(name)
            && self.selected.as_deref() != Some(name)
        {
            self.overlays.insert(name.to_string());
        }
    }

    /// Restrict the chart to `[start, end]`; the bounds are swapped if reversed.
    pub fn set_window(&mut self, start: NaiveDate, end: NaiveDate) {
        self.window = Some(if start <= end { (start, end) } else { (end, start) });
    }

    pub fn reset_window(&mut self) {
        self.window = None;
    }

    pub fn selected_series(&self) -> Option<&Series> {
        self.catalog.get(self.selected.as_deref()?)
    }

    fn windowed(&self, series: &Series) -> Series {
        match self.window {
            Some((start, end)) => window(series, start, end),
            None => series.clone(),
        }
    }

    /// The selected series clipped to the current window.
    pub fn visible_series(&self) -> Option<Series> {
        self.selected_series().map(|s| self.windowed(s))
    }

    /// Overlay series clipped to the current window.
    pub fn visible_overlays(&self) -> Vec<Series> {
        self.overlays
            .iter()
            .filter_map(|name| self.catalog.get(name))
            .map(|s| self.windowed(s))
            .collect()
    }

    pub fn methodology_view(&self) -> MethodologyView<'_> {
        match &self.selected {
            Some(name) => self.methodology.lookup(name),
            None => MethodologyView::NotAvailable,
        }
    }

    /// Default file name offered in the export dialog.
    pub fn export_file_name(&self, format: ExportFormat) -> String {
        let stem = self.selected.as_deref().unwrap_or("index").to_lowercase();
        format!("{stem}.{}", format.extension())
    }

    /// Write the displayed series to `path`.
    pub fn export_visible(&self, path: &Path, format: ExportFormat) -> Result<()> {
        let series = self.visible_series().context("no index selected")?;
        export_to_path(path, &series, format)
            .with_context(|| format!("exporting {} to {}", series.name, path.display()))
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;
    use crate::data::transform::PLACEHOLDER;

    fn ymd(y: i32, m: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, 1).unwrap()
    }

    fn dataset() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("nino34.txt"),
            "time\tNIN34\n2020-01-01\t0.5\n2020-02-01\t-0.4\n2020-03-01\t-99.99\n",
        )
        .unwrap();
        fs::write(dir.path().join("nao.txt"), "time\tNAO\n2020-01-01\t1.1\n").unwrap();
        fs::write(dir.path().join("broken.txt"), "").unwrap();
        dir
    }

    fn state_for(dir: &Path) -> AppState {
        AppState::new(DashboardConfig {
            dataset_dir: dir.to_path_buf(),
            default_index: Some("Niño 3.4".to_string()),
            ..Default::default()
        })
    }

    #[test]
    fn startup_selects_default_index_through_aliases() {
        let dir = dataset();
        let state = state_for(dir.path());

        assert_eq!(state.selected.as_deref(), Some("NIN34"));
        assert_eq!(state.catalog.len(), 2);
        assert_eq!(state.load_failures.len(), 1);
        assert!(state.status_message.as_deref().unwrap().contains("could not be read"));

        let row = state.summary.iter().find(|r| r.label == "Niño 3.4").unwrap();
        assert_eq!(row.latest.value_text(), "-0.40");
        let row = state.summary.iter().find(|r| r.label == "MJO").unwrap();
        assert_eq!(row.latest.value_text(), PLACEHOLDER);
    }

    #[test]
    fn missing_directory_is_a_warning() {
        let dir = TempDir::new().unwrap();
        let state = state_for(&dir.path().join("absent"));
        assert!(state.catalog.is_empty());
        assert!(state.selected.is_none());
        assert!(state.status_message.as_deref().unwrap().starts_with("Warning"));
        assert_eq!(state.methodology_view(), MethodologyView::NotAvailable);
    }

    #[test]
    fn selection_and_overlays() {
        let dir = dataset();
        let mut state = state_for(dir.path());

        state.toggle_overlay("NAO");
        assert!(state.overlays.contains("NAO"));
        state.toggle_overlay("NIN34");
        assert!(!state.overlays.contains("NIN34"));

        state.select_index("NAO");
        assert_eq!(state.selected.as_deref(), Some("NAO"));
        assert!(state.overlays.is_empty());

        state.select_index("UNKNOWN");
        assert_eq!(state.selected.as_deref(), Some("NAO"));
    }

    #[test]
    fn reload_keeps_selection_while_it_exists() {
        let dir = dataset();
        let mut state = state_for(dir.path());
        state.select_index("NAO");
        state.reload();
        assert_eq!(state.selected.as_deref(), Some("NAO"));

        fs::remove_file(dir.path().join("nao.txt")).unwrap();
        state.reload();
        assert_eq!(state.selected.as_deref(), Some("NIN34"));
    }

    #[test]
    fn window_limits_visible_series_and_export() {
        let dir = dataset();
        let mut state = state_for(dir.path());
        state.set_window(ymd(2020, 3), ymd(2020, 2));
        assert_eq!(state.window, Some((ymd(2020, 2), ymd(2020, 3))));

        let visible = state.visible_series().unwrap();
        assert_eq!(visible.len(), 2);

        let out = dir.path().join("out").join(state.export_file_name(ExportFormat::Tsv));
        fs::create_dir(dir.path().join("out")).unwrap();
        state.export_visible(&out, ExportFormat::Tsv).unwrap();
        assert_eq!(
            fs::read_to_string(&out).unwrap(),
            "time\tNIN34\n2020-02-01\t-0.4\n2020-03-01\t\n"
        );

        state.reset_window();
        assert_eq!(state.visible_series().unwrap().len(), 3);
    }

    #[test]
    fn methodology_follows_selection() {
        let dir = dataset();
        let state = state_for(dir.path());
        assert!(matches!(state.methodology_view(), MethodologyView::Available(_)));
    }
}
