//! Dashboard configuration.
//!
//! Layers, later ones winning field by field:
//!
//! 1. **Built-in defaults** – [`DashboardConfig::default()`]
//! 2. **Config file** – `teleview.json` in the working directory, or `--config FILE`
//! 3. **Environment** – `TELEVIEW_DATASET_DIR`, `TELEVIEW_METHODOLOGY`
//! 4. **Command line** – positional dataset directory, `--methodology`

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::data::export::ExportFormat;
use crate::data::loader::{LoadOptions, DEFAULT_MISSING_SENTINELS};

pub const DEFAULT_CONFIG_FILE: &str = "teleview.json";

pub const ENV_DATASET_DIR: &str = "TELEVIEW_DATASET_DIR";
pub const ENV_METHODOLOGY: &str = "TELEVIEW_METHODOLOGY";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Directory scanned for index files.
    pub dataset_dir: PathBuf,
    /// Values treated as missing.
    pub missing_sentinels: Vec<f64>,
    /// Optional JSON file with methodology records layered over the built-in ones.
    pub methodology_file: Option<PathBuf>,
    /// Index selected at startup when present.
    pub default_index: Option<String>,
    pub export_format: ExportFormat,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            dataset_dir: PathBuf::from("dataset"),
            missing_sentinels: DEFAULT_MISSING_SENTINELS.to_vec(),
            methodology_file: None,
            default_index: None,
            export_format: ExportFormat::Csv,
        }
    }
}

impl DashboardConfig {
    /// Resolve defaults, the config file and the environment.
    ///
    /// An explicitly requested file must exist; the implicit `teleview.json`
    /// is skipped when absent.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut config = match explicit {
            Some(path) => Self::from_file(path)?,
            None => {
                let implicit = Path::new(DEFAULT_CONFIG_FILE);
                if implicit.is_file() {
                    Self::from_file(implicit)?
                } else {
                    Self::default()
                }
            }
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        let config: Self = serde_json::from_str(&text)
            .with_context(|| format!("parsing config file {}", path.display()))?;
        log::info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Apply environment overrides, reading variables through `get`.
    pub fn apply_env(&mut self, get: impl Fn(&str) -> Option<String>) {
        if let Some(dir) = get(ENV_DATASET_DIR).filter(|v| !v.is_empty()) {
            self.dataset_dir = PathBuf::from(dir);
        }
        if let Some(file) = get(ENV_METHODOLOGY).filter(|v| !v.is_empty()) {
            self.methodology_file = Some(PathBuf::from(file));
        }
    }

    /// Apply command-line overrides.
    pub fn apply_cli(&mut self, dataset_dir: Option<PathBuf>, methodology: Option<PathBuf>) {
        if let Some(dir) = dataset_dir {
            self.dataset_dir = dir;
        }
        if methodology.is_some() {
            self.methodology_file = methodology;
        }
    }

    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            missing_sentinels: self.missing_sentinels.clone(),
        }
    }
}
