mod app;
mod color;
mod config;
mod data;
mod state;
mod ui;

use std::path::PathBuf;

use anyhow::Result;
use app::TeleviewApp;
use clap::Parser;
use config::DashboardConfig;
use eframe::egui;

/// Climate teleconnection index dashboard.
#[derive(Debug, Parser)]
#[command(name = "teleview", version, about)]
struct Cli {
    /// Directory holding one time-series file per index
    dataset_dir: Option<PathBuf>,

    /// JSON configuration file (defaults to ./teleview.json when present)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// JSON file with methodology records
    #[arg(long, value_name = "FILE")]
    methodology: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let mut config = DashboardConfig::load(cli.config.as_deref())?;
    config.apply_cli(cli.dataset_dir, cli.methodology);
    log::info!("Reading indices from {}", config.dataset_dir.display());

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 800.0])
            .with_min_inner_size([640.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Teleview – Climate Indices",
        options,
        Box::new(|cc| {
            // Install image loaders so egui can render the png logo.
            egui_extras::install_image_loaders(&cc.egui_ctx);
            Ok(Box::new(TeleviewApp::new(config)))
        }),
    )
    .map_err(|e| anyhow::anyhow!("UI terminated: {e}"))
}
