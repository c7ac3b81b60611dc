mod app;
mod color;
mod config;
mod data;
mod state;
mod ui;

use std::path::Path;

use anyhow::{Context, Result};
use app::LogisticsDashboardApp;
use eframe::egui;
use state::AppState;

fn main() -> Result<()> {
    env_logger::init();

    let config = config::load_config(Path::new(config::CONFIG_FILE))?;

    // Load before any window exists: a bad file never yields a partial dashboard.
    let dataset = data::cache::load_once(&config.data_path, &config.route_separator)
        .inspect_err(|e| log::error!("Failed to load tracking data: {e:#}"))
        .with_context(|| format!("loading {}", config.data_path.display()))?;
    if dataset.is_empty() {
        log::warn!("{} contains no shipments", config.data_path.display());
    }

    let state = AppState::new(dataset, config);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 900.0])
            .with_min_inner_size([800.0, 500.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Logistics Performance Dashboard",
        options,
        Box::new(|_cc| Ok(Box::new(LogisticsDashboardApp::new(state)))),
    )
    .map_err(|e| anyhow::anyhow!("running dashboard window: {e}"))
}
