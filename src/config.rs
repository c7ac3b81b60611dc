//! Dashboard configuration.
//!
//! Every field has a default; an optional `dashboard.json` in the working
//! directory overrides any subset of them.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::data::charts::ChartParams;

/// File looked up in the working directory at startup.
pub const CONFIG_FILE: &str = "dashboard.json";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DashboardConfig {
    /// Tracking spreadsheet to load at startup.
    pub data_path: PathBuf,
    /// Placed between origin and destination in route labels.
    pub route_separator: String,
    /// Bars kept in the ranked bar charts.
    pub top_n: usize,
    pub histogram_bins: usize,
    /// Boxplot only shows delays strictly below this many minutes.
    pub boxplot_clip_mins: f64,
    pub preview_rows: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        DashboardConfig {
            data_path: PathBuf::from("Transportation and Logistics Tracking Dataset..xlsx"),
            route_separator: " ➝ ".to_string(),
            top_n: 10,
            histogram_bins: 50,
            boxplot_clip_mins: 500.0,
            preview_rows: 100,
        }
    }
}

impl DashboardConfig {
    pub fn chart_params(&self) -> ChartParams {
        ChartParams {
            top_n: self.top_n,
            histogram_bins: self.histogram_bins,
            boxplot_clip_mins: self.boxplot_clip_mins,
        }
    }
}

/// Read the configuration file, falling back to defaults when it is absent.
pub fn load_config(path: &Path) -> Result<DashboardConfig> {
    if !path.exists() {
        log::debug!("{} not found, using default configuration", path.display());
        return Ok(DashboardConfig::default());
    }
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let config: DashboardConfig = serde_json::from_str(&text)
        .with_context(|| format!("parsing {}", path.display()))?;
    log::info!("Loaded configuration from {}", path.display());
    Ok(config)
}
