use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use crate::color::ColorMap;
use crate::config::DashboardConfig;
use crate::data::export;
use crate::data::filter::{DelayType, Dimension, FilterSelection};
use crate::data::model::ShipmentDataset;
use crate::data::pipeline::{recompute, DashboardView};

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Tab {
    #[default]
    Visualizations,
    Trends,
    Download,
}

impl Tab {
    pub const ALL: [Tab; 3] = [Tab::Visualizations, Tab::Trends, Tab::Download];

    pub fn label(self) -> &'static str {
        match self {
            Tab::Visualizations => "📊 Visualizations",
            Tab::Trends => "📈 Trends & Distributions",
            Tab::Download => "📥 Download",
        }
    }
}

/// One dashboard session: the shared dataset plus this session's filters.
pub struct AppState {
    /// Loaded once per process, never mutated.
    pub dataset: Arc<ShipmentDataset>,
    pub config: DashboardConfig,

    /// Per-dimension filter selections.
    pub selection: FilterSelection,

    /// Summary, charts and export of the current selection (recomputed on
    /// every change).
    pub view: DashboardView,

    /// Supplier colours shared by the pie and the boxplot.
    pub supplier_colors: ColorMap,

    pub tab: Tab,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    pub fn new(dataset: Arc<ShipmentDataset>, config: DashboardConfig) -> Self {
        let suppliers: Vec<String> = {
            let mut seen = HashSet::new();
            dataset
                .records
                .iter()
                .filter(|r| seen.insert(r.supplier.as_str()))
                .map(|r| r.supplier.clone())
                .collect()
        };

        let mut state = AppState {
            supplier_colors: ColorMap::new(&suppliers),
            dataset,
            config,
            selection: FilterSelection::default(),
            view: DashboardView::default(),
            tab: Tab::default(),
            status_message: None,
        };
        state.refilter();
        state
    }

    /// Recompute the view after a filter change.
    pub fn refilter(&mut self) {
        match recompute(&self.dataset, &self.selection, &self.config.chart_params()) {
            Ok(view) => self.view = view,
            Err(e) => {
                log::error!("Failed to recompute dashboard: {e:#}");
                self.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }

    /// Toggle a single value in a dimension's selection.
    pub fn toggle_filter_value(&mut self, dim: Dimension, value: &str) {
        let selected = self.selection.values_mut(dim);
        if !selected.remove(value) {
            selected.insert(value.to_string());
        }
        self.refilter();
    }

    /// Drop every selected value of a dimension (= no restriction).
    pub fn clear(&mut self, dim: Dimension) {
        self.selection.values_mut(dim).clear();
        self.refilter();
    }

    pub fn set_delay_type(&mut self, delay_type: DelayType) {
        if self.selection.delay_type != delay_type {
            self.selection.delay_type = delay_type;
            self.refilter();
        }
    }

    /// Write the current selection's CSV to `path`, reporting the outcome in
    /// the status line.
    pub fn export_to(&mut self, path: &Path) {
        match export::save(path, &self.view.export_csv) {
            Ok(()) => {
                self.status_message = Some(format!(
                    "Saved {} rows to {}",
                    self.view.summary.total_trips,
                    path.display()
                ))
            }
            Err(e) => {
                log::error!("Export failed: {e:#}");
                self.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::fixtures::sample_dataset;

    fn state() -> AppState {
        AppState::new(Arc::new(sample_dataset()), DashboardConfig::default())
    }

    #[test]
    fn starts_unfiltered() {
        let state = state();
        assert_eq!(state.view.summary.total_trips, 10);
        assert_eq!(state.tab, Tab::Visualizations);
    }

    #[test]
    fn toggling_twice_restores_view() {
        let mut state = state();
        state.toggle_filter_value(Dimension::Origin, "Delhi");
        assert_eq!(state.view.indices, vec![4, 5]);
        state.toggle_filter_value(Dimension::Origin, "Delhi");
        assert_eq!(state.view.summary.total_trips, 10);
    }

    #[test]
    fn clear_and_delay_type() {
        let mut state = state();
        state.toggle_filter_value(Dimension::Route, "Pune ➝ Mumbai");
        assert!(state.view.route_column);
        state.set_delay_type(DelayType::DelayedOnly);
        assert_eq!(state.view.indices, vec![7]);
        state.clear(Dimension::Route);
        assert!(!state.view.route_column);
        assert_eq!(state.view.indices, vec![0, 4, 7]);
    }

    #[test]
    fn export_writes_current_selection() {
        let mut state = state();
        state.set_delay_type(DelayType::DelayedOnly);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        state.export_to(&path);
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 4);
        assert!(state.status_message.unwrap().starts_with("Saved 3 rows"));
    }

    #[test]
    fn export_failure_is_reported_not_fatal() {
        let mut state = state();
        state.export_to(Path::new("/no/such/dir/out.csv"));
        assert!(state.status_message.unwrap().starts_with("Error"));
    }
}
