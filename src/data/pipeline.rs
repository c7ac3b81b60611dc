use anyhow::Result;

use super::charts::{ChartParams, ChartSet};
use super::export;
use super::filter::{apply_filters, FilterSelection};
use super::model::ShipmentDataset;
use super::summary::Summary;

/// Everything the dashboard shows for one filter selection.
#[derive(Debug, Clone, Default)]
pub struct DashboardView {
    /// Dataset rows in the filtered subset, in dataset order.
    pub indices: Vec<usize>,
    pub route_column: bool,
    pub summary: Summary,
    pub charts: ChartSet,
    /// The CSV download for exactly this selection.
    pub export_csv: Vec<u8>,
}

impl DashboardView {
    /// Dataset rows of the preview table: the first `limit` filtered rows.
    pub fn preview(&self, limit: usize) -> &[usize] {
        &self.indices[..limit.min(self.indices.len())]
    }
}

/// Filter, summarize, chart and serialize in one synchronous pass.
pub fn recompute(
    dataset: &ShipmentDataset,
    selection: &FilterSelection,
    params: &ChartParams,
) -> Result<DashboardView> {
    let subset = apply_filters(dataset, selection);
    log::debug!(
        "recompute: {} of {} rows pass (delay type {}, {} route(s) selected)",
        subset.len(),
        dataset.len(),
        selection.delay_type,
        selection.routes.len()
    );

    let summary = Summary::compute(&subset);
    let charts = ChartSet::build(&subset, params);
    let export_csv = export::to_csv(&subset)?;

    Ok(DashboardView {
        indices: subset.indices,
        route_column: subset.route_column,
        summary,
        charts,
        export_csv,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::filter::DelayType;
    use crate::data::model::fixtures::{headers, row, sample_dataset, SEP};
    use crate::data::model::{RawTable, ShipmentDataset};

    #[test]
    fn view_reflects_selection() {
        let ds = sample_dataset();
        let mut selection = FilterSelection::default();
        let all = recompute(&ds, &selection, &ChartParams::default()).unwrap();
        assert_eq!(all.summary.total_trips, 10);

        selection.delay_type = DelayType::DelayedOnly;
        let delayed = recompute(&ds, &selection, &ChartParams::default()).unwrap();
        assert_eq!(delayed.indices, vec![0, 4, 7]);
        assert_eq!(delayed.summary.pct_delayed_label(), "100.00%");
        // Header plus three rows.
        assert_eq!(delayed.export_csv.iter().filter(|b| **b == b'\n').count(), 4);
        assert_ne!(all.export_csv, delayed.export_csv);
    }

    #[test]
    fn preview_is_first_rows_of_selection() {
        // 250 shipments, every other one late.
        let rows = (0..250)
            .map(|i| {
                let delay = if i % 2 == 0 { 10 } else { -10 };
                row("A", "B", "S1", "Truck", "2024-01-01 00:00:00", Some(delay), i as f64)
            })
            .collect();
        let ds = ShipmentDataset::from_table(RawTable { headers: headers(), rows }, SEP).unwrap();
        let selection = FilterSelection {
            delay_type: DelayType::DelayedOnly,
            ..Default::default()
        };
        let view = recompute(&ds, &selection, &ChartParams::default()).unwrap();
        assert_eq!(view.indices.len(), 125);

        let preview = view.preview(100);
        assert_eq!(preview.len(), 100);
        assert_eq!(preview, &view.indices[..100]);
        assert_eq!(preview.last(), Some(&198));
        assert!(preview.iter().all(|&i| ds.records[i].is_delayed()));

        assert_eq!(view.preview(1000).len(), 125);
        assert!(DashboardView::default().preview(100).is_empty());
    }
}
