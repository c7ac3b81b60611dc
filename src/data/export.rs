use std::path::Path;

use anyhow::{Context, Result};

use super::filter::Subset;
use super::model::{columns, ShipmentDataset, ShipmentRecord, MISSING_MONTH};

/// MIME type of the download.
pub const CSV_MIME: &str = "text/csv";

/// Fixed name offered for the download.
pub const EXPORT_FILE_NAME: &str = "filtered_logistics_data.csv";

/// Header of the exported table: source columns, then the derived ones.
pub fn header(dataset: &ShipmentDataset, route_column: bool) -> Vec<String> {
    let mut names: Vec<String> = dataset.columns.iter().map(|c| c.name.clone()).collect();
    names.push(columns::DELAY_MINS.to_string());
    names.push(columns::MONTH.to_string());
    if route_column {
        names.push(columns::ROUTE.to_string());
    }
    names
}

/// One exported row, aligned with [`header`].
pub fn row_fields(dataset: &ShipmentDataset, record: &ShipmentRecord, route_column: bool) -> Vec<String> {
    let mut fields: Vec<String> = record.cells.iter().map(|c| c.to_string()).collect();
    fields.push(record.delay_mins.to_string());
    fields.push(
        record
            .month
            .clone()
            .unwrap_or_else(|| MISSING_MONTH.to_string()),
    );
    if route_column {
        fields.push(record.route(&dataset.route_separator));
    }
    fields
}

/// Serialize the whole subset as UTF-8 CSV with a header row.
pub fn to_csv(subset: &Subset<'_>) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(header(subset.dataset, subset.route_column))
        .context("writing CSV header")?;
    for (n, record) in subset.records().enumerate() {
        writer
            .write_record(row_fields(subset.dataset, record, subset.route_column))
            .with_context(|| format!("writing CSV row {n}"))?;
    }
    writer.into_inner().context("flushing CSV buffer")
}

/// Write a prepared export buffer to disk.
pub fn save(path: &Path, bytes: &[u8]) -> Result<()> {
    std::fs::write(path, bytes).with_context(|| format!("writing {}", path.display()))?;
    log::info!("Exported {} bytes to {}", bytes.len(), path.display());
    Ok(())
}
