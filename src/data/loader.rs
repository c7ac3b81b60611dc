use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{
    Array, AsArray, BooleanArray, Date32Array, Float32Array, Float64Array, Int32Array,
    Int64Array, StringArray, TimestampMicrosecondArray, TimestampMillisecondArray,
    TimestampNanosecondArray, TimestampSecondArray,
};
use arrow::datatypes::{DataType, TimeUnit};
use calamine::{open_workbook_auto, Data, DataType as _, Reader};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

use super::error::LoadError;
use super::model::{parse_timestamp, CellValue, RawTable, ShipmentDataset};

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a tracking dataset from a file and derive its computed fields.
///
/// Supported formats (dispatch by extension):
/// * `.xlsx` / `.xlsm` / `.xlsb` / `.xls` / `.ods` – first worksheet
/// * `.csv`     – header row followed by records
/// * `.parquet` – one column per field, timestamps as Arrow timestamps
pub fn load_file(path: &Path, route_separator: &str) -> Result<ShipmentDataset> {
    let table = read_table(path)?;
    let dataset = ShipmentDataset::from_table(table, route_separator)
        .with_context(|| format!("building dataset from {}", path.display()))?;
    log::info!(
        "Loaded {} shipments from {} with columns {:?}",
        dataset.len(),
        path.display(),
        dataset.column_names()
    );
    Ok(dataset)
}

/// Read the raw (untyped) table without deriving anything.
pub fn read_table(path: &Path) -> Result<RawTable> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => load_workbook(path),
        "csv" => load_csv(path),
        "parquet" | "pq" => load_parquet(path),
        other => Err(LoadError::UnsupportedExtension(other.to_string()).into()),
    }
}

// ---------------------------------------------------------------------------
// Spreadsheet loader
// ---------------------------------------------------------------------------

/// First worksheet only. Row 1 is the header; fully empty rows are skipped.
fn load_workbook(path: &Path) -> Result<RawTable> {
    let mut workbook = open_workbook_auto(path)
        .with_context(|| format!("opening workbook {}", path.display()))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or(LoadError::NoSheets)?
        .context("reading first worksheet")?;

    let mut rows = range.rows();
    let header_row = rows.next().ok_or(LoadError::EmptySheet)?;
    let headers: Vec<String> = header_row.iter().map(|c| c.to_string()).collect();

    let rows = rows
        .map(|row| row.iter().map(workbook_cell).collect::<Vec<_>>())
        .filter(|cells| !cells.iter().all(CellValue::is_null))
        .collect();

    Ok(RawTable { headers, rows })
}

fn workbook_cell(cell: &Data) -> CellValue {
    match cell {
        Data::Int(i) => CellValue::Integer(*i),
        Data::Float(f) => CellValue::Float(*f),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::String(s) => text_cell(s),
        Data::DateTime(dt) => cell
            .as_datetime()
            .map(CellValue::DateTime)
            .unwrap_or(CellValue::Float(dt.as_f64())),
        Data::DateTimeIso(s) => parse_timestamp(s)
            .map(CellValue::DateTime)
            .unwrap_or_else(|| CellValue::String(s.clone())),
        Data::DurationIso(s) => CellValue::String(s.clone()),
        // Error cells (#N/A, #REF!, ...) read as missing values.
        _ => CellValue::Null,
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row with column names, one shipment per record.
/// Cell types are guessed per value.
fn load_csv(path: &Path) -> Result<RawTable> {
    let mut reader = csv::Reader::from_path(path).context("opening CSV")?;
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut rows = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        rows.push(record.iter().map(guess_cell_type).collect());
    }

    Ok(RawTable { headers, rows })
}

fn guess_cell_type(s: &str) -> CellValue {
    if s.trim().is_empty() {
        return CellValue::Null;
    }
    if let Ok(i) = s.parse::<i64>() {
        return CellValue::Integer(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        return CellValue::Float(f);
    }
    if s == "true" || s == "false" {
        return CellValue::Bool(s == "true");
    }
    if let Some(dt) = parse_timestamp(s) {
        return CellValue::DateTime(dt);
    }
    CellValue::String(s.to_string())
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file with one column per field.
///
/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`); datetime columns arrive as Arrow
/// timestamps or dates.
fn load_parquet(path: &Path) -> Result<RawTable> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let headers: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let reader = builder.build().context("building parquet reader")?;

    let mut rows = Vec::new();
    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        for row in 0..batch.num_rows() {
            let cells = batch
                .columns()
                .iter()
                .enumerate()
                .map(|(col_idx, col)| {
                    arrow_cell(col, row)
                        .with_context(|| format!("row {row}, column '{}'", headers[col_idx]))
                })
                .collect::<Result<Vec<_>>>()?;
            rows.push(cells);
        }
    }

    Ok(RawTable { headers, rows })
}

// -- Arrow helpers --

fn downcast<'a, T: 'static>(col: &'a Arc<dyn Array>) -> Result<&'a T> {
    col.as_any()
        .downcast_ref::<T>()
        .with_context(|| format!("unexpected array layout for {:?}", col.data_type()))
}

fn from_epoch(secs: i64, nanos: u32) -> Result<NaiveDateTime> {
    DateTime::from_timestamp(secs, nanos)
        .map(|dt| dt.naive_utc())
        .context("timestamp out of range")
}

/// Extract a single cell from an Arrow column at a given row.
fn arrow_cell(col: &Arc<dyn Array>, row: usize) -> Result<CellValue> {
    if col.is_null(row) {
        return Ok(CellValue::Null);
    }
    let value = match col.data_type() {
        DataType::Utf8 => {
            let s = downcast::<StringArray>(col)?.value(row);
            text_cell(s)
        }
        DataType::LargeUtf8 => text_cell(col.as_string::<i64>().value(row)),
        DataType::Int32 => CellValue::Integer(downcast::<Int32Array>(col)?.value(row) as i64),
        DataType::Int64 => CellValue::Integer(downcast::<Int64Array>(col)?.value(row)),
        DataType::Float32 => CellValue::Float(downcast::<Float32Array>(col)?.value(row) as f64),
        DataType::Float64 => CellValue::Float(downcast::<Float64Array>(col)?.value(row)),
        DataType::Boolean => CellValue::Bool(downcast::<BooleanArray>(col)?.value(row)),
        DataType::Date32 => {
            let days = downcast::<Date32Array>(col)?.value(row);
            let date = NaiveDate::from_ymd_opt(1970, 1, 1)
                .and_then(|epoch| epoch.checked_add_signed(chrono::Duration::days(days as i64)))
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .context("date out of range")?;
            CellValue::DateTime(date)
        }
        DataType::Timestamp(unit, _) => {
            let dt = match unit {
                TimeUnit::Second => from_epoch(downcast::<TimestampSecondArray>(col)?.value(row), 0)?,
                TimeUnit::Millisecond => {
                    let v = downcast::<TimestampMillisecondArray>(col)?.value(row);
                    from_epoch(v.div_euclid(1_000), (v.rem_euclid(1_000) * 1_000_000) as u32)?
                }
                TimeUnit::Microsecond => {
                    let v = downcast::<TimestampMicrosecondArray>(col)?.value(row);
                    from_epoch(v.div_euclid(1_000_000), (v.rem_euclid(1_000_000) * 1_000) as u32)?
                }
                TimeUnit::Nanosecond => {
                    let v = downcast::<TimestampNanosecondArray>(col)?.value(row);
                    from_epoch(v.div_euclid(1_000_000_000), v.rem_euclid(1_000_000_000) as u32)?
                }
            };
            CellValue::DateTime(dt)
        }
        other => CellValue::String(format!("{other:?}")),
    };
    Ok(value)
}

/// Text cells from every reader: whitespace-only text is a missing value.
fn text_cell(s: &str) -> CellValue {
    if s.trim().is_empty() {
        CellValue::Null
    } else {
        CellValue::String(s.to_string())
    }
}
