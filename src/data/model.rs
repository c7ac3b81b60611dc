use std::collections::HashSet;
use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};

use super::error::LoadError;

// ---------------------------------------------------------------------------
// Column names of the tracking spreadsheet
// ---------------------------------------------------------------------------

pub mod columns {
    pub const ORIGIN: &str = "Origin_Location";
    pub const DESTINATION: &str = "Destination_Location";
    pub const MATERIAL: &str = "Material Shipped";
    pub const SUPPLIER: &str = "supplierNameCode";
    pub const VEHICLE_TYPE: &str = "vehicleType";
    pub const BOOKING_DATE: &str = "BookingID_Date";
    pub const PLANNED_ETA: &str = "Planned_ETA";
    pub const ACTUAL_ETA: &str = "actual_eta";

    /// Derived columns, appended after the source columns.
    pub const DELAY_MINS: &str = "delay_mins";
    pub const MONTH: &str = "Month";
    pub const ROUTE: &str = "Route";

    pub const REQUIRED: [&str; 8] = [
        ORIGIN,
        DESTINATION,
        MATERIAL,
        SUPPLIER,
        VEHICLE_TYPE,
        BOOKING_DATE,
        PLANNED_ETA,
        ACTUAL_ETA,
    ];
}

/// Text used for an absent month, matching what dataframe tools print.
pub const MISSING_MONTH: &str = "NaT";

/// Rendering of timestamps in previews and exports.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// ---------------------------------------------------------------------------
// CellValue – a single cell of the source sheet
// ---------------------------------------------------------------------------

/// A dynamically-typed cell value mirroring common spreadsheet cell types.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    DateTime(NaiveDateTime),
    Null,
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::String(s) => write!(f, "{s}"),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(v) => write!(f, "{v}"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::DateTime(dt) => write!(f, "{}", dt.format(TIMESTAMP_FORMAT)),
            CellValue::Null => Ok(()),
        }
    }
}

impl CellValue {
    /// Numeric view of the cell, used for correlations.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Float(v) => Some(*v),
            CellValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// Text view used for the categorical dimensions. Empty cells become "".
    pub fn as_text(&self) -> String {
        self.to_string()
    }
}

const DATETIME_FORMATS: [&str; 8] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%d-%m-%Y %H:%M",
    "%d/%m/%Y %H:%M",
    "%d/%m/%Y %H:%M:%S",
];

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%d-%m-%Y", "%d/%m/%Y"];

/// Parse a textual timestamp in one of the accepted layouts.
pub fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Interpret a cell of one of the timestamp columns.
///
/// Empty cells (and the `NaT` marker) are absent timestamps; anything else
/// that is not a date is a load error.
fn cell_timestamp(
    cell: &CellValue,
    column: &str,
    row: usize,
) -> Result<Option<NaiveDateTime>, LoadError> {
    match cell {
        CellValue::Null => Ok(None),
        CellValue::DateTime(dt) => Ok(Some(*dt)),
        CellValue::String(s) if s.trim().is_empty() || s.trim() == MISSING_MONTH => Ok(None),
        CellValue::String(s) => parse_timestamp(s).map(Some).ok_or_else(|| {
            LoadError::InvalidTimestamp {
                column: column.to_string(),
                row,
                value: s.clone(),
            }
        }),
        other => Err(LoadError::InvalidTimestamp {
            column: column.to_string(),
            row,
            value: other.to_string(),
        }),
    }
}

/// Minutes between planned and actual arrival; 0 when either is unknown.
pub fn delay_minutes(planned: Option<NaiveDateTime>, actual: Option<NaiveDateTime>) -> f64 {
    match (planned, actual) {
        (Some(p), Some(a)) => {
            let d = a - p;
            // subsec_nanos carries the sign of the whole delta.
            (d.num_seconds() as f64 + d.subsec_nanos() as f64 / 1e9) / 60.0
        }
        _ => 0.0,
    }
}

/// Year-month bucket of a booking date, e.g. `2024-03`.
pub fn month_of(booking: NaiveDateTime) -> String {
    booking.format("%Y-%m").to_string()
}

// ---------------------------------------------------------------------------
// Column metadata
// ---------------------------------------------------------------------------

/// Inferred type of a source column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    Integer,
    Float,
    Bool,
    DateTime,
    Mixed,
}

impl ColumnKind {
    /// Infer a column type the way a dataframe reader would: integral numbers
    /// stay integers only when no cell is empty, otherwise they widen to float.
    pub fn infer<'a>(cells: impl Iterator<Item = &'a CellValue>) -> Self {
        let mut has_null = false;
        let mut numeric = 0usize;
        let mut fractional = false;
        let mut texts = 0usize;
        let mut bools = 0usize;
        let mut dates = 0usize;

        for cell in cells {
            match cell {
                CellValue::Null => has_null = true,
                CellValue::Integer(_) => numeric += 1,
                CellValue::Float(v) => {
                    numeric += 1;
                    if v.fract() != 0.0 || !v.is_finite() {
                        fractional = true;
                    }
                }
                CellValue::String(_) => texts += 1,
                CellValue::Bool(_) => bools += 1,
                CellValue::DateTime(_) => dates += 1,
            }
        }

        match (numeric, texts, bools, dates) {
            (0, 0, 0, 0) if has_null => ColumnKind::Float,
            (0, 0, 0, 0) => ColumnKind::Text,
            (_, 0, 0, 0) if fractional || has_null => ColumnKind::Float,
            (_, 0, 0, 0) => ColumnKind::Integer,
            (0, _, 0, 0) => ColumnKind::Text,
            (0, 0, _, 0) => ColumnKind::Bool,
            (0, 0, 0, _) => ColumnKind::DateTime,
            _ => ColumnKind::Mixed,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub kind: ColumnKind,
}

/// A sheet as read from disk: header names and untyped rows.
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

// ---------------------------------------------------------------------------
// ShipmentRecord – one booking
// ---------------------------------------------------------------------------

/// One row of the tracking sheet plus its derived fields.
#[derive(Debug, Clone, PartialEq)]
pub struct ShipmentRecord {
    pub origin: String,
    pub destination: String,
    pub material: String,
    pub supplier: String,
    pub vehicle_type: String,
    pub booking_date: Option<NaiveDateTime>,
    pub planned_eta: Option<NaiveDateTime>,
    pub actual_eta: Option<NaiveDateTime>,
    /// Actual minus planned arrival in minutes, 0 when unknown.
    pub delay_mins: f64,
    /// `YYYY-MM` of the booking date.
    pub month: Option<String>,
    /// Every source cell in sheet order (same length as the dataset columns).
    pub cells: Vec<CellValue>,
}

impl ShipmentRecord {
    pub fn route(&self, separator: &str) -> String {
        format!("{}{separator}{}", self.origin, self.destination)
    }

    pub fn is_delayed(&self) -> bool {
        self.delay_mins > 0.0
    }
}

// ---------------------------------------------------------------------------
// FilterOptions – values offered by the multi-selects
// ---------------------------------------------------------------------------

/// Distinct values per filter dimension, in first-encounter order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterOptions {
    pub origins: Vec<String>,
    pub destinations: Vec<String>,
    pub materials: Vec<String>,
    pub routes: Vec<String>,
}

fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    values
        .filter(|v| seen.insert(*v))
        .map(str::to_string)
        .collect()
}

/// Remove source columns that carry a derived name (a reopened export); the
/// derived values are recomputed instead.
fn strip_derived(table: RawTable) -> RawTable {
    let is_derived = |name: &str| {
        let name = name.trim();
        name == columns::DELAY_MINS || name == columns::MONTH || name == columns::ROUTE
    };
    if !table.headers.iter().any(|h| is_derived(h)) {
        return table;
    }
    let keep: Vec<bool> = table.headers.iter().map(|h| !is_derived(h)).collect();
    let retain = |values: Vec<CellValue>| {
        values
            .into_iter()
            .zip(keep.iter().chain(std::iter::repeat(&true)))
            .filter_map(|(v, k)| k.then_some(v))
            .collect()
    };
    RawTable {
        headers: table
            .headers
            .iter()
            .zip(&keep)
            .filter(|(_, k)| **k)
            .map(|(h, _)| h.clone())
            .collect(),
        rows: table.rows.into_iter().map(retain).collect(),
    }
}

// ---------------------------------------------------------------------------
// ShipmentDataset – the complete loaded dataset
// ---------------------------------------------------------------------------

/// The full parsed dataset. Built once, never mutated afterwards.
#[derive(Debug, Clone)]
pub struct ShipmentDataset {
    /// Source columns in sheet order.
    pub columns: Vec<Column>,
    pub records: Vec<ShipmentRecord>,
    pub options: FilterOptions,
    /// Glyph placed between origin and destination in route labels.
    pub route_separator: String,
}

impl ShipmentDataset {
    /// Type the raw sheet, check required columns and compute the derived
    /// fields.
    pub fn from_table(table: RawTable, route_separator: &str) -> Result<Self, LoadError> {
        let RawTable { headers, rows } = strip_derived(table);
        let width = headers.len();

        let index_of = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim() == name)
                .ok_or_else(|| LoadError::MissingColumn(name.to_string()))
        };
        let origin_idx = index_of(columns::ORIGIN)?;
        let destination_idx = index_of(columns::DESTINATION)?;
        let material_idx = index_of(columns::MATERIAL)?;
        let supplier_idx = index_of(columns::SUPPLIER)?;
        let vehicle_idx = index_of(columns::VEHICLE_TYPE)?;
        let booking_idx = index_of(columns::BOOKING_DATE)?;
        let planned_idx = index_of(columns::PLANNED_ETA)?;
        let actual_idx = index_of(columns::ACTUAL_ETA)?;

        let mut records = Vec::with_capacity(rows.len());
        for (i, mut cells) in rows.into_iter().enumerate() {
            let row_no = i + 1;
            cells.resize(width, CellValue::Null);

            let booking_date = cell_timestamp(&cells[booking_idx], columns::BOOKING_DATE, row_no)?;
            let planned_eta = cell_timestamp(&cells[planned_idx], columns::PLANNED_ETA, row_no)?;
            let actual_eta = cell_timestamp(&cells[actual_idx], columns::ACTUAL_ETA, row_no)?;

            // Timestamp columns are stored typed so exports print them uniformly.
            for (idx, ts) in [
                (booking_idx, booking_date),
                (planned_idx, planned_eta),
                (actual_idx, actual_eta),
            ] {
                cells[idx] = ts.map_or(CellValue::Null, CellValue::DateTime);
            }

            records.push(ShipmentRecord {
                origin: cells[origin_idx].as_text(),
                destination: cells[destination_idx].as_text(),
                material: cells[material_idx].as_text(),
                supplier: cells[supplier_idx].as_text(),
                vehicle_type: cells[vehicle_idx].as_text(),
                booking_date,
                planned_eta,
                actual_eta,
                delay_mins: delay_minutes(planned_eta, actual_eta),
                month: booking_date.map(month_of),
                cells,
            });
        }

        let columns: Vec<Column> = headers
            .iter()
            .enumerate()
            .map(|(idx, name)| Column {
                name: name.clone(),
                kind: ColumnKind::infer(records.iter().map(|r| &r.cells[idx])),
            })
            .collect();

        let routes: Vec<String> = records.iter().map(|r| r.route(route_separator)).collect();
        let options = FilterOptions {
            origins: distinct(records.iter().map(|r| r.origin.as_str())),
            destinations: distinct(records.iter().map(|r| r.destination.as_str())),
            materials: distinct(records.iter().map(|r| r.material.as_str())),
            routes: distinct(routes.iter().map(String::as_str)),
        };

        Ok(ShipmentDataset {
            columns,
            records,
            options,
            route_separator: route_separator.to_string(),
        })
    }

    /// Number of shipments.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }
}

// ---------------------------------------------------------------------------
// Test fixtures shared by the data-layer tests
// ---------------------------------------------------------------------------

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub const SEP: &str = " ➝ ";

    pub fn ts(text: &str) -> CellValue {
        CellValue::DateTime(parse_timestamp(text).expect("valid fixture timestamp"))
    }

    pub fn text(s: &str) -> CellValue {
        CellValue::String(s.to_string())
    }

    pub fn headers() -> Vec<String> {
        let mut headers: Vec<String> = columns::REQUIRED.iter().map(|s| s.to_string()).collect();
        headers.push("distance_km".to_string());
        headers
    }

    /// One row: `delay` minutes late (None = no actual ETA).
    pub fn row(
        origin: &str,
        destination: &str,
        supplier: &str,
        vehicle: &str,
        booking: &str,
        delay: Option<i64>,
        distance: f64,
    ) -> Vec<CellValue> {
        let planned = parse_timestamp(booking).expect("valid fixture timestamp")
            + chrono::Duration::hours(24);
        let actual = delay.map(|m| CellValue::DateTime(planned + chrono::Duration::minutes(m)));
        vec![
            text(origin),
            text(destination),
            text("Steel"),
            text(supplier),
            text(vehicle),
            ts(booking),
            CellValue::DateTime(planned),
            actual.unwrap_or(CellValue::Null),
            CellValue::Float(distance),
        ]
    }

    /// Ten shipments, three of them late.
    pub fn sample_table() -> RawTable {
        RawTable {
            headers: headers(),
            rows: vec![
                row("Chennai", "Pune", "S1", "Truck", "2024-01-05 08:00:00", Some(30), 120.0),
                row("Chennai", "Pune", "S2", "Truck", "2024-01-09 08:00:00", Some(0), 121.5),
                row("Mumbai", "Delhi", "S1", "Van", "2024-02-01 10:00:00", None, 1400.0),
                row("Mumbai", "Pune", "S3", "Van", "2024-02-11 10:00:00", Some(-15), 150.0),
                row("Delhi", "Mumbai", "S2", "Trailer", "2024-03-02 12:00:00", Some(90), 1400.5),
                row("Delhi", "Pune", "S3", "Truck", "2024-03-15 12:00:00", None, 1450.0),
                row("Pune", "Chennai", "S1", "Truck", "2023-12-20 06:00:00", Some(-5), 1190.0),
                row("Pune", "Mumbai", "S2", "Van", "2023-11-30 06:00:00", Some(600), 150.5),
                row("Chennai", "Delhi", "S3", "Trailer", "2024-10-01 09:00:00", None, 2200.0),
                row("Mumbai", "Chennai", "S1", "Truck", "2024-09-01 09:00:00", Some(0), 1330.0),
            ],
        }
    }

    pub fn sample_dataset() -> ShipmentDataset {
        ShipmentDataset::from_table(sample_table(), SEP).expect("fixture dataset")
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn delay_is_zero_without_actual_eta() {
        let ds = sample_dataset();
        for rec in &ds.records {
            if rec.actual_eta.is_none() {
                assert_eq!(rec.delay_mins, 0.0);
            }
        }
        assert_eq!(ds.records[0].delay_mins, 30.0);
        assert_eq!(ds.records[3].delay_mins, -15.0);
    }

    #[test]
    fn month_is_year_month_of_booking() {
        let ds = sample_dataset();
        assert_eq!(ds.records[0].month.as_deref(), Some("2024-01"));
        assert_eq!(ds.records[7].month.as_deref(), Some("2023-11"));
    }

    #[test]
    fn options_keep_first_encounter_order() {
        let ds = sample_dataset();
        assert_eq!(ds.options.origins, vec!["Chennai", "Mumbai", "Delhi", "Pune"]);
        assert_eq!(ds.options.routes[0], "Chennai ➝ Pune");
        assert_eq!(ds.options.routes.len(), 9);
    }

    #[test]
    fn missing_required_column_is_an_error() {
        let mut table = sample_table();
        let idx = table
            .headers
            .iter()
            .position(|h| h == columns::VEHICLE_TYPE)
            .unwrap();
        table.headers[idx] = "vehicle".to_string();
        let err = ShipmentDataset::from_table(table, SEP).unwrap_err();
        assert!(matches!(err, LoadError::MissingColumn(c) if c == columns::VEHICLE_TYPE));
    }

    #[test]
    fn textual_timestamps_are_parsed_and_garbage_rejected() {
        let mut table = sample_table();
        table.rows[0][7] = text("2024-01-06 08:45:00");
        let ds = ShipmentDataset::from_table(table.clone(), SEP).unwrap();
        assert_eq!(ds.records[0].delay_mins, 45.0);
        assert!(matches!(ds.records[0].cells[7], CellValue::DateTime(_)));

        table.rows[1][6] = text("next tuesday");
        let err = ShipmentDataset::from_table(table, SEP).unwrap_err();
        assert!(matches!(
            err,
            LoadError::InvalidTimestamp { ref column, row: 2, .. } if column == columns::PLANNED_ETA
        ));
    }

    #[test]
    fn column_kinds_follow_dataframe_rules() {
        let ints = [CellValue::Float(1.0), CellValue::Integer(2)];
        assert_eq!(ColumnKind::infer(ints.iter()), ColumnKind::Integer);
        let with_gap = [CellValue::Integer(1), CellValue::Null];
        assert_eq!(ColumnKind::infer(with_gap.iter()), ColumnKind::Float);
        let frac = [CellValue::Float(1.5)];
        assert_eq!(ColumnKind::infer(frac.iter()), ColumnKind::Float);
        let mixed = [CellValue::Float(1.5), text("x")];
        assert_eq!(ColumnKind::infer(mixed.iter()), ColumnKind::Mixed);

        let ds = sample_dataset();
        let distance = ds.columns.iter().find(|c| c.name == "distance_km").unwrap();
        assert_eq!(distance.kind, ColumnKind::Float);
        let actual = ds.columns.iter().find(|c| c.name == columns::ACTUAL_ETA).unwrap();
        assert_eq!(actual.kind, ColumnKind::DateTime);
    }

    #[test]
    fn delay_keeps_sub_millisecond_precision() {
        let planned = parse_timestamp("2024-01-01 00:00:00");
        let actual = parse_timestamp("2024-01-01 00:01:30.000030");
        let delay = delay_minutes(planned, actual);
        assert!((delay - (90.000_03 / 60.0)).abs() < 1e-12);

        let early = parse_timestamp("2023-12-31 23:58:29.999970");
        let delay = delay_minutes(planned, early);
        assert!((delay + (90.000_03 / 60.0)).abs() < 1e-12);
    }

    #[test]
    fn derived_columns_in_the_source_are_replaced() {
        let mut table = sample_table();
        table.headers.push(columns::DELAY_MINS.to_string());
        table.headers.push(columns::MONTH.to_string());
        table.headers.push(columns::ROUTE.to_string());
        for row in &mut table.rows {
            row.push(CellValue::Float(12.5));
            row.push(text("1999-01"));
            row.push(text("stale route"));
        }
        let ds = ShipmentDataset::from_table(table, SEP).unwrap();
        assert_eq!(ds.column_names(), sample_dataset().column_names());
        assert_eq!(ds.records[0].delay_mins, 30.0);
        assert_eq!(ds.records[0].month.as_deref(), Some("2024-01"));
        assert_eq!(ds.records[0].cells.len(), ds.columns.len());
    }

    #[test]
    fn short_rows_are_padded_with_nulls() {
        let mut table = sample_table();
        table.rows[2].truncate(8);
        let ds = ShipmentDataset::from_table(table, SEP).unwrap();
        assert_eq!(ds.records[2].cells.len(), ds.columns.len());
        assert!(ds.records[2].cells[8].is_null());
    }
}
