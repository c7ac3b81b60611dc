//! Chart data: pure aggregations of a filtered subset.
//!
//! Nothing here draws; `ui::plot` renders these structures.

use std::collections::HashMap;

use super::filter::Subset;
use super::model::{columns, ColumnKind, ShipmentRecord};

#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub label: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PieSlice {
    pub label: String,
    /// Sum of `delay_mins` for this supplier.
    pub value: f64,
    /// Fraction of the drawn pie, in `[0, 1]`.
    pub share: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PieChart {
    pub slices: Vec<PieSlice>,
    /// Suppliers whose summed delay is not positive and so has no share.
    pub dropped: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HistogramBin {
    pub start: f64,
    pub end: f64,
    pub count: usize,
}

impl HistogramBin {
    pub fn center(&self) -> f64 {
        (self.start + self.end) / 2.0
    }

    pub fn width(&self) -> f64 {
        self.end - self.start
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrendPoint {
    pub month: String,
    pub avg_delay: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoxStats {
    pub label: String,
    pub lower_whisker: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub upper_whisker: f64,
    pub outliers: Vec<f64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    /// Row-major, `values[i][j]` = r(columns[i], columns[j]).
    pub values: Vec<Vec<Option<f64>>>,
}

/// Knobs of the aggregations; taken from the dashboard configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartParams {
    pub top_n: usize,
    pub histogram_bins: usize,
    /// Only rows strictly below this delay enter the boxplot.
    pub boxplot_clip_mins: f64,
}

impl Default for ChartParams {
    fn default() -> Self {
        ChartParams {
            top_n: 10,
            histogram_bins: 50,
            boxplot_clip_mins: 500.0,
        }
    }
}

/// Every chart of the dashboard for one subset.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChartSet {
    pub delay_by_route: Vec<Bar>,
    pub delay_by_supplier: PieChart,
    pub delay_by_vehicle: Vec<Bar>,
    pub histogram: Vec<HistogramBin>,
    pub monthly_trend: Vec<TrendPoint>,
    pub supplier_boxplot: Vec<BoxStats>,
    pub correlation: CorrelationMatrix,
}

impl ChartSet {
    pub fn build(subset: &Subset<'_>, params: &ChartParams) -> Self {
        let sep = subset.dataset.route_separator.as_str();
        let delays: Vec<f64> = subset.delays().collect();

        ChartSet {
            delay_by_route: ranked_means(
                subset.records().map(|r| (r.route(sep), r.delay_mins)),
                params.top_n,
            ),
            delay_by_supplier: supplier_pie(subset.records()),
            delay_by_vehicle: ranked_means(
                subset.records().map(|r| (r.vehicle_type.clone(), r.delay_mins)),
                params.top_n,
            ),
            histogram: histogram(&delays, params.histogram_bins),
            monthly_trend: monthly_trend(subset.records()),
            supplier_boxplot: supplier_boxplot(subset.records(), params.boxplot_clip_mins),
            correlation: correlation_matrix(subset),
        }
    }
}

// ---------------------------------------------------------------------------
// Grouping
// ---------------------------------------------------------------------------

/// Group `(key, value)` pairs keeping first-encounter order of the keys.
fn group_in_order(pairs: impl Iterator<Item = (String, f64)>) -> Vec<(String, Vec<f64>)> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<(String, Vec<f64>)> = Vec::new();
    for (key, value) in pairs {
        match index.get(&key) {
            Some(&i) => groups[i].1.push(value),
            None => {
                index.insert(key.clone(), groups.len());
                groups.push((key, vec![value]));
            }
        }
    }
    groups
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Mean per key, sorted descending, first `top_n` kept.
///
/// The sort is stable, so equal means keep first-encounter order.
pub fn ranked_means(pairs: impl Iterator<Item = (String, f64)>, top_n: usize) -> Vec<Bar> {
    let mut bars: Vec<Bar> = group_in_order(pairs)
        .into_iter()
        .map(|(label, values)| Bar {
            value: mean(&values),
            label,
        })
        .collect();
    bars.sort_by(|a, b| b.value.total_cmp(&a.value));
    bars.truncate(top_n);
    bars
}

/// Sum of delay per supplier as pie shares.
pub fn supplier_pie<'a>(records: impl Iterator<Item = &'a ShipmentRecord>) -> PieChart {
    let groups = group_in_order(records.map(|r| (r.supplier.clone(), r.delay_mins)));
    let mut slices = Vec::new();
    let mut dropped = Vec::new();
    for (label, values) in groups {
        let value: f64 = values.iter().sum();
        if value > 0.0 {
            slices.push(PieSlice {
                label,
                value,
                share: 0.0,
            });
        } else {
            dropped.push(label);
        }
    }
    let total: f64 = slices.iter().map(|s| s.value).sum();
    for slice in &mut slices {
        slice.share = slice.value / total;
    }
    if !dropped.is_empty() {
        log::warn!(
            "{} supplier(s) with non-positive total delay left out of the pie",
            dropped.len()
        );
    }
    PieChart { slices, dropped }
}

// ---------------------------------------------------------------------------
// Histogram
// ---------------------------------------------------------------------------

/// `bins` equal-width bins spanning `[min, max]`; the last bin includes `max`.
pub fn histogram(values: &[f64], bins: usize) -> Vec<HistogramBin> {
    if values.is_empty() || bins == 0 {
        return Vec::new();
    }
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;

    if range.abs() < f64::EPSILON {
        return vec![HistogramBin {
            start: min - 0.5,
            end: min + 0.5,
            count: values.len(),
        }];
    }

    let width = range / bins as f64;
    let mut out: Vec<HistogramBin> = (0..bins)
        .map(|i| HistogramBin {
            start: min + i as f64 * width,
            end: if i + 1 == bins {
                max
            } else {
                min + (i + 1) as f64 * width
            },
            count: 0,
        })
        .collect();
    for &v in values {
        let idx = (((v - min) / width).floor() as usize).min(bins - 1);
        out[idx].count += 1;
    }
    out
}

// ---------------------------------------------------------------------------
// Monthly trend
// ---------------------------------------------------------------------------

/// Chronological key of a `YYYY-MM` label.
pub fn month_sort_key(month: &str) -> Option<(i32, u32)> {
    let (year, mon) = month.split_once('-')?;
    let year: i32 = year.trim().parse().ok()?;
    let mon: u32 = mon.trim().parse().ok()?;
    (1..=12).contains(&mon).then_some((year, mon))
}

/// Mean delay per booking month in calendar order. Rows without a month are
/// skipped; labels that do not parse as months go last, alphabetically.
pub fn monthly_trend<'a>(records: impl Iterator<Item = &'a ShipmentRecord>) -> Vec<TrendPoint> {
    let groups = group_in_order(records.filter_map(|r| r.month.clone().map(|m| (m, r.delay_mins))));
    let mut points: Vec<TrendPoint> = groups
        .into_iter()
        .map(|(month, values)| TrendPoint {
            avg_delay: mean(&values),
            month,
        })
        .collect();
    points.sort_by(|a, b| {
        let ka = month_sort_key(&a.month);
        let kb = month_sort_key(&b.month);
        (ka.is_none(), ka, &a.month).cmp(&(kb.is_none(), kb, &b.month))
    });
    points
}

// ---------------------------------------------------------------------------
// Boxplot
// ---------------------------------------------------------------------------

/// Linear-interpolation quantile of sorted data.
pub fn quantile(sorted: &[f64], p: f64) -> f64 {
    let pos = p * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

/// Five-number summary with 1.5×IQR whiskers.
pub fn box_stats(label: String, mut values: Vec<f64>) -> Option<BoxStats> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(f64::total_cmp);
    let q1 = quantile(&values, 0.25);
    let median = quantile(&values, 0.5);
    let q3 = quantile(&values, 0.75);
    let iqr = q3 - q1;
    let low_fence = q1 - 1.5 * iqr;
    let high_fence = q3 + 1.5 * iqr;

    let inside = || values.iter().copied().filter(|v| *v >= low_fence && *v <= high_fence);
    let lower_whisker = inside().fold(f64::INFINITY, f64::min).min(q1);
    let upper_whisker = inside().fold(f64::NEG_INFINITY, f64::max).max(q3);
    let outliers = values
        .iter()
        .copied()
        .filter(|v| *v < low_fence || *v > high_fence)
        .collect();

    Some(BoxStats {
        label,
        lower_whisker,
        q1,
        median,
        q3,
        upper_whisker,
        outliers,
    })
}

/// Delay distribution per supplier over rows below the clip value.
pub fn supplier_boxplot<'a>(
    records: impl Iterator<Item = &'a ShipmentRecord>,
    clip_mins: f64,
) -> Vec<BoxStats> {
    group_in_order(
        records
            .filter(|r| r.delay_mins < clip_mins)
            .map(|r| (r.supplier.clone(), r.delay_mins)),
    )
    .into_iter()
    .filter_map(|(label, values)| box_stats(label, values))
    .collect()
}

// ---------------------------------------------------------------------------
// Correlation
// ---------------------------------------------------------------------------

/// Pearson r over the pairs where both values are present.
pub fn pearson(xs: &[Option<f64>], ys: &[Option<f64>]) -> Option<f64> {
    let pairs: Vec<(f64, f64)> = xs
        .iter()
        .zip(ys)
        .filter_map(|(x, y)| Some(((*x)?, (*y)?)))
        .filter(|(x, y)| x.is_finite() && y.is_finite())
        .collect();
    if pairs.len() < 2 {
        return None;
    }
    let n = pairs.len() as f64;
    let mx = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let my = pairs.iter().map(|p| p.1).sum::<f64>() / n;
    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (x, y) in &pairs {
        sxy += (x - mx) * (y - my);
        sxx += (x - mx).powi(2);
        syy += (y - my).powi(2);
    }
    if sxx == 0.0 || syy == 0.0 {
        return None;
    }
    Some((sxy / (sxx.sqrt() * syy.sqrt())).clamp(-1.0, 1.0))
}

/// Correlation of every float-typed column (source floats plus `delay_mins`).
pub fn correlation_matrix(subset: &Subset<'_>) -> CorrelationMatrix {
    let mut names = Vec::new();
    let mut series: Vec<Vec<Option<f64>>> = Vec::new();

    for (idx, column) in subset.dataset.columns.iter().enumerate() {
        if column.kind != ColumnKind::Float {
            continue;
        }
        names.push(column.name.clone());
        series.push(subset.records().map(|r| r.cells[idx].as_f64()).collect());
    }
    names.push(columns::DELAY_MINS.to_string());
    series.push(subset.delays().map(Some).collect());

    let values = series
        .iter()
        .map(|x| series.iter().map(|y| pearson(x, y)).collect())
        .collect();

    CorrelationMatrix {
        columns: names,
        values,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::filter::{apply_filters, FilterSelection};
    use crate::data::model::fixtures::sample_dataset;

    fn pairs(items: &[(&str, f64)]) -> Vec<(String, f64)> {
        items.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn ranked_means_sorts_descending_with_stable_ties() {
        let bars = ranked_means(
            pairs(&[("b", 5.0), ("a", 10.0), ("c", 5.0), ("b", 5.0), ("d", 1.0)]).into_iter(),
            3,
        );
        let labels: Vec<&str> = bars.iter().map(|b| b.label.as_str()).collect();
        assert_eq!(labels, vec!["a", "b", "c"]);
        assert_eq!(bars[1].value, 5.0);
    }

    #[test]
    fn route_ranking_is_deterministic() {
        let ds = sample_dataset();
        let subset = apply_filters(&ds, &FilterSelection::default());
        let first = ChartSet::build(&subset, &ChartParams::default());
        let second = ChartSet::build(&subset, &ChartParams::default());
        assert_eq!(first.delay_by_route, second.delay_by_route);
        assert_eq!(first.delay_by_route[0].label, "Pune ➝ Mumbai");
        assert_eq!(first.delay_by_route[0].value, 600.0);
        assert_eq!(first.delay_by_route.len(), 9);
        // Chennai ➝ Pune averages (30 + 0) / 2.
        assert!(first
            .delay_by_route
            .iter()
            .any(|b| b.label == "Chennai ➝ Pune" && b.value == 15.0));
    }

    #[test]
    fn top_n_limits_bars() {
        let bars = ranked_means((0..25).map(|i| (format!("r{i}"), i as f64)), 10);
        assert_eq!(bars.len(), 10);
        assert_eq!(bars[0].label, "r24");
    }

    #[test]
    fn pie_uses_sum_of_delay() {
        let ds = sample_dataset();
        let subset = apply_filters(&ds, &FilterSelection::default());
        let pie = supplier_pie(subset.records());
        // S1: 30 + 0 - 5 + 0 = 25, S2: 0 + 90 + 600 = 690, S3: -15 + 0 + 0 = -15
        assert_eq!(pie.slices.len(), 2);
        assert_eq!(pie.slices[0].label, "S1");
        assert_eq!(pie.slices[0].value, 25.0);
        assert_eq!(pie.slices[1].value, 690.0);
        assert_eq!(pie.dropped, vec!["S3".to_string()]);
        let total_share: f64 = pie.slices.iter().map(|s| s.share).sum();
        assert!((total_share - 1.0).abs() < 1e-12);
    }

    #[test]
    fn histogram_spans_observed_range() {
        let values: Vec<f64> = (0..=100).map(f64::from).collect();
        let bins = histogram(&values, 50);
        assert_eq!(bins.len(), 50);
        assert_eq!(bins[0].start, 0.0);
        assert_eq!(bins[49].end, 100.0);
        assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), 101);
        // The maximum falls into the closed last bin.
        assert_eq!(bins[49].count, 3);
        assert!(bins.iter().all(|b| (b.width() - 2.0).abs() < 1e-9));
    }

    #[test]
    fn histogram_degenerate_and_empty() {
        assert!(histogram(&[], 50).is_empty());
        let bins = histogram(&[0.0, 0.0, 0.0], 50);
        assert_eq!(bins.len(), 1);
        assert_eq!(bins[0].count, 3);
        assert_eq!(bins[0].center(), 0.0);
    }

    #[test]
    fn monthly_trend_is_chronological() {
        let ds = sample_dataset();
        let subset = apply_filters(&ds, &FilterSelection::default());
        let trend = monthly_trend(subset.records());
        let months: Vec<&str> = trend.iter().map(|p| p.month.as_str()).collect();
        assert_eq!(
            months,
            vec!["2023-11", "2023-12", "2024-01", "2024-02", "2024-03", "2024-09", "2024-10"]
        );
        assert_eq!(trend[0].avg_delay, 600.0);
        assert_eq!(trend[2].avg_delay, 15.0);
    }

    #[test]
    fn month_keys_sort_numerically_not_textually() {
        assert!(month_sort_key("2024-2") < month_sort_key("2024-10"));
        assert_eq!(month_sort_key("2024-13"), None);
        assert_eq!(month_sort_key("NaT"), None);
    }

    #[test]
    fn boxplot_clips_and_finds_outliers() {
        let ds = sample_dataset();
        let subset = apply_filters(&ds, &FilterSelection::default());
        let boxes = supplier_boxplot(subset.records(), 500.0);
        let s2 = boxes.iter().find(|b| b.label == "S2").unwrap();
        // The 600 minute delay is clipped away, leaving [0, 90].
        assert_eq!(s2.q1, 22.5);
        assert_eq!(s2.median, 45.0);
        assert_eq!(s2.upper_whisker, 90.0);

        let stats = box_stats("x".into(), vec![1.0, 2.0, 3.0, 4.0, 100.0]).unwrap();
        assert_eq!(stats.median, 3.0);
        assert_eq!(stats.q1, 2.0);
        assert_eq!(stats.q3, 4.0);
        assert_eq!(stats.upper_whisker, 4.0);
        assert_eq!(stats.lower_whisker, 1.0);
        assert_eq!(stats.outliers, vec![100.0]);
    }

    #[test]
    fn pearson_handles_degenerate_input() {
        let x = [Some(1.0), Some(2.0), Some(3.0)];
        let y = [Some(2.0), Some(4.0), Some(6.0)];
        let z = [Some(3.0), Some(2.0), Some(1.0)];
        assert!((pearson(&x, &y).unwrap() - 1.0).abs() < 1e-12);
        assert!((pearson(&x, &z).unwrap() + 1.0).abs() < 1e-12);
        assert_eq!(pearson(&x, &[Some(1.0), Some(1.0), Some(1.0)]), None);
        assert_eq!(pearson(&[Some(1.0)], &[Some(2.0)]), None);
        // Missing values are skipped pairwise.
        let gappy = [Some(2.0), None, Some(6.0)];
        assert!((pearson(&x, &gappy).unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn correlation_covers_float_columns_and_delay() {
        let ds = sample_dataset();
        let subset = apply_filters(&ds, &FilterSelection::default());
        let corr = correlation_matrix(&subset);
        assert_eq!(corr.columns, vec!["distance_km", "delay_mins"]);
        assert_eq!(corr.values.len(), 2);
        assert!((corr.values[0][0].unwrap() - 1.0).abs() < 1e-12);
        assert_eq!(corr.values[0][1], corr.values[1][0]);
    }

    #[test]
    fn empty_subset_builds_empty_charts() {
        let ds = sample_dataset();
        let selection = FilterSelection {
            origins: ["Atlantis".to_string()].into_iter().collect(),
            ..Default::default()
        };
        let charts = ChartSet::build(&apply_filters(&ds, &selection), &ChartParams::default());
        assert!(charts.delay_by_route.is_empty());
        assert!(charts.delay_by_supplier.slices.is_empty());
        assert!(charts.histogram.is_empty());
        assert!(charts.monthly_trend.is_empty());
        assert!(charts.supplier_boxplot.is_empty());
        assert!(charts.correlation.values.iter().flatten().all(Option::is_none));
    }
}
