use super::filter::Subset;

/// Placeholder shown when a metric is undefined over zero rows.
pub const NO_DATA: &str = "no data";

/// Round half away from zero to two decimals, without producing `-0.00`.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0 + 0.0
}

/// The three KPIs shown above the charts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Summary {
    /// Mean delay in minutes, `None` for an empty subset.
    pub avg_delay: Option<f64>,
    /// Share of delayed rows in percent, `None` for an empty subset.
    pub pct_delayed: Option<f64>,
    pub total_trips: usize,
}

impl Summary {
    pub fn compute(subset: &Subset<'_>) -> Self {
        let total_trips = subset.len();
        if total_trips == 0 {
            return Summary::default();
        }
        let n = total_trips as f64;
        let sum: f64 = subset.delays().sum();
        let delayed = subset.delays().filter(|d| *d > 0.0).count();

        Summary {
            avg_delay: Some(round2(sum / n)),
            pct_delayed: Some(round2(delayed as f64 / n * 100.0)),
            total_trips,
        }
    }

    pub fn avg_delay_label(&self) -> String {
        self.avg_delay
            .map(|v| format!("{v:.2}"))
            .unwrap_or_else(|| NO_DATA.to_string())
    }

    pub fn pct_delayed_label(&self) -> String {
        self.pct_delayed
            .map(|v| format!("{v:.2}%"))
            .unwrap_or_else(|| NO_DATA.to_string())
    }
}
