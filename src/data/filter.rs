use std::collections::BTreeSet;
use std::fmt;

use super::model::{ShipmentDataset, ShipmentRecord};

// ---------------------------------------------------------------------------
// Filter selection: which values are chosen per dimension
// ---------------------------------------------------------------------------

/// The two options of the delay-type selector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DelayType {
    #[default]
    All,
    DelayedOnly,
}

impl DelayType {
    pub const OPTIONS: [DelayType; 2] = [DelayType::All, DelayType::DelayedOnly];
}

impl fmt::Display for DelayType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DelayType::All => write!(f, "All"),
            DelayType::DelayedOnly => write!(f, "Delayed Only"),
        }
    }
}

/// A multi-select filter dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
    Origin,
    Destination,
    Material,
    Route,
}

impl Dimension {
    pub const ALL: [Dimension; 4] = [
        Dimension::Origin,
        Dimension::Destination,
        Dimension::Material,
        Dimension::Route,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Dimension::Origin => "Origin Location",
            Dimension::Destination => "Destination Location",
            Dimension::Material => "Item Shipped",
            Dimension::Route => "Route",
        }
    }

    /// Values offered for this dimension by the dataset.
    pub fn options(self, dataset: &ShipmentDataset) -> &[String] {
        match self {
            Dimension::Origin => &dataset.options.origins,
            Dimension::Destination => &dataset.options.destinations,
            Dimension::Material => &dataset.options.materials,
            Dimension::Route => &dataset.options.routes,
        }
    }
}

/// User-chosen constraints. An empty set means "no restriction".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSelection {
    pub origins: BTreeSet<String>,
    pub destinations: BTreeSet<String>,
    pub materials: BTreeSet<String>,
    pub routes: BTreeSet<String>,
    pub delay_type: DelayType,
}

impl FilterSelection {
    pub fn values(&self, dim: Dimension) -> &BTreeSet<String> {
        match dim {
            Dimension::Origin => &self.origins,
            Dimension::Destination => &self.destinations,
            Dimension::Material => &self.materials,
            Dimension::Route => &self.routes,
        }
    }

    pub fn values_mut(&mut self, dim: Dimension) -> &mut BTreeSet<String> {
        match dim {
            Dimension::Origin => &mut self.origins,
            Dimension::Destination => &mut self.destinations,
            Dimension::Material => &mut self.materials,
            Dimension::Route => &mut self.routes,
        }
    }

    /// Whether the lazily computed `Route` column is part of the result.
    pub fn has_route_filter(&self) -> bool {
        !self.routes.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Filtered subset
// ---------------------------------------------------------------------------

/// Rows of the dataset that pass the current selection, in dataset order.
#[derive(Debug, Clone)]
pub struct Subset<'a> {
    pub dataset: &'a ShipmentDataset,
    pub indices: Vec<usize>,
    /// Set when a route filter produced the `Route` column.
    pub route_column: bool,
}

impl<'a> Subset<'a> {
    pub fn from_indices(dataset: &'a ShipmentDataset, indices: Vec<usize>, route_column: bool) -> Self {
        Subset {
            dataset,
            indices,
            route_column,
        }
    }

    pub fn records(&self) -> impl Iterator<Item = &'a ShipmentRecord> + '_ {
        let dataset = self.dataset;
        self.indices.iter().map(move |&i| &dataset.records[i])
    }

    pub fn delays(&self) -> impl Iterator<Item = f64> + '_ {
        let dataset: &ShipmentDataset = self.dataset;
        self.indices.iter().map(move |&i| dataset.records[i].delay_mins)
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

fn passes(selected: &BTreeSet<String>, value: &str) -> bool {
    selected.is_empty() || selected.contains(value)
}

/// Apply every active predicate (logical AND) to the full dataset.
///
/// A record passes a dimension when:
/// * nothing is selected for that dimension → passes (no constraint)
/// * its value for that dimension is in the selected set → passes
pub fn apply_filters<'a>(dataset: &'a ShipmentDataset, selection: &FilterSelection) -> Subset<'a> {
    let route_filter = selection.has_route_filter();
    let indices = dataset
        .records
        .iter()
        .enumerate()
        .filter(|(_, rec)| {
            passes(&selection.origins, &rec.origin)
                && passes(&selection.destinations, &rec.destination)
                && passes(&selection.materials, &rec.material)
                && (!route_filter
                    || selection
                        .routes
                        .contains(&rec.route(&dataset.route_separator)))
                && (selection.delay_type == DelayType::All || rec.is_delayed())
        })
        .map(|(i, _)| i)
        .collect();

    Subset::from_indices(dataset, indices, route_filter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::fixtures::sample_dataset;

    fn set(values: &[&str]) -> BTreeSet<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn empty_selection_keeps_everything() {
        let ds = sample_dataset();
        let subset = apply_filters(&ds, &FilterSelection::default());
        assert_eq!(subset.indices, (0..ds.len()).collect::<Vec<_>>());
        assert!(!subset.route_column);
    }

    #[test]
    fn delayed_only_keeps_positive_delays() {
        let ds = sample_dataset();
        let selection = FilterSelection {
            delay_type: DelayType::DelayedOnly,
            ..Default::default()
        };
        let subset = apply_filters(&ds, &selection);
        assert_eq!(subset.len(), 3);
        assert!(subset.delays().all(|d| d > 0.0));
    }

    #[test]
    fn dimensions_are_anded_not_ored() {
        let ds = sample_dataset();
        let selection = FilterSelection {
            origins: set(&["Chennai", "Mumbai"]),
            destinations: set(&["Mumbai"]),
            ..Default::default()
        };
        // Neither Chennai nor Mumbai ships to Mumbai in the fixture.
        assert!(apply_filters(&ds, &selection).is_empty());

        let selection = FilterSelection {
            origins: set(&["Chennai", "Mumbai"]),
            destinations: set(&["Pune"]),
            ..Default::default()
        };
        assert_eq!(apply_filters(&ds, &selection).indices, vec![0, 1, 3]);
    }

    #[test]
    fn route_filter_builds_route_column() {
        let ds = sample_dataset();
        let selection = FilterSelection {
            routes: set(&["Chennai ➝ Pune", "Delhi ➝ Mumbai"]),
            ..Default::default()
        };
        let subset = apply_filters(&ds, &selection);
        assert_eq!(subset.indices, vec![0, 1, 4]);
        assert!(subset.route_column);
    }

    #[test]
    fn filtering_is_an_idempotent_subset() {
        let ds = sample_dataset();
        let selection = FilterSelection {
            materials: set(&["Steel"]),
            origins: set(&["Delhi", "Pune"]),
            delay_type: DelayType::DelayedOnly,
            ..Default::default()
        };
        let once = apply_filters(&ds, &selection);
        let twice = apply_filters(&ds, &selection);
        assert_eq!(once.indices, twice.indices);
        assert!(once.len() <= ds.len());
        assert!(once.indices.windows(2).all(|w| w[0] < w[1]));
        for rec in once.records() {
            assert!(ds.records.contains(rec));
        }
    }

    #[test]
    fn unknown_value_yields_empty_subset() {
        let ds = sample_dataset();
        let selection = FilterSelection {
            materials: set(&["Bananas"]),
            ..Default::default()
        };
        assert!(apply_filters(&ds, &selection).is_empty());
    }
}
