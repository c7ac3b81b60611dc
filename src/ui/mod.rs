//! egui rendering. Reads `AppState`, never computes aggregations itself.

pub mod panels;
pub mod plot;
pub mod table;
