use eframe::egui::{RichText, ScrollArea, Ui};
use egui_extras::{Column, TableBuilder};

use crate::data::export;
use crate::data::summary::NO_DATA;
use crate::state::AppState;

/// First rows of the filtered subset, with the same columns as the export.
pub fn preview_table(ui: &mut Ui, state: &AppState) {
    let dataset = &state.dataset;
    let route_column = state.view.route_column;
    let rows = state.view.preview(state.config.preview_rows);

    if rows.is_empty() {
        ui.label(RichText::new(NO_DATA).italics().weak());
        return;
    }

    let header = export::header(dataset, route_column);
    ScrollArea::horizontal().show(ui, |ui: &mut Ui| {
        TableBuilder::new(ui)
            .striped(true)
            .resizable(true)
            .columns(Column::auto().at_least(60.0), header.len())
            .header(20.0, |mut head| {
                for name in &header {
                    head.col(|ui: &mut Ui| {
                        ui.strong(name);
                    });
                }
            })
            .body(|body| {
                body.rows(18.0, rows.len(), |mut row| {
                    let record = &dataset.records[rows[row.index()]];
                    for field in export::row_fields(dataset, record, route_column) {
                        row.col(|ui: &mut Ui| {
                            ui.label(field);
                        });
                    }
                });
            });
    });
}
