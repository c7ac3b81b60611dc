use std::sync::Arc;

use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use crate::data::export::{CSV_MIME, EXPORT_FILE_NAME};
use crate::data::filter::{DelayType, Dimension};
use crate::state::{AppState, Tab};
use crate::ui::table;

// ---------------------------------------------------------------------------
// Left side panel – filter widgets
// ---------------------------------------------------------------------------

/// Render the left filter panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("🔍 Filter Data");
    ui.separator();

    // Own a handle so the option lists stay borrowed while state mutates.
    let dataset = Arc::clone(&state.dataset);

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            // ---- Multi-select per dimension (collapsible) ----
            for dim in Dimension::ALL {
                let options = dim.options(&dataset);
                let n_selected = state.selection.values(dim).len();
                let header_text = if n_selected == 0 {
                    format!("Select {}  (all)", dim.label())
                } else {
                    format!("Select {}  ({n_selected}/{})", dim.label(), options.len())
                };

                egui::CollapsingHeader::new(RichText::new(header_text).strong())
                    .id_salt(dim.label())
                    .default_open(false)
                    .show(ui, |ui: &mut Ui| {
                        if ui.small_button("Clear").clicked() {
                            state.clear(dim);
                        }

                        for value in options {
                            let mut checked = state.selection.values(dim).contains(value);
                            let label = if value.is_empty() {
                                "<empty>"
                            } else {
                                value.as_str()
                            };
                            if ui.checkbox(&mut checked, label).changed() {
                                state.toggle_filter_value(dim, value);
                            }
                        }
                    });
            }
            ui.separator();

            // ---- Delay type ----
            ui.strong("Delay Type");
            let mut delay_type = state.selection.delay_type;
            egui::ComboBox::from_id_salt("delay_type")
                .selected_text(delay_type.to_string())
                .show_ui(ui, |ui: &mut Ui| {
                    for option in DelayType::OPTIONS {
                        ui.selectable_value(&mut delay_type, option, option.to_string());
                    }
                });
            state.set_delay_type(delay_type);
        });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Export filtered CSV…").clicked() {
                save_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();
        ui.strong("🚚 Logistics Performance Dashboard");
        ui.separator();

        ui.label(format!(
            "{} shipments loaded, {} visible",
            state.dataset.len(),
            state.view.indices.len()
        ));

        if let Some(msg) = &state.status_message {
            ui.separator();
            let color = if msg.starts_with("Error") {
                Color32::RED
            } else {
                Color32::GRAY
            };
            ui.label(RichText::new(msg).color(color));
        }
    });
}

// ---------------------------------------------------------------------------
// KPIs and tabs
// ---------------------------------------------------------------------------

fn metric(ui: &mut Ui, label: &str, value: String) {
    ui.vertical(|ui: &mut Ui| {
        ui.label(RichText::new(label).weak());
        ui.label(RichText::new(value).size(28.0).strong());
    });
}

/// The three summary numbers above the charts.
pub fn kpi_row(ui: &mut Ui, state: &AppState) {
    let summary = &state.view.summary;
    ui.columns(3, |cols: &mut [Ui]| {
        metric(&mut cols[0], "Avg Delay (mins)", summary.avg_delay_label());
        metric(&mut cols[1], "% Delayed Trips", summary.pct_delayed_label());
        metric(&mut cols[2], "Total Trips", summary.total_trips.to_string());
    });
}

pub fn tab_bar(ui: &mut Ui, state: &mut AppState) {
    ui.horizontal(|ui: &mut Ui| {
        for tab in Tab::ALL {
            ui.selectable_value(&mut state.tab, tab, tab.label());
        }
    });
}

// ---------------------------------------------------------------------------
// Download tab
// ---------------------------------------------------------------------------

pub fn download_tab(ui: &mut Ui, state: &mut AppState) {
    ui.heading("📥 Export Filtered Data");
    ui.horizontal(|ui: &mut Ui| {
        if ui.button("Download data as CSV").clicked() {
            save_dialog(state);
        }
        ui.label(
            RichText::new(format!(
                "{EXPORT_FILE_NAME} · {} rows · {} bytes ({CSV_MIME})",
                state.view.summary.total_trips,
                state.view.export_csv.len()
            ))
            .weak(),
        );
    });
    ui.separator();
    table::preview_table(ui, state);
}

/// Ask where to save the export, pre-filled with the fixed file name.
pub fn save_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Save filtered data")
        .set_file_name(EXPORT_FILE_NAME)
        .add_filter("CSV", &["csv"])
        .save_file();

    if let Some(path) = file {
        state.export_to(&path);
    }
}
