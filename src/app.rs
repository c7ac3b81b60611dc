use eframe::egui;

use crate::state::{AppState, Tab};
use crate::ui::{panels, plot};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct LogisticsDashboardApp {
    pub state: AppState,
}

impl LogisticsDashboardApp {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

impl eframe::App for LogisticsDashboardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: filters ----
        egui::SidePanel::left("filter_panel")
            .default_width(260.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Central panel: KPIs and tabs ----
        egui::CentralPanel::default().show(ctx, |ui| {
            panels::kpi_row(ui, &self.state);
            ui.separator();
            panels::tab_bar(ui, &mut self.state);
            ui.separator();

            let tab = self.state.tab;
            match tab {
                Tab::Visualizations => plot::visualizations_tab(ui, &self.state),
                Tab::Trends => plot::trends_tab(ui, &self.state),
                Tab::Download => panels::download_tab(ui, &mut self.state),
            }
        });
    }
}
