use std::f32::consts::{FRAC_PI_2, TAU};

use eframe::egui::{
    pos2, vec2, Align2, Color32, FontId, Rect, RichText, ScrollArea, Sense, Shape, Stroke,
    Ui, Vec2,
};
use egui_plot::{
    Bar as PlotBar, BarChart, BoxElem, BoxPlot, BoxSpread, Legend, Line, Plot, PlotPoints, Points,
};

use crate::color::{diverging, ColorMap};
use crate::data::charts::{Bar, BoxStats, CorrelationMatrix, HistogramBin, PieChart, TrendPoint};
use crate::data::summary::NO_DATA;
use crate::state::AppState;

const CHART_HEIGHT: f32 = 280.0;
const PIE_SIZE: f32 = 260.0;
const HEAT_CELL: f32 = 64.0;
const HEAT_LABEL: f32 = 150.0;

// ---------------------------------------------------------------------------
// Tabs
// ---------------------------------------------------------------------------

/// Route, supplier and vehicle charts.
pub fn visualizations_tab(ui: &mut Ui, state: &AppState) {
    let charts = &state.view.charts;
    ScrollArea::vertical().show(ui, |ui: &mut Ui| {
        section(
            ui,
            "🔹 Delay by Route",
            "This bar chart shows average delay (in minutes) across different routes.",
        );
        ranked_bar_chart(ui, "delay_by_route", &charts.delay_by_route, "Avg Delay (mins)");

        section(
            ui,
            "🔹 Delay by Supplier",
            "This pie chart visualizes the share of total delay (in minutes) by supplier.",
        );
        pie_chart(ui, &charts.delay_by_supplier, &state.supplier_colors);

        section(
            ui,
            "🔹 Delay by Vehicle Type",
            "Bar chart showing average delay per vehicle type.",
        );
        ranked_bar_chart(ui, "delay_by_vehicle", &charts.delay_by_vehicle, "Avg Delay (mins)");
    });
}

/// Histogram, monthly trend, supplier boxplot and correlation heatmap.
pub fn trends_tab(ui: &mut Ui, state: &AppState) {
    let charts = &state.view.charts;
    ScrollArea::vertical().show(ui, |ui: &mut Ui| {
        section(
            ui,
            "📦 Delay Distribution Histogram",
            "This histogram shows the frequency distribution of delays in minutes.",
        );
        histogram(ui, &charts.histogram);

        section(
            ui,
            "📈 Monthly Trend of Average Delay",
            "This line chart shows how average delay changes over months.",
        );
        monthly_trend(ui, &charts.monthly_trend);

        section(
            ui,
            "📊 Boxplot of Delays by Supplier",
            "This boxplot helps detect variability in delay times across suppliers.",
        );
        supplier_boxplot(ui, &charts.supplier_boxplot, &state.supplier_colors);

        section(
            ui,
            "🔍 Correlation Heatmap",
            "Heatmap showing relationships between numerical features.",
        );
        correlation_heatmap(ui, &charts.correlation);
    });
}

fn section(ui: &mut Ui, title: &str, caption: &str) {
    ui.add_space(8.0);
    ui.heading(title);
    ui.label(caption);
}

fn empty_chart(ui: &mut Ui) {
    ui.label(RichText::new(NO_DATA).italics().weak());
}

/// Label of the category drawn at integer position `value`, blank elsewhere.
fn category_label(labels: &[String], value: f64) -> String {
    let idx = value.round();
    if (value - idx).abs() > 1e-6 || idx < 0.0 {
        return String::new();
    }
    labels.get(idx as usize).cloned().unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Bars
// ---------------------------------------------------------------------------

fn ranked_bar_chart(ui: &mut Ui, id: &str, bars: &[Bar], y_label: &str) {
    if bars.is_empty() {
        empty_chart(ui);
        return;
    }
    let labels: Vec<String> = bars.iter().map(|b| b.label.clone()).collect();
    let chart = BarChart::new(
        bars.iter()
            .enumerate()
            .map(|(i, b)| PlotBar::new(i as f64, b.value).name(&b.label).width(0.7))
            .collect(),
    )
    .color(Color32::LIGHT_BLUE)
    .name(y_label);

    Plot::new(id)
        .height(CHART_HEIGHT)
        .y_axis_label(y_label)
        .x_axis_formatter(move |mark, _range| category_label(&labels, mark.value))
        .allow_scroll(false)
        .show(ui, |plot_ui| plot_ui.bar_chart(chart));
}

fn histogram(ui: &mut Ui, bins: &[HistogramBin]) {
    if bins.is_empty() {
        empty_chart(ui);
        return;
    }
    let chart = BarChart::new(
        bins.iter()
            .map(|b| PlotBar::new(b.center(), b.count as f64).width(b.width()))
            .collect(),
    )
    .color(Color32::from_rgb(99, 110, 250))
    .name("count");

    Plot::new("delay_histogram")
        .height(CHART_HEIGHT)
        .x_axis_label("delay_mins")
        .y_axis_label("count")
        .allow_scroll(false)
        .show(ui, |plot_ui| plot_ui.bar_chart(chart));
}

// ---------------------------------------------------------------------------
// Pie
// ---------------------------------------------------------------------------

fn pie_chart(ui: &mut Ui, pie: &PieChart, colors: &ColorMap) {
    if pie.slices.is_empty() {
        empty_chart(ui);
        return;
    }
    ui.strong("Delay Distribution by Supplier");
    ui.horizontal(|ui: &mut Ui| {
        let (response, painter) = ui.allocate_painter(Vec2::splat(PIE_SIZE), Sense::hover());
        let center = response.rect.center();
        let radius = PIE_SIZE / 2.0 - 4.0;

        let mut angle = -FRAC_PI_2;
        for slice in &pie.slices {
            let sweep = slice.share as f32 * TAU;
            let color = colors.color_for(&slice.label);
            // Fan of thin triangles; each one is convex.
            let steps = ((sweep / 0.05).ceil() as usize).max(1);
            for s in 0..steps {
                let a0 = angle + sweep * s as f32 / steps as f32;
                let a1 = angle + sweep * (s + 1) as f32 / steps as f32;
                painter.add(Shape::convex_polygon(
                    vec![
                        center,
                        center + radius * Vec2::angled(a0),
                        center + radius * Vec2::angled(a1),
                    ],
                    color,
                    Stroke::NONE,
                ));
            }
            angle += sweep;
        }

        ui.vertical(|ui: &mut Ui| {
            for slice in &pie.slices {
                ui.horizontal(|ui: &mut Ui| {
                    swatch(ui, colors.color_for(&slice.label));
                    ui.label(format!(
                        "{}  {:.1}%  ({:.0} min)",
                        slice.label,
                        slice.share * 100.0,
                        slice.value
                    ));
                });
            }
            if !pie.dropped.is_empty() {
                ui.add_space(6.0);
                ui.label(
                    RichText::new(format!(
                        "Not shown (total delay ≤ 0): {}",
                        pie.dropped.join(", ")
                    ))
                    .weak(),
                );
            }
        });
    });
}

fn swatch(ui: &mut Ui, color: Color32) {
    let (rect, _) = ui.allocate_exact_size(Vec2::splat(12.0), Sense::hover());
    ui.painter().rect_filled(rect, 2.0, color);
}

// ---------------------------------------------------------------------------
// Monthly trend
// ---------------------------------------------------------------------------

fn monthly_trend(ui: &mut Ui, points: &[TrendPoint]) {
    if points.is_empty() {
        empty_chart(ui);
        return;
    }
    let labels: Vec<String> = points.iter().map(|p| p.month.clone()).collect();
    let coords: Vec<[f64; 2]> = points
        .iter()
        .enumerate()
        .map(|(i, p)| [i as f64, p.avg_delay])
        .collect();
    let line = Line::new(coords.clone())
        .name("delay_mins")
        .color(Color32::LIGHT_BLUE)
        .width(2.0);
    let markers = Points::new(coords)
        .radius(4.0)
        .color(Color32::LIGHT_BLUE);

    Plot::new("monthly_trend")
        .height(CHART_HEIGHT)
        .x_axis_label("Month")
        .y_axis_label("delay_mins")
        .x_axis_formatter(move |mark, _range| category_label(&labels, mark.value))
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            plot_ui.line(line);
            plot_ui.points(markers);
        });
}

// ---------------------------------------------------------------------------
// Boxplot
// ---------------------------------------------------------------------------

fn supplier_boxplot(ui: &mut Ui, boxes: &[BoxStats], colors: &ColorMap) {
    if boxes.is_empty() {
        empty_chart(ui);
        return;
    }
    let labels: Vec<String> = boxes.iter().map(|b| b.label.clone()).collect();

    Plot::new("supplier_boxplot")
        .height(CHART_HEIGHT)
        .legend(Legend::default())
        .x_axis_label("supplierNameCode")
        .y_axis_label("delay_mins")
        .x_axis_formatter(move |mark, _range| category_label(&labels, mark.value))
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            for (i, b) in boxes.iter().enumerate() {
                let x = i as f64;
                let color = colors.color_for(&b.label);
                let elem = BoxElem::new(
                    x,
                    BoxSpread::new(b.lower_whisker, b.q1, b.median, b.q3, b.upper_whisker),
                )
                .name(&b.label)
                .box_width(0.5)
                .whisker_width(0.3);
                plot_ui.box_plot(BoxPlot::new(vec![elem]).name(&b.label).color(color));

                if !b.outliers.is_empty() {
                    let outliers: PlotPoints = b.outliers.iter().map(|&v| [x, v]).collect();
                    plot_ui.points(Points::new(outliers).radius(3.0).color(color));
                }
            }
        });
}

// ---------------------------------------------------------------------------
// Correlation heatmap
// ---------------------------------------------------------------------------

fn correlation_heatmap(ui: &mut Ui, corr: &CorrelationMatrix) {
    let n = corr.columns.len();
    if corr.values.iter().flatten().all(Option::is_none) {
        empty_chart(ui);
        return;
    }

    let grid = HEAT_CELL * n as f32;
    let size = vec2(HEAT_LABEL + grid + 80.0, grid + HEAT_LABEL / 2.0);
    let (response, painter) = ui.allocate_painter(size, Sense::hover());
    let origin = response.rect.min;
    let text_color = ui.visuals().text_color();
    let font = FontId::proportional(12.0);

    for (i, row) in corr.values.iter().enumerate() {
        let y = origin.y + i as f32 * HEAT_CELL;
        painter.text(
            pos2(origin.x + HEAT_LABEL - 6.0, y + HEAT_CELL / 2.0),
            Align2::RIGHT_CENTER,
            &corr.columns[i],
            font.clone(),
            text_color,
        );
        for (j, value) in row.iter().enumerate() {
            let rect = Rect::from_min_size(
                pos2(origin.x + HEAT_LABEL + j as f32 * HEAT_CELL, y),
                Vec2::splat(HEAT_CELL),
            );
            let (fill, label) = match value {
                Some(v) => (diverging(*v), format!("{v:.2}")),
                None => (Color32::DARK_GRAY, "–".to_string()),
            };
            painter.rect_filled(rect.shrink(1.0), 0.0, fill);
            let ink = if value.is_some_and(|v| v.abs() > 0.6) {
                Color32::WHITE
            } else {
                Color32::BLACK
            };
            painter.text(rect.center(), Align2::CENTER_CENTER, label, font.clone(), ink);
        }
    }

    for (j, name) in corr.columns.iter().enumerate() {
        painter.text(
            pos2(
                origin.x + HEAT_LABEL + (j as f32 + 0.5) * HEAT_CELL,
                origin.y + grid + 4.0,
            ),
            Align2::CENTER_TOP,
            name,
            font.clone(),
            text_color,
        );
    }

    // Colour scale from -1 (bottom) to 1 (top).
    let bar_x = origin.x + HEAT_LABEL + grid + 16.0;
    let steps = 40;
    let step_h = grid / steps as f32;
    for k in 0..steps {
        let v = 1.0 - 2.0 * (k as f64 + 0.5) / steps as f64;
        let rect = Rect::from_min_size(
            pos2(bar_x, origin.y + k as f32 * step_h),
            vec2(16.0, step_h + 0.5),
        );
        painter.rect_filled(rect, 0.0, diverging(v));
    }
    for (v, y) in [(1.0, 0.0), (0.0, grid / 2.0), (-1.0, grid)] {
        painter.text(
            pos2(bar_x + 22.0, origin.y + y),
            Align2::LEFT_CENTER,
            format!("{v:.1}"),
            font.clone(),
            text_color,
        );
    }
}
