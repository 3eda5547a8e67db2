use eframe::egui::{self, Color32, RichText, ScrollArea, Ui, Vec2};
use egui_plot::{Bar, BarChart, Legend, Line, Plot, PlotImage, PlotPoint, PlotPoints, Points};

use crate::data::model::Gender;
use crate::error::RenderError;
use crate::render::config::RenderConfig;
use crate::render::distribution::{BalanceChart, DistributionChart, ScatterChart};
use crate::render::signal::Heatmap;
use crate::state::{AppState, SignalCharts, View};
use crate::ui::table;

const CHART_HEIGHT: f32 = 320.0;

// ---------------------------------------------------------------------------
// Central panel
// ---------------------------------------------------------------------------

/// Render the chart(s) of the selected view.
pub fn central_panel(ui: &mut Ui, state: &mut AppState) {
    state.refresh_charts();
    state.refresh_textures(ui.ctx());
    let state = &*state;

    ui.heading(state.view.label());
    ui.separator();

    match state.view {
        View::Summary => summary_view(ui, state),
        View::Records => table::records_view(ui, &state.analysis),
        View::Balance => {
            if let Some(charts) = &state.charts.balance {
                ui.columns(2, |cols: &mut [Ui]| {
                    for (col, chart) in cols.iter_mut().zip(charts) {
                        balance_plot(col, chart);
                    }
                });
            }
        }
        View::GenderDistribution => {
            if let Some((feature, chart)) = &state.charts.gender_dist {
                chart_or_placeholder(ui, chart, |ui, c| {
                    distribution_plot(ui, &format!("dist_{feature}"), c, None)
                });
            }
        }
        View::Overview => {
            if let Some(charts) = &state.charts.overview {
                ui.columns(charts.len().max(1), |cols: &mut [Ui]| {
                    for (col, (feature, chart)) in cols.iter_mut().zip(charts) {
                        chart_or_placeholder(col, chart, |ui, c| {
                            distribution_plot(
                                ui,
                                &format!("overview_{feature}"),
                                c,
                                Some(CHART_HEIGHT),
                            )
                        });
                    }
                });
            }
        }
        View::Scatter => {
            if let Some((_, chart)) = &state.charts.scatter {
                chart_or_placeholder(ui, chart, scatter_plot);
            }
        }
        View::Waveform | View::Spectrum | View::Spectrogram | View::Mfcc => {
            if let Some(signals) = &state.charts.signals {
                ui.columns(2, |cols: &mut [Ui]| {
                    for (col, charts) in cols.iter_mut().zip(signals) {
                        col.strong(charts.gender.label());
                        signal_plot(col, state, charts);
                    }
                });
            }
        }
    }
}

fn placeholder(ui: &mut Ui, msg: &str) {
    ui.centered_and_justified(|ui: &mut Ui| {
        ui.label(RichText::new(msg).color(Color32::GRAY));
    });
}

fn chart_or_placeholder<T>(
    ui: &mut Ui,
    chart: &Result<T, RenderError>,
    draw: impl FnOnce(&mut Ui, &T),
) {
    match chart {
        Ok(c) => draw(ui, c),
        Err(e) => placeholder(ui, &format!("Chart unavailable: {e}")),
    }
}

// ---------------------------------------------------------------------------
// Table charts
// ---------------------------------------------------------------------------

fn summary_view(ui: &mut Ui, state: &AppState) {
    let analysis = &state.analysis;
    ScrollArea::vertical().show(ui, |ui: &mut Ui| {
        for line in analysis.summary.lines() {
            ui.label(line);
        }
        ui.add_space(12.0);
        ui.strong("Empty cells per column");
        ui.columns(2, |cols: &mut [Ui]| {
            let tables = [
                ("train", &analysis.missing_train),
                ("test", &analysis.missing_test),
            ];
            for (col, (name, missing)) in cols.iter_mut().zip(tables) {
                col.label(RichText::new(name).italics());
                egui::Grid::new(format!("missing_{name}"))
                    .striped(true)
                    .show(col, |ui: &mut Ui| {
                        for (column, n) in missing {
                            ui.label(column);
                            ui.label(n.to_string());
                            ui.end_row();
                        }
                    });
            }
        });
    });
}

fn balance_plot(ui: &mut Ui, chart: &BalanceChart) {
    ui.label(RichText::new(&chart.title).strong());
    ui.label(format!("{} records", chart.total()));
    Plot::new(format!("balance_{}", chart.title))
        .legend(Legend::default())
        .x_axis_label("Gender (0 = Female, 1 = Male)")
        .y_axis_label("Count")
        .height(CHART_HEIGHT)
        .show(ui, |plot_ui| {
            for &(gender, count, color) in &chart.bars {
                let bar = Bar::new(gender.code() as f64, count as f64)
                    .width(0.6)
                    .fill(color);
                plot_ui.bar_chart(BarChart::new(vec![bar]).name(gender.label()).color(color));
            }
        });
}

fn distribution_plot(ui: &mut Ui, id: &str, chart: &DistributionChart, height: Option<f32>) {
    let mut plot = Plot::new(id)
        .legend(Legend::default())
        .x_axis_label(chart.x_label.as_str())
        .y_axis_label("Density");
    if let Some(h) = height {
        plot = plot.height(h);
    }
    plot.show(ui, |plot_ui| {
        for s in &chart.series {
            let bars = s
                .bars
                .iter()
                .map(|&(x, density)| Bar::new(x, density).width(s.bin_width))
                .collect();
            plot_ui.bar_chart(
                BarChart::new(bars)
                    .name(&s.name)
                    .color(s.color.gamma_multiply(0.45)),
            );
            if !s.kde.is_empty() {
                plot_ui.line(
                    Line::new(PlotPoints::from(s.kde.clone()))
                        .name(&s.name)
                        .color(s.color)
                        .width(2.0),
                );
            }
        }
    });
}

fn scatter_plot(ui: &mut Ui, chart: &ScatterChart) {
    Plot::new("scatter")
        .legend(Legend::default())
        .x_axis_label(chart.x_label.as_str())
        .y_axis_label(chart.y_label.as_str())
        .show(ui, |plot_ui| {
            for (gender, color, points) in &chart.series {
                plot_ui.points(
                    Points::new(PlotPoints::from(points.clone()))
                        .radius(1.5)
                        .color(*color)
                        .name(gender.label()),
                );
            }
        });
}

// ---------------------------------------------------------------------------
// Signal charts
// ---------------------------------------------------------------------------

fn signal_plot(ui: &mut Ui, state: &AppState, charts: &SignalCharts) {
    let cfg = &state.render;
    let gender = charts.gender;
    let id = format!("{}_{gender}", state.view.label());
    match state.view {
        View::Waveform => chart_or_message(ui, &charts.waveform, |ui, points| {
            line_plot(ui, &id, points, "Time (s)", "Magnitude (Intensity)", gender, cfg)
        }),
        View::Spectrum => chart_or_message(ui, &charts.spectrum, |ui, spectrum| {
            line_plot(ui, &id, &spectrum.points, "Frequency (Hz)", "Magnitude", gender, cfg)
        }),
        View::Spectrogram | View::Mfcc => {
            let (y_label, unit) = if state.view == View::Spectrogram {
                ("Frequency (Hz)", "dB")
            } else {
                ("MFCCs", "")
            };
            let texture = state.charts.textures.get(&(state.view, gender));
            if let Some(heatmap) = charts.heatmap(state.view) {
                chart_or_message(ui, heatmap, |ui, heatmap| match texture {
                    Some(texture) => heatmap_plot(ui, &id, heatmap, texture, y_label, unit),
                    None => placeholder(ui, "Preparing image…"),
                });
            }
        }
        _ => {}
    }
}

fn chart_or_message<T>(ui: &mut Ui, chart: &Result<T, String>, draw: impl FnOnce(&mut Ui, &T)) {
    match chart {
        Ok(c) => draw(ui, c),
        Err(e) => placeholder(ui, &format!("Unavailable: {e}")),
    }
}

fn line_plot(
    ui: &mut Ui,
    id: &str,
    points: &[[f64; 2]],
    x_label: &str,
    y_label: &str,
    gender: Gender,
    cfg: &RenderConfig,
) {
    Plot::new(id)
        .x_axis_label(x_label)
        .y_axis_label(y_label)
        .height(CHART_HEIGHT)
        .show(ui, |plot_ui| {
            plot_ui.line(
                Line::new(PlotPoints::from(points.to_vec()))
                    .name(gender.label())
                    .color(cfg.group_color(gender))
                    .width(1.0),
            );
        });
}

fn heatmap_plot(
    ui: &mut Ui,
    id: &str,
    heatmap: &Heatmap,
    texture: &egui::TextureHandle,
    y_label: &str,
    unit: &str,
) {
    let (x0, x1) = heatmap.x_range;
    let (y0, y1) = heatmap.y_range;
    let center = PlotPoint::new((x0 + x1) / 2.0, (y0 + y1) / 2.0);
    let size = Vec2::new((x1 - x0) as f32, (y1 - y0) as f32);

    Plot::new(id)
        .x_axis_label("Time (s)")
        .y_axis_label(y_label)
        .height(CHART_HEIGHT)
        .show(ui, |plot_ui| {
            plot_ui.image(PlotImage::new(texture.id(), center, size));
        });
    ui.label(format!(
        "{} × {} frames, range {:.1} {unit} … {:.1} {unit}",
        heatmap.rows(),
        heatmap.frames(),
        heatmap.min,
        heatmap.max
    ));
}
