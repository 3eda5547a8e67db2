use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use crate::data::model::{Column, Split};
use crate::state::{AppState, View};

// ---------------------------------------------------------------------------
// Left side panel – view selection and chart options
// ---------------------------------------------------------------------------

/// Render the left panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Views");
    ui.separator();

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            ui.strong("Tables");
            for view in View::ALL.into_iter().filter(|v| !v.is_signal()) {
                view_button(ui, state, view);
            }
            ui.add_space(6.0);
            ui.strong("Exemplar clips");
            for view in View::ALL.into_iter().filter(|v| v.is_signal()) {
                view_button(ui, state, view);
            }
            ui.separator();

            match state.view {
                View::GenderDistribution => {
                    feature_combo(ui, "dist_feature", "Feature", &mut state.dist_feature);
                }
                View::Scatter => {
                    feature_combo(ui, "scatter_x", "X axis", &mut state.scatter_x);
                    feature_combo(ui, "scatter_y", "Y axis", &mut state.scatter_y);
                }
                View::Waveform | View::Spectrum | View::Spectrogram | View::Mfcc => {
                    for e in &state.analysis.exemplars {
                        let text = match &e.signal {
                            Ok(s) => format!(
                                "{}: {} ({:.1} s, {} Hz)",
                                e.gender,
                                e.path.display(),
                                s.duration_secs(),
                                s.sample_rate
                            ),
                            Err(_) => format!("{}: {} (unavailable)", e.gender, e.path.display()),
                        };
                        ui.label(text);
                    }
                }
                _ => {}
            }

            ui.separator();
            let summary = &state.analysis.summary;
            ui.small(format!(
                "{} speakers, {} of {} records removed",
                summary.speakers, summary.removed_rows, summary.train_rows
            ));
        });
}

fn view_button(ui: &mut Ui, state: &mut AppState, view: View) {
    if ui.selectable_label(state.view == view, view.label()).clicked() {
        state.view = view;
    }
}

fn feature_combo(ui: &mut Ui, id: &str, label: &str, column: &mut Column) {
    ui.horizontal(|ui: &mut Ui| {
        ui.label(label);
        egui::ComboBox::from_id_salt(id)
            .selected_text(column.name())
            .show_ui(ui, |ui: &mut Ui| {
                for c in Column::FEATURES {
                    ui.selectable_value(column, c, c.name());
                }
            });
    });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open training table…").clicked() {
                open_file_dialog(state, Split::Train);
                ui.close_menu();
            }
            if ui.button("Open test table…").clicked() {
                open_file_dialog(state, Split::Test);
                ui.close_menu();
            }
        });

        ui.separator();

        let analysis = &state.analysis;
        ui.label(format!(
            "train: {} records ({} after pruning), test: {} records",
            analysis.train.len(),
            analysis.working.len(),
            analysis.test.len()
        ));

        ui.separator();

        if ui
            .selectable_label(state.render.dark_mode, "Dark mode")
            .clicked()
        {
            state.render.dark_mode = !state.render.dark_mode;
        }

        if let Some(msg) = &state.status_message {
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState, split: Split) {
    let file = rfd::FileDialog::new()
        .set_title(format!("Open {split} feature table"))
        .add_filter("Supported files", &["csv", "parquet", "pq"])
        .add_filter("CSV", &["csv"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file();

    if let Some(path) = file {
        state.reload(split, &path);
    }
}
