use eframe::egui::{RichText, Ui};
use egui_extras::{Column as TableColumn, TableBuilder};

use crate::data::model::{Articulation, CellValue, Column, Utterance};
use crate::pipeline::Analysis;

/// Rows of the pruned table shown in the records view.
const HEAD_ROWS: usize = 50;
const ROW_HEIGHT: f32 = 18.0;

/// First rows of the pruned training table, then the rows the pruner removed.
pub fn records_view(ui: &mut Ui, analysis: &Analysis) {
    let head = analysis.working.head(HEAD_ROWS);
    ui.label(format!(
        "First {} of {} pruned training records",
        head.len(),
        analysis.working.len()
    ));
    ui.push_id("head_table", |ui: &mut Ui| {
        records_table(ui, head, 280.0);
    });

    ui.add_space(12.0);

    let invalid: Vec<Utterance> = analysis.train.invalid_records().cloned().collect();
    ui.label(RichText::new(format!("{} unrecognized records", invalid.len())).strong());
    if invalid.is_empty() {
        return;
    }
    ui.push_id("invalid_table", |ui: &mut Ui| {
        records_table(ui, &invalid, 200.0);
    });
}

fn records_table(ui: &mut Ui, rows: &[Utterance], max_height: f32) {
    TableBuilder::new(ui)
        .striped(true)
        .resizable(true)
        .max_scroll_height(max_height)
        .columns(TableColumn::auto().at_least(60.0), Column::REQUIRED.len())
        .header(20.0, |mut header| {
            for c in Column::REQUIRED {
                header.col(|ui| {
                    ui.strong(c.name());
                });
            }
        })
        .body(|body| {
            body.rows(ROW_HEIGHT, rows.len(), |mut row| {
                let record = &rows[row.index()];
                for c in Column::REQUIRED {
                    row.col(|ui| {
                        ui.label(cell_text(record, c));
                    });
                }
            });
        });
}

fn cell_text(record: &Utterance, column: Column) -> String {
    match column {
        Column::Artic => match record.articulation {
            Some(Articulation::Measured(v)) => format!("{v:.3}"),
            Some(Articulation::Unrecognized) => "-1 (unrecognized)".to_string(),
            None => String::new(),
        },
        Column::Gender => record.gender.code().to_string(),
        other => match record.value(other) {
            CellValue::Missing => String::new(),
            CellValue::Float(v) if v.fract() == 0.0 => format!("{v:.0}"),
            CellValue::Float(v) => format!("{v:.3}"),
            value => value.to_string(),
        },
    }
}
