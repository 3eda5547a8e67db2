/// Chart models: pure functions from tables / signals to plottable data.
///
/// Nothing here touches egui state; `ui::plot` draws the models and a
/// failed model only blanks its own chart.

pub mod config;
pub mod distribution;
pub mod signal;
