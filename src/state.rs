use std::collections::HashMap;
use std::path::Path;

use eframe::egui::{self, TextureHandle};

use crate::audio::Signal;
use crate::color::heatmap_image;
use crate::data::model::{Column, Gender, Split};
use crate::error::RenderError;
use crate::pipeline::Analysis;
use crate::render::config::RenderConfig;
use crate::render::distribution::{
    balance_chart, feature_distributions, gender_distribution, scatter_chart, BalanceChart,
    DistributionChart, ScatterChart,
};
use crate::render::signal::{mfcc, spectrogram, spectrum, waveform, Heatmap, Spectrum};

/// Overall distributions shown side by side.
pub const OVERVIEW_FEATURES: [Column; 4] = [
    Column::Duration,
    Column::Speaking,
    Column::Pauses,
    Column::Syllables,
];

// ---------------------------------------------------------------------------
// Views
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum View {
    Summary,
    Balance,
    GenderDistribution,
    Overview,
    Scatter,
    Records,
    Waveform,
    Spectrum,
    Spectrogram,
    Mfcc,
}

impl View {
    pub const ALL: [View; 10] = [
        View::Summary,
        View::Balance,
        View::GenderDistribution,
        View::Overview,
        View::Scatter,
        View::Records,
        View::Waveform,
        View::Spectrum,
        View::Spectrogram,
        View::Mfcc,
    ];

    pub fn label(self) -> &'static str {
        match self {
            View::Summary => "Summary",
            View::Balance => "Gender balance",
            View::GenderDistribution => "Distribution by gender",
            View::Overview => "Feature distributions",
            View::Scatter => "Feature scatter",
            View::Records => "Records",
            View::Waveform => "Waveform",
            View::Spectrum => "Spectrum",
            View::Spectrogram => "Spectrogram",
            View::Mfcc => "MFCCs",
        }
    }

    pub fn is_signal(self) -> bool {
        matches!(
            self,
            View::Waveform | View::Spectrum | View::Spectrogram | View::Mfcc
        )
    }
}

// ---------------------------------------------------------------------------
// Chart cache
// ---------------------------------------------------------------------------

/// Charts derived from one exemplar clip.
pub struct SignalCharts {
    pub gender: Gender,
    pub waveform: Result<Vec<[f64; 2]>, String>,
    pub spectrum: Result<Spectrum, String>,
    pub spectrogram: Result<Heatmap, String>,
    pub mfcc: Result<Heatmap, String>,
}

impl SignalCharts {
    fn build(gender: Gender, signal: &Result<Signal, String>, cfg: &RenderConfig) -> Self {
        SignalCharts {
            gender,
            waveform: on_signal(signal, |s| {
                waveform(&s.samples, s.sample_rate, cfg.max_waveform_points)
            }),
            spectrum: on_signal(signal, |s| spectrum(&s.samples, s.sample_rate)),
            spectrogram: on_signal(signal, |s| spectrogram(&s.samples, s.sample_rate, cfg)),
            mfcc: on_signal(signal, |s| mfcc(&s.samples, s.sample_rate, cfg)),
        }
    }

    pub fn heatmap(&self, view: View) -> Option<&Result<Heatmap, String>> {
        match view {
            View::Spectrogram => Some(&self.spectrogram),
            View::Mfcc => Some(&self.mfcc),
            _ => None,
        }
    }
}

fn on_signal<T>(
    signal: &Result<Signal, String>,
    chart: impl FnOnce(&Signal) -> Result<T, RenderError>,
) -> Result<T, String> {
    match signal {
        Ok(s) => chart(s).map_err(|e| e.to_string()),
        Err(e) => Err(e.clone()),
    }
}

#[derive(Default)]
pub struct ChartCache {
    pub gender_dist: Option<(Column, Result<DistributionChart, RenderError>)>,
    pub overview: Option<Vec<(Column, Result<DistributionChart, RenderError>)>>,
    pub balance: Option<[BalanceChart; 2]>,
    pub scatter: Option<((Column, Column), Result<ScatterChart, RenderError>)>,
    pub signals: Option<Vec<SignalCharts>>,
    pub textures: HashMap<(View, Gender), TextureHandle>,
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    pub analysis: Analysis,
    pub render: RenderConfig,
    pub view: View,
    /// Feature shown by the per-gender distribution view.
    pub dist_feature: Column,
    pub scatter_x: Column,
    pub scatter_y: Column,
    pub charts: ChartCache,
    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    pub fn new(analysis: Analysis, render: RenderConfig) -> Self {
        Self {
            analysis,
            render,
            view: View::Summary,
            dist_feature: Column::FreqMean,
            scatter_x: Column::FreqMean,
            scatter_y: Column::FreqMax,
            charts: ChartCache::default(),
            status_message: None,
        }
    }

    /// Drop every cached chart, e.g. after a table or the style changed.
    pub fn invalidate(&mut self) {
        self.charts = ChartCache::default();
    }

    /// Replace a table and recompute the analysis.
    pub fn reload(&mut self, split: Split, path: &Path) {
        match self.analysis.reload(split, path) {
            Ok(()) => {
                log::info!("Reloaded {split} table from {}", path.display());
                self.status_message = None;
                self.invalidate();
            }
            Err(e) => {
                log::error!("Failed to load file: {e:#}");
                self.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }

    /// Build whatever the current view needs and is not cached yet.
    pub fn refresh_charts(&mut self) {
        let ds = &self.analysis.working;
        let cfg = &self.render;
        let charts = &mut self.charts;
        match self.view {
            View::GenderDistribution => {
                let feature = self.dist_feature;
                if charts.gender_dist.as_ref().map(|(c, _)| *c) != Some(feature) {
                    let chart =
                        gender_distribution(ds, Column::Gender, feature, feature.label(), cfg);
                    if let Err(e) = &chart {
                        log::warn!("{feature} distribution unavailable: {e}");
                    }
                    charts.gender_dist = Some((feature, chart));
                }
            }
            View::Overview => {
                charts
                    .overview
                    .get_or_insert_with(|| feature_distributions(ds, &OVERVIEW_FEATURES, cfg));
            }
            View::Balance => {
                let (train, test) = (&self.analysis.train, &self.analysis.test);
                charts
                    .balance
                    .get_or_insert_with(|| [balance_chart(train, cfg), balance_chart(test, cfg)]);
            }
            View::Scatter => {
                let axes = (self.scatter_x, self.scatter_y);
                if charts.scatter.as_ref().map(|(a, _)| *a) != Some(axes) {
                    charts.scatter = Some((axes, scatter_chart(ds, axes.0, axes.1, cfg)));
                }
            }
            v if v.is_signal() => {
                let exemplars = &self.analysis.exemplars;
                charts.signals.get_or_insert_with(|| {
                    exemplars
                        .iter()
                        .map(|e| SignalCharts::build(e.gender, &e.signal, cfg))
                        .collect()
                });
            }
            _ => {}
        }
    }

    /// Upload heatmap images for the current view.
    pub fn refresh_textures(&mut self, ctx: &egui::Context) {
        let view = self.view;
        let Some(signals) = &self.charts.signals else {
            return;
        };
        for charts in signals {
            let Some(Ok(heatmap)) = charts.heatmap(view) else {
                continue;
            };
            self.charts
                .textures
                .entry((view, charts.gender))
                .or_insert_with(|| {
                    let image = heatmap_image(&heatmap.values, heatmap.min, heatmap.max);
                    ctx.load_texture(
                        format!("{}-{}", view.label(), charts.gender),
                        image,
                        egui::TextureOptions::NEAREST,
                    )
                });
        }
    }
}
