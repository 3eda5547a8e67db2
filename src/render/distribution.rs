use eframe::egui::Color32;

use super::config::RenderConfig;
use crate::color::generate_palette;
use crate::data::aggregate::group_counts;
use crate::data::model::{Column, Dataset, Gender};
use crate::error::RenderError;

// ---------------------------------------------------------------------------
// Chart models
// ---------------------------------------------------------------------------

/// One density-normalised histogram plus its KDE curve.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub name: String,
    pub color: Color32,
    /// Number of values the series was built from.
    pub count: usize,
    pub bin_width: f64,
    /// `(bin centre, density)`; the bars integrate to 1.
    pub bars: Vec<(f64, f64)>,
    /// Gaussian KDE evaluated on a regular grid.  Empty when the values have
    /// no spread.
    pub kde: Vec<[f64; 2]>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DistributionChart {
    pub title: String,
    pub x_label: String,
    pub series: Vec<Series>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BalanceChart {
    pub title: String,
    /// `(gender, row count, colour)` in code order.
    pub bars: Vec<(Gender, usize, Color32)>,
}

impl BalanceChart {
    pub fn total(&self) -> usize {
        self.bars.iter().map(|(_, n, _)| n).sum()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScatterChart {
    pub x_label: String,
    pub y_label: String,
    pub series: Vec<(Gender, Color32, Vec<[f64; 2]>)>,
}

// ---------------------------------------------------------------------------
// Builders
// ---------------------------------------------------------------------------

/// Overlapping distributions of `target` for the two groups of the binary
/// column `group_by` (0 = Female, 1 = Male).
///
/// Fails when `target` is not numeric, or when either group has no usable
/// value.  Building a chart has no side effects.
pub fn gender_distribution(
    ds: &Dataset,
    group_by: Column,
    target: Column,
    x_label: &str,
    cfg: &RenderConfig,
) -> Result<DistributionChart, RenderError> {
    if !target.is_numeric() {
        return Err(RenderError::NoNumericData {
            column: target.name().to_string(),
        });
    }

    let groups: Vec<(Gender, Vec<f64>)> = Gender::ALL
        .into_iter()
        .map(|g| {
            let key = g.key();
            let values = ds
                .records
                .iter()
                .filter(|r| r.value(group_by) == key)
                .filter_map(|r| r.numeric(target))
                .collect();
            (g, values)
        })
        .collect();

    if groups.iter().all(|(_, v)| v.is_empty()) {
        return Err(RenderError::NoNumericData {
            column: target.name().to_string(),
        });
    }
    if let Some((g, _)) = groups.iter().find(|(_, v)| v.is_empty()) {
        return Err(RenderError::EmptyGroup {
            column: target.name().to_string(),
            group: g.label().to_string(),
        });
    }

    let (lo, hi) = pooled_range(groups.iter().flat_map(|(_, v)| v.iter().copied()));
    let series = groups
        .into_iter()
        .map(|(g, values)| {
            build_series(g.label().to_string(), cfg.group_color(g), &values, lo, hi, cfg)
        })
        .collect();

    Ok(DistributionChart {
        title: format!("{} by gender", target.label()),
        x_label: x_label.to_string(),
        series,
    })
}

/// Distribution of one feature over the whole table.
pub fn feature_distribution(
    ds: &Dataset,
    target: Column,
    color: Color32,
    cfg: &RenderConfig,
) -> Result<DistributionChart, RenderError> {
    let values = ds.column_values(target);
    if !target.is_numeric() || values.is_empty() {
        return Err(RenderError::NoNumericData {
            column: target.name().to_string(),
        });
    }
    let (lo, hi) = pooled_range(values.iter().copied());
    Ok(DistributionChart {
        title: target.label().to_string(),
        x_label: target.label().to_string(),
        series: vec![build_series(target.name().to_string(), color, &values, lo, hi, cfg)],
    })
}

/// One ungrouped distribution per column, each in its own colour.
pub fn feature_distributions(
    ds: &Dataset,
    targets: &[Column],
    cfg: &RenderConfig,
) -> Vec<(Column, Result<DistributionChart, RenderError>)> {
    let palette = generate_palette(targets.len());
    targets
        .iter()
        .zip(palette)
        .map(|(&t, color)| (t, feature_distribution(ds, t, color, cfg)))
        .collect()
}

/// Row count per gender (class balance).
pub fn balance_chart(ds: &Dataset, cfg: &RenderConfig) -> BalanceChart {
    let counts = group_counts(ds, Column::Gender, &Gender::keys());
    BalanceChart {
        title: format!(
            "{}-set - Count of Male vs Count of Female (by single record)",
            ds.split
        ),
        bars: Gender::ALL
            .into_iter()
            .map(|g| {
                let n = counts.get(&g.key()).copied().unwrap_or(0);
                (g, n, cfg.group_color(g))
            })
            .collect(),
    }
}

/// Per-gender point clouds of two features; rows missing either are skipped.
pub fn scatter_chart(
    ds: &Dataset,
    x: Column,
    y: Column,
    cfg: &RenderConfig,
) -> Result<ScatterChart, RenderError> {
    for c in [x, y] {
        if !c.is_numeric() {
            return Err(RenderError::NoNumericData {
                column: c.name().to_string(),
            });
        }
    }
    let series: Vec<_> = Gender::ALL
        .into_iter()
        .map(|g| {
            let points = ds
                .records
                .iter()
                .filter(|r| r.gender == g)
                .filter_map(|r| Some([r.numeric(x)?, r.numeric(y)?]))
                .collect::<Vec<_>>();
            (g, cfg.group_color(g), points)
        })
        .collect();
    if series.iter().all(|(_, _, p)| p.is_empty()) {
        return Err(RenderError::NoNumericData {
            column: format!("{x}/{y}"),
        });
    }
    Ok(ScatterChart {
        x_label: x.label().to_string(),
        y_label: y.label().to_string(),
        series,
    })
}

// ---------------------------------------------------------------------------
// Histogram / KDE helpers
// ---------------------------------------------------------------------------

fn pooled_range(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let (lo, hi) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if (hi - lo).abs() < f64::EPSILON {
        (lo - 0.5, hi + 0.5)
    } else {
        (lo, hi)
    }
}

fn build_series(
    name: String,
    color: Color32,
    values: &[f64],
    lo: f64,
    hi: f64,
    cfg: &RenderConfig,
) -> Series {
    let (bin_width, bars) = histogram(values, lo, hi, cfg.bins);
    Series {
        name,
        color,
        count: values.len(),
        bin_width,
        bars,
        kde: gaussian_kde(values, cfg.kde_points),
    }
}

/// Density histogram over `[lo, hi]` with `bins` equal-width bins.
pub fn histogram(values: &[f64], lo: f64, hi: f64, bins: usize) -> (f64, Vec<(f64, f64)>) {
    let bins = bins.max(1);
    let width = (hi - lo) / bins as f64;
    let mut counts = vec![0usize; bins];
    for &v in values {
        let idx = (((v - lo) / width).floor() as isize).clamp(0, bins as isize - 1) as usize;
        counts[idx] += 1;
    }
    let norm = values.len().max(1) as f64 * width;
    let bars = counts
        .iter()
        .enumerate()
        .map(|(i, &c)| (lo + (i as f64 + 0.5) * width, c as f64 / norm))
        .collect();
    (width, bars)
}

/// Gaussian KDE with Scott's bandwidth, evaluated on `points` positions
/// spanning three bandwidths beyond the data on each side.
pub fn gaussian_kde(values: &[f64], points: usize) -> Vec<[f64; 2]> {
    let n = values.len();
    if n < 2 || points < 2 {
        return Vec::new();
    }
    let mean = values.iter().sum::<f64>() / n as f64;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
    let std = var.sqrt();
    if std <= f64::EPSILON {
        return Vec::new();
    }
    let bw = std * (n as f64).powf(-0.2);
    let (lo, hi) = pooled_range(values.iter().copied());
    let (start, end) = (lo - 3.0 * bw, hi + 3.0 * bw);
    let step = (end - start) / (points - 1) as f64;
    let norm = 1.0 / (n as f64 * bw * (2.0 * std::f64::consts::PI).sqrt());

    (0..points)
        .map(|i| {
            let x = start + i as f64 * step;
            let density: f64 = values
                .iter()
                .map(|v| (-0.5 * ((x - v) / bw).powi(2)).exp())
                .sum();
            [x, density * norm]
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::tests::utterance;
    use crate::data::model::Split;

    fn two_groups() -> Dataset {
        let mut records = Vec::new();
        for i in 0..40 {
            let mut f = utterance(i, Gender::Female, 4.0 + (i % 5) as f64);
            f.freq_mean = Some(200.0 + (i % 11) as f64);
            let mut m = utterance(100 + i, Gender::Male, 4.5 + (i % 7) as f64);
            m.freq_mean = Some(120.0 + (i % 13) as f64);
            records.push(f);
            records.push(m);
        }
        Dataset::new(Split::Train, Vec::new(), records)
    }

    #[test]
    fn builds_one_series_per_gender() {
        let cfg = RenderConfig::default();
        let chart =
            gender_distribution(&two_groups(), Column::Gender, Column::FreqMean, "Hz", &cfg)
                .unwrap();
        assert_eq!(chart.series.len(), 2);
        assert_eq!(chart.series[0].name, "Female");
        assert_eq!(chart.series[1].name, "Male");
        assert_eq!(chart.series[0].count, 40);
        assert_eq!(chart.series[0].color, cfg.female_color);
        assert_eq!(chart.series[1].bars.len(), cfg.bins);
        assert_eq!(chart.series[1].kde.len(), cfg.kde_points);
    }

    #[test]
    fn histogram_integrates_to_one() {
        let values: Vec<f64> = (0..97).map(|i| (i as f64).sqrt()).collect();
        let (lo, hi) = pooled_range(values.iter().copied());
        let (width, bars) = histogram(&values, lo, hi, 12);
        let area: f64 = bars.iter().map(|(_, d)| d * width).sum();
        assert!((area - 1.0).abs() < 1e-9);
    }

    #[test]
    fn kde_integrates_to_about_one() {
        let values: Vec<f64> = (0..50).map(|i| (i % 10) as f64).collect();
        let kde = gaussian_kde(&values, 400);
        let step = kde[1][0] - kde[0][0];
        let area: f64 = kde.iter().map(|p| p[1] * step).sum();
        assert!((area - 1.0).abs() < 0.01, "area {area}");
    }

    #[test]
    fn empty_group_is_a_render_error() {
        let mut ds = two_groups();
        for r in ds.records.iter_mut().filter(|r| r.gender == Gender::Male) {
            r.freq_max = None;
        }
        let cfg = RenderConfig::default();
        let err =
            gender_distribution(&ds, Column::Gender, Column::FreqMax, "Hz", &cfg).unwrap_err();
        assert_eq!(
            err,
            RenderError::EmptyGroup {
                column: "freq_max".into(),
                group: "Male".into()
            }
        );
        // an independent chart on the same table is unaffected
        assert!(gender_distribution(&ds, Column::Gender, Column::FreqMean, "Hz", &cfg).is_ok());
        assert!(feature_distribution(&ds, Column::FreqMax, Color32::RED, &cfg).is_ok());
    }

    #[test]
    fn non_numeric_target_is_a_render_error() {
        let cfg = RenderConfig::default();
        let err = gender_distribution(&two_groups(), Column::Gender, Column::SpeakerId, "", &cfg)
            .unwrap_err();
        assert!(matches!(err, RenderError::NoNumericData { .. }));
    }

    #[test]
    fn balance_chart_counts_every_row() {
        let ds = two_groups();
        let chart = balance_chart(&ds, &RenderConfig::default());
        assert_eq!(chart.total(), ds.len());
        assert_eq!(chart.bars[0].1, 40);
    }

    #[test]
    fn scatter_skips_rows_missing_either_axis() {
        let mut ds = two_groups();
        ds.records[0].duration = None;
        let chart =
            scatter_chart(&ds, Column::Duration, Column::FreqMean, &RenderConfig::default())
                .unwrap();
        let female_points = &chart.series[0].2;
        assert_eq!(female_points.len(), 39);
    }

    #[test]
    fn feature_distributions_keep_going_after_a_failure() {
        let mut ds = two_groups();
        for r in &mut ds.records {
            r.pauses = None;
        }
        let charts = feature_distributions(
            &ds,
            &[Column::Duration, Column::Pauses, Column::Syllables],
            &RenderConfig::default(),
        );
        assert!(charts[0].1.is_ok());
        assert!(charts[1].1.is_err());
        assert!(charts[2].1.is_ok());
    }
}
