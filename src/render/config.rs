use eframe::egui::Color32;

use crate::data::model::Gender;
use crate::error::ConfigError;

// ---------------------------------------------------------------------------
// RenderConfig – explicit chart styling and transform parameters
// ---------------------------------------------------------------------------

/// Styling and transform parameters shared by every chart builder.
///
/// Built once by the caller and passed down; chart code never reads global
/// style state, so two configs can render side by side.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderConfig {
    pub dark_mode: bool,
    pub female_color: Color32,
    pub male_color: Color32,
    /// Histogram bins for distribution charts.
    pub bins: usize,
    /// Evaluation points of a KDE curve.
    pub kde_points: usize,
    /// Samples per FFT frame for the spectrogram and MFCCs.
    pub n_fft: usize,
    pub hop_length: usize,
    pub n_mels: usize,
    pub n_mfcc: usize,
    /// Floor of dB-scaled heatmaps, relative to their peak.
    pub top_db: f32,
    /// Upper bound on points drawn for a waveform.
    pub max_waveform_points: usize,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            dark_mode: true,
            female_color: Color32::from_rgb(235, 110, 150),
            male_color: Color32::from_rgb(80, 150, 230),
            bins: 30,
            kde_points: 200,
            n_fft: 2048,
            hop_length: 512,
            n_mels: 128,
            n_mfcc: 12,
            top_db: 80.0,
            max_waveform_points: 4000,
        }
    }
}

impl RenderConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let fail = |msg: &str| Err(ConfigError::Invalid(msg.to_string()));
        if self.bins == 0 {
            return fail("bins must be positive");
        }
        if self.kde_points < 2 {
            return fail("kde_points must be at least 2");
        }
        if self.n_fft < 2 || self.hop_length == 0 {
            return fail("n_fft must be at least 2 and hop_length positive");
        }
        if self.n_mels == 0 || self.n_mfcc == 0 || self.n_mfcc > self.n_mels {
            return fail("need 0 < n_mfcc <= n_mels");
        }
        if self.max_waveform_points < 2 {
            return fail("max_waveform_points must be at least 2");
        }
        Ok(())
    }

    pub fn group_color(&self, gender: Gender) -> Color32 {
        match gender {
            Gender::Female => self.female_color,
            Gender::Male => self.male_color,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        assert!(RenderConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_unusable_sizes() {
        let bad = [
            RenderConfig { bins: 0, ..Default::default() },
            RenderConfig { hop_length: 0, ..Default::default() },
            RenderConfig { n_mfcc: 200, ..Default::default() },
            RenderConfig { kde_points: 1, ..Default::default() },
        ];
        for cfg in bad {
            assert!(matches!(cfg.validate(), Err(ConfigError::Invalid(_))));
        }
    }
}
