use ndarray::Array2;
use rustdct::DctPlanner;
use rustfft::{num_complex::Complex, FftPlanner};

use super::config::RenderConfig;
use crate::error::RenderError;

// ---------------------------------------------------------------------------
// Chart models
// ---------------------------------------------------------------------------

/// Magnitude spectrum, lower half only.
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrum {
    pub points: Vec<[f64; 2]>,
}

/// A matrix drawn as an image: rows are the y axis (row 0 at the bottom),
/// columns the time axis.
#[derive(Debug, Clone, PartialEq)]
pub struct Heatmap {
    pub values: Array2<f32>,
    /// Plot extent of the image: `(x_min, x_max)` in seconds.
    pub x_range: (f64, f64),
    pub y_range: (f64, f64),
    pub min: f32,
    pub max: f32,
}

impl Heatmap {
    fn new(values: Array2<f32>, x_range: (f64, f64), y_range: (f64, f64)) -> Self {
        let (min, max) = values
            .iter()
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            });
        Heatmap {
            values,
            x_range,
            y_range,
            min,
            max,
        }
    }

    pub fn rows(&self) -> usize {
        self.values.nrows()
    }

    pub fn frames(&self) -> usize {
        self.values.ncols()
    }
}

fn check_input(samples: &[f32], sample_rate: u32) -> Result<(), RenderError> {
    if sample_rate == 0 {
        return Err(RenderError::InvalidSampleRate);
    }
    if samples.is_empty() {
        return Err(RenderError::EmptySignal);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Time domain
// ---------------------------------------------------------------------------

/// `(seconds, amplitude)` points.  Long signals are reduced to per-bucket
/// min/max pairs so the envelope survives decimation.
pub fn waveform(
    samples: &[f32],
    sample_rate: u32,
    max_points: usize,
) -> Result<Vec<[f64; 2]>, RenderError> {
    check_input(samples, sample_rate)?;
    let sr = sample_rate as f64;
    if samples.len() <= max_points {
        return Ok(samples
            .iter()
            .enumerate()
            .map(|(i, &s)| [i as f64 / sr, s as f64])
            .collect());
    }

    let buckets = (max_points / 2).max(1);
    let bucket_len = samples.len().div_ceil(buckets);
    let mut points = Vec::with_capacity(buckets * 2);
    for (b, chunk) in samples.chunks(bucket_len).enumerate() {
        let start = b * bucket_len;
        let (mut lo_i, mut hi_i) = (0, 0);
        for (i, &s) in chunk.iter().enumerate() {
            if s < chunk[lo_i] {
                lo_i = i;
            }
            if s > chunk[hi_i] {
                hi_i = i;
            }
        }
        let (first, second) = if lo_i <= hi_i { (lo_i, hi_i) } else { (hi_i, lo_i) };
        for i in [first, second] {
            points.push([(start + i) as f64 / sr, chunk[i] as f64]);
        }
    }
    Ok(points)
}

// ---------------------------------------------------------------------------
// Frequency domain
// ---------------------------------------------------------------------------

/// DFT magnitude of the whole signal against frequency.
///
/// The frequency axis spans `[0, sample_rate]` evenly over the `n` bins; the
/// spectrum of a real signal is symmetric, so only the first `n / 2` points
/// are returned.
pub fn spectrum(samples: &[f32], sample_rate: u32) -> Result<Spectrum, RenderError> {
    check_input(samples, sample_rate)?;
    let n = samples.len();
    let mut buf: Vec<Complex<f32>> = samples.iter().map(|&s| Complex::new(s, 0.0)).collect();
    FftPlanner::<f32>::new().plan_fft_forward(n).process(&mut buf);

    let step = if n > 1 {
        sample_rate as f64 / (n - 1) as f64
    } else {
        0.0
    };
    let points = buf
        .iter()
        .take(n / 2)
        .enumerate()
        .map(|(i, c)| [i as f64 * step, c.norm() as f64])
        .collect();
    Ok(Spectrum { points })
}

// ---------------------------------------------------------------------------
// Time–frequency domain
// ---------------------------------------------------------------------------

/// Periodic Hann window.
fn hann(n: usize) -> Vec<f32> {
    (0..n)
        .map(|i| 0.5 - 0.5 * (2.0 * std::f32::consts::PI * i as f32 / n as f32).cos())
        .collect()
}

/// Mirror `samples` by `pad` on both sides without repeating the edge
/// sample (numpy's `reflect` mode).  Signals shorter than the padding are
/// reflected back and forth.
fn reflect_pad(samples: &[f32], pad: usize) -> Vec<f32> {
    let n = samples.len();
    if n <= 1 {
        return vec![samples.first().copied().unwrap_or(0.0); n + 2 * pad];
    }
    let period = 2 * (n - 1) as isize;
    (0..n + 2 * pad)
        .map(|j| {
            let m = (j as isize - pad as isize).rem_euclid(period) as usize;
            samples[if m < n { m } else { period as usize - m }]
        })
        .collect()
}

/// STFT magnitude, `(n_fft / 2 + 1) × frames`.
///
/// Frames are centred: the signal is reflect-padded by `n_fft / 2` on both
/// sides, giving `1 + len / hop` frames.
pub fn stft_magnitude(samples: &[f32], n_fft: usize, hop: usize) -> Array2<f32> {
    let padded = reflect_pad(samples, n_fft / 2);

    let frames = 1 + (padded.len() - n_fft) / hop;
    let bins = n_fft / 2 + 1;
    let window = hann(n_fft);
    let fft = FftPlanner::<f32>::new().plan_fft_forward(n_fft);

    let mut out = Array2::<f32>::zeros((bins, frames));
    let mut buf = vec![Complex::new(0.0f32, 0.0); n_fft];
    for f in 0..frames {
        let start = f * hop;
        for (i, slot) in buf.iter_mut().enumerate() {
            *slot = Complex::new(padded[start + i] * window[i], 0.0);
        }
        fft.process(&mut buf);
        for (b, c) in buf.iter().take(bins).enumerate() {
            out[[b, f]] = c.norm();
        }
    }
    out
}

/// Convert to decibels (`mult · log10`) with an amplitude floor of `amin`,
/// clipped to `top_db` below the peak.
fn to_db(values: &mut Array2<f32>, mult: f32, amin: f32, top_db: f32) {
    values.mapv_inplace(|v| mult * v.max(amin).log10());
    let peak = values.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let floor = peak - top_db;
    values.mapv_inplace(|v| v.max(floor));
}

/// Log-amplitude spectrogram: rows are frequency bins up to Nyquist.
pub fn spectrogram(
    samples: &[f32],
    sample_rate: u32,
    cfg: &RenderConfig,
) -> Result<Heatmap, RenderError> {
    check_input(samples, sample_rate)?;
    let mut mag = stft_magnitude(samples, cfg.n_fft, cfg.hop_length);
    to_db(&mut mag, 20.0, 1e-5, cfg.top_db);
    let duration = samples.len() as f64 / sample_rate as f64;
    Ok(Heatmap::new(
        mag,
        (0.0, duration),
        (0.0, sample_rate as f64 / 2.0),
    ))
}

// ---------------------------------------------------------------------------
// Cepstral coefficients
// ---------------------------------------------------------------------------

/// Slaney-style triangular mel filters, `n_mels × (n_fft / 2 + 1)`,
/// area-normalised, spanning 0 Hz to Nyquist.
pub fn mel_filterbank(sample_rate: u32, n_fft: usize, n_mels: usize) -> Array2<f32> {
    mel_spec::mel::mel(sample_rate as f64, n_fft, n_mels, None, None, false, true)
        .mapv(|w| w as f32)
}

/// Orthonormal DCT-II along the rows of `x`, keeping the first `n_out` rows.
fn dct_rows(x: &Array2<f32>, n_out: usize) -> Array2<f32> {
    let (n, frames) = x.dim();
    let n_out = n_out.min(n);
    let mut out = Array2::<f32>::zeros((n_out, frames));
    if n == 0 {
        return out;
    }
    let dct = DctPlanner::<f32>::new().plan_dct2(n);
    let (dc_scale, ac_scale) = ((1.0 / n as f32).sqrt(), (2.0 / n as f32).sqrt());

    let mut buf = vec![0.0f32; n];
    for (f, column) in x.columns().into_iter().enumerate() {
        for (slot, &v) in buf.iter_mut().zip(column.iter()) {
            *slot = v;
        }
        dct.process_dct2(&mut buf);
        for k in 0..n_out {
            let scale = if k == 0 { dc_scale } else { ac_scale };
            out[[k, f]] = buf[k] * scale;
        }
    }
    out
}

/// Mel-frequency cepstral coefficients, `n_mfcc × frames`.
///
/// Power STFT → mel filterbank → dB (80 dB dynamic range) → DCT-II.
pub fn mfcc(samples: &[f32], sample_rate: u32, cfg: &RenderConfig) -> Result<Heatmap, RenderError> {
    check_input(samples, sample_rate)?;
    let power = stft_magnitude(samples, cfg.n_fft, cfg.hop_length).mapv(|m| m * m);
    let fb = mel_filterbank(sample_rate, cfg.n_fft, cfg.n_mels);
    let mut mel = fb.dot(&power);
    to_db(&mut mel, 10.0, 1e-10, cfg.top_db);
    let coeffs = dct_rows(&mel, cfg.n_mfcc);
    let duration = samples.len() as f64 / sample_rate as f64;
    Ok(Heatmap::new(coeffs, (0.0, duration), (0.0, cfg.n_mfcc as f64)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tone(freq: f32, sr: u32, secs: f32) -> Vec<f32> {
        let n = (sr as f32 * secs) as usize;
        (0..n)
            .map(|i| (2.0 * std::f32::consts::PI * freq * i as f32 / sr as f32).sin() * 0.5)
            .collect()
    }

    #[test]
    fn spectrum_keeps_lower_half_and_peaks_at_tone() {
        let sr = 22_050;
        let signal = tone(440.0, sr, 1.0);
        let spec = spectrum(&signal, sr).unwrap();
        assert_eq!(spec.points.len(), signal.len() / 2);
        let peak = spec
            .points
            .iter()
            .max_by(|a, b| a[1].total_cmp(&b[1]))
            .unwrap();
        assert!((peak[0] - 440.0).abs() < 2.0, "peak at {}", peak[0]);
        assert!(spec.points.last().unwrap()[0] < sr as f64 / 2.0 + 1.0);
    }

    #[test]
    fn empty_and_zero_rate_inputs_are_rejected() {
        let cfg = RenderConfig::default();
        assert_eq!(spectrum(&[], 16_000), Err(RenderError::EmptySignal));
        assert_eq!(waveform(&[0.1], 0, 10), Err(RenderError::InvalidSampleRate));
        assert!(matches!(
            spectrogram(&[], 16_000, &cfg),
            Err(RenderError::EmptySignal)
        ));
        assert!(matches!(mfcc(&[], 16_000, &cfg), Err(RenderError::EmptySignal)));
    }

    #[test]
    fn waveform_decimates_to_budget_and_keeps_extremes() {
        let sr = 8_000;
        let mut signal = tone(100.0, sr, 2.0);
        signal[1234] = 0.99;
        let points = waveform(&signal, sr, 400).unwrap();
        assert!(points.len() <= 400);
        assert!(points.iter().any(|p| (p[1] - 0.99).abs() < 1e-6));
        assert!(points.windows(2).all(|w| w[0][0] <= w[1][0]));

        let short = waveform(&signal[..100], sr, 400).unwrap();
        assert_eq!(short.len(), 100);
        assert!((short[8][0] - 0.001).abs() < 1e-9);
    }

    #[test]
    fn spectrogram_shape_follows_centred_framing() {
        let cfg = RenderConfig::default();
        let sr = 16_000;
        let signal = tone(1000.0, sr, 0.5);
        let spec = spectrogram(&signal, sr, &cfg).unwrap();
        assert_eq!(spec.rows(), cfg.n_fft / 2 + 1);
        assert_eq!(spec.frames(), 1 + signal.len() / cfg.hop_length);
        assert!(spec.max - spec.min <= cfg.top_db + 1e-3);

        // the loudest bin of a middle frame sits at the tone frequency
        let mid = spec.frames() / 2;
        let column = spec.values.column(mid);
        let (bin, _) = column
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .unwrap();
        let hz = bin as f64 * sr as f64 / cfg.n_fft as f64;
        assert!((hz - 1000.0).abs() < 10.0, "loudest bin at {hz} Hz");
    }

    #[test]
    fn mfcc_shape_and_finite_values() {
        let cfg = RenderConfig::default();
        let sr = 22_050;
        let signal = tone(220.0, sr, 0.3);
        let m = mfcc(&signal, sr, &cfg).unwrap();
        assert_eq!(m.rows(), cfg.n_mfcc);
        assert_eq!(m.frames(), 1 + signal.len() / cfg.hop_length);
        assert!(m.values.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn centred_frames_are_reflect_padded() {
        assert_eq!(
            reflect_pad(&[1.0, 2.0, 3.0, 4.0], 2),
            vec![3.0, 2.0, 1.0, 2.0, 3.0, 4.0, 3.0, 2.0]
        );
        // shorter than the padding: keeps bouncing between the ends
        assert_eq!(
            reflect_pad(&[1.0, 2.0], 3),
            vec![2.0, 1.0, 2.0, 1.0, 2.0, 1.0, 2.0, 1.0]
        );
        assert_eq!(reflect_pad(&[5.0], 2), vec![5.0; 5]);
    }

    #[test]
    fn dct_is_orthonormal() {
        // a constant column has all its energy in the first coefficient
        let flat = Array2::from_elem((16, 2), 3.0f32);
        let c = dct_rows(&flat, 16);
        assert!((c[[0, 0]] - 3.0 * 4.0).abs() < 1e-4);
        assert!(c.slice(ndarray::s![1.., ..]).iter().all(|v| v.abs() < 1e-4));

        // energy is preserved when every coefficient is kept
        let ramp = Array2::from_shape_fn((10, 1), |(i, _)| (i as f32 * 0.7).sin());
        let energy = |m: &Array2<f32>| m.iter().map(|v| v * v).sum::<f32>();
        assert!((energy(&ramp) - energy(&dct_rows(&ramp, 10))).abs() < 1e-4);
        assert_eq!(dct_rows(&ramp, 3).dim(), (3, 1));
    }

    #[test]
    fn filterbank_covers_the_band() {
        let fb = mel_filterbank(22_050, 2048, 40);
        assert_eq!(fb.dim(), (40, 1025));
        for row in fb.rows() {
            assert!(row.iter().any(|&w| w > 0.0));
            assert!(row.iter().all(|&w| w >= 0.0));
        }
        // filter centres rise with the mel index
        let peaks: Vec<usize> = fb
            .rows()
            .into_iter()
            .map(|row| {
                row.iter()
                    .enumerate()
                    .max_by(|a, b| a.1.total_cmp(b.1))
                    .map(|(i, _)| i)
                    .unwrap()
            })
            .collect();
        assert!(peaks.windows(2).all(|w| w[0] <= w[1]));
        // wide upper filters integrate to about one (area normalisation)
        let df = 22_050.0 / 2048.0;
        for row in fb.rows().into_iter().skip(20) {
            let area: f32 = row.sum() * df;
            assert!((area - 1.0).abs() < 0.1, "area {area}");
        }
    }
}
