use std::path::Path;

use symphonia::core::{
    audio::SampleBuffer,
    codecs::{DecoderOptions, CODEC_TYPE_NULL},
    errors::Error as SymphoniaError,
    formats::FormatOptions,
    io::MediaSourceStream,
    meta::MetadataOptions,
    probe::Hint,
};

use audioadapter_buffers::direct::InterleavedSlice;
use rubato::{Fft, FixedSync, Resampler};

use crate::error::AudioError;

/// A decoded mono clip at its native sample rate.
#[derive(Debug, Clone, PartialEq)]
pub struct Signal {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl Signal {
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

/// Decode an audio file (flac / wav / mp3 / ogg) to mono f32 samples at
/// `target_rate` Hz.
pub fn load_audio(path: &Path, target_rate: u32) -> Result<Signal, AudioError> {
    let decode_err = |reason: String| AudioError::Decode {
        path: path.to_path_buf(),
        reason,
    };

    let file = std::fs::File::open(path).map_err(|source| AudioError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(|e| decode_err(format!("unsupported format: {e}")))?;
    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| decode_err("no supported audio track".to_string()))?;
    let track_id = track.id;
    let mut sample_rate = track.codec_params.sample_rate;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| decode_err(format!("no decoder for track: {e}")))?;

    let mut mono: Vec<f32> = Vec::new();
    loop {
        let packet = match format.next_packet() {
            Ok(p) => p,
            Err(SymphoniaError::IoError(_)) => break, // end of stream
            Err(e) => return Err(decode_err(format!("reading packet: {e}"))),
        };
        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(d) => d,
            Err(SymphoniaError::DecodeError(e)) => {
                log::warn!("{}: skipping corrupt packet: {e}", path.display());
                continue;
            }
            Err(e) => return Err(decode_err(format!("decoding packet: {e}"))),
        };

        let spec = *decoded.spec();
        sample_rate.get_or_insert(spec.rate);
        let channels = spec.channels.count().max(1);

        let mut sbuf = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
        sbuf.copy_interleaved_ref(decoded);
        mono.extend(
            sbuf.samples()
                .chunks(channels)
                .map(|frame| frame.iter().sum::<f32>() / channels as f32),
        );
    }

    let sample_rate =
        sample_rate.ok_or_else(|| decode_err("could not determine sample rate".to_string()))?;
    if mono.is_empty() {
        return Err(decode_err("decoded audio was empty".to_string()));
    }

    let samples = resample(&mono, sample_rate, target_rate).map_err(decode_err)?;
    let signal = Signal {
        samples,
        sample_rate: target_rate,
    };
    log::info!(
        "Decoded {} ({:.2} s at {} Hz)",
        path.display(),
        signal.duration_secs(),
        signal.sample_rate
    );
    Ok(signal)
}

/// Convert a mono clip from `from` Hz to `to` Hz.
pub fn resample(mono: &[f32], from: u32, to: u32) -> Result<Vec<f32>, String> {
    if from == 0 || to == 0 {
        return Err(format!("cannot resample {from} Hz to {to} Hz"));
    }
    if from == to || mono.is_empty() {
        return Ok(mono.to_vec());
    }

    let chunk_size = 1024;
    let mut resampler = Fft::<f32>::new(
        from as usize,
        to as usize,
        chunk_size,
        1,
        1,
        FixedSync::Input,
    )
    .map_err(|e| format!("building resampler: {e}"))?;

    let input_len = mono.len();
    let output_len = resampler.process_all_needed_output_len(input_len);
    let mut out = vec![0.0f32; output_len];

    let input = InterleavedSlice::new(mono, 1, input_len)
        .map_err(|e| format!("resampler input: {e}"))?;
    let mut output = InterleavedSlice::new_mut(&mut out, 1, output_len)
        .map_err(|e| format!("resampler output: {e}"))?;
    let (_, written) = resampler
        .process_all_into_buffer(&input, &mut output, input_len, None)
        .map_err(|e| format!("resampling: {e}"))?;

    out.truncate(written);
    log::debug!("Resampled {input_len} samples at {from} Hz to {written} at {to} Hz");
    Ok(out)
}
