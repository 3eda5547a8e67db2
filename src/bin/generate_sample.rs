//! Writes synthetic speech-gender feature tables for trying out the viewer.
//!
//! ```text
//! cargo run --bin generate_sample -- [output-dir]
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};

const SPECTRAL: [(&str, usize); 5] = [
    ("mfccs", 12),
    ("chroma", 12),
    ("mel", 8),
    ("contrast", 7),
    ("tonnetz", 6),
];

/// Share of clips the feature extractor "failed" on (articulation = -1).
const UNRECOGNIZED_RATE: f64 = 0.04;

struct Row {
    id_speaker: i64,
    gender: i64,
    duration: f64,
    rate_speech: f64,
    syllables: f64,
    pauses: f64,
    speaking: f64,
    artic: f64,
    freq_mean: f64,
    freq_min: f64,
    freq_max: f64,
    spectral: Vec<String>,
}

/// One normal sample; an unusable spread yields the mean.
fn gauss(rng: &mut StdRng, mean: f64, std_dev: f64) -> f64 {
    Normal::new(mean, std_dev).map_or(mean, |normal| normal.sample(rng))
}

fn vector_cell(rng: &mut StdRng, len: usize) -> String {
    let values: Vec<String> = (0..len)
        .map(|_| format!("{:.4}", gauss(rng, 0.0, 1.0)))
        .collect();
    format!("[{}]", values.join(" "))
}

fn generate_rows(rng: &mut StdRng, first_speaker: i64, speakers: i64, clips: usize) -> Vec<Row> {
    let mut rows = Vec::new();
    for id_speaker in first_speaker..first_speaker + speakers {
        let gender = i64::from(rng.random_bool(0.5));
        // Typical fundamental range: female 168-255 Hz, male 85-180 Hz.
        let (lo, hi) = if gender == 0 {
            (168.0, 255.0)
        } else {
            (85.0, 180.0)
        };
        let speaker_pitch = rng.random_range(lo..hi);
        let speaker_rate = gauss(rng, 3.2, 0.4).max(1.0);

        for _ in 0..clips {
            let duration = gauss(rng, 14.0, 2.0).clamp(2.0, 25.0);
            let pauses = gauss(rng, duration / 5.0, 1.0).round().max(0.0);
            let speaking = (duration - pauses * gauss(rng, 0.4, 0.1).abs()).max(1.0);
            let syllables = (speaking * gauss(rng, speaker_rate, 0.3)).round().max(1.0);
            let artic = if rng.random_bool(UNRECOGNIZED_RATE) {
                -1.0
            } else {
                syllables / speaking
            };
            let freq_mean = gauss(rng, speaker_pitch, 8.0);
            let spectral = SPECTRAL
                .iter()
                .map(|&(_, len)| vector_cell(rng, len))
                .collect();
            rows.push(Row {
                id_speaker,
                gender,
                duration,
                rate_speech: syllables / duration,
                syllables,
                pauses,
                speaking,
                artic,
                freq_mean,
                freq_min: (freq_mean - gauss(rng, 60.0, 10.0).abs()).max(40.0),
                freq_max: freq_mean + gauss(rng, 90.0, 15.0).abs(),
                spectral,
            });
        }
    }
    rows
}

fn header() -> Vec<&'static str> {
    let mut names = vec![
        "id_speaker",
        "gender",
        "duration",
        "rate_speech",
        "syllables",
        "pauses",
        "speaking",
        "artic",
        "freq_mean",
        "freq_min",
        "freq_max",
    ];
    names.extend(SPECTRAL.iter().map(|(name, _)| *name));
    names
}

fn write_csv(path: &Path, rows: &[Row]) -> Result<()> {
    let mut writer =
        csv::Writer::from_path(path).with_context(|| format!("creating {}", path.display()))?;
    writer.write_record(header())?;
    for r in rows {
        let mut record = vec![
            r.id_speaker.to_string(),
            r.gender.to_string(),
            format!("{:.3}", r.duration),
            format!("{:.4}", r.rate_speech),
            r.syllables.to_string(),
            r.pauses.to_string(),
            format!("{:.3}", r.speaking),
            if r.artic == -1.0 {
                "-1".to_string()
            } else {
                format!("{:.4}", r.artic)
            },
            format!("{:.3}", r.freq_mean),
            format!("{:.3}", r.freq_min),
            format!("{:.3}", r.freq_max),
        ];
        record.extend(r.spectral.iter().cloned());
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

fn write_parquet(path: &Path, rows: &[Row]) -> Result<()> {
    let names = header();
    let fields: Vec<Field> = names
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let dtype = match i {
                0 | 1 => DataType::Int64,
                2..=10 => DataType::Float64,
                _ => DataType::Utf8,
            };
            Field::new(*name, dtype, false)
        })
        .collect();
    let schema = Arc::new(Schema::new(fields));

    let float_col = |get: fn(&Row) -> f64| -> ArrayRef {
        Arc::new(Float64Array::from(rows.iter().map(get).collect::<Vec<_>>()))
    };
    let mut columns: Vec<ArrayRef> = vec![
        Arc::new(Int64Array::from(
            rows.iter().map(|r| r.id_speaker).collect::<Vec<_>>(),
        )),
        Arc::new(Int64Array::from(
            rows.iter().map(|r| r.gender).collect::<Vec<_>>(),
        )),
        float_col(|r| r.duration),
        float_col(|r| r.rate_speech),
        float_col(|r| r.syllables),
        float_col(|r| r.pauses),
        float_col(|r| r.speaking),
        float_col(|r| r.artic),
        float_col(|r| r.freq_mean),
        float_col(|r| r.freq_min),
        float_col(|r| r.freq_max),
    ];
    for i in 0..SPECTRAL.len() {
        columns.push(Arc::new(StringArray::from(
            rows.iter()
                .map(|r| r.spectral[i].as_str())
                .collect::<Vec<_>>(),
        )));
    }

    let batch = RecordBatch::try_new(schema.clone(), columns).context("building record batch")?;
    let file = fs::File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut writer = ArrowWriter::try_new(file, schema, None)?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}

fn main() -> Result<()> {
    let out_dir = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("sample_data"));
    fs::create_dir_all(&out_dir).with_context(|| format!("creating {}", out_dir.display()))?;

    let mut rng = StdRng::seed_from_u64(42);
    let train = generate_rows(&mut rng, 1, 120, 8);
    let test = generate_rows(&mut rng, 1000, 40, 6);

    let train_csv = out_dir.join("sample_train.csv");
    let test_csv = out_dir.join("sample_test.csv");
    let train_parquet = out_dir.join("sample_train.parquet");
    write_csv(&train_csv, &train)?;
    write_csv(&test_csv, &test)?;
    write_parquet(&train_parquet, &train)?;

    let unrecognized = train.iter().filter(|r| r.artic == -1.0).count();
    println!(
        "Wrote {} training rows ({unrecognized} unrecognized) and {} test rows to {}",
        train.len(),
        test.len(),
        out_dir.display()
    );
    println!(
        "Try: cargo run -- --train {} --test {}",
        train_csv.display(),
        test_csv.display()
    );
    Ok(())
}
