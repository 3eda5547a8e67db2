use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{
    Array, BooleanArray, Float32Array, Float64Array, Int32Array, Int64Array, LargeStringArray,
    StringArray,
};
use arrow::datatypes::DataType;
use arrow::util::display::array_value_to_string;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

use super::model::{Articulation, CellValue, Column, Dataset, Gender, Split, Utterance};
use crate::error::LoadError;

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a feature table.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row, one utterance per line (the extractor's output)
/// * `.parquet` – the same columns written by `df.to_parquet()`
///
/// Column order and row order are preserved; columns the analysis does not
/// interpret are kept verbatim in [`Utterance::extra`].
pub fn load_table(path: &Path, split: Split) -> Result<Dataset, LoadError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let dataset = match ext.as_str() {
        "parquet" | "pq" => load_parquet(path, split)?,
        _ => load_csv(path, split)?,
    };
    log::info!(
        "Loaded {} {} records ({} columns) from {}",
        dataset.len(),
        split,
        dataset.header.len(),
        path.display()
    );
    Ok(dataset)
}

// ---------------------------------------------------------------------------
// Row assembly shared by both formats
// ---------------------------------------------------------------------------

/// Maps each header position to the column it feeds.
struct HeaderIndex {
    header: Vec<String>,
    core: BTreeMap<Column, usize>,
}

impl HeaderIndex {
    fn new(path: &Path, header: Vec<String>) -> Result<Self, LoadError> {
        let mut core = BTreeMap::new();
        for (idx, name) in header.iter().enumerate() {
            if let Some(col) = Column::from_name(name) {
                core.entry(col).or_insert(idx);
            }
        }
        let missing: Vec<&str> = Column::REQUIRED
            .iter()
            .filter(|c| !core.contains_key(c))
            .map(|c| c.name())
            .collect();
        if !missing.is_empty() {
            return Err(LoadError::parse(
                path,
                format!("missing required column(s): {}", missing.join(", ")),
            ));
        }
        Ok(HeaderIndex { header, core })
    }

    fn build_row(
        &self,
        path: &Path,
        row: usize,
        cells: Vec<(CellValue, String)>,
    ) -> Result<Utterance, LoadError> {
        let cell = |col: Column| &cells[self.core[&col]].0;

        let number = |col: Column| -> Result<Option<f64>, LoadError> {
            match cell(col) {
                CellValue::Missing => Ok(None),
                v => v.as_f64().map(Some).ok_or_else(|| {
                    LoadError::parse(path, format!("row {row}, '{col}': '{v}' is not a number"))
                }),
            }
        };

        let gender = match cell(Column::Gender) {
            CellValue::Integer(code) => Gender::from_code(*code),
            CellValue::Float(v) if v.fract() == 0.0 => Gender::from_code(*v as i64),
            _ => None,
        }
        .ok_or_else(|| {
            LoadError::parse(
                path,
                format!(
                    "row {row}, 'gender': expected 0 or 1, got '{}'",
                    cell(Column::Gender)
                ),
            )
        })?;

        let mut extra = BTreeMap::new();
        let mut utterance = Utterance {
            speaker_id: cell(Column::SpeakerId).clone(),
            gender,
            duration: number(Column::Duration)?,
            rate_speech: number(Column::RateSpeech)?,
            syllables: number(Column::Syllables)?,
            pauses: number(Column::Pauses)?,
            speaking: number(Column::Speaking)?,
            articulation: number(Column::Artic)?.map(Articulation::from_raw),
            freq_mean: number(Column::FreqMean)?,
            freq_min: number(Column::FreqMin)?,
            freq_max: number(Column::FreqMax)?,
            extra: BTreeMap::new(),
        };

        let core_positions: Vec<usize> = self.core.values().copied().collect();
        for (idx, (_, raw)) in cells.into_iter().enumerate() {
            if !core_positions.contains(&idx) {
                extra.insert(self.header[idx].clone(), raw);
            }
        }
        utterance.extra = extra;
        Ok(utterance)
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

fn load_csv(path: &Path, split: Split) -> Result<Dataset, LoadError> {
    let file = std::fs::File::open(path).map_err(|source| LoadError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let mut reader = csv::Reader::from_reader(file);

    let header: Vec<String> = reader
        .headers()
        .map_err(|e| csv_error(path, e))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();
    let index = HeaderIndex::new(path, header)?;

    let mut records = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result.map_err(|e| csv_error(path, e))?;
        let cells = record
            .iter()
            .map(|raw| (CellValue::parse(raw), raw.to_string()))
            .collect();
        records.push(index.build_row(path, row_no, cells)?);
    }

    Ok(Dataset::new(split, index.header, records))
}

fn csv_error(path: &Path, err: csv::Error) -> LoadError {
    if err.is_io_error() {
        if let csv::ErrorKind::Io(source) = err.into_kind() {
            return LoadError::Read {
                path: path.to_path_buf(),
                source,
            };
        }
        return LoadError::parse(path, "I/O error while reading CSV");
    }
    LoadError::parse(path, err.to_string())
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet export of a feature table.  Works with files written by
/// both **Pandas** (`df.to_parquet()`) and **Polars** (`df.write_parquet()`).
fn load_parquet(path: &Path, split: Split) -> Result<Dataset, LoadError> {
    let file = std::fs::File::open(path).map_err(|source| LoadError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .map_err(|e| LoadError::parse(path, format!("reading parquet metadata: {e}")))?;

    let header: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let index = HeaderIndex::new(path, header)?;

    let reader = builder
        .build()
        .map_err(|e| LoadError::parse(path, format!("building parquet reader: {e}")))?;

    let mut records = Vec::new();
    for batch_result in reader {
        let batch =
            batch_result.map_err(|e| LoadError::parse(path, format!("reading batch: {e}")))?;
        for row in 0..batch.num_rows() {
            let cells = batch
                .columns()
                .iter()
                .map(|col| arrow_cell(col, row))
                .collect();
            let row_no = records.len();
            records.push(index.build_row(path, row_no, cells)?);
        }
    }

    Ok(Dataset::new(split, index.header, records))
}

/// Extract one cell as a typed value plus its verbatim text.
fn arrow_cell(col: &Arc<dyn Array>, row: usize) -> (CellValue, String) {
    if col.is_null(row) {
        return (CellValue::Missing, String::new());
    }
    let any = col.as_any();
    let value = match col.data_type() {
        DataType::Utf8 => any
            .downcast_ref::<StringArray>()
            .map(|a| CellValue::parse(a.value(row))),
        DataType::LargeUtf8 => any
            .downcast_ref::<LargeStringArray>()
            .map(|a| CellValue::parse(a.value(row))),
        DataType::Int32 => any
            .downcast_ref::<Int32Array>()
            .map(|a| CellValue::Integer(a.value(row) as i64)),
        DataType::Int64 => any
            .downcast_ref::<Int64Array>()
            .map(|a| CellValue::Integer(a.value(row))),
        DataType::Float32 => any
            .downcast_ref::<Float32Array>()
            .map(|a| CellValue::float(a.value(row) as f64)),
        DataType::Float64 => any
            .downcast_ref::<Float64Array>()
            .map(|a| CellValue::float(a.value(row))),
        DataType::Boolean => any
            .downcast_ref::<BooleanArray>()
            .map(|a| CellValue::Integer(a.value(row) as i64)),
        _ => None,
    };
    // Narrow ints, unsigned, half floats and dictionary columns go through
    // their display form.
    let raw = array_value_to_string(col.as_ref(), row).unwrap_or_default();
    let value = value.unwrap_or_else(|| CellValue::parse(&raw));
    (value, raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{ArrayRef, DictionaryArray, Int16Array, UInt8Array};
    use arrow::datatypes::Int32Type;
    use arrow::record_batch::RecordBatch;
    use parquet::arrow::ArrowWriter;
    use std::io::Write;

    const HEADER: &str = "id_speaker,gender,duration,rate_speech,syllables,pauses,speaking,artic,freq_mean,freq_min,freq_max,mfccs,chroma,mel,contrast,tonnetz";

    fn write_csv(body: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(".csv")
            .tempfile()
            .unwrap();
        file.write_all(body.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn loads_rows_in_order_and_keeps_extra_columns() {
        let body = format!(
            "{HEADER}\n\
             103,0,14.2,3.1,44,2,12.5,-1,210.0,170.0,255.0,\"[1.0, 2.0]\",\"[0.1]\",\"[0.2]\",\"[0.3]\",\"[0.4]\"\n\
             911,1,10.0,2.9,30,4,8.0,5.2,120.0,85.0,180.0,\"[3.0]\",\"[0.1]\",\"[0.2]\",\"[0.3]\",\"[0.4]\"\n"
        );
        let file = write_csv(&body);
        let ds = load_table(file.path(), Split::Train).unwrap();

        assert_eq!(ds.len(), 2);
        assert_eq!(ds.header.len(), 16);
        assert_eq!(ds.records[0].speaker_id, CellValue::Integer(103));
        assert_eq!(ds.records[0].gender, Gender::Female);
        assert_eq!(ds.records[0].articulation, Some(Articulation::Unrecognized));
        assert_eq!(ds.records[1].articulation, Some(Articulation::Measured(5.2)));
        assert_eq!(ds.records[1].gender, Gender::Male);
        assert_eq!(ds.records[0].extra.get("mfccs").map(String::as_str), Some("[1.0, 2.0]"));
    }

    #[test]
    fn empty_cells_are_missing_not_errors() {
        let body = "id_speaker,gender,duration,rate_speech,syllables,pauses,speaking,artic,freq_mean,freq_min,freq_max\n\
                    7,1,,3.0,40,2,12.0,,150.0,90.0,200.0\n";
        let file = write_csv(body);
        let ds = load_table(file.path(), Split::Test).unwrap();
        assert_eq!(ds.records[0].duration, None);
        assert_eq!(ds.records[0].articulation, None);
        assert_eq!(ds.split, Split::Test);
    }

    #[test]
    fn nan_and_na_cells_load_as_missing() {
        let body = "id_speaker,gender,duration,rate_speech,syllables,pauses,speaking,artic,freq_mean,freq_min,freq_max\n\
                    7,1,NaN,3.0,40,NA,12.0,nan,150.0,90.0,inf\n\
                    8,0,11.0,3.0,40,2,12.0,4.0,210.0,170.0,250.0\n";
        let file = write_csv(body);
        let ds = load_table(file.path(), Split::Train).unwrap();
        assert_eq!(ds.len(), 2);
        let r = &ds.records[0];
        assert_eq!(r.duration, None);
        assert_eq!(r.pauses, None);
        assert_eq!(r.articulation, None);
        assert_eq!(r.freq_max, None);
        assert_eq!(r.rate_speech, Some(3.0));
        assert_eq!(ds.records[1].duration, Some(11.0));
    }

    fn write_parquet(batch: &RecordBatch) -> tempfile::NamedTempFile {
        let file = tempfile::Builder::new()
            .suffix(".parquet")
            .tempfile()
            .unwrap();
        let mut writer =
            ArrowWriter::try_new(file.reopen().unwrap(), batch.schema(), None).unwrap();
        writer.write(batch).unwrap();
        writer.close().unwrap();
        file
    }

    fn f64_col(values: [f64; 3]) -> ArrayRef {
        Arc::new(Float64Array::from(values.to_vec()))
    }

    #[test]
    fn loads_parquet_with_mixed_column_types() {
        let reader: DictionaryArray<Int32Type> = ["clean", "clean", "other"].into_iter().collect();
        let batch = RecordBatch::try_from_iter(vec![
            ("id_speaker", Arc::new(Int64Array::from(vec![103, 911, 19])) as ArrayRef),
            ("gender", Arc::new(Int16Array::from(vec![0, 1, 0])) as ArrayRef),
            (
                "duration",
                Arc::new(Float64Array::from(vec![Some(14.2), None, Some(f64::NAN)])) as ArrayRef,
            ),
            ("rate_speech", f64_col([3.1, 2.9, 3.0])),
            ("syllables", Arc::new(Int16Array::from(vec![44, 30, 28])) as ArrayRef),
            ("pauses", Arc::new(UInt8Array::from(vec![2, 4, 1])) as ArrayRef),
            ("speaking", Arc::new(Float32Array::from(vec![12.5, 8.0, 7.5])) as ArrayRef),
            ("artic", f64_col([-1.0, 5.2, 4.0])),
            ("freq_mean", f64_col([210.0, 120.0, 200.0])),
            ("freq_min", f64_col([170.0, 85.0, 165.0])),
            ("freq_max", f64_col([255.0, 180.0, 240.0])),
            (
                "mfccs",
                Arc::new(StringArray::from(vec!["[1.0]", "[2.0]", "[3.0]"])) as ArrayRef,
            ),
            ("reader", Arc::new(reader) as ArrayRef),
        ])
        .unwrap();
        let file = write_parquet(&batch);

        let ds = load_table(file.path(), Split::Train).unwrap();
        assert_eq!(ds.len(), 3);
        assert_eq!(ds.header.len(), 13);
        let ids: Vec<_> = ds.records.iter().map(|r| r.speaker_id.clone()).collect();
        assert_eq!(
            ids,
            vec![
                CellValue::Integer(103),
                CellValue::Integer(911),
                CellValue::Integer(19)
            ]
        );
        assert_eq!(ds.records[1].gender, Gender::Male);
        assert_eq!(ds.records[0].syllables, Some(44.0));
        assert_eq!(ds.records[1].pauses, Some(4.0));
        assert_eq!(ds.records[0].speaking, Some(12.5));
        assert_eq!(
            ds.records.iter().map(|r| r.duration).collect::<Vec<_>>(),
            vec![Some(14.2), None, None]
        );
        assert_eq!(ds.records[0].articulation, Some(Articulation::Unrecognized));
        assert_eq!(ds.records[1].articulation, Some(Articulation::Measured(5.2)));
        assert_eq!(ds.records[0].extra.get("mfccs").map(String::as_str), Some("[1.0]"));
        assert_eq!(ds.records[2].extra.get("reader").map(String::as_str), Some("other"));
    }

    #[test]
    fn parquet_without_required_columns_is_a_parse_error() {
        let batch = RecordBatch::try_from_iter(vec![(
            "id_speaker",
            Arc::new(Int64Array::from(vec![1, 2])) as ArrayRef,
        )])
        .unwrap();
        let file = write_parquet(&batch);
        assert!(matches!(
            load_table(file.path(), Split::Train),
            Err(LoadError::Parse { .. })
        ));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = load_table(Path::new("/definitely/not/here.csv"), Split::Train).unwrap_err();
        assert!(matches!(err, LoadError::Read { .. }));
    }

    #[test]
    fn missing_required_column_is_a_parse_error() {
        let body = "id_speaker,gender,duration\n1,0,3.0\n";
        let file = write_csv(body);
        let err = load_table(file.path(), Split::Train).unwrap_err();
        match err {
            LoadError::Parse { reason, .. } => assert!(reason.contains("artic")),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn malformed_cells_are_parse_errors() {
        let bad_number = "id_speaker,gender,duration,rate_speech,syllables,pauses,speaking,artic,freq_mean,freq_min,freq_max\n\
                          7,1,abc,3.0,40,2,12.0,4.0,150.0,90.0,200.0\n";
        let file = write_csv(bad_number);
        assert!(matches!(
            load_table(file.path(), Split::Train),
            Err(LoadError::Parse { .. })
        ));

        let bad_gender = "id_speaker,gender,duration,rate_speech,syllables,pauses,speaking,artic,freq_mean,freq_min,freq_max\n\
                          7,2,1.0,3.0,40,2,12.0,4.0,150.0,90.0,200.0\n";
        let file = write_csv(bad_gender);
        assert!(matches!(
            load_table(file.path(), Split::Train),
            Err(LoadError::Parse { .. })
        ));

        let ragged = "id_speaker,gender,duration,rate_speech,syllables,pauses,speaking,artic,freq_mean,freq_min,freq_max\n\
                      7,1,1.0\n";
        let file = write_csv(ragged);
        assert!(matches!(
            load_table(file.path(), Split::Train),
            Err(LoadError::Parse { .. })
        ));
    }
}
