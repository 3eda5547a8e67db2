use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

// ---------------------------------------------------------------------------
// CellValue – a single cell of a feature table
// ---------------------------------------------------------------------------

/// A dynamically-typed table cell, used for grouping keys and for columns the
/// viewer does not interpret (spectral vectors, extra metadata).
/// Grouping results live in `BTreeMap`s, so `CellValue` must be `Ord`.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Integer(i64),
    Float(f64),
    Text(String),
    Missing,
}

impl Eq for CellValue {}

impl PartialOrd for CellValue {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CellValue {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use CellValue::*;
        fn discriminant(v: &CellValue) -> u8 {
            match v {
                Missing => 0,
                Integer(_) => 1,
                Float(_) => 2,
                Text(_) => 3,
            }
        }
        match (self, other) {
            (Missing, Missing) => std::cmp::Ordering::Equal,
            (Integer(a), Integer(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.total_cmp(b),
            (Text(a), Text(b)) => a.cmp(b),
            _ => discriminant(self).cmp(&discriminant(other)),
        }
    }
}

impl std::hash::Hash for CellValue {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            CellValue::Text(s) => s.hash(state),
            CellValue::Integer(i) => i.hash(state),
            CellValue::Float(f) => f.to_bits().hash(state),
            CellValue::Missing => {}
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(v) => write!(f, "{v:.4}"),
            CellValue::Text(s) => write!(f, "{s}"),
            CellValue::Missing => write!(f, "<missing>"),
        }
    }
}

/// Tokens pandas reads as NA by default.
const NA_TOKENS: [&str; 18] = [
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

impl CellValue {
    /// Infer the narrowest type for a raw text cell.  Empty cells, NA tokens
    /// and non-finite numbers are missing.
    pub fn parse(raw: &str) -> Self {
        let s = raw.trim();
        if s.is_empty() || NA_TOKENS.contains(&s) {
            return CellValue::Missing;
        }
        if let Ok(i) = s.parse::<i64>() {
            return CellValue::Integer(i);
        }
        if let Ok(f) = s.parse::<f64>() {
            return CellValue::float(f);
        }
        CellValue::Text(s.to_string())
    }

    /// A float cell; NaN and infinities count as missing.
    pub fn float(v: f64) -> Self {
        if v.is_finite() {
            CellValue::Float(v)
        } else {
            CellValue::Missing
        }
    }

    /// Interpret the value as an `f64`, if numeric.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Float(v) if v.is_finite() => Some(*v),
            CellValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, CellValue::Missing)
    }
}

// ---------------------------------------------------------------------------
// Gender / Articulation
// ---------------------------------------------------------------------------

/// Speaker gender label as encoded in the feature tables (0 = female, 1 = male).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Gender {
    Female = 0,
    Male = 1,
}

impl Gender {
    pub const ALL: [Gender; 2] = [Gender::Female, Gender::Male];

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Gender::Female),
            1 => Some(Gender::Male),
            _ => None,
        }
    }

    pub fn code(self) -> i64 {
        self as i64
    }

    /// The grouping key used by the aggregator for this gender.
    pub fn key(self) -> CellValue {
        CellValue::Integer(self.code())
    }

    /// Grouping keys for both genders, in code order.
    pub fn keys() -> [CellValue; 2] {
        [Gender::Female.key(), Gender::Male.key()]
    }

    pub fn label(self) -> &'static str {
        match self {
            Gender::Female => "Female",
            Gender::Male => "Male",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Value written by the feature extractor when it could not process a clip.
pub const UNRECOGNIZED_SENTINEL: f64 = -1.0;

/// Articulation speed of an utterance.
///
/// The upstream extractor writes `-1` for clips it could not analyse
/// (background noise, cut-off microphone, unintelligible speech).  That
/// sentinel never reaches the statistics: the loader turns it into
/// [`Articulation::Unrecognized`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Articulation {
    Measured(f64),
    Unrecognized,
}

impl Articulation {
    pub fn from_raw(raw: f64) -> Self {
        if raw == UNRECOGNIZED_SENTINEL {
            Articulation::Unrecognized
        } else {
            Articulation::Measured(raw)
        }
    }

    pub fn measured(self) -> Option<f64> {
        match self {
            Articulation::Measured(v) => Some(v),
            Articulation::Unrecognized => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Column – the columns the analysis understands
// ---------------------------------------------------------------------------

/// Spectral feature vectors present in the source tables but not analysed.
pub const SPECTRAL_COLUMNS: [&str; 5] = ["mfccs", "chroma", "mel", "contrast", "tonnetz"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Column {
    SpeakerId,
    Gender,
    Duration,
    RateSpeech,
    Syllables,
    Pauses,
    Speaking,
    Artic,
    FreqMean,
    FreqMin,
    FreqMax,
}

impl Column {
    /// Every column a feature table must carry.
    pub const REQUIRED: [Column; 11] = [
        Column::SpeakerId,
        Column::Gender,
        Column::Duration,
        Column::RateSpeech,
        Column::Syllables,
        Column::Pauses,
        Column::Speaking,
        Column::Artic,
        Column::FreqMean,
        Column::FreqMin,
        Column::FreqMax,
    ];

    /// Numeric per-utterance features (everything except the id and label).
    pub const FEATURES: [Column; 9] = [
        Column::Duration,
        Column::RateSpeech,
        Column::Syllables,
        Column::Pauses,
        Column::Speaking,
        Column::Artic,
        Column::FreqMean,
        Column::FreqMin,
        Column::FreqMax,
    ];

    /// Header name as written by the feature extractor.
    pub fn name(self) -> &'static str {
        match self {
            Column::SpeakerId => "id_speaker",
            Column::Gender => "gender",
            Column::Duration => "duration",
            Column::RateSpeech => "rate_speech",
            Column::Syllables => "syllables",
            Column::Pauses => "pauses",
            Column::Speaking => "speaking",
            Column::Artic => "artic",
            Column::FreqMean => "freq_mean",
            Column::FreqMin => "freq_min",
            Column::FreqMax => "freq_max",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        if name == "speaker_id" {
            return Some(Column::SpeakerId);
        }
        Column::REQUIRED.into_iter().find(|c| c.name() == name)
    }

    /// Axis label used on charts.
    pub fn label(self) -> &'static str {
        match self {
            Column::SpeakerId => "Speaker",
            Column::Gender => "Gender",
            Column::Duration => "Duration (s)",
            Column::RateSpeech => "Rate of Speech",
            Column::Syllables => "# of Syllables",
            Column::Pauses => "# of Pauses",
            Column::Speaking => "Speaking time (s)",
            Column::Artic => "Articulation (Speed)",
            Column::FreqMean => "Mean-Frequency (Hz)",
            Column::FreqMin => "Min-Frequency (Hz)",
            Column::FreqMax => "Max-Frequency (Hz)",
        }
    }

    pub fn is_numeric(self) -> bool {
        !matches!(self, Column::SpeakerId | Column::Gender)
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Utterance – one row of a feature table
// ---------------------------------------------------------------------------

/// One audio clip's extracted features.  `None` marks an empty cell.
#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    pub speaker_id: CellValue,
    pub gender: Gender,
    pub duration: Option<f64>,
    pub rate_speech: Option<f64>,
    pub syllables: Option<f64>,
    pub pauses: Option<f64>,
    pub speaking: Option<f64>,
    pub articulation: Option<Articulation>,
    pub freq_mean: Option<f64>,
    pub freq_min: Option<f64>,
    pub freq_max: Option<f64>,
    /// Every other column (spectral vectors included), verbatim.
    pub extra: BTreeMap<String, String>,
}

impl Utterance {
    /// Numeric value of a feature column.  Unrecognized articulation has no
    /// numeric value.
    pub fn numeric(&self, column: Column) -> Option<f64> {
        match column {
            Column::SpeakerId => self.speaker_id.as_f64(),
            Column::Gender => Some(self.gender.code() as f64),
            Column::Duration => self.duration,
            Column::RateSpeech => self.rate_speech,
            Column::Syllables => self.syllables,
            Column::Pauses => self.pauses,
            Column::Speaking => self.speaking,
            Column::Artic => self.articulation.and_then(Articulation::measured),
            Column::FreqMean => self.freq_mean,
            Column::FreqMin => self.freq_min,
            Column::FreqMax => self.freq_max,
        }
    }

    /// The cell as a grouping / distinct-count key.
    pub fn value(&self, column: Column) -> CellValue {
        match column {
            Column::SpeakerId => self.speaker_id.clone(),
            Column::Gender => self.gender.key(),
            other => self
                .numeric(other)
                .map(CellValue::Float)
                .unwrap_or(CellValue::Missing),
        }
    }

    pub fn is_unrecognized(&self) -> bool {
        matches!(self.articulation, Some(Articulation::Unrecognized))
    }

    /// Whether a core cell was empty in the source table.
    pub fn is_missing(&self, column: Column) -> bool {
        match column {
            Column::SpeakerId => self.speaker_id.is_missing(),
            Column::Gender => false,
            Column::Artic => self.articulation.is_none(),
            other => self.numeric(other).is_none(),
        }
    }
}

// ---------------------------------------------------------------------------
// Dataset – a loaded train or test table
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Split {
    Train,
    Test,
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Split::Train => f.write_str("Training"),
            Split::Test => f.write_str("Test"),
        }
    }
}

/// An ordered collection of utterances plus the header it was read with.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub split: Split,
    /// Column names in file order.
    pub header: Vec<String>,
    pub records: Vec<Utterance>,
}

impl Dataset {
    pub fn new(split: Split, header: Vec<String>, records: Vec<Utterance>) -> Self {
        Dataset {
            split,
            header,
            records,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.header.iter().any(|h| h == name)
    }

    /// Non-missing numeric values of `column`, in row order.
    pub fn column_values(&self, column: Column) -> Vec<f64> {
        self.records
            .iter()
            .filter_map(|r| r.numeric(column))
            .collect()
    }

    /// Sorted set of distinct values of `column`.
    pub fn unique_values(&self, column: Column) -> BTreeSet<CellValue> {
        self.records.iter().map(|r| r.value(column)).collect()
    }

    /// Rows the feature extractor marked as unrecognized.
    pub fn invalid_records(&self) -> impl Iterator<Item = &Utterance> {
        self.records.iter().filter(|r| r.is_unrecognized())
    }

    pub fn head(&self, n: usize) -> &[Utterance] {
        &self.records[..n.min(self.records.len())]
    }
}
