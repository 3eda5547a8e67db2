use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use super::model::{CellValue, Column, Dataset, Gender};

// ---------------------------------------------------------------------------
// Group-wise aggregation
// ---------------------------------------------------------------------------

/// Sum of `target` per category of `group_by`.
///
/// Every entry of `categories` appears in the result; a category without
/// rows sums to `0.0`.  Rows whose group value is not listed are ignored, and
/// missing target cells contribute nothing.
pub fn group_sum(
    ds: &Dataset,
    group_by: Column,
    categories: &[CellValue],
    target: Column,
) -> BTreeMap<CellValue, f64> {
    let mut sums: BTreeMap<CellValue, f64> =
        categories.iter().map(|c| (c.clone(), 0.0)).collect();
    for r in &ds.records {
        if let Some(sum) = sums.get_mut(&r.value(group_by)) {
            *sum += r.numeric(target).unwrap_or(0.0);
        }
    }
    sums
}

/// Number of distinct non-missing `target` values per category
/// (e.g. speakers per gender).
pub fn group_distinct(
    ds: &Dataset,
    group_by: Column,
    categories: &[CellValue],
    target: Column,
) -> BTreeMap<CellValue, usize> {
    let mut seen: BTreeMap<CellValue, BTreeSet<CellValue>> = categories
        .iter()
        .map(|c| (c.clone(), BTreeSet::new()))
        .collect();
    for r in &ds.records {
        if let Some(values) = seen.get_mut(&r.value(group_by)) {
            let v = r.value(target);
            if !v.is_missing() {
                values.insert(v);
            }
        }
    }
    seen.into_iter().map(|(k, v)| (k, v.len())).collect()
}

/// Row count per category.
pub fn group_counts(
    ds: &Dataset,
    group_by: Column,
    categories: &[CellValue],
) -> BTreeMap<CellValue, usize> {
    let mut counts: BTreeMap<CellValue, usize> =
        categories.iter().map(|c| (c.clone(), 0)).collect();
    for r in &ds.records {
        if let Some(n) = counts.get_mut(&r.value(group_by)) {
            *n += 1;
        }
    }
    counts
}

/// Number of distinct non-missing values in `column`.
pub fn distinct_count(ds: &Dataset, column: Column) -> usize {
    ds.unique_values(column)
        .into_iter()
        .filter(|v| !v.is_missing())
        .count()
}

/// Empty cells per column, core columns first (in [`Column::REQUIRED`]
/// order) followed by every extra column present in the header.
pub fn missing_counts(ds: &Dataset) -> Vec<(String, usize)> {
    let mut counts: Vec<(String, usize)> = Column::REQUIRED
        .iter()
        .map(|&c| {
            let n = ds.records.iter().filter(|r| r.is_missing(c)).count();
            (c.name().to_string(), n)
        })
        .collect();
    for name in &ds.header {
        if Column::from_name(name).is_some() {
            continue;
        }
        let n = ds
            .records
            .iter()
            .filter(|r| r.extra.get(name).map_or(true, |v| v.trim().is_empty()))
            .count();
        counts.push((name.clone(), n));
    }
    counts
}

// ---------------------------------------------------------------------------
// Summary report
// ---------------------------------------------------------------------------

/// Per-gender pair of values, indexed by [`Gender`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PerGender<T> {
    pub female: T,
    pub male: T,
}

impl<T: Copy + Default> PerGender<T> {
    fn from_map(map: &BTreeMap<CellValue, T>) -> Self {
        PerGender {
            female: map.get(&Gender::Female.key()).copied().unwrap_or_default(),
            male: map.get(&Gender::Male.key()).copied().unwrap_or_default(),
        }
    }

    pub fn get(&self, gender: Gender) -> T {
        match gender {
            Gender::Female => self.female,
            Gender::Male => self.male,
        }
    }
}

/// The console report of an analysis run.
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub train_rows: usize,
    pub removed_rows: usize,
    pub speakers: usize,
    pub speakers_per_gender: PerGender<usize>,
    pub train_balance: PerGender<usize>,
    pub test_balance: PerGender<usize>,
    pub syllables: PerGender<f64>,
    pub speaking_secs: PerGender<f64>,
    pub pauses: PerGender<f64>,
}

impl Summary {
    /// `train` is the raw training table, `working` its pruned copy.
    /// Class balance is counted on the raw tables, every other statistic
    /// on the working copy.
    pub fn compute(train: &Dataset, working: &Dataset, test: &Dataset) -> Self {
        let keys = Gender::keys();
        let sum = |target| PerGender::from_map(&group_sum(working, Column::Gender, &keys, target));
        Summary {
            train_rows: train.len(),
            removed_rows: train.len().saturating_sub(working.len()),
            speakers: distinct_count(working, Column::SpeakerId),
            speakers_per_gender: PerGender::from_map(&group_distinct(
                working,
                Column::Gender,
                &keys,
                Column::SpeakerId,
            )),
            train_balance: PerGender::from_map(&group_counts(train, Column::Gender, &keys)),
            test_balance: PerGender::from_map(&group_counts(test, Column::Gender, &keys)),
            syllables: sum(Column::Syllables),
            speaking_secs: sum(Column::Speaking),
            pauses: sum(Column::Pauses),
        }
    }

    /// The report as individual lines, in the order they are logged.
    pub fn lines(&self) -> Vec<String> {
        let mut lines = vec![
            format!(
                "{} of {} training records were unrecognized by the feature extractor and removed.",
                self.removed_rows, self.train_rows
            ),
            format!("The number of speakers is: {} English speakers.", self.speakers),
            format!(
                "Speakers per gender: {} female, {} male.",
                self.speakers_per_gender.female, self.speakers_per_gender.male
            ),
        ];
        for (name, balance) in [("Training", self.train_balance), ("Test", self.test_balance)] {
            lines.push(format!(
                "{name}-set records: {} female, {} male ({} total).",
                balance.female,
                balance.male,
                balance.female + balance.male
            ));
        }
        for g in Gender::ALL {
            lines.push(format!(
                "There are {} syllables for {} audio-files.",
                self.syllables.get(g) as i64,
                g
            ));
        }
        for g in Gender::ALL {
            lines.push(format!(
                "There are {} seconds of continuous speaking for {}s.",
                self.speaking_secs.get(g) as i64,
                g
            ));
        }
        for g in Gender::ALL {
            lines.push(format!(
                "There are {} pauses for {}s.",
                self.pauses.get(g) as i64,
                g
            ));
        }
        lines
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in self.lines() {
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::filter::prune;

    fn column_sum(ds: &Dataset, target: Column) -> f64 {
        ds.column_values(target).iter().sum()
    }
    use crate::data::model::tests::utterance;
    use crate::data::model::Split;

    fn scenario() -> Dataset {
        Dataset::new(
            Split::Train,
            Vec::new(),
            vec![
                utterance(1, Gender::Female, -1.0),
                utterance(2, Gender::Male, 5.2),
                utterance(3, Gender::Male, 7.1),
            ],
        )
    }

    #[test]
    fn group_sum_after_pruning() {
        let pruned = prune(&scenario()).dataset;
        assert_eq!(pruned.len(), 2);

        let sums = group_sum(&pruned, Column::Gender, &Gender::keys(), Column::Artic);
        assert_eq!(sums[&Gender::Female.key()], 0.0);
        assert!((sums[&Gender::Male.key()] - 12.3).abs() < 1e-9);
    }

    #[test]
    fn group_sums_add_up_to_total() {
        let mut records = Vec::new();
        for i in 0..20 {
            let gender = if i % 3 == 0 { Gender::Female } else { Gender::Male };
            let mut u = utterance(i, gender, 1.0 + i as f64);
            u.freq_mean = Some(100.0 + 7.5 * i as f64);
            records.push(u);
        }
        let ds = Dataset::new(Split::Train, Vec::new(), records);
        for target in Column::FEATURES {
            let sums = group_sum(&ds, Column::Gender, &Gender::keys(), target);
            let total: f64 = sums.values().sum();
            assert!((total - column_sum(&ds, target)).abs() < 1e-6, "{target}");
        }
    }

    #[test]
    fn balance_counts_match_row_count() {
        let mut records = Vec::new();
        for i in 0..1000 {
            let gender = if i < 480 { Gender::Female } else { Gender::Male };
            records.push(utterance(i, gender, 3.0));
        }
        let ds = Dataset::new(Split::Test, Vec::new(), records);
        let counts = group_counts(&ds, Column::Gender, &Gender::keys());
        assert_eq!(counts[&Gender::Female.key()], 480);
        assert_eq!(counts[&Gender::Male.key()], 520);
        assert_eq!(counts.values().sum::<usize>(), ds.len());
    }

    #[test]
    fn distinct_speakers_never_grow_under_row_removal() {
        let mut ds = Dataset::new(
            Split::Train,
            Vec::new(),
            vec![
                utterance(103, Gender::Female, 4.0),
                utterance(103, Gender::Female, 4.5),
                utterance(911, Gender::Male, 6.0),
                utterance(19, Gender::Female, 5.0),
            ],
        );
        let mut previous = distinct_count(&ds, Column::SpeakerId);
        assert_eq!(previous, 3);
        while !ds.records.is_empty() {
            ds.records.remove(0);
            let now = distinct_count(&ds, Column::SpeakerId);
            assert!(now <= previous);
            previous = now;
        }
        assert_eq!(previous, 0);
    }

    #[test]
    fn per_gender_distinct_speakers() {
        let ds = Dataset::new(
            Split::Train,
            Vec::new(),
            vec![
                utterance(103, Gender::Female, 4.0),
                utterance(103, Gender::Female, 4.5),
                utterance(19, Gender::Female, 4.5),
                utterance(911, Gender::Male, 6.0),
            ],
        );
        let speakers = group_distinct(&ds, Column::Gender, &Gender::keys(), Column::SpeakerId);
        assert_eq!(speakers[&Gender::Female.key()], 2);
        assert_eq!(speakers[&Gender::Male.key()], 1);
    }

    #[test]
    fn missing_counts_cover_core_and_extra_columns() {
        let mut a = utterance(1, Gender::Female, 3.0);
        a.duration = None;
        a.extra.insert("path".into(), String::new());
        let mut b = utterance(2, Gender::Male, 3.0);
        b.articulation = None;
        b.extra.insert("path".into(), "2.flac".into());
        let ds = Dataset::new(
            Split::Train,
            vec!["id_speaker".into(), "duration".into(), "path".into()],
            vec![a, b],
        );
        let counts: BTreeMap<String, usize> = missing_counts(&ds).into_iter().collect();
        assert_eq!(counts["duration"], 1);
        assert_eq!(counts["artic"], 1);
        assert_eq!(counts["gender"], 0);
        assert_eq!(counts["path"], 1);
    }

    #[test]
    fn summary_reports_hand_computed_totals() {
        let mut f = utterance(103, Gender::Female, 4.0);
        f.syllables = Some(50.0);
        f.speaking = Some(20.4);
        f.pauses = Some(3.0);
        let mut m = utterance(911, Gender::Male, 6.0);
        m.syllables = Some(30.0);
        m.speaking = Some(10.0);
        m.pauses = Some(5.0);
        let bad = utterance(911, Gender::Male, -1.0);

        let train = Dataset::new(Split::Train, Vec::new(), vec![f, m, bad]);
        let working = prune(&train).dataset;
        let test = Dataset::new(
            Split::Test,
            Vec::new(),
            vec![utterance(7, Gender::Female, 2.0)],
        );

        let s = Summary::compute(&train, &working, &test);
        assert_eq!(s.removed_rows, 1);
        assert_eq!(s.speakers, 2);
        assert_eq!(s.train_balance, PerGender { female: 1, male: 2 });
        assert_eq!(s.test_balance, PerGender { female: 1, male: 0 });
        assert_eq!(s.syllables, PerGender { female: 50.0, male: 30.0 });
        assert_eq!(s.pauses, PerGender { female: 3.0, male: 5.0 });

        let text = s.to_string();
        assert!(text.contains("There are 50 syllables for Female audio-files."));
        assert!(text.contains("There are 20 seconds of continuous speaking for Females."));
    }
}
