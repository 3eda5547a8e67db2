use super::model::{Dataset, SPECTRAL_COLUMNS};

// ---------------------------------------------------------------------------
// Feature pruning: working copy used by every statistic
// ---------------------------------------------------------------------------

/// Result of [`prune`]: the working table plus how many rows were dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct Pruned {
    pub dataset: Dataset,
    pub removed_rows: usize,
}

/// Build the analysis copy of a table.
///
/// * The spectral vector columns are removed from the header and every record.
/// * Rows whose articulation the extractor could not recognize are removed.
///
/// The input is left untouched.  A table without unrecognized rows only
/// loses its spectral columns.
pub fn prune(dataset: &Dataset) -> Pruned {
    let columns_only = drop_spectral_columns(dataset);
    let kept = columns_only.len();
    let records: Vec<_> = columns_only
        .records
        .into_iter()
        .filter(|r| !r.is_unrecognized())
        .collect();

    let removed_rows = kept - records.len();
    if removed_rows > 0 {
        log::info!(
            "Removed {removed_rows} unrecognized {} records (articulation not measurable)",
            dataset.split
        );
    }

    Pruned {
        dataset: Dataset::new(dataset.split, columns_only.header, records),
        removed_rows,
    }
}

/// Copy of `dataset` without the spectral vector columns; every row kept.
pub fn drop_spectral_columns(dataset: &Dataset) -> Dataset {
    let dropped: Vec<&str> = SPECTRAL_COLUMNS
        .into_iter()
        .filter(|c| dataset.has_column(c))
        .collect();
    if !dropped.is_empty() {
        log::debug!("Dropping {} columns: {}", dataset.split, dropped.join(", "));
    }

    let header = dataset
        .header
        .iter()
        .filter(|h| !is_spectral(h))
        .cloned()
        .collect();
    let records = dataset
        .records
        .iter()
        .map(|r| {
            let mut r = r.clone();
            r.extra.retain(|col, _| !is_spectral(col));
            r
        })
        .collect();
    Dataset::new(dataset.split, header, records)
}

fn is_spectral(column: &str) -> bool {
    SPECTRAL_COLUMNS.contains(&column)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::tests::utterance;
    use crate::data::model::{Gender, Split};

    fn table(artic: &[f64]) -> Dataset {
        let mut header: Vec<String> = ["id_speaker", "gender", "artic"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        header.extend(SPECTRAL_COLUMNS.iter().map(|s| s.to_string()));
        let records = artic
            .iter()
            .enumerate()
            .map(|(i, &a)| {
                let mut u = utterance(i as i64, Gender::Male, a);
                for col in SPECTRAL_COLUMNS {
                    u.extra.insert(col.to_string(), "[0.0]".to_string());
                }
                u.extra.insert("path".to_string(), format!("{i}.flac"));
                u
            })
            .collect();
        Dataset::new(Split::Train, header, records)
    }

    #[test]
    fn removes_unrecognized_rows_and_spectral_columns() {
        let input = table(&[-1.0, 5.2, 7.1]);
        let pruned = prune(&input);

        assert_eq!(pruned.removed_rows, 1);
        assert_eq!(pruned.dataset.len(), 2);
        assert!(pruned.dataset.records.iter().all(|r| !r.is_unrecognized()));
        for col in SPECTRAL_COLUMNS {
            assert!(!pruned.dataset.has_column(col));
            assert!(pruned.dataset.records.iter().all(|r| !r.extra.contains_key(col)));
        }
        assert!(pruned.dataset.records.iter().all(|r| r.extra.contains_key("path")));
        // input untouched
        assert_eq!(input.len(), 3);
        assert!(input.has_column("mfccs"));
    }

    #[test]
    fn no_invalid_rows_only_drops_columns() {
        let input = table(&[1.0, 2.0, 3.0, 4.0]);
        let pruned = prune(&input);
        assert_eq!(pruned.removed_rows, 0);
        assert_eq!(pruned.dataset.len(), input.len());
        assert_eq!(pruned.dataset.header, vec!["id_speaker", "gender", "artic"]);
    }

    #[test]
    fn pruning_is_idempotent() {
        let once = prune(&table(&[-1.0, 5.2, -1.0, 7.1]));
        let twice = prune(&once.dataset);
        assert_eq!(twice.dataset, once.dataset);
        assert_eq!(twice.removed_rows, 0);
    }

    #[test]
    fn dropping_columns_keeps_every_row() {
        let input = table(&[-1.0, 5.2, -1.0]);
        let dropped = drop_spectral_columns(&input);
        assert_eq!(dropped.len(), 3);
        assert_eq!(dropped.invalid_records().count(), 2);
        assert_eq!(dropped.header, vec!["id_speaker", "gender", "artic"]);
        assert!(dropped.records.iter().all(|r| r.extra.keys().eq(["path"])));
    }

    #[test]
    fn empty_table_prunes_to_empty() {
        let pruned = prune(&table(&[]));
        assert!(pruned.dataset.is_empty());
        assert_eq!(pruned.removed_rows, 0);
    }
}
