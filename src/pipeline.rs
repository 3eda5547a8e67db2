use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::audio::{load_audio, Signal};
use crate::config::EdaConfig;
use crate::data::aggregate::{missing_counts, Summary};
use crate::data::filter::{drop_spectral_columns, prune};
use crate::data::loader::load_table;
use crate::data::model::{Dataset, Gender, Split};

/// One exemplar clip.  Decoding failures are kept so the viewer can show
/// them in place of the chart.
#[derive(Debug, Clone)]
pub struct Exemplar {
    pub gender: Gender,
    pub path: PathBuf,
    pub signal: Result<Signal, String>,
}

/// Everything computed from one set of inputs.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub config: EdaConfig,
    /// Training table as read from disk.
    pub train: Dataset,
    /// Pruned copy of `train`; every statistic is computed on it.
    pub working: Dataset,
    pub test: Dataset,
    pub summary: Summary,
    pub missing_train: Vec<(String, usize)>,
    pub missing_test: Vec<(String, usize)>,
    pub exemplars: Vec<Exemplar>,
}

impl Analysis {
    /// Load both tables, prune the training copy, aggregate, and decode the
    /// exemplar clips.  A table that cannot be loaded aborts the run.
    pub fn run(config: &EdaConfig) -> Result<Self> {
        let train = load_table(&config.train_table, Split::Train)
            .context("loading training table")?;
        let test = load_table(&config.test_table, Split::Test).context("loading test table")?;
        let exemplars = Gender::ALL
            .into_iter()
            .map(|g| load_exemplar(g, &config.example_path(g), config.sample_rate))
            .collect();
        Ok(Self::assemble(config.clone(), train, test, exemplars))
    }

    /// Replace one table (File → Open) and recompute every statistic.
    pub fn reload(&mut self, split: Split, path: &Path) -> Result<()> {
        let dataset =
            load_table(path, split).with_context(|| format!("loading {}", path.display()))?;
        let mut config = self.config.clone();
        let (train, test) = match split {
            Split::Train => {
                config.train_table = path.to_path_buf();
                (dataset, self.test.clone())
            }
            Split::Test => {
                config.test_table = path.to_path_buf();
                (self.train.clone(), dataset)
            }
        };
        *self = Self::assemble(config, train, test, std::mem::take(&mut self.exemplars));
        Ok(())
    }

    fn assemble(config: EdaConfig, train: Dataset, test: Dataset, exemplars: Vec<Exemplar>) -> Self {
        let pruned = prune(&train);
        let summary = Summary::compute(&train, &pruned.dataset, &test);
        for line in summary.lines() {
            log::info!("{line}");
        }
        // Empty cells are counted before unrecognized rows are removed.
        let missing_train = missing_counts(&drop_spectral_columns(&train));
        let missing_test = missing_counts(&test);
        for (split, missing) in [(Split::Train, &missing_train), (Split::Test, &missing_test)] {
            let total: usize = missing.iter().map(|(_, n)| n).sum();
            if total > 0 {
                log::warn!("{split} table has {total} empty cells");
            }
        }
        Analysis {
            config,
            train,
            working: pruned.dataset,
            test,
            summary,
            missing_train,
            missing_test,
            exemplars,
        }
    }

    pub fn exemplar(&self, gender: Gender) -> Option<&Exemplar> {
        self.exemplars.iter().find(|e| e.gender == gender)
    }
}

fn load_exemplar(gender: Gender, path: &Path, sample_rate: u32) -> Exemplar {
    let signal = load_audio(path, sample_rate).map_err(|e| {
        log::warn!("{gender} exemplar unavailable: {e}");
        e.to_string()
    });
    Exemplar {
        gender,
        path: path.to_path_buf(),
        signal,
    }
}
