use std::path::{Path, PathBuf};

use clap::Parser;
use serde::{Deserialize, Serialize};

use crate::data::model::Gender;
use crate::error::ConfigError;

pub const DEFAULT_TRAIN_TABLE: &str = "./Data/NN_ML-data/train-clean-100.csv";
pub const DEFAULT_TEST_TABLE: &str = "./Data/NN_ML-data/test-clean.csv";
pub const DEFAULT_AUDIO_DIR: &str = "./speech-examples/";
/// Exemplar clips, named after their speaker id.
pub const DEFAULT_FEMALE_EXAMPLE: &str = "103.flac";
pub const DEFAULT_MALE_EXAMPLE: &str = "911.flac";
/// Exemplar clips are resampled to this rate before analysis.
pub const DEFAULT_SAMPLE_RATE: u32 = 22_050;

pub const ENV_TRAIN_TABLE: &str = "VOICE_PANDA_TRAIN";
pub const ENV_TEST_TABLE: &str = "VOICE_PANDA_TEST";
pub const ENV_AUDIO_DIR: &str = "VOICE_PANDA_AUDIO_DIR";

// ---------------------------------------------------------------------------
// EdaConfig – where the inputs live
// ---------------------------------------------------------------------------

/// Input locations for an analysis run.  Passed to the pipeline explicitly;
/// nothing downstream inspects the environment.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct EdaConfig {
    pub train_table: PathBuf,
    pub test_table: PathBuf,
    pub audio_dir: PathBuf,
    pub female_example: String,
    pub male_example: String,
    pub sample_rate: u32,
}

impl Default for EdaConfig {
    fn default() -> Self {
        Self {
            train_table: PathBuf::from(DEFAULT_TRAIN_TABLE),
            test_table: PathBuf::from(DEFAULT_TEST_TABLE),
            audio_dir: PathBuf::from(DEFAULT_AUDIO_DIR),
            female_example: DEFAULT_FEMALE_EXAMPLE.to_owned(),
            male_example: DEFAULT_MALE_EXAMPLE.to_owned(),
            sample_rate: DEFAULT_SAMPLE_RATE,
        }
    }
}

impl EdaConfig {
    /// Read a JSON config file; absent keys keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Path of the exemplar clip for `gender`.
    pub fn example_path(&self, gender: Gender) -> PathBuf {
        let name = match gender {
            Gender::Female => &self.female_example,
            Gender::Male => &self.male_example,
        };
        self.audio_dir.join(name)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (key, value) in [
            ("train_table", &self.train_table),
            ("test_table", &self.test_table),
        ] {
            if value.as_os_str().is_empty() {
                return Err(ConfigError::Invalid(format!("{key} is empty")));
            }
        }
        if self.sample_rate == 0 {
            return Err(ConfigError::Invalid("sample_rate must be positive".into()));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Command line
// ---------------------------------------------------------------------------

#[derive(Debug, Parser)]
#[command(name = "voice-panda", version, about = "Explore speech-gender feature tables")]
pub struct Args {
    /// JSON file with `train_table`, `test_table`, `audio_dir`, ... keys.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Training feature table (.csv or .parquet).
    #[arg(long, env = ENV_TRAIN_TABLE)]
    pub train: Option<PathBuf>,

    /// Test feature table (.csv or .parquet).
    #[arg(long, env = ENV_TEST_TABLE)]
    pub test: Option<PathBuf>,

    /// Directory holding the female / male exemplar clips.
    #[arg(long, env = ENV_AUDIO_DIR)]
    pub audio_dir: Option<PathBuf>,

    /// Rate (Hz) the exemplar clips are resampled to.
    #[arg(long)]
    pub sample_rate: Option<u32>,

    /// Print the summary and exit instead of opening the viewer.
    #[arg(long)]
    pub headless: bool,
}

impl Args {
    /// Defaults, then the config file, then flags / environment.
    pub fn resolve(&self) -> Result<EdaConfig, ConfigError> {
        let mut cfg = match &self.config {
            Some(path) => EdaConfig::from_file(path)?,
            None => EdaConfig::default(),
        };
        if let Some(p) = &self.train {
            cfg.train_table = p.clone();
        }
        if let Some(p) = &self.test {
            cfg.test_table = p.clone();
        }
        if let Some(p) = &self.audio_dir {
            cfg.audio_dir = p.clone();
        }
        if let Some(rate) = self.sample_rate {
            cfg.sample_rate = rate;
        }
        cfg.validate()?;
        Ok(cfg)
    }
}
