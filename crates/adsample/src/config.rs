use std::env;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AdsampleError, AdsampleResult};
use crate::termlist::MatchMode;

/// Project config (`adsample.toml`).
#[derive(Debug, Default, Serialize, Deserialize)]
pub(crate) struct Config {
    /// The path of the config.
    #[serde(skip)]
    path: PathBuf,

    /// Runtime options.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) runtime: Option<Runtime>,

    /// Defaults shared by all sampling commands.
    #[serde(default)]
    pub(crate) sample: SampleConfig,

    /// Defaults of the keyword filter.
    #[serde(default)]
    pub(crate) keywords: KeywordsConfig,

    /// Defaults of the topic filter.
    #[serde(default)]
    pub(crate) topics: TopicsConfig,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub(crate) struct Runtime {
    /// Number of threads to use. If this options isn't set or a value
    /// of "0" is chosen, the maximum number of available threads
    /// is used.
    pub(crate) num_jobs: Option<usize>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub(crate) struct SampleConfig {
    /// The name of the sample (first column of the ledger).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) name: Option<String>,

    /// Keep only ads written in this language.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) lang: Option<String>,

    /// Keep only ads published in or after this year.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) min_year: Option<u16>,

    /// Minimum text length (in characters).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) min_len: Option<usize>,

    /// Maximum text length (in characters).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) max_len: Option<usize>,

    /// Ledger of sampled ads. Rows are appended on every run.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) ledger: Option<PathBuf>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub(crate) struct KeywordsConfig {
    /// The ICT term list (one term per line).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) terms: Option<PathBuf>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) ignore_case: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) mode: Option<MatchMode>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub(crate) struct TopicsConfig {
    /// The topic assignments of the topic model.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) assignments: Option<PathBuf>,

    /// Minimum share a topic must exceed to be assigned to an ad.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) share: Option<f64>,
}

impl Config {
    pub(crate) const FILENAME: &'static str = "adsample.toml";

    /// Creates a new default config and sets the file location.
    pub(crate) fn create<P>(path: P) -> Self
    where
        P: AsRef<Path>,
    {
        Self {
            path: path.as_ref().into(),
            ..Default::default()
        }
    }

    /// Loads an existing config from a path.
    pub(crate) fn from_path<P>(path: P) -> AdsampleResult<Self>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref().to_path_buf();
        let content = fs::read_to_string(&path).map_err(|e| {
            AdsampleError::other(format!(
                "unable to read config {}: {e}",
                path.display()
            ))
        })?;

        let mut config: Self = toml::from_str(&content)?;
        config.path = path;

        Ok(config)
    }

    /// Discovers the config file.
    ///
    /// The config is searched in the current directory and all of its
    /// parents. Returns `None` if no config exists.
    pub(crate) fn discover() -> AdsampleResult<Option<Self>> {
        let mut dir = env::current_dir()?;

        loop {
            let path = dir.join(Self::FILENAME);
            if path.is_file() {
                return Self::from_path(path).map(Some);
            }

            if !dir.pop() {
                return Ok(None);
            }
        }
    }

    /// Loads the config from an explicit location or, if no location
    /// is given, discovers it.
    pub(crate) fn load(path: Option<&Path>) -> AdsampleResult<Self> {
        match path {
            Some(path) => Self::from_path(path),
            None => Ok(Self::discover()?.unwrap_or_default()),
        }
    }

    /// Returns the location of the config.
    #[inline]
    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    /// Resolves a path from the config against the config's
    /// directory.
    pub(crate) fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() || path == Path::new("-") {
            return path.into();
        }

        match self.path.parent() {
            Some(base_dir) => base_dir.join(path),
            None => path.into(),
        }
    }

    /// Saves the config.
    pub(crate) fn save(&self) -> AdsampleResult<()> {
        let content = toml::to_string(self)?;
        let mut out = File::create(&self.path)?;
        out.write_all(content.as_bytes())?;
        Ok(())
    }
}
