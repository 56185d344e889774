use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::ConfigError;

pub const DEFAULT_RECORD_INTERVAL: usize = 10_000;

/// Number of emitted records between two progress reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordInterval(NonZeroUsize);

impl RecordInterval {
    #[must_use]
    pub fn new(records: usize) -> Option<Self> {
        NonZeroUsize::new(records).map(Self)
    }

    #[must_use]
    pub fn get(self) -> usize {
        self.0.get()
    }

    #[must_use]
    pub fn is_due(self, count: usize) -> bool {
        count > 0 && count % self.get() == 0
    }
}

impl Default for RecordInterval {
    fn default() -> Self {
        Self(NonZeroUsize::new(DEFAULT_RECORD_INTERVAL).unwrap_or(NonZeroUsize::MIN))
    }
}

impl FromStr for RecordInterval {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        trimmed
            .parse::<usize>()
            .ok()
            .and_then(Self::new)
            .ok_or_else(|| ConfigError::InvalidRecordInterval(trimmed.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchOptions {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub record_interval: RecordInterval,
}

impl BatchOptions {
    #[must_use]
    pub fn new(input_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            input_dir: input_dir.into(),
            output_dir: output_dir.into(),
            record_interval: RecordInterval::default(),
        }
    }

    #[must_use]
    pub fn with_record_interval(mut self, record_interval: RecordInterval) -> Self {
        self.record_interval = record_interval;
        self
    }

    /// Checks the folders before a run starts. The output folder is created
    /// on demand, so only the input folder has to exist.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.input_dir.as_os_str().is_empty() || self.output_dir.as_os_str().is_empty() {
            return Err(ConfigError::MissingFolder);
        }
        if !self.input_dir.is_dir() {
            return Err(ConfigError::InputNotFound(self.input_dir.clone()));
        }
        Ok(())
    }
}
