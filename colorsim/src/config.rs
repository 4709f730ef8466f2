//! Configuration for metric map computation.
//!
//! [`MetricConfig`] is plain data with serde support so hosts can keep it in
//! YAML or JSON files next to their other settings.

use std::path::Path;

use common::SerdeFormat;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default luminance numerator stabilizer.
pub const DEFAULT_K1: f64 = 0.001;
/// Default luminance denominator stabilizer.
pub const DEFAULT_K2: f64 = 0.01;
/// Default contrast/structure stabilizer.
pub const DEFAULT_K3: f64 = 0.03;

/// Additive constants that keep the SSIM ratio finite where local means or
/// variances approach zero.
///
/// The defaults are empirical. Changing them changes every output value, so
/// keep them when comparing against previously computed maps.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Stabilizers {
    pub k1: f64,
    pub k2: f64,
    pub k3: f64,
}

impl Default for Stabilizers {
    fn default() -> Self {
        Self {
            k1: DEFAULT_K1,
            k2: DEFAULT_K2,
            k3: DEFAULT_K3,
        }
    }
}

impl Stabilizers {
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [("k1", self.k1), ("k2", self.k2), ("k3", self.k3)] {
            if !value.is_finite() || value <= 0.0 {
                return Err(Error::InvalidConfig(format!(
                    "stabilizer {} must be finite and positive, got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }
}

/// How output rows are spread over worker threads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Parallelism {
    /// Rayon's global thread pool.
    #[default]
    Auto,
    /// A dedicated pool with this many threads.
    Threads(usize),
    /// Everything on the calling thread.
    Sequential,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricConfig {
    pub stabilizers: Stabilizers,
    pub parallelism: Parallelism,
    /// Rows per work item. `None` sizes bands from the thread count.
    pub rows_per_band: Option<usize>,
}

impl MetricConfig {
    /// Preset: single-threaded computation.
    pub fn sequential() -> Self {
        Self {
            parallelism: Parallelism::Sequential,
            ..Self::default()
        }
    }

    /// Preset: dedicated pool of `threads` workers.
    pub fn with_threads(threads: usize) -> Self {
        Self {
            parallelism: Parallelism::Threads(threads),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.stabilizers.validate()?;
        if self.parallelism == Parallelism::Threads(0) {
            return Err(Error::InvalidConfig(
                "thread count must be at least 1".to_string(),
            ));
        }
        if self.rows_per_band == Some(0) {
            return Err(Error::InvalidConfig(
                "rows_per_band must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Parses and validates a config from text.
    pub fn parse(text: &str, format: SerdeFormat) -> Result<Self> {
        let config: Self = match format {
            SerdeFormat::Yaml => serde_yml::from_str(text)?,
            SerdeFormat::Json => serde_json::from_str(text)?,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn serialize(&self, format: SerdeFormat) -> Result<String> {
        Ok(match format {
            SerdeFormat::Yaml => serde_yml::to_string(self)?,
            SerdeFormat::Json => serde_json::to_string_pretty(self)?,
        })
    }

    /// Loads a config file, picking the format from its extension.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let format = SerdeFormat::from_path(path)?;
        let text = std::fs::read_to_string(path).map_err(|source| Error::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::parse(&text, format)?;
        tracing::debug!(path = %path.display(), ?config, "Loaded metric config");
        Ok(config)
    }
}
