//! Engine configuration, loadable from YAML.

use std::{fmt, fs::File, io::BufReader, path::Path};

use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize};

use crate::{
    delimited::DEFAULT_DELIMITER,
    infer::{CATEGORY_THRESHOLD, DateDetection, InferOptions},
    normalize::ResponseNormalizer,
    paginate::DEFAULT_PAGE_SIZE,
    samples::DEFAULT_MAX_SAMPLES,
    schema::{DEFAULT_INFERENCE_WINDOW, InferenceOptions},
};

/// Table substituted when a load fails or the payload is unrecognized.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
#[value(rename_all = "kebab-case")]
pub enum FallbackPolicy {
    /// A fixed illustrative table.
    #[default]
    Mock,
    /// A table with no headers and no rows.
    Empty,
}

impl fmt::Display for FallbackPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FallbackPolicy::Mock => "mock",
            FallbackPolicy::Empty => "empty",
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PreviewConfig {
    pub page_size: usize,
    pub max_samples: usize,
    pub inference_window: usize,
    pub category_threshold: usize,
    pub date_detection: DateDetection,
    pub delimiter: char,
    pub fallback: FallbackPolicy,
    /// Rows requested from the preview source; `None` leaves it to the source.
    pub row_hint: Option<usize>,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            max_samples: DEFAULT_MAX_SAMPLES,
            inference_window: DEFAULT_INFERENCE_WINDOW,
            category_threshold: CATEGORY_THRESHOLD,
            date_detection: DateDetection::default(),
            delimiter: DEFAULT_DELIMITER,
            fallback: FallbackPolicy::default(),
            row_hint: None,
        }
    }
}

impl PreviewConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("Opening config file {path:?}"))?;
        let reader = BufReader::new(file);
        let config: PreviewConfig =
            serde_yaml::from_reader(reader).context("Parsing config YAML")?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        self.validate()?;
        let file = File::create(path).with_context(|| format!("Creating config file {path:?}"))?;
        serde_yaml::to_writer(file, self).context("Writing config YAML")
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(self.page_size > 0, "page_size must be positive");
        ensure!(
            self.delimiter != '"',
            "delimiter cannot be the quote character"
        );
        Ok(())
    }

    pub fn inference_options(&self) -> InferenceOptions {
        InferenceOptions {
            max_samples: self.max_samples,
            window: self.inference_window,
            infer: InferOptions {
                date_detection: self.date_detection,
                category_threshold: self.category_threshold,
            },
        }
    }

    pub fn normalizer(&self) -> ResponseNormalizer {
        ResponseNormalizer::new(self.delimiter)
    }
}
