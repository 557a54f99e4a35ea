use serde::Deserialize;

use crate::error::ConfigError;
use crate::options::MatchOptions;

// ---------------------------------------------------------------------------
// Top-level job config
// ---------------------------------------------------------------------------

/// A linkage job: two delimited sources, the match options, and where to
/// write results. Relative paths are resolved by the caller, usually
/// against the job file's directory.
#[derive(Debug, Clone, Deserialize)]
pub struct LinkConfig {
    pub name: String,
    pub left: SourceConfig,
    pub right: SourceConfig,
    #[serde(rename = "match")]
    pub matching: MatchOptions,
    #[serde(default)]
    pub output: OutputConfig,
}

// ---------------------------------------------------------------------------
// Sources + Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    pub file: String,
    /// Single ASCII character. Defaults to a comma.
    #[serde(default)]
    pub delimiter: Option<char>,
}

impl SourceConfig {
    pub fn delimiter_byte(&self) -> Result<u8, ConfigError> {
        match self.delimiter {
            None => Ok(b','),
            Some(c) if c.is_ascii() => Ok(c as u8),
            Some(c) => Err(ConfigError::Validation(format!(
                "delimiter must be a single ASCII character, got '{c}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub csv: Option<String>,
    #[serde(default)]
    pub json: Option<String>,
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl LinkConfig {
    pub fn from_toml(input: &str) -> Result<Self, ConfigError> {
        let config: LinkConfig =
            toml::from_str(input).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Everything that can be checked before the sources are read.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::Validation("name must not be empty".into()));
        }

        for (side, source) in [("left", &self.left), ("right", &self.right)] {
            if source.file.trim().is_empty() {
                return Err(ConfigError::Validation(format!("{side}.file must not be empty")));
            }
            source.delimiter_byte()?;
        }

        self.matching.check()?;

        if let (Some(csv), Some(json)) = (&self.output.csv, &self.output.json) {
            if csv == json {
                return Err(ConfigError::Validation(format!(
                    "output.csv and output.json both point at '{csv}'"
                )));
            }
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
