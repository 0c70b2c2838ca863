//! Parser settings.
//!
//! Controls details of flag derivation and parser construction that the
//! signature itself does not decide. Loadable from YAML.
//!
//! # Example YAML
//!
//! ```yaml
//! program_name: deploy
//! dash_flags: true
//! show_defaults: true
//! allow_unknown: false
//! ```

use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Settings applied while resolving specs and building a parser.
///
/// Missing fields take their defaults, so an empty YAML document is valid.
///
/// # Examples
///
/// ```
/// use capstan_core::ParserSettings;
///
/// let settings = ParserSettings::default();
/// assert!(settings.dash_flags);
/// assert!(settings.show_defaults);
/// assert!(!settings.allow_unknown);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserSettings {
    /// Program name shown in usage output; the entry point name otherwise.
    pub program_name: Option<String>,
    /// Derive `--match-all` from `match_all`.
    pub dash_flags: bool,
    /// Append `[default: ...]` to per-argument help.
    pub show_defaults: bool,
    /// Accept unknown `--key` tokens even without a keyword collector.
    /// They are then discarded rather than rejected.
    pub allow_unknown: bool,
}

impl Default for ParserSettings {
    fn default() -> Self {
        Self {
            program_name: None,
            dash_flags: true,
            show_defaults: true,
            allow_unknown: false,
        }
    }
}

impl ParserSettings {
    /// Loads settings from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`Io`](crate::Error::Io) if the file cannot be read, or
    /// [`Yaml`](crate::Error::Yaml) if parsing fails.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let reader = BufReader::new(file);
        let settings = serde_yaml::from_reader(reader)?;
        Ok(settings)
    }

    /// Parses settings from a YAML string.
    pub fn from_yaml(raw: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(raw)?)
    }

    /// Derives the long flag for a parameter name.
    ///
    /// With dashed flags, leading and trailing underscores are dropped so
    /// `_private` becomes `--private` rather than `---private`.
    pub fn long_flag(&self, name: &str) -> String {
        if self.dash_flags {
            format!("--{}", name.trim_matches('_').replace('_', "-"))
        } else {
            format!("--{name}")
        }
    }

    /// Maps an unknown flag key back to a keyword name.
    pub fn keyword_name(&self, key: &str) -> String {
        if self.dash_flags {
            key.replace('-', "_")
        } else {
            key.to_string()
        }
    }
}
