//! Explicit argument overrides attached to an entry point.
//!
//! Overrides are appended in registration order and never removed. Looking
//! up a name folds every override registered for it into one, so a later
//! override only replaces the fields it actually sets.

use crate::value::DefaultValue;

/// One explicit correction to an inferred argument.
///
/// Flags starting with `-` are option strings; a single bare word names a
/// positional argument instead.
///
/// # Examples
///
/// ```
/// use capstan_core::ArgOverride;
///
/// let flag = ArgOverride::new(["--bar", "-b"]).default("bar");
/// assert_eq!(flag.target(), "bar");
///
/// let positional = ArgOverride::new(["a"]);
/// assert_eq!(positional.target(), "a");
/// assert!(positional.is_positional());
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArgOverride {
    pub flags: Vec<String>,
    pub dest: Option<String>,
    pub default: Option<DefaultValue>,
    pub required: Option<bool>,
    pub help: Option<String>,
    pub metavar: Option<String>,
}

impl ArgOverride {
    pub fn new<I, S>(flags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            flags: flags.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    /// An override that targets a parameter by name without touching its flags.
    pub fn named(dest: impl Into<String>) -> Self {
        Self {
            dest: Some(dest.into()),
            ..Default::default()
        }
    }

    pub fn dest(mut self, dest: impl Into<String>) -> Self {
        self.dest = Some(dest.into());
        self
    }

    pub fn default(mut self, default: impl Into<DefaultValue>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = Some(required);
        self
    }

    pub fn help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    pub fn metavar(mut self, metavar: impl Into<String>) -> Self {
        self.metavar = Some(metavar.into());
        self
    }

    /// True when the override declares a bare positional name.
    pub fn is_positional(&self) -> bool {
        !self.flags.is_empty() && self.flags.iter().all(|f| !f.starts_with('-'))
    }

    /// The parameter name this override applies to.
    ///
    /// `dest` wins, then a positional name, then the first long flag, then
    /// the first short flag; dashes inside flag names map to underscores.
    pub fn target(&self) -> String {
        if let Some(dest) = &self.dest {
            return dest.clone();
        }
        if let Some(name) = self.flags.iter().find(|f| !f.starts_with('-')) {
            return name.clone();
        }
        let flag = self
            .flags
            .iter()
            .find(|f| f.starts_with("--"))
            .or_else(|| self.flags.first());
        flag.map(|f| f.trim_start_matches('-').replace('-', "_"))
            .unwrap_or_default()
    }
}

/// Ordered, append-only list of overrides for one entry point.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OverrideRegistry {
    entries: Vec<ArgOverride>,
}

impl OverrideRegistry {
    pub fn add(&mut self, entry: ArgOverride) -> &mut Self {
        self.entries.push(entry);
        self
    }

    pub fn entries(&self) -> &[ArgOverride] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Target names in order of first registration.
    pub fn targets(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for entry in &self.entries {
            let target = entry.target();
            if !names.contains(&target) {
                names.push(target);
            }
        }
        names
    }

    /// Folds every override registered for `name` into one.
    pub fn resolve(&self, name: &str) -> Option<ArgOverride> {
        self.entries
            .iter()
            .filter(|e| e.target() == name)
            .fold(None, |acc: Option<ArgOverride>, entry| match acc {
                None => Some(entry.clone()),
                Some(mut merged) => {
                    crate::merge::merge_overrides(&mut merged, entry);
                    Some(merged)
                }
            })
    }
}
