//! Resolved argument specifications.
//!
//! An [`ArgumentSpec`] is the final word on how one parameter appears on the
//! command line. Its coercion, cardinality, choices, and required-ness are
//! all derived from the [`DefaultValue`] by [`ArgumentSpec::set_default`], so
//! replacing a default always re-derives everything that depends on it.

use serde::Serialize;

use crate::value::{Coercion, DefaultValue, Value};

/// How many values an argument accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Cardinality {
    /// Exactly one value.
    Single,
    /// Repeatable; values accumulate into a list.
    Multiple,
    /// Takes no value; presence inverts the default.
    Flag,
}

/// Where a spec came from, which decides how its value is passed back to
/// the handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    /// A declared parameter without a default; passed positionally.
    Required,
    /// A declared parameter with a default; passed by name.
    Keyword,
    /// A `*args` or `**kwargs` collector.
    Collector,
    /// An override naming no parameter; passed through the keyword collector.
    Override,
}

/// Resolved description of one command-line argument.
///
/// # Examples
///
/// ```
/// use capstan_core::{ArgumentSpec, Cardinality, Coercion, DefaultValue};
///
/// let spec = ArgumentSpec::keyword("foo", vec!["--foo".into()], DefaultValue::ListOf(Coercion::Int));
/// assert_eq!(spec.cardinality, Cardinality::Multiple);
/// assert_eq!(spec.coercion, Coercion::Int);
/// assert!(spec.required);
///
/// let toggle = ArgumentSpec::keyword("dry_run", vec!["--dry-run".into()], DefaultValue::Bool(false));
/// assert_eq!(toggle.cardinality, Cardinality::Flag);
/// assert!(!toggle.required);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArgumentSpec {
    pub name: String,
    pub flags: Vec<String>,
    pub is_positional: bool,
    pub is_variadic: bool,
    pub is_keyword_variadic: bool,
    pub default: DefaultValue,
    pub coercion: Coercion,
    /// Accepted values, empty when unrestricted.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<Value>,
    pub required: bool,
    pub cardinality: Cardinality,
    pub origin: Origin,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metavar: Option<String>,
}

impl ArgumentSpec {
    fn base(name: &str, flags: Vec<String>) -> Self {
        Self {
            name: name.to_string(),
            flags,
            is_positional: false,
            is_variadic: false,
            is_keyword_variadic: false,
            default: DefaultValue::Absent,
            coercion: Coercion::Raw,
            choices: Vec::new(),
            required: false,
            cardinality: Cardinality::Single,
            origin: Origin::Keyword,
            help: None,
            metavar: None,
        }
    }

    /// A flagged argument whose behavior follows `default`.
    pub fn keyword(name: &str, flags: Vec<String>, default: DefaultValue) -> Self {
        let mut spec = Self::base(name, flags);
        spec.set_default(default);
        spec
    }

    /// A positional argument that consumes one value.
    pub fn positional(name: &str, default: DefaultValue) -> Self {
        let mut spec = Self::base(name, Vec::new());
        spec.is_positional = true;
        spec.set_default(default);
        spec
    }

    /// Residual positional capture for a `*args`-style collector.
    pub fn varargs(name: &str) -> Self {
        let mut spec = Self::base(name, Vec::new());
        spec.is_positional = true;
        spec.is_variadic = true;
        spec.cardinality = Cardinality::Multiple;
        spec.origin = Origin::Collector;
        spec
    }

    /// Unknown-flag capture for a `**kwargs`-style collector.
    pub fn kwargs(name: &str) -> Self {
        let mut spec = Self::base(name, Vec::new());
        spec.is_keyword_variadic = true;
        spec.cardinality = Cardinality::Multiple;
        spec.origin = Origin::Collector;
        spec
    }

    pub fn is_collector(&self) -> bool {
        self.is_variadic || self.is_keyword_variadic
    }

    /// Replaces the default and re-derives coercion, cardinality, choices,
    /// and required-ness from its kind.
    pub fn set_default(&mut self, default: DefaultValue) {
        let (cardinality, coercion, choices) = match &default {
            DefaultValue::Absent => (Cardinality::Single, Coercion::Raw, Vec::new()),
            DefaultValue::Bool(_) => (Cardinality::Flag, Coercion::Bool, Vec::new()),
            DefaultValue::Int(_) => (Cardinality::Single, Coercion::Int, Vec::new()),
            DefaultValue::Float(_) => (Cardinality::Single, Coercion::Float, Vec::new()),
            DefaultValue::Str(_) => (Cardinality::Single, Coercion::Raw, Vec::new()),
            DefaultValue::List(items) | DefaultValue::Set(items) => match items.first() {
                None => (Cardinality::Multiple, Coercion::Raw, Vec::new()),
                Some(first) => (Cardinality::Single, first.coercion(), items.clone()),
            },
            DefaultValue::ListOf(coercion) => (Cardinality::Multiple, coercion.clone(), Vec::new()),
            DefaultValue::Type(coercion) => (Cardinality::Single, coercion.clone(), Vec::new()),
        };
        self.cardinality = cardinality;
        self.coercion = coercion;
        self.choices = choices;
        self.required = default.requires_input();
        self.default = default;
    }

    /// Long form preferred, falling back to the first flag, then the name.
    pub fn display_name(&self) -> &str {
        self.flags
            .iter()
            .find(|f| f.starts_with("--"))
            .or(self.flags.first())
            .map(String::as_str)
            .unwrap_or(&self.name)
    }

    pub fn matches(&self, flag: &str) -> bool {
        self.flags.iter().any(|f| f == flag)
    }

    /// Coerces one raw token and checks it against the allowed choices.
    ///
    /// # Errors
    ///
    /// Returns a message when coercion fails or the value is not a choice.
    pub fn coerce(&self, raw: &str) -> Result<Value, String> {
        let value = self.coercion.apply(raw)?;
        if !self.choices.is_empty() && !self.choices.contains(&value) {
            let allowed: Vec<String> = self.choices.iter().map(ToString::to_string).collect();
            return Err(format!(
                "invalid choice: '{raw}' (choose from {})",
                allowed.join(", ")
            ));
        }
        Ok(value)
    }
}
