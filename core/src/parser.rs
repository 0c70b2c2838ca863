//! Parser construction and argument parsing.
//!
//! [`ParserBuilder`] turns resolved specs into a [`clap::Command`]. Each
//! spec's coercion and choices become the argument's value parser, so bad
//! input is reported by clap with its usual diagnostics.
//!
//! clap has no notion of "keep unknown flags", so when unknown flags are
//! allowed, [`ScriptParser::parse`] first sets aside every `--key[=value]`
//! token that matches no spec, then hands the rest to clap.

use clap::error::ErrorKind;
use clap::{Arg, ArgAction, ArgMatches, Command};
use tracing::debug;

use crate::error::UsageError;
use crate::settings::ParserSettings;
use crate::spec::{ArgumentSpec, Cardinality};
use crate::value::{Coercion, DefaultValue, Value};

const HELP_ID: &str = "__help";

/// Builds a [`ScriptParser`] from resolved specs.
///
/// # Examples
///
/// ```
/// use capstan_core::{ArgumentSpec, DefaultValue, ParserBuilder, Value};
///
/// let specs = vec![ArgumentSpec::keyword("bar", vec!["--bar".into()], DefaultValue::Int(0))];
/// let parser = ParserBuilder::new("demo").description("does things").build(&specs, false);
///
/// assert_eq!(parser.description(), "does things");
/// let parsed = parser.parse(["--bar=10"]).unwrap();
/// assert_eq!(parsed.get("bar"), Some(&Value::Int(10)));
/// ```
#[derive(Debug, Clone)]
pub struct ParserBuilder {
    program: String,
    description: String,
    settings: ParserSettings,
}

impl ParserBuilder {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            description: String::new(),
            settings: ParserSettings::default(),
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn settings(mut self, settings: ParserSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Builds the parser.
    ///
    /// Unknown flags are retained when `allow_unknown` is set, when the
    /// settings allow them, or whenever a keyword collector is present.
    pub fn build(&self, specs: &[ArgumentSpec], allow_unknown: bool) -> ScriptParser {
        let collects_unknown = specs.iter().any(|s| s.is_keyword_variadic);
        let allow_unknown = allow_unknown || collects_unknown || self.settings.allow_unknown;

        let program = self
            .settings
            .program_name
            .clone()
            .unwrap_or_else(|| self.program.clone());

        let mut command = Command::new(program)
            .no_binary_name(true)
            .args_override_self(true)
            .disable_help_flag(true)
            .disable_version_flag(true)
            .arg(
                Arg::new(HELP_ID)
                    .long("help")
                    .action(ArgAction::Help)
                    .help("Print help"),
            );
        if !self.description.is_empty() {
            command = command.about(self.description.clone());
        }

        for spec in specs.iter().filter(|s| !s.is_keyword_variadic) {
            command = command.arg(self.to_arg(spec));
        }

        debug!(
            program = command.get_name(),
            args = specs.len(),
            allow_unknown,
            "Built parser"
        );

        ScriptParser {
            command,
            specs: specs.to_vec(),
            description: self.description.clone(),
            allow_unknown,
            collects_unknown,
            settings: self.settings.clone(),
        }
    }

    fn to_arg(&self, spec: &ArgumentSpec) -> Arg {
        let mut arg = Arg::new(spec.name.clone());

        if let Some(help) = self.help_text(spec) {
            arg = arg.help(help);
        }

        if spec.is_variadic {
            let value_name = spec.metavar.clone().unwrap_or_else(|| spec.name.clone());
            return arg
                .num_args(1..)
                .action(ArgAction::Append)
                .value_name(value_name)
                .value_parser(value_parser(spec));
        }

        if !spec.is_positional {
            arg = with_flags(arg, &spec.flags);
        }

        match spec.cardinality {
            Cardinality::Flag => {
                let action = match spec.default {
                    DefaultValue::Bool(true) => ArgAction::SetFalse,
                    _ => ArgAction::SetTrue,
                };
                arg.action(action)
            }
            Cardinality::Single | Cardinality::Multiple => {
                let action = if spec.cardinality == Cardinality::Multiple {
                    ArgAction::Append
                } else {
                    ArgAction::Set
                };
                let value_name = spec
                    .metavar
                    .clone()
                    .unwrap_or_else(|| spec.name.to_uppercase());
                arg = arg
                    .action(action)
                    .required(spec.required)
                    .value_name(value_name)
                    .value_parser(value_parser(spec));
                if spec.is_positional && spec.cardinality == Cardinality::Multiple {
                    arg = arg.num_args(1..);
                }
                if matches!(spec.coercion, Coercion::Int | Coercion::Float) {
                    arg = arg.allow_negative_numbers(true);
                }
                arg
            }
        }
    }

    fn help_text(&self, spec: &ArgumentSpec) -> Option<String> {
        let mut parts: Vec<String> = Vec::new();
        if let Some(help) = &spec.help {
            parts.push(help.clone());
        }
        if self.settings.show_defaults && !spec.is_variadic {
            if let Some(default) = spec.default.initial_value() {
                parts.push(format!("[default: {default}]"));
            }
        }
        (!parts.is_empty()).then(|| parts.join(" "))
    }
}

fn with_flags(mut arg: Arg, flags: &[String]) -> Arg {
    let mut has_long = false;
    let mut has_short = false;
    for flag in flags {
        if let Some(long) = flag.strip_prefix("--") {
            arg = if has_long {
                arg.visible_alias(long.to_string())
            } else {
                arg.long(long.to_string())
            };
            has_long = true;
        } else if let Some(short) = flag.strip_prefix('-').and_then(|s| s.chars().next()) {
            arg = if has_short {
                arg.visible_short_alias(short)
            } else {
                arg.short(short)
            };
            has_short = true;
        }
    }
    arg
}

fn value_parser(
    spec: &ArgumentSpec,
) -> impl Fn(&str) -> Result<Value, String> + Clone + Send + Sync + 'static {
    let spec = spec.clone();
    move |raw: &str| spec.coerce(raw)
}

/// A built parser bound to its specs.
#[derive(Debug, Clone)]
pub struct ScriptParser {
    command: Command,
    specs: Vec<ArgumentSpec>,
    description: String,
    allow_unknown: bool,
    collects_unknown: bool,
    settings: ParserSettings,
}

impl ScriptParser {
    pub fn description(&self) -> &str {
        &self.description
    }

    /// True when unrecognized `--key` tokens are accepted instead of rejected.
    pub fn allow_unknown(&self) -> bool {
        self.allow_unknown
    }

    pub fn specs(&self) -> &[ArgumentSpec] {
        &self.specs
    }

    pub fn command(&self) -> &Command {
        &self.command
    }

    /// True when the parser exposes no arguments beyond `--help`.
    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    pub fn render_help(&self) -> String {
        self.command.clone().render_help().to_string()
    }

    /// Parses raw arguments (without the program name).
    ///
    /// # Errors
    ///
    /// Returns a [`UsageError`] for missing required values, failed
    /// coercions, disallowed unknown flags, and `--help`.
    pub fn parse<I, T>(&self, args: I) -> Result<ParsedArgs, UsageError>
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let args: Vec<String> = args.into_iter().map(Into::into).collect();
        let (known, unknown) = self.split_unknown(args);

        let matches = self.command.clone().try_get_matches_from(known)?;

        let values = self
            .specs
            .iter()
            .filter(|s| !s.is_keyword_variadic)
            .filter_map(|spec| read_value(&matches, spec).map(|v| (spec.name.clone(), v)))
            .collect();

        let unknown = if self.collects_unknown {
            self.check_shadowing(&unknown)?;
            unknown
        } else {
            if !unknown.is_empty() {
                debug!(dropped = unknown.len(), "Discarding unknown flags");
            }
            Vec::new()
        };

        Ok(ParsedArgs { values, unknown })
    }

    /// A collected key may not reuse the name of a declared argument, or the
    /// handler would receive two values for it.
    fn check_shadowing(&self, unknown: &[(String, Value)]) -> Result<(), UsageError> {
        let shadowed = unknown.iter().find_map(|(key, _)| {
            self.specs
                .iter()
                .filter(|s| !s.is_collector())
                .find(|s| &s.name == key)
                .map(|spec| (key, spec))
        });
        let Some((key, spec)) = shadowed else {
            return Ok(());
        };
        let message = format!(
            "unknown flag for '{key}' shadows argument '{}'",
            spec.display_name()
        );
        Err(self
            .command
            .clone()
            .error(ErrorKind::ArgumentConflict, message)
            .into())
    }

    fn is_known_flag(&self, flag: &str) -> bool {
        flag == "--help" || self.specs.iter().any(|s| s.matches(flag))
    }

    fn split_unknown(&self, args: Vec<String>) -> (Vec<String>, Vec<(String, Value)>) {
        if !self.allow_unknown {
            return (args, Vec::new());
        }

        let mut known = Vec::with_capacity(args.len());
        let mut unknown = Vec::new();
        let mut terminated = false;

        for token in args {
            if terminated || token == "--" || !token.starts_with("--") {
                terminated |= token == "--";
                known.push(token);
                continue;
            }

            let body = &token[2..];
            let (key, value) = match body.split_once('=') {
                Some((key, value)) => (key, Value::from(value)),
                None => (body, Value::Bool(true)),
            };
            if self.is_known_flag(&format!("--{key}")) {
                known.push(token);
                continue;
            }
            unknown.push((self.settings.keyword_name(key), value));
        }

        (known, unknown)
    }
}

fn read_value(matches: &ArgMatches, spec: &ArgumentSpec) -> Option<Value> {
    match spec.cardinality {
        Cardinality::Flag => Some(Value::Bool(matches.get_flag(&spec.name))),
        Cardinality::Single => matches
            .get_one::<Value>(&spec.name)
            .cloned()
            .or_else(|| spec.default.initial_value()),
        Cardinality::Multiple => {
            let given: Option<Vec<Value>> = matches
                .get_many::<Value>(&spec.name)
                .map(|values| values.cloned().collect());
            match given {
                Some(items) => Some(Value::List(items)),
                None if spec.is_variadic => Some(Value::List(Vec::new())),
                None => spec.default.initial_value(),
            }
        }
    }
}

/// Values produced by one parse.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedArgs {
    values: Vec<(String, Value)>,
    unknown: Vec<(String, Value)>,
}

impl ParsedArgs {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Values for every spec that received or defaulted one, in spec order.
    pub fn values(&self) -> &[(String, Value)] {
        &self.values
    }

    /// Unrecognized `--key[=value]` tokens retained for a keyword collector.
    pub fn unknown(&self) -> &[(String, Value)] {
        &self.unknown
    }
}
