//! The script owner: one entry point, its resolved specs, and its parser.

use std::cell::Cell;

use once_cell::unsync::OnceCell;
use serde::Serialize;
use tracing::debug;

use crate::dispatch::{self, Stage};
use crate::error::Result;
use crate::parser::{ParsedArgs, ParserBuilder, ScriptParser};
use crate::resolve::Resolver;
use crate::settings::ParserSettings;
use crate::signature::{Entrypoint, describe, inspect};
use crate::spec::ArgumentSpec;

/// Binds an entry point to its resolved interface.
///
/// Spec resolution runs once and its result (including a failure) is kept;
/// the parser is built on first use.
///
/// # Examples
///
/// ```
/// use capstan_core::{Entrypoint, Script, Signature, Value};
///
/// let entry = Entrypoint::new(
///     "main",
///     Signature::new().keyword("count", 1).keyword("match_all", false),
///     |args| Ok(args.get("count").cloned()),
/// )
/// .doc("count things")
/// .marked();
///
/// let script = Script::new(entry);
/// assert!(script.is_cli());
/// assert_eq!(script.description(), "count things");
///
/// let parsed = script.parse(["--match-all"]).unwrap();
/// assert_eq!(parsed.get("match_all"), Some(&Value::Bool(true)));
/// assert_eq!(script.run(["--count=4"]).unwrap(), 4);
/// ```
#[derive(Debug)]
pub struct Script {
    entry: Entrypoint,
    settings: ParserSettings,
    specs: OnceCell<std::result::Result<Vec<ArgumentSpec>, crate::Error>>,
    parser: OnceCell<ScriptParser>,
    stage: Cell<Stage>,
}

/// Serializable view of a script's resolved interface.
#[derive(Debug, Clone, Serialize)]
pub struct ScriptSchema {
    pub name: String,
    pub description: String,
    pub allow_unknown: bool,
    pub arguments: Vec<ArgumentSpec>,
}

impl Script {
    pub fn new(entry: Entrypoint) -> Self {
        Self::with_settings(entry, ParserSettings::default())
    }

    pub fn with_settings(entry: Entrypoint, settings: ParserSettings) -> Self {
        Self {
            entry,
            settings,
            specs: OnceCell::new(),
            parser: OnceCell::new(),
            stage: Cell::new(Stage::Unresolved),
        }
    }

    pub fn name(&self) -> &str {
        self.entry.name()
    }

    pub fn entrypoint(&self) -> &Entrypoint {
        &self.entry
    }

    /// Furthest stage this script has reached.
    pub fn stage(&self) -> Stage {
        self.stage.get()
    }

    fn advance(&self, stage: Stage) {
        if stage > self.stage.get() {
            debug!(script = self.name(), ?stage, "Stage reached");
            self.stage.set(stage);
        }
    }

    /// Full documentation text, trimmed; empty when undocumented.
    pub fn description(&self) -> String {
        describe(self.entry.raw_doc())
    }

    /// First line of the description.
    pub fn summary(&self) -> String {
        self.description().lines().next().unwrap_or("").to_string()
    }

    /// Resolved specs, computed once.
    ///
    /// # Errors
    ///
    /// [`Signature`](crate::Error::Signature) or
    /// [`Resolve`](crate::Error::Resolve) errors, returned again on every
    /// call once they have occurred.
    pub fn specs(&self) -> std::result::Result<&[ArgumentSpec], &crate::Error> {
        let resolved = self.specs.get_or_init(|| {
            let inspected = inspect(&self.entry)?;
            let specs = Resolver::new(&self.settings).resolve(&inspected, self.entry.overrides())?;
            Ok(specs)
        });
        match resolved {
            Ok(specs) => {
                self.advance(Stage::SpecResolved);
                Ok(specs)
            }
            Err(err) => Err(err),
        }
    }

    /// The parser, built on first access.
    ///
    /// # Errors
    ///
    /// Whatever [`specs`](Script::specs) fails with.
    pub fn parser(&self) -> std::result::Result<&ScriptParser, &crate::Error> {
        let parser = self.parser.get_or_try_init(|| {
            let specs = self.specs()?;
            let parser = ParserBuilder::new(self.name())
                .description(self.description())
                .settings(self.settings.clone())
                .build(specs, false);
            Ok::<_, &crate::Error>(parser)
        })?;
        self.advance(Stage::ParserBuilt);
        Ok(parser)
    }

    /// True when the entry point is marked as a script and a parser can be
    /// built for it.
    pub fn is_cli(&self) -> bool {
        self.entry.is_marked() && self.parser().is_ok()
    }

    /// Parses arguments without dispatching.
    ///
    /// # Errors
    ///
    /// Resolution errors, or [`Usage`](crate::Error::Usage) for bad input.
    pub fn parse<I, T>(&self, args: I) -> Result<ParsedArgs>
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let parser = self.parser().map_err(clone_error)?;
        let parsed = parser.parse(args)?;
        self.advance(Stage::Parsed);
        Ok(parsed)
    }

    /// Parses arguments and invokes the entry point.
    ///
    /// # Errors
    ///
    /// Resolution and usage errors, or
    /// [`Invocation`](crate::Error::Invocation) with the handler's error.
    pub fn run<I, T>(&self, args: I) -> Result<i32>
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let parser = self.parser().map_err(clone_error)?;
        let parsed = parser.parse(args)?;
        self.advance(Stage::Parsed);
        let code = dispatch::invoke(&self.entry, parser.specs(), parsed)?;
        self.advance(Stage::Dispatched);
        Ok(code)
    }

    /// Describes the resolved interface.
    ///
    /// # Errors
    ///
    /// Resolution errors.
    pub fn schema(&self) -> Result<ScriptSchema> {
        let parser = self.parser().map_err(clone_error)?;
        Ok(ScriptSchema {
            name: self.name().to_string(),
            description: self.description(),
            allow_unknown: parser.allow_unknown(),
            arguments: parser.specs().to_vec(),
        })
    }
}

/// Memoized failures are shared; hand callers an owned copy.
fn clone_error(err: &crate::Error) -> crate::Error {
    match err {
        crate::Error::Signature(e) => crate::Error::Signature(e.clone()),
        crate::Error::Resolve(e) => crate::Error::Resolve(e.clone()),
        other => crate::Error::Invocation(other.to_string().into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, SignatureError};
    use crate::registry::ArgOverride;
    use crate::signature::Signature;
    use crate::validate::ResolveError;
    use crate::value::Value;

    fn main_entry(signature: Signature) -> Entrypoint {
        Entrypoint::new("main", signature, |_| Ok(Some(Value::Int(0))))
    }

    #[test]
    fn test_description_from_doc() {
        let script = Script::new(main_entry(Signature::new().args("args").kwargs("kwargs")));
        assert_eq!(script.description(), "");

        let script = Script::new(
            main_entry(Signature::new().args("args").kwargs("kwargs")).doc("this is the description"),
        );
        script.parse(Vec::<String>::new()).unwrap();
        assert_eq!(script.description(), "this is the description");
        assert_eq!(script.parser().unwrap().description(), "this is the description");
    }

    #[test]
    fn test_summary_is_first_line() {
        let script = Script::new(main_entry(Signature::new()).doc("run the thing\n\nlonger text"));
        assert_eq!(script.summary(), "run the thing");
    }

    #[test]
    fn test_is_cli_requires_marker_and_signature() {
        let unmarked = Script::new(main_entry(Signature::new()));
        assert!(!unmarked.is_cli());

        let marked = Script::new(main_entry(Signature::new()).marked());
        assert!(marked.is_cli());

        let missing = Script::new(Entrypoint::without_signature("main", |_| Ok(None)).marked());
        assert!(!missing.is_cli());
    }

    #[test]
    fn test_specs_are_memoized() {
        let script = Script::new(main_entry(Signature::new().required("foo").keyword("bar", 0)));
        let first = script.specs().unwrap().as_ptr();
        let second = script.specs().unwrap().as_ptr();
        assert_eq!(first, second);
    }

    #[test]
    fn test_resolution_error_is_kept() {
        let script = Script::new(
            main_entry(Signature::new().keyword("foo", 1)).arg(ArgOverride::new(["--nope"])),
        );
        assert!(matches!(
            script.specs(),
            Err(Error::Resolve(ResolveError::UnknownTarget(_)))
        ));
        assert!(matches!(
            script.run(Vec::<String>::new()),
            Err(Error::Resolve(ResolveError::UnknownTarget(_)))
        ));
        assert_eq!(script.stage(), Stage::Unresolved);
    }

    #[test]
    fn test_malformed_callable_surfaces_on_parse() {
        let script = Script::new(Entrypoint::without_signature("main", |_| Ok(None)));
        assert!(matches!(
            script.parse(Vec::<String>::new()),
            Err(Error::Signature(SignatureError::MalformedCallable(_)))
        ));
    }

    #[test]
    fn test_stages_advance_in_order() {
        let script = Script::new(main_entry(Signature::new().keyword("foo", 0)));
        assert_eq!(script.stage(), Stage::Unresolved);
        script.specs().unwrap();
        assert_eq!(script.stage(), Stage::SpecResolved);
        script.parser().unwrap();
        assert_eq!(script.stage(), Stage::ParserBuilt);

        assert!(script.run(["--foo=x"]).is_err());
        assert_eq!(script.stage(), Stage::ParserBuilt);

        assert_eq!(script.run(["--foo=2"]).unwrap(), 0);
        assert_eq!(script.stage(), Stage::Dispatched);
    }

    #[test]
    fn test_failed_handler_still_reaches_parsed() {
        let script = Script::new(Entrypoint::new("main", Signature::new().keyword("foo", 0), |_| {
            Err("boom_error".into())
        }));
        assert!(matches!(script.run(["--foo=1"]), Err(Error::Invocation(_))));
        assert_eq!(script.stage(), Stage::Parsed);
    }

    #[test]
    fn test_schema_lists_arguments() {
        let script = Script::new(main_entry(Signature::new().keyword("foo", 0).kwargs("kwargs")));
        let schema = script.schema().unwrap();
        assert_eq!(schema.arguments.len(), 2);
        assert!(schema.allow_unknown);

        let json = serde_json::to_value(&schema).unwrap();
        assert_eq!(json["arguments"][0]["flags"][0], "--foo");
        assert_eq!(json["arguments"][0]["coercion"], "int");
        assert_eq!(json["arguments"][0]["default"]["kind"], "int");
    }
}
