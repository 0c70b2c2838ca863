//! Dispatching parsed arguments to an entry point.
//!
//! A run moves through [`Stage`]s in order and never skips one. A usage
//! error stops it at parsing; a handler failure is handed back untouched.

use serde::Serialize;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::parser::{ParsedArgs, ScriptParser};
use crate::signature::{CallArgs, Entrypoint};
use crate::spec::{ArgumentSpec, Origin};
use crate::value::Value;

/// Lifecycle of a single run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Unresolved,
    SpecResolved,
    ParserBuilt,
    Parsed,
    Dispatched,
}

/// Maps a handler's return value to a process exit code.
///
/// Nothing and `0` mean success, any other integer is used as the code, and
/// every other value is ignored for exit-status purposes.
///
/// # Examples
///
/// ```
/// use capstan_core::{Value, exit_code};
///
/// assert_eq!(exit_code(None), 0);
/// assert_eq!(exit_code(Some(&Value::Int(3))), 3);
/// assert_eq!(exit_code(Some(&Value::from("done"))), 0);
/// ```
pub fn exit_code(returned: Option<&Value>) -> i32 {
    match returned {
        Some(Value::Int(code)) => i32::try_from(*code).unwrap_or(1),
        _ => 0,
    }
}

/// Rebuilds handler arguments from a parse, following each spec's origin.
pub fn build_call(specs: &[ArgumentSpec], parsed: ParsedArgs) -> CallArgs {
    let mut call = CallArgs::default();

    for spec in specs.iter().filter(|s| !s.is_keyword_variadic) {
        let Some(value) = parsed.get(&spec.name).cloned() else {
            continue;
        };
        let name = spec.name.clone();
        match spec.origin {
            Origin::Required => call.positional.push((name, value)),
            Origin::Keyword => call.keywords.push((name, value)),
            Origin::Override => {
                call.extra.insert(name, value);
            }
            Origin::Collector => {
                call.rest = match value {
                    Value::List(items) => items,
                    other => vec![other],
                };
            }
        }
    }

    for (key, value) in parsed.unknown() {
        call.extra.insert(key.clone(), value.clone());
    }
    call
}

/// Parses `raw_args` with `parser` and invokes `entry`.
///
/// # Errors
///
/// - [`Error::Usage`] when the arguments do not fit the parser.
/// - [`Error::Invocation`] carrying the handler's own error.
pub fn run<I, T>(entry: &Entrypoint, parser: &ScriptParser, raw_args: I) -> Result<i32>
where
    I: IntoIterator<Item = T>,
    T: Into<String>,
{
    let parsed = parser.parse(raw_args)?;
    invoke(entry, parser.specs(), parsed)
}

/// Invokes `entry` with an already parsed set of arguments.
///
/// # Errors
///
/// [`Error::Invocation`] carrying the handler's own error.
pub fn invoke(entry: &Entrypoint, specs: &[ArgumentSpec], parsed: ParsedArgs) -> Result<i32> {
    debug!(
        entrypoint = entry.name(),
        values = parsed.values().len(),
        unknown = parsed.unknown().len(),
        "Parsed arguments"
    );

    let call = build_call(specs, parsed);
    let returned = entry.invoke(&call).map_err(Error::Invocation)?;
    let code = exit_code(returned.as_ref());
    info!(entrypoint = entry.name(), code, "Dispatched");
    Ok(code)
}
