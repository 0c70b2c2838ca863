//! Command-line interfaces inferred from function signatures.
//!
//! An [`Entrypoint`] pairs a handler with a declared [`Signature`]. Its
//! parameters become command-line arguments:
//!
//! - [`inspect`] reads the parameter list and documentation of an entry
//!   point.
//! - [`Resolver`] turns parameters plus any registered [`ArgOverride`]s into
//!   an ordered list of [`ArgumentSpec`]s. Each parameter's default decides
//!   its coercion and cardinality. Conflicts are caught by [`validate_specs`].
//! - [`ParserBuilder`] turns specs into a [`ScriptParser`] backed by `clap`.
//! - [`run`] parses raw arguments, rebuilds the call, invokes the handler,
//!   and maps its return value to an exit code with [`exit_code`].
//!
//! [`Script`] ties these together and memoizes the resolved interface.
//!
//! # Example
//!
//! ```
//! use capstan_core::*;
//!
//! let entry = Entrypoint::new(
//!     "main",
//!     Signature::new()
//!         .required("foo")
//!         .keyword("bar", 0)
//!         .args("args")
//!         .kwargs("kwargs"),
//!     |args| {
//!         assert_eq!(args.get("bar"), Some(&Value::Int(0)));
//!         assert_eq!(args.extra().get("che"), Some(&Value::from("oh_yeah")));
//!         Ok(None)
//!     },
//! )
//! .marked();
//!
//! let script = Script::new(entry);
//! let code = script.run(["--foo=1", "--che=oh_yeah", "awesome"]).unwrap();
//! assert_eq!(code, 0);
//! ```

mod dispatch;
mod error;
mod merge;
mod parser;
mod registry;
mod resolve;
mod script;
mod settings;
mod signature;
mod spec;
mod validate;
mod value;

pub use dispatch::{Stage, build_call, exit_code, invoke, run};
pub use error::{Error, Result, SignatureError, UsageError};
pub use merge::{apply_override, merge_overrides};
pub use parser::{ParsedArgs, ParserBuilder, ScriptParser};
pub use registry::{ArgOverride, OverrideRegistry};
pub use resolve::{Resolver, resolve};
pub use script::{Script, ScriptSchema};
pub use settings::ParserSettings;
pub use signature::{
    CallArgs, Entrypoint, InspectedSignature, InvocationError, Param, ParamKind, Signature,
    describe, inspect,
};
pub use spec::{ArgumentSpec, Cardinality, Origin};
pub use validate::{RESERVED_FLAGS, ResolveError, validate_specs};
pub use value::{Coercion, CustomCoercion, DefaultValue, Value};
