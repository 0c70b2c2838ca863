//! Error types for signature inspection, parsing, and dispatch.
//!
//! Resolution errors are [`ResolveError`]; this module covers the
//! rest of the pipeline and the crate-wide [`enum@Error`].

use std::fmt;

use thiserror::Error;

use crate::signature::InvocationError;
use crate::validate::ResolveError;

/// The entry point cannot be used as a command-line target.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    /// No parameter list could be retrieved.
    #[error("malformed callable '{0}': no inspectable signature")]
    MalformedCallable(String),
    /// A declared parameter name is not a valid identifier.
    #[error("invalid parameter name: {0}")]
    InvalidParameter(String),
    /// Two parameters share a name.
    #[error("duplicate parameter: {0}")]
    DuplicateParameter(String),
}

/// Command-line input did not fit the built parser.
///
/// Wraps the parser's own diagnostic. Help and version requests also
/// surface here, with exit code 0.
#[derive(Debug)]
pub struct UsageError(clap::Error);

impl UsageError {
    pub fn exit_code(&self) -> i32 {
        self.0.exit_code()
    }

    /// True for `--help` style output rather than a real failure.
    pub fn is_display(&self) -> bool {
        !self.0.use_stderr()
    }

    pub fn kind(&self) -> clap::error::ErrorKind {
        self.0.kind()
    }

    /// Renders the diagnostic without ANSI styling.
    pub fn message(&self) -> String {
        self.0.render().to_string()
    }

    /// Prints the diagnostic to stdout or stderr as the parser would.
    pub fn print(&self) -> std::io::Result<()> {
        self.0.print()
    }
}

impl fmt::Display for UsageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message().trim_end())
    }
}

impl std::error::Error for UsageError {}

impl From<clap::Error> for UsageError {
    fn from(err: clap::Error) -> Self {
        Self(err)
    }
}

/// Anything that stops a run before or during dispatch.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Signature(#[from] SignatureError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Usage(#[from] UsageError),

    /// The handler itself failed; the original error is the source.
    #[error("{0}")]
    Invocation(#[source] InvocationError),

    /// Settings file could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Settings file could not be parsed.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl Error {
    /// Process exit status for this failure.
    ///
    /// Usage errors keep the parser's code (0 for help output); everything
    /// else is 1.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Usage(usage) => usage.exit_code(),
            _ => 1,
        }
    }
}

/// Convenience alias for results with [`enum@Error`].
pub type Result<T> = std::result::Result<T, Error>;
