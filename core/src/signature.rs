//! Declared entry-point signatures and the signature inspector.
//!
//! Rust has no runtime reflection over a function's parameter list, so an
//! entry point declares its shape explicitly through [`Signature`]. The
//! inspector ([`inspect`]) then plays the role of introspection: it checks
//! the declaration is usable and hands an ordered parameter list plus a
//! description to the resolver.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::error::SignatureError;
use crate::registry::{ArgOverride, OverrideRegistry};
use crate::value::{DefaultValue, Value};

/// Error type returned by entry-point handlers. Propagated unchanged.
pub type InvocationError = Box<dyn std::error::Error + Send + Sync + 'static>;

type HandlerFn = dyn Fn(&CallArgs) -> Result<Option<Value>, InvocationError> + Send + Sync;

/// The four parameter shapes an entry point can declare.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamKind {
    /// No default; must be supplied.
    Required,
    /// Has a default whose kind drives coercion.
    Keyword(DefaultValue),
    /// Trailing collector for residual positional values (`*args`).
    VarArgs,
    /// Collector for unrecognized `--key=value` pairs (`**kwargs`).
    VarKwargs,
}

/// One declared parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub kind: ParamKind,
}

impl Param {
    pub fn has_default(&self) -> bool {
        matches!(self.kind, ParamKind::Keyword(_))
    }

    /// The declared default; [`DefaultValue::Absent`] for every other shape.
    pub fn default_value(&self) -> DefaultValue {
        match &self.kind {
            ParamKind::Keyword(default) => default.clone(),
            _ => DefaultValue::Absent,
        }
    }

    pub fn is_variadic_positional(&self) -> bool {
        self.kind == ParamKind::VarArgs
    }

    pub fn is_variadic_keyword(&self) -> bool {
        self.kind == ParamKind::VarKwargs
    }
}

/// Ordered parameter declaration for an entry point.
///
/// # Examples
///
/// ```
/// use capstan_core::{DefaultValue, Signature};
///
/// // fn main(foo, bar=0, *args, **kwargs)
/// let sig = Signature::new()
///     .required("foo")
///     .keyword("bar", 0)
///     .args("args")
///     .kwargs("kwargs");
/// assert_eq!(sig.params().len(), 4);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Signature {
    params: Vec<Param>,
}

impl Signature {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn required(mut self, name: impl Into<String>) -> Self {
        self.params.push(Param {
            name: name.into(),
            kind: ParamKind::Required,
        });
        self
    }

    pub fn keyword(mut self, name: impl Into<String>, default: impl Into<DefaultValue>) -> Self {
        self.params.push(Param {
            name: name.into(),
            kind: ParamKind::Keyword(default.into()),
        });
        self
    }

    pub fn args(mut self, name: impl Into<String>) -> Self {
        self.params.push(Param {
            name: name.into(),
            kind: ParamKind::VarArgs,
        });
        self
    }

    pub fn kwargs(mut self, name: impl Into<String>) -> Self {
        self.params.push(Param {
            name: name.into(),
            kind: ParamKind::VarKwargs,
        });
        self
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }
}

/// A named, invocable unit: signature, documentation, overrides, handler.
///
/// The `marked` flag is the invocability marker: only marked entry points
/// report themselves as command-line scripts.
///
/// # Examples
///
/// ```
/// use capstan_core::{ArgOverride, Entrypoint, Signature};
///
/// let entry = Entrypoint::new("greet", Signature::new().keyword("name", "world"), |args| {
///     println!("hello {}", args.get("name").unwrap());
///     Ok(None)
/// })
/// .doc("Say hello")
/// .arg(ArgOverride::new(["--name", "-n"]))
/// .marked();
///
/// assert_eq!(entry.name(), "greet");
/// assert!(entry.is_marked());
/// ```
#[derive(Clone)]
pub struct Entrypoint {
    name: String,
    doc: Option<String>,
    marked: bool,
    signature: Option<Signature>,
    overrides: OverrideRegistry,
    handler: Arc<HandlerFn>,
}

impl Entrypoint {
    pub fn new<F>(name: impl Into<String>, signature: Signature, handler: F) -> Self
    where
        F: Fn(&CallArgs) -> Result<Option<Value>, InvocationError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            doc: None,
            marked: false,
            signature: Some(signature),
            overrides: OverrideRegistry::default(),
            handler: Arc::new(handler),
        }
    }

    /// An entry point whose parameter list cannot be retrieved.
    ///
    /// Inspecting it fails with [`SignatureError::MalformedCallable`].
    pub fn without_signature<F>(name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&CallArgs) -> Result<Option<Value>, InvocationError> + Send + Sync + 'static,
    {
        Self {
            signature: None,
            ..Self::new(name, Signature::new(), handler)
        }
    }

    pub fn doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    pub fn marked(mut self) -> Self {
        self.marked = true;
        self
    }

    /// Registers an explicit argument override, after any earlier ones.
    pub fn arg(mut self, entry: ArgOverride) -> Self {
        self.overrides.add(entry);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_marked(&self) -> bool {
        self.marked
    }

    pub fn signature(&self) -> Option<&Signature> {
        self.signature.as_ref()
    }

    pub fn overrides(&self) -> &OverrideRegistry {
        &self.overrides
    }

    /// Calls the handler. Errors are returned exactly as the handler raised them.
    pub fn invoke(&self, args: &CallArgs) -> Result<Option<Value>, InvocationError> {
        (self.handler)(args)
    }

    pub(crate) fn raw_doc(&self) -> Option<&str> {
        self.doc.as_deref()
    }
}

impl fmt::Debug for Entrypoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entrypoint")
            .field("name", &self.name)
            .field("doc", &self.doc)
            .field("marked", &self.marked)
            .field("signature", &self.signature)
            .field("overrides", &self.overrides)
            .finish_non_exhaustive()
    }
}

/// Result of inspecting an entry point.
#[derive(Debug, Clone, PartialEq)]
pub struct InspectedSignature {
    pub params: Vec<Param>,
    pub description: String,
}

impl InspectedSignature {
    pub fn has_varargs(&self) -> bool {
        self.params.iter().any(Param::is_variadic_positional)
    }

    pub fn has_kwargs(&self) -> bool {
        self.params.iter().any(Param::is_variadic_keyword)
    }

    pub fn find(&self, name: &str) -> Option<&Param> {
        self.params.iter().find(|p| p.name == name)
    }
}

/// Normalizes documentation into a description: trimmed, with common
/// leading indentation removed from continuation lines.
pub fn describe(doc: Option<&str>) -> String {
    let Some(doc) = doc else {
        return String::new();
    };
    let doc = doc.trim();
    let mut lines = doc.lines();
    let Some(first) = lines.next() else {
        return String::new();
    };
    let rest: Vec<&str> = lines.collect();
    let indent = rest
        .iter()
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.chars().take_while(|c| c.is_whitespace()).count())
        .min()
        .unwrap_or(0);

    let mut out = first.trim().to_string();
    for line in rest {
        out.push('\n');
        out.push_str(strip_indent(line, indent).trim_end());
    }
    out
}

/// Drops up to `indent` leading whitespace characters.
fn strip_indent(line: &str, indent: usize) -> &str {
    let cut = line
        .char_indices()
        .take(indent)
        .take_while(|(_, c)| c.is_whitespace())
        .last()
        .map_or(0, |(i, c)| i + c.len_utf8());
    &line[cut..]
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_')
}

/// Extracts the ordered parameter list and description from an entry point.
///
/// # Errors
///
/// - [`SignatureError::MalformedCallable`] when no parameter list exists.
/// - [`SignatureError::InvalidParameter`] for names that are not identifiers.
/// - [`SignatureError::DuplicateParameter`] when a name is declared twice.
pub fn inspect(entry: &Entrypoint) -> Result<InspectedSignature, SignatureError> {
    let signature = entry
        .signature()
        .ok_or_else(|| SignatureError::MalformedCallable(entry.name().to_string()))?;

    let mut seen: Vec<&str> = Vec::new();
    for param in signature.params() {
        if !is_identifier(&param.name) {
            return Err(SignatureError::InvalidParameter(param.name.clone()));
        }
        if seen.contains(&param.name.as_str()) {
            return Err(SignatureError::DuplicateParameter(param.name.clone()));
        }
        seen.push(&param.name);
    }

    let inspected = InspectedSignature {
        params: signature.params().to_vec(),
        description: describe(entry.raw_doc()),
    };
    debug!(
        entrypoint = entry.name(),
        params = inspected.params.len(),
        varargs = inspected.has_varargs(),
        kwargs = inspected.has_kwargs(),
        "Inspected signature"
    );
    Ok(inspected)
}

/// Arguments reconstructed from a parse, shaped like the declared signature.
///
/// Required parameters are positional, defaulted parameters are keywords,
/// residual tokens follow the positionals, and anything routed through the
/// keyword collector lands in [`extra`](CallArgs::extra).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallArgs {
    pub(crate) positional: Vec<(String, Value)>,
    pub(crate) keywords: Vec<(String, Value)>,
    pub(crate) rest: Vec<Value>,
    pub(crate) extra: BTreeMap<String, Value>,
}

impl CallArgs {
    /// Looks up a parameter (or collected keyword) by name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.positional
            .iter()
            .chain(&self.keywords)
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
            .or_else(|| self.extra.get(name))
    }

    /// Positional call values: required parameters in order, then residuals.
    pub fn positional(&self) -> impl Iterator<Item = &Value> {
        self.positional.iter().map(|(_, v)| v).chain(&self.rest)
    }

    pub fn keywords(&self) -> &[(String, Value)] {
        &self.keywords
    }

    /// Values captured by the variadic positional collector.
    pub fn rest(&self) -> &[Value] {
        &self.rest
    }

    /// Values captured by the variadic keyword collector.
    pub fn extra(&self) -> &BTreeMap<String, Value> {
        &self.extra
    }
}
