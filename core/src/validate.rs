//! Validation of resolved argument specifications.
//!
//! Catches flag formats the parser cannot express, flags claimed by two
//! arguments, and collectors that are not in trailing position, before any
//! parser is built.
//!
//! # Examples
//!
//! ```
//! use capstan_core::*;
//!
//! let specs = vec![
//!     ArgumentSpec::keyword("foo", vec!["--foo".into()], DefaultValue::Int(0)),
//!     ArgumentSpec::varargs("args"),
//! ];
//! assert!(validate_specs(&specs).is_empty());
//!
//! // Invalid: two arguments claim --foo
//! let clash = vec![
//!     ArgumentSpec::keyword("foo", vec!["--foo".into()], DefaultValue::Int(0)),
//!     ArgumentSpec::keyword("bar", vec!["--foo".into()], DefaultValue::Int(0)),
//! ];
//! assert!(!validate_specs(&clash).is_empty());
//! ```

use std::collections::HashSet;

use thiserror::Error;

use crate::spec::{ArgumentSpec, Cardinality};

/// Flags the generated parser reserves for itself.
pub const RESERVED_FLAGS: &[&str] = &["--help"];

/// Specification conflicts found while resolving an entry point.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// Short flag is not a dash followed by one character.
    #[error("invalid short flag format: {0}")]
    InvalidShortFlag(String),
    /// Long flag is too short, or its name starts with `-` or holds `=`
    /// or whitespace.
    #[error("invalid long flag format: {0}")]
    InvalidLongFlag(String),
    /// An override mixes a positional name with option strings.
    #[error("override for '{0}' mixes positional names and flags")]
    MixedOverride(String),
    /// Two arguments share a flag, or a flag is reserved.
    #[error("conflicting flag: {0}")]
    DuplicateFlag(String),
    /// Two arguments share a name.
    #[error("duplicate argument name: {0}")]
    DuplicateName(String),
    /// A variadic collector is followed by another argument.
    #[error("variadic argument '{0}' must be last")]
    MisplacedVariadic(String),
    /// More than one collector of the same kind.
    #[error("more than one {0} collector")]
    MultipleCollectors(&'static str),
    /// A required positional follows an optional one.
    #[error("required positional '{0}' follows an optional positional")]
    RequiredAfterOptional(String),
    /// A positional argument would take no value.
    #[error("positional argument '{0}' cannot be a boolean flag")]
    PositionalFlag(String),
    /// An override names no parameter and there is no keyword collector.
    #[error("override targets unknown parameter '{0}' and no keyword collector exists")]
    UnknownTarget(String),
}

/// Validates a resolved, ordered spec list.
///
/// Returns every problem found, stopping early inside each check the way a
/// single bad flag usually implies more.
pub fn validate_specs(specs: &[ArgumentSpec]) -> Vec<ResolveError> {
    let mut errors = Vec::new();

    errors.extend(validate_flags(specs));
    if !errors.is_empty() {
        return errors;
    }

    errors.extend(validate_names(specs));
    if !errors.is_empty() {
        return errors;
    }

    errors.extend(validate_placement(specs));
    errors
}

fn validate_flags(specs: &[ArgumentSpec]) -> Vec<ResolveError> {
    let mut errors = Vec::new();
    let mut seen: HashSet<&str> = RESERVED_FLAGS.iter().copied().collect();

    for flag in specs.iter().flat_map(|s| s.flags.iter()) {
        if let Some(body) = flag.strip_prefix("--") {
            let malformed = body.is_empty()
                || body.starts_with('-')
                || body.contains(|c: char| c == '=' || c.is_whitespace());
            if malformed {
                errors.push(ResolveError::InvalidLongFlag(flag.clone()));
                return errors;
            }
        } else if !flag.starts_with('-') || flag.chars().count() != 2 {
            errors.push(ResolveError::InvalidShortFlag(flag.clone()));
            return errors;
        }

        if !seen.insert(flag.as_str()) {
            errors.push(ResolveError::DuplicateFlag(flag.clone()));
            return errors;
        }
    }

    errors
}

fn validate_names(specs: &[ArgumentSpec]) -> Vec<ResolveError> {
    let mut seen: HashSet<&str> = HashSet::new();
    specs
        .iter()
        .filter(|s| !seen.insert(s.name.as_str()))
        .map(|s| ResolveError::DuplicateName(s.name.clone()))
        .take(1)
        .collect()
}

fn validate_placement(specs: &[ArgumentSpec]) -> Vec<ResolveError> {
    let mut errors = Vec::new();

    if specs.iter().filter(|s| s.is_variadic).count() > 1 {
        errors.push(ResolveError::MultipleCollectors("positional"));
        return errors;
    }
    if specs.iter().filter(|s| s.is_keyword_variadic).count() > 1 {
        errors.push(ResolveError::MultipleCollectors("keyword"));
        return errors;
    }

    for (i, spec) in specs.iter().enumerate() {
        let rest = &specs[i + 1..];
        if spec.is_keyword_variadic && !rest.is_empty() {
            errors.push(ResolveError::MisplacedVariadic(spec.name.clone()));
            return errors;
        }
        if spec.is_variadic && rest.iter().any(|s| !s.is_keyword_variadic) {
            errors.push(ResolveError::MisplacedVariadic(spec.name.clone()));
            return errors;
        }
    }

    let positionals: Vec<&ArgumentSpec> = specs
        .iter()
        .filter(|s| s.is_positional && !s.is_variadic)
        .collect();
    let has_varargs = specs.iter().any(|s| s.is_variadic);

    for (i, spec) in positionals.iter().enumerate() {
        if spec.cardinality == Cardinality::Flag {
            errors.push(ResolveError::PositionalFlag(spec.name.clone()));
            return errors;
        }
        // A repeatable positional swallows everything after it.
        let is_last = i + 1 == positionals.len() && !has_varargs;
        if spec.cardinality == Cardinality::Multiple && !is_last {
            errors.push(ResolveError::MisplacedVariadic(spec.name.clone()));
            return errors;
        }
    }

    let mut optional_seen = false;
    for spec in positionals {
        if spec.required && optional_seen {
            errors.push(ResolveError::RequiredAfterOptional(spec.name.clone()));
            return errors;
        }
        optional_seen |= !spec.required;
    }

    errors
}
