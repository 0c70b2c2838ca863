//! Field-by-field merging of overrides.
//!
//! Two merges happen during resolution: overrides registered for the same
//! name fold into one ([`merge_overrides`]), and the folded override is laid
//! over the inferred baseline spec ([`apply_override`]). In both, a field is
//! replaced only when the later side sets it.
//!
//! # Example
//!
//! ```
//! use capstan_core::{ArgOverride, ArgumentSpec, Cardinality, DefaultValue, apply_override};
//!
//! let mut spec = ArgumentSpec::keyword("foo", vec!["--foo".into()], DefaultValue::Absent);
//! apply_override(&mut spec, &ArgOverride::new(["--foo", "-f"]).default(true));
//!
//! assert_eq!(spec.flags, vec!["--foo", "-f"]);
//! assert_eq!(spec.cardinality, Cardinality::Flag);
//! assert!(!spec.required);
//! ```

use crate::registry::ArgOverride;
use crate::spec::ArgumentSpec;

/// Folds `later` into `base`; fields left unset by `later` keep their value.
pub fn merge_overrides(base: &mut ArgOverride, later: &ArgOverride) {
    if !later.flags.is_empty() {
        base.flags = later.flags.clone();
    }
    if later.dest.is_some() {
        base.dest = later.dest.clone();
    }
    if later.default.is_some() {
        base.default = later.default.clone();
    }
    if later.required.is_some() {
        base.required = later.required;
    }
    if later.help.is_some() {
        base.help = later.help.clone();
    }
    if later.metavar.is_some() {
        base.metavar = later.metavar.clone();
    }
}

/// Lays an override over an inferred spec.
///
/// Explicit flags replace the derived set (a bare name turns the spec into
/// a positional); an explicit default replaces the inferred one and
/// re-derives coercion and cardinality; an explicit `required` wins over
/// whatever the default implied.
pub fn apply_override(spec: &mut ArgumentSpec, entry: &ArgOverride) {
    if entry.is_positional() {
        spec.flags.clear();
        spec.is_positional = true;
    } else if !entry.flags.is_empty() {
        spec.flags = entry.flags.clone();
        spec.is_positional = false;
    }

    if let Some(default) = &entry.default {
        spec.set_default(default.clone());
    }
    if let Some(required) = entry.required {
        spec.required = required;
    }
    if entry.help.is_some() {
        spec.help = entry.help.clone();
    }
    if entry.metavar.is_some() {
        spec.metavar = entry.metavar.clone();
    }
}
