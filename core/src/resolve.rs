//! Specification resolver.
//!
//! Turns an inspected signature plus registered overrides into the final,
//! ordered list of [`ArgumentSpec`]s:
//!
//! 1. every declared parameter gets a baseline spec (`--name` for ordinary
//!    parameters, residual capture for `*args`, unknown-flag capture for
//!    `**kwargs`), with coercion and cardinality derived from its default;
//! 2. overrides registered for a parameter are folded and laid over its
//!    baseline;
//! 3. overrides naming no parameter become extra arguments delivered through
//!    the keyword collector, placed ahead of the collectors;
//! 4. the result is validated.
//!
//! # Example
//!
//! ```
//! use capstan_core::*;
//!
//! let entry = Entrypoint::new(
//!     "main",
//!     Signature::new().required("foo").keyword("bar", 0).args("args").kwargs("kwargs"),
//!     |_| Ok(None),
//! );
//! let inspected = inspect(&entry).unwrap();
//! let specs = resolve(&inspected, entry.overrides()).unwrap();
//!
//! let names: Vec<&str> = specs.iter().map(|s| s.name.as_str()).collect();
//! assert_eq!(names, vec!["foo", "bar", "args", "kwargs"]);
//! assert!(specs[0].required);
//! assert!(specs[2].is_variadic);
//! assert!(specs[3].is_keyword_variadic);
//! ```

use tracing::debug;

use crate::merge::apply_override;
use crate::registry::{ArgOverride, OverrideRegistry};
use crate::settings::ParserSettings;
use crate::signature::{InspectedSignature, Param, ParamKind};
use crate::spec::{ArgumentSpec, Origin};
use crate::validate::{ResolveError, validate_specs};
use crate::value::DefaultValue;

/// Resolves specs under a given set of [`ParserSettings`].
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'a> {
    settings: &'a ParserSettings,
}

impl<'a> Resolver<'a> {
    pub fn new(settings: &'a ParserSettings) -> Self {
        Self { settings }
    }

    /// Produces the ordered spec list for an inspected signature.
    ///
    /// # Errors
    ///
    /// Returns the first [`ResolveError`] found: a malformed override, an
    /// override for an unknown parameter without a keyword collector, or any
    /// conflict reported by [`validate_specs`].
    pub fn resolve(
        &self,
        inspected: &InspectedSignature,
        overrides: &OverrideRegistry,
    ) -> Result<Vec<ArgumentSpec>, ResolveError> {
        let mut specs: Vec<ArgumentSpec> = Vec::with_capacity(inspected.params.len());

        for param in &inspected.params {
            let mut spec = self.baseline(param);
            if let Some(entry) = overrides.resolve(&param.name) {
                check_override(&param.name, &entry)?;
                if spec.is_collector() {
                    spec.help = entry.help.or(spec.help);
                    spec.metavar = entry.metavar.or(spec.metavar);
                } else {
                    apply_override(&mut spec, &entry);
                }
            }
            specs.push(spec);
        }

        let mut extras = Vec::new();
        for target in overrides.targets() {
            if inspected.find(&target).is_some() {
                continue;
            }
            if !inspected.has_kwargs() {
                return Err(ResolveError::UnknownTarget(target));
            }
            let Some(entry) = overrides.resolve(&target) else {
                continue;
            };
            check_override(&target, &entry)?;
            extras.push(self.extra(&target, &entry));
        }

        let insert_at = specs
            .iter()
            .position(ArgumentSpec::is_collector)
            .unwrap_or(specs.len());
        specs.splice(insert_at..insert_at, extras);

        if let Some(err) = validate_specs(&specs).into_iter().next() {
            return Err(err);
        }

        debug!(
            specs = specs.len(),
            overrides = overrides.entries().len(),
            "Resolved argument specs"
        );
        Ok(specs)
    }

    fn baseline(&self, param: &Param) -> ArgumentSpec {
        match &param.kind {
            ParamKind::Required => {
                let mut spec = ArgumentSpec::keyword(
                    &param.name,
                    vec![self.settings.long_flag(&param.name)],
                    DefaultValue::Absent,
                );
                spec.origin = Origin::Required;
                spec
            }
            ParamKind::Keyword(default) => ArgumentSpec::keyword(
                &param.name,
                vec![self.settings.long_flag(&param.name)],
                default.clone(),
            ),
            ParamKind::VarArgs => ArgumentSpec::varargs(&param.name),
            ParamKind::VarKwargs => ArgumentSpec::kwargs(&param.name),
        }
    }

    /// Builds a spec for an override that names no declared parameter.
    ///
    /// Flagged extras are optional unless the override says otherwise;
    /// positional extras are required unless they carry a default.
    fn extra(&self, name: &str, entry: &ArgOverride) -> ArgumentSpec {
        let mut spec = if entry.is_positional() {
            ArgumentSpec::positional(name, DefaultValue::Absent)
        } else {
            ArgumentSpec::keyword(name, vec![self.settings.long_flag(name)], DefaultValue::Absent)
        };
        apply_override(&mut spec, entry);
        if !spec.is_positional && entry.required.is_none() && entry.default.is_none() {
            spec.required = false;
        }
        spec.origin = Origin::Override;
        spec
    }
}

fn check_override(name: &str, entry: &ArgOverride) -> Result<(), ResolveError> {
    let bare = entry.flags.iter().filter(|f| !f.starts_with('-')).count();
    if bare > 1 || (bare == 1 && entry.flags.len() > 1) {
        return Err(ResolveError::MixedOverride(name.to_string()));
    }
    Ok(())
}

/// Resolves with default settings.
///
/// # Errors
///
/// See [`Resolver::resolve`].
pub fn resolve(
    inspected: &InspectedSignature,
    overrides: &OverrideRegistry,
) -> Result<Vec<ArgumentSpec>, ResolveError> {
    Resolver::new(&ParserSettings::default()).resolve(inspected, overrides)
}
