//! Runtime values, coercions, and declared default kinds.
//!
//! A declared default is more than a value: its *kind* decides how a raw
//! command-line token is coerced and how many times a flag may appear.
//! [`DefaultValue`] captures that kind explicitly, and [`Coercion`] is the
//! function chosen for it once, at resolution time.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use serde::{Serialize, Serializer};

/// A value produced by coercing command-line input, or a declared default.
///
/// # Examples
///
/// ```
/// use capstan_core::Value;
///
/// let v = Value::from(5);
/// assert_eq!(v.as_int(), Some(5));
/// assert_eq!(v.to_string(), "5");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
}

impl Value {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Returns the coercion that turns a raw token into a value of this kind.
    pub fn coercion(&self) -> Coercion {
        match self {
            Value::Bool(_) => Coercion::Bool,
            Value::Int(_) => Coercion::Int,
            Value::Float(_) => Coercion::Float,
            Value::Str(_) | Value::List(_) => Coercion::Raw,
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Value::Bool(_) => 0,
            Value::Int(_) | Value::Float(_) => 1,
            Value::Str(_) => 2,
            Value::List(_) => 3,
        }
    }

    /// Total order used to make set defaults deterministic.
    ///
    /// Kinds sort as bool < number < string < list; numbers compare by
    /// magnitude regardless of int/float representation.
    pub fn total_cmp(&self, other: &Value) -> Ordering {
        match (self, other) {
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            (Value::Int(a), Value::Int(b)) => a.cmp(b),
            (Value::Float(a), Value::Float(b)) => a.total_cmp(b),
            (Value::Int(a), Value::Float(b)) => (*a as f64).total_cmp(b),
            (Value::Float(a), Value::Int(b)) => a.total_cmp(&(*b as f64)),
            (Value::Str(a), Value::Str(b)) => a.cmp(b),
            (Value::List(a), Value::List(b)) => {
                for (x, y) in a.iter().zip(b) {
                    let ord = x.total_cmp(y);
                    if ord != Ordering::Equal {
                        return ord;
                    }
                }
                a.len().cmp(&b.len())
            }
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(n) => write!(f, "{n}"),
            Value::Float(x) => write!(f, "{x:?}"),
            Value::Str(s) => f.write_str(s),
            Value::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(i64::from(n))
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

type CoerceFn = dyn Fn(&str) -> Result<Value, String> + Send + Sync;

/// A user-supplied coercion function with a display name.
///
/// Two custom coercions are equal when they share the same name and the
/// same underlying function.
#[derive(Clone)]
pub struct CustomCoercion {
    name: String,
    func: Arc<CoerceFn>,
}

impl CustomCoercion {
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for CustomCoercion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomCoercion")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl PartialEq for CustomCoercion {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && Arc::ptr_eq(&self.func, &other.func)
    }
}

/// How a raw command-line token becomes a [`Value`].
///
/// # Examples
///
/// ```
/// use capstan_core::{Coercion, Value};
///
/// assert_eq!(Coercion::Int.apply("42"), Ok(Value::Int(42)));
/// assert!(Coercion::Int.apply("forty-two").is_err());
///
/// let upper = Coercion::custom("upper", |raw| Ok(Value::from(raw.to_uppercase())));
/// assert_eq!(upper.apply("abc"), Ok(Value::from("ABC")));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Coercion {
    /// Keep the token as a string.
    Raw,
    Int,
    Float,
    Bool,
    Custom(CustomCoercion),
}

impl Coercion {
    /// Wraps a user function as a named coercion.
    pub fn custom<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&str) -> Result<Value, String> + Send + Sync + 'static,
    {
        Coercion::Custom(CustomCoercion {
            name: name.into(),
            func: Arc::new(func),
        })
    }

    pub fn name(&self) -> &str {
        match self {
            Coercion::Raw => "str",
            Coercion::Int => "int",
            Coercion::Float => "float",
            Coercion::Bool => "bool",
            Coercion::Custom(custom) => custom.name(),
        }
    }

    /// Coerces one raw token.
    ///
    /// # Errors
    ///
    /// Returns a human-readable message when the token cannot be converted.
    pub fn apply(&self, raw: &str) -> Result<Value, String> {
        match self {
            Coercion::Raw => Ok(Value::Str(raw.to_string())),
            Coercion::Int => raw
                .trim()
                .parse::<i64>()
                .map(Value::Int)
                .map_err(|_| format!("invalid int value: '{raw}'")),
            Coercion::Float => raw
                .trim()
                .parse::<f64>()
                .map(Value::Float)
                .map_err(|_| format!("invalid float value: '{raw}'")),
            Coercion::Bool => match raw.trim().to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" | "on" => Ok(Value::Bool(true)),
                "false" | "0" | "no" | "off" => Ok(Value::Bool(false)),
                _ => Err(format!("invalid bool value: '{raw}'")),
            },
            Coercion::Custom(custom) => (custom.func)(raw),
        }
    }
}

impl Serialize for Coercion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

/// The declared default of a keyword parameter.
///
/// Each variant corresponds to one row of the default-kind table: the
/// variant, not only the value inside it, decides cardinality and coercion.
///
/// # Examples
///
/// ```
/// use capstan_core::{Coercion, DefaultValue, Value};
///
/// // `foo=[int]`: repeatable flag, each value parsed as an integer
/// let list_of = DefaultValue::ListOf(Coercion::Int);
/// assert!(list_of.initial_value().is_none());
///
/// // `foo=[1, 2]`: one value, restricted to the listed elements
/// let choices = DefaultValue::list([1, 2]);
/// assert_eq!(choices.initial_value(), Some(Value::from(vec![1, 2])));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum DefaultValue {
    /// No default: the parameter is required.
    Absent,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    /// A list of concrete values; empty means "repeatable raw strings".
    List(Vec<Value>),
    /// A one-element list holding a coercion, e.g. `[int]`.
    ListOf(Coercion),
    /// A set of concrete values; empty means "repeatable raw strings".
    Set(Vec<Value>),
    /// A bare type or function: no default value, but supplied input goes
    /// through this coercion.
    Type(Coercion),
}

impl DefaultValue {
    pub fn list<T: Into<Value>>(items: impl IntoIterator<Item = T>) -> Self {
        DefaultValue::List(items.into_iter().map(Into::into).collect())
    }

    /// Builds a set default. Elements are sorted and de-duplicated so that
    /// the element used for coercion does not depend on insertion order.
    pub fn set<T: Into<Value>>(items: impl IntoIterator<Item = T>) -> Self {
        let mut items: Vec<Value> = items.into_iter().map(Into::into).collect();
        items.sort_by(Value::total_cmp);
        items.dedup_by(|a, b| a.total_cmp(b) == Ordering::Equal);
        DefaultValue::Set(items)
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, DefaultValue::Absent)
    }

    /// Returns true when the default carries no usable value, so the
    /// parameter must be supplied on the command line.
    pub fn requires_input(&self) -> bool {
        matches!(
            self,
            DefaultValue::Absent | DefaultValue::Type(_) | DefaultValue::ListOf(_)
        )
    }

    /// The value a parameter takes when its flag is not given.
    pub fn initial_value(&self) -> Option<Value> {
        match self {
            DefaultValue::Absent | DefaultValue::Type(_) | DefaultValue::ListOf(_) => None,
            DefaultValue::Bool(b) => Some(Value::Bool(*b)),
            DefaultValue::Int(n) => Some(Value::Int(*n)),
            DefaultValue::Float(x) => Some(Value::Float(*x)),
            DefaultValue::Str(s) => Some(Value::Str(s.clone())),
            DefaultValue::List(items) | DefaultValue::Set(items) => {
                Some(Value::List(items.clone()))
            }
        }
    }
}

impl From<bool> for DefaultValue {
    fn from(b: bool) -> Self {
        DefaultValue::Bool(b)
    }
}

impl From<i64> for DefaultValue {
    fn from(n: i64) -> Self {
        DefaultValue::Int(n)
    }
}

impl From<i32> for DefaultValue {
    fn from(n: i32) -> Self {
        DefaultValue::Int(i64::from(n))
    }
}

impl From<f64> for DefaultValue {
    fn from(x: f64) -> Self {
        DefaultValue::Float(x)
    }
}

impl From<&str> for DefaultValue {
    fn from(s: &str) -> Self {
        DefaultValue::Str(s.to_string())
    }
}

impl From<String> for DefaultValue {
    fn from(s: String) -> Self {
        DefaultValue::Str(s)
    }
}

impl From<Coercion> for DefaultValue {
    fn from(c: Coercion) -> Self {
        DefaultValue::Type(c)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_default_is_sorted_and_deduplicated() {
        let set = DefaultValue::set([3, 1, 2, 1]);
        assert_eq!(
            set,
            DefaultValue::Set(vec![Value::Int(1), Value::Int(2), Value::Int(3)])
        );
    }

    #[test]
    fn test_mixed_kind_set_orders_by_kind() {
        let set = DefaultValue::set(vec![Value::from("b"), Value::from(2), Value::from(true)]);
        assert_eq!(
            set,
            DefaultValue::Set(vec![Value::Bool(true), Value::Int(2), Value::from("b")])
        );
    }

    #[test]
    fn test_coercion_errors_name_the_input() {
        let err = Coercion::Float.apply("abc").unwrap_err();
        assert!(err.contains("'abc'"));
    }

    #[test]
    fn test_custom_coercion_equality_is_by_function() {
        let a = Coercion::custom("baboom", |raw| Coercion::Int.apply(raw));
        let b = a.clone();
        let c = Coercion::custom("baboom", |raw| Coercion::Int.apply(raw));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_float_display_keeps_decimal_point() {
        assert_eq!(Value::Float(5.0).to_string(), "5.0");
        assert_eq!(Value::from(vec!["a", "b"]).to_string(), "[a, b]");
    }

    #[test]
    fn test_type_defaults_require_input() {
        assert!(DefaultValue::Type(Coercion::Int).requires_input());
        assert!(DefaultValue::ListOf(Coercion::Int).requires_input());
        assert!(!DefaultValue::List(Vec::new()).requires_input());
        assert!(!DefaultValue::Bool(false).requires_input());
    }
}
