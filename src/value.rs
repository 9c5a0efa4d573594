//! Defines [`Value`], the loosely typed value of a frontmatter field, and
//! [`Value::infer`], which decides the type of a raw header value.

use serde::Serialize;
use std::fmt;

/// A frontmatter field value. The header is not parsed as real YAML; each
/// value's type is inferred from its text by [`Value::infer`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Value {
    String(String),
    Integer(i64),
    Boolean(bool),
    List(Vec<String>),
}

impl Value {
    /// Infers a [`Value`] from the trimmed text following `key:`. The rules
    /// are tried in order and the first match wins:
    ///
    /// 1. `[a, b, c]` is a list of trimmed strings (`[]` is the empty list)
    /// 2. `true`/`false`, in any case, is a boolean
    /// 3. a string of ASCII digits is an integer
    /// 4. a quoted string is the string between the quotes
    /// 5. anything else is the string itself
    ///
    /// Quoting doesn't protect a value from the earlier rules, so `"[a]"` is
    /// still a string but `[1, 2]` is a list and `'42'` is the string `42`.
    pub fn infer(raw: &str) -> Value {
        let raw = raw.trim();

        if raw.len() >= 2 && raw.starts_with('[') && raw.ends_with(']') {
            let inner = &raw[1..raw.len() - 1];
            if inner.trim().is_empty() {
                return Value::List(Vec::new());
            }
            return Value::List(inner.split(',').map(|s| s.trim().to_owned()).collect());
        }

        if raw.eq_ignore_ascii_case("true") {
            return Value::Boolean(true);
        }
        if raw.eq_ignore_ascii_case("false") {
            return Value::Boolean(false);
        }

        if !raw.is_empty() && raw.bytes().all(|b| b.is_ascii_digit()) {
            // Too large for an i64: keep the digits as text.
            if let Ok(n) = raw.parse::<i64>() {
                return Value::Integer(n);
            }
        }

        if is_quote(raw.chars().next()) && is_quote(raw.chars().last()) {
            let mut chars = raw.chars();
            chars.next();
            chars.next_back();
            return Value::String(chars.as_str().to_owned());
        }

        Value::String(raw.to_owned())
    }

    /// Returns `true` for values that count as "not filled in": the empty
    /// string, the empty list, `false` and `0`.
    pub fn is_empty(&self) -> bool {
        match self {
            Value::String(s) => s.is_empty(),
            Value::Integer(n) => *n == 0,
            Value::Boolean(b) => !b,
            Value::List(items) => items.is_empty(),
        }
    }

    /// Returns the list items, or `None` if this isn't a list.
    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Value::List(items) => Some(items.as_slice()),
            _ => None,
        }
    }
}

fn is_quote(c: Option<char>) -> bool {
    matches!(c, Some('"') | Some('\''))
}

impl fmt::Display for Value {
    /// Displays a [`Value`] the way it's shown in reports: lists as
    /// `[a, b]`, everything else as its plain text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::String(s) => f.write_str(s),
            Value::Integer(n) => write!(f, "{}", n),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::List(items) => write!(f, "[{}]", items.join(", ")),
        }
    }
}
