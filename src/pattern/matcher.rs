//! # Wildcard matching over event types.
//!
//! Matching uses a fixed set of string operations instead of a glob or regex
//! engine, so the cost of one evaluation is bounded by the lengths involved.
//!
//! ## Rules (evaluated in order)
//! ```text
//! "*" or "**"                 → match everything
//! pattern == event_type       → match
//! no '*' in pattern           → no match
//! "<prefix>*"                 → strip one trailing '.' from <prefix>, then
//!                               type starts with prefix
//! "<prefix>*<suffix>"         → strip one trailing '.' from <prefix>, then
//!                               len(type) >= len(prefix) + len(suffix)
//!                               && type starts with prefix && ends with suffix
//! ```
//!
//! Only the **first** `*` splits the pattern. Any later `*` is part of the
//! suffix and compared literally, so `"a*b*c"` means prefix `"a"`, suffix `"b*c"`.
//!
//! Because the dot is dropped, `"foo.*"` matches `"foobar"` (and `"foo"`), and
//! `"foo.*bar"` matches `"foobar"`.

use std::fmt;
use std::sync::Arc;

/// Decides whether `event_type` satisfies `pattern`.
///
/// Case-sensitive, byte-wise. Never fails: anything that is not one of the
/// recognized forms simply does not match.
///
/// # Example
/// ```
/// use evbroker::pattern::matches;
///
/// assert!(matches("demo.*", "demo.ping"));
/// assert!(!matches("other.*", "demo.ping"));
/// assert!(matches("**", "anything"));
/// ```
pub fn matches(pattern: &str, event_type: &str) -> bool {
    if pattern == "*" || pattern == "**" {
        return true;
    }
    if pattern == event_type {
        return true;
    }
    match pattern.split_once('*') {
        None => false,
        Some((prefix, "")) => event_type.starts_with(strip_dot(prefix)),
        Some((prefix, suffix)) => affix_matches(strip_dot(prefix), suffix, event_type),
    }
}

#[inline]
fn strip_dot(prefix: &str) -> &str {
    prefix.strip_suffix('.').unwrap_or(prefix)
}

#[inline]
fn affix_matches(prefix: &str, suffix: &str, event_type: &str) -> bool {
    event_type.len() >= prefix.len() + suffix.len()
        && event_type.starts_with(prefix)
        && event_type.ends_with(suffix)
}

/// Compiled shape of a pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Form {
    Any,
    Literal,
    Prefix(String),
    Affix { prefix: String, suffix: String },
}

/// A pattern split into its prefix/suffix parts once, at subscribe time.
///
/// [`Pattern::matches`] gives exactly the same answers as [`matches`] on the
/// raw string; it only skips re-splitting on every evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    raw: Arc<str>,
    form: Form,
}

impl Pattern {
    /// Compiles a raw pattern string.
    pub fn compile(raw: &str) -> Self {
        let form = if raw == "*" || raw == "**" {
            Form::Any
        } else {
            match raw.split_once('*') {
                None => Form::Literal,
                Some((prefix, "")) => Form::Prefix(strip_dot(prefix).to_owned()),
                Some((prefix, suffix)) => Form::Affix {
                    prefix: strip_dot(prefix).to_owned(),
                    suffix: suffix.to_owned(),
                },
            }
        };
        Self {
            raw: Arc::from(raw),
            form,
        }
    }

    /// Returns the pattern as it was subscribed.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Returns `true` if the pattern matches every event type.
    #[inline]
    pub fn is_catch_all(&self) -> bool {
        matches!(self.form, Form::Any)
    }

    /// Evaluates the compiled pattern against `event_type`.
    pub fn matches(&self, event_type: &str) -> bool {
        match &self.form {
            Form::Any => true,
            _ if *self.raw == *event_type => true,
            Form::Literal => false,
            Form::Prefix(prefix) => event_type.starts_with(prefix.as_str()),
            Form::Affix { prefix, suffix } => affix_matches(prefix, suffix, event_type),
        }
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
