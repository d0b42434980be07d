//! Expression layer: variable scopes and the evaluator that resolves timer
//! expressions (`${dueDate}`, `PT${minutes}M`, ...) against them.

use std::collections::HashMap;
use std::sync::LazyLock;

use chrono::{DateTime, SecondsFormat, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use ft_domain::error::{Error, Result};

static TERM_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[$#]\{([^{}]*)\}").expect("hardcoded regex pattern is valid")
});
static IDENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("hardcoded regex pattern is valid")
});
static INTEGER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-?[0-9]+$").expect("hardcoded regex pattern is valid"));
static FLOAT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^-?[0-9]+\.[0-9]+$").expect("hardcoded regex pattern is valid")
});

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Values & scopes
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A process variable or an evaluated expression result.
///
/// Variant order matters for deserialization: RFC 3339 strings become
/// instants, everything else stays text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    Instant(DateTime<Utc>),
    String(String),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Boolean(_) => "boolean",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::Instant(_) => "instant",
            Value::String(_) => "string",
        }
    }

    /// String form used for interpolation (`null` renders empty).
    pub fn to_text(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Boolean(b) => b.to_string(),
            Value::Integer(n) => n.to_string(),
            Value::Float(f) => f.to_string(),
            Value::Instant(t) => t.to_rfc3339_opts(SecondsFormat::Millis, true),
            Value::String(s) => s.clone(),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(t: DateTime<Utc>) -> Self {
        Value::Instant(t)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

/// Name → value lookup used when evaluating expressions.
pub trait VariableScope {
    fn variable(&self, name: &str) -> Option<Value>;
}

/// Scope used when no execution is bound (e.g. timer start events).
/// Holds nothing; literal expressions still evaluate against it.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoExecutionScope;

impl VariableScope for NoExecutionScope {
    fn variable(&self, _name: &str) -> Option<Value> {
        None
    }
}

/// Map-backed variable scope.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Variables(HashMap<String, Value>);

impl Variables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl VariableScope for Variables {
    fn variable(&self, name: &str) -> Option<Value> {
        self.0.get(name).cloned()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Variables {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Evaluation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Resolves expression text against a scope.
pub trait ExpressionEvaluator: Send + Sync {
    fn evaluate(&self, expression: &str, scope: &dyn VariableScope) -> Result<Value>;
}

/// Evaluator for the template subset timer definitions use.
///
/// - text without `${...}` / `#{...}` is a literal string
/// - a single term spanning the whole text yields the term's typed value
/// - mixed text interpolates each term's string form
///
/// A term is a variable name, a quoted string, an integer or decimal, or
/// one of `true` / `false` / `null`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateEvaluator;

impl TemplateEvaluator {
    pub fn new() -> Self {
        Self
    }

    fn term(expression: &str, inner: &str, scope: &dyn VariableScope) -> Result<Value> {
        let term = inner.trim();
        if term.is_empty() {
            return Err(Error::expression(expression, "empty expression term"));
        }

        match term {
            "null" => return Ok(Value::Null),
            "true" => return Ok(Value::Boolean(true)),
            "false" => return Ok(Value::Boolean(false)),
            _ => {}
        }

        if let Some(literal) = quoted(term) {
            return Ok(Value::String(literal.to_string()));
        }

        if INTEGER_RE.is_match(term) {
            return term
                .parse::<i64>()
                .map(Value::Integer)
                .map_err(|e| Error::expression(expression, format!("'{term}': {e}")));
        }

        if FLOAT_RE.is_match(term) {
            return term
                .parse::<f64>()
                .map(Value::Float)
                .map_err(|e| Error::expression(expression, format!("'{term}': {e}")));
        }

        if IDENT_RE.is_match(term) {
            return scope.variable(term).ok_or_else(|| {
                Error::expression(
                    expression,
                    format!("unknown property used in expression: ${{{term}}}"),
                )
            });
        }

        Err(Error::expression(
            expression,
            format!("unsupported expression term '{term}'"),
        ))
    }
}

fn quoted(term: &str) -> Option<&str> {
    ['\'', '"'].iter().find_map(|q| {
        term.strip_prefix(*q)
            .and_then(|rest| rest.strip_suffix(*q))
    })
}

impl ExpressionEvaluator for TemplateEvaluator {
    fn evaluate(&self, expression: &str, scope: &dyn VariableScope) -> Result<Value> {
        let terms: Vec<_> = TERM_RE.captures_iter(expression).collect();

        let leftover = TERM_RE.replace_all(expression, "");
        if leftover.contains("${") || leftover.contains("#{") {
            return Err(Error::expression(expression, "unterminated expression"));
        }

        if terms.is_empty() {
            return Ok(Value::String(expression.to_string()));
        }

        if let [only] = terms.as_slice() {
            if only.get(0).map(|m| m.as_str()) == Some(expression) {
                let inner = only.get(1).map_or("", |m| m.as_str());
                return Self::term(expression, inner, scope);
            }
        }

        let mut out = String::with_capacity(expression.len());
        let mut last = 0;
        for caps in &terms {
            let (Some(whole), Some(inner)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            out.push_str(&expression[last..whole.start()]);
            out.push_str(&Self::term(expression, inner.as_str(), scope)?.to_text());
            last = whole.end();
        }
        out.push_str(&expression[last..]);

        Ok(Value::String(out))
    }
}
