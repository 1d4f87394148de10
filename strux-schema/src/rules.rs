//! Business rules and the validation context.
//!
//! Rules are named, ordered checks attached to a [`crate::FieldSpec`]. They
//! run after type checks, in registration order; the first failure on a
//! field records one error for that field. Rules may read sibling fields and
//! the caller-supplied [`ValidationContext`], but never mutate either.

use indexmap::IndexMap;
use serde_json::{Map as JsonMap, Value as JsonValue};
use std::sync::Arc;

/// Read-only key-value data passed unchanged to every rule.
///
/// Used by rules that need external reference data, e.g. the source document
/// a quoted answer must appear in.
#[derive(Debug, Clone, Default)]
pub struct ValidationContext {
    entries: IndexMap<String, JsonValue>,
}

impl ValidationContext {
    /// An empty context.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Create a context with a single entry.
    #[must_use]
    pub fn with(key: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        let mut ctx = Self::default();
        ctx.entries.insert(key.into(), value.into());
        ctx
    }

    /// Insert an entry, builder style.
    #[must_use]
    pub fn and(mut self, key: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.entries.insert(key.into(), value.into());
        self
    }

    /// Look up an entry.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&JsonValue> {
        self.entries.get(key)
    }

    /// Look up a string entry.
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.entries.get(key).and_then(JsonValue::as_str)
    }
}

/// What a rule can see while checking one field value.
pub struct RuleScope<'a> {
    /// The fields of the enclosing object, when the value has one.
    pub siblings: Option<&'a JsonMap<String, JsonValue>>,
    /// The caller-supplied context.
    pub context: &'a ValidationContext,
}

type RuleFn = dyn Fn(&JsonValue, &RuleScope<'_>) -> Result<(), String> + Send + Sync;

/// A named business rule.
#[derive(Clone)]
pub struct Rule {
    name: String,
    check: Arc<RuleFn>,
}

impl std::fmt::Debug for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rule").field("name", &self.name).finish()
    }
}

impl Rule {
    /// Create a rule from a closure.
    pub fn new<F>(name: impl Into<String>, check: F) -> Self
    where
        F: Fn(&JsonValue, &RuleScope<'_>) -> Result<(), String> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            check: Arc::new(check),
        }
    }

    /// The rule's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run the rule against a value.
    pub fn check(&self, value: &JsonValue, scope: &RuleScope<'_>) -> Result<(), String> {
        (self.check)(value, scope)
    }
}

/// String must be at least `min` characters.
#[must_use]
pub fn min_length(min: usize) -> Rule {
    Rule::new("min_length", move |value, _| match value.as_str() {
        Some(s) if s.chars().count() < min => {
            Err(format!("must be at least {} characters", min))
        }
        _ => Ok(()),
    })
}

/// String must be at most `max` characters.
#[must_use]
pub fn max_length(max: usize) -> Rule {
    Rule::new("max_length", move |value, _| match value.as_str() {
        Some(s) if s.chars().count() > max => {
            Err(format!("must be at most {} characters", max))
        }
        _ => Ok(()),
    })
}

/// String must match the given regex.
///
/// Returns an error if the pattern does not compile.
pub fn pattern(pattern: &str) -> Result<Rule, regex::Error> {
    let re = regex::Regex::new(pattern)?;
    let shown = pattern.to_string();
    Ok(Rule::new("pattern", move |value, _| match value.as_str() {
        Some(s) if !re.is_match(s) => Err(format!("must match pattern {}", shown)),
        _ => Ok(()),
    }))
}

/// Number must be at least `min`.
#[must_use]
pub fn minimum(min: f64) -> Rule {
    Rule::new("minimum", move |value, _| match value.as_f64() {
        Some(n) if n < min => Err(format!("must be at least {}", min)),
        _ => Ok(()),
    })
}

/// Number must be at most `max`.
#[must_use]
pub fn maximum(max: f64) -> Rule {
    Rule::new("maximum", move |value, _| match value.as_f64() {
        Some(n) if n > max => Err(format!("must be at most {}", max)),
        _ => Ok(()),
    })
}

/// String must be one of the allowed values.
#[must_use]
pub fn one_of(allowed: &[&str]) -> Rule {
    let allowed: Vec<String> = allowed.iter().map(|s| s.to_string()).collect();
    Rule::new("one_of", move |value, _| match value.as_str() {
        Some(s) if !allowed.iter().any(|a| a == s) => {
            Err(format!("must be one of: {}", allowed.join(", ")))
        }
        _ => Ok(()),
    })
}

/// Quoted text must appear in the context document stored under
/// `context_key`.
///
/// Matching is whitespace- and case-insensitive. When no exact (normalized)
/// match exists, a sliding word window over the document is compared against
/// the quote and the best overlap ratio must reach `min_overlap` (0.0–1.0).
/// The tolerance is entirely the caller's choice.
#[must_use]
pub fn substring_of(context_key: &str, min_overlap: f64) -> Rule {
    let key = context_key.to_string();
    Rule::new("substring_of", move |value, scope| {
        let quote = match value.as_str() {
            Some(s) => s,
            None => return Ok(()),
        };
        let doc = scope
            .context
            .get_str(&key)
            .ok_or_else(|| format!("no context document under key '{}'", key))?;

        let quote_words = normalize_words(quote);
        if quote_words.is_empty() {
            return Ok(());
        }
        let doc_words = normalize_words(doc);

        if contains_window(&doc_words, &quote_words) {
            return Ok(());
        }

        let best = best_window_overlap(&doc_words, &quote_words);
        if best >= min_overlap {
            Ok(())
        } else {
            Err(format!(
                "quote not found in source document (best overlap {:.2}, required {:.2})",
                best, min_overlap
            ))
        }
    })
}

fn normalize_words(s: &str) -> Vec<String> {
    s.split_whitespace()
        .map(|w| {
            w.chars()
                .filter(|c| c.is_alphanumeric())
                .collect::<String>()
                .to_lowercase()
        })
        .filter(|w| !w.is_empty())
        .collect()
}

fn contains_window(doc: &[String], quote: &[String]) -> bool {
    if quote.len() > doc.len() {
        return false;
    }
    doc.windows(quote.len()).any(|w| w == quote)
}

fn best_window_overlap(doc: &[String], quote: &[String]) -> f64 {
    if quote.is_empty() || doc.is_empty() {
        return 0.0;
    }
    let width = quote.len().min(doc.len());
    let mut best = 0usize;
    for window in doc.windows(width) {
        let matched = window
            .iter()
            .zip(quote.iter())
            .filter(|(a, b)| a == b)
            .count();
        best = best.max(matched);
    }
    best as f64 / quote.len() as f64
}
