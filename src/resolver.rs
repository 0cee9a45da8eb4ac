//! Argument Resolver
//!
//! Normalizes caller inputs, given either as an ordered sequence or as a named
//! mapping, into one raw value per declared input, in declaration order.

use crate::error::{CoercionFailure, CoercionSubject, StubError};
use crate::schema::ParameterSchema;
use crate::value::RawValue;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};

/// Inputs as supplied by the caller.
#[derive(Debug, Clone)]
pub enum StubInputs {
    /// Matched to inputs by declaration order; the count must match exactly.
    Positional(Vec<RawValue>),
    /// Matched to inputs by name; order-independent.
    Named(HashMap<String, RawValue>),
}

impl StubInputs {
    pub fn positional<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<RawValue>,
    {
        StubInputs::Positional(values.into_iter().map(Into::into).collect())
    }

    pub fn named<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<RawValue>,
    {
        StubInputs::Named(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        match self {
            StubInputs::Positional(values) => values.len(),
            StubInputs::Named(map) => map.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<Vec<RawValue>> for StubInputs {
    fn from(values: Vec<RawValue>) -> Self {
        StubInputs::Positional(values)
    }
}

impl From<HashMap<String, RawValue>> for StubInputs {
    fn from(map: HashMap<String, RawValue>) -> Self {
        StubInputs::Named(map)
    }
}

/// What to do with named-mapping keys that match no declared input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownInputPolicy {
    /// Drop them silently.
    Ignore,
    /// Drop them and log a warning.
    #[default]
    Warn,
    /// Fail the call with an input count mismatch comparing recognized keys
    /// with supplied keys.
    Reject,
}

impl fmt::Display for UnknownInputPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            UnknownInputPolicy::Ignore => "ignore",
            UnknownInputPolicy::Warn => "warn",
            UnknownInputPolicy::Reject => "reject",
        })
    }
}

impl FromStr for UnknownInputPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ignore" => Ok(UnknownInputPolicy::Ignore),
            "warn" => Ok(UnknownInputPolicy::Warn),
            "reject" => Ok(UnknownInputPolicy::Reject),
            other => Err(format!(
                "Invalid unknown-input policy: {} (must be 'ignore', 'warn', or 'reject')",
                other
            )),
        }
    }
}

/// Produce one raw value per declared input, in declaration order.
pub fn resolve(
    generator: &str,
    schema: &[ParameterSchema],
    supplied: StubInputs,
    policy: UnknownInputPolicy,
) -> Result<Vec<RawValue>, StubError> {
    match supplied {
        StubInputs::Positional(values) => resolve_positional(schema, values),
        StubInputs::Named(map) => resolve_named(generator, schema, map, policy),
    }
}

fn resolve_positional(
    schema: &[ParameterSchema],
    values: Vec<RawValue>,
) -> Result<Vec<RawValue>, StubError> {
    // Values that can never be inputs fail before arity is considered.
    for (index, value) in values.iter().enumerate() {
        if let Some(bad) = value.first_unadaptable() {
            let (subject, target) = match schema.get(index) {
                Some(entry) => (entry.name.clone(), entry.kind.describe()),
                None => (format!("#{}", index), "any input kind".to_string()),
            };
            return Err(
                CoercionFailure::new(CoercionSubject::Input(subject), bad.kind_name(), target)
                    .into(),
            );
        }
    }

    if values.len() != schema.len() {
        return Err(StubError::ArgumentCountMismatch {
            expected: schema.len(),
            got: values.len(),
        });
    }
    debug!(count = values.len(), "Resolved positional inputs");
    Ok(values)
}

fn resolve_named(
    generator: &str,
    schema: &[ParameterSchema],
    mut map: HashMap<String, RawValue>,
    policy: UnknownInputPolicy,
) -> Result<Vec<RawValue>, StubError> {
    let mut resolved = Vec::with_capacity(schema.len());

    for entry in schema {
        let value = match map.remove(&entry.name) {
            Some(value) => value,
            None if !entry.required => match entry.default_raw() {
                Some(default) => default,
                None => return Err(StubError::MissingRequiredInput(entry.name.clone())),
            },
            None => return Err(StubError::MissingRequiredInput(entry.name.clone())),
        };
        if let Some(bad) = value.first_unadaptable() {
            return Err(CoercionFailure::new(
                CoercionSubject::Input(entry.name.clone()),
                bad.kind_name(),
                entry.kind.describe(),
            )
            .into());
        }
        resolved.push(value);
    }

    if !map.is_empty() {
        let mut unknown: Vec<&str> = map.keys().map(String::as_str).collect();
        unknown.sort_unstable();
        match policy {
            UnknownInputPolicy::Ignore => {}
            UnknownInputPolicy::Warn => {
                warn!(
                    generator = generator,
                    unknown = ?unknown,
                    "Ignoring inputs that the generator does not declare"
                );
            }
            UnknownInputPolicy::Reject => {
                // Counted after defaults, as a positional call would be.
                return Err(StubError::ArgumentCountMismatch {
                    expected: schema.len(),
                    got: resolved.len() + map.len(),
                });
            }
        }
    }

    debug!(count = resolved.len(), "Resolved named inputs");
    Ok(resolved)
}
