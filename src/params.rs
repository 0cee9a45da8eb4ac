//! GeneratorParams Applier
//!
//! Overlays caller overrides on a generator's declared generation-time
//! parameters. Values arrive either typed or in string form (`"uint8"`,
//! `"true"`, `"42"`); placement parameters arrive as shared handles.

use crate::engine::{Placement, PlacementHandle};
use crate::error::{CoercionFailure, CoercionSubject, StubError};
use crate::schema::{GeneratorParamKind, GeneratorParamSchema};
use crate::types::ScalarType;
use crate::value::RawValue;
use std::collections::HashMap;
use std::fmt;
use tracing::debug;

/// Caller overrides keyed by GeneratorParam name.
pub type GeneratorParamMap = HashMap<String, RawValue>;

/// Resolved value of one GeneratorParam.
#[derive(Debug, Clone)]
pub enum GeneratorParamValue {
    Int(i64),
    Float(f64),
    Bool(bool),
    Type(ScalarType),
    Enum(String),
    Placement(PlacementHandle),
}

impl GeneratorParamValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            GeneratorParamValue::Int(_) => "int",
            GeneratorParamValue::Float(_) => "float",
            GeneratorParamValue::Bool(_) => "bool",
            GeneratorParamValue::Type(_) => "type",
            GeneratorParamValue::Enum(_) => "enum",
            GeneratorParamValue::Placement(_) => "placement",
        }
    }
}

impl fmt::Display for GeneratorParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeneratorParamValue::Int(v) => write!(f, "{}", v),
            GeneratorParamValue::Float(v) => write!(f, "{}", v),
            GeneratorParamValue::Bool(v) => write!(f, "{}", v),
            GeneratorParamValue::Type(t) => write!(f, "{}", t),
            GeneratorParamValue::Enum(s) => f.write_str(s),
            GeneratorParamValue::Placement(h) => write!(f, "{}", h.effective()),
        }
    }
}

/// The full, declared set of GeneratorParams for one generation.
#[derive(Debug, Clone)]
pub struct GeneratorParamValues {
    generator: String,
    values: Vec<(String, GeneratorParamValue)>,
}

impl GeneratorParamValues {
    pub fn get(&self, name: &str) -> Option<&GeneratorParamValue> {
        self.values.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &GeneratorParamValue)> {
        self.values.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn require(&self, name: &str) -> Result<&GeneratorParamValue, StubError> {
        self.get(name).ok_or_else(|| StubError::UnknownGeneratorParam {
            generator: self.generator.clone(),
            name: name.to_string(),
        })
    }

    fn wrong_kind(&self, name: &str, wanted: &str, value: &GeneratorParamValue) -> StubError {
        StubError::GenerationFailed(format!(
            "GeneratorParam '{}' of '{}' is a {}, not a {}",
            name,
            self.generator,
            value.type_name(),
            wanted
        ))
    }

    pub fn int(&self, name: &str) -> Result<i64, StubError> {
        match self.require(name)? {
            GeneratorParamValue::Int(v) => Ok(*v),
            other => Err(self.wrong_kind(name, "int", other)),
        }
    }

    pub fn float(&self, name: &str) -> Result<f64, StubError> {
        match self.require(name)? {
            GeneratorParamValue::Float(v) => Ok(*v),
            other => Err(self.wrong_kind(name, "float", other)),
        }
    }

    pub fn bool(&self, name: &str) -> Result<bool, StubError> {
        match self.require(name)? {
            GeneratorParamValue::Bool(v) => Ok(*v),
            other => Err(self.wrong_kind(name, "bool", other)),
        }
    }

    pub fn ty(&self, name: &str) -> Result<ScalarType, StubError> {
        match self.require(name)? {
            GeneratorParamValue::Type(t) => Ok(*t),
            other => Err(self.wrong_kind(name, "type", other)),
        }
    }

    pub fn enum_value(&self, name: &str) -> Result<&str, StubError> {
        match self.require(name)? {
            GeneratorParamValue::Enum(s) => Ok(s),
            other => Err(self.wrong_kind(name, "enum", other)),
        }
    }

    pub fn placement(&self, name: &str) -> Result<PlacementHandle, StubError> {
        match self.require(name)? {
            GeneratorParamValue::Placement(h) => Ok(h.clone()),
            other => Err(self.wrong_kind(name, "placement", other)),
        }
    }
}

/// Resolve every declared GeneratorParam, applying `overrides` over defaults.
pub fn apply(
    generator: &str,
    schema: &[GeneratorParamSchema],
    overrides: &GeneratorParamMap,
) -> Result<GeneratorParamValues, StubError> {
    let mut unknown: Vec<&String> = overrides
        .keys()
        .filter(|k| !schema.iter().any(|p| &p.name == *k))
        .collect();
    unknown.sort();
    if let Some(name) = unknown.first() {
        return Err(StubError::UnknownGeneratorParam {
            generator: generator.to_string(),
            name: name.to_string(),
        });
    }

    let mut values = Vec::with_capacity(schema.len());
    for param in schema {
        let value = match overrides.get(&param.name) {
            Some(raw) => {
                let value = coerce_param(raw, param)?;
                debug!(
                    generator = generator,
                    param = %param.name,
                    value = %value,
                    "Applied GeneratorParam override"
                );
                value
            }
            None => default_value(&param.kind),
        };
        values.push((param.name.clone(), value));
    }

    Ok(GeneratorParamValues {
        generator: generator.to_string(),
        values,
    })
}

fn default_value(kind: &GeneratorParamKind) -> GeneratorParamValue {
    match kind {
        GeneratorParamKind::Int { default, .. } => GeneratorParamValue::Int(*default),
        GeneratorParamKind::Float { default } => GeneratorParamValue::Float(*default),
        GeneratorParamKind::Bool { default } => GeneratorParamValue::Bool(*default),
        GeneratorParamKind::Type { default } => GeneratorParamValue::Type(*default),
        GeneratorParamKind::Enum { default, .. } => GeneratorParamValue::Enum(default.clone()),
        GeneratorParamKind::Placement { default } => {
            GeneratorParamValue::Placement(PlacementHandle::new().with_fallback(default.clone()))
        }
    }
}

fn coerce_param(
    raw: &RawValue,
    param: &GeneratorParamSchema,
) -> Result<GeneratorParamValue, CoercionFailure> {
    let fail = || {
        CoercionFailure::new(
            CoercionSubject::GeneratorParam(param.name.clone()),
            raw.kind_name(),
            param.kind.type_name(),
        )
    };

    match (&param.kind, raw) {
        (GeneratorParamKind::Int { min, max, .. }, _) => {
            let v = match raw {
                RawValue::Int(i) => *i,
                RawValue::Bool(b) => i64::from(*b),
                RawValue::Str(s) => s.trim().parse::<i64>().map_err(|_| {
                    fail().with_detail(format!("'{}' is not an integer", s))
                })?,
                _ => return Err(fail()),
            };
            if min.map_or(false, |m| v < m) || max.map_or(false, |m| v > m) {
                return Err(fail().with_detail(format!(
                    "{} is outside [{}, {}]",
                    v,
                    min.map_or("-inf".to_string(), |m| m.to_string()),
                    max.map_or("inf".to_string(), |m| m.to_string())
                )));
            }
            Ok(GeneratorParamValue::Int(v))
        }

        (GeneratorParamKind::Float { .. }, RawValue::Float(f)) => Ok(GeneratorParamValue::Float(*f)),
        (GeneratorParamKind::Float { .. }, RawValue::Int(i)) => {
            Ok(GeneratorParamValue::Float(*i as f64))
        }
        (GeneratorParamKind::Float { .. }, RawValue::Str(s)) => s
            .trim()
            .parse::<f64>()
            .map(GeneratorParamValue::Float)
            .map_err(|_| fail().with_detail(format!("'{}' is not a number", s))),

        (GeneratorParamKind::Bool { .. }, RawValue::Bool(b)) => Ok(GeneratorParamValue::Bool(*b)),
        (GeneratorParamKind::Bool { .. }, RawValue::Str(s)) => {
            match s.trim().to_ascii_lowercase().as_str() {
                "true" => Ok(GeneratorParamValue::Bool(true)),
                "false" => Ok(GeneratorParamValue::Bool(false)),
                _ => Err(fail().with_detail(format!("'{}' is not a bool", s))),
            }
        }

        (GeneratorParamKind::Type { .. }, RawValue::Str(s)) => s
            .parse::<ScalarType>()
            .map(GeneratorParamValue::Type)
            .map_err(|e| fail().with_detail(e)),

        (GeneratorParamKind::Enum { choices, .. }, RawValue::Str(s)) => {
            if choices.iter().any(|c| c == s) {
                Ok(GeneratorParamValue::Enum(s.clone()))
            } else {
                Err(fail().with_detail(format!(
                    "'{}' is not one of [{}]",
                    s,
                    choices.join(", ")
                )))
            }
        }

        (GeneratorParamKind::Placement { default }, RawValue::Placement(handle)) => Ok(
            GeneratorParamValue::Placement(handle.with_fallback(default.clone())),
        ),
        (GeneratorParamKind::Placement { default }, RawValue::Str(s)) => {
            let placement = s
                .parse::<Placement>()
                .map_err(|e| fail().with_detail(e))?;
            Ok(GeneratorParamValue::Placement(
                PlacementHandle::with(placement).with_fallback(default.clone()),
            ))
        }

        _ => Err(fail()),
    }
}

/// Render typed overrides in the string form generators receive them in.
///
/// Placement handles pass through untouched; everything else is stringified.
pub fn stringify(overrides: &GeneratorParamMap) -> GeneratorParamMap {
    overrides
        .iter()
        .map(|(k, v)| {
            let value = match v {
                RawValue::Bool(b) => RawValue::Str(if *b { "true" } else { "false" }.to_string()),
                RawValue::Int(i) => RawValue::Str(i.to_string()),
                RawValue::Float(f) => RawValue::Str(f.to_string()),
                other => other.clone(),
            };
            (k.clone(), value)
        })
        .collect()
}
