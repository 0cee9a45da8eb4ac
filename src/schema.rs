//! Generator Schemas
//!
//! Immutable declarations of a generator's inputs, generation-time parameters,
//! and outputs. Declaration order is authoritative: positional arguments match
//! inputs in this order, missing-input errors report the first missing input in
//! this order, and outputs are returned in this order.

use crate::engine::Placement;
use crate::error::RegistryError;
use crate::types::ScalarType;
use crate::value::RawValue;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Kind of an input parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ParamKind {
    Scalar {
        ty: ScalarType,
    },
    TypedBuffer {
        ty: ScalarType,
        dimensions: usize,
    },
    UntypedBuffer {
        dimensions: usize,
    },
    /// A graph handle; `ty` is `None` when any element type is accepted.
    GraphInput {
        ty: Option<ScalarType>,
        dimensions: usize,
    },
    ArrayOf {
        element: Box<ParamKind>,
        size: Option<usize>,
    },
}

impl ParamKind {
    /// Human-readable form used in coercion errors, e.g. `Buffer<uint8>(3)`.
    pub fn describe(&self) -> String {
        match self {
            ParamKind::Scalar { ty } => ty.to_string(),
            ParamKind::TypedBuffer { ty, dimensions } => format!("Buffer<{}>({})", ty, dimensions),
            ParamKind::UntypedBuffer { dimensions } => format!("Buffer<*>({})", dimensions),
            ParamKind::GraphInput { ty, dimensions } => match ty {
                Some(ty) => format!("Func<{}>({})", ty, dimensions),
                None => format!("Func<*>({})", dimensions),
            },
            ParamKind::ArrayOf { element, size } => match size {
                Some(n) => format!("{}[{}]", element.describe(), n),
                None => format!("{}[]", element.describe()),
            },
        }
    }

    pub fn is_array(&self) -> bool {
        matches!(self, ParamKind::ArrayOf { .. })
    }
}

/// Declaration of one input parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSchema {
    pub name: String,
    pub kind: ParamKind,
    pub required: bool,
    /// Value used when an optional scalar is absent from a named mapping.
    #[serde(default)]
    pub default: Option<f64>,
    /// Inclusive bounds for scalar values.
    #[serde(default)]
    pub range: Option<(f64, f64)>,
}

impl ParameterSchema {
    fn with_kind(name: impl Into<String>, kind: ParamKind) -> Self {
        Self {
            name: name.into(),
            kind,
            required: true,
            default: None,
            range: None,
        }
    }

    pub fn scalar(name: impl Into<String>, ty: ScalarType) -> Self {
        Self::with_kind(name, ParamKind::Scalar { ty })
    }

    pub fn typed_buffer(name: impl Into<String>, ty: ScalarType, dimensions: usize) -> Self {
        Self::with_kind(name, ParamKind::TypedBuffer { ty, dimensions })
    }

    pub fn untyped_buffer(name: impl Into<String>, dimensions: usize) -> Self {
        Self::with_kind(name, ParamKind::UntypedBuffer { dimensions })
    }

    pub fn graph(name: impl Into<String>, ty: Option<ScalarType>, dimensions: usize) -> Self {
        Self::with_kind(name, ParamKind::GraphInput { ty, dimensions })
    }

    pub fn array(name: impl Into<String>, element: ParamKind) -> Self {
        Self::with_kind(
            name,
            ParamKind::ArrayOf {
                element: Box::new(element),
                size: None,
            },
        )
    }

    /// Fix the length of an array input.
    pub fn with_size(mut self, n: usize) -> Self {
        if let ParamKind::ArrayOf { size, .. } = &mut self.kind {
            *size = Some(n);
        }
        self
    }

    /// Give a scalar a default, making it optional in named calls.
    pub fn with_default(mut self, value: f64) -> Self {
        self.default = Some(value);
        self.required = false;
        self
    }

    pub fn with_range(mut self, min: f64, max: f64) -> Self {
        self.range = Some((min, max));
        self
    }

    /// The default as a caller-style value, for optional scalars only.
    pub(crate) fn default_raw(&self) -> Option<RawValue> {
        let value = self.default?;
        match &self.kind {
            ParamKind::Scalar { ty } if ty.is_float() => Some(RawValue::Float(value)),
            ParamKind::Scalar { ty: ScalarType::Bool } => Some(RawValue::Bool(value != 0.0)),
            ParamKind::Scalar { .. } => Some(RawValue::Int(value as i64)),
            _ => None,
        }
    }
}

/// Kind and default of a generation-time parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GeneratorParamKind {
    Int {
        default: i64,
        min: Option<i64>,
        max: Option<i64>,
    },
    Float {
        default: f64,
    },
    Bool {
        default: bool,
    },
    Type {
        default: ScalarType,
    },
    Enum {
        choices: Vec<String>,
        default: String,
    },
    Placement {
        default: Placement,
    },
}

impl GeneratorParamKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            GeneratorParamKind::Int { .. } => "int",
            GeneratorParamKind::Float { .. } => "float",
            GeneratorParamKind::Bool { .. } => "bool",
            GeneratorParamKind::Type { .. } => "type",
            GeneratorParamKind::Enum { .. } => "enum",
            GeneratorParamKind::Placement { .. } => "placement",
        }
    }

    pub fn default_display(&self) -> String {
        match self {
            GeneratorParamKind::Int { default, .. } => default.to_string(),
            GeneratorParamKind::Float { default } => default.to_string(),
            GeneratorParamKind::Bool { default } => default.to_string(),
            GeneratorParamKind::Type { default } => default.to_string(),
            GeneratorParamKind::Enum { default, .. } => default.clone(),
            GeneratorParamKind::Placement { default } => default.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorParamSchema {
    pub name: String,
    pub kind: GeneratorParamKind,
}

impl GeneratorParamSchema {
    pub fn int(name: impl Into<String>, default: i64) -> Self {
        Self {
            name: name.into(),
            kind: GeneratorParamKind::Int {
                default,
                min: None,
                max: None,
            },
        }
    }

    pub fn int_in(name: impl Into<String>, default: i64, min: i64, max: i64) -> Self {
        Self {
            name: name.into(),
            kind: GeneratorParamKind::Int {
                default,
                min: Some(min),
                max: Some(max),
            },
        }
    }

    pub fn float(name: impl Into<String>, default: f64) -> Self {
        Self {
            name: name.into(),
            kind: GeneratorParamKind::Float { default },
        }
    }

    pub fn boolean(name: impl Into<String>, default: bool) -> Self {
        Self {
            name: name.into(),
            kind: GeneratorParamKind::Bool { default },
        }
    }

    pub fn ty(name: impl Into<String>, default: ScalarType) -> Self {
        Self {
            name: name.into(),
            kind: GeneratorParamKind::Type { default },
        }
    }

    pub fn choice(name: impl Into<String>, choices: &[&str], default: &str) -> Self {
        Self {
            name: name.into(),
            kind: GeneratorParamKind::Enum {
                choices: choices.iter().map(|c| c.to_string()).collect(),
                default: default.to_string(),
            },
        }
    }

    pub fn placement(name: impl Into<String>, default: Placement) -> Self {
        Self {
            name: name.into(),
            kind: GeneratorParamKind::Placement { default },
        }
    }
}

/// Where an array output's length comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArraySizeSource {
    /// Length of an array-kind input.
    Input(String),
    /// Value of an int generator param.
    GeneratorParam(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputShape {
    Single,
    Tuple(usize),
    Array(ArraySizeSource),
}

/// Declared element type of an output channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputType {
    Fixed(ScalarType),
    /// Taken from a type generator param.
    FromParam(String),
    Any,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputSpec {
    pub name: String,
    pub shape: OutputShape,
    /// One entry per channel: one for single and array outputs, `n` for `Tuple(n)`.
    pub types: Vec<OutputType>,
    pub dimensions: usize,
}

impl OutputSpec {
    pub fn single(name: impl Into<String>, ty: OutputType, dimensions: usize) -> Self {
        Self {
            name: name.into(),
            shape: OutputShape::Single,
            types: vec![ty],
            dimensions,
        }
    }

    pub fn tuple(name: impl Into<String>, types: Vec<OutputType>, dimensions: usize) -> Self {
        Self {
            name: name.into(),
            shape: OutputShape::Tuple(types.len()),
            types,
            dimensions,
        }
    }

    pub fn array(
        name: impl Into<String>,
        ty: OutputType,
        dimensions: usize,
        size: ArraySizeSource,
    ) -> Self {
        Self {
            name: name.into(),
            shape: OutputShape::Array(size),
            types: vec![ty],
            dimensions,
        }
    }

    pub fn channels(&self) -> usize {
        match self.shape {
            OutputShape::Tuple(n) => n,
            _ => 1,
        }
    }
}

/// Everything a generator declares, fixed at registration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorSchema {
    pub id: String,
    pub inputs: Vec<ParameterSchema>,
    pub generator_params: Vec<GeneratorParamSchema>,
    pub outputs: Vec<OutputSpec>,
}

impl GeneratorSchema {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            inputs: Vec::new(),
            generator_params: Vec::new(),
            outputs: Vec::new(),
        }
    }

    pub fn input(mut self, input: ParameterSchema) -> Self {
        self.inputs.push(input);
        self
    }

    pub fn param(mut self, param: GeneratorParamSchema) -> Self {
        self.generator_params.push(param);
        self
    }

    pub fn output(mut self, output: OutputSpec) -> Self {
        self.outputs.push(output);
        self
    }

    pub fn input_named(&self, name: &str) -> Option<&ParameterSchema> {
        self.inputs.iter().find(|i| i.name == name)
    }

    pub fn param_named(&self, name: &str) -> Option<&GeneratorParamSchema> {
        self.generator_params.iter().find(|p| p.name == name)
    }

    pub fn input_names(&self) -> Vec<&str> {
        self.inputs.iter().map(|i| i.name.as_str()).collect()
    }

    /// Check internal consistency. Run once, at registration.
    pub fn validate(&self) -> Result<(), RegistryError> {
        let invalid = |reason: String| RegistryError::InvalidSchema {
            generator: self.id.clone(),
            reason,
        };

        if self.id.trim().is_empty() {
            return Err(invalid("generator id cannot be empty".to_string()));
        }
        if self.outputs.is_empty() {
            return Err(invalid("at least one output must be declared".to_string()));
        }
        check_unique(self.inputs.iter().map(|i| i.name.as_str()), "input").map_err(invalid)?;
        check_unique(
            self.generator_params.iter().map(|p| p.name.as_str()),
            "GeneratorParam",
        )
        .map_err(invalid)?;
        check_unique(self.outputs.iter().map(|o| o.name.as_str()), "output").map_err(invalid)?;

        for input in &self.inputs {
            let is_scalar = matches!(input.kind, ParamKind::Scalar { .. });
            if !input.required && input.default.is_none() {
                return Err(invalid(format!(
                    "optional input '{}' has no default",
                    input.name
                )));
            }
            if !is_scalar && (input.default.is_some() || input.range.is_some()) {
                return Err(invalid(format!(
                    "only scalar inputs may declare a default or range ('{}')",
                    input.name
                )));
            }
            if let (Some(default), Some((min, max))) = (input.default, input.range) {
                if min > max || default < min || default > max {
                    return Err(invalid(format!(
                        "default {} of '{}' is outside [{}, {}]",
                        default, input.name, min, max
                    )));
                }
            }
        }

        for param in &self.generator_params {
            match &param.kind {
                GeneratorParamKind::Int { default, min, max } => {
                    if min.map_or(false, |m| *default < m) || max.map_or(false, |m| *default > m) {
                        return Err(invalid(format!(
                            "default of GeneratorParam '{}' is out of range",
                            param.name
                        )));
                    }
                }
                GeneratorParamKind::Enum { choices, default } if !choices.contains(default) => {
                    return Err(invalid(format!(
                        "default '{}' of GeneratorParam '{}' is not one of its choices",
                        default, param.name
                    )));
                }
                _ => {}
            }
        }

        for output in &self.outputs {
            if output.types.len() != output.channels() {
                return Err(invalid(format!(
                    "output '{}' declares {} channel types for {} channels",
                    output.name,
                    output.types.len(),
                    output.channels()
                )));
            }
            if let OutputShape::Tuple(n) = output.shape {
                if n < 2 {
                    return Err(invalid(format!(
                        "tuple output '{}' must have at least two channels",
                        output.name
                    )));
                }
            }
            if let OutputShape::Array(source) = &output.shape {
                match source {
                    ArraySizeSource::Input(name) => {
                        if !self.input_named(name).map_or(false, |i| i.kind.is_array()) {
                            return Err(invalid(format!(
                                "array output '{}' takes its size from '{}', which is not an array input",
                                output.name, name
                            )));
                        }
                    }
                    ArraySizeSource::GeneratorParam(name) => {
                        if !matches!(
                            self.param_named(name).map(|p| &p.kind),
                            Some(GeneratorParamKind::Int { .. })
                        ) {
                            return Err(invalid(format!(
                                "array output '{}' takes its size from '{}', which is not an int GeneratorParam",
                                output.name, name
                            )));
                        }
                    }
                }
            }
            for ty in &output.types {
                if let OutputType::FromParam(name) = ty {
                    if !matches!(
                        self.param_named(name).map(|p| &p.kind),
                        Some(GeneratorParamKind::Type { .. })
                    ) {
                        return Err(invalid(format!(
                            "output '{}' takes its type from '{}', which is not a type GeneratorParam",
                            output.name, name
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}

fn check_unique<'a>(names: impl Iterator<Item = &'a str>, what: &str) -> Result<(), String> {
    let mut seen = HashSet::new();
    for name in names {
        if name.is_empty() {
            return Err(format!("{} names cannot be empty", what));
        }
        if !seen.insert(name) {
            return Err(format!("duplicate {} name '{}'", what, name));
        }
    }
    Ok(())
}
