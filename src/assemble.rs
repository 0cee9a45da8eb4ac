//! Output Assembler
//!
//! Runs a generator's build step and packages the outputs it defined in
//! declared order, checking each against its declaration.

use crate::coerce::Binding;
use crate::engine::{Func, Target};
use crate::error::StubError;
use crate::generator::{Generator, GeneratorContext};
use crate::params::GeneratorParamValues;
use crate::schema::{ArraySizeSource, OutputShape, OutputSpec, OutputType};
use crate::types::ScalarType;
use tracing::debug;

/// The value of one output: a graph, or an ordered array of graphs.
#[derive(Debug, Clone)]
pub enum OutputValue {
    Func(Func),
    Array(Vec<Func>),
}

impl OutputValue {
    pub fn as_func(&self) -> Option<&Func> {
        match self {
            OutputValue::Func(f) => Some(f),
            OutputValue::Array(_) => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Func]> {
        match self {
            OutputValue::Array(funcs) => Some(funcs),
            OutputValue::Func(_) => None,
        }
    }

    pub fn into_func(self) -> Option<Func> {
        match self {
            OutputValue::Func(f) => Some(f),
            OutputValue::Array(_) => None,
        }
    }

    pub fn into_array(self) -> Option<Vec<Func>> {
        match self {
            OutputValue::Array(funcs) => Some(funcs),
            OutputValue::Func(_) => None,
        }
    }
}

impl From<Func> for OutputValue {
    fn from(f: Func) -> Self {
        OutputValue::Func(f)
    }
}

impl From<&Func> for OutputValue {
    fn from(f: &Func) -> Self {
        OutputValue::Func(f.clone())
    }
}

impl From<Vec<Func>> for OutputValue {
    fn from(funcs: Vec<Func>) -> Self {
        OutputValue::Array(funcs)
    }
}

/// What `generate` returns: one value for a single-output generator,
/// otherwise every output in declared order.
#[derive(Debug, Clone)]
pub enum StubOutputs {
    Single(OutputValue),
    Tuple(Vec<OutputValue>),
}

impl StubOutputs {
    pub fn len(&self) -> usize {
        match self {
            StubOutputs::Single(_) => 1,
            StubOutputs::Tuple(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn into_vec(self) -> Vec<OutputValue> {
        match self {
            StubOutputs::Single(value) => vec![value],
            StubOutputs::Tuple(values) => values,
        }
    }

    pub fn get(&self, index: usize) -> Option<&OutputValue> {
        match self {
            StubOutputs::Single(value) if index == 0 => Some(value),
            StubOutputs::Single(_) => None,
            StubOutputs::Tuple(values) => values.get(index),
        }
    }

    /// The sole output of a single-output generator.
    pub fn single(self) -> Option<OutputValue> {
        match self {
            StubOutputs::Single(value) => Some(value),
            StubOutputs::Tuple(_) => None,
        }
    }

    /// The sole output as a graph, for the common single-Func case.
    pub fn func(self) -> Option<Func> {
        self.single().and_then(OutputValue::into_func)
    }
}

/// Build the generator's outputs and package them in declared order.
pub fn assemble(
    generator: &dyn Generator,
    binding: &Binding,
    params: &GeneratorParamValues,
    target: &Target,
) -> Result<StubOutputs, StubError> {
    let schema = generator.schema();
    let mut ctx = GeneratorContext::new(binding, params, target, &schema.outputs);
    generator.generate(&mut ctx)?;
    let mut defined = ctx.take_outputs();

    let mut ordered = Vec::with_capacity(schema.outputs.len());
    for spec in &schema.outputs {
        let index = defined
            .iter()
            .position(|(name, _)| name == &spec.name)
            .ok_or_else(|| {
                StubError::GenerationFailed(format!(
                    "generator '{}' did not define output '{}'",
                    schema.id, spec.name
                ))
            })?;
        let (_, value) = defined.swap_remove(index);
        check_output(&schema.id, spec, &value, binding, params)?;
        ordered.push(value);
    }

    debug!(
        generator = %schema.id,
        outputs = ordered.len(),
        "Assembled outputs"
    );
    if ordered.len() == 1 {
        if let Some(value) = ordered.pop() {
            return Ok(StubOutputs::Single(value));
        }
    }
    Ok(StubOutputs::Tuple(ordered))
}

fn check_output(
    generator: &str,
    spec: &OutputSpec,
    value: &OutputValue,
    binding: &Binding,
    params: &GeneratorParamValues,
) -> Result<(), StubError> {
    let failed = |reason: String| {
        StubError::GenerationFailed(format!(
            "output '{}' of '{}' {}",
            spec.name, generator, reason
        ))
    };

    let expected_types = spec
        .types
        .iter()
        .map(|t| match t {
            OutputType::Fixed(ty) => Ok(Some(*ty)),
            OutputType::FromParam(name) => params.ty(name).map(Some),
            OutputType::Any => Ok(None),
        })
        .collect::<Result<Vec<Option<ScalarType>>, StubError>>()?;

    let funcs: &[Func] = match (&spec.shape, value) {
        (OutputShape::Array(source), OutputValue::Array(funcs)) => {
            let expected = match source {
                ArraySizeSource::Input(name) => binding.array(name)?.len(),
                ArraySizeSource::GeneratorParam(name) => {
                    usize::try_from(params.int(name)?).unwrap_or(0)
                }
            };
            if funcs.len() != expected {
                return Err(failed(format!(
                    "has {} elements but {} were declared",
                    funcs.len(),
                    expected
                )));
            }
            funcs
        }
        (OutputShape::Array(_), OutputValue::Func(_)) => {
            return Err(failed("must be an array of Funcs".to_string()));
        }
        (_, OutputValue::Func(f)) => std::slice::from_ref(f),
        (_, OutputValue::Array(_)) => {
            return Err(failed("must be a single Func".to_string()));
        }
    };

    for func in funcs {
        let types = func
            .types()
            .ok_or_else(|| failed(format!("Func '{}' has no definition", func.name())))?;
        if types.len() != spec.channels() {
            return Err(failed(format!(
                "has {} channels but {} were declared",
                types.len(),
                spec.channels()
            )));
        }
        let dims = func.dimensions().unwrap_or(0);
        if dims != spec.dimensions {
            return Err(failed(format!(
                "is {}-dimensional but {} dimensions were declared",
                dims, spec.dimensions
            )));
        }
        for (channel, (actual, expected)) in types.iter().zip(&expected_types).enumerate() {
            if let Some(expected) = expected {
                if actual != expected {
                    return Err(failed(format!(
                        "has type {} in channel {} but {} was declared",
                        actual, channel, expected
                    )));
                }
            }
        }
    }
    Ok(())
}
