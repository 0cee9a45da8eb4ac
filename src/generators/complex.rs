//! `complexstub`: every input kind and output shape in one generator.

use crate::engine::{Buffer, Expr, Func, Placement, Var};
use crate::error::StubError;
use crate::generator::{Generator, GeneratorContext};
use crate::schema::{
    ArraySizeSource, GeneratorParamSchema, GeneratorSchema, OutputSpec, OutputType, ParamKind,
    ParameterSchema,
};
use crate::types::ScalarType;
use tracing::debug;

pub const ID: &str = "complexstub";

/// Extents of the buffer computed while generating.
const STATIC_EXTENTS: [usize; 3] = [4, 4, 1];
const VECTOR_WIDTH: usize = 8;

pub struct ComplexStub {
    schema: GeneratorSchema,
}

impl ComplexStub {
    pub fn new() -> Self {
        let schema = GeneratorSchema::new(ID)
            .input(ParameterSchema::typed_buffer(
                "typed_buffer_input",
                ScalarType::UInt8,
                3,
            ))
            .input(ParameterSchema::untyped_buffer("untyped_buffer_input", 3))
            .input(ParameterSchema::graph("simple_input", None, 3))
            .input(ParameterSchema::array(
                "array_input",
                ParamKind::GraphInput {
                    ty: None,
                    dimensions: 3,
                },
            ))
            .input(ParameterSchema::scalar("float_arg", ScalarType::Float32))
            .input(ParameterSchema::array(
                "int_arg",
                ParamKind::Scalar {
                    ty: ScalarType::Int32,
                },
            ))
            .param(GeneratorParamSchema::ty(
                "untyped_buffer_output_type",
                ScalarType::Float32,
            ))
            .param(GeneratorParamSchema::boolean("vectorize", true))
            .param(GeneratorParamSchema::placement(
                "intermediate_level",
                Placement::Root,
            ))
            .output(OutputSpec::single(
                "simple_output",
                OutputType::Fixed(ScalarType::Float32),
                3,
            ))
            .output(OutputSpec::tuple(
                "tuple_output",
                vec![
                    OutputType::Fixed(ScalarType::Float32),
                    OutputType::Fixed(ScalarType::Float32),
                ],
                3,
            ))
            .output(OutputSpec::array(
                "array_output",
                OutputType::Fixed(ScalarType::Int16),
                2,
                ArraySizeSource::Input("array_input".to_string()),
            ))
            .output(OutputSpec::single(
                "typed_buffer_output",
                OutputType::Fixed(ScalarType::Float32),
                3,
            ))
            .output(OutputSpec::single(
                "untyped_buffer_output",
                OutputType::FromParam("untyped_buffer_output_type".to_string()),
                3,
            ))
            .output(OutputSpec::single(
                "static_compiled_buffer_output",
                OutputType::Fixed(ScalarType::UInt8),
                3,
            ));
        Self { schema }
    }
}

impl Default for ComplexStub {
    fn default() -> Self {
        Self::new()
    }
}

impl Generator for ComplexStub {
    fn schema(&self) -> &GeneratorSchema {
        &self.schema
    }

    fn generate(&self, ctx: &mut GeneratorContext<'_>) -> Result<(), StubError> {
        let (x, y, c) = (Var::new("x"), Var::new("y"), Var::new("c"));
        let xyc = [x.clone(), y.clone(), c.clone()];
        let inputs = ctx.binding();
        let params = ctx.params();

        let typed_buffer_input = inputs.buffer("typed_buffer_input")?;
        let untyped_buffer_input = inputs.buffer("untyped_buffer_input")?;
        let simple_input = inputs.func("simple_input")?;
        let array_input = inputs.funcs("array_input")?;
        let float_arg = inputs.scalar_expr("float_arg")?;
        let int_arg = inputs.scalar_exprs("int_arg")?;
        if int_arg.is_empty() || int_arg.len() < array_input.len() {
            return Err(StubError::GenerationFailed(format!(
                "int_arg has {} elements but at least max(1, {}) are required",
                int_arg.len(),
                array_input.len()
            )));
        }

        let simple_output = Func::new("simple_output");
        simple_output.define(
            &xyc,
            Expr::cast(ScalarType::Float32, simple_input.at(&xyc)),
        )?;

        let intermediate = Func::new("intermediate");
        intermediate.define(&xyc, simple_input.at(&xyc) * float_arg)?;
        intermediate.compute_at(&params.placement("intermediate_level")?);
        if params.bool("vectorize")? {
            intermediate.vectorize(&x, VECTOR_WIDTH);
        }

        let tuple_output = Func::new("tuple_output");
        tuple_output.define_tuple(
            &xyc,
            vec![intermediate.at(&xyc), intermediate.at(&xyc) + &int_arg[0]],
        )?;

        let array_output = array_input
            .iter()
            .zip(&int_arg)
            .enumerate()
            .map(|(i, (input, k))| -> Result<Func, StubError> {
                let f = Func::new(format!("array_output_{}", i));
                f.define(
                    &[x.clone(), y.clone()],
                    Expr::cast(
                        ScalarType::Int16,
                        input.at([Expr::from(&x), Expr::from(&y), Expr::from(0)]) + k,
                    ),
                )?;
                Ok(f)
            })
            .collect::<Result<Vec<_>, _>>()?;

        let typed_buffer_output = Func::new("typed_buffer_output");
        typed_buffer_output.define(
            &xyc,
            Expr::cast(ScalarType::Float32, Expr::image(&typed_buffer_input, &xyc)),
        )?;

        let untyped_buffer_output = Func::new("untyped_buffer_output");
        untyped_buffer_output.define(
            &xyc,
            Expr::cast(
                params.ty("untyped_buffer_output_type")?,
                Expr::image(&untyped_buffer_input, &xyc),
            ),
        )?;

        let static_compiled_buffer_output =
            compile_static_buffer(&typed_buffer_input, &xyc, ctx)?;

        ctx.define_output("simple_output", simple_output)?;
        ctx.define_output("tuple_output", tuple_output)?;
        ctx.define_output("array_output", array_output)?;
        ctx.define_output("typed_buffer_output", typed_buffer_output)?;
        ctx.define_output("untyped_buffer_output", untyped_buffer_output)?;
        ctx.define_output("static_compiled_buffer_output", static_compiled_buffer_output)
    }
}

/// Realize `typed_buffer_input + 42` now and wrap the result as a graph.
fn compile_static_buffer(
    typed_buffer_input: &Buffer,
    xyc: &[Var; 3],
    ctx: &GeneratorContext<'_>,
) -> Result<Func, StubError> {
    let producer = Func::new("static_compiled_buffer");
    producer.define(
        xyc,
        Expr::cast(
            ScalarType::UInt8,
            Expr::image(typed_buffer_input, xyc) + 42,
        ),
    )?;
    let realized = producer.realize(&STATIC_EXTENTS, ctx.target())?;
    let buffer = realized.buffer().clone();
    debug!(
        extents = ?buffer.extents(),
        target = %ctx.target(),
        "Realized static buffer during generation"
    );

    let wrapper = Func::new("static_compiled_buffer_output");
    wrapper.define(xyc, Expr::image(&buffer, xyc))?;
    Ok(wrapper)
}
