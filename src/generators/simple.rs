//! `simplestub`: one typed buffer, one graph, one bounded float.
//!
//! `simple_output(x, y, c) = f32(func_input + offset + typed_buffer_input) + float_arg`,
//! computed wherever the `compute_level` handle says at lowering time.

use crate::engine::{Expr, Func, Placement, Var};
use crate::error::StubError;
use crate::generator::{Generator, GeneratorContext};
use crate::schema::{GeneratorParamSchema, GeneratorSchema, OutputSpec, OutputType, ParameterSchema};
use crate::types::ScalarType;

pub const ID: &str = "simplestub";

pub struct SimpleStub {
    schema: GeneratorSchema,
}

impl SimpleStub {
    pub fn new() -> Self {
        let schema = GeneratorSchema::new(ID)
            .input(ParameterSchema::typed_buffer(
                "typed_buffer_input",
                ScalarType::UInt8,
                3,
            ))
            .input(ParameterSchema::graph("func_input", None, 3))
            .input(
                ParameterSchema::scalar("float_arg", ScalarType::Float32)
                    .with_range(0.0, 100.0)
                    .with_default(1.0),
            )
            .param(GeneratorParamSchema::int("offset", 0))
            .param(GeneratorParamSchema::placement("compute_level", Placement::Root))
            .output(OutputSpec::single(
                "simple_output",
                OutputType::Fixed(ScalarType::Float32),
                3,
            ));
        Self { schema }
    }
}

impl Default for SimpleStub {
    fn default() -> Self {
        Self::new()
    }
}

impl Generator for SimpleStub {
    fn schema(&self) -> &GeneratorSchema {
        &self.schema
    }

    fn generate(&self, ctx: &mut GeneratorContext<'_>) -> Result<(), StubError> {
        let (x, y, c) = (Var::new("x"), Var::new("y"), Var::new("c"));
        let inputs = ctx.binding();
        let params = ctx.params();

        let typed_buffer_input = inputs.buffer("typed_buffer_input")?;
        let func_input = inputs.func("func_input")?;
        let float_arg = inputs.scalar_expr("float_arg")?;
        let offset = Expr::constant(ScalarType::Int32, params.int("offset")? as f64);
        let compute_level = params.placement("compute_level")?;

        let simple_output = Func::new("simple_output");
        let sum = func_input.at([&x, &y, &c])
            + offset
            + Expr::image(&typed_buffer_input, [&x, &y, &c]);
        simple_output.define(
            &[x.clone(), y.clone(), c.clone()],
            Expr::cast(ScalarType::Float32, sum) + float_arg,
        )?;
        simple_output.compute_at(&compute_level);

        ctx.define_output("simple_output", simple_output)
    }
}
