//! genstub: Generator Stub Argument Binding
//!
//! Invokes a pipeline generator as an ordinary function call. Inputs arrive
//! positionally or by name, are coerced to the generator's declared kinds,
//! generation-time parameters are overlaid on their defaults, and the
//! generator's outputs come back in declared order. A small reference engine
//! supplies the graph, buffer, and deferred placement handles the stubs bind.

pub mod assemble;
pub mod cli;
pub mod coerce;
pub mod config;
pub mod engine;
pub mod error;
pub mod generator;
pub mod generators;
pub mod logging;
pub mod params;
pub mod registry;
pub mod resolver;
pub mod schema;
pub mod stub;
pub mod types;
pub mod value;

pub use assemble::{OutputValue, StubOutputs};
pub use coerce::Binding;
pub use engine::{
    Buffer, BufferParam, Expr, Func, Placement, PlacementHandle, Realization, ScalarParam,
    Target, Var,
};
pub use error::{CoercionFailure, EngineError, RegistryError, StubError};
pub use generator::{Generator, GeneratorContext};
pub use params::{GeneratorParamMap, GeneratorParamValues};
pub use registry::SchemaRegistry;
pub use resolver::{StubInputs, UnknownInputPolicy};
pub use schema::GeneratorSchema;
pub use stub::{generate, Stub};
pub use types::{ScalarType, ScalarValue};
pub use value::{ArgumentValue, RawValue};
