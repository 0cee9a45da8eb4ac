//! Error types for the generator stub binding layer and the reference engine.

use std::fmt;
use thiserror::Error;

/// What a failed coercion was trying to produce a value for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoercionSubject {
    Input(String),
    GeneratorParam(String),
}

/// A supplied value that could not be adapted to the representation its
/// declaration requires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoercionFailure {
    pub subject: CoercionSubject,
    /// Kind of the supplied value, e.g. `str`, `float`, `Buffer<uint8>`.
    pub source: String,
    /// Required representation, e.g. `float32`, `Func`, `Buffer<uint8>(3)`.
    pub target: String,
    /// Index of the failing element when coercing an array.
    pub element: Option<usize>,
    pub detail: Option<String>,
}

impl CoercionFailure {
    pub fn new(subject: CoercionSubject, source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            subject,
            source: source.into(),
            target: target.into(),
            element: None,
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn at_element(mut self, index: usize) -> Self {
        // Nested arrays report the outermost index.
        self.element = Some(index);
        self
    }
}

impl fmt::Display for CoercionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unable to cast {} instance to {}", self.source, self.target)?;
        match &self.subject {
            CoercionSubject::Input(name) => write!(f, " for input '{}'", name)?,
            CoercionSubject::GeneratorParam(name) => write!(f, " for GeneratorParam '{}'", name)?,
        }
        if let Some(index) = self.element {
            write!(f, " (element {})", index)?;
        }
        if let Some(detail) = &self.detail {
            write!(f, ": {}", detail)?;
        }
        Ok(())
    }
}

/// Errors raised by `generate()`. None of these leave partial state behind.
#[derive(Debug, Error)]
pub enum StubError {
    #[error("Unknown generator: '{0}'")]
    UnknownGenerator(String),

    #[error("Expected exactly {expected} inputs but got {got}")]
    ArgumentCountMismatch { expected: usize, got: usize },

    #[error("The input '{0}' must be specified.")]
    MissingRequiredInput(String),

    #[error("{0}")]
    TypeCoercionFailure(CoercionFailure),

    #[error("Generator '{generator}' has no GeneratorParam named '{name}'")]
    UnknownGeneratorParam { generator: String, name: String },

    #[error("Generation failed: {0}")]
    GenerationFailed(String),

    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),
}

impl From<CoercionFailure> for StubError {
    fn from(failure: CoercionFailure) -> Self {
        StubError::TypeCoercionFailure(failure)
    }
}

/// Errors raised while registering generator schemas.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Generator '{0}' is already registered")]
    DuplicateGenerator(String),

    #[error("Invalid schema for generator '{generator}': {reason}")]
    InvalidSchema { generator: String, reason: String },
}

/// Errors raised by the reference graph engine.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EngineError {
    #[error("Func '{0}' has no definition")]
    UndefinedFunc(String),

    #[error("Func '{0}' is already defined")]
    AlreadyDefined(String),

    #[error("Func '{name}' is {expected}-dimensional but was called with {got} arguments")]
    ArityMismatch {
        name: String,
        expected: usize,
        got: usize,
    },

    #[error("Variable '{var}' is not a pure argument of Func '{func}'")]
    UnboundVar { func: String, var: String },

    #[error("Func '{name}' has {expected} channels but {got} were requested")]
    ChannelMismatch {
        name: String,
        expected: usize,
        got: usize,
    },

    #[error("Access to buffer '{name}' at {coords:?} is outside its extents {extents:?}")]
    OutOfBounds {
        name: String,
        coords: Vec<i64>,
        extents: Vec<usize>,
    },

    #[error("Buffer '{name}' has type {actual} but {expected} was required")]
    TypeMismatch {
        name: String,
        expected: String,
        actual: String,
    },

    #[error("Buffer parameter '{0}' is not bound to a buffer")]
    UnboundParam(String),

    #[error("Func '{0}' refers to itself in its own definition")]
    RecursiveDefinition(String),

    #[error("Invalid placement for Func '{func}': {reason}")]
    InvalidPlacement { func: String, reason: String },

    #[error("Invalid target '{0}': {1}")]
    InvalidTarget(String, String),
}

/// Configuration and logging setup errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Logging setup failed: {0}")]
    Logging(String),
}

/// Errors surfaced by the inspection CLI.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Stub(#[from] StubError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to serialize output: {0}")]
    Serialization(#[from] serde_json::Error),
}
