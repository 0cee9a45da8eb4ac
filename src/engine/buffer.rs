//! Typed multi-dimensional buffers and the runtime parameters that bind to them.

use crate::engine::unique_name;
use crate::error::EngineError;
use crate::types::{ScalarType, ScalarValue};
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;

/// A concrete, typed, multi-dimensional memory region.
///
/// Handles are shared: cloning a `Buffer` yields another reference to the same
/// storage. Elements are laid out with the first dimension innermost.
#[derive(Clone)]
pub struct Buffer {
    inner: Arc<BufferInner>,
}

struct BufferInner {
    name: String,
    ty: ScalarType,
    extents: Vec<usize>,
    data: RwLock<Vec<f64>>,
}

impl Buffer {
    /// Allocate a zero-filled buffer with an auto-generated name.
    pub fn new(ty: ScalarType, extents: &[usize]) -> Self {
        Self::with_name(ty, extents, unique_name("b"))
    }

    pub fn with_name(ty: ScalarType, extents: &[usize], name: impl Into<String>) -> Self {
        let len = extents.iter().product();
        Self {
            inner: Arc::new(BufferInner {
                name: name.into(),
                ty,
                extents: extents.to_vec(),
                data: RwLock::new(vec![0.0; len]),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn ty(&self) -> ScalarType {
        self.inner.ty
    }

    pub fn extents(&self) -> &[usize] {
        &self.inner.extents
    }

    pub fn dimensions(&self) -> usize {
        self.inner.extents.len()
    }

    pub fn len(&self) -> usize {
        self.inner.data.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Set every element to `value`, converted to the element type.
    pub fn fill(&self, value: f64) {
        let v = self.inner.ty.convert(value);
        self.inner.data.write().iter_mut().for_each(|e| *e = v);
    }

    pub fn get(&self, coords: &[i64]) -> Result<f64, EngineError> {
        let index = self.offset_of(coords)?;
        Ok(self.inner.data.read()[index])
    }

    pub fn get_value(&self, coords: &[i64]) -> Result<ScalarValue, EngineError> {
        Ok(ScalarValue::new(self.inner.ty, self.get(coords)?))
    }

    /// Store `value` at `coords`, converted to the element type.
    pub fn set(&self, coords: &[i64], value: f64) -> Result<(), EngineError> {
        let index = self.offset_of(coords)?;
        self.inner.data.write()[index] = self.inner.ty.convert(value);
        Ok(())
    }

    pub fn to_vec(&self) -> Vec<f64> {
        self.inner.data.read().clone()
    }

    /// Whether both handles refer to the same storage.
    pub fn ptr_eq(&self, other: &Buffer) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    fn offset_of(&self, coords: &[i64]) -> Result<usize, EngineError> {
        let extents = &self.inner.extents;
        let out_of_bounds = || EngineError::OutOfBounds {
            name: self.inner.name.clone(),
            coords: coords.to_vec(),
            extents: extents.clone(),
        };
        if coords.len() != extents.len() {
            return Err(out_of_bounds());
        }
        let mut offset = 0usize;
        let mut stride = 1usize;
        for (&c, &extent) in coords.iter().zip(extents) {
            if c < 0 || c as usize >= extent {
                return Err(out_of_bounds());
            }
            offset += c as usize * stride;
            stride *= extent;
        }
        Ok(offset)
    }
}

impl fmt::Debug for Buffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Buffer")
            .field("name", &self.inner.name)
            .field("ty", &self.inner.ty)
            .field("extents", &self.inner.extents)
            .finish()
    }
}

/// Runtime placeholder for a buffer, bound to concrete storage before realization.
#[derive(Clone)]
pub struct BufferParam {
    inner: Arc<BufferParamInner>,
}

struct BufferParamInner {
    name: String,
    explicit_name: bool,
    ty: ScalarType,
    dimensions: usize,
    bound: RwLock<Option<Buffer>>,
}

impl BufferParam {
    pub fn new(ty: ScalarType, dimensions: usize) -> Self {
        Self::build(ty, dimensions, unique_name("p"), false)
    }

    pub fn named(ty: ScalarType, dimensions: usize, name: impl Into<String>) -> Self {
        Self::build(ty, dimensions, name.into(), true)
    }

    fn build(ty: ScalarType, dimensions: usize, name: String, explicit_name: bool) -> Self {
        Self {
            inner: Arc::new(BufferParamInner {
                name,
                explicit_name,
                ty,
                dimensions,
                bound: RwLock::new(None),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn is_explicit_name(&self) -> bool {
        self.inner.explicit_name
    }

    pub fn ty(&self) -> ScalarType {
        self.inner.ty
    }

    pub fn dimensions(&self) -> usize {
        self.inner.dimensions
    }

    /// Bind concrete storage. The buffer must match the declared type and dimensionality.
    pub fn set(&self, buffer: &Buffer) -> Result<(), EngineError> {
        if buffer.ty() != self.inner.ty {
            return Err(EngineError::TypeMismatch {
                name: buffer.name().to_string(),
                expected: self.inner.ty.to_string(),
                actual: buffer.ty().to_string(),
            });
        }
        if buffer.dimensions() != self.inner.dimensions {
            return Err(EngineError::ArityMismatch {
                name: self.inner.name.clone(),
                expected: self.inner.dimensions,
                got: buffer.dimensions(),
            });
        }
        *self.inner.bound.write() = Some(buffer.clone());
        Ok(())
    }

    pub fn get(&self) -> Option<Buffer> {
        self.inner.bound.read().clone()
    }

    pub fn buffer(&self) -> Result<Buffer, EngineError> {
        self.get()
            .ok_or_else(|| EngineError::UnboundParam(self.inner.name.clone()))
    }

    pub fn ptr_eq(&self, other: &BufferParam) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for BufferParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BufferParam")
            .field("name", &self.inner.name)
            .field("ty", &self.inner.ty)
            .field("dimensions", &self.inner.dimensions)
            .finish()
    }
}

/// Runtime scalar placeholder. Its value is read at each realization.
#[derive(Clone)]
pub struct ScalarParam {
    inner: Arc<ScalarParamInner>,
}

struct ScalarParamInner {
    name: String,
    explicit_name: bool,
    ty: ScalarType,
    value: RwLock<f64>,
}

impl ScalarParam {
    pub fn new(ty: ScalarType) -> Self {
        Self::build(ty, unique_name("s"), false)
    }

    pub fn named(ty: ScalarType, name: impl Into<String>) -> Self {
        Self::build(ty, name.into(), true)
    }

    fn build(ty: ScalarType, name: String, explicit_name: bool) -> Self {
        Self {
            inner: Arc::new(ScalarParamInner {
                name,
                explicit_name,
                ty,
                value: RwLock::new(0.0),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn is_explicit_name(&self) -> bool {
        self.inner.explicit_name
    }

    pub fn ty(&self) -> ScalarType {
        self.inner.ty
    }

    pub fn set(&self, value: f64) {
        *self.inner.value.write() = self.inner.ty.convert(value);
    }

    pub fn get(&self) -> f64 {
        *self.inner.value.read()
    }

    pub fn ptr_eq(&self, other: &ScalarParam) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for ScalarParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScalarParam")
            .field("name", &self.inner.name)
            .field("ty", &self.inner.ty)
            .finish()
    }
}
