//! Core value types shared by the binding layer and the reference engine.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Element type of a scalar, buffer, or graph channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalarType {
    Bool,
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Float32,
    Float64,
}

impl ScalarType {
    pub fn is_float(self) -> bool {
        matches!(self, ScalarType::Float32 | ScalarType::Float64)
    }

    pub fn is_signed_int(self) -> bool {
        matches!(
            self,
            ScalarType::Int8 | ScalarType::Int16 | ScalarType::Int32 | ScalarType::Int64
        )
    }

    pub fn is_unsigned_int(self) -> bool {
        matches!(
            self,
            ScalarType::UInt8 | ScalarType::UInt16 | ScalarType::UInt32 | ScalarType::UInt64
        )
    }

    pub fn bits(self) -> u32 {
        match self {
            ScalarType::Bool => 1,
            ScalarType::Int8 | ScalarType::UInt8 => 8,
            ScalarType::Int16 | ScalarType::UInt16 => 16,
            ScalarType::Int32 | ScalarType::UInt32 | ScalarType::Float32 => 32,
            ScalarType::Int64 | ScalarType::UInt64 | ScalarType::Float64 => 64,
        }
    }

    /// Smallest representable value, as f64.
    pub fn min_value(self) -> f64 {
        match self {
            ScalarType::Bool => 0.0,
            ScalarType::Float32 => f32::MIN as f64,
            ScalarType::Float64 => f64::MIN,
            t if t.is_unsigned_int() => 0.0,
            t => -(2f64.powi(t.bits() as i32 - 1)),
        }
    }

    /// Largest representable value, as f64.
    pub fn max_value(self) -> f64 {
        match self {
            ScalarType::Bool => 1.0,
            ScalarType::Float32 => f32::MAX as f64,
            ScalarType::Float64 => f64::MAX,
            t if t.is_unsigned_int() => 2f64.powi(t.bits() as i32) - 1.0,
            t => 2f64.powi(t.bits() as i32 - 1) - 1.0,
        }
    }

    /// Convert a value into this type's representation.
    ///
    /// Integer targets truncate toward zero and wrap modulo 2^bits; float32
    /// rounds to single precision; bool maps non-zero to 1. 64-bit results are
    /// exact only within f64 precision.
    pub fn convert(self, value: f64) -> f64 {
        match self {
            ScalarType::Bool => {
                if value != 0.0 {
                    1.0
                } else {
                    0.0
                }
            }
            ScalarType::Float32 => value as f32 as f64,
            ScalarType::Float64 => value,
            // i128 -> 64-bit `as` casts keep the low 64 bits.
            ScalarType::Int64 => value.trunc() as i128 as i64 as f64,
            ScalarType::UInt64 => value.trunc() as i128 as u64 as f64,
            t => {
                let modulus = 2f64.powi(t.bits() as i32);
                let mut v = value.trunc().rem_euclid(modulus);
                if t.is_signed_int() && v > t.max_value() {
                    v -= modulus;
                }
                v
            }
        }
    }

    /// Whether `value` is exactly representable without conversion.
    pub fn can_represent(self, value: f64) -> bool {
        if value.is_nan() {
            return self.is_float();
        }
        if self.is_float() {
            return self == ScalarType::Float64
                || value.is_infinite()
                || value.abs() <= f32::MAX as f64;
        }
        value.fract() == 0.0 && value >= self.min_value() && value <= self.max_value()
    }

    /// Result type of a binary arithmetic operation.
    pub fn promote(a: ScalarType, b: ScalarType) -> ScalarType {
        if a == b {
            return a;
        }
        match (a.is_float(), b.is_float()) {
            (true, true) => {
                if a.bits() >= b.bits() {
                    a
                } else {
                    b
                }
            }
            (true, false) => a,
            (false, true) => b,
            (false, false) => {
                if a == ScalarType::Bool {
                    b
                } else if b == ScalarType::Bool {
                    a
                } else if a.bits() > b.bits() {
                    a
                } else if b.bits() > a.bits() {
                    b
                } else if a.is_signed_int() {
                    a
                } else {
                    b
                }
            }
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ScalarType::Bool => "bool",
            ScalarType::Int8 => "int8",
            ScalarType::Int16 => "int16",
            ScalarType::Int32 => "int32",
            ScalarType::Int64 => "int64",
            ScalarType::UInt8 => "uint8",
            ScalarType::UInt16 => "uint16",
            ScalarType::UInt32 => "uint32",
            ScalarType::UInt64 => "uint64",
            ScalarType::Float32 => "float32",
            ScalarType::Float64 => "float64",
        }
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScalarType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bool" => Ok(ScalarType::Bool),
            "int8" => Ok(ScalarType::Int8),
            "int16" => Ok(ScalarType::Int16),
            "int32" | "int" => Ok(ScalarType::Int32),
            "int64" => Ok(ScalarType::Int64),
            "uint8" => Ok(ScalarType::UInt8),
            "uint16" => Ok(ScalarType::UInt16),
            "uint32" => Ok(ScalarType::UInt32),
            "uint64" => Ok(ScalarType::UInt64),
            "float32" | "float" => Ok(ScalarType::Float32),
            "float64" | "double" => Ok(ScalarType::Float64),
            other => Err(format!("unknown type name '{}'", other)),
        }
    }
}

/// A typed scalar. Values are held as f64 and normalized to `ty` on construction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScalarValue {
    pub ty: ScalarType,
    pub value: f64,
}

impl ScalarValue {
    pub fn new(ty: ScalarType, value: f64) -> Self {
        Self {
            ty,
            value: ty.convert(value),
        }
    }

    pub fn as_f64(&self) -> f64 {
        self.value
    }

    pub fn as_i64(&self) -> i64 {
        self.value as i64
    }

    pub fn as_bool(&self) -> bool {
        self.value != 0.0
    }
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.ty == ScalarType::Bool {
            write!(f, "{}", self.as_bool())
        } else {
            write!(f, "{}:{}", self.value, self.ty)
        }
    }
}
