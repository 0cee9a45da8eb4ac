//! Target descriptors.
//!
//! The stub layer never inspects a target; it hands it to lowering unchanged.

use crate::error::EngineError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Environment variable consulted by [`Target::from_env`].
pub const TARGET_ENV_VAR: &str = "GENSTUB_TARGET";

const KNOWN_ARCHES: &[&str] = &["x86", "arm", "riscv", "wasm"];
const KNOWN_OSES: &[&str] = &["linux", "osx", "windows", "android", "ios", "noos"];

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Target {
    pub arch: String,
    pub bits: u32,
    pub os: String,
    pub features: BTreeSet<String>,
}

impl Target {
    /// The machine this process runs on.
    pub fn host() -> Self {
        let arch = match std::env::consts::ARCH {
            "x86" | "x86_64" => "x86",
            "arm" | "aarch64" => "arm",
            "riscv64" => "riscv",
            "wasm32" => "wasm",
            _ => "x86",
        };
        let os = match std::env::consts::OS {
            "macos" => "osx",
            "linux" => "linux",
            "windows" => "windows",
            "android" => "android",
            "ios" => "ios",
            _ => "noos",
        };
        Self {
            arch: arch.to_string(),
            bits: (std::mem::size_of::<usize>() * 8) as u32,
            os: os.to_string(),
            features: BTreeSet::new(),
        }
    }

    /// Read `GENSTUB_TARGET`, defaulting to the host when unset or empty.
    pub fn from_env() -> Result<Self, EngineError> {
        match std::env::var(TARGET_ENV_VAR) {
            Ok(s) if !s.trim().is_empty() => s.parse(),
            _ => Ok(Self::host()),
        }
    }

    pub fn has_feature(&self, feature: &str) -> bool {
        self.features.contains(feature)
    }

    pub fn with_feature(mut self, feature: impl Into<String>) -> Self {
        self.features.insert(feature.into());
        self
    }
}

impl FromStr for Target {
    type Err = EngineError;

    /// Accepts `host`, `host-<feature>...`, or `<arch>-<bits>-<os>[-<feature>...]`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| EngineError::InvalidTarget(s.to_string(), reason.to_string());
        let mut parts = s.trim().split('-');
        let first = parts.next().filter(|p| !p.is_empty()).ok_or_else(|| invalid("empty"))?;

        let mut target = if first == "host" {
            Self::host()
        } else {
            if !KNOWN_ARCHES.contains(&first) {
                return Err(invalid("unknown architecture"));
            }
            let bits: u32 = parts
                .next()
                .and_then(|b| b.parse().ok())
                .filter(|b| *b == 32 || *b == 64)
                .ok_or_else(|| invalid("bits must be 32 or 64"))?;
            let os = parts
                .next()
                .filter(|o| KNOWN_OSES.contains(o))
                .ok_or_else(|| invalid("unknown operating system"))?;
            Self {
                arch: first.to_string(),
                bits,
                os: os.to_string(),
                features: BTreeSet::new(),
            }
        };

        for feature in parts {
            if feature.is_empty() {
                return Err(invalid("empty feature"));
            }
            target.features.insert(feature.to_string());
        }
        Ok(target)
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}", self.arch, self.bits, self.os)?;
        for feature in &self.features {
            write!(f, "-{}", feature)?;
        }
        Ok(())
    }
}
