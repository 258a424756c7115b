// HartLab - RISC-V Conformance Simulator
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Manifest schema version this build understands.
pub const SCHEMA_VERSION: &str = "1.0";

/// Step budget applied when a manifest does not name one.
pub const DEFAULT_MAX_STEPS: u64 = 1_000_000;

/// Default schema version for YAML manifests
fn default_schema_version() -> String {
    SCHEMA_VERSION.to_string()
}

fn default_machine_name() -> String {
    "rv32-virt".to_string()
}

fn default_max_steps() -> u64 {
    DEFAULT_MAX_STEPS
}

/// RAM window of the simulated machine.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct MemoryWindow {
    pub base: u32,
    pub size: String, // e.g. "64KiB"
}

impl Default for MemoryWindow {
    fn default() -> Self {
        Self {
            base: 0x8000_0000,
            size: "64KiB".to_string(),
        }
    }
}

/// Bounds on a single simulation run.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct RunLimits {
    #[serde(default = "default_max_steps")]
    pub max_steps: u64,
}

impl Default for RunLimits {
    fn default() -> Self {
        Self {
            max_steps: DEFAULT_MAX_STEPS,
        }
    }
}

/// A machine manifest. Every section is optional; the defaults describe the
/// virtual machine the rv32ui-p binaries link against.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct MachineConfig {
    #[serde(default = "default_schema_version")]
    pub schema_version: String,
    #[serde(default = "default_machine_name")]
    pub name: String,
    #[serde(default)]
    pub memory: MemoryWindow,
    #[serde(default)]
    pub limits: RunLimits,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            name: default_machine_name(),
            memory: MemoryWindow::default(),
            limits: RunLimits::default(),
        }
    }
}

impl MachineConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read machine manifest {:?}", path))?;
        let config: Self = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse machine manifest {:?}", path))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.schema_version != SCHEMA_VERSION {
            anyhow::bail!(
                "Unsupported schema_version '{}'. Supported versions: '{}'",
                self.schema_version,
                SCHEMA_VERSION
            );
        }

        if self.name.trim().is_empty() {
            anyhow::bail!("Machine 'name' cannot be empty");
        }

        if self.limits.max_steps == 0 {
            anyhow::bail!("Limit 'max_steps' must be greater than zero");
        }

        let size = parse_size(&self.memory.size)?;
        if size == 0 {
            anyhow::bail!("Memory 'size' must be greater than zero");
        }
        if u64::from(self.memory.base) + size > 1 << 32 {
            anyhow::bail!(
                "Memory window {:#010x}+{} does not fit the 32-bit address space",
                self.memory.base,
                size
            );
        }

        Ok(())
    }
}

pub fn parse_size(size_str: &str) -> Result<u64> {
    use human_size::{Byte, Size, SpecificSize};
    let s: Size = size_str
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid size format: {}", e))?;
    let bytes: SpecificSize<Byte> = s.into();
    Ok(bytes.value() as u64)
}
