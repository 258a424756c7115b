// HartLab - RISC-V Conformance Simulator
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Flat little-endian memory window.
//!
//! The simulated machine owns a single RAM region, by default 64 KiB at
//! 0x8000_0000 where the conformance binaries link. Accesses of any width may
//! be unaligned; an access that is not fully inside the window fails with
//! [`SimulationError::OutOfBounds`] and leaves memory untouched.

use anyhow::bail;
use tracing::debug;

use hartlab_config::{parse_size, MemoryWindow};

use crate::image::{ProgramImage, Segment};
use crate::{SimResult, SimulationError};

/// Link base of the rv32ui-p test binaries.
pub const DEFAULT_BASE: u32 = 0x8000_0000;
/// Default window size, enough for every base-ISA conformance test.
pub const DEFAULT_SIZE: usize = 64 * 1024;

/// Byte-addressable RAM mapped at a fixed guest base address.
#[derive(Debug, Clone)]
pub struct AddressSpace {
    data: Vec<u8>,
    base: u32,
}

impl AddressSpace {
    pub fn new(base: u32, size: usize) -> Self {
        Self {
            data: vec![0; size],
            base,
        }
    }

    /// Build the window described by a machine manifest.
    pub fn from_config(config: &MemoryWindow) -> anyhow::Result<Self> {
        let size = parse_size(&config.size)?;
        if size == 0 {
            bail!("memory size must be non-zero");
        }
        if u64::from(config.base) + size > 1 << 32 {
            bail!(
                "memory window {:#010x}+{} bytes overflows the 32-bit address space",
                config.base,
                size
            );
        }
        Ok(Self::new(config.base, size as usize))
    }

    pub fn base(&self) -> u32 {
        self.base
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Map a guest address to an offset into the backing buffer.
    pub fn translate(&self, addr: u32) -> SimResult<usize> {
        if addr < self.base {
            return Err(SimulationError::OutOfBounds { addr });
        }
        let offset = (addr - self.base) as usize;
        if offset >= self.data.len() {
            return Err(SimulationError::OutOfBounds { addr });
        }
        Ok(offset)
    }

    /// Translate `addr` and check that `len` bytes starting there fit.
    fn span(&self, addr: u32, len: usize) -> SimResult<usize> {
        let offset = self.translate(addr)?;
        if self.data.len() - offset < len {
            return Err(SimulationError::OutOfBounds { addr });
        }
        Ok(offset)
    }

    pub fn read_u8(&self, addr: u32) -> SimResult<u8> {
        let offset = self.translate(addr)?;
        Ok(self.data[offset])
    }

    pub fn read_u16(&self, addr: u32) -> SimResult<u16> {
        let offset = self.span(addr, 2)?;
        Ok(u16::from_le_bytes([
            self.data[offset],
            self.data[offset + 1],
        ]))
    }

    pub fn read_u32(&self, addr: u32) -> SimResult<u32> {
        let offset = self.span(addr, 4)?;
        Ok(u32::from_le_bytes([
            self.data[offset],
            self.data[offset + 1],
            self.data[offset + 2],
            self.data[offset + 3],
        ]))
    }

    pub fn write_u8(&mut self, addr: u32, value: u8) -> SimResult<()> {
        let offset = self.translate(addr)?;
        self.data[offset] = value;
        Ok(())
    }

    pub fn write_u16(&mut self, addr: u32, value: u16) -> SimResult<()> {
        let offset = self.span(addr, 2)?;
        self.data[offset..offset + 2].copy_from_slice(&value.to_le_bytes());
        Ok(())
    }

    pub fn write_u32(&mut self, addr: u32, value: u32) -> SimResult<()> {
        let offset = self.span(addr, 4)?;
        self.data[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
        Ok(())
    }

    /// Copy one program segment into the window.
    pub fn load_segment(&mut self, segment: &Segment) -> SimResult<()> {
        if segment.data.is_empty() {
            return Ok(());
        }
        let offset = self.span(segment.start_addr, segment.data.len())?;
        self.data[offset..offset + segment.data.len()].copy_from_slice(&segment.data);
        Ok(())
    }

    /// Place every segment of `image` into the window.
    pub fn load_image(&mut self, image: &ProgramImage) -> SimResult<()> {
        for segment in &image.segments {
            debug!(
                "Placing segment at {:#010x} ({} bytes)",
                segment.start_addr,
                segment.data.len()
            );
            self.load_segment(segment)?;
        }
        Ok(())
    }
}

impl Default for AddressSpace {
    fn default() -> Self {
        Self::new(DEFAULT_BASE, DEFAULT_SIZE)
    }
}
