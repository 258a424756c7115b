// HartLab - RISC-V Conformance Simulator
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! ELF32 loading for rv32ui-p conformance binaries.
//!
//! Only statically linked 32-bit RISC-V executables are accepted. The loader
//! extracts the PT_LOAD segments and the entry point; section headers and
//! symbols are ignored.

use anyhow::{anyhow, Context, Result};
use goblin::elf::header::EM_RISCV;
use goblin::elf::program_header::PT_LOAD;
use goblin::elf::Elf;
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

use hartlab_core::ProgramImage;

pub fn load_elf(path: &Path) -> Result<ProgramImage> {
    let buffer = fs::read(path).with_context(|| format!("Failed to read ELF file: {:?}", path))?;
    load_elf_bytes(&buffer)
}

pub fn load_elf_bytes(buffer: &[u8]) -> Result<ProgramImage> {
    let elf = Elf::parse(buffer).context("Failed to parse ELF binary")?;

    if elf.is_64 {
        return Err(anyhow!("64-bit ELF binaries are not supported"));
    }
    if elf.header.e_machine != EM_RISCV {
        return Err(anyhow!(
            "Unsupported ELF machine type {} (expected RISC-V)",
            elf.header.e_machine
        ));
    }

    info!("ELF Entry Point: {:#x}", elf.entry);

    let mut image = ProgramImage::new(elf.entry as u32);

    for ph in elf.program_headers {
        if ph.p_type == PT_LOAD {
            // The physical address (LMA) is where the test expects to run.
            let start_addr = ph.p_paddr as u32;
            let size = ph.p_filesz as usize;
            let offset = ph.p_offset as usize;

            if size == 0 {
                continue;
            }

            debug!(
                "Found Loadable Segment: Addr={:#x}, Size={} bytes, Offset={:#x}",
                start_addr, size, offset
            );

            if offset + size > buffer.len() {
                return Err(anyhow!("Segment out of bounds in ELF file"));
            }

            image.add_segment(start_addr, buffer[offset..offset + size].to_vec());
        }
    }

    if image.segments.is_empty() {
        warn!("No loadable segments found in ELF file");
    }

    Ok(image)
}
