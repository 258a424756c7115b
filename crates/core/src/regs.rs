// HartLab - RISC-V Conformance Simulator
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Integer register file of a single RV32 hart.

use std::fmt;

/// The test status register of the riscv-tests convention (x3 / `gp`).
pub const GP: u8 = 3;

/// ABI names indexed by register number, used in dumps and traces.
pub const ABI_NAMES: [&str; 32] = [
    "zero", "ra", "sp", "gp", "tp", "t0", "t1", "t2", "s0", "s1", "a0", "a1", "a2", "a3", "a4",
    "a5", "a6", "a7", "s2", "s3", "s4", "s5", "s6", "s7", "s8", "s9", "s10", "s11", "t3", "t4",
    "t5", "t6",
];

/// The 32 integer registers plus the program counter. `x0` reads as zero and
/// ignores writes.
#[derive(Debug, Clone)]
pub struct RegisterFile {
    x: [u32; 32],
    pc: u32,
}

impl RegisterFile {
    pub fn new(pc: u32) -> Self {
        Self { x: [0; 32], pc }
    }

    pub fn read(&self, r: u8) -> u32 {
        if r == 0 {
            0
        } else {
            self.x[r as usize]
        }
    }

    pub fn write(&mut self, r: u8, value: u32) {
        if r != 0 {
            self.x[r as usize] = value;
        }
    }

    pub fn pc(&self) -> u32 {
        self.pc
    }

    pub fn set_pc(&mut self, pc: u32) {
        self.pc = pc;
    }

    pub fn name(r: u8) -> &'static str {
        ABI_NAMES[r as usize]
    }
}

impl fmt::Display for RegisterFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "  pc {:08x}", self.pc)?;
        for row in 0..8 {
            for col in 0..4 {
                let r = row * 4 + col;
                write!(f, "{:>4} {:08x}", ABI_NAMES[r], self.x[r])?;
                if col < 3 {
                    write!(f, "  ")?;
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_x0_is_hardwired_zero() {
        let mut regs = RegisterFile::new(0);
        regs.write(0, 0xDEAD_BEEF);
        assert_eq!(regs.read(0), 0);
    }

    #[test]
    fn test_read_write_roundtrip() {
        let mut regs = RegisterFile::new(0);
        for r in 1..32u8 {
            regs.write(r, u32::from(r) * 3);
        }
        for r in 1..32u8 {
            assert_eq!(regs.read(r), u32::from(r) * 3);
        }
    }

    #[test]
    fn test_pc_accessors() {
        let mut regs = RegisterFile::new(0x8000_0000);
        assert_eq!(regs.pc(), 0x8000_0000);
        regs.set_pc(0x8000_0004);
        assert_eq!(regs.pc(), 0x8000_0004);
    }

    #[test]
    fn test_abi_names() {
        assert_eq!(RegisterFile::name(0), "zero");
        assert_eq!(RegisterFile::name(GP), "gp");
        assert_eq!(RegisterFile::name(10), "a0");
        assert_eq!(RegisterFile::name(31), "t6");
    }

    #[test]
    fn test_display_dump() {
        let mut regs = RegisterFile::new(0x8000_0040);
        regs.write(GP, 1);
        let dump = format!("{regs}");
        assert!(dump.contains("pc 80000040"));
        assert!(dump.contains("gp 00000001"));
        assert_eq!(dump.lines().count(), 9);
    }
}
