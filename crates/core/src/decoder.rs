// HartLab - RISC-V Conformance Simulator
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! RV32I instruction decoder.
//!
//! [`decode`] turns a 32-bit word into an [`Instruction`] or `None` when the
//! word is not a recognized RV32I encoding. Immediates are fully assembled and
//! sign-extended here so execution never touches raw encoding bits.

use crate::bits;

/// One decoded RV32I instruction with register numbers and immediates
/// unpacked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    Lui { rd: u8, imm: u32 },                 // Load Upper Immediate
    Auipc { rd: u8, imm: u32 },               // Add Upper Immediate to PC
    Jal { rd: u8, imm: i32 },                 // Jump And Link
    Jalr { rd: u8, rs1: u8, imm: i32 },       // Jump And Link Register
    Beq { rs1: u8, rs2: u8, imm: i32 },       // Branch if Equal
    Bne { rs1: u8, rs2: u8, imm: i32 },       // Branch if Not Equal
    Blt { rs1: u8, rs2: u8, imm: i32 },       // Branch if Less Than (signed)
    Bge { rs1: u8, rs2: u8, imm: i32 },       // Branch if Greater or Equal (signed)
    Bltu { rs1: u8, rs2: u8, imm: i32 },      // Branch if Less Than (unsigned)
    Bgeu { rs1: u8, rs2: u8, imm: i32 },      // Branch if Greater or Equal (unsigned)
    Lb { rd: u8, rs1: u8, imm: i32 },         // Load Byte (sign-extend)
    Lh { rd: u8, rs1: u8, imm: i32 },         // Load Halfword (sign-extend)
    Lw { rd: u8, rs1: u8, imm: i32 },         // Load Word
    Lbu { rd: u8, rs1: u8, imm: i32 },        // Load Byte (zero-extend)
    Lhu { rd: u8, rs1: u8, imm: i32 },        // Load Halfword (zero-extend)
    Sb { rs1: u8, rs2: u8, imm: i32 },        // Store Byte
    Sh { rs1: u8, rs2: u8, imm: i32 },        // Store Halfword
    Sw { rs1: u8, rs2: u8, imm: i32 },        // Store Word
    Addi { rd: u8, rs1: u8, imm: i32 },       // Add Immediate
    Slti { rd: u8, rs1: u8, imm: i32 },       // Set if Less Than Immediate (signed)
    Sltiu { rd: u8, rs1: u8, imm: i32 },      // Set if Less Than Immediate (unsigned)
    Xori { rd: u8, rs1: u8, imm: i32 },       // Exclusive-Or Immediate
    Ori { rd: u8, rs1: u8, imm: i32 },        // Or Immediate
    Andi { rd: u8, rs1: u8, imm: i32 },       // And Immediate
    Slli { rd: u8, rs1: u8, shamt: u8 },      // Shift Left Logical Immediate
    Srli { rd: u8, rs1: u8, shamt: u8 },      // Shift Right Logical Immediate
    Srai { rd: u8, rs1: u8, shamt: u8 },      // Shift Right Arithmetic Immediate
    Add { rd: u8, rs1: u8, rs2: u8 },         // Add
    Sub { rd: u8, rs1: u8, rs2: u8 },         // Subtract
    Sll { rd: u8, rs1: u8, rs2: u8 },         // Shift Left Logical
    Slt { rd: u8, rs1: u8, rs2: u8 },         // Set if Less Than (signed)
    Sltu { rd: u8, rs1: u8, rs2: u8 },        // Set if Less Than (unsigned)
    Xor { rd: u8, rs1: u8, rs2: u8 },         // Exclusive-Or
    Srl { rd: u8, rs1: u8, rs2: u8 },         // Shift Right Logical
    Sra { rd: u8, rs1: u8, rs2: u8 },         // Shift Right Arithmetic
    Or { rd: u8, rs1: u8, rs2: u8 },          // Or
    And { rd: u8, rs1: u8, rs2: u8 },         // And
    Fence,                                    // Memory ordering (no-op here)
    Ecall,                                    // Environment call
    Mret,                                     // Machine-mode trap return
    Csrrw { rd: u8, rs1: u8, csr: u16 },      // CSR Read/Write
    Csrrs { rd: u8, rs1: u8, csr: u16 },      // CSR Read and Set bits
    Csrrc { rd: u8, rs1: u8, csr: u16 },      // CSR Read and Clear bits
    Csrrwi { rd: u8, imm: u8, csr: u16 },     // CSR Read/Write Immediate
    Csrrsi { rd: u8, imm: u8, csr: u16 },     // CSR Read and Set Immediate
    Csrrci { rd: u8, imm: u8, csr: u16 },     // CSR Read and Clear Immediate
}

/// I-type immediate: word[31:20], sign-extended from 12 bits.
pub fn imm_i(word: u32) -> i32 {
    bits::sign_extend(bits::extract(word, 31, 20), 12)
}

/// S-type immediate: imm[11:5] = word[31:25], imm[4:0] = word[11:7],
/// sign-extended from 12 bits.
pub fn imm_s(word: u32) -> i32 {
    let value = (bits::extract(word, 31, 25) << 5) | bits::extract(word, 11, 7);
    bits::sign_extend(value, 12)
}

/// B-type immediate: imm[12] = word[31], imm[11] = word[7],
/// imm[10:5] = word[30:25], imm[4:1] = word[11:8], imm[0] = 0,
/// sign-extended from 13 bits.
pub fn imm_b(word: u32) -> i32 {
    let value = (bits::extract(word, 31, 31) << 12)
        | (bits::extract(word, 7, 7) << 11)
        | (bits::extract(word, 30, 25) << 5)
        | (bits::extract(word, 11, 8) << 1);
    bits::sign_extend(value, 13)
}

/// U-type immediate: word[31:12] already in its final position, low 12 bits
/// zero.
pub fn imm_u(word: u32) -> u32 {
    word & 0xFFFF_F000
}

/// J-type immediate: imm[20] = word[31], imm[19:12] = word[19:12],
/// imm[11] = word[20], imm[10:1] = word[30:21], imm[0] = 0,
/// sign-extended from 21 bits.
pub fn imm_j(word: u32) -> i32 {
    let value = (bits::extract(word, 31, 31) << 20)
        | (bits::extract(word, 19, 12) << 12)
        | (bits::extract(word, 20, 20) << 11)
        | (bits::extract(word, 30, 21) << 1);
    bits::sign_extend(value, 21)
}

/// Decode one instruction word, or `None` for anything outside RV32I.
pub fn decode(word: u32) -> Option<Instruction> {
    let opcode = bits::extract(word, 6, 0);
    let rd = bits::extract(word, 11, 7) as u8;
    let funct3 = bits::extract(word, 14, 12);
    let rs1 = bits::extract(word, 19, 15) as u8;
    let rs2 = bits::extract(word, 24, 20) as u8;
    let funct7 = bits::extract(word, 31, 25);

    match opcode {
        0x37 => Some(Instruction::Lui { rd, imm: imm_u(word) }),
        0x17 => Some(Instruction::Auipc { rd, imm: imm_u(word) }),
        0x6F => Some(Instruction::Jal { rd, imm: imm_j(word) }),
        0x67 if funct3 == 0x0 => Some(Instruction::Jalr { rd, rs1, imm: imm_i(word) }),
        0x63 => {
            let imm = imm_b(word);
            match funct3 {
                0x0 => Some(Instruction::Beq { rs1, rs2, imm }),
                0x1 => Some(Instruction::Bne { rs1, rs2, imm }),
                0x4 => Some(Instruction::Blt { rs1, rs2, imm }),
                0x5 => Some(Instruction::Bge { rs1, rs2, imm }),
                0x6 => Some(Instruction::Bltu { rs1, rs2, imm }),
                0x7 => Some(Instruction::Bgeu { rs1, rs2, imm }),
                _ => None,
            }
        }
        0x03 => {
            let imm = imm_i(word);
            match funct3 {
                0x0 => Some(Instruction::Lb { rd, rs1, imm }),
                0x1 => Some(Instruction::Lh { rd, rs1, imm }),
                0x2 => Some(Instruction::Lw { rd, rs1, imm }),
                0x4 => Some(Instruction::Lbu { rd, rs1, imm }),
                0x5 => Some(Instruction::Lhu { rd, rs1, imm }),
                _ => None,
            }
        }
        0x23 => {
            let imm = imm_s(word);
            match funct3 {
                0x0 => Some(Instruction::Sb { rs1, rs2, imm }),
                0x1 => Some(Instruction::Sh { rs1, rs2, imm }),
                0x2 => Some(Instruction::Sw { rs1, rs2, imm }),
                _ => None,
            }
        }
        0x13 => match funct3 {
            0x0 => Some(Instruction::Addi { rd, rs1, imm: imm_i(word) }),
            0x1 if funct7 == 0x00 => Some(Instruction::Slli { rd, rs1, shamt: rs2 }),
            0x2 => Some(Instruction::Slti { rd, rs1, imm: imm_i(word) }),
            0x3 => Some(Instruction::Sltiu { rd, rs1, imm: imm_i(word) }),
            0x4 => Some(Instruction::Xori { rd, rs1, imm: imm_i(word) }),
            // The shamt is the rs2 field; funct7 picks logical vs arithmetic.
            0x5 => match funct7 {
                0x00 => Some(Instruction::Srli { rd, rs1, shamt: rs2 }),
                0x20 => Some(Instruction::Srai { rd, rs1, shamt: rs2 }),
                _ => None,
            },
            0x6 => Some(Instruction::Ori { rd, rs1, imm: imm_i(word) }),
            0x7 => Some(Instruction::Andi { rd, rs1, imm: imm_i(word) }),
            _ => None,
        },
        0x33 => match (funct3, funct7) {
            (0x0, 0x00) => Some(Instruction::Add { rd, rs1, rs2 }),
            (0x0, 0x20) => Some(Instruction::Sub { rd, rs1, rs2 }),
            (0x1, 0x00) => Some(Instruction::Sll { rd, rs1, rs2 }),
            (0x2, 0x00) => Some(Instruction::Slt { rd, rs1, rs2 }),
            (0x3, 0x00) => Some(Instruction::Sltu { rd, rs1, rs2 }),
            (0x4, 0x00) => Some(Instruction::Xor { rd, rs1, rs2 }),
            (0x5, 0x00) => Some(Instruction::Srl { rd, rs1, rs2 }),
            (0x5, 0x20) => Some(Instruction::Sra { rd, rs1, rs2 }),
            (0x6, 0x00) => Some(Instruction::Or { rd, rs1, rs2 }),
            (0x7, 0x00) => Some(Instruction::And { rd, rs1, rs2 }),
            _ => None,
        },
        // Every MISC-MEM encoding is an ordering hint a single in-order hart
        // can ignore.
        0x0F => Some(Instruction::Fence),
        0x73 => {
            let csr = bits::extract(word, 31, 20) as u16;
            match funct3 {
                0x0 => match csr {
                    0x000 => Some(Instruction::Ecall),
                    0x302 => Some(Instruction::Mret),
                    _ => None,
                },
                0x1 => Some(Instruction::Csrrw { rd, rs1, csr }),
                0x2 => Some(Instruction::Csrrs { rd, rs1, csr }),
                0x3 => Some(Instruction::Csrrc { rd, rs1, csr }),
                0x5 => Some(Instruction::Csrrwi { rd, imm: rs1, csr }),
                0x6 => Some(Instruction::Csrrsi { rd, imm: rs1, csr }),
                0x7 => Some(Instruction::Csrrci { rd, imm: rs1, csr }),
                _ => None,
            }
        }
        _ => None,
    }
}
