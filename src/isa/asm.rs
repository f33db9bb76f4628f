//! 助记符级别的指令构造函数
//!
//! 参数顺序与汇编语法一致，例如 `sw(rs2, offset, rs1)` 对应 `sw rs2, offset(rs1)`。

use super::encoder::{BEncoding, Encode, IEncoding, JEncoding, REncoding, SEncoding, UEncoding};
use super::opcode::*;

/// 常用 ABI 寄存器编号
pub mod reg {
    pub const ZERO: u8 = 0;
    pub const RA: u8 = 1;
    pub const SP: u8 = 2;
    pub const A0: u8 = 10;
    pub const A1: u8 = 11;
    pub const A2: u8 = 12;
    pub const A7: u8 = 17;
}

fn r(funct7: u8, funct3: u8, rd: u8, rs1: u8, rs2: u8) -> u32 {
    REncoding { funct7, rs2, rs1, funct3, rd, opcode: OP_REG }.encode()
}

fn i(opcode: u8, funct3: u8, rd: u8, rs1: u8, imm: i32) -> u32 {
    IEncoding { imm, rs1, funct3, rd, opcode }.encode()
}

fn s(funct3: u8, rs2: u8, imm: i32, rs1: u8) -> u32 {
    SEncoding { imm, rs2, rs1, funct3, opcode: OP_STORE }.encode()
}

fn b(funct3: u8, rs1: u8, rs2: u8, imm: i32) -> u32 {
    BEncoding { imm, rs2, rs1, funct3, opcode: OP_BRANCH }.encode()
}

fn shift_imm(funct7: u8, funct3: u8, rd: u8, rs1: u8, shamt: u8) -> u32 {
    // shamt 占据 rs2 字段，funct7 占据立即数高 7 位
    REncoding { funct7, rs2: shamt, rs1, funct3, rd, opcode: OP_IMM }.encode()
}

pub fn add(rd: u8, rs1: u8, rs2: u8) -> u32 {
    r(0x00, 0b000, rd, rs1, rs2)
}
pub fn sub(rd: u8, rs1: u8, rs2: u8) -> u32 {
    r(0x20, 0b000, rd, rs1, rs2)
}
pub fn sll(rd: u8, rs1: u8, rs2: u8) -> u32 {
    r(0x00, 0b001, rd, rs1, rs2)
}
pub fn slt(rd: u8, rs1: u8, rs2: u8) -> u32 {
    r(0x00, 0b010, rd, rs1, rs2)
}
pub fn sltu(rd: u8, rs1: u8, rs2: u8) -> u32 {
    r(0x00, 0b011, rd, rs1, rs2)
}
pub fn xor(rd: u8, rs1: u8, rs2: u8) -> u32 {
    r(0x00, 0b100, rd, rs1, rs2)
}
pub fn srl(rd: u8, rs1: u8, rs2: u8) -> u32 {
    r(0x00, 0b101, rd, rs1, rs2)
}
pub fn sra(rd: u8, rs1: u8, rs2: u8) -> u32 {
    r(0x20, 0b101, rd, rs1, rs2)
}
pub fn or(rd: u8, rs1: u8, rs2: u8) -> u32 {
    r(0x00, 0b110, rd, rs1, rs2)
}
pub fn and(rd: u8, rs1: u8, rs2: u8) -> u32 {
    r(0x00, 0b111, rd, rs1, rs2)
}

pub fn addi(rd: u8, rs1: u8, imm: i32) -> u32 {
    i(OP_IMM, 0b000, rd, rs1, imm)
}
pub fn slti(rd: u8, rs1: u8, imm: i32) -> u32 {
    i(OP_IMM, 0b010, rd, rs1, imm)
}
pub fn sltiu(rd: u8, rs1: u8, imm: i32) -> u32 {
    i(OP_IMM, 0b011, rd, rs1, imm)
}
pub fn xori(rd: u8, rs1: u8, imm: i32) -> u32 {
    i(OP_IMM, 0b100, rd, rs1, imm)
}
pub fn ori(rd: u8, rs1: u8, imm: i32) -> u32 {
    i(OP_IMM, 0b110, rd, rs1, imm)
}
pub fn andi(rd: u8, rs1: u8, imm: i32) -> u32 {
    i(OP_IMM, 0b111, rd, rs1, imm)
}
pub fn slli(rd: u8, rs1: u8, shamt: u8) -> u32 {
    shift_imm(0x00, FUNCT3_SLLI, rd, rs1, shamt)
}
pub fn srli(rd: u8, rs1: u8, shamt: u8) -> u32 {
    shift_imm(0x00, FUNCT3_SRLI_SRAI, rd, rs1, shamt)
}
pub fn srai(rd: u8, rs1: u8, shamt: u8) -> u32 {
    shift_imm(0x20, FUNCT3_SRLI_SRAI, rd, rs1, shamt)
}

pub fn lb(rd: u8, offset: i32, rs1: u8) -> u32 {
    i(OP_LOAD, 0b000, rd, rs1, offset)
}
pub fn lh(rd: u8, offset: i32, rs1: u8) -> u32 {
    i(OP_LOAD, 0b001, rd, rs1, offset)
}
pub fn lw(rd: u8, offset: i32, rs1: u8) -> u32 {
    i(OP_LOAD, 0b010, rd, rs1, offset)
}
pub fn lbu(rd: u8, offset: i32, rs1: u8) -> u32 {
    i(OP_LOAD, 0b100, rd, rs1, offset)
}
pub fn lhu(rd: u8, offset: i32, rs1: u8) -> u32 {
    i(OP_LOAD, 0b101, rd, rs1, offset)
}

pub fn sb(rs2: u8, offset: i32, rs1: u8) -> u32 {
    s(0b000, rs2, offset, rs1)
}
pub fn sh(rs2: u8, offset: i32, rs1: u8) -> u32 {
    s(0b001, rs2, offset, rs1)
}
pub fn sw(rs2: u8, offset: i32, rs1: u8) -> u32 {
    s(0b010, rs2, offset, rs1)
}

pub fn beq(rs1: u8, rs2: u8, offset: i32) -> u32 {
    b(0b000, rs1, rs2, offset)
}
pub fn bne(rs1: u8, rs2: u8, offset: i32) -> u32 {
    b(0b001, rs1, rs2, offset)
}
pub fn blt(rs1: u8, rs2: u8, offset: i32) -> u32 {
    b(0b100, rs1, rs2, offset)
}
pub fn bge(rs1: u8, rs2: u8, offset: i32) -> u32 {
    b(0b101, rs1, rs2, offset)
}
pub fn bltu(rs1: u8, rs2: u8, offset: i32) -> u32 {
    b(0b110, rs1, rs2, offset)
}
pub fn bgeu(rs1: u8, rs2: u8, offset: i32) -> u32 {
    b(0b111, rs1, rs2, offset)
}

/// `imm` 为完整 32-bit 值，低 12 位被丢弃
pub fn lui(rd: u8, imm: i32) -> u32 {
    UEncoding { imm, rd, opcode: OP_LUI }.encode()
}
pub fn auipc(rd: u8, imm: i32) -> u32 {
    UEncoding { imm, rd, opcode: OP_AUIPC }.encode()
}

pub fn jal(rd: u8, offset: i32) -> u32 {
    JEncoding { imm: offset, rd, opcode: OP_JAL }.encode()
}
pub fn jalr(rd: u8, rs1: u8, offset: i32) -> u32 {
    i(OP_JALR, 0b000, rd, rs1, offset)
}

pub fn ecall() -> u32 {
    OP_SYSTEM as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches_known_encodings() {
        assert_eq!(addi(1, 0, 42), 0x02A00093);
        assert_eq!(addi(2, 0, -1), 0xFFF00113);
        assert_eq!(add(3, 1, 2), 0x002081B3);
        assert_eq!(sub(3, 1, 2), 0x402081B3);
        assert_eq!(lw(1, 4, 2), 0x00412083);
        assert_eq!(sw(1, 8, 2), 0x00112423);
        assert_eq!(beq(1, 2, 8), 0x00208463);
        assert_eq!(beq(0, 0, -16), 0xFE0008E3);
        assert_eq!(blt(2, 3, -8), 0xFE314CE3);
        assert_eq!(jal(1, 8), 0x008000EF);
        assert_eq!(lui(1, 0x12345000), 0x123450B7);
        assert_eq!(auipc(1, 0x12345000), 0x12345097);
        assert_eq!(slli(2, 1, 2), 0x00209113);
        assert_eq!(srli(3, 2, 1), 0x00115193);
        assert_eq!(srai(2, 1, 31), 0x41F0D113);
        assert_eq!(ecall(), 0x00000073);
    }
}
