//! 编码：按格式的结构化字段 → 原始指令字
//!
//! 每种格式一个记录类型，`encode` 是 [`fields`](super::fields) 中提取函数的逆运算，
//! `from_word` 则用同一组提取函数把指令字还原回记录，二者互为往返。

use super::fields;

/// 可编码为 32-bit 指令字的格式记录
pub trait Encode {
    fn encode(&self) -> u32;
}

/// 寄存器字段只保留低 5 位，其余 funct 字段同理
#[inline]
const fn reg(r: u8) -> u32 {
    (r & 0x1F) as u32
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct REncoding {
    pub funct7: u8,
    pub rs2: u8,
    pub rs1: u8,
    pub funct3: u8,
    pub rd: u8,
    pub opcode: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IEncoding {
    /// 12-bit 有符号立即数
    pub imm: i32,
    pub rs1: u8,
    pub funct3: u8,
    pub rd: u8,
    pub opcode: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SEncoding {
    /// 12-bit 有符号立即数
    pub imm: i32,
    pub rs2: u8,
    pub rs1: u8,
    pub funct3: u8,
    pub opcode: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BEncoding {
    /// 13-bit 有符号偶数偏移
    pub imm: i32,
    pub rs2: u8,
    pub rs1: u8,
    pub funct3: u8,
    pub opcode: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UEncoding {
    /// 低 12 位为 0 的 32-bit 立即数
    pub imm: i32,
    pub rd: u8,
    pub opcode: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JEncoding {
    /// 21-bit 有符号偶数偏移
    pub imm: i32,
    pub rd: u8,
    pub opcode: u8,
}

impl Encode for REncoding {
    fn encode(&self) -> u32 {
        (((self.funct7 & 0x7F) as u32) << 25)
            | (reg(self.rs2) << 20)
            | (reg(self.rs1) << 15)
            | (((self.funct3 & 0x7) as u32) << 12)
            | (reg(self.rd) << 7)
            | (self.opcode & 0x7F) as u32
    }
}

impl Encode for IEncoding {
    fn encode(&self) -> u32 {
        (((self.imm as u32) & 0xFFF) << 20)
            | (reg(self.rs1) << 15)
            | (((self.funct3 & 0x7) as u32) << 12)
            | (reg(self.rd) << 7)
            | (self.opcode & 0x7F) as u32
    }
}

impl Encode for SEncoding {
    fn encode(&self) -> u32 {
        let imm = self.imm as u32;
        (fields::bits(imm, 11, 5) << 25)
            | (reg(self.rs2) << 20)
            | (reg(self.rs1) << 15)
            | (((self.funct3 & 0x7) as u32) << 12)
            | (fields::bits(imm, 4, 0) << 7)
            | (self.opcode & 0x7F) as u32
    }
}

impl Encode for BEncoding {
    fn encode(&self) -> u32 {
        let imm = self.imm as u32;
        (fields::bits(imm, 12, 12) << 31)
            | (fields::bits(imm, 10, 5) << 25)
            | (reg(self.rs2) << 20)
            | (reg(self.rs1) << 15)
            | (((self.funct3 & 0x7) as u32) << 12)
            | (fields::bits(imm, 4, 1) << 8)
            | (fields::bits(imm, 11, 11) << 7)
            | (self.opcode & 0x7F) as u32
    }
}

impl Encode for UEncoding {
    fn encode(&self) -> u32 {
        ((self.imm as u32) & 0xFFFF_F000) | (reg(self.rd) << 7) | (self.opcode & 0x7F) as u32
    }
}

impl Encode for JEncoding {
    fn encode(&self) -> u32 {
        let imm = self.imm as u32;
        (fields::bits(imm, 20, 20) << 31)
            | (fields::bits(imm, 10, 1) << 21)
            | (fields::bits(imm, 11, 11) << 20)
            | (fields::bits(imm, 19, 12) << 12)
            | (reg(self.rd) << 7)
            | (self.opcode & 0x7F) as u32
    }
}

impl REncoding {
    pub fn from_word(raw: u32) -> Self {
        Self {
            funct7: fields::funct7(raw),
            rs2: fields::rs2(raw),
            rs1: fields::rs1(raw),
            funct3: fields::funct3(raw),
            rd: fields::rd(raw),
            opcode: fields::opcode(raw),
        }
    }
}

impl IEncoding {
    pub fn from_word(raw: u32) -> Self {
        Self {
            imm: fields::imm_i(raw),
            rs1: fields::rs1(raw),
            funct3: fields::funct3(raw),
            rd: fields::rd(raw),
            opcode: fields::opcode(raw),
        }
    }
}

impl SEncoding {
    pub fn from_word(raw: u32) -> Self {
        Self {
            imm: fields::imm_s(raw),
            rs2: fields::rs2(raw),
            rs1: fields::rs1(raw),
            funct3: fields::funct3(raw),
            opcode: fields::opcode(raw),
        }
    }
}

impl BEncoding {
    pub fn from_word(raw: u32) -> Self {
        Self {
            imm: fields::imm_b(raw),
            rs2: fields::rs2(raw),
            rs1: fields::rs1(raw),
            funct3: fields::funct3(raw),
            opcode: fields::opcode(raw),
        }
    }
}

impl UEncoding {
    pub fn from_word(raw: u32) -> Self {
        Self {
            imm: fields::imm_u(raw),
            rd: fields::rd(raw),
            opcode: fields::opcode(raw),
        }
    }
}

impl JEncoding {
    pub fn from_word(raw: u32) -> Self {
        Self {
            imm: fields::imm_j(raw),
            rd: fields::rd(raw),
            opcode: fields::opcode(raw),
        }
    }
}

/// 便捷函数：编码任意格式记录
pub fn encode<E: Encode>(e: &E) -> u32 {
    e.encode()
}
