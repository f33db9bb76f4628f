//! 操作目录
//!
//! 纯语义单元，不接触寄存器文件与 PC：
//! - [`AluOp`]: 两个 32-bit 操作数 → 32-bit 结果
//! - [`BranchCond`]: 两个操作数 → 是否跳转
//! - [`LoadOp`] / [`StoreOp`]: 访存宽度与符号扩展方式
//! - [`UpperOp`]: LUI / AUIPC

use crate::memory::{AccessSize, Memory};

/// ALU 二元操作
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AluOp {
    Add,
    Sub,
    And,
    Or,
    Xor,
    Sll,
    Srl,
    Sra,
    Slt,
    Sltu,
}

impl AluOp {
    /// 计算结果，移位量只取低 5 位
    #[inline]
    pub fn apply(self, lhs: u32, rhs: u32) -> u32 {
        match self {
            AluOp::Add => lhs.wrapping_add(rhs),
            AluOp::Sub => lhs.wrapping_sub(rhs),
            AluOp::And => lhs & rhs,
            AluOp::Or => lhs | rhs,
            AluOp::Xor => lhs ^ rhs,
            AluOp::Sll => lhs << (rhs & 0x1F),
            AluOp::Srl => lhs >> (rhs & 0x1F),
            AluOp::Sra => ((lhs as i32) >> (rhs & 0x1F)) as u32,
            AluOp::Slt => u32::from((lhs as i32) < (rhs as i32)),
            AluOp::Sltu => u32::from(lhs < rhs),
        }
    }

    /// 立即数形式下第二操作数取 shamt 而不是 imm
    pub fn is_shift(self) -> bool {
        matches!(self, AluOp::Sll | AluOp::Srl | AluOp::Sra)
    }
}

/// 条件分支谓词
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchCond {
    Eq,
    Ne,
    Lt,
    Ge,
    Ltu,
    Geu,
}

impl BranchCond {
    #[inline]
    pub fn test(self, lhs: u32, rhs: u32) -> bool {
        match self {
            BranchCond::Eq => lhs == rhs,
            BranchCond::Ne => lhs != rhs,
            BranchCond::Lt => (lhs as i32) < (rhs as i32),
            BranchCond::Ge => (lhs as i32) >= (rhs as i32),
            BranchCond::Ltu => lhs < rhs,
            BranchCond::Geu => lhs >= rhs,
        }
    }
}

/// 加载操作：宽度与符号扩展由操作本身决定
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOp {
    Lb,
    Lh,
    Lw,
    Lbu,
    Lhu,
}

impl LoadOp {
    pub fn size(self) -> AccessSize {
        match self {
            LoadOp::Lb | LoadOp::Lbu => AccessSize::Byte,
            LoadOp::Lh | LoadOp::Lhu => AccessSize::Half,
            LoadOp::Lw => AccessSize::Word,
        }
    }

    /// 读取并扩展到 32 位
    #[inline]
    pub fn load(self, mem: &dyn Memory, addr: u32) -> u32 {
        match self {
            LoadOp::Lb => mem.load8(addr) as i8 as i32 as u32,
            LoadOp::Lh => mem.load16(addr) as i16 as i32 as u32,
            LoadOp::Lw => mem.load32(addr),
            LoadOp::Lbu => u32::from(mem.load8(addr)),
            LoadOp::Lhu => u32::from(mem.load16(addr)),
        }
    }
}

/// 存储操作：只写入低位
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOp {
    Sb,
    Sh,
    Sw,
}

impl StoreOp {
    pub fn size(self) -> AccessSize {
        match self {
            StoreOp::Sb => AccessSize::Byte,
            StoreOp::Sh => AccessSize::Half,
            StoreOp::Sw => AccessSize::Word,
        }
    }

    #[inline]
    pub fn store(self, mem: &mut dyn Memory, addr: u32, value: u32) {
        match self {
            StoreOp::Sb => mem.store8(addr, value as u8),
            StoreOp::Sh => mem.store16(addr, value as u16),
            StoreOp::Sw => mem.store32(addr, value),
        }
    }
}

/// 高位立即数：是否加上 PC
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpperOp {
    Lui,
    Auipc,
}

impl UpperOp {
    #[inline]
    pub fn apply(self, pc: u32, imm: i32) -> u32 {
        match self {
            UpperOp::Lui => imm as u32,
            UpperOp::Auipc => pc.wrapping_add(imm as u32),
        }
    }
}
