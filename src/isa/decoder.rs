//! 解码：原始指令字 + PC → 指令字段 + dispatch key

use std::fmt;

use super::fields;
use super::opcode::OpcodeClass;

/// 一次取指的解码结果
///
/// 仅在 dispatch 期间存在，不会被保留。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DecodedInstr {
    /// 原始指令字（trap 时作为 tval 上报）
    pub raw: u32,
    /// 指令所在 PC
    pub pc: u32,
    pub rd: u8,
    pub rs1: u8,
    pub rs2: u8,
    /// 已符号扩展的立即数；无立即数的格式为 0
    pub imm: i32,
    /// 移位立即数，与 rs2 同一字段
    pub shamt: u8,
}

/// 24-bit 复合查表键：opcode | funct3 << 8 | funct7 << 16
///
/// 解码与注册都通过 [`DispatchKey::masked`] 构造，两边公式必然一致。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DispatchKey(u32);

impl DispatchKey {
    /// 按字段原样拼出 key，不做类别屏蔽
    #[inline]
    pub const fn new(opcode: u8, funct3: u8, funct7: u8) -> Self {
        DispatchKey((opcode as u32) | ((funct3 as u32) << 8) | ((funct7 as u32) << 16))
    }

    /// 按 opcode 类别屏蔽无关字段后拼出 key
    ///
    /// 类别未定义 funct3/funct7 的字段强制为 0；未知 opcode 只保留 opcode。
    #[inline]
    pub const fn masked(opcode: u8, funct3: u8, funct7: u8) -> Self {
        match OpcodeClass::from_opcode(opcode) {
            Some(class) => {
                let f3 = if class.keys_funct3() { funct3 } else { 0 };
                let f7 = if class.keys_funct7(funct3) { funct7 } else { 0 };
                DispatchKey::new(opcode, f3, f7)
            }
            None => DispatchKey::new(opcode, 0, 0),
        }
    }

    /// 直接从指令字计算 key
    #[inline]
    pub const fn of_word(raw: u32) -> Self {
        DispatchKey::masked(fields::opcode(raw), fields::funct3(raw), fields::funct7(raw))
    }

    pub const fn raw(self) -> u32 {
        self.0
    }

    pub const fn opcode(self) -> u8 {
        (self.0 & 0xFF) as u8
    }

    pub const fn funct3(self) -> u8 {
        ((self.0 >> 8) & 0xFF) as u8
    }

    pub const fn funct7(self) -> u8 {
        ((self.0 >> 16) & 0xFF) as u8
    }
}

impl fmt::Display for DispatchKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "0x{:06x} (opcode=0x{:02x} funct3={} funct7=0x{:02x})",
            self.0,
            self.opcode(),
            self.funct3(),
            self.funct7()
        )
    }
}

/// 解码指令字
///
/// 立即数格式由 opcode 类别决定；未知 opcode 的立即数为 0，
/// 其 key 在注册表中必然查不到，由 dispatch 报告非法指令。
pub fn decode(raw: u32, pc: u32) -> (DecodedInstr, DispatchKey) {
    let rs2 = fields::rs2(raw);
    let imm = match OpcodeClass::from_opcode(fields::opcode(raw)) {
        Some(OpcodeClass::RegImm | OpcodeClass::Load | OpcodeClass::Jalr) => fields::imm_i(raw),
        Some(OpcodeClass::Store) => fields::imm_s(raw),
        Some(OpcodeClass::Branch) => fields::imm_b(raw),
        Some(OpcodeClass::Lui | OpcodeClass::Auipc) => fields::imm_u(raw),
        Some(OpcodeClass::Jal) => fields::imm_j(raw),
        Some(OpcodeClass::RegReg | OpcodeClass::System) | None => 0,
    };

    let decoded = DecodedInstr {
        raw,
        pc,
        rd: fields::rd(raw),
        rs1: fields::rs1(raw),
        rs2,
        imm,
        shamt: rs2,
    };

    (decoded, DispatchKey::of_word(raw))
}
