//! RV32I 主 opcode 与指令类别

pub const OP_LUI: u8 = 0b0110111;
pub const OP_AUIPC: u8 = 0b0010111;
pub const OP_JAL: u8 = 0b1101111;
pub const OP_JALR: u8 = 0b1100111;
pub const OP_BRANCH: u8 = 0b1100011;
pub const OP_LOAD: u8 = 0b0000011;
pub const OP_STORE: u8 = 0b0100011;
pub const OP_MISC_MEM: u8 = 0b0001111;
pub const OP_IMM: u8 = 0b0010011;
pub const OP_REG: u8 = 0b0110011;
pub const OP_SYSTEM: u8 = 0b1110011;

/// funct3 of the two shift-immediate forms, whose funct7 selects logical/arithmetic.
pub const FUNCT3_SLLI: u8 = 0b001;
pub const FUNCT3_SRLI_SRAI: u8 = 0b101;

/// 主 opcode 所属类别
///
/// 决定使用哪种立即数格式，以及 dispatch key 中哪些字段有效。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpcodeClass {
    /// R-type：opcode + funct3 + funct7
    RegReg,
    /// I-type 算术/逻辑：opcode + funct3（移位立即数额外带 funct7）
    RegImm,
    /// I-type load：opcode + funct3
    Load,
    /// S-type：opcode + funct3
    Store,
    /// B-type：opcode + funct3
    Branch,
    /// LUI：仅 opcode
    Lui,
    /// AUIPC：仅 opcode
    Auipc,
    /// JAL：仅 opcode
    Jal,
    /// JALR：仅 opcode
    Jalr,
    /// ECALL：仅 opcode
    System,
}

impl OpcodeClass {
    /// 根据 opcode 分类；不在 RV32I 子集内的 opcode 返回 `None`
    pub const fn from_opcode(opcode: u8) -> Option<Self> {
        match opcode {
            OP_REG => Some(OpcodeClass::RegReg),
            OP_IMM => Some(OpcodeClass::RegImm),
            OP_LOAD => Some(OpcodeClass::Load),
            OP_STORE => Some(OpcodeClass::Store),
            OP_BRANCH => Some(OpcodeClass::Branch),
            OP_LUI => Some(OpcodeClass::Lui),
            OP_AUIPC => Some(OpcodeClass::Auipc),
            OP_JAL => Some(OpcodeClass::Jal),
            OP_JALR => Some(OpcodeClass::Jalr),
            OP_SYSTEM => Some(OpcodeClass::System),
            _ => None,
        }
    }

    /// 该类别的 key 是否包含 funct3
    pub const fn keys_funct3(self) -> bool {
        matches!(
            self,
            OpcodeClass::RegReg
                | OpcodeClass::RegImm
                | OpcodeClass::Load
                | OpcodeClass::Store
                | OpcodeClass::Branch
        )
    }

    /// 该类别（在给定 funct3 下）的 key 是否包含 funct7
    pub const fn keys_funct7(self, funct3: u8) -> bool {
        match self {
            OpcodeClass::RegReg => true,
            OpcodeClass::RegImm => matches!(funct3, FUNCT3_SLLI | FUNCT3_SRLI_SRAI),
            _ => false,
        }
    }
}
