//! 分发注册表
//!
//! [`RV32I_HANDLERS`] 枚举全部合法的 (opcode, funct3, funct7) 组合及其 handler，
//! [`DispatchTable`] 在构建时一次性装入，此后只读。

use rustc_hash::FxHashMap;
use thiserror::Error;

use super::format::Handler;
use super::ops::{AluOp, BranchCond, LoadOp, StoreOp, UpperOp};
use super::state::Machine;
use super::trap::{ExecResult, ExecStatus, TrapCause};
use crate::isa::opcode::*;
use crate::isa::{DecodedInstr, DispatchKey};

/// 一条指令定义：助记符 + 编码字段 + handler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandlerDef {
    pub name: &'static str,
    pub opcode: u8,
    pub funct3: u8,
    pub funct7: u8,
    pub handler: Handler,
}

impl HandlerDef {
    pub const fn new(name: &'static str, opcode: u8, funct3: u8, funct7: u8, handler: Handler) -> Self {
        Self { name, opcode, funct3, funct7, handler }
    }

    /// 与解码时相同的 key 公式
    pub const fn key(&self) -> DispatchKey {
        DispatchKey::masked(self.opcode, self.funct3, self.funct7)
    }
}

const fn r(name: &'static str, funct3: u8, funct7: u8, op: AluOp) -> HandlerDef {
    HandlerDef::new(name, OP_REG, funct3, funct7, Handler::RegReg(op))
}

const fn i(name: &'static str, funct3: u8, funct7: u8, op: AluOp) -> HandlerDef {
    HandlerDef::new(name, OP_IMM, funct3, funct7, Handler::RegImm(op))
}

const fn load(name: &'static str, funct3: u8, op: LoadOp) -> HandlerDef {
    HandlerDef::new(name, OP_LOAD, funct3, 0, Handler::Load(op))
}

const fn store(name: &'static str, funct3: u8, op: StoreOp) -> HandlerDef {
    HandlerDef::new(name, OP_STORE, funct3, 0, Handler::Store(op))
}

const fn branch(name: &'static str, funct3: u8, cond: BranchCond) -> HandlerDef {
    HandlerDef::new(name, OP_BRANCH, funct3, 0, Handler::Branch(cond))
}

// ========== RV32I 指令表 ==========

/// RV32I 全部 handler
pub static RV32I_HANDLERS: &[HandlerDef] = &[
    // ========== R-type ==========
    r("ADD", 0b000, 0x00, AluOp::Add),
    r("SUB", 0b000, 0x20, AluOp::Sub),
    r("SLL", 0b001, 0x00, AluOp::Sll),
    r("SLT", 0b010, 0x00, AluOp::Slt),
    r("SLTU", 0b011, 0x00, AluOp::Sltu),
    r("XOR", 0b100, 0x00, AluOp::Xor),
    r("SRL", 0b101, 0x00, AluOp::Srl),
    r("SRA", 0b101, 0x20, AluOp::Sra),
    r("OR", 0b110, 0x00, AluOp::Or),
    r("AND", 0b111, 0x00, AluOp::And),
    // ========== I-type 算术/逻辑 ==========
    i("ADDI", 0b000, 0, AluOp::Add),
    i("SLTI", 0b010, 0, AluOp::Slt),
    i("SLTIU", 0b011, 0, AluOp::Sltu),
    i("XORI", 0b100, 0, AluOp::Xor),
    i("ORI", 0b110, 0, AluOp::Or),
    i("ANDI", 0b111, 0, AluOp::And),
    i("SLLI", FUNCT3_SLLI, 0x00, AluOp::Sll),
    i("SRLI", FUNCT3_SRLI_SRAI, 0x00, AluOp::Srl),
    i("SRAI", FUNCT3_SRLI_SRAI, 0x20, AluOp::Sra),
    // ========== Load ==========
    load("LB", 0b000, LoadOp::Lb),
    load("LH", 0b001, LoadOp::Lh),
    load("LW", 0b010, LoadOp::Lw),
    load("LBU", 0b100, LoadOp::Lbu),
    load("LHU", 0b101, LoadOp::Lhu),
    // ========== Store ==========
    store("SB", 0b000, StoreOp::Sb),
    store("SH", 0b001, StoreOp::Sh),
    store("SW", 0b010, StoreOp::Sw),
    // ========== Branch ==========
    branch("BEQ", 0b000, BranchCond::Eq),
    branch("BNE", 0b001, BranchCond::Ne),
    branch("BLT", 0b100, BranchCond::Lt),
    branch("BGE", 0b101, BranchCond::Ge),
    branch("BLTU", 0b110, BranchCond::Ltu),
    branch("BGEU", 0b111, BranchCond::Geu),
    // ========== U / J ==========
    HandlerDef::new("LUI", OP_LUI, 0, 0, Handler::Upper(UpperOp::Lui)),
    HandlerDef::new("AUIPC", OP_AUIPC, 0, 0, Handler::Upper(UpperOp::Auipc)),
    HandlerDef::new("JAL", OP_JAL, 0, 0, Handler::Jal),
    HandlerDef::new("JALR", OP_JALR, 0, 0, Handler::Jalr),
    // ========== SYSTEM ==========
    HandlerDef::new("ECALL", OP_SYSTEM, 0, 0, Handler::Ecall),
];

/// 注册错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("duplicate dispatch key {key}: {new} collides with {existing}")]
    Duplicate {
        key: DispatchKey,
        existing: &'static str,
        new: &'static str,
    },
}

/// dispatch key → handler 表
#[derive(Debug, Clone, Default)]
pub struct DispatchTable {
    entries: FxHashMap<DispatchKey, HandlerDef>,
}

impl DispatchTable {
    /// 空表
    pub fn new() -> Self {
        Self::default()
    }

    /// 装入完整的 RV32I 指令表
    pub fn rv32i() -> Result<Self, RegistryError> {
        let mut table = Self::new();
        table.register_all(RV32I_HANDLERS)?;
        Ok(table)
    }

    /// 注册一条定义，重复的 key 被拒绝且原有条目保持不变
    pub fn register(&mut self, def: HandlerDef) -> Result<(), RegistryError> {
        let key = def.key();
        if let Some(existing) = self.entries.get(&key) {
            return Err(RegistryError::Duplicate {
                key,
                existing: existing.name,
                new: def.name,
            });
        }
        self.entries.insert(key, def);
        Ok(())
    }

    pub fn register_all(&mut self, defs: &[HandlerDef]) -> Result<(), RegistryError> {
        defs.iter().try_for_each(|def| self.register(*def))
    }

    pub fn lookup(&self, key: DispatchKey) -> Option<&HandlerDef> {
        self.entries.get(&key)
    }

    /// key 对应的助记符
    pub fn name_of(&self, key: DispatchKey) -> Option<&'static str> {
        self.lookup(key).map(|def| def.name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 查表并执行
    ///
    /// 未命中时返回 `IllegalInstruction` trap (tval = 指令字)，不修改任何状态。
    pub fn dispatch(&self, m: &mut Machine, d: &DecodedInstr, key: DispatchKey) -> ExecResult {
        match self.entries.get(&key) {
            Some(def) => def.handler.execute(m, d),
            None => Ok(ExecStatus::trap(TrapCause::IllegalInstruction, d.pc, d.raw)),
        }
    }
}
