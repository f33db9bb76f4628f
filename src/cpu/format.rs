//! 格式模板
//!
//! 每种格式负责一类指令共享的操作数搬运，绑定一个操作后成为具体 handler。
//! handler 完全负责 PC 的更新；写 rd 的格式在 rd == 0 时不触碰寄存器文件。

use super::ops::{AluOp, BranchCond, LoadOp, StoreOp, UpperOp};
use super::state::Machine;
use super::trap::{AlignmentPolicy, ExecResult, ExecStatus, TrapCause};
use crate::isa::DecodedInstr;
use crate::memory::AccessSize;
use crate::syscall;

/// 指令宽度
pub const INSTR_BYTES: u32 = 4;

/// 格式 × 操作 的具体组合
///
/// 注册表在构建时把每个合法编码绑定到一个 `Handler`，执行期只剩一次 match。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handler {
    /// rd = op(rs1, rs2)
    RegReg(AluOp),
    /// rd = op(rs1, imm)，移位指令取 shamt
    RegImm(AluOp),
    /// rd = load(rs1 + imm)
    Load(LoadOp),
    /// store(rs1 + imm, rs2)
    Store(StoreOp),
    /// 条件成立时 PC += imm，否则 PC += 4
    Branch(BranchCond),
    /// rd = imm 或 PC + imm
    Upper(UpperOp),
    /// rd = PC + 4; PC += imm
    Jal,
    /// rd = PC + 4; PC = (rs1 + imm) & !1
    Jalr,
    /// 系统调用
    Ecall,
}

impl Handler {
    /// 执行一条已解码的指令
    pub fn execute(self, m: &mut Machine, d: &DecodedInstr) -> ExecResult {
        let next_pc = d.pc.wrapping_add(INSTR_BYTES);

        match self {
            Handler::RegReg(op) => {
                let result = op.apply(m.read_reg(d.rs1), m.read_reg(d.rs2));
                write_rd(m, d.rd, result);
                m.set_pc(next_pc);
            }
            Handler::RegImm(op) => {
                let rhs = if op.is_shift() { u32::from(d.shamt) } else { d.imm as u32 };
                let result = op.apply(m.read_reg(d.rs1), rhs);
                write_rd(m, d.rd, result);
                m.set_pc(next_pc);
            }
            Handler::Load(op) => {
                let addr = effective_addr(m, d);
                if let Some(trap) = check_alignment(m, op.size(), addr, d.pc, TrapCause::LoadAddressMisaligned) {
                    return Ok(trap);
                }
                let value = op.load(m.memory(), addr);
                write_rd(m, d.rd, value);
                m.set_pc(next_pc);
            }
            Handler::Store(op) => {
                let addr = effective_addr(m, d);
                if let Some(trap) = check_alignment(m, op.size(), addr, d.pc, TrapCause::StoreAddressMisaligned) {
                    return Ok(trap);
                }
                let value = m.read_reg(d.rs2);
                op.store(m.memory_mut(), addr, value);
                m.set_pc(next_pc);
            }
            Handler::Branch(cond) => {
                let taken = cond.test(m.read_reg(d.rs1), m.read_reg(d.rs2));
                let target = if taken { d.pc.wrapping_add(d.imm as u32) } else { next_pc };
                m.set_pc(target);
            }
            Handler::Upper(op) => {
                write_rd(m, d.rd, op.apply(d.pc, d.imm));
                m.set_pc(next_pc);
            }
            Handler::Jal => {
                write_rd(m, d.rd, next_pc);
                m.set_pc(d.pc.wrapping_add(d.imm as u32));
            }
            Handler::Jalr => {
                // 先算目标再写 rd，rd == rs1 时仍使用旧值
                let target = m.read_reg(d.rs1).wrapping_add(d.imm as u32) & !1;
                write_rd(m, d.rd, next_pc);
                m.set_pc(target);
            }
            Handler::Ecall => return syscall::handle_syscall(m, d),
        }

        Ok(ExecStatus::Success)
    }

    /// 是否写目标寄存器
    pub fn writes_rd(self) -> bool {
        !matches!(self, Handler::Store(_) | Handler::Branch(_) | Handler::Ecall)
    }
}

#[inline]
fn write_rd(m: &mut Machine, rd: u8, value: u32) {
    if rd != 0 {
        m.write_reg(rd, value);
    }
}

#[inline]
fn effective_addr(m: &Machine, d: &DecodedInstr) -> u32 {
    m.read_reg(d.rs1).wrapping_add(d.imm as u32)
}

/// Strict 模式下未对齐访问返回 trap，Permissive 模式恒为 None
fn check_alignment(
    m: &Machine,
    size: AccessSize,
    addr: u32,
    pc: u32,
    cause: TrapCause,
) -> Option<ExecStatus> {
    match m.alignment() {
        AlignmentPolicy::Strict if !size.is_aligned(addr) => Some(ExecStatus::trap(cause, pc, addr)),
        _ => None,
    }
}
