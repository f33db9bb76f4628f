//! Trap 与执行状态
//!
//! - [`ExecStatus`]: dispatch 的返回值，`Success` 以外的值会让执行循环停止
//! - [`ProcessExit`]: 客户程序主动退出，作为错误值沿 `?` 传播到调用方
//! - [`AlignmentPolicy`]: 未对齐取指/访存是否触发 trap

use thiserror::Error;

/// Trap 原因
///
/// 代码值沿用 RISC-V mcause 的异常编码。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrapCause {
    /// 指令地址未对齐 (code = 0)
    InstructionAddressMisaligned,
    /// 非法指令：dispatch key 无对应 handler (code = 2)
    IllegalInstruction,
    /// 加载地址未对齐 (code = 4)
    LoadAddressMisaligned,
    /// 存储地址未对齐 (code = 6)
    StoreAddressMisaligned,
    /// 不支持的系统调用号，归入非法指令类 (code = 2)
    UnsupportedSyscall,
}

impl TrapCause {
    /// 获取异常代码（mcause 的低位）
    pub fn code(self) -> u32 {
        match self {
            TrapCause::InstructionAddressMisaligned => 0,
            TrapCause::IllegalInstruction | TrapCause::UnsupportedSyscall => 2,
            TrapCause::LoadAddressMisaligned => 4,
            TrapCause::StoreAddressMisaligned => 6,
        }
    }

    /// 是否属于非法指令类
    pub fn is_illegal(self) -> bool {
        self.code() == 2
    }
}

/// 单条指令的执行结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecStatus {
    /// 正常完成，PC 已由 handler 更新
    Success,
    /// 触发 trap，机器状态未被该指令修改
    Trap {
        cause: TrapCause,
        /// 触发 trap 的指令地址
        pc: u32,
        /// 附加信息：指令字、访存地址或系统调用号
        tval: u32,
    },
}

impl ExecStatus {
    pub fn trap(cause: TrapCause, pc: u32, tval: u32) -> Self {
        ExecStatus::Trap { cause, pc, tval }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ExecStatus::Success)
    }
}

/// 客户程序通过 exit 系统调用主动结束
///
/// 不是 [`ExecStatus`] 的一个取值：它以 `Err` 的形式绕过剩余的执行循环，
/// 交给驱动程序决定如何收尾。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("guest exited with code {code}")]
pub struct ProcessExit {
    pub code: i32,
}

/// handler 的返回类型
pub type ExecResult = Result<ExecStatus, ProcessExit>;

/// 未对齐访问策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AlignmentPolicy {
    /// 不检查对齐，按字节拼接完成访问
    #[default]
    Permissive,
    /// 未对齐的取指、半字/字访存触发 trap
    Strict,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trap_cause_encoding() {
        assert_eq!(TrapCause::InstructionAddressMisaligned.code(), 0);
        assert_eq!(TrapCause::IllegalInstruction.code(), 2);
        assert_eq!(TrapCause::LoadAddressMisaligned.code(), 4);
        assert_eq!(TrapCause::StoreAddressMisaligned.code(), 6);
        assert!(TrapCause::UnsupportedSyscall.is_illegal());
        assert!(!TrapCause::LoadAddressMisaligned.is_illegal());
    }

    #[test]
    fn test_process_exit_display() {
        let exit = ProcessExit { code: 3 };
        assert_eq!(exit.to_string(), "guest exited with code 3");
    }
}
