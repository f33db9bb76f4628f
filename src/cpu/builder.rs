//! 解释器构建器
//!
//! 统一配置分发表、未对齐策略与宿主 I/O。
//!
//! # 示例
//!
//! ```
//! use allude_rv32::cpu::{AlignmentPolicy, InterpreterBuilder};
//! use allude_rv32::syscall::HostIo;
//!
//! let cpu = InterpreterBuilder::new()
//!     .alignment(AlignmentPolicy::Strict)
//!     .io(HostIo::null())
//!     .build()
//!     .expect("RV32I 指令表无冲突");
//! assert_eq!(cpu.machine().alignment(), AlignmentPolicy::Strict);
//! ```

use std::sync::Arc;

use super::dispatch::{DispatchTable, RegistryError};
use super::state::Machine;
use super::trap::AlignmentPolicy;
use super::Interpreter;
use crate::syscall::HostIo;

/// 解释器构建器
///
/// 默认：完整 RV32I 表、Permissive 对齐、宿主 stdio。
#[derive(Debug, Default)]
pub struct InterpreterBuilder {
    alignment: AlignmentPolicy,
    io: Option<HostIo>,
    table: Option<Arc<DispatchTable>>,
}

impl InterpreterBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置未对齐访问策略
    pub fn alignment(mut self, policy: AlignmentPolicy) -> Self {
        self.alignment = policy;
        self
    }

    /// 设置客户程序的 stdin/stdout
    pub fn io(mut self, io: HostIo) -> Self {
        self.io = Some(io);
        self
    }

    /// 复用一张已构建的分发表
    pub fn table(mut self, table: Arc<DispatchTable>) -> Self {
        self.table = Some(table);
        self
    }

    /// 构建解释器
    ///
    /// 未指定分发表时现场构建 RV32I 表，注册冲突时返回 `Err`。
    pub fn build(self) -> Result<Interpreter, RegistryError> {
        let table = match self.table {
            Some(table) => table,
            None => Arc::new(DispatchTable::rv32i()?),
        };

        let mut machine = Machine::with_io(self.io.unwrap_or_else(HostIo::stdio));
        machine.set_alignment(self.alignment);

        Ok(Interpreter::with_parts(machine, table))
    }
}
