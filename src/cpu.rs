//! CPU 核心与执行引擎
//!
//! 本模块定义了单线程 RV32I 解释器 `Interpreter`，
//! 它独占一份 [`Machine`] 状态，并共享一张只读的 [`DispatchTable`]。
//!
//! 执行循环：取指 → 解码 → 查表分发 → handler 更新状态（含 PC），
//! 直到 handler 返回非 `Success` 状态、客户程序 exit，或周期预算耗尽。

use std::sync::Arc;

use tracing::error;

use crate::isa::{self, DecodedInstr, DispatchKey};
use crate::memory::{AccessSize, Memory};
use crate::trace::{NullSink, TraceSink};

mod builder;
pub mod dispatch;
pub mod format;
pub mod ops;
mod state;
pub mod trap;

pub use builder::InterpreterBuilder;
pub use dispatch::{DispatchTable, HandlerDef, RegistryError, RV32I_HANDLERS};
pub use format::Handler;
pub use state::{Machine, RegFile};
pub use trap::{AlignmentPolicy, ExecResult, ExecStatus, ProcessExit, TrapCause};

/// 单线程 RV32I 解释器
///
/// 设计约定：
/// - x0 永远为 0，写入时丢弃
/// - 只有 handler 会修改 PC，循环本身不做隐式 +4
/// - 分发表构建后只读，可在多个解释器之间共享
pub struct Interpreter {
    machine: Machine,
    table: Arc<DispatchTable>,
}

impl Interpreter {
    /// 使用完整 RV32I 指令表与宿主 stdio 创建解释器
    ///
    /// # 示例
    ///
    /// ```
    /// use allude_rv32::cpu::Interpreter;
    ///
    /// let cpu = Interpreter::new().unwrap();
    /// assert_eq!(cpu.pc(), 0);
    /// ```
    pub fn new() -> Result<Self, RegistryError> {
        InterpreterBuilder::new().build()
    }

    pub(crate) fn with_parts(machine: Machine, table: Arc<DispatchTable>) -> Self {
        Self { machine, table }
    }

    pub fn machine(&self) -> &Machine {
        &self.machine
    }

    pub fn machine_mut(&mut self) -> &mut Machine {
        &mut self.machine
    }

    pub fn table(&self) -> &Arc<DispatchTable> {
        &self.table
    }

    /// 获取当前程序计数器值
    pub fn pc(&self) -> u32 {
        self.machine.pc()
    }

    pub fn set_pc(&mut self, pc: u32) {
        self.machine.set_pc(pc);
    }

    /// 读取 x0 总是返回 0
    pub fn read_reg(&self, reg: u8) -> u32 {
        self.machine.read_reg(reg)
    }

    pub fn write_reg(&mut self, reg: u8, value: u32) {
        self.machine.write_reg(reg, value)
    }

    /// 获取所有寄存器的快照
    pub fn regs(&self) -> &[u32; 32] {
        self.machine.regs()
    }

    /// 把一段指令字顺序写入内存
    pub fn load_program(&mut self, base: u32, words: &[u32]) {
        for (i, &word) in words.iter().enumerate() {
            let addr = base.wrapping_add((i as u32).wrapping_mul(4));
            self.machine.memory_mut().store32(addr, word);
        }
    }

    /// 查表并执行一条已解码的指令
    pub fn dispatch(&mut self, decoded: &DecodedInstr, key: DispatchKey) -> ExecResult {
        self.table.dispatch(&mut self.machine, decoded, key)
    }

    /// 执行单步指令
    pub fn step(&mut self) -> ExecResult {
        self.step_traced(&mut NullSink)
    }

    /// 执行单步指令，并在执行前后通知诊断 sink
    ///
    /// # 流程
    ///
    /// 1. Strict 模式下检查 PC 对齐
    /// 2. 从 PC 处取指
    /// 3. 解码得到字段与 dispatch key
    /// 4. 分发执行（handler 负责更新 PC）
    pub fn step_traced(&mut self, sink: &mut dyn TraceSink) -> ExecResult {
        let pc = self.machine.pc();
        if self.machine.alignment() == AlignmentPolicy::Strict && !AccessSize::Word.is_aligned(pc) {
            return Ok(ExecStatus::trap(TrapCause::InstructionAddressMisaligned, pc, pc));
        }

        let raw = self.machine.memory().load32(pc);
        let (decoded, key) = isa::decode(raw, pc);

        sink.before(&self.machine, &decoded, self.table.name_of(key));
        let status = self.dispatch(&decoded, key)?;
        sink.after(&self.machine, &decoded, &status);

        Ok(status)
    }

    /// 运行多条指令
    ///
    /// 返回执行的指令数量（含触发 trap 的那一条）和最后的状态。
    /// 客户程序 exit 时以 `Err(ProcessExit)` 直接返回。
    ///
    /// # 停止条件
    ///
    /// - 达到最大指令数（状态为 `Success`）
    /// - handler 返回 trap
    /// - exit 系统调用
    pub fn run(&mut self, max_cycles: u64) -> Result<(u64, ExecStatus), ProcessExit> {
        self.run_traced(max_cycles, &mut NullSink)
    }

    pub fn run_traced(
        &mut self,
        max_cycles: u64,
        sink: &mut dyn TraceSink,
    ) -> Result<(u64, ExecStatus), ProcessExit> {
        let mut executed = 0;
        while executed < max_cycles {
            let status = self.step_traced(sink)?;
            executed += 1;
            if let ExecStatus::Trap { cause, pc, tval } = status {
                error!(?cause, "trap at pc 0x{pc:08X} (tval 0x{tval:08X})");
                return Ok((executed, status));
            }
        }
        Ok((executed, ExecStatus::Success))
    }
}

impl std::fmt::Debug for Interpreter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Interpreter")
            .field("machine", &self.machine)
            .field("handlers", &self.table.len())
            .finish()
    }
}
