//! 诊断观察接口
//!
//! 解释器在每条指令前后调用 [`TraceSink`]，核心自身不做任何格式化或输出。
//! [`TracingSink`] 把钩子转成 `TRACE` 级别的 `tracing` 事件。

use tracing::{debug, trace};

use crate::cpu::{ExecStatus, Machine};
use crate::isa::DecodedInstr;
use crate::memory::Memory;

/// 逐条指令的观察钩子
pub trait TraceSink {
    /// 解码之后、handler 执行之前
    fn before(&mut self, _machine: &Machine, _instr: &DecodedInstr, _name: Option<&'static str>) {}

    /// handler 返回状态之后；客户程序 exit 时不调用
    fn after(&mut self, _machine: &Machine, _instr: &DecodedInstr, _status: &ExecStatus) {}
}

/// 什么都不观察
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl TraceSink for NullSink {}

/// 每条指令一个事件，每个变化的寄存器再一个事件
#[derive(Debug, Clone, Default)]
pub struct TracingSink {
    prev: [u32; 32],
    retired: u64,
}

impl TracingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// 已观察的指令数
    pub fn retired(&self) -> u64 {
        self.retired
    }

    pub fn dump_regs(&self, machine: &Machine) {
        debug!("register dump\n{}", format_regs(machine));
    }

    pub fn dump_memory(&self, machine: &Machine, addr: u32, len: usize) {
        debug!("memory dump\n{}", format_memory(machine.memory(), addr, len));
    }
}

impl TraceSink for TracingSink {
    fn before(&mut self, machine: &Machine, instr: &DecodedInstr, name: Option<&'static str>) {
        self.prev = *machine.regs();
        trace!(
            "0x{:08X}: {:08X}  {}",
            instr.pc,
            instr.raw,
            name.unwrap_or("<illegal>")
        );
    }

    fn after(&mut self, machine: &Machine, _instr: &DecodedInstr, status: &ExecStatus) {
        self.retired += 1;
        for (index, (old, new)) in self.prev.iter().zip(machine.regs()).enumerate() {
            if old != new {
                trace!("    x{index:<2} 0x{old:08X} -> 0x{new:08X}");
            }
        }
        if !status.is_success() {
            trace!("    {status:?}");
        }
    }
}

/// 格式化 PC 与 x0..x31，每行四个寄存器
pub fn format_regs(machine: &Machine) -> String {
    let mut out = format!("pc: 0x{:08x}\n", machine.pc());
    for (i, value) in machine.regs().iter().enumerate() {
        out.push_str(&format!("x{i:02}: 0x{value:08x}"));
        out.push(if i % 4 == 3 { '\n' } else { ' ' });
    }
    out
}

/// 自 `addr` 起的十六进制转储，每行 16 字节
pub fn format_memory(mem: &dyn Memory, addr: u32, len: usize) -> String {
    let mut out = String::new();
    for (line, chunk) in mem.read_bytes(addr, len).chunks(16).enumerate() {
        let base = addr.wrapping_add((line * 16) as u32);
        let bytes: String = chunk.iter().map(|byte| format!(" {byte:02x}")).collect();
        out.push_str(&format!("{base:08x}:{bytes}\n"));
    }
    out
}
