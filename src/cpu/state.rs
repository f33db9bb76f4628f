//! CPU 架构状态：寄存器堆、PC 与地址空间

use super::trap::AlignmentPolicy;
use crate::memory::SparseMemory;
use crate::syscall::HostIo;

/// 整数寄存器堆 x0..x31，x0 恒为 0
#[derive(Clone, Default, PartialEq, Eq)]
pub struct RegFile {
    regs: [u32; 32],
}

impl RegFile {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn read(&self, reg: u8) -> u32 {
        self.regs[(reg & 0x1F) as usize]
    }

    /// 写 x0 被丢弃
    #[inline]
    pub fn write(&mut self, reg: u8, value: u32) {
        let reg = reg & 0x1F;
        if reg != 0 {
            self.regs[reg as usize] = value;
        }
    }

    pub fn snapshot(&self) -> &[u32; 32] {
        &self.regs
    }
}

impl std::fmt::Debug for RegFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map()
            .entries(self.regs.iter().enumerate().map(|(i, v)| (i, format!("0x{v:08x}"))))
            .finish()
    }
}

/// 单个解释器独占的可变机器状态
///
/// handler 拿到 `&mut Machine`，PC 只由 handler 更新。
#[derive(Debug)]
pub struct Machine {
    regs: RegFile,
    pc: u32,
    memory: SparseMemory,
    alignment: AlignmentPolicy,
    io: HostIo,
}

impl Default for Machine {
    fn default() -> Self {
        Self::new()
    }
}

impl Machine {
    /// 全零状态，客户 I/O 接宿主 stdin/stdout
    pub fn new() -> Self {
        Self::with_io(HostIo::stdio())
    }

    pub fn with_io(io: HostIo) -> Self {
        Self {
            regs: RegFile::new(),
            pc: 0,
            memory: SparseMemory::new(),
            alignment: AlignmentPolicy::default(),
            io,
        }
    }

    #[inline]
    pub fn pc(&self) -> u32 {
        self.pc
    }

    #[inline]
    pub fn set_pc(&mut self, pc: u32) {
        self.pc = pc;
    }

    #[inline]
    pub fn read_reg(&self, reg: u8) -> u32 {
        self.regs.read(reg)
    }

    #[inline]
    pub fn write_reg(&mut self, reg: u8, value: u32) {
        self.regs.write(reg, value)
    }

    pub fn regs(&self) -> &[u32; 32] {
        self.regs.snapshot()
    }

    pub fn memory(&self) -> &SparseMemory {
        &self.memory
    }

    pub fn memory_mut(&mut self) -> &mut SparseMemory {
        &mut self.memory
    }

    pub fn alignment(&self) -> AlignmentPolicy {
        self.alignment
    }

    pub fn set_alignment(&mut self, policy: AlignmentPolicy) {
        self.alignment = policy;
    }

    pub fn io_mut(&mut self) -> &mut HostIo {
        &mut self.io
    }

    /// 替换宿主 I/O，返回旧的一组
    pub fn replace_io(&mut self, io: HostIo) -> HostIo {
        std::mem::replace(&mut self.io, io)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_x0_hardwired() {
        let mut regs = RegFile::new();
        regs.write(0, 0xFFFF_FFFF);
        assert_eq!(regs.read(0), 0);
        regs.write(31, 7);
        assert_eq!(regs.read(31), 7);
        assert_eq!(regs.snapshot()[0], 0);
    }

    #[test]
    fn test_machine_accessors() {
        let mut m = Machine::with_io(HostIo::null());
        m.set_pc(0x1000);
        m.write_reg(2, 0x7FFF_FFF0);
        m.write_reg(0, 1);
        assert_eq!(m.pc(), 0x1000);
        assert_eq!(m.read_reg(2), 0x7FFF_FFF0);
        assert_eq!(m.regs()[0], 0);
        assert_eq!(m.alignment(), AlignmentPolicy::Permissive);
    }
}
