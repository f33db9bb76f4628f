//! 系统调用桥
//!
//! 寄存器约定：a7 (x17) 为调用号，a0..a2 (x10..x12) 为参数，返回值写回 a0。
//!
//! | 调用号 | 名称 | 行为 |
//! |---|---|---|
//! | 63 | read  | 仅 fd 0，从宿主输入逐字节读入客户内存，遇 EOF 提前结束 |
//! | 64 | write | 仅 fd 1，从客户内存逐字节写到宿主输出，随后 flush |
//! | 93 | exit  | 以 [`ProcessExit`] 向外传播，不终止宿主进程 |
//!
//! 其它调用号返回 `UnsupportedSyscall` trap。

use std::fmt;
use std::io::{self, BufRead, Write};

use tracing::{debug, warn};

use crate::cpu::{ExecResult, ExecStatus, Machine, ProcessExit, TrapCause};
use crate::isa::DecodedInstr;
use crate::memory::Memory;

pub const SYS_READ: u32 = 63;
pub const SYS_WRITE: u32 = 64;
pub const SYS_EXIT: u32 = 93;

const REG_A0: u8 = 10;
const REG_A1: u8 = 11;
const REG_A2: u8 = 12;
const REG_A7: u8 = 17;

const FD_STDIN: u32 = 0;
const FD_STDOUT: u32 = 1;

/// 客户程序可见的宿主 I/O 端点
pub struct HostIo {
    input: Box<dyn BufRead>,
    output: Box<dyn Write>,
}

impl HostIo {
    pub fn new(input: impl BufRead + 'static, output: impl Write + 'static) -> Self {
        Self {
            input: Box::new(input),
            output: Box::new(output),
        }
    }

    /// 宿主进程的 stdin / stdout
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }

    /// 输入恒为 EOF，输出被丢弃
    pub fn null() -> Self {
        Self::new(io::empty(), io::sink())
    }

    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        let byte = match self.input.fill_buf()? {
            [] => return Ok(None),
            [first, ..] => *first,
        };
        self.input.consume(1);
        Ok(Some(byte))
    }
}

impl fmt::Debug for HostIo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostIo").finish_non_exhaustive()
    }
}

/// 处理一次 ecall
///
/// `read`/`write` 总是把 PC 前移一条指令；`exit` 以 `Err` 返回；
/// 不支持的调用号不修改任何状态。
pub fn handle_syscall(m: &mut Machine, d: &DecodedInstr) -> ExecResult {
    let number = m.read_reg(REG_A7);
    let fd = m.read_reg(REG_A0);
    let buf = m.read_reg(REG_A1);
    let count = m.read_reg(REG_A2);

    let transferred = match number {
        SYS_READ => sys_read(m, fd, buf, count),
        SYS_WRITE => sys_write(m, fd, buf, count),
        SYS_EXIT => {
            let code = fd as i32;
            debug!(code, "guest exit at pc 0x{:08X}", d.pc);
            return Err(ProcessExit { code });
        }
        _ => {
            warn!(number, "unsupported syscall at pc 0x{:08X}", d.pc);
            return Ok(ExecStatus::trap(TrapCause::UnsupportedSyscall, d.pc, number));
        }
    };

    m.write_reg(REG_A0, transferred);
    m.set_pc(d.pc.wrapping_add(4));
    Ok(ExecStatus::Success)
}

fn sys_read(m: &mut Machine, fd: u32, buf: u32, count: u32) -> u32 {
    if fd != FD_STDIN {
        debug!(fd, "read on unserviced fd");
        return 0;
    }

    let mut n = 0;
    while n < count {
        match m.io_mut().read_byte() {
            Ok(Some(byte)) => {
                m.memory_mut().store8(buf.wrapping_add(n), byte);
                n += 1;
            }
            Ok(None) => break,
            Err(err) => {
                warn!(%err, "host input failed");
                break;
            }
        }
    }
    n
}

fn sys_write(m: &mut Machine, fd: u32, buf: u32, count: u32) -> u32 {
    if fd != FD_STDOUT {
        debug!(fd, "write on unserviced fd");
        return 0;
    }

    let mut n = 0;
    while n < count {
        let byte = m.memory().load8(buf.wrapping_add(n));
        if let Err(err) = m.io_mut().output.write_all(&[byte]) {
            warn!(%err, "host output failed");
            break;
        }
        n += 1;
    }
    if let Err(err) = m.io_mut().output.flush() {
        warn!(%err, "host output flush failed");
    }
    n
}
