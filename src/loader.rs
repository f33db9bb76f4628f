//! ELF 加载器
//!
//! 本模块负责：
//! - 校验 ELF32 / 小端 / RISC-V / ET_EXEC
//! - 把 PT_LOAD 段拷入稀疏内存并清零 BSS 尾部
//! - 选择栈顶并按启动约定布置 argc / argv
//! - 设置初始 PC 与 sp (x2)
//!
//! 初始栈布局（地址自高向低）：
//!
//! ```text
//! stack_top ─┐
//!            │  0                (argv 结束标记)
//!            │  argv[argc-1]
//!            │  ...
//!            │  argv[0]
//! sp ──────► │  argc
//!            │  ...
//!            │  "arg0\0" "arg1\0" ... (自 stack_top - 4096 向下，边界按 4 对齐)
//! ```

use std::fs;
use std::io;
use std::path::Path;

use elf::abi::{EM_RISCV, ET_EXEC, PT_LOAD};
use elf::endian::AnyEndian;
use elf::ElfBytes;
use thiserror::Error;
use tracing::debug;

use crate::cpu::Machine;
use crate::memory::Memory;

/// 未指定栈顶时的最低栈顶
pub const MIN_STACK_TOP: u32 = 16 * 1024 * 1024;
/// 未指定栈顶时，栈顶至少高出最高映射地址的距离
pub const STACK_GAP: u32 = 1024 * 1024;
/// 参数字符串的起点距栈顶的最小距离
pub const ARG_SCRATCH: u32 = 4096;

const STACK_ALIGN: u32 = 16;
const SP_REG: u8 = 2;

/// 加载错误
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read ELF file: {0}")]
    Io(#[from] io::Error),
    #[error("failed to parse ELF: {0}")]
    Parse(#[from] elf::ParseError),
    #[error("ELF is not 32-bit")]
    NotElf32,
    #[error("ELF is not little-endian")]
    NotLittleEndian,
    #[error("ELF is not RISC-V (machine type 0x{0:x}, expected 0x{expected:x})", expected = EM_RISCV)]
    WrongMachine(u16),
    #[error("unsupported ELF type {0} (need ET_EXEC)")]
    NotExecutable(u16),
    #[error("no PT_LOAD segments in ELF")]
    NoLoadableSegments,
    #[error("segment at 0x{vaddr:x} (memsz 0x{memsz:x}) exceeds the 32-bit address space")]
    SegmentOutOfRange { vaddr: u64, memsz: u64 },
    #[error("no room for the initial stack below 0x{stack_top:08x}")]
    StackOutOfRange { stack_top: u32 },
}

/// 一个可加载段
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadSegment {
    pub vaddr: u32,
    /// 文件中的字节，长度即 p_filesz
    pub data: Vec<u8>,
    pub mem_size: u32,
}

/// 校验通过的 ELF 映像
#[derive(Debug, Clone)]
pub struct ElfImage {
    pub entry: u32,
    pub segments: Vec<LoadSegment>,
}

impl ElfImage {
    /// 从字节数组解析并校验
    ///
    /// 校验顺序：位宽、字节序、机器类型、文件类型。
    pub fn parse_bytes(data: &[u8]) -> Result<Self, LoadError> {
        let file = ElfBytes::<AnyEndian>::minimal_parse(data)?;
        let header = &file.ehdr;

        if header.class != elf::file::Class::ELF32 {
            return Err(LoadError::NotElf32);
        }
        if header.endianness != AnyEndian::Little {
            return Err(LoadError::NotLittleEndian);
        }
        if header.e_machine != EM_RISCV {
            return Err(LoadError::WrongMachine(header.e_machine));
        }
        if header.e_type != ET_EXEC {
            return Err(LoadError::NotExecutable(header.e_type));
        }

        let mut segments = Vec::new();
        if let Some(phdrs) = file.segments() {
            for phdr in phdrs.iter().filter(|phdr| phdr.p_type == PT_LOAD) {
                // 空段不参与映射与边界统计
                if phdr.p_memsz == 0 {
                    continue;
                }

                let out_of_range = || LoadError::SegmentOutOfRange {
                    vaddr: phdr.p_vaddr,
                    memsz: phdr.p_memsz,
                };
                let end = phdr.p_vaddr.checked_add(phdr.p_memsz).ok_or_else(out_of_range)?;
                if end > u64::from(u32::MAX) + 1 || phdr.p_filesz > phdr.p_memsz {
                    return Err(out_of_range());
                }

                segments.push(LoadSegment {
                    vaddr: phdr.p_vaddr as u32,
                    data: file.segment_data(&phdr)?.to_vec(),
                    mem_size: phdr.p_memsz as u32,
                });
            }
        }

        if segments.is_empty() {
            return Err(LoadError::NoLoadableSegments);
        }

        Ok(ElfImage {
            entry: header.e_entry as u32,
            segments,
        })
    }

    /// 最低映射地址与最高映射地址（不含）
    ///
    /// 末端以 u64 表示，末段恰好到达 4 GiB 时为 0x1_0000_0000。
    pub fn address_range(&self) -> (u32, u64) {
        self.segments.iter().fold((u32::MAX, 0), |(min, max), seg| {
            let end = u64::from(seg.vaddr) + u64::from(seg.mem_size);
            (min.min(seg.vaddr), max.max(end))
        })
    }
}

/// 加载结果，只用于初始化机器状态与诊断
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessLayout {
    pub entry: u32,
    pub min_vaddr: u32,
    /// 最高映射地址（不含）
    pub max_vaddr: u32,
    pub stack_top: u32,
    pub stack_pointer: u32,
    pub argc: u32,
}

/// 从文件加载 ELF 并初始化机器状态
///
/// `args` 为空时以 `path` 作为 argv[0]。
pub fn load_elf(
    machine: &mut Machine,
    path: impl AsRef<Path>,
    args: &[String],
    stack_top_hint: Option<u32>,
) -> Result<ProcessLayout, LoadError> {
    let path = path.as_ref();
    let data = fs::read(path)?;
    debug!("loaded {} ({} bytes)", path.display(), data.len());
    load_elf_bytes(machine, &data, &path.display().to_string(), args, stack_top_hint)
}

/// 从内存中的 ELF 映像加载
///
/// `program` 仅在 `args` 为空时作为 argv[0]。
pub fn load_elf_bytes(
    machine: &mut Machine,
    data: &[u8],
    program: &str,
    args: &[String],
    stack_top_hint: Option<u32>,
) -> Result<ProcessLayout, LoadError> {
    let image = ElfImage::parse_bytes(data)?;
    map_segments(machine.memory_mut(), &image.segments);

    let (min_vaddr, max_end) = image.address_range();
    let stack_top = choose_stack_top(max_end, stack_top_hint)?;
    debug!(
        "entry 0x{:08x}, mapped 0x{min_vaddr:08x}..0x{max_end:08x}, stack top 0x{stack_top:08x}",
        image.entry
    );

    let argv: Vec<&str> = if args.is_empty() {
        vec![program]
    } else {
        args.iter().map(String::as_str).collect()
    };
    let sp = setup_stack(machine.memory_mut(), stack_top, &argv)?;

    machine.set_pc(image.entry);
    machine.write_reg(SP_REG, sp);

    Ok(ProcessLayout {
        entry: image.entry,
        min_vaddr,
        // 仅当末段恰好结束于 4 GiB 时截断
        max_vaddr: u32::try_from(max_end).unwrap_or(u32::MAX),
        stack_top,
        stack_pointer: sp,
        argc: argv.len() as u32,
    })
}

/// 拷贝文件字节并清零 BSS 尾部
pub fn map_segments(mem: &mut dyn Memory, segments: &[LoadSegment]) {
    for seg in segments {
        mem.write_bytes(seg.vaddr, &seg.data);

        let file_size = seg.data.len() as u32;
        if seg.mem_size > file_size {
            let bss_start = seg.vaddr.wrapping_add(file_size);
            mem.fill(bss_start, (seg.mem_size - file_size) as usize, 0);
        }

        debug!(
            "segment 0x{:08x}: filesz 0x{:x}, memsz 0x{:x}",
            seg.vaddr, file_size, seg.mem_size
        );
    }
}

/// 选择栈顶
///
/// 给定 hint 时向下按 16 对齐；否则取 `max(16 MiB, align_up(max_end + 1 MiB, 16))`。
pub fn choose_stack_top(max_end: u64, hint: Option<u32>) -> Result<u32, LoadError> {
    if let Some(hint) = hint {
        return Ok(align_down(hint, STACK_ALIGN));
    }

    let above = (max_end + u64::from(STACK_GAP)).next_multiple_of(u64::from(STACK_ALIGN));
    let top = above.max(u64::from(MIN_STACK_TOP));
    u32::try_from(top).map_err(|_| LoadError::StackOutOfRange { stack_top: u32::MAX })
}

/// 布置 argc / argv 与参数字符串，返回最终 sp
///
/// sp 按 16 对齐；字符串区从 `stack_top - max(4096, 指针区大小)` 起向下生长，
/// 始终位于指针区之下。
pub fn setup_stack(mem: &mut dyn Memory, stack_top: u32, args: &[&str]) -> Result<u32, LoadError> {
    let overflow = || LoadError::StackOutOfRange { stack_top };

    let argc = u32::try_from(args.len()).map_err(|_| overflow())?;
    // argc + argv[0..argc] + NULL
    let array_bytes = argc.checked_add(2).and_then(|n| n.checked_mul(4)).ok_or_else(overflow)?;
    let sp = align_down(stack_top.checked_sub(array_bytes).ok_or_else(overflow)?, STACK_ALIGN);

    let reserve = ARG_SCRATCH.max(array_bytes.next_multiple_of(STACK_ALIGN));
    let mut cursor = align_down(stack_top.checked_sub(reserve).ok_or_else(overflow)?, STACK_ALIGN);

    let mut argv_ptrs = Vec::with_capacity(args.len());
    for arg in args {
        let bytes = arg.as_bytes();
        let len = u32::try_from(bytes.len()).map_err(|_| overflow())?;
        let start = cursor.checked_sub(len + 1).ok_or_else(overflow)?;
        mem.write_bytes(start, bytes);
        mem.store8(start + len, 0);
        argv_ptrs.push(start);
        cursor = align_down(start, 4);
    }

    mem.store32(sp, argc);
    for (i, &ptr) in argv_ptrs.iter().enumerate() {
        mem.store32(sp + 4 + 4 * i as u32, ptr);
    }
    mem.store32(sp + 4 + 4 * argc, 0);

    debug!("argc {argc}, sp 0x{sp:08x}");
    Ok(sp)
}

#[inline]
fn align_down(value: u32, align: u32) -> u32 {
    value & !(align - 1)
}
