//! 测试辅助：内存中的 ELF32 写入器与可共享的输出缓冲

use std::cell::RefCell;
use std::io;
use std::rc::Rc;

use elf::abi::{EM_RISCV, ET_EXEC, PT_LOAD};

pub const EHDR32_SIZE: u32 = 52;
pub const PHDR32_SIZE: u32 = 32;

/// clone 后共享同一块缓冲的 writer
#[derive(Clone, Default)]
pub struct SharedBuf(pub Rc<RefCell<Vec<u8>>>);

impl SharedBuf {
    pub fn contents(&self) -> Vec<u8> {
        self.0.borrow().clone()
    }
}

impl io::Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

pub struct Segment {
    pub p_type: u32,
    pub vaddr: u32,
    pub data: Vec<u8>,
    pub mem_size: u32,
}

/// ELF32 写入器：文件头 + 程序头表 + 段数据
pub struct ElfWriter {
    pub big_endian: bool,
    pub e_type: u16,
    pub machine: u16,
    pub entry: u32,
    pub segments: Vec<Segment>,
}

impl ElfWriter {
    pub fn new(entry: u32) -> Self {
        Self {
            big_endian: false,
            e_type: ET_EXEC,
            machine: EM_RISCV,
            entry,
            segments: Vec::new(),
        }
    }

    pub fn load(self, vaddr: u32, data: &[u8], mem_size: u32) -> Self {
        self.segment(PT_LOAD, vaddr, data, mem_size)
    }

    /// 代码段，memsz 等于 filesz
    pub fn code(self, vaddr: u32, words: &[u32]) -> Self {
        let data = program_bytes(words);
        let len = data.len() as u32;
        self.load(vaddr, &data, len)
    }

    pub fn segment(mut self, p_type: u32, vaddr: u32, data: &[u8], mem_size: u32) -> Self {
        self.segments.push(Segment { p_type, vaddr, data: data.to_vec(), mem_size });
        self
    }

    fn put16(&self, out: &mut Vec<u8>, v: u16) {
        out.extend_from_slice(&if self.big_endian { v.to_be_bytes() } else { v.to_le_bytes() });
    }

    fn put32(&self, out: &mut Vec<u8>, v: u32) {
        out.extend_from_slice(&if self.big_endian { v.to_be_bytes() } else { v.to_le_bytes() });
    }

    pub fn build(&self) -> Vec<u8> {
        let mut out = Vec::new();
        let phnum = self.segments.len() as u32;

        // e_ident
        out.extend_from_slice(&[0x7F, b'E', b'L', b'F', 1, if self.big_endian { 2 } else { 1 }, 1, 0]);
        out.extend_from_slice(&[0; 8]);
        self.put16(&mut out, self.e_type);
        self.put16(&mut out, self.machine);
        self.put32(&mut out, 1); // e_version
        self.put32(&mut out, self.entry);
        self.put32(&mut out, if phnum > 0 { EHDR32_SIZE } else { 0 }); // e_phoff
        self.put32(&mut out, 0); // e_shoff
        self.put32(&mut out, 0); // e_flags
        self.put16(&mut out, EHDR32_SIZE as u16);
        self.put16(&mut out, PHDR32_SIZE as u16);
        self.put16(&mut out, phnum as u16);
        self.put16(&mut out, 40); // e_shentsize
        self.put16(&mut out, 0); // e_shnum
        self.put16(&mut out, 0); // e_shstrndx
        assert_eq!(out.len() as u32, EHDR32_SIZE);

        let mut offset = EHDR32_SIZE + PHDR32_SIZE * phnum;
        for seg in &self.segments {
            self.put32(&mut out, seg.p_type);
            self.put32(&mut out, offset);
            self.put32(&mut out, seg.vaddr);
            self.put32(&mut out, seg.vaddr); // p_paddr
            self.put32(&mut out, seg.data.len() as u32);
            self.put32(&mut out, seg.mem_size);
            self.put32(&mut out, 0b111); // p_flags
            self.put32(&mut out, 4); // p_align
            offset += seg.data.len() as u32;
        }

        for seg in &self.segments {
            out.extend_from_slice(&seg.data);
        }
        out
    }
}

/// 只有文件头的 ELF64
pub fn elf64_header() -> Vec<u8> {
    let mut out = vec![0x7F, b'E', b'L', b'F', 2, 1, 1, 0, 0, 0, 0, 0, 0, 0, 0, 0];
    out.extend_from_slice(&ET_EXEC.to_le_bytes());
    out.extend_from_slice(&EM_RISCV.to_le_bytes());
    out.extend_from_slice(&1u32.to_le_bytes());
    out.extend_from_slice(&0x1000u64.to_le_bytes()); // e_entry
    out.extend_from_slice(&0u64.to_le_bytes()); // e_phoff
    out.extend_from_slice(&0u64.to_le_bytes()); // e_shoff
    out.extend_from_slice(&0u32.to_le_bytes()); // e_flags
    out.extend_from_slice(&64u16.to_le_bytes());
    out.extend_from_slice(&56u16.to_le_bytes());
    out.extend_from_slice(&0u16.to_le_bytes());
    out.extend_from_slice(&64u16.to_le_bytes());
    out.extend_from_slice(&0u16.to_le_bytes());
    out.extend_from_slice(&0u16.to_le_bytes());
    out
}

pub fn program_bytes(words: &[u32]) -> Vec<u8> {
    words.iter().flat_map(|w| w.to_le_bytes()).collect()
}
