//! 内存抽象层
//!
//! 本模块定义了内存访问的统一接口 `Memory` trait，
//! 以及按页惰性分配的稀疏地址空间 `SparseMemory`。
//!
//! 多字节访问一律由单字节原语按小端序拼接，不依赖宿主字节序与对齐。
//! 地址按 32 位回绕，不做越界与权限检查。

use rustc_hash::FxHashMap;

/// 页大小（字节）
pub const PAGE_SIZE: usize = 4096;

const PAGE_SHIFT: u32 = PAGE_SIZE.trailing_zeros();
const PAGE_MASK: u32 = (PAGE_SIZE as u32) - 1;

/// 访存粒度
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessSize {
    Byte,
    Half,
    Word,
}

impl AccessSize {
    pub fn bytes(self) -> u32 {
        match self {
            AccessSize::Byte => 1,
            AccessSize::Half => 2,
            AccessSize::Word => 4,
        }
    }

    /// 地址是否按该粒度自然对齐
    pub fn is_aligned(self, addr: u32) -> bool {
        addr.is_multiple_of(self.bytes())
    }
}

/// 内存访问的统一接口
///
/// 实现者只需提供单字节读写，宽访问由默认方法组合完成。
pub trait Memory {
    /// 读取 8 位数据
    fn load8(&self, addr: u32) -> u8;

    /// 写入 8 位数据
    fn store8(&mut self, addr: u32, value: u8);

    /// 读取 16 位数据（小端序）
    fn load16(&self, addr: u32) -> u16 {
        u16::from(self.load8(addr)) | (u16::from(self.load8(addr.wrapping_add(1))) << 8)
    }

    /// 读取 32 位数据（小端序）
    fn load32(&self, addr: u32) -> u32 {
        (0..4).fold(0, |acc, i| {
            acc | (u32::from(self.load8(addr.wrapping_add(i))) << (8 * i))
        })
    }

    /// 写入 16 位数据（小端序）
    fn store16(&mut self, addr: u32, value: u16) {
        self.store8(addr, value as u8);
        self.store8(addr.wrapping_add(1), (value >> 8) as u8);
    }

    /// 写入 32 位数据（小端序）
    fn store32(&mut self, addr: u32, value: u32) {
        for i in 0..4 {
            self.store8(addr.wrapping_add(i), (value >> (8 * i)) as u8);
        }
    }

    /// 批量写入，地址逐字节回绕
    fn write_bytes(&mut self, addr: u32, data: &[u8]) {
        for (i, &byte) in data.iter().enumerate() {
            self.store8(addr.wrapping_add(i as u32), byte);
        }
    }

    /// 批量读取
    fn read_bytes(&self, addr: u32, len: usize) -> Vec<u8> {
        (0..len)
            .map(|i| self.load8(addr.wrapping_add(i as u32)))
            .collect()
    }

    /// 将指定范围填充为固定字节
    fn fill(&mut self, addr: u32, len: usize, value: u8) {
        for i in 0..len {
            self.store8(addr.wrapping_add(i as u32), value);
        }
    }
}

type Page = Box<[u8; PAGE_SIZE]>;

/// 稀疏内存
///
/// 覆盖完整的 32 位地址空间，以 4 KiB 页为单位在首次写入时分配。
/// 从未写过的页读出来恒为 0，读取不会分配页。
#[derive(Default)]
pub struct SparseMemory {
    pages: FxHashMap<u32, Page>,
}

impl SparseMemory {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    fn split(addr: u32) -> (u32, usize) {
        (addr >> PAGE_SHIFT, (addr & PAGE_MASK) as usize)
    }

    fn page_mut(&mut self, index: u32) -> &mut [u8; PAGE_SIZE] {
        self.pages
            .entry(index)
            .or_insert_with(|| Box::new([0; PAGE_SIZE]))
    }

    /// 已分配的页数
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// 某地址所在页是否已分配
    pub fn is_mapped(&self, addr: u32) -> bool {
        self.pages.contains_key(&Self::split(addr).0)
    }

    /// 释放所有页
    pub fn clear(&mut self) {
        self.pages.clear();
    }
}

impl Memory for SparseMemory {
    #[inline]
    fn load8(&self, addr: u32) -> u8 {
        let (index, offset) = Self::split(addr);
        self.pages.get(&index).map_or(0, |page| page[offset])
    }

    #[inline]
    fn store8(&mut self, addr: u32, value: u8) {
        let (index, offset) = Self::split(addr);
        self.page_mut(index)[offset] = value;
    }
}

impl std::fmt::Debug for SparseMemory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SparseMemory")
            .field("pages", &self.pages.len())
            .finish()
    }
}
