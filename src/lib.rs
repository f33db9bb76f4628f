//! allude_rv32: RV32I 用户态模拟器
//!
//! 加载静态链接的 RV32I ELF，逐条解释执行，并把 `ecall` 桥接到宿主的
//! read / write / exit。
//!
//! # 模块结构
//!
//! - `isa`: 字段提取、解码、编码与汇编辅助
//! - `cpu`: 操作目录、格式模板、分发表与解释器
//! - `memory`: 稀疏分页内存
//! - `loader`: ELF 校验、段映射与初始栈
//! - `syscall`: 宿主 I/O 与系统调用桥
//! - `trace`: 诊断观察接口
//! - `sim_env`: 配置与运行驱动

pub mod cpu;
pub mod isa;
pub mod loader;
pub mod memory;
pub mod sim_env;
pub mod syscall;
pub mod trace;

#[cfg(test)]
pub(crate) mod testing;
