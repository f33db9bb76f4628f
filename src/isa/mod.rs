//! RV32I 指令集：字段提取、解码、编码
//!
//! - `fields`: 字段提取与立即数符号扩展
//! - `opcode`: 主 opcode 常量与类别
//! - `decoder`: 指令字 → [`DecodedInstr`] + [`DispatchKey`]
//! - `encoder`: 结构化字段 → 指令字（解码的逆运算）
//! - `asm`: 助记符级构造函数

pub mod asm;
mod decoder;
pub mod encoder;
pub mod fields;
pub mod opcode;

pub use decoder::{DecodedInstr, DispatchKey, decode};
pub use encoder::{BEncoding, Encode, IEncoding, JEncoding, REncoding, SEncoding, UEncoding, encode};
pub use opcode::OpcodeClass;
