//! 指令字段提取辅助函数
//!
//! 从 32-bit 指令字中提取各字段，并对各格式的立即数做符号扩展。
//! 解码器与测试只使用这一组函数，不在别处重复位运算。

/// 取出 raw[hi:lo]（含两端）
#[inline]
pub const fn bits(raw: u32, hi: u32, lo: u32) -> u32 {
    (raw >> lo) & (u32::MAX >> (31 - (hi - lo)))
}

/// 将低 `width` 位视为有符号数，扩展到 32 位
#[inline]
pub const fn sign_extend(value: u32, width: u32) -> i32 {
    let shift = 32 - width;
    ((value << shift) as i32) >> shift
}

/// 提取 opcode 字段 [6:0]
#[inline]
pub const fn opcode(raw: u32) -> u8 {
    bits(raw, 6, 0) as u8
}

/// 提取 rd 字段 [11:7]
#[inline]
pub const fn rd(raw: u32) -> u8 {
    bits(raw, 11, 7) as u8
}

/// 提取 funct3 字段 [14:12]
#[inline]
pub const fn funct3(raw: u32) -> u8 {
    bits(raw, 14, 12) as u8
}

/// 提取 rs1 字段 [19:15]
#[inline]
pub const fn rs1(raw: u32) -> u8 {
    bits(raw, 19, 15) as u8
}

/// 提取 rs2 字段 [24:20]
#[inline]
pub const fn rs2(raw: u32) -> u8 {
    bits(raw, 24, 20) as u8
}

/// 提取 funct7 字段 [31:25]
#[inline]
pub const fn funct7(raw: u32) -> u8 {
    bits(raw, 31, 25) as u8
}

/// 移位立即数 shamt，与 rs2 同位置 [24:20]
#[inline]
pub const fn shamt(raw: u32) -> u8 {
    rs2(raw)
}

/// I-type 立即数：imm[11:0] = raw[31:20]
#[inline]
pub const fn imm_i(raw: u32) -> i32 {
    (raw as i32) >> 20
}

/// S-type 立即数：imm[11:5] = raw[31:25], imm[4:0] = raw[11:7]
#[inline]
pub const fn imm_s(raw: u32) -> i32 {
    let imm = (bits(raw, 31, 25) << 5) | bits(raw, 11, 7);
    sign_extend(imm, 12)
}

/// B-type 立即数：imm[12|10:5] = raw[31|30:25], imm[4:1|11] = raw[11:8|7]
#[inline]
pub const fn imm_b(raw: u32) -> i32 {
    let imm = (bits(raw, 31, 31) << 12)
        | (bits(raw, 7, 7) << 11)
        | (bits(raw, 30, 25) << 5)
        | (bits(raw, 11, 8) << 1);
    sign_extend(imm, 13)
}

/// U-type 立即数：imm[31:12] = raw[31:12]，低 12 位为 0
#[inline]
pub const fn imm_u(raw: u32) -> i32 {
    (raw & 0xFFFF_F000) as i32
}

/// J-type 立即数：imm[20|10:1|11|19:12] = raw[31|30:21|20|19:12]
#[inline]
pub const fn imm_j(raw: u32) -> i32 {
    let imm = (bits(raw, 31, 31) << 20)
        | (bits(raw, 19, 12) << 12)
        | (bits(raw, 20, 20) << 11)
        | (bits(raw, 30, 21) << 1);
    sign_extend(imm, 21)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_fields() {
        // add x3, x1, x2
        let raw = 0x002081B3;
        assert_eq!(opcode(raw), 0x33);
        assert_eq!(rd(raw), 3);
        assert_eq!(funct3(raw), 0);
        assert_eq!(rs1(raw), 1);
        assert_eq!(rs2(raw), 2);
        assert_eq!(funct7(raw), 0);

        // sra x3, x1, x2
        assert_eq!(funct7(0x4020D1B3), 0x20);
        assert_eq!(funct3(0x4020D1B3), 5);
    }

    #[test]
    fn test_sign_extend_widths() {
        assert_eq!(sign_extend(0x800, 12), -2048);
        assert_eq!(sign_extend(0x7FF, 12), 2047);
        assert_eq!(sign_extend(0x1000, 13), -4096);
        assert_eq!(sign_extend(0x10_0000, 21), -(1 << 20));
        assert_eq!(sign_extend(0xFFFF_FFFF, 32), -1);
    }

    #[test]
    fn test_imm_i_full_range() {
        for imm in -2048i32..2048 {
            let raw = ((imm as u32) << 20) | 0x13;
            assert_eq!(imm_i(raw), imm, "imm={imm}");
        }
    }

    #[test]
    fn test_imm_s_full_range() {
        for imm in -2048i32..2048 {
            let u = imm as u32;
            let raw = (bits(u, 11, 5) << 25) | (bits(u, 4, 0) << 7) | 0x23;
            assert_eq!(imm_s(raw), imm, "imm={imm}");
        }
    }

    #[test]
    fn test_imm_s_ignores_register_fields() {
        // sw x31, -1(x31): rs1/rs2 全 1 不能泄漏进立即数
        let raw = 0xFFFFAFA3;
        assert_eq!(imm_s(raw), -1);
        assert_eq!(imm_s(0x00112423), 8);
    }

    #[test]
    fn test_imm_b_known_words() {
        assert_eq!(imm_b(0x00208463), 8); // beq x1, x2, 8
        assert_eq!(imm_b(0xFE0008E3), -16); // beq x0, x0, -16
        assert_eq!(imm_b(0xFE314CE3), -8); // blt x2, x3, -8
        assert_eq!(imm_b(0x80000063), -4096);
        assert_eq!(imm_b(0x7E000FE3), 4094);
    }

    #[test]
    fn test_imm_j_known_words() {
        assert_eq!(imm_j(0x0040006F), 4);
        assert_eq!(imm_j(0x008000EF), 8);
        assert_eq!(imm_j(0x8000006F), -(1 << 20));
        assert_eq!(imm_j(0x7FFFF06F), (1 << 20) - 2);
        assert_eq!(imm_j(0xFFDFF06F), -4);
    }

    #[test]
    fn test_imm_u() {
        assert_eq!(imm_u(0x123450B7), 0x12345000);
        assert_eq!(imm_u(0xFFFFF0B7), 0xFFFF_F000_u32 as i32);
        assert_eq!(imm_u(0x00000FFF) & 0xFFF, 0);
    }

    #[test]
    fn test_shamt_aliases_rs2() {
        // srai x2, x1, 31
        let raw = 0x41F0D113;
        assert_eq!(shamt(raw), 31);
        assert_eq!(shamt(raw), rs2(raw));
    }
}
