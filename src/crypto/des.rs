//! des-crypt 使用的带盐变体 DES
//!
//! 经典 unix crypt(3) 并不是标准 DES：12-bit 盐值会扰动 E 扩展表
//! （盐值第 i 位为 1 时交换表项 E\[i\] 与 E\[i+24\]），然后用口令导出的
//! 密钥对全零分组连续加密 25 次。生态中的 `des` crate 只实现标准
//! 分组密码，无法表达盐值扰动，因此这里按 FIPS-46 的发布表实现。
//!
//! 实现按位运算逐表置换，不做查表优化——des-crypt 只在兼容旧哈希时
//! 使用，清晰优先于速度。

/// 初始置换 IP
const IP: [u8; 64] = [
    58, 50, 42, 34, 26, 18, 10, 2, 60, 52, 44, 36, 28, 20, 12, 4, //
    62, 54, 46, 38, 30, 22, 14, 6, 64, 56, 48, 40, 32, 24, 16, 8, //
    57, 49, 41, 33, 25, 17, 9, 1, 59, 51, 43, 35, 27, 19, 11, 3, //
    61, 53, 45, 37, 29, 21, 13, 5, 63, 55, 47, 39, 31, 23, 15, 7,
];

/// 末置换 FP（IP 的逆）
const FP: [u8; 64] = [
    40, 8, 48, 16, 56, 24, 64, 32, 39, 7, 47, 15, 55, 23, 63, 31, //
    38, 6, 46, 14, 54, 22, 62, 30, 37, 5, 45, 13, 53, 21, 61, 29, //
    36, 4, 44, 12, 52, 20, 60, 28, 35, 3, 43, 11, 51, 19, 59, 27, //
    34, 2, 42, 10, 50, 18, 58, 26, 33, 1, 41, 9, 49, 17, 57, 25,
];

/// E 扩展表（32 → 48），盐值在此基础上做交换
const E: [u8; 48] = [
    32, 1, 2, 3, 4, 5, 4, 5, 6, 7, 8, 9, //
    8, 9, 10, 11, 12, 13, 12, 13, 14, 15, 16, 17, //
    16, 17, 18, 19, 20, 21, 20, 21, 22, 23, 24, 25, //
    24, 25, 26, 27, 28, 29, 28, 29, 30, 31, 32, 1,
];

/// P 置换（f 函数输出）
const P: [u8; 32] = [
    16, 7, 20, 21, 29, 12, 28, 17, 1, 15, 23, 26, 5, 18, 31, 10, //
    2, 8, 24, 14, 32, 27, 3, 9, 19, 13, 30, 6, 22, 11, 4, 25,
];

/// 密钥置换选择 PC-1（64 → 56）
const PC1: [u8; 56] = [
    57, 49, 41, 33, 25, 17, 9, 1, 58, 50, 42, 34, 26, 18, //
    10, 2, 59, 51, 43, 35, 27, 19, 11, 3, 60, 52, 44, 36, //
    63, 55, 47, 39, 31, 23, 15, 7, 62, 54, 46, 38, 30, 22, //
    14, 6, 61, 53, 45, 37, 29, 21, 13, 5, 28, 20, 12, 4,
];

/// 密钥置换选择 PC-2（56 → 48）
const PC2: [u8; 48] = [
    14, 17, 11, 24, 1, 5, 3, 28, 15, 6, 21, 10, //
    23, 19, 12, 4, 26, 8, 16, 7, 27, 20, 13, 2, //
    41, 52, 31, 37, 47, 55, 30, 40, 51, 45, 33, 48, //
    44, 49, 39, 56, 34, 53, 46, 42, 50, 36, 29, 32,
];

/// 每轮的循环左移位数
const SHIFTS: [u8; 16] = [1, 1, 2, 2, 2, 2, 2, 2, 1, 2, 2, 2, 2, 2, 2, 1];

/// S 盒，每个 4 行 16 列按行展开
const SBOX: [[u8; 64]; 8] = [
    [
        14, 4, 13, 1, 2, 15, 11, 8, 3, 10, 6, 12, 5, 9, 0, 7, //
        0, 15, 7, 4, 14, 2, 13, 1, 10, 6, 12, 11, 9, 5, 3, 8, //
        4, 1, 14, 8, 13, 6, 2, 11, 15, 12, 9, 7, 3, 10, 5, 0, //
        15, 12, 8, 2, 4, 9, 1, 7, 5, 11, 3, 14, 10, 0, 6, 13,
    ],
    [
        15, 1, 8, 14, 6, 11, 3, 4, 9, 7, 2, 13, 12, 0, 5, 10, //
        3, 13, 4, 7, 15, 2, 8, 14, 12, 0, 1, 10, 6, 9, 11, 5, //
        0, 14, 7, 11, 10, 4, 13, 1, 5, 8, 12, 6, 9, 3, 2, 15, //
        13, 8, 10, 1, 3, 15, 4, 2, 11, 6, 7, 12, 0, 5, 14, 9,
    ],
    [
        10, 0, 9, 14, 6, 3, 15, 5, 1, 13, 12, 7, 11, 4, 2, 8, //
        13, 7, 0, 9, 3, 4, 6, 10, 2, 8, 5, 14, 12, 11, 15, 1, //
        13, 6, 4, 9, 8, 15, 3, 0, 11, 1, 2, 12, 5, 10, 14, 7, //
        1, 10, 13, 0, 6, 9, 8, 7, 4, 15, 14, 3, 11, 5, 2, 12,
    ],
    [
        7, 13, 14, 3, 0, 6, 9, 10, 1, 2, 8, 5, 11, 12, 4, 15, //
        13, 8, 11, 5, 6, 15, 0, 3, 4, 7, 2, 12, 1, 10, 14, 9, //
        10, 6, 9, 0, 12, 11, 7, 13, 15, 1, 3, 14, 5, 2, 8, 4, //
        3, 15, 0, 6, 10, 1, 13, 8, 9, 4, 5, 11, 12, 7, 2, 14,
    ],
    [
        2, 12, 4, 1, 7, 10, 11, 6, 8, 5, 3, 15, 13, 0, 14, 9, //
        14, 11, 2, 12, 4, 7, 13, 1, 5, 0, 15, 10, 3, 9, 8, 6, //
        4, 2, 1, 11, 10, 13, 7, 8, 15, 9, 12, 5, 6, 3, 0, 14, //
        11, 8, 12, 7, 1, 14, 2, 13, 6, 15, 0, 9, 10, 4, 5, 3,
    ],
    [
        12, 1, 10, 15, 9, 2, 6, 8, 0, 13, 3, 4, 14, 7, 5, 11, //
        10, 15, 4, 2, 7, 12, 9, 5, 6, 1, 13, 14, 0, 11, 3, 8, //
        9, 14, 15, 5, 2, 8, 12, 3, 7, 0, 4, 10, 1, 13, 11, 6, //
        4, 3, 2, 12, 9, 5, 15, 10, 11, 14, 1, 7, 6, 0, 8, 13,
    ],
    [
        4, 11, 2, 14, 15, 0, 8, 13, 3, 12, 9, 7, 5, 10, 6, 1, //
        13, 0, 11, 7, 4, 9, 1, 10, 14, 3, 5, 12, 2, 15, 8, 6, //
        1, 4, 11, 13, 12, 3, 7, 14, 10, 15, 6, 8, 0, 5, 9, 2, //
        6, 11, 13, 8, 1, 4, 10, 7, 9, 5, 0, 15, 14, 2, 3, 12,
    ],
    [
        13, 2, 8, 4, 6, 15, 11, 1, 10, 9, 3, 14, 5, 0, 12, 7, //
        1, 15, 13, 8, 10, 3, 7, 4, 12, 5, 6, 11, 0, 14, 9, 2, //
        7, 11, 4, 1, 9, 12, 14, 2, 0, 6, 10, 13, 15, 3, 5, 8, //
        2, 1, 14, 7, 4, 10, 8, 13, 15, 12, 9, 0, 3, 5, 6, 11,
    ],
];

/// 按 1 起始的位号表做置换；src 的第 1 位是宽度内的最高位
fn permute(src: u64, src_width: u32, table: &[u8]) -> u64 {
    let mut out = 0u64;
    for &pos in table {
        out <<= 1;
        out |= (src >> (src_width - pos as u32)) & 1;
    }
    out
}

/// 由口令前 8 字节构造 56-bit 密钥（每字节取低 7 位，奇偶位留空）
pub fn secret_to_key(secret: &[u8]) -> u64 {
    let mut key = 0u64;
    for (i, &c) in secret.iter().take(8).enumerate() {
        key |= ((c & 0x7f) as u64) << (57 - 8 * i);
    }
    key
}

/// 生成 16 轮子密钥
fn key_schedule(key: u64) -> [u64; 16] {
    let cd = permute(key, 64, &PC1);
    let mut c = (cd >> 28) & 0x0fff_ffff;
    let mut d = cd & 0x0fff_ffff;
    let mut subkeys = [0u64; 16];
    for (i, &shift) in SHIFTS.iter().enumerate() {
        let s = shift as u32;
        c = ((c << s) | (c >> (28 - s))) & 0x0fff_ffff;
        d = ((d << s) | (d >> (28 - s))) & 0x0fff_ffff;
        subkeys[i] = permute((c << 28) | d, 56, &PC2);
    }
    subkeys
}

/// f 函数：带盐 E 扩展 + 子密钥异或 + S 盒 + P 置换
fn feistel(r: u32, subkey: u64, e_table: &[u8; 48]) -> u32 {
    let expanded = permute(r as u64, 32, e_table) ^ subkey;
    let mut out = 0u32;
    for (g, sbox) in SBOX.iter().enumerate() {
        let chunk = ((expanded >> (42 - 6 * g)) & 0x3f) as usize;
        let row = ((chunk >> 4) & 0x02) | (chunk & 0x01);
        let col = (chunk >> 1) & 0x0f;
        out = (out << 4) | sbox[row * 16 + col] as u32;
    }
    permute(out as u64, 32, &P) as u32
}

/// 对 64-bit 分组连续执行 `rounds` 次带盐 DES 加密
///
/// `salt` 的低 12 位扰动 E 扩展表；`rounds` 为完整 DES 加密次数
/// （crypt(3) 固定为 25）。
pub fn mdes_encrypt_int_block(key: u64, block: u64, salt: u16, rounds: u32) -> u64 {
    // 盐值扰动：第 i 位为 1 时交换 E[i] 与 E[i+24]
    let mut e_table = E;
    for i in 0..12 {
        if (salt >> i) & 1 == 1 {
            e_table.swap(i, i + 24);
        }
    }

    let subkeys = key_schedule(key);

    let mut data = block;
    for _ in 0..rounds {
        let permuted = permute(data, 64, &IP);
        let mut l = (permuted >> 32) as u32;
        let mut r = permuted as u32;
        for subkey in &subkeys {
            let next_r = l ^ feistel(r, *subkey, &e_table);
            l = r;
            r = next_r;
        }
        // 末轮后左右互换再做末置换
        let preoutput = ((r as u64) << 32) | l as u64;
        data = permute(preoutput, 64, &FP);
    }
    data
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_des_known_answer() {
        // 盐值为零时退化为标准 DES。
        // FIPS-81 风格向量: key 0133457799BBCDFF, plaintext 0123456789ABCDEF
        // -> ciphertext 85E813540F0AB405
        let key = 0x0133_4577_99BB_CDFFu64;
        let plaintext = 0x0123_4567_89AB_CDEFu64;
        let ciphertext = mdes_encrypt_int_block(key, plaintext, 0, 1);
        assert_eq!(ciphertext, 0x85E8_1354_0F0A_B405);
    }

    #[test]
    fn test_salt_changes_output() {
        let key = secret_to_key(b"password");
        let a = mdes_encrypt_int_block(key, 0, 0, 25);
        let b = mdes_encrypt_int_block(key, 0, 1, 25);
        assert_ne!(a, b);
    }

    #[test]
    fn test_deterministic() {
        let key = secret_to_key(b"secret");
        let a = mdes_encrypt_int_block(key, 0, 0x123, 25);
        let b = mdes_encrypt_int_block(key, 0, 0x123, 25);
        assert_eq!(a, b);
    }

    #[test]
    fn test_key_uses_first_eight_bytes_only() {
        assert_eq!(secret_to_key(b"12345678"), secret_to_key(b"12345678extra"));
        assert_ne!(secret_to_key(b"1234567"), secret_to_key(b"12345678"));
    }
}
