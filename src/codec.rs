//! 哈希字符串编解码模块
//!
//! 集中提供各方案线格式共用的编码工具：
//!
//! - **hash64**：crypt 家族（des-crypt / md5-crypt / sha-crypt / phpass）
//!   使用的小端 6-bit 编码。字母表 `./0-9A-Za-z`，与标准 base64 的字符
//!   取值完全不同，且按低位在前的顺序输出，没有现成的生态 crate 实现。
//! - **adapted base64**：pbkdf2 系列使用的变体，即标准 base64 把 `+`
//!   替换为 `.`、去掉填充。
//! - **bcrypt base64**：bcrypt 专用字母表（`base64` crate 内置）。
//! - **hex**：mssql / grub / postgres 等方案的十六进制字段。
//! - 规范化整数解析与模块化 crypt 三段式 (`ident$rounds$salt[$chk]`) 拆分。
//!
//! 所有 parse 路径共用同一套规则：rounds 字段禁止前导零等非规范表示，
//! salt/checksum 中出现字母表之外的字符一律拒绝。

use base64::alphabet::{self, Alphabet};
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;

/// hash64 字母表，起源于 des-crypt，被 md5-crypt、sha-crypt 等沿用
pub const HASH64_CHARS: &[u8; 64] =
    b"./0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

/// bcrypt 字母表（顺序与 hash64 不同）
pub const BCRYPT64_CHARS: &[u8; 64] =
    b"./ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

const NO_PAD_LENIENT: GeneralPurposeConfig = GeneralPurposeConfig::new()
    .with_encode_padding(false)
    .with_decode_padding_mode(DecodePaddingMode::RequireNone)
    .with_decode_allow_trailing_bits(true);

const AB64_ALPHABET: Alphabet = match Alphabet::new(
    "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789./",
) {
    Ok(a) => a,
    Err(_) => panic!("invalid adapted-base64 alphabet"),
};

/// pbkdf2 系列使用的 adapted base64 引擎（`+` → `.`，无填充）
pub const AB64: GeneralPurpose = GeneralPurpose::new(&AB64_ALPHABET, NO_PAD_LENIENT);

/// bcrypt base64 引擎（无填充，允许盐值末尾的非零尾随位）
pub const BCRYPT64: GeneralPurpose = GeneralPurpose::new(&alphabet::BCRYPT, NO_PAD_LENIENT);

// ============================================================================
// hash64 基础编解码
// ============================================================================

/// 6-bit 值编码为 hash64 字符
#[inline]
pub fn h64_encode_6bit(v: u8) -> u8 {
    HASH64_CHARS[(v & 0x3f) as usize]
}

/// hash64 字符解码为 6-bit 值，非法字符返回 None
#[inline]
pub fn h64_decode_6bit(c: u8) -> Option<u8> {
    match c {
        b'.' => Some(0),
        b'/' => Some(1),
        b'0'..=b'9' => Some(c - b'0' + 2),
        b'A'..=b'Z' => Some(c - b'A' + 12),
        b'a'..=b'z' => Some(c - b'a' + 38),
        _ => None,
    }
}

/// 判断字节序列是否全部落在给定字母表内
pub fn in_alphabet(data: &[u8], alphabet: &[u8]) -> bool {
    data.iter().all(|c| alphabet.contains(c))
}

/// 解码 2 个 hash64 字符为 12-bit 整数（des-crypt 盐值，低位字符在前）
pub fn h64_decode_int12(chars: &[u8]) -> Option<u16> {
    if chars.len() != 2 {
        return None;
    }
    let lo = h64_decode_6bit(chars[0])? as u16;
    let hi = h64_decode_6bit(chars[1])? as u16;
    Some((hi << 6) | lo)
}

/// 编码 64-bit 整数为 11 个 hash64 字符（des-crypt checksum）
///
/// 自最高位起每 6 位取一个字符，最后 4 位左移补齐。
pub fn h64_encode_int64(mut value: u64) -> [u8; 11] {
    let mut out = [0u8; 11];
    out[10] = h64_encode_6bit(((value << 2) & 0x3f) as u8);
    value >>= 4;
    for i in (0..10).rev() {
        out[i] = h64_encode_6bit((value & 0x3f) as u8);
        value >>= 6;
    }
    out
}

/// 取摘要中 3 个偏移处的字节，按低位在前输出 4 个 hash64 字符
///
/// md5-crypt 与 sha-crypt 的 checksum 都以这种转置方式编码。
pub fn h64_encode_3_offsets(out: &mut Vec<u8>, digest: &[u8], o1: usize, o2: usize, o3: usize) {
    let v1 = digest[o1];
    let v2 = digest[o2];
    let v3 = digest[o3];
    out.push(h64_encode_6bit(v1 & 0x3f));
    out.push(h64_encode_6bit(((v2 & 0x0f) << 2) | (v1 >> 6)));
    out.push(h64_encode_6bit(((v3 & 0x03) << 4) | (v2 >> 4)));
    out.push(h64_encode_6bit(v3 >> 2));
}

/// 取摘要中 2 个偏移处的字节，输出 3 个 hash64 字符
pub fn h64_encode_2_offsets(out: &mut Vec<u8>, digest: &[u8], o1: usize, o2: usize) {
    let v1 = digest[o1];
    let v2 = digest[o2];
    out.push(h64_encode_6bit(v1 & 0x3f));
    out.push(h64_encode_6bit(((v2 & 0x0f) << 2) | (v1 >> 6)));
    out.push(h64_encode_6bit(v2 >> 4));
}

/// 取摘要中 1 个偏移处的字节，输出 2 个 hash64 字符
pub fn h64_encode_1_offset(out: &mut Vec<u8>, digest: &[u8], o1: usize) {
    let v1 = digest[o1];
    out.push(h64_encode_6bit(v1 & 0x3f));
    out.push(h64_encode_6bit(v1 >> 6));
}

/// 小端逐字节 hash64 编码（phpass 使用）
///
/// 每 3 字节打包为 24-bit 小端整数，按低 6 位优先输出 4 个字符；
/// 尾部不足 3 字节时相应输出 2 或 3 个字符。
pub fn h64_encode_le(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len().div_ceil(3) * 4);
    let mut i = 0;
    while i < data.len() {
        let mut v = data[i] as u32;
        if i + 1 < data.len() {
            v |= (data[i + 1] as u32) << 8;
        }
        if i + 2 < data.len() {
            v |= (data[i + 2] as u32) << 16;
        }
        out.push(h64_encode_6bit((v & 0x3f) as u8));
        out.push(h64_encode_6bit(((v >> 6) & 0x3f) as u8));
        if i + 1 < data.len() {
            out.push(h64_encode_6bit(((v >> 12) & 0x3f) as u8));
        }
        if i + 2 < data.len() {
            out.push(h64_encode_6bit(((v >> 18) & 0x3f) as u8));
        }
        i += 3;
    }
    out
}

// ============================================================================
// 十六进制
// ============================================================================

/// 将字节数组编码为小写十六进制字符串
pub fn hex_encode_lower(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// 将字节数组编码为大写十六进制字符串
pub fn hex_encode_upper(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02X}", b)).collect()
}

/// 解码十六进制字符串（大小写不敏感），非法字符或奇数长度返回 None
pub fn hex_decode(text: &str) -> Option<Vec<u8>> {
    if text.len() % 2 != 0 {
        return None;
    }
    let bytes = text.as_bytes();
    let mut out = Vec::with_capacity(bytes.len() / 2);
    for pair in bytes.chunks_exact(2) {
        let hi = (pair[0] as char).to_digit(16)?;
        let lo = (pair[1] as char).to_digit(16)?;
        out.push(((hi << 4) | lo) as u8);
    }
    Some(out)
}

// ============================================================================
// 字段拆分与规范化整数
// ============================================================================

/// 解析规范形式的无符号整数
///
/// 拒绝空串、前导零（`"0"` 本身除外）、非数字字符与溢出，
/// 防止同一逻辑值存在多种编码。
pub fn parse_canonical_u32(text: &str) -> Option<u32> {
    if text.is_empty() {
        return None;
    }
    if !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if text.len() > 1 && text.starts_with('0') {
        return None;
    }
    text.parse().ok()
}

/// 拆分 `<prefix><rounds><sep><salt>[<sep><chk>]` 形式的三段式哈希
///
/// 返回 `(rounds, salt, checksum)`；前缀不匹配或段数不对返回 None。
pub fn split_mc3<'a>(
    hash: &'a str,
    prefix: &str,
    sep: char,
) -> Option<(&'a str, &'a str, Option<&'a str>)> {
    let rest = hash.strip_prefix(prefix)?;
    let mut parts = rest.split(sep);
    let rounds = parts.next()?;
    let salt = parts.next()?;
    let chk = parts.next();
    if parts.next().is_some() {
        return None;
    }
    Some((rounds, salt, chk))
}
