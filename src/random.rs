//! 安全随机数生成模块
//!
//! 为盐值生成提供密码学安全的随机字节来源。所有方案的 genconfig
//! 在调用方未显式提供盐值时，都通过这里取得新鲜的盐。

use rand::rngs::OsRng;
use rand::TryRngCore;

use crate::error::{Error, Result};

/// 生成指定长度的随机字节数组
///
/// 使用操作系统提供的密码学安全随机数生成器 (CSPRNG)。
///
/// # Arguments
///
/// * `length` - 要生成的字节数
///
/// # Returns
///
/// 返回包含随机字节的 `Vec<u8>`
///
/// # Example
///
/// ```rust
/// use passrs::random::generate_salt_bytes;
///
/// let bytes = generate_salt_bytes(16).unwrap();
/// assert_eq!(bytes.len(), 16);
/// ```
pub fn generate_salt_bytes(length: usize) -> Result<Vec<u8>> {
    let mut bytes = vec![0u8; length];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| Error::Rng(format!("{:?}", e)))?;
    Ok(bytes)
}

/// 从 64 字符字母表中生成指定长度的随机盐字符串
///
/// 字母表长度必须恰好为 64，`byte & 0x3f` 的映射才是无偏的。
///
/// # Arguments
///
/// * `alphabet` - 64 个候选 ASCII 字符
/// * `length` - 要生成的字符数
///
/// # Returns
///
/// 返回由字母表字符组成的字节序列
pub fn generate_salt_chars(alphabet: &[u8], length: usize) -> Result<Vec<u8>> {
    debug_assert_eq!(alphabet.len(), 64);
    let raw = generate_salt_bytes(length)?;
    Ok(raw
        .into_iter()
        .map(|b| alphabet[(b & 0x3f) as usize])
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::HASH64_CHARS;

    #[test]
    fn test_generate_salt_bytes() {
        let a = generate_salt_bytes(32).unwrap();
        assert_eq!(a.len(), 32);

        // 两次生成不应相同
        let b = generate_salt_bytes(32).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_generate_salt_chars_in_alphabet() {
        let salt = generate_salt_chars(HASH64_CHARS, 16).unwrap();
        assert_eq!(salt.len(), 16);
        assert!(salt.iter().all(|c| HASH64_CHARS.contains(c)));
    }

    #[test]
    fn test_zero_length() {
        assert!(generate_salt_bytes(0).unwrap().is_empty());
        assert!(generate_salt_chars(HASH64_CHARS, 0).unwrap().is_empty());
    }
}
