//! 可移植的 bcrypt 核心（EksBlowfish）
//!
//! 直接在 `blowfish` crate 的 bcrypt 专用状态接口上实现 OpenBSD
//! bcrypt 的代价循环，作为 bcrypt 方案的回退 backend。与 C 实现一致：
//! 口令末尾附加 NUL 后截断到 72 字节，密文取 24 字节输出的前 23 字节。

use blowfish::Blowfish;

/// "OrpheanBeholderScryDoubt" 的 32-bit 大端分组
const BCRYPT_MAGIC: [u32; 6] = [
    0x4f72_7068, 0x6561_6e42, 0x6568_6f6c, 0x6465_7253, 0x6372_7944, 0x6f75_6274,
];

/// 计算 bcrypt 校验和
///
/// # Arguments
///
/// * `cost` - log2 代价（实际代价循环为 `1 << cost` 次）
/// * `salt` - 16 字节盐值
/// * `password` - 明文口令字节（不含 NUL 终止符）
///
/// # Returns
///
/// 返回编码前的 23 字节校验和
pub fn bcrypt_core(cost: u32, salt: &[u8; 16], password: &[u8]) -> [u8; 23] {
    // 与 C 实现保持一致：附加 NUL 终止符后截断到 72 字节
    let mut key = Vec::with_capacity(password.len() + 1);
    key.extend_from_slice(password);
    key.push(0);
    if key.len() > 72 {
        key.truncate(72);
    }

    let mut state = Blowfish::bc_init_state();
    state.salted_expand_key(salt, &key);
    for _ in 0..1u32 << cost {
        state.bc_expand_key(&key);
        state.bc_expand_key(salt);
    }

    let mut ctext = BCRYPT_MAGIC;
    let mut output = [0u8; 24];
    for i in (0..6).step_by(2) {
        for _ in 0..64 {
            let [l, r] = state.bc_encrypt([ctext[i], ctext[i + 1]]);
            ctext[i] = l;
            ctext[i + 1] = r;
        }
        output[i * 4..(i + 1) * 4].copy_from_slice(&ctext[i].to_be_bytes());
        output[(i + 1) * 4..(i + 2) * 4].copy_from_slice(&ctext[i + 1].to_be_bytes());
    }

    let mut checksum = [0u8; 23];
    checksum.copy_from_slice(&output[..23]);
    checksum
}
