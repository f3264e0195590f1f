//! 内部密码学原语模块
//!
//! 存放个别方案需要、而生态 crate 无法直接表达的确定性原语：
//!
//! - [`des`] - des-crypt 使用的带盐变体 DES（盐值扰动 E 扩展表，
//!   标准分组密码 crate 无法表达）
//! - [`bcrypt_blowfish`] - 基于 `blowfish` crate 的可移植 bcrypt 核心，
//!   作为 bcrypt 方案的回退 backend
//!
//! 其余摘要 / KDF 原语一律使用 RustCrypto crate，不在此重复实现。

pub mod bcrypt_blowfish;
pub mod des;
