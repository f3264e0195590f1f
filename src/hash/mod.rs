//! 密码哈希方案模块
//!
//! 每个子模块实现一个（或一族）方案的编解码与计算后端，并通过
//! `handler()` 风格的构造函数返回组合好的 [`SchemeHandler`]。
//!
//! [`builtin_handlers`] 返回全部内建方案，[`get_handler`] 按名字或
//! 别名解析单个方案——两者都是为 [`crate::context::CryptContext`]
//! 服务的注册表入口。

use crate::error::{Error, Result};
use crate::handler::SchemeHandler;

pub mod bcrypt;
pub mod des_crypt;
pub mod md5_crypt;
pub mod mssql;
pub mod mysql;
pub mod nthash;
pub mod pbkdf2;
pub mod phpass;
pub mod postgres;
pub mod sha_crypt;

/// 构造全部内建方案的 handler，按"强方案在前"的推荐顺序排列
///
/// 顺序即 [`crate::context::CryptContext`] 的识别顺序与默认方案来源：
/// 宽松的结构（如 des-crypt 的 13 个 hash64 字符）排在后面，避免
/// 抢先匹配其他方案的哈希。
pub fn builtin_handlers() -> Vec<SchemeHandler> {
    vec![
        bcrypt::handler(),
        sha_crypt::sha512_handler(),
        sha_crypt::sha256_handler(),
        pbkdf2::sha512_handler(),
        pbkdf2::sha256_handler(),
        pbkdf2::sha1_handler(),
        pbkdf2::grub_handler(),
        md5_crypt::handler(),
        md5_crypt::apr1_handler(),
        phpass::handler(),
        nthash::handler(),
        mssql::mssql2005_handler(),
        mssql::mssql2000_handler(),
        mysql::mysql41_handler(),
        mysql::mysql323_handler(),
        postgres::handler(),
        des_crypt::handler(),
    ]
}

/// 按名字或别名解析内建方案
///
/// # Arguments
///
/// * `name` - 方案名（如 `"bcrypt"`）或别名（如 `"bcrypt_2a"`）
///
/// # Returns
///
/// 未知名字返回 [`Error::UnsupportedScheme`]
pub fn get_handler(name: &str) -> Result<SchemeHandler> {
    builtin_handlers()
        .into_iter()
        .find(|h| h.name() == name || h.aliases().contains(&name))
        .ok_or_else(|| Error::unsupported(name))
}

/// 全部内建方案名，按注册顺序
pub fn builtin_names() -> Vec<&'static str> {
    builtin_handlers().iter().map(|h| h.name()).collect()
}
