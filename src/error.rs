//! 统一错误类型模块
//!
//! 提供 passrs 库中所有操作的错误类型定义。
//!
//! 错误分类遵循固定的语义：
//!
//! - [`Error::MalformedHash`] - 哈希字符串在结构、字符集、长度或规范形式上不合法
//! - [`Error::UnsupportedScheme`] - 没有任何 handler 能识别该哈希，或请求了未知的方案名
//! - [`Error::InvalidSetting`] - 严格模式下 salt/rounds 超出方案声明的边界
//! - [`Error::MissingDigest`] - 对没有 checksum 的配置记录执行 verify
//! - [`Error::BackendUnavailable`] - 显式指定的 backend 不存在或探测失败
//! - [`Error::Rng`] - 系统 CSPRNG 获取随机字节失败
//!
//! 解析与验证错误永远以类型化的方式返回给调用者，不会被吞掉。

use std::fmt;

/// passrs 库的统一结果类型
pub type Result<T> = std::result::Result<T, Error>;

/// passrs 库的错误类型
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// 哈希字符串格式不合法（结构 / 字符集 / 长度 / 非规范编码）
    MalformedHash {
        /// 方案名
        scheme: &'static str,
        /// 具体原因
        reason: String,
    },

    /// 无法识别哈希所属方案，或请求了未注册的方案名
    UnsupportedScheme(String),

    /// 严格构造模式下 salt/rounds 等设置超出方案边界
    InvalidSetting {
        /// 方案名
        scheme: &'static str,
        /// 具体原因
        reason: String,
    },

    /// 记录缺少 checksum（对配置字符串执行了 verify 等需要摘要的操作）
    MissingDigest {
        /// 方案名
        scheme: &'static str,
    },

    /// 显式请求的 backend 不存在或不可用
    BackendUnavailable {
        /// 方案名
        scheme: &'static str,
        /// 请求的 backend 名
        backend: String,
    },

    /// 随机数生成失败
    Rng(String),
}

impl Error {
    /// 创建一个哈希格式错误
    pub fn malformed(scheme: &'static str, reason: impl Into<String>) -> Self {
        Error::MalformedHash {
            scheme,
            reason: reason.into(),
        }
    }

    /// 创建一个设置越界错误
    pub fn setting(scheme: &'static str, reason: impl Into<String>) -> Self {
        Error::InvalidSetting {
            scheme,
            reason: reason.into(),
        }
    }

    /// 创建一个方案不支持错误
    pub fn unsupported(name: impl Into<String>) -> Self {
        Error::UnsupportedScheme(name.into())
    }

    /// 创建一个缺少摘要错误
    pub fn missing_digest(scheme: &'static str) -> Self {
        Error::MissingDigest { scheme }
    }

    /// 创建一个 backend 不可用错误
    pub fn backend_unavailable(scheme: &'static str, backend: impl Into<String>) -> Self {
        Error::BackendUnavailable {
            scheme,
            backend: backend.into(),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::MalformedHash { scheme, reason } => {
                write!(f, "malformed {} hash: {}", scheme, reason)
            }
            Error::UnsupportedScheme(name) => {
                write!(f, "unsupported hash scheme: {}", name)
            }
            Error::InvalidSetting { scheme, reason } => {
                write!(f, "invalid {} setting: {}", scheme, reason)
            }
            Error::MissingDigest { scheme } => {
                write!(f, "{} record has no checksum (config string?)", scheme)
            }
            Error::BackendUnavailable { scheme, backend } => {
                write!(f, "{} backend {:?} is not available", scheme, backend)
            }
            Error::Rng(reason) => {
                write!(f, "random number generation failed: {}", reason)
            }
        }
    }
}

impl std::error::Error for Error {}
