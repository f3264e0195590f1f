//! 策略调度模块 (CryptContext)
//!
//! 把一组有序的方案 handler 封装为单一入口：跨方案的
//! identify / encrypt / verify，以及默认方案与哈希复用语义。
//!
//! ## 顺序契约
//!
//! 注册顺序同时决定两件事，这是文档化的契约而不是实现巧合：
//!
//! - **默认方案**：第一个 handler 在 encrypt 未指定算法且没有
//!   prior hash 时被使用
//! - **识别平局**：多个 handler 同时匹配一个字符串时，先注册者胜出。
//!   因此应把结构宽松的方案（如 des-crypt，任意 13 个 hash64 字符
//!   都匹配）排在后面
//!
//! Context 构建后不可变；进程级的默认实例见 [`default_context`]。

use std::sync::OnceLock;

use crate::error::{Error, Result};
use crate::handler::{HashOptions, SchemeHandler};
use crate::hash;

/// 有序的方案 handler 集合
///
/// # Example
///
/// ```rust
/// use passrs::context::CryptContext;
///
/// let ctx = CryptContext::of_names(&["md5-crypt", "sha512-crypt"]).unwrap();
/// assert_eq!(ctx.identify("$1$aaaa$bbbbbbbbbbbbbbbbbbbbbb"), Some("md5-crypt"));
/// assert_eq!(ctx.identify("not-a-hash"), None);
/// ```
pub struct CryptContext {
    handlers: Vec<SchemeHandler>,
}

impl CryptContext {
    /// 由 handler 列表构建 context
    ///
    /// 列表为空或存在重名方案时返回错误。
    pub fn new(handlers: Vec<SchemeHandler>) -> Result<Self> {
        if handlers.is_empty() {
            return Err(Error::unsupported("<empty context>"));
        }
        for (i, handler) in handlers.iter().enumerate() {
            if handlers[..i].iter().any(|h| h.name() == handler.name()) {
                return Err(Error::unsupported(format!(
                    "duplicate handler name: {}",
                    handler.name()
                )));
            }
        }
        Ok(CryptContext { handlers })
    }

    /// 按方案名列表从内建注册表构建 context
    pub fn of_names(names: &[&str]) -> Result<Self> {
        let handlers = names
            .iter()
            .map(|name| hash::get_handler(name))
            .collect::<Result<Vec<_>>>()?;
        CryptContext::new(handlers)
    }

    /// 注册的方案名，按注册顺序
    pub fn scheme_names(&self) -> Vec<&'static str> {
        self.handlers.iter().map(|h| h.name()).collect()
    }

    /// 按名字（或别名）查找 handler；`None` 返回默认（第一个）handler
    pub fn lookup(&self, name: Option<&str>) -> Result<&SchemeHandler> {
        match name {
            None => Ok(&self.handlers[0]),
            Some(name) => self
                .handlers
                .iter()
                .find(|h| h.name() == name || h.aliases().contains(&name))
                .ok_or_else(|| Error::unsupported(name)),
        }
    }

    /// 识别哈希所属的方案
    ///
    /// 按注册顺序逐个调用 handler 的 identify，返回第一个匹配的
    /// 方案名；无匹配返回 `None`。identify 是全函数，绝不报错。
    pub fn identify(&self, hash: &str) -> Option<&'static str> {
        self.handlers
            .iter()
            .find(|h| h.identify(hash))
            .map(|h| h.name())
    }

    /// 识别并返回 handler 本身
    pub fn identify_handler(&self, hash: &str) -> Option<&SchemeHandler> {
        self.handlers.iter().find(|h| h.identify(hash))
    }

    /// 加密口令
    ///
    /// handler 解析顺序：显式 `alg` > `prior` 哈希的所属方案 > 默认
    /// （第一个）handler。`prior` 无法识别时返回
    /// [`Error::UnsupportedScheme`]。
    ///
    /// # Arguments
    ///
    /// * `secret` - 明文口令
    /// * `prior` - 可选的既有哈希，为新哈希提供方案与设置默认值
    /// * `alg` - 可选的方案名
    /// * `options` - 其余设置（盐值 / 轮数 / keep_salt 等）
    pub fn encrypt(
        &self,
        secret: &str,
        prior: Option<&str>,
        alg: Option<&str>,
        options: &HashOptions,
    ) -> Result<String> {
        let handler = match (alg, prior) {
            (Some(name), _) => self.lookup(Some(name))?,
            (None, Some(hash)) => self
                .identify_handler(hash)
                .ok_or_else(|| Error::unsupported(hash))?,
            (None, None) => &self.handlers[0],
        };
        handler.encrypt(secret, prior, options)
    }

    /// 验证口令
    ///
    /// handler 解析与 [`CryptContext::encrypt`] 一致，但解析是强制的：
    /// 无法识别的哈希永远是硬错误，绝不回落到默认方案。
    pub fn verify(&self, secret: &str, hash: &str, alg: Option<&str>) -> Result<bool> {
        self.verify_with(secret, hash, alg, &HashOptions::new())
    }

    /// 带选项的验证（postgres-md5 等需要上下文参数的方案使用）
    pub fn verify_with(
        &self,
        secret: &str,
        hash: &str,
        alg: Option<&str>,
        options: &HashOptions,
    ) -> Result<bool> {
        let handler = match alg {
            Some(name) => self.lookup(Some(name))?,
            None => self
                .identify_handler(hash)
                .ok_or_else(|| Error::unsupported(hash))?,
        };
        handler.verify(secret, hash, options)
    }
}

static DEFAULT_CONTEXT: OnceLock<CryptContext> = OnceLock::new();

/// 进程级默认 context
///
/// 包含全部内建方案，强方案在前（bcrypt 为默认）。首次调用时构建，
/// 之后只读共享——这是一个显式初始化的不可变便利值，不是会被
/// 运行期修改的全局状态。
pub fn default_context() -> &'static CryptContext {
    DEFAULT_CONTEXT.get_or_init(|| {
        CryptContext::new(hash::builtin_handlers())
            .unwrap_or_else(|_| unreachable!("builtin handlers are valid"))
    })
}

/// 用默认 context 识别哈希
pub fn identify(hash: &str) -> Option<&'static str> {
    default_context().identify(hash)
}

/// 用默认 context 加密口令
pub fn encrypt(
    secret: &str,
    prior: Option<&str>,
    alg: Option<&str>,
    options: &HashOptions,
) -> Result<String> {
    default_context().encrypt(secret, prior, alg, options)
}

/// 用默认 context 验证口令
pub fn verify(secret: &str, hash: &str, alg: Option<&str>) -> Result<bool> {
    default_context().verify(secret, hash, alg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identify_scans_in_registration_order() {
        // 扫描按注册顺序进行，前面的 handler 不匹配时才轮到后面的；
        // des-crypt 这类结构宽松的方案应由调用方排在末尾
        let ctx = CryptContext::of_names(&["md5-crypt", "des-crypt"]).unwrap();
        assert_eq!(ctx.identify("abgOeLfPimXQo"), Some("des-crypt"));
        assert_eq!(
            ctx.identify("$1$2xYRz6ta$IWpg/auAdyc8.CyZ0K6QK/"),
            Some("md5-crypt")
        );
        assert_eq!(ctx.scheme_names(), vec!["md5-crypt", "des-crypt"]);
    }

    #[test]
    fn test_default_is_first() {
        let ctx = CryptContext::of_names(&["mysql-41", "mysql-323"]).unwrap();
        let hash = ctx.encrypt("secret", None, None, &HashOptions::new()).unwrap();
        assert!(hash.starts_with('*'));
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let ctx = CryptContext::of_names(&["bcrypt", "bcrypt"]);
        assert!(ctx.is_err());
    }

    #[test]
    fn test_empty_context_rejected() {
        assert!(CryptContext::new(Vec::new()).is_err());
    }

    #[test]
    fn test_lookup_by_alias() {
        let ctx = CryptContext::of_names(&["sha512-crypt"]).unwrap();
        assert_eq!(ctx.lookup(Some("sha512_crypt")).unwrap().name(), "sha512-crypt");
        assert!(ctx.lookup(Some("bcrypt")).is_err());
    }

    #[test]
    fn test_verify_unidentifiable_is_error() {
        let ctx = CryptContext::of_names(&["md5-crypt"]).unwrap();
        let err = ctx.verify("secret", "not-a-hash", None).unwrap_err();
        assert!(matches!(err, Error::UnsupportedScheme(_)));
    }

    #[test]
    fn test_default_context_is_shared() {
        let a = default_context() as *const CryptContext;
        let b = default_context() as *const CryptContext;
        assert_eq!(a, b);
        assert_eq!(default_context().scheme_names()[0], "bcrypt");
    }
}
