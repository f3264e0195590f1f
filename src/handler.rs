//! 方案 handler 框架模块
//!
//! 定义所有密码哈希方案共用的数据模型与五操作能力契约
//! （identify / genconfig / genhash / encrypt / verify）。
//!
//! 每个方案由三部分组合而成：
//!
//! - [`SchemeDescriptor`] - 静态策略值：名字、盐值边界与字母表、
//!   轮数边界与代价类型、checksum 长度
//! - [`Scheme`] - 该方案的编解码实现（parse / format / identify）
//! - [`crate::backend::BackendSet`] - 有序的计算后端集合
//!
//! [`SchemeHandler`] 把三者组合成统一的操作面，五个操作对所有方案
//! 采用同一套泛化实现，方案间的差异全部收敛在描述符与编解码里。
//!
//! ## 严格 / 宽松语义
//!
//! 解析已存储的哈希永远使用严格模式：checksum 必须存在且完整，
//! 越界设置直接报错。宽松模式只用于构造新配置（genhash 解析
//! config 字符串、调用方显式 opt-in 的 encrypt），可修正的越界值
//! 会被修正并通过 `log::warn!` 发出非致命警告，绝不静默钳制。

use crate::backend::{Backend, BackendSet, ComputeParams};
use crate::codec::{self, BCRYPT64_CHARS, HASH64_CHARS};
use crate::compare::constant_time_compare;
use crate::error::{Error, Result};
use crate::random;

use base64::Engine;

// ============================================================================
// 数据模型
// ============================================================================

/// 解析模式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseMode {
    /// 严格：checksum 必须存在，设置必须在界内
    Strict,
    /// 宽松：允许无 checksum 的配置记录，可修正的越界设置被修正并警告
    Relaxed,
}

/// 一个哈希实例解析 / 构造后的结构化状态
///
/// 记录一经创建不再修改；附加 checksum 通过 [`HashRecord::with_checksum`]
/// 产生新记录。`salt` 与 `checksum` 按方案的存储单位保存：crypt 家族
/// 存编码后的字符（字节形式），pbkdf2 / mssql 等存原始字节。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashRecord {
    /// 方案标签（如 `"1"`、`"2a"`、`"pbkdf2-sha256"`），创建后不可变
    pub ident: String,
    /// 盐值（编码字符或原始字节，长度受方案约束）
    pub salt: Vec<u8>,
    /// 轮数；`None` 表示方案无轮数概念，或按隐式默认值渲染（sha-crypt）
    pub rounds: Option<u32>,
    /// checksum；`None` 表示这是仅含设置的配置记录
    pub checksum: Option<Vec<u8>>,
}

impl HashRecord {
    /// 构造一个无 checksum 的配置记录
    pub fn config(ident: impl Into<String>, salt: Vec<u8>, rounds: Option<u32>) -> Self {
        HashRecord {
            ident: ident.into(),
            salt,
            rounds,
            checksum: None,
        }
    }

    /// 是否为配置记录（无 checksum）
    pub fn is_config(&self) -> bool {
        self.checksum.is_none()
    }

    /// 附加 checksum，产生新的完整记录
    pub fn with_checksum(&self, checksum: Vec<u8>) -> Self {
        HashRecord {
            ident: self.ident.clone(),
            salt: self.salt.clone(),
            rounds: self.rounds,
            checksum: Some(checksum),
        }
    }
}

/// 盐值字母表类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaltAlphabet {
    /// hash64 字符（`./0-9A-Za-z`），长度按字符数计
    Hash64,
    /// bcrypt base64 字符，长度按字符数计
    Bcrypt64,
    /// 原始字节，长度按字节数计
    Raw,
    /// 方案没有盐值
    None,
}

/// 盐值策略：长度边界与字母表
#[derive(Debug, Clone, Copy)]
pub struct SaltPolicy {
    /// 最小长度
    pub min_len: usize,
    /// 最大长度
    pub max_len: usize,
    /// 自动生成时的长度
    pub default_len: usize,
    /// 字母表
    pub alphabet: SaltAlphabet,
}

impl SaltPolicy {
    /// 无盐方案的策略
    pub const NONE: SaltPolicy = SaltPolicy {
        min_len: 0,
        max_len: 0,
        default_len: 0,
        alphabet: SaltAlphabet::None,
    };
}

/// 轮数代价类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundsCost {
    /// 线性迭代次数
    Linear,
    /// log2 指数（实际迭代数为 `1 << rounds`）
    Log2,
}

/// 预设轮数档位对应的具体数值
#[derive(Debug, Clone, Copy)]
pub struct RoundsPresets {
    /// 普通账户强度
    pub fast: u32,
    /// 管理账户强度
    pub medium: u32,
    /// 高代价强度
    pub slow: u32,
}

/// 轮数策略：边界、默认值、代价类型与可选的预设档位
#[derive(Debug, Clone, Copy)]
pub struct RoundsPolicy {
    /// 最小轮数
    pub min: u32,
    /// 最大轮数
    pub max: u32,
    /// 默认轮数
    pub default: u32,
    /// 代价类型
    pub cost: RoundsCost,
    /// 预设档位；仅部分方案提供
    pub presets: Option<RoundsPresets>,
}

/// 方案的静态策略描述符，每个方案一个实例
pub struct SchemeDescriptor {
    /// 全局唯一的方案名（小写加连字符）
    pub name: &'static str,
    /// 别名
    pub aliases: &'static [&'static str],
    /// 允许的 ident 标签集合
    pub idents: &'static [&'static str],
    /// 新配置使用的默认 ident
    pub default_ident: &'static str,
    /// 盐值策略
    pub salt: SaltPolicy,
    /// 轮数策略；无轮数方案为 `None`
    pub rounds: Option<RoundsPolicy>,
    /// checksum 长度（按方案的存储单位）
    pub checksum_len: usize,
}

// ============================================================================
// 选项
// ============================================================================

/// 轮数预设档位名
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundsPreset {
    /// 普通账户强度
    Fast,
    /// 管理账户强度
    Medium,
    /// 高代价强度
    Slow,
}

/// 轮数来源：显式数值或预设档位
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rounds {
    /// 显式数值
    Value(u32),
    /// 预设档位，由方案解析为具体数值
    Preset(RoundsPreset),
}

/// encrypt / genconfig / verify 的配置选项
#[derive(Debug, Clone, Default)]
pub struct HashOptions {
    /// 显式盐值（按方案的存储单位）；缺省时自动生成
    pub salt: Option<Vec<u8>>,
    /// 轮数
    pub rounds: Option<Rounds>,
    /// ident 标签（如 bcrypt 的 `"2"` / `"2a"`）
    pub ident: Option<String>,
    /// 与 prior hash 一起使用时复用其盐值；仅用于需要确定性重现
    /// 已有哈希的验证流程，绝不应作为默认
    pub keep_salt: bool,
    /// 宽松模式：可修正的越界设置被修正并警告而不是报错
    pub relaxed: bool,
    /// 用户名上下文参数（postgres-md5 需要）
    pub user: Option<String>,
}

impl HashOptions {
    /// 创建默认选项
    pub fn new() -> Self {
        HashOptions::default()
    }

    /// 设置显式盐值
    pub fn with_salt(mut self, salt: impl Into<Vec<u8>>) -> Self {
        self.salt = Some(salt.into());
        self
    }

    /// 设置显式轮数
    pub fn with_rounds(mut self, rounds: u32) -> Self {
        self.rounds = Some(Rounds::Value(rounds));
        self
    }

    /// 设置预设轮数档位
    pub fn with_preset(mut self, preset: RoundsPreset) -> Self {
        self.rounds = Some(Rounds::Preset(preset));
        self
    }

    /// 设置 ident 标签
    pub fn with_ident(mut self, ident: impl Into<String>) -> Self {
        self.ident = Some(ident.into());
        self
    }

    /// 复用 prior hash 的盐值
    pub fn keep_salt(mut self, keep: bool) -> Self {
        self.keep_salt = keep;
        self
    }

    /// 启用宽松模式
    pub fn relaxed(mut self, relaxed: bool) -> Self {
        self.relaxed = relaxed;
        self
    }

    /// 设置用户名上下文参数
    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }
}

// ============================================================================
// 方案契约
// ============================================================================

/// 单个方案的编解码实现
///
/// 操作语义由 [`SchemeHandler`] 统一提供，方案只负责描述符、
/// 线格式的 parse / format 与快速 identify。
pub trait Scheme: Send + Sync {
    /// 方案的静态描述符
    fn descriptor(&self) -> &SchemeDescriptor;

    /// 快速结构判断：是否可能属于本方案。不要求完整解析，绝不报错
    fn identify(&self, hash: &str) -> bool;

    /// 解析哈希 / 配置字符串为记录
    fn parse(&self, hash: &str, mode: ParseMode) -> Result<HashRecord>;

    /// 把记录渲染为规范的线格式字符串
    fn format(&self, record: &HashRecord) -> String;

    /// verify 阶段的 checksum 对比；个别方案覆盖（mssql2000 只比较
    /// 大写口令对应的那一半）
    fn compare_checksum(&self, computed: &[u8], stored: &[u8]) -> bool {
        constant_time_compare(computed, stored)
    }
}

// ============================================================================
// 统一的五操作 handler
// ============================================================================

/// 组合编解码、参数策略与 backend 集合的方案 handler
///
/// # Example
///
/// ```rust
/// use passrs::hash::bcrypt;
/// use passrs::handler::HashOptions;
///
/// let handler = bcrypt::handler();
/// let hash = handler
///     .encrypt("secret", None, &HashOptions::new().with_rounds(4))
///     .unwrap();
/// assert!(handler.identify(&hash));
/// assert!(handler.verify("secret", &hash, &HashOptions::new()).unwrap());
/// ```
pub struct SchemeHandler {
    scheme: Box<dyn Scheme>,
    backends: &'static BackendSet,
    forced: Option<&'static Backend>,
}

impl std::fmt::Debug for SchemeHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemeHandler")
            .field("scheme", &self.scheme.descriptor().name)
            .field("backends", &self.backends)
            .field("forced", &self.forced)
            .finish()
    }
}

impl SchemeHandler {
    /// 由编解码实现与 backend 集合组合出 handler
    pub fn new(scheme: Box<dyn Scheme>, backends: &'static BackendSet) -> Self {
        SchemeHandler {
            scheme,
            backends,
            forced: None,
        }
    }

    /// 方案名
    pub fn name(&self) -> &'static str {
        self.scheme.descriptor().name
    }

    /// 方案别名
    pub fn aliases(&self) -> &'static [&'static str] {
        self.scheme.descriptor().aliases
    }

    /// 方案描述符
    pub fn descriptor(&self) -> &SchemeDescriptor {
        self.scheme.descriptor()
    }

    /// 强制使用指定名字的 backend（测试 / 基准用途）
    ///
    /// backend 未声明或探测失败返回 [`Error::BackendUnavailable`]。
    pub fn with_backend(mut self, name: &str) -> Result<Self> {
        self.forced = Some(self.backends.force(name)?);
        Ok(self)
    }

    /// 当前生效的 backend 名
    pub fn active_backend(&self) -> Result<&'static str> {
        Ok(self.backend()?.name)
    }

    fn backend(&self) -> Result<&'static Backend> {
        match self.forced {
            Some(backend) => Ok(backend),
            None => self.backends.select(),
        }
    }

    /// 快速判断哈希字符串是否属于本方案；输入任意内容都不报错
    pub fn identify(&self, hash: &str) -> bool {
        self.scheme.identify(hash)
    }

    /// 解析哈希字符串（见 [`Scheme::parse`]）
    pub fn parse(&self, hash: &str, mode: ParseMode) -> Result<HashRecord> {
        self.scheme.parse(hash, mode)
    }

    /// 渲染记录（见 [`Scheme::format`]）
    pub fn format(&self, record: &HashRecord) -> String {
        self.scheme.format(record)
    }

    /// 生成配置字符串：新鲜盐值 + 解析后的轮数，无 checksum
    pub fn genconfig(&self, options: &HashOptions) -> Result<String> {
        let record = self.build_config(options, None)?;
        Ok(self.scheme.format(&record))
    }

    /// 由配置字符串计算完整哈希
    ///
    /// config 按宽松模式解析（允许无 checksum），checksum 由选中的
    /// backend 计算后重新渲染。
    pub fn genhash(&self, secret: &str, config: &str, options: &HashOptions) -> Result<String> {
        let record = self.scheme.parse(config, ParseMode::Relaxed)?;
        let checksum = self.compute(secret, &record, options)?;
        Ok(self.scheme.format(&record.with_checksum(checksum)))
    }

    /// 加密：genconfig + genhash 的组合
    ///
    /// 提供 `prior` 时从既有哈希继承 ident 与轮数设置；
    /// `options.keep_salt` 额外复用其盐值（仅用于确定性重现场景）。
    pub fn encrypt(&self, secret: &str, prior: Option<&str>, options: &HashOptions) -> Result<String> {
        let prior_record = match prior {
            Some(hash) => Some(self.scheme.parse(hash, ParseMode::Relaxed)?),
            None => None,
        };
        let record = self.build_config(options, prior_record.as_ref())?;
        let checksum = self.compute(secret, &record, options)?;
        Ok(self.scheme.format(&record.with_checksum(checksum)))
    }

    /// 验证：严格解析 + 重算 + 常量时间对比
    pub fn verify(&self, secret: &str, hash: &str, options: &HashOptions) -> Result<bool> {
        let record = self.scheme.parse(hash, ParseMode::Strict)?;
        let stored = match &record.checksum {
            Some(chk) => chk.clone(),
            None => return Err(Error::missing_digest(self.name())),
        };
        let computed = self.compute(secret, &record, options)?;
        Ok(self.scheme.compare_checksum(&computed, &stored))
    }

    fn compute(&self, secret: &str, record: &HashRecord, options: &HashOptions) -> Result<Vec<u8>> {
        let backend = self.backend()?;
        let params = ComputeParams {
            secret: secret.as_bytes(),
            record,
            user: options.user.as_deref(),
        };
        (backend.compute)(&params)
    }

    // ------------------------------------------------------------------
    // 设置归一化
    // ------------------------------------------------------------------

    fn build_config(&self, options: &HashOptions, prior: Option<&HashRecord>) -> Result<HashRecord> {
        let d = self.scheme.descriptor();

        let ident = match &options.ident {
            Some(ident) => {
                if !d.idents.contains(&ident.as_str()) {
                    return Err(Error::setting(
                        d.name,
                        format!("unknown ident {:?}", ident),
                    ));
                }
                ident.clone()
            }
            None => match prior {
                Some(p) => p.ident.clone(),
                None => d.default_ident.to_string(),
            },
        };

        let salt = match &options.salt {
            Some(salt) => self.normalize_salt(salt, options.relaxed)?,
            None => match prior {
                Some(p) if options.keep_salt => p.salt.clone(),
                _ => self.generate_salt()?,
            },
        };

        let rounds = self.resolve_rounds(options, prior)?;

        Ok(HashRecord::config(ident, salt, rounds))
    }

    fn resolve_rounds(&self, options: &HashOptions, prior: Option<&HashRecord>) -> Result<Option<u32>> {
        let d = self.scheme.descriptor();
        let policy = match &d.rounds {
            Some(policy) => policy,
            None => {
                if options.rounds.is_some() {
                    return Err(Error::setting(d.name, "scheme does not accept rounds"));
                }
                return Ok(None);
            }
        };
        match options.rounds {
            Some(Rounds::Value(value)) => {
                Ok(Some(self.normalize_rounds(value, options.relaxed)?))
            }
            Some(Rounds::Preset(preset)) => {
                let presets = policy.presets.ok_or_else(|| {
                    Error::setting(d.name, "scheme has no rounds presets")
                })?;
                Ok(Some(match preset {
                    RoundsPreset::Fast => presets.fast,
                    RoundsPreset::Medium => presets.medium,
                    RoundsPreset::Slow => presets.slow,
                }))
            }
            None => match prior {
                // prior 记录的隐式轮数（sha-crypt 省略 rounds= 的写法）原样保留
                Some(p) => Ok(p.rounds),
                None => Ok(Some(policy.default)),
            },
        }
    }

    fn normalize_rounds(&self, value: u32, relaxed: bool) -> Result<u32> {
        let d = self.scheme.descriptor();
        let policy = d
            .rounds
            .as_ref()
            .ok_or_else(|| Error::setting(d.name, "scheme does not accept rounds"))?;
        if value < policy.min {
            if !relaxed {
                return Err(Error::setting(
                    d.name,
                    format!("rounds {} below minimum {}", value, policy.min),
                ));
            }
            log::warn!(
                "{}: rounds {} below minimum, corrected to {}",
                d.name,
                value,
                policy.min
            );
            return Ok(policy.min);
        }
        if value > policy.max {
            if !relaxed {
                return Err(Error::setting(
                    d.name,
                    format!("rounds {} above maximum {}", value, policy.max),
                ));
            }
            log::warn!(
                "{}: rounds {} above maximum, corrected to {}",
                d.name,
                value,
                policy.max
            );
            return Ok(policy.max);
        }
        Ok(value)
    }

    fn normalize_salt(&self, salt: &[u8], relaxed: bool) -> Result<Vec<u8>> {
        let d = self.scheme.descriptor();
        let policy = &d.salt;
        match policy.alphabet {
            SaltAlphabet::None => {
                if salt.is_empty() {
                    return Ok(Vec::new());
                }
                return Err(Error::setting(d.name, "scheme does not accept a salt"));
            }
            SaltAlphabet::Hash64 => {
                if !codec::in_alphabet(salt, HASH64_CHARS) {
                    return Err(Error::setting(d.name, "salt contains invalid characters"));
                }
            }
            SaltAlphabet::Bcrypt64 => {
                if !codec::in_alphabet(salt, BCRYPT64_CHARS) {
                    return Err(Error::setting(d.name, "salt contains invalid characters"));
                }
            }
            SaltAlphabet::Raw => {}
        }
        if salt.len() < policy.min_len {
            // 过短的盐值无法修正，宽松模式下同样报错
            return Err(Error::setting(
                d.name,
                format!("salt length {} below minimum {}", salt.len(), policy.min_len),
            ));
        }
        if salt.len() > policy.max_len {
            if !relaxed {
                return Err(Error::setting(
                    d.name,
                    format!("salt length {} above maximum {}", salt.len(), policy.max_len),
                ));
            }
            log::warn!(
                "{}: salt length {} above maximum, truncated to {}",
                d.name,
                salt.len(),
                policy.max_len
            );
            return Ok(salt[..policy.max_len].to_vec());
        }
        Ok(salt.to_vec())
    }

    fn generate_salt(&self) -> Result<Vec<u8>> {
        let d = self.scheme.descriptor();
        match d.salt.alphabet {
            SaltAlphabet::None => Ok(Vec::new()),
            SaltAlphabet::Hash64 => random::generate_salt_chars(HASH64_CHARS, d.salt.default_len),
            SaltAlphabet::Bcrypt64 => {
                // 生成原始字节再编码，保证尾随位为零的规范形式
                let raw = random::generate_salt_bytes(d.salt.default_len * 3 / 4)?;
                Ok(codec::BCRYPT64.encode(raw).into_bytes())
            }
            SaltAlphabet::Raw => random::generate_salt_bytes(d.salt.default_len),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_lifecycle() {
        let config = HashRecord::config("1", b"abcdefgh".to_vec(), None);
        assert!(config.is_config());

        let full = config.with_checksum(vec![1, 2, 3]);
        assert!(!full.is_config());
        // 原记录保持不变
        assert!(config.is_config());
        assert_eq!(full.salt, config.salt);
    }

    #[test]
    fn test_options_builder() {
        let options = HashOptions::new()
            .with_rounds(1000)
            .with_ident("2a")
            .keep_salt(true)
            .relaxed(true);
        assert_eq!(options.rounds, Some(Rounds::Value(1000)));
        assert_eq!(options.ident.as_deref(), Some("2a"));
        assert!(options.keep_salt);
        assert!(options.relaxed);
    }
}
