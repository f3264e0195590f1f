//! Backend 选择模块
//!
//! 计算开销较大的方案可以声明多个候选计算后端，按优先级排列
//! （通常是：优化的原生实现 → 可移植的纯 Rust 回退实现）。
//!
//! 选择算法在首次使用时惰性执行并记忆化：
//!
//! 1. 按声明顺序对每个 backend 执行 `probe()`。探测不只检查存在性，
//!    可行时会把固定的已知答案测试向量喂给候选 backend，并用常量时间
//!    比较校验结果。
//! 2. 第一个探测成功的 backend 被选中，并缓存至进程结束。
//! 3. 如果最终选中的是末位回退 backend，通过 `log::warn!` 发出
//!    "降级运行" 信号——这是调用方可观测的副作用，不是错误。
//! 4. 调用方可以按名字强制指定 backend（测试 / 基准用途）；强制指定
//!    不可用的 backend 返回 [`Error::BackendUnavailable`]。
//!
//! 多线程并发首次使用由 `OnceLock` 保证只产生一次选择结果。

use std::sync::OnceLock;

use crate::error::{Error, Result};
use crate::handler::HashRecord;

/// 一次 checksum 计算的全部输入
///
/// `user` 仅被需要上下文参数的方案使用（如 postgres-md5）。
pub struct ComputeParams<'a> {
    /// 明文密码字节
    pub secret: &'a [u8],
    /// 提供盐值 / 轮数 / ident 的记录
    pub record: &'a HashRecord,
    /// 可选的用户名上下文参数
    pub user: Option<&'a str>,
}

/// 单个计算后端：名字 + 可用性探测 + 计算函数
#[derive(Debug)]
pub struct Backend {
    /// backend 名，强制指定时使用
    pub name: &'static str,
    /// 可用性探测，成功返回 true；失败静默级联到下一个候选
    pub probe: fn() -> bool,
    /// 由 secret 与记录中的盐值/轮数计算 checksum（按方案的存储单位）
    pub compute: fn(&ComputeParams<'_>) -> Result<Vec<u8>>,
}

/// 某个方案的有序 backend 集合，附带一次性的选择缓存
#[derive(Debug)]
pub struct BackendSet {
    scheme: &'static str,
    backends: &'static [Backend],
    selected: OnceLock<Option<usize>>,
}

impl BackendSet {
    /// 创建 backend 集合，`backends` 按最优先在前排列
    pub const fn new(scheme: &'static str, backends: &'static [Backend]) -> Self {
        BackendSet {
            scheme,
            backends,
            selected: OnceLock::new(),
        }
    }

    /// 所有候选 backend 的名字，按声明顺序
    pub fn names(&self) -> Vec<&'static str> {
        self.backends.iter().map(|b| b.name).collect()
    }

    /// 惰性探测并返回选中的 backend
    ///
    /// 首次调用完成探测并缓存结果；后续调用直接返回缓存。
    /// 所有候选都探测失败时返回 [`Error::BackendUnavailable`]。
    pub fn select(&self) -> Result<&'static Backend> {
        let scheme = self.scheme;
        let backends = self.backends;
        let idx = self.selected.get_or_init(|| {
            for (i, backend) in backends.iter().enumerate() {
                if (backend.probe)() {
                    if i + 1 == backends.len() && backends.len() > 1 {
                        log::warn!(
                            "{}: falling back to {:?} backend, \
                             operating in reduced-performance mode",
                            scheme,
                            backend.name,
                        );
                    }
                    return Some(i);
                }
            }
            None
        });
        match idx {
            Some(i) => Ok(&self.backends[*i]),
            None => Err(Error::backend_unavailable(self.scheme, "<any>")),
        }
    }

    /// 按名字强制指定 backend，绕过顺序探测
    ///
    /// 名字未声明或探测失败都返回 [`Error::BackendUnavailable`]。
    pub fn force(&self, name: &str) -> Result<&'static Backend> {
        let backend = self
            .backends
            .iter()
            .find(|b| b.name == name)
            .ok_or_else(|| Error::backend_unavailable(self.scheme, name))?;
        if !(backend.probe)() {
            return Err(Error::backend_unavailable(self.scheme, name));
        }
        Ok(backend)
    }

    /// 选中的是否为末位回退 backend（降级运行）
    pub fn degraded(&self) -> bool {
        matches!(
            self.selected.get(),
            Some(Some(i)) if *i + 1 == self.backends.len() && self.backends.len() > 1
        )
    }
}
