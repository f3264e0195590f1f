//! # passrs
//!
//! 跨多种历史与现代密码哈希方案的哈希、验证与识别库。
//!
//! ## 功能特性
//!
//! - **统一的方案契约**: 每个方案实现同一组能力
//!   (identify / genconfig / genhash / encrypt / verify)
//! - **策略调度**: [`context::CryptContext`] 按注册顺序识别哈希并
//!   调度到对应方案，保持遗留哈希可验证、新哈希默认强方案
//! - **多 backend 选择**: 计算开销大的方案按优先级探测候选实现，
//!   探测内置已知答案校验，回退时发出可观测的警告
//! - **严格 / 宽松解析**: 存储哈希永远严格解析；宽松模式仅用于
//!   构造新配置，修正越界设置并发出警告
//! - **常量时间对比**: verify 的 checksum 比较不泄露首个差异位置
//!
//! ## 支持的方案
//!
//! des-crypt、md5-crypt、apr-md5-crypt、bcrypt、sha256-crypt、
//! sha512-crypt、pbkdf2-sha1/sha256/sha512、grub-pbkdf2-sha512、
//! mssql2000/2005、postgres-md5、mysql-323/41、nthash、phpass。
//!
//! ## 快速上手
//!
//! ```rust
//! use passrs::context::CryptContext;
//! use passrs::handler::HashOptions;
//!
//! // 只认识 md5-crypt 与 bcrypt 的 context，bcrypt 为默认方案
//! let ctx = CryptContext::of_names(&["bcrypt", "md5-crypt"]).unwrap();
//!
//! let hash = ctx
//!     .encrypt("too many secrets", None, None, &HashOptions::new().with_rounds(4))
//!     .unwrap();
//! assert_eq!(ctx.identify(&hash), Some("bcrypt"));
//! assert!(ctx.verify("too many secrets", &hash, None).unwrap());
//! assert!(!ctx.verify("too many socks", &hash, None).unwrap());
//!
//! // 旧的 md5-crypt 哈希仍然可以验证
//! let legacy = "$1$2xYRz6ta$IWpg/auAdyc8.CyZ0K6QK/";
//! assert_eq!(ctx.identify(legacy), Some("md5-crypt"));
//! assert!(ctx.verify("it's a secret", legacy, None).unwrap());
//! ```
//!
//! ## 单方案使用
//!
//! ```rust
//! use passrs::hash::sha_crypt;
//! use passrs::handler::HashOptions;
//!
//! let handler = sha_crypt::sha512_handler();
//! let hash = handler
//!     .encrypt("secret", None, &HashOptions::new().with_rounds(5000))
//!     .unwrap();
//! assert!(handler.verify("secret", &hash, &HashOptions::new()).unwrap());
//! ```
//!
//! ## 线程与资源模型
//!
//! 库本身是纯计算、无内部可变共享状态（唯一例外是 backend 选择的
//! 一次性记忆化）。派生函数按设计是 CPU 密集的，代价由创建哈希时的
//! rounds 设置控制；需要低延迟的调用方应把哈希调用移到工作线程。

pub mod backend;
pub mod codec;
pub mod compare;
pub mod context;
pub mod crypto;
pub mod error;
pub mod handler;
pub mod hash;
pub mod random;

pub use error::{Error, Result};

// ============================================================================
// 核心类型导出
// ============================================================================

pub use context::{default_context, CryptContext};
pub use handler::{
    HashOptions, HashRecord, ParseMode, Rounds, RoundsCost, RoundsPreset, SchemeHandler,
};

// ============================================================================
// 便捷函数导出
// ============================================================================

pub use compare::{constant_time_compare, constant_time_compare_str};
pub use context::{encrypt, identify, verify};
