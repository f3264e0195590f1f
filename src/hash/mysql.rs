//! MySQL 口令哈希（3.23 OLD_PASSWORD 与 4.1 PASSWORD）
//!
//! 两者都是无盐方案，只应用于与 MySQL 交互或迁移遗留账户：
//!
//! - 3.23：16 个十六进制字符，自定义 32-bit 混合函数，口令中的
//!   空格与制表符被跳过
//! - 4.1：`*` + 40 个十六进制字符，sha1(sha1(secret))
//!
//! 输入的十六进制大小写不敏感；3.23 规范形式为小写，4.1 为大写。

use sha1::{Digest, Sha1};

use crate::backend::{Backend, BackendSet, ComputeParams};
use crate::codec;
use crate::error::{Error, Result};
use crate::handler::{
    HashRecord, ParseMode, SaltPolicy, Scheme, SchemeDescriptor, SchemeHandler,
};

static MYSQL323_DESCRIPTOR: SchemeDescriptor = SchemeDescriptor {
    name: "mysql-323",
    aliases: &["mysql_323", "mysql-old"],
    idents: &[""],
    default_ident: "",
    salt: SaltPolicy::NONE,
    rounds: None,
    checksum_len: 8,
};

static MYSQL41_DESCRIPTOR: SchemeDescriptor = SchemeDescriptor {
    name: "mysql-41",
    aliases: &["mysql_41"],
    idents: &["*"],
    default_ident: "*",
    salt: SaltPolicy::NONE,
    rounds: None,
    checksum_len: 20,
};

struct Mysql323;

impl Scheme for Mysql323 {
    fn descriptor(&self) -> &SchemeDescriptor {
        &MYSQL323_DESCRIPTOR
    }

    fn identify(&self, hash: &str) -> bool {
        hash.len() == 16 && hash.bytes().all(|b| b.is_ascii_hexdigit())
    }

    fn parse(&self, hash: &str, mode: ParseMode) -> Result<HashRecord> {
        let checksum = if hash.is_empty() {
            if mode == ParseMode::Strict {
                return Err(Error::missing_digest("mysql-323"));
            }
            None
        } else {
            if hash.len() != 16 {
                return Err(Error::malformed("mysql-323", "expected 16 hex characters"));
            }
            Some(
                codec::hex_decode(hash)
                    .ok_or_else(|| Error::malformed("mysql-323", "invalid hex characters"))?,
            )
        };
        Ok(HashRecord {
            ident: String::new(),
            salt: Vec::new(),
            rounds: None,
            checksum,
        })
    }

    fn format(&self, record: &HashRecord) -> String {
        match &record.checksum {
            Some(chk) => codec::hex_encode_lower(chk),
            None => String::new(),
        }
    }
}

struct Mysql41;

impl Scheme for Mysql41 {
    fn descriptor(&self) -> &SchemeDescriptor {
        &MYSQL41_DESCRIPTOR
    }

    fn identify(&self, hash: &str) -> bool {
        hash.len() == 41
            && hash.starts_with('*')
            && hash.as_bytes()[1..].iter().all(|b| b.is_ascii_hexdigit())
    }

    fn parse(&self, hash: &str, mode: ParseMode) -> Result<HashRecord> {
        let rest = hash
            .strip_prefix('*')
            .ok_or_else(|| Error::malformed("mysql-41", "missing * prefix"))?;
        let checksum = if rest.is_empty() {
            if mode == ParseMode::Strict {
                return Err(Error::missing_digest("mysql-41"));
            }
            None
        } else {
            if rest.len() != 40 {
                return Err(Error::malformed("mysql-41", "expected 40 hex characters"));
            }
            Some(
                codec::hex_decode(rest)
                    .ok_or_else(|| Error::malformed("mysql-41", "invalid hex characters"))?,
            )
        };
        Ok(HashRecord {
            ident: "*".to_string(),
            salt: Vec::new(),
            rounds: None,
            checksum,
        })
    }

    fn format(&self, record: &HashRecord) -> String {
        match &record.checksum {
            Some(chk) => format!("*{}", codec::hex_encode_upper(chk)),
            None => "*".to_string(),
        }
    }
}

fn compute_323(params: &ComputeParams<'_>) -> Result<Vec<u8>> {
    const MASK_32: u64 = 0xffff_ffff;
    const MASK_31: u64 = 0x7fff_ffff;

    let mut nr1: u64 = 0x5030_5735;
    let mut nr2: u64 = 0x1234_5671;
    let mut add: u64 = 7;
    for &byte in params.secret {
        if byte == b' ' || byte == b'\t' {
            continue;
        }
        let tmp = byte as u64;
        nr1 ^= (((nr1 & 63) + add) * tmp + (nr1 << 8)) & MASK_32;
        nr2 = (nr2 + ((nr2 << 8) ^ nr1)) & MASK_32;
        add = (add + tmp) & MASK_32;
    }
    let mut out = Vec::with_capacity(8);
    out.extend_from_slice(&(((nr1 & MASK_31) as u32).to_be_bytes()));
    out.extend_from_slice(&(((nr2 & MASK_31) as u32).to_be_bytes()));
    Ok(out)
}

fn compute_41(params: &ComputeParams<'_>) -> Result<Vec<u8>> {
    let inner = Sha1::digest(params.secret);
    Ok(Sha1::digest(inner).to_vec())
}

fn probe() -> bool {
    true
}

static MYSQL323_BACKENDS: BackendSet = BackendSet::new(
    "mysql-323",
    &[Backend {
        name: "builtin",
        probe,
        compute: compute_323,
    }],
);

static MYSQL41_BACKENDS: BackendSet = BackendSet::new(
    "mysql-41",
    &[Backend {
        name: "builtin",
        probe,
        compute: compute_41,
    }],
);

/// 构造 mysql-323 handler
pub fn mysql323_handler() -> SchemeHandler {
    SchemeHandler::new(Box::new(Mysql323), &MYSQL323_BACKENDS)
}

/// 构造 mysql-41 handler
pub fn mysql41_handler() -> SchemeHandler {
    SchemeHandler::new(Box::new(Mysql41), &MYSQL41_BACKENDS)
}
