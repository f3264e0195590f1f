//! MS-SQL 口令哈希（2000 / 2005）
//!
//! 固定宽度格式：`0x0100` 前缀 + 8 个十六进制盐值字符 + 校验和。
//! 口令按 UTF-16-LE 编码后与 4 字节盐值一起做 SHA-1。
//!
//! 2000 版存两段校验和（原口令 + 大写口令），验证时只比较大写
//! 口令对应的那一半，口令检查因此是大小写不敏感的；2005 版只存
//! 原口令一段。输入的十六进制大小写不敏感，输出固定大写。

use sha1::{Digest, Sha1};

use crate::backend::{Backend, BackendSet, ComputeParams};
use crate::codec;
use crate::compare::constant_time_compare;
use crate::error::{Error, Result};
use crate::handler::{
    HashRecord, ParseMode, SaltAlphabet, SaltPolicy, Scheme, SchemeDescriptor, SchemeHandler,
};

const PREFIX: &str = "0x0100";

static MSSQL2000_DESCRIPTOR: SchemeDescriptor = SchemeDescriptor {
    name: "mssql2000",
    aliases: &["mssql_2000"],
    idents: &["0100"],
    default_ident: "0100",
    salt: SaltPolicy {
        min_len: 4,
        max_len: 4,
        default_len: 4,
        alphabet: SaltAlphabet::Raw,
    },
    rounds: None,
    checksum_len: 40,
};

static MSSQL2005_DESCRIPTOR: SchemeDescriptor = SchemeDescriptor {
    name: "mssql2005",
    aliases: &["mssql_2005"],
    idents: &["0100"],
    default_ident: "0100",
    salt: SaltPolicy {
        min_len: 4,
        max_len: 4,
        default_len: 4,
        alphabet: SaltAlphabet::Raw,
    },
    rounds: None,
    checksum_len: 20,
};

/// sha1(utf16le(secret) + salt)
fn raw_mssql(secret: &str, salt: &[u8]) -> [u8; 20] {
    let mut h = Sha1::new();
    for unit in secret.encode_utf16() {
        h.update(unit.to_le_bytes());
    }
    h.update(salt);
    h.finalize().into()
}

fn secret_str<'a>(params: &'a ComputeParams<'_>, name: &'static str) -> Result<&'a str> {
    std::str::from_utf8(params.secret).map_err(|_| Error::setting(name, "secret is not UTF-8"))
}

struct Mssql {
    descriptor: &'static SchemeDescriptor,
}

impl Scheme for Mssql {
    fn descriptor(&self) -> &SchemeDescriptor {
        self.descriptor
    }

    fn identify(&self, hash: &str) -> bool {
        hash.len() == self.full_len() && hash.starts_with(PREFIX)
    }

    fn parse(&self, hash: &str, mode: ParseMode) -> Result<HashRecord> {
        let name = self.descriptor.name;
        let rest = hash
            .strip_prefix(PREFIX)
            .ok_or_else(|| Error::malformed(name, "missing 0x0100 prefix"))?;
        if rest.len() != 8 && rest.len() != 8 + self.descriptor.checksum_len * 2 {
            return Err(Error::malformed(name, "unexpected length"));
        }
        let data = codec::hex_decode(rest)
            .ok_or_else(|| Error::malformed(name, "invalid hex characters"))?;
        let salt = data[..4].to_vec();
        let checksum = if data.len() > 4 {
            Some(data[4..].to_vec())
        } else {
            if mode == ParseMode::Strict {
                return Err(Error::missing_digest(name));
            }
            None
        };
        Ok(HashRecord {
            ident: "0100".to_string(),
            salt,
            rounds: None,
            checksum,
        })
    }

    fn format(&self, record: &HashRecord) -> String {
        let mut out = String::from(PREFIX);
        out.push_str(&codec::hex_encode_upper(&record.salt));
        if let Some(chk) = &record.checksum {
            out.push_str(&codec::hex_encode_upper(chk));
        }
        out
    }

    fn compare_checksum(&self, computed: &[u8], stored: &[u8]) -> bool {
        if self.descriptor.checksum_len == 40 {
            // 2000 版只比较大写口令对应的后半段
            if computed.len() != 40 || stored.len() != 40 {
                return false;
            }
            return constant_time_compare(&computed[20..], &stored[20..]);
        }
        constant_time_compare(computed, stored)
    }
}

impl Mssql {
    /// 完整哈希的字符总长：前缀 6 + 盐值 8 + 校验和十六进制宽度
    fn full_len(&self) -> usize {
        6 + 8 + self.descriptor.checksum_len * 2
    }
}

fn compute_2000(params: &ComputeParams<'_>) -> Result<Vec<u8>> {
    let secret = secret_str(params, "mssql2000")?;
    let salt = &params.record.salt;
    let mut out = Vec::with_capacity(40);
    out.extend_from_slice(&raw_mssql(secret, salt));
    out.extend_from_slice(&raw_mssql(&secret.to_uppercase(), salt));
    Ok(out)
}

fn compute_2005(params: &ComputeParams<'_>) -> Result<Vec<u8>> {
    let secret = secret_str(params, "mssql2005")?;
    Ok(raw_mssql(secret, &params.record.salt).to_vec())
}

fn probe() -> bool {
    true
}

static MSSQL2000_BACKENDS: BackendSet = BackendSet::new(
    "mssql2000",
    &[Backend {
        name: "builtin",
        probe,
        compute: compute_2000,
    }],
);

static MSSQL2005_BACKENDS: BackendSet = BackendSet::new(
    "mssql2005",
    &[Backend {
        name: "builtin",
        probe,
        compute: compute_2005,
    }],
);

/// 构造 mssql2000 handler
pub fn mssql2000_handler() -> SchemeHandler {
    SchemeHandler::new(
        Box::new(Mssql {
            descriptor: &MSSQL2000_DESCRIPTOR,
        }),
        &MSSQL2000_BACKENDS,
    )
}

/// 构造 mssql2005 handler
pub fn mssql2005_handler() -> SchemeHandler {
    SchemeHandler::new(
        Box::new(Mssql {
            descriptor: &MSSQL2005_DESCRIPTOR,
        }),
        &MSSQL2005_BACKENDS,
    )
}
