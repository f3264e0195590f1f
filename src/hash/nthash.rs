//! Windows NT 口令哈希（nthash）
//!
//! MD4 over UTF-16-LE，无盐。unix 侧常见两种写法：`$3$$<32 hex>`
//! 与 `$NT$<32 hex>`，ident 在解析与渲染之间保持不变。

use md4::{Digest, Md4};

use crate::backend::{Backend, BackendSet, ComputeParams};
use crate::codec;
use crate::error::{Error, Result};
use crate::handler::{
    HashRecord, ParseMode, SaltPolicy, Scheme, SchemeDescriptor, SchemeHandler,
};

const NAME: &str = "nthash";

static DESCRIPTOR: SchemeDescriptor = SchemeDescriptor {
    name: NAME,
    aliases: &["nt", "ntlm"],
    idents: &["3", "NT"],
    default_ident: "3",
    salt: SaltPolicy::NONE,
    rounds: None,
    checksum_len: 16,
};

struct NtHash;

impl Scheme for NtHash {
    fn descriptor(&self) -> &SchemeDescriptor {
        &DESCRIPTOR
    }

    fn identify(&self, hash: &str) -> bool {
        matches!(self.parse_parts(hash), Some((_, digest)) if !digest.is_empty())
    }

    fn parse(&self, hash: &str, mode: ParseMode) -> Result<HashRecord> {
        let (ident, digest) = self
            .parse_parts(hash)
            .ok_or_else(|| Error::malformed(NAME, "does not match scheme layout"))?;
        let checksum = if digest.is_empty() {
            if mode == ParseMode::Strict {
                return Err(Error::missing_digest(NAME));
            }
            None
        } else {
            Some(
                codec::hex_decode(digest)
                    .ok_or_else(|| Error::malformed(NAME, "invalid hex characters"))?,
            )
        };
        Ok(HashRecord {
            ident: ident.to_string(),
            salt: Vec::new(),
            rounds: None,
            checksum,
        })
    }

    fn format(&self, record: &HashRecord) -> String {
        let digest = record
            .checksum
            .as_ref()
            .map(|chk| codec::hex_encode_lower(chk))
            .unwrap_or_default();
        if record.ident == "NT" {
            format!("$NT${}", digest)
        } else {
            format!("$3$${}", digest)
        }
    }
}

impl NtHash {
    /// 拆出 ident 与摘要部分；digest 可为空（配置形式）
    fn parse_parts<'a>(&self, hash: &'a str) -> Option<(&'a str, &'a str)> {
        let (ident, digest) = if let Some(rest) = hash.strip_prefix("$3$$") {
            ("3", rest)
        } else if let Some(rest) = hash.strip_prefix("$NT$") {
            ("NT", rest)
        } else {
            return None;
        };
        if digest.is_empty() {
            return Some((ident, digest));
        }
        if digest.len() != 32 || !digest.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        Some((ident, digest))
    }
}

fn compute(params: &ComputeParams<'_>) -> Result<Vec<u8>> {
    let secret = std::str::from_utf8(params.secret)
        .map_err(|_| Error::setting(NAME, "secret is not UTF-8"))?;
    let mut h = Md4::new();
    for unit in secret.encode_utf16() {
        h.update(unit.to_le_bytes());
    }
    Ok(h.finalize().to_vec())
}

fn probe() -> bool {
    true
}

static BACKENDS: BackendSet = BackendSet::new(
    NAME,
    &[Backend {
        name: "builtin",
        probe,
        compute,
    }],
);

/// 构造 nthash handler
pub fn handler() -> SchemeHandler {
    SchemeHandler::new(Box::new(NtHash), &BACKENDS)
}
