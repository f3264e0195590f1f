//! Postgres pg_shadow 使用的 MD5 口令哈希
//!
//! 格式为 `md5` + 32 个十六进制字符，摘要 = md5(secret ‖ user)。
//! 该方案没有盐值，用户名起盐的作用，因此 encrypt 与 verify 都
//! 必须通过 [`crate::handler::HashOptions::with_user`] 提供用户名
//! 上下文参数。只应用于与 Postgres 交互。

use md5::{Digest, Md5};

use crate::backend::{Backend, BackendSet, ComputeParams};
use crate::codec;
use crate::error::{Error, Result};
use crate::handler::{
    HashRecord, ParseMode, SaltPolicy, Scheme, SchemeDescriptor, SchemeHandler,
};

const NAME: &str = "postgres-md5";

static DESCRIPTOR: SchemeDescriptor = SchemeDescriptor {
    name: NAME,
    aliases: &["postgres_md5"],
    idents: &["md5"],
    default_ident: "md5",
    salt: SaltPolicy::NONE,
    rounds: None,
    checksum_len: 16,
};

struct PostgresMd5;

impl Scheme for PostgresMd5 {
    fn descriptor(&self) -> &SchemeDescriptor {
        &DESCRIPTOR
    }

    fn identify(&self, hash: &str) -> bool {
        hash.len() == 35
            && hash.starts_with("md5")
            && hash.as_bytes()[3..].iter().all(|b| b.is_ascii_hexdigit())
    }

    fn parse(&self, hash: &str, mode: ParseMode) -> Result<HashRecord> {
        let rest = hash
            .strip_prefix("md5")
            .ok_or_else(|| Error::malformed(NAME, "missing md5 prefix"))?;
        let checksum = if rest.is_empty() {
            if mode == ParseMode::Strict {
                return Err(Error::missing_digest(NAME));
            }
            None
        } else {
            if rest.len() != 32 {
                return Err(Error::malformed(NAME, "digest must be 32 hex characters"));
            }
            let digest = codec::hex_decode(rest)
                .ok_or_else(|| Error::malformed(NAME, "invalid hex characters"))?;
            Some(digest)
        };
        Ok(HashRecord {
            ident: "md5".to_string(),
            salt: Vec::new(),
            rounds: None,
            checksum,
        })
    }

    fn format(&self, record: &HashRecord) -> String {
        match &record.checksum {
            Some(chk) => format!("md5{}", codec::hex_encode_lower(chk)),
            None => "md5".to_string(),
        }
    }
}

fn compute(params: &ComputeParams<'_>) -> Result<Vec<u8>> {
    let user = params
        .user
        .ok_or_else(|| Error::setting(NAME, "user context parameter is required"))?;
    let mut h = Md5::new();
    h.update(params.secret);
    h.update(user.as_bytes());
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

/// 构造 postgres-md5 handler
pub fn handler() -> SchemeHandler {
    SchemeHandler::new(Box::new(PostgresMd5), &BACKENDS)
}
