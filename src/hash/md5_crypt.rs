//! MD5 crypt 方案（`$1$`）及 Apache 变体（`$apr1$`）
//!
//! 1990 年代 unix 系统广泛使用的口令哈希，固定 1000 轮迭代，
//! 0-8 个 hash64 盐值字符，22 个 hash64 校验和字符。
//! `$apr1$` 与 `$1$` 唯一的差别是注入摘要的魔数前缀。

use md5::{Digest, Md5};

use crate::backend::{Backend, BackendSet, ComputeParams};
use crate::codec::{self, HASH64_CHARS};
use crate::error::{Error, Result};
use crate::handler::{
    HashRecord, ParseMode, SaltAlphabet, SaltPolicy, Scheme, SchemeDescriptor, SchemeHandler,
};

static MD5_DESCRIPTOR: SchemeDescriptor = SchemeDescriptor {
    name: "md5-crypt",
    aliases: &["md5_crypt"],
    idents: &["1"],
    default_ident: "1",
    salt: SaltPolicy {
        min_len: 0,
        max_len: 8,
        default_len: 8,
        alphabet: SaltAlphabet::Hash64,
    },
    rounds: None,
    checksum_len: 22,
};

static APR1_DESCRIPTOR: SchemeDescriptor = SchemeDescriptor {
    name: "apr-md5-crypt",
    aliases: &["apr_md5_crypt", "apr1"],
    idents: &["apr1"],
    default_ident: "apr1",
    salt: SaltPolicy {
        min_len: 0,
        max_len: 8,
        default_len: 8,
        alphabet: SaltAlphabet::Hash64,
    },
    rounds: None,
    checksum_len: 22,
};

/// md5-crypt 核心：魔数区分 `$1$` 与 `$apr1$`
fn md5_crypt_raw(secret: &[u8], salt: &[u8], magic: &[u8]) -> [u8; 16] {
    let mut b = Md5::new();
    b.update(secret);
    b.update(salt);
    b.update(secret);
    let b_digest = b.finalize();

    let mut a = Md5::new();
    a.update(secret);
    a.update(magic);
    a.update(salt);
    let mut remaining = secret.len();
    while remaining > 0 {
        let take = remaining.min(16);
        a.update(&b_digest[..take]);
        remaining -= take;
    }
    let mut length = secret.len();
    while length > 0 {
        if length & 1 == 1 {
            a.update([0u8]);
        } else {
            a.update(&secret[..1]);
        }
        length >>= 1;
    }
    let mut digest: [u8; 16] = a.finalize().into();

    for i in 0..1000u32 {
        let mut h = Md5::new();
        if i & 1 == 1 {
            h.update(secret);
        } else {
            h.update(digest);
        }
        if i % 3 != 0 {
            h.update(salt);
        }
        if i % 7 != 0 {
            h.update(secret);
        }
        if i & 1 == 1 {
            h.update(digest);
        } else {
            h.update(secret);
        }
        digest = h.finalize().into();
    }
    digest
}

/// 把 16 字节摘要按 md5-crypt 的转置顺序编码为 22 个 hash64 字符
fn encode_checksum(digest: &[u8; 16]) -> Vec<u8> {
    let mut out = Vec::with_capacity(22);
    for &(o1, o2, o3) in &[(12, 6, 0), (13, 7, 1), (14, 8, 2), (15, 9, 3), (5, 10, 4)] {
        codec::h64_encode_3_offsets(&mut out, digest, o1, o2, o3);
    }
    codec::h64_encode_1_offset(&mut out, digest, 11);
    out
}

struct Md5Crypt {
    descriptor: &'static SchemeDescriptor,
    prefix: &'static str,
}

impl Scheme for Md5Crypt {
    fn descriptor(&self) -> &SchemeDescriptor {
        self.descriptor
    }

    fn identify(&self, hash: &str) -> bool {
        // 快速结构检查：前缀 + 字符集，不要求完整解析成功
        match hash.strip_prefix(self.prefix) {
            Some(rest) => rest
                .bytes()
                .all(|b| b == b'$' || codec::h64_decode_6bit(b).is_some()),
            None => false,
        }
    }

    fn parse(&self, hash: &str, mode: ParseMode) -> Result<HashRecord> {
        let name = self.descriptor.name;
        let (salt, chk) = self
            .parse_parts(hash)
            .ok_or_else(|| Error::malformed(name, "does not match scheme layout"))?;
        let checksum = match chk {
            Some(chk) => Some(chk.as_bytes().to_vec()),
            None => {
                if mode == ParseMode::Strict {
                    return Err(Error::missing_digest(name));
                }
                None
            }
        };
        Ok(HashRecord {
            ident: self.descriptor.default_ident.to_string(),
            salt: salt.as_bytes().to_vec(),
            rounds: None,
            checksum,
        })
    }

    fn format(&self, record: &HashRecord) -> String {
        let mut out = format!("{}{}", self.prefix, String::from_utf8_lossy(&record.salt));
        if let Some(chk) = &record.checksum {
            out.push('$');
            out.push_str(&String::from_utf8_lossy(chk));
        }
        out
    }
}

impl Md5Crypt {
    /// 拆出盐值与可选的校验和；结构不符返回 None
    fn parse_parts<'a>(&self, hash: &'a str) -> Option<(&'a str, Option<&'a str>)> {
        let rest = hash.strip_prefix(self.prefix)?;
        let (salt, chk) = match rest.split_once('$') {
            Some((salt, chk)) => (salt, Some(chk)),
            None => (rest, None),
        };
        if salt.len() > 8 || !codec::in_alphabet(salt.as_bytes(), HASH64_CHARS) {
            return None;
        }
        if let Some(chk) = chk {
            if chk.len() != 22 || !codec::in_alphabet(chk.as_bytes(), HASH64_CHARS) {
                return None;
            }
        }
        Some((salt, chk))
    }
}

fn compute_md5(params: &ComputeParams<'_>) -> Result<Vec<u8>> {
    let digest = md5_crypt_raw(params.secret, &params.record.salt, b"$1$");
    Ok(encode_checksum(&digest))
}

fn compute_apr1(params: &ComputeParams<'_>) -> Result<Vec<u8>> {
    let digest = md5_crypt_raw(params.secret, &params.record.salt, b"$apr1$");
    Ok(encode_checksum(&digest))
}

fn probe() -> bool {
    true
}

static MD5_BACKENDS: BackendSet = BackendSet::new(
    "md5-crypt",
    &[Backend {
        name: "builtin",
        probe,
        compute: compute_md5,
    }],
);

static APR1_BACKENDS: BackendSet = BackendSet::new(
    "apr-md5-crypt",
    &[Backend {
        name: "builtin",
        probe,
        compute: compute_apr1,
    }],
);

/// 构造 md5-crypt handler
pub fn handler() -> SchemeHandler {
    SchemeHandler::new(
        Box::new(Md5Crypt {
            descriptor: &MD5_DESCRIPTOR,
            prefix: "$1$",
        }),
        &MD5_BACKENDS,
    )
}

/// 构造 apr-md5-crypt handler
pub fn apr1_handler() -> SchemeHandler {
    SchemeHandler::new(
        Box::new(Md5Crypt {
            descriptor: &APR1_DESCRIPTOR,
            prefix: "$apr1$",
        }),
        &APR1_BACKENDS,
    )
}
