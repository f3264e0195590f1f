//! SHA crypt 方案（`$5$` sha256-crypt 与 `$6$` sha512-crypt）
//!
//! 按 SHA-crypt 规范实现（unix shadow 哈希 `$5$` / `$6$` 的算法），
//! 与 glibc 输出字节兼容。轮数为线性迭代数，省略 `rounds=` 段时
//! 隐含 5000，渲染时同样省略以保持逐字节的往返一致。
//!
//! 该族方案保留原实现的三档预设轮数（fast / medium / slow）。

use sha2::{Digest, Sha256, Sha512};

use crate::backend::{Backend, BackendSet, ComputeParams};
use crate::codec::{self, HASH64_CHARS};
use crate::error::{Error, Result};
use crate::handler::{
    HashRecord, ParseMode, RoundsCost, RoundsPolicy, RoundsPresets, SaltAlphabet, SaltPolicy,
    Scheme, SchemeDescriptor, SchemeHandler,
};

/// 省略 rounds= 段时的隐含轮数
const IMPLICIT_ROUNDS: u32 = 5000;

static SHA256_DESCRIPTOR: SchemeDescriptor = SchemeDescriptor {
    name: "sha256-crypt",
    aliases: &["sha256_crypt", "sha-256-crypt"],
    idents: &["5"],
    default_ident: "5",
    salt: SaltPolicy {
        min_len: 0,
        max_len: 16,
        default_len: 16,
        alphabet: SaltAlphabet::Hash64,
    },
    rounds: Some(RoundsPolicy {
        min: 1000,
        max: 999_999_999,
        default: 117_000,
        cost: RoundsCost::Linear,
        presets: Some(RoundsPresets {
            fast: 39_000,
            medium: 117_000,
            slow: 234_000,
        }),
    }),
    checksum_len: 43,
};

static SHA512_DESCRIPTOR: SchemeDescriptor = SchemeDescriptor {
    name: "sha512-crypt",
    aliases: &["sha512_crypt", "sha-512-crypt"],
    idents: &["6"],
    default_ident: "6",
    salt: SaltPolicy {
        min_len: 0,
        max_len: 16,
        default_len: 16,
        alphabet: SaltAlphabet::Hash64,
    },
    rounds: Some(RoundsPolicy {
        min: 1000,
        max: 999_999_999,
        default: 117_000,
        cost: RoundsCost::Linear,
        presets: Some(RoundsPresets {
            fast: 39_000,
            medium: 117_000,
            slow: 234_000,
        }),
    }),
    checksum_len: 86,
};

/// 重复 source 直到凑满 len 字节
fn extend(source: &[u8], len: usize) -> Vec<u8> {
    source.iter().copied().cycle().take(len).collect()
}

/// SHA crypt 核心，对摘要类型泛化
fn sha_crypt_raw<D: Digest>(secret: &[u8], salt: &[u8], rounds: u32) -> Vec<u8> {
    let mut b = D::new();
    b.update(secret);
    b.update(salt);
    b.update(secret);
    let b_digest = b.finalize();

    let mut a = D::new();
    a.update(secret);
    a.update(salt);
    a.update(extend(&b_digest, secret.len()));
    let mut length = secret.len();
    while length > 0 {
        if length & 1 == 1 {
            a.update(&b_digest);
        } else {
            a.update(secret);
        }
        length >>= 1;
    }
    let a_digest = a.finalize();

    let mut dp = D::new();
    for _ in 0..secret.len() {
        dp.update(secret);
    }
    let p_sequence = extend(&dp.finalize(), secret.len());

    let mut ds = D::new();
    for _ in 0..(16 + a_digest[0] as usize) {
        ds.update(salt);
    }
    let s_sequence = extend(&ds.finalize(), salt.len());

    let mut last: Vec<u8> = a_digest.to_vec();
    for i in 0..rounds {
        let mut c = D::new();
        if i % 2 == 1 {
            c.update(&p_sequence);
        } else {
            c.update(&last);
        }
        if i % 3 != 0 {
            c.update(&s_sequence);
        }
        if i % 7 != 0 {
            c.update(&p_sequence);
        }
        if i % 2 == 1 {
            c.update(&last);
        } else {
            c.update(&p_sequence);
        }
        last = c.finalize().to_vec();
    }
    last
}

/// sha256 变体的转置编码（32 字节 → 43 字符）
fn encode_sha256(digest: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(43);
    let (mut a, mut b, mut c) = (0usize, 10usize, 20usize);
    while a < 30 {
        codec::h64_encode_3_offsets(&mut out, digest, c, b, a);
        let next = (c + 1, a + 1, b + 1);
        a = next.0;
        b = next.1;
        c = next.2;
    }
    codec::h64_encode_2_offsets(&mut out, digest, 30, 31);
    out
}

/// sha512 变体的转置编码（64 字节 → 86 字符）
fn encode_sha512(digest: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(86);
    let (mut a, mut b, mut c) = (0usize, 21usize, 42usize);
    while c < 63 {
        codec::h64_encode_3_offsets(&mut out, digest, c, b, a);
        let next = (b + 1, c + 1, a + 1);
        a = next.0;
        b = next.1;
        c = next.2;
    }
    codec::h64_encode_1_offset(&mut out, digest, 63);
    out
}

struct ShaCrypt {
    descriptor: &'static SchemeDescriptor,
    prefix: &'static str,
}

impl Scheme for ShaCrypt {
    fn descriptor(&self) -> &SchemeDescriptor {
        self.descriptor
    }

    fn identify(&self, hash: &str) -> bool {
        // 快速结构检查：前缀 + 字符集（'=' 出现在 rounds= 段中）
        match hash.strip_prefix(self.prefix) {
            Some(rest) => rest
                .bytes()
                .all(|b| b == b'$' || b == b'=' || codec::h64_decode_6bit(b).is_some()),
            None => false,
        }
    }

    fn parse(&self, hash: &str, mode: ParseMode) -> Result<HashRecord> {
        let name = self.descriptor.name;
        let (rounds, salt, chk) = self
            .parse_parts(hash)
            .ok_or_else(|| Error::malformed(name, "does not match scheme layout"))?;
        let rounds = match rounds {
            Some(value) => {
                let policy = self.descriptor.rounds.as_ref().map(|r| (r.min, r.max));
                let (min, max) = policy.unwrap_or((u32::MIN, u32::MAX));
                if value < min || value > max {
                    if mode == ParseMode::Strict {
                        return Err(Error::setting(
                            name,
                            format!("rounds {} outside {}..={}", value, min, max),
                        ));
                    }
                    log::warn!(
                        "{}: rounds {} out of range, corrected to {}",
                        name,
                        value,
                        value.clamp(min, max)
                    );
                    Some(value.clamp(min, max))
                } else {
                    Some(value)
                }
            }
            None => None,
        };
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
            rounds,
            checksum,
        })
    }

    fn format(&self, record: &HashRecord) -> String {
        let mut out = String::from(self.prefix);
        if let Some(rounds) = record.rounds {
            out.push_str(&format!("rounds={}$", rounds));
        }
        out.push_str(&String::from_utf8_lossy(&record.salt));
        if let Some(chk) = &record.checksum {
            out.push('$');
            out.push_str(&String::from_utf8_lossy(chk));
        }
        out
    }
}

impl ShaCrypt {
    /// 拆出可选的显式轮数、盐值与可选的校验和
    fn parse_parts<'a>(&self, hash: &'a str) -> Option<(Option<u32>, &'a str, Option<&'a str>)> {
        let mut rest = hash.strip_prefix(self.prefix)?;
        let mut rounds = None;
        if let Some(tail) = rest.strip_prefix("rounds=") {
            let (value, tail) = tail.split_once('$')?;
            rounds = Some(codec::parse_canonical_u32(value)?);
            rest = tail;
        }
        let (salt, chk) = match rest.split_once('$') {
            Some((salt, chk)) => (salt, Some(chk)),
            None => (rest, None),
        };
        if salt.len() > 16 || !codec::in_alphabet(salt.as_bytes(), HASH64_CHARS) {
            return None;
        }
        if let Some(chk) = chk {
            if chk.len() != self.descriptor.checksum_len
                || !codec::in_alphabet(chk.as_bytes(), HASH64_CHARS)
            {
                return None;
            }
        }
        Some((rounds, salt, chk))
    }
}

fn compute_sha256(params: &ComputeParams<'_>) -> Result<Vec<u8>> {
    let rounds = params.record.rounds.unwrap_or(IMPLICIT_ROUNDS);
    let digest = sha_crypt_raw::<Sha256>(params.secret, &params.record.salt, rounds);
    Ok(encode_sha256(&digest))
}

fn compute_sha512(params: &ComputeParams<'_>) -> Result<Vec<u8>> {
    let rounds = params.record.rounds.unwrap_or(IMPLICIT_ROUNDS);
    let digest = sha_crypt_raw::<Sha512>(params.secret, &params.record.salt, rounds);
    Ok(encode_sha512(&digest))
}

fn probe() -> bool {
    true
}

static SHA256_BACKENDS: BackendSet = BackendSet::new(
    "sha256-crypt",
    &[Backend {
        name: "builtin",
        probe,
        compute: compute_sha256,
    }],
);

static SHA512_BACKENDS: BackendSet = BackendSet::new(
    "sha512-crypt",
    &[Backend {
        name: "builtin",
        probe,
        compute: compute_sha512,
    }],
);

/// 构造 sha256-crypt handler
pub fn sha256_handler() -> SchemeHandler {
    SchemeHandler::new(
        Box::new(ShaCrypt {
            descriptor: &SHA256_DESCRIPTOR,
            prefix: "$5$",
        }),
        &SHA256_BACKENDS,
    )
}

/// 构造 sha512-crypt handler
pub fn sha512_handler() -> SchemeHandler {
    SchemeHandler::new(
        Box::new(ShaCrypt {
            descriptor: &SHA512_DESCRIPTOR,
            prefix: "$6$",
        }),
        &SHA512_BACKENDS,
    )
}
