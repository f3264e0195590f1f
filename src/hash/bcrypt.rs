//! bcrypt 方案（`$2$` / `$2a$`）
//!
//! OpenBSD 的 Blowfish 口令哈希。轮数为 log2 代价（4-31，默认 12），
//! 22 个 bcrypt-base64 盐值字符紧跟 31 个校验和字符，中间没有分隔符。
//! 口令最多使用前 72 字节。
//!
//! 声明两个 backend：优先使用 `bcrypt` crate 的原生实现，回退到
//! 基于 `blowfish` crate 的可移植核心。两者都要先通过 OpenBSD
//! 已知答案向量的探测。

use base64::Engine;

use crate::backend::{Backend, BackendSet, ComputeParams};
use crate::codec::{self, BCRYPT64, BCRYPT64_CHARS};
use crate::compare::constant_time_compare;
use crate::crypto::bcrypt_blowfish;
use crate::error::{Error, Result};
use crate::handler::{
    HashRecord, ParseMode, RoundsCost, RoundsPolicy, SaltAlphabet, SaltPolicy, Scheme,
    SchemeDescriptor, SchemeHandler,
};

const NAME: &str = "bcrypt";

static DESCRIPTOR: SchemeDescriptor = SchemeDescriptor {
    name: NAME,
    aliases: &["bcrypt_2a"],
    idents: &["2", "2a"],
    default_ident: "2a",
    salt: SaltPolicy {
        min_len: 22,
        max_len: 22,
        default_len: 22,
        alphabet: SaltAlphabet::Bcrypt64,
    },
    rounds: Some(RoundsPolicy {
        min: 4,
        max: 31,
        default: 12,
        cost: RoundsCost::Log2,
        presets: None,
    }),
    checksum_len: 31,
};

struct Bcrypt;

impl Scheme for Bcrypt {
    fn descriptor(&self) -> &SchemeDescriptor {
        &DESCRIPTOR
    }

    fn identify(&self, hash: &str) -> bool {
        self.parse_parts(hash).is_some()
    }

    fn parse(&self, hash: &str, mode: ParseMode) -> Result<HashRecord> {
        let (ident, rounds, salt, chk) = self
            .parse_parts(hash)
            .ok_or_else(|| Error::malformed(NAME, "does not match scheme layout"))?;
        let checksum = match chk {
            Some(chk) => Some(chk.as_bytes().to_vec()),
            None => {
                if mode == ParseMode::Strict {
                    return Err(Error::missing_digest(NAME));
                }
                None
            }
        };
        if !(4..=31).contains(&rounds) {
            return Err(Error::setting(
                NAME,
                format!("rounds {} outside 4..=31", rounds),
            ));
        }
        Ok(HashRecord {
            ident: ident.to_string(),
            salt: salt.as_bytes().to_vec(),
            rounds: Some(rounds),
            checksum,
        })
    }

    fn format(&self, record: &HashRecord) -> String {
        let mut out = format!(
            "${}${:02}${}",
            record.ident,
            record.rounds.unwrap_or(DESCRIPTOR.rounds.as_ref().map(|r| r.default).unwrap_or(12)),
            String::from_utf8_lossy(&record.salt),
        );
        if let Some(chk) = &record.checksum {
            out.push_str(&String::from_utf8_lossy(chk));
        }
        out
    }
}

impl Bcrypt {
    /// 拆出 ident / 轮数 / 盐值 / 可选校验和；结构不符返回 None
    fn parse_parts<'a>(&self, hash: &'a str) -> Option<(&'a str, u32, &'a str, Option<&'a str>)> {
        let rest = hash.strip_prefix('$')?;
        let (ident, rest) = rest.split_once('$')?;
        if ident != "2" && ident != "2a" {
            return None;
        }
        let (rounds, rest) = rest.split_once('$')?;
        // 轮数固定两位数字，零填充是该方案的规范形式
        if rounds.len() != 2 || !rounds.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let rounds: u32 = rounds.parse().ok()?;
        if rest.len() != 22 && rest.len() != 53 {
            return None;
        }
        if !codec::in_alphabet(rest.as_bytes(), BCRYPT64_CHARS) {
            return None;
        }
        let (salt, chk) = rest.split_at(22);
        let chk = if chk.is_empty() { None } else { Some(chk) };
        Some((ident, rounds, salt, chk))
    }
}

fn decode_salt(record: &HashRecord) -> Result<[u8; 16]> {
    let decoded = BCRYPT64
        .decode(&record.salt)
        .map_err(|_| Error::malformed(NAME, "invalid salt encoding"))?;
    if decoded.len() != 16 {
        return Err(Error::malformed(NAME, "salt does not decode to 16 bytes"));
    }
    let mut salt = [0u8; 16];
    salt.copy_from_slice(&decoded);
    Ok(salt)
}

fn record_cost(record: &HashRecord) -> u32 {
    record.rounds.unwrap_or(12)
}

/// 原生 backend：`bcrypt` crate
fn compute_native(params: &ComputeParams<'_>) -> Result<Vec<u8>> {
    let salt = decode_salt(params.record)?;
    let cost = record_cost(params.record);
    let parts = bcrypt::hash_with_salt(params.secret, cost, salt)
        .map_err(|e| Error::setting(NAME, format!("bcrypt computation failed: {}", e)))?;
    let formatted = parts.format_for_version(bcrypt::Version::TwoA);
    // 校验和是末段 '$' 之后第 22 个字符起的 31 个字符
    let tail = formatted
        .rsplit('$')
        .next()
        .ok_or_else(|| Error::setting(NAME, "unexpected bcrypt output"))?;
    if tail.len() != 53 {
        return Err(Error::setting(NAME, "unexpected bcrypt output"));
    }
    Ok(tail.as_bytes()[22..].to_vec())
}

/// 可移植 backend：blowfish crate 上的 EksBlowfish 核心
fn compute_portable(params: &ComputeParams<'_>) -> Result<Vec<u8>> {
    let salt = decode_salt(params.record)?;
    let cost = record_cost(params.record);
    let checksum = bcrypt_blowfish::bcrypt_core(cost, &salt, params.secret);
    Ok(BCRYPT64.encode(checksum).into_bytes())
}

/// OpenBSD 测试套件向量: bcrypt("U*U", "$2a$05$CCCCCCCCCCCCCCCCCCCCC.")
fn probe_with(compute: fn(&ComputeParams<'_>) -> Result<Vec<u8>>) -> bool {
    let record = HashRecord::config("2a", b"CCCCCCCCCCCCCCCCCCCCC.".to_vec(), Some(5));
    let params = ComputeParams {
        secret: b"U*U",
        record: &record,
        user: None,
    };
    match compute(&params) {
        Ok(chk) => constant_time_compare(&chk, b"E5YPO9kmyuRGyh0XouQYb4YMJKvyOeW"),
        Err(_) => false,
    }
}

fn probe_native() -> bool {
    probe_with(compute_native)
}

fn probe_portable() -> bool {
    probe_with(compute_portable)
}

static BACKENDS: BackendSet = BackendSet::new(
    NAME,
    &[
        Backend {
            name: "bcrypt",
            probe: probe_native,
            compute: compute_native,
        },
        Backend {
            name: "builtin",
            probe: probe_portable,
            compute: compute_portable,
        },
    ],
);

/// 构造 bcrypt handler
pub fn handler() -> SchemeHandler {
    SchemeHandler::new(Box::new(Bcrypt), &BACKENDS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::HashOptions;

    const KAT_HASH: &str = "$2a$05$CCCCCCCCCCCCCCCCCCCCC.E5YPO9kmyuRGyh0XouQYb4YMJKvyOeW";

    #[test]
    fn test_known_answer_native() {
        let h = handler().with_backend("bcrypt").unwrap();
        assert!(h.verify("U*U", KAT_HASH, &HashOptions::new()).unwrap());
        assert!(!h.verify("U*V", KAT_HASH, &HashOptions::new()).unwrap());
    }

    #[test]
    fn test_known_answer_portable() {
        let h = handler().with_backend("builtin").unwrap();
        assert!(h.verify("U*U", KAT_HASH, &HashOptions::new()).unwrap());
    }

    #[test]
    fn test_backends_agree() {
        let native = handler().with_backend("bcrypt").unwrap();
        let portable = handler().with_backend("builtin").unwrap();
        let hash = native
            .encrypt("agreement", None, &HashOptions::new().with_rounds(4))
            .unwrap();
        assert!(portable.verify("agreement", &hash, &HashOptions::new()).unwrap());
    }

    #[test]
    fn test_identify() {
        let h = handler();
        assert!(h.identify(KAT_HASH));
        assert!(h.identify("$2$05$CCCCCCCCCCCCCCCCCCCCC."));
        assert!(!h.identify("$2b$05$CCCCCCCCCCCCCCCCCCCCC."));
        assert!(!h.identify("$2a$5$CCCCCCCCCCCCCCCCCCCCC."));
    }

    #[test]
    fn test_roundtrip() {
        let h = handler();
        let record = h.parse(KAT_HASH, ParseMode::Strict).unwrap();
        assert_eq!(record.rounds, Some(5));
        assert_eq!(record.ident, "2a");
        assert_eq!(h.format(&record), KAT_HASH);
    }

    #[test]
    fn test_rounds_bounds() {
        let h = handler();
        let err = h
            .encrypt("x", None, &HashOptions::new().with_rounds(3))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidSetting { .. }));
        let err = h
            .encrypt("x", None, &HashOptions::new().with_rounds(32))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidSetting { .. }));
    }

    #[test]
    fn test_ident_2_preserved() {
        let h = handler();
        let hash = h
            .encrypt(
                "secret",
                None,
                &HashOptions::new().with_ident("2").with_rounds(4),
            )
            .unwrap();
        assert!(hash.starts_with("$2$04$"));
        let again = h
            .encrypt("secret", Some(&hash), &HashOptions::new().keep_salt(true))
            .unwrap();
        assert_eq!(again, hash);
    }

    #[test]
    fn test_verify_published_vector() {
        let h = handler();
        assert!(h
            .verify(
                "too many secrets",
                "$2a$11$RvViwGZL./LkWfdGKTrgeO4khL/PDXKe0TayeVObQdoew7TFwhNFy",
                &HashOptions::new()
            )
            .unwrap());
    }
}
