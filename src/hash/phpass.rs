//! PHPass portable 哈希（`$P$` / `$H$`）
//!
//! WordPress / phpBB 等 PHP 应用使用的 MD5 迭代方案。单个 hash64
//! 字符编码 log2 轮数（7-30，默认 9），8 个 hash64 盐值字符，
//! 22 个小端 hash64 校验和字符。

use md5::{Digest, Md5};

use crate::backend::{Backend, BackendSet, ComputeParams};
use crate::codec::{self, HASH64_CHARS};
use crate::error::{Error, Result};
use crate::handler::{
    HashRecord, ParseMode, RoundsCost, RoundsPolicy, SaltAlphabet, SaltPolicy, Scheme,
    SchemeDescriptor, SchemeHandler,
};

const NAME: &str = "phpass";

static DESCRIPTOR: SchemeDescriptor = SchemeDescriptor {
    name: NAME,
    aliases: &["phpass_portable", "portable-hash"],
    idents: &["P", "H"],
    default_ident: "P",
    salt: SaltPolicy {
        min_len: 8,
        max_len: 8,
        default_len: 8,
        alphabet: SaltAlphabet::Hash64,
    },
    rounds: Some(RoundsPolicy {
        min: 7,
        max: 30,
        default: 9,
        cost: RoundsCost::Log2,
        presets: None,
    }),
    checksum_len: 22,
};

struct Phpass;

impl Scheme for Phpass {
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
        if !(7..=30).contains(&rounds) {
            return Err(Error::setting(
                NAME,
                format!("rounds {} outside 7..=30", rounds),
            ));
        }
        let checksum = match chk {
            Some(chk) => Some(chk.as_bytes().to_vec()),
            None => {
                if mode == ParseMode::Strict {
                    return Err(Error::missing_digest(NAME));
                }
                None
            }
        };
        Ok(HashRecord {
            ident: ident.to_string(),
            salt: salt.as_bytes().to_vec(),
            rounds: Some(rounds),
            checksum,
        })
    }

    fn format(&self, record: &HashRecord) -> String {
        let rounds = record.rounds.unwrap_or(9);
        let mut out = format!(
            "${}${}{}",
            record.ident,
            codec::h64_encode_6bit(rounds as u8) as char,
            String::from_utf8_lossy(&record.salt),
        );
        if let Some(chk) = &record.checksum {
            out.push_str(&String::from_utf8_lossy(chk));
        }
        out
    }
}

impl Phpass {
    /// 拆出 ident、log2 轮数、盐值与可选校验和
    fn parse_parts<'a>(&self, hash: &'a str) -> Option<(&'a str, u32, &'a str, Option<&'a str>)> {
        let rest = hash.strip_prefix('$')?;
        let (ident, rest) = rest.split_once('$')?;
        if ident != "P" && ident != "H" {
            return None;
        }
        let rounds = codec::h64_decode_6bit(*rest.as_bytes().first()?)? as u32;
        let rest = &rest[1..];
        if rest.len() != 8 && rest.len() != 30 {
            return None;
        }
        if !codec::in_alphabet(rest.as_bytes(), HASH64_CHARS) {
            return None;
        }
        let (salt, chk) = rest.split_at(8);
        let chk = if chk.is_empty() { None } else { Some(chk) };
        Some((ident, rounds, salt, chk))
    }
}

fn compute(params: &ComputeParams<'_>) -> Result<Vec<u8>> {
    let rounds = params.record.rounds.unwrap_or(9);
    let mut digest: [u8; 16] = {
        let mut h = Md5::new();
        h.update(&params.record.salt);
        h.update(params.secret);
        h.finalize().into()
    };
    for _ in 0..1u64 << rounds {
        let mut h = Md5::new();
        h.update(digest);
        h.update(params.secret);
        digest = h.finalize().into();
    }
    Ok(codec::h64_encode_le(&digest))
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

/// 构造 phpass handler
pub fn handler() -> SchemeHandler {
    SchemeHandler::new(Box::new(Phpass), &BACKENDS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::HashOptions;

    #[test]
    fn test_phpass_reference_vector() {
        // phpass 0.3 发布包自带的测试向量
        let h = handler();
        let hash = "$P$9IQRaTwmfeRo7ud9Fh4E2PdI0S3r.L0";
        assert!(h.verify("test12345", hash, &HashOptions::new()).unwrap());
        assert!(!h.verify("test12346", hash, &HashOptions::new()).unwrap());
    }

    #[test]
    fn test_rounds_char_encoding() {
        let h = handler();
        let hash = h
            .encrypt(
                "secret",
                None,
                &HashOptions::new().with_rounds(11).with_salt(b"saltsalt".to_vec()),
            )
            .unwrap();
        // 11 -> '9' in hash64
        assert!(hash.starts_with("$P$9saltsalt"));
        let record = h.parse(&hash, ParseMode::Strict).unwrap();
        assert_eq!(record.rounds, Some(11));
        assert_eq!(h.format(&record), hash);
    }

    #[test]
    fn test_rounds_bounds() {
        let h = handler();
        assert!(h
            .encrypt("x", None, &HashOptions::new().with_rounds(6))
            .is_err());
        assert!(h
            .encrypt("x", None, &HashOptions::new().with_rounds(31))
            .is_err());
    }

    #[test]
    fn test_h_ident() {
        let h = handler();
        let hash = h
            .encrypt("secret", None, &HashOptions::new().with_ident("H"))
            .unwrap();
        assert!(hash.starts_with("$H$"));
        assert!(h.verify("secret", &hash, &HashOptions::new()).unwrap());
    }

    #[test]
    fn test_identify() {
        let h = handler();
        assert!(h.identify("$P$9IQRaTwmfeRo7ud9Fh4E2PdI0S3r.L0"));
        assert!(h.identify("$H$9IQRaTwmfeRo7ud9Fh4E2PdI0S3r.L0"));
        assert!(!h.identify("$Q$9IQRaTwmfeRo7ud9Fh4E2PdI0S3r.L0"));
        assert!(!h.identify("$P$9short"));
    }
}
