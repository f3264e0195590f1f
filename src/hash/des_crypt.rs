//! 传统 unix DES crypt 方案
//!
//! 线格式为 2 个 hash64 盐值字符紧跟 11 个 hash64 校验和字符，
//! 没有任何前缀。只应用于验证遗留哈希。
//!
//! 与 C 实现保持一致：口令中的 NUL 字节被拒绝，只有前 8 个字节
//! 参与密钥导出。

use crate::backend::{Backend, BackendSet, ComputeParams};
use crate::codec::{self, HASH64_CHARS};
use crate::compare::constant_time_compare;
use crate::crypto::des;
use crate::error::{Error, Result};
use crate::handler::{
    HashRecord, ParseMode, SaltAlphabet, SaltPolicy, Scheme, SchemeDescriptor, SchemeHandler,
};

const NAME: &str = "des-crypt";

static DESCRIPTOR: SchemeDescriptor = SchemeDescriptor {
    name: NAME,
    aliases: &["des_crypt", "unix-crypt"],
    idents: &[""],
    default_ident: "",
    salt: SaltPolicy {
        min_len: 2,
        max_len: 2,
        default_len: 2,
        alphabet: SaltAlphabet::Hash64,
    },
    rounds: None,
    checksum_len: 11,
};

struct DesCrypt;

impl Scheme for DesCrypt {
    fn descriptor(&self) -> &SchemeDescriptor {
        &DESCRIPTOR
    }

    fn identify(&self, hash: &str) -> bool {
        let bytes = hash.as_bytes();
        (bytes.len() == 2 || bytes.len() == 13) && codec::in_alphabet(bytes, HASH64_CHARS)
    }

    fn parse(&self, hash: &str, mode: ParseMode) -> Result<HashRecord> {
        let bytes = hash.as_bytes();
        if bytes.len() != 2 && bytes.len() != 13 {
            return Err(Error::malformed(NAME, "expected 2 or 13 characters"));
        }
        if !codec::in_alphabet(bytes, HASH64_CHARS) {
            return Err(Error::malformed(NAME, "invalid hash64 characters"));
        }
        let salt = bytes[..2].to_vec();
        let checksum = if bytes.len() == 13 {
            Some(bytes[2..].to_vec())
        } else {
            if mode == ParseMode::Strict {
                return Err(Error::missing_digest(NAME));
            }
            None
        };
        Ok(HashRecord {
            ident: String::new(),
            salt,
            rounds: None,
            checksum,
        })
    }

    fn format(&self, record: &HashRecord) -> String {
        let mut out = String::with_capacity(13);
        out.push_str(&String::from_utf8_lossy(&record.salt));
        if let Some(chk) = &record.checksum {
            out.push_str(&String::from_utf8_lossy(chk));
        }
        out
    }
}

fn compute(params: &ComputeParams<'_>) -> Result<Vec<u8>> {
    if params.secret.contains(&0) {
        return Err(Error::setting(NAME, "NUL byte in secret"));
    }
    let salt_value = codec::h64_decode_int12(&params.record.salt)
        .ok_or_else(|| Error::malformed(NAME, "invalid salt characters"))?;
    let key = des::secret_to_key(params.secret);
    let result = des::mdes_encrypt_int_block(key, 0, salt_value, 25);
    Ok(codec::h64_encode_int64(result).to_vec())
}

fn probe_builtin() -> bool {
    // crypt("test", "ab") == "abgOeLfPimXQo"
    let record = HashRecord::config("", b"ab".to_vec(), None);
    let params = ComputeParams {
        secret: b"test",
        record: &record,
        user: None,
    };
    match compute(&params) {
        Ok(chk) => constant_time_compare(&chk, b"gOeLfPimXQo"),
        Err(_) => false,
    }
}

static BACKENDS: BackendSet = BackendSet::new(
    NAME,
    &[Backend {
        name: "builtin",
        probe: probe_builtin,
        compute,
    }],
);

/// 构造 des-crypt handler
pub fn handler() -> SchemeHandler {
    SchemeHandler::new(Box::new(DesCrypt), &BACKENDS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::HashOptions;

    #[test]
    fn test_known_answer() {
        let h = handler();
        let hash = h.genhash("test", "ab", &HashOptions::new()).unwrap();
        assert_eq!(hash, "abgOeLfPimXQo");
    }

    #[test]
    fn test_verify_known_answer() {
        let h = handler();
        assert!(h.verify("test", "abgOeLfPimXQo", &HashOptions::new()).unwrap());
        assert!(!h.verify("xest", "abgOeLfPimXQo", &HashOptions::new()).unwrap());
    }

    #[test]
    fn test_identify() {
        let h = handler();
        assert!(h.identify("abgOeLfPimXQo"));
        assert!(h.identify("ab"));
        assert!(!h.identify("abgOeLfPimXQ"));
        assert!(!h.identify("$1$ab$cdefghijklm"));
    }

    #[test]
    fn test_strict_parse_requires_checksum() {
        let h = handler();
        let err = h.parse("ab", ParseMode::Strict).unwrap_err();
        assert!(matches!(err, Error::MissingDigest { .. }));
        assert!(h.parse("ab", ParseMode::Relaxed).unwrap().is_config());
    }

    #[test]
    fn test_roundtrip() {
        let h = handler();
        let record = h.parse("abgOeLfPimXQo", ParseMode::Strict).unwrap();
        assert_eq!(h.format(&record), "abgOeLfPimXQo");
    }

    #[test]
    fn test_nul_byte_rejected() {
        let h = handler();
        assert!(h.verify("te\0st", "abgOeLfPimXQo", &HashOptions::new()).is_err());
    }

    #[test]
    fn test_encrypt_fresh_salt() {
        let h = handler();
        let hash = h.encrypt("secret", None, &HashOptions::new()).unwrap();
        assert_eq!(hash.len(), 13);
        assert!(h.verify("secret", &hash, &HashOptions::new()).unwrap());
    }

    #[test]
    fn test_only_first_eight_chars_matter() {
        let h = handler();
        let hash = h.encrypt("12345678", None, &HashOptions::new()).unwrap();
        assert!(h.verify("12345678ignored", &hash, &HashOptions::new()).unwrap());
    }
}
