//! PBKDF2 系列方案
//!
//! 一个泛化 handler 覆盖 `$pbkdf2-sha1$` / `$pbkdf2-sha256$` /
//! `$pbkdf2-sha512$`（adapted base64 字段）以及 grub 的点分十六进制
//! 变体 `grub.pbkdf2.sha512.`。PRF 与字段编码是构造参数，不为每个
//! 变体生成独立的类型。
//!
//! 轮数为线性迭代数，禁止前导零等非规范写法。grub 变体的十六进制
//! 字段解析时大小写不敏感，输出固定为大写。

use pbkdf2::pbkdf2_hmac;
use sha1::Sha1;
use sha2::{Sha256, Sha512};

use crate::backend::{Backend, BackendSet, ComputeParams};
use crate::codec::{self, AB64};
use crate::error::{Error, Result};
use crate::handler::{
    HashRecord, ParseMode, RoundsCost, RoundsPolicy, SaltAlphabet, SaltPolicy, Scheme,
    SchemeDescriptor, SchemeHandler,
};

use base64::Engine;

const fn descriptor(
    name: &'static str,
    aliases: &'static [&'static str],
    idents: &'static [&'static str],
    default_salt: usize,
    default_rounds: u32,
    checksum_len: usize,
) -> SchemeDescriptor {
    SchemeDescriptor {
        name,
        aliases,
        idents,
        default_ident: idents[0],
        salt: SaltPolicy {
            min_len: 0,
            max_len: 1024,
            default_len: default_salt,
            alphabet: SaltAlphabet::Raw,
        },
        rounds: Some(RoundsPolicy {
            min: 1,
            max: u32::MAX,
            default: default_rounds,
            cost: RoundsCost::Linear,
            presets: None,
        }),
        checksum_len,
    }
}

static SHA1_DESCRIPTOR: SchemeDescriptor =
    descriptor("pbkdf2-sha1", &["pbkdf2_sha1"], &["pbkdf2-sha1"], 16, 6400, 20);

static SHA256_DESCRIPTOR: SchemeDescriptor = descriptor(
    "pbkdf2-sha256",
    &["pbkdf2_sha256"],
    &["pbkdf2-sha256"],
    16,
    6400,
    32,
);

static SHA512_DESCRIPTOR: SchemeDescriptor = descriptor(
    "pbkdf2-sha512",
    &["pbkdf2_sha512"],
    &["pbkdf2-sha512"],
    16,
    6400,
    64,
);

static GRUB_DESCRIPTOR: SchemeDescriptor = descriptor(
    "grub-pbkdf2-sha512",
    &["grub_pbkdf2_sha512"],
    &["grub.pbkdf2.sha512"],
    64,
    10_000,
    64,
);

/// 字段编码：adapted base64 或大写十六进制
#[derive(Clone, Copy, PartialEq, Eq)]
enum FieldCodec {
    Ab64,
    HexUpper,
}

struct Pbkdf2 {
    descriptor: &'static SchemeDescriptor,
    /// 完整前缀，如 `"$pbkdf2-sha256$"` 或 `"grub.pbkdf2.sha512."`
    prefix: &'static str,
    sep: char,
    field_codec: FieldCodec,
}

impl Scheme for Pbkdf2 {
    fn descriptor(&self) -> &SchemeDescriptor {
        self.descriptor
    }

    fn identify(&self, hash: &str) -> bool {
        hash.starts_with(self.prefix)
    }

    fn parse(&self, hash: &str, mode: ParseMode) -> Result<HashRecord> {
        let name = self.descriptor.name;
        let (rounds, salt, chk) = codec::split_mc3(hash, self.prefix, self.sep)
            .ok_or_else(|| Error::malformed(name, "does not match scheme layout"))?;
        let rounds = codec::parse_canonical_u32(rounds)
            .ok_or_else(|| Error::malformed(name, "non-canonical rounds field"))?;
        if rounds < 1 {
            return Err(Error::setting(name, "rounds must be at least 1"));
        }
        let salt = self
            .decode_field(salt)
            .ok_or_else(|| Error::malformed(name, "invalid salt encoding"))?;
        let checksum = match chk {
            Some(chk) if !chk.is_empty() => {
                let decoded = self
                    .decode_field(chk)
                    .ok_or_else(|| Error::malformed(name, "invalid checksum encoding"))?;
                if decoded.len() != self.descriptor.checksum_len {
                    return Err(Error::malformed(name, "checksum length mismatch"));
                }
                Some(decoded)
            }
            _ => {
                if mode == ParseMode::Strict {
                    return Err(Error::missing_digest(name));
                }
                None
            }
        };
        Ok(HashRecord {
            ident: self.descriptor.default_ident.to_string(),
            salt,
            rounds: Some(rounds),
            checksum,
        })
    }

    fn format(&self, record: &HashRecord) -> String {
        let rounds = record.rounds.unwrap_or(
            self.descriptor
                .rounds
                .as_ref()
                .map(|r| r.default)
                .unwrap_or(1),
        );
        let mut out = format!(
            "{}{}{}{}",
            self.prefix,
            rounds,
            self.sep,
            self.encode_field(&record.salt)
        );
        if let Some(chk) = &record.checksum {
            out.push(self.sep);
            out.push_str(&self.encode_field(chk));
        }
        out
    }
}

impl Pbkdf2 {
    fn decode_field(&self, text: &str) -> Option<Vec<u8>> {
        match self.field_codec {
            FieldCodec::Ab64 => AB64.decode(text).ok(),
            FieldCodec::HexUpper => codec::hex_decode(text),
        }
    }

    fn encode_field(&self, data: &[u8]) -> String {
        match self.field_codec {
            FieldCodec::Ab64 => AB64.encode(data),
            FieldCodec::HexUpper => codec::hex_encode_upper(data),
        }
    }
}

fn derive(prf: &str, params: &ComputeParams<'_>, length: usize) -> Result<Vec<u8>> {
    let rounds = match params.record.rounds {
        Some(rounds) => rounds,
        None => return Err(Error::setting("pbkdf2", "rounds not resolved")),
    };
    let mut out = vec![0u8; length];
    match prf {
        "hmac-sha1" => pbkdf2_hmac::<Sha1>(params.secret, &params.record.salt, rounds, &mut out),
        "hmac-sha256" => {
            pbkdf2_hmac::<Sha256>(params.secret, &params.record.salt, rounds, &mut out)
        }
        _ => pbkdf2_hmac::<Sha512>(params.secret, &params.record.salt, rounds, &mut out),
    }
    Ok(out)
}

fn compute_sha1(params: &ComputeParams<'_>) -> Result<Vec<u8>> {
    derive("hmac-sha1", params, 20)
}

fn compute_sha256(params: &ComputeParams<'_>) -> Result<Vec<u8>> {
    derive("hmac-sha256", params, 32)
}

fn compute_sha512(params: &ComputeParams<'_>) -> Result<Vec<u8>> {
    derive("hmac-sha512", params, 64)
}

fn probe() -> bool {
    true
}

static SHA1_BACKENDS: BackendSet = BackendSet::new(
    "pbkdf2-sha1",
    &[Backend {
        name: "builtin",
        probe,
        compute: compute_sha1,
    }],
);

static SHA256_BACKENDS: BackendSet = BackendSet::new(
    "pbkdf2-sha256",
    &[Backend {
        name: "builtin",
        probe,
        compute: compute_sha256,
    }],
);

static SHA512_BACKENDS: BackendSet = BackendSet::new(
    "pbkdf2-sha512",
    &[Backend {
        name: "builtin",
        probe,
        compute: compute_sha512,
    }],
);

static GRUB_BACKENDS: BackendSet = BackendSet::new(
    "grub-pbkdf2-sha512",
    &[Backend {
        name: "builtin",
        probe,
        compute: compute_sha512,
    }],
);

/// 构造 pbkdf2-sha1 handler
pub fn sha1_handler() -> SchemeHandler {
    SchemeHandler::new(
        Box::new(Pbkdf2 {
            descriptor: &SHA1_DESCRIPTOR,
            prefix: "$pbkdf2-sha1$",
            sep: '$',
            field_codec: FieldCodec::Ab64,
        }),
        &SHA1_BACKENDS,
    )
}

/// 构造 pbkdf2-sha256 handler
pub fn sha256_handler() -> SchemeHandler {
    SchemeHandler::new(
        Box::new(Pbkdf2 {
            descriptor: &SHA256_DESCRIPTOR,
            prefix: "$pbkdf2-sha256$",
            sep: '$',
            field_codec: FieldCodec::Ab64,
        }),
        &SHA256_BACKENDS,
    )
}

/// 构造 pbkdf2-sha512 handler
pub fn sha512_handler() -> SchemeHandler {
    SchemeHandler::new(
        Box::new(Pbkdf2 {
            descriptor: &SHA512_DESCRIPTOR,
            prefix: "$pbkdf2-sha512$",
            sep: '$',
            field_codec: FieldCodec::Ab64,
        }),
        &SHA512_BACKENDS,
    )
}

/// 构造 grub-pbkdf2-sha512 handler
pub fn grub_handler() -> SchemeHandler {
    SchemeHandler::new(
        Box::new(Pbkdf2 {
            descriptor: &GRUB_DESCRIPTOR,
            prefix: "grub.pbkdf2.sha512.",
            sep: '.',
            field_codec: FieldCodec::HexUpper,
        }),
        &GRUB_BACKENDS,
    )
}
