//! 方案级集成测试
//!
//! 覆盖各方案的线格式往返、确定性、verify 正确性与边界检查。

use passrs::handler::{HashOptions, ParseMode};
use passrs::hash::{bcrypt, des_crypt, md5_crypt, mssql, pbkdf2, sha_crypt};
use passrs::Error;

/// bcrypt 默认配置：$2a$12$ + 22 字符盐值 + 31 字符校验和
#[test]
fn test_bcrypt_default_shape() {
    let handler = bcrypt::handler();
    let hash = handler.encrypt("password", None, &HashOptions::new()).unwrap();

    assert!(hash.starts_with("$2a$12$"));
    assert_eq!(hash.len(), "$2a$12$".len() + 22 + 31);
    assert!(handler.verify("password", &hash, &HashOptions::new()).unwrap());
    assert!(!handler.verify("passward", &hash, &HashOptions::new()).unwrap());
}

/// pbkdf2-sha256 默认配置：6400 轮、16 字节盐值，重新解析恢复设置
#[test]
fn test_pbkdf2_sha256_default_shape() {
    let handler = pbkdf2::sha256_handler();
    let hash = handler.encrypt("password", None, &HashOptions::new()).unwrap();

    assert!(hash.starts_with("$pbkdf2-sha256$6400$"));
    let record = handler.parse(&hash, ParseMode::Strict).unwrap();
    assert_eq!(record.rounds, Some(6400));
    assert_eq!(record.salt.len(), 16);

    // 相同盐值下重复解析得到相同的盐字节
    let record2 = handler.parse(&hash, ParseMode::Strict).unwrap();
    assert_eq!(record.salt, record2.salt);
}

/// mssql2005 固定宽度格式的往返：输入大小写不敏感，输出大写
#[test]
fn test_mssql2005_fixed_width_roundtrip() {
    let handler = mssql::mssql2005_handler();
    let text = format!("0x0100{}{}", "0011AABB", "CD".repeat(20));

    let record = handler.parse(&text, ParseMode::Strict).unwrap();
    assert_eq!(handler.format(&record), text);

    let lower = format!("0x0100{}", text[6..].to_lowercase());
    let record = handler.parse(&lower, ParseMode::Strict).unwrap();
    assert_eq!(handler.format(&record), text);
}

/// keep_salt + prior hash 逐字节重现既有哈希
#[test]
fn test_keep_salt_reproduces_hash() {
    let cases: Vec<(passrs::SchemeHandler, HashOptions)> = vec![
        (bcrypt::handler(), HashOptions::new().with_rounds(4)),
        (sha_crypt::sha512_handler(), HashOptions::new().with_rounds(1000)),
        (md5_crypt::handler(), HashOptions::new()),
        (pbkdf2::sha1_handler(), HashOptions::new().with_rounds(10)),
    ];
    for (handler, options) in cases {
        let hash = handler.encrypt("same secret", None, &options).unwrap();
        let again = handler
            .encrypt("same secret", Some(&hash), &HashOptions::new().keep_salt(true))
            .unwrap();
        assert_eq!(again, hash, "scheme {}", handler.name());
    }
}

/// 不带 keep_salt 时 prior hash 只贡献设置，盐值重新生成
#[test]
fn test_prior_without_keep_salt_generates_new_salt() {
    let handler = sha_crypt::sha256_handler();
    let hash = handler
        .encrypt("secret", None, &HashOptions::new().with_rounds(1000))
        .unwrap();
    let again = handler
        .encrypt("secret", Some(&hash), &HashOptions::new())
        .unwrap();
    assert_ne!(again, hash);
    // 轮数设置被继承
    assert!(again.starts_with("$5$rounds=1000$"));
    assert!(handler.verify("secret", &again, &HashOptions::new()).unwrap());
}

/// genhash 对相同 secret 与 config 是确定性的
#[test]
fn test_genhash_deterministic() {
    let handler = sha_crypt::sha256_handler();
    let config = handler
        .genconfig(&HashOptions::new().with_rounds(1000))
        .unwrap();
    let a = handler.genhash("determinism", &config, &HashOptions::new()).unwrap();
    let b = handler.genhash("determinism", &config, &HashOptions::new()).unwrap();
    assert_eq!(a, b);
}

/// 严格模式下对配置字符串 verify 报 MissingDigest
#[test]
fn test_verify_config_string_fails() {
    let handler = pbkdf2::sha256_handler();
    let config = handler.genconfig(&HashOptions::new()).unwrap();
    let err = handler.verify("x", &config, &HashOptions::new()).unwrap_err();
    assert!(matches!(err, Error::MissingDigest { .. }));
}

/// 轮数边界在严格模式下强制执行
#[test]
fn test_rounds_boundaries_enforced() {
    let handler = sha_crypt::sha256_handler();
    let err = handler
        .encrypt("x", None, &HashOptions::new().with_rounds(999))
        .unwrap_err();
    assert!(matches!(err, Error::InvalidSetting { .. }));

    let err = handler
        .encrypt("x", None, &HashOptions::new().with_rounds(1_000_000_000))
        .unwrap_err();
    assert!(matches!(err, Error::InvalidSetting { .. }));
}

/// 盐值长度边界在严格模式下强制执行，宽松模式截断并继续
#[test]
fn test_salt_boundaries() {
    let handler = sha_crypt::sha256_handler();
    let long_salt = vec![b'a'; 17];

    let err = handler
        .encrypt(
            "x",
            None,
            &HashOptions::new().with_salt(long_salt.clone()).with_rounds(1000),
        )
        .unwrap_err();
    assert!(matches!(err, Error::InvalidSetting { .. }));

    let hash = handler
        .encrypt(
            "x",
            None,
            &HashOptions::new()
                .with_salt(long_salt)
                .with_rounds(1000)
                .relaxed(true),
        )
        .unwrap();
    // 修正为最长 16 个字符
    assert!(hash.starts_with("$5$rounds=1000$aaaaaaaaaaaaaaaa$"));
}

/// 盐值字母表约束
#[test]
fn test_salt_alphabet_enforced() {
    let handler = md5_crypt::handler();
    let err = handler
        .encrypt("x", None, &HashOptions::new().with_salt(b"bad salt".to_vec()))
        .unwrap_err();
    assert!(matches!(err, Error::InvalidSetting { .. }));
}

/// des-crypt 的 2 字符盐值约束
#[test]
fn test_des_crypt_salt_length() {
    let handler = des_crypt::handler();
    let err = handler
        .encrypt("x", None, &HashOptions::new().with_salt(b"abc".to_vec()))
        .unwrap_err();
    assert!(matches!(err, Error::InvalidSetting { .. }));

    let hash = handler
        .encrypt("x", None, &HashOptions::new().with_salt(b"ab".to_vec()))
        .unwrap();
    assert!(hash.starts_with("ab"));
}

/// 所有带轮数方案拒绝非规范的轮数编码
#[test]
fn test_non_canonical_rounds_rejected() {
    assert!(pbkdf2::sha256_handler()
        .parse("$pbkdf2-sha256$0064$YWJj$YWJj", ParseMode::Strict)
        .is_err());
    assert!(sha_crypt::sha512_handler()
        .parse("$6$rounds=0100000$salt", ParseMode::Relaxed)
        .is_err());
    assert!(pbkdf2::grub_handler()
        .parse("grub.pbkdf2.sha512.010000.AB.CD", ParseMode::Relaxed)
        .is_err());
}
