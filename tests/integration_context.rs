//! CryptContext 集成测试
//!
//! 覆盖跨方案识别、默认方案、prior hash 调度与错误路径。

use passrs::context::{default_context, CryptContext};
use passrs::handler::HashOptions;
use passrs::Error;

/// 识别按注册顺序返回第一个匹配方案
#[test]
fn test_identify_in_registration_order() {
    let ctx = CryptContext::of_names(&["md5-crypt", "sha512-crypt"]).unwrap();
    assert_eq!(ctx.identify("$1$abc$..."), Some("md5-crypt"));
    assert_eq!(
        ctx.identify("$1$2xYRz6ta$IWpg/auAdyc8.CyZ0K6QK/"),
        Some("md5-crypt")
    );
    assert_eq!(ctx.identify("not-a-hash"), None);
}

/// 默认方案是第一个注册的 handler
#[test]
fn test_encrypt_uses_first_handler_by_default() {
    let ctx = CryptContext::of_names(&["md5-crypt", "sha256-crypt"]).unwrap();
    let hash = ctx.encrypt("secret", None, None, &HashOptions::new()).unwrap();
    assert!(hash.starts_with("$1$"));
}

/// 显式 alg 优先于 prior hash 的方案
#[test]
fn test_explicit_alg_overrides_prior() {
    let ctx = CryptContext::of_names(&["md5-crypt", "sha256-crypt"]).unwrap();
    let md5_hash = ctx
        .encrypt("secret", None, Some("md5-crypt"), &HashOptions::new())
        .unwrap();
    let hash = ctx
        .encrypt(
            "secret",
            Some(&md5_hash),
            Some("sha256-crypt"),
            &HashOptions::new().with_rounds(1000),
        )
        .unwrap();
    assert!(hash.starts_with("$5$"));
}

/// prior hash 决定方案并继承设置
#[test]
fn test_prior_hash_resolves_scheme() {
    let ctx = CryptContext::of_names(&["sha256-crypt", "md5-crypt"]).unwrap();
    let legacy = ctx
        .encrypt("secret", None, Some("md5-crypt"), &HashOptions::new())
        .unwrap();
    // 未指定 alg 时沿用 prior 的方案，而不是默认方案
    let rehash = ctx
        .encrypt("secret", Some(&legacy), None, &HashOptions::new())
        .unwrap();
    assert!(rehash.starts_with("$1$"));
}

/// keep_salt 流程穿过 context 逐字节重现哈希
#[test]
fn test_context_keep_salt_reproduces() {
    let ctx = CryptContext::of_names(&["sha512-crypt", "md5-crypt"]).unwrap();
    let hash = ctx
        .encrypt("secret", None, None, &HashOptions::new().with_rounds(1000))
        .unwrap();
    let again = ctx
        .encrypt("secret", Some(&hash), None, &HashOptions::new().keep_salt(true))
        .unwrap();
    assert_eq!(again, hash);
}

/// verify 自动识别方案
#[test]
fn test_verify_autodetects_scheme() {
    let ctx = CryptContext::of_names(&["sha256-crypt", "md5-crypt", "des-crypt"]).unwrap();
    let hash = ctx
        .encrypt(
            "too many secrets",
            None,
            Some("md5-crypt"),
            &HashOptions::new(),
        )
        .unwrap();
    assert!(ctx.verify("too many secrets", &hash, None).unwrap());
    assert!(!ctx.verify("too many socks", &hash, None).unwrap());
}

/// verify 对无法识别的哈希是硬错误，绝不回落默认方案
#[test]
fn test_verify_requires_resolution() {
    let ctx = CryptContext::of_names(&["md5-crypt"]).unwrap();
    let err = ctx.verify("secret", "$9$unknown$format", None).unwrap_err();
    assert!(matches!(err, Error::UnsupportedScheme(_)));
}

/// encrypt 指定未注册的方案名报错
#[test]
fn test_unknown_alg_rejected() {
    let ctx = CryptContext::of_names(&["md5-crypt"]).unwrap();
    let err = ctx
        .encrypt("secret", None, Some("bcrypt"), &HashOptions::new())
        .unwrap_err();
    assert!(matches!(err, Error::UnsupportedScheme(_)));
}

/// postgres-md5 的 user 上下文参数穿过 context
#[test]
fn test_context_kwds_pass_through() {
    let ctx = CryptContext::of_names(&["postgres-md5"]).unwrap();
    let options = HashOptions::new().with_user("postgres");
    let hash = ctx.encrypt("mypass", None, None, &options).unwrap();
    assert_eq!(hash, "md55fba2ea04fd36069d2574ea71c8efe9d");
    assert!(ctx.verify_with("mypass", &hash, None, &options).unwrap());
    // 缺少 user 参数报错而不是静默失败
    assert!(ctx.verify("mypass", &hash, None).is_err());
}

/// 默认 context 覆盖全部内建方案并能互相识别
#[test]
fn test_default_context_cross_identification() {
    let ctx = default_context();
    let cases = [
        ("$1$2xYRz6ta$IWpg/auAdyc8.CyZ0K6QK/", "md5-crypt"),
        ("$apr1$abcd$IWpg/auAdyc8.CyZ0K6QK/", "apr-md5-crypt"),
        (
            "$2a$05$CCCCCCCCCCCCCCCCCCCCC.E5YPO9kmyuRGyh0XouQYb4YMJKvyOeW",
            "bcrypt",
        ),
        (
            "$6$saltstring$svn8UoSVapNtMuq1ukKS4tPQd8iKwSMHWjl/O817G3uBnIFNjnQJuesI68u4OTLiBFdcbYEdFCoEOfaS35inz1",
            "sha512-crypt",
        ),
        ("$pbkdf2-sha256$6400$YWJjZA$YWJjZA", "pbkdf2-sha256"),
        ("grub.pbkdf2.sha512.10000.AABB.CCDD", "grub-pbkdf2-sha512"),
        ("md55fba2ea04fd36069d2574ea71c8efe9d", "postgres-md5"),
        ("*2470C0C06DEE42FD1618BB99005ADCA2EC9D1E19", "mysql-41"),
        ("5d2e19393cc5ef67", "mysql-323"),
        ("$3$$8846f7eaee8fb117ad06bdd830b7586c", "nthash"),
        ("$P$9IQRaTwmfeRo7ud9Fh4E2PdI0S3r.L0", "phpass"),
        ("abgOeLfPimXQo", "des-crypt"),
    ];
    for (hash, expected) in cases {
        assert_eq!(ctx.identify(hash), Some(expected), "hash {:?}", hash);
    }
    assert_eq!(ctx.identify(""), None);
    assert_eq!(ctx.identify("not-a-hash"), None);
}
