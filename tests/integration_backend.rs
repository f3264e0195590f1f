//! Backend 选择集成测试
//!
//! 覆盖惰性探测、记忆化、按名强制与不可用错误路径。

use passrs::handler::HashOptions;
use passrs::hash::{bcrypt, des_crypt};
use passrs::Error;

/// 惰性选择在首次计算时发生，且结果进程内稳定
#[test]
fn test_lazy_selection_is_stable() {
    let handler = bcrypt::handler();
    let first = handler.active_backend().unwrap();
    let second = handler.active_backend().unwrap();
    assert_eq!(first, second);
    // bcrypt 声明的候选中必有一个通过已知答案探测
    assert!(first == "bcrypt" || first == "builtin");
}

/// 强制指定两个 bcrypt backend，计算结果必须一致
#[test]
fn test_forced_backends_agree() {
    let native = bcrypt::handler().with_backend("bcrypt").unwrap();
    let portable = bcrypt::handler().with_backend("builtin").unwrap();

    let options = HashOptions::new()
        .with_rounds(4)
        .with_salt(b"CCCCCCCCCCCCCCCCCCCCC.".to_vec());
    let a = native.encrypt("agreement", None, &options).unwrap();
    let b = portable.encrypt("agreement", None, &options).unwrap();
    assert_eq!(a, b);
}

/// 强制不存在的 backend 返回 BackendUnavailable
#[test]
fn test_force_unknown_backend_fails() {
    let err = bcrypt::handler().with_backend("os-crypt").unwrap_err();
    assert!(matches!(err, Error::BackendUnavailable { .. }));

    let err = des_crypt::handler().with_backend("no-such").unwrap_err();
    assert!(matches!(err, Error::BackendUnavailable { .. }));
}

/// 单 backend 方案直接选中 builtin
#[test]
fn test_single_backend_scheme() {
    let handler = des_crypt::handler();
    assert_eq!(handler.active_backend().unwrap(), "builtin");
}

/// 并发首次使用得到同一个选择结果
#[test]
fn test_concurrent_first_use() {
    let results: Vec<&'static str> = std::thread::scope(|scope| {
        (0..8)
            .map(|_| {
                scope.spawn(|| {
                    let handler = bcrypt::handler();
                    handler.active_backend().unwrap()
                })
            })
            .collect::<Vec<_>>()
            .into_iter()
            .map(|join| join.join().unwrap())
            .collect()
    });
    assert!(results.windows(2).all(|pair| pair[0] == pair[1]));
}

/// 强制 backend 不影响验证正确性
#[test]
fn test_forced_backend_verify() {
    let portable = bcrypt::handler().with_backend("builtin").unwrap();
    let hash = portable
        .encrypt("secret", None, &HashOptions::new().with_rounds(4))
        .unwrap();

    // 用默认选择的 handler 验证可移植 backend 生成的哈希
    let default = bcrypt::handler();
    assert!(default.verify("secret", &hash, &HashOptions::new()).unwrap());
}
