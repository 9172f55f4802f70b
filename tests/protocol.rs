// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

use routeros_fleet::{FailureClass, RetryPolicy, RouterOsError, Transition, classify, encode_length};
use std::time::Duration;

#[test]
fn test_encode_length_prefix_widths() {
    assert_eq!(encode_length(0), vec![0x00]);
    assert_eq!(encode_length(0x7F), vec![0x7F]);
    assert_eq!(encode_length(0x80), vec![0x80, 0x80]);
    assert_eq!(encode_length(0x3FFF), vec![0xBF, 0xFF]);
    assert_eq!(encode_length(0x4000), vec![0xC0, 0x40, 0x00]);
    assert_eq!(encode_length(0x0020_0000), vec![0xE0, 0x20, 0x00, 0x00]);
    assert_eq!(encode_length(0x1000_0000).len(), 5);
}

#[test]
fn test_word_lengths_for_typical_commands() {
    // "/system/resource/print" and "=name=router-1"
    assert_eq!(encode_length("/system/resource/print".len()), vec![22]);
    assert_eq!(encode_length("=name=router-1".len()), vec![14]);
}

#[test]
fn test_classification_drives_retry_decision() {
    let policy = RetryPolicy::new(Duration::from_secs(10), 2, Duration::from_secs(1));

    let refused = RouterOsError::Io(std::io::Error::new(
        std::io::ErrorKind::ConnectionRefused,
        "connection refused",
    ));
    assert_eq!(classify(&refused), FailureClass::Network);
    assert_eq!(
        policy.after_failure(0, classify(&refused)),
        Transition::Retry(Duration::from_secs(1))
    );
    assert_eq!(
        policy.after_failure(1, classify(&refused)),
        Transition::Retry(Duration::from_secs(2))
    );
    assert_eq!(policy.after_failure(2, classify(&refused)), Transition::GiveUp);

    let login = RouterOsError::Login("invalid user name or password".to_string());
    assert_eq!(classify(&login), FailureClass::Auth);
    assert_eq!(policy.after_failure(0, classify(&login)), Transition::GiveUp);

    let resolve = RouterOsError::Resolve {
        host: "nope.invalid".to_string(),
        message: "failed to lookup address information".to_string(),
    };
    assert_eq!(classify(&resolve), FailureClass::Dns);
    assert_eq!(policy.after_failure(0, classify(&resolve)), Transition::GiveUp);
}
