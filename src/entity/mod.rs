pub mod device;
pub mod issue;
pub mod size;

use humanize_rs::bytes;

use crate::errors::StorageError;

pub fn parse_human_bytes(s: &str) -> Result<bytes::Bytes, StorageError> {
    (s.trim().to_lowercase())
        .parse::<bytes::Bytes>()
        .map_err(|err| StorageError::BadSize(format!("bad byte unit string {s}: {err}")))
}

#[test]
#[rustfmt::skip]
fn test_parse_human_bytes() {
    let valids = vec![
        ("1kib", 1024), ("1 KiB", 1024), ("1KIB", 1024),
        ("1 k", 1000), ("1KB", 1000),
        ("10 MiB", 10 * 1024 * 1024),
        ("10 Gib", 10 * 1024 * 1024 * 1024),
        ("  2 GiB ", 2 * 1024 * 1024 * 1024),
        ("0 GiB", 0),
    ];

    for (s, expected) in valids {
        match parse_human_bytes(s) {
            Ok(bytes) => assert_eq!(bytes.size(), expected, "unexpected size for {s}"),
            Err(err) => panic!("{s} should be valid, but was invalid: {err}"),
        }
    }

    let invalids = vec![
        "GiB", "kib", "-1 GiB", "10.29 GiB", "kibibyte", "gigabytes", "2000EiB",
    ];

    for s in invalids {
        if let Ok(bytes) = parse_human_bytes(s) {
            panic!("{s} should be invalid, but got {bytes:?}");
        }
    }
}
