use crate::config::Encryption;
use crate::entity::issue::{
    Issue,
    IssueKind,
};
use crate::system::System;

/// Checks the password, availability and suitability of the method.
/// Swap-only methods are suitable only for swap devices.
pub(super) fn check(encryption: &Encryption, system: &System, swap: bool) -> Vec<Issue> {
    let Some(method) = encryption.method else {
        return Vec::new();
    };

    let label = method.label();
    let mut issues = Vec::new();

    if encryption.missing_password() {
        issues.push(Issue::error(
            IssueKind::Encryption,
            format!("No passphrase provided (required for using the method '{label}')."),
        ));
    }

    if !system.method_available(method) {
        issues.push(Issue::error(
            IssueKind::Encryption,
            format!("Encryption method '{label}' is not available in this system."),
        ));
    }

    if method.only_for_swap() && !swap {
        issues.push(Issue::error(
            IssueKind::Encryption,
            format!("'{label}' is not a suitable method to encrypt the device."),
        ));
    }

    issues
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::device::EncryptionMethod;

    #[test]
    fn test_check_encryption() {
        struct TestCheckEncryption {
            encryption: Encryption,
            swap: bool,
            expected: Vec<&'static str>,
        }

        let tests = vec![
            TestCheckEncryption {
                encryption: Encryption {
                    password: Some("notsecret".into()),
                    ..Encryption::with_method(EncryptionMethod::Luks2)
                },
                swap: false,
                expected: vec![],
            },
            TestCheckEncryption {
                encryption: Encryption::with_method(EncryptionMethod::Luks1),
                swap: false,
                expected: vec!["No passphrase provided (required for using the method 'Regular LUKS1')."],
            },
            TestCheckEncryption {
                encryption: Encryption {
                    password: Some("notsecret".into()),
                    ..Encryption::with_method(EncryptionMethod::TpmFde)
                },
                swap: false,
                expected: vec!["Encryption method 'TPM-Based Full Disk Encrytion' is not available in this system."],
            },
            TestCheckEncryption {
                encryption: Encryption::with_method(EncryptionMethod::RandomSwap),
                swap: true,
                expected: vec![],
            },
            TestCheckEncryption {
                encryption: Encryption::with_method(EncryptionMethod::RandomSwap),
                swap: false,
                expected: vec!["'Encryption with Volatile Random Key' is not a suitable method to encrypt the device."],
            },
            TestCheckEncryption {
                encryption: Encryption::default(),
                swap: false,
                expected: vec![],
            },
        ];

        let system = System::default();
        for test in tests {
            let issues: Vec<String> = check(&test.encryption, &system, test.swap)
                .into_iter()
                .map(|i| i.description)
                .collect();

            assert_eq!(issues, test.expected, "{:?}", test.encryption);
        }
    }
}
