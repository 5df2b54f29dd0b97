use crate::config::Config;
use crate::entity::issue::{
    Issue,
    IssueKind,
};

/// An explicit boot device must be a drive or MD RAID config
pub(super) fn check(config: &Config) -> Option<Issue> {
    let boot = &config.boot;
    if !boot.configure || boot.device.default {
        return None;
    }

    if config.boot_device().is_some() {
        return None;
    }

    let alias = boot.device.alias.as_deref().unwrap_or_default();
    Some(Issue::error(
        IssueKind::Boot,
        format!("There is no boot device with alias '{alias}'"),
    ))
}
