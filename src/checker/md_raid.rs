use std::collections::HashSet;

use crate::config::{
    BlockDevice,
    Config,
    MdRaid,
    Partition,
};
use crate::entity::issue::{
    Issue,
    IssueKind,
};
use crate::system::{
    System,
    SystemDevice,
};

pub(super) fn check(config: &Config, system: &System, md: &MdRaid) -> Vec<Issue> {
    let mut issues = Vec::new();

    issues.extend(check_members(config, md));

    match md.found_device() {
        Some(found) => issues.extend(check_reused(config, system, found.sid)),
        None => issues.extend(check_new(config, md)),
    }

    issues
}

fn check_members(config: &Config, md: &MdRaid) -> Vec<Issue> {
    let devices = config.block_devices();

    md.devices
        .iter()
        .filter(|alias| !devices.iter().any(|d| d.has_alias(alias)))
        .map(|alias| {
            Issue::error(
                IssueKind::NoSuchAlias,
                format!("There is no MD RAID member device with alias '{alias}'"),
            )
        })
        .collect()
}

fn check_new(config: &Config, md: &MdRaid) -> Option<Issue> {
    let Some(level) = md.level else {
        return Some(Issue::error(
            IssueKind::NoRaidLevel,
            "There is a MD RAID without level",
        ));
    };

    let members: HashSet<&str> = config
        .potential_for_md_device()
        .into_iter()
        .filter_map(|d| d.alias())
        .filter(|alias| md.devices.iter().any(|m| m == alias))
        .collect();

    let required = level.min_devices();
    if members.len() < required {
        return Some(Issue::error(
            IssueKind::WrongRaidMembers,
            format!("At least {required} devices are required for {level}"),
        ));
    }

    None
}

/// Configs of the members of a reused MD RAID must leave them untouched
fn check_reused(config: &Config, system: &System, sid: u32) -> Vec<Issue> {
    let Some(system_md) = system.md_raid(sid) else {
        return Vec::new();
    };

    let misused = |name: &str, action: &str| {
        Issue::error(
            IssueKind::MisusedMdMember,
            format!(
                "The device '{name}' cannot be {action} because it is part of the MD RAID {}",
                system_md.name
            ),
        )
    };

    let mut issues = Vec::new();

    for member in &system_md.devices {
        let Some(member_device) = system.find_by_any_name(member) else {
            continue;
        };

        let is_member = |d: &dyn BlockDevice| {
            d.found_device()
                .map(|found| found.sid == member_device.sid())
                .unwrap_or(false)
        };

        for drive in config.drives.iter().filter(|d| d.is_valid()) {
            if is_member(drive) {
                let actions = misused_actions(config, drive, drive.partitions.is_empty(), None);
                issues.extend(actions.into_iter().map(|action| misused(member, action)));
            }

            for partition in drive.partitions.iter().filter(|p| p.is_valid() && is_member(*p)) {
                let actions = misused_actions(config, partition, true, Some(partition));
                issues.extend(actions.into_iter().map(|action| misused(member, action)));
            }

            // Formatting the disk holding the member destroys the member
            let parent = match member_device {
                SystemDevice::Partition(_) => system.parent_of(member_device.sid()),
                _ => None,
            };

            let holds_member = match (parent, drive.found_device()) {
                (Some(parent), Some(found)) => parent.sid() == found.sid,
                _ => false,
            };

            if holds_member && drive.filesystem.is_some() {
                issues.push(misused(member, "formatted"));
            }
        }
    }

    issues
}

fn misused_actions(
    config: &Config,
    device: &dyn BlockDevice,
    unpartitioned: bool,
    partition: Option<&Partition>,
) -> Vec<&'static str> {
    let mut actions = Vec::new();

    if device.filesystem().is_some() {
        actions.push("formatted");
    }

    if !unpartitioned {
        actions.push("partitioned");
    }

    let used = device
        .alias()
        .map(|alias| !config.users(alias).is_empty() || !config.target_users(alias).is_empty())
        .unwrap_or(false);

    if used {
        actions.push("used");
    }

    if let Some(partition) = partition {
        if partition.delete || partition.delete_if_needed {
            actions.push("deleted");
        }

        if partition.is_resized() {
            actions.push("resized");
        }
    }

    actions
}
