use crate::config::{
    Config,
    VolumeGroup,
};
use crate::entity::issue::{
    Issue,
    IssueKind,
};
use crate::system::System;

use super::encryption;

pub(super) fn check(config: &Config, system: &System, vg: &VolumeGroup) -> Vec<Issue> {
    let mut issues = Vec::new();

    if vg.name.is_none() {
        issues.push(Issue::error(
            IssueKind::NoVgName,
            "There is a volume group without name",
        ));
    }

    let devices = config.block_devices();
    for pv in &vg.physical_volumes {
        if !devices.iter().any(|d| d.has_alias(pv)) {
            issues.push(Issue::error(
                IssueKind::Alias,
                format!("There is no LVM physical volume with alias '{pv}'"),
            ));
        }
    }

    for target in &vg.physical_volumes_devices {
        if config.partitionable(target).is_none() {
            issues.push(Issue::error(
                IssueKind::Alias,
                format!("There is no target device for LVM physical volumes with alias '{target}'"),
            ));
        }
    }

    if let Some(pv_encryption) = &vg.physical_volumes_encryption {
        issues.extend(encryption::check(pv_encryption, system, false));
    }

    let reused: Vec<bool> = vg
        .physical_volumes_devices
        .iter()
        .filter_map(|alias| config.partitionable(alias))
        .map(|p| p.device().found_device().is_some())
        .collect();

    if reused.contains(&true) && reused.contains(&false) {
        issues.push(Issue::error(
            IssueKind::Lvm,
            format!(
                "The list of target devices for the volume group '{}' is mixing reused devices and new devices",
                vg.name.as_deref().unwrap_or_default()
            ),
        ));
    }

    issues
}
