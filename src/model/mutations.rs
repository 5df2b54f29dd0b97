//! Edits of the config model. Every mutation works on a copy and returns
//! `None` when the edited device does not exist.

use std::str::FromStr;

use serde::{
    Deserialize,
    Serialize,
};

use super::{
    Boot,
    BootDevice,
    Config,
    Drive,
    Encryption,
    LogicalVolume,
    Partition,
    SpacePolicy,
    VolumeGroup,
};
use crate::entity::device::EncryptionMethod;
use crate::errors::StorageError;

/// Action on an existing partition for the custom space policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SpaceActionValue {
    Delete,
    ResizeIfNeeded,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpaceAction {
    pub device_name: String,
    pub value: SpaceActionValue,
}

/// Parses `<device>=<delete|resizeIfNeeded>`
impl FromStr for SpaceAction {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, value) = s
            .split_once('=')
            .ok_or_else(|| StorageError::BadArgs(format!("bad space action '{s}'")))?;

        let value = match value {
            "delete" => SpaceActionValue::Delete,
            "resizeIfNeeded" => SpaceActionValue::ResizeIfNeeded,
            _ => {
                return Err(StorageError::BadArgs(format!(
                    "bad space action value '{value}'"
                )))
            }
        };

        if name.is_empty() {
            return Err(StorageError::BadArgs(format!("missing device in '{s}'")));
        }

        Ok(Self {
            device_name: name.to_string(),
            value,
        })
    }
}

fn find_drive_mut<'a>(model: &'a mut Config, name: &str) -> Option<&'a mut Drive> {
    model.drives.iter_mut().find(|d| d.name == name)
}

/// Drive or MD RAID holding physical volumes
fn find_target_mut<'a>(model: &'a mut Config, name: &str) -> Option<&'a mut Drive> {
    model
        .drives
        .iter_mut()
        .chain(model.md_raids.iter_mut())
        .find(|d| d.name == name)
}

fn find_volume_group_mut<'a>(model: &'a mut Config, name: &str) -> Option<&'a mut VolumeGroup> {
    model.volume_groups.iter_mut().find(|vg| vg.vg_name == name)
}

fn is_used_drive(model: &Config, name: &str) -> bool {
    model.drive(name).map(Drive::is_used).unwrap_or(false)
}

pub fn add_drive(model: &Config, name: &str) -> Option<Config> {
    if model.drive(name).is_some() {
        return None;
    }

    let mut model = model.clone();
    model.drives.push(Drive {
        name: name.to_string(),
        ..Default::default()
    });

    Some(model)
}

pub fn remove_drive(model: &Config, name: &str) -> Option<Config> {
    model.drive(name)?;

    let mut model = model.clone();
    model.drives.retain(|d| d.name != name);

    Some(model)
}

/// Moves the new partitions of a drive to another one. The old drive is
/// kept only if it is the explicit boot device or reuses partitions.
pub fn switch_drive(model: &Config, name: &str, new_name: &str) -> Option<Config> {
    if name == new_name {
        return None;
    }

    let drive = model.drive(name)?;
    let (new_partitions, existing): (Vec<Partition>, Vec<Partition>) = drive
        .partitions
        .iter()
        .cloned()
        .partition(Partition::is_new);

    let keep = model.is_explicit_boot(name) || existing.iter().any(Partition::is_reused);
    let space_policy = match drive.space_policy {
        Some(SpacePolicy::Custom) => None,
        policy => policy,
    };

    let mut model = model.clone();
    match keep {
        true => {
            if let Some(drive) = find_drive_mut(&mut model, name) {
                drive.partitions = existing;
            }
        }
        false => model.drives.retain(|d| d.name != name),
    }

    match find_drive_mut(&mut model, new_name) {
        Some(new_drive) => new_drive.partitions.extend(new_partitions),
        None => model.drives.push(Drive {
            name: new_name.to_string(),
            space_policy,
            partitions: new_partitions,
            ..Default::default()
        }),
    }

    Some(model)
}

/// Adds a partition, replacing the existing partition with the same name
pub fn add_partition(model: &Config, drive_name: &str, partition: Partition) -> Option<Config> {
    let mut model = model.clone();
    let drive = find_drive_mut(&mut model, drive_name)?;

    let index = drive
        .partitions
        .iter()
        .position(|p| p.name.is_some() && p.name == partition.name);

    match index {
        Some(i) => drive.partitions[i] = partition,
        None => drive.partitions.push(partition),
    }

    Some(model)
}

pub fn edit_partition(
    model: &Config,
    drive_name: &str,
    mount_path: &str,
    partition: Partition,
) -> Option<Config> {
    let mut model = model.clone();
    let drive = find_drive_mut(&mut model, drive_name)?;
    let index = drive.partition_by_path(mount_path)?;

    drive.partitions[index] = partition;
    Some(model)
}

pub fn delete_partition(model: &Config, drive_name: &str, mount_path: &str) -> Option<Config> {
    let mut model = model.clone();
    let drive = find_drive_mut(&mut model, drive_name)?;
    let index = drive.partition_by_path(mount_path)?;

    drive.partitions.remove(index);
    Some(model)
}

/// Sets the space policy of a drive. For the custom policy, the actions of
/// existing partitions are reset before applying the given ones.
pub fn set_space_policy(
    model: &Config,
    drive_name: &str,
    policy: SpacePolicy,
    actions: &[SpaceAction],
) -> Option<Config> {
    let mut model = model.clone();
    let drive = find_drive_mut(&mut model, drive_name)?;
    drive.space_policy = Some(policy);

    if policy != SpacePolicy::Custom {
        return Some(model);
    }

    for partition in drive.partitions.iter_mut().filter(|p| !p.is_new()) {
        partition.delete = false;
        partition.delete_if_needed = false;
        partition.resize_if_needed = false;
        partition.size = None;
    }

    for action in actions {
        let delete = action.value == SpaceActionValue::Delete;
        let resize_if_needed = action.value == SpaceActionValue::ResizeIfNeeded;

        let existing = drive
            .partitions
            .iter_mut()
            .find(|p| p.name.as_deref() == Some(action.device_name.as_str()));

        match existing {
            Some(partition) => {
                partition.delete = delete;
                partition.resize_if_needed = resize_if_needed;
            }
            None => drive.partitions.push(Partition {
                name: Some(action.device_name.clone()),
                delete,
                resize_if_needed,
                ..Default::default()
            }),
        }
    }

    Some(model)
}

/// Replaces the boot settings, dropping the previous explicit boot drive
/// if nothing else uses it
fn set_boot(model: &Config, boot: Boot) -> Config {
    let mut model = model.clone();

    let unused = model
        .explicit_boot_name()
        .filter(|name| !is_used_drive(&model, name) && !model.drive_has_pv(name))
        .map(String::from);

    if let Some(name) = unused {
        log::debug!("dropping unused boot drive {name}");
        model.drives.retain(|d| d.name != name);
    }

    model.boot = Some(boot);
    model
}

pub fn set_boot_device(model: &Config, name: &str) -> Config {
    set_boot(
        model,
        Boot {
            configure: true,
            device: Some(BootDevice {
                default: false,
                name: Some(name.to_string()),
            }),
        },
    )
}

pub fn set_default_boot_device(model: &Config) -> Config {
    set_boot(
        model,
        Boot {
            configure: true,
            device: Some(BootDevice {
                default: true,
                name: None,
            }),
        },
    )
}

pub fn disable_boot(model: &Config) -> Config {
    set_boot(
        model,
        Boot {
            configure: false,
            device: None,
        },
    )
}

pub fn set_encryption(model: &Config, method: EncryptionMethod, password: Option<String>) -> Config {
    let mut model = model.clone();
    model.encryption = Some(Encryption { method, password });
    model
}

pub fn disable_encryption(model: &Config) -> Config {
    let mut model = model.clone();
    model.encryption = None;
    model
}

/// LVM name for a mount path, e.g. `root` for `/` and `var_log` for
/// `/var/log`
pub fn lv_name(mount_path: &str) -> String {
    match mount_path.trim_matches('/') {
        "" => "root".to_string(),
        path => path.replace('/', "_"),
    }
}

/// Turns the new partitions with mount path of the target devices into
/// logical volumes of the group
fn move_partitions_to(model: &mut Config, vg: &mut VolumeGroup) {
    for target in &vg.target_devices {
        let Some(device) = find_target_mut(model, target) else {
            continue;
        };

        let (moved, kept): (Vec<Partition>, Vec<Partition>) = device
            .partitions
            .drain(..)
            .partition(|p| p.is_new() && p.mount_path.is_some());

        device.partitions = kept;

        for partition in moved {
            log::debug!("moving {:?} from {target} to {}", partition.mount_path, vg.vg_name);

            vg.logical_volumes.push(LogicalVolume {
                lv_name: partition.mount_path.as_deref().map(lv_name),
                mount_path: partition.mount_path,
                filesystem: partition.filesystem,
                size: partition.size,
                ..Default::default()
            });
        }
    }
}

/// Adds a volume group. With `move_mount_paths`, the new partitions of its
/// target devices become logical volumes.
pub fn add_volume_group(
    model: &Config,
    mut vg: VolumeGroup,
    move_mount_paths: bool,
) -> Option<Config> {
    if model.volume_groups.iter().any(|v| v.vg_name == vg.vg_name) {
        return None;
    }

    let mut model = model.clone();
    if move_mount_paths {
        move_partitions_to(&mut model, &mut vg);
    }

    model.volume_groups.push(vg);
    Some(model)
}

pub fn edit_volume_group(
    model: &Config,
    name: &str,
    mut vg: VolumeGroup,
    move_mount_paths: bool,
) -> Option<Config> {
    let index = model.volume_groups.iter().position(|v| v.vg_name == name)?;

    let mut model = model.clone();
    if move_mount_paths {
        move_partitions_to(&mut model, &mut vg);
    }

    model.volume_groups[index] = vg;
    Some(model)
}

/// Deletes a volume group. With `move_to_partitions`, its logical volumes
/// with mount path become new partitions of the first target device.
pub fn delete_volume_group(model: &Config, name: &str, move_to_partitions: bool) -> Option<Config> {
    let index = model.volume_groups.iter().position(|v| v.vg_name == name)?;

    let mut model = model.clone();
    let vg = model.volume_groups.remove(index);

    if !move_to_partitions {
        return Some(model);
    }

    let Some(target) = vg.target_devices.first() else {
        return Some(model);
    };

    if let Some(device) = find_target_mut(&mut model, target) {
        let partitions = vg
            .logical_volumes
            .into_iter()
            .filter(|lv| lv.mount_path.is_some())
            .map(|lv| Partition {
                mount_path: lv.mount_path,
                filesystem: lv.filesystem,
                size: lv.size,
                ..Default::default()
            });

        device.partitions.extend(partitions);
    }

    Some(model)
}

pub fn add_logical_volume(model: &Config, vg_name: &str, mut lv: LogicalVolume) -> Option<Config> {
    let mut model = model.clone();
    let vg = find_volume_group_mut(&mut model, vg_name)?;

    if lv.lv_name.is_none() {
        lv.lv_name = lv.mount_path.as_deref().map(lv_name);
    }

    vg.logical_volumes.push(lv);
    Some(model)
}

pub fn edit_logical_volume(
    model: &Config,
    vg_name: &str,
    mount_path: &str,
    lv: LogicalVolume,
) -> Option<Config> {
    let mut model = model.clone();
    let vg = find_volume_group_mut(&mut model, vg_name)?;

    let index = vg
        .logical_volumes
        .iter()
        .position(|lv| lv.mount_path.as_deref() == Some(mount_path))?;

    vg.logical_volumes[index] = lv;
    Some(model)
}

pub fn delete_logical_volume(model: &Config, vg_name: &str, mount_path: &str) -> Option<Config> {
    let mut model = model.clone();
    let vg = find_volume_group_mut(&mut model, vg_name)?;

    let index = vg
        .logical_volumes
        .iter()
        .position(|lv| lv.mount_path.as_deref() == Some(mount_path))?;

    vg.logical_volumes.remove(index);
    Some(model)
}
