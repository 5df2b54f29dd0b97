//! Storage config of an edited config model. Devices are searched again
//! by the names kept in the model, so the result has to be solved.

use crate::config::search::IfNotFound;
use crate::config::{
    self as storage,
    Boot,
    BootDevice,
    DeviceKind,
    Encryption,
    Filesystem,
    FilesystemType,
    Search,
    Size,
};
use crate::config::volume::Btrfs;
use crate::convert::from_json::parse_fs_type;
use crate::entity::device::FsType;
use crate::entity::size::DiskSize;
use crate::errors::StorageError;
use crate::model::{
    self,
    SpacePolicy,
};
use crate::product::Product;

pub fn convert(model: &model::Config, product: &Product) -> Result<storage::Config, StorageError> {
    let policy = product.storage.space_policy.unwrap_or(SpacePolicy::Keep);
    let encryption = model.encryption.as_ref().map(|e| Encryption {
        password: e.password.clone(),
        ..Encryption::with_method(e.method)
    });

    let mut config = storage::Config::default();

    for drive in &model.drives {
        let partitions = partitions(drive, encryption.as_ref(), policy)?;
        config.drives.push(storage::Drive {
            search: match drive.name.is_empty() {
                true => Search::first_device(),
                false => Search::by_name(drive.name.as_str()),
            },
            alias: drive.alias.clone(),
            filesystem: filesystem(drive.mount_path.as_deref(), drive.filesystem.as_ref())?,
            ptable_type: drive.ptable_type,
            partitions,
            ..Default::default()
        });
    }

    for md in &model.md_raids {
        let partitions = partitions(md, encryption.as_ref(), policy)?;
        config.md_raids.push(storage::MdRaid {
            search: (!md.name.is_empty()).then(|| Search::by_name(md.name.as_str())),
            alias: md.alias.clone(),
            filesystem: filesystem(md.mount_path.as_deref(), md.filesystem.as_ref())?,
            ptable_type: md.ptable_type,
            partitions,
            ..Default::default()
        });
    }

    let mut volume_groups = Vec::with_capacity(model.volume_groups.len());
    for vg in &model.volume_groups {
        volume_groups.push(volume_group(vg, &mut config, encryption.as_ref())?);
    }

    config.volume_groups = volume_groups;
    config.boot = boot(model, &mut config);

    Ok(config)
}

fn boot(model: &model::Config, config: &mut storage::Config) -> Boot {
    let Some(boot) = &model.boot else {
        return Boot::default();
    };

    if !boot.configure {
        return Boot {
            configure: false,
            device: BootDevice::default(),
        };
    }

    let device = match &boot.device {
        Some(device) if !device.default => device,
        _ => return Boot::default(),
    };

    Boot {
        configure: true,
        device: BootDevice {
            default: false,
            alias: device.name.as_deref().map(|name| device_alias(config, name)),
        },
    }
}

/// Alias of the drive or MD RAID searching the device, generated if
/// needed. A drive is added when no config searches the device.
fn device_alias(config: &mut storage::Config, name: &str) -> String {
    let generated = config.generate_alias(DeviceKind::Drive);
    let searches = |search: Option<&Search>| search.and_then(|s| s.name.as_deref()) == Some(name);

    let alias = config
        .drives
        .iter_mut()
        .find(|d| searches(Some(&d.search)))
        .map(|d| &mut d.alias)
        .or_else(|| {
            config
                .md_raids
                .iter_mut()
                .find(|md| searches(md.search.as_ref()))
                .map(|md| &mut md.alias)
        });

    match alias {
        Some(alias) => alias.get_or_insert(generated).clone(),
        None => {
            log::debug!("adding drive {name} as {generated}");
            config.drives.push(storage::Drive {
                search: Search::by_name(name),
                alias: Some(generated.clone()),
                ..Default::default()
            });

            generated
        }
    }
}

/// Partitions of the drive, followed by the partition doing the space
/// policy. Only the custom policy keeps the space actions of the model.
fn partitions(
    drive: &model::Drive,
    encryption: Option<&Encryption>,
    default_policy: SpacePolicy,
) -> Result<Vec<storage::Partition>, StorageError> {
    let policy = drive.space_policy.unwrap_or(default_policy);

    let mut partitions = drive
        .partitions
        .iter()
        .filter(|p| policy == SpacePolicy::Custom || p.is_new() || p.mount_path.is_some() || p.is_used())
        .map(|p| partition(p, encryption))
        .collect::<Result<Vec<_>, _>>()?;

    let any = Search {
        if_not_found: IfNotFound::Skip,
        ..Default::default()
    };

    match policy {
        SpacePolicy::Delete => partitions.push(storage::Partition {
            search: Some(any),
            delete: true,
            ..Default::default()
        }),

        SpacePolicy::Resize => partitions.push(storage::Partition {
            search: Some(any),
            size: Size::range(Some(DiskSize::ZERO), None),
            ..Default::default()
        }),

        SpacePolicy::Keep | SpacePolicy::Custom => (),
    }

    Ok(partitions)
}

fn partition(
    partition: &model::Partition,
    encryption: Option<&Encryption>,
) -> Result<storage::Partition, StorageError> {
    let new = partition.is_new();

    // Mounted partitions are never deleted
    let mounted = partition.mount_path.is_some();

    let size = match (&partition.size, partition.resize_if_needed) {
        (_, true) => Size::range(Some(DiskSize::ZERO), None),
        (Some(size), false) => model_size(size, new),
        (None, false) => Size::default(),
    };

    Ok(storage::Partition {
        search: partition.name.as_deref().map(Search::by_name),
        alias: partition.alias.clone(),
        id: partition.id,
        size,
        encryption: new.then(|| encryption.cloned()).flatten(),
        filesystem: filesystem(partition.mount_path.as_deref(), partition.filesystem.as_ref())?,
        delete: partition.delete && !mounted,
        delete_if_needed: partition.delete_if_needed && !mounted,
    })
}

fn volume_group(
    vg: &model::VolumeGroup,
    config: &mut storage::Config,
    encryption: Option<&Encryption>,
) -> Result<storage::VolumeGroup, StorageError> {
    let physical_volumes_devices = vg
        .target_devices
        .iter()
        .map(|name| device_alias(config, name))
        .collect();

    let mut logical_volumes = Vec::with_capacity(vg.logical_volumes.len());
    for lv in &vg.logical_volumes {
        logical_volumes.push(storage::LogicalVolume {
            name: lv.lv_name.clone(),
            size: lv.size.as_ref().map(|s| model_size(s, true)).unwrap_or_default(),
            stripes: lv.stripes,
            stripe_size: lv.stripe_size,
            filesystem: filesystem(lv.mount_path.as_deref(), lv.filesystem.as_ref())?,
            ..Default::default()
        });
    }

    Ok(storage::VolumeGroup {
        name: (!vg.vg_name.is_empty()).then(|| vg.vg_name.clone()),
        extent_size: vg.extent_size,
        physical_volumes_devices,
        physical_volumes_encryption: encryption.cloned(),
        logical_volumes,
        ..Default::default()
    })
}

/// A missing max means the current size for existing devices, and no
/// limit for new ones
fn model_size(size: &model::Size, new: bool) -> Size {
    let max = match (size.max, new) {
        (Some(max), _) => Some(max),
        (None, true) => Some(DiskSize::Unlimited),
        (None, false) => None,
    };

    Size {
        default: size.default,
        min: Some(size.min),
        max,
    }
}

fn filesystem(
    mount_path: Option<&str>,
    fs: Option<&model::Filesystem>,
) -> Result<Option<Filesystem>, StorageError> {
    if mount_path.is_none() && fs.is_none() {
        return Ok(None);
    }

    let fs_type = match fs.and_then(|fs| fs.fs_type.as_deref().map(|name| (name, fs.default))) {
        Some((name, default)) => Some(filesystem_type(name, default)?),
        None => None,
    };

    Ok(Some(Filesystem {
        reuse: fs.map(|fs| fs.reuse).unwrap_or(false),
        fs_type,
        label: fs.and_then(|fs| fs.label.clone()),
        path: mount_path.map(String::from),
        ..Default::default()
    }))
}

fn filesystem_type(name: &str, default: bool) -> Result<FilesystemType, StorageError> {
    let btrfs = |btrfs: Btrfs| FilesystemType {
        fs_type: FsType::Btrfs,
        default,
        btrfs: Some(btrfs),
    };

    match name {
        "btrfsSnapshots" => Ok(btrfs(Btrfs {
            snapshots: Some(true),
            ..Default::default()
        })),

        "btrfsImmutable" => Ok(btrfs(Btrfs {
            read_only: Some(true),
            ..Default::default()
        })),

        name => {
            let fs_type = parse_fs_type(name)
                .map_err(|_| StorageError::BadModel(format!("unknown filesystem type {name}")))?;

            Ok(FilesystemType {
                fs_type,
                default,
                btrfs: None,
            })
        }
    }
}
