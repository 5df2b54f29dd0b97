use crate::config::search::{
    IfNotFound,
    SizeOperator,
    SortKey,
};
use crate::config::{
    Boot,
    Config,
    Drive,
    Encryption,
    Filesystem,
    LogicalVolume,
    MdRaid,
    Partition,
    Search,
    Size,
    VolumeGroup,
};
use crate::config_json::*;
use crate::constants::{
    SEARCH_ANY,
    SIZE_CURRENT,
};
use crate::entity::device::{
    EncryptionMethod,
    FsType,
};
use crate::entity::size::DiskSize;

/// Converts a typed config back into its JSON form. Solved searches
/// are written as the name of the found device.
pub fn convert(config: &Config) -> ConfigJson {
    ConfigJson {
        boot: Some(convert_boot(&config.boot)),
        drives: non_empty(config.drives.iter().map(convert_drive).collect()),
        md_raids: non_empty(config.md_raids.iter().map(convert_md_raid).collect()),
        volume_groups: non_empty(
            config.volume_groups.iter().map(convert_volume_group).collect(),
        ),
    }
}

fn non_empty<T>(v: Vec<T>) -> Option<Vec<T>> {
    (!v.is_empty()).then_some(v)
}

fn convert_boot(boot: &Boot) -> BootJson {
    BootJson {
        configure: Some(boot.configure),
        device: boot.device.alias.clone(),
    }
}

fn convert_drive(drive: &Drive) -> DriveJson {
    DriveJson {
        search: Some(convert_search(&drive.search)),
        alias: drive.alias.clone(),
        encryption: drive.encryption.as_ref().and_then(convert_encryption),
        filesystem: drive.filesystem.as_ref().map(convert_filesystem),
        ptable_type: drive.ptable_type,
        partitions: convert_partitions(&drive.partitions),
    }
}

fn convert_partitions(partitions: &[Partition]) -> Option<Vec<Entry<PartitionJson>>> {
    non_empty(
        partitions
            .iter()
            .map(|p| Entry::Item(convert_partition(p)))
            .collect(),
    )
}

fn convert_partition(partition: &Partition) -> PartitionJson {
    PartitionJson {
        search: partition.search.as_ref().map(convert_search),
        alias: partition.alias.clone(),
        id: partition.id,
        size: convert_size(&partition.size),
        encryption: partition.encryption.as_ref().and_then(convert_encryption),
        filesystem: partition.filesystem.as_ref().map(convert_filesystem),
        delete: partition.delete.then_some(true),
        delete_if_needed: partition.delete_if_needed.then_some(true),
    }
}

fn convert_md_raid(md: &MdRaid) -> MdRaidJson {
    MdRaidJson {
        search: md.search.as_ref().map(convert_search),
        alias: md.alias.clone(),
        name: md.name.clone(),
        level: md.level,
        parity: md.parity,
        chunk_size: md.chunk_size.map(size_value),
        devices: non_empty(md.devices.clone()),
        encryption: md.encryption.as_ref().and_then(convert_encryption),
        filesystem: md.filesystem.as_ref().map(convert_filesystem),
        ptable_type: md.ptable_type,
        partitions: convert_partitions(&md.partitions),
    }
}

fn convert_volume_group(vg: &VolumeGroup) -> VolumeGroupJson {
    let mut pvs: Vec<PhysicalVolumeJson> = vg
        .physical_volumes
        .iter()
        .cloned()
        .map(PhysicalVolumeJson::Alias)
        .collect();

    if !vg.physical_volumes_devices.is_empty() {
        let generate = match &vg.physical_volumes_encryption {
            None => PvGenerateJson::Targets(vg.physical_volumes_devices.clone()),
            Some(encryption) => PvGenerateJson::Section(PvGenerateSectionJson {
                target_devices: vg.physical_volumes_devices.clone(),
                encryption: convert_encryption(encryption),
            }),
        };

        pvs.push(PhysicalVolumeJson::Generate { generate });
    }

    let lvs: Vec<Entry<LogicalVolumeJson>> = vg
        .logical_volumes
        .iter()
        .map(|lv| Entry::Item(convert_logical_volume(lv)))
        .collect();

    VolumeGroupJson {
        name: vg.name.clone(),
        extent_size: vg.extent_size.map(size_value),
        physical_volumes: non_empty(pvs),
        logical_volumes: non_empty(lvs),
    }
}

fn convert_logical_volume(lv: &LogicalVolume) -> LogicalVolumeJson {
    LogicalVolumeJson {
        alias: lv.alias.clone(),
        name: lv.name.clone(),
        size: convert_size(&lv.size),
        stripes: lv.stripes,
        stripe_size: lv.stripe_size.map(size_value),
        pool: lv.pool.then_some(true),
        used_pool: lv.used_pool.clone(),
        encryption: lv.encryption.as_ref().and_then(convert_encryption),
        filesystem: lv.filesystem.as_ref().map(convert_filesystem),
    }
}

fn convert_search(search: &Search) -> SearchJson {
    if let Some(device) = search.device() {
        return SearchJson::Name(device.name.clone());
    }

    let is_any = search.always_match()
        && search.max.is_none()
        && search.sort.is_empty()
        && search.if_not_found == IfNotFound::Skip;

    if is_any {
        return SearchJson::Name(SEARCH_ANY.to_string());
    }

    let condition = if let Some(name) = &search.name {
        Some(SearchConditionJson::Name { name: name.clone() })
    } else if let Some(number) = search.partition_number {
        Some(SearchConditionJson::Number { number })
    } else {
        search.size.map(|cond| {
            let value = Some(size_value(cond.value));
            let op = match cond.operator {
                SizeOperator::Equal => SizeOperatorJson {
                    equal: value,
                    ..Default::default()
                },
                SizeOperator::Greater => SizeOperatorJson {
                    greater: value,
                    ..Default::default()
                },
                SizeOperator::Less => SizeOperatorJson {
                    less: value,
                    ..Default::default()
                },
            };

            SearchConditionJson::Size {
                size: SizeConditionJson::Operator(op),
            }
        })
    };

    let sort = search
        .sort
        .iter()
        .map(|criterion| match criterion.key {
            SortKey::Name => SortCriterionJson {
                name: Some(criterion.order),
                ..Default::default()
            },
            SortKey::Size => SortCriterionJson {
                size: Some(criterion.order),
                ..Default::default()
            },
            SortKey::Number => SortCriterionJson {
                number: Some(criterion.order),
                ..Default::default()
            },
        })
        .collect::<Vec<_>>();

    SearchJson::Section(SearchSectionJson {
        condition,
        sort: non_empty(sort).map(SortJson::Many),
        max: search.max,
        if_not_found: Some(search.if_not_found),
    })
}

fn size_value(size: DiskSize) -> SizeValueJson {
    match size {
        DiskSize::Bytes(bytes) => SizeValueJson::Number(bytes),
        DiskSize::Unlimited => SizeValueJson::Text(size.to_string()),
    }
}

fn bound(size: Option<DiskSize>) -> SizeValueJson {
    size.map(size_value)
        .unwrap_or_else(|| SizeValueJson::Text(SIZE_CURRENT.to_string()))
}

/// Default sizes are omitted unless already solved
fn convert_size(size: &Size) -> Option<SizeJson> {
    if size.default && size.min.is_none() && size.max.is_none() {
        return None;
    }

    if size.min == size.max && size.min.is_some() {
        return Some(SizeJson::Value(bound(size.min)));
    }

    Some(SizeJson::Bounds {
        min: bound(size.min),
        max: Some(bound(size.max)),
    })
}

fn convert_encryption(encryption: &Encryption) -> Option<EncryptionJson> {
    let method = encryption.method?;

    let luks = || LuksJson {
        password: encryption.password.clone(),
        key_size: encryption.key_size,
        pbkd_function: encryption.pbkd_function,
        cipher: encryption.cipher.clone(),
        label: encryption.label.clone(),
    };

    let password = || PasswordJson {
        password: encryption.password.clone(),
    };

    let json = match method {
        EncryptionMethod::Luks1 => EncryptionJson::Luks1(luks()),
        EncryptionMethod::Luks2 => EncryptionJson::Luks2(luks()),
        EncryptionMethod::PervasiveLuks2 => EncryptionJson::PervasiveLuks2(password()),
        EncryptionMethod::TpmFde => EncryptionJson::TpmFde(password()),
        EncryptionMethod::ProtectedSwap => EncryptionJson::ProtectedSwap,
        EncryptionMethod::SecureSwap => EncryptionJson::SecureSwap,
        EncryptionMethod::RandomSwap => EncryptionJson::RandomSwap,
    };

    Some(json)
}

fn convert_filesystem(fs: &Filesystem) -> FilesystemJson {
    let fs_type = fs.fs_type.as_ref().map(|t| match (&t.fs_type, &t.btrfs) {
        (FsType::Btrfs, Some(btrfs)) if btrfs.snapshots.is_some() => {
            FilesystemTypeJson::Btrfs {
                btrfs: BtrfsJson {
                    snapshots: btrfs.snapshots,
                },
            }
        }
        (fs_type, _) => FilesystemTypeJson::Name(fs_type.name().to_string()),
    });

    FilesystemJson {
        reuse_if_possible: fs.reuse.then_some(true),
        fs_type,
        label: fs.label.clone(),
        path: fs.path.clone(),
        mount_by: fs.mount_by,
        mkfs_options: non_empty(fs.mkfs_options.clone()),
        mount_options: non_empty(fs.mount_options.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::search::FoundDevice;
    use crate::convert::from_json;

    #[test]
    fn test_convert_back() {
        let json = r#"{
            "boot": { "configure": true, "device": "disk" },
            "drives": [{
                "search": { "condition": { "size": { "greater": 1024 } }, "max": 2 },
                "alias": "disk",
                "ptableType": "gpt",
                "partitions": [
                    { "search": "*", "delete": true },
                    {
                        "size": ["1 GiB", "current"],
                        "encryption": { "luks2": { "password": "notsecret" } },
                        "filesystem": { "path": "/", "type": { "btrfs": { "snapshots": true } } }
                    },
                    { "size": "2 GiB", "filesystem": { "path": "swap", "type": "swap" } }
                ]
            }],
            "volumeGroups": [{
                "name": "system",
                "physicalVolumes": [{ "generate": ["disk"] }],
                "logicalVolumes": [{ "name": "home", "filesystem": { "path": "/home" } }]
            }]
        }"#;

        let json = ConfigJson::from_json(json).expect("failed to parse json");
        let config = from_json::convert(&json).expect("failed to convert");
        let back = convert(&config);

        // Converting the written JSON again yields the same config
        let again = from_json::convert(&back).expect("failed to convert back");
        assert_eq!(config, again);

        let drive = &back.drives.as_ref().expect("no drives")[0];
        let partitions = drive.partitions.as_ref().expect("no partitions");
        let first = partitions[0].item().expect("not a partition");
        assert_eq!(first.search, Some(SearchJson::Name("*".into())));

        let root = partitions[1].item().expect("not a partition");
        assert_eq!(
            root.size,
            Some(SizeJson::Bounds {
                min: SizeValueJson::Number(1024 * 1024 * 1024),
                max: Some(SizeValueJson::Text("current".into())),
            })
        );

        let swap = partitions[2].item().expect("not a partition");
        assert_eq!(
            swap.size,
            Some(SizeJson::Value(SizeValueJson::Number(2 * 1024 * 1024 * 1024)))
        );
    }

    #[test]
    fn test_convert_solved_search() {
        let mut config = Config {
            drives: vec![Drive::default()],
            ..Default::default()
        };

        config.drives[0].search.solve(Some(FoundDevice {
            sid: 1,
            name: "/dev/vda".into(),
            size: DiskSize::gib(10),
        }));

        let json = convert(&config);
        let drives = json.drives.expect("no drives");
        assert_eq!(drives[0].search, Some(SearchJson::Name("/dev/vda".into())));
        assert_eq!(json.md_raids, None);
        assert_eq!(json.volume_groups, None);
    }
}
