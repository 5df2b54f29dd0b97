use crate::config::search::{
    IfNotFound,
    SizeCondition,
    SizeOperator,
    SortCriterion,
    SortKey,
};
use crate::config::volume::Btrfs;
use crate::config::{
    Boot,
    BootDevice,
    Config,
    Drive,
    Encryption,
    Filesystem,
    FilesystemType,
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
use crate::errors::StorageError;

/// Converts the raw JSON config into the typed config.
/// `generate` entries must have been solved before conversion,
/// leftovers are ignored.
pub fn convert(json: &ConfigJson) -> Result<Config, StorageError> {
    let boot = json.boot.as_ref().map(convert_boot).unwrap_or_default();

    let drives = json
        .drives
        .iter()
        .flatten()
        .map(convert_drive)
        .collect::<Result<Vec<_>, _>>()?;

    let md_raids = json
        .md_raids
        .iter()
        .flatten()
        .map(convert_md_raid)
        .collect::<Result<Vec<_>, _>>()?;

    let volume_groups = json
        .volume_groups
        .iter()
        .flatten()
        .map(convert_volume_group)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Config {
        boot,
        drives,
        md_raids,
        volume_groups,
    })
}

fn convert_boot(json: &BootJson) -> Boot {
    Boot {
        configure: json.configure.unwrap_or(true),
        device: BootDevice {
            default: json.device.is_none(),
            alias: json.device.clone(),
        },
    }
}

fn convert_drive(json: &DriveJson) -> Result<Drive, StorageError> {
    let search = match &json.search {
        Some(search) => convert_search(search)?,
        None => Search::first_device(),
    };

    Ok(Drive {
        search,
        alias: json.alias.clone(),
        encryption: json.encryption.as_ref().map(convert_encryption),
        filesystem: json.filesystem.as_ref().map(convert_filesystem).transpose()?,
        ptable_type: json.ptable_type,
        partitions: convert_partitions(json.partitions.as_deref())?,
    })
}

fn convert_partitions(
    json: Option<&[Entry<PartitionJson>]>,
) -> Result<Vec<Partition>, StorageError> {
    json.unwrap_or_default()
        .iter()
        .filter_map(Entry::item)
        .map(convert_partition)
        .collect()
}

fn convert_partition(json: &PartitionJson) -> Result<Partition, StorageError> {
    Ok(Partition {
        search: json.search.as_ref().map(convert_search).transpose()?,
        alias: json.alias.clone(),
        id: json.id,
        size: json.size.as_ref().map(convert_size).transpose()?.unwrap_or_default(),
        encryption: json.encryption.as_ref().map(convert_encryption),
        filesystem: json.filesystem.as_ref().map(convert_filesystem).transpose()?,
        delete: json.delete.unwrap_or(false),
        delete_if_needed: json.delete_if_needed.unwrap_or(false),
    })
}

fn convert_md_raid(json: &MdRaidJson) -> Result<MdRaid, StorageError> {
    Ok(MdRaid {
        search: json.search.as_ref().map(convert_search).transpose()?,
        alias: json.alias.clone(),
        name: json.name.clone(),
        level: json.level,
        parity: json.parity,
        chunk_size: json.chunk_size.as_ref().map(convert_size_value).transpose()?.flatten(),
        devices: json.devices.clone().unwrap_or_default(),
        encryption: json.encryption.as_ref().map(convert_encryption),
        filesystem: json.filesystem.as_ref().map(convert_filesystem).transpose()?,
        ptable_type: json.ptable_type,
        partitions: convert_partitions(json.partitions.as_deref())?,
    })
}

fn convert_volume_group(json: &VolumeGroupJson) -> Result<VolumeGroup, StorageError> {
    let mut vg = VolumeGroup {
        name: json.name.clone(),
        extent_size: json.extent_size.as_ref().map(convert_size_value).transpose()?.flatten(),
        ..Default::default()
    };

    for pv in json.physical_volumes.iter().flatten() {
        match pv {
            PhysicalVolumeJson::Alias(alias) => vg.physical_volumes.push(alias.clone()),
            PhysicalVolumeJson::Generate { generate } => match generate {
                PvGenerateJson::Targets(targets) => {
                    vg.physical_volumes_devices.extend(targets.iter().cloned())
                }
                PvGenerateJson::Section(section) => {
                    vg.physical_volumes_devices
                        .extend(section.target_devices.iter().cloned());

                    if let Some(encryption) = &section.encryption {
                        vg.physical_volumes_encryption = Some(convert_encryption(encryption));
                    }
                }
            },
        }
    }

    vg.logical_volumes = json
        .logical_volumes
        .iter()
        .flatten()
        .filter_map(Entry::item)
        .map(convert_logical_volume)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(vg)
}

fn convert_logical_volume(json: &LogicalVolumeJson) -> Result<LogicalVolume, StorageError> {
    Ok(LogicalVolume {
        alias: json.alias.clone(),
        name: json.name.clone(),
        size: json.size.as_ref().map(convert_size).transpose()?.unwrap_or_default(),
        stripes: json.stripes,
        stripe_size: json.stripe_size.as_ref().map(convert_size_value).transpose()?.flatten(),
        pool: json.pool.unwrap_or(false),
        used_pool: json.used_pool.clone(),
        encryption: json.encryption.as_ref().map(convert_encryption),
        filesystem: json.filesystem.as_ref().map(convert_filesystem).transpose()?,
    })
}

pub(crate) fn convert_search(json: &SearchJson) -> Result<Search, StorageError> {
    let section = match json {
        SearchJson::Name(name) if name == SEARCH_ANY => {
            return Ok(Search {
                if_not_found: IfNotFound::Skip,
                ..Default::default()
            });
        }
        SearchJson::Name(name) => return Ok(Search::by_name(name.as_str())),
        SearchJson::Section(section) => section,
    };

    let mut search = Search {
        max: section.max,
        if_not_found: section.if_not_found.unwrap_or_default(),
        sort: convert_sort(section.sort.as_ref()),
        ..Default::default()
    };

    match &section.condition {
        None => {}
        Some(SearchConditionJson::Name { name }) => search.name = Some(name.clone()),
        Some(SearchConditionJson::Number { number }) => {
            search.partition_number = Some(*number)
        }
        Some(SearchConditionJson::Size { size }) => {
            search.size = Some(convert_size_condition(size)?)
        }
    }

    Ok(search)
}

fn convert_sort(json: Option<&SortJson>) -> Vec<SortCriterion> {
    let criteria = match json {
        None => return Vec::new(),
        Some(SortJson::One(criterion)) => std::slice::from_ref(criterion),
        Some(SortJson::Many(criteria)) => criteria.as_slice(),
    };

    criteria
        .iter()
        .flat_map(|c| {
            let name = c.name.map(|order| SortCriterion {
                key: SortKey::Name,
                order,
            });
            let size = c.size.map(|order| SortCriterion {
                key: SortKey::Size,
                order,
            });
            let number = c.number.map(|order| SortCriterion {
                key: SortKey::Number,
                order,
            });

            name.into_iter().chain(size).chain(number)
        })
        .collect()
}

fn convert_size_condition(json: &SizeConditionJson) -> Result<SizeCondition, StorageError> {
    const MSG: &str = "bad search size condition";

    let (operator, value) = match json {
        SizeConditionJson::Value(value) => (SizeOperator::Equal, value),
        SizeConditionJson::Operator(op) => match (&op.equal, &op.greater, &op.less) {
            (Some(value), None, None) => (SizeOperator::Equal, value),
            (None, Some(value), None) => (SizeOperator::Greater, value),
            (None, None, Some(value)) => (SizeOperator::Less, value),
            _ => {
                return Err(StorageError::BadConfig(format!(
                    "{MSG}: exactly one of equal, greater or less is expected"
                )))
            }
        },
    };

    let value = convert_size_value(value)?.ok_or_else(|| {
        StorageError::BadConfig(format!("{MSG}: {SIZE_CURRENT} is not a valid size"))
    })?;

    Ok(SizeCondition { value, operator })
}

/// Size bound, `None` for "current"
pub(crate) fn convert_size_value(
    json: &SizeValueJson,
) -> Result<Option<DiskSize>, StorageError> {
    match json {
        SizeValueJson::Number(bytes) => Ok(Some(DiskSize::Bytes(*bytes))),
        SizeValueJson::Text(s) if s.trim() == SIZE_CURRENT => Ok(None),
        SizeValueJson::Text(s) => DiskSize::parse(s).map(Some),
    }
}

pub(crate) fn convert_size(json: &SizeJson) -> Result<Size, StorageError> {
    match json {
        SizeJson::Value(value) => {
            let size = convert_size_value(value)?;
            Ok(Size::range(size, size))
        }

        SizeJson::Range(values) => match values.as_slice() {
            [min] => Ok(Size::range(convert_size_value(min)?, Some(DiskSize::Unlimited))),
            [min, max] => Ok(Size::range(
                convert_size_value(min)?,
                convert_size_value(max)?,
            )),
            _ => Err(StorageError::BadConfig(format!(
                "bad size range: expecting 1 or 2 values, got {}",
                values.len()
            ))),
        },

        SizeJson::Bounds { min, max } => {
            let max = match max {
                Some(max) => convert_size_value(max)?,
                None => Some(DiskSize::Unlimited),
            };

            Ok(Size::range(convert_size_value(min)?, max))
        }
    }
}

pub(crate) fn convert_encryption(json: &EncryptionJson) -> Encryption {
    let luks = |method: EncryptionMethod, luks: &LuksJson| Encryption {
        method: Some(method),
        password: luks.password.clone(),
        key_size: luks.key_size,
        pbkd_function: luks.pbkd_function,
        cipher: luks.cipher.clone(),
        label: luks.label.clone(),
    };

    let password = |method: EncryptionMethod, json: &PasswordJson| Encryption {
        password: json.password.clone(),
        ..Encryption::with_method(method)
    };

    match json {
        EncryptionJson::Luks1(json) => luks(EncryptionMethod::Luks1, json),
        EncryptionJson::Luks2(json) => luks(EncryptionMethod::Luks2, json),
        EncryptionJson::PervasiveLuks2(json) => {
            password(EncryptionMethod::PervasiveLuks2, json)
        }
        EncryptionJson::TpmFde(json) => password(EncryptionMethod::TpmFde, json),
        EncryptionJson::ProtectedSwap => {
            Encryption::with_method(EncryptionMethod::ProtectedSwap)
        }
        EncryptionJson::SecureSwap => Encryption::with_method(EncryptionMethod::SecureSwap),
        EncryptionJson::RandomSwap => Encryption::with_method(EncryptionMethod::RandomSwap),
    }
}

pub(crate) fn parse_fs_type(name: &str) -> Result<FsType, StorageError> {
    serde_json::from_value(serde_json::Value::String(name.to_string()))
        .map_err(|_| StorageError::BadConfig(format!("unknown filesystem type {name}")))
}

pub(crate) fn convert_filesystem(json: &FilesystemJson) -> Result<Filesystem, StorageError> {
    let fs_type = match &json.fs_type {
        None => None,
        Some(FilesystemTypeJson::Name(name)) => Some(FilesystemType::new(parse_fs_type(name)?)),
        Some(FilesystemTypeJson::Btrfs { btrfs }) => Some(FilesystemType {
            fs_type: FsType::Btrfs,
            default: false,
            btrfs: Some(Btrfs {
                snapshots: btrfs.snapshots,
                ..Default::default()
            }),
        }),
    };

    Ok(Filesystem {
        reuse: json.reuse_if_possible.unwrap_or(false),
        fs_type,
        label: json.label.clone(),
        path: json.path.clone(),
        mount_by: json.mount_by,
        mkfs_options: json.mkfs_options.clone().unwrap_or_default(),
        mount_options: json.mount_options.clone().unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BlockDevice;
    use crate::entity::device::{
        MountBy,
        PbkdFunction,
        PtableType,
        RaidLevel,
    };

    fn config(json: &str) -> Config {
        let json = ConfigJson::from_json(json).expect("failed to parse json");
        convert(&json).expect("failed to convert config")
    }

    #[test]
    fn test_convert_defaults() {
        let config = config(r#"{ "drives": [{ "partitions": [{}] }] }"#);

        assert!(config.boot.configure);
        assert!(config.boot.device.default);
        assert_eq!(config.boot.device.alias, None);

        let drive = &config.drives[0];
        assert_eq!(drive.search.max, Some(1));
        assert_eq!(drive.search.if_not_found, IfNotFound::Error);
        assert!(drive.search.always_match());
        assert_eq!(drive.alias, None);
        assert_eq!(drive.ptable_type, None);

        let partition = &drive.partitions[0];
        assert_eq!(partition.search, None);
        assert_eq!(partition.size, Size::default());
        assert!(!partition.delete);
        assert!(!partition.delete_if_needed);
        assert_eq!(partition.encryption, None);
        assert_eq!(partition.filesystem, None);
    }

    #[test]
    fn test_convert_boot() {
        let config = config(r#"{ "boot": { "configure": false, "device": "disk" } }"#);

        assert!(!config.boot.configure);
        assert!(!config.boot.device.default);
        assert_eq!(config.boot.device.alias.as_deref(), Some("disk"));
    }

    #[test]
    fn test_convert_search() {
        struct TestConvertSearch {
            json: &'static str,
            name: Option<&'static str>,
            size: Option<SizeCondition>,
            partition_number: Option<u32>,
            max: Option<usize>,
            if_not_found: IfNotFound,
        }

        let tests = vec![
            TestConvertSearch {
                json: r#""/dev/vda1""#,
                name: Some("/dev/vda1"),
                size: None,
                partition_number: None,
                max: None,
                if_not_found: IfNotFound::Error,
            },
            TestConvertSearch {
                json: r#""*""#,
                name: None,
                size: None,
                partition_number: None,
                max: None,
                if_not_found: IfNotFound::Skip,
            },
            TestConvertSearch {
                json: r#"{ "condition": { "name": "/dev/vda" }, "ifNotFound": "skip" }"#,
                name: Some("/dev/vda"),
                size: None,
                partition_number: None,
                max: None,
                if_not_found: IfNotFound::Skip,
            },
            TestConvertSearch {
                json: r#"{ "condition": { "size": "2 GiB" }, "max": 3 }"#,
                name: None,
                size: Some(SizeCondition {
                    value: DiskSize::gib(2),
                    operator: SizeOperator::Equal,
                }),
                partition_number: None,
                max: Some(3),
                if_not_found: IfNotFound::Error,
            },
            TestConvertSearch {
                json: r#"{ "condition": { "size": { "greater": "2 GiB" } } }"#,
                name: None,
                size: Some(SizeCondition {
                    value: DiskSize::gib(2),
                    operator: SizeOperator::Greater,
                }),
                partition_number: None,
                max: None,
                if_not_found: IfNotFound::Error,
            },
            TestConvertSearch {
                json: r#"{ "condition": { "size": { "less": 1024 } } }"#,
                name: None,
                size: Some(SizeCondition {
                    value: DiskSize::Bytes(1024),
                    operator: SizeOperator::Less,
                }),
                partition_number: None,
                max: None,
                if_not_found: IfNotFound::Error,
            },
            TestConvertSearch {
                json: r#"{ "condition": { "number": 2 }, "ifNotFound": "create" }"#,
                name: None,
                size: None,
                partition_number: Some(2),
                max: None,
                if_not_found: IfNotFound::Create,
            },
        ];

        for test in tests {
            let json: SearchJson =
                serde_json::from_str(test.json).expect("failed to parse search");
            let search = convert_search(&json).expect("failed to convert search");

            assert_eq!(search.name.as_deref(), test.name, "{}", test.json);
            assert_eq!(search.size, test.size, "{}", test.json);
            assert_eq!(search.partition_number, test.partition_number, "{}", test.json);
            assert_eq!(search.max, test.max, "{}", test.json);
            assert_eq!(search.if_not_found, test.if_not_found, "{}", test.json);
            assert!(!search.is_solved());
        }

        let bad: SearchJson = serde_json::from_str(
            r#"{ "condition": { "size": { "greater": "1 GiB", "less": "2 GiB" } } }"#,
        )
        .expect("failed to parse search");
        assert!(convert_search(&bad).is_err());
    }

    #[test]
    fn test_convert_sort() {
        let json: SearchJson = serde_json::from_str(
            r#"{ "sort": [{ "size": "desc" }, { "name": "asc" }] }"#,
        )
        .expect("failed to parse search");
        let search = convert_search(&json).expect("failed to convert search");

        assert_eq!(
            search.sort,
            vec![
                SortCriterion {
                    key: SortKey::Size,
                    order: crate::config::search::SortOrder::Desc
                },
                SortCriterion {
                    key: SortKey::Name,
                    order: crate::config::search::SortOrder::Asc
                },
            ]
        );
    }

    #[test]
    fn test_convert_size() {
        let tests = vec![
            (r#""10 GiB""#, Size::fixed(DiskSize::gib(10))),
            ("3221225472", Size::fixed(DiskSize::gib(3))),
            (r#"["10 GiB"]"#, Size::range(Some(DiskSize::gib(10)), Some(DiskSize::Unlimited))),
            (r#"["current"]"#, Size::range(None, Some(DiskSize::Unlimited))),
            (r#"[3221225472, "10 Gib"]"#, Size::range(Some(DiskSize::gib(3)), Some(DiskSize::gib(10)))),
            (r#"["current", "10 GiB"]"#, Size::range(None, Some(DiskSize::gib(10)))),
            (r#"["10 GiB", "current"]"#, Size::range(Some(DiskSize::gib(10)), None)),
            (r#"["current", "current"]"#, Size::range(None, None)),
            (r#"{ "min": "10 GiB" }"#, Size::range(Some(DiskSize::gib(10)), Some(DiskSize::Unlimited))),
            (r#"{ "min": "1 GiB", "max": "unlimited" }"#, Size::range(Some(DiskSize::gib(1)), Some(DiskSize::Unlimited))),
            (r#"{ "min": 0, "max": "current" }"#, Size::range(Some(DiskSize::ZERO), None)),
        ];

        for (json, expected) in tests {
            let size: SizeJson = serde_json::from_str(json).expect("failed to parse size");
            let size = convert_size(&size).expect("failed to convert size");

            assert_eq!(size, expected, "unexpected size for {json}");
            assert!(!size.default);
        }

        for json in [r#"[]"#, r#"["1 GiB", "2 GiB", "3 GiB"]"#, r#""lots""#] {
            let size: SizeJson = serde_json::from_str(json).expect("failed to parse size");
            assert!(convert_size(&size).is_err(), "{json} should be invalid");
        }
    }

    #[test]
    fn test_convert_encryption() {
        let config = config(
            r#"{
                "drives": [{
                    "encryption": {
                        "luks2": {
                            "password": "12345",
                            "keySize": 256,
                            "pbkdFunction": "argon2i",
                            "cipher": "twofish",
                            "label": "test"
                        }
                    },
                    "partitions": [
                        { "encryption": { "pervasiveLuks2": { "password": "12345" } } },
                        { "encryption": { "tpmFde": { "password": "12345" } } },
                        { "encryption": "protected_swap" }
                    ]
                }]
            }"#,
        );

        let drive = &config.drives[0];
        assert_eq!(
            drive.encryption,
            Some(Encryption {
                method: Some(EncryptionMethod::Luks2),
                password: Some("12345".into()),
                key_size: Some(256),
                pbkd_function: Some(PbkdFunction::Argon2i),
                cipher: Some("twofish".into()),
                label: Some("test".into()),
            })
        );

        let methods: Vec<_> = drive
            .partitions
            .iter()
            .map(|p| p.encryption().and_then(|e| e.method))
            .collect();

        assert_eq!(
            methods,
            vec![
                Some(EncryptionMethod::PervasiveLuks2),
                Some(EncryptionMethod::TpmFde),
                Some(EncryptionMethod::ProtectedSwap),
            ]
        );

        let tpm = drive.partitions[1].encryption.as_ref().expect("no encryption");
        assert_eq!(tpm.password.as_deref(), Some("12345"));
        assert_eq!(tpm.key_size, None);
        assert_eq!(tpm.pbkd_function, None);
    }

    #[test]
    fn test_convert_filesystem() {
        let config = config(
            r#"{
                "drives": [{
                    "ptableType": "gpt",
                    "filesystem": {
                        "reuseIfPossible": true,
                        "type": "xfs",
                        "label": "test",
                        "path": "/test",
                        "mountBy": "device",
                        "mkfsOptions": ["version=2"],
                        "mountOptions": ["rw"]
                    },
                    "partitions": [
                        { "filesystem": { "type": { "btrfs": { "snapshots": true } } } },
                        { "filesystem": {} }
                    ]
                }]
            }"#,
        );

        let drive = &config.drives[0];
        assert_eq!(drive.ptable_type, Some(PtableType::Gpt));

        let fs = drive.filesystem.as_ref().expect("no filesystem");
        assert!(fs.reuse);
        assert_eq!(fs.fs_type, Some(FilesystemType::new(FsType::Xfs)));
        assert_eq!(fs.label.as_deref(), Some("test"));
        assert_eq!(fs.path.as_deref(), Some("/test"));
        assert_eq!(fs.mount_by, Some(MountBy::Device));
        assert_eq!(fs.mkfs_options, vec!["version=2".to_string()]);
        assert_eq!(fs.mount_options, vec!["rw".to_string()]);

        let btrfs = drive.partitions[0].filesystem.as_ref().expect("no filesystem");
        assert!(!btrfs.reuse);
        assert!(btrfs.snapshots());
        assert_eq!(btrfs.path, None);
        assert!(btrfs.mkfs_options.is_empty());

        assert_eq!(drive.partitions[1].filesystem, Some(Filesystem::default()));

        let bad = ConfigJson::from_json(
            r#"{ "drives": [{ "filesystem": { "type": "zfs" } }] }"#,
        )
        .expect("failed to parse json");

        match convert(&bad) {
            Err(StorageError::BadConfig(msg)) => assert!(msg.contains("zfs")),
            result => panic!("unexpected result {result:?}"),
        }
    }

    #[test]
    fn test_convert_md_raids_and_volume_groups() {
        let config = config(
            r#"{
                "mdRaids": [{
                    "alias": "md0",
                    "level": "raid1",
                    "chunkSize": "64 KiB",
                    "devices": ["disk1", "disk2"]
                }],
                "volumeGroups": [{
                    "name": "system",
                    "extentSize": "4 MiB",
                    "physicalVolumes": [
                        "md0",
                        { "generate": { "targetDevices": ["disk3"], "encryption": "random_swap" } }
                    ],
                    "logicalVolumes": [
                        { "generate": "default" },
                        { "alias": "pool", "pool": true, "size": "20 GiB" },
                        { "name": "thin", "usedPool": "pool", "stripes": 2, "stripeSize": "8 KiB" }
                    ]
                }]
            }"#,
        );

        let md = &config.md_raids[0];
        assert_eq!(md.level, Some(RaidLevel::Raid1));
        assert_eq!(md.chunk_size, Some(DiskSize::Bytes(64 * 1024)));
        assert_eq!(md.devices, vec!["disk1".to_string(), "disk2".to_string()]);
        assert_eq!(md.search, None);

        let vg = &config.volume_groups[0];
        assert_eq!(vg.name.as_deref(), Some("system"));
        assert_eq!(vg.extent_size, Some(DiskSize::mib(4)));
        assert_eq!(vg.physical_volumes, vec!["md0".to_string()]);
        assert_eq!(vg.physical_volumes_devices, vec!["disk3".to_string()]);
        assert_eq!(
            vg.physical_volumes_encryption,
            Some(Encryption::with_method(EncryptionMethod::RandomSwap))
        );

        // Unsolved generate entries are dropped
        assert_eq!(vg.logical_volumes.len(), 2);
        assert!(vg.logical_volumes[0].pool);
        assert_eq!(vg.logical_volumes[0].size, Size::fixed(DiskSize::gib(20)));
        assert_eq!(vg.logical_volumes[1].used_pool.as_deref(), Some("pool"));
        assert_eq!(vg.logical_volumes[1].stripes, Some(2));
        assert_eq!(vg.logical_volumes[1].stripe_size, Some(DiskSize::Bytes(8 * 1024)));
        assert_eq!(vg.logical_volumes[1].size, Size::default());
    }
}
