//! Raw storage config as written by users.
//!
//! These types mirror the JSON document shape and keep every field optional,
//! defaults are applied when converting into [`crate::config::Config`].

use serde::de::DeserializeOwned;
use serde::{
    Deserialize,
    Deserializer,
    Serialize,
    Serializer,
};

use crate::config::search::{
    IfNotFound,
    SortOrder,
};
use crate::entity::device::{
    MdParity,
    MountBy,
    PartitionId,
    PbkdFunction,
    PtableType,
    RaidLevel,
};
use crate::errors::StorageError;

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ConfigJson {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub boot: Option<BootJson>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub drives: Option<Vec<DriveJson>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub md_raids: Option<Vec<MdRaidJson>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume_groups: Option<Vec<VolumeGroupJson>>,
}

impl ConfigJson {
    /// Parses a storage JSON document. The config may be wrapped
    /// in a top-level `storage` key.
    pub fn from_json(s: &str) -> Result<Self, StorageError> {
        let mut doc: serde_json::Value = serde_json::from_str(s)
            .map_err(|err| StorageError::BadConfig(err.to_string()))?;

        if let Some(storage) = doc.get_mut("storage") {
            doc = storage.take();
        }

        serde_json::from_value(doc)
            .map_err(|err| StorageError::BadConfig(err.to_string()))
    }

    pub fn to_json_string(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct BootJson {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub configure: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DriveJson {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<SearchJson>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub encryption: Option<EncryptionJson>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub filesystem: Option<FilesystemJson>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub ptable_type: Option<PtableType>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub partitions: Option<Vec<Entry<PartitionJson>>>,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PartitionJson {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<SearchJson>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<PartitionId>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<SizeJson>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub encryption: Option<EncryptionJson>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub filesystem: Option<FilesystemJson>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub delete: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub delete_if_needed: Option<bool>,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct MdRaidJson {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<SearchJson>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<RaidLevel>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub parity: Option<MdParity>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunk_size: Option<SizeValueJson>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub devices: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub encryption: Option<EncryptionJson>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub filesystem: Option<FilesystemJson>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub ptable_type: Option<PtableType>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub partitions: Option<Vec<Entry<PartitionJson>>>,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct VolumeGroupJson {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub extent_size: Option<SizeValueJson>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub physical_volumes: Option<Vec<PhysicalVolumeJson>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub logical_volumes: Option<Vec<Entry<LogicalVolumeJson>>>,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct LogicalVolumeJson {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<SizeJson>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub stripes: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub stripe_size: Option<SizeValueJson>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub pool: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub used_pool: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub encryption: Option<EncryptionJson>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub filesystem: Option<FilesystemJson>,
}

/// A physical volume is either an alias, or a request to generate
/// physical volumes on the given target devices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PhysicalVolumeJson {
    Alias(String),
    Generate { generate: PvGenerateJson },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PvGenerateJson {
    Targets(Vec<String>),
    Section(PvGenerateSectionJson),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PvGenerateSectionJson {
    pub target_devices: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub encryption: Option<EncryptionJson>,
}

/// An entry of a partitions or logical volumes list: either a regular
/// item, or a `generate` placeholder expanded from the product volumes.
#[derive(Debug, Clone, PartialEq)]
pub enum Entry<T> {
    Generate(GenerateJson),
    Item(T),
}

impl<T> Entry<T> {
    pub fn item(&self) -> Option<&T> {
        match self {
            Self::Item(item) => Some(item),
            Self::Generate(_) => None,
        }
    }
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for Entry<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;

        let entry = match value.get("generate") {
            Some(_) => serde_json::from_value(value).map(Entry::Generate),
            None => serde_json::from_value(value).map(Entry::Item),
        };

        entry.map_err(serde::de::Error::custom)
    }
}

impl<T: Serialize> Serialize for Entry<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Generate(generate) => generate.serialize(serializer),
            Self::Item(item) => item.serialize(serializer),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GenerateJson {
    pub generate: GenerateValueJson,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GenerateValueJson {
    Mode(GenerateMode),
    Section(GenerateSectionJson),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerateMode {
    /// All product default volumes
    Default,
    /// Only the product volumes marked as required
    Mandatory,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct GenerateSectionJson {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partitions: Option<GenerateMode>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub logical_volumes: Option<GenerateMode>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub encryption: Option<EncryptionJson>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub stripes: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub stripe_size: Option<SizeValueJson>,
}

impl GenerateValueJson {
    pub fn mode(&self) -> Option<GenerateMode> {
        match self {
            Self::Mode(mode) => Some(*mode),
            Self::Section(section) => section.partitions.or(section.logical_volumes),
        }
    }

    pub fn section(&self) -> Option<&GenerateSectionJson> {
        match self {
            Self::Mode(_) => None,
            Self::Section(section) => Some(section),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SearchJson {
    /// A device name, or `*` for any device
    Name(String),
    Section(SearchSectionJson),
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SearchSectionJson {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<SearchConditionJson>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<SortJson>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub if_not_found: Option<IfNotFound>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SearchConditionJson {
    Name { name: String },
    Size { size: SizeConditionJson },
    Number { number: u32 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SizeConditionJson {
    Value(SizeValueJson),
    Operator(SizeOperatorJson),
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SizeOperatorJson {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub equal: Option<SizeValueJson>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub greater: Option<SizeValueJson>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub less: Option<SizeValueJson>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SortJson {
    One(SortCriterionJson),
    Many(Vec<SortCriterionJson>),
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SortCriterionJson {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<SortOrder>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<SortOrder>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub number: Option<SortOrder>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SizeJson {
    Value(SizeValueJson),
    Range(Vec<SizeValueJson>),
    Bounds {
        min: SizeValueJson,

        #[serde(skip_serializing_if = "Option::is_none")]
        max: Option<SizeValueJson>,
    },
}

/// A size bound: byte count, human string ("2 GiB"), "unlimited" or "current"
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SizeValueJson {
    Number(u64),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EncryptionJson {
    #[serde(rename = "luks1")]
    Luks1(LuksJson),

    #[serde(rename = "luks2")]
    Luks2(LuksJson),

    #[serde(rename = "pervasiveLuks2")]
    PervasiveLuks2(PasswordJson),

    #[serde(rename = "tpmFde")]
    TpmFde(PasswordJson),

    #[serde(rename = "protected_swap")]
    ProtectedSwap,

    #[serde(rename = "secure_swap")]
    SecureSwap,

    #[serde(rename = "random_swap")]
    RandomSwap,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct LuksJson {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_size: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub pbkd_function: Option<PbkdFunction>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub cipher: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PasswordJson {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FilesystemJson {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reuse_if_possible: Option<bool>,

    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub fs_type: Option<FilesystemTypeJson>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub mount_by: Option<MountBy>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub mkfs_options: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub mount_options: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilesystemTypeJson {
    Name(String),
    Btrfs { btrfs: BtrfsJson },
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BtrfsJson {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshots: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_wrapped_config() {
        let plain = r#"{ "drives": [{ "alias": "disk" }] }"#;
        let wrapped = r#"{ "storage": { "drives": [{ "alias": "disk" }] } }"#;

        let plain = ConfigJson::from_json(plain).expect("failed to parse plain");
        let wrapped =
            ConfigJson::from_json(wrapped).expect("failed to parse wrapped");

        assert_eq!(plain, wrapped);
    }

    #[test]
    fn test_parse_entries() {
        let json = r#"{
            "drives": [{
                "partitions": [
                    { "generate": "default" },
                    { "generate": { "partitions": "mandatory", "encryption": "random_swap" } },
                    { "filesystem": { "path": "/home", "type": "xfs" } }
                ]
            }]
        }"#;

        let config = ConfigJson::from_json(json).expect("failed to parse config");
        let drives = config.drives.expect("missing drives");
        let partitions = drives[0].partitions.as_ref().expect("missing partitions");

        assert_eq!(partitions.len(), 3);

        match &partitions[0] {
            Entry::Generate(g) => {
                assert_eq!(g.generate.mode(), Some(GenerateMode::Default))
            }
            Entry::Item(_) => panic!("expected generate entry"),
        }

        match &partitions[1] {
            Entry::Generate(g) => {
                assert_eq!(g.generate.mode(), Some(GenerateMode::Mandatory));

                let section = g.generate.section().expect("missing section");
                assert_eq!(section.encryption, Some(EncryptionJson::RandomSwap));
            }
            Entry::Item(_) => panic!("expected generate entry"),
        }

        let item = partitions[2].item().expect("expected partition");
        let fs = item.filesystem.as_ref().expect("missing filesystem");
        assert_eq!(fs.path.as_deref(), Some("/home"));
        assert_eq!(fs.fs_type, Some(FilesystemTypeJson::Name("xfs".into())));
    }

    #[test]
    fn test_parse_bad_config() {
        let should_err = vec![
            // Unknown key
            r#"{ "disks": [] }"#,
            // Unknown partition key
            r#"{ "drives": [{ "partitions": [{ "mountPath": "/" }] }] }"#,
            // Unknown encryption method
            r#"{ "drives": [{ "encryption": { "luks3": {} } }] }"#,
            // Unknown RAID level
            r#"{ "mdRaids": [{ "level": "raid7" }] }"#,
            // Not JSON
            "drives: []",
        ];

        for json in should_err {
            assert!(
                ConfigJson::from_json(json).is_err(),
                "unexpected ok for {json}"
            );
        }
    }

    #[test]
    fn test_parse_encryption_and_physical_volumes() {
        let json = r#"{
            "volumeGroups": [{
                "name": "system",
                "physicalVolumes": [
                    "pv1",
                    { "generate": ["disk1"] },
                    { "generate": {
                        "targetDevices": ["disk2"],
                        "encryption": { "luks2": { "password": "notsecret" } }
                    } }
                ]
            }]
        }"#;

        let config = ConfigJson::from_json(json).expect("failed to parse config");
        let vgs = config.volume_groups.expect("missing volume groups");
        let pvs = vgs[0].physical_volumes.as_ref().expect("missing pvs");

        assert_eq!(
            pvs[0],
            PhysicalVolumeJson::Alias("pv1".into())
        );
        assert_eq!(
            pvs[1],
            PhysicalVolumeJson::Generate {
                generate: PvGenerateJson::Targets(vec!["disk1".into()])
            }
        );
        assert_eq!(
            pvs[2],
            PhysicalVolumeJson::Generate {
                generate: PvGenerateJson::Section(PvGenerateSectionJson {
                    target_devices: vec!["disk2".into()],
                    encryption: Some(EncryptionJson::Luks2(LuksJson {
                        password: Some("notsecret".into()),
                        ..Default::default()
                    })),
                })
            }
        );
    }
}
