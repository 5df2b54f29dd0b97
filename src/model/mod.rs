//! Config model, the simplified view of a solved storage config which
//! user interfaces edit. Devices are referenced by name instead of alias.

pub mod mutations;
pub mod support;

use serde::{
    Deserialize,
    Serialize,
};

use crate::config::{
    self as storage,
    BlockDevice,
    Partitionable,
};
use crate::entity::device::{
    EncryptionMethod,
    PartitionId,
    PtableType,
};
use crate::entity::size::DiskSize;
use crate::errors::StorageError;
use crate::product::Product;

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boot: Option<Boot>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encryption: Option<Encryption>,

    #[serde(default)]
    pub drives: Vec<Drive>,

    /// MD RAIDs share the drive model
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub md_raids: Vec<Drive>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub volume_groups: Vec<VolumeGroup>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Boot {
    pub configure: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device: Option<BootDevice>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BootDevice {
    pub default: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Encryption {
    pub method: EncryptionMethod,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpacePolicy {
    Delete,
    Resize,
    Keep,
    Custom,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Drive {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mount_path: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filesystem: Option<Filesystem>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub space_policy: Option<SpacePolicy>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ptable_type: Option<PtableType>,

    #[serde(default)]
    pub partitions: Vec<Partition>,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Partition {
    /// Name of the existing partition, none for new partitions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<PartitionId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mount_path: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filesystem: Option<Filesystem>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<Size>,

    #[serde(default, skip_serializing_if = "is_false")]
    pub delete: bool,

    #[serde(default, skip_serializing_if = "is_false")]
    pub delete_if_needed: bool,

    #[serde(default, skip_serializing_if = "is_false")]
    pub resize: bool,

    #[serde(default, skip_serializing_if = "is_false")]
    pub resize_if_needed: bool,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Filesystem {
    #[serde(default)]
    pub reuse: bool,

    #[serde(default)]
    pub default: bool,

    /// Filesystem name, or `btrfsSnapshots` and `btrfsImmutable` for the
    /// btrfs flavours
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub fs_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// A `None` max means the size of the existing device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Size {
    pub default: bool,
    pub min: DiskSize,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<DiskSize>,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeGroup {
    pub vg_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extent_size: Option<DiskSize>,

    /// Names of the devices where physical volumes are created
    #[serde(default)]
    pub target_devices: Vec<String>,

    #[serde(default)]
    pub logical_volumes: Vec<LogicalVolume>,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogicalVolume {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lv_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mount_path: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filesystem: Option<Filesystem>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<Size>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stripes: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stripe_size: Option<DiskSize>,
}

fn is_false(b: &bool) -> bool {
    !b
}

impl Config {
    pub fn from_json(s: &str) -> Result<Self, StorageError> {
        serde_json::from_str(s).map_err(|err| StorageError::BadModel(err.to_string()))
    }

    pub fn to_json_string(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    pub fn drive(&self, name: &str) -> Option<&Drive> {
        self.drives.iter().find(|d| d.name == name)
    }

    pub fn is_boot(&self, name: &str) -> bool {
        match &self.boot {
            Some(boot) => {
                boot.configure
                    && boot.device.as_ref().and_then(|d| d.name.as_deref()) == Some(name)
            }
            None => false,
        }
    }

    /// The user chose the device for booting, even if boot is not
    /// configured anymore
    pub fn is_explicit_boot(&self, name: &str) -> bool {
        match self.boot.as_ref().and_then(|b| b.device.as_ref()) {
            Some(device) => !device.default && device.name.as_deref() == Some(name),
            None => false,
        }
    }

    /// Name of the drive explicitly chosen for booting
    pub fn explicit_boot_name(&self) -> Option<&str> {
        let name = self.boot.as_ref()?.device.as_ref()?.name.as_deref()?;
        self.is_explicit_boot(name).then_some(name)
    }

    /// Whether some volume group creates physical volumes on the drive
    pub fn drive_has_pv(&self, name: &str) -> bool {
        self.volume_groups
            .iter()
            .any(|vg| vg.target_devices.iter().any(|t| t == name))
    }

    pub fn used_mount_paths(&self) -> Vec<String> {
        let drives = self
            .drives
            .iter()
            .chain(self.md_raids.iter())
            .flat_map(Drive::all_mount_paths);

        let lvs = self
            .volume_groups
            .iter()
            .flat_map(|vg| vg.logical_volumes.iter())
            .filter_map(|lv| lv.mount_path.clone());

        drives.chain(lvs).collect()
    }

    /// Mount paths of the product volumes not used by the model yet
    pub fn unused_mount_paths(&self, product: &Product) -> Vec<String> {
        let used = self.used_mount_paths();

        product
            .storage
            .volume_templates
            .iter()
            .map(|t| t.mount_path.clone())
            .filter(|path| !path.is_empty() && !used.contains(path))
            .collect()
    }
}

impl Drive {
    /// Whether the drive holds new or reused partitions
    pub fn is_used(&self) -> bool {
        self.partitions.iter().any(|p| p.is_new() || p.is_reused())
    }

    pub fn all_mount_paths(&self) -> Vec<String> {
        match &self.mount_path {
            Some(path) => vec![path.clone()],
            None => self
                .partitions
                .iter()
                .filter_map(|p| p.mount_path.clone())
                .collect(),
        }
    }

    /// Existing partitions the user did something with
    pub fn configured_existing_partitions(&self) -> Vec<&Partition> {
        let custom = self.space_policy == Some(SpacePolicy::Custom);

        self.partitions
            .iter()
            .filter(|p| match custom {
                true => !p.is_new() && (p.is_used() || p.is_space_action()),
                false => p.is_reused(),
            })
            .collect()
    }

    pub fn partition_by_path(&self, mount_path: &str) -> Option<usize> {
        self.partitions
            .iter()
            .position(|p| p.mount_path.as_deref() == Some(mount_path))
    }
}

impl Partition {
    pub fn is_new(&self) -> bool {
        self.name.is_none()
    }

    pub fn is_used(&self) -> bool {
        self.filesystem.is_some()
    }

    pub fn is_reused(&self) -> bool {
        !self.is_new() && self.is_used()
    }

    /// Deleted or resized to make space
    pub fn is_space_action(&self) -> bool {
        self.delete || self.delete_if_needed || self.resize_if_needed
    }
}

/// Builds the model of a solved config
pub fn from_config(config: &storage::Config) -> Config {
    let drives = config
        .drives
        .iter()
        .filter(|d| d.is_valid())
        .map(|d| drive(Partitionable::Drive(d)))
        .collect();

    let md_raids = config
        .md_raids
        .iter()
        .filter(|md| md.is_valid())
        .map(|md| drive(Partitionable::MdRaid(md)))
        .collect();

    let volume_groups = config
        .volume_groups
        .iter()
        .map(|vg| volume_group(config, vg))
        .collect();

    Config {
        boot: Some(boot(config)),
        encryption: encryption(config),
        drives,
        md_raids,
        volume_groups,
    }
}

fn boot(config: &storage::Config) -> Boot {
    let name = config
        .boot
        .device
        .alias
        .as_deref()
        .and_then(|alias| config.partitionable(alias))
        .and_then(partitionable_name);

    Boot {
        configure: config.boot.configure,
        device: Some(BootDevice {
            default: config.boot.device.default,
            name,
        }),
    }
}

/// Encryption of the first encrypted device
fn encryption(config: &storage::Config) -> Option<Encryption> {
    let devices = config.with_encryption();
    let pvs = config
        .volume_groups
        .iter()
        .filter_map(|vg| vg.physical_volumes_encryption.as_ref());

    devices
        .into_iter()
        .filter_map(|d| d.encryption())
        .chain(pvs)
        .find_map(|e| {
            Some(Encryption {
                method: e.method?,
                password: e.password.clone(),
            })
        })
}

/// Name of the found device, or the searched one when the device is not
/// going to be created
fn device_name(device: &dyn BlockDevice) -> Option<String> {
    if let Some(found) = device.found_device() {
        return Some(found.name.clone());
    }

    let search = device.search()?;
    match search.create_device() {
        true => None,
        false => search.name.clone(),
    }
}

fn partitionable_name(device: Partitionable) -> Option<String> {
    match device {
        Partitionable::Drive(d) => device_name(d),
        Partitionable::MdRaid(md) => device_name(md).or_else(|| md.name.clone()),
    }
}

/// Partitions with a search matching any device, the "*" entries
fn is_any(partition: &storage::Partition) -> bool {
    partition
        .search
        .as_ref()
        .map(|s| s.always_match() && s.if_not_found == storage::search::IfNotFound::Skip)
        .unwrap_or(false)
}

fn space_policy(partitions: &[storage::Partition]) -> SpacePolicy {
    let any: Vec<&storage::Partition> = partitions.iter().filter(|p| is_any(p)).collect();

    if any.iter().any(|p| p.delete) {
        return SpacePolicy::Delete;
    }

    let shrink_any = any
        .iter()
        .any(|p| !p.size.default && p.size.min == Some(DiskSize::ZERO));

    if shrink_any {
        return SpacePolicy::Resize;
    }

    let custom = partitions
        .iter()
        .filter(|p| !is_any(p) && p.found_device().is_some())
        .any(|p| p.delete || p.delete_if_needed || p.is_resized());

    match custom {
        true => SpacePolicy::Custom,
        false => SpacePolicy::Keep,
    }
}

fn drive(device: Partitionable) -> Drive {
    let block_device = device.device();
    let (ptable_type, partitions) = match device {
        Partitionable::Drive(d) => (d.ptable_type, &d.partitions),
        Partitionable::MdRaid(md) => (md.ptable_type, &md.partitions),
    };

    Drive {
        name: partitionable_name(device).unwrap_or_default(),
        alias: block_device.alias().map(String::from),
        mount_path: block_device.path().map(String::from),
        filesystem: block_device.filesystem().map(filesystem),
        space_policy: Some(space_policy(partitions)),
        ptable_type,
        partitions: partitions
            .iter()
            .filter(|p| !is_any(p) && p.is_valid())
            .map(partition)
            .collect(),
    }
}

fn partition(partition: &storage::Partition) -> Partition {
    let name = device_name(partition);
    let reused = partition.found_device().is_some();
    let size = &partition.size;

    let resized = partition.is_resized();
    let resize = resized && size.min == size.max;
    let resize_if_needed = resized && size.min != size.max;

    Partition {
        name,
        alias: partition.alias.clone(),
        id: partition.id,
        mount_path: partition.path().map(String::from),
        filesystem: partition.filesystem.as_ref().map(filesystem),
        size: (!reused || resized).then(|| model_size(size)).flatten(),
        delete: partition.delete,
        delete_if_needed: partition.delete_if_needed,
        resize,
        resize_if_needed,
    }
}

fn model_size(size: &storage::Size) -> Option<Size> {
    Some(Size {
        default: size.default,
        min: size.min?,
        max: size.max,
    })
}

fn filesystem(fs: &storage::Filesystem) -> Filesystem {
    Filesystem {
        reuse: fs.reuse,
        default: fs.fs_type.as_ref().map(|t| t.default).unwrap_or(false),
        fs_type: fs.fs_type.as_ref().map(fs_type_name),
        label: fs.label.clone(),
    }
}

fn fs_type_name(fs_type: &storage::FilesystemType) -> String {
    let read_only = fs_type
        .btrfs
        .as_ref()
        .and_then(|b| b.read_only)
        .unwrap_or(false);

    match (fs_type.snapshots(), read_only) {
        (true, _) => "btrfsSnapshots".to_string(),
        (false, true) if fs_type.fs_type.is_btrfs() => "btrfsImmutable".to_string(),
        _ => fs_type.fs_type.name().to_string(),
    }
}

fn volume_group(config: &storage::Config, vg: &storage::VolumeGroup) -> VolumeGroup {
    let target_devices = vg
        .physical_volumes_devices
        .iter()
        .map(|alias| {
            config
                .partitionable(alias)
                .and_then(partitionable_name)
                .unwrap_or_else(|| alias.clone())
        })
        .collect();

    let logical_volumes = vg
        .logical_volumes
        .iter()
        .map(|lv| LogicalVolume {
            lv_name: lv.name.clone(),
            mount_path: lv.path().map(String::from),
            filesystem: lv.filesystem.as_ref().map(filesystem),
            size: model_size(&lv.size),
            stripes: lv.stripes,
            stripe_size: lv.stripe_size,
        })
        .collect();

    VolumeGroup {
        vg_name: vg.name.clone().unwrap_or_default(),
        extent_size: vg.extent_size,
        target_devices,
        logical_volumes,
    }
}
