pub mod device;
pub mod search;
pub mod volume;

use std::collections::HashSet;

use crate::constants::ROOT_PATH;

pub use device::{
    BlockDevice,
    Boot,
    BootDevice,
    DeviceKind,
    Drive,
    LogicalVolume,
    MdRaid,
    Partition,
    Partitionable,
    VolumeGroup,
};
pub use search::Search;
pub use volume::{
    Encryption,
    Filesystem,
    FilesystemType,
    Size,
};

/// Typed storage config
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Config {
    pub boot: Boot,
    pub drives: Vec<Drive>,
    pub md_raids: Vec<MdRaid>,
    pub volume_groups: Vec<VolumeGroup>,
}

/// A config referencing some device by its alias
#[derive(Debug, Clone, Copy)]
pub enum DeviceUser<'a> {
    MdRaid(&'a MdRaid),
    VolumeGroup(&'a VolumeGroup),
    Boot,
}

impl Config {
    pub fn drive(&self, alias: &str) -> Option<&Drive> {
        self.drives.iter().find(|d| d.has_alias(alias))
    }

    pub fn md_raid(&self, alias: &str) -> Option<&MdRaid> {
        self.md_raids.iter().find(|md| md.has_alias(alias))
    }

    pub fn partitionable(&self, alias: &str) -> Option<Partitionable> {
        self.drive(alias)
            .map(Partitionable::Drive)
            .or_else(|| self.md_raid(alias).map(Partitionable::MdRaid))
    }

    pub fn partitionables(&self) -> impl Iterator<Item = Partitionable> {
        self.drives
            .iter()
            .map(Partitionable::Drive)
            .chain(self.md_raids.iter().map(Partitionable::MdRaid))
    }

    pub fn partitions(&self) -> impl Iterator<Item = &Partition> {
        self.partitionables().flat_map(|p| p.partitions().iter())
    }

    pub fn logical_volumes(&self) -> impl Iterator<Item = &LogicalVolume> {
        self.volume_groups.iter().flat_map(|vg| vg.logical_volumes.iter())
    }

    /// Every drive, partition, MD RAID and logical volume config
    pub fn block_devices(&self) -> Vec<&dyn BlockDevice> {
        let mut devices: Vec<&dyn BlockDevice> = Vec::new();

        for drive in &self.drives {
            devices.push(drive);
            devices.extend(drive.partitions.iter().map(|p| p as &dyn BlockDevice));
        }

        for md in &self.md_raids {
            devices.push(md);
            devices.extend(md.partitions.iter().map(|p| p as &dyn BlockDevice));
        }

        devices.extend(self.logical_volumes().map(|lv| lv as &dyn BlockDevice));
        devices
    }

    pub fn each_block_device_mut<F>(&mut self, mut f: F)
    where
        F: FnMut(&mut dyn BlockDevice),
    {
        for drive in &mut self.drives {
            f(drive);
            drive.partitions.iter_mut().for_each(|p| f(p));
        }

        for md in &mut self.md_raids {
            f(md);
            md.partitions.iter_mut().for_each(|p| f(p));
        }

        for vg in &mut self.volume_groups {
            vg.logical_volumes.iter_mut().for_each(|lv| f(lv));
        }
    }

    /// Block devices ignoring the configs whose search ended without device,
    /// together with their partitions
    pub fn valid_block_devices(&self) -> Vec<&dyn BlockDevice> {
        let mut devices: Vec<&dyn BlockDevice> = Vec::new();

        for parent in self.partitionables() {
            let device = parent.device();
            if !device.is_valid() {
                continue;
            }

            devices.push(device);
            devices.extend(
                parent
                    .partitions()
                    .iter()
                    .filter(|p| p.is_valid())
                    .map(|p| p as &dyn BlockDevice),
            );
        }

        devices.extend(self.logical_volumes().map(|lv| lv as &dyn BlockDevice));
        devices
    }

    pub fn with_search(&self) -> Vec<&dyn BlockDevice> {
        self.block_devices()
            .into_iter()
            .filter(|d| d.search().is_some())
            .collect()
    }

    pub fn with_encryption(&self) -> Vec<&dyn BlockDevice> {
        self.valid_block_devices()
            .into_iter()
            .filter(|d| d.encryption().is_some())
            .collect()
    }

    pub fn root_drive(&self) -> Option<&Drive> {
        self.drives.iter().find(|d| {
            d.is_valid() && (is_root(*d) || d.partitions.iter().any(|p| is_root(p)))
        })
    }

    pub fn root_md_raid(&self) -> Option<&MdRaid> {
        self.md_raids.iter().find(|md| {
            md.is_valid() && (is_root(*md) || md.partitions.iter().any(|p| is_root(p)))
        })
    }

    pub fn root_volume_group(&self) -> Option<&VolumeGroup> {
        self.volume_groups
            .iter()
            .find(|vg| vg.logical_volumes.iter().any(|lv| is_root(lv)))
    }

    /// Drive or MD RAID where boot is going to be configured
    pub fn boot_device(&self) -> Option<Partitionable> {
        if !self.boot.configure {
            return None;
        }

        self.boot
            .device
            .alias
            .as_deref()
            .and_then(|alias| self.partitionable(alias))
    }

    /// Valid drives and drive partitions, the configs which can be MD RAID
    /// members
    pub fn potential_for_md_device(&self) -> Vec<&dyn BlockDevice> {
        let mut devices: Vec<&dyn BlockDevice> = Vec::new();
        for drive in self.drives.iter().filter(|d| d.is_valid()) {
            devices.push(drive);
            devices.extend(
                drive
                    .partitions
                    .iter()
                    .filter(|p| p.is_valid())
                    .map(|p| p as &dyn BlockDevice),
            );
        }

        devices
    }

    /// MD RAIDs using the device as member, and volume groups using it
    /// as physical volume
    pub fn users(&self, alias: &str) -> Vec<DeviceUser> {
        let md_users = self
            .md_raids
            .iter()
            .filter(|md| md.devices.iter().any(|d| d == alias))
            .map(DeviceUser::MdRaid);

        let vg_users = self
            .volume_groups
            .iter()
            .filter(|vg| vg.physical_volumes.iter().any(|pv| pv == alias))
            .map(DeviceUser::VolumeGroup);

        md_users.chain(vg_users).collect()
    }

    /// Volume groups generating physical volumes on the device, plus boot
    /// when it is configured on the device
    pub fn target_users(&self, alias: &str) -> Vec<DeviceUser> {
        let mut users: Vec<DeviceUser> = self
            .volume_groups
            .iter()
            .filter(|vg| vg.physical_volumes_devices.iter().any(|d| d == alias))
            .map(DeviceUser::VolumeGroup)
            .collect();

        if self.boot.targets(alias) {
            users.push(DeviceUser::Boot);
        }

        users
    }

    pub fn aliases(&self) -> HashSet<&str> {
        self.block_devices()
            .into_iter()
            .filter_map(|d| d.alias())
            .collect()
    }

    /// Returns an alias not used by any config yet
    pub fn generate_alias(&self, kind: DeviceKind) -> String {
        let used = self.aliases();
        let prefix = kind.alias_prefix();

        (0..)
            .map(|n| format!("{prefix}{n}"))
            .find(|alias| !used.contains(alias.as_str()))
            .unwrap_or_else(|| prefix.to_string())
    }
}

fn is_root(device: &dyn BlockDevice) -> bool {
    device.path() == Some(ROOT_PATH)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::search::FoundDevice;
    use crate::entity::size::DiskSize;

    fn partition(alias: &str, path: Option<&str>) -> Partition {
        Partition {
            alias: Some(alias.into()),
            filesystem: path.map(Filesystem::with_path),
            ..Default::default()
        }
    }

    fn drive(alias: &str, partitions: Vec<Partition>) -> Drive {
        Drive {
            alias: Some(alias.into()),
            partitions,
            ..Default::default()
        }
    }

    #[test]
    fn test_root_queries() {
        let config = Config {
            drives: vec![
                drive("disk1", vec![partition("p1", Some("/home"))]),
                drive("disk2", vec![partition("p2", Some("/"))]),
            ],
            ..Default::default()
        };

        assert_eq!(
            config.root_drive().and_then(|d| d.alias.as_deref()),
            Some("disk2")
        );
        assert!(config.root_md_raid().is_none());
        assert!(config.root_volume_group().is_none());

        let config = Config {
            volume_groups: vec![VolumeGroup {
                name: Some("system".into()),
                logical_volumes: vec![LogicalVolume {
                    filesystem: Some(Filesystem::with_path("/")),
                    ..Default::default()
                }],
                ..Default::default()
            }],
            ..Default::default()
        };

        assert!(config.root_drive().is_none());
        assert_eq!(
            config.root_volume_group().and_then(|vg| vg.name.as_deref()),
            Some("system")
        );
    }

    #[test]
    fn test_users() {
        let config = Config {
            boot: Boot {
                configure: true,
                device: BootDevice {
                    default: false,
                    alias: Some("disk1".into()),
                },
            },
            drives: vec![
                drive("disk1", vec![partition("p1", None)]),
                drive("disk2", vec![]),
            ],
            md_raids: vec![MdRaid {
                alias: Some("md0".into()),
                devices: vec!["p1".into(), "disk2".into()],
                ..Default::default()
            }],
            volume_groups: vec![VolumeGroup {
                physical_volumes: vec!["md0".into()],
                physical_volumes_devices: vec!["disk1".into()],
                ..Default::default()
            }],
        };

        assert_eq!(config.users("p1").len(), 1);
        assert_eq!(config.users("disk2").len(), 1);
        assert_eq!(config.users("md0").len(), 1);
        assert!(config.users("disk1").is_empty());

        // Volume group target plus boot
        assert_eq!(config.target_users("disk1").len(), 2);
        assert!(config.target_users("disk2").is_empty());

        assert!(matches!(
            config.boot_device(),
            Some(Partitionable::Drive(d)) if d.has_alias("disk1")
        ));
        assert!(config.partitionable("md0").is_some());
        assert!(config.partitionable("p1").is_none());
        assert_eq!(config.potential_for_md_device().len(), 3);
    }

    #[test]
    fn test_validity() {
        let mut skipped = drive("disk2", vec![partition("p2", Some("/"))]);
        skipped.search = Search {
            if_not_found: search::IfNotFound::Skip,
            ..Search::first_device()
        };
        skipped.search.solve(None);

        let mut found = drive("disk1", vec![partition("p1", Some("/home"))]);
        found.search.solve(Some(FoundDevice {
            sid: 1,
            name: "/dev/vda".into(),
            size: DiskSize::gib(20),
        }));

        let config = Config {
            drives: vec![found, skipped],
            ..Default::default()
        };

        // Partitions of skipped drives are not valid either
        assert_eq!(config.valid_block_devices().len(), 2);
        assert!(config.root_drive().is_none());
        assert_eq!(config.with_search().len(), 2);
    }

    #[test]
    fn test_generate_alias() {
        let config = Config {
            drives: vec![drive("drive0", vec![]), drive("drive2", vec![])],
            ..Default::default()
        };

        assert_eq!(config.generate_alias(DeviceKind::Drive), "drive1");
        assert_eq!(config.generate_alias(DeviceKind::MdRaid), "md0");
    }
}
