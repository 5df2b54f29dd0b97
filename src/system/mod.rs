//! Snapshot of the probed system devices.
//!
//! The storage config is solved against this snapshot instead of a live
//! device graph.

use serde::{
    Deserialize,
    Serialize,
};

use crate::config::search::FoundDevice;
use crate::constants::defaults;
use crate::entity::device::{
    EncryptionMethod,
    FsType,
    PtableType,
    RaidLevel,
};
use crate::entity::size::DiskSize;
use crate::errors::StorageError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct System {
    #[serde(default)]
    pub disks: Vec<Disk>,

    #[serde(default)]
    pub md_raids: Vec<SystemMdRaid>,

    #[serde(default = "default_encryption_methods")]
    pub encryption_methods: Vec<EncryptionMethod>,

    #[serde(default)]
    pub ram: Option<DiskSize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Disk {
    #[serde(skip)]
    pub sid: u32,

    pub name: String,

    #[serde(default)]
    pub aliases: Vec<String>,

    pub size: DiskSize,

    #[serde(default)]
    pub ptable: Option<PtableType>,

    /// Whether the disk can be used for installing
    #[serde(default = "default_true")]
    pub available: bool,

    #[serde(default)]
    pub partitions: Vec<SystemPartition>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SystemPartition {
    #[serde(skip)]
    pub sid: u32,

    /// Defaults to the parent name followed by the number
    #[serde(default)]
    pub name: String,

    pub number: u32,
    pub size: DiskSize,

    #[serde(default)]
    pub filesystem: Option<FsType>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SystemMdRaid {
    #[serde(skip)]
    pub sid: u32,

    pub name: String,
    pub level: RaidLevel,
    pub size: DiskSize,

    /// Names of the member devices
    #[serde(default)]
    pub devices: Vec<String>,

    /// Whether the RAID can hold the boot partitions
    #[serde(default)]
    pub bootable: bool,

    #[serde(default)]
    pub ptable: Option<PtableType>,

    #[serde(default)]
    pub partitions: Vec<SystemPartition>,
}

#[derive(Debug, Clone, Copy)]
pub enum SystemDevice<'a> {
    Disk(&'a Disk),
    Partition(&'a SystemPartition),
    MdRaid(&'a SystemMdRaid),
}

impl<'a> SystemDevice<'a> {
    pub fn sid(&self) -> u32 {
        match self {
            Self::Disk(d) => d.sid,
            Self::Partition(p) => p.sid,
            Self::MdRaid(md) => md.sid,
        }
    }

    pub fn name(&self) -> &'a str {
        match self {
            Self::Disk(d) => &d.name,
            Self::Partition(p) => &p.name,
            Self::MdRaid(md) => &md.name,
        }
    }

    pub fn size(&self) -> DiskSize {
        match self {
            Self::Disk(d) => d.size,
            Self::Partition(p) => p.size,
            Self::MdRaid(md) => md.size,
        }
    }

    pub fn number(&self) -> Option<u32> {
        match self {
            Self::Partition(p) => Some(p.number),
            _ => None,
        }
    }

    pub fn partitions(&self) -> &'a [SystemPartition] {
        match self {
            Self::Disk(d) => &d.partitions,
            Self::MdRaid(md) => &md.partitions,
            Self::Partition(_) => &[],
        }
    }

    pub fn found(&self) -> FoundDevice {
        FoundDevice {
            sid: self.sid(),
            name: self.name().to_string(),
            size: self.size(),
        }
    }
}

impl Default for System {
    fn default() -> Self {
        Self {
            disks: Vec::new(),
            md_raids: Vec::new(),
            encryption_methods: default_encryption_methods(),
            ram: None,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_encryption_methods() -> Vec<EncryptionMethod> {
    defaults::ENCRYPTION_METHODS
        .iter()
        .filter_map(|id| EncryptionMethod::from_id(id))
        .collect()
}

fn partition_name(parent: &str, number: u32) -> String {
    match parent.ends_with(|c: char| c.is_ascii_digit()) {
        true => format!("{parent}p{number}"),
        false => format!("{parent}{number}"),
    }
}

impl System {
    /// Parses a YAML (or JSON) snapshot and assigns device sids
    pub fn from_yaml(yaml: &str) -> Result<Self, StorageError> {
        let mut system: System = serde_yaml::from_str(yaml)
            .map_err(|err| StorageError::BadSystem(err.to_string()))?;

        system.assign_sids();
        system.validate()?;

        Ok(system)
    }

    fn assign_sids(&mut self) {
        let mut sid = 0;
        let mut next = || {
            sid += 1;
            sid
        };

        for disk in &mut self.disks {
            disk.sid = next();
            for partition in &mut disk.partitions {
                partition.sid = next();
                if partition.name.is_empty() {
                    partition.name = partition_name(&disk.name, partition.number);
                }
            }
        }

        for md in &mut self.md_raids {
            md.sid = next();
            for partition in &mut md.partitions {
                partition.sid = next();
                if partition.name.is_empty() {
                    partition.name = partition_name(&md.name, partition.number);
                }
            }
        }
    }

    fn validate(&self) -> Result<(), StorageError> {
        const MSG: &str = "system validation failed";

        let mut names = std::collections::HashSet::new();
        for device in self.devices() {
            if !names.insert(device.name()) {
                return Err(StorageError::BadSystem(format!(
                    "{MSG}: duplicate device {}",
                    device.name()
                )));
            }
        }

        for md in &self.md_raids {
            for member in &md.devices {
                if self.find_by_any_name(member).is_none() {
                    return Err(StorageError::BadSystem(format!(
                        "{MSG}: md raid {} member {member} does not exist",
                        md.name
                    )));
                }
            }
        }

        Ok(())
    }

    /// Every disk, MD RAID and partition
    pub fn devices(&self) -> Vec<SystemDevice> {
        let mut devices = Vec::new();

        for disk in &self.disks {
            devices.push(SystemDevice::Disk(disk));
            devices.extend(disk.partitions.iter().map(SystemDevice::Partition));
        }

        for md in &self.md_raids {
            devices.push(SystemDevice::MdRaid(md));
            devices.extend(md.partitions.iter().map(SystemDevice::Partition));
        }

        devices
    }

    /// Disks which can be used by drive configs
    pub fn candidate_disks(&self) -> impl Iterator<Item = &Disk> {
        self.disks.iter().filter(|d| d.available)
    }

    pub fn find_by_any_name(&self, name: &str) -> Option<SystemDevice> {
        self.devices().into_iter().find(|d| {
            d.name() == name
                || matches!(d, SystemDevice::Disk(disk) if disk.aliases.iter().any(|a| a == name))
        })
    }

    /// Disk or MD RAID holding the partition
    pub fn parent_of(&self, sid: u32) -> Option<SystemDevice> {
        self.devices()
            .into_iter()
            .filter(|d| !matches!(d, SystemDevice::Partition(_)))
            .find(|d| d.partitions().iter().any(|p| p.sid == sid))
    }

    pub fn md_raid(&self, sid: u32) -> Option<&SystemMdRaid> {
        self.md_raids.iter().find(|md| md.sid == sid)
    }

    pub fn method_available(&self, method: EncryptionMethod) -> bool {
        self.encryption_methods.contains(&method)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SYSTEM: &str = include_str!("../../demos/system.yaml");

    #[test]
    fn test_system_from_yaml() {
        let system = System::from_yaml(SYSTEM).expect("failed to parse system");

        let sids: Vec<u32> = system.devices().iter().map(|d| d.sid()).collect();
        let expected: Vec<u32> = (1..=sids.len() as u32).collect();
        assert_eq!(sids, expected);

        let vda1 = system.find_by_any_name("/dev/vda1").expect("no /dev/vda1");
        assert!(matches!(vda1, SystemDevice::Partition(_)));
        assert_eq!(
            system.parent_of(vda1.sid()).map(|d| d.name()),
            Some("/dev/vda")
        );

        let by_id = system
            .find_by_any_name("/dev/disk/by-id/virtio-vda")
            .expect("no disk by id");
        assert_eq!(by_id.name(), "/dev/vda");

        let md = system.find_by_any_name("/dev/md0").expect("no /dev/md0");
        assert!(matches!(md, SystemDevice::MdRaid(_)));
        assert_eq!(md.partitions()[0].name, "/dev/md0p1");

        assert!(system.candidate_disks().all(|d| d.name != "/dev/vdd"));
        assert!(system.method_available(EncryptionMethod::Luks2));
        assert!(!system.method_available(EncryptionMethod::TpmFde));
    }

    #[test]
    fn test_system_defaults() {
        let system = System::from_yaml("disks: []").expect("failed to parse system");
        assert!(system.method_available(EncryptionMethod::RandomSwap));
        assert!(!system.method_available(EncryptionMethod::PervasiveLuks2));
        assert!(system.ram.is_none());
    }

    #[test]
    fn test_bad_system() {
        let should_err = vec![
            // Duplicate device
            "disks: [{ name: /dev/vda, size: 1024 }, { name: /dev/vda, size: 1024 }]",
            // Unknown member
            "mdRaids: [{ name: /dev/md0, level: raid1, size: 1024, devices: [/dev/vdz] }]",
            // Bad size
            "disks: [{ name: /dev/vda, size: lots }]",
        ];

        for yaml in should_err {
            assert!(System::from_yaml(yaml).is_err(), "unexpected ok for {yaml}");
        }
    }
}
