use std::fmt;

use super::search::{
    FoundDevice,
    Search,
};
use super::volume::{
    Encryption,
    Filesystem,
    Size,
};
use crate::entity::device::{
    MdParity,
    PartitionId,
    PtableType,
    RaidLevel,
};
use crate::entity::size::DiskSize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceKind {
    Drive,
    Partition,
    MdRaid,
    LogicalVolume,
}

impl DeviceKind {
    /// Prefix of generated aliases
    pub fn alias_prefix(&self) -> &'static str {
        match self {
            Self::Drive => "drive",
            Self::Partition => "partition",
            Self::MdRaid => "md",
            Self::LogicalVolume => "lv",
        }
    }
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Drive => "drive",
            Self::Partition => "partition",
            Self::MdRaid => "MD RAID",
            Self::LogicalVolume => "logical volume",
        };

        write!(f, "{s}")
    }
}

/// Common view over configs of devices which can be searched,
/// encrypted, formatted or sized.
pub trait BlockDevice {
    fn kind(&self) -> DeviceKind;
    fn alias(&self) -> Option<&str>;
    fn set_alias(&mut self, alias: String);

    fn search(&self) -> Option<&Search> {
        None
    }

    fn encryption(&self) -> Option<&Encryption>;
    fn encryption_mut(&mut self) -> Option<&mut Encryption>;
    fn filesystem(&self) -> Option<&Filesystem>;
    fn filesystem_mut(&mut self) -> Option<&mut Filesystem>;

    fn size(&self) -> Option<&Size> {
        None
    }

    fn size_mut(&mut self) -> Option<&mut Size> {
        None
    }

    fn found_device(&self) -> Option<&FoundDevice> {
        self.search().and_then(Search::device)
    }

    fn has_alias(&self, alias: &str) -> bool {
        self.alias() == Some(alias)
    }

    /// False when the search did not find a device and the device can be
    /// skipped. Such configs are ignored by solvers and checkers.
    fn is_valid(&self) -> bool {
        !self.search().map(Search::skip_device).unwrap_or(false)
    }

    fn path(&self) -> Option<&str> {
        self.filesystem().and_then(|fs| fs.path.as_deref())
    }
}

macro_rules! impl_block_device {
    ($t:ident, $kind:expr) => {
        impl BlockDevice for $t {
            fn kind(&self) -> DeviceKind {
                $kind
            }

            fn alias(&self) -> Option<&str> {
                self.alias.as_deref()
            }

            fn set_alias(&mut self, alias: String) {
                self.alias = Some(alias);
            }

            fn encryption(&self) -> Option<&Encryption> {
                self.encryption.as_ref()
            }

            fn encryption_mut(&mut self) -> Option<&mut Encryption> {
                self.encryption.as_mut()
            }

            fn filesystem(&self) -> Option<&Filesystem> {
                self.filesystem.as_ref()
            }

            fn filesystem_mut(&mut self) -> Option<&mut Filesystem> {
                self.filesystem.as_mut()
            }

            impl_block_device!(@extra $t);
        }
    };

    (@extra Drive) => {
        fn search(&self) -> Option<&Search> {
            Some(&self.search)
        }
    };

    (@extra Partition) => {
        fn search(&self) -> Option<&Search> {
            self.search.as_ref()
        }

        fn size(&self) -> Option<&Size> {
            Some(&self.size)
        }

        fn size_mut(&mut self) -> Option<&mut Size> {
            Some(&mut self.size)
        }
    };

    (@extra MdRaid) => {
        fn search(&self) -> Option<&Search> {
            self.search.as_ref()
        }
    };

    (@extra LogicalVolume) => {
        fn size(&self) -> Option<&Size> {
            Some(&self.size)
        }

        fn size_mut(&mut self) -> Option<&mut Size> {
            Some(&mut self.size)
        }
    };
}

#[derive(Debug, Clone, PartialEq)]
pub struct Boot {
    pub configure: bool,
    pub device: BootDevice,
}

impl Default for Boot {
    fn default() -> Self {
        Self {
            configure: true,
            device: BootDevice::default(),
        }
    }
}

impl Boot {
    /// Whether boot is configured on the device with the given alias
    pub fn targets(&self, alias: &str) -> bool {
        self.configure && self.device.alias.as_deref() == Some(alias)
    }
}

/// Boot device. With `default`, the alias is inferred by the boot solver.
#[derive(Debug, Clone, PartialEq)]
pub struct BootDevice {
    pub default: bool,
    pub alias: Option<String>,
}

impl Default for BootDevice {
    fn default() -> Self {
        Self {
            default: true,
            alias: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Drive {
    pub search: Search,
    pub alias: Option<String>,
    pub encryption: Option<Encryption>,
    pub filesystem: Option<Filesystem>,
    pub ptable_type: Option<PtableType>,
    pub partitions: Vec<Partition>,
}

impl Default for Drive {
    fn default() -> Self {
        Self {
            search: Search::first_device(),
            alias: None,
            encryption: None,
            filesystem: None,
            ptable_type: None,
            partitions: Vec::new(),
        }
    }
}

impl_block_device!(Drive, DeviceKind::Drive);

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Partition {
    pub search: Option<Search>,
    pub alias: Option<String>,
    pub id: Option<PartitionId>,
    pub size: Size,
    pub encryption: Option<Encryption>,
    pub filesystem: Option<Filesystem>,
    pub delete: bool,
    pub delete_if_needed: bool,
}

impl_block_device!(Partition, DeviceKind::Partition);

impl Partition {
    /// Reused partition with a size other than the size of the found device
    pub fn is_resized(&self) -> bool {
        let Some(found) = self.found_device() else {
            return false;
        };

        let current = Some(found.size);
        !self.size.default && (self.size.min != current || self.size.max != current)
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct MdRaid {
    pub search: Option<Search>,
    pub alias: Option<String>,
    pub name: Option<String>,
    pub level: Option<RaidLevel>,
    pub parity: Option<MdParity>,
    pub chunk_size: Option<DiskSize>,
    pub devices: Vec<String>,
    pub encryption: Option<Encryption>,
    pub filesystem: Option<Filesystem>,
    pub ptable_type: Option<PtableType>,
    pub partitions: Vec<Partition>,
}

impl_block_device!(MdRaid, DeviceKind::MdRaid);

#[derive(Debug, Default, Clone, PartialEq)]
pub struct VolumeGroup {
    pub name: Option<String>,
    pub extent_size: Option<DiskSize>,

    /// Aliases of devices used as physical volumes
    pub physical_volumes: Vec<String>,

    /// Aliases of devices where physical volumes are generated
    pub physical_volumes_devices: Vec<String>,
    pub physical_volumes_encryption: Option<Encryption>,
    pub logical_volumes: Vec<LogicalVolume>,
}

impl VolumeGroup {
    pub fn logical_volume(&self, alias: &str) -> Option<&LogicalVolume> {
        self.logical_volumes.iter().find(|lv| lv.has_alias(alias))
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct LogicalVolume {
    pub alias: Option<String>,
    pub name: Option<String>,
    pub size: Size,
    pub stripes: Option<u32>,
    pub stripe_size: Option<DiskSize>,
    pub pool: bool,
    pub used_pool: Option<String>,
    pub encryption: Option<Encryption>,
    pub filesystem: Option<Filesystem>,
}

impl_block_device!(LogicalVolume, DeviceKind::LogicalVolume);

/// A drive or MD RAID, the configs that can hold partitions
#[derive(Debug, Clone, Copy)]
pub enum Partitionable<'a> {
    Drive(&'a Drive),
    MdRaid(&'a MdRaid),
}

impl<'a> Partitionable<'a> {
    pub fn partitions(&self) -> &'a [Partition] {
        match self {
            Self::Drive(drive) => &drive.partitions,
            Self::MdRaid(md) => &md.partitions,
        }
    }

    pub fn device(&self) -> &'a dyn BlockDevice {
        match self {
            Self::Drive(drive) => *drive,
            Self::MdRaid(md) => *md,
        }
    }

    pub fn has_partitions(&self) -> bool {
        !self.partitions().is_empty()
    }
}
