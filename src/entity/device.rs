use std::fmt;

use serde::{
    Deserialize,
    Serialize,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FsType {
    Bcachefs,
    Btrfs,
    Exfat,
    Ext2,
    Ext3,
    Ext4,
    Ntfs,
    Swap,
    #[serde(alias = "fat", alias = "fat32")]
    Vfat,
    Xfs,
}

impl FsType {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Bcachefs => "bcachefs",
            Self::Btrfs => "btrfs",
            Self::Exfat => "exfat",
            Self::Ext2 => "ext2",
            Self::Ext3 => "ext3",
            Self::Ext4 => "ext4",
            Self::Ntfs => "ntfs",
            Self::Swap => "swap",
            Self::Vfat => "vfat",
            Self::Xfs => "xfs",
        }
    }

    /// Human-readable name
    pub fn label(&self) -> &'static str {
        match self {
            Self::Bcachefs => "Bcachefs",
            Self::Btrfs => "Btrfs",
            Self::Exfat => "exFAT",
            Self::Ext2 => "Ext2",
            Self::Ext3 => "Ext3",
            Self::Ext4 => "Ext4",
            Self::Ntfs => "NTFS",
            Self::Swap => "Swap",
            Self::Vfat => "FAT",
            Self::Xfs => "XFS",
        }
    }

    pub fn is_btrfs(&self) -> bool {
        matches!(self, Self::Btrfs)
    }
}

impl fmt::Display for FsType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MountBy {
    Device,
    Id,
    Label,
    Path,
    Uuid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PtableType {
    Gpt,
    #[serde(alias = "mbr", alias = "dos")]
    Msdos,
    Dasd,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EncryptionMethod {
    Luks1,
    Luks2,
    PervasiveLuks2,
    TpmFde,
    ProtectedSwap,
    SecureSwap,
    RandomSwap,
}

impl EncryptionMethod {
    pub const ALL: [EncryptionMethod; 7] = [
        Self::Luks1,
        Self::Luks2,
        Self::PervasiveLuks2,
        Self::TpmFde,
        Self::ProtectedSwap,
        Self::SecureSwap,
        Self::RandomSwap,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            Self::Luks1 => "luks1",
            Self::Luks2 => "luks2",
            Self::PervasiveLuks2 => "pervasive_luks2",
            Self::TpmFde => "tpm_fde",
            Self::ProtectedSwap => "protected_swap",
            Self::SecureSwap => "secure_swap",
            Self::RandomSwap => "random_swap",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.id() == id)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Luks1 => "Regular LUKS1",
            Self::Luks2 => "Regular LUKS2",
            Self::PervasiveLuks2 => "Pervasive Volume Encryption",
            Self::TpmFde => "TPM-Based Full Disk Encrytion",
            Self::ProtectedSwap => "Encryption with Volatile Protected Key",
            Self::SecureSwap => "Encryption with Volatile Secure Key",
            Self::RandomSwap => "Encryption with Volatile Random Key",
        }
    }

    pub fn password_required(&self) -> bool {
        matches!(
            self,
            Self::Luks1 | Self::Luks2 | Self::PervasiveLuks2 | Self::TpmFde
        )
    }

    pub fn only_for_swap(&self) -> bool {
        matches!(
            self,
            Self::ProtectedSwap | Self::SecureSwap | Self::RandomSwap
        )
    }
}

impl fmt::Display for EncryptionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PbkdFunction {
    Pbkdf2,
    Argon2i,
    Argon2id,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RaidLevel {
    Raid0,
    Raid1,
    Raid4,
    Raid5,
    Raid6,
    Raid10,
}

impl RaidLevel {
    pub fn min_devices(&self) -> usize {
        match self {
            Self::Raid0 | Self::Raid1 | Self::Raid10 => 2,
            Self::Raid4 | Self::Raid5 => 3,
            Self::Raid6 => 4,
        }
    }
}

impl fmt::Display for RaidLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Raid0 => "raid0",
            Self::Raid1 => "raid1",
            Self::Raid4 => "raid4",
            Self::Raid5 => "raid5",
            Self::Raid6 => "raid6",
            Self::Raid10 => "raid10",
        };

        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MdParity {
    Default,
    #[serde(rename = "left_asymmetric")]
    LeftAsymmetric,
    #[serde(rename = "left_symmetric")]
    LeftSymmetric,
    #[serde(rename = "right_asymmetric")]
    RightAsymmetric,
    #[serde(rename = "right_symmetric")]
    RightSymmetric,
    First,
    Last,
    Near2,
    Offset2,
    Far2,
    Near3,
    Offset3,
    Far3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartitionId {
    Linux,
    Swap,
    Lvm,
    Raid,
    Esp,
    Prep,
    #[serde(rename = "bios_boot")]
    BiosBoot,
    Windows,
}
