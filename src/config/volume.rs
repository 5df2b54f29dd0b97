use crate::constants::SWAP_PATH;
use crate::entity::device::{
    EncryptionMethod,
    FsType,
    MountBy,
    PbkdFunction,
};
use crate::entity::size::DiskSize;

/// Size of a new or resized device. A `None` bound means the size of
/// the existing device ("current").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Size {
    pub default: bool,
    pub min: Option<DiskSize>,
    pub max: Option<DiskSize>,
}

impl Default for Size {
    fn default() -> Self {
        Self {
            default: true,
            min: None,
            max: None,
        }
    }
}

impl Size {
    pub fn fixed(size: DiskSize) -> Self {
        Self {
            default: false,
            min: Some(size),
            max: Some(size),
        }
    }

    pub fn range(min: Option<DiskSize>, max: Option<DiskSize>) -> Self {
        Self {
            default: false,
            min,
            max,
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Encryption {
    pub method: Option<EncryptionMethod>,
    pub password: Option<String>,
    pub key_size: Option<u32>,
    pub pbkd_function: Option<PbkdFunction>,
    pub cipher: Option<String>,
    pub label: Option<String>,
}

impl Encryption {
    pub fn with_method(method: EncryptionMethod) -> Self {
        Self {
            method: Some(method),
            ..Default::default()
        }
    }

    pub fn missing_password(&self) -> bool {
        let required = self.method.map(|m| m.password_required()).unwrap_or(false);

        required && self.password.as_deref().map(str::is_empty).unwrap_or(true)
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BtrfsSubvolume {
    pub path: String,
    pub copy_on_write: bool,
    pub archs: Vec<String>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Btrfs {
    pub snapshots: Option<bool>,
    pub read_only: Option<bool>,
    pub default_subvolume: Option<String>,
    pub subvolumes: Option<Vec<BtrfsSubvolume>>,
}

impl Btrfs {
    pub fn snapshots(&self) -> bool {
        self.snapshots.unwrap_or(false)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilesystemType {
    pub fs_type: FsType,

    /// Whether the type was taken from the product defaults
    pub default: bool,
    pub btrfs: Option<Btrfs>,
}

impl FilesystemType {
    pub fn new(fs_type: FsType) -> Self {
        Self {
            fs_type,
            default: false,
            btrfs: None,
        }
    }

    pub fn snapshots(&self) -> bool {
        self.fs_type.is_btrfs()
            && self.btrfs.as_ref().map(Btrfs::snapshots).unwrap_or(false)
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Filesystem {
    pub reuse: bool,
    pub fs_type: Option<FilesystemType>,
    pub label: Option<String>,
    pub path: Option<String>,
    pub mount_by: Option<MountBy>,
    pub mkfs_options: Vec<String>,
    pub mount_options: Vec<String>,
}

impl Filesystem {
    pub fn with_path(path: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
            ..Default::default()
        }
    }

    pub fn path_is(&self, path: &str) -> bool {
        self.path.as_deref() == Some(path)
    }

    pub fn is_swap(&self) -> bool {
        self.path_is(SWAP_PATH)
            || matches!(&self.fs_type, Some(t) if t.fs_type == FsType::Swap)
    }

    pub fn snapshots(&self) -> bool {
        self.fs_type.as_ref().map(FilesystemType::snapshots).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_password() {
        let tests = vec![
            (Encryption::with_method(EncryptionMethod::Luks2), true),
            (
                Encryption {
                    password: Some(String::new()),
                    ..Encryption::with_method(EncryptionMethod::Luks1)
                },
                true,
            ),
            (
                Encryption {
                    password: Some("notsecret".into()),
                    ..Encryption::with_method(EncryptionMethod::TpmFde)
                },
                false,
            ),
            (Encryption::with_method(EncryptionMethod::RandomSwap), false),
            (Encryption::default(), false),
        ];

        for (encryption, expected) in tests {
            assert_eq!(encryption.missing_password(), expected, "{encryption:?}");
        }
    }

    #[test]
    fn test_filesystem_swap_and_snapshots() {
        assert!(Filesystem::with_path("swap").is_swap());
        assert!(!Filesystem::with_path("/").is_swap());

        let swap = Filesystem {
            fs_type: Some(FilesystemType::new(FsType::Swap)),
            ..Default::default()
        };
        assert!(swap.is_swap());

        let mut root = Filesystem::with_path("/");
        root.fs_type = Some(FilesystemType {
            fs_type: FsType::Btrfs,
            default: false,
            btrfs: Some(Btrfs {
                snapshots: Some(true),
                ..Default::default()
            }),
        });
        assert!(root.snapshots());

        root.fs_type = Some(FilesystemType::new(FsType::Ext4));
        assert!(!root.snapshots());
    }
}
