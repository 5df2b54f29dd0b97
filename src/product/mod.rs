//! Storage settings of the product being installed: default volumes,
//! volume templates and encryption defaults.

use std::convert::TryFrom;

use serde::{
    Deserialize,
    Serialize,
};

use crate::config::volume::{
    Btrfs,
    BtrfsSubvolume,
};
use crate::config::Size;
use crate::constants::{
    defaults,
    ROOT_PATH,
};
use crate::entity::device::{
    EncryptionMethod,
    FsType,
    PbkdFunction,
};
use crate::entity::size::DiskSize;
use crate::errors::StorageError;
use crate::model::SpacePolicy;

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    #[serde(default)]
    pub storage: StorageSettings,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageSettings {
    #[serde(default)]
    pub encryption: Option<EncryptionSettings>,

    /// Mount paths proposed by default
    #[serde(default)]
    pub volumes: Vec<String>,

    #[serde(default)]
    pub volume_templates: Vec<VolumeTemplate>,

    /// Space policy of the drives of a config model not setting one
    #[serde(default)]
    pub space_policy: Option<SpacePolicy>,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncryptionSettings {
    pub method: Option<EncryptionMethod>,
    pub pbkd_function: Option<PbkdFunction>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolumeTemplate {
    /// Empty for the template applying to any other path
    #[serde(default)]
    pub mount_path: String,

    pub filesystem: Option<FsType>,

    #[serde(default)]
    pub btrfs: Option<BtrfsSettings>,

    #[serde(default)]
    pub size: Option<SizeSettings>,

    #[serde(default)]
    pub outline: Outline,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct BtrfsSettings {
    #[serde(default)]
    pub snapshots: bool,

    #[serde(default)]
    pub read_only: bool,

    #[serde(default)]
    pub default_subvolume: Option<String>,

    #[serde(default)]
    pub subvolumes: Vec<SubvolumeSettings>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SubvolumeSettings {
    Path(String),
    Section {
        path: String,

        #[serde(default = "default_true")]
        copy_on_write: bool,

        #[serde(default)]
        archs: Vec<String>,
    },
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct SizeSettings {
    #[serde(default)]
    pub auto: bool,

    #[serde(default)]
    pub min: Option<DiskSize>,

    #[serde(default)]
    pub max: Option<DiskSize>,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outline {
    #[serde(default)]
    pub required: bool,

    /// Filesystem types allowed for the volume, empty for any
    #[serde(default)]
    pub filesystems: Vec<FsType>,

    #[serde(default)]
    pub snapshots_configurable: bool,

    #[serde(default)]
    pub auto_size: Option<AutoSize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutoSize {
    pub base_min: DiskSize,
    pub base_max: DiskSize,

    #[serde(default)]
    pub adjust_by_ram: bool,

    /// Paths whose min size is added when they are not configured
    #[serde(default)]
    pub min_fallback_for: Vec<String>,

    /// Paths whose max size is added when they are not configured
    #[serde(default)]
    pub max_fallback_for: Vec<String>,

    #[serde(default)]
    pub snapshots_increment: Option<SizeIncrement>,
}

/// Extra size for btrfs snapshots, "250%" or "2 GiB"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SizeIncrement {
    Percent(u64),
    Absolute(DiskSize),
}

impl TryFrom<String> for SizeIncrement {
    type Error = StorageError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.trim().strip_suffix('%') {
            Some(percent) => percent.trim().parse::<u64>().map(Self::Percent).map_err(|err| {
                StorageError::BadProduct(format!("bad snapshots increment {s}: {err}"))
            }),
            None => DiskSize::parse(&s).map(Self::Absolute),
        }
    }
}

impl From<SizeIncrement> for String {
    fn from(increment: SizeIncrement) -> Self {
        match increment {
            SizeIncrement::Percent(percent) => format!("{percent}%"),
            SizeIncrement::Absolute(size) => size.to_string(),
        }
    }
}

impl SizeIncrement {
    fn apply(&self, size: DiskSize) -> DiskSize {
        match self {
            Self::Percent(percent) => size.add(size.percent(*percent)),
            Self::Absolute(extra) => size.add(*extra),
        }
    }
}

fn default_true() -> bool {
    true
}

/// Template used when the product has none for a path, nor a generic one
static FALLBACK_TEMPLATE: VolumeTemplate = VolumeTemplate {
    mount_path: String::new(),
    filesystem: Some(FsType::Ext4),
    btrfs: None,
    size: None,
    outline: Outline {
        required: false,
        filesystems: Vec::new(),
        snapshots_configurable: false,
        auto_size: None,
    },
};

fn clean_path(path: &str) -> &str {
    match path.trim_end_matches('/') {
        "" if path.starts_with('/') => ROOT_PATH,
        cleaned => cleaned,
    }
}

impl VolumeTemplate {
    pub fn is_auto(&self) -> bool {
        self.size.as_ref().map(|s| s.auto).unwrap_or(false) && self.outline.auto_size.is_some()
    }

    pub fn min_size(&self) -> DiskSize {
        match (&self.outline.auto_size, &self.size) {
            (Some(auto), _) if self.is_auto() => auto.base_min,
            (_, Some(size)) => size.min.unwrap_or(DiskSize::ZERO),
            _ => DiskSize::ZERO,
        }
    }

    pub fn max_size(&self) -> DiskSize {
        match (&self.outline.auto_size, &self.size) {
            (Some(auto), _) if self.is_auto() => auto.base_max,
            (_, Some(size)) => size.max.unwrap_or(DiskSize::Unlimited),
            _ => DiskSize::Unlimited,
        }
    }

    /// Whether the filesystem type can be used for the volume
    pub fn allows(&self, fs_type: FsType) -> bool {
        self.outline.filesystems.is_empty() || self.outline.filesystems.contains(&fs_type)
    }

    pub fn btrfs(&self) -> Option<Btrfs> {
        let settings = self.btrfs.as_ref()?;

        let subvolumes = settings
            .subvolumes
            .iter()
            .map(|s| match s {
                SubvolumeSettings::Path(path) => BtrfsSubvolume {
                    path: path.clone(),
                    copy_on_write: true,
                    archs: Vec::new(),
                },
                SubvolumeSettings::Section {
                    path,
                    copy_on_write,
                    archs,
                } => BtrfsSubvolume {
                    path: path.clone(),
                    copy_on_write: *copy_on_write,
                    archs: archs.clone(),
                },
            })
            .collect();

        Some(Btrfs {
            snapshots: Some(settings.snapshots),
            read_only: Some(settings.read_only),
            default_subvolume: settings.default_subvolume.clone(),
            subvolumes: Some(subvolumes),
        })
    }
}

impl Product {
    pub fn from_yaml(yaml: &str) -> Result<Self, StorageError> {
        let product: Product = serde_yaml::from_str(yaml)
            .map_err(|err| StorageError::BadProduct(err.to_string()))?;

        product.validate()?;
        Ok(product)
    }

    fn validate(&self) -> Result<(), StorageError> {
        const MSG: &str = "product validation failed";

        let mut paths = std::collections::HashSet::new();
        for template in &self.storage.volume_templates {
            if !paths.insert(clean_path(&template.mount_path)) {
                return Err(StorageError::BadProduct(format!(
                    "{MSG}: duplicate volume template for '{}'",
                    template.mount_path
                )));
            }

            if let Some(auto) = &template.outline.auto_size {
                if auto.base_min > auto.base_max {
                    return Err(StorageError::BadProduct(format!(
                        "{MSG}: template '{}' base_min {} is greater than base_max {}",
                        template.mount_path, auto.base_min, auto.base_max
                    )));
                }
            }
        }

        for path in &self.storage.volumes {
            if self.template(path).is_none() {
                log::warn!("product volume {path} has no template, the generic one is used");
            }
        }

        Ok(())
    }

    pub fn default_paths(&self) -> Vec<String> {
        self.storage.volumes.clone()
    }

    /// Paths of the volumes which must always be created
    pub fn mandatory_paths(&self) -> Vec<String> {
        self.storage
            .volume_templates
            .iter()
            .filter(|t| t.outline.required && !t.mount_path.is_empty())
            .map(|t| t.mount_path.clone())
            .collect()
    }

    pub fn encryption_method(&self) -> Option<EncryptionMethod> {
        self.storage.encryption.as_ref().and_then(|e| e.method)
    }

    pub fn pbkd_function(&self) -> Option<PbkdFunction> {
        self.storage.encryption.as_ref().and_then(|e| e.pbkd_function)
    }

    fn template(&self, path: &str) -> Option<&VolumeTemplate> {
        let path = clean_path(path);

        self.storage
            .volume_templates
            .iter()
            .find(|t| clean_path(&t.mount_path) == path)
    }

    /// Template for the path, falling back to the generic template
    pub fn template_for(&self, path: &str) -> &VolumeTemplate {
        self.template(path)
            .or_else(|| self.template(defaults::TEMPLATE_PATH))
            .unwrap_or(&FALLBACK_TEMPLATE)
    }

    /// Size proposed for a new volume mounted at `path`.
    ///
    /// For auto-sized templates, the base sizes grow with the sizes of the
    /// fallback volumes missing from `having_paths`, with the snapshots
    /// increment, and with the RAM size for templates adjusted by RAM.
    pub fn default_size(
        &self,
        path: &str,
        having_paths: &[String],
        snapshots: bool,
        ram: Option<DiskSize>,
    ) -> Size {
        let template = self.template_for(path);

        let auto = match &template.outline.auto_size {
            Some(auto) if template.is_auto() => auto,
            _ => {
                return Size {
                    default: true,
                    min: Some(template.min_size()),
                    max: Some(template.max_size()),
                }
            }
        };

        let missing = |fallback: &&String| {
            !having_paths
                .iter()
                .any(|p| clean_path(p) == clean_path(fallback))
        };

        let mut min = auto.base_min;
        for fallback in auto.min_fallback_for.iter().filter(missing) {
            min = min.add(self.template_for(fallback).min_size());
        }

        let mut max = auto.base_max;
        for fallback in auto.max_fallback_for.iter().filter(missing) {
            max = max.add(self.template_for(fallback).max_size());
        }

        if snapshots {
            if let Some(increment) = &auto.snapshots_increment {
                min = increment.apply(min);
                max = increment.apply(max);
            }
        }

        if let (true, Some(ram)) = (auto.adjust_by_ram, ram) {
            min = min.max(ram);
            max = max.max(ram);
        }

        Size {
            default: true,
            min: Some(min),
            max: Some(max),
        }
    }
}
