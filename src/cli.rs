use clap::{
    Args,
    Parser,
    Subcommand,
};
use serde::de::DeserializeOwned;

use crate::constants::defaults;
use crate::entity::device::EncryptionMethod;
use crate::errors::StorageError;
use crate::model::mutations::SpaceAction;
use crate::model::{
    LogicalVolume,
    Partition,
    SpacePolicy,
    VolumeGroup,
};

#[derive(Debug, Parser)]
#[clap(
    version,
    about = "Converts, solves and checks storage configs"
)]
pub struct Cli {
    #[command(subcommand)]
    pub commands: Option<Commands>,

    /// Storage config JSON, or config model JSON for `edit` and `from-model`
    #[arg(
        global = true,
        short = 'f',
        long = "file",
        value_parser = validate_filename,
        default_value_t = String::from(defaults::CONFIG_FILE)
    )]
    pub file: String,

    /// Description of the probed system (YAML or JSON).
    /// An empty system is assumed if omitted
    #[arg(global = true, short = 's', long = "system", value_parser = validate_filename)]
    pub system: Option<String>,

    /// Product definition (YAML). Read from STORAGE_CONFIG_PRODUCT if omitted
    #[arg(global = true, short = 'p', long = "product", value_parser = validate_filename)]
    pub product: Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Check the storage config and print its issues (default)
    Validate,

    /// Print the solved storage config
    Solve,

    /// Print the config model of the solved storage config
    Model(ArgsModel),

    /// Apply one edit to a config model and print the result
    #[command(subcommand)]
    Edit(EditCommand),

    /// Print the storage config of a config model
    FromModel,
}

#[derive(Debug, Args)]
pub struct ArgsModel {
    /// Also print mount paths, boot and LVM flags of each drive
    #[arg(long = "summary")]
    pub summary: bool,
}

#[derive(Debug, Clone, Subcommand)]
pub enum EditCommand {
    AddDrive {
        name: String,
    },

    DeleteDrive {
        name: String,
    },

    /// Move the new partitions of a drive to another drive
    SwitchDrive {
        name: String,
        new_name: String,
    },

    /// Add a partition, given as config model JSON
    AddPartition {
        drive: String,
        #[arg(value_parser = parse_json::<Partition>)]
        partition: Partition,
    },

    EditPartition {
        drive: String,
        mount_path: String,
        #[arg(value_parser = parse_json::<Partition>)]
        partition: Partition,
    },

    DeletePartition {
        drive: String,
        mount_path: String,
    },

    /// Set the space policy of a drive. Actions are only used by the
    /// custom policy
    SetSpacePolicy {
        drive: String,
        #[arg(value_parser = parse_space_policy)]
        policy: SpacePolicy,
        /// Space action, as `<partition>=<delete|resizeIfNeeded>`
        #[arg(long = "action")]
        actions: Vec<SpaceAction>,
    },

    SetBootDevice {
        name: String,
    },

    SetDefaultBoot,

    DisableBoot,

    SetEncryption {
        #[arg(value_parser = parse_encryption_method)]
        method: EncryptionMethod,
        #[arg(long = "password")]
        password: Option<String>,
    },

    DisableEncryption,

    /// Add a volume group, given as config model JSON
    AddVolumeGroup {
        #[arg(value_parser = parse_json::<VolumeGroup>)]
        volume_group: VolumeGroup,
        /// Turn the new partitions of the target devices into logical volumes
        #[arg(long = "move-mount-paths")]
        move_mount_paths: bool,
    },

    EditVolumeGroup {
        name: String,
        #[arg(value_parser = parse_json::<VolumeGroup>)]
        volume_group: VolumeGroup,
        #[arg(long = "move-mount-paths")]
        move_mount_paths: bool,
    },

    DeleteVolumeGroup {
        name: String,
        /// Turn the logical volumes into partitions of the first target device
        #[arg(long = "move-to-partitions")]
        move_to_partitions: bool,
    },

    AddLogicalVolume {
        volume_group: String,
        #[arg(value_parser = parse_json::<LogicalVolume>)]
        logical_volume: LogicalVolume,
    },

    EditLogicalVolume {
        volume_group: String,
        mount_path: String,
        #[arg(value_parser = parse_json::<LogicalVolume>)]
        logical_volume: LogicalVolume,
    },

    DeleteLogicalVolume {
        volume_group: String,
        mount_path: String,
    },
}

fn validate_filename(name: &str) -> Result<String, StorageError> {
    if name.is_empty() {
        return Err(StorageError::BadArgs(String::from("empty filename")));
    }

    Ok(name.to_string())
}

fn parse_json<T: DeserializeOwned>(s: &str) -> Result<T, StorageError> {
    serde_json::from_str(s).map_err(|err| StorageError::BadModel(err.to_string()))
}

fn parse_space_policy(s: &str) -> Result<SpacePolicy, StorageError> {
    match s {
        "delete" => Ok(SpacePolicy::Delete),
        "resize" => Ok(SpacePolicy::Resize),
        "keep" => Ok(SpacePolicy::Keep),
        "custom" => Ok(SpacePolicy::Custom),
        _ => Err(StorageError::BadArgs(format!("unknown space policy '{s}'"))),
    }
}

fn parse_encryption_method(s: &str) -> Result<EncryptionMethod, StorageError> {
    EncryptionMethod::from_id(s)
        .ok_or_else(|| StorageError::BadArgs(format!("unknown encryption method '{s}'")))
}
