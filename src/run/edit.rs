use super::read_file;
use crate::cli::EditCommand;
use crate::errors::StorageError;
use crate::model::mutations;
use crate::model::Config;

pub(super) fn run(model_file: &str, cmd: EditCommand) -> Result<(), StorageError> {
    let model = Config::from_json(&read_file(model_file)?)?;

    let edited = edit(&model, cmd)?;
    println!("{}", edited.to_json_string());

    Ok(())
}

fn edit(model: &Config, cmd: EditCommand) -> Result<Config, StorageError> {
    let missing = |what: String| StorageError::BadArgs(format!("no such {what} in config model"));

    match cmd {
        EditCommand::AddDrive { name } => mutations::add_drive(model, &name)
            .ok_or_else(|| StorageError::BadArgs(format!("drive {name} already in config model"))),

        EditCommand::DeleteDrive { name } => {
            mutations::remove_drive(model, &name).ok_or_else(|| missing(format!("drive {name}")))
        }

        EditCommand::SwitchDrive { name, new_name } => {
            if name == new_name {
                return Err(StorageError::BadArgs(format!(
                    "cannot switch drive {name} to itself"
                )));
            }

            mutations::switch_drive(model, &name, &new_name)
                .ok_or_else(|| missing(format!("drive {name}")))
        }

        EditCommand::AddPartition { drive, partition } => {
            mutations::add_partition(model, &drive, partition)
                .ok_or_else(|| missing(format!("drive {drive}")))
        }

        EditCommand::EditPartition {
            drive,
            mount_path,
            partition,
        } => mutations::edit_partition(model, &drive, &mount_path, partition)
            .ok_or_else(|| missing(format!("partition {mount_path} on drive {drive}"))),

        EditCommand::DeletePartition { drive, mount_path } => {
            mutations::delete_partition(model, &drive, &mount_path)
                .ok_or_else(|| missing(format!("partition {mount_path} on drive {drive}")))
        }

        EditCommand::SetSpacePolicy {
            drive,
            policy,
            actions,
        } => mutations::set_space_policy(model, &drive, policy, &actions)
            .ok_or_else(|| missing(format!("drive {drive}"))),

        EditCommand::SetBootDevice { name } => Ok(mutations::set_boot_device(model, &name)),
        EditCommand::SetDefaultBoot => Ok(mutations::set_default_boot_device(model)),
        EditCommand::DisableBoot => Ok(mutations::disable_boot(model)),

        EditCommand::SetEncryption { method, password } => {
            if method.password_required() && password.is_none() {
                log::warn!("encryption method {method} requires a password");
            }

            Ok(mutations::set_encryption(model, method, password))
        }

        EditCommand::DisableEncryption => Ok(mutations::disable_encryption(model)),

        EditCommand::AddVolumeGroup {
            volume_group,
            move_mount_paths,
        } => {
            let name = volume_group.vg_name.clone();
            mutations::add_volume_group(model, volume_group, move_mount_paths).ok_or_else(|| {
                StorageError::BadArgs(format!("volume group {name} already in config model"))
            })
        }

        EditCommand::EditVolumeGroup {
            name,
            volume_group,
            move_mount_paths,
        } => mutations::edit_volume_group(model, &name, volume_group, move_mount_paths)
            .ok_or_else(|| missing(format!("volume group {name}"))),

        EditCommand::DeleteVolumeGroup {
            name,
            move_to_partitions,
        } => mutations::delete_volume_group(model, &name, move_to_partitions)
            .ok_or_else(|| missing(format!("volume group {name}"))),

        EditCommand::AddLogicalVolume {
            volume_group,
            logical_volume,
        } => mutations::add_logical_volume(model, &volume_group, logical_volume)
            .ok_or_else(|| missing(format!("volume group {volume_group}"))),

        EditCommand::EditLogicalVolume {
            volume_group,
            mount_path,
            logical_volume,
        } => mutations::edit_logical_volume(model, &volume_group, &mount_path, logical_volume)
            .ok_or_else(|| {
                missing(format!("logical volume {mount_path} in volume group {volume_group}"))
            }),

        EditCommand::DeleteLogicalVolume {
            volume_group,
            mount_path,
        } => mutations::delete_logical_volume(model, &volume_group, &mount_path).ok_or_else(
            || missing(format!("logical volume {mount_path} in volume group {volume_group}")),
        ),
    }
}
