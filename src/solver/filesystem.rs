use crate::config::volume::Btrfs;
use crate::config::{
    Config,
    Filesystem,
    FilesystemType,
};
use crate::constants::defaults;
use crate::product::Product;

/// Fills missing filesystem types and btrfs settings from the volume
/// template of each mount path
pub fn solve(config: &mut Config, product: &Product) {
    config.each_block_device_mut(|device| {
        if let Some(filesystem) = device.filesystem_mut() {
            solve_filesystem(filesystem, product);
        }
    });
}

fn solve_filesystem(filesystem: &mut Filesystem, product: &Product) {
    let path = filesystem
        .path
        .clone()
        .unwrap_or_else(|| defaults::TEMPLATE_PATH.to_string());
    let template = product.template_for(&path);

    if filesystem.fs_type.is_none() {
        let Some(default) = template.filesystem else {
            log::warn!("no default filesystem type for path '{path}'");
            return;
        };

        log::debug!("using {default} for path '{path}'");
        filesystem.fs_type = Some(FilesystemType {
            fs_type: default,
            default: true,
            btrfs: None,
        });
    }

    let Some(fs_type) = filesystem.fs_type.as_mut() else {
        return;
    };

    if !fs_type.fs_type.is_btrfs() {
        return;
    }

    let Some(settings) = template.btrfs() else {
        return;
    };

    let btrfs = fs_type.btrfs.get_or_insert_with(Btrfs::default);
    btrfs.snapshots = btrfs.snapshots.or(settings.snapshots);
    btrfs.read_only = btrfs.read_only.or(settings.read_only);
    btrfs.default_subvolume = btrfs.default_subvolume.take().or(settings.default_subvolume);
    btrfs.subvolumes = btrfs.subvolumes.take().or(settings.subvolumes);
}
