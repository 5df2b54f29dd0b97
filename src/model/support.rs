//! Solved storage configs the config model cannot represent

use crate::config::{
    self as storage,
    BlockDevice,
    Search,
};
use crate::entity::size::DiskSize;

/// Why the solved config cannot be represented by the config model, if
/// it cannot
pub fn unsupported_reason(config: &storage::Config) -> Option<&'static str> {
    let lvs: Vec<&storage::LogicalVolume> = config.logical_volumes().collect();

    if lvs.iter().any(|lv| lv.pool || lv.used_pool.is_some()) {
        return Some("thin pools and thin volumes");
    }

    let partitionables: Vec<&dyn BlockDevice> = config
        .partitionables()
        .map(|p| p.device())
        .filter(|d| !is_skipped(d.search()))
        .collect();

    let without_name = partitionables
        .iter()
        .any(|d| d.found_device().is_none() && d.search().and_then(|s| s.name.as_ref()).is_none());

    if without_name {
        return Some("drive or MD RAID without a device name");
    }

    if partitionables.iter().any(|d| d.encryption().is_some()) {
        return Some("encrypted drive or MD RAID");
    }

    if config.volume_groups.iter().any(|vg| vg.name.is_none()) {
        return Some("volume group without a name");
    }

    if config.volume_groups.iter().any(|vg| !vg.physical_volumes.is_empty()) {
        return Some("volume group with explicit physical volumes");
    }

    if config.partitions().any(|p| needs_mount_path(p) && p.path().is_none()) {
        return Some("partition without a mount path");
    }

    if lvs.iter().any(|lv| lv.path().is_none()) {
        return Some("logical volume without a mount path");
    }

    if lvs.iter().any(|lv| lv.encryption.is_some()) {
        return Some("encrypted logical volume");
    }

    None
}

fn is_skipped(search: Option<&Search>) -> bool {
    search.map(Search::skip_device).unwrap_or(false)
}

fn is_new(partition: &storage::Partition) -> bool {
    partition
        .search
        .as_ref()
        .map(Search::create_device)
        .unwrap_or(true)
}

fn is_reused(partition: &storage::Partition) -> bool {
    !is_new(partition) && !is_skipped(partition.search.as_ref())
}

/// New partitions and reused partitions which are not deleted or shrunk
/// to make space
fn needs_mount_path(partition: &storage::Partition) -> bool {
    if is_new(partition) {
        return true;
    }

    is_reused(partition) && !is_delete_action(partition) && !is_resize_action(partition)
}

fn is_delete_action(partition: &storage::Partition) -> bool {
    partition.delete || partition.delete_if_needed
}

fn is_resize_action(partition: &storage::Partition) -> bool {
    partition.filesystem.is_none()
        && partition.encryption.is_none()
        && !partition.size.default
        && partition.size.min == Some(DiskSize::ZERO)
}
