use crate::config::{
    BlockDevice,
    Config,
    Search,
    Size,
};
use crate::constants::defaults;
use crate::entity::size::DiskSize;
use crate::product::Product;
use crate::system::System;

/// Sizes of new partitions and logical volumes default to the product
/// volume sizes. Reused devices take the size of the found device.
pub fn solve(config: &mut Config, product: &Product, system: &System) {
    let paths = fallback_paths(config);
    let ram = system.ram;

    for drive in config.drives.iter_mut().filter(|d| d.is_valid()) {
        for partition in drive.partitions.iter_mut().filter(|p| p.is_valid()) {
            solve_size(partition, product, &paths, ram);
        }
    }

    for md in config.md_raids.iter_mut().filter(|md| md.is_valid()) {
        for partition in md.partitions.iter_mut().filter(|p| p.is_valid()) {
            solve_size(partition, product, &paths, ram);
        }
    }

    for vg in &mut config.volume_groups {
        for lv in &mut vg.logical_volumes {
            solve_size(lv, product, &paths, ram);
        }
    }
}

/// Mount paths of drives, partitions and logical volumes. MD RAID
/// filesystems do not count for the fallback sizes.
fn fallback_paths(config: &Config) -> Vec<String> {
    let drives = config.drives.iter().map(|d| d as &dyn BlockDevice);
    let partitions = config.partitions().map(|p| p as &dyn BlockDevice);
    let lvs = config.logical_volumes().map(|lv| lv as &dyn BlockDevice);

    drives
        .chain(partitions)
        .chain(lvs)
        .filter(|d| d.is_valid())
        .filter_map(|d| d.path().map(String::from))
        .collect()
}

fn solve_size(
    device: &mut dyn BlockDevice,
    product: &Product,
    paths: &[String],
    ram: Option<DiskSize>,
) {
    // Nothing is created nor reused
    if device.search().map(Search::missing_device).unwrap_or(false) {
        return;
    }

    let current = device.found_device().map(|found| found.size);
    let path = device.path().unwrap_or(defaults::TEMPLATE_PATH).to_string();
    let snapshots = device.filesystem().map(|fs| fs.snapshots()).unwrap_or(false);

    let Some(size) = device.size_mut() else {
        return;
    };

    match current {
        Some(current) => {
            let (min, max) = match size.default {
                true => (None, None),
                false => (size.min, size.max),
            };

            *size = Size {
                default: false,
                min: min.or(Some(current)),
                max: max.or(Some(current)),
            };
        }

        // "current" makes no sense for a new device
        None if size.default || size.min.is_none() || size.max.is_none() => {
            *size = product.default_size(&path, paths, snapshots, ram);
            log::trace!("default size for '{path}': {size:?}");
        }

        None => (),
    }
}
