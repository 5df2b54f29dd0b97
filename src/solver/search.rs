use std::cmp::Ordering;
use std::collections::HashSet;

use crate::config::search::{
    SortCriterion,
    SortKey,
    SortOrder,
};
use crate::config::{
    Config,
    Drive,
    MdRaid,
    Partition,
    Search,
};
use crate::system::{
    System,
    SystemDevice,
};

const DEFAULT_SORT: [SortCriterion; 1] = [SortCriterion {
    key: SortKey::Name,
    order: SortOrder::Asc,
}];

/// Assigns system devices to the searches of drives, MD RAIDs and their
/// partitions. A config whose search finds several devices is repeated
/// once per device.
pub fn solve(config: &mut Config, system: &System) {
    let mut assigned = HashSet::new();

    let drives = std::mem::take(&mut config.drives);
    config.drives = solve_drives(drives, system, &mut assigned);

    let md_raids = std::mem::take(&mut config.md_raids);
    config.md_raids = solve_md_raids(md_raids, system, &mut assigned);
}

fn solve_drives(drives: Vec<Drive>, system: &System, assigned: &mut HashSet<u32>) -> Vec<Drive> {
    let mut solved = Vec::with_capacity(drives.len());

    for mut drive in drives {
        let candidates = match &drive.search.name {
            None => system.candidate_disks().map(SystemDevice::Disk).collect(),
            Some(name) => system
                .find_by_any_name(name)
                .filter(|d| matches!(d, SystemDevice::Disk(disk) if disk.available))
                .into_iter()
                .collect(),
        };

        let devices = find_devices(&drive.search, candidates, assigned);
        if devices.is_empty() {
            log::warn!("no disk found for drive {:?}", drive.alias);
            drive.search.solve(None);
            solved.push(drive);
            continue;
        }

        for device in devices {
            log::debug!("drive {:?} found {}", drive.alias, device.name());
            assigned.insert(device.sid());

            let mut drive = drive.clone();
            drive.search.solve(Some(device.found()));
            drive.partitions = solve_partitions(drive.partitions, device, system, assigned);
            solved.push(drive);
        }
    }

    solved
}

fn solve_md_raids(
    md_raids: Vec<MdRaid>,
    system: &System,
    assigned: &mut HashSet<u32>,
) -> Vec<MdRaid> {
    let mut solved = Vec::with_capacity(md_raids.len());

    for mut md in md_raids {
        let Some(search) = md.search.as_mut() else {
            solved.push(md);
            continue;
        };

        let candidates = match &search.name {
            None => system.md_raids.iter().map(SystemDevice::MdRaid).collect(),
            Some(name) => system
                .find_by_any_name(name)
                .filter(|d| matches!(d, SystemDevice::MdRaid(_)))
                .into_iter()
                .collect(),
        };

        let devices = find_devices(search, candidates, assigned);
        if devices.is_empty() {
            log::warn!("no MD RAID found for {:?}", md.alias);
            search.solve(None);
            solved.push(md);
            continue;
        }

        for device in devices {
            log::debug!("MD RAID {:?} found {}", md.alias, device.name());
            assigned.insert(device.sid());

            let mut md = md.clone();
            if let Some(search) = md.search.as_mut() {
                search.solve(Some(device.found()));
            }

            md.partitions = solve_partitions(md.partitions, device, system, assigned);
            solved.push(md);
        }
    }

    solved
}

/// Solves the partition searches within the device found for the parent
fn solve_partitions(
    partitions: Vec<Partition>,
    parent: SystemDevice,
    system: &System,
    assigned: &mut HashSet<u32>,
) -> Vec<Partition> {
    let mut solved = Vec::with_capacity(partitions.len());

    for mut partition in partitions {
        let Some(search) = partition.search.as_mut() else {
            solved.push(partition);
            continue;
        };

        let candidates = match &search.name {
            None => parent
                .partitions()
                .iter()
                .map(SystemDevice::Partition)
                .collect(),
            Some(name) => system
                .find_by_any_name(name)
                .filter(|d| matches!(d, SystemDevice::Partition(_)))
                .into_iter()
                .collect(),
        };

        let devices = find_devices(search, candidates, assigned);
        if devices.is_empty() {
            log::debug!("no partition found in {} for {:?}", parent.name(), partition.alias);
            search.solve(None);
            solved.push(partition);
            continue;
        }

        for device in devices {
            assigned.insert(device.sid());

            let mut partition = partition.clone();
            if let Some(search) = partition.search.as_mut() {
                search.solve(Some(device.found()));
            }

            solved.push(partition);
        }
    }

    solved
}

/// Unassigned candidates matching the search conditions, sorted and
/// limited to the search max
fn find_devices<'a>(
    search: &Search,
    candidates: Vec<SystemDevice<'a>>,
    assigned: &HashSet<u32>,
) -> Vec<SystemDevice<'a>> {
    let mut devices: Vec<SystemDevice> = candidates
        .into_iter()
        .filter(|d| !assigned.contains(&d.sid()))
        .filter(|d| matches_conditions(search, d))
        .collect();

    let criteria = match search.sort.is_empty() {
        true => DEFAULT_SORT.as_slice(),
        false => search.sort.as_slice(),
    };

    devices.sort_by(|a, b| compare(criteria, a, b));

    if let Some(max) = search.max {
        devices.truncate(max);
    }

    devices
}

fn matches_conditions(search: &Search, device: &SystemDevice) -> bool {
    let size = search
        .size
        .map(|cond| cond.matches(device.size()))
        .unwrap_or(true);

    let number = match (search.partition_number, device) {
        (None, _) => true,
        (Some(number), SystemDevice::Partition(p)) => p.number == number,
        (Some(_), _) => false,
    };

    size && number
}

fn compare(criteria: &[SortCriterion], a: &SystemDevice, b: &SystemDevice) -> Ordering {
    for criterion in criteria {
        let ordering = match criterion.key {
            SortKey::Name => a.name().cmp(b.name()),
            SortKey::Size => a.size().cmp(&b.size()),
            SortKey::Number => a.number().cmp(&b.number()),
        };

        let ordering = match criterion.order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        };

        if ordering != Ordering::Equal {
            return ordering;
        }
    }

    Ordering::Equal
}
