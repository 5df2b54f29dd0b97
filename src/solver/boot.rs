use crate::config::{
    BlockDevice,
    Config,
    DeviceKind,
};
use crate::system::System;

/// Drive or MD RAID config chosen to hold the boot partitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BootTarget {
    Drive(usize),
    MdRaid(usize),
}

/// Infers the boot device from the device holding the root filesystem,
/// when boot is configured on the default device
pub fn solve(config: &mut Config, system: &System) {
    if !config.boot.configure || !config.boot.device.default {
        return;
    }

    let Some(target) = boot_target(config, system) else {
        log::warn!("cannot infer a boot device");
        config.boot.device.alias = None;
        return;
    };

    let alias = ensure_alias(config, target);
    log::debug!("boot device is {alias}");
    config.boot.device.alias = Some(alias);
}

fn ensure_alias(config: &mut Config, target: BootTarget) -> String {
    let (kind, alias) = match target {
        BootTarget::Drive(i) => (DeviceKind::Drive, config.drives[i].alias.clone()),
        BootTarget::MdRaid(i) => (DeviceKind::MdRaid, config.md_raids[i].alias.clone()),
    };

    if let Some(alias) = alias {
        return alias;
    }

    let alias = config.generate_alias(kind);
    match target {
        BootTarget::Drive(i) => config.drives[i].set_alias(alias.clone()),
        BootTarget::MdRaid(i) => config.md_raids[i].set_alias(alias.clone()),
    }

    alias
}

fn boot_target(config: &Config, system: &System) -> Option<BootTarget> {
    if let Some(root) = config.root_drive() {
        return config
            .drives
            .iter()
            .position(|d| std::ptr::eq(d, root))
            .map(BootTarget::Drive);
    }

    if let Some(root) = config.root_md_raid() {
        return config
            .md_raids
            .iter()
            .position(|md| std::ptr::eq(md, root))
            .and_then(|i| md_raid_target(config, system, i));
    }

    let vg = config.root_volume_group()?;

    vg.physical_volumes_devices
        .iter()
        .find_map(|alias| device_target(config, system, alias, true))
        .or_else(|| {
            vg.physical_volumes
                .iter()
                .find_map(|alias| device_target(config, system, alias, false))
        })
}

/// Target for a device used by a volume group. Target devices qualify
/// even without partitions, the physical volumes are created on them.
fn device_target(
    config: &Config,
    system: &System,
    alias: &str,
    is_target: bool,
) -> Option<BootTarget> {
    if let Some(i) = config.md_raids.iter().position(|md| md.has_alias(alias)) {
        return md_raid_target(config, system, i);
    }

    if let Some(i) = config
        .md_raids
        .iter()
        .position(|md| md.partitions.iter().any(|p| p.has_alias(alias)))
    {
        return md_raid_target(config, system, i);
    }

    drive_target(config, alias, is_target)
}

/// Drive given by alias, or the drive holding the partition with the alias
fn drive_target(config: &Config, alias: &str, is_target: bool) -> Option<BootTarget> {
    if let Some(i) = config.drives.iter().position(|d| d.has_alias(alias)) {
        let drive = &config.drives[i];
        return (drive.is_valid() && (is_target || !drive.partitions.is_empty()))
            .then_some(BootTarget::Drive(i));
    }

    config
        .drives
        .iter()
        .position(|d| d.is_valid() && d.partitions.iter().any(|p| p.has_alias(alias)))
        .map(BootTarget::Drive)
}

/// A reused MD RAID holds boot itself when bootable. A new one needs a
/// partitioned drive among its members.
fn md_raid_target(config: &Config, system: &System, i: usize) -> Option<BootTarget> {
    let md = &config.md_raids[i];

    if let Some(found) = md.found_device() {
        let bootable = system.md_raid(found.sid).map(|md| md.bootable).unwrap_or(false);
        return bootable.then_some(BootTarget::MdRaid(i));
    }

    md.devices
        .iter()
        .find_map(|alias| drive_target(config, alias, false))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{
        Boot,
        BootDevice,
        Drive,
        Filesystem,
        LogicalVolume,
        MdRaid,
        Partition,
        Search,
        VolumeGroup,
    };

    fn partition(alias: &str, path: Option<&str>) -> Partition {
        Partition {
            alias: Some(alias.into()),
            filesystem: path.map(Filesystem::with_path),
            ..Default::default()
        }
    }

    fn drive(alias: Option<&str>, partitions: Vec<Partition>) -> Drive {
        Drive {
            alias: alias.map(String::from),
            partitions,
            ..Default::default()
        }
    }

    fn root_vg(physical_volumes: Vec<&str>, targets: Vec<&str>) -> VolumeGroup {
        VolumeGroup {
            name: Some("system".into()),
            physical_volumes: physical_volumes.into_iter().map(String::from).collect(),
            physical_volumes_devices: targets.into_iter().map(String::from).collect(),
            logical_volumes: vec![LogicalVolume {
                filesystem: Some(Filesystem::with_path("/")),
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    fn new_md(alias: &str, devices: Vec<&str>, partitions: Vec<Partition>) -> MdRaid {
        MdRaid {
            alias: Some(alias.into()),
            devices: devices.into_iter().map(String::from).collect(),
            partitions,
            ..Default::default()
        }
    }

    #[test]
    fn test_solve_boot() {
        struct TestSolveBoot {
            case: &'static str,
            config: Config,
            expected: Option<&'static str>,
        }

        let tests = vec![
            TestSolveBoot {
                case: "root partition",
                config: Config {
                    drives: vec![
                        drive(Some("disk1"), vec![partition("p1", Some("/home"))]),
                        drive(Some("disk2"), vec![partition("p2", Some("/"))]),
                    ],
                    ..Default::default()
                },
                expected: Some("disk2"),
            },
            TestSolveBoot {
                case: "root drive without alias",
                config: Config {
                    drives: vec![
                        drive(Some("drive0"), vec![]),
                        drive(None, vec![partition("p1", Some("/"))]),
                    ],
                    ..Default::default()
                },
                expected: Some("drive1"),
            },
            TestSolveBoot {
                case: "new MD RAID with a partition member",
                config: Config {
                    drives: vec![
                        drive(Some("disk1"), vec![partition("p1", None)]),
                        drive(Some("disk2"), vec![]),
                    ],
                    md_raids: vec![new_md(
                        "md1",
                        vec!["disk2", "p1"],
                        vec![partition("p2", Some("/"))],
                    )],
                    ..Default::default()
                },
                expected: Some("disk1"),
            },
            TestSolveBoot {
                case: "new MD RAID with whole disks",
                config: Config {
                    drives: vec![drive(Some("disk1"), vec![]), drive(Some("disk2"), vec![])],
                    md_raids: vec![new_md(
                        "md1",
                        vec!["disk1", "disk2"],
                        vec![partition("p2", Some("/"))],
                    )],
                    ..Default::default()
                },
                expected: None,
            },
            TestSolveBoot {
                case: "volume group targets",
                config: Config {
                    drives: vec![drive(Some("disk1"), vec![]), drive(Some("disk2"), vec![])],
                    volume_groups: vec![root_vg(vec![], vec!["disk2", "disk1"])],
                    ..Default::default()
                },
                expected: Some("disk2"),
            },
            TestSolveBoot {
                case: "volume group target MD RAID",
                config: Config {
                    drives: vec![drive(Some("disk1"), vec![partition("p1", None)])],
                    md_raids: vec![new_md("md1", vec!["p1"], vec![])],
                    volume_groups: vec![root_vg(vec![], vec!["md1"])],
                    ..Default::default()
                },
                expected: Some("disk1"),
            },
            TestSolveBoot {
                case: "volume group physical volumes",
                config: Config {
                    drives: vec![
                        drive(Some("disk1"), vec![partition("p1", None)]),
                        drive(Some("disk2"), vec![partition("p2", None)]),
                        drive(Some("disk3"), vec![]),
                    ],
                    volume_groups: vec![root_vg(vec!["disk3", "p2", "p1"], vec![])],
                    ..Default::default()
                },
                expected: Some("disk2"),
            },
            TestSolveBoot {
                case: "volume group on whole disks",
                config: Config {
                    drives: vec![drive(Some("disk1"), vec![]), drive(Some("disk2"), vec![])],
                    volume_groups: vec![root_vg(vec!["disk1", "disk2"], vec![])],
                    ..Default::default()
                },
                expected: None,
            },
            TestSolveBoot {
                case: "no root",
                config: Config {
                    drives: vec![drive(Some("disk1"), vec![partition("p1", Some("/home"))])],
                    ..Default::default()
                },
                expected: None,
            },
        ];

        let system = System::default();
        for mut test in tests {
            solve(&mut test.config, &system);

            assert_eq!(
                test.config.boot.device.alias.as_deref(),
                test.expected,
                "unexpected boot device for {}",
                test.case
            );
            assert!(test.config.boot.device.default);
        }
    }

    #[test]
    fn test_solve_boot_reused_md_raid() {
        let system = System::from_yaml(
            "disks: [{ name: /dev/vda, size: 10 GiB, partitions: [{ number: 1, size: 10 GiB }] }]\n\
             mdRaids: [{ name: /dev/md0, level: raid1, size: 10 GiB, devices: [/dev/vda1], bootable: true }]",
        )
        .expect("failed to parse system");

        let mut md = new_md("md0", vec![], vec![partition("p1", Some("/"))]);
        md.search = Some(Search::by_name("/dev/md0"));

        let mut config = Config {
            md_raids: vec![md],
            ..Default::default()
        };

        crate::solver::search::solve(&mut config, &system);
        solve(&mut config, &system);
        assert_eq!(config.boot.device.alias.as_deref(), Some("md0"));

        // Not bootable
        let system = System::from_yaml(
            "disks: [{ name: /dev/vda, size: 10 GiB, partitions: [{ number: 1, size: 10 GiB }] }]\n\
             mdRaids: [{ name: /dev/md0, level: raid1, size: 10 GiB, devices: [/dev/vda1] }]",
        )
        .expect("failed to parse system");

        let mut md = new_md("md0", vec![], vec![partition("p1", Some("/"))]);
        md.search = Some(Search::by_name("/dev/md0"));

        let mut config = Config {
            md_raids: vec![md],
            ..Default::default()
        };

        crate::solver::search::solve(&mut config, &system);
        solve(&mut config, &system);
        assert_eq!(config.boot.device.alias, None);
    }

    #[test]
    fn test_explicit_boot_untouched() {
        let mut config = Config {
            boot: Boot {
                configure: true,
                device: BootDevice {
                    default: false,
                    alias: Some("disk1".into()),
                },
            },
            drives: vec![drive(Some("disk2"), vec![partition("p2", Some("/"))])],
            ..Default::default()
        };

        solve(&mut config, &System::default());
        assert_eq!(config.boot.device.alias.as_deref(), Some("disk1"));
    }
}
