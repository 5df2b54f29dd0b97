use crate::config::{
    BlockDevice,
    Config,
    DeviceKind,
};
use crate::entity::issue::{
    Issue,
    IssueKind,
};

/// Checks how other configs use the device through its alias
pub(super) fn check(config: &Config, device: &dyn BlockDevice) -> Vec<Issue> {
    let Some(alias) = device.alias() else {
        return Vec::new();
    };

    let users = config.users(alias);
    let target_users = config.target_users(alias);
    let mut issues = Vec::new();

    if !users.is_empty() && users.len() + target_users.len() > 1 {
        issues.push(Issue::error(
            IssueKind::Alias,
            format!("The device with alias '{alias}' is used by more than one device"),
        ));
    }

    if device.filesystem().is_some() && !(users.is_empty() && target_users.is_empty()) {
        issues.push(Issue::error(
            IssueKind::Overused,
            format!(
                "The device with alias '{alias}' cannot be formatted because it is used by other device"
            ),
        ));
    }

    let partitionable = matches!(device.kind(), DeviceKind::Drive | DeviceKind::MdRaid);
    let partitioned = partitionable
        && config
            .partitionable(alias)
            .map(|p| p.has_partitions())
            .unwrap_or(false);

    if partitioned && !users.is_empty() {
        issues.push(Issue::error(
            IssueKind::Overused,
            format!(
                "The device with alias '{alias}' cannot be partitioned because it is used by other device"
            ),
        ));
    }

    issues
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{
        Drive,
        Filesystem,
        MdRaid,
        Partition,
        VolumeGroup,
    };

    fn drive(alias: &str, partitions: Vec<Partition>, fs: bool) -> Drive {
        Drive {
            alias: Some(alias.into()),
            partitions,
            filesystem: fs.then(|| Filesystem::with_path("/data")),
            ..Default::default()
        }
    }

    fn md(alias: &str, devices: Vec<&str>) -> MdRaid {
        MdRaid {
            alias: Some(alias.into()),
            devices: devices.into_iter().map(String::from).collect(),
            ..Default::default()
        }
    }

    fn vg(pvs: Vec<&str>, targets: Vec<&str>) -> VolumeGroup {
        VolumeGroup {
            name: Some("system".into()),
            physical_volumes: pvs.into_iter().map(String::from).collect(),
            physical_volumes_devices: targets.into_iter().map(String::from).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_check_alias() {
        struct TestCheckAlias {
            case: &'static str,
            config: Config,
            expected: Vec<(IssueKind, &'static str)>,
        }

        let tests = vec![
            TestCheckAlias {
                case: "member of two MD RAIDs",
                config: Config {
                    drives: vec![drive("disk1", vec![], false)],
                    md_raids: vec![md("md0", vec!["disk1"]), md("md1", vec!["disk1"])],
                    ..Default::default()
                },
                expected: vec![(
                    IssueKind::Alias,
                    "The device with alias 'disk1' is used by more than one device",
                )],
            },
            TestCheckAlias {
                case: "MD RAID member and physical volumes target",
                config: Config {
                    drives: vec![drive("disk1", vec![], false)],
                    md_raids: vec![md("md0", vec!["disk1"])],
                    volume_groups: vec![vg(vec![], vec!["disk1"])],
                    ..Default::default()
                },
                expected: vec![(
                    IssueKind::Alias,
                    "The device with alias 'disk1' is used by more than one device",
                )],
            },
            TestCheckAlias {
                case: "formatted target",
                config: Config {
                    drives: vec![drive("disk1", vec![], true)],
                    volume_groups: vec![vg(vec![], vec!["disk1"])],
                    ..Default::default()
                },
                expected: vec![(
                    IssueKind::Overused,
                    "The device with alias 'disk1' cannot be formatted because it is used by other device",
                )],
            },
            TestCheckAlias {
                case: "partitioned physical volume",
                config: Config {
                    drives: vec![drive("disk1", vec![Partition::default()], false)],
                    volume_groups: vec![vg(vec!["disk1"], vec![])],
                    ..Default::default()
                },
                expected: vec![(
                    IssueKind::Overused,
                    "The device with alias 'disk1' cannot be partitioned because it is used by other device",
                )],
            },
            TestCheckAlias {
                case: "partitioned target",
                config: Config {
                    drives: vec![drive("disk1", vec![Partition::default()], false)],
                    volume_groups: vec![vg(vec![], vec!["disk1"])],
                    ..Default::default()
                },
                expected: vec![],
            },
        ];

        for test in tests {
            let device = &test.config.drives[0];
            let issues: Vec<(IssueKind, String)> = check(&test.config, device)
                .into_iter()
                .map(|i| (i.kind, i.description))
                .collect();

            let expected: Vec<(IssueKind, String)> = test
                .expected
                .into_iter()
                .map(|(kind, s)| (kind, s.to_string()))
                .collect();

            assert_eq!(issues, expected, "unexpected issues for {}", test.case);
        }
    }
}
