//! Config checkers report the problems of a solved storage config as
//! [`Issue`]s instead of failing.

mod alias;
mod boot;
mod encryption;
mod filesystem;
mod logical_volume;
mod md_raid;
mod search;
mod targets;
mod volume_group;

use crate::config::{
    BlockDevice,
    Config,
};
use crate::entity::issue::Issue;
use crate::product::Product;
use crate::system::System;

pub struct ConfigChecker<'a> {
    config: &'a Config,
    product: &'a Product,
    system: &'a System,
}

impl<'a> ConfigChecker<'a> {
    pub fn new(config: &'a Config, product: &'a Product, system: &'a System) -> Self {
        Self {
            config,
            product,
            system,
        }
    }

    /// All issues of the config. Configs whose search ended without device
    /// only get the search issue.
    pub fn issues(&self) -> Vec<Issue> {
        let mut issues: Vec<Issue> = self
            .config
            .with_search()
            .into_iter()
            .filter_map(search::check)
            .collect();

        for device in self.config.valid_block_devices() {
            issues.extend(self.device_issues(device));
        }

        for md in self.config.md_raids.iter().filter(|md| md.is_valid()) {
            issues.extend(md_raid::check(self.config, self.system, md));
        }

        for vg in &self.config.volume_groups {
            issues.extend(volume_group::check(self.config, self.system, vg));
            issues.extend(
                vg.logical_volumes
                    .iter()
                    .filter_map(|lv| logical_volume::check(vg, lv)),
            );
        }

        issues.extend(boot::check(self.config));
        issues.extend(targets::check(self.config));

        log::debug!("found {} issue(s)", issues.len());
        issues
    }

    fn device_issues(&self, device: &dyn BlockDevice) -> Vec<Issue> {
        let mut issues = alias::check(self.config, device);

        if let Some(fs) = device.filesystem() {
            issues.extend(filesystem::check(fs, self.product));
        }

        if let Some(encryption) = device.encryption() {
            let swap = device.filesystem().map(|fs| fs.is_swap()).unwrap_or(false);
            issues.extend(encryption::check(encryption, self.system, swap));
        }

        issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config_json::ConfigJson;
    use crate::entity::issue::{
        IssueKind,
        Severity,
    };
    use crate::solver;

    fn issues(json: &str) -> Vec<Issue> {
        let product = Product::from_yaml(include_str!("../../demos/product.yaml"))
            .expect("failed to parse product");
        let system = System::from_yaml(include_str!("../../demos/system.yaml"))
            .expect("failed to parse system");

        let json = ConfigJson::from_json(json).expect("failed to parse config");
        let config = solver::solve_json(&json, &product, &system).expect("failed to solve");

        ConfigChecker::new(&config, &product, &system).issues()
    }

    #[test]
    fn test_demo_config_has_no_issues() {
        let issues = issues(include_str!("../../demos/storage.json"));
        assert!(issues.is_empty(), "unexpected issues: {issues:?}");
    }

    #[test]
    fn test_config_issues() {
        struct TestIssues {
            json: &'static str,
            expected: Vec<(IssueKind, Severity)>,
        }

        let tests = vec![
            // Skipped drive, its partitions are not checked
            TestIssues {
                json: r#"{ "drives": [{
                    "search": { "condition": { "name": "/dev/vdz" }, "ifNotFound": "skip" },
                    "partitions": [{ "filesystem": { "path": "/", "type": "vfat" } }]
                }] }"#,
                expected: vec![(IssueKind::Search, Severity::Warning)],
            },
            TestIssues {
                json: r#"{ "drives": [{
                    "search": "/dev/vdz",
                    "partitions": [{ "filesystem": { "path": "/", "type": "vfat" } }]
                }] }"#,
                expected: vec![
                    (IssueKind::Search, Severity::Error),
                    (IssueKind::Filesystem, Severity::Error),
                ],
            },
            TestIssues {
                json: r#"{ "drives": [{
                    "partitions": [{
                        "encryption": { "luks2": {} },
                        "filesystem": { "path": "/", "type": "vfat" }
                    }]
                }] }"#,
                expected: vec![
                    (IssueKind::Filesystem, Severity::Error),
                    (IssueKind::Encryption, Severity::Error),
                ],
            },
            TestIssues {
                json: r#"{
                    "drives": [{ "alias": "disk", "partitions": [{ "filesystem": { "path": "/" } }] }],
                    "mdRaids": [{ "alias": "md", "devices": ["disk"] }],
                    "volumeGroups": [
                        { "name": "a", "physicalVolumes": [{ "generate": ["disk"] }] },
                        { "name": "b", "physicalVolumes": [{ "generate": ["disk"] }] }
                    ]
                }"#,
                expected: vec![
                    (IssueKind::Alias, Severity::Error),
                    (IssueKind::Overused, Severity::Error),
                    (IssueKind::NoRaidLevel, Severity::Error),
                    (IssueKind::Overused, Severity::Error),
                ],
            },
            TestIssues {
                json: r#"{
                    "boot": { "configure": true, "device": "nothing" },
                    "drives": [{ "partitions": [{ "filesystem": { "path": "/" } }] }],
                    "volumeGroups": [{
                        "logicalVolumes": [{ "usedPool": "pool", "filesystem": { "path": "/home" } }]
                    }]
                }"#,
                expected: vec![
                    (IssueKind::NoVgName, Severity::Error),
                    (IssueKind::NoSuchPool, Severity::Error),
                    (IssueKind::Boot, Severity::Error),
                ],
            },
        ];

        for test in tests {
            let issues: Vec<(IssueKind, Severity)> = issues(test.json)
                .into_iter()
                .map(|i| (i.kind, i.severity))
                .collect();

            assert_eq!(issues, test.expected, "unexpected issues for {}", test.json);
        }
    }

    #[test]
    fn test_mandatory_missing_drive_is_checked() {
        let issues: Vec<String> = issues(
            r#"{ "drives": [{ "search": "/dev/vdz", "encryption": { "luks2": {} } }] }"#,
        )
        .into_iter()
        .map(|i| i.description)
        .collect();

        assert_eq!(
            issues,
            vec![
                "No device found for a mandatory drive",
                "No passphrase provided (required for using the method 'Regular LUKS2').",
            ]
        );
    }
}
